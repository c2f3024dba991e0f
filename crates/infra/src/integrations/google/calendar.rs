//! Google Calendar provider implementation

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use encore_core::CalendarProvider;
use encore_domain::constants::GOOGLE_PROVIDER;
use encore_domain::{
    AuthorizationRequest, CalendarEventDraft, EncoreError, ExternalEvent, GoogleCalendarConfig,
    Result, TokenGrant, WatchChannel,
};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::oauth::GoogleOAuth;
use super::wire::{
    ErrorEnvelope, EventBody, EventsPage, StopChannelRequest, WatchRequest, WatchResponse,
    WireEvent,
};
use crate::http::HttpClient;

/// Safety valve for runaway pagination.
const MAX_PAGES: usize = 50;

/// Google Calendar v3 provider
pub struct GoogleCalendarProvider {
    oauth: GoogleOAuth,
    http: HttpClient,
    api_base_url: String,
}

impl GoogleCalendarProvider {
    pub fn new(config: &GoogleCalendarConfig) -> Result<Self> {
        Ok(Self {
            oauth: GoogleOAuth::new(config)?,
            http: HttpClient::new()?,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!("{}/calendars/{}/events", self.api_base_url, urlencoding::encode(calendar_id))
    }

    fn event_url(&self, calendar_id: &str, event_id: &str) -> String {
        format!("{}/{}", self.events_url(calendar_id), urlencoding::encode(event_id))
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response> {
        let response = self.http.send(builder).await?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(error_from_response(response).await)
    }

    async fn execute_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.execute(builder).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| EncoreError::Provider(format!("unreadable Google Calendar response: {e}")))
    }

    async fn execute_event(&self, builder: RequestBuilder) -> Result<ExternalEvent> {
        let wire: WireEvent = self.execute_json(builder).await?;
        wire.into_domain()
            .ok_or_else(|| EncoreError::Provider("Google Calendar returned an event without times".into()))
    }
}

fn send_updates(send: bool) -> &'static str {
    if send {
        "all"
    } else {
        "none"
    }
}

/// Turn a non-success response into a domain error, keeping Google's message.
async fn error_from_response(response: Response) -> EncoreError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .ok()
        .map(|envelope| envelope.error.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Google Calendar request failed ({status})"));

    match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => EncoreError::NotFound(message),
        StatusCode::UNAUTHORIZED => EncoreError::Auth(message),
        StatusCode::FORBIDDEN => EncoreError::PermissionDenied(message),
        StatusCode::BAD_REQUEST => EncoreError::InvalidInput(message),
        StatusCode::TOO_MANY_REQUESTS => EncoreError::Network(message),
        _ => EncoreError::Provider(message),
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendarProvider {
    fn name(&self) -> &str {
        GOOGLE_PROVIDER
    }

    fn authorization_url(&self) -> Result<AuthorizationRequest> {
        Ok(self.oauth.authorization_url())
    }

    async fn exchange_code(&self, code: &str, pkce_verifier: &str) -> Result<TokenGrant> {
        self.oauth.exchange_code(code, pkce_verifier).await
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenGrant> {
        self.oauth.refresh(refresh_token).await
    }

    async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<ExternalEvent>> {
        let url = self.events_url(calendar_id);
        let time_min = time_min.to_rfc3339_opts(SecondsFormat::Secs, true);
        let time_max = time_max.to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut events = Vec::new();
        let mut page_token: Option<String> = None;
        for _ in 0..MAX_PAGES {
            let mut query: Vec<(&str, &str)> = vec![
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
                ("maxResults", "250"),
            ];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let builder =
                self.http.request(Method::GET, &url).bearer_auth(access_token).query(&query);
            let page: EventsPage = self.execute_json(builder).await?;
            events.extend(page.items.into_iter().filter_map(WireEvent::into_domain));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => {
                    debug!(count = events.len(), "listed calendar events");
                    return Ok(events);
                }
            }
        }

        warn!(count = events.len(), "calendar listing truncated after page limit");
        Ok(events)
    }

    async fn get_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<ExternalEvent> {
        let builder = self
            .http
            .request(Method::GET, self.event_url(calendar_id, event_id))
            .bearer_auth(access_token);
        self.execute_event(builder).await
    }

    async fn insert_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        draft: &CalendarEventDraft,
        send: bool,
    ) -> Result<ExternalEvent> {
        let builder = self
            .http
            .request(Method::POST, self.events_url(calendar_id))
            .bearer_auth(access_token)
            .query(&[("sendUpdates", send_updates(send))])
            .json(&EventBody::from(draft));
        self.execute_event(builder).await
    }

    async fn patch_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
        draft: &CalendarEventDraft,
        send: bool,
    ) -> Result<ExternalEvent> {
        let builder = self
            .http
            .request(Method::PATCH, self.event_url(calendar_id, event_id))
            .bearer_auth(access_token)
            .query(&[("sendUpdates", send_updates(send))])
            .json(&EventBody::from(draft));
        self.execute_event(builder).await
    }

    async fn delete_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<()> {
        let builder = self
            .http
            .request(Method::DELETE, self.event_url(calendar_id, event_id))
            .bearer_auth(access_token)
            .query(&[("sendUpdates", "all")]);
        self.execute(builder).await?;
        Ok(())
    }

    async fn watch_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        channel_id: &str,
        address: &str,
    ) -> Result<WatchChannel> {
        let builder = self
            .http
            .request(Method::POST, format!("{}/watch", self.events_url(calendar_id)))
            .bearer_auth(access_token)
            .json(&WatchRequest { id: channel_id, kind: "web_hook", address });
        let response: WatchResponse = self.execute_json(builder).await?;
        Ok(WatchChannel {
            channel_id: channel_id.to_string(),
            expires_at: response.expires_at(),
            resource_id: response.resource_id,
        })
    }

    async fn stop_watch(&self, access_token: &str, channel_id: &str, resource_id: &str) -> Result<()> {
        let builder = self
            .http
            .request(Method::POST, format!("{}/channels/stop", self.api_base_url))
            .bearer_auth(access_token)
            .json(&StopChannelRequest { id: channel_id, resource_id });
        self.execute(builder).await?;
        Ok(())
    }
}
