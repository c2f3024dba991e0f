//! Transactional e-mail for gig invitations
//!
//! The HTTP sender speaks the Resend-style `POST /emails` JSON API. When
//! e-mail is disabled the logging sender stands in so the calendar flow can
//! still report what it would have sent.

use std::sync::Arc;

use async_trait::async_trait;
use encore_common::privacy::redact_email;
use encore_core::{EmailSender, InvitationEmail};
use encore_domain::{EmailConfig, EncoreError, Result};
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, info};

use crate::http::HttpClient;

#[derive(Debug, Serialize)]
struct OutgoingEmail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: String,
    text: String,
}

/// Sends invitation e-mail through an HTTP mail API
pub struct HttpEmailSender {
    http: HttpClient,
    api_url: String,
    api_key: String,
    from_address: String,
}

impl HttpEmailSender {
    pub fn new(config: &EmailConfig, http: HttpClient) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| EncoreError::Config("email.api_key is required when e-mail is enabled".into()))?;
        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_key,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send_invitation(&self, email: &InvitationEmail) -> Result<()> {
        let body = OutgoingEmail {
            from: &self.from_address,
            to: [email.to.as_str()],
            subject: invitation_subject(email),
            text: invitation_text(email),
        };
        let builder = self
            .http
            .request(Method::POST, &self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body);

        let response = self.http.send(builder).await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(EncoreError::Provider(format!("email API returned {status}: {detail}")));
        }

        info!(to = %redact_email(&email.to), gig_id = %email.gig_id, "invitation email sent");
        Ok(())
    }
}

/// Logs invitations instead of sending them
#[derive(Debug, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send_invitation(&self, email: &InvitationEmail) -> Result<()> {
        debug!(
            to = %redact_email(&email.to),
            gig_id = %email.gig_id,
            subject = %invitation_subject(email),
            "email disabled; invitation not sent"
        );
        Ok(())
    }
}

/// Pick the sender the configuration asks for.
pub fn build_email_sender(config: &EmailConfig) -> Result<Arc<dyn EmailSender>> {
    if !config.enabled {
        return Ok(Arc::new(LogEmailSender));
    }
    Ok(Arc::new(HttpEmailSender::new(config, HttpClient::new()?)?))
}

fn invitation_subject(email: &InvitationEmail) -> String {
    format!("You're invited: {} on {}", email.gig_title, email.gig_date.format("%b %-d, %Y"))
}

fn invitation_text(email: &InvitationEmail) -> String {
    let greeting = match email.musician_name.as_deref() {
        Some(name) if !name.trim().is_empty() => format!("Hi {name},"),
        _ => "Hi,".to_string(),
    };
    let inviter = email.organizer_name.as_deref().unwrap_or("A bandleader");

    let mut lines = vec![
        greeting,
        String::new(),
        format!(
            "{inviter} would like you to play {} at \"{}\" on {}.",
            email.role_name,
            email.gig_title,
            email.gig_date.format("%A, %B %-d, %Y")
        ),
    ];
    if let Some(location) = email.location.as_deref().filter(|l| !l.trim().is_empty()) {
        lines.push(format!("Location: {location}"));
    }
    lines.push(String::new());
    lines.push(format!("Open Encore to accept or decline (gig {}).", email.gig_id));
    lines.join("\n")
}
