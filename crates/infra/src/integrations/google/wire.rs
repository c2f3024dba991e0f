//! Google Calendar v3 JSON shapes and their domain conversions

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use encore_domain::{
    AttendeeResponse, CalendarEventDraft, EventAttendee, EventTime, ExternalEvent,
    ExternalEventStatus,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct EventsPage {
    #[serde(default)]
    pub items: Vec<WireEvent>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WireEvent {
    pub id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub start: Option<WireEventTime>,
    pub end: Option<WireEventTime>,
    #[serde(default)]
    pub attendees: Vec<WireAttendee>,
    pub html_link: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WireEventTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WireAttendee {
    #[serde(default)]
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_status: Option<String>,
    #[serde(default, skip_serializing)]
    pub organizer: bool,
}

/// Body for insert and patch. Unset fields are left alone by PATCH.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct EventBody {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start: WireEventTime,
    pub end: WireEventTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<WireAttendee>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WatchRequest<'a> {
    pub id: &'a str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub address: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WatchResponse {
    pub resource_id: String,
    /// Milliseconds since the epoch, as a string.
    pub expiration: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct StopChannelRequest<'a> {
    pub id: &'a str,
    pub resource_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(default)]
    pub message: String,
}

impl WatchResponse {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expiration
            .as_deref()
            .and_then(|ms| ms.parse::<i64>().ok())
            .and_then(DateTime::from_timestamp_millis)
    }
}

impl WireEventTime {
    fn into_domain(self) -> Option<EventTime> {
        if let Some(instant) = self.date_time {
            return Some(EventTime::At { instant: instant.with_timezone(&Utc) });
        }
        self.date.map(|date| EventTime::AllDay { date })
    }

    fn from_domain(time: EventTime, time_zone: &str) -> Self {
        match time {
            EventTime::AllDay { date } => Self { date: Some(date), ..Self::default() },
            EventTime::At { instant } => Self {
                date_time: Some(instant.fixed_offset()),
                date: None,
                time_zone: Some(time_zone.to_string()),
            },
        }
    }
}

impl WireEvent {
    /// Convert to the domain shape.
    ///
    /// Cancelled tombstones may come back without times; they get the epoch
    /// so callers can still see the status. Live events without a start are
    /// dropped.
    pub fn into_domain(self) -> Option<ExternalEvent> {
        let status = match self.status.as_deref() {
            Some(raw) => raw.parse().unwrap_or_default(),
            None => ExternalEventStatus::Confirmed,
        };
        let start = self.start.and_then(WireEventTime::into_domain);
        let end = self.end.and_then(WireEventTime::into_domain);

        let (start, end) = match (start, end) {
            (Some(start), Some(end)) => (start, end),
            (Some(start), None) => (start, start),
            (None, _) if status == ExternalEventStatus::Cancelled => {
                let epoch = EventTime::At { instant: DateTime::<Utc>::UNIX_EPOCH };
                (epoch, epoch)
            }
            (None, _) => {
                warn!(event_id = %self.id, "calendar event without a start time skipped");
                return None;
            }
        };

        Some(ExternalEvent {
            id: self.id,
            summary: self.summary,
            description: self.description,
            location: self.location,
            status,
            start,
            end,
            attendees: self
                .attendees
                .into_iter()
                .filter(|a| !a.email.trim().is_empty())
                .map(WireAttendee::into_domain)
                .collect(),
            html_link: self.html_link,
        })
    }
}

impl WireAttendee {
    fn into_domain(self) -> EventAttendee {
        let response_status = match self.response_status.as_deref() {
            Some("accepted") => AttendeeResponse::Accepted,
            Some("declined") => AttendeeResponse::Declined,
            Some("tentative") => AttendeeResponse::Tentative,
            _ => AttendeeResponse::NeedsAction,
        };
        EventAttendee {
            email: self.email.trim().to_string(),
            display_name: self.display_name,
            response_status,
            organizer: self.organizer,
        }
    }

    fn from_domain(attendee: &EventAttendee) -> Self {
        let response_status = match attendee.response_status {
            AttendeeResponse::NeedsAction => "needsAction",
            AttendeeResponse::Declined => "declined",
            AttendeeResponse::Tentative => "tentative",
            AttendeeResponse::Accepted => "accepted",
        };
        Self {
            email: attendee.email.clone(),
            display_name: attendee.display_name.clone(),
            response_status: Some(response_status.to_string()),
            organizer: attendee.organizer,
        }
    }
}

impl From<&CalendarEventDraft> for EventBody {
    fn from(draft: &CalendarEventDraft) -> Self {
        Self {
            summary: draft.summary.clone(),
            description: draft.description.clone(),
            location: draft.location.clone(),
            start: WireEventTime::from_domain(draft.start, &draft.time_zone),
            end: WireEventTime::from_domain(draft.end, &draft.time_zone),
            attendees: draft
                .attendees
                .as_ref()
                .map(|list| list.iter().map(WireAttendee::from_domain).collect()),
        }
    }
}
