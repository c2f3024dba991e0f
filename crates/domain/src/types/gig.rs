//! Gig types

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::UNTITLED_GIG;
use crate::impl_domain_status_conversions;
use crate::mapping;

/// Lifecycle status of a gig
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GigStatus {
    #[default]
    Draft,
    Tentative,
    Confirmed,
    Cancelled,
}

impl_domain_status_conversions!(GigStatus {
    Draft => "draft",
    Tentative => "tentative",
    Confirmed => "confirmed",
    Cancelled => "cancelled",
});

/// A scheduled performance owned by a band leader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gig {
    pub id: String,
    pub owner_id: String,
    pub band_id: Option<String>,
    pub title: String,
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub location_name: Option<String>,
    pub location_address: Option<String>,
    pub status: GigStatus,
    pub notes: Option<String>,
    pub poster_skin: String,
    pub fee_cents: Option<i64>,
    pub currency: String,
    /// Provider event this gig was imported from.
    pub external_calendar_event_id: Option<String>,
    pub external_calendar_provider: Option<String>,
    /// Event Encore pushes gig changes into.
    pub calendar_event_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Gig {
    /// Build a new gig from user input with all defaults applied.
    pub fn from_new(owner_id: &str, input: NewGig, now: DateTime<Utc>) -> Self {
        Self {
            id: super::new_id(),
            owner_id: owner_id.to_string(),
            band_id: mapping::non_empty(input.band_id),
            title: mapping::text_or(Some(input.title), UNTITLED_GIG),
            date: input.date,
            start_time: input.start_time,
            end_time: input.end_time,
            location_name: mapping::non_empty(input.location_name),
            location_address: mapping::non_empty(input.location_address),
            status: input.status.unwrap_or_default(),
            notes: mapping::non_empty(input.notes),
            poster_skin: mapping::poster_skin(input.poster_skin),
            fee_cents: input.fee_cents,
            currency: mapping::currency(input.currency),
            external_calendar_event_id: None,
            external_calendar_provider: None,
            calendar_event_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == GigStatus::Cancelled
    }

    pub fn is_imported(&self) -> bool {
        self.external_calendar_event_id.is_some()
    }
}

/// Input for creating a gig
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGig {
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub location_address: Option<String>,
    #[serde(default)]
    pub status: Option<GigStatus>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub poster_skin: Option<String>,
    #[serde(default)]
    pub fee_cents: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub band_id: Option<String>,
}

/// Partial update; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GigUpdate {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub location_name: Option<String>,
    pub location_address: Option<String>,
    pub status: Option<GigStatus>,
    pub notes: Option<String>,
    pub poster_skin: Option<String>,
    pub fee_cents: Option<i64>,
    pub currency: Option<String>,
    pub band_id: Option<String>,
}

impl GigUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Whether applying this update changes what a calendar event shows.
    pub fn touches_schedule(&self) -> bool {
        self.title.is_some()
            || self.date.is_some()
            || self.start_time.is_some()
            || self.end_time.is_some()
            || self.location_name.is_some()
            || self.location_address.is_some()
            || self.notes.is_some()
    }

    pub fn apply(self, gig: &mut Gig, now: DateTime<Utc>) {
        if let Some(title) = mapping::non_empty(self.title) {
            gig.title = title;
        }
        if let Some(date) = self.date {
            gig.date = date;
        }
        if self.start_time.is_some() {
            gig.start_time = self.start_time;
        }
        if self.end_time.is_some() {
            gig.end_time = self.end_time;
        }
        if self.location_name.is_some() {
            gig.location_name = mapping::non_empty(self.location_name);
        }
        if self.location_address.is_some() {
            gig.location_address = mapping::non_empty(self.location_address);
        }
        if let Some(status) = self.status {
            gig.status = status;
        }
        if self.notes.is_some() {
            gig.notes = mapping::non_empty(self.notes);
        }
        if self.poster_skin.is_some() {
            gig.poster_skin = mapping::poster_skin(self.poster_skin);
        }
        if self.fee_cents.is_some() {
            gig.fee_cents = self.fee_cents;
        }
        if self.currency.is_some() {
            gig.currency = mapping::currency(self.currency);
        }
        if self.band_id.is_some() {
            gig.band_id = mapping::non_empty(self.band_id);
        }
        gig.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_gig() -> NewGig {
        NewGig {
            title: "  ".into(),
            date: NaiveDate::from_ymd_opt(2025, 6, 14).unwrap(),
            start_time: None,
            end_time: None,
            location_name: Some("".into()),
            location_address: None,
            status: None,
            notes: None,
            poster_skin: None,
            fee_cents: Some(50_000),
            currency: Some("gbp".into()),
            band_id: None,
        }
    }

    #[test]
    fn from_new_applies_defaults() {
        let gig = Gig::from_new("owner-1", new_gig(), Utc::now());
        assert_eq!(gig.title, "Untitled gig");
        assert_eq!(gig.status, GigStatus::Draft);
        assert_eq!(gig.poster_skin, "clean");
        assert_eq!(gig.currency, "GBP");
        assert_eq!(gig.location_name, None);
        assert!(gig.is_owned_by("owner-1"));
    }

    #[test]
    fn update_leaves_missing_fields_alone() {
        let mut gig = Gig::from_new("owner-1", new_gig(), Utc::now());
        let update = GigUpdate {
            title: Some("Jazz Brunch".into()),
            poster_skin: Some(String::new()),
            ..GigUpdate::default()
        };
        assert!(update.touches_schedule());
        update.apply(&mut gig, Utc::now());
        assert_eq!(gig.title, "Jazz Brunch");
        assert_eq!(gig.poster_skin, "clean");
        assert_eq!(gig.fee_cents, Some(50_000));
    }

    #[test]
    fn serializes_camel_case() {
        let gig = Gig::from_new("owner-1", new_gig(), Utc::now());
        let json = serde_json::to_value(&gig).unwrap();
        assert_eq!(json["posterSkin"], "clean");
        assert_eq!(json["ownerId"], "owner-1");
        assert_eq!(json["status"], "draft");
    }
}
