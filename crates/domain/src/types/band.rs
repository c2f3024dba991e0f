//! Bands and musician profiles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mapping;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Band {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub poster_skin: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BandInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub poster_skin: Option<String>,
}

impl Band {
    pub fn from_input(owner_id: &str, name: String, input: BandInput, now: DateTime<Utc>) -> Self {
        Self {
            id: super::new_id(),
            owner_id: owner_id.to_string(),
            name,
            description: mapping::non_empty(input.description),
            poster_skin: mapping::poster_skin(input.poster_skin),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, input: BandInput, now: DateTime<Utc>) {
        if let Some(name) = mapping::non_empty(input.name) {
            self.name = name;
        }
        if input.description.is_some() {
            self.description = mapping::non_empty(input.description);
        }
        if input.poster_skin.is_some() {
            self.poster_skin = mapping::poster_skin(input.poster_skin);
        }
        self.updated_at = now;
    }
}

/// Public profile of an Encore user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub instrument: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub instrument: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

impl Profile {
    pub fn empty(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: user_id.to_string(),
            display_name: String::new(),
            email: None,
            instrument: None,
            phone: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, update: ProfileUpdate, now: DateTime<Utc>) {
        if update.display_name.is_some() {
            self.display_name = mapping::text_or(update.display_name, "");
        }
        if update.email.is_some() {
            self.email = mapping::non_empty(update.email).map(|e| e.to_lowercase());
        }
        if update.instrument.is_some() {
            self.instrument = mapping::non_empty(update.instrument);
        }
        if update.phone.is_some() {
            self.phone = mapping::non_empty(update.phone);
        }
        if update.avatar_url.is_some() {
            self.avatar_url = mapping::non_empty(update.avatar_url);
        }
        self.updated_at = now;
    }
}
