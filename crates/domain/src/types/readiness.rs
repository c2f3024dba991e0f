//! Per-musician readiness checklist

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GigReadiness {
    pub id: String,
    pub gig_id: String,
    pub musician_id: String,
    pub songs_total: u32,
    pub songs_learned: u32,
    pub charts_ready: bool,
    pub sounds_ready: bool,
    pub travel_checked: bool,
    pub gear_packed: bool,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl GigReadiness {
    /// Empty checklist for a musician who has not touched it yet.
    pub fn blank(gig_id: &str, musician_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: super::new_id(),
            gig_id: gig_id.to_string(),
            musician_id: musician_id.to_string(),
            songs_total: 0,
            songs_learned: 0,
            charts_ready: false,
            sounds_ready: false,
            travel_checked: false,
            gear_packed: false,
            notes: None,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, update: ReadinessUpdate, now: DateTime<Utc>) {
        if let Some(total) = update.songs_total {
            self.songs_total = total;
        }
        if let Some(learned) = update.songs_learned {
            self.songs_learned = learned;
        }
        self.songs_learned = self.songs_learned.min(self.songs_total);
        if let Some(v) = update.charts_ready {
            self.charts_ready = v;
        }
        if let Some(v) = update.sounds_ready {
            self.sounds_ready = v;
        }
        if let Some(v) = update.travel_checked {
            self.travel_checked = v;
        }
        if let Some(v) = update.gear_packed {
            self.gear_packed = v;
        }
        if update.notes.is_some() {
            self.notes = crate::mapping::non_empty(update.notes);
        }
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadinessUpdate {
    pub songs_total: Option<u32>,
    pub songs_learned: Option<u32>,
    pub charts_ready: Option<bool>,
    pub sounds_ready: Option<bool>,
    pub travel_checked: Option<bool>,
    pub gear_packed: Option<bool>,
    pub notes: Option<String>,
}

/// Derived percentages, each 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessScore {
    pub songs_percent: u8,
    pub checklist_percent: u8,
    pub overall: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessReport {
    pub readiness: GigReadiness,
    pub score: ReadinessScore,
}
