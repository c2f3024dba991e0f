//! Gig pack content: schedule, setlist, materials, contacts

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Gig, InvitationStatus};
use crate::impl_domain_status_conversions;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItem {
    pub id: String,
    pub gig_id: String,
    pub time: Option<NaiveTime>,
    pub label: String,
    pub notes: Option<String>,
    pub position: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewScheduleItem {
    pub time: Option<NaiveTime>,
    pub label: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetlistItem {
    pub id: String,
    pub gig_id: String,
    pub position: u32,
    pub title: String,
    pub artist: Option<String>,
    pub song_key: Option<String>,
    pub bpm: Option<u32>,
    pub duration_seconds: Option<u32>,
    pub notes: Option<String>,
}

/// One song in a setlist replacement request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SetlistEntry {
    pub title: String,
    pub artist: Option<String>,
    pub song_key: Option<String>,
    pub bpm: Option<u32>,
    pub duration_seconds: Option<u32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialKind {
    SetlistPdf,
    Chart,
    Recording,
    Link,
    Other,
}

impl_domain_status_conversions!(MaterialKind {
    SetlistPdf => "setlist_pdf",
    Chart => "chart",
    Recording => "recording",
    Link => "link",
    Other => "other",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GigMaterial {
    pub id: String,
    pub gig_id: String,
    pub kind: MaterialKind,
    pub label: String,
    pub url: Option<String>,
    /// Object-storage path for uploaded files.
    pub storage_path: Option<String>,
    pub uploaded_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMaterial {
    pub kind: MaterialKind,
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GigContact {
    pub id: String,
    pub gig_id: String,
    pub name: String,
    pub role: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewContact {
    pub name: String,
    pub role: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineupMember {
    pub role_id: String,
    pub role_name: String,
    pub musician_name: String,
    pub invitation_status: InvitationStatus,
}

/// Read-only bundle of everything a musician needs on the night
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GigPack {
    pub gig: Gig,
    pub schedule: Vec<ScheduleItem>,
    pub setlist: Vec<SetlistItem>,
    pub materials: Vec<GigMaterial>,
    pub contacts: Vec<GigContact>,
    pub lineup: Vec<LineupMember>,
}
