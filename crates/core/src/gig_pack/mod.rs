//! Gig pack: schedule, setlist, materials, contacts and lineup

pub mod ports;
mod upload;

pub use upload::{setlist_pdf_path, validate_setlist_pdf};

use std::sync::Arc;

use chrono::Utc;
use encore_domain::constants::PDF_CONTENT_TYPE;
use encore_domain::mapping;
use encore_domain::{
    new_id, ActivityType, EncoreError, GigContact, GigMaterial, GigPack, InvitationStatus,
    LineupMember, MaterialKind, NewContact, NewMaterial, NewScheduleItem, Result, ScheduleItem,
    SetlistEntry, SetlistItem,
};
use serde_json::json;
use tracing::{info, instrument, warn};

use self::ports::{GigPackRepository, ObjectStorage};
use crate::access::GigAccess;
use crate::activity::ActivityLogger;

pub struct GigPackService {
    repository: Arc<dyn GigPackRepository>,
    storage: Arc<dyn ObjectStorage>,
    access: GigAccess,
    activity: ActivityLogger,
}

impl GigPackService {
    pub fn new(
        repository: Arc<dyn GigPackRepository>,
        storage: Arc<dyn ObjectStorage>,
        access: GigAccess,
        activity: ActivityLogger,
    ) -> Self {
        Self { repository, storage, access, activity }
    }

    /// Everything a musician needs for the night, in one read.
    pub async fn get_gig_pack(&self, user_id: &str, gig_id: &str) -> Result<GigPack> {
        let membership = self.access.visible(user_id, gig_id).await?;

        let schedule = self.repository.list_schedule(gig_id).await?;
        let setlist = self.repository.list_setlist(gig_id).await?;
        let materials = self.repository.list_materials(gig_id).await?;
        let contacts = self.repository.list_contacts(gig_id).await?;
        let lineup = self
            .access
            .roles()
            .list_by_gig(gig_id)
            .await?
            .into_iter()
            .filter(|role| role.invitation_status != InvitationStatus::Declined)
            .map(|role| LineupMember {
                musician_name: role.display_name().to_string(),
                role_id: role.id,
                role_name: role.role_name,
                invitation_status: role.invitation_status,
            })
            .collect();

        Ok(GigPack { gig: membership.gig, schedule, setlist, materials, contacts, lineup })
    }

    /// Replace the setlist; positions are renumbered from 1 in input order.
    #[instrument(skip(self, entries), fields(owner_id = %owner_id, gig_id = %gig_id, songs = entries.len()))]
    pub async fn replace_setlist(
        &self,
        owner_id: &str,
        gig_id: &str,
        entries: Vec<SetlistEntry>,
    ) -> Result<Vec<SetlistItem>> {
        self.access.owned(owner_id, gig_id).await?;
        if let Some(index) = entries.iter().position(|e| e.title.trim().is_empty()) {
            return Err(EncoreError::InvalidInput(format!(
                "Setlist entry {} needs a title",
                index + 1
            )));
        }

        let items: Vec<SetlistItem> = entries
            .into_iter()
            .zip(1u32..)
            .map(|(entry, position)| SetlistItem {
                id: new_id(),
                gig_id: gig_id.to_string(),
                position,
                title: entry.title.trim().to_string(),
                artist: mapping::non_empty(entry.artist),
                song_key: mapping::non_empty(entry.song_key),
                bpm: entry.bpm,
                duration_seconds: entry.duration_seconds,
                notes: mapping::non_empty(entry.notes),
            })
            .collect();

        self.repository.replace_setlist(gig_id, &items).await?;
        self.activity
            .record(
                gig_id,
                owner_id,
                ActivityType::SetlistUpdated,
                format!("Setlist updated ({} songs)", items.len()),
                json!({ "songs": items.len() }),
            )
            .await;
        Ok(items)
    }

    pub async fn add_schedule_item(
        &self,
        owner_id: &str,
        gig_id: &str,
        input: NewScheduleItem,
    ) -> Result<ScheduleItem> {
        self.access.owned(owner_id, gig_id).await?;
        let label = input.label.trim();
        if label.is_empty() {
            return Err(EncoreError::InvalidInput("Schedule item needs a label".to_string()));
        }

        let existing = self.repository.list_schedule(gig_id).await?;
        let position = existing.iter().map(|i| i.position).max().unwrap_or(0) + 1;
        let item = ScheduleItem {
            id: new_id(),
            gig_id: gig_id.to_string(),
            time: input.time,
            label: label.to_string(),
            notes: mapping::non_empty(input.notes),
            position,
        };
        self.repository.insert_schedule_item(&item).await?;
        Ok(item)
    }

    pub async fn remove_schedule_item(
        &self,
        owner_id: &str,
        gig_id: &str,
        item_id: &str,
    ) -> Result<()> {
        self.access.owned(owner_id, gig_id).await?;
        if self.repository.delete_schedule_item(gig_id, item_id).await? {
            Ok(())
        } else {
            Err(EncoreError::NotFound("Schedule item not found".to_string()))
        }
    }

    pub async fn add_contact(
        &self,
        owner_id: &str,
        gig_id: &str,
        input: NewContact,
    ) -> Result<GigContact> {
        self.access.owned(owner_id, gig_id).await?;
        let name = input.name.trim();
        if name.is_empty() {
            return Err(EncoreError::InvalidInput("Contact name is required".to_string()));
        }
        let contact = GigContact {
            id: new_id(),
            gig_id: gig_id.to_string(),
            name: name.to_string(),
            role: mapping::non_empty(input.role),
            phone: mapping::non_empty(input.phone),
            email: mapping::non_empty(input.email).map(|e| e.to_lowercase()),
        };
        self.repository.insert_contact(&contact).await?;
        Ok(contact)
    }

    pub async fn remove_contact(&self, owner_id: &str, gig_id: &str, contact_id: &str) -> Result<()> {
        self.access.owned(owner_id, gig_id).await?;
        if self.repository.delete_contact(gig_id, contact_id).await? {
            Ok(())
        } else {
            Err(EncoreError::NotFound("Contact not found".to_string()))
        }
    }

    /// Attach a link (chart, recording, ...) to the gig.
    pub async fn add_material(
        &self,
        owner_id: &str,
        gig_id: &str,
        input: NewMaterial,
    ) -> Result<GigMaterial> {
        self.access.owned(owner_id, gig_id).await?;
        let url = input.url.trim();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(EncoreError::InvalidInput("Material URL must be http(s)".to_string()));
        }
        let material = GigMaterial {
            id: new_id(),
            gig_id: gig_id.to_string(),
            kind: input.kind,
            label: mapping::text_or(Some(input.label), input.kind.as_str()),
            url: Some(url.to_string()),
            storage_path: None,
            uploaded_by: owner_id.to_string(),
            created_at: Utc::now(),
        };
        self.repository.insert_material(&material).await?;
        Ok(material)
    }

    /// Remove a material; a stored file is deleted best-effort.
    pub async fn remove_material(
        &self,
        owner_id: &str,
        gig_id: &str,
        material_id: &str,
    ) -> Result<()> {
        self.access.owned(owner_id, gig_id).await?;
        let removed = self
            .repository
            .delete_material(gig_id, material_id)
            .await?
            .ok_or_else(|| EncoreError::NotFound("Material not found".to_string()))?;

        if let Some(path) = removed.storage_path.as_deref() {
            if let Err(err) = self.storage.delete(path).await {
                warn!(path, error = %err, "failed to delete stored material");
            }
        }
        Ok(())
    }

    /// Store a setlist PDF and attach it to the gig as a material.
    #[instrument(skip(self, bytes), fields(owner_id = %owner_id, gig_id = %gig_id, size = bytes.len()))]
    pub async fn upload_setlist_pdf(
        &self,
        owner_id: &str,
        gig_id: &str,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<GigMaterial> {
        self.access.owned(owner_id, gig_id).await?;
        validate_setlist_pdf(content_type, &bytes)?;

        let now = Utc::now();
        let path = setlist_pdf_path(gig_id, now);
        let url = self.storage.put(&path, bytes, PDF_CONTENT_TYPE).await?;

        let material = GigMaterial {
            id: new_id(),
            gig_id: gig_id.to_string(),
            kind: MaterialKind::SetlistPdf,
            label: mapping::text_or(Some(filename.to_string()), "Setlist.pdf"),
            url: Some(url),
            storage_path: Some(path.clone()),
            uploaded_by: owner_id.to_string(),
            created_at: now,
        };

        if let Err(err) = self.repository.insert_material(&material).await {
            if let Err(cleanup) = self.storage.delete(&path).await {
                warn!(path = %path, error = %cleanup, "failed to remove orphaned upload");
            }
            return Err(err);
        }

        self.activity
            .record(
                gig_id,
                owner_id,
                ActivityType::FileUploaded,
                format!("Uploaded setlist PDF \"{}\"", material.label),
                json!({ "materialId": material.id, "path": path }),
            )
            .await;

        info!(material_id = %material.id, "setlist PDF uploaded");
        Ok(material)
    }
}
