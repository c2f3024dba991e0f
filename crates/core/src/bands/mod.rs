//! Bands and musician profiles

pub mod ports;

use std::sync::Arc;

use chrono::Utc;
use encore_domain::{Band, BandInput, EncoreError, Profile, ProfileUpdate, Result};
use tracing::info;

use self::ports::{BandRepository, ProfileRepository};
use crate::roles::is_valid_email;

pub struct BandService {
    repository: Arc<dyn BandRepository>,
}

impl BandService {
    pub fn new(repository: Arc<dyn BandRepository>) -> Self {
        Self { repository }
    }

    pub async fn create_band(&self, owner_id: &str, input: BandInput) -> Result<Band> {
        let name = encore_domain::mapping::non_empty(input.name.clone())
            .ok_or_else(|| EncoreError::InvalidInput("Band name is required".to_string()))?;
        let band = Band::from_input(owner_id, name, input, Utc::now());
        self.repository.insert(&band).await?;
        info!(band_id = %band.id, "band created");
        Ok(band)
    }

    pub async fn list_bands(&self, owner_id: &str) -> Result<Vec<Band>> {
        self.repository.list_by_owner(owner_id).await
    }

    pub async fn update_band(&self, owner_id: &str, band_id: &str, input: BandInput) -> Result<Band> {
        let mut band = self.owned(owner_id, band_id).await?;
        band.apply(input, Utc::now());
        self.repository.update(&band).await?;
        Ok(band)
    }

    pub async fn delete_band(&self, owner_id: &str, band_id: &str) -> Result<()> {
        let band = self.owned(owner_id, band_id).await?;
        self.repository.delete(&band.id).await?;
        Ok(())
    }

    async fn owned(&self, owner_id: &str, band_id: &str) -> Result<Band> {
        let band = self
            .repository
            .find_by_id(band_id)
            .await?
            .ok_or_else(|| EncoreError::NotFound("Band not found".to_string()))?;
        if band.owner_id != owner_id {
            return Err(EncoreError::PermissionDenied(
                "Only the band owner can do that".to_string(),
            ));
        }
        Ok(band)
    }
}

pub struct ProfileService {
    repository: Arc<dyn ProfileRepository>,
}

impl ProfileService {
    pub fn new(repository: Arc<dyn ProfileRepository>) -> Self {
        Self { repository }
    }

    /// The stored profile, or an empty one for a user who never saved theirs.
    pub async fn get_profile(&self, user_id: &str) -> Result<Profile> {
        Ok(self
            .repository
            .find(user_id)
            .await?
            .unwrap_or_else(|| Profile::empty(user_id, Utc::now())))
    }

    pub async fn upsert_profile(&self, user_id: &str, update: ProfileUpdate) -> Result<Profile> {
        if let Some(email) = update.email.as_deref().map(str::trim) {
            if !email.is_empty() && !is_valid_email(email) {
                return Err(EncoreError::InvalidInput(format!("Invalid e-mail address: {email}")));
            }
        }
        let mut profile = self.get_profile(user_id).await?;
        profile.apply(update, Utc::now());
        self.repository.upsert(&profile).await?;
        Ok(profile)
    }
}
