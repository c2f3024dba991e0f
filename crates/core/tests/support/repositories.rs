//! In-memory repository ports
//!
//! Each mock keeps its rows in a `Mutex<Vec<_>>` and implements the trait the
//! way the SQLite adapters do, including the `Conflict` on duplicate keys.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use encore_core::{
    ActivityRepository, CalendarConnectionRepository, DashboardRepository, GigPackRepository,
    GigRepository, NotificationRepository, ObjectStorage, ProfileRepository, ReadinessRepository,
    RoleRepository, SyncLogRepository,
};
use encore_domain::{
    ActivityEntry, CalendarConnection, DashboardGig, EncoreError, Gig, GigContact, GigMaterial,
    GigReadiness, GigRole, Invitation, Notification, Profile, Result as DomainResult, ScheduleItem, SetlistItem,
    SyncLogEntry,
};

#[derive(Default)]
pub struct InMemoryGigs {
    rows: Mutex<Vec<Gig>>,
}

impl InMemoryGigs {
    pub fn put(&self, gig: Gig) {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|g| g.id != gig.id);
        rows.push(gig);
    }

    pub fn get(&self, id: &str) -> Option<Gig> {
        self.rows.lock().unwrap().iter().find(|g| g.id == id).cloned()
    }

    pub fn all(&self) -> Vec<Gig> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl GigRepository for InMemoryGigs {
    async fn insert(&self, gig: &Gig) -> DomainResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let duplicate_import = gig.external_calendar_event_id.is_some()
            && rows.iter().any(|g| {
                g.owner_id == gig.owner_id
                    && g.external_calendar_event_id == gig.external_calendar_event_id
            });
        if duplicate_import {
            return Err(EncoreError::Conflict("Event already imported".into()));
        }
        rows.push(gig.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Gig>> {
        Ok(self.get(id))
    }

    async fn update(&self, gig: &Gig) -> DomainResult<()> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|g| g.id == gig.id) {
            Some(row) => {
                *row = gig.clone();
                Ok(())
            }
            None => Err(EncoreError::NotFound("Gig not found".into())),
        }
    }

    async fn delete(&self, id: &str) -> DomainResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|g| g.id != id);
        Ok(rows.len() != before)
    }

    async fn list_by_owner(&self, owner_id: &str) -> DomainResult<Vec<Gig>> {
        Ok(self.all().into_iter().filter(|g| g.owner_id == owner_id).collect())
    }

    async fn find_by_external_event(
        &self,
        owner_id: &str,
        event_id: &str,
    ) -> DomainResult<Option<Gig>> {
        Ok(self.all().into_iter().find(|g| {
            g.owner_id == owner_id && g.external_calendar_event_id.as_deref() == Some(event_id)
        }))
    }

    async fn list_imported(&self, owner_id: &str) -> DomainResult<Vec<Gig>> {
        Ok(self
            .all()
            .into_iter()
            .filter(|g| g.owner_id == owner_id && g.is_imported() && !g.is_cancelled())
            .collect())
    }

    async fn list_for_user_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DomainResult<Vec<Gig>> {
        Ok(self
            .all()
            .into_iter()
            .filter(|g| g.owner_id == user_id && g.date >= from && g.date <= to)
            .collect())
    }

    async fn count_calendar_linked(&self, owner_id: &str) -> DomainResult<u32> {
        Ok(self
            .all()
            .iter()
            .filter(|g| g.owner_id == owner_id && g.calendar_event_id.is_some())
            .count() as u32)
    }
}

pub struct InMemoryRoles {
    rows: Mutex<Vec<GigRole>>,
    gigs: Arc<InMemoryGigs>,
}

impl InMemoryRoles {
    pub fn new(gigs: Arc<InMemoryGigs>) -> Self {
        Self { rows: Mutex::new(Vec::new()), gigs }
    }

    pub fn put(&self, role: GigRole) {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|r| r.id != role.id);
        rows.push(role);
    }

    pub fn get(&self, id: &str) -> Option<GigRole> {
        self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned()
    }

    pub fn for_gig(&self, gig_id: &str) -> Vec<GigRole> {
        self.rows.lock().unwrap().iter().filter(|r| r.gig_id == gig_id).cloned().collect()
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoles {
    async fn insert(&self, role: &GigRole) -> DomainResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let duplicate = role.musician_id.is_some()
            && rows.iter().any(|r| r.gig_id == role.gig_id && r.musician_id == role.musician_id);
        if duplicate {
            return Err(EncoreError::Conflict("Role already exists".into()));
        }
        rows.push(role.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<GigRole>> {
        Ok(self.get(id))
    }

    async fn update(&self, role: &GigRole) -> DomainResult<()> {
        self.put(role.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> DomainResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.id != id);
        Ok(rows.len() != before)
    }

    async fn list_by_gig(&self, gig_id: &str) -> DomainResult<Vec<GigRole>> {
        Ok(self.for_gig(gig_id))
    }

    async fn find_for_musician(
        &self,
        gig_id: &str,
        musician_id: &str,
    ) -> DomainResult<Option<GigRole>> {
        Ok(self.for_gig(gig_id).into_iter().find(|r| r.belongs_to(musician_id)))
    }

    async fn list_invitations(&self, musician_id: &str) -> DomainResult<Vec<Invitation>> {
        let roles: Vec<GigRole> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.belongs_to(musician_id))
            .cloned()
            .collect();
        Ok(roles
            .into_iter()
            .filter_map(|role| self.gigs.get(&role.gig_id).map(|gig| Invitation { role, gig }))
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryActivity {
    rows: Mutex<Vec<ActivityEntry>>,
}

impl InMemoryActivity {
    pub fn all(&self) -> Vec<ActivityEntry> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActivityRepository for InMemoryActivity {
    async fn insert(&self, entry: &ActivityEntry) -> DomainResult<()> {
        self.rows.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn list_by_gig(&self, gig_id: &str, limit: u32) -> DomainResult<Vec<ActivityEntry>> {
        let mut rows: Vec<_> = self.all().into_iter().filter(|e| e.gig_id == gig_id).collect();
        rows.reverse();
        rows.truncate(limit as usize);
        Ok(rows)
    }
}

/// Notification store with switchable failures for the fallback paths.
#[derive(Default)]
pub struct InMemoryNotifications {
    rows: Mutex<Vec<Notification>>,
    pub fail_upsert: AtomicBool,
    pub fail_insert: AtomicBool,
}

impl InMemoryNotifications {
    pub fn all(&self) -> Vec<Notification> {
        self.rows.lock().unwrap().clone()
    }

    pub fn for_user(&self, user_id: &str) -> Vec<Notification> {
        self.all().into_iter().filter(|n| n.user_id == user_id).collect()
    }

    pub fn fail_upserts(&self) {
        self.fail_upsert.store(true, Ordering::SeqCst);
    }

    pub fn fail_inserts(&self) {
        self.fail_insert.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotifications {
    async fn create_or_update(&self, notification: &Notification) -> DomainResult<Notification> {
        if self.fail_upsert.load(Ordering::SeqCst) {
            return Err(EncoreError::Database("no unique index on dedupe_key".into()));
        }
        let mut rows = self.rows.lock().unwrap();
        let existing = notification.dedupe_key.as_ref().and_then(|key| {
            rows.iter().position(|n| {
                n.user_id == notification.user_id && n.dedupe_key.as_ref() == Some(key)
            })
        });
        match existing {
            Some(index) => {
                let row = &mut rows[index];
                row.title = notification.title.clone();
                row.body = notification.body.clone();
                row.read = false;
                row.updated_at = notification.updated_at;
                Ok(row.clone())
            }
            None => {
                rows.push(notification.clone());
                Ok(notification.clone())
            }
        }
    }

    async fn insert(&self, notification: &Notification) -> DomainResult<()> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(EncoreError::Database("disk full".into()));
        }
        self.rows.lock().unwrap().push(notification.clone());
        Ok(())
    }

    async fn list(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: u32,
    ) -> DomainResult<Vec<Notification>> {
        let mut rows: Vec<_> = self
            .for_user(user_id)
            .into_iter()
            .filter(|n| !unread_only || !n.read)
            .collect();
        rows.reverse();
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn mark_read(&self, user_id: &str, id: &str) -> DomainResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|n| n.id == id && n.user_id == user_id) {
            Some(row) => {
                row.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: &str) -> DomainResult<u32> {
        let mut rows = self.rows.lock().unwrap();
        let mut count = 0;
        for row in rows.iter_mut().filter(|n| n.user_id == user_id && !n.read) {
            row.read = true;
            count += 1;
        }
        Ok(count)
    }

    async fn unread_count(&self, user_id: &str) -> DomainResult<u32> {
        Ok(self.for_user(user_id).iter().filter(|n| !n.read).count() as u32)
    }
}

/// Aggregate query that always fails, forcing the dashboard fallback.
pub struct FailingDashboard;

#[async_trait]
impl DashboardRepository for FailingDashboard {
    async fn list_dashboard_gigs(
        &self,
        _user_id: &str,
        _today: NaiveDate,
    ) -> DomainResult<Vec<DashboardGig>> {
        Err(EncoreError::Database("function get_dashboard_gigs does not exist".into()))
    }

    async fn list_past_gigs(
        &self,
        _user_id: &str,
        _today: NaiveDate,
        _limit: u32,
        _offset: u32,
    ) -> DomainResult<Vec<DashboardGig>> {
        Err(EncoreError::Database("function get_past_gigs does not exist".into()))
    }
}

#[derive(Default)]
pub struct InMemoryGigPack {
    schedule: Mutex<Vec<ScheduleItem>>,
    setlist: Mutex<Vec<SetlistItem>>,
    materials: Mutex<Vec<GigMaterial>>,
    contacts: Mutex<Vec<GigContact>>,
    pub fail_material_insert: AtomicBool,
}

#[async_trait]
impl GigPackRepository for InMemoryGigPack {
    async fn list_schedule(&self, gig_id: &str) -> DomainResult<Vec<ScheduleItem>> {
        let mut rows: Vec<_> =
            self.schedule.lock().unwrap().iter().filter(|s| s.gig_id == gig_id).cloned().collect();
        rows.sort_by_key(|s| s.position);
        Ok(rows)
    }

    async fn insert_schedule_item(&self, item: &ScheduleItem) -> DomainResult<()> {
        self.schedule.lock().unwrap().push(item.clone());
        Ok(())
    }

    async fn delete_schedule_item(&self, gig_id: &str, item_id: &str) -> DomainResult<bool> {
        let mut rows = self.schedule.lock().unwrap();
        let before = rows.len();
        rows.retain(|s| !(s.gig_id == gig_id && s.id == item_id));
        Ok(rows.len() != before)
    }

    async fn list_setlist(&self, gig_id: &str) -> DomainResult<Vec<SetlistItem>> {
        let mut rows: Vec<_> =
            self.setlist.lock().unwrap().iter().filter(|s| s.gig_id == gig_id).cloned().collect();
        rows.sort_by_key(|s| s.position);
        Ok(rows)
    }

    async fn replace_setlist(&self, gig_id: &str, items: &[SetlistItem]) -> DomainResult<()> {
        let mut rows = self.setlist.lock().unwrap();
        rows.retain(|s| s.gig_id != gig_id);
        rows.extend(items.iter().cloned());
        Ok(())
    }

    async fn list_materials(&self, gig_id: &str) -> DomainResult<Vec<GigMaterial>> {
        Ok(self.materials.lock().unwrap().iter().filter(|m| m.gig_id == gig_id).cloned().collect())
    }

    async fn insert_material(&self, material: &GigMaterial) -> DomainResult<()> {
        if self.fail_material_insert.load(Ordering::SeqCst) {
            return Err(EncoreError::Database("insert failed".into()));
        }
        self.materials.lock().unwrap().push(material.clone());
        Ok(())
    }

    async fn delete_material(
        &self,
        gig_id: &str,
        material_id: &str,
    ) -> DomainResult<Option<GigMaterial>> {
        let mut rows = self.materials.lock().unwrap();
        let position = rows.iter().position(|m| m.gig_id == gig_id && m.id == material_id);
        Ok(position.map(|index| rows.remove(index)))
    }

    async fn list_contacts(&self, gig_id: &str) -> DomainResult<Vec<GigContact>> {
        Ok(self.contacts.lock().unwrap().iter().filter(|c| c.gig_id == gig_id).cloned().collect())
    }

    async fn insert_contact(&self, contact: &GigContact) -> DomainResult<()> {
        self.contacts.lock().unwrap().push(contact.clone());
        Ok(())
    }

    async fn delete_contact(&self, gig_id: &str, contact_id: &str) -> DomainResult<bool> {
        let mut rows = self.contacts.lock().unwrap();
        let before = rows.len();
        rows.retain(|c| !(c.gig_id == gig_id && c.id == contact_id));
        Ok(rows.len() != before)
    }
}

/// Object storage keeping uploads in memory.
#[derive(Default)]
pub struct InMemoryStorage {
    objects: Mutex<Vec<(String, Vec<u8>)>>,
}

impl InMemoryStorage {
    pub fn paths(&self) -> Vec<String> {
        self.objects.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
    }
}

#[async_trait]
impl ObjectStorage for InMemoryStorage {
    async fn put(&self, path: &str, bytes: Vec<u8>, _content_type: &str) -> DomainResult<String> {
        self.objects.lock().unwrap().push((path.to_string(), bytes));
        Ok(format!("https://files.test/{path}"))
    }

    async fn delete(&self, path: &str) -> DomainResult<()> {
        self.objects.lock().unwrap().retain(|(p, _)| p != path);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryConnections {
    rows: Mutex<Vec<CalendarConnection>>,
}

impl InMemoryConnections {
    pub fn get(&self, user_id: &str) -> Option<CalendarConnection> {
        self.rows.lock().unwrap().iter().find(|c| c.user_id == user_id).cloned()
    }

    pub fn put(&self, connection: CalendarConnection) {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|c| !(c.user_id == connection.user_id && c.provider == connection.provider));
        rows.push(connection);
    }
}

#[async_trait]
impl CalendarConnectionRepository for InMemoryConnections {
    async fn find(&self, user_id: &str, provider: &str) -> DomainResult<Option<CalendarConnection>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.user_id == user_id && c.provider == provider)
            .cloned())
    }

    async fn upsert(&self, connection: &CalendarConnection) -> DomainResult<()> {
        self.put(connection.clone());
        Ok(())
    }

    async fn delete(&self, user_id: &str, provider: &str) -> DomainResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|c| !(c.user_id == user_id && c.provider == provider));
        Ok(rows.len() != before)
    }

    async fn find_by_watch_channel(
        &self,
        channel_id: &str,
    ) -> DomainResult<Option<CalendarConnection>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.watch_channel_id.as_deref() == Some(channel_id))
            .cloned())
    }

    async fn list_with_expiring_watch(
        &self,
        before: DateTime<Utc>,
    ) -> DomainResult<Vec<CalendarConnection>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.sync_enabled && c.watch_expires_at.map_or(true, |exp| exp < before))
            .cloned()
            .collect())
    }

    async fn list_sync_enabled(&self) -> DomainResult<Vec<CalendarConnection>> {
        Ok(self.rows.lock().unwrap().iter().filter(|c| c.sync_enabled).cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemorySyncLog {
    rows: Mutex<Vec<SyncLogEntry>>,
}

impl InMemorySyncLog {
    pub fn all(&self) -> Vec<SyncLogEntry> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl SyncLogRepository for InMemorySyncLog {
    async fn insert(&self, entry: &SyncLogEntry) -> DomainResult<()> {
        self.rows.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str, limit: u32) -> DomainResult<Vec<SyncLogEntry>> {
        let mut rows: Vec<_> = self.all().into_iter().filter(|e| e.user_id == user_id).collect();
        rows.reverse();
        rows.truncate(limit as usize);
        Ok(rows)
    }
}

#[derive(Default)]
pub struct InMemoryProfiles {
    rows: Mutex<Vec<Profile>>,
}

#[async_trait]
impl ProfileRepository for InMemoryProfiles {
    async fn find(&self, user_id: &str) -> DomainResult<Option<Profile>> {
        Ok(self.rows.lock().unwrap().iter().find(|p| p.id == user_id).cloned())
    }

    async fn upsert(&self, profile: &Profile) -> DomainResult<()> {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|p| p.id != profile.id);
        rows.push(profile.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryReadiness {
    rows: Mutex<Vec<GigReadiness>>,
}

#[async_trait]
impl ReadinessRepository for InMemoryReadiness {
    async fn find(&self, gig_id: &str, musician_id: &str) -> DomainResult<Option<GigReadiness>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.gig_id == gig_id && r.musician_id == musician_id)
            .cloned())
    }

    async fn upsert(&self, readiness: &GigReadiness) -> DomainResult<()> {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|r| !(r.gig_id == readiness.gig_id && r.musician_id == readiness.musician_id));
        rows.push(readiness.clone());
        Ok(())
    }

    async fn list_by_gig(&self, gig_id: &str) -> DomainResult<Vec<GigReadiness>> {
        Ok(self.rows.lock().unwrap().iter().filter(|r| r.gig_id == gig_id).cloned().collect())
    }
}
