//! Dashboard visibility rules, shared by the fallback path and tests

use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::NaiveDate;
use encore_domain::{DashboardGig, Gig, GigRole, Invitation, InvitationStatus, LineupStats};

/// Lineup counters for one gig: active roles and accepted roles.
pub fn lineup_stats(gig_id: &str, roles: &[GigRole]) -> LineupStats {
    let active = roles.iter().filter(|r| r.invitation_status.is_active());
    let (lineup_count, accepted_count) = active.fold((0u32, 0u32), |(all, accepted), role| {
        let is_accepted = role.invitation_status == InvitationStatus::Accepted;
        (all + 1, accepted + u32::from(is_accepted))
    });
    LineupStats { gig_id: gig_id.to_string(), lineup_count, accepted_count }
}

/// Merge owned gigs with the user's memberships.
///
/// The owner always sees their gigs. Memberships whose invitation is still
/// pending or was declined are dropped. Each gig appears once; lineup counts
/// come from `stats` (missing entries count as zero). Rows are unsorted.
pub fn filter_dashboard_gigs(
    user_id: &str,
    owned: Vec<Gig>,
    memberships: Vec<Invitation>,
    stats: &HashMap<String, LineupStats>,
) -> Vec<DashboardGig> {
    let mut my_roles: HashMap<String, GigRole> = HashMap::new();
    let mut member_gigs: Vec<Gig> = Vec::new();
    for Invitation { role, gig } in memberships {
        if !role.belongs_to(user_id) {
            continue;
        }
        if !gig.is_owned_by(user_id) && role.invitation_status.shows_on_dashboard() {
            member_gigs.push(gig);
        }
        my_roles.insert(role.gig_id.clone(), role);
    }

    let owned = owned.into_iter().filter(|g| g.is_owned_by(user_id)).map(|g| (g, true));
    let members = member_gigs.into_iter().map(|g| (g, false));

    let mut seen: Vec<String> = Vec::new();
    let mut rows = Vec::new();
    for (gig, is_owner) in owned.chain(members) {
        if seen.contains(&gig.id) {
            continue;
        }
        seen.push(gig.id.clone());

        let role = my_roles.get(&gig.id);
        let counts = stats.get(&gig.id);
        rows.push(DashboardGig {
            is_owner,
            my_role_id: role.map(|r| r.id.clone()),
            my_role_name: role.map(|r| r.role_name.clone()),
            my_invitation_status: role.map(|r| r.invitation_status),
            lineup_count: counts.map_or(0, |c| c.lineup_count),
            accepted_count: counts.map_or(0, |c| c.accepted_count),
            gig,
        });
    }
    rows
}

/// Rows dated `today` or later, soonest first.
pub fn upcoming(mut rows: Vec<DashboardGig>, today: NaiveDate) -> Vec<DashboardGig> {
    rows.retain(|row| row.gig.date >= today);
    rows.sort_by_key(|row| (row.gig.date, row.gig.start_time, row.gig.created_at));
    rows
}

/// Rows dated before `today`, most recent first.
pub fn past(mut rows: Vec<DashboardGig>, today: NaiveDate) -> Vec<DashboardGig> {
    rows.retain(|row| row.gig.date < today);
    rows.sort_by_key(|row| Reverse((row.gig.date, row.gig.start_time, row.gig.created_at)));
    rows
}
