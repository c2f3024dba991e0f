//! Attendee list reconciliation

use encore_domain::{EventAttendee, GigRole};

/// Merge the event's current attendees with the gig's lineup.
///
/// - attendees whose e-mail belongs to an active role stay, keeping their RSVP
/// - active roles with an e-mail not yet on the event are added
/// - attendees matching only declined or replaced roles are removed
/// - anyone else (external guests, the organizer) is left untouched
///
/// The organizer's own address is never added as an invitee. Output order is
/// existing attendees first, then additions in lineup order.
pub fn reconcile_attendees(
    existing: &[EventAttendee],
    roles: &[GigRole],
    organizer_email: Option<&str>,
) -> Vec<EventAttendee> {
    let organizer = organizer_email.map(|e| e.trim().to_lowercase());

    let active: Vec<(&GigRole, String)> = roles
        .iter()
        .filter(|r| r.invitation_status.is_active())
        .filter_map(|r| r.email_key().map(|email| (r, email)))
        .collect();
    let removed: Vec<String> = roles
        .iter()
        .filter(|r| !r.invitation_status.is_active())
        .filter_map(GigRole::email_key)
        .filter(|email| !active.iter().any(|(_, a)| a == email))
        .collect();

    let mut attendees: Vec<EventAttendee> = Vec::new();
    for attendee in existing {
        let key = attendee.email_key();
        let is_organizer = attendee.organizer || organizer.as_deref() == Some(key.as_str());
        if !is_organizer && removed.contains(&key) {
            continue;
        }
        if attendees.iter().any(|a| a.email_key() == key) {
            continue;
        }
        attendees.push(attendee.clone());
    }

    for (role, email) in active {
        if organizer.as_deref() == Some(email.as_str()) {
            continue;
        }
        if attendees.iter().any(|a| a.email_key() == email) {
            continue;
        }
        attendees.push(EventAttendee::invite(&email, role.musician_name.as_deref()));
    }

    attendees
}
