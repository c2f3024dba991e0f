//! Conflict detection between gigs and external calendar events

use chrono_tz::Tz;
use encore_domain::{CalendarConflict, ExternalEvent, Gig};

use super::events::{event_window, gig_window};

/// Every (gig, event) pair whose time spans overlap.
///
/// Cancelled gigs and cancelled events never conflict, and an event never
/// conflicts with the gig it is linked to. Spans are half-open, so a set
/// ending at 22:00 does not clash with one starting at 22:00.
pub fn find_conflicts(events: &[ExternalEvent], gigs: &[Gig], tz: Tz) -> Vec<CalendarConflict> {
    let mut conflicts = Vec::new();

    for gig in gigs.iter().filter(|g| !g.is_cancelled()) {
        let (gig_start, gig_end) = gig_window(gig, tz);

        for event in events.iter().filter(|e| !e.is_cancelled()) {
            if is_linked(gig, event) {
                continue;
            }
            let (event_start, event_end) = event_window(event, tz);
            if gig_start < event_end && event_start < gig_end {
                conflicts.push(CalendarConflict {
                    gig_id: gig.id.clone(),
                    gig_title: gig.title.clone(),
                    gig_date: gig.date,
                    event_id: event.id.clone(),
                    event_summary: event.summary.clone(),
                });
            }
        }
    }

    conflicts
}

fn is_linked(gig: &Gig, event: &ExternalEvent) -> bool {
    gig.external_calendar_event_id.as_deref() == Some(event.id.as_str())
        || gig.calendar_event_id.as_deref() == Some(event.id.as_str())
}
