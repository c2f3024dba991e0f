//! Conversions between gigs and calendar events
//!
//! Gigs store a local date and wall-clock times; events carry UTC instants or
//! all-day dates. Everything here goes through the configured calendar time
//! zone.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use encore_domain::constants::{DEFAULT_GIG_DURATION_MINUTES, GOOGLE_PROVIDER, UNTITLED_GIG};
use encore_domain::{
    mapping, new_id, CalendarEventDraft, EventAttendee, EventTime, ExternalEvent, Gig, GigStatus,
};
use tracing::warn;

/// Parse an IANA zone name, falling back to UTC.
pub fn parse_time_zone(name: &str) -> Tz {
    name.parse::<Tz>().unwrap_or_else(|_| {
        warn!(time_zone = name, "unknown time zone; using UTC");
        Tz::UTC
    })
}

/// Wall-clock time in `tz` as a UTC instant. Times inside a DST gap are read
/// as UTC rather than rejected.
pub fn local_to_utc(date: NaiveDate, time: NaiveTime, tz: Tz) -> DateTime<Utc> {
    let naive = date.and_time(time);
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

fn start_of_day(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    local_to_utc(date, NaiveTime::MIN, tz)
}

/// The span a gig occupies.
///
/// No start time blocks the whole day. No end time, or one equal to the
/// start, means the default set length. An end time before the start runs
/// past midnight.
pub fn gig_window(gig: &Gig, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let Some(start_time) = gig.start_time else {
        let start = start_of_day(gig.date, tz);
        let end = start_of_day(gig.date + Duration::days(1), tz);
        return (start, end);
    };

    let start = local_to_utc(gig.date, start_time, tz);
    let end = match gig.end_time {
        Some(end_time) if end_time > start_time => local_to_utc(gig.date, end_time, tz),
        Some(end_time) if end_time < start_time => {
            local_to_utc(gig.date + Duration::days(1), end_time, tz)
        }
        _ => start + Duration::minutes(DEFAULT_GIG_DURATION_MINUTES),
    };
    (start, end)
}

/// The span an event occupies. All-day end dates are exclusive.
pub fn event_window(event: &ExternalEvent, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = match event.start {
        EventTime::AllDay { date } => start_of_day(date, tz),
        EventTime::At { instant } => instant,
    };
    let end = match event.end {
        EventTime::AllDay { date } => start_of_day(date, tz),
        EventTime::At { instant } => instant,
    };
    if end > start {
        (start, end)
    } else {
        (start, start + Duration::minutes(DEFAULT_GIG_DURATION_MINUTES))
    }
}

/// Event body for pushing a gig to the calendar.
pub fn event_draft_for_gig(
    gig: &Gig,
    tz: Tz,
    attendees: Option<Vec<EventAttendee>>,
) -> CalendarEventDraft {
    let (start, end) = match gig.start_time {
        None => (
            EventTime::AllDay { date: gig.date },
            EventTime::AllDay { date: gig.date + Duration::days(1) },
        ),
        Some(_) => {
            let (start, end) = gig_window(gig, tz);
            (EventTime::At { instant: start }, EventTime::At { instant: end })
        }
    };

    let mut description = Vec::new();
    if gig.status != GigStatus::Confirmed {
        description.push(format!("Status: {}", gig.status));
    }
    if let Some(notes) = gig.notes.as_deref() {
        description.push(notes.to_string());
    }

    CalendarEventDraft {
        summary: gig.title.clone(),
        description: (!description.is_empty()).then(|| description.join("\n\n")),
        location: gig_location(gig),
        start,
        end,
        time_zone: tz.name().to_string(),
        attendees,
    }
}

/// Venue name and address joined for display.
pub fn gig_location(gig: &Gig) -> Option<String> {
    match (gig.location_name.as_deref(), gig.location_address.as_deref()) {
        (Some(name), Some(address)) => Some(format!("{name}, {address}")),
        (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
        (None, None) => None,
    }
}

/// Local date and wall-clock times of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSchedule {
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

pub fn event_schedule(event: &ExternalEvent, tz: Tz) -> EventSchedule {
    match event.start {
        EventTime::AllDay { date } => EventSchedule { date, start_time: None, end_time: None },
        EventTime::At { instant } => {
            let local = instant.with_timezone(&tz);
            let end_time = match event.end {
                EventTime::At { instant: end } if end > instant => {
                    Some(end.with_timezone(&tz).time())
                }
                _ => None,
            };
            EventSchedule { date: local.date_naive(), start_time: Some(local.time()), end_time }
        }
    }
}

/// A confirmed gig created from an external event.
pub fn gig_from_event(owner_id: &str, event: &ExternalEvent, tz: Tz, now: DateTime<Utc>) -> Gig {
    let schedule = event_schedule(event, tz);
    Gig {
        id: new_id(),
        owner_id: owner_id.to_string(),
        band_id: None,
        title: mapping::text_or(event.summary.clone(), UNTITLED_GIG),
        date: schedule.date,
        start_time: schedule.start_time,
        end_time: schedule.end_time,
        location_name: mapping::non_empty(event.location.clone()),
        location_address: None,
        status: GigStatus::Confirmed,
        notes: mapping::non_empty(event.description.clone()),
        poster_skin: mapping::poster_skin(None),
        fee_cents: None,
        currency: mapping::currency(None),
        external_calendar_event_id: Some(event.id.clone()),
        external_calendar_provider: Some(GOOGLE_PROVIDER.to_string()),
        calendar_event_id: Some(event.id.clone()),
        created_at: now,
        updated_at: now,
    }
}

/// Copy title, date, times and location from the event onto an imported
/// gig. Returns whether anything changed.
///
/// The event location is compared with the joined venue text that
/// [`event_draft_for_gig`] writes; a different location replaces the venue
/// name and clears the address.
pub fn apply_event_changes(gig: &mut Gig, event: &ExternalEvent, tz: Tz, now: DateTime<Utc>) -> bool {
    let schedule = event_schedule(event, tz);
    let title = mapping::non_empty(event.summary.clone());
    let location = mapping::non_empty(event.location.clone());

    let mut changed = false;
    if let Some(title) = title {
        if gig.title != title {
            gig.title = title;
            changed = true;
        }
    }
    if gig.date != schedule.date
        || gig.start_time != schedule.start_time
        || gig.end_time != schedule.end_time
    {
        gig.date = schedule.date;
        gig.start_time = schedule.start_time;
        gig.end_time = schedule.end_time;
        changed = true;
    }
    if location.is_some() && gig_location(gig) != location {
        gig.location_name = location;
        gig.location_address = None;
        changed = true;
    }

    if changed {
        gig.updated_at = now;
    }
    changed
}

#[cfg(test)]
mod tests {
    use encore_domain::{ExternalEventStatus, NewGig};

    use super::*;

    fn gig(start: Option<(u32, u32)>, end: Option<(u32, u32)>) -> Gig {
        let input = NewGig {
            title: "Late show".into(),
            date: NaiveDate::from_ymd_opt(2025, 3, 8).unwrap(),
            start_time: start.and_then(|(h, m)| NaiveTime::from_hms_opt(h, m, 0)),
            end_time: end.and_then(|(h, m)| NaiveTime::from_hms_opt(h, m, 0)),
            location_name: Some("Blue Room".into()),
            location_address: Some("1 Main St".into()),
            status: Some(GigStatus::Confirmed),
            notes: None,
            poster_skin: None,
            fee_cents: None,
            currency: None,
            band_id: None,
        };
        Gig::from_new("owner", input, Utc::now())
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn window_defaults_and_overnight() {
        let (s, e) = gig_window(&gig(Some((20, 0)), None), Tz::UTC);
        assert_eq!((s, e), (at(2025, 3, 8, 20, 0), at(2025, 3, 8, 23, 0)));

        let (s, e) = gig_window(&gig(Some((22, 0)), Some((1, 30))), Tz::UTC);
        assert_eq!((s, e), (at(2025, 3, 8, 22, 0), at(2025, 3, 9, 1, 30)));

        let (s, e) = gig_window(&gig(None, None), Tz::UTC);
        assert_eq!((s, e), (at(2025, 3, 8, 0, 0), at(2025, 3, 9, 0, 0)));
    }

    #[test]
    fn end_equal_to_start_uses_default_length() {
        let (s, e) = gig_window(&gig(Some((21, 0)), Some((21, 0))), Tz::UTC);
        assert_eq!((s, e), (at(2025, 3, 8, 21, 0), at(2025, 3, 9, 0, 0)));
    }

    #[test]
    fn window_respects_time_zone() {
        let (s, _) = gig_window(&gig(Some((20, 0)), None), chrono_tz::America::New_York);
        // EST is UTC-5 on 8 March 2025.
        assert_eq!(s, at(2025, 3, 9, 1, 0));
    }

    #[test]
    fn draft_uses_all_day_without_start() {
        let draft = event_draft_for_gig(&gig(None, None), Tz::UTC, None);
        assert!(draft.start.is_all_day());
        assert_eq!(draft.location.as_deref(), Some("Blue Room, 1 Main St"));
        assert_eq!(draft.time_zone, "UTC");
    }

    #[test]
    fn imported_gig_tracks_event_changes() {
        let event = ExternalEvent {
            id: "evt-1".into(),
            summary: Some("Jazz Night".into()),
            description: None,
            location: Some("Cellar".into()),
            status: ExternalEventStatus::Confirmed,
            start: EventTime::At { instant: at(2025, 4, 1, 19, 0) },
            end: EventTime::At { instant: at(2025, 4, 1, 22, 0) },
            attendees: vec![],
            html_link: None,
        };
        let mut gig = gig_from_event("owner", &event, Tz::UTC, Utc::now());
        assert_eq!(gig.status, GigStatus::Confirmed);
        assert_eq!(gig.calendar_event_id.as_deref(), Some("evt-1"));
        assert_eq!(gig.end_time, NaiveTime::from_hms_opt(22, 0, 0));
        assert!(!apply_event_changes(&mut gig, &event, Tz::UTC, Utc::now()));

        let moved = ExternalEvent {
            start: EventTime::At { instant: at(2025, 4, 2, 20, 0) },
            end: EventTime::At { instant: at(2025, 4, 2, 23, 0) },
            ..event
        };
        assert!(apply_event_changes(&mut gig, &moved, Tz::UTC, Utc::now()));
        assert_eq!(gig.date, NaiveDate::from_ymd_opt(2025, 4, 2).unwrap());
    }

    #[test]
    fn exported_location_reads_back_unchanged() {
        let mut g = gig(Some((20, 0)), Some((23, 0)));
        let draft = event_draft_for_gig(&g, Tz::UTC, None);
        let echoed = ExternalEvent {
            id: "evt-2".into(),
            summary: Some(draft.summary.clone()),
            description: None,
            location: draft.location.clone(),
            status: ExternalEventStatus::Confirmed,
            start: draft.start,
            end: draft.end,
            attendees: vec![],
            html_link: None,
        };

        assert!(!apply_event_changes(&mut g, &echoed, Tz::UTC, Utc::now()));
        assert_eq!(g.location_name.as_deref(), Some("Blue Room"));
        assert_eq!(g.location_address.as_deref(), Some("1 Main St"));

        let moved = ExternalEvent { location: Some("Green Room".into()), ..echoed };
        assert!(apply_event_changes(&mut g, &moved, Tz::UTC, Utc::now()));
        assert_eq!(g.location_name.as_deref(), Some("Green Room"));
        assert_eq!(g.location_address, None);
    }
}
