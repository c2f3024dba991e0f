//! Readiness score arithmetic

use encore_domain::constants::{READINESS_CHECKLIST_WEIGHT, READINESS_SONGS_WEIGHT};
use encore_domain::{GigReadiness, ReadinessScore};

/// Score a checklist.
///
/// - songs: learned / total as a percentage; a gig with no songs counts as 100
/// - checklist: mean of charts, sounds, travel and gear (each 0 or 100)
/// - overall: `round(0.4 * songs + 0.6 * checklist)`
pub fn compute_readiness_score(readiness: &GigReadiness) -> ReadinessScore {
    let songs = if readiness.songs_total == 0 {
        100.0
    } else {
        let learned = readiness.songs_learned.min(readiness.songs_total);
        f64::from(learned) / f64::from(readiness.songs_total) * 100.0
    };

    let checks = [
        readiness.charts_ready,
        readiness.sounds_ready,
        readiness.travel_checked,
        readiness.gear_packed,
    ];
    let done = checks.iter().filter(|c| **c).count();
    let checklist = done as f64 / checks.len() as f64 * 100.0;

    let overall = READINESS_SONGS_WEIGHT * songs + READINESS_CHECKLIST_WEIGHT * checklist;

    ReadinessScore {
        songs_percent: to_percent(songs),
        checklist_percent: to_percent(checklist),
        overall: to_percent(overall),
    }
}

fn to_percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}
