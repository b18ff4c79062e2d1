//! Race-level event detection.
//!
//! Detectors are pure: they read already-computed distances and finish times
//! and return what happened, leaving bookkeeping to the executor.
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::constants::FINAL_STRETCH_FRACTION;
use crate::run::{HorseIndex, LanePosition};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RaceEvent {
    Start {
        tick: u32,
    },
    LeadChange {
        tick: u32,
        previous: HorseIndex,
        leader: HorseIndex,
    },
    FinalStretch {
        tick: u32,
        leader: HorseIndex,
    },
    PhotoFinish {
        winner: HorseIndex,
        runner_up: HorseIndex,
        /// Finish-time gap between the top two, in ticks.
        margin: f64,
    },
}

impl RaceEvent {
    #[must_use]
    pub const fn is_photo_finish(&self) -> bool {
        matches!(self, Self::PhotoFinish { .. })
    }
}

/// Horse with the greatest distance. A tie keeps `previous` in front when it
/// is among the tied horses, otherwise the lowest index wins.
#[must_use]
pub fn current_leader(
    previous: Option<HorseIndex>,
    positions: &[LanePosition],
) -> Option<HorseIndex> {
    let best = positions
        .iter()
        .map(|p| p.distance)
        .filter(|d| d.is_finite())
        .fold(None::<f64>, |acc, d| Some(acc.map_or(d, |a| a.max(d))))?;
    let mut tied = positions.iter().filter(|p| p.distance == best).map(|p| p.horse);
    if let Some(prev) = previous
        && positions
            .iter()
            .any(|p| p.horse == prev && p.distance == best)
    {
        return Some(prev);
    }
    let first = tied.next()?;
    Some(tied.fold(first, usize::min))
}

/// Lead change relative to `previous`; the first leader of a race is not a change.
#[must_use]
pub fn detect_lead_change(
    tick: u32,
    previous: Option<HorseIndex>,
    positions: &[LanePosition],
) -> Option<RaceEvent> {
    let previous = previous?;
    let leader = current_leader(Some(previous), positions)?;
    (leader != previous).then_some(RaceEvent::LeadChange {
        tick,
        previous,
        leader,
    })
}

/// Fires once, the first tick the leader reaches 75% of the distance.
#[must_use]
pub fn detect_final_stretch(
    tick: u32,
    leader: HorseIndex,
    leader_distance: f64,
    furlongs: f64,
    already_announced: bool,
) -> Option<RaceEvent> {
    if already_announced || !leader_distance.is_finite() {
        return None;
    }
    (leader_distance >= furlongs * FINAL_STRETCH_FRACTION)
        .then_some(RaceEvent::FinalStretch { tick, leader })
}

/// Photo finish when the top two finish times differ by less than `margin` ticks.
/// One-horse fields never produce one.
#[must_use]
pub fn detect_photo_finish(finishers: &[(HorseIndex, f64)], margin: f64) -> Option<RaceEvent> {
    let mut ordered: Vec<(HorseIndex, f64)> = finishers
        .iter()
        .copied()
        .filter(|(_, time)| time.is_finite())
        .collect();
    if ordered.len() < 2 {
        return None;
    }
    ordered.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
    let (winner, first) = ordered[0];
    let (runner_up, second) = ordered[1];
    let gap = second - first;
    (gap < margin).then_some(RaceEvent::PhotoFinish {
        winner,
        runner_up,
        margin: gap,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(horse: HorseIndex, distance: f64) -> LanePosition {
        LanePosition {
            horse,
            lane: 1,
            distance,
        }
    }

    #[test]
    fn leader_ties_keep_previous() {
        let field = [at(0, 2.0), at(1, 2.0), at(2, 1.0)];
        assert_eq!(current_leader(Some(1), &field), Some(1));
        assert_eq!(current_leader(None, &field), Some(0));
        assert_eq!(current_leader(Some(2), &field), Some(0));
        assert_eq!(current_leader(None, &[]), None);
    }

    #[test]
    fn lead_change_requires_a_previous_leader() {
        let field = [at(0, 1.0), at(1, 1.5)];
        assert_eq!(detect_lead_change(3, None, &field), None);
        assert_eq!(
            detect_lead_change(3, Some(0), &field),
            Some(RaceEvent::LeadChange {
                tick: 3,
                previous: 0,
                leader: 1
            })
        );
        assert_eq!(detect_lead_change(4, Some(1), &field), None);
    }

    #[test]
    fn final_stretch_fires_once_at_three_quarters() {
        assert_eq!(detect_final_stretch(10, 0, 7.4, 10.0, false), None);
        assert_eq!(
            detect_final_stretch(11, 0, 7.5, 10.0, false),
            Some(RaceEvent::FinalStretch { tick: 11, leader: 0 })
        );
        assert_eq!(detect_final_stretch(12, 0, 8.0, 10.0, true), None);
    }

    #[test]
    fn photo_finish_margin_is_strict() {
        let close = [(1, 100.2), (0, 100.0), (2, 104.0)];
        let event = detect_photo_finish(&close, 0.25);
        assert!(matches!(
            event,
            Some(RaceEvent::PhotoFinish { winner: 0, runner_up: 1, .. })
        ));
        assert_eq!(detect_photo_finish(&[(0, 100.0), (1, 100.25)], 0.25), None);
        assert_eq!(detect_photo_finish(&[(0, 100.0), (1, 103.0)], 0.25), None);
    }

    #[test]
    fn single_horse_never_photo_finishes() {
        assert_eq!(detect_photo_finish(&[(0, 237.0)], 0.25), None);
        assert_eq!(detect_photo_finish(&[], 0.25), None);
    }
}
