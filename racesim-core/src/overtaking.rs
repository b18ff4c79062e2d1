//! Lateral movement and traffic interference.
//!
//! Lane changes are resolved sequentially in entry order against the live
//! lane map, so a horse that moves earlier in the tick is seen in its new lane
//! by every horse resolved after it. Finished horses are off the track and
//! never block.
use serde::{Deserialize, Serialize};

use crate::constants::{
    BLOCKING_DISTANCE, CLEARANCE_AHEAD_FURLONGS, CLEARANCE_BEHIND_FURLONGS,
    FRONT_RUNNER_FRUSTRATION, LANE_CHANGE_BASE_COOLDOWN, LANE_CHANGE_COOLDOWN_PER_AGILITY,
    LANE_CHANGE_MIN_COOLDOWN, LANE_CHANGE_PENALTY_TICKS, LANE_CHANGE_SPEED_PENALTY,
    OVERTAKE_BASE_THRESHOLD, OVERTAKE_LATE_PHASE_MULTIPLIER, OVERTAKE_LATE_PHASE_PROGRESS,
    OVERTAKE_SPEED_SCALE, RAIL_LANE, TRAFFIC_CAP_FRONT_RUNNER, TRAFFIC_CAP_LAST_SPURT,
    TRAFFIC_CAP_RAIL_RUNNER, TRAFFIC_CAP_START_DASH, TRAFFIC_CAP_STRETCH_RUNNER,
};
use crate::horse::{Horse, LegType};
use crate::numbers::{ceil_f64_to_u32, usize_to_u8};
use crate::run::{HorseIndex, LanePosition, RaceRunHorse};

/// A lane change made during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneChange {
    pub horse: HorseIndex,
    pub from: u8,
    pub to: u8,
}

/// Ticks a horse must wait between lane changes.
#[must_use]
pub fn lane_change_cooldown(agility: u8) -> u32 {
    let raw = f64::from(agility.min(100))
        .mul_add(-LANE_CHANGE_COOLDOWN_PER_AGILITY, LANE_CHANGE_BASE_COOLDOWN);
    ceil_f64_to_u32(raw).max(LANE_CHANGE_MIN_COOLDOWN)
}

/// Lane the horse would like to be in. Rail runners hug lane 1; everyone else holds.
#[must_use]
pub const fn desired_lane(leg_type: LegType, current_lane: u8) -> u8 {
    match leg_type {
        LegType::RailRunner => RAIL_LANE,
        LegType::StartDash | LegType::FrontRunner | LegType::StretchRunner | LegType::LastSpurt => {
            current_lane
        }
    }
}

/// Asymmetric clearance: traffic ahead needs 0.2f, traffic behind 0.1f.
/// Gaps exactly at a threshold are clear.
#[must_use]
pub fn is_lane_clear(runner: HorseIndex, lane: u8, distance: f64, field: &[LanePosition]) -> bool {
    field
        .iter()
        .filter(|other| other.horse != runner && other.lane == lane)
        .all(|other| {
            let gap = other.distance - distance;
            if gap >= 0.0 {
                gap >= CLEARANCE_AHEAD_FURLONGS
            } else {
                -gap >= CLEARANCE_BEHIND_FURLONGS
            }
        })
}

/// Distance inside which a blocker ahead provokes an overtaking attempt.
#[must_use]
pub fn overtaking_threshold(speed: u8, progress: f64) -> f64 {
    let phase = if progress > OVERTAKE_LATE_PHASE_PROGRESS {
        OVERTAKE_LATE_PHASE_MULTIPLIER
    } else {
        1.0
    };
    OVERTAKE_BASE_THRESHOLD * f64::from(speed.min(100)).mul_add(OVERTAKE_SPEED_SCALE, 1.0) * phase
}

/// Nearest runner in `lane` strictly ahead of `distance` and closer than `within`.
#[must_use]
pub fn nearest_ahead(
    runner: HorseIndex,
    lane: u8,
    distance: f64,
    within: f64,
    field: &[LanePosition],
) -> Option<LanePosition> {
    field
        .iter()
        .filter(|other| other.horse != runner && other.lane == lane)
        .filter(|other| {
            let gap = other.distance - distance;
            gap > 0.0 && gap < within
        })
        .copied()
        .fold(None, |nearest: Option<LanePosition>, candidate| match nearest {
            Some(current) if current.distance <= candidate.distance => Some(current),
            _ => Some(candidate),
        })
}

/// Speed cap penalty applied when boxed in behind a slower horse.
#[must_use]
pub const fn traffic_cap_penalty(leg_type: LegType) -> f64 {
    match leg_type {
        LegType::StartDash => TRAFFIC_CAP_START_DASH,
        LegType::FrontRunner => TRAFFIC_CAP_FRONT_RUNNER,
        LegType::StretchRunner => TRAFFIC_CAP_STRETCH_RUNNER,
        LegType::LastSpurt => TRAFFIC_CAP_LAST_SPURT,
        LegType::RailRunner => TRAFFIC_CAP_RAIL_RUNNER,
    }
}

/// Live positions of every runner still racing.
#[must_use]
pub fn running_field(entries: &[RaceRunHorse]) -> Vec<LanePosition> {
    entries
        .iter()
        .filter(|entry| !entry.is_finished())
        .map(RaceRunHorse::position)
        .collect()
}

/// Resolves lane changes and traffic for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OvertakingManager {
    lane_count: u8,
}

impl OvertakingManager {
    /// Lanes run from 1 to `lane_count` (the field size).
    #[must_use]
    pub fn new(lane_count: usize) -> Self {
        Self {
            lane_count: usize_to_u8(lane_count.max(1)),
        }
    }

    #[must_use]
    pub const fn lane_count(&self) -> u8 {
        self.lane_count
    }

    fn adjacent_lanes(&self, lane: u8) -> impl Iterator<Item = u8> {
        let inside = lane.checked_sub(1).filter(|l| *l >= 1);
        let outside = lane.checked_add(1).filter(|l| *l <= self.lane_count);
        inside.into_iter().chain(outside)
    }

    /// First clear lane next to `lane`, inside before outside.
    #[must_use]
    pub fn clear_adjacent_lane(
        &self,
        runner: HorseIndex,
        lane: u8,
        distance: f64,
        field: &[LanePosition],
    ) -> Option<u8> {
        self.adjacent_lanes(lane)
            .find(|candidate| is_lane_clear(runner, *candidate, distance, field))
    }

    fn target_lane(
        &self,
        entry: &RaceRunHorse,
        horse: &Horse,
        progress: f64,
        field: &[LanePosition],
    ) -> Option<u8> {
        let desired = desired_lane(horse.leg_type, entry.lane).clamp(1, self.lane_count);
        if desired != entry.lane {
            let step = if desired < entry.lane {
                entry.lane - 1
            } else {
                entry.lane + 1
            };
            if is_lane_clear(entry.horse, step, entry.distance, field) {
                return Some(step);
            }
        }
        let threshold = overtaking_threshold(horse.stats.speed, progress);
        nearest_ahead(entry.horse, entry.lane, entry.distance, threshold, field)?;
        self.clear_adjacent_lane(entry.horse, entry.lane, entry.distance, field)
    }

    /// Advance cooldowns and move every eligible horse, in entry order.
    pub fn resolve_lane_changes(
        &self,
        entries: &mut [RaceRunHorse],
        horses: &[Horse],
        progress: f64,
    ) -> Vec<LaneChange> {
        let mut field = running_field(entries);
        let mut changes = Vec::new();
        for entry in entries.iter_mut().filter(|entry| !entry.is_finished()) {
            entry.ticks_since_lane_change = entry.ticks_since_lane_change.saturating_add(1);
            let Some(horse) = horses.get(entry.horse) else {
                continue;
            };
            if entry.ticks_since_lane_change < lane_change_cooldown(horse.stats.agility) {
                continue;
            }
            let Some(target) = self.target_lane(entry, horse, progress, &field) else {
                continue;
            };
            changes.push(LaneChange {
                horse: entry.horse,
                from: entry.lane,
                to: target,
            });
            entry.lane = target;
            entry.ticks_since_lane_change = 0;
            entry.speed_penalty_ticks = LANE_CHANGE_PENALTY_TICKS;
            if let Some(slot) = field.iter_mut().find(|p| p.horse == entry.horse) {
                slot.lane = target;
            }
        }
        changes
    }

    /// Cap `natural_speeds[index]` behind a slower horse in the same lane.
    ///
    /// `natural_speeds` is indexed like `entries`. A horse with nothing within
    /// blocking distance ahead gets its natural speed back unchanged.
    #[must_use]
    pub fn apply_traffic_effects(
        &self,
        index: usize,
        entries: &[RaceRunHorse],
        horses: &[Horse],
        natural_speeds: &[f64],
    ) -> f64 {
        let Some(own_speed) = natural_speeds.get(index).copied() else {
            return 0.0;
        };
        let Some(entry) = entries.get(index) else {
            return own_speed;
        };
        let Some(horse) = horses.get(entry.horse) else {
            return own_speed;
        };
        let field = running_field(entries);
        let Some(blocker) = nearest_ahead(
            entry.horse,
            entry.lane,
            entry.distance,
            BLOCKING_DISTANCE,
            &field,
        ) else {
            return own_speed;
        };
        let blocker_speed = entries
            .iter()
            .position(|other| other.horse == blocker.horse)
            .and_then(|slot| natural_speeds.get(slot).copied())
            .unwrap_or(own_speed);
        let cap = blocker_speed * (1.0 - traffic_cap_penalty(horse.leg_type));
        let mut speed = own_speed.min(cap);
        if horse.leg_type == LegType::FrontRunner
            && self
                .clear_adjacent_lane(entry.horse, entry.lane, entry.distance, &field)
                .is_none()
        {
            speed *= 1.0 - FRONT_RUNNER_FRUSTRATION;
        }
        speed
    }
}

/// Apply (and count down) the post-lane-change speed penalty.
pub fn apply_lane_change_penalty(entry: &mut RaceRunHorse, speed: f64) -> f64 {
    if entry.speed_penalty_ticks == 0 {
        return speed;
    }
    entry.speed_penalty_ticks -= 1;
    speed * (1.0 - LANE_CHANGE_SPEED_PENALTY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::horse::HorseStats;

    fn at(horse: HorseIndex, lane: u8, distance: f64) -> LanePosition {
        LanePosition {
            horse,
            lane,
            distance,
        }
    }

    fn runner(horse: HorseIndex, lane: u8, distance: f64) -> RaceRunHorse {
        let mut entry = RaceRunHorse::new(horse, lane, 100.0);
        entry.distance = distance;
        entry
    }

    #[test]
    fn cooldown_shrinks_with_agility() {
        assert_eq!(lane_change_cooldown(0), 10);
        assert_eq!(lane_change_cooldown(50), 6);
        assert_eq!(lane_change_cooldown(100), 2);
        for agility in 0..100_u8 {
            assert!(lane_change_cooldown(agility + 1) <= lane_change_cooldown(agility));
        }
    }

    #[test]
    fn clearance_is_asymmetric() {
        // Ahead 0.15f blocks, behind 0.15f does not.
        assert!(!is_lane_clear(0, 2, 0.0, &[at(1, 2, 0.15)]));
        assert!(is_lane_clear(0, 2, 0.15, &[at(1, 2, 0.0)]));
        // Exact thresholds are clear.
        assert!(is_lane_clear(0, 2, 0.0, &[at(1, 2, 0.2)]));
        assert!(is_lane_clear(0, 2, 0.1, &[at(1, 2, 0.0)]));
        // Alongside blocks; other lanes and self never do.
        assert!(!is_lane_clear(0, 2, 0.5, &[at(1, 2, 0.5)]));
        assert!(is_lane_clear(0, 2, 0.5, &[at(1, 3, 0.5), at(0, 2, 0.5)]));
    }

    #[test]
    fn threshold_widens_with_speed_and_late_phase() {
        assert!((overtaking_threshold(0, 0.1) - 0.25).abs() < 1e-12);
        assert!((overtaking_threshold(100, 0.1) - 0.30).abs() < 1e-12);
        assert!((overtaking_threshold(100, 0.8) - 0.45).abs() < 1e-12);
        assert!((overtaking_threshold(100, 0.75) - 0.30).abs() < 1e-12);
    }

    #[test]
    fn rail_runner_steps_toward_rail_when_clear() {
        let manager = OvertakingManager::new(3);
        let horses = vec![
            Horse::new(1, "Rail", LegType::RailRunner).with_stats(HorseStats::uniform(100)),
            Horse::new(2, "Dash", LegType::StartDash),
        ];
        let mut entries = vec![runner(0, 3, 1.0), runner(1, 1, 3.0)];
        entries[0].ticks_since_lane_change = 5;
        let changes = manager.resolve_lane_changes(&mut entries, &horses, 0.3);
        assert_eq!(
            changes,
            vec![LaneChange {
                horse: 0,
                from: 3,
                to: 2
            }]
        );
        assert_eq!(entries[0].speed_penalty_ticks, LANE_CHANGE_PENALTY_TICKS);
        assert_eq!(entries[0].ticks_since_lane_change, 0);
        // Cooling down: no further move on the next tick.
        assert!(manager.resolve_lane_changes(&mut entries, &horses, 0.3).is_empty());
    }

    #[test]
    fn blocked_horse_moves_inside_first() {
        let manager = OvertakingManager::new(3);
        let horses = vec![
            Horse::new(1, "Chaser", LegType::StartDash),
            Horse::new(2, "Wall", LegType::StartDash),
        ];
        let mut entries = vec![runner(0, 2, 1.0), runner(1, 2, 1.1)];
        entries[0].ticks_since_lane_change = 20;
        let changes = manager.resolve_lane_changes(&mut entries, &horses, 0.5);
        assert_eq!(changes.len(), 1);
        assert_eq!(entries[0].lane, 1);
        assert_eq!(entries[1].lane, 2);
    }

    #[test]
    fn boxed_rail_runner_swings_outside() {
        let manager = OvertakingManager::new(4);
        let horses = vec![
            Horse::new(1, "Rail", LegType::RailRunner),
            Horse::new(2, "Wall", LegType::StartDash),
            Horse::new(3, "Inside", LegType::StartDash),
        ];
        let mut entries = vec![runner(0, 3, 1.0), runner(1, 3, 1.1), runner(2, 2, 1.05)];
        entries[0].ticks_since_lane_change = 20;
        let changes = manager.resolve_lane_changes(&mut entries, &horses, 0.5);
        assert_eq!(
            changes,
            vec![LaneChange {
                horse: 0,
                from: 3,
                to: 4
            }]
        );
        assert_eq!(entries[0].lane, 4);
    }

    #[test]
    fn rail_runner_with_blocked_rail_and_open_lane_holds() {
        let manager = OvertakingManager::new(3);
        let horses = vec![
            Horse::new(1, "Rail", LegType::RailRunner),
            Horse::new(2, "Inside", LegType::StartDash),
        ];
        let mut entries = vec![runner(0, 2, 1.0), runner(1, 1, 1.05)];
        entries[0].ticks_since_lane_change = 20;
        assert!(manager.resolve_lane_changes(&mut entries, &horses, 0.5).is_empty());
        assert_eq!(entries[0].lane, 2);
    }

    fn slow_chaser_behind(gap: f64) -> (Vec<Horse>, Vec<RaceRunHorse>) {
        let horses = vec![
            Horse::new(1, "Chaser", LegType::StartDash).with_stats(HorseStats {
                speed: 0,
                ..HorseStats::default()
            }),
            Horse::new(2, "Wall", LegType::StartDash),
        ];
        let mut entries = vec![runner(0, 2, 1.0), runner(1, 2, 1.0 + gap)];
        entries[0].ticks_since_lane_change = 20;
        (horses, entries)
    }

    #[test]
    fn blocker_beyond_threshold_is_ignored() {
        let manager = OvertakingManager::new(3);
        let (horses, mut entries) = slow_chaser_behind(0.26);
        assert!(manager.resolve_lane_changes(&mut entries, &horses, 0.5).is_empty());
        assert_eq!(entries[0].lane, 2);
    }

    #[test]
    fn late_race_threshold_triggers_move() {
        let manager = OvertakingManager::new(3);
        let (horses, mut entries) = slow_chaser_behind(0.26);
        let changes = manager.resolve_lane_changes(&mut entries, &horses, 0.8);
        assert_eq!(
            changes,
            vec![LaneChange {
                horse: 0,
                from: 2,
                to: 1
            }]
        );
        assert_eq!(entries[1].lane, 2);
    }

    #[test]
    fn single_lane_field_never_moves() {
        let manager = OvertakingManager::new(1);
        let horses = vec![Horse::new(1, "Solo", LegType::RailRunner)];
        let mut entries = vec![runner(0, 1, 0.0)];
        for _ in 0..20 {
            assert!(manager.resolve_lane_changes(&mut entries, &horses, 0.5).is_empty());
        }
        assert_eq!(entries[0].lane, 1);
    }

    #[test]
    fn traffic_caps_blocked_speed() {
        let manager = OvertakingManager::new(3);
        let horses = vec![
            Horse::new(1, "Rail", LegType::RailRunner),
            Horse::new(2, "Slow", LegType::StartDash),
        ];
        let entries = vec![runner(0, 1, 1.0), runner(1, 1, 1.1)];
        let speeds = [0.05, 0.04];
        let capped = manager.apply_traffic_effects(0, &entries, &horses, &speeds);
        assert!((capped - 0.04 * 0.97).abs() < 1e-12);
        // The leader is never slowed by the horse behind it.
        assert_eq!(
            manager
                .apply_traffic_effects(1, &entries, &horses, &speeds)
                .to_bits(),
            0.04_f64.to_bits()
        );
    }

    #[test]
    fn unblocked_speed_is_bit_identical() {
        let manager = OvertakingManager::new(4);
        let horses = vec![
            Horse::new(1, "Free", LegType::FrontRunner),
            Horse::new(2, "Far", LegType::StartDash),
            Horse::new(3, "Beside", LegType::StartDash),
        ];
        let entries = vec![runner(0, 2, 1.0), runner(1, 2, 1.25), runner(2, 3, 1.05)];
        let speeds = [0.043_219_876_5, 0.01, 0.01];
        let result = manager.apply_traffic_effects(0, &entries, &horses, &speeds);
        assert_eq!(result.to_bits(), speeds[0].to_bits());
    }

    #[test]
    fn boxed_front_runner_is_frustrated() {
        let manager = OvertakingManager::new(3);
        let horses = vec![
            Horse::new(1, "Boxed", LegType::FrontRunner),
            Horse::new(2, "Ahead", LegType::StartDash),
            Horse::new(3, "Inside", LegType::StartDash),
            Horse::new(4, "Outside", LegType::StartDash),
        ];
        let entries = vec![
            runner(0, 2, 1.0),
            runner(1, 2, 1.1),
            runner(2, 1, 1.0),
            runner(3, 3, 1.0),
        ];
        let speeds = [0.05, 0.04, 0.04, 0.04];
        let capped = manager.apply_traffic_effects(0, &entries, &horses, &speeds);
        assert!((capped - 0.04 * 0.98 * 0.98).abs() < 1e-12);
    }

    #[test]
    fn finished_horses_do_not_block() {
        let manager = OvertakingManager::new(2);
        let horses = vec![
            Horse::new(1, "Runner", LegType::StartDash),
            Horse::new(2, "Done", LegType::StartDash),
        ];
        let mut done = runner(1, 1, 1.1);
        done.finish_time = Some(20.0);
        done.finish_place = Some(1);
        let entries = vec![runner(0, 1, 1.0), done];
        let speeds = [0.05, 0.0];
        let result = manager.apply_traffic_effects(0, &entries, &horses, &speeds);
        assert_eq!(result.to_bits(), 0.05_f64.to_bits());
    }

    #[test]
    fn penalty_counts_down() {
        let mut entry = runner(0, 1, 0.0);
        entry.speed_penalty_ticks = 2;
        assert!((apply_lane_change_penalty(&mut entry, 1.0) - 0.99).abs() < 1e-12);
        assert!((apply_lane_change_penalty(&mut entry, 1.0) - 0.99).abs() < 1e-12);
        assert!((apply_lane_change_penalty(&mut entry, 1.0) - 1.0).abs() < 1e-12);
    }
}
