//! Mutable per-run state: the arena of runners, tick history and standings.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::hash::Hasher;
use twox_hash::XxHash64;

use crate::events::RaceEvent;
use crate::horse::Horse;
use crate::numbers::usize_to_u8;
use crate::race::{Race, TrackCondition};

/// Index into [`RaceRun::horses`]; runners refer to horses by index, never by reference.
pub type HorseIndex = usize;

/// Positions stored inline for fields up to twelve runners.
pub type PositionSet = SmallVec<[HorseSnapshot; 12]>;

/// Lateral/longitudinal position of one runner, as seen by the others.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LanePosition {
    pub horse: HorseIndex,
    pub lane: u8,
    pub distance: f64,
}

/// One horse's mutable state for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceRunHorse {
    pub horse: HorseIndex,
    pub lane: u8,
    pub distance: f64,
    pub initial_stamina: f64,
    pub current_stamina: f64,
    pub ticks_since_lane_change: u32,
    /// Remaining ticks of the post-lane-change speed penalty.
    pub speed_penalty_ticks: u32,
    /// Final speed applied on the most recent tick.
    pub last_speed: f64,
    pub finish_place: Option<u8>,
    pub finish_time: Option<f64>,
}

impl RaceRunHorse {
    #[must_use]
    pub fn new(horse: HorseIndex, lane: u8, initial_stamina: f64) -> Self {
        let stamina = if initial_stamina.is_finite() {
            initial_stamina.max(1.0)
        } else {
            1.0
        };
        Self {
            horse,
            lane,
            distance: 0.0,
            initial_stamina: stamina,
            current_stamina: stamina,
            ticks_since_lane_change: 0,
            speed_penalty_ticks: 0,
            last_speed: 0.0,
            finish_place: None,
            finish_time: None,
        }
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finish_time.is_some()
    }

    /// Remaining stamina as a fraction of the starting pool, in `[0, 1]`.
    #[must_use]
    pub fn stamina_ratio(&self) -> f64 {
        if self.initial_stamina <= 0.0 {
            return 0.0;
        }
        (self.current_stamina.max(0.0) / self.initial_stamina).clamp(0.0, 1.0)
    }

    /// Move forward; negative or non-finite steps are ignored.
    pub fn advance(&mut self, step: f64) {
        if step.is_finite() && step > 0.0 {
            self.distance += step;
        }
    }

    /// Spend stamina, flooring at zero.
    pub fn deplete(&mut self, amount: f64) {
        if amount.is_finite() && amount > 0.0 {
            self.current_stamina = (self.current_stamina - amount).max(0.0);
        }
    }

    #[must_use]
    pub const fn position(&self) -> LanePosition {
        LanePosition {
            horse: self.horse,
            lane: self.lane,
            distance: self.distance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorseSnapshot {
    pub horse: HorseIndex,
    pub lane: u8,
    pub distance: f64,
    pub stamina: f64,
}

/// Per-tick record of every runner's lane and distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickSnapshot {
    pub tick: u32,
    pub positions: PositionSet,
}

impl TickSnapshot {
    #[must_use]
    pub fn position_of(&self, horse: HorseIndex) -> Option<&HorseSnapshot> {
        self.positions.iter().find(|p| p.horse == horse)
    }
}

/// A single race run: metadata, the runner arena and the accumulated history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceRun {
    pub race: Race,
    pub condition: TrackCondition,
    /// Read-only horse table; `entries[i].horse` indexes into it.
    pub horses: Vec<Horse>,
    pub entries: Vec<RaceRunHorse>,
    pub total_ticks: u32,
    pub ticks_elapsed: u32,
    #[serde(default)]
    pub history: Vec<TickSnapshot>,
    #[serde(default)]
    pub events: Vec<RaceEvent>,
    #[serde(default)]
    pub commentary: Vec<String>,
}

impl RaceRun {
    /// Build a run with horses in gate order: `horses[i]` starts in lane `i + 1`.
    #[must_use]
    pub fn new(
        race: Race,
        condition: TrackCondition,
        horses: Vec<Horse>,
        initial_stamina: f64,
    ) -> Self {
        let lanes: Vec<u8> = (1..=horses.len()).map(usize_to_u8).collect();
        Self::with_lanes(race, condition, horses, &lanes, initial_stamina)
    }

    /// Build a run with explicit starting lanes. Lanes that are missing or do
    /// not form a permutation of `1..=field` fall back to gate order.
    #[must_use]
    pub fn with_lanes(
        race: Race,
        condition: TrackCondition,
        horses: Vec<Horse>,
        lanes: &[u8],
        initial_stamina: f64,
    ) -> Self {
        let lanes = if is_lane_permutation(lanes, horses.len()) {
            lanes.to_vec()
        } else {
            (1..=horses.len()).map(usize_to_u8).collect()
        };
        let entries = lanes
            .iter()
            .enumerate()
            .map(|(index, &lane)| RaceRunHorse::new(index, lane, initial_stamina))
            .collect();
        let total_ticks = crate::speed::expected_ticks(race.effective_furlongs());
        Self {
            race,
            condition,
            horses,
            entries,
            total_ticks,
            ticks_elapsed: 0,
            history: Vec::new(),
            events: Vec::new(),
            commentary: Vec::new(),
        }
    }

    #[must_use]
    pub fn field_size(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn horse(&self, index: HorseIndex) -> Option<&Horse> {
        self.horses.get(index)
    }

    #[must_use]
    pub fn positions(&self) -> Vec<LanePosition> {
        self.entries.iter().map(RaceRunHorse::position).collect()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.entries.iter().all(RaceRunHorse::is_finished)
    }

    /// Append the current state to the per-tick history.
    pub fn record_tick(&mut self, tick: u32) {
        let positions = self
            .entries
            .iter()
            .map(|entry| HorseSnapshot {
                horse: entry.horse,
                lane: entry.lane,
                distance: entry.distance,
                stamina: entry.current_stamina,
            })
            .collect();
        self.history.push(TickSnapshot { tick, positions });
    }

    /// Number of lane changes a horse made, counted from the tick history.
    #[must_use]
    pub fn lane_changes(&self, horse: HorseIndex) -> usize {
        let starting_lane = self
            .entries
            .iter()
            .find(|entry| entry.horse == horse)
            .and_then(|_| {
                self.history
                    .first()
                    .and_then(|snapshot| snapshot.position_of(horse))
            })
            .map(|p| p.lane);
        let mut previous = starting_lane;
        let mut changes = 0;
        for snapshot in self.history.iter().skip(1) {
            if let Some(current) = snapshot.position_of(horse) {
                if previous.is_some_and(|lane| lane != current.lane) {
                    changes += 1;
                }
                previous = Some(current.lane);
            }
        }
        changes
    }

    /// Leader (greatest distance) recorded at `tick`; ties resolve to the lowest index.
    #[must_use]
    pub fn leader_at(&self, tick: u32) -> Option<HorseIndex> {
        let snapshot = self.history.iter().find(|s| s.tick == tick)?;
        snapshot
            .positions
            .iter()
            .fold(None::<&HorseSnapshot>, |best, candidate| match best {
                Some(current) if current.distance >= candidate.distance => Some(current),
                _ => Some(candidate),
            })
            .map(|p| p.horse)
    }

    /// Runner indices ordered by finish place; unplaced runners trail by distance.
    #[must_use]
    pub fn standings(&self) -> Vec<HorseIndex> {
        let mut order: Vec<&RaceRunHorse> = self.entries.iter().collect();
        order.sort_by(|a, b| compare_standing(a, b));
        order.into_iter().map(|entry| entry.horse).collect()
    }

    /// Stable hash over the tick history and finish times.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        for snapshot in &self.history {
            hasher.write_u32(snapshot.tick);
            for position in &snapshot.positions {
                hasher.write_usize(position.horse);
                hasher.write_u8(position.lane);
                hasher.write_u64(position.distance.to_bits());
                hasher.write_u64(position.stamina.to_bits());
            }
        }
        for entry in &self.entries {
            hasher.write_u64(entry.finish_time.unwrap_or(-1.0).to_bits());
        }
        hasher.finish()
    }
}

fn compare_standing(a: &RaceRunHorse, b: &RaceRunHorse) -> Ordering {
    match (a.finish_place, b.finish_place) {
        (Some(pa), Some(pb)) => pa.cmp(&pb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b
            .distance
            .partial_cmp(&a.distance)
            .unwrap_or(Ordering::Equal)
            .then(a.horse.cmp(&b.horse)),
    }
}

fn is_lane_permutation(lanes: &[u8], field: usize) -> bool {
    if lanes.len() != field {
        return false;
    }
    let mut seen = vec![false; field];
    for &lane in lanes {
        let slot = usize::from(lane);
        if slot == 0 || slot > field || seen[slot - 1] {
            return false;
        }
        seen[slot - 1] = true;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::horse::LegType;

    fn sample_run(count: u64) -> RaceRun {
        let horses = (0..count)
            .map(|i| Horse::new(i + 1, format!("Runner {i}"), LegType::StartDash))
            .collect();
        RaceRun::new(Race::new(1, "Test Stakes", 10.0), TrackCondition::Good, horses, 100.0)
    }

    #[test]
    fn gate_order_assigns_lane_permutation() {
        let run = sample_run(4);
        let lanes: Vec<u8> = run.entries.iter().map(|e| e.lane).collect();
        assert_eq!(lanes, vec![1, 2, 3, 4]);
        assert_eq!(run.total_ticks, 237);
    }

    #[test]
    fn invalid_lanes_fall_back_to_gate_order() {
        let horses = vec![
            Horse::new(1, "A", LegType::StartDash),
            Horse::new(2, "B", LegType::StartDash),
        ];
        let run = RaceRun::with_lanes(
            Race::new(1, "Dup", 8.0),
            TrackCondition::Good,
            horses,
            &[1, 1],
            100.0,
        );
        assert_eq!(run.entries[0].lane, 1);
        assert_eq!(run.entries[1].lane, 2);
    }

    #[test]
    fn stamina_and_distance_are_guarded() {
        let mut entry = RaceRunHorse::new(0, 1, 100.0);
        entry.advance(-3.0);
        entry.advance(f64::NAN);
        assert!(entry.distance.abs() < f64::EPSILON);
        entry.deplete(250.0);
        assert!(entry.current_stamina.abs() < f64::EPSILON);
        assert!(entry.stamina_ratio().abs() < f64::EPSILON);
    }

    #[test]
    fn lane_changes_are_counted_from_history() {
        let mut run = sample_run(2);
        run.record_tick(0);
        run.entries[0].lane = 2;
        run.record_tick(1);
        run.record_tick(2);
        run.entries[0].lane = 1;
        run.record_tick(3);
        assert_eq!(run.lane_changes(0), 2);
        assert_eq!(run.lane_changes(1), 0);
    }

    #[test]
    fn leader_and_standings_follow_distance() {
        let mut run = sample_run(3);
        run.entries[1].distance = 2.0;
        run.entries[2].distance = 2.0;
        run.record_tick(5);
        assert_eq!(run.leader_at(5), Some(1));
        run.entries[2].finish_place = Some(1);
        run.entries[2].finish_time = Some(200.0);
        assert_eq!(run.standings(), vec![2, 1, 0]);
    }

    #[test]
    fn fingerprint_tracks_history() {
        let mut a = sample_run(2);
        let mut b = sample_run(2);
        a.record_tick(0);
        b.record_tick(0);
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.entries[0].distance = 0.1;
        b.record_tick(1);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
