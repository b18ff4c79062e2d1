//! Post-race stat growth and happiness changes.
use serde::{Deserialize, Serialize};

use crate::constants::{
    BASE_GROWTH_RATE, CAREER_OLD, CAREER_PRIME, CAREER_VETERAN, CAREER_YOUNG, FOCUS_BALANCED,
    FOCUS_PRIMARY, FOCUS_SECONDARY, FOCUS_SUPPRESSED, HAPPINESS_BACK, HAPPINESS_PLACE,
    HAPPINESS_SHOW, HAPPINESS_WIN, PERFORMANCE_BACK, PERFORMANCE_MIDFIELD, PERFORMANCE_PLACE,
    PERFORMANCE_SHOW, PERFORMANCE_WIN, PRIME_MAX_STARTS, STAT_MAX, VETERAN_MAX_STARTS,
    YOUNG_MAX_STARTS,
};
use crate::horse::{Horse, HorseId, StatKind};
use crate::numbers::round_f64_to_i32;
use crate::race::DistanceClass;

/// Career stage by race starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareerPhase {
    Young,
    Prime,
    Veteran,
    Old,
}

impl CareerPhase {
    #[must_use]
    pub const fn from_starts(race_starts: u32) -> Self {
        if race_starts < YOUNG_MAX_STARTS {
            Self::Young
        } else if race_starts < PRIME_MAX_STARTS {
            Self::Prime
        } else if race_starts < VETERAN_MAX_STARTS {
            Self::Veteran
        } else {
            Self::Old
        }
    }

    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Young => CAREER_YOUNG,
            Self::Prime => CAREER_PRIME,
            Self::Veteran => CAREER_VETERAN,
            Self::Old => CAREER_OLD,
        }
    }
}

#[must_use]
pub const fn career_multiplier(race_starts: u32) -> f64 {
    CareerPhase::from_starts(race_starts).multiplier()
}

/// Raw growth toward the ceiling; zero once the stat has reached it.
#[must_use]
pub fn stat_growth(actual: u8, ceiling: u8, career: f64) -> f64 {
    if actual >= ceiling {
        return 0.0;
    }
    let room = f64::from(ceiling - actual);
    (room * BASE_GROWTH_RATE * career).clamp(0.0, room)
}

/// True when `place` falls in the back third of a `field`-horse race.
#[must_use]
pub const fn in_back_third(place: u8, field: usize) -> bool {
    let place = place as usize;
    place > field - field / 3
}

#[must_use]
pub const fn performance_multiplier(place: u8, field: usize) -> f64 {
    match place {
        1 => PERFORMANCE_WIN,
        2 => PERFORMANCE_PLACE,
        3 => PERFORMANCE_SHOW,
        0 => PERFORMANCE_BACK,
        _ if in_back_third(place, field) => PERFORMANCE_BACK,
        _ => PERFORMANCE_MIDFIELD,
    }
}

/// Which stats a race distance trains hardest.
#[must_use]
pub fn race_type_focus(furlongs: f64, stat: StatKind) -> f64 {
    match (DistanceClass::from_furlongs(furlongs), stat) {
        (DistanceClass::Sprint, StatKind::Speed) | (DistanceClass::Distance, StatKind::Stamina) => {
            FOCUS_PRIMARY
        }
        (DistanceClass::Sprint, StatKind::Agility)
        | (DistanceClass::Distance, StatKind::Durability) => FOCUS_SECONDARY,
        (DistanceClass::Sprint, StatKind::Stamina | StatKind::Durability)
        | (DistanceClass::Distance, StatKind::Speed | StatKind::Agility) => FOCUS_SUPPRESSED,
        (DistanceClass::Classic, _) => FOCUS_BALANCED,
    }
}

/// Happiness swing for a finish: +5 / +3 / +1, nothing mid-pack, −3 at the back.
#[must_use]
pub const fn happiness_change(place: u8, field: usize) -> i32 {
    match place {
        1 => HAPPINESS_WIN,
        2 => HAPPINESS_PLACE,
        3 => HAPPINESS_SHOW,
        0 => HAPPINESS_BACK,
        _ if in_back_third(place, field) => HAPPINESS_BACK,
        _ => 0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatDelta {
    pub stat: StatKind,
    pub before: u8,
    pub ceiling: u8,
    /// Unrounded growth after all multipliers.
    pub growth: f64,
    /// Points actually added.
    pub applied: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionReport {
    pub horse_id: HorseId,
    pub place: u8,
    pub field_size: usize,
    pub career_phase: CareerPhase,
    pub performance: f64,
    pub deltas: Vec<StatDelta>,
    pub happiness_delta: i32,
}

impl ProgressionReport {
    #[must_use]
    pub fn applied(&self, stat: StatKind) -> u8 {
        self.deltas
            .iter()
            .find(|delta| delta.stat == stat)
            .map_or(0, |delta| delta.applied)
    }
}

/// Growth for every growable stat after finishing `place` of `field` over `furlongs`.
#[must_use]
pub fn calculate_progression(
    horse: &Horse,
    place: u8,
    field: usize,
    furlongs: f64,
) -> ProgressionReport {
    let career_phase = CareerPhase::from_starts(horse.race_starts);
    let performance = performance_multiplier(place, field);
    let deltas = StatKind::GROWABLE
        .iter()
        .map(|&stat| {
            let before = horse.stats.get(stat);
            let ceiling = horse.potential.ceiling(stat);
            let room = ceiling.saturating_sub(before);
            let growth = (stat_growth(before, ceiling, career_phase.multiplier())
                * performance
                * race_type_focus(furlongs, stat))
            .clamp(0.0, f64::from(room));
            let rounded = round_f64_to_i32(growth).clamp(0, i32::from(room));
            StatDelta {
                stat,
                before,
                ceiling,
                growth,
                applied: u8::try_from(rounded).unwrap_or(0),
            }
        })
        .collect();
    ProgressionReport {
        horse_id: horse.id,
        place,
        field_size: field,
        career_phase,
        performance,
        deltas,
        happiness_delta: happiness_change(place, field),
    }
}

/// The horse after the race: grown stats, adjusted happiness, one more start.
#[must_use]
pub fn apply_progression(horse: &Horse, report: &ProgressionReport) -> Horse {
    let mut updated = horse.clone();
    for delta in &report.deltas {
        let current = updated.stats.get(delta.stat);
        updated
            .stats
            .set(delta.stat, current.saturating_add(delta.applied));
    }
    let happiness = i32::from(updated.stats.happiness) + report.happiness_delta;
    updated.stats.happiness =
        u8::try_from(happiness.clamp(0, i32::from(STAT_MAX))).unwrap_or(STAT_MAX);
    updated.race_starts = updated.race_starts.saturating_add(1);
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::horse::{HorseStats, LegType, StatPotential};

    #[test]
    fn career_bands() {
        assert_eq!(CareerPhase::from_starts(0), CareerPhase::Young);
        assert_eq!(CareerPhase::from_starts(9), CareerPhase::Young);
        assert_eq!(CareerPhase::from_starts(10), CareerPhase::Prime);
        assert_eq!(CareerPhase::from_starts(29), CareerPhase::Prime);
        assert_eq!(CareerPhase::from_starts(30), CareerPhase::Veteran);
        assert_eq!(CareerPhase::from_starts(49), CareerPhase::Veteran);
        assert_eq!(CareerPhase::from_starts(50), CareerPhase::Old);
        assert!((career_multiplier(15) - 1.20).abs() < f64::EPSILON);
    }

    #[test]
    fn growth_stops_at_ceiling() {
        assert!((stat_growth(50, 100, 1.0) - 1.0).abs() < 1e-12);
        assert!(stat_growth(80, 80, 1.2).abs() < f64::EPSILON);
        assert!(stat_growth(90, 70, 1.2).abs() < f64::EPSILON);
    }

    #[test]
    fn performance_thirds() {
        assert!((performance_multiplier(1, 12) - 1.50).abs() < f64::EPSILON);
        assert!((performance_multiplier(2, 12) - 1.25).abs() < f64::EPSILON);
        assert!((performance_multiplier(3, 12) - 1.10).abs() < f64::EPSILON);
        assert!((performance_multiplier(8, 12) - 1.00).abs() < f64::EPSILON);
        assert!((performance_multiplier(9, 12) - 0.75).abs() < f64::EPSILON);
        assert!((performance_multiplier(4, 6) - 1.00).abs() < f64::EPSILON);
        assert!((performance_multiplier(5, 6) - 0.75).abs() < f64::EPSILON);
        assert!((performance_multiplier(3, 3) - 1.10).abs() < f64::EPSILON);
        assert!((performance_multiplier(4, 5) - 1.00).abs() < f64::EPSILON);
        assert!((performance_multiplier(5, 5) - 0.75).abs() < f64::EPSILON);
        assert!((performance_multiplier(4, 4) - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn focus_follows_distance_class() {
        assert!((race_type_focus(6.0, StatKind::Speed) - 1.50).abs() < f64::EPSILON);
        assert!((race_type_focus(6.0, StatKind::Durability) - 0.75).abs() < f64::EPSILON);
        assert!((race_type_focus(12.0, StatKind::Stamina) - 1.50).abs() < f64::EPSILON);
        assert!((race_type_focus(12.0, StatKind::Agility) - 0.75).abs() < f64::EPSILON);
        assert!((race_type_focus(9.0, StatKind::Speed) - 1.00).abs() < f64::EPSILON);
    }

    #[test]
    fn prime_sprint_winner_grows_speed_most() {
        let horse = Horse::new(1, "Prime", LegType::StartDash).with_race_starts(15);
        let report = calculate_progression(&horse, 1, 8, 6.0);
        // 50 × 0.02 × 1.2 × 1.5 × 1.5 = 2.7
        assert_eq!(report.applied(StatKind::Speed), 3);
        assert_eq!(report.applied(StatKind::Agility), 2);
        assert_eq!(report.applied(StatKind::Stamina), 1);
        assert_eq!(report.happiness_delta, 5);
        let updated = apply_progression(&horse, &report);
        assert_eq!(updated.stats.speed, 53);
        assert_eq!(updated.stats.happiness, 55);
        assert_eq!(updated.race_starts, 16);
    }

    #[test]
    fn capped_stats_never_exceed_potential() {
        let horse = Horse::new(2, "Capped", LegType::LastSpurt)
            .with_stats(HorseStats {
                speed: 99,
                ..HorseStats::uniform(100)
            })
            .with_race_starts(12)
            .with_potential(StatPotential {
                speed: Some(100),
                ..StatPotential::default()
            });
        let report = calculate_progression(&horse, 1, 2, 6.0);
        assert!(report.applied(StatKind::Speed) <= 1);
        assert_eq!(report.applied(StatKind::Stamina), 0);
        let updated = apply_progression(&horse, &report);
        assert!(updated.stats.speed <= 100);
        assert_eq!(updated.stats.happiness, 100);
    }

    #[test]
    fn back_markers_lose_happiness_but_not_stats() {
        let horse = Horse::new(3, "Trailer", LegType::FrontRunner)
            .with_stats(HorseStats {
                happiness: 1,
                ..HorseStats::default()
            })
            .with_race_starts(60);
        let report = calculate_progression(&horse, 9, 9, 10.0);
        assert_eq!(report.happiness_delta, -3);
        assert!(report.deltas.iter().all(|delta| delta.growth >= 0.0));
        let updated = apply_progression(&horse, &report);
        assert_eq!(updated.stats.happiness, 0);
        assert_eq!(updated.stats.speed, 50);
    }
}
