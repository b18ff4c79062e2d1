//! Per-tick stamina depletion.
use crate::constants::{
    AVERAGE_BASE_SPEED, CLASSIC_MAX_FURLONGS, DEPLETION_CLASSIC, DEPLETION_LONG,
    DEPLETION_MARATHON, DEPLETION_SPRINT, DURABILITY_EFFICIENCY_AT_ZERO,
    DURABILITY_EFFICIENCY_SLOPE, EFFORT_FRONT_RUNNER, EFFORT_LAST_SPURT, EFFORT_RAIL_RUNNER,
    EFFORT_START_DASH, EFFORT_STRETCH_RUNNER, HAPPINESS_DEPLETION_BONUS_DIVISOR,
    HAPPINESS_DEPLETION_PENALTY_DIVISOR, LONG_MAX_FURLONGS, PACE_MULTIPLIER_MAX,
    PACE_MULTIPLIER_MIN, SPRINT_MAX_FURLONGS, STAMINA_EFFICIENCY_AT_ZERO,
    STAMINA_EFFICIENCY_SLOPE, STAT_NEUTRAL,
};
use crate::horse::{Horse, HorseStats, LegType};
use crate::numbers::clamp_finite;

/// Capability set for stamina drain.
pub trait StaminaModel {
    fn base_rate(&self, furlongs: f64) -> f64 {
        calculate_base_rate(furlongs)
    }

    fn efficiency(&self, stats: &HorseStats) -> f64 {
        calculate_efficiency(stats)
    }

    fn leg_type_multiplier(&self, leg_type: LegType, progress: f64) -> f64 {
        calculate_leg_type_multiplier(leg_type, progress)
    }

    /// Stamina spent this tick at `current_speed` furlongs per tick.
    fn depletion(&self, horse: &Horse, furlongs: f64, current_speed: f64, progress: f64) -> f64 {
        self.base_rate(furlongs)
            * self.efficiency(&horse.stats)
            * calculate_pace_multiplier(current_speed)
            * self.leg_type_multiplier(horse.leg_type, progress)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardStaminaModel;

impl StaminaModel for StandardStaminaModel {}

/// Base drain per tick by distance bracket.
#[must_use]
pub fn calculate_base_rate(furlongs: f64) -> f64 {
    if furlongs.is_nan() || furlongs <= SPRINT_MAX_FURLONGS {
        DEPLETION_SPRINT
    } else if furlongs <= CLASSIC_MAX_FURLONGS {
        DEPLETION_CLASSIC
    } else if furlongs <= LONG_MAX_FURLONGS {
        DEPLETION_LONG
    } else {
        DEPLETION_MARATHON
    }
}

/// Unhappy horses burn more, happy horses less.
#[must_use]
pub fn calculate_happiness_depletion_factor(happiness: u8) -> f64 {
    let h = f64::from(happiness.min(100));
    if h < STAT_NEUTRAL {
        1.0 + (51.0 - h).log10() / HAPPINESS_DEPLETION_PENALTY_DIVISOR
    } else {
        1.0 - (h - 49.0).log10() / HAPPINESS_DEPLETION_BONUS_DIVISOR
    }
}

#[must_use]
pub fn calculate_efficiency(stats: &HorseStats) -> f64 {
    let stamina = f64::from(stats.stamina.min(100))
        .mul_add(-STAMINA_EFFICIENCY_SLOPE, STAMINA_EFFICIENCY_AT_ZERO);
    let durability = f64::from(stats.durability.min(100))
        .mul_add(-DURABILITY_EFFICIENCY_SLOPE, DURABILITY_EFFICIENCY_AT_ZERO);
    stamina * durability * calculate_happiness_depletion_factor(stats.happiness)
}

/// Pace relative to the neutral baseline, clamped to `[0.5, 2.0]`.
#[must_use]
pub fn calculate_pace_multiplier(current_speed: f64) -> f64 {
    clamp_finite(
        current_speed / AVERAGE_BASE_SPEED,
        PACE_MULTIPLIER_MIN,
        PACE_MULTIPLIER_MAX,
        1.0,
    )
}

fn effort(curve: &[(f64, f64)], progress: f64) -> f64 {
    curve
        .iter()
        .find(|(bound, _)| progress < *bound)
        .or_else(|| curve.last())
        .map_or(1.0, |(_, multiplier)| *multiplier)
}

#[must_use]
pub fn calculate_leg_type_multiplier(leg_type: LegType, progress: f64) -> f64 {
    let progress = clamp_finite(progress, 0.0, 1.0, 0.0);
    match leg_type {
        LegType::StartDash => effort(&EFFORT_START_DASH, progress),
        LegType::FrontRunner => effort(&EFFORT_FRONT_RUNNER, progress),
        LegType::StretchRunner => effort(&EFFORT_STRETCH_RUNNER, progress),
        LegType::LastSpurt => effort(&EFFORT_LAST_SPURT, progress),
        LegType::RailRunner => effort(&EFFORT_RAIL_RUNNER, progress),
    }
}

/// Depletion through the standard model.
#[must_use]
pub fn calculate_depletion(horse: &Horse, furlongs: f64, current_speed: f64, progress: f64) -> f64 {
    StandardStaminaModel.depletion(horse, furlongs, current_speed, progress)
}
