//! Speed modifier pipeline.
//!
//! A horse's natural speed for a tick is the baseline pace scaled by four
//! independent factors: stats, environment, race phase and remaining stamina.
//! Random variance is not part of natural speed; the executor applies it after
//! traffic capping, right before distance accumulation.
use serde::{Deserialize, Serialize};

use crate::constants::{
    AGILITY_FACTOR_MAX, AGILITY_FACTOR_MIN, AGILITY_STAT_SLOPE, AVERAGE_BASE_SPEED,
    CONDITION_FAST, CONDITION_FIRM, CONDITION_FROZEN, CONDITION_GOOD, CONDITION_HEAVY,
    CONDITION_MUDDY, CONDITION_SLOPPY, CONDITION_SLOW, CONDITION_SOFT, CONDITION_WET_FAST,
    CONDITION_YIELDING, FRONT_RUNNER_WINDOW, HAPPINESS_SPEED_BONUS_DIVISOR,
    HAPPINESS_SPEED_MAX, HAPPINESS_SPEED_MIN, HAPPINESS_SPEED_PENALTY_DIVISOR,
    LAST_SPURT_WINDOW, RAIL_CLEARANCE_FURLONGS, RAIL_LANE, RAIL_RUNNER_BONUS,
    SPEED_FACTOR_MAX, SPEED_FACTOR_MIN, SPEED_STAT_SLOPE, STAMINA_BRIDGE_SLOPE,
    STAMINA_FATIGUE_BASE_PENALTY, STAMINA_FATIGUE_QUADRATIC, STAMINA_FATIGUE_THRESHOLD,
    STAMINA_GENTLE_SLOPE, STAMINA_GENTLE_THRESHOLD, STAMINA_SPEED_FLOOR, START_DASH_WINDOW,
    STAT_NEUTRAL, STRETCH_RUNNER_WINDOW, SURFACE_ARTIFICIAL, SURFACE_DIRT, SURFACE_TURF,
    VARIANCE_HALF_SPREAD, VARIANCE_SPREAD,
};
use crate::horse::{Horse, HorseStats, LegType};
use crate::numbers::{ceil_f64_to_u32, clamp_finite};
use crate::race::{Surface, TrackCondition};
use crate::random::RandomSource;
use crate::run::{HorseIndex, LanePosition};

/// Immutable per-tick inputs to the speed pipeline. Built fresh every tick.
#[derive(Debug, Clone, Copy)]
pub struct ModifierContext<'a> {
    pub tick: u32,
    pub total_ticks: u32,
    pub horse: &'a Horse,
    /// Runner this context describes; excluded from rail checks.
    pub runner: HorseIndex,
    pub lane: u8,
    pub distance: f64,
    /// `current / initial` stamina.
    pub stamina_ratio: f64,
    pub condition: TrackCondition,
    pub surface: Surface,
    pub furlongs: f64,
    /// Positions of every runner still racing.
    pub field: &'a [LanePosition],
}

impl ModifierContext<'_> {
    /// `tick / total_ticks`, clamped to `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        race_progress(self.tick, self.total_ticks)
    }
}

/// Fraction of the expected race duration elapsed at `tick`.
#[must_use]
pub fn race_progress(tick: u32, total_ticks: u32) -> f64 {
    if total_ticks == 0 {
        return 1.0;
    }
    (f64::from(tick) / f64::from(total_ticks)).clamp(0.0, 1.0)
}

/// Ticks a neutral horse needs to cover `furlongs`.
#[must_use]
pub fn expected_ticks(furlongs: f64) -> u32 {
    let raw = furlongs / AVERAGE_BASE_SPEED;
    // 10f / (10/237) lands a hair above 237 in floating point.
    ceil_f64_to_u32(raw - 1e-9).max(1)
}

/// Breakdown of every factor that went into a natural speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedBreakdown {
    pub stat: f64,
    pub environment: f64,
    pub phase: f64,
    pub stamina: f64,
    pub natural_speed: f64,
}

/// Capability set used by the executor to price a tick.
pub trait SpeedModel {
    fn stat_factor(&self, stats: &HorseStats) -> f64 {
        calculate_stat_factor(stats)
    }

    fn environmental_factor(&self, surface: Surface, condition: TrackCondition) -> f64 {
        calculate_environmental_factor(surface, condition)
    }

    fn phase_factor(&self, ctx: &ModifierContext<'_>) -> f64 {
        calculate_phase_factor(ctx)
    }

    fn stamina_factor(&self, stamina_ratio: f64) -> f64 {
        calculate_stamina_factor(stamina_ratio)
    }

    fn breakdown(&self, ctx: &ModifierContext<'_>) -> SpeedBreakdown {
        let stat = self.stat_factor(&ctx.horse.stats);
        let environment = self.environmental_factor(ctx.surface, ctx.condition);
        let phase = self.phase_factor(ctx);
        let stamina = self.stamina_factor(ctx.stamina_ratio);
        SpeedBreakdown {
            stat,
            environment,
            phase,
            stamina,
            natural_speed: AVERAGE_BASE_SPEED * stat * environment * phase * stamina,
        }
    }

    /// Speed before traffic and variance, in furlongs per tick.
    fn natural_speed(&self, ctx: &ModifierContext<'_>) -> f64 {
        self.breakdown(ctx).natural_speed
    }
}

/// The production speed pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardSpeedModel;

impl SpeedModel for StandardSpeedModel {}

#[must_use]
pub fn calculate_speed_factor(speed: u8) -> f64 {
    let raw = (f64::from(speed) - STAT_NEUTRAL).mul_add(SPEED_STAT_SLOPE, 1.0);
    clamp_finite(raw, SPEED_FACTOR_MIN, SPEED_FACTOR_MAX, 1.0)
}

#[must_use]
pub fn calculate_agility_factor(agility: u8) -> f64 {
    let raw = (f64::from(agility) - STAT_NEUTRAL).mul_add(AGILITY_STAT_SLOPE, 1.0);
    clamp_finite(raw, AGILITY_FACTOR_MIN, AGILITY_FACTOR_MAX, 1.0)
}

/// Logarithmic happiness curve: steeper penalty below 50 than bonus above.
#[must_use]
pub fn calculate_happiness_speed_factor(happiness: u8) -> f64 {
    let h = f64::from(happiness.min(100));
    let raw = if h < STAT_NEUTRAL {
        1.0 - (51.0 - h).log10() / HAPPINESS_SPEED_PENALTY_DIVISOR
    } else {
        1.0 + (h - 49.0).log10() / HAPPINESS_SPEED_BONUS_DIVISOR
    };
    clamp_finite(raw, HAPPINESS_SPEED_MIN, HAPPINESS_SPEED_MAX, 1.0)
}

/// `speed × agility × happiness` factors.
#[must_use]
pub fn calculate_stat_factor(stats: &HorseStats) -> f64 {
    calculate_speed_factor(stats.speed)
        * calculate_agility_factor(stats.agility)
        * calculate_happiness_speed_factor(stats.happiness)
}

#[must_use]
pub const fn surface_modifier(surface: Surface) -> f64 {
    match surface {
        Surface::Dirt => SURFACE_DIRT,
        Surface::Turf => SURFACE_TURF,
        Surface::Artificial => SURFACE_ARTIFICIAL,
    }
}

#[must_use]
pub const fn condition_modifier(condition: TrackCondition) -> f64 {
    match condition {
        TrackCondition::Fast => CONDITION_FAST,
        TrackCondition::Firm => CONDITION_FIRM,
        TrackCondition::Good => CONDITION_GOOD,
        TrackCondition::WetFast => CONDITION_WET_FAST,
        TrackCondition::Soft => CONDITION_SOFT,
        TrackCondition::Yielding => CONDITION_YIELDING,
        TrackCondition::Muddy => CONDITION_MUDDY,
        TrackCondition::Sloppy => CONDITION_SLOPPY,
        TrackCondition::Heavy => CONDITION_HEAVY,
        TrackCondition::Frozen => CONDITION_FROZEN,
        TrackCondition::Slow => CONDITION_SLOW,
    }
}

#[must_use]
pub const fn calculate_environmental_factor(surface: Surface, condition: TrackCondition) -> f64 {
    surface_modifier(surface) * condition_modifier(condition)
}

/// True when no other runner sits in the rail lane strictly ahead within 0.5f.
#[must_use]
pub fn is_rail_clear(runner: HorseIndex, distance: f64, field: &[LanePosition]) -> bool {
    let nearest_ahead = field
        .iter()
        .filter(|other| other.horse != runner && other.lane == RAIL_LANE)
        .map(|other| other.distance - distance)
        .filter(|gap| *gap > 0.0)
        .fold(None::<f64>, |nearest, gap| {
            Some(nearest.map_or(gap, |current| current.min(gap)))
        });
    nearest_ahead.is_none_or(|gap| gap >= RAIL_CLEARANCE_FURLONGS)
}

fn window_bonus(progress: f64, (start, end, bonus): (f64, f64, f64)) -> f64 {
    let inside = progress >= start && (progress < end || end >= 1.0);
    if inside { bonus } else { 1.0 }
}

/// Leg-type phase bonus; the rail runner's bonus depends on lane and traffic instead.
#[must_use]
pub fn calculate_phase_factor(ctx: &ModifierContext<'_>) -> f64 {
    let progress = ctx.progress();
    match ctx.horse.leg_type {
        LegType::StartDash => window_bonus(progress, START_DASH_WINDOW),
        LegType::FrontRunner => window_bonus(progress, FRONT_RUNNER_WINDOW),
        LegType::StretchRunner => window_bonus(progress, STRETCH_RUNNER_WINDOW),
        LegType::LastSpurt => window_bonus(progress, LAST_SPURT_WINDOW),
        LegType::RailRunner => {
            if ctx.lane == RAIL_LANE && is_rail_clear(ctx.runner, ctx.distance, ctx.field) {
                RAIL_RUNNER_BONUS
            } else {
                1.0
            }
        }
    }
}

/// Speed multiplier from remaining stamina: 1.00 when fresh, 0.90 when empty.
#[must_use]
pub fn calculate_stamina_factor(stamina_ratio: f64) -> f64 {
    let p = clamp_finite(stamina_ratio, 0.0, 1.0, 1.0);
    let raw = if p >= STAMINA_GENTLE_THRESHOLD {
        (1.0 - p).mul_add(-STAMINA_GENTLE_SLOPE, 1.0)
    } else if p > STAMINA_FATIGUE_THRESHOLD {
        let at_gentle = (1.0 - STAMINA_GENTLE_THRESHOLD).mul_add(-STAMINA_GENTLE_SLOPE, 1.0);
        (STAMINA_GENTLE_THRESHOLD - p).mul_add(-STAMINA_BRIDGE_SLOPE, at_gentle)
    } else {
        let fatigue = 1.0 - p;
        1.0 - (fatigue * fatigue).mul_add(STAMINA_FATIGUE_QUADRATIC, STAMINA_FATIGUE_BASE_PENALTY)
    };
    clamp_finite(raw, STAMINA_SPEED_FLOOR, 1.0, 1.0)
}

/// One uniform draw mapped onto `[0.99, 1.01]`.
pub fn calculate_random_variance<R: RandomSource + ?Sized>(rng: &mut R) -> f64 {
    variance_from_draw(rng.next_f64())
}

/// Map a `[0, 1)` draw onto the variance band.
#[must_use]
pub fn variance_from_draw(draw: f64) -> f64 {
    let draw = clamp_finite(draw, 0.0, 1.0, 0.5);
    1.0 + draw.mul_add(VARIANCE_SPREAD, -VARIANCE_HALF_SPREAD)
}

/// Natural speed through the standard pipeline.
#[must_use]
pub fn calculate_natural_speed(ctx: &ModifierContext<'_>) -> f64 {
    StandardSpeedModel.natural_speed(ctx)
}
