//! Balance and tuning constants for the race simulation.
//!
//! Everything the tick loop multiplies by lives here. Only the limits in
//! [`crate::SimulationConfig`] are adjustable at runtime.

// Pace calibration ---------------------------------------------------------
/// Furlongs covered per tick by a neutral horse; a neutral 10f race takes ~237 ticks.
pub const AVERAGE_BASE_SPEED: f64 = 10.0 / 237.0;
pub(crate) const STAT_NEUTRAL: f64 = 50.0;
pub(crate) const STAT_MAX: u8 = 100;
pub(crate) const MIN_FURLONGS: f64 = 1.0;

// Stat factors --------------------------------------------------------------
pub(crate) const SPEED_STAT_SLOPE: f64 = 0.002;
pub(crate) const SPEED_FACTOR_MIN: f64 = 0.90;
pub(crate) const SPEED_FACTOR_MAX: f64 = 1.10;
pub(crate) const AGILITY_STAT_SLOPE: f64 = 0.001;
pub(crate) const AGILITY_FACTOR_MIN: f64 = 0.95;
pub(crate) const AGILITY_FACTOR_MAX: f64 = 1.05;
pub(crate) const HAPPINESS_SPEED_PENALTY_DIVISOR: f64 = 15.0;
pub(crate) const HAPPINESS_SPEED_BONUS_DIVISOR: f64 = 20.0;
pub(crate) const HAPPINESS_SPEED_MIN: f64 = 0.88;
pub(crate) const HAPPINESS_SPEED_MAX: f64 = 1.09;

// Environment -----------------------------------------------------------------
pub(crate) const SURFACE_DIRT: f64 = 1.00;
pub(crate) const SURFACE_TURF: f64 = 1.02;
pub(crate) const SURFACE_ARTIFICIAL: f64 = 1.01;

pub(crate) const CONDITION_FAST: f64 = 1.03;
pub(crate) const CONDITION_FIRM: f64 = 1.02;
pub(crate) const CONDITION_GOOD: f64 = 1.00;
pub(crate) const CONDITION_WET_FAST: f64 = 0.99;
pub(crate) const CONDITION_SOFT: f64 = 0.98;
pub(crate) const CONDITION_YIELDING: f64 = 0.97;
pub(crate) const CONDITION_MUDDY: f64 = 0.96;
pub(crate) const CONDITION_SLOPPY: f64 = 0.95;
pub(crate) const CONDITION_HEAVY: f64 = 0.93;
pub(crate) const CONDITION_FROZEN: f64 = 0.92;
pub(crate) const CONDITION_SLOW: f64 = 0.90;

// Leg-type phase windows (start, end, bonus) -------------------------------------
pub(crate) const START_DASH_WINDOW: (f64, f64, f64) = (0.00, 0.25, 1.04);
pub(crate) const FRONT_RUNNER_WINDOW: (f64, f64, f64) = (0.00, 0.20, 1.03);
pub(crate) const STRETCH_RUNNER_WINDOW: (f64, f64, f64) = (0.60, 0.80, 1.03);
pub(crate) const LAST_SPURT_WINDOW: (f64, f64, f64) = (0.75, 1.00, 1.04);
pub(crate) const RAIL_RUNNER_BONUS: f64 = 1.03;
pub(crate) const RAIL_LANE: u8 = 1;
pub(crate) const RAIL_CLEARANCE_FURLONGS: f64 = 0.5;

// Stamina → speed curve ---------------------------------------------------------
pub(crate) const STAMINA_GENTLE_THRESHOLD: f64 = 0.75;
pub(crate) const STAMINA_GENTLE_SLOPE: f64 = 0.02;
pub(crate) const STAMINA_BRIDGE_SLOPE: f64 = 0.11;
pub(crate) const STAMINA_FATIGUE_THRESHOLD: f64 = 0.5;
pub(crate) const STAMINA_FATIGUE_BASE_PENALTY: f64 = 0.01;
pub(crate) const STAMINA_FATIGUE_QUADRATIC: f64 = 0.09;
pub(crate) const STAMINA_SPEED_FLOOR: f64 = 0.90;

// Random variance -------------------------------------------------------------------
pub(crate) const VARIANCE_SPREAD: f64 = 0.02;
pub(crate) const VARIANCE_HALF_SPREAD: f64 = 0.01;

// Stamina depletion -----------------------------------------------------------------
pub(crate) const DEPLETION_SPRINT: f64 = 0.08;
pub(crate) const DEPLETION_CLASSIC: f64 = 0.15;
pub(crate) const DEPLETION_LONG: f64 = 0.22;
pub(crate) const DEPLETION_MARATHON: f64 = 0.30;
pub(crate) const SPRINT_MAX_FURLONGS: f64 = 6.0;
pub(crate) const CLASSIC_MAX_FURLONGS: f64 = 10.0;
pub(crate) const LONG_MAX_FURLONGS: f64 = 12.0;
pub(crate) const STAMINA_EFFICIENCY_AT_ZERO: f64 = 1.20;
pub(crate) const STAMINA_EFFICIENCY_SLOPE: f64 = 0.004;
pub(crate) const DURABILITY_EFFICIENCY_AT_ZERO: f64 = 1.15;
pub(crate) const DURABILITY_EFFICIENCY_SLOPE: f64 = 0.003;
pub(crate) const HAPPINESS_DEPLETION_PENALTY_DIVISOR: f64 = 20.0;
pub(crate) const HAPPINESS_DEPLETION_BONUS_DIVISOR: f64 = 25.0;
pub(crate) const PACE_MULTIPLIER_MIN: f64 = 0.5;
pub(crate) const PACE_MULTIPLIER_MAX: f64 = 2.0;
pub const INITIAL_STAMINA: f64 = 100.0;

// Leg-type effort curves: (progress upper bound, multiplier), last entry open-ended.
pub(crate) const EFFORT_START_DASH: [(f64, f64); 3] = [(0.25, 1.30), (0.50, 1.00), (1.0, 0.90)];
pub(crate) const EFFORT_FRONT_RUNNER: [(f64, f64); 1] = [(1.0, 1.10)];
pub(crate) const EFFORT_STRETCH_RUNNER: [(f64, f64); 3] = [(0.60, 0.95), (0.80, 1.20), (1.0, 1.00)];
pub(crate) const EFFORT_LAST_SPURT: [(f64, f64); 2] = [(0.75, 0.80), (1.0, 1.40)];
pub(crate) const EFFORT_RAIL_RUNNER: [(f64, f64); 2] = [(0.50, 0.95), (1.0, 1.05)];

// Overtaking -----------------------------------------------------------------------
pub(crate) const LANE_CHANGE_BASE_COOLDOWN: f64 = 10.0;
pub(crate) const LANE_CHANGE_COOLDOWN_PER_AGILITY: f64 = 0.08;
pub(crate) const LANE_CHANGE_MIN_COOLDOWN: u32 = 2;
pub(crate) const CLEARANCE_AHEAD_FURLONGS: f64 = 0.2;
pub(crate) const CLEARANCE_BEHIND_FURLONGS: f64 = 0.1;
pub(crate) const OVERTAKE_BASE_THRESHOLD: f64 = 0.25;
pub(crate) const OVERTAKE_SPEED_SCALE: f64 = 0.002;
pub(crate) const OVERTAKE_LATE_PHASE_PROGRESS: f64 = 0.75;
pub(crate) const OVERTAKE_LATE_PHASE_MULTIPLIER: f64 = 1.5;
pub(crate) const BLOCKING_DISTANCE: f64 = 0.2;
pub(crate) const LANE_CHANGE_PENALTY_TICKS: u32 = 2;
pub(crate) const LANE_CHANGE_SPEED_PENALTY: f64 = 0.01;

pub(crate) const TRAFFIC_CAP_START_DASH: f64 = 0.01;
pub(crate) const TRAFFIC_CAP_FRONT_RUNNER: f64 = 0.02;
pub(crate) const TRAFFIC_CAP_STRETCH_RUNNER: f64 = 0.015;
pub(crate) const TRAFFIC_CAP_LAST_SPURT: f64 = 0.015;
pub(crate) const TRAFFIC_CAP_RAIL_RUNNER: f64 = 0.03;
pub(crate) const FRONT_RUNNER_FRUSTRATION: f64 = 0.02;

// Events & commentary ---------------------------------------------------------------
pub(crate) const PHOTO_FINISH_MARGIN_TICKS: f64 = 0.25;
pub(crate) const FINAL_STRETCH_FRACTION: f64 = 0.75;
pub(crate) const LEAD_CHANGE_COMMENTARY_GAP: u32 = 15;

// Purse ---------------------------------------------------------------------------
pub(crate) const PURSE_REFERENCE_FURLONGS: f64 = 10.0;
pub(crate) const PURSE_PER_FURLONG: f64 = 0.05;
pub(crate) const PURSE_MIN_MULTIPLIER: f64 = 0.50;
pub(crate) const BASIS_POINTS: i64 = 10_000;

pub(crate) const PURSE_MAIDEN_CENTS: i64 = 2_000_000;
pub(crate) const PURSE_CLAIMING_CENTS: i64 = 2_500_000;
pub(crate) const PURSE_ALLOWANCE_CENTS: i64 = 5_000_000;
pub(crate) const PURSE_ALLOWANCE_OPTIONAL_CENTS: i64 = 7_500_000;
pub(crate) const PURSE_STAKES_CENTS: i64 = 10_000_000;
pub(crate) const PURSE_GRADE_THREE_CENTS: i64 = 20_000_000;
pub(crate) const PURSE_GRADE_TWO_CENTS: i64 = 35_000_000;
pub(crate) const PURSE_GRADE_ONE_CENTS: i64 = 60_000_000;
pub(crate) const PURSE_CHAMPIONSHIP_CENTS: i64 = 100_000_000;

pub(crate) const PAYOUT_LOWER_BP: [i64; 3] = [6_000, 2_000, 1_000];
pub(crate) const PAYOUT_MID_BP: [i64; 4] = [5_800, 2_000, 1_200, 600];
pub(crate) const PAYOUT_STAKES_BP: [i64; 5] = [6_000, 2_000, 1_000, 600, 400];
pub(crate) const PAYOUT_ELITE_BP: [i64; 5] = [6_000, 2_000, 1_100, 600, 300];
pub(crate) const PAYOUT_CHAMPIONSHIP_BP: [i64; 5] = [6_200, 2_000, 1_000, 500, 300];

// Stat progression ------------------------------------------------------------------
pub(crate) const BASE_GROWTH_RATE: f64 = 0.02;
pub(crate) const YOUNG_MAX_STARTS: u32 = 10;
pub(crate) const PRIME_MAX_STARTS: u32 = 30;
pub(crate) const VETERAN_MAX_STARTS: u32 = 50;
pub(crate) const CAREER_YOUNG: f64 = 0.80;
pub(crate) const CAREER_PRIME: f64 = 1.20;
pub(crate) const CAREER_VETERAN: f64 = 0.60;
pub(crate) const CAREER_OLD: f64 = 0.20;

pub(crate) const PERFORMANCE_WIN: f64 = 1.50;
pub(crate) const PERFORMANCE_PLACE: f64 = 1.25;
pub(crate) const PERFORMANCE_SHOW: f64 = 1.10;
pub(crate) const PERFORMANCE_MIDFIELD: f64 = 1.00;
pub(crate) const PERFORMANCE_BACK: f64 = 0.75;

pub(crate) const FOCUS_PRIMARY: f64 = 1.50;
pub(crate) const FOCUS_SECONDARY: f64 = 1.25;
pub(crate) const FOCUS_SUPPRESSED: f64 = 0.75;
pub(crate) const FOCUS_BALANCED: f64 = 1.00;
pub(crate) const DISTANCE_MIN_FURLONGS: f64 = 11.0;

pub(crate) const HAPPINESS_WIN: i32 = 5;
pub(crate) const HAPPINESS_PLACE: i32 = 3;
pub(crate) const HAPPINESS_SHOW: i32 = 1;
pub(crate) const HAPPINESS_BACK: i32 = -3;

// Run limits ----------------------------------------------------------------------
pub(crate) const DEFAULT_MAX_FIELD_SIZE: u8 = 12;
pub(crate) const DEFAULT_MAX_TICK_MULTIPLIER: u32 = 3;
pub(crate) const CONDITION_COUNT: u32 = 11;
