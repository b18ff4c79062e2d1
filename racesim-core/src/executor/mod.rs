//! Race orchestration: setup, the tick loop and result assembly.
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::horse::HorseId;
use crate::race::{RaceId, TrackCondition};

pub mod engine;
pub mod simulator;

pub use engine::RaceEngine;
pub use simulator::{RaceSimulator, SimulationOutcome};

/// Cooperative cancellation, checked once at the top of every tick.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
    at_tick: Option<u32>,
}

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A flag that trips itself once the loop reaches `tick`.
    #[must_use]
    pub fn at_tick(tick: u32) -> Self {
        Self {
            flag: Arc::default(),
            at_tick: Some(tick),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// True when the run should stop before simulating `tick`.
    #[must_use]
    pub fn should_stop(&self, tick: u32) -> bool {
        self.is_cancelled() || self.at_tick.is_some_and(|limit| tick >= limit)
    }
}

/// Ask to run `horse_id` in `race_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceRequest {
    pub race_id: RaceId,
    pub horse_id: HorseId,
    /// Skip the random condition roll.
    #[serde(default)]
    pub condition: Option<TrackCondition>,
    /// Further limit the opponent count below the configured field size.
    #[serde(default)]
    pub max_opponents: Option<usize>,
}

impl RaceRequest {
    #[must_use]
    pub const fn new(race_id: u64, horse_id: u64) -> Self {
        Self {
            race_id: RaceId(race_id),
            horse_id: HorseId(horse_id),
            condition: None,
            max_opponents: None,
        }
    }

    #[must_use]
    pub const fn with_condition(mut self, condition: TrackCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    #[must_use]
    pub const fn with_max_opponents(mut self, max_opponents: usize) -> Self {
        self.max_opponents = Some(max_opponents);
        self
    }
}
