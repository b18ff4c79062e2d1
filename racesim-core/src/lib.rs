//! Racesim Core
//!
//! Tick-driven horse race simulation: speed and stamina models, lane
//! changes and traffic, race events with commentary, purse payouts and
//! post-race stat progression. Storage is abstracted behind
//! [`RaceRepository`]; this crate has no I/O of its own.

pub mod commentary;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod executor;
pub mod horse;
pub mod memory;
pub mod numbers;
pub mod overtaking;
pub mod progression;
pub mod purse;
pub mod race;
pub mod random;
pub mod result;
pub mod run;
pub mod speed;
pub mod stamina;

// Re-export commonly used types
pub use commentary::CommentaryGenerator;
pub use config::{ConfigError, SimulationConfig};
pub use error::{Cancelled, RaceError};
pub use events::{
    RaceEvent, current_leader, detect_final_stretch, detect_lead_change, detect_photo_finish,
};
pub use executor::{CancelFlag, RaceEngine, RaceRequest, RaceSimulator, SimulationOutcome};
pub use horse::{Horse, HorseId, HorseStats, LegType, StatKind, StatPotential};
pub use memory::{InMemoryRepository, MemoryRepositoryError};
pub use overtaking::{LaneChange, OvertakingManager};
pub use progression::{
    CareerPhase, ProgressionReport, StatDelta, apply_progression, calculate_progression,
};
pub use purse::{calculate_all_payouts, calculate_payout, calculate_total_purse, format_cents};
pub use race::{DistanceClass, PayoutTier, Race, RaceClass, RaceId, Surface, TrackCondition};
pub use random::{FixedRandom, RandomSource, ScriptedRandom, SeededRandom};
pub use result::{RaceRunResult, ResultEntry};
pub use run::{HorseIndex, HorseSnapshot, LanePosition, RaceRun, RaceRunHorse, TickSnapshot};
pub use speed::{ModifierContext, SpeedBreakdown, SpeedModel, StandardSpeedModel};
pub use stamina::{StaminaModel, StandardStaminaModel};

/// Trait for abstracting race persistence
/// Platform-specific implementations should provide this
pub trait RaceRepository {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Look up a race definition
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn find_race(&self, id: RaceId) -> Result<Option<Race>, Self::Error>;

    /// Look up a horse
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn find_horse(&self, id: HorseId) -> Result<Option<Horse>, Self::Error>;

    /// Candidate opponents for `horse`, at most `limit`, never `horse` itself
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn find_opponents(&self, horse: &Horse, limit: usize) -> Result<Vec<Horse>, Self::Error>;

    /// Persist a finished run and hand back the stored copy
    ///
    /// # Errors
    ///
    /// Returns an error if the run cannot be saved.
    fn save_race_run(&self, run: RaceRun) -> Result<RaceRun, Self::Error>;
}
