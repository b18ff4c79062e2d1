//! Errors surfaced by the race engine.
use thiserror::Error;

use crate::config::ConfigError;
use crate::horse::HorseId;
use crate::race::RaceId;

/// Failure running a race; `E` is the repository's own error type.
#[derive(Debug, Error)]
pub enum RaceError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error("race {0} not found")]
    RaceNotFound(RaceId),
    #[error("horse {0} not found")]
    HorseNotFound(HorseId),
    #[error("race run cancelled after {ticks} ticks")]
    Cancelled { ticks: u32 },
    #[error("invalid simulation config: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("repository error: {0}")]
    Repository(#[source] E),
}

impl<E> RaceError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::RaceNotFound(_) | Self::HorseNotFound(_))
    }

    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Cooperative cancellation signal from the simulator, before any result exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("simulation cancelled at tick {tick}")]
pub struct Cancelled {
    pub tick: u32,
}

impl<E> From<Cancelled> for RaceError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(cancelled: Cancelled) -> Self {
        Self::Cancelled {
            ticks: cancelled.tick,
        }
    }
}
