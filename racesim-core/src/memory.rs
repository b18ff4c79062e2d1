//! In-process repository backing tests and the tester binary.
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use thiserror::Error;

use crate::RaceRepository;
use crate::horse::{Horse, HorseId};
use crate::race::{Race, RaceId};
use crate::run::RaceRun;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MemoryRepositoryError {
    #[error("{0} store lock poisoned")]
    Poisoned(&'static str),
}

fn poisoned<T>(store: &'static str) -> impl FnOnce(PoisonError<T>) -> MemoryRepositoryError {
    move |_| MemoryRepositoryError::Poisoned(store)
}

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    races: RwLock<BTreeMap<RaceId, Race>>,
    horses: RwLock<BTreeMap<HorseId, Horse>>,
    runs: RwLock<Vec<RaceRun>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a race.
    ///
    /// # Errors
    ///
    /// Returns an error if the race store lock is poisoned.
    pub fn insert_race(&self, race: Race) -> Result<(), MemoryRepositoryError> {
        self.races
            .write()
            .map_err(poisoned("race"))?
            .insert(race.id, race);
        Ok(())
    }

    /// Insert or replace a horse.
    ///
    /// # Errors
    ///
    /// Returns an error if the horse store lock is poisoned.
    pub fn insert_horse(&self, horse: Horse) -> Result<(), MemoryRepositoryError> {
        self.horses
            .write()
            .map_err(poisoned("horse"))?
            .insert(horse.id, horse);
        Ok(())
    }

    /// Builder-style seeding for tests and scenarios.
    ///
    /// # Errors
    ///
    /// Returns an error if a store lock is poisoned.
    pub fn seeded(
        races: impl IntoIterator<Item = Race>,
        horses: impl IntoIterator<Item = Horse>,
    ) -> Result<Self, MemoryRepositoryError> {
        let repo = Self::new();
        for race in races {
            repo.insert_race(race)?;
        }
        for horse in horses {
            repo.insert_horse(horse)?;
        }
        Ok(repo)
    }

    /// Every persisted run, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the run store lock is poisoned.
    pub fn runs(&self) -> Result<Vec<RaceRun>, MemoryRepositoryError> {
        Ok(self.runs.read().map_err(poisoned("run"))?.clone())
    }

    /// # Errors
    ///
    /// Returns an error if the run store lock is poisoned.
    pub fn run_count(&self) -> Result<usize, MemoryRepositoryError> {
        Ok(self.runs.read().map_err(poisoned("run"))?.len())
    }
}

impl RaceRepository for InMemoryRepository {
    type Error = MemoryRepositoryError;

    fn find_race(&self, id: RaceId) -> Result<Option<Race>, Self::Error> {
        Ok(self.races.read().map_err(poisoned("race"))?.get(&id).cloned())
    }

    fn find_horse(&self, id: HorseId) -> Result<Option<Horse>, Self::Error> {
        Ok(self.horses.read().map_err(poisoned("horse"))?.get(&id).cloned())
    }

    /// Closest career length first, ties broken by id.
    fn find_opponents(&self, horse: &Horse, limit: usize) -> Result<Vec<Horse>, Self::Error> {
        let horses = self.horses.read().map_err(poisoned("horse"))?;
        let mut candidates: Vec<&Horse> = horses.values().filter(|h| h.id != horse.id).collect();
        candidates.sort_by_key(|h| (h.race_starts.abs_diff(horse.race_starts), h.id));
        Ok(candidates.into_iter().take(limit).cloned().collect())
    }

    fn save_race_run(&self, run: RaceRun) -> Result<RaceRun, Self::Error> {
        self.runs.write().map_err(poisoned("run"))?.push(run.clone());
        Ok(run)
    }
}
