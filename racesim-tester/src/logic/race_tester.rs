use anyhow::{Context, Result};
use std::sync::Arc;

use racesim_core::{
    CancelFlag, Horse, HorseId, InMemoryRepository, Race, RaceEngine, RaceRequest, RaceRunResult,
    SeededRandom, SimulationConfig, TrackCondition,
};

/// Declarative plan for one race: who runs where, and what must hold afterwards.
#[derive(Debug, Clone)]
pub struct RacePlan {
    pub race: Race,
    pub field: Vec<Horse>,
    pub entered: HorseId,
    pub condition: Option<TrackCondition>,
    /// Run the same seed twice and record the second fingerprint.
    pub replay: bool,
    pub expectations: Vec<RaceExpectation>,
}

impl RacePlan {
    /// Plan with `field[0]` as the entered horse.
    #[must_use]
    pub fn new(race: Race, field: Vec<Horse>) -> Self {
        let entered = field.first().map_or(HorseId(0), |horse| horse.id);
        Self {
            race,
            field,
            entered,
            condition: None,
            replay: false,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_condition(mut self, condition: TrackCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    #[must_use]
    pub const fn with_replay(mut self) -> Self {
        self.replay = true;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<RaceExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a race completes.
type RaceExpectationFn = Arc<dyn Fn(&RaceSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct RaceExpectation(RaceExpectationFn);

impl std::fmt::Debug for RaceExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RaceExpectation").finish()
    }
}

impl RaceExpectation {
    pub fn evaluate(&self, summary: &RaceSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for RaceExpectation
where
    F: Fn(&RaceSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// Everything an expectation may look at.
#[derive(Debug, Clone)]
pub struct RaceSummary {
    pub seed: u64,
    pub result: RaceRunResult,
    pub replay_fingerprint: Option<u64>,
    pub field_size: usize,
    /// Photo-finish margin the race ran with.
    pub photo_margin: f64,
}

impl RaceSummary {
    #[must_use]
    pub fn photo_lines(&self) -> usize {
        self.result
            .commentary
            .iter()
            .filter(|line| line.to_lowercase().contains("photo"))
            .count()
    }
}

/// Runs race plans against a fresh in-memory repository per race.
#[derive(Debug, Clone, Default)]
pub struct RaceTester {
    config: SimulationConfig,
    verbose: bool,
}

impl RaceTester {
    #[must_use]
    pub const fn new(config: SimulationConfig, verbose: bool) -> Self {
        Self { config, verbose }
    }

    pub fn run_plan(&self, plan: &RacePlan, seed: u64) -> Result<RaceSummary> {
        let result = self.run_once(plan, seed)?;
        let replay_fingerprint = if plan.replay {
            Some(self.run_once(plan, seed)?.fingerprint)
        } else {
            None
        };
        if self.verbose {
            println!("     ↳ seed {seed}: {}", result.headline());
        }
        log::debug!("seed {seed}: {}", result.headline());
        Ok(RaceSummary {
            seed,
            result,
            replay_fingerprint,
            field_size: plan.field.len(),
            photo_margin: self.config.photo_finish_margin,
        })
    }

    fn run_once(&self, plan: &RacePlan, seed: u64) -> Result<RaceRunResult> {
        let repository = InMemoryRepository::seeded([plan.race.clone()], plan.field.clone())
            .context("seeding in-memory repository")?;
        let engine = RaceEngine::with_config(repository, self.config.clone())
            .context("building race engine")?;
        let mut request = RaceRequest::new(plan.race.id.0, plan.entered.0)
            .with_max_opponents(plan.field.len().saturating_sub(1));
        if let Some(condition) = plan.condition {
            request = request.with_condition(condition);
        }
        engine
            .run_race(
                &request,
                &mut SeededRandom::from_user_seed(seed),
                &CancelFlag::new(),
            )
            .with_context(|| format!("running {} with seed {seed}", plan.race.name))
    }
}
