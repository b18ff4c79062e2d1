//! Repository-backed race execution.
use crate::RaceRepository;
use crate::config::SimulationConfig;
use crate::constants::CONDITION_COUNT;
use crate::error::RaceError;
use crate::executor::{CancelFlag, RaceRequest, RaceSimulator};
use crate::horse::{Horse, HorseId};
use crate::numbers::usize_to_u8;
use crate::progression::calculate_progression;
use crate::purse::{calculate_payout, calculate_total_purse};
use crate::race::TrackCondition;
use crate::random::RandomSource;
use crate::result::{RaceRunResult, ResultEntry};
use crate::run::RaceRun;
use crate::speed::{SpeedModel, StandardSpeedModel};
use crate::stamina::{StaminaModel, StandardStaminaModel};

/// Candidate pool fetched per opponent slot before the random draw.
const OPPONENT_POOL_FACTOR: usize = 2;

/// Loads race data, runs the simulator and persists the finished run.
pub struct RaceEngine<R, S = StandardSpeedModel, M = StandardStaminaModel>
where
    R: RaceRepository,
    S: SpeedModel,
    M: StaminaModel,
{
    repository: R,
    simulator: RaceSimulator<S, M>,
}

impl<R> RaceEngine<R>
where
    R: RaceRepository,
{
    /// Engine with the default configuration and standard models.
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            simulator: RaceSimulator::new(SimulationConfig::default()),
        }
    }

    /// Engine with a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RaceError::InvalidConfig`] if `config` fails validation.
    pub fn with_config(
        repository: R,
        config: SimulationConfig,
    ) -> Result<Self, RaceError<R::Error>> {
        config.validate()?;
        Ok(Self {
            repository,
            simulator: RaceSimulator::new(config),
        })
    }
}

impl<R, S, M> RaceEngine<R, S, M>
where
    R: RaceRepository,
    S: SpeedModel,
    M: StaminaModel,
{
    /// Engine with custom speed/stamina models.
    pub const fn with_simulator(repository: R, simulator: RaceSimulator<S, M>) -> Self {
        Self {
            repository,
            simulator,
        }
    }

    pub const fn repository(&self) -> &R {
        &self.repository
    }

    pub const fn simulator(&self) -> &RaceSimulator<S, M> {
        &self.simulator
    }

    /// Run one race end to end.
    ///
    /// Random draws happen in a fixed order: track condition (unless the
    /// request pins one), opponent picks, gate shuffle, then the tick loop.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for a missing race or horse, `Cancelled` if
    /// `cancel` trips (nothing is persisted), or the repository's own error.
    pub fn run_race<G: RandomSource + ?Sized>(
        &self,
        request: &RaceRequest,
        rng: &mut G,
        cancel: &CancelFlag,
    ) -> Result<RaceRunResult, RaceError<R::Error>> {
        let config = self.simulator.config();
        config.validate()?;

        let race = self
            .repository
            .find_race(request.race_id)
            .map_err(RaceError::Repository)?
            .ok_or(RaceError::RaceNotFound(request.race_id))?;
        let horse = self
            .repository
            .find_horse(request.horse_id)
            .map_err(RaceError::Repository)?
            .ok_or(RaceError::HorseNotFound(request.horse_id))?;

        let mut opponent_slots = usize::from(config.max_field_size).saturating_sub(1);
        if let Some(limit) = request.max_opponents {
            opponent_slots = opponent_slots.min(limit);
        }
        let candidates = if opponent_slots == 0 {
            Vec::new()
        } else {
            self.repository
                .find_opponents(&horse, opponent_slots.saturating_mul(OPPONENT_POOL_FACTOR))
                .map_err(RaceError::Repository)?
        };

        let condition = request
            .condition
            .unwrap_or_else(|| TrackCondition::from_index(rng.next_below(CONDITION_COUNT)));
        let opponents = draw_opponents(candidates, opponent_slots, horse.id, rng);
        let mut field = Vec::with_capacity(opponents.len() + 1);
        field.push(horse.clone());
        field.extend(opponents);
        let lanes = shuffled_lanes(field.len(), rng);

        log::debug!(
            "{}: {} runners, {} on {}, {:.1}f",
            race.id,
            field.len(),
            race.surface,
            condition,
            race.effective_furlongs()
        );

        let mut run = RaceRun::with_lanes(race, condition, field, &lanes, config.initial_stamina);
        let outcome = self.simulator.simulate(&mut run, rng, cancel)?;
        let run = self
            .repository
            .save_race_run(run)
            .map_err(RaceError::Repository)?;

        Ok(build_result(&run, &horse, outcome.photo_finish.is_some()))
    }
}

/// Draw up to `slots` opponents without replacement, skipping the entered horse.
fn draw_opponents<G: RandomSource + ?Sized>(
    mut pool: Vec<Horse>,
    slots: usize,
    entered: HorseId,
    rng: &mut G,
) -> Vec<Horse> {
    pool.retain(|candidate| candidate.id != entered);
    let mut picked = Vec::with_capacity(slots.min(pool.len()));
    while picked.len() < slots && !pool.is_empty() {
        let len = u32::try_from(pool.len()).unwrap_or(u32::MAX);
        let index = usize::try_from(rng.next_below(len)).unwrap_or(0);
        picked.push(pool.swap_remove(index.min(pool.len() - 1)));
    }
    picked
}

/// Fisher–Yates over gate lanes `1..=field`.
fn shuffled_lanes<G: RandomSource + ?Sized>(field: usize, rng: &mut G) -> Vec<u8> {
    let mut lanes: Vec<u8> = (1..=field).map(usize_to_u8).collect();
    for i in (1..lanes.len()).rev() {
        let bound = u32::try_from(i + 1).unwrap_or(u32::MAX);
        let j = usize::try_from(rng.next_below(bound)).unwrap_or(0).min(i);
        lanes.swap(i, j);
    }
    lanes
}

fn build_result(run: &RaceRun, entered: &Horse, photo_finish: bool) -> RaceRunResult {
    let furlongs = run.race.effective_furlongs();
    let purse_cents = calculate_total_purse(run.race.class, furlongs);
    let field_size = run.field_size();
    let entries: Vec<ResultEntry> = run
        .standings()
        .into_iter()
        .filter_map(|index| {
            let entry = run.entries.get(index)?;
            let horse = run.horses.get(entry.horse)?;
            let place = entry.finish_place.unwrap_or(u8::MAX);
            let progression = calculate_progression(horse, place, field_size, furlongs);
            Some(ResultEntry {
                horse_id: horse.id,
                name: horse.name.clone(),
                leg_type: horse.leg_type,
                place,
                finish_time: entry.finish_time.unwrap_or(f64::from(run.ticks_elapsed)),
                payout_cents: calculate_payout(run.race.class, purse_cents, i32::from(place)),
                lane_changes: run.lane_changes(entry.horse),
                finished: entry.distance >= furlongs,
                progression,
            })
        })
        .collect();

    RaceRunResult {
        race_id: run.race.id,
        race_name: run.race.name.clone(),
        track_name: run.race.track_name.clone(),
        surface: run.race.surface,
        condition: run.condition,
        class: run.race.class,
        furlongs,
        purse_cents,
        total_ticks: run.total_ticks,
        ticks_elapsed: run.ticks_elapsed,
        entries,
        commentary: run.commentary.clone(),
        photo_finish,
        fingerprint: run.fingerprint(),
        entered: entered.id,
    }
}
