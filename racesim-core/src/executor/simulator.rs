//! The tick loop.
//!
//! Per tick, in this order:
//! 1. cancellation check
//! 2. one variance draw per running horse, entry order
//! 3. lane changes, entry order
//! 4. natural speed for every running horse
//! 5. traffic caps against the blockers' natural speed
//! 6. lane-change penalty
//! 7. variance, distance and fractional finish time
//! 8. stamina depletion
//! 9. history snapshot
//! 10. events and commentary
//!
//! Apart from the opening line before tick 1 and the closing lines after
//! the last tick, nothing else touches the random source, so a fixed seed
//! replays a run bit for bit.
use std::cmp::Ordering;

use crate::commentary::CommentaryGenerator;
use crate::config::SimulationConfig;
use crate::constants::AVERAGE_BASE_SPEED;
use crate::error::Cancelled;
use crate::events::{
    RaceEvent, current_leader, detect_final_stretch, detect_lead_change, detect_photo_finish,
};
use crate::executor::CancelFlag;
use crate::numbers::clamp_finite;
use crate::overtaking::{OvertakingManager, apply_lane_change_penalty, running_field};
use crate::random::RandomSource;
use crate::run::{HorseIndex, RaceRun};
use crate::speed::{
    ModifierContext, SpeedModel, StandardSpeedModel, calculate_random_variance, race_progress,
};
use crate::stamina::{StaminaModel, StandardStaminaModel};

/// What the loop observed, beyond what it wrote into the run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationOutcome {
    pub ticks: u32,
    /// Winner and runner-up when the top two crossed within the photo margin.
    pub photo_finish: Option<(HorseIndex, HorseIndex)>,
    /// True when the tick cap stopped the race before every horse finished.
    pub hit_tick_cap: bool,
}

/// Drives a [`RaceRun`] to completion.
#[derive(Debug, Clone, Default)]
pub struct RaceSimulator<S = StandardSpeedModel, M = StandardStaminaModel>
where
    S: SpeedModel,
    M: StaminaModel,
{
    config: SimulationConfig,
    speed: S,
    stamina: M,
}

impl RaceSimulator {
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_models(config, StandardSpeedModel, StandardStaminaModel)
    }
}

impl<S, M> RaceSimulator<S, M>
where
    S: SpeedModel,
    M: StaminaModel,
{
    #[must_use]
    pub const fn with_models(config: SimulationConfig, speed: S, stamina: M) -> Self {
        Self {
            config,
            speed,
            stamina,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Hard stop for a run of `total_ticks` expected ticks.
    #[must_use]
    pub fn tick_cap(&self, total_ticks: u32) -> u32 {
        total_ticks
            .saturating_mul(self.config.max_tick_multiplier.max(1))
            .max(1)
    }

    /// Run the tick loop until every horse finishes or the tick cap is hit.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] when `cancel` trips; places are not assigned then.
    pub fn simulate<R: RandomSource + ?Sized>(
        &self,
        run: &mut RaceRun,
        rng: &mut R,
        cancel: &CancelFlag,
    ) -> Result<SimulationOutcome, Cancelled> {
        let total = run.total_ticks;
        let cap = self.tick_cap(total);
        let furlongs = run.race.effective_furlongs();
        let overtaking = OvertakingManager::new(run.field_size());
        let mut commentary =
            CommentaryGenerator::new(run.race.name.clone(), run.race.track_name.clone())
                .with_lead_change_gap(self.config.lead_change_commentary_gap);

        run.ticks_elapsed = 0;
        run.history.clear();
        run.events.clear();
        run.commentary.clear();
        run.record_tick(0);
        run.events.push(RaceEvent::Start { tick: 0 });
        run.commentary.push(commentary.start_line(rng));

        let mut leader = current_leader(None, &run.positions());
        let mut stretch_called = false;
        let mut next_place: u8 = 1;
        let mut tick = 0_u32;

        while tick < cap && !run.is_complete() {
            if cancel.should_stop(tick) {
                log::debug!("{} cancelled at tick {tick}", run.race.id);
                return Err(Cancelled { tick });
            }

            let variances: Vec<f64> = run
                .entries
                .iter()
                .map(|entry| {
                    if entry.is_finished() {
                        1.0
                    } else {
                        calculate_random_variance(rng)
                    }
                })
                .collect();

            let progress = race_progress(tick, total);
            for change in overtaking.resolve_lane_changes(&mut run.entries, &run.horses, progress) {
                log::trace!(
                    "tick {tick}: runner {} lane {} -> {}",
                    change.horse,
                    change.from,
                    change.to
                );
            }

            let natural = self.natural_speeds(run, tick, furlongs);
            let capped: Vec<f64> = (0..run.entries.len())
                .map(|index| {
                    if run.entries[index].is_finished() {
                        0.0
                    } else {
                        overtaking.apply_traffic_effects(index, &run.entries, &run.horses, &natural)
                    }
                })
                .collect();

            let crossed = self.advance_runners(run, tick, &capped, &variances, furlongs, progress);
            next_place = assign_places(run, crossed, next_place);

            tick += 1;
            run.ticks_elapsed = tick;
            run.record_tick(tick);

            leader = self.observe_events(
                run,
                tick,
                leader,
                &mut stretch_called,
                &mut commentary,
                rng,
            );
        }

        let hit_tick_cap = !run.is_complete();
        if hit_tick_cap {
            log::warn!(
                "{} hit the tick cap ({cap}) with runners still on the track",
                run.race.id
            );
        }

        let finishers: Vec<(HorseIndex, f64)> = run
            .entries
            .iter()
            .filter_map(|entry| entry.finish_time.map(|time| (entry.horse, time)))
            .collect();
        let photo = detect_photo_finish(&finishers, self.config.photo_finish_margin);
        let photo_finish = match photo {
            Some(RaceEvent::PhotoFinish {
                winner, runner_up, ..
            }) => Some((winner, runner_up)),
            _ => None,
        };
        if let Some(event) = photo {
            run.events.push(event);
        }

        rank_unfinished(run, next_place, cap);

        let standings = run.standings();
        let names: Vec<&str> = standings
            .iter()
            .map(|&index| horse_name(run, index))
            .collect();
        let photo_names = photo_finish.map(|(a, b)| (horse_name(run, a), horse_name(run, b)));
        let closing = commentary.finish_lines(&names, photo_names, rng);
        run.commentary.extend(closing);

        log::debug!(
            "{} finished after {tick} ticks (expected {total}), photo finish: {}",
            run.race.id,
            photo_finish.is_some()
        );
        Ok(SimulationOutcome {
            ticks: tick,
            photo_finish,
            hit_tick_cap,
        })
    }

    fn natural_speeds(&self, run: &RaceRun, tick: u32, furlongs: f64) -> Vec<f64> {
        let field = running_field(&run.entries);
        run.entries
            .iter()
            .map(|entry| {
                if entry.is_finished() {
                    return 0.0;
                }
                let Some(horse) = run.horses.get(entry.horse) else {
                    return 0.0;
                };
                let ctx = ModifierContext {
                    tick,
                    total_ticks: run.total_ticks,
                    horse,
                    runner: entry.horse,
                    lane: entry.lane,
                    distance: entry.distance,
                    stamina_ratio: entry.stamina_ratio(),
                    condition: run.condition,
                    surface: run.race.surface,
                    furlongs,
                    field: &field,
                };
                self.speed.natural_speed(&ctx)
            })
            .collect()
    }

    /// Steps 6 through 8. Returns the runners that crossed the line this tick
    /// with their fractional finish times.
    fn advance_runners(
        &self,
        run: &mut RaceRun,
        tick: u32,
        capped: &[f64],
        variances: &[f64],
        furlongs: f64,
        progress: f64,
    ) -> Vec<(usize, f64)> {
        let ticks_before = f64::from(tick);
        let mut crossed = Vec::new();
        for (index, entry) in run.entries.iter_mut().enumerate() {
            if entry.is_finished() {
                continue;
            }
            let base = capped.get(index).copied().unwrap_or(0.0);
            let variance = variances.get(index).copied().unwrap_or(1.0);
            let penalised = apply_lane_change_penalty(entry, base);
            let speed = clamp_finite(
                penalised * variance,
                f64::MIN_POSITIVE,
                f64::MAX,
                AVERAGE_BASE_SPEED,
            );
            entry.last_speed = speed;

            let remaining = (furlongs - entry.distance).max(0.0);
            if speed >= remaining {
                entry.advance(remaining);
                entry.distance = furlongs;
                let time = ticks_before + remaining / speed;
                entry.finish_time = Some(time);
                crossed.push((index, time));
            } else {
                entry.advance(speed);
            }

            if let Some(horse) = run.horses.get(entry.horse) {
                entry.deplete(self.stamina.depletion(horse, furlongs, speed, progress));
            }
        }
        crossed
    }

    fn observe_events<R: RandomSource + ?Sized>(
        &self,
        run: &mut RaceRun,
        tick: u32,
        leader: Option<HorseIndex>,
        stretch_called: &mut bool,
        commentary: &mut CommentaryGenerator,
        rng: &mut R,
    ) -> Option<HorseIndex> {
        let positions = run.positions();
        if let Some(event) = detect_lead_change(tick, leader, &positions) {
            if let RaceEvent::LeadChange {
                previous,
                leader: new_leader,
                ..
            } = event
            {
                log::trace!("tick {tick}: lead change {previous} -> {new_leader}");
                let leader_name = horse_name(run, new_leader).to_string();
                let previous_name = horse_name(run, previous).to_string();
                if let Some(line) =
                    commentary.lead_change_line(tick, &leader_name, &previous_name, rng)
                {
                    run.commentary.push(line);
                }
            }
            run.events.push(event);
        }

        let leader = current_leader(leader, &positions);
        if let Some(current) = leader
            && let Some(distance) = positions
                .iter()
                .find(|p| p.horse == current)
                .map(|p| p.distance)
            && let Some(event) = detect_final_stretch(
                tick,
                current,
                distance,
                run.race.effective_furlongs(),
                *stretch_called,
            )
        {
            *stretch_called = true;
            let line = commentary.final_stretch_line(horse_name(run, current), rng);
            run.commentary.push(line);
            run.events.push(event);
        }
        leader
    }
}

fn horse_name(run: &RaceRun, index: HorseIndex) -> &str {
    run.horses
        .get(index)
        .map_or("Unknown runner", |horse| horse.name.as_str())
}

/// Places go out in finish-time order; same-time finishers by entry order.
fn assign_places(run: &mut RaceRun, mut crossed: Vec<(usize, f64)>, mut next_place: u8) -> u8 {
    crossed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
    for (index, _) in crossed {
        if let Some(entry) = run.entries.get_mut(index) {
            entry.finish_place = Some(next_place);
            next_place = next_place.saturating_add(1);
        }
    }
    next_place
}

/// Horses still running at the cap trail the field by distance covered.
fn rank_unfinished(run: &mut RaceRun, mut next_place: u8, cap: u32) {
    let mut unfinished: Vec<usize> = run
        .entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.finish_place.is_none())
        .map(|(index, _)| index)
        .collect();
    unfinished.sort_by(|&a, &b| {
        run.entries[b]
            .distance
            .partial_cmp(&run.entries[a].distance)
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });
    for index in unfinished {
        let entry = &mut run.entries[index];
        entry.finish_place = Some(next_place);
        entry.finish_time = Some(f64::from(cap));
        next_place = next_place.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::horse::{Horse, HorseStats, LegType};
    use crate::race::{Race, TrackCondition};
    use crate::random::{FixedRandom, SeededRandom};

    fn neutral_run(count: u64, furlongs: f64) -> RaceRun {
        let horses = (0..count)
            .map(|i| Horse::new(i + 1, format!("Runner {i}"), LegType::FrontRunner))
            .collect();
        RaceRun::new(
            Race::new(1, "Unit Stakes", furlongs),
            TrackCondition::Good,
            horses,
            100.0,
        )
    }

    #[test]
    fn solo_neutral_run_lands_near_expected_ticks() {
        let simulator = RaceSimulator::new(SimulationConfig::default());
        let mut run = neutral_run(1, 10.0);
        let outcome = simulator
            .simulate(&mut run, &mut FixedRandom::midpoint(), &CancelFlag::new())
            .unwrap();
        assert!((225..=250).contains(&outcome.ticks), "ticks {}", outcome.ticks);
        assert_eq!(run.entries[0].finish_place, Some(1));
        assert!(outcome.photo_finish.is_none());
        assert!(!outcome.hit_tick_cap);
        assert_eq!(run.history.len(), usize::try_from(outcome.ticks).unwrap() + 1);
    }

    #[test]
    fn distance_is_monotone_and_stamina_non_negative() {
        let simulator = RaceSimulator::new(SimulationConfig::default());
        let mut run = neutral_run(6, 12.0);
        simulator
            .simulate(&mut run, &mut SeededRandom::from_user_seed(5), &CancelFlag::new())
            .unwrap();
        for horse in 0..run.field_size() {
            let mut last = 0.0;
            for snapshot in &run.history {
                let position = snapshot.position_of(horse).unwrap();
                assert!(position.distance >= last);
                assert!(position.stamina >= 0.0);
                assert!((1..=6).contains(&position.lane));
                last = position.distance;
            }
        }
        let mut places: Vec<u8> = run.entries.iter().filter_map(|e| e.finish_place).collect();
        places.sort_unstable();
        assert_eq!(places, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn cancellation_stops_before_places() {
        let simulator = RaceSimulator::new(SimulationConfig::default());
        let mut run = neutral_run(3, 10.0);
        let err = simulator
            .simulate(&mut run, &mut FixedRandom::midpoint(), &CancelFlag::at_tick(25))
            .unwrap_err();
        assert_eq!(err, Cancelled { tick: 25 });
        assert!(run.entries.iter().all(|e| e.finish_place.is_none()));
    }

    #[test]
    fn tick_cap_ranks_stragglers_by_distance() {
        let config = SimulationConfig {
            max_tick_multiplier: 2,
            ..SimulationConfig::default()
        };
        let simulator = RaceSimulator::new(config);
        let horses = vec![
            Horse::new(1, "Plodder", LegType::FrontRunner).with_stats(HorseStats::uniform(0)),
            Horse::new(2, "Crawler", LegType::FrontRunner).with_stats(HorseStats::uniform(0)),
        ];
        let mut run = RaceRun::new(
            Race::new(1, "Endless", 10.0),
            TrackCondition::Slow,
            horses,
            100.0,
        );
        // Pretend the race is far shorter than it is so the cap bites.
        run.total_ticks = 20;
        let outcome = simulator
            .simulate(&mut run, &mut FixedRandom::midpoint(), &CancelFlag::new())
            .unwrap();
        assert!(outcome.hit_tick_cap);
        assert_eq!(outcome.ticks, 40);
        assert!(run.entries.iter().all(|e| e.finish_time == Some(40.0)));
        let mut places: Vec<u8> = run.entries.iter().filter_map(|e| e.finish_place).collect();
        places.sort_unstable();
        assert_eq!(places, vec![1, 2]);
        assert!(outcome.photo_finish.is_none());
    }

    #[test]
    fn same_seed_replays_identically() {
        let simulator = RaceSimulator::new(SimulationConfig::default());
        let mut first = neutral_run(8, 9.0);
        let mut second = neutral_run(8, 9.0);
        simulator
            .simulate(&mut first, &mut SeededRandom::from_user_seed(77), &CancelFlag::new())
            .unwrap();
        simulator
            .simulate(&mut second, &mut SeededRandom::from_user_seed(77), &CancelFlag::new())
            .unwrap();
        assert_eq!(first.fingerprint(), second.fingerprint());
        assert_eq!(first.commentary, second.commentary);
    }
}
