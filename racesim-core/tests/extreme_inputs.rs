use racesim_core::speed::{ModifierContext, SpeedModel, StandardSpeedModel};
use racesim_core::stamina::{StaminaModel, StandardStaminaModel};
use racesim_core::{
    CancelFlag, FixedRandom, Horse, HorseStats, LanePosition, LegType, Race, RaceClass, RaceRun,
    RaceSimulator, ScriptedRandom, SeededRandom, SimulationConfig, Surface, TrackCondition,
    calculate_all_payouts, calculate_total_purse,
};

const LEGS: [LegType; 5] = [
    LegType::StartDash,
    LegType::FrontRunner,
    LegType::StretchRunner,
    LegType::LastSpurt,
    LegType::RailRunner,
];

const SURFACES: [Surface; 3] = [Surface::Dirt, Surface::Turf, Surface::Artificial];

fn extreme_stats() -> Vec<HorseStats> {
    let mut all = vec![HorseStats::uniform(0), HorseStats::uniform(100)];
    all.push(HorseStats {
        speed: 100,
        agility: 0,
        stamina: 0,
        durability: 100,
        happiness: 0,
    });
    all.push(HorseStats {
        speed: 0,
        agility: 100,
        stamina: 100,
        durability: 0,
        happiness: 100,
    });
    all
}

#[test]
fn natural_speed_stays_positive_and_finite_everywhere() {
    let field: Vec<LanePosition> = vec![
        LanePosition {
            horse: 1,
            lane: 1,
            distance: 0.3,
        },
        LanePosition {
            horse: 2,
            lane: 2,
            distance: 0.0,
        },
    ];
    for stats in extreme_stats() {
        for leg in LEGS {
            let horse = Horse::new(1, "Edge", leg).with_stats(stats);
            for condition in TrackCondition::ALL {
                for surface in SURFACES {
                    for stamina_ratio in [0.0, 0.25, 0.5, 1.0, f64::NAN, -3.0, 7.0] {
                        for tick in [0, 1, 50, 99, 100, 400] {
                            let ctx = ModifierContext {
                                tick,
                                total_ticks: 100,
                                horse: &horse,
                                runner: 0,
                                lane: 1,
                                distance: 0.0,
                                stamina_ratio,
                                condition,
                                surface,
                                furlongs: 10.0,
                                field: &field,
                            };
                            let speed = StandardSpeedModel.natural_speed(&ctx);
                            assert!(speed.is_finite() && speed > 0.0, "{speed} for {stats:?}");
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn depletion_is_finite_and_non_negative_for_any_pace() {
    for stats in extreme_stats() {
        for leg in LEGS {
            let horse = Horse::new(1, "Edge", leg).with_stats(stats);
            for furlongs in [0.0, 1.0, 6.0, 10.0, 12.0, 40.0, f64::NAN] {
                for speed in [0.0, 1e-9, 0.04, 0.5, 1e9, f64::INFINITY, f64::NAN] {
                    for progress in [-1.0, 0.0, 0.5, 0.99, 1.0, 5.0] {
                        let drain =
                            StandardStaminaModel.depletion(&horse, furlongs, speed, progress);
                        assert!(drain.is_finite() && drain >= 0.0, "{drain}");
                    }
                }
            }
        }
    }
}

#[test]
fn whole_races_at_the_extremes_finish_cleanly() {
    let simulator = RaceSimulator::new(SimulationConfig::default());
    for furlongs in [0.0, 1.0, 4.5, 16.0] {
        for (offset, stats) in extreme_stats().into_iter().enumerate() {
            let horses: Vec<Horse> = LEGS
                .iter()
                .enumerate()
                .map(|(index, leg)| {
                    let id = u64::try_from(index + 1).unwrap();
                    Horse::new(id, format!("Edge {id}"), *leg).with_stats(stats)
                })
                .collect();
            let mut run = RaceRun::new(
                Race::new(1, "Edge Case", furlongs),
                TrackCondition::ALL[offset % TrackCondition::ALL.len()],
                horses,
                100.0,
            );
            let outcome = simulator
                .simulate(
                    &mut run,
                    &mut SeededRandom::from_user_seed(u64::try_from(offset).unwrap()),
                    &CancelFlag::new(),
                )
                .unwrap();
            let cap = f64::from(simulator.tick_cap(run.total_ticks));
            assert!(outcome.ticks >= 1);
            for entry in &run.entries {
                let time = entry.finish_time.unwrap();
                assert!(time.is_finite() && time > 0.0 && time <= cap, "{time}");
                assert!(entry.current_stamina >= 0.0);
                assert!(entry.last_speed.is_finite() && entry.last_speed > 0.0);
                assert!(entry.finish_place.is_some());
            }
        }
    }
}

#[test]
fn scripted_extreme_draws_do_not_break_the_loop() {
    let simulator = RaceSimulator::new(SimulationConfig::default());
    let horses = (1..=4)
        .map(|id| Horse::new(id, format!("Scripted {id}"), LegType::LastSpurt))
        .collect();
    let mut run = RaceRun::new(
        Race::new(1, "Scripted", 6.0),
        TrackCondition::Heavy,
        horses,
        100.0,
    );
    simulator
        .simulate(
            &mut run,
            &mut ScriptedRandom::new(vec![0.0, 1.0, f64::NAN, -5.0, 0.999]),
            &CancelFlag::new(),
        )
        .unwrap();
    assert!(run.is_complete());
    assert!(run.entries.iter().all(|e| e.distance <= 6.0));

    let mut fixed = RaceRun::new(
        Race::new(2, "Pinned", 6.0),
        TrackCondition::Fast,
        vec![Horse::new(1, "Pinned", LegType::StartDash)],
        100.0,
    );
    simulator
        .simulate(&mut fixed, &mut FixedRandom::new(0.0), &CancelFlag::new())
        .unwrap();
    assert_eq!(fixed.entries[0].finish_place, Some(1));
}

#[test]
fn payouts_never_exceed_the_purse() {
    for class in RaceClass::ALL {
        for furlongs in [0.0, 1.0, 5.5, 10.0, 14.0, 30.0] {
            let purse = calculate_total_purse(class, furlongs);
            assert!(purse > 0);
            let payouts = calculate_all_payouts(class, purse);
            let paid: i64 = payouts.values().sum();
            assert!(paid <= purse, "{class:?} {furlongs}f paid {paid} of {purse}");
            assert!(payouts.values().all(|cents| *cents > 0));
        }
    }
}
