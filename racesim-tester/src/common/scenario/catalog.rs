use anyhow::{Result, ensure};

use racesim_core::purse::paid_places;
use racesim_core::{
    Horse, HorseId, HorseStats, LegType, Race, RaceClass, StatKind, Surface, TrackCondition,
};

use super::TestScenario;
use crate::logic::{RacePlan, RaceSummary};

pub fn catalog_scenarios() -> Vec<TestScenario> {
    vec![
        smoke(),
        speed_gap(),
        photo_finish(),
        wide_margin(),
        rail_runner(),
        full_field(),
        extreme_stats(),
        sprint(),
        marathon(),
        deterministic(),
    ]
}

pub fn find_catalog_scenario(key: &str) -> Option<TestScenario> {
    catalog_scenarios()
        .into_iter()
        .find(|scenario| scenario.key == key)
}

fn horse(id: u64, name: &str, leg_type: LegType, stats: HorseStats) -> Horse {
    Horse::new(id, name, leg_type).with_stats(stats)
}

fn every_horse_finished(summary: &RaceSummary) -> Result<()> {
    for entry in &summary.result.entries {
        ensure!(
            entry.finished,
            "{} never reached the line ({} ticks)",
            entry.name,
            summary.result.ticks_elapsed
        );
    }
    Ok(())
}

fn places_are_unique(summary: &RaceSummary) -> Result<()> {
    let mut places: Vec<u8> = summary.result.entries.iter().map(|e| e.place).collect();
    places.sort_unstable();
    let expected: Vec<u8> = (1..=u8::try_from(places.len()).unwrap_or(u8::MAX)).collect();
    ensure!(places == expected, "places {places:?} are not 1..=n");
    Ok(())
}

fn purse_is_not_overpaid(summary: &RaceSummary) -> Result<()> {
    let paid = summary.result.total_paid_cents();
    ensure!(
        paid <= summary.result.purse_cents,
        "paid {paid} cents from a purse of {}",
        summary.result.purse_cents
    );
    Ok(())
}

fn photo_call_matches_margin(summary: &RaceSummary) -> Result<()> {
    let entries = &summary.result.entries;
    let close = entries.len() >= 2
        && entries[0].finished
        && entries[1].finished
        && (entries[1].finish_time - entries[0].finish_time) < summary.photo_margin;
    ensure!(
        summary.result.photo_finish == close,
        "photo flag {} but margin says {close}",
        summary.result.photo_finish
    );
    ensure!(
        summary.photo_lines() == usize::from(close),
        "expected {} photo lines, saw {}",
        usize::from(close),
        summary.photo_lines()
    );
    Ok(())
}

fn smoke() -> TestScenario {
    let plan = RacePlan::new(
        Race::new(1, "Smoke Handicap", 10.0).with_track("Churchill Downs"),
        vec![horse(1, "Steady Eddie", LegType::FrontRunner, HorseStats::default())],
    )
    .with_condition(TrackCondition::Good)
    .with_expectation(|summary: &RaceSummary| {
        let ticks = summary.result.ticks_elapsed;
        ensure!(
            (225..=250).contains(&ticks),
            "neutral 10f run took {ticks} ticks"
        );
        ensure!(
            summary.result.winner().map(|w| w.place) == Some(1),
            "solo runner did not win"
        );
        Ok(())
    })
    .with_expectation(every_horse_finished);
    TestScenario::new("smoke", "Smoke Test", plan)
}

fn speed_gap() -> TestScenario {
    let fast = HorseStats {
        speed: 80,
        ..HorseStats::default()
    };
    let slow = HorseStats {
        speed: 40,
        ..HorseStats::default()
    };
    let plan = RacePlan::new(
        Race::new(2, "Speed Gap Allowance", 8.0).with_class(RaceClass::Allowance),
        vec![
            horse(1, "Quick Silver", LegType::StartDash, fast),
            horse(2, "Slow Poke", LegType::StartDash, slow),
        ],
    )
    .with_condition(TrackCondition::Fast)
    .with_expectation(|summary: &RaceSummary| {
        ensure!(
            summary.result.winner().map(|w| w.horse_id) == Some(HorseId(1)),
            "speed 80 lost to speed 40"
        );
        Ok(())
    });
    TestScenario::new("speed-gap", "Speed Gap", plan)
}

fn photo_finish() -> TestScenario {
    let stats = HorseStats::default();
    let plan = RacePlan::new(
        Race::new(3, "Twin Stakes", 9.0).with_class(RaceClass::Stakes),
        vec![
            horse(1, "Mirror Image", LegType::FrontRunner, stats),
            horse(2, "Image Mirror", LegType::FrontRunner, stats),
        ],
    )
    .with_condition(TrackCondition::Good)
    .with_expectation(photo_call_matches_margin)
    .with_expectation(places_are_unique);
    TestScenario::new("photo-finish", "Photo Finish", plan)
}

fn wide_margin() -> TestScenario {
    let plan = RacePlan::new(
        Race::new(4, "Mismatch Claiming", 8.0).with_class(RaceClass::Claiming),
        vec![
            horse(1, "Champion", LegType::StretchRunner, HorseStats::uniform(100)),
            horse(2, "Plodder", LegType::StretchRunner, HorseStats::uniform(0)),
        ],
    )
    .with_condition(TrackCondition::Firm)
    .with_expectation(|summary: &RaceSummary| {
        ensure!(
            summary.photo_lines() == 0,
            "photo called in a mismatch: {:?}",
            summary.result.commentary
        );
        ensure!(!summary.result.photo_finish, "photo flag set in a mismatch");
        Ok(())
    })
    .with_expectation(photo_call_matches_margin);
    TestScenario::new("wide-margin", "Wide Margin", plan)
}

fn rail_runner() -> TestScenario {
    let plan = RacePlan::new(
        Race::new(5, "Rail Derby", 8.5).with_surface(Surface::Turf),
        vec![
            horse(1, "Inside Track", LegType::RailRunner, HorseStats::default()),
            horse(2, "Wide Load", LegType::StretchRunner, HorseStats::default()),
            horse(3, "Late Show", LegType::LastSpurt, HorseStats::default()),
            horse(4, "Early Bird", LegType::StartDash, HorseStats::default()),
        ],
    )
    .with_condition(TrackCondition::Firm)
    .with_expectation(every_horse_finished)
    .with_expectation(places_are_unique)
    .with_expectation(purse_is_not_overpaid);
    TestScenario::new("rail-runner", "Rail Runner", plan)
}

fn full_field() -> TestScenario {
    let legs = LegType::ALL;
    let field = (1..=14u64)
        .zip(legs.iter().cycle())
        .map(|(id, &leg)| {
            let stat = u8::try_from(30 + id * 4).unwrap_or(50);
            horse(id, &format!("Runner {id}"), leg, HorseStats::uniform(stat))
        })
        .collect();
    let plan = RacePlan::new(
        Race::new(6, "Grade One Classic", 10.0)
            .with_surface(Surface::Turf)
            .with_class(RaceClass::GradeOne),
        field,
    )
    .with_expectation(|summary: &RaceSummary| {
        ensure!(
            summary.result.entries.len() == summary.field_size.min(12),
            "expected a capped field of 12, got {}",
            summary.result.entries.len()
        );
        let paid = summary
            .result
            .entries
            .iter()
            .filter(|entry| entry.payout_cents > 0)
            .count();
        ensure!(
            paid == paid_places(RaceClass::GradeOne),
            "{paid} horses were paid"
        );
        Ok(())
    })
    .with_expectation(places_are_unique)
    .with_expectation(purse_is_not_overpaid)
    .with_expectation(photo_call_matches_margin);
    TestScenario::new("full-field", "Full Field", plan)
}

fn extreme_stats() -> TestScenario {
    let plan = RacePlan::new(
        Race::new(7, "Extremes Invitational", 16.0),
        vec![
            horse(1, "Maxed Out", LegType::LastSpurt, HorseStats::uniform(100)),
            horse(2, "Bottomed Out", LegType::RailRunner, HorseStats::uniform(0)),
            horse(
                3,
                "Lopsided",
                LegType::StartDash,
                HorseStats {
                    speed: 100,
                    ..HorseStats::uniform(0)
                },
            ),
        ],
    )
    .with_condition(TrackCondition::Heavy)
    .with_expectation(|summary: &RaceSummary| {
        for entry in &summary.result.entries {
            ensure!(
                entry.finish_time.is_finite() && entry.finish_time > 0.0,
                "{} has finish time {}",
                entry.name,
                entry.finish_time
            );
        }
        Ok(())
    })
    .with_expectation(places_are_unique)
    .with_expectation(purse_is_not_overpaid);
    TestScenario::new("extreme-stats", "Extreme Stats", plan)
}

fn sprint() -> TestScenario {
    let plan = RacePlan::new(
        Race::new(8, "Five Furlong Dash", 5.0).with_surface(Surface::Artificial),
        vec![
            horse(1, "Flash", LegType::StartDash, HorseStats::default()),
            horse(2, "Bolt", LegType::FrontRunner, HorseStats::default()),
            horse(3, "Spark", LegType::LastSpurt, HorseStats::default()),
        ],
    )
    .with_condition(TrackCondition::Fast)
    .with_expectation(every_horse_finished)
    .with_expectation(|summary: &RaceSummary| {
        let Some(report) = summary.result.entered_progression() else {
            anyhow::bail!("no progression report for the entered horse");
        };
        let growth = |stat: StatKind| {
            report
                .deltas
                .iter()
                .find(|delta| delta.stat == stat)
                .map_or(0.0, |delta| delta.growth)
        };
        ensure!(
            growth(StatKind::Speed) >= growth(StatKind::Stamina),
            "a sprint trained stamina harder than speed"
        );
        Ok(())
    });
    TestScenario::new("sprint", "Sprint", plan)
}

fn marathon() -> TestScenario {
    let plan = RacePlan::new(
        Race::new(9, "Two Mile Cup", 16.0).with_class(RaceClass::GradeTwo),
        vec![
            horse(1, "Long Haul", LegType::StretchRunner, HorseStats::default()),
            horse(2, "Stayer", LegType::StretchRunner, HorseStats::default()),
        ],
    )
    .with_condition(TrackCondition::Good)
    .with_expectation(every_horse_finished)
    .with_expectation(|summary: &RaceSummary| {
        let floor = f64::from(summary.result.total_ticks) * 0.95;
        ensure!(
            f64::from(summary.result.ticks_elapsed) >= floor,
            "marathon finished in {} ticks, under the {floor:.0} floor",
            summary.result.ticks_elapsed
        );
        Ok(())
    })
    .with_expectation(purse_is_not_overpaid);
    TestScenario::new("marathon", "Marathon", plan)
}

fn deterministic() -> TestScenario {
    let plan = RacePlan::new(
        Race::new(10, "Replay Maiden", 7.0),
        vec![
            horse(1, "Echo", LegType::FrontRunner, HorseStats::default()),
            horse(2, "Reverb", LegType::LastSpurt, HorseStats::uniform(60)),
            horse(3, "Delay", LegType::RailRunner, HorseStats::uniform(45)),
        ],
    )
    .with_replay()
    .with_expectation(|summary: &RaceSummary| {
        ensure!(
            summary.replay_fingerprint == Some(summary.result.fingerprint),
            "replay fingerprint {:?} differs from {}",
            summary.replay_fingerprint,
            summary.result.fingerprint
        );
        Ok(())
    });
    TestScenario::new("deterministic", "Deterministic Replay", plan)
}
