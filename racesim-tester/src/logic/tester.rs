use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::common::scenario::TestScenario;
use crate::logic::race_tester::{RacePlan, RaceSummary, RaceTester};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
    /// Mean ticks elapsed over successful iterations.
    pub mean_ticks: f64,
    pub photo_finishes: usize,
}

pub struct LogicTester {
    tester: RaceTester,
    verbose: bool,
}

impl LogicTester {
    pub const fn new(tester: RaceTester, verbose: bool) -> Self {
        Self { tester, verbose }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        if self.verbose {
            println!(
                "🧪 Testing scenario: {} ({} runners, seed: {})",
                scenario.name.bright_white(),
                scenario.plan.field.len(),
                seed
            );
        }

        let outcome = self.run_race_iterations(&scenario.plan, seed, iterations);

        let average_duration = if outcome.performance_data.is_empty() {
            Duration::ZERO
        } else {
            outcome.performance_data.iter().sum::<Duration>()
                / u32::try_from(outcome.performance_data.len()).unwrap_or(1)
        };
        let mean_ticks = if outcome.ticks.is_empty() {
            0.0
        } else {
            outcome.ticks.iter().map(|t| f64::from(*t)).sum::<f64>()
                / f64::from(u32::try_from(outcome.ticks.len()).unwrap_or(1))
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            seed,
            passed: outcome.failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: outcome.successes,
            failures: outcome.failures,
            average_duration,
            performance_data: outcome.performance_data,
            mean_ticks,
            photo_finishes: outcome.photo_finishes,
        }
    }

    fn run_race_iterations(&self, plan: &RacePlan, seed: u64, iterations: usize) -> Iterations {
        let mut outcome = Iterations::default();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let summary = match self.tester.run_plan(plan, iteration_seed) {
                Ok(summary) => summary,
                Err(err) => {
                    outcome
                        .failures
                        .push(format!("Iteration {} (seed {iteration_seed}): {err:#}", i + 1));
                    continue;
                }
            };

            if let Some(err) = evaluate_expectations(plan, &summary) {
                let winner = summary
                    .result
                    .winner()
                    .map_or_else(|| "-".to_string(), |w| w.name.clone());
                outcome.failures.push(format!(
                    "Iteration {} (seed {}, ticks {}, condition {}, winner '{}'): {}",
                    i + 1,
                    summary.seed,
                    summary.result.ticks_elapsed,
                    summary.result.condition,
                    winner,
                    err
                ));
                if self.verbose {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        err.red()
                    );
                }
            } else {
                outcome.successes += 1;
                let duration = start_time.elapsed();
                outcome.performance_data.push(duration);
                outcome.ticks.push(summary.result.ticks_elapsed);
                if summary.result.photo_finish {
                    outcome.photo_finishes += 1;
                }
                if self.verbose {
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) ticks:{} photo:{}",
                        i + 1,
                        iterations,
                        summary.result.ticks_elapsed,
                        summary.result.photo_finish
                    );
                }
            }
        }

        outcome
    }
}

#[derive(Debug, Default)]
struct Iterations {
    successes: usize,
    failures: Vec<String>,
    performance_data: Vec<Duration>,
    ticks: Vec<u32>,
    photo_finishes: usize,
}

fn evaluate_expectations(plan: &RacePlan, summary: &RaceSummary) -> Option<String> {
    for expectation in &plan.expectations {
        if let Err(err) = expectation.evaluate(summary) {
            return Some(err.to_string());
        }
    }
    None
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis_vec
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::scenario::get_scenario;

    #[test]
    fn smoke_scenario_passes() {
        let scenario = get_scenario("smoke").unwrap();
        let tester = LogicTester::new(RaceTester::default(), false);
        let result = tester.run_scenario(&scenario, 1337, 2);
        assert!(result.passed, "{:?}", result.failures);
        assert_eq!(result.successful_iterations, 2);
        assert!(result.mean_ticks > 200.0);
    }

    #[test]
    fn failing_expectation_is_recorded() {
        let mut scenario = get_scenario("smoke").unwrap();
        scenario.plan = scenario
            .plan
            .with_expectation(|_: &RaceSummary| -> anyhow::Result<()> {
                anyhow::bail!("always fails")
            });
        let tester = LogicTester::new(RaceTester::default(), false);
        let result = tester.run_scenario(&scenario, 7, 1);
        assert!(!result.passed);
        assert_eq!(result.failures.len(), 1);
        assert!(result.failures[0].contains("always fails"));
    }

    #[test]
    fn result_round_trips_through_json() {
        let scenario = get_scenario("sprint").unwrap();
        let result = LogicTester::new(RaceTester::default(), false).run_scenario(&scenario, 3, 1);
        let json = serde_json::to_string(&result).unwrap();
        let back: ScenarioResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.scenario_name, result.scenario_name);
        assert_eq!(back.seed, 3);
    }
}
