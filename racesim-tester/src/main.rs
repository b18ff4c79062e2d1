mod common;
mod logic;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use common::scenario::{TestScenario, get_scenario, list_scenarios};
use common::split_csv;
use logic::{LogicTester, RaceTester, ScenarioResult, resolve_seed_inputs};
use racesim_core::SimulationConfig;

#[derive(Debug, Parser)]
#[command(name = "racesim-tester", version = "0.1.0")]
#[command(about = "Scenario runner for the race simulation core")]
struct Args {
    /// Scenarios to run (comma-separated, or "all")
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated; ranges like 10..20 are inclusive)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Scenario/seed pairs to run at once
    #[arg(long, default_value_t = 4)]
    jobs: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON file overriding simulation settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let config = load_config(args.config.as_deref())?;
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let scenarios = resolve_scenarios(&expand_scenarios(&args.scenarios));
    let tester = RaceTester::new(config, args.verbose);

    let results = run_scenarios(&args, scenarios, &seeds, tester).await?;

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:20} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🏇 Race Simulation Tester".bright_cyan().bold());
    println!("{}", "=========================".cyan());
}

fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config = SimulationConfig::from_json(&raw)
        .with_context(|| format!("invalid simulation config in {}", path.display()))?;
    log::info!("loaded simulation config from {}", path.display());
    Ok(config)
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.contains(&"all".to_string()) {
        scenarios.retain(|s| s != "all");
        for (key, _) in list_scenarios() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn resolve_scenarios(names: &[String]) -> Vec<TestScenario> {
    names
        .iter()
        .filter_map(|name| {
            let scenario = get_scenario(name);
            if scenario.is_none() {
                eprintln!("⚠️  Unknown scenario: {}", name.yellow());
            }
            scenario
        })
        .collect()
}

/// Runs every scenario/seed pair on the blocking pool, at most `args.jobs` at a time.
/// Results come back in scenario-then-seed order regardless of completion order.
async fn run_scenarios(
    args: &Args,
    scenarios: Vec<TestScenario>,
    seeds: &[u64],
    tester: RaceTester,
) -> Result<Vec<ScenarioResult>> {
    if scenarios.is_empty() {
        return Ok(Vec::new());
    }

    println!("{}", "🧠 Running Race Scenarios".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let permits = Arc::new(Semaphore::new(args.jobs.max(1)));
    let mut handles = Vec::with_capacity(scenarios.len() * seeds.len());

    for scenario in scenarios {
        let scenario = Arc::new(scenario);
        for &seed in seeds {
            let permit = Arc::clone(&permits)
                .acquire_owned()
                .await
                .context("scenario pool closed")?;
            let scenario = Arc::clone(&scenario);
            let logic_tester = LogicTester::new(tester.clone(), args.verbose);
            let iterations = args.iterations;
            handles.push(tokio::task::spawn_blocking(move || {
                let result = logic_tester.run_scenario(&scenario, seed, iterations);
                drop(permit);
                result
            }));
        }
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        let result = handle.await.context("scenario task panicked")?;
        log::debug!(
            "{} seed {}: {}/{} iterations passed",
            result.scenario_name,
            result.seed,
            result.successful_iterations,
            result.iterations_run
        );
        results.push(result);
    }
    Ok(results)
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Race Scenario Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        "csv" => {
            logic::reports::generate_csv_report(&mut output_target, results)?;
        }
        _ => {
            let duration = start_time.elapsed();
            if results.is_empty() {
                writeln!(&mut output_target, "No scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(&mut output_target, results, duration)?;
            }
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
