mod logging;

use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use color_eyre::eyre::eyre;
use mcsens_core::model::MetricPivot;
use mcsens_core::{
    BoxError, ExecutionMode, ForwardProcess, MetricKind, SensitivityBuilder, SensitivityResults,
    Table,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::logging::init_logging;

const INPUT_VARIABLES: [&str; 3] = ["temperature", "pressure", "humidity"];
const OUTPUT_VARIABLES: [&str; 3] = ["efficiency", "cost", "quality"];

#[derive(Parser, Debug)]
#[command(name = "mcsens")]
#[command(about = "Monte Carlo sensitivity analysis against a deliberately slow process model")]
struct Args {
    /// Perturbations per input variable
    #[arg(long, default_value_t = 50)]
    n: usize,

    /// Rows in the synthetic input dataset
    #[arg(long, default_value_t = 50)]
    rows: usize,

    /// Seed for both the dataset and the perturbations
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Simulated cost of each forward process call, in milliseconds
    #[arg(long, default_value_t = 100)]
    delay_ms: u64,

    /// Skip the joint run and only run the looped strategy
    #[arg(long)]
    looped_only: bool,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Process model that sleeps on every call to stand in for an expensive simulation
struct ProcessModel {
    delay: Duration,
    calls: usize,
    simulated: Duration,
}

impl ProcessModel {
    fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            calls: 0,
            simulated: Duration::ZERO,
        }
    }
}

impl ForwardProcess for ProcessModel {
    fn run(&mut self, inputs: &Table) -> Result<Table, BoxError> {
        self.calls += 1;
        thread::sleep(self.delay);
        self.simulated += self.delay;

        let column = |name: &str| {
            inputs
                .column(name)
                .ok_or_else(|| format!("process model needs column '{name}'"))
        };
        let temperature = column("temperature")?;
        let pressure = column("pressure")?;
        let humidity = column("humidity")?;
        let rows = 0..inputs.n_rows();

        let mut outputs = inputs.clone();
        outputs.push_column(
            "efficiency",
            rows.clone()
                .map(|i| temperature[i] * 0.5 + pressure[i] * 0.3 - humidity[i] * 0.2)
                .collect(),
        )?;
        outputs.push_column(
            "cost",
            rows.clone()
                .map(|i| temperature[i].powi(2) * 10.0 + pressure[i] * 50.0)
                .collect(),
        )?;
        outputs.push_column(
            "quality",
            rows.map(|i| (temperature[i] / 100.0).exp() * pressure[i])
                .collect(),
        )?;
        Ok(outputs)
    }
}

fn synthetic_dataset(rows: usize, seed: u64) -> color_eyre::Result<Table> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut uniform = |lo: f64, hi: f64| -> Vec<f64> {
        (0..rows).map(|_| rng.random_range(lo..hi)).collect()
    };
    let temperature = uniform(20.0, 30.0);
    let pressure = uniform(1.0, 3.0);
    let humidity = uniform(30.0, 70.0);
    Ok(Table::from_columns([
        ("temperature", temperature),
        ("pressure", pressure),
        ("humidity", humidity),
    ])?)
}

#[derive(Debug, Serialize)]
struct RunSummary {
    mode: ExecutionMode,
    forward_process_calls: usize,
    simulated_seconds: f64,
    elapsed_seconds: f64,
    warnings: usize,
}

#[derive(Debug, Serialize)]
struct Report {
    rows: usize,
    n: usize,
    runs: Vec<RunSummary>,
    correlation: MetricPivot,
}

fn run_strategy(
    args: &Args,
    dataset: &Table,
    mode: ExecutionMode,
) -> color_eyre::Result<(RunSummary, SensitivityResults)> {
    tracing::info!(?mode, n = args.n, rows = dataset.n_rows(), "Starting run");

    let mut model = ProcessModel::new(args.delay_ms);
    let start = Instant::now();
    let results = SensitivityBuilder::new()
        .inputs(INPUT_VARIABLES)
        .outputs(OUTPUT_VARIABLES)
        .n(args.n)
        .joint_run(mode == ExecutionMode::Joint)
        .seed(args.seed)
        .run(dataset, &mut model)?;
    let elapsed = start.elapsed();

    let expected = mode.expected_calls(INPUT_VARIABLES.len(), args.n);
    if results.forward_process_calls != model.calls || model.calls != expected {
        return Err(eyre!(
            "call count mismatch: expected {expected}, engine reported {}, model saw {}",
            results.forward_process_calls,
            model.calls
        ));
    }

    let summary = RunSummary {
        mode,
        forward_process_calls: model.calls,
        simulated_seconds: model.simulated.as_secs_f64(),
        elapsed_seconds: elapsed.as_secs_f64(),
        warnings: results.warnings.len(),
    };
    tracing::info!(
        ?mode,
        calls = summary.forward_process_calls,
        elapsed_seconds = summary.elapsed_seconds,
        "Run finished"
    );
    Ok((summary, results))
}

fn print_pivot(pivot: &MetricPivot) {
    print!("{:>12}", "");
    for input in &pivot.inputs {
        print!("{input:>14}");
    }
    println!();
    for (output, values) in pivot.outputs.iter().zip(&pivot.values) {
        print!("{output:>12}");
        for value in values {
            print!("{value:>14.4}");
        }
        println!();
    }
}

fn print_report(report: &Report) {
    let rule = "=".repeat(72);
    println!("{rule}");
    println!("MONTE CARLO SENSITIVITY ANALYSIS");
    println!("{rule}");
    println!("Input data: {} rows", report.rows);
    println!(
        "Variables: {} inputs x {} outputs",
        INPUT_VARIABLES.len(),
        OUTPUT_VARIABLES.len()
    );
    println!("Perturbations per variable: {}", report.n);
    println!();

    for run in &report.runs {
        println!("{:?}", run.mode);
        println!("  Forward process calls: {}", run.forward_process_calls);
        println!("  Simulated computation: {:.1}s", run.simulated_seconds);
        println!("  Total elapsed:         {:.1}s", run.elapsed_seconds);
        println!("  Degenerate metrics:    {}", run.warnings);
        println!();
    }

    if let [looped, joint] = report.runs.as_slice() {
        println!("{rule}");
        println!("COMPARISON");
        println!("{rule}");
        let reduction =
            100.0 * (1.0 - joint.forward_process_calls as f64 / looped.forward_process_calls as f64);
        println!(
            "Forward process calls: {} -> {} ({reduction:.1}% fewer)",
            looped.forward_process_calls, joint.forward_process_calls
        );
        if joint.elapsed_seconds > 0.0 {
            println!(
                "Speedup: {:.1}x",
                looped.elapsed_seconds / joint.elapsed_seconds
            );
        }
        println!();
    }

    println!("Correlation (rows: outputs, columns: inputs)");
    print_pivot(&report.correlation);
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(&args.log_level)?;

    let dataset = synthetic_dataset(args.rows, args.seed)?;

    let mut modes = vec![ExecutionMode::Looped];
    if !args.looped_only {
        modes.push(ExecutionMode::Joint);
    }

    let mut runs = Vec::with_capacity(modes.len());
    let mut last = None;
    for mode in modes {
        let (summary, results) = run_strategy(&args, &dataset, mode)?;
        runs.push(summary);
        last = Some(results);
    }
    let results = last.ok_or_else(|| eyre!("no strategy was run"))?;

    let report = Report {
        rows: args.rows,
        n: args.n,
        runs,
        correlation: results.metrics.pivot(MetricKind::Correlation),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    tracing::debug!("mcsens finished");
    Ok(())
}
