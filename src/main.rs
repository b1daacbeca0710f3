//! Harness Tester - netlist-driven wiring harness tester
//!
//! Loads a harness netlist, works out the expected reading between every
//! pair of test points and checks each pair on the switch matrix.
//!
//! # Usage
//!
//! ```bash
//! harness-test harness.nxf
//! RUST_LOG=debug harness-test --simulate harness.nxf
//! harness-test selftest --points 64
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use harness_tester::{
    error::Result,
    hardware::{Bench, SimulatedHarness},
    measure::MeasurementEngine,
    netlist,
    report::{NetlistSummary, RelationListing, SelfTestListing, SweepListing},
    topology::{build_relations, FanoutPolicy, Resolver},
    BenchConfig, SELF_TEST_TARGET,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Wiring harness continuity and component tester
#[derive(Parser, Debug)]
#[command(name = "harness-test", author, version, about, long_about = None)]
struct Args {
    /// Netlist file, or `selftest` to check the matrix with nothing attached
    #[arg(value_name = "TARGET")]
    target: String,

    /// Sysfs GPIO root
    #[arg(long, value_name = "DIR")]
    gpio_root: Option<PathBuf>,

    /// IIO ADC device directory
    #[arg(long, value_name = "DIR")]
    adc_device: Option<PathBuf>,

    /// Matrix points covered by the self-test
    #[arg(long, value_name = "N")]
    points: Option<u32>,

    /// Reject splices and pins with more than one connection when resolving
    #[arg(long)]
    strict_fanout: bool,

    /// Run against an ideal simulated harness instead of the bench
    #[arg(long)]
    simulate: bool,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn config(&self) -> BenchConfig {
        let mut config = BenchConfig::new();
        if let Some(root) = &self.gpio_root {
            config = config.with_gpio_root(root);
        }
        if let Some(device) = &self.adc_device {
            config = config.with_adc_device(device);
        }
        if let Some(points) = self.points {
            config = config.with_self_test_points(points);
        }
        if self.strict_fanout {
            config = config.with_fanout(FanoutPolicy::Strict);
        }
        config
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = args.config();
    if args.target == SELF_TEST_TARGET {
        self_test(&config, args.simulate)
    } else {
        test_harness(Path::new(&args.target), &config, args.simulate)
    }
}

fn self_test(config: &BenchConfig, simulate: bool) -> Result<()> {
    let report = if simulate {
        let mut engine = MeasurementEngine::new(SimulatedHarness::new(config.calibration), config.calibration);
        engine.self_test(config.self_test_points)?
    } else {
        let bench = Bench::open(config.switch_matrix(), config.adc(), config.sample_mode)?;
        let mut engine = MeasurementEngine::new(bench, config.calibration);
        let outcome = engine.self_test(config.self_test_points);
        let closed = engine.into_probe().close();
        let report = outcome?;
        closed?;
        report
    };
    println!("{}", SelfTestListing::new(&report));
    Ok(())
}

fn test_harness(path: &Path, config: &BenchConfig, simulate: bool) -> Result<()> {
    let netlist = netlist::parse_file(path)?;
    let resolver = Resolver::with_policy(&netlist, config.fanout);
    println!("{}", NetlistSummary::new(resolver));

    let table = build_relations(resolver)?;
    println!("{}", RelationListing::new(&table, &netlist));

    let report = if simulate {
        info!("simulated run; no hardware is touched");
        let harness = SimulatedHarness::from_relations(&table, &netlist.limits, config.calibration);
        MeasurementEngine::new(harness, config.calibration).sweep(&table, &netlist.limits)?
    } else {
        let bench = Bench::open(config.switch_matrix(), config.adc(), config.sample_mode)?;
        let mut engine = MeasurementEngine::new(bench, config.calibration);
        let outcome = engine.sweep(&table, &netlist.limits);
        let closed = engine.into_probe().close();
        let report = outcome?;
        closed?;
        report
    };
    println!("{}", SweepListing::new(&report, &netlist));
    Ok(())
}
