//! # Harness Tester
//!
//! Netlist-driven continuity and component tester for wiring harnesses.
//!
//! This library provides:
//! - A loader for the harness netlist markup (fixtures, splices, components,
//!   wires and test limits)
//! - Topology resolution through splices and component pins
//! - The expected ohmmeter reading between every pair of test points
//! - A pairwise sweep over a two-domain GPIO switch matrix with an ADC
//! - Tiered pass/fail classification and a text report
//!
//! ## Architecture
//!
//! - [`netlist`] - Netlist tables, record decoders and the markup loader
//! - [`topology`] - Node resolution and the expected-relation table
//! - [`hardware`] - GPIO, ADC, switch matrix and a simulated harness
//! - [`measure`] - Measurement engine, reading cache and classifier
//! - [`report`] - Text output
//! - [`config`] - Bench configuration
//!
//! ## Usage
//!
//! ```bash
//! harness-test harness.nxf            # test a harness on the bench
//! harness-test --simulate harness.nxf # dry run against an ideal harness
//! harness-test selftest               # check the matrix with nothing attached
//! ```
//!
//! ## Measurement Method
//!
//! For every test point `i` on domain A and every other point `j` on
//! domain B:
//!
//! 1. Select `i` on domain A (once per row), then `j` on domain B
//! 2. Sample ADC channels 0 and 2, or reuse the `(j, i)` reading when the
//!    expected relation is symmetric
//! 3. Convert to ohms through the divider formula in [`measure`]
//! 4. Classify against the expected relation

pub mod config;
pub mod error;
pub mod hardware;
pub mod measure;
pub mod netlist;
pub mod report;
pub mod topology;

// Re-export main types for convenience
pub use config::BenchConfig;
pub use error::{HarnessError, Result};
pub use measure::{MeasurementEngine, Verdict};
pub use netlist::Netlist;
pub use topology::{Relation, RelationTable};

/// Target name that runs the matrix self-test instead of loading a netlist.
pub const SELF_TEST_TARGET: &str = "selftest";
