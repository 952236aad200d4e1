//! Test discovery and execution
//!
//! Loads scenarios, resolves each into a configuration and a list of planned
//! tests, dispatches them against a per-scenario connector, and turns the
//! resulting tally into a verdict.

pub mod registry;
pub mod report;
pub mod runner;
pub mod scenario;

pub use registry::{discover, EntryFn, EntryPoint, Registry, Unit, UnitDefinition};
pub use report::{Reporter, Summary, Tally, Verdict};
pub use runner::{dispatch, run_all, run_scenario, BrokenReason, Failure, RunOutcome};
pub use scenario::{PlannedTest, Scenario, ScenarioFile, TestRef, TestSelection};
