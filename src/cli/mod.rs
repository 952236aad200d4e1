//! CLI command handling
//!
//! Dispatches CLI commands and maps their result to a process exit code.

use crate::commands::Commands;
use crate::common::{paths, Error, Result};
use crate::testing::{self, Reporter, ScenarioFile, Summary};

/// Exit code for configuration errors raised before any scenario runs
pub const EXIT_CONFIGURATION: i32 = 4;

/// Dispatch a CLI command, returning the process exit code
pub async fn dispatch(command: Commands) -> Result<i32> {
    match command {
        Commands::Run {
            config,
            scenarios,
            json,
        } => {
            let path = paths::find_scenario_file(config.as_deref()).map_err(|searched| {
                let searched: Vec<String> =
                    searched.iter().map(|p| p.display().to_string()).collect();
                Error::configuration_missing(&searched)
            })?;

            tracing::debug!(path = %path.display(), "Loading scenario file");
            let mut file = ScenarioFile::load(&path).map_err(|e| match e {
                Error::FileRead { error, .. } => Error::config_parse(&path, error),
                other => other,
            })?;
            file.retain_scenarios(&scenarios);

            let registry = testing::discover();
            let reporter = Reporter::new();
            let tally = testing::run_all(&file, registry, &reporter).await;

            reporter.summary(&tally);

            let summary = Summary::from(tally);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }

            Ok(summary.exit_code)
        }

        Commands::List { json } => {
            let registry = testing::discover();

            if json {
                let units: Vec<_> = registry
                    .units()
                    .iter()
                    .map(|u| {
                        serde_json::json!({
                            "name": u.name,
                            "description": u.description,
                            "entry_points": u.entry_point_names(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&units)?);
            } else if registry.is_empty() {
                println!("No test units discovered.");
            } else {
                for unit in registry.units() {
                    println!("{:22} {}", unit.name, unit.description);
                    for entry in &unit.entry_points {
                        println!("  - {}", entry.name);
                    }
                }
            }

            Ok(0)
        }
    }
}
