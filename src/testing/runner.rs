//! Test runner implementation
//!
//! Runs scenarios strictly in order. Every planned item produces exactly one
//! [`RunOutcome`], which is recorded in the run-scoped [`Tally`] and handed to
//! the [`Reporter`]. Nothing an entry point does, including panicking, can
//! abort the run.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use futures_util::FutureExt;

use super::registry::{EntryPoint, Registry};
use super::report::{Reporter, Tally};
use super::scenario::{PlannedTest, Scenario, ScenarioFile};
use crate::common::{Error, ResolvedConfiguration};
use crate::connector::{self, Connector};

/// Result of dispatching one planned item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    /// `None` when the entry point simply returned false
    Failed(Option<Failure>),
    Broken(BrokenReason),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success)
    }
}

/// Why a planned item could not be dispatched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokenReason {
    UnitNotFound(String),
    EntryPointNotFound { unit: String, entry_point: String },
    Malformed(String),
}

/// Diagnostic captured from a failing entry point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub message: String,
    pub code: String,
    /// Source location, when known (panics)
    pub location: Option<String>,
    /// Error source chain or backtrace, one frame per line
    pub trace: Vec<String>,
}

impl Failure {
    /// Capture an error returned by an entry point
    pub fn from_error(error: &Error) -> Self {
        let mut trace = Vec::new();
        let mut source = std::error::Error::source(error);
        while let Some(cause) = source {
            trace.push(format!("caused by: {}", cause));
            source = std::error::Error::source(cause);
        }

        Self {
            message: error.to_string(),
            code: error.code().to_string(),
            location: None,
            trace,
        }
    }

    fn from_panic(payload: Box<dyn Any + Send>, site: Option<PanicSite>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic with non-string payload".to_string()
        };

        let (location, trace) = match site {
            Some(site) => (
                site.location,
                site.backtrace.lines().map(str::to_string).collect(),
            ),
            None => (None, Vec::new()),
        };

        Self {
            message,
            code: "PANIC".to_string(),
            location,
            trace,
        }
    }
}

/// Where a captured panic happened
struct PanicSite {
    location: Option<String>,
    backtrace: String,
}

thread_local! {
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
    static LAST_PANIC: RefCell<Option<PanicSite>> = const { RefCell::new(None) };
}

/// Chain a panic hook that records panics raised while an entry point runs
/// instead of printing them; other panics go to the previous hook.
fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CAPTURING.with(Cell::get) {
                let site = PanicSite {
                    location: info.location().map(|l| l.to_string()),
                    backtrace: Backtrace::force_capture().to_string(),
                };
                LAST_PANIC.with(|last| *last.borrow_mut() = Some(site));
            } else {
                previous(info);
            }
        }));
    });
}

/// Marks the current thread as running an entry point
struct CaptureGuard;

impl CaptureGuard {
    fn enter() -> Self {
        LAST_PANIC.with(|last| last.borrow_mut().take());
        CAPTURING.with(|c| c.set(true));
        CaptureGuard
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        CAPTURING.with(|c| c.set(false));
    }
}

/// Call an entry point and classify what it did
pub async fn invoke(
    entry: &EntryPoint,
    connector: &dyn Connector,
    config: &ResolvedConfiguration,
) -> RunOutcome {
    install_panic_hook();

    let result = {
        let _guard = CaptureGuard::enter();
        AssertUnwindSafe((entry.run)(connector, config))
            .catch_unwind()
            .await
    };

    match result {
        Ok(Ok(true)) => RunOutcome::Success,
        Ok(Ok(false)) => RunOutcome::Failed(None),
        Ok(Err(e)) => RunOutcome::Failed(Some(Failure::from_error(&e))),
        Err(payload) => {
            let site = LAST_PANIC.with(|last| last.borrow_mut().take());
            RunOutcome::Failed(Some(Failure::from_panic(payload, site)))
        }
    }
}

/// Dispatch one planned item
///
/// Missing units and entry points are classified as broken without calling
/// anything.
pub async fn dispatch(
    planned: &PlannedTest,
    registry: &Registry,
    connector: &dyn Connector,
    config: &ResolvedConfiguration,
) -> RunOutcome {
    let (unit_name, entry_name) = match planned {
        PlannedTest::Pair { unit, entry_point } => (unit, entry_point),
        PlannedTest::MissingUnit(unit) => {
            return RunOutcome::Broken(BrokenReason::UnitNotFound(unit.clone()))
        }
        PlannedTest::Malformed(raw) => {
            return RunOutcome::Broken(BrokenReason::Malformed(raw.clone()))
        }
    };

    let Some(unit) = registry.find(unit_name) else {
        return RunOutcome::Broken(BrokenReason::UnitNotFound(unit_name.clone()));
    };

    let Some(entry) = unit.entry_point(entry_name) else {
        return RunOutcome::Broken(BrokenReason::EntryPointNotFound {
            unit: unit_name.clone(),
            entry_point: entry_name.clone(),
        });
    };

    tracing::debug!(unit = unit.name, entry_point = entry.name, "Dispatching");
    invoke(entry, connector, config).await
}

/// Run one scenario, recording every outcome in `tally`
pub async fn run_scenario(
    scenario: &Scenario,
    defaults: &ResolvedConfiguration,
    registry: &Registry,
    reporter: &Reporter,
    tally: &mut Tally,
) {
    reporter.scenario_started(scenario);

    let config = scenario.resolve_configuration(defaults);
    let planned = scenario.plan(registry);
    let connector = connector::connect(&config);

    tracing::info!(
        scenario = %scenario.description,
        planned = planned.len(),
        connector = connector.name(),
        "Running scenario"
    );

    for item in &planned {
        let progress = reporter.test_started(item);
        let outcome = dispatch(item, registry, connector.as_ref(), &config).await;
        tally.record(&outcome);
        reporter.test_finished(progress, item, &outcome);
    }
}

/// Run every scenario of a file in declaration order
pub async fn run_all(file: &ScenarioFile, registry: &Registry, reporter: &Reporter) -> Tally {
    let mut tally = Tally::default();

    for scenario in &file.scenarios {
        run_scenario(scenario, &file.defaults, registry, reporter, &mut tally).await;
    }

    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Result;
    use crate::connector::MemoryConnector;
    use crate::testing::registry::UnitDefinition;
    use futures_util::future::BoxFuture;

    fn passes<'a>(
        _: &'a dyn Connector,
        _: &'a ResolvedConfiguration,
    ) -> BoxFuture<'a, Result<bool>> {
        async { Ok(true) }.boxed()
    }

    fn returns_false<'a>(
        _: &'a dyn Connector,
        _: &'a ResolvedConfiguration,
    ) -> BoxFuture<'a, Result<bool>> {
        async { Ok(false) }.boxed()
    }

    async fn fetch_missing(c: &dyn Connector) -> Result<bool> {
        c.get_object("bucket", "missing").await?;
        Ok(true)
    }

    async fn explode() -> Result<bool> {
        panic!("boom")
    }

    fn errors<'a>(
        c: &'a dyn Connector,
        _: &'a ResolvedConfiguration,
    ) -> BoxFuture<'a, Result<bool>> {
        fetch_missing(c).boxed()
    }

    fn panics<'a>(
        _: &'a dyn Connector,
        _: &'a ResolvedConfiguration,
    ) -> BoxFuture<'a, Result<bool>> {
        explode().boxed()
    }

    static TABLE: &[UnitDefinition] = &[UnitDefinition {
        name: "Probe",
        description: "outcome probes",
        abstract_unit: false,
        entry_points: &[
            EntryPoint { name: "passes", run: passes },
            EntryPoint { name: "returns_false", run: returns_false },
            EntryPoint { name: "errors", run: errors },
            EntryPoint { name: "panics", run: panics },
        ],
    }];

    async fn outcome_of(planned: PlannedTest) -> RunOutcome {
        let registry = Registry::from_definitions(TABLE);
        let connector = MemoryConnector::new();
        let config = ResolvedConfiguration::default();
        dispatch(&planned, &registry, &connector, &config).await
    }

    #[tokio::test]
    async fn test_success() {
        assert_eq!(outcome_of(PlannedTest::pair("Probe", "passes")).await, RunOutcome::Success);
    }

    #[tokio::test]
    async fn test_false_return_fails_without_detail() {
        assert_eq!(
            outcome_of(PlannedTest::pair("Probe", "returns_false")).await,
            RunOutcome::Failed(None)
        );
    }

    #[tokio::test]
    async fn test_error_fails_with_detail() {
        let RunOutcome::Failed(Some(failure)) = outcome_of(PlannedTest::pair("Probe", "errors")).await
        else {
            panic!("expected failure with detail");
        };
        assert_eq!(failure.code, "OBJECT_NOT_FOUND");
        assert!(failure.message.contains("missing"));
    }

    #[tokio::test]
    async fn test_panic_is_caught() {
        let RunOutcome::Failed(Some(failure)) = outcome_of(PlannedTest::pair("Probe", "panics")).await
        else {
            panic!("expected failure with detail");
        };
        assert_eq!(failure.code, "PANIC");
        assert_eq!(failure.message, "boom");
        assert!(failure.location.unwrap().contains("runner.rs"));
    }

    #[tokio::test]
    async fn test_unknown_unit_is_broken() {
        assert_eq!(
            outcome_of(PlannedTest::pair("Nope", "passes")).await,
            RunOutcome::Broken(BrokenReason::UnitNotFound("Nope".into()))
        );
        assert_eq!(
            outcome_of(PlannedTest::MissingUnit("Nope".into())).await,
            RunOutcome::Broken(BrokenReason::UnitNotFound("Nope".into()))
        );
    }

    #[tokio::test]
    async fn test_unknown_entry_point_is_broken() {
        assert_eq!(
            outcome_of(PlannedTest::pair("Probe", "nope")).await,
            RunOutcome::Broken(BrokenReason::EntryPointNotFound {
                unit: "Probe".into(),
                entry_point: "nope".into(),
            })
        );
    }

    #[tokio::test]
    async fn test_each_dispatch_increments_one_counter() {
        let registry = Registry::from_definitions(TABLE);
        let file = ScenarioFile::from_yaml(
            r#"
scenarios:
  first:
    configuration: { endpoint: "memory://" }
    tests: [Probe, Missing, [Probe, nope]]
  second:
    configuration: { endpoint: "memory://" }
"#,
        )
        .unwrap();

        let tally = run_all(&file, &registry, &Reporter::quiet()).await;
        // first: 4 probes + missing unit + missing entry point; second: 4 probes
        assert_eq!(tally.total(), 10);
        assert_eq!(tally.successful, 2);
        assert_eq!(tally.failed, 6);
        assert_eq!(tally.broken, 2);
    }
}
