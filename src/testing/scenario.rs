//! Scenario file types
//!
//! Defines the data structures for deserializing the scenario file and
//! resolving each scenario into a configuration and a list of planned tests.

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use super::registry::Registry;
use crate::common::{paths, ConfigOverrides, Error, ResolvedConfiguration, Result};

/// Wildcard entry selecting every discovered test
pub const ALL_TESTS: &str = "*";

/// The scenario file as written on disk
#[derive(Deserialize, Debug, Default)]
struct RawScenarioFile {
    /// Process-wide defaults, layered over the built-in ones
    #[serde(default)]
    defaults: ConfigOverrides,
    /// Scenario description -> scenario, in declaration order
    #[serde(default)]
    scenarios: Mapping,
}

/// A single scenario as written on disk
#[derive(Deserialize, Debug, Default)]
struct RawScenario {
    #[serde(default)]
    configuration: ConfigOverrides,
    tests: Option<Value>,
}

/// A loaded scenario file
#[derive(Debug, Clone)]
pub struct ScenarioFile {
    /// Built-in defaults merged with the file's `defaults` section
    pub defaults: ResolvedConfiguration,
    /// Scenarios in declaration order
    pub scenarios: Vec<Scenario>,
}

/// One named test run configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub description: String,
    pub configuration: ConfigOverrides,
    pub tests: TestSelection,
}

/// Which tests a scenario runs
#[derive(Debug, Clone, PartialEq)]
pub enum TestSelection {
    /// Everything discovered
    All,
    /// An explicit list
    Explicit(Vec<TestRef>),
}

/// One entry of an explicit test list
#[derive(Debug, Clone, PartialEq)]
pub enum TestRef {
    /// Every entry point of a unit
    Unit(String),
    /// A single entry point, taken verbatim
    Pair { unit: String, entry_point: String },
    /// Anything else, kept for reporting
    Malformed(String),
}

/// One item the dispatcher will attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedTest {
    /// Run an entry point (existence is checked at dispatch)
    Pair { unit: String, entry_point: String },
    /// A bare unit name that matched nothing
    MissingUnit(String),
    /// An entry that is neither a unit name nor a pair
    Malformed(String),
}

impl PlannedTest {
    pub fn pair(unit: impl Into<String>, entry_point: impl Into<String>) -> Self {
        Self::Pair {
            unit: unit.into(),
            entry_point: entry_point.into(),
        }
    }
}

impl fmt::Display for PlannedTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannedTest::Pair { unit, entry_point } => write!(f, "{}:{}", unit, entry_point),
            PlannedTest::MissingUnit(unit) => write!(f, "{}", unit),
            PlannedTest::Malformed(raw) => write!(f, "{}", raw),
        }
    }
}

impl ScenarioFile {
    /// Load a scenario file, YAML or TOML depending on the extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        let raw: RawScenarioFile = if paths::is_toml(path) {
            toml::from_str(&content).map_err(|e| Error::config_parse(path, e))?
        } else {
            serde_yaml::from_str(&content).map_err(|e| Error::config_parse(path, e))?
        };

        Self::from_raw(raw).map_err(|message| Error::config_parse(path, message))
    }

    /// Parse YAML scenario text directly
    pub fn from_yaml(content: &str) -> Result<Self> {
        let raw: RawScenarioFile = serde_yaml::from_str(content)
            .map_err(|e| Error::config_parse(Path::new("<inline>"), e))?;
        Self::from_raw(raw).map_err(|message| Error::config_parse(Path::new("<inline>"), message))
    }

    fn from_raw(raw: RawScenarioFile) -> std::result::Result<Self, String> {
        let defaults = ResolvedConfiguration::default().merged_with(&raw.defaults);

        let mut scenarios = Vec::with_capacity(raw.scenarios.len());
        for (key, value) in raw.scenarios {
            let description = describe_key(&key);
            let scenario: RawScenario = match value {
                Value::Null => RawScenario::default(),
                other => serde_yaml::from_value(other)
                    .map_err(|e| format!("scenario '{}': {}", description, e))?,
            };

            scenarios.push(Scenario {
                description,
                configuration: scenario.configuration,
                tests: TestSelection::from_value(scenario.tests.as_ref()),
            });
        }

        Ok(Self {
            defaults,
            scenarios,
        })
    }

    /// Keep only the scenarios whose description is listed
    pub fn retain_scenarios(&mut self, names: &[String]) {
        if names.is_empty() {
            return;
        }
        self.scenarios.retain(|s| names.contains(&s.description));
    }
}

impl Scenario {
    /// Merge this scenario's overrides onto the defaults
    pub fn resolve_configuration(&self, defaults: &ResolvedConfiguration) -> ResolvedConfiguration {
        defaults.merged_with(&self.configuration)
    }

    /// Plan the tests this scenario runs against a registry
    pub fn plan(&self, registry: &Registry) -> Vec<PlannedTest> {
        self.tests.plan(registry)
    }
}

impl TestSelection {
    /// Interpret the raw `tests` value
    ///
    /// Absent, non-list and wildcard-containing values all select everything.
    pub fn from_value(value: Option<&Value>) -> Self {
        let Some(Value::Sequence(items)) = value else {
            return TestSelection::All;
        };

        if items.iter().any(|item| item.as_str() == Some(ALL_TESTS)) {
            return TestSelection::All;
        }

        TestSelection::Explicit(items.iter().map(TestRef::from_value).collect())
    }

    /// Expand into the ordered list of items to dispatch
    pub fn plan(&self, registry: &Registry) -> Vec<PlannedTest> {
        match self {
            TestSelection::All => registry
                .pairs()
                .into_iter()
                .map(|(unit, entry)| PlannedTest::pair(unit, entry))
                .collect(),
            TestSelection::Explicit(refs) => refs
                .iter()
                .flat_map(|test_ref| test_ref.plan(registry))
                .collect(),
        }
    }
}

impl TestRef {
    fn from_value(value: &Value) -> Self {
        match value {
            Value::String(unit) => TestRef::Unit(unit.clone()),
            Value::Sequence(pair) => match pair.as_slice() {
                [Value::String(unit), Value::String(entry_point)] => TestRef::Pair {
                    unit: unit.clone(),
                    entry_point: entry_point.clone(),
                },
                _ => TestRef::Malformed(render(value)),
            },
            other => TestRef::Malformed(render(other)),
        }
    }

    fn plan(&self, registry: &Registry) -> Vec<PlannedTest> {
        match self {
            TestRef::Unit(name) => match registry.find(name) {
                Some(unit) => unit
                    .entry_points
                    .iter()
                    .map(|e| PlannedTest::pair(unit.name, e.name))
                    .collect(),
                None => vec![PlannedTest::MissingUnit(name.clone())],
            },
            TestRef::Pair { unit, entry_point } => {
                vec![PlannedTest::pair(unit.clone(), entry_point.clone())]
            }
            TestRef::Malformed(raw) => vec![PlannedTest::Malformed(raw.clone())],
        }
    }
}

fn describe_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => render(other),
    }
}

fn render(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("{:?}", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::registry::discover;

    #[test]
    fn test_scenarios_keep_declaration_order() {
        let file = ScenarioFile::from_yaml(
            "scenarios:\n  zeta: {}\n  alpha: {}\n  middle: {}\n",
        )
        .unwrap();
        let names: Vec<_> = file.scenarios.iter().map(|s| s.description.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "middle"]);
    }

    #[test]
    fn test_absent_or_wildcard_tests_select_all() {
        let file = ScenarioFile::from_yaml(
            r#"
scenarios:
  absent:
    configuration: { bucket: b }
  star: { tests: "*" }
  star_in_list: { tests: [SmallFiles, "*"] }
  not_a_list: { tests: 42 }
  empty:
"#,
        )
        .unwrap();

        let registry = discover();
        for scenario in &file.scenarios {
            assert_eq!(scenario.tests, TestSelection::All, "{}", scenario.description);
            assert_eq!(scenario.plan(registry).len(), registry.pairs().len());
        }
    }

    #[test]
    fn test_explicit_list_expands_units_and_keeps_pairs() {
        let file = ScenarioFile::from_yaml(
            r#"
scenarios:
  explicit:
    tests:
      - HeadObject
      - [BigFiles, not_a_real_entry]
      - NoSuchUnit
      - 17
      - [only_one]
"#,
        )
        .unwrap();

        let plan = file.scenarios[0].plan(discover());
        let head_pairs = discover().entry_points("HeadObject").unwrap().len();
        assert_eq!(plan.len(), head_pairs + 4);
        assert!(plan[..head_pairs]
            .iter()
            .all(|p| matches!(p, PlannedTest::Pair { unit, .. } if unit == "HeadObject")));
        assert_eq!(plan[head_pairs], PlannedTest::pair("BigFiles", "not_a_real_entry"));
        assert_eq!(plan[head_pairs + 1], PlannedTest::MissingUnit("NoSuchUnit".into()));
        assert_eq!(plan[head_pairs + 2], PlannedTest::Malformed("17".into()));
        assert_eq!(plan[head_pairs + 3], PlannedTest::Malformed("[\"only_one\"]".into()));
    }

    #[test]
    fn test_defaults_section_layers_over_builtin() {
        let file = ScenarioFile::from_yaml(
            r#"
defaults:
  access: AK
  bucket: shared
scenarios:
  override:
    configuration: { bucket: mine, endpoint: "memory://" }
  inherit: {}
"#,
        )
        .unwrap();

        assert_eq!(file.defaults.region, "us-east-1");
        let first = file.scenarios[0].resolve_configuration(&file.defaults);
        let second = file.scenarios[1].resolve_configuration(&file.defaults);
        assert_eq!(first.bucket, "mine");
        assert_eq!(first.access, "AK");
        assert!(first.uses_memory_endpoint());
        assert_eq!(second.bucket, "shared");
        assert_eq!(second.endpoint(), None);
    }

    #[test]
    fn test_wrong_value_type_is_config_error() {
        let err = ScenarioFile::from_yaml("scenarios:\n  bad:\n    configuration: { dualstack: [1] }\n")
            .unwrap_err();
        assert!(err.is_fatal_configuration());
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn test_retain_scenarios() {
        let mut file = ScenarioFile::from_yaml("scenarios:\n  a: {}\n  b: {}\n").unwrap();
        file.retain_scenarios(&[]);
        assert_eq!(file.scenarios.len(), 2);
        file.retain_scenarios(&["b".to_string()]);
        assert_eq!(file.scenarios.len(), 1);
        assert_eq!(file.scenarios[0].description, "b");
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minitest.toml");
        std::fs::write(
            &path,
            r#"
[defaults]
bucket = "from-toml"

[scenarios."second first"]
tests = ["SmallFiles"]

[scenarios.after]
configuration = { path_access = true }
"#,
        )
        .unwrap();

        let file = ScenarioFile::load(&path).unwrap();
        assert_eq!(file.defaults.bucket, "from-toml");
        assert_eq!(file.scenarios[0].description, "second first");
        assert_eq!(
            file.scenarios[0].tests,
            TestSelection::Explicit(vec![TestRef::Unit("SmallFiles".into())])
        );
        assert!(file.scenarios[1].resolve_configuration(&file.defaults).path_access);
    }
}
