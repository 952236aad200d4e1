//! Test unit registry
//!
//! Units register themselves by adding a [`UnitDefinition`] to the table in
//! [`crate::units`]. Nothing here needs to change when a unit is added.

use std::fmt;
use std::sync::OnceLock;

use futures_util::future::BoxFuture;

use crate::common::{ResolvedConfiguration, Result};
use crate::connector::Connector;

/// Signature shared by every test entry point
///
/// `Ok(true)` is a pass, `Ok(false)` a failure without diagnostic, and `Err`
/// a failure carrying the error as diagnostic.
pub type EntryFn =
    for<'a> fn(&'a dyn Connector, &'a ResolvedConfiguration) -> BoxFuture<'a, Result<bool>>;

/// A named test operation within a unit
#[derive(Clone, Copy)]
pub struct EntryPoint {
    pub name: &'static str,
    pub run: EntryFn,
}

impl fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPoint").field("name", &self.name).finish()
    }
}

/// A test unit as written in the unit table
#[derive(Debug, Clone, Copy)]
pub struct UnitDefinition {
    /// Unique identifier (e.g., "SmallFiles")
    pub name: &'static str,
    /// Brief description
    pub description: &'static str,
    /// Base definitions only share entry points with other units and are
    /// never run on their own
    pub abstract_unit: bool,
    /// Entry points, in execution order
    pub entry_points: &'static [EntryPoint],
}

/// A discovered, runnable unit
#[derive(Debug, Clone)]
pub struct Unit {
    pub name: &'static str,
    pub description: &'static str,
    pub entry_points: Vec<EntryPoint>,
}

impl Unit {
    /// Get an entry point by name
    pub fn entry_point(&self, name: &str) -> Option<&EntryPoint> {
        self.entry_points.iter().find(|e| e.name == name)
    }

    /// Names of all entry points, in order
    pub fn entry_point_names(&self) -> Vec<&'static str> {
        self.entry_points.iter().map(|e| e.name).collect()
    }
}

/// The set of concrete units available to scenarios
#[derive(Debug, Clone, Default)]
pub struct Registry {
    units: Vec<Unit>,
}

impl Registry {
    /// Build a registry from a unit table, keeping only concrete units
    pub fn from_definitions(definitions: &[UnitDefinition]) -> Self {
        let units = definitions
            .iter()
            .filter(|d| !d.abstract_unit)
            .map(|d| Unit {
                name: d.name,
                description: d.description,
                entry_points: d.entry_points.to_vec(),
            })
            .collect();

        Self { units }
    }

    /// All discovered units, in table order
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Find a unit by name
    ///
    /// Accepts the bare unit name or a qualified path such as
    /// `minitest::units::SmallFiles`.
    pub fn find(&self, name: &str) -> Option<&Unit> {
        let bare = unqualified(name);
        self.units.iter().find(|u| u.name == name || u.name == bare)
    }

    /// Names of the entry points of a unit; `None` if the unit is unknown
    pub fn entry_points(&self, unit: &str) -> Option<Vec<&'static str>> {
        self.find(unit).map(Unit::entry_point_names)
    }

    /// Every (unit, entry point) pair, in table order
    pub fn pairs(&self) -> Vec<(&'static str, &'static str)> {
        self.units
            .iter()
            .flat_map(|u| u.entry_points.iter().map(move |e| (u.name, e.name)))
            .collect()
    }
}

/// Strip any `::`, `\` or `/` qualification from a unit name
fn unqualified(name: &str) -> &str {
    name.rsplit(|c: char| c == ':' || c == '\\' || c == '/')
        .next()
        .unwrap_or(name)
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Discover the built-in units
///
/// The table is filtered once; every later call returns the same registry.
pub fn discover() -> &'static Registry {
    REGISTRY.get_or_init(|| {
        let registry = Registry::from_definitions(crate::units::all_units());
        tracing::debug!(units = registry.units().len(), "Discovered test units");
        registry
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::FutureExt;

    fn passes<'a>(
        _: &'a dyn Connector,
        _: &'a ResolvedConfiguration,
    ) -> BoxFuture<'a, Result<bool>> {
        async { Ok(true) }.boxed()
    }

    static TABLE: &[UnitDefinition] = &[
        UnitDefinition {
            name: "Base",
            description: "shared entry points",
            abstract_unit: true,
            entry_points: &[EntryPoint { name: "shared", run: passes }],
        },
        UnitDefinition {
            name: "Concrete",
            description: "runs",
            abstract_unit: false,
            entry_points: &[
                EntryPoint { name: "first", run: passes },
                EntryPoint { name: "second", run: passes },
            ],
        },
        UnitDefinition {
            name: "Empty",
            description: "no entry points",
            abstract_unit: false,
            entry_points: &[],
        },
    ];

    #[test]
    fn test_abstract_units_are_skipped() {
        let registry = Registry::from_definitions(TABLE);
        let names: Vec<_> = registry.units().iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["Concrete", "Empty"]);
    }

    #[test]
    fn test_empty_unit_contributes_no_pairs() {
        let registry = Registry::from_definitions(TABLE);
        assert_eq!(registry.entry_points("Empty"), Some(vec![]));
        assert_eq!(
            registry.pairs(),
            vec![("Concrete", "first"), ("Concrete", "second")]
        );
    }

    #[test]
    fn test_find_accepts_qualified_names() {
        let registry = Registry::from_definitions(TABLE);
        assert!(registry.find("Concrete").is_some());
        assert!(registry.find("minitest::units::Concrete").is_some());
        assert!(registry.find("\\Akeeba\\Test\\Concrete").is_some());
        assert!(registry.find("Base").is_none());
        assert!(registry.find("Missing").is_none());
    }

    #[test]
    fn test_entry_points_are_stable_across_calls() {
        let registry = Registry::from_definitions(TABLE);
        let first = registry.entry_points("Concrete");
        assert_eq!(first, Some(vec!["first", "second"]));
        assert_eq!(registry.entry_points("Concrete"), first);
    }

    #[test]
    fn test_empty_table_gives_empty_registry() {
        let registry = Registry::from_definitions(&[]);
        assert!(registry.is_empty());
        assert!(registry.pairs().is_empty());
    }

    #[test]
    fn test_discover_is_memoized() {
        let first = discover();
        let second = discover();
        assert!(std::ptr::eq(first, second));
        assert!(!first.is_empty());
    }
}
