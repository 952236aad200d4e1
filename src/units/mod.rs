//! Built-in test units
//!
//! To add a unit, write a module exposing a [`UnitDefinition`] and append it
//! to [`UNITS`]. Discovery picks it up without further changes.

pub mod big_files;
pub mod files;
pub mod head_object;
pub mod list_files;
pub mod small_files;

use crate::testing::UnitDefinition;

/// All registered units, in run order
static UNITS: &[UnitDefinition] = &[
    small_files::SMALL_FILES,
    small_files::SMALL_FILES_NO_DELETE,
    small_files::SMALL_FILES_ONLY_UPLOAD,
    big_files::BIG_FILES,
    head_object::HEAD_OBJECT,
    list_files::LIST_FILES,
];

/// Get all registered units
pub fn all_units() -> &'static [UnitDefinition] {
    UNITS
}

/// Get a unit definition by name
pub fn get_unit(name: &str) -> Option<&'static UnitDefinition> {
    UNITS.iter().find(|u| u.name == name)
}
