//! Configuration algebra
//!
//! Pure set operations over features and modules: power sets, the
//! feature-pair-to-module bridge, and the widening step applied to older
//! associations when a variant introduces new features.

mod ops;
mod types;

pub use ops::{features_to_modules, power_set, update_modules};
pub use types::{Feature, Literal, Module, ModuleSet};
