//! Feature, literal, and module types

use std::collections::BTreeSet;
use std::fmt;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// An atomic named proposition. Identity and ordering are by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feature(String);

impl Feature {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A feature literal: a feature asserted present or absent.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub feature: Feature,
    pub positive: bool,
}

impl Literal {
    pub fn positive(feature: Feature) -> Self {
        Self { feature, positive: true }
    }

    pub fn negative(feature: Feature) -> Self {
        Self { feature, positive: false }
    }

    pub fn negated(&self) -> Self {
        Self { feature: self.feature.clone(), positive: !self.positive }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.positive {
            f.write_str("!")?;
        }
        write!(f, "{}", self.feature)
    }
}

/// A configuration clause: a set of feature literals describing one
/// concrete combination of present/absent features. Equality is
/// structural over the literal set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Module {
    literals: BTreeSet<Literal>,
}

impl Module {
    pub fn new(literals: BTreeSet<Literal>) -> Self {
        Self { literals }
    }

    pub fn literals(&self) -> &BTreeSet<Literal> {
        &self.literals
    }

    /// Number of literals in this module.
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, literal) in self.literals.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{literal}")?;
        }
        f.write_str("}")
    }
}

/// The working representation of a set of modules.
pub type ModuleSet = FxHashSet<Module>;
