//! Propositional formulas over features
//!
//! Formulas have real structural equality and hashing, so no string-keyed
//! workarounds are needed anywhere. Construction keeps formulas in
//! negation normal form: negation exists only on literals. The printed
//! form (`Display`) and the parser (`FromStr`) are inverses; persisted
//! formulas round-trip through their printed text.

mod parser;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::algebra::Literal;
use crate::error::TraceError;

/// A propositional formula over feature literals.
///
/// `And`/`Or` operands are flattened, deduplicated, and kept sorted, so
/// two formulas built from the same operands in any order compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Formula {
    True,
    False,
    Lit(Literal),
    And(Vec<Formula>),
    Or(Vec<Formula>),
}

impl Formula {
    /// Conjunction of `operands`, with identity and absorption applied.
    pub fn and(operands: impl IntoIterator<Item = Formula>) -> Formula {
        let mut flat = Vec::new();
        for op in operands {
            match op {
                Formula::True => {}
                Formula::False => return Formula::False,
                Formula::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        flat.sort();
        flat.dedup();
        match flat.len() {
            0 => Formula::True,
            1 => flat.pop().unwrap_or(Formula::True),
            _ => Formula::And(flat),
        }
    }

    /// Disjunction of `operands`, with identity and absorption applied.
    pub fn or(operands: impl IntoIterator<Item = Formula>) -> Formula {
        let mut flat = Vec::new();
        for op in operands {
            match op {
                Formula::False => {}
                Formula::True => return Formula::True,
                Formula::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        flat.sort();
        flat.dedup();
        match flat.len() {
            0 => Formula::False,
            1 => flat.pop().unwrap_or(Formula::False),
            _ => Formula::Or(flat),
        }
    }

    /// Renders a set of literals as their conjunction.
    pub fn conjunction_of(literals: impl IntoIterator<Item = Literal>) -> Formula {
        Formula::and(literals.into_iter().map(Formula::Lit))
    }

    /// Conjunctive normal form by distribution.
    pub fn to_cnf(&self) -> Formula {
        let clauses = prune_trivial(self.cnf_clauses());
        if clauses.is_empty() {
            return Formula::True;
        }
        if clauses.iter().any(BTreeSet::is_empty) {
            return Formula::False;
        }
        Formula::and(
            clauses
                .into_iter()
                .map(|c| Formula::or(c.into_iter().map(Formula::Lit))),
        )
    }

    /// Disjunctive normal form by distribution.
    pub fn to_dnf(&self) -> Formula {
        rebuild_dnf(prune_trivial(self.dnf_terms()))
    }

    /// Disjunctive normal form with subsumption: terms implied by a
    /// smaller term are dropped.
    pub fn dnf_simplified(&self) -> Formula {
        let mut terms = prune_trivial(self.dnf_terms());
        let keep: Vec<bool> = terms
            .iter()
            .map(|term| {
                !terms
                    .iter()
                    .any(|other| other != term && other.is_subset(term))
            })
            .collect();
        let mut kept = Vec::new();
        for (term, keep) in terms.drain(..).zip(keep) {
            if keep {
                kept.push(term);
            }
        }
        rebuild_dnf(kept)
    }

    /// CNF clause sets. No clauses means true; an empty clause means false.
    fn cnf_clauses(&self) -> Vec<BTreeSet<Literal>> {
        match self {
            Formula::True => Vec::new(),
            Formula::False => vec![BTreeSet::new()],
            Formula::Lit(l) => vec![[l.clone()].into_iter().collect()],
            Formula::And(fs) => fs.iter().flat_map(|f| f.cnf_clauses()).collect(),
            Formula::Or(fs) => {
                let mut acc: Vec<BTreeSet<Literal>> = vec![BTreeSet::new()];
                for f in fs {
                    let clauses = f.cnf_clauses();
                    if clauses.is_empty() {
                        // a true disjunct absorbs the whole disjunction
                        return Vec::new();
                    }
                    let mut next = Vec::with_capacity(acc.len() * clauses.len());
                    for left in &acc {
                        for right in &clauses {
                            let mut merged = left.clone();
                            merged.extend(right.iter().cloned());
                            next.push(merged);
                        }
                    }
                    acc = next;
                }
                acc
            }
        }
    }

    /// DNF term sets. No terms means false; an empty term means true.
    fn dnf_terms(&self) -> Vec<BTreeSet<Literal>> {
        match self {
            Formula::False => Vec::new(),
            Formula::True => vec![BTreeSet::new()],
            Formula::Lit(l) => vec![[l.clone()].into_iter().collect()],
            Formula::Or(fs) => fs.iter().flat_map(|f| f.dnf_terms()).collect(),
            Formula::And(fs) => {
                let mut acc: Vec<BTreeSet<Literal>> = vec![BTreeSet::new()];
                for f in fs {
                    let terms = f.dnf_terms();
                    if terms.is_empty() {
                        // a false conjunct absorbs the whole conjunction
                        return Vec::new();
                    }
                    let mut next = Vec::with_capacity(acc.len() * terms.len());
                    for left in &acc {
                        for right in &terms {
                            let mut merged = left.clone();
                            merged.extend(right.iter().cloned());
                            next.push(merged);
                        }
                    }
                    acc = next;
                }
                acc
            }
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, parenthesize_or: bool) -> fmt::Result {
        match self {
            Formula::Or(_) if parenthesize_or => write!(f, "({self})"),
            other => write!(f, "{other}"),
        }
    }
}

/// Drops contradictory (term) or tautological (clause) literal sets and
/// duplicates.
fn prune_trivial(mut sets: Vec<BTreeSet<Literal>>) -> Vec<BTreeSet<Literal>> {
    sets.retain(|set| !set.iter().any(|l| set.contains(&l.negated())));
    sets.sort();
    sets.dedup();
    sets
}

fn rebuild_dnf(terms: Vec<BTreeSet<Literal>>) -> Formula {
    if terms.is_empty() {
        return Formula::False;
    }
    if terms.iter().any(BTreeSet::is_empty) {
        return Formula::True;
    }
    Formula::or(
        terms
            .into_iter()
            .map(|t| Formula::and(t.into_iter().map(Formula::Lit))),
    )
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::True => f.write_str("true"),
            Formula::False => f.write_str("false"),
            Formula::Lit(l) => write!(f, "{l}"),
            Formula::And(fs) => {
                for (i, operand) in fs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" & ")?;
                    }
                    operand.fmt_operand(f, true)?;
                }
                Ok(())
            }
            Formula::Or(fs) => {
                for (i, operand) in fs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    operand.fmt_operand(f, false)?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for Formula {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parser::parse(s)
    }
}

impl Serialize for Formula {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Formula {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
