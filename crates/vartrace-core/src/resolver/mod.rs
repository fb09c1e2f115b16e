//! Mapping resolution
//!
//! Turns refined associations into presence formulas: annotations carried
//! by the merged nodes win when they are unambiguous, otherwise the
//! formula is derived from the association's bounding module sets and
//! simplified.

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::debug;

use crate::associations::Association;
use crate::error::TraceError;
use crate::formula::Formula;
use crate::merge::MergedTree;

/// Which normal form the derived formulas are simplified towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimplifyMode {
    /// Conjunctive normal form, keeping only the literal conjuncts when
    /// that leaves anything; falls back to simplified DNF otherwise.
    #[default]
    Cnf,
    /// Disjunctive normal form with subsumption.
    Dnf,
}

/// Resolves the presence formula of every association and pushes it down
/// to the covered merged nodes.
#[derive(Debug, Clone, Default)]
pub struct MappingResolver {
    mode: SimplifyMode,
    /// Worker threads for the annotation scan; 0 uses the rayon default.
    threads: usize,
}

impl MappingResolver {
    pub fn new(mode: SimplifyMode, threads: usize) -> Self {
        Self { mode, threads }
    }

    /// Resolves `associations` in place against `merged`.
    ///
    /// A node annotation adopted from the variants takes precedence over
    /// the heuristic, but only when all annotated nodes of an association
    /// agree on a single formula.
    pub fn resolve(
        &self,
        associations: &mut [Association],
        merged: &mut MergedTree,
    ) -> Result<(), TraceError> {
        let pool = ThreadPoolBuilder::new().num_threads(self.threads).build()?;
        {
            let tree = merged.tree();
            pool.install(|| {
                associations.par_iter_mut().for_each(|assoc| {
                    if assoc.mapping.is_some() {
                        return;
                    }
                    let mut seen: Vec<&Formula> = Vec::new();
                    for &node in &assoc.nodes {
                        if let Some(mapping) = &tree.node(node).mapping {
                            if !seen.contains(&mapping) {
                                seen.push(mapping);
                            }
                        }
                    }
                    // a single agreed annotation is adopted verbatim;
                    // conflicting ones leave the heuristic to decide
                    if let [only] = seen.as_slice() {
                        assoc.mapping = Some((*only).clone());
                    }
                });
            });
        }

        let mut derived = 0usize;
        for assoc in associations.iter_mut() {
            if assoc.mapping.is_none() {
                assoc.mapping = Some(self.derive(assoc));
                derived += 1;
            }
        }
        debug!(
            associations = associations.len(),
            derived, "resolved mappings"
        );

        for assoc in associations.iter() {
            let mapping = match &assoc.mapping {
                Some(mapping) => mapping,
                None => continue,
            };
            for &node in &assoc.nodes {
                let node = merged.tree_mut().node_mut(node);
                if node.mapping.is_none() {
                    node.mapping = Some(mapping.clone());
                }
            }
        }
        Ok(())
    }

    /// Derives a formula from the bounding module sets: the smallest
    /// lower-bound modules must all hold, and in their absence the
    /// smallest upper-bound modules describe the alternatives.
    fn derive(&self, assoc: &Association) -> Formula {
        let mins = assoc.smallest_min_modules();
        let raw = if !mins.is_empty() {
            Formula::and(
                mins.into_iter()
                    .map(|m| Formula::conjunction_of(m.literals().iter().cloned())),
            )
        } else if assoc.basic {
            // present everywhere under a stable universe
            Formula::True
        } else {
            Formula::or(
                assoc
                    .smallest_max_modules()
                    .into_iter()
                    .map(|m| Formula::conjunction_of(m.literals().iter().cloned())),
            )
        };
        self.simplify(raw)
    }

    fn simplify(&self, formula: Formula) -> Formula {
        match self.mode {
            SimplifyMode::Dnf => formula.dnf_simplified(),
            SimplifyMode::Cnf => {
                let cnf = formula.to_cnf();
                match &cnf {
                    Formula::And(conjuncts) => {
                        let literal_conjuncts: Vec<Formula> = conjuncts
                            .iter()
                            .filter(|c| !matches!(c, Formula::Or(_)))
                            .cloned()
                            .collect();
                        if literal_conjuncts.is_empty() {
                            // every clause is a disjunction; the CNF adds
                            // nothing over the simplified DNF
                            formula.dnf_simplified()
                        } else {
                            Formula::and(literal_conjuncts)
                        }
                    }
                    _ => cnf,
                }
            }
        }
    }
}
