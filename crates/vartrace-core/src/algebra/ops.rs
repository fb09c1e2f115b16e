//! Power sets and the feature-to-module bridge
//!
//! These operations are the dominant cost driver of refinement: for `p`
//! positive and `n` negative features, `features_to_modules` produces up
//! to `(2^p - 1) * 2^n` modules. Callers bound the feature counts; there
//! is no internal cutoff.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;

use super::types::{Feature, Literal, Module, ModuleSet};

/// Returns every subset of `set`, including the empty set and `set` itself.
pub fn power_set<T: Ord + Clone + std::hash::Hash>(set: &BTreeSet<T>) -> FxHashSet<BTreeSet<T>> {
    let mut result = FxHashSet::default();
    collect_subsets(set, &mut result);
    result
}

fn collect_subsets<T: Ord + Clone + std::hash::Hash>(
    set: &BTreeSet<T>,
    result: &mut FxHashSet<BTreeSet<T>>,
) {
    if !result.insert(set.clone()) {
        // already expanded this subset via another removal order
        return;
    }
    for element in set {
        let mut smaller = set.clone();
        smaller.remove(element);
        collect_subsets(&smaller, result);
    }
}

/// Builds the module set for one variant step: one module per non-empty
/// subset of `positive` paired with each subset of `negative`, containing
/// a positive literal per chosen positive feature and a negative literal
/// per chosen negative feature.
pub fn features_to_modules(
    positive: &BTreeSet<Feature>,
    negative: &BTreeSet<Feature>,
) -> ModuleSet {
    let mut result = ModuleSet::default();
    let negative_subsets = power_set(negative);
    for pos_subset in power_set(positive) {
        if pos_subset.is_empty() {
            continue;
        }
        for neg_subset in &negative_subsets {
            let mut literals: BTreeSet<Literal> = pos_subset
                .iter()
                .cloned()
                .map(Literal::positive)
                .collect();
            literals.extend(neg_subset.iter().cloned().map(Literal::negative));
            result.insert(Module::new(literals));
        }
    }
    result
}

/// Widens every module in `modules` with every subset of `neg_features`
/// taken as negative literals. Applied to the module sets of earlier
/// associations when a new variant introduces features their code could
/// not have depended on.
pub fn update_modules(modules: &ModuleSet, neg_features: &BTreeSet<Feature>) -> ModuleSet {
    let mut result = ModuleSet::default();
    let negative_subsets = power_set(neg_features);
    for module in modules {
        for neg_subset in &negative_subsets {
            let mut literals = module.literals().clone();
            literals.extend(neg_subset.iter().cloned().map(Literal::negative));
            result.insert(Module::new(literals));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(names: &[&str]) -> BTreeSet<Feature> {
        names.iter().map(|n| Feature::new(*n)).collect()
    }

    #[test]
    fn power_set_has_two_to_the_n_elements() {
        for n in 0..6usize {
            let set: BTreeSet<Feature> =
                (0..n).map(|i| Feature::new(format!("F{i}"))).collect();
            let subsets = power_set(&set);
            assert_eq!(subsets.len(), 1 << n);
            assert!(subsets.contains(&BTreeSet::new()));
            assert!(subsets.contains(&set));
        }
    }

    #[test]
    fn features_to_modules_excludes_empty_positive_choice() {
        let modules = features_to_modules(&features(&["A", "B"]), &features(&["C"]));
        // (2^2 - 1) positive subsets * 2^1 negative subsets
        assert_eq!(modules.len(), 6);
        for module in &modules {
            assert!(module.literals().iter().any(|l| l.positive));
        }
    }

    #[test]
    fn features_to_modules_with_no_negatives() {
        let modules = features_to_modules(&features(&["A"]), &BTreeSet::new());
        assert_eq!(modules.len(), 1);
        let only = modules.iter().next().unwrap();
        assert_eq!(only.literals().len(), 1);
        assert!(only.literals().contains(&Literal::positive(Feature::new("A"))));
    }

    #[test]
    fn update_modules_keeps_original_and_adds_widened() {
        let base = features_to_modules(&features(&["A"]), &BTreeSet::new());
        let widened = update_modules(&base, &features(&["B"]));
        // {A} stays (empty subset), {A, !B} is added
        assert_eq!(widened.len(), 2);
        assert!(widened.contains(&Module::new(
            [Literal::positive(Feature::new("A"))].into_iter().collect()
        )));
        assert!(widened.contains(&Module::new(
            [
                Literal::positive(Feature::new("A")),
                Literal::negative(Feature::new("B")),
            ]
            .into_iter()
            .collect()
        )));
    }

    #[test]
    fn update_modules_of_empty_set_is_empty() {
        let widened = update_modules(&ModuleSet::default(), &features(&["B"]));
        assert!(widened.is_empty());
    }
}
