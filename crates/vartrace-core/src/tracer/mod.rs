//! End-to-end trace extraction
//!
//! Wires the stages together: variants are initialized from their
//! passports, folded one by one into the merged tree while the
//! association partition is refined, and the final associations are
//! resolved into presence formulas on the merged nodes.

use std::collections::BTreeSet;

use tracing::info;

use crate::algebra::Feature;
use crate::associations::{Association, RefinementEngine};
use crate::error::TraceError;
use crate::merge::MergedTree;
use crate::resolver::{MappingResolver, SimplifyMode};
use crate::variants::{init_variants, TreeBuilderKind, Variant, VariantPassport};

/// Configures and runs a trace-extraction pass over a set of variants.
#[derive(Debug, Clone, Default)]
pub struct FeatureTracer {
    builder: TreeBuilderKind,
    file_types: Vec<String>,
    mode: SimplifyMode,
    /// Worker threads for bulk stages; 0 uses the rayon default.
    threads: usize,
}

/// Everything a trace run produces.
#[derive(Debug)]
pub struct TraceResult {
    /// The merged tree with resolved per-node formulas.
    pub merged: MergedTree,
    /// The final association partition, mappings included.
    pub associations: Vec<Association>,
    /// The full feature universe across all variants.
    pub all_features: BTreeSet<Feature>,
    /// The processed variants, trees dropped, merged nodes recorded.
    pub variants: Vec<Variant>,
}

impl FeatureTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builder(mut self, builder: TreeBuilderKind) -> Self {
        self.builder = builder;
        self
    }

    /// File name suffixes to include when building trees; empty includes
    /// every file.
    pub fn with_file_types(mut self, file_types: Vec<String>) -> Self {
        self.file_types = file_types;
        self
    }

    pub fn with_simplify_mode(mut self, mode: SimplifyMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Runs the full pass over `passports`, in the given variant order.
    /// The refinement is order sensitive, so the order is part of the
    /// input.
    pub fn trace(&self, passports: &[VariantPassport]) -> Result<TraceResult, TraceError> {
        let builder = self.builder.builder(self.file_types.clone());
        let variants = init_variants(passports, builder.as_ref(), self.threads)?;
        let mut result = self.trace_variants(variants)?;
        MappingResolver::new(self.mode, self.threads)
            .resolve(&mut result.associations, &mut result.merged)?;
        info!(
            variants = result.variants.len(),
            features = result.all_features.len(),
            associations = result.associations.len(),
            "trace extraction finished"
        );
        Ok(result)
    }

    /// The merge-and-refine stages without resolution, for callers that
    /// inspect or persist the raw partition.
    pub fn trace_variants(&self, mut variants: Vec<Variant>) -> Result<TraceResult, TraceError> {
        let mut merged = MergedTree::new();
        let mut engine = RefinementEngine::new();
        for variant in &mut variants {
            if let Some(tree) = variant.tree.take() {
                variant.merged_nodes = merged.merge(&tree, &variant.name);
            }
            engine.step(variant.merged_nodes.clone(), &variant.features);
        }
        let all_features = engine.all_features().clone();
        Ok(TraceResult {
            merged,
            associations: engine.finish(),
            all_features,
            variants,
        })
    }
}
