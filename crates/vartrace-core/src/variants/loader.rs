//! Variant initialization and persistence
//!
//! Variants are loaded and persisted in bulk over a local worker pool,
//! one JSON blob per variant.

use std::collections::BTreeSet;
use std::fs;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::info;

use crate::algebra::Feature;
use crate::error::TraceError;
use crate::merge::MergedTree;

use super::builder::TreeBuilder;
use super::types::{Variant, VariantPassport};

const VARIANT_EXTENSION: &str = "variant";

fn worker_pool(threads: usize) -> Result<ThreadPool, TraceError> {
    Ok(ThreadPoolBuilder::new().num_threads(threads).build()?)
}

/// Reads a one-feature-per-line configuration file. A missing file is an
/// empty configuration; an unreadable one is fatal.
pub fn read_configuration(path: &Path) -> Result<BTreeSet<Feature>, TraceError> {
    if !path.exists() {
        return Ok(BTreeSet::new());
    }
    let content = fs::read_to_string(path).map_err(|source| TraceError::Config {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Feature::new)
        .collect())
}

/// Builds all variants from their passports in parallel: each variant's
/// configuration is read and its code tree built from disk.
pub fn init_variants(
    passports: &[VariantPassport],
    builder: &dyn TreeBuilder,
    threads: usize,
) -> Result<Vec<Variant>, TraceError> {
    let pool = worker_pool(threads)?;
    let variants = pool.install(|| {
        passports
            .par_iter()
            .map(|passport| {
                let features = read_configuration(&passport.configuration)?;
                let tree = builder.build(&passport.sources_root)?;
                Ok(Variant::new(passport.name.clone(), features, tree))
            })
            .collect::<Result<Vec<Variant>, TraceError>>()
    })?;
    info!(variants = variants.len(), "initialized variants");
    Ok(variants)
}

/// Writes each variant to `dir` as `<name>.variant` in parallel.
pub fn save_variants(variants: &[Variant], dir: &Path, threads: usize) -> Result<(), TraceError> {
    fs::create_dir_all(dir).map_err(|source| TraceError::Persist {
        path: dir.to_path_buf(),
        source,
    })?;
    let pool = worker_pool(threads)?;
    pool.install(|| {
        variants
            .par_iter()
            .try_for_each(|variant| write_json(&variant_path(dir, &variant.name), variant))
    })?;
    info!(variants = variants.len(), dir = %dir.display(), "saved variants");
    Ok(())
}

/// Loads every `.variant` file under `dir` in parallel, sorted by file
/// name so run order is stable.
pub fn load_variants(dir: &Path, threads: usize) -> Result<Vec<Variant>, TraceError> {
    let mut paths = Vec::new();
    let entries = fs::read_dir(dir).map_err(|source| TraceError::Persist {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| TraceError::Persist {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == VARIANT_EXTENSION) {
            paths.push(path);
        }
    }
    paths.sort();

    let pool = worker_pool(threads)?;
    let variants = pool.install(|| {
        paths
            .par_iter()
            .map(|path| read_json::<Variant>(path))
            .collect::<Result<Vec<Variant>, TraceError>>()
    })?;
    info!(variants = variants.len(), dir = %dir.display(), "loaded variants");
    Ok(variants)
}

/// Persists the merged tree as one JSON blob.
pub fn save_merged_tree(merged: &MergedTree, path: &Path) -> Result<(), TraceError> {
    write_json(path, merged)
}

/// Loads a previously persisted merged tree.
pub fn load_merged_tree(path: &Path) -> Result<MergedTree, TraceError> {
    read_json(path)
}

fn variant_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.{VARIANT_EXTENSION}"))
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), TraceError> {
    let file = File::create(path).map_err(|source| TraceError::Persist {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_writer(BufWriter::new(file), value).map_err(|source| TraceError::Codec {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, TraceError> {
    let file = File::open(path).map_err(|source| TraceError::Persist {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| TraceError::Codec {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::builder::LineTreeBuilder;
    use std::io::Write;

    fn write_file(path: &Path, content: &str) {
        let mut file = File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn missing_configuration_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let features = read_configuration(&dir.path().join("absent.config")).unwrap();
        assert!(features.is_empty());
    }

    #[test]
    fn configuration_lines_become_features() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v1.config");
        write_file(&path, "Base\n\n  Logging  \nBase\n");
        let features = read_configuration(&path).unwrap();
        let names: Vec<_> = features.iter().map(Feature::name).collect();
        assert_eq!(names, ["Base", "Logging"]);
    }

    #[test]
    fn init_builds_trees_and_reads_configurations() {
        let dir = tempfile::tempdir().unwrap();
        for (name, feature, line) in [("v1", "A", "one"), ("v2", "B", "two")] {
            let sources = dir.path().join(name);
            fs::create_dir(&sources).unwrap();
            write_file(&sources.join("main.txt"), &format!("{line}\n"));
            write_file(&dir.path().join(format!("{name}.config")), feature);
        }
        let passports = vec![
            VariantPassport::new("v1", dir.path().join("v1"), dir.path().join("v1.config")),
            VariantPassport::new("v2", dir.path().join("v2"), dir.path().join("v2.config")),
        ];
        let variants = init_variants(&passports, &LineTreeBuilder::default(), 2).unwrap();
        assert_eq!(variants.len(), 2);
        assert!(variants[0].features.contains(&Feature::new("A")));
        // root + file + line
        assert_eq!(variants[0].tree.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn variants_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let sources = dir.path().join("src");
        fs::create_dir(&sources).unwrap();
        write_file(&sources.join("main.txt"), "one\ntwo\n");
        let passports = vec![VariantPassport::new(
            "v1",
            &sources,
            dir.path().join("missing.config"),
        )];
        let originals = init_variants(&passports, &LineTreeBuilder::default(), 1).unwrap();

        let store = dir.path().join("store");
        save_variants(&originals, &store, 1).unwrap();
        let loaded = load_variants(&store, 1).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "v1");
        assert_eq!(
            loaded[0].tree.as_ref().unwrap().len(),
            originals[0].tree.as_ref().unwrap().len()
        );
    }

    #[test]
    fn unreadable_configuration_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // a directory where a file is expected fails to read
        let err = read_configuration(dir.path()).unwrap_err();
        assert!(matches!(err, TraceError::Config { path, .. } if path == dir.path()));
    }

    #[test]
    fn merged_tree_round_trips_through_disk() {
        use crate::tree::{NodeKind, Position, VariantPosition};
        use crate::variants::TreeBuilder;

        let dir = tempfile::tempdir().unwrap();
        let mut merged = crate::merge::MergedTree::new();
        for (name, line) in [("v1", "one\nshared\n"), ("v2", "two\nshared\n")] {
            let sources = dir.path().join(name);
            fs::create_dir(&sources).unwrap();
            write_file(&sources.join("main.txt"), line);
            let tree = LineTreeBuilder::default().build(&sources).unwrap();
            merged.merge(&tree, name);
        }
        let shared = merged
            .tree()
            .all_nodes()
            .find(|&id| merged.tree().node(id).label.as_deref() == Some("shared"))
            .unwrap();
        merged.tree_mut().node_mut(shared).mapping = Some("A | B".parse().unwrap());

        let path = dir.path().join("merged.json");
        save_merged_tree(&merged, &path).unwrap();
        let mut loaded = load_merged_tree(&path).unwrap();

        assert_eq!(loaded.tree().len(), merged.tree().len());
        assert_eq!(loaded.positions(shared), merged.positions(shared));
        assert_eq!(
            loaded.tree().node(shared).mapping,
            Some("A | B".parse().unwrap())
        );
        // the lazily rebuilt reverse lookup works after a load
        let origin = VariantPosition::new("v1", Position::line("main.txt", 1, 0));
        assert_eq!(loaded.node_at(&origin), Some(shared));
        let file = loaded
            .tree()
            .all_nodes()
            .find(|&id| loaded.tree().node(id).kind == NodeKind::File)
            .unwrap();
        assert_eq!(loaded.positions(file).map(|p| p.len()), Some(2));
    }

    #[test]
    fn corrupt_variant_blob_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("bad.variant"), "not json");
        let err = load_variants(dir.path(), 1).unwrap_err();
        assert!(matches!(err, TraceError::Codec { .. }));
    }
}
