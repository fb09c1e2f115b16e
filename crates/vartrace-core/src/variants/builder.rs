//! Source-tree builders

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rustc_hash::FxHashMap;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::TraceError;
use crate::tree::{CodeTree, NodeId, NodeKind, Position};

/// Selects the tree builder for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeBuilderKind {
    /// Language-agnostic trees with one node per source line.
    #[default]
    Lines,
}

impl TreeBuilderKind {
    pub fn builder(self, file_types: Vec<String>) -> Box<dyn TreeBuilder> {
        match self {
            TreeBuilderKind::Lines => Box::new(LineTreeBuilder::new(file_types)),
        }
    }
}

impl FromStr for TreeBuilderKind {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lines" => Ok(TreeBuilderKind::Lines),
            other => Err(TraceError::UnsupportedBuilder(other.to_string())),
        }
    }
}

/// Builds a variant's code tree from its source directory.
pub trait TreeBuilder: Sync {
    fn build(&self, root: &Path) -> Result<CodeTree, TraceError>;
}

/// Builds trees with one node per source line, nested under file and
/// folder nodes mirroring the directory layout. Positions are recorded
/// relative to the variant root, so identical layouts in different
/// variants produce similar trees.
#[derive(Debug, Clone, Default)]
pub struct LineTreeBuilder {
    /// File name suffixes to include; empty includes every file.
    file_types: Vec<String>,
}

impl LineTreeBuilder {
    pub fn new(file_types: Vec<String>) -> Self {
        Self { file_types }
    }

    fn included(&self, path: &Path) -> bool {
        if self.file_types.is_empty() {
            return true;
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        self.file_types.iter().any(|suffix| name.ends_with(suffix))
    }
}

impl TreeBuilder for LineTreeBuilder {
    fn build(&self, root: &Path) -> Result<CodeTree, TraceError> {
        let mut tree = CodeTree::new();
        let mut folders: FxHashMap<PathBuf, NodeId> = FxHashMap::default();
        folders.insert(root.to_path_buf(), tree.root());

        for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                TraceError::Source {
                    path,
                    source: e.into(),
                }
            })?;
            let path = entry.path();
            let parent = path
                .parent()
                .and_then(|p| folders.get(p))
                .copied()
                .unwrap_or_else(|| tree.root());
            let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
            let label = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned());

            if entry.file_type().is_dir() {
                let id = tree.add_child(
                    parent,
                    label,
                    NodeKind::Folder,
                    Position::file(&relative),
                    None,
                );
                folders.insert(path.to_path_buf(), id);
                continue;
            }
            if !self.included(path) {
                continue;
            }
            let content = fs::read_to_string(path).map_err(|source| TraceError::Source {
                path: path.to_path_buf(),
                source,
            })?;
            let file = tree.add_child(
                parent,
                label,
                NodeKind::File,
                Position::file(&relative),
                None,
            );
            for (index, line) in content.lines().enumerate() {
                tree.add_child(
                    file,
                    Some(line.to_string()),
                    NodeKind::Line,
                    Position::line(&relative, index as u32, 0),
                    None,
                );
            }
        }
        debug!(root = %root.display(), nodes = tree.len(), "built line tree");
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn builder_names_resolve() {
        assert_eq!("lines".parse::<TreeBuilderKind>().unwrap(), TreeBuilderKind::Lines);
        assert!(matches!(
            "ast".parse::<TreeBuilderKind>(),
            Err(TraceError::UnsupportedBuilder(name)) if name == "ast"
        ));
    }

    #[test]
    fn nested_layout_becomes_folder_file_line_nesting() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        write_file(dir.path(), "top.txt", "alpha\nbeta\n");
        write_file(&dir.path().join("sub"), "inner.txt", "gamma\n");

        let tree = LineTreeBuilder::default().build(dir.path()).unwrap();
        // root + folder + 2 files + 3 lines
        assert_eq!(tree.len(), 7);
        let folder = tree
            .all_nodes()
            .find(|&id| tree.node(id).kind == NodeKind::Folder)
            .unwrap();
        assert_eq!(tree.node(folder).label.as_deref(), Some("sub"));
        let inner_file = tree.node(folder).children()[0];
        assert_eq!(tree.node(inner_file).kind, NodeKind::File);
        let line = tree.node(inner_file).children()[0];
        assert_eq!(tree.node(line).label.as_deref(), Some("gamma"));
        assert_eq!(
            tree.node(line).position,
            Position::line(Path::new("sub").join("inner.txt"), 0, 0)
        );
    }

    #[test]
    fn identical_layouts_under_different_roots_build_similar_trees() {
        let left_dir = tempfile::tempdir().unwrap();
        let right_dir = tempfile::tempdir().unwrap();
        for dir in [&left_dir, &right_dir] {
            write_file(dir.path(), "a.txt", "same line\n");
        }
        let builder = LineTreeBuilder::default();
        let left = builder.build(left_dir.path()).unwrap();
        let right = builder.build(right_dir.path()).unwrap();
        assert_eq!(left.len(), right.len());
        for (l, r) in left.subtree(left.root()).iter().zip(right.subtree(right.root())) {
            assert!(crate::tree::similar(&left, *l, &right, r));
        }
    }

    #[test]
    fn file_type_filter_skips_other_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "keep.c", "int x;\n");
        write_file(dir.path(), "skip.md", "notes\n");

        let tree = LineTreeBuilder::new(vec![".c".to_string()])
            .build(dir.path())
            .unwrap();
        let files: Vec<_> = tree
            .all_nodes()
            .filter(|&id| tree.node(id).kind == NodeKind::File)
            .collect();
        assert_eq!(files.len(), 1);
        assert_eq!(tree.node(files[0]).label.as_deref(), Some("keep.c"));
    }

    #[test]
    fn sibling_order_is_sorted_not_directory_order() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "b.txt", "two\n");
        write_file(dir.path(), "a.txt", "one\n");

        let tree = LineTreeBuilder::default().build(dir.path()).unwrap();
        let labels: Vec<_> = tree
            .node(tree.root())
            .children()
            .iter()
            .map(|&id| tree.node(id).label.clone().unwrap())
            .collect();
        assert_eq!(labels, ["a.txt", "b.txt"]);
    }
}
