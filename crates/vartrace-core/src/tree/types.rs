//! Node kinds and origin positions

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The syntactic category of a code element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    Folder,
    File,
    Line,
    ClassOrInterface,
    Method,
    Constructor,
    If,
    Then,
    Else,
    For,
    ForEach,
    DoWhile,
    Enum,
    EnumConstant,
    Switch,
    SwitchCase,
    Module,
    Default,
}

/// Where a code element originated in a variant's source tree.
///
/// Merged-tree copies carry `Unspecified`; their real origins are
/// resolved through the merged tree's position map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Root,
    Unspecified,
    File {
        path: PathBuf,
    },
    Line {
        path: PathBuf,
        line: u32,
        column: u32,
    },
}

impl Position {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Position::File { path: path.into() }
    }

    pub fn line(path: impl Into<PathBuf>, line: u32, column: u32) -> Self {
        Position::Line {
            path: path.into(),
            line,
            column,
        }
    }

    /// The file this position refers to, if any.
    pub fn file_path(&self) -> Option<&PathBuf> {
        match self {
            Position::File { path } | Position::Line { path, .. } => Some(path),
            _ => None,
        }
    }

    /// The line number of this position, if it refers to a line.
    pub fn line_number(&self) -> Option<u32> {
        match self {
            Position::Line { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// An origin position qualified by the variant that contributed it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantPosition {
    pub variant: String,
    pub position: Position,
}

impl VariantPosition {
    pub fn new(variant: impl Into<String>, position: Position) -> Self {
        Self {
            variant: variant.into(),
            position,
        }
    }
}
