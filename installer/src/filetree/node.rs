//! Storage manifest tree nodes.
//!
//! `filetree.json` mirrors the directory layout of the OpenVINO storage
//! server. Each node is either a directory with ordered children or a file.
//! Fields other than `name`, `type`, and `children` (for example `size`) are
//! ignored during deserialization.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of entry a [`FileTreeNode`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A directory whose entries are listed in `children`.
    Directory,
    /// A downloadable file.
    File,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory => f.write_str("directory"),
            Self::File => f.write_str("file"),
        }
    }
}

/// One entry of the storage manifest.
///
/// # Examples
///
/// ```
/// use openvino_installer::filetree::{FileTreeNode, NodeKind};
///
/// let node: FileTreeNode = serde_json::from_str(
///     r#"{"name":"production","type":"directory","children":[]}"#,
/// )
/// .expect("valid node");
/// assert_eq!(node.name, "production");
/// assert_eq!(node.kind, NodeKind::Directory);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTreeNode {
    /// Directory or file name.
    pub name: String,
    /// Whether this node is a directory or a file.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Ordered child entries; empty for files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileTreeNode>,
}

impl FileTreeNode {
    /// Construct a directory node.
    #[must_use]
    pub fn directory(name: impl Into<String>, children: Vec<Self>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Directory,
            children,
        }
    }

    /// Construct a file node.
    #[must_use]
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::File,
            children: Vec::new(),
        }
    }

    /// Whether this node is a directory.
    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Whether this node is a file.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    /// Find the first child directory named `name`.
    #[must_use]
    pub fn child_directory(&self, name: &str) -> Option<&Self> {
        self.children
            .iter()
            .find(|child| child.is_directory() && child.name == name)
    }
}
