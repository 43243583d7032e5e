//! Outline file storage with XDG path support.
//!
//! Outlines are stored as JSON documents with nested children. The default
//! location is `~/.local/share/ol/outline.json`.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::outline::{NodeData, NodeId, NodeRef, Outline, OutlineError, OutlineNode};

/// Default outline filename.
const OUTLINE_FILENAME: &str = "outline.json";

/// Application qualifier (for XDG paths).
const QUALIFIER: &str = "";

/// Application organization (for XDG paths).
const ORGANIZATION: &str = "";

/// Application name (for XDG paths).
const APPLICATION: &str = "ol";

/// Errors that can occur during outline storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to determine XDG data directory.
    #[error("failed to determine data directory: no valid home directory found")]
    NoDataDir,

    /// I/O error during file read.
    #[error("failed to read outline file '{path}': {source}")]
    ReadError {
        /// The path that failed to read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// I/O error during file write.
    #[error("failed to write outline file '{path}': {source}")]
    WriteError {
        /// The path that failed to write.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// I/O error during directory creation.
    #[error("failed to create data directory '{path}': {source}")]
    CreateDirError {
        /// The directory path that failed to create.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document describes an invalid outline.
    #[error("invalid outline: {0}")]
    Outline(#[from] OutlineError),
}

/// Result type for outline store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// A serialized outline: a forest of nested node records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineDocument {
    /// Root nodes in document order.
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
}

/// One node of an [`OutlineDocument`] with its children inlined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Stable identifier. Generated when missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Text content.
    #[serde(default)]
    pub text: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,

    /// Creation timestamp. Defaults to the load instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Modification timestamp. Defaults to `created_at`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeRecord>,
}

impl NodeRecord {
    fn to_data(&self, loaded_at: DateTime<Utc>) -> NodeData {
        let id = self
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let created_at = self.created_at.unwrap_or(loaded_at);

        NodeData {
            id,
            text: self.text.clone(),
            tags: self.tags.iter().cloned().collect(),
            attributes: self.attributes.clone(),
            created_at,
            modified_at: self.modified_at.unwrap_or(created_at),
        }
    }

    fn from_node(node: NodeRef<'_>) -> Self {
        let data = node.data();
        Self {
            id: Some(data.id.clone()),
            text: data.text.clone(),
            tags: data.tags.iter().cloned().collect(),
            attributes: data.attributes.clone(),
            created_at: Some(data.created_at),
            modified_at: Some(data.modified_at),
            children: node.children().map(NodeRecord::from_node).collect(),
        }
    }
}

impl Outline {
    /// Builds an outline from a document.
    ///
    /// Nodes without an id get a random UUID; missing timestamps default to
    /// the current time.
    ///
    /// # Errors
    ///
    /// Returns [`OutlineError::DuplicateId`] if two records share an id.
    pub fn from_document(document: &OutlineDocument) -> std::result::Result<Self, OutlineError> {
        let loaded_at = Utc::now();
        let mut outline = Outline::new();
        for record in &document.nodes {
            let id = outline.add_root(record.to_data(loaded_at))?;
            add_children(&mut outline, id, &record.children, loaded_at)?;
        }
        Ok(outline)
    }

    /// Converts the outline back into a document.
    pub fn to_document(&self) -> OutlineDocument {
        OutlineDocument {
            nodes: self.roots().map(NodeRecord::from_node).collect(),
        }
    }
}

fn add_children(
    outline: &mut Outline,
    parent: NodeId,
    records: &[NodeRecord],
    loaded_at: DateTime<Utc>,
) -> std::result::Result<(), OutlineError> {
    for record in records {
        let id = outline.add_child(parent, record.to_data(loaded_at))?;
        add_children(outline, id, &record.children, loaded_at)?;
    }
    Ok(())
}

/// Persistent storage for an outline document.
///
/// # Example
///
/// ```no_run
/// use outline_query::OutlineStore;
///
/// let store = OutlineStore::new()?;
/// let outline = store.load_or_default()?;
/// store.save(&outline)?;
/// # Ok::<(), outline_query::StoreError>(())
/// ```
#[derive(Debug, Clone)]
pub struct OutlineStore {
    /// Path to the outline file.
    path: PathBuf,
}

impl OutlineStore {
    /// Creates a store at the default XDG data path.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NoDataDir` if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        let path = Self::default_path()?;
        Ok(Self { path })
    }

    /// Creates a store with a custom path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the default XDG data path for the outline file.
    ///
    /// On Unix: `~/.local/share/ol/outline.json`
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NoDataDir` if the home directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        let project_dirs =
            ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION).ok_or(StoreError::NoDataDir)?;
        Ok(project_dirs.data_dir().join(OUTLINE_FILENAME))
    }

    /// Returns the path to the outline file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Returns true if the outline file exists on disk.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads the raw document.
    ///
    /// # Errors
    ///
    /// - Returns `StoreError::ReadError` if the file cannot be read.
    /// - Returns `StoreError::Json` if the file contains invalid JSON.
    pub fn load_document(&self) -> Result<OutlineDocument> {
        let contents = fs::read_to_string(&self.path).map_err(|e| StoreError::ReadError {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Loads the outline from disk.
    ///
    /// # Errors
    ///
    /// - Returns `StoreError::ReadError` if the file cannot be read.
    /// - Returns `StoreError::Json` if the file contains invalid JSON.
    /// - Returns `StoreError::Outline` if node ids collide.
    pub fn load(&self) -> Result<Outline> {
        let document = self.load_document()?;
        let outline = Outline::from_document(&document)?;
        debug!(path = %self.path.display(), nodes = outline.len(), "loaded outline");
        Ok(outline)
    }

    /// Loads the outline, returning an empty one if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load), except that a missing file is not an error.
    pub fn load_or_default(&self) -> Result<Outline> {
        match self.load() {
            Ok(outline) => Ok(outline),
            Err(StoreError::ReadError { ref source, .. })
                if source.kind() == io::ErrorKind::NotFound =>
            {
                debug!(path = %self.path.display(), "no outline file, starting empty");
                Ok(Outline::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Saves the outline to disk atomically.
    ///
    /// Creates the parent directory if it doesn't exist, writes to a temporary
    /// file, then renames it over the target.
    ///
    /// # Errors
    ///
    /// - Returns `StoreError::CreateDirError` if the directory cannot be created.
    /// - Returns `StoreError::WriteError` if the file cannot be written.
    /// - Returns `StoreError::Json` if serialization fails.
    pub fn save(&self, outline: &Outline) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::CreateDirError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(&outline.to_document())?;

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, &json).map_err(|e| StoreError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;
        fs::rename(&temp_path, &self.path).map_err(|e| StoreError::WriteError {
            path: self.path.clone(),
            source: e,
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_path_is_under_application_dir() {
        let path = OutlineStore::default_path().expect("should get default path");
        let path_str = path.to_string_lossy();
        assert!(path_str.ends_with("outline.json"), "{path_str}");
        assert!(path_str.contains("ol"), "{path_str}");
        assert!(path.is_absolute(), "path should be absolute: {path:?}");
    }

    #[test]
    fn test_with_path() {
        let store = OutlineStore::with_path("/tmp/x/outline.json");
        assert_eq!(store.path(), &PathBuf::from("/tmp/x/outline.json"));
    }

    #[test]
    fn test_read_error_includes_file_path() {
        let store = OutlineStore::with_path("/nonexistent/path/outline.json");
        let error = store.load().unwrap_err();
        assert!(matches!(error, StoreError::ReadError { .. }));
        assert!(error.to_string().contains("/nonexistent/path/outline.json"));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = OutlineStore::with_path(dir.path().join("missing.json"));
        assert!(store.load_or_default().unwrap().is_empty());
    }

    #[test]
    fn test_document_defaults() {
        let json = r#"{
            "nodes": [
                { "text": "no id" },
                {
                    "id": "p",
                    "text": "parent",
                    "created_at": "2025-01-02T03:04:05Z",
                    "children": [{ "id": "c", "text": "child", "tags": ["x"] }]
                }
            ]
        }"#;
        let document: OutlineDocument = serde_json::from_str(json).unwrap();
        let outline = Outline::from_document(&document).unwrap();

        assert_eq!(outline.len(), 3);
        let generated = outline.roots().next().unwrap();
        assert!(Uuid::parse_str(generated.id()).is_ok());

        let parent = outline.find_by_id("p").unwrap();
        let created = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(parent.created_at(), created);
        assert_eq!(parent.modified_at(), created);

        let child = outline.find_by_id("c").unwrap();
        assert_eq!(child.parent(), Some(parent));
        assert!(child.has_tag("x"));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let json = r#"{ "nodes": [{ "id": "a" }, { "id": "b", "children": [{ "id": "a" }] }] }"#;
        let document: OutlineDocument = serde_json::from_str(json).unwrap();
        assert_eq!(
            Outline::from_document(&document).unwrap_err(),
            OutlineError::DuplicateId("a".to_string())
        );
    }

    #[test]
    fn test_save_and_load_preserves_structure() {
        let dir = tempfile::tempdir().unwrap();
        let store = OutlineStore::with_path(dir.path().join("nested/outline.json"));

        let mut outline = Outline::new();
        let root = outline
            .add_root(NodeData::new("r", "root").with_attribute("k", "v"))
            .unwrap();
        outline.add_child(root, NodeData::new("c", "child")).unwrap();

        store.save(&outline).unwrap();
        assert!(store.exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.to_document(), outline.to_document());
        assert_eq!(loaded.find_by_id("c").unwrap().depth(), 1);
    }
}
