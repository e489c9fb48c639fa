//! Artifact keys, array codec and the storage backends the dataset cache persists to.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{BallisticsError, Result};

/// File extension of persisted arrays
pub const ARTIFACT_EXTENSION: &str = "bin";

/// Which half of a dataset an artifact holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactRole {
    Parameters,
    Observations,
}

impl ArtifactRole {
    /// Short tag used in artifact names
    pub fn tag(&self) -> &'static str {
        match self {
            ArtifactRole::Parameters => "x",
            ArtifactRole::Observations => "y",
        }
    }
}

/// Identity of one persisted array: `{model_name}_{x|y}{suffix}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    pub model_name: String,
    pub role: ArtifactRole,
    suffix: String,
}

impl ArtifactKey {
    pub fn new(model_name: impl Into<String>, role: ArtifactRole, suffix: &str) -> Self {
        Self {
            model_name: model_name.into(),
            role,
            suffix: normalize_suffix(suffix),
        }
    }

    /// Suffix as it appears in the artifact name (`""` or `_`-prefixed)
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn file_stem(&self) -> String {
        format!("{}_{}{}", self.model_name, self.role.tag(), self.suffix)
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.file_stem(), ARTIFACT_EXTENSION)
    }
}

/// Prefix a non-empty suffix with `_` unless it already starts with one
pub fn normalize_suffix(suffix: &str) -> String {
    if suffix.is_empty() || suffix.starts_with('_') {
        suffix.to_string()
    } else {
        format!("_{}", suffix)
    }
}

/// Serialize an array with its shape
pub fn encode_array(array: &Array2<f64>) -> Result<Vec<u8>> {
    Ok(bincode::serialize(array)?)
}

pub fn decode_array(bytes: &[u8]) -> Result<Array2<f64>> {
    Ok(bincode::deserialize(bytes)?)
}

/// Byte-blob store keyed by [`ArtifactKey`]
pub trait ArtifactStore {
    /// Fetch an artifact, `Ok(None)` if it was never stored.
    fn load(&self, key: &ArtifactKey) -> Result<Option<Vec<u8>>>;

    /// Store an artifact, replacing any previous version.
    fn save(&mut self, key: &ArtifactKey, bytes: &[u8]) -> Result<()>;

    /// Human readable location for log messages
    fn location(&self) -> String;
}

/// Artifacts as files in one directory, created on first save
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &ArtifactKey) -> PathBuf {
        self.root.join(key.file_name())
    }
}

impl ArtifactStore for DirectoryStore {
    fn load(&self, key: &ArtifactKey) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, key: &ArtifactKey, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| {
            BallisticsError::storage(
                key.file_stem(),
                format!("cannot create directory {}: {}", self.root.display(), e),
            )
        })?;
        let path = self.path_for(key);
        fs::write(&path, bytes).map_err(|e| {
            BallisticsError::storage(key.file_stem(), format!("cannot write {}: {}", path.display(), e))
        })
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}

/// In-process store, counts writes so callers can check for regeneration
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    artifacts: HashMap<ArtifactKey, Vec<u8>>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `save` calls so far
    pub fn save_count(&self) -> usize {
        self.saves
    }

    pub fn contains(&self, key: &ArtifactKey) -> bool {
        self.artifacts.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Overwrite an artifact without counting it as a save
    pub fn insert_raw(&mut self, key: ArtifactKey, bytes: Vec<u8>) {
        self.artifacts.insert(key, bytes);
    }
}

impl ArtifactStore for MemoryStore {
    fn load(&self, key: &ArtifactKey) -> Result<Option<Vec<u8>>> {
        Ok(self.artifacts.get(key).cloned())
    }

    fn save(&mut self, key: &ArtifactKey, bytes: &[u8]) -> Result<()> {
        self.saves += 1;
        self.artifacts.insert(key.clone(), bytes.to_vec());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_suffix_normalization() {
        assert_eq!(normalize_suffix(""), "");
        assert_eq!(normalize_suffix("train"), "_train");
        assert_eq!(normalize_suffix("_test"), "_test");
    }

    #[test]
    fn test_artifact_names() {
        let key = ArtifactKey::new("inverse-ballistics", ArtifactRole::Parameters, "train");
        assert_eq!(key.file_stem(), "inverse-ballistics_x_train");
        assert_eq!(key.file_name(), "inverse-ballistics_x_train.bin");

        let key = ArtifactKey::new("inverse-ballistics", ArtifactRole::Observations, "");
        assert_eq!(key.file_stem(), "inverse-ballistics_y");

        // Both spellings of a suffix address the same artifact
        assert_eq!(
            ArtifactKey::new("m", ArtifactRole::Parameters, "val"),
            ArtifactKey::new("m", ArtifactRole::Parameters, "_val")
        );
    }

    #[test]
    fn test_codec_preserves_shape_and_bits() {
        let array = array![[0.1, -2.5e-300, f64::NAN], [1.0 / 3.0, f64::INFINITY, -0.0]];
        let decoded = decode_array(&encode_array(&array).unwrap()).unwrap();

        assert_eq!(decoded.dim(), (2, 3));
        for (a, b) in array.iter().zip(decoded.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_array(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        let key = ArtifactKey::new("m", ArtifactRole::Observations, "");
        assert_eq!(store.load(&key).unwrap(), None);

        store.save(&key, &[4, 5]).unwrap();
        assert_eq!(store.load(&key).unwrap(), Some(vec![4, 5]));
        assert_eq!(store.save_count(), 1);
        assert!(store.contains(&key));
    }

    #[test]
    fn test_directory_store_creates_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirectoryStore::new(dir.path().join("nested").join("data"));
        let key = ArtifactKey::new("m", ArtifactRole::Parameters, "train");
        assert!(!store.root().exists());

        assert_eq!(store.load(&key).unwrap(), None);
        store.save(&key, &[9, 8, 7]).unwrap();
        assert!(store.root().is_dir());
        assert!(store.path_for(&key).exists());
        assert_eq!(store.load(&key).unwrap(), Some(vec![9, 8, 7]));
    }

    #[test]
    fn test_directory_store_unwritable_root() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let mut store = DirectoryStore::new(blocker.join("data"));
        let key = ArtifactKey::new("m", ArtifactRole::Parameters, "");
        let err = store.save(&key, &[1]).unwrap_err();
        assert!(matches!(err, BallisticsError::Storage { .. }));
    }
}
