// ABOUTME: Utility functions for the clickcast editor
// ABOUTME: Path validation, directory handling and slide identifier generation

use crate::errors::{CastError, Result};
use log::debug;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::{Component, Path};

/// Validate that a file exists
pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(CastError::PathNotFoundError(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(CastError::ValidationError {
            path: path.to_path_buf(),
            message: "path is not a file".to_string(),
        });
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        debug!("Creating directory {:?}", path);
        fs::create_dir_all(path).map_err(|e| CastError::io(path, e))?;
    } else if !path.is_dir() {
        return Err(CastError::ValidationError {
            path: path.to_path_buf(),
            message: "path exists but is not a directory".to_string(),
        });
    }
    Ok(())
}

/// Ensure a file's parent directory exists
pub fn ensure_parent_directory_exists(file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory_exists(parent)?;
        }
    }
    Ok(())
}

/// Remove a file or a whole directory tree. Missing paths are not an error.
pub fn remove_path(path: &Path) -> Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path).map_err(|e| CastError::io(path, e))
    } else if path.exists() {
        fs::remove_file(path).map_err(|e| CastError::io(path, e))
    } else {
        Ok(())
    }
}

/// True for a non-empty relative path made only of plain names, so joining it
/// to a directory cannot leave that directory.
pub fn is_contained_path(path: &str) -> bool {
    let path = Path::new(path);
    path.components().next().is_some()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

/// Generates slide identifiers.
///
/// Identifiers only name asset files, so a fast non-cryptographic generator is
/// enough. Each id is a v4-shaped UUID carrying 122 random bits; among n ids
/// the chance of any collision is about n^2 / 2^123.
pub struct IdGenerator {
    rng: SmallRng,
}

impl IdGenerator {
    /// Seed from the operating system once per session.
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
        }
    }

    /// Deterministic sequence, for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn next_id(&mut self) -> String {
        let bytes: [u8; 16] = self.rng.random();
        uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .hyphenated()
            .to_string()
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Does `id` look like something [`IdGenerator::next_id`] produces?
pub fn is_generated_id(id: &str) -> bool {
    uuid::Uuid::parse_str(id)
        .map(|u| u.get_version_num() == 4 && id.len() == 36)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    #[test]
    fn test_ids_are_unique_and_well_formed() {
        let mut generator = IdGenerator::new();
        let ids: HashSet<String> = (0..1000).map(|_| generator.next_id()).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| is_generated_id(id)));
    }

    #[test]
    fn test_seeded_generator_is_reproducible() {
        let mut a = IdGenerator::with_seed(7);
        let mut b = IdGenerator::with_seed(7);
        assert_eq!(a.next_id(), b.next_id());
    }

    #[test]
    fn test_is_generated_id() {
        assert!(is_generated_id("6f1c0a4e-2b7d-4c8e-9a1f-3d2e5b6c7a8d"));
        assert!(!is_generated_id("a1b2"));
    }

    #[test]
    fn test_is_contained_path() {
        assert!(is_contained_path("img/a1b2.png"));
        assert!(is_contained_path("a1b2.png"));
        assert!(!is_contained_path("../victim.png"));
        assert!(!is_contained_path("img/../../victim.png"));
        assert!(!is_contained_path("/etc/passwd"));
        assert!(!is_contained_path(""));
    }

    #[test]
    fn test_ensure_and_remove_directory() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        ensure_directory_exists(&nested).unwrap();
        assert!(nested.is_dir());

        remove_path(&temp.path().join("a")).unwrap();
        assert!(!nested.exists());
        remove_path(&temp.path().join("a")).unwrap();
    }

    #[test]
    fn test_ensure_directory_on_file_fails() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("f");
        fs::write(&file, "x").unwrap();
        assert!(ensure_directory_exists(&file).is_err());
        assert!(validate_file_exists(&file).is_ok());
    }
}
