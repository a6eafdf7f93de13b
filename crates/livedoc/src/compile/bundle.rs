// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory compiled artifacts.
//!
//! A compile captures every emitted file as `name -> bytes`. Loading drains
//! the bundle: taking an artifact moves its bytes out, and the name is
//! remembered so a second take reports [`LoadError::AlreadyConsumed`]
//! rather than [`LoadError::NotFound`].

use super::LoadError;
use indexmap::IndexMap;
use std::collections::HashSet;

/// Platform file name of the shared library built for `unit_name`.
pub fn library_file_name(unit_name: &str) -> String {
    format!(
        "{}{}{}",
        std::env::consts::DLL_PREFIX,
        unit_name,
        std::env::consts::DLL_SUFFIX
    )
}

/// Compiled files of one unit.
#[derive(Debug, Default)]
pub struct ArtifactBundle {
    unit_name: String,
    entries: IndexMap<String, Vec<u8>>,
    consumed: HashSet<String>,
}

impl ArtifactBundle {
    pub fn new(unit_name: impl Into<String>) -> Self {
        Self {
            unit_name: unit_name.into(),
            ..Self::default()
        }
    }

    pub fn unit_name(&self) -> &str {
        &self.unit_name
    }

    /// Name of the shared library entry.
    pub fn library_name(&self) -> String {
        library_file_name(&self.unit_name)
    }

    /// Register a captured file. Re-registering a name replaces its bytes
    /// and makes it loadable again.
    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        let name = name.into();
        self.consumed.remove(&name);
        self.entries.insert(name, bytes);
    }

    /// Names still loadable.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bytes still held by the bundle.
    pub fn resident_bytes(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Move the artifact `name` out of the bundle.
    pub fn take(&mut self, name: &str) -> Result<Artifact, LoadError> {
        match self.entries.shift_remove(name) {
            Some(bytes) => {
                self.consumed.insert(name.to_string());
                Ok(Artifact {
                    name: name.to_string(),
                    bytes,
                })
            }
            None if self.consumed.contains(name) => {
                Err(LoadError::AlreadyConsumed(name.to_string()))
            }
            None => Err(LoadError::NotFound(name.to_string())),
        }
    }
}

/// One compiled file, owned after being taken from a bundle.
#[derive(Debug)]
pub struct Artifact {
    name: String,
    bytes: Vec<u8>,
}

impl Artifact {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_drains_entry() {
        let mut bundle = ArtifactBundle::new("demo");
        bundle.insert("libdemo.so", vec![1, 2, 3]);
        bundle.insert("demo.d", vec![4]);
        assert_eq!(bundle.resident_bytes(), 4);

        let artifact = bundle.take("libdemo.so").expect("first take");
        assert_eq!(artifact.bytes(), [1, 2, 3]);
        assert_eq!(bundle.len(), 1);
        assert_eq!(bundle.resident_bytes(), 1);
        assert!(!bundle.contains("libdemo.so"));
    }

    #[test]
    fn test_second_take_is_consumed() {
        let mut bundle = ArtifactBundle::new("demo");
        bundle.insert("a", vec![0]);
        assert!(bundle.take("a").is_ok());
        assert!(matches!(bundle.take("a"), Err(LoadError::AlreadyConsumed(name)) if name == "a"));
        assert!(matches!(bundle.take("b"), Err(LoadError::NotFound(name)) if name == "b"));
    }

    #[test]
    fn test_library_name_follows_platform() {
        let bundle = ArtifactBundle::new("demo");
        let name = bundle.library_name();
        assert!(name.contains("demo"));
        assert!(name.ends_with(std::env::consts::DLL_SUFFIX));
    }
}
