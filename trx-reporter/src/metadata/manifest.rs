// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{BinaryLoader, TestBinary};
use crate::errors::MetadataError;
use camino::{Utf8Path, Utf8PathBuf};

/// The suffix appended to a test binary's path to find its metadata manifest.
pub const MANIFEST_SUFFIX: &str = ".testmeta.json";

/// A [`BinaryLoader`] that reads a JSON manifest stored next to each test binary.
///
/// For a binary `bin/suite.dll`, the manifest is `bin/suite.dll.testmeta.json`:
///
/// ```json
/// {
///   "types": [{
///     "name": "Suite.ClassA",
///     "methods": [{
///       "name": "TestOne",
///       "description": "Checks the first thing",
///       "properties": [{ "key": "owner", "value": "ci" }],
///       "categories": [["Fast"]]
///     }]
///   }]
/// }
/// ```
#[derive(Clone, Debug, Default)]
pub struct ManifestLoader {
    _private: (),
}

impl ManifestLoader {
    /// Creates a new `ManifestLoader`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the manifest path for a test binary.
    pub fn manifest_path(source: &Utf8Path) -> Utf8PathBuf {
        format!("{source}{MANIFEST_SUFFIX}").into()
    }
}

impl BinaryLoader for ManifestLoader {
    fn load(&self, source: &Utf8Path) -> Result<TestBinary, MetadataError> {
        let path = Self::manifest_path(source);
        let contents = std::fs::read_to_string(&path).map_err(|error| {
            MetadataError::LoadFailed {
                path: path.clone(),
                error,
            }
        })?;
        serde_json::from_str(&contents)
            .map_err(|error| MetadataError::InvalidManifest { path, error })
    }
}
