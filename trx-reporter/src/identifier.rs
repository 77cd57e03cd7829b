// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test and execution identifiers.

use newtype_uuid::{GenericUuid, TypedUuid};
use quick_trx::{ExecutionUuid, TestUuid};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use uuid::Uuid;

/// Derives a stable test identifier from a name.
///
/// The first 16 bytes of the SHA-256 digest of the UTF-8 name are read as a GUID, with the first
/// three fields little-endian as in the legacy GUID byte layout. The same name always yields the
/// same identifier, which lets consumers correlate a test across runs.
pub fn derive_test_id(name: &str) -> TestUuid {
    let digest = Sha256::digest(name.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    TypedUuid::from_untyped_uuid(Uuid::from_bytes_le(bytes))
}

/// Assigns a random execution identifier to each result in a single report.
///
/// Results are keyed by their position in the retained result list. The first lookup for a
/// position generates a fresh identifier; later lookups return the same one. A cache lives for one
/// assembly pass and is dropped with it.
#[derive(Clone, Debug, Default)]
pub struct ExecutionIdCache {
    ids: HashMap<usize, ExecutionUuid>,
}

impl ExecutionIdCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the execution identifier for the result at `index`, generating one if needed.
    pub fn get(&mut self, index: usize) -> ExecutionUuid {
        *self.ids.entry(index).or_insert_with(ExecutionUuid::new_v4)
    }

    /// Returns the number of identifiers handed out so far.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if no identifiers have been handed out.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
