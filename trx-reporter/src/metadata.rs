// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolve declarative metadata for a test from the binary it came from.
//!
//! Test results only carry names. Descriptions, custom properties and categories are declared in
//! the test binary, and are looked up here through a [`MetadataProvider`].

mod manifest;
mod provider;

pub use manifest::*;
pub use provider::*;
