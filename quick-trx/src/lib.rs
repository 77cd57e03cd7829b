// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Generate Visual Studio TRX reports in Rust.
//!
//! A [`TestRun`] is the typed form of a TRX document. It lowers into a generic
//! [`XmlElement`] tree, which is namespace-normalized and then written out
//! with `quick-xml`.

mod build;
mod errors;
mod ids;
mod normalize;
mod report;
mod serialize;
mod tree;

pub use errors::*;
pub use ids::*;
pub use normalize::normalize_namespaces;
pub use report::*;
pub use tree::*;
