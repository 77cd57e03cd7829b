// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Build Visual Studio TRX reports from unit test results.
//!
//! A host test runner feeds results into a [`TrxReporter`](reporter::TrxReporter) through the
//! [`TrxSink`](reporter::TrxSink) trait. When the run completes, the retained results are
//! assembled into a [`quick_trx::TestRun`], enriched with metadata from the test binaries, and
//! written out as a `.trx` file.

pub mod assemble;
pub mod config;
pub mod errors;
pub mod events;
pub mod identifier;
pub mod metadata;
pub mod reporter;
pub mod writer;
