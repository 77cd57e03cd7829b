// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Receiving test events from a host runner.
//!
//! A host delivers events to a [`TrxSink`]. [`TrxReporter`] is the sink that accumulates results
//! and writes the report once the run completes. It requires events to arrive one at a time; hosts
//! that deliver events from several threads should use [`TrxReporter::spawn`] and send events
//! through the returned [`ReporterHandle`].

mod handle;

pub use handle::ReporterHandle;

use crate::{
    assemble::{ReportAssembler, RunInfo},
    config::TrxConfig,
    errors::ReportError,
    events::{MessageLevel, RunCompletion, TestResult},
    metadata::{BinaryMetadataProvider, ManifestLoader, MetadataProvider},
    writer::write_report,
};
use camino::Utf8PathBuf;
use chrono::Local;
use debug_ignore::DebugIgnore;
use tracing::{debug, error, info, warn};

/// Receives events for a single test run.
pub trait TrxSink {
    /// Called when a test result is available.
    fn on_result(&mut self, result: TestResult);

    /// Called when the host emits an advisory message.
    ///
    /// Messages do not affect the report.
    fn on_message(&mut self, level: MessageLevel, text: &str);

    /// Called once when the run completes. Returns the path of the written report.
    fn on_complete(&mut self, completion: RunCompletion) -> Result<Utf8PathBuf, ReportError>;
}

impl<S: TrxSink + ?Sized> TrxSink for &mut S {
    fn on_result(&mut self, result: TestResult) {
        (**self).on_result(result)
    }

    fn on_message(&mut self, level: MessageLevel, text: &str) {
        (**self).on_message(level, text)
    }

    fn on_complete(&mut self, completion: RunCompletion) -> Result<Utf8PathBuf, ReportError> {
        (**self).on_complete(completion)
    }
}

/// Accumulates results for a run and writes a TRX report when the run completes.
#[derive(Debug)]
pub struct TrxReporter<P> {
    config: TrxConfig,
    run: RunInfo,
    results: DebugIgnore<Vec<TestResult>>,
    provider: DebugIgnore<P>,
    completed: bool,
}

impl TrxReporter<BinaryMetadataProvider<ManifestLoader>> {
    /// Creates a reporter that reads test metadata from manifests next to each test binary.
    pub fn from_config(config: TrxConfig) -> Self {
        Self::new(config, BinaryMetadataProvider::new(ManifestLoader::new()))
    }
}

impl<P: MetadataProvider> TrxReporter<P> {
    /// Creates a reporter for a run starting now.
    ///
    /// The user and machine the run is attributed to are resolved from `config` and the
    /// environment.
    pub fn new(config: TrxConfig, provider: P) -> Self {
        let run = RunInfo::new(config.host_identity(), Local::now().fixed_offset());
        Self::with_run_info(config, run, provider)
    }

    /// Creates a reporter for the given run.
    pub fn with_run_info(config: TrxConfig, run: RunInfo, provider: P) -> Self {
        debug!(run_id = %run.run_id, dir = %config.dir, "created TRX reporter");
        Self {
            config,
            run,
            results: DebugIgnore(Vec::new()),
            provider: DebugIgnore(provider),
            completed: false,
        }
    }

    /// Returns information about the run.
    pub fn run_info(&self) -> &RunInfo {
        &self.run
    }

    /// Returns the results retained so far.
    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    /// Returns true if the run has been reported complete.
    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

impl<P: MetadataProvider + Send + 'static> TrxReporter<P> {
    /// Moves the reporter onto a worker thread, returning a handle that can be shared across
    /// threads.
    ///
    /// The worker exits once every handle is dropped.
    pub fn spawn(self) -> std::io::Result<ReporterHandle> {
        ReporterHandle::spawn(self)
    }
}

impl<P: MetadataProvider> TrxSink for TrxReporter<P> {
    fn on_result(&mut self, result: TestResult) {
        if self.completed {
            warn!(
                test = %result.test_case.qualified_name,
                "ignoring result received after the run completed"
            );
            return;
        }
        if result.is_filtered_out() {
            debug!(
                test = %result.test_case.qualified_name,
                "dropping skipped result without messages"
            );
            return;
        }
        self.results.push(result);
    }

    fn on_message(&mut self, level: MessageLevel, text: &str) {
        match level {
            MessageLevel::Informational => info!(target: "trx_reporter::host", "{text}"),
            MessageLevel::Warning => warn!(target: "trx_reporter::host", "{text}"),
            MessageLevel::Error => error!(target: "trx_reporter::host", "{text}"),
        }
    }

    fn on_complete(&mut self, completion: RunCompletion) -> Result<Utf8PathBuf, ReportError> {
        if self.completed {
            return Err(ReportError::AlreadyCompleted);
        }
        self.completed = true;

        let results = std::mem::take(&mut *self.results);
        let finish_time = Local::now().fixed_offset();
        let test_run = ReportAssembler::new(&self.run, completion)
            .set_metadata_failure(self.config.metadata_failure)
            .assemble_at(&results, &mut *self.provider, finish_time)?;

        let path = write_report(
            &test_run,
            &self.config.dir,
            &self.run.identity,
            finish_time,
        )?;
        Ok(path)
    }
}
