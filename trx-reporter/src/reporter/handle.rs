// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{TrxReporter, TrxSink};
use crate::{
    errors::ReportError,
    events::{MessageLevel, RunCompletion, TestResult},
    metadata::MetadataProvider,
};
use camino::Utf8PathBuf;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

#[derive(Debug)]
enum ReporterEvent {
    Result(TestResult),
    Message(MessageLevel, String),
    Complete {
        completion: RunCompletion,
        reply: oneshot::Sender<Result<Utf8PathBuf, ReportError>>,
    },
}

/// A handle to a [`TrxReporter`] running on its own thread.
///
/// Handles are cheap to clone and can be used from any thread. Events are processed in the order
/// they are sent. The methods on this type block, so they must not be called from within an async
/// runtime.
#[derive(Clone, Debug)]
pub struct ReporterHandle {
    sender: mpsc::UnboundedSender<ReporterEvent>,
}

impl ReporterHandle {
    pub(super) fn spawn<P>(mut reporter: TrxReporter<P>) -> std::io::Result<Self>
    where
        P: MetadataProvider + Send + 'static,
    {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        std::thread::Builder::new()
            .name("trx-reporter".to_owned())
            .spawn(move || {
                while let Some(event) = receiver.blocking_recv() {
                    match event {
                        ReporterEvent::Result(result) => reporter.on_result(result),
                        ReporterEvent::Message(level, text) => reporter.on_message(level, &text),
                        ReporterEvent::Complete { completion, reply } => {
                            // The caller may have given up waiting.
                            _ = reply.send(reporter.on_complete(completion));
                        }
                    }
                }
                debug!("all reporter handles dropped, worker exiting");
            })?;
        Ok(Self { sender })
    }

    /// Sends a test result to the reporter.
    ///
    /// Results sent after the worker has exited are dropped.
    pub fn send_result(&self, result: TestResult) {
        if let Err(error) = self.sender.send(ReporterEvent::Result(result)) {
            debug!(%error, "reporter worker is gone, dropping result");
        }
    }

    /// Sends an advisory message to the reporter.
    pub fn send_message(&self, level: MessageLevel, text: impl Into<String>) {
        if let Err(error) = self.sender.send(ReporterEvent::Message(level, text.into())) {
            debug!(%error, "reporter worker is gone, dropping message");
        }
    }

    /// Reports the run complete and waits for the report to be written.
    pub fn complete(&self, completion: RunCompletion) -> Result<Utf8PathBuf, ReportError> {
        let (reply, receiver) = oneshot::channel();
        self.sender
            .send(ReporterEvent::Complete { completion, reply })
            .map_err(|_| ReportError::ReporterShutDown)?;
        receiver
            .blocking_recv()
            .map_err(|_| ReportError::ReporterShutDown)?
    }
}

impl TrxSink for ReporterHandle {
    fn on_result(&mut self, result: TestResult) {
        self.send_result(result)
    }

    fn on_message(&mut self, level: MessageLevel, text: &str) {
        self.send_message(level, text)
    }

    fn on_complete(&mut self, completion: RunCompletion) -> Result<Utf8PathBuf, ReportError> {
        self.complete(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assemble::RunInfo,
        config::{HostIdentity, MetadataFailurePolicy, TrxConfig},
        errors::MetadataError,
        events::{TestCaseRef, TestOutcome},
        metadata::TestMetadata,
    };
    use camino_tempfile::Utf8TempDir;
    use chrono::Local;
    use std::time::Duration;

    struct ClassOnly;

    impl MetadataProvider for ClassOnly {
        fn resolve(&mut self, _test: &TestCaseRef) -> Result<TestMetadata, MetadataError> {
            Ok(TestMetadata {
                declaring_type: "Suite.ClassA".to_owned(),
                ..Default::default()
            })
        }
    }

    fn spawn_reporter(dir: &Utf8TempDir) -> ReporterHandle {
        let config = TrxConfig {
            dir: dir.path().to_owned(),
            metadata_failure: MetadataFailurePolicy::Abort,
            ..Default::default()
        };
        let run = RunInfo::new(
            HostIdentity::new("ci", "BUILD01", "CORP"),
            Local::now().fixed_offset(),
        );
        TrxReporter::with_run_info(config, run, ClassOnly)
            .spawn()
            .expect("spawned worker")
    }

    #[test]
    fn results_from_many_threads() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let handle = spawn_reporter(&dir);

        std::thread::scope(|scope| {
            for thread in 0..4 {
                let handle = handle.clone();
                scope.spawn(move || {
                    for i in 0..25 {
                        let name = format!("Test{thread}x{i}");
                        handle.send_result(TestResult::new(
                            TestCaseRef::new(format!("Suite.ClassA.{name}"), name, "suite.dll"),
                            TestOutcome::Passed,
                            Local::now().fixed_offset(),
                            Duration::from_millis(1),
                        ));
                    }
                });
            }
        });
        handle.send_message(MessageLevel::Informational, "all threads done");

        let path = handle
            .complete(RunCompletion::COMPLETED)
            .expect("report written");
        let contents = std::fs::read_to_string(&path).expect("report readable");
        assert_eq!(contents.matches("<UnitTestResult ").count(), 100);
        assert!(contents.contains(r#"total="100""#), "{contents}");

        let error = handle
            .complete(RunCompletion::COMPLETED)
            .expect_err("second completion is an error");
        assert!(matches!(error, ReportError::AlreadyCompleted), "{error:?}");
    }
}
