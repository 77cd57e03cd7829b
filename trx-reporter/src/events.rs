// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Results and notifications delivered by the host test runner.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, FixedOffset};
use std::{fmt, time::Duration};

/// The identity of a single test.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TestCaseRef {
    /// Dot-separated `namespace.class.method` name used to locate the test.
    pub qualified_name: String,

    /// Human-readable name.
    pub display_name: String,

    /// Path to the test binary the test was loaded from.
    pub source: Utf8PathBuf,
}

impl TestCaseRef {
    /// Creates a new `TestCaseRef`.
    pub fn new(
        qualified_name: impl Into<String>,
        display_name: impl Into<String>,
        source: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            display_name: display_name.into(),
            source: source.into(),
        }
    }

    /// Returns the path to the test binary.
    pub fn source(&self) -> &Utf8Path {
        &self.source
    }
}

/// The outcome of a single test, as reported by the host.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TestOutcome {
    /// No outcome was reported.
    #[default]
    None,

    /// The test passed.
    Passed,

    /// The test failed.
    Failed,

    /// The test was skipped or ignored.
    Skipped,

    /// The test could not be found.
    NotFound,
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::NotFound => "not found",
        };
        f.write_str(s)
    }
}

/// The result of executing one test.
#[derive(Clone, Debug)]
pub struct TestResult {
    /// The test that was executed.
    pub test_case: TestCaseRef,

    /// The outcome.
    pub outcome: TestOutcome,

    /// When the test started.
    pub start_time: DateTime<FixedOffset>,

    /// When the test finished.
    pub end_time: DateTime<FixedOffset>,

    /// Time taken by the test.
    pub duration: Duration,

    /// Diagnostic messages, in the order they were produced.
    pub messages: Vec<String>,

    /// The error message, if the test reported one.
    pub error_message: Option<String>,

    /// The error stack trace, if the test reported one.
    pub error_stack_trace: Option<String>,

    /// The machine the test ran on. Defaults to the run's machine name.
    pub computer_name: Option<String>,
}

impl TestResult {
    /// Creates a new result with no messages or error information.
    ///
    /// The end time is derived from the start time and duration.
    pub fn new(
        test_case: TestCaseRef,
        outcome: TestOutcome,
        start_time: DateTime<FixedOffset>,
        duration: Duration,
    ) -> Self {
        let end_time = chrono::TimeDelta::from_std(duration)
            .ok()
            .and_then(|delta| start_time.checked_add_signed(delta))
            .unwrap_or(start_time);
        Self {
            test_case,
            outcome,
            start_time,
            end_time,
            duration,
            messages: vec![],
            error_message: None,
            error_stack_trace: None,
            computer_name: None,
        }
    }

    /// Adds a diagnostic message.
    pub fn add_message(&mut self, message: impl Into<String>) -> &mut Self {
        self.messages.push(message.into());
        self
    }

    /// Sets the error message.
    pub fn set_error_message(&mut self, message: impl Into<String>) -> &mut Self {
        self.error_message = Some(message.into());
        self
    }

    /// Sets the error stack trace.
    pub fn set_error_stack_trace(&mut self, stack_trace: impl Into<String>) -> &mut Self {
        self.error_stack_trace = Some(stack_trace.into());
        self
    }

    /// Sets the end time.
    pub fn set_end_time(&mut self, end_time: DateTime<FixedOffset>) -> &mut Self {
        self.end_time = end_time;
        self
    }

    /// Sets the computer name.
    pub fn set_computer_name(&mut self, computer_name: impl Into<String>) -> &mut Self {
        self.computer_name = Some(computer_name.into());
        self
    }

    /// Returns true if this result should be left out of the report.
    ///
    /// Hosts don't distinguish explicitly ignored tests from tests skipped for other reasons.
    /// Explicitly ignored tests carry no messages, so skipped results without messages are
    /// dropped. Skipped results with messages are kept and reported as inconclusive.
    pub fn is_filtered_out(&self) -> bool {
        self.outcome == TestOutcome::Skipped && self.messages.is_empty()
    }
}

/// The severity of an advisory message from the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MessageLevel {
    /// Informational.
    Informational,

    /// A warning.
    Warning,

    /// An error.
    Error,
}

/// How the run ended, delivered with the run-completion notification.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RunCompletion {
    /// True if the run was aborted.
    pub aborted: bool,

    /// True if the run was canceled.
    pub canceled: bool,
}

impl RunCompletion {
    /// A run that finished normally.
    pub const COMPLETED: Self = Self {
        aborted: false,
        canceled: false,
    };
}
