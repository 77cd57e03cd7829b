// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExecutionUuid, RunUuid, SerializeError, TestListUuid, TestUuid, XmlElement,
    build::lower_test_run, serialize::serialize_element,
};
use chrono::{DateTime, FixedOffset};
use std::{fmt, io, time::Duration};

/// The test type GUID that marks a result or definition as a unit test.
pub const UNIT_TEST_TYPE: &str = "13cdc9d9-ddb5-4fa4-a97d-d965ccfc6d4b";

/// The adapter type name recorded on every `TestMethod` element.
pub const UNIT_TEST_ADAPTER_TYPE: &str = "Microsoft.VisualStudio.TestTools.TestTypes.Unit.UnitTestAdapter, Microsoft.VisualStudio.QualityTools.Tmi, Version=10.0.0.0, Culture=neutral, PublicKeyToken=b03f5f7f11d50a3a";

/// The name of the single test list in a report.
pub const DEFAULT_TEST_LIST_NAME: &str = "All Loaded Results";

/// The root element of a TRX report.
#[derive(Clone, Debug)]
pub struct TestRun {
    /// The identifier of this run.
    pub id: RunUuid,

    /// The name of this run, typically `user@machine timestamp`.
    pub name: String,

    /// The user that performed the run, typically `domain\user`.
    pub run_user: String,

    /// One entry per test execution.
    pub results: Vec<UnitTestResult>,

    /// Aggregate outcome and counters.
    pub summary: ResultSummary,

    /// One definition per test execution.
    ///
    /// Definitions are not deduplicated: two results with the same test ID produce two entries.
    pub definitions: Vec<UnitTest>,

    /// Links from executions to tests and test lists.
    pub entries: Vec<TestEntry>,

    /// The test lists. Reports built by this crate have exactly one.
    pub test_lists: Vec<TestList>,

    /// Run timestamps.
    pub times: Times,
}

impl TestRun {
    /// Creates a new, empty `TestRun`.
    pub fn new(
        id: RunUuid,
        name: impl Into<String>,
        run_user: impl Into<String>,
        times: Times,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            run_user: run_user.into(),
            results: vec![],
            summary: ResultSummary::default(),
            definitions: vec![],
            entries: vec![],
            test_lists: vec![],
            times,
        }
    }

    /// Lowers this report into a generic element tree.
    ///
    /// Only the root is placed in the TRX namespace. Call
    /// [`normalize_namespaces`](crate::normalize_namespaces) on the result to move the rest of
    /// the tree into it; [`serialize`](Self::serialize) does that automatically.
    pub fn to_element(&self) -> XmlElement {
        lower_test_run(self)
    }

    /// Lowers, normalizes and serializes this report to the given writer.
    pub fn serialize(&self, writer: impl io::Write) -> Result<(), SerializeError> {
        let mut root = self.to_element();
        crate::normalize_namespaces(&mut root);
        serialize_element(&root, writer)
    }

    /// Serializes this report to a string.
    pub fn to_string(&self) -> Result<String, SerializeError> {
        let mut buf: Vec<u8> = vec![];
        self.serialize(&mut buf)?;
        String::from_utf8(buf)
            .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error).into())
    }
}

/// The outcome of a single test as written to the report.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnitTestOutcome {
    /// The host reported no outcome.
    None,

    /// The test passed.
    Passed,

    /// The test failed.
    Failed,

    /// The test neither passed nor failed, for example because it was skipped.
    Inconclusive,

    /// The test could not be found.
    NotFound,
}

impl UnitTestOutcome {
    /// Returns the string used for the `outcome` attribute.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Passed => "Passed",
            Self::Failed => "Failed",
            Self::Inconclusive => "Inconclusive",
            Self::NotFound => "NotFound",
        }
    }
}

impl fmt::Display for UnitTestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `UnitTestResult` element.
#[derive(Clone, Debug)]
pub struct UnitTestResult {
    /// The execution this result belongs to.
    pub execution_id: ExecutionUuid,

    /// The test this is a result for.
    pub test_id: TestUuid,

    /// The test's display name.
    pub test_name: String,

    /// The machine the test ran on.
    pub computer_name: String,

    /// Time taken by the test.
    pub duration: Duration,

    /// When the test started.
    pub start_time: DateTime<FixedOffset>,

    /// When the test finished.
    pub end_time: DateTime<FixedOffset>,

    /// The outcome.
    pub outcome: UnitTestOutcome,

    /// The test list this result belongs to.
    pub test_list_id: TestListUuid,

    /// Captured messages, joined by newlines.
    pub std_out: Option<String>,

    /// Error details, if the test reported any.
    pub error_info: Option<ErrorInfo>,
}

/// The `ErrorInfo` block of a result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorInfo {
    /// The error message.
    pub message: Option<String>,

    /// The stack trace.
    pub stack_trace: Option<String>,
}

/// Overall outcome of a run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum RunOutcome {
    /// The run completed normally.
    #[default]
    Completed,

    /// The run was aborted.
    Aborted,

    /// The run was canceled.
    Canceled,
}

impl RunOutcome {
    /// Classifies a run from its completion flags. Aborting takes precedence over canceling.
    pub fn from_flags(aborted: bool, canceled: bool) -> Self {
        if aborted {
            Self::Aborted
        } else if canceled {
            Self::Canceled
        } else {
            Self::Completed
        }
    }

    /// Returns the string used for the `outcome` attribute.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Aborted => "Aborted",
            Self::Canceled => "Canceled",
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `ResultSummary` element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultSummary {
    /// Overall outcome.
    pub outcome: RunOutcome,

    /// Aggregate counts.
    pub counters: Counters,
}

/// The `Counters` element.
///
/// Several counters are part of the schema but never populated by the runners this crate targets;
/// they are still written out because consumers expect them to be present.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[expect(missing_docs)]
pub struct Counters {
    pub total: usize,
    pub executed: usize,
    pub passed: usize,
    pub failed: usize,
    pub error: usize,
    pub timeout: usize,
    pub aborted: usize,
    pub inconclusive: usize,
    pub passed_but_run_aborted: usize,
    pub not_runnable: usize,
    pub not_executed: usize,
    pub disconnected: usize,
    pub warning: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub pending: usize,
}

impl Counters {
    /// Returns the counters as `(attribute name, value)` pairs in schema order.
    pub fn attributes(&self) -> [(&'static str, usize); 16] {
        // Use the destructuring syntax to ensure that all fields are handled.
        let Counters {
            total,
            executed,
            passed,
            failed,
            error,
            timeout,
            aborted,
            inconclusive,
            passed_but_run_aborted,
            not_runnable,
            not_executed,
            disconnected,
            warning,
            completed,
            in_progress,
            pending,
        } = *self;
        [
            ("total", total),
            ("executed", executed),
            ("passed", passed),
            ("failed", failed),
            ("error", error),
            ("timeout", timeout),
            ("aborted", aborted),
            ("inconclusive", inconclusive),
            ("passedButRunAborted", passed_but_run_aborted),
            ("notRunnable", not_runnable),
            ("notExecuted", not_executed),
            ("disconnected", disconnected),
            ("warning", warning),
            ("completed", completed),
            ("inProgress", in_progress),
            ("pending", pending),
        ]
    }
}

/// A `UnitTest` element inside `TestDefinitions`.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct UnitTest {
    /// The test identifier.
    pub id: TestUuid,

    /// The display name of the test.
    pub name: String,

    /// Path to the binary the test came from.
    pub storage: String,

    /// Human-readable description.
    pub description: String,

    /// Custom key/value properties.
    pub properties: Vec<Property>,

    /// Category labels.
    pub categories: Vec<String>,

    /// The execution this definition belongs to.
    pub execution_id: ExecutionUuid,

    /// Where the test method lives.
    pub test_method: TestMethod,
}

impl UnitTest {
    /// Creates a new definition with no properties or categories.
    pub fn new(
        id: TestUuid,
        name: impl Into<String>,
        storage: impl Into<String>,
        description: impl Into<String>,
        execution_id: ExecutionUuid,
        test_method: TestMethod,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            storage: storage.into(),
            description: description.into(),
            properties: vec![],
            categories: vec![],
            execution_id,
            test_method,
        }
    }

    /// Adds a property.
    pub fn add_property(&mut self, property: impl Into<Property>) -> &mut Self {
        self.properties.push(property.into());
        self
    }

    /// Adds several properties.
    pub fn add_properties(
        &mut self,
        properties: impl IntoIterator<Item = impl Into<Property>>,
    ) -> &mut Self {
        for property in properties {
            self.add_property(property);
        }
        self
    }

    /// Adds a category label.
    pub fn add_category(&mut self, category: impl Into<String>) -> &mut Self {
        self.categories.push(category.into());
        self
    }
}

/// The `TestMethod` element of a definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestMethod {
    /// Path to the binary containing the method.
    pub code_base: String,

    /// The adapter type. Usually [`UNIT_TEST_ADAPTER_TYPE`].
    pub adapter_type_name: String,

    /// Fully qualified runtime name of the declaring class.
    pub class_name: String,

    /// The method name.
    pub name: String,
}

impl TestMethod {
    /// Creates a new `TestMethod` with the unit test adapter type.
    pub fn new(
        code_base: impl Into<String>,
        class_name: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            code_base: code_base.into(),
            adapter_type_name: UNIT_TEST_ADAPTER_TYPE.to_owned(),
            class_name: class_name.into(),
            name: name.into(),
        }
    }
}

/// Custom key/value metadata declared on a test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    /// The key.
    pub key: String,

    /// The value.
    pub value: String,
}

impl Property {
    /// Creates a new `Property` instance.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl<T> From<(T, T)> for Property
where
    T: Into<String>,
{
    fn from((k, v): (T, T)) -> Self {
        Property::new(k, v)
    }
}

/// A `TestEntry` element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestEntry {
    /// The test identifier.
    pub test_id: TestUuid,

    /// The execution identifier.
    pub execution_id: ExecutionUuid,

    /// The test list identifier.
    pub test_list_id: TestListUuid,
}

/// A `TestList` element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestList {
    /// The name of the list.
    pub name: String,

    /// The identifier of the list.
    pub id: TestListUuid,
}

impl TestList {
    /// Creates a new test list.
    pub fn new(name: impl Into<String>, id: TestListUuid) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

/// The `Times` element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Times {
    /// When the run was created.
    pub creation: DateTime<FixedOffset>,

    /// When the run was queued.
    pub queuing: DateTime<FixedOffset>,

    /// When the run started.
    pub start: DateTime<FixedOffset>,

    /// When the run finished.
    pub finish: DateTime<FixedOffset>,
}

impl Times {
    /// Creates `Times` for a run that was created, queued and started at `start`.
    pub fn new(start: DateTime<FixedOffset>, finish: DateTime<FixedOffset>) -> Self {
        Self {
            creation: start,
            queuing: start,
            start,
            finish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(false, false => RunOutcome::Completed; "neither")]
    #[test_case(false, true => RunOutcome::Canceled; "canceled")]
    #[test_case(true, false => RunOutcome::Aborted; "aborted")]
    #[test_case(true, true => RunOutcome::Aborted; "abort wins over cancel")]
    fn run_outcome_precedence(aborted: bool, canceled: bool) -> RunOutcome {
        RunOutcome::from_flags(aborted, canceled)
    }

    #[test]
    fn counters_are_in_schema_order() {
        let names: Vec<_> = Counters::default()
            .attributes()
            .iter()
            .map(|(name, _)| *name)
            .collect();
        assert_eq!(
            names,
            [
                "total",
                "executed",
                "passed",
                "failed",
                "error",
                "timeout",
                "aborted",
                "inconclusive",
                "passedButRunAborted",
                "notRunnable",
                "notExecuted",
                "disconnected",
                "warning",
                "completed",
                "inProgress",
                "pending",
            ]
        );
    }
}
