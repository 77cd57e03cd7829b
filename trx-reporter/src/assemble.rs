// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assemble a TRX document from the results of a run.
//!
//! Each retained result shows up three times in a TRX document: as a `UnitTestResult`, as a
//! `UnitTest` definition, and as a `TestEntry`. All three share the execution identifier handed
//! out by an [`ExecutionIdCache`] that lives for a single assembly pass.

use crate::{
    config::{HostIdentity, MetadataFailurePolicy},
    errors::ReportError,
    events::{RunCompletion, TestOutcome, TestResult},
    identifier::{ExecutionIdCache, derive_test_id},
    metadata::{MetadataProvider, TestMetadata, split_qualified_name},
};
use chrono::{DateTime, FixedOffset, Local};
use quick_trx::{
    Counters, DEFAULT_TEST_LIST_NAME, ErrorInfo, ResultSummary, RunOutcome, RunUuid, TestEntry,
    TestList, TestListUuid, TestMethod, TestRun, Times, UnitTest, UnitTestOutcome,
    UnitTestResult,
};
use tracing::{debug, info, warn};

/// Information about a run that isn't carried by individual results.
#[derive(Clone, Debug)]
pub struct RunInfo {
    /// The identifier of the run.
    pub run_id: RunUuid,

    /// The identifier of the run's single test list.
    pub test_list_id: TestListUuid,

    /// When the run started.
    pub start_time: DateTime<FixedOffset>,

    /// The user and machine the run is attributed to.
    pub identity: HostIdentity,
}

impl RunInfo {
    /// Creates a new `RunInfo` with fresh run and test list identifiers.
    pub fn new(identity: HostIdentity, start_time: DateTime<FixedOffset>) -> Self {
        Self {
            run_id: RunUuid::new_v4(),
            test_list_id: TestListUuid::new_v4(),
            start_time,
            identity,
        }
    }

    /// Returns the run name: `user@machine yyyy-MM-dd HH:mm:ss`.
    pub fn run_name(&self) -> String {
        format!(
            "{}@{} {}",
            self.identity.user_name,
            self.identity.machine_name,
            self.start_time.format("%Y-%m-%d %H:%M:%S"),
        )
    }
}

/// Maps a host outcome to the outcome written to the report.
///
/// Skipped results that make it into a report are written as inconclusive.
pub fn report_outcome(outcome: TestOutcome) -> UnitTestOutcome {
    match outcome {
        TestOutcome::None => UnitTestOutcome::None,
        TestOutcome::Passed => UnitTestOutcome::Passed,
        TestOutcome::Failed => UnitTestOutcome::Failed,
        TestOutcome::Skipped => UnitTestOutcome::Inconclusive,
        TestOutcome::NotFound => UnitTestOutcome::NotFound,
    }
}

/// Computes the result summary for a set of retained results.
pub fn summarize(results: &[TestResult], completion: RunCompletion) -> ResultSummary {
    let mut counters = Counters {
        total: results.len(),
        ..Default::default()
    };
    for result in results {
        match result.outcome {
            TestOutcome::Passed => counters.passed += 1,
            TestOutcome::Failed => counters.failed += 1,
            TestOutcome::Skipped => {
                counters.inconclusive += 1;
                counters.not_executed += 1;
            }
            TestOutcome::None | TestOutcome::NotFound => counters.inconclusive += 1,
        }
        if result.outcome != TestOutcome::Skipped {
            counters.executed += 1;
        }
    }

    ResultSummary {
        outcome: RunOutcome::from_flags(completion.aborted, completion.canceled),
        counters,
    }
}

/// Builds a [`TestRun`] from retained results.
#[derive(Clone, Debug)]
pub struct ReportAssembler<'a> {
    run: &'a RunInfo,
    completion: RunCompletion,
    metadata_failure: MetadataFailurePolicy,
}

impl<'a> ReportAssembler<'a> {
    /// Creates a new assembler for a run that ended as described by `completion`.
    pub fn new(run: &'a RunInfo, completion: RunCompletion) -> Self {
        Self {
            run,
            completion,
            metadata_failure: MetadataFailurePolicy::default(),
        }
    }

    /// Sets what happens when metadata for a test can't be resolved.
    pub fn set_metadata_failure(&mut self, policy: MetadataFailurePolicy) -> &mut Self {
        self.metadata_failure = policy;
        self
    }

    /// Assembles the report, recording the current time as the finish time.
    pub fn assemble(
        &self,
        results: &[TestResult],
        provider: &mut dyn MetadataProvider,
    ) -> Result<TestRun, ReportError> {
        self.assemble_at(results, provider, Local::now().fixed_offset())
    }

    /// Assembles the report with the given finish time.
    pub fn assemble_at(
        &self,
        results: &[TestResult],
        provider: &mut dyn MetadataProvider,
        finish_time: DateTime<FixedOffset>,
    ) -> Result<TestRun, ReportError> {
        info!(
            results = results.len(),
            run_id = %self.run.run_id,
            "assembling TRX report"
        );

        let mut cx = AssemblyContext {
            run: self.run,
            execution_ids: ExecutionIdCache::new(),
            provider,
            metadata_failure: self.metadata_failure,
        };

        let mut test_run = TestRun::new(
            self.run.run_id,
            self.run.run_name(),
            self.run.identity.run_user(),
            Times::new(self.run.start_time, finish_time),
        );

        for (index, result) in results.iter().enumerate() {
            let unit_test_result = cx.unit_test_result(index, result);
            test_run.results.push(unit_test_result);
        }
        test_run.summary = summarize(results, self.completion);
        for (index, result) in results.iter().enumerate() {
            let unit_test = cx.unit_test(index, result)?;
            test_run.definitions.push(unit_test);
        }
        for (index, result) in results.iter().enumerate() {
            let entry = cx.test_entry(index, result);
            test_run.entries.push(entry);
        }
        test_run
            .test_lists
            .push(TestList::new(DEFAULT_TEST_LIST_NAME, self.run.test_list_id));

        debug!(
            execution_ids = cx.execution_ids.len(),
            "assembled TRX report"
        );
        Ok(test_run)
    }
}

struct AssemblyContext<'a, 'p> {
    run: &'a RunInfo,
    execution_ids: ExecutionIdCache,
    provider: &'p mut dyn MetadataProvider,
    metadata_failure: MetadataFailurePolicy,
}

impl AssemblyContext<'_, '_> {
    fn unit_test_result(&mut self, index: usize, result: &TestResult) -> UnitTestResult {
        let test_case = &result.test_case;
        let std_out = (!result.messages.is_empty()).then(|| result.messages.join("\n"));
        let error_info = (result.error_message.is_some() || result.error_stack_trace.is_some())
            .then(|| ErrorInfo {
                message: result.error_message.clone(),
                stack_trace: result.error_stack_trace.clone(),
            });

        UnitTestResult {
            execution_id: self.execution_ids.get(index),
            test_id: derive_test_id(&test_case.qualified_name),
            test_name: test_case.display_name.clone(),
            computer_name: result
                .computer_name
                .clone()
                .unwrap_or_else(|| self.run.identity.machine_name.clone()),
            duration: result.duration,
            start_time: result.start_time,
            end_time: result.end_time,
            outcome: report_outcome(result.outcome),
            test_list_id: self.run.test_list_id,
            std_out,
            error_info,
        }
    }

    fn unit_test(&mut self, index: usize, result: &TestResult) -> Result<UnitTest, ReportError> {
        let test_case = &result.test_case;
        let metadata = self.resolve_metadata(result)?;
        let method_name = split_qualified_name(&test_case.qualified_name)
            .map(|(_, method_name)| method_name)
            .unwrap_or(&test_case.display_name);

        let mut unit_test = UnitTest::new(
            derive_test_id(&test_case.qualified_name),
            &test_case.display_name,
            test_case.source.as_str(),
            metadata
                .description
                .unwrap_or_else(|| test_case.display_name.clone()),
            self.execution_ids.get(index),
            TestMethod::new(
                test_case.source.as_str(),
                metadata.declaring_type,
                method_name,
            ),
        );
        unit_test.add_properties(metadata.properties);
        for category in metadata.categories {
            unit_test.add_category(category);
        }
        Ok(unit_test)
    }

    fn test_entry(&mut self, index: usize, result: &TestResult) -> TestEntry {
        TestEntry {
            // Entries are keyed by display name, unlike results and definitions.
            test_id: derive_test_id(&result.test_case.display_name),
            execution_id: self.execution_ids.get(index),
            test_list_id: self.run.test_list_id,
        }
    }

    fn resolve_metadata(&mut self, result: &TestResult) -> Result<TestMetadata, ReportError> {
        let test_case = &result.test_case;
        match self.provider.resolve(test_case) {
            Ok(metadata) => Ok(metadata),
            Err(error) => match self.metadata_failure {
                MetadataFailurePolicy::Abort => Err(ReportError::Metadata {
                    qualified_name: test_case.qualified_name.clone(),
                    error,
                }),
                MetadataFailurePolicy::Fallback => {
                    warn!(
                        test = %test_case.qualified_name,
                        %error,
                        "unable to resolve test metadata, using names only"
                    );
                    let declaring_type = split_qualified_name(&test_case.qualified_name)
                        .map(|(class_name, _)| class_name)
                        .unwrap_or(&test_case.qualified_name)
                        .to_owned();
                    Ok(TestMetadata {
                        declaring_type,
                        ..Default::default()
                    })
                }
            },
        }
    }
}
