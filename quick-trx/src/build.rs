// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lower a `TestRun` into an element tree.

use crate::{
    Counters, ErrorInfo, Namespace, ResultSummary, TRX_NAMESPACE, TestEntry, TestList, TestMethod,
    TestRun, Times, UNIT_TEST_TYPE, UnitTest, UnitTestResult, XmlElement,
};
use chrono::{DateTime, FixedOffset, Timelike};
use std::time::Duration;

static TEST_RUN_TAG: &str = "TestRun";
static RESULTS_TAG: &str = "Results";
static UNIT_TEST_RESULT_TAG: &str = "UnitTestResult";
static OUTPUT_TAG: &str = "Output";
static STD_OUT_TAG: &str = "StdOut";
static ERROR_INFO_TAG: &str = "ErrorInfo";
static MESSAGE_TAG: &str = "Message";
static STACK_TRACE_TAG: &str = "StackTrace";
static RESULT_SUMMARY_TAG: &str = "ResultSummary";
static COUNTERS_TAG: &str = "Counters";
static TEST_DEFINITIONS_TAG: &str = "TestDefinitions";
static UNIT_TEST_TAG: &str = "UnitTest";
static DESCRIPTION_TAG: &str = "Description";
static PROPERTIES_TAG: &str = "Properties";
static PROPERTY_TAG: &str = "Property";
static KEY_TAG: &str = "Key";
static VALUE_TAG: &str = "Value";
static TEST_CATEGORY_TAG: &str = "TestCategory";
static TEST_CATEGORY_ITEM_TAG: &str = "TestCategoryItem";
static EXECUTION_TAG: &str = "Execution";
static TEST_METHOD_TAG: &str = "TestMethod";
static TEST_ENTRIES_TAG: &str = "TestEntries";
static TEST_ENTRY_TAG: &str = "TestEntry";
static TEST_LISTS_TAG: &str = "TestLists";
static TEST_LIST_TAG: &str = "TestList";
static TIMES_TAG: &str = "Times";

pub(crate) fn lower_test_run(run: &TestRun) -> XmlElement {
    // Use the destructuring syntax to ensure that all fields are handled.
    let TestRun {
        id,
        name,
        run_user,
        results,
        summary,
        definitions,
        entries,
        test_lists,
        times,
    } = run;

    let mut root = XmlElement::with_namespace(TEST_RUN_TAG, Namespace::uri(TRX_NAMESPACE))
        .attr("id", id.to_string())
        .attr("name", name)
        .attr("runUser", run_user);

    let mut results_el = XmlElement::new(RESULTS_TAG);
    for result in results {
        results_el.push_child(lower_result(result));
    }

    let mut definitions_el = XmlElement::new(TEST_DEFINITIONS_TAG);
    for definition in definitions {
        definitions_el.push_child(lower_unit_test(definition));
    }

    let mut entries_el = XmlElement::new(TEST_ENTRIES_TAG);
    for entry in entries {
        entries_el.push_child(lower_entry(entry));
    }

    let mut lists_el = XmlElement::new(TEST_LISTS_TAG);
    for list in test_lists {
        lists_el.push_child(lower_list(list));
    }

    root.push_child(results_el)
        .push_child(lower_summary(summary))
        .push_child(definitions_el)
        .push_child(entries_el)
        .push_child(lists_el)
        .push_child(lower_times(times));
    root
}

fn lower_result(result: &UnitTestResult) -> XmlElement {
    let UnitTestResult {
        execution_id,
        test_id,
        test_name,
        computer_name,
        duration,
        start_time,
        end_time,
        outcome,
        test_list_id,
        std_out,
        error_info,
    } = result;

    let mut element = XmlElement::new(UNIT_TEST_RESULT_TAG)
        .attr("executionId", execution_id.to_string())
        .attr("testId", test_id.to_string())
        .attr("testName", test_name)
        .attr("computerName", computer_name)
        .attr("duration", format_duration(*duration))
        .attr("startTime", format_timestamp(start_time))
        .attr("endTime", format_timestamp(end_time))
        .attr("testType", UNIT_TEST_TYPE)
        .attr("outcome", outcome.as_str())
        .attr("testListId", test_list_id.to_string())
        .attr("relativeResultsDirectory", execution_id.to_string());

    if std_out.is_some() || error_info.is_some() {
        let mut output = XmlElement::new(OUTPUT_TAG);
        if let Some(std_out) = std_out {
            output.push_child(XmlElement::new(STD_OUT_TAG).text(std_out));
        }
        if let Some(error_info) = error_info {
            output.push_child(lower_error_info(error_info));
        }
        element.push_child(output);
    }

    element
}

fn lower_error_info(error_info: &ErrorInfo) -> XmlElement {
    let mut element = XmlElement::new(ERROR_INFO_TAG);
    if let Some(message) = &error_info.message {
        element.push_child(XmlElement::new(MESSAGE_TAG).text(message));
    }
    if let Some(stack_trace) = &error_info.stack_trace {
        element.push_child(XmlElement::new(STACK_TRACE_TAG).text(stack_trace));
    }
    element
}

fn lower_summary(summary: &ResultSummary) -> XmlElement {
    XmlElement::new(RESULT_SUMMARY_TAG)
        .attr("outcome", summary.outcome.as_str())
        .child(lower_counters(&summary.counters))
}

fn lower_counters(counters: &Counters) -> XmlElement {
    let mut element = XmlElement::new(COUNTERS_TAG);
    for (name, value) in counters.attributes() {
        element.set_attribute(name, value.to_string());
    }
    element
}

fn lower_unit_test(unit_test: &UnitTest) -> XmlElement {
    let UnitTest {
        id,
        name,
        storage,
        description,
        properties,
        categories,
        execution_id,
        test_method,
    } = unit_test;

    let mut element = XmlElement::new(UNIT_TEST_TAG)
        .attr("name", name)
        .attr("storage", storage)
        .attr("id", id.to_string())
        .child(XmlElement::new(DESCRIPTION_TAG).text(description));

    if !properties.is_empty() {
        let mut properties_el = XmlElement::new(PROPERTIES_TAG);
        for property in properties {
            properties_el.push_child(
                XmlElement::new(PROPERTY_TAG)
                    .child(XmlElement::new(KEY_TAG).text(&property.key))
                    .child(XmlElement::new(VALUE_TAG).text(&property.value)),
            );
        }
        element.push_child(properties_el);
    }

    if !categories.is_empty() {
        let mut categories_el = XmlElement::new(TEST_CATEGORY_TAG);
        for category in categories {
            categories_el
                .push_child(XmlElement::new(TEST_CATEGORY_ITEM_TAG).attr("TestCategory", category));
        }
        element.push_child(categories_el);
    }

    element
        .child(XmlElement::new(EXECUTION_TAG).attr("id", execution_id.to_string()))
        .child(lower_test_method(test_method))
}

fn lower_test_method(test_method: &TestMethod) -> XmlElement {
    XmlElement::new(TEST_METHOD_TAG)
        .attr("codeBase", &test_method.code_base)
        .attr("adapterTypeName", &test_method.adapter_type_name)
        .attr("className", &test_method.class_name)
        .attr("name", &test_method.name)
}

fn lower_entry(entry: &TestEntry) -> XmlElement {
    XmlElement::new(TEST_ENTRY_TAG)
        .attr("testId", entry.test_id.to_string())
        .attr("executionId", entry.execution_id.to_string())
        .attr("testListId", entry.test_list_id.to_string())
}

fn lower_list(list: &TestList) -> XmlElement {
    XmlElement::new(TEST_LIST_TAG)
        .attr("name", &list.name)
        .attr("id", list.id.to_string())
}

fn lower_times(times: &Times) -> XmlElement {
    XmlElement::new(TIMES_TAG)
        .attr("creation", format_timestamp(&times.creation))
        .attr("queuing", format_timestamp(&times.queuing))
        .attr("start", format_timestamp(&times.start))
        .attr("finish", format_timestamp(&times.finish))
}

/// Formats a timestamp with 100ns precision and a UTC offset, e.g.
/// `2024-03-01T10:15:30.1234567+01:00`.
pub(crate) fn format_timestamp(timestamp: &DateTime<FixedOffset>) -> String {
    // chrono has no 7-digit fractional specifier, so the ticks are written by hand.
    let ticks = timestamp.nanosecond() % 1_000_000_000 / 100;
    format!(
        "{}.{:07}{}",
        timestamp.format("%Y-%m-%dT%H:%M:%S"),
        ticks,
        timestamp.format("%:z"),
    )
}

/// Formats a duration as `[d.]hh:mm:ss.fffffff`.
pub(crate) fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let days = total_secs / 86_400;
    let hours = total_secs % 86_400 / 3_600;
    let minutes = total_secs % 3_600 / 60;
    let seconds = total_secs % 60;
    let ticks = duration.subsec_nanos() / 100;
    if days > 0 {
        format!("{days}.{hours:02}:{minutes:02}:{seconds:02}.{ticks:07}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}.{ticks:07}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ExecutionUuid, ResultSummary, RunUuid, TestListUuid, TestUuid, UnitTestOutcome,
    };
    use chrono::TimeZone;
    use test_case::test_case;

    #[test_case(Duration::ZERO => "00:00:00.0000000"; "zero")]
    #[test_case(Duration::from_millis(4242) => "00:00:04.2420000"; "millis")]
    #[test_case(Duration::new(3_723, 123_456_789) => "01:02:03.1234567"; "sub-tick truncated")]
    #[test_case(Duration::from_secs(90_061) => "1.01:01:01.0000000"; "more than a day")]
    fn duration_format(duration: Duration) -> String {
        format_duration(duration)
    }

    #[test]
    fn timestamp_format() {
        let offset = FixedOffset::east_opt(2 * 3600).expect("valid offset");
        let timestamp = offset
            .with_ymd_and_hms(2024, 3, 1, 10, 15, 30)
            .single()
            .expect("unambiguous")
            + chrono::Duration::nanoseconds(123_456_789);
        assert_eq!(
            format_timestamp(&timestamp),
            "2024-03-01T10:15:30.1234567+02:00"
        );
    }

    fn sample_run() -> TestRun {
        let start = FixedOffset::east_opt(0)
            .expect("valid offset")
            .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
            .single()
            .expect("unambiguous");
        let list_id = TestListUuid::new_v4();
        let execution_id = ExecutionUuid::new_v4();
        let test_id = TestUuid::new_v4();

        let mut run = TestRun::new(RunUuid::new_v4(), "me@box", "BOX\\me", Times::new(start, start));
        run.results.push(UnitTestResult {
            execution_id,
            test_id,
            test_name: "TestOne".to_owned(),
            computer_name: "box".to_owned(),
            duration: Duration::from_millis(5),
            start_time: start,
            end_time: start,
            outcome: UnitTestOutcome::Failed,
            test_list_id: list_id,
            std_out: None,
            error_info: Some(ErrorInfo {
                message: Some("boom".to_owned()),
                stack_trace: None,
            }),
        });
        run.summary = ResultSummary::default();
        let mut definition = UnitTest::new(
            test_id,
            "TestOne",
            "/tmp/suite.dll",
            "does things",
            execution_id,
            TestMethod::new("/tmp/suite.dll", "Suite.ClassA", "TestOne"),
        );
        definition.add_property(("owner", "ci")).add_category("Fast");
        run.definitions.push(definition);
        run.entries.push(TestEntry {
            test_id,
            execution_id,
            test_list_id: list_id,
        });
        run.test_lists.push(TestList::new("All Loaded Results", list_id));
        run
    }

    #[test]
    fn sections_are_in_schema_order() {
        let root = sample_run().to_element();
        let names: Vec<_> = root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Results",
                "ResultSummary",
                "TestDefinitions",
                "TestEntries",
                "TestLists",
                "Times"
            ]
        );
        assert_eq!(root.namespace, Namespace::uri(TRX_NAMESPACE));
        assert!(
            root.children.iter().all(|c| c.namespace.is_none()),
            "lowering leaves sections unscoped until normalization"
        );
    }

    #[test]
    fn output_only_contains_present_parts() {
        let root = sample_run().to_element();
        let result = &root.children[0].children[0];
        let output = result.find_child("Output").expect("output present");
        assert!(output.find_child("StdOut").is_none());
        let error_info = output.find_child("ErrorInfo").expect("error info present");
        assert_eq!(
            error_info.find_child("Message").and_then(|m| m.text.as_deref()),
            Some("boom")
        );
        assert!(error_info.find_child("StackTrace").is_none());
    }

    #[test]
    fn definition_children_are_ordered() {
        let root = sample_run().to_element();
        let unit_test = &root.children[2].children[0];
        let names: Vec<_> = unit_test.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Description",
                "Properties",
                "TestCategory",
                "Execution",
                "TestMethod"
            ]
        );
        let method = unit_test.find_child("TestMethod").expect("method present");
        assert_eq!(method.attribute("className"), Some("Suite.ClassA"));
        assert_eq!(
            method.attribute("adapterTypeName"),
            Some(crate::UNIT_TEST_ADAPTER_TYPE)
        );
    }
}
