// Copyright (c) The gherkin-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests: event streams in, serialized XML out.

use chrono::{DateTime, FixedOffset};
use gherkin_events::{
    Example, Examples, Feature, Location, Node, PickleStep, Scenario, ScenarioOutline, TestCase,
    TestError, TestEvent, TestEventKind, TestResult, TestStatus, TestStep,
};
use gherkin_junit::JunitFormatter;
use std::time::Duration;

fn ts(timestamp: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(timestamp).expect("valid RFC 3339 timestamp")
}

fn event(timestamp: &str, kind: TestEventKind) -> TestEvent {
    TestEvent {
        timestamp: ts(timestamp),
        kind,
    }
}

fn result(status: TestStatus, millis: u64) -> TestResult {
    TestResult {
        status,
        duration: Duration::from_millis(millis),
        error: None,
    }
}

fn step(keyword: &str, text: &str) -> TestStep {
    TestStep::Pickle(PickleStep {
        keyword: keyword.to_owned(),
        text: text.to_owned(),
    })
}

fn test_case(uri: &str, line: u32, name: &str) -> TestCase {
    TestCase {
        uri: uri.to_owned(),
        location: Location::new(line, 3),
        name: name.to_owned(),
    }
}

fn scenario(line: u32, name: &str) -> Node {
    Node::Scenario(Scenario {
        location: Location::new(line, 3),
        keyword: Some("Scenario".to_owned()),
        name: Some(name.to_owned()),
    })
}

fn feature(name: &str, children: Vec<Node>) -> Vec<Node> {
    vec![Node::Feature(Feature {
        location: Location::new(1, 1),
        keyword: Some("Feature".to_owned()),
        name: Some(name.to_owned()),
        children,
    })]
}

/// A feature holding one scenario outline whose example rows sit at the
/// given lines.
fn outline_feature(feature_name: &str, outline_name: &str, example_lines: &[u32]) -> Vec<Node> {
    let examples = example_lines
        .iter()
        .map(|line| Example {
            location: Location::new(*line, 3),
            name: Some(format!("Example #{line}")),
        })
        .collect();
    feature(
        feature_name,
        vec![Node::ScenarioOutline(ScenarioOutline {
            location: Location::new(3, 3),
            keyword: Some("Scenario Outline".to_owned()),
            name: Some(outline_name.to_owned()),
            examples: vec![Examples {
                location: Location::new(6, 5),
                keyword: Some("Examples".to_owned()),
                name: None,
                examples,
            }],
        })],
    )
}

fn run_events(events: Vec<TestEvent>) -> String {
    let mut buf: Vec<u8> = Vec::new();
    {
        let mut formatter = JunitFormatter::new(&mut buf);
        for event in events {
            formatter.handle_event(event).expect("event handled");
        }
    }
    String::from_utf8(buf).expect("report is UTF-8")
}

#[test]
fn end_to_end_totals_and_order() {
    let uri = "file:///features/eating.feature";
    let nodes = feature(
        "Eating fruit",
        vec![scenario(3, "Eat an apple"), scenario(5, "Eat a pear")],
    );

    let failure = TestResult {
        status: TestStatus::Failed,
        duration: Duration::from_millis(200),
        error: Some(TestError {
            kind: "AssertionError".to_owned(),
            message: "pear was sour".to_owned(),
            stack_trace: "at eat_pear()".to_owned(),
        }),
    };

    let xml = run_events(vec![
        event("2024-05-01T12:00:00+00:00", TestEventKind::RunStarted),
        event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::SourceParsed {
                uri: uri.to_owned(),
                nodes,
            },
        ),
        event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::TestCaseStarted {
                test_case: test_case(uri, 3, "Eat an apple"),
            },
        ),
        event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::TestStepFinished {
                step: step("Given ", "I have an apple"),
                result: result(TestStatus::Passed, 100),
            },
        ),
        event(
            "2024-05-01T12:00:01+00:00",
            TestEventKind::TestStepFinished {
                step: step("When ", "I eat it"),
                result: result(TestStatus::Passed, 100),
            },
        ),
        event(
            "2024-05-01T12:00:01+00:00",
            TestEventKind::TestCaseFinished {
                result: result(TestStatus::Passed, 1500),
            },
        ),
        event(
            "2024-05-01T12:00:01+00:00",
            TestEventKind::TestCaseStarted {
                test_case: test_case(uri, 5, "Eat a pear"),
            },
        ),
        event(
            "2024-05-01T12:00:02+00:00",
            TestEventKind::TestStepFinished {
                step: step("Given ", "I have a pear"),
                result: result(TestStatus::Passed, 100),
            },
        ),
        event(
            "2024-05-01T12:00:02+00:00",
            TestEventKind::TestCaseFinished { result: failure },
        ),
        event("2024-05-01T12:00:02.500+00:00", TestEventKind::RunFinished),
    ]);

    // Run-level totals and overall duration.
    assert!(xml.contains(
        "name=\"gherkin_junit::JunitFormatter\" tests=\"2\" failures=\"1\" skipped=\"0\" \
         errors=\"0\" time=\"2.5\""
    ));

    // Per-case attributes, classified by the top-level feature name.
    assert!(xml.contains("classname=\"Eating fruit\" name=\"Eat an apple\" time=\"1.5\""));
    assert!(xml.contains("classname=\"Eating fruit\" name=\"Eat a pear\" time=\"0.2\""));

    // Cases appear in finish order.
    let apple = xml.find("Eat an apple").expect("first case present");
    let pear = xml.find("Eat a pear").expect("second case present");
    assert!(apple < pear);

    // The step listing is padded to the fixed minimum width.
    let padded = format!("Given I have an apple{}passed\n", ".".repeat(55));
    assert!(xml.contains(&padded));

    // The failing case carries the error's message, kind and stack trace.
    assert!(xml.contains("message=\"pear was sour\""));
    assert!(xml.contains("type=\"AssertionError\""));
    assert!(xml.contains("\nStackTrace:\nat eat_pear()"));
}

#[test]
fn repeated_case_names_get_numbered() {
    let uri = "file:///features/eating.feature";
    let nodes = outline_feature("Eating fruit", "Eat <fruit>", &[8, 9, 10]);

    let mut events = vec![
        event("2024-05-01T12:00:00+00:00", TestEventKind::RunStarted),
        event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::SourceParsed {
                uri: uri.to_owned(),
                nodes,
            },
        ),
    ];
    for line in [8, 9, 10] {
        events.push(event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::TestCaseStarted {
                test_case: test_case(uri, line, "Eat <fruit>"),
            },
        ));
        events.push(event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::TestStepFinished {
                step: step("Given ", "a fruit"),
                result: result(TestStatus::Passed, 10),
            },
        ));
        events.push(event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::TestCaseFinished {
                result: result(TestStatus::Passed, 10),
            },
        ));
    }
    events.push(event("2024-05-01T12:00:01+00:00", TestEventKind::RunFinished));

    let xml = run_events(events);

    // Space-separated counter, since the base name contains a space.
    assert!(xml.contains("name=\"Eat &lt;fruit&gt;\""));
    assert!(xml.contains("name=\"Eat &lt;fruit&gt; 2\""));
    assert!(xml.contains("name=\"Eat &lt;fruit&gt; 3\""));

    // Every instantiation resolves to the same top-level feature.
    assert_eq!(xml.matches("classname=\"Eating fruit\"").count(), 3);
}

#[test]
fn name_counter_resets_per_source_file() {
    let first_uri = "file:///features/first.feature";
    let second_uri = "file:///features/second.feature";

    let mut events = vec![event("2024-05-01T12:00:00+00:00", TestEventKind::RunStarted)];
    for uri in [first_uri, second_uri] {
        events.push(event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::SourceParsed {
                uri: uri.to_owned(),
                nodes: feature("eating", vec![scenario(3, "eating"), scenario(5, "eating")]),
            },
        ));
        for line in [3, 5] {
            events.push(event(
                "2024-05-01T12:00:00+00:00",
                TestEventKind::TestCaseStarted {
                    test_case: test_case(uri, line, "eating"),
                },
            ));
            events.push(event(
                "2024-05-01T12:00:00+00:00",
                TestEventKind::TestStepFinished {
                    step: step("Given ", "food"),
                    result: result(TestStatus::Passed, 10),
                },
            ));
            events.push(event(
                "2024-05-01T12:00:00+00:00",
                TestEventKind::TestCaseFinished {
                    result: result(TestStatus::Passed, 10),
                },
            ));
        }
    }
    events.push(event("2024-05-01T12:00:01+00:00", TestEventKind::RunFinished));

    let xml = run_events(events);

    // Underscore separator, since the base name has no space; the counter
    // starts over in the second file. The leading space keeps these from
    // also matching classname attributes.
    assert_eq!(xml.matches(" name=\"eating\"").count(), 2);
    assert_eq!(xml.matches(" name=\"eating_2\"").count(), 2);
    assert!(!xml.contains("name=\"eating_3\""));
}

#[test]
fn case_without_steps_reports_fixed_failure() {
    let uri = "file:///features/eating.feature";
    let xml = run_events(vec![
        event("2024-05-01T12:00:00+00:00", TestEventKind::RunStarted),
        event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::SourceParsed {
                uri: uri.to_owned(),
                nodes: feature("Eating fruit", vec![scenario(3, "Eat an apple")]),
            },
        ),
        event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::TestCaseStarted {
                test_case: test_case(uri, 3, "Eat an apple"),
            },
        ),
        // The finishing result reads passed; the empty case still fails.
        event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::TestCaseFinished {
                result: result(TestStatus::Passed, 10),
            },
        ),
        event("2024-05-01T12:00:01+00:00", TestEventKind::RunFinished),
    ]);

    assert!(xml.contains("message=\"The scenario has no steps\""));
    assert!(xml.contains("type=\"Exception\""));
    assert!(xml.contains("failures=\"1\""));
}

#[test]
fn skipped_case_with_error_reports_skipped_element() {
    let uri = "file:///features/eating.feature";
    let skip = TestResult {
        status: TestStatus::Skipped,
        duration: Duration::from_millis(10),
        error: Some(TestError {
            kind: "HookError".to_owned(),
            message: "before hook failed".to_owned(),
            stack_trace: "at before_hook()".to_owned(),
        }),
    };

    let xml = run_events(vec![
        event("2024-05-01T12:00:00+00:00", TestEventKind::RunStarted),
        event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::TestCaseStarted {
                test_case: test_case(uri, 3, "Eat an apple"),
            },
        ),
        event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::TestStepFinished {
                step: step("Given ", "an apple"),
                result: result(TestStatus::Skipped, 0),
            },
        ),
        event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::TestCaseFinished { result: skip },
        ),
        event("2024-05-01T12:00:01+00:00", TestEventKind::RunFinished),
    ]);

    // The skip message is the stack-trace rendering itself.
    assert!(xml.contains("<skipped message=\"at before_hook()\">"));
    assert!(xml.contains("\nStackTrace:\nat before_hook()"));
    assert!(xml.contains("skipped=\"1\""));
    assert!(xml.contains("failures=\"0\""));
}

#[test]
fn skipped_case_without_error_reports_system_out() {
    let uri = "file:///features/eating.feature";
    let xml = run_events(vec![
        event("2024-05-01T12:00:00+00:00", TestEventKind::RunStarted),
        event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::TestCaseStarted {
                test_case: test_case(uri, 3, "Eat an apple"),
            },
        ),
        event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::TestStepFinished {
                step: step("Given ", "an apple"),
                result: result(TestStatus::Skipped, 0),
            },
        ),
        event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::TestCaseFinished {
                result: result(TestStatus::Skipped, 10),
            },
        ),
        event("2024-05-01T12:00:01+00:00", TestEventKind::RunFinished),
    ]);

    // Without an error, a skipped finish reads as an uneventful case: the
    // listing goes into a system-out child and no counter moves.
    assert!(xml.contains("<system-out>"));
    assert!(!xml.contains("<skipped"));
    assert!(!xml.contains("<failure"));
    assert!(xml.contains("skipped=\"0\""));
    assert!(xml.contains("failures=\"0\""));
    // The step itself still reads skipped in the listing.
    assert!(xml.contains("skipped\n"));
}

#[test]
fn pending_case_reports_fixed_failure_message() {
    let uri = "file:///features/eating.feature";
    let xml = run_events(vec![
        event("2024-05-01T12:00:00+00:00", TestEventKind::RunStarted),
        event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::TestCaseStarted {
                test_case: test_case(uri, 3, "Eat an apple"),
            },
        ),
        event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::TestStepFinished {
                step: step("Given ", "an apple"),
                result: result(TestStatus::Pending, 10),
            },
        ),
        event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::TestCaseFinished {
                result: result(TestStatus::Pending, 10),
            },
        ),
        event("2024-05-01T12:00:01+00:00", TestEventKind::RunFinished),
    ]);

    assert!(xml.contains("message=\"The scenario has pending or undefined step(s)\""));
    assert!(xml.contains("type=\"Exception\""));
    // The step itself reads pending in the listing.
    assert!(xml.contains("pending\n"));
}

#[test]
fn unresolved_source_uses_sentinel_classname() {
    // No SourceParsed event for this uri.
    let xml = run_events(vec![
        event("2024-05-01T12:00:00+00:00", TestEventKind::RunStarted),
        event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::TestCaseStarted {
                test_case: test_case("file:///features/missing.feature", 3, "Eat an apple"),
            },
        ),
        event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::TestStepFinished {
                step: step("Given ", "an apple"),
                result: result(TestStatus::Passed, 10),
            },
        ),
        event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::TestCaseFinished {
                result: result(TestStatus::Passed, 10),
            },
        ),
        event("2024-05-01T12:00:01+00:00", TestEventKind::RunFinished),
    ]);

    assert!(xml.contains("classname=\"Unknown\" name=\"Eat an apple\""));
}

#[test]
fn hook_steps_are_ignored() {
    let uri = "file:///features/eating.feature";
    let xml = run_events(vec![
        event("2024-05-01T12:00:00+00:00", TestEventKind::RunStarted),
        event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::TestCaseStarted {
                test_case: test_case(uri, 3, "Eat an apple"),
            },
        ),
        event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::TestStepFinished {
                step: TestStep::Hook,
                result: result(TestStatus::Passed, 5),
            },
        ),
        event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::TestStepFinished {
                step: step("Given ", "an apple"),
                result: result(TestStatus::Passed, 10),
            },
        ),
        event(
            "2024-05-01T12:00:00+00:00",
            TestEventKind::TestCaseFinished {
                result: result(TestStatus::Passed, 10),
            },
        ),
        event("2024-05-01T12:00:01+00:00", TestEventKind::RunFinished),
    ]);

    // Only the pickle step appears in the listing.
    let listing_start = xml.find("<![CDATA[").expect("listing present");
    let listing_end = xml.find("]]>").expect("listing terminated");
    let listing = &xml[listing_start..listing_end];
    assert_eq!(listing.matches('\n').count(), 1);
    assert!(listing.contains("Given an apple"));
}

#[test]
fn events_after_run_finished_are_ignored() {
    let uri = "file:///features/eating.feature";
    let mut buf: Vec<u8> = Vec::new();
    {
        let mut formatter = JunitFormatter::new(&mut buf);
        for event in [
            event("2024-05-01T12:00:00+00:00", TestEventKind::RunStarted),
            event("2024-05-01T12:00:01+00:00", TestEventKind::RunFinished),
        ] {
            formatter.handle_event(event).expect("event handled");
        }

        // The run is over; further events must be absorbed without error.
        formatter
            .handle_event(event(
                "2024-05-01T12:00:02+00:00",
                TestEventKind::TestCaseStarted {
                    test_case: test_case(uri, 3, "Eat an apple"),
                },
            ))
            .expect("late event absorbed");
        formatter
            .handle_event(event("2024-05-01T12:00:03+00:00", TestEventKind::RunFinished))
            .expect("late event absorbed");
    }

    let xml = String::from_utf8(buf).expect("report is UTF-8");
    assert_eq!(xml.matches("<?xml").count(), 1);
    assert!(xml.contains("tests=\"0\""));
    assert!(xml.contains("time=\"1\""));
}
