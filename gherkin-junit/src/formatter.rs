// Copyright (c) The gherkin-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JUnit report generation driven by test-run events.
//!
//! The main type here is [`JunitFormatter`], which consumes
//! [`TestEvent`]s and, when the run finishes, serializes a JUnit XML
//! document to its output destination.

use crate::{
    errors::WriteEventError,
    report,
    report::{Output, Report, TestCaseStatus},
};
use camino::Utf8Path;
use chrono::{DateTime, FixedOffset};
use gherkin_events::{
    find_path_to, Node, PickleStep, TestCase, TestError, TestEvent, TestEventKind, TestResult,
    TestStatus, TestStep,
};
use std::{collections::HashMap, fs::File, io};

/// The fixed `name` attribute written onto the report root.
const REPORT_NAME: &str = "gherkin_junit::JunitFormatter";

/// Classification label for cases whose source was never parsed or whose
/// location cannot be resolved.
const UNKNOWN_CLASSNAME: &str = "Unknown";

/// Failure type reported when no concrete error kind is available.
const GENERIC_FAILURE_TYPE: &str = "Exception";

/// Minimum width of a step line before its status suffix.
const STEP_LINE_WIDTH: usize = 76;

/// Converts a stream of test-run lifecycle events into a JUnit XML
/// document.
///
/// Events must be delivered in a single total order, with at most one test
/// case open at a time. If the execution engine runs cases in parallel,
/// the event-delivery layer is responsible for serializing delivery; the
/// formatter performs no locking and never blocks.
///
/// The output destination is owned by the formatter and released exactly
/// once, when the run-finished event is handled. Events received after
/// that are ignored.
#[derive(Debug)]
pub struct JunitFormatter<W> {
    out: Option<W>,
    state: RunState,
    report: Report,
    parsed_sources: HashMap<String, Vec<Node>>,
    started: Option<DateTime<FixedOffset>>,
    open_case: Option<OpenCase>,
    current_uri: Option<String>,
    previous_case_name: Option<String>,
    example_number: usize,
}

/// Lifecycle of the formatter. `Done` is terminal: the output has been
/// released and no further events are accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RunState {
    Idle,
    Running,
    Done,
}

impl JunitFormatter<File> {
    /// Creates a formatter writing to the file at `path`, creating parent
    /// directories as needed.
    pub fn from_path(path: impl AsRef<Utf8Path>) -> Result<Self, WriteEventError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|error| WriteEventError::Fs {
                file: parent.to_path_buf(),
                error,
            })?;
        }
        let file = File::create(path).map_err(|error| WriteEventError::Fs {
            file: path.to_path_buf(),
            error,
        })?;
        Ok(Self::new(file))
    }
}

impl<W: io::Write> JunitFormatter<W> {
    /// Creates a formatter writing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out: Some(out),
            state: RunState::Idle,
            report: Report::new(REPORT_NAME),
            parsed_sources: HashMap::new(),
            started: None,
            open_case: None,
            current_uri: None,
            previous_case_name: None,
            example_number: 0,
        }
    }

    /// Handles one test-run lifecycle event.
    ///
    /// Every event is a synchronous in-memory update except run-finished,
    /// which serializes the document and releases the output. Serialization
    /// failure is the only error surfaced from event handling.
    pub fn handle_event(&mut self, event: TestEvent) -> Result<(), WriteEventError> {
        if self.state == RunState::Done {
            // The output has already been released.
            tracing::debug!("ignoring event received after the run finished");
            return Ok(());
        }
        let timestamp = event.timestamp;
        match event.kind {
            TestEventKind::RunStarted => self.handle_run_started(timestamp),
            TestEventKind::SourceParsed { uri, nodes } => self.handle_source_parsed(uri, nodes),
            TestEventKind::TestCaseStarted { test_case } => {
                self.handle_test_case_started(test_case)
            }
            TestEventKind::TestStepFinished { step, result } => {
                self.handle_test_step_finished(step, result)
            }
            TestEventKind::TestCaseFinished { result } => self.handle_test_case_finished(result),
            TestEventKind::RunFinished => return self.handle_run_finished(timestamp),
        }
        Ok(())
    }

    fn handle_run_started(&mut self, timestamp: DateTime<FixedOffset>) {
        self.started = Some(timestamp);
        self.report = Report::new(REPORT_NAME);
        self.state = RunState::Running;
    }

    fn handle_source_parsed(&mut self, uri: String, nodes: Vec<Node>) {
        // Last write wins if the same file is parsed twice.
        self.parsed_sources.insert(uri, nodes);
    }

    fn handle_test_case_started(&mut self, test_case: TestCase) {
        if self.current_uri.as_deref() != Some(test_case.uri.as_str()) {
            self.current_uri = Some(test_case.uri.clone());
            self.previous_case_name = None;
            self.example_number = 1;
        }
        let display_name = self.display_name_for(&test_case.name);
        if self.open_case.is_some() {
            // The upstream publisher guarantees at most one open case.
            tracing::warn!(
                name = %test_case.name,
                "test case started while another case was still open"
            );
        }
        self.open_case = Some(OpenCase {
            display_name,
            identity: test_case,
            steps: Vec::new(),
            results: Vec::new(),
        });
    }

    /// Disambiguates repeated case names, as produced by templated
    /// scenarios: repeats of the previous case's name get a per-file
    /// counter suffix so each entry in the flat report stays unique.
    fn display_name_for(&mut self, case_name: &str) -> String {
        if self.previous_case_name.as_deref() == Some(case_name) {
            self.example_number += 1;
            unique_case_name(case_name, self.example_number)
        } else {
            self.previous_case_name = Some(case_name.to_owned());
            self.example_number = 1;
            case_name.to_owned()
        }
    }

    fn handle_test_step_finished(&mut self, step: TestStep, result: TestResult) {
        let Some(open_case) = &mut self.open_case else {
            return;
        };
        // Hooks and other non-pickle steps do not appear in the listing.
        if let TestStep::Pickle(step) = step {
            open_case.steps.push(step);
            open_case.results.push(result);
        }
    }

    fn handle_test_case_finished(&mut self, result: TestResult) {
        let Some(open_case) = self.open_case.take() else {
            tracing::warn!("test case finished without a matching start");
            return;
        };
        let classname = self.find_root_node_name(&open_case.identity);
        let test_case = open_case.into_report_case(classname, &result);
        self.report.add_test_case(test_case);
    }

    fn handle_run_finished(
        &mut self,
        timestamp: DateTime<FixedOffset>,
    ) -> Result<(), WriteEventError> {
        let elapsed = self
            .started
            .map(|started| (timestamp - started).to_std().unwrap_or_default())
            .unwrap_or_default();
        self.report.set_time(elapsed);
        self.state = RunState::Done;

        // Release the output exactly once, whether or not serialization
        // succeeds. Flush failures at this point no longer affect the
        // run's outcome and are swallowed.
        let Some(mut out) = self.out.take() else {
            return Ok(());
        };
        let result = self.report.serialize(&mut out);
        if let Err(error) = out.flush() {
            tracing::warn!(%error, "failed to flush JUnit report output");
        }
        result.map_err(WriteEventError::Junit)
    }

    /// Resolves the name of the top-level source node containing the test
    /// case: the first element of the path from a parsed root down to the
    /// node with the case's location. Degrades to a sentinel label when the
    /// source was never parsed, the location is unknown, or the resolved
    /// root has no name.
    fn find_root_node_name(&self, identity: &TestCase) -> String {
        let location = identity.location;
        let resolved = self
            .parsed_sources
            .get(&identity.uri)
            .and_then(|nodes| find_path_to(nodes, |candidate| candidate.location() == location))
            .and_then(|path| path.first().and_then(|root| root.name()).map(str::to_owned));
        match resolved {
            Some(name) => name,
            None => {
                tracing::debug!(
                    uri = %identity.uri,
                    "test case could not be resolved to a named source node"
                );
                UNKNOWN_CLASSNAME.to_owned()
            }
        }
    }
}

/// Accumulated state for the currently open test case.
#[derive(Debug)]
struct OpenCase {
    identity: TestCase,
    display_name: String,
    steps: Vec<PickleStep>,
    results: Vec<TestResult>,
}

impl OpenCase {
    /// Closes the case into a report element, classified by the finishing
    /// result.
    ///
    /// The finishing result is authoritative for the case's status and
    /// duration, independently of the accumulated per-step statuses.
    fn into_report_case(self, classname: String, finish: &TestResult) -> report::TestCase {
        let status = if self.steps.is_empty() {
            // Guarantee a diagnosable entry even when the executor aborted
            // before any step ran.
            TestCaseStatus::Failure {
                message: "The scenario has no steps".to_owned(),
                ty: GENERIC_FAILURE_TYPE.to_owned(),
                output: Output::new(""),
            }
        } else {
            self.classify(finish)
        };
        let mut test_case = report::TestCase::new(self.display_name, status);
        test_case.set_classname(classname).set_time(finish.duration);
        test_case
    }

    fn classify(&self, finish: &TestResult) -> TestCaseStatus {
        let mut listing = self.step_listing();
        match finish.status {
            TestStatus::Failed | TestStatus::Ambiguous => {
                let (message, ty) = match &finish.error {
                    Some(error) => {
                        append_stack_trace(&mut listing, error);
                        (error.message.clone(), error.kind.clone())
                    }
                    None => (String::new(), GENERIC_FAILURE_TYPE.to_owned()),
                };
                TestCaseStatus::Failure {
                    message,
                    ty,
                    output: Output::new(listing),
                }
            }
            TestStatus::Pending | TestStatus::Undefined => TestCaseStatus::Failure {
                message: "The scenario has pending or undefined step(s)".to_owned(),
                ty: finish
                    .error
                    .as_ref()
                    .map(|error| error.kind.clone())
                    .unwrap_or_else(|| GENERIC_FAILURE_TYPE.to_owned()),
                output: Output::new(listing),
            },
            TestStatus::Skipped => match &finish.error {
                Some(error) => {
                    append_stack_trace(&mut listing, error);
                    TestCaseStatus::Skipped {
                        message: error.stack_trace.clone(),
                        output: Output::new(listing),
                    }
                }
                None => TestCaseStatus::Success {
                    output: Output::new(listing),
                },
            },
            TestStatus::Passed => TestCaseStatus::Success {
                output: Output::new(listing),
            },
        }
    }

    /// Builds the aligned step listing: keyword plus step text, padded with
    /// `.` to a minimum width, followed by the lowercase result status.
    /// Steps without a recorded result read `not executed`.
    fn step_listing(&self) -> String {
        let mut listing = String::new();
        for (index, step) in self.steps.iter().enumerate() {
            let mut width = 0;
            for part in [step.keyword.as_str(), step.text.as_str()] {
                listing.push_str(part);
                width += part.chars().count();
            }
            // At least one fill character, even for overlong step text.
            loop {
                listing.push('.');
                width += 1;
                if width >= STEP_LINE_WIDTH {
                    break;
                }
            }
            match self.results.get(index) {
                Some(result) => listing.push_str(result.status.as_str()),
                None => listing.push_str("not executed"),
            }
            listing.push('\n');
        }
        listing
    }
}

fn append_stack_trace(listing: &mut String, error: &TestError) {
    listing.push_str("\nStackTrace:\n");
    listing.push_str(&error.stack_trace);
}

/// `name 2` when the name contains a space, `name_2` otherwise.
fn unique_case_name(case_name: &str, example_number: usize) -> String {
    let separator = if case_name.contains(' ') { ' ' } else { '_' };
    format!("{case_name}{separator}{example_number}")
}
