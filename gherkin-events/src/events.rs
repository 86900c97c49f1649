// Copyright (c) The gherkin-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test-run lifecycle events.
//!
//! Events are produced by an execution engine and consumed by reporters
//! such as [`gherkin-junit`](https://docs.rs/gherkin-junit). They are
//! delivered in a single total order consistent with wall-clock occurrence;
//! events for one test case's lifecycle are never interleaved with another
//! case's.

use crate::nodes::{Location, Node};
use chrono::{DateTime, FixedOffset};
use std::{fmt, time::Duration};

/// A test-run lifecycle event.
#[derive(Clone, Debug)]
pub struct TestEvent {
    /// The time at which the event occurred, including the offset from UTC.
    pub timestamp: DateTime<FixedOffset>,

    /// The kind of event this is.
    pub kind: TestEventKind,
}

/// The kind of test event this is.
///
/// Forms part of [`TestEvent`].
#[derive(Clone, Debug)]
pub enum TestEventKind {
    /// The test run started. Always the first event.
    RunStarted,

    /// A source file was parsed into its structural model.
    SourceParsed {
        /// The identifier of the source file.
        uri: String,

        /// The root nodes parsed from the file.
        nodes: Vec<Node>,
    },

    /// A test case is about to execute.
    TestCaseStarted {
        /// The test case being executed.
        test_case: TestCase,
    },

    /// A test step finished executing.
    TestStepFinished {
        /// The step that finished.
        step: TestStep,

        /// The result of the step.
        result: TestResult,
    },

    /// The active test case finished executing.
    TestCaseFinished {
        /// The overall result of the case. This result is authoritative for
        /// the case's status and duration.
        result: TestResult,
    },

    /// The test run finished. Always the last event.
    RunFinished,
}

/// One concrete executable instance of a scenario, including a single
/// instantiation of a templated scenario.
#[derive(Clone, Debug)]
pub struct TestCase {
    /// The identifier of the source file the case comes from.
    pub uri: String,

    /// The location of the scenario or example row within the source file.
    pub location: Location,

    /// The name of the case. Instantiations of the same templated scenario
    /// share a name.
    pub name: String,
}

/// A step executed as part of a test case.
#[derive(Clone, Debug)]
pub enum TestStep {
    /// A step backed by a scenario step line.
    Pickle(PickleStep),

    /// A framework-internal step such as a before or after hook. Hooks do
    /// not appear in reports.
    Hook,
}

/// A scenario step line: keyword plus step text.
#[derive(Clone, Debug)]
pub struct PickleStep {
    /// The step keyword, e.g. `Given `.
    pub keyword: String,

    /// The step text.
    pub text: String,
}

/// The result of a step or of a whole test case.
#[derive(Clone, Debug)]
pub struct TestResult {
    /// The execution status.
    pub status: TestStatus,

    /// The time taken by the step or case.
    pub duration: Duration,

    /// The error captured by the execution engine, if any.
    pub error: Option<TestError>,
}

/// The execution status of a step or test case.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestStatus {
    /// The step or case passed.
    Passed,

    /// The step or case was skipped.
    Skipped,

    /// A step definition exists but is marked as not yet implemented.
    Pending,

    /// No step definition matched the step.
    Undefined,

    /// More than one step definition matched the step.
    Ambiguous,

    /// The step or case failed.
    Failed,
}

impl TestStatus {
    /// The lowercase status name, as rendered in report step listings.
    pub fn as_str(self) -> &'static str {
        match self {
            TestStatus::Passed => "passed",
            TestStatus::Skipped => "skipped",
            TestStatus::Pending => "pending",
            TestStatus::Undefined => "undefined",
            TestStatus::Ambiguous => "ambiguous",
            TestStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error captured by the execution engine for an unsuccessful result.
#[derive(Clone, Debug)]
pub struct TestError {
    /// The concrete error kind, e.g. `AssertionError`.
    pub kind: String,

    /// The error message.
    pub message: String,

    /// The rendered stack trace.
    pub stack_trace: String,
}
