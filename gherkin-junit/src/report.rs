// Copyright (c) The gherkin-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{errors::SerializeError, serialize::serialize_report};
use std::{io, time::Duration};

/// The root element of a JUnit report: a single `testsuite`.
#[derive(Clone, Debug)]
pub struct Report {
    /// The name of this report.
    pub name: String,

    /// The overall time taken by the run.
    ///
    /// This is serialized as the number of seconds.
    pub time: Option<Duration>,

    /// The total number of test cases.
    pub tests: usize,

    /// The number of test cases that failed.
    pub failures: usize,

    /// The number of test cases that were skipped.
    pub skipped: usize,

    /// The number of test cases that errored. Always 0 for this engine;
    /// unsuccessful cases are reported as failures.
    pub errors: usize,

    /// The test cases, in the order they finished.
    pub test_cases: Vec<TestCase>,
}

impl Report {
    /// Creates a new `Report` with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time: None,
            tests: 0,
            failures: 0,
            skipped: 0,
            errors: 0,
            test_cases: vec![],
        }
    }

    /// Sets the time taken for overall execution.
    pub fn set_time(&mut self, time: Duration) -> &mut Self {
        self.time = Some(time);
        self
    }

    /// Adds a test case and updates the `tests`, `failures` and `skipped`
    /// counts.
    ///
    /// When generating a new report, use of this method is recommended over
    /// adding to `self.test_cases` directly.
    pub fn add_test_case(&mut self, test_case: TestCase) -> &mut Self {
        self.tests += 1;
        match &test_case.status {
            TestCaseStatus::Success { .. } => {}
            TestCaseStatus::Failure { .. } => self.failures += 1,
            TestCaseStatus::Skipped { .. } => self.skipped += 1,
        }
        self.test_cases.push(test_case);
        self
    }

    /// Serialize this report to the given writer.
    pub fn serialize(&self, writer: impl io::Write) -> Result<(), SerializeError> {
        serialize_report(self, writer)
    }

    /// Serialize this report to a string.
    pub fn to_string(&self) -> Result<String, SerializeError> {
        let mut buf: Vec<u8> = vec![];
        self.serialize(&mut buf)?;
        // The serializer only ever emits UTF-8.
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// A single reported test case.
#[derive(Clone, Debug)]
pub struct TestCase {
    /// The classification label: the name of the top-level source node the
    /// case was resolved to.
    pub classname: String,

    /// The display name, disambiguated across repeated scenario names.
    pub name: String,

    /// The time taken by the case.
    pub time: Option<Duration>,

    /// The outcome of the case.
    pub status: TestCaseStatus,
}

impl TestCase {
    /// Creates a new test case.
    pub fn new(name: impl Into<String>, status: TestCaseStatus) -> Self {
        Self {
            classname: String::new(),
            name: name.into(),
            time: None,
            status,
        }
    }

    /// Sets the classification label of the case.
    pub fn set_classname(&mut self, classname: impl Into<String>) -> &mut Self {
        self.classname = classname.into();
        self
    }

    /// Sets the time taken for the case.
    pub fn set_time(&mut self, time: Duration) -> &mut Self {
        self.time = Some(time);
        self
    }
}

/// The outcome of a reported test case.
///
/// Determines the single content child of the `testcase` element; every
/// variant carries the preformatted step listing.
#[derive(Clone, Debug)]
pub enum TestCaseStatus {
    /// The case passed, or was skipped without an error. Serialized as a
    /// `system-out` child.
    Success {
        /// The step listing.
        output: Output,
    },

    /// The case did not pass. Serialized as a `failure` child with
    /// `message` and `type` attributes.
    Failure {
        /// The failure message.
        message: String,

        /// The kind of failure that occurred.
        ty: String,

        /// The step listing, with the stack trace appended where one is
        /// available.
        output: Output,
    },

    /// The case was skipped with an error. Serialized as a `skipped` child
    /// with a `message` attribute.
    Skipped {
        /// The skip message.
        message: String,

        /// The step listing with the stack trace appended.
        output: Output,
    },
}

/// A preformatted text block placed into the report as character data.
///
/// Embedded line endings are normalized to `\n` on construction, so that
/// serializers which perform their own line-ending translation cannot
/// produce doubled line breaks.
#[derive(Clone, Debug)]
pub struct Output {
    output: Box<str>,
}

impl Output {
    /// Creates a new output, normalizing line endings.
    pub fn new(output: impl AsRef<str>) -> Self {
        let output = output
            .as_ref()
            .replace("\r\n", "\n")
            .replace('\r', "\n")
            .into_boxed_str();
        Self { output }
    }

    /// Returns the output.
    pub fn as_str(&self) -> &str {
        &self.output
    }
}

impl AsRef<str> for Output {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
