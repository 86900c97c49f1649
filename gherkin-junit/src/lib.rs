// Copyright (c) The gherkin-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generate JUnit reports for Gherkin test runs.
//!
//! [`JunitFormatter`] observes the test-run lifecycle events defined in
//! [`gherkin_events`] and aggregates them into a single `testsuite`
//! document with one `testcase` element per executed scenario. It does not
//! execute tests, parse source text, or decide test outcomes.

mod errors;
mod formatter;
mod report;
mod serialize;

pub use errors::*;
pub use formatter::*;
pub use report::*;
pub use serialize::format_seconds;
