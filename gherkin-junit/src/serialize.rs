// Copyright (c) The gherkin-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialize a `Report`.

use crate::{errors::SerializeError, Output, Report, TestCase, TestCaseStatus};
use quick_xml::{
    events::{BytesCData, BytesDecl, BytesEnd, BytesStart, Event},
    Writer,
};
use std::{io, time::Duration};

static TESTSUITE_TAG: &str = "testsuite";
static TESTCASE_TAG: &str = "testcase";
static FAILURE_TAG: &str = "failure";
static SKIPPED_TAG: &str = "skipped";
static SYSTEM_OUT_TAG: &str = "system-out";

pub(crate) fn serialize_report(
    report: &Report,
    writer: impl io::Write,
) -> Result<(), SerializeError> {
    let mut writer = Writer::new_with_indent(writer, b' ', 4);

    let decl = BytesDecl::new("1.0", Some("UTF-8"), None);
    writer.write_event(Event::Decl(decl))?;

    serialize_report_impl(report, &mut writer)?;

    // Add a trailing newline.
    writer
        .get_mut()
        .write_all(b"\n")
        .map_err(quick_xml::Error::from)?;
    Ok(())
}

fn serialize_report_impl(
    report: &Report,
    writer: &mut Writer<impl io::Write>,
) -> Result<(), SerializeError> {
    // Use the destructuring syntax to ensure that all fields are handled.
    let Report {
        name,
        time,
        tests,
        failures,
        skipped,
        errors,
        test_cases,
    } = report;

    let mut testsuite_tag = BytesStart::new(TESTSUITE_TAG);
    testsuite_tag.extend_attributes([
        ("name", name.as_str()),
        ("tests", tests.to_string().as_str()),
        ("failures", failures.to_string().as_str()),
        ("skipped", skipped.to_string().as_str()),
        ("errors", errors.to_string().as_str()),
    ]);
    if let Some(time) = time {
        testsuite_tag.push_attribute(("time", format_seconds(*time).as_str()));
    }
    writer.write_event(Event::Start(testsuite_tag))?;

    for test_case in test_cases {
        serialize_test_case(test_case, writer)?;
    }

    writer.write_event(Event::End(BytesEnd::new(TESTSUITE_TAG)))?;
    writer.write_event(Event::Eof)?;

    Ok(())
}

fn serialize_test_case(
    test_case: &TestCase,
    writer: &mut Writer<impl io::Write>,
) -> Result<(), SerializeError> {
    let TestCase {
        classname,
        name,
        time,
        status,
    } = test_case;

    let mut testcase_tag = BytesStart::new(TESTCASE_TAG);
    testcase_tag.extend_attributes([
        ("classname", classname.as_str()),
        ("name", name.as_str()),
    ]);
    if let Some(time) = time {
        testcase_tag.push_attribute(("time", format_seconds(*time).as_str()));
    }
    writer.write_event(Event::Start(testcase_tag))?;

    match status {
        TestCaseStatus::Success { output } => {
            serialize_output_element(SYSTEM_OUT_TAG, &[], output, writer)?;
        }
        TestCaseStatus::Failure {
            message,
            ty,
            output,
        } => {
            serialize_output_element(
                FAILURE_TAG,
                &[("message", message.as_str()), ("type", ty.as_str())],
                output,
                writer,
            )?;
        }
        TestCaseStatus::Skipped { message, output } => {
            serialize_output_element(
                SKIPPED_TAG,
                &[("message", message.as_str())],
                output,
                writer,
            )?;
        }
    }

    writer.write_event(Event::End(BytesEnd::new(TESTCASE_TAG)))?;

    Ok(())
}

fn serialize_output_element(
    tag_name: &'static str,
    attributes: &[(&str, &str)],
    output: &Output,
    writer: &mut Writer<impl io::Write>,
) -> Result<(), SerializeError> {
    let mut tag = BytesStart::new(tag_name);
    for attribute in attributes {
        tag.push_attribute(*attribute);
    }
    writer.write_event(Event::Start(tag))?;

    // The step listing is written out literally rather than escaped for
    // markup. A literal `]]>` in the text would terminate the section
    // early, so the text is split into consecutive sections at each
    // occurrence, with the terminator straddling the boundary.
    let mut rest = output.as_str();
    while let Some(position) = rest.find("]]>") {
        let (head, tail) = rest.split_at(position + 2);
        writer.write_event(Event::CData(BytesCData::new(head)))?;
        rest = tail;
    }
    writer.write_event(Event::CData(BytesCData::new(rest)))?;

    writer.write_event(Event::End(BytesEnd::new(tag_name)))?;

    Ok(())
}

/// Formats a duration as a number of seconds: period as the decimal
/// separator, no grouping, at most three fraction digits, trailing zeros
/// trimmed.
///
/// The output is locale-independent; downstream consumers parse this field
/// as a plain decimal.
pub fn format_seconds(time: Duration) -> String {
    let seconds = time.as_millis() as f64 / 1000.0;
    let formatted = format!("{seconds:.3}");
    let formatted = formatted.trim_end_matches('0').trim_end_matches('.');
    formatted.to_owned()
}
