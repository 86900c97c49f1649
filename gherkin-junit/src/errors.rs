// Copyright (c) The gherkin-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use thiserror::Error;

/// An error that occurs while serializing a [`Report`](crate::Report).
///
/// Returned by [`Report::serialize`](crate::Report::serialize) and
/// [`Report::to_string`](crate::Report::to_string).
#[derive(Debug, Error)]
#[error("error serializing JUnit report")]
pub struct SerializeError {
    #[from]
    inner: quick_xml::Error,
}

/// An error that occurs while handling a test event.
///
/// Returned by
/// [`JunitFormatter::handle_event`](crate::JunitFormatter::handle_event)
/// and [`JunitFormatter::from_path`](crate::JunitFormatter::from_path).
#[derive(Debug, Error)]
pub enum WriteEventError {
    /// An error occurred while creating or writing the output file.
    #[error("error writing to file `{file}`")]
    Fs {
        /// The file being written to.
        file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// An error occurred while serializing the report document.
    #[error("error writing out JUnit report")]
    Junit(#[from] SerializeError),
}
