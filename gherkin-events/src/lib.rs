// Copyright (c) The gherkin-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared data model for Gherkin test-run reporting: lifecycle events and
//! the structural model of parsed source files.

mod events;
mod nodes;

pub use events::*;
pub use nodes::*;
