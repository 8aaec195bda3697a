//! Output formatting for lifecycle results.
//!
//! This module handles printing what a run provisioned:
//! - [`terminal`] - Terminal output with colors

mod terminal;

pub use terminal::{format_field, print_report, report_lines};
