//! CLI utilities for the Comércio Assim admin tools
//!
//! Provides shared CLI functionality:
//! - Status messages
//! - Record tables and JSON output
//! - Progress spinners

#![warn(missing_docs)]

pub mod output;
pub mod progress;
