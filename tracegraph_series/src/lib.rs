//! Crate regarding tracegraph's trace logs
//!
//! A server traces the messages entering and leaving one of its tables, a
//! client traces the messages it has observed. This crate reads both logs,
//! rebases the client onto the table's clock and derives the throughput of
//! every counter as a step function.

#![deny(clippy::all)]
#![deny(clippy::cargo)]
#![deny(clippy::pedantic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
#![deny(clippy::dbg_macro)]
#![deny(clippy::unwrap_used)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::multiple_crate_versions)]

pub mod align;
pub mod dump;
pub mod rate;
pub mod reader;
mod record;
pub mod sample;
pub mod session;
pub mod summary;
pub mod write;
