//! Utilities shared by Nova tests.
//!
//! Tests for source-level passes describe their input as a Java snippet and
//! then need byte spans into it. The helpers in [`fixtures`] locate those spans
//! by searching for needles (optionally the n-th occurrence, or the first one
//! after an anchor) so fixtures stay readable. [`logs`] captures `tracing`
//! output for tests that assert on log lines.

pub mod fixtures;
pub mod logs;

pub use fixtures::*;
pub use logs::*;
