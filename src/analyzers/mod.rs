//! Course discovery and weighted-average scoring.
//!
//! This module lists the course columns of a score sheet, applies a
//! per-request credit rule to every student row, and summarizes the
//! derived scores.

pub mod discover;
pub mod types;
pub mod utility;
pub mod weighted;
