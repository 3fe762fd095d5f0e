//! Step definitions for ticket takeover scenarios.

pub mod given;
pub mod then;
pub mod world;
