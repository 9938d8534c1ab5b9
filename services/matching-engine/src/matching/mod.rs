//! Match eligibility and per-match computation

pub mod crossing;
pub mod executor;
