//! Free period detection and usability policy.
//!
//! This module provides:
//! - Gap computation between calendar commitments over a bounded horizon
//! - The duration / weekday / hour-of-day policy that decides which gaps
//!   can hold a task

mod gap;
mod usability;

pub use gap::{
    determine_free_periods, BusyInterval, FreePeriod, GapCalculator, DEFAULT_HORIZON_HOURS,
};
pub use usability::UsabilityPolicy;
