//! # todo5 Core Library
//!
//! Places pending Todoist tasks into free time on a Google Calendar.
//! The CLI binary is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timeline**: free-period detection over busy intervals, and the
//!   usability policy that decides which free periods may take a task
//! - **Schedule**: tasks, calendar events, the scheduling marker, and the
//!   event stubs written back to the calendar
//! - **Scheduler**: the pure assignment engine pairing periods with tasks
//! - **Integrations**: Todoist and Google Calendar clients behind small
//!   async traits, with OAuth and keyring-backed credentials
//! - **Runner**: one fetch, plan, and write cycle, and the periodic loop
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`AssignmentEngine`]: Pairs usable free periods with unscheduled tasks
//! - [`GapCalculator`]: Finds free periods within a horizon
//! - [`Runner`]: Executes one scheduling cycle against any sources and sink
//! - [`Config`]: Application configuration management

pub mod error;
pub mod integrations;
pub mod runner;
pub mod schedule;
pub mod scheduler;
pub mod storage;
pub mod timeline;

pub use error::{ConfigError, CoreError, IntegrationError, OAuthError, ValidationError};
pub use runner::{run_cycle, run_periodically, run_until, Outcome, Placement, RunReport, Runner};
pub use schedule::{build_event_stub, CalendarEvent, EventStub, Task};
pub use scheduler::{Assignment, AssignmentEngine};
pub use storage::Config;
pub use timeline::{determine_free_periods, BusyInterval, FreePeriod, GapCalculator, UsabilityPolicy};
