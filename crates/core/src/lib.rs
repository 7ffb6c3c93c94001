//! # Clinic Scheduling Core
//!
//! Value types shared by the gateway and the engine crates: clock times and
//! their 12-hour display codec, weekday sets, the operating-hours and slot-type
//! records exchanged with the clinic settings service, and the error taxonomy.

pub mod errors;
pub mod models;
pub mod time_codec;

pub use errors::{ScheduleError, ScheduleResult};
