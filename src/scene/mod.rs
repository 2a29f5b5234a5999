//! Satellite scene catalog and instrument scan schedules.

pub mod cadence;
pub mod catalog;
