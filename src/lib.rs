//! Cleaning, filtering and summary statistics for disaster-event datasets.
//!
//! The `disaster-dash` binary renders these in an egui dashboard;
//! `disaster-clean` runs the cleaning stage on its own.

pub mod data;
