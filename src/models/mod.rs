//! Data models for Strava entities

mod activity;

pub use activity::*;
