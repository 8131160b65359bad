//! Activity record and its human-readable rendering

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

const METERS_TO_MILES: f64 = 0.000621371;
const START_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Shown for heart-rate fields the activity did not record.
pub const NOT_AVAILABLE: &str = "N/A";

/// Summary activity as returned by `/athlete/activities`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub start_date_local: String,
    /// Seconds
    pub elapsed_time: u64,
    /// Meters
    pub distance: f64,
    #[serde(default)]
    pub average_heartrate: Option<f64>,
    #[serde(default)]
    pub max_heartrate: Option<f64>,
    #[serde(default)]
    pub map: Option<ActivityMap>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityMap {
    #[serde(default)]
    pub summary_polyline: Option<String>,
}

impl Activity {
    /// Encoded route, if the activity has a non-empty one.
    pub fn summary_polyline(&self) -> Option<&str> {
        self.map
            .as_ref()
            .and_then(|m| m.summary_polyline.as_deref())
            .filter(|p| !p.is_empty())
    }
}

/// Formatted fields for the console and the published log entry
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFields {
    pub name: String,
    pub kind: String,
    /// `YYYY-MM-DD HH:MM`
    pub date: String,
    /// `MM/DD/YY`
    pub short_date: String,
    pub elapsed_time: String,
    pub distance: String,
    pub avg_heartrate: String,
    pub max_heartrate: String,
}

impl DisplayFields {
    /// Labelled rows in console order.
    pub fn rows(&self) -> [(&'static str, &str); 7] {
        [
            ("Name", self.name.as_str()),
            ("Type", self.kind.as_str()),
            ("Date", self.date.as_str()),
            ("Elapsed Time", self.elapsed_time.as_str()),
            ("Distance", self.distance.as_str()),
            ("Avg Heartrate", self.avg_heartrate.as_str()),
            ("Max Heartrate", self.max_heartrate.as_str()),
        ]
    }
}

pub fn format_summary(activity: &Activity) -> DisplayFields {
    let (date, short_date) = match NaiveDateTime::parse_from_str(
        &activity.start_date_local,
        START_DATE_FORMAT,
    ) {
        Ok(start) => (
            start.format("%Y-%m-%d %H:%M").to_string(),
            start.format("%m/%d/%y").to_string(),
        ),
        Err(e) => {
            tracing::warn!(
                "Unrecognised start date {:?}: {}",
                activity.start_date_local,
                e
            );
            (
                activity.start_date_local.clone(),
                activity.start_date_local.clone(),
            )
        }
    };

    DisplayFields {
        name: activity.name.clone(),
        kind: activity.kind.clone(),
        date,
        short_date,
        elapsed_time: format_minutes(activity.elapsed_time),
        distance: format_miles(activity.distance),
        avg_heartrate: format_heartrate(activity.average_heartrate),
        max_heartrate: format_heartrate(activity.max_heartrate),
    }
}

pub fn format_minutes(elapsed_secs: u64) -> String {
    format!("{:.1} minutes", elapsed_secs as f64 / 60.0)
}

pub fn format_miles(meters: f64) -> String {
    format!("{:.2} miles", meters * METERS_TO_MILES)
}

pub fn format_heartrate(bpm: Option<f64>) -> String {
    match bpm {
        Some(v) => format!("{:.1} bpm", v),
        None => NOT_AVAILABLE.to_string(),
    }
}
