use chrono::{DateTime, Datelike, Local};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::validation::WorkoutInput;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Latitude/longitude pair, stored as `[lat, lng]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<[f64; 2]> for Coordinates {
    fn from(v: [f64; 2]) -> Self {
        Coordinates { lat: v[0], lng: v[1] }
    }
}

impl From<Coordinates> for [f64; 2] {
    fn from(c: Coordinates) -> Self {
        [c.lat, c.lng]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WorkoutKind {
    Running,
    Cycling,
}

impl WorkoutKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "running" => Some(WorkoutKind::Running),
            "cycling" => Some(WorkoutKind::Cycling),
            _ => None,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            WorkoutKind::Running => "🏃‍♂️",
            WorkoutKind::Cycling => "🚴‍♀️",
        }
    }
}

/// Variant-specific input together with the metric derived from it at creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metrics {
    Running {
        cadence_spm: f64,
        pace_min_per_km: f64,
    },
    Cycling {
        elevation_gain_m: f64,
        speed_km_per_h: f64,
    },
}

impl Metrics {
    pub fn kind(&self) -> WorkoutKind {
        match self {
            Metrics::Running { .. } => WorkoutKind::Running,
            Metrics::Cycling { .. } => WorkoutKind::Cycling,
        }
    }
}

/// A single recorded session. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    id: String,
    created_at: DateTime<Local>,
    coordinates: Coordinates,
    distance_km: f64,
    duration_min: f64,
    description: String,
    metrics: Metrics,
}

impl Workout {
    /// Build a fresh workout stamped with the current time.
    pub fn create(coordinates: Coordinates, input: WorkoutInput) -> Self {
        Self::create_at(coordinates, input, Local::now())
    }

    /// Build a fresh workout as if it had been entered at `created_at`.
    pub fn create_at(
        coordinates: Coordinates,
        input: WorkoutInput,
        created_at: DateTime<Local>,
    ) -> Self {
        let distance_km = input.distance_km();
        let duration_min = input.duration_min();
        let metrics = match input {
            WorkoutInput::Running { cadence_spm, .. } => Metrics::Running {
                cadence_spm,
                pace_min_per_km: running_pace(distance_km, duration_min),
            },
            WorkoutInput::Cycling {
                elevation_gain_m, ..
            } => Metrics::Cycling {
                elevation_gain_m,
                speed_km_per_h: cycling_speed(distance_km, duration_min),
            },
        };

        Self {
            id: next_id(&created_at),
            description: describe(metrics.kind(), &created_at),
            created_at,
            coordinates,
            distance_km,
            duration_min,
            metrics,
        }
    }

    /// Reassemble a workout from previously persisted parts. Nothing is
    /// recomputed: id, timestamp, description and the derived metric are
    /// taken as stored.
    pub(crate) fn restore(
        id: String,
        created_at: DateTime<Local>,
        coordinates: Coordinates,
        distance_km: f64,
        duration_min: f64,
        description: String,
        metrics: Metrics,
    ) -> Self {
        Self {
            id,
            created_at,
            coordinates,
            distance_km,
            duration_min,
            description,
            metrics,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn duration_min(&self) -> f64 {
        self.duration_min
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics
    }

    pub fn kind(&self) -> WorkoutKind {
        self.metrics.kind()
    }

    pub fn pace_min_per_km(&self) -> Option<f64> {
        match self.metrics {
            Metrics::Running {
                pace_min_per_km, ..
            } => Some(pace_min_per_km),
            Metrics::Cycling { .. } => None,
        }
    }

    pub fn speed_km_per_h(&self) -> Option<f64> {
        match self.metrics {
            Metrics::Cycling { speed_km_per_h, .. } => Some(speed_km_per_h),
            Metrics::Running { .. } => None,
        }
    }
}

/// Minutes per km.
pub fn running_pace(distance_km: f64, duration_min: f64) -> f64 {
    duration_min / distance_km
}

/// Km per hour.
pub fn cycling_speed(distance_km: f64, duration_min: f64) -> f64 {
    distance_km / (duration_min / 60.0)
}

/// "Running March 15": capitalized kind, month name, day of month
pub fn describe(kind: WorkoutKind, created_at: &DateTime<Local>) -> String {
    let kind = kind.to_string();
    let mut chars = kind.chars();
    let label = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    };
    format!(
        "{} {} {}",
        label,
        MONTHS[created_at.month0() as usize],
        created_at.day()
    )
}

static LAST_ID: AtomicI64 = AtomicI64::new(0);

/// Millisecond timestamp of creation, bumped forward when two workouts land
/// in the same millisecond so ids stay unique within the process.
fn next_id(created_at: &DateTime<Local>) -> String {
    let millis = created_at.timestamp_millis();
    let previous = LAST_ID
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(millis.max(last + 1))
        })
        .unwrap_or(millis);
    millis.max(previous + 1).to_string()
}

/// Keep freshly issued ids ahead of an id that was loaded from storage.
pub(crate) fn reserve_id(id: &str) {
    if let Ok(millis) = id.parse::<i64>() {
        LAST_ID.fetch_max(millis, Ordering::SeqCst);
    }
}
