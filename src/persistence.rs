use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::KeyValueStore;
use crate::workout::{Coordinates, Metrics, Workout, WorkoutKind};

pub const DEFAULT_STORAGE_KEY: &str = "workouts";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PersistenceError {
    #[error("stored workouts are corrupt: {0}")]
    CorruptData(String),

    #[error("failed to write workouts: {0}")]
    WriteFailed(String),

    #[error("failed to read workouts: {0}")]
    ReadFailed(String),
}

/// Flat on-disk shape of one workout.
///
/// Older blobs written by the browser version used shorter key names
/// (`date`, `coords`, `distance`, `type`, `pace`, ...); those are accepted
/// on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    pub id: String,
    #[serde(alias = "date")]
    pub created_at: DateTime<Local>,
    #[serde(alias = "coords")]
    pub coordinates: Coordinates,
    #[serde(alias = "distance")]
    pub distance_km: f64,
    #[serde(alias = "duration")]
    pub duration_min: f64,
    #[serde(alias = "type")]
    pub variant_kind: WorkoutKind,
    pub description: String,
    #[serde(alias = "cadence", default, skip_serializing_if = "Option::is_none")]
    pub cadence_spm: Option<f64>,
    #[serde(alias = "pace", default, skip_serializing_if = "Option::is_none")]
    pub pace_min_per_km: Option<f64>,
    #[serde(alias = "elevation", default, skip_serializing_if = "Option::is_none")]
    pub elevation_gain_m: Option<f64>,
    #[serde(alias = "speed", default, skip_serializing_if = "Option::is_none")]
    pub speed_km_per_h: Option<f64>,
}

impl From<&Workout> for WorkoutRecord {
    fn from(w: &Workout) -> Self {
        let (cadence_spm, pace_min_per_km, elevation_gain_m, speed_km_per_h) = match w.metrics() {
            Metrics::Running {
                cadence_spm,
                pace_min_per_km,
            } => (Some(cadence_spm), Some(pace_min_per_km), None, None),
            Metrics::Cycling {
                elevation_gain_m,
                speed_km_per_h,
            } => (None, None, Some(elevation_gain_m), Some(speed_km_per_h)),
        };

        Self {
            id: w.id().to_string(),
            created_at: w.created_at(),
            coordinates: w.coordinates(),
            distance_km: w.distance_km(),
            duration_min: w.duration_min(),
            variant_kind: w.kind(),
            description: w.description().to_string(),
            cadence_spm,
            pace_min_per_km,
            elevation_gain_m,
            speed_km_per_h,
        }
    }
}

impl TryFrom<WorkoutRecord> for Workout {
    type Error = PersistenceError;

    fn try_from(r: WorkoutRecord) -> Result<Self, Self::Error> {
        let missing = |field: &str| {
            PersistenceError::CorruptData(format!("{} workout {} has no {}", r.variant_kind, r.id, field))
        };
        let metrics = match r.variant_kind {
            WorkoutKind::Running => Metrics::Running {
                cadence_spm: r.cadence_spm.ok_or_else(|| missing("cadenceSpm"))?,
                pace_min_per_km: r.pace_min_per_km.ok_or_else(|| missing("paceMinPerKm"))?,
            },
            WorkoutKind::Cycling => Metrics::Cycling {
                elevation_gain_m: r.elevation_gain_m.ok_or_else(|| missing("elevationGainM"))?,
                speed_km_per_h: r.speed_km_per_h.ok_or_else(|| missing("speedKmPerH"))?,
            },
        };

        Ok(Workout::restore(
            r.id,
            r.created_at,
            r.coordinates,
            r.distance_km,
            r.duration_min,
            r.description,
            metrics,
        ))
    }
}

/// Writes the whole workout history as one JSON blob under a single key.
#[derive(Debug)]
pub struct PersistenceAdapter<S: KeyValueStore> {
    substrate: S,
    key: String,
}

impl<S: KeyValueStore> PersistenceAdapter<S> {
    pub fn new(substrate: S) -> Self {
        Self::with_key(substrate, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(substrate: S, key: impl Into<String>) -> Self {
        Self {
            substrate,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn substrate(&self) -> &S {
        &self.substrate
    }

    pub fn substrate_mut(&mut self) -> &mut S {
        &mut self.substrate
    }

    /// Serialize every workout, in order, and overwrite the stored blob.
    pub fn save(&mut self, workouts: &[Workout]) -> Result<(), PersistenceError> {
        let records: Vec<WorkoutRecord> = workouts.iter().map(WorkoutRecord::from).collect();
        let blob = serde_json::to_string(&records)
            .map_err(|e| PersistenceError::WriteFailed(e.to_string()))?;
        self.substrate
            .set(&self.key, &blob)
            .map_err(|e| PersistenceError::WriteFailed(e.to_string()))?;
        tracing::debug!(key = %self.key, count = records.len(), "saved workouts");
        Ok(())
    }

    /// Read back the stored records. A missing key (or a stored `null`)
    /// is an empty history, not an error.
    pub fn load(&self) -> Result<Vec<WorkoutRecord>, PersistenceError> {
        let blob = self
            .substrate
            .get(&self.key)
            .map_err(|e| PersistenceError::ReadFailed(e.to_string()))?;
        let Some(blob) = blob else {
            tracing::debug!(key = %self.key, "no stored workouts");
            return Ok(Vec::new());
        };

        let records: Option<Vec<WorkoutRecord>> = serde_json::from_str(&blob)
            .map_err(|e| PersistenceError::CorruptData(e.to_string()))?;
        let records = records.unwrap_or_default();
        tracing::debug!(key = %self.key, count = records.len(), "loaded workouts");
        Ok(records)
    }

    pub fn clear(&mut self) -> Result<(), PersistenceError> {
        self.substrate
            .remove(&self.key)
            .map_err(|e| PersistenceError::WriteFailed(e.to_string()))?;
        tracing::debug!(key = %self.key, "cleared stored workouts");
        Ok(())
    }
}
