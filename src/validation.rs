use thiserror::Error;

use crate::workout::{cycling_speed, running_pace, Coordinates, WorkoutKind};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("unknown workout type {0:?}, expected running or cycling")]
    UnknownKind(String),

    #[error("Inputs have to be positive numbers! ({field} is not a number)")]
    NotFinite { field: &'static str },

    #[error("Inputs have to be positive numbers! ({field} must be greater than zero)")]
    NotPositive { field: &'static str },

    #[error("Inputs have to be positive numbers! ({field} cannot be negative)")]
    Negative { field: &'static str },

    #[error("Inputs have to be positive numbers! ({field} is too large to work with)")]
    OutOfRange { field: &'static str },

    #[error("Invalid map position ({field} is out of range)")]
    BadCoordinates { field: &'static str },
}

impl ValidationError {
    /// Name of the offending input, when the failure is about a number.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::UnknownKind(_) => None,
            ValidationError::NotFinite { field }
            | ValidationError::NotPositive { field }
            | ValidationError::Negative { field }
            | ValidationError::OutOfRange { field }
            | ValidationError::BadCoordinates { field } => Some(*field),
        }
    }
}

/// Numeric candidates as they come off the form, before any checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawFields {
    pub distance_km: f64,
    pub duration_min: f64,
    /// Cadence for running, elevation gain for cycling
    pub extra: f64,
}

impl RawFields {
    pub fn new(distance_km: f64, duration_min: f64, extra: f64) -> Self {
        Self {
            distance_km,
            duration_min,
            extra,
        }
    }

    /// Coerce raw form strings the way a browser's unary plus would.
    pub fn from_form(distance: &str, duration: &str, extra: &str) -> Self {
        Self::new(coerce(distance), coerce(duration), coerce(extra))
    }
}

/// Checked fields, the only input accepted by workout construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkoutInput {
    #[non_exhaustive]
    Running {
        distance_km: f64,
        duration_min: f64,
        cadence_spm: f64,
    },
    #[non_exhaustive]
    Cycling {
        distance_km: f64,
        duration_min: f64,
        elevation_gain_m: f64,
    },
}

impl WorkoutInput {
    pub fn kind(&self) -> WorkoutKind {
        match self {
            WorkoutInput::Running { .. } => WorkoutKind::Running,
            WorkoutInput::Cycling { .. } => WorkoutKind::Cycling,
        }
    }

    pub fn distance_km(&self) -> f64 {
        match *self {
            WorkoutInput::Running { distance_km, .. } | WorkoutInput::Cycling { distance_km, .. } => {
                distance_km
            }
        }
    }

    pub fn duration_min(&self) -> f64 {
        match *self {
            WorkoutInput::Running { duration_min, .. } | WorkoutInput::Cycling { duration_min, .. } => {
                duration_min
            }
        }
    }
}

/// Empty input counts as zero, anything unparsable as NaN.
pub fn coerce(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// True iff every value is finite and strictly greater than zero.
pub fn validate_numeric_positivity(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite() && *v > 0.0)
}

pub fn validate(kind: WorkoutKind, raw: RawFields) -> Result<WorkoutInput, ValidationError> {
    let extra_field = match kind {
        WorkoutKind::Running => "cadence",
        WorkoutKind::Cycling => "elevation",
    };
    let named = [
        ("distance", raw.distance_km),
        ("duration", raw.duration_min),
        (extra_field, raw.extra),
    ];

    if let Some((field, _)) = named.iter().find(|(_, v)| !v.is_finite()) {
        return Err(ValidationError::NotFinite { field: *field });
    }

    let must_be_positive = match kind {
        WorkoutKind::Running => &named[..],
        WorkoutKind::Cycling => &named[..2],
    };
    if let Some((field, _)) = must_be_positive
        .iter()
        .find(|(_, v)| !validate_numeric_positivity(&[*v]))
    {
        return Err(ValidationError::NotPositive { field: *field });
    }

    // the derived metric is stored, so it has to survive serialization too
    let (metric_field, metric) = match kind {
        WorkoutKind::Running => ("pace", running_pace(raw.distance_km, raw.duration_min)),
        WorkoutKind::Cycling => ("speed", cycling_speed(raw.distance_km, raw.duration_min)),
    };
    if !metric.is_finite() {
        return Err(ValidationError::OutOfRange {
            field: metric_field,
        });
    }

    match kind {
        WorkoutKind::Running => Ok(WorkoutInput::Running {
            distance_km: raw.distance_km,
            duration_min: raw.duration_min,
            cadence_spm: raw.extra,
        }),
        WorkoutKind::Cycling if raw.extra < 0.0 => Err(ValidationError::Negative {
            field: extra_field,
        }),
        WorkoutKind::Cycling => Ok(WorkoutInput::Cycling {
            distance_km: raw.distance_km,
            duration_min: raw.duration_min,
            elevation_gain_m: raw.extra,
        }),
    }
}

/// Latitude within [-90, 90], longitude within [-180, 180].
pub fn validate_coordinates(coordinates: Coordinates) -> Result<Coordinates, ValidationError> {
    if !(coordinates.lat.is_finite() && (-90.0..=90.0).contains(&coordinates.lat)) {
        return Err(ValidationError::BadCoordinates { field: "latitude" });
    }
    if !(coordinates.lng.is_finite() && (-180.0..=180.0).contains(&coordinates.lng)) {
        return Err(ValidationError::BadCoordinates { field: "longitude" });
    }
    Ok(coordinates)
}

/// Validate straight from form strings, including the kind selector.
pub fn validate_form(
    kind: &str,
    distance: &str,
    duration: &str,
    extra: &str,
) -> Result<WorkoutInput, ValidationError> {
    let kind = WorkoutKind::parse(kind).ok_or_else(|| ValidationError::UnknownKind(kind.to_string()))?;
    validate(kind, RawFields::from_form(distance, duration, extra))
}
