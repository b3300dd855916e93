//! Plain-text presentation of workouts: map marker popups and the history list.

use std::io::Write;
use unicode_width::UnicodeWidthStr;

use crate::controller::MarkerSink;
use crate::workout::{Coordinates, Metrics, Workout, WorkoutKind};

const CELL_WIDTH: usize = 18;

/// What a map marker needs to know about a workout
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: String,
    pub coordinates: Coordinates,
    pub kind: WorkoutKind,
    pub description: String,
}

impl Marker {
    pub fn popup_label(&self) -> String {
        format!("{} {}", self.kind.icon(), self.description)
    }
}

impl From<&Workout> for Marker {
    fn from(w: &Workout) -> Self {
        Self {
            id: w.id().to_string(),
            coordinates: w.coordinates(),
            kind: w.kind(),
            description: w.description().to_string(),
        }
    }
}

/// Marker sink that prints one line per marker
pub struct ConsoleMarkers<W: Write> {
    out: W,
}

impl<W: Write> ConsoleMarkers<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> MarkerSink for ConsoleMarkers<W> {
    fn place(&mut self, marker: &Marker) {
        if let Err(e) = writeln!(
            self.out,
            "📍 [{:>9.4}, {:>9.4}] {}",
            marker.coordinates.lat,
            marker.coordinates.lng,
            marker.popup_label()
        ) {
            tracing::warn!(id = %marker.id, error = %e, "failed to print marker");
        }
    }
}

fn cell(icon: &str, value: String, unit: &str) -> String {
    let text = format!("{icon} {value} {unit}");
    let width = text.width();
    if width >= CELL_WIDTH {
        text
    } else {
        text + &" ".repeat(CELL_WIDTH - width)
    }
}

/// Detail cells in display order: distance, duration, derived metric, extra field.
pub fn detail_cells(w: &Workout) -> Vec<String> {
    let mut cells = vec![
        cell(w.kind().icon(), w.distance_km().to_string(), "km"),
        cell("⏱", w.duration_min().to_string(), "min"),
    ];
    match w.metrics() {
        Metrics::Running {
            cadence_spm,
            pace_min_per_km,
        } => {
            cells.push(cell("⚡️", format!("{pace_min_per_km:.1}"), "min/km"));
            cells.push(cell("🦶🏼", cadence_spm.to_string(), "spm"));
        }
        Metrics::Cycling {
            elevation_gain_m,
            speed_km_per_h,
        } => {
            cells.push(cell("⚡️", format!("{speed_km_per_h:.1}"), "km/h"));
            cells.push(cell("⛰", elevation_gain_m.to_string(), "m"));
        }
    }
    cells
}

pub fn render_workout(w: &Workout) -> String {
    format!(
        "{} [{}]\n  {}",
        w.description(),
        w.id(),
        detail_cells(w).join("").trim_end()
    )
}

/// Newest first, the way entries stack up under the form.
pub fn render_list(workouts: &[Workout]) -> String {
    if workouts.is_empty() {
        return "No workouts yet.".to_string();
    }
    workouts
        .iter()
        .rev()
        .map(render_workout)
        .collect::<Vec<_>>()
        .join("\n")
}
