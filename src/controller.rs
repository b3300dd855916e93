use thiserror::Error;

use crate::persistence::PersistenceAdapter;
use crate::render::Marker;
use crate::storage::KeyValueStore;
use crate::store::WorkoutStore;
use crate::validation::{validate_coordinates, validate_form};
use crate::workout::{Coordinates, Workout};

/// Receives every workout that should appear on the map
pub trait MarkerSink {
    fn place(&mut self, marker: &Marker);
}

/// Keeps placed markers in memory; handy for headless runs and tests
#[derive(Debug, Default)]
pub struct RecordingMarkers {
    pub placed: Vec<Marker>,
}

impl MarkerSink for RecordingMarkers {
    fn place(&mut self, marker: &Marker) {
        self.placed.push(marker.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("Could not get your position")]
    Unavailable,
}

/// Source of the user's current position
pub trait LocationProvider {
    fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// Reports a position known up front, or none at all
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Option<Coordinates>);

impl LocationProvider for FixedLocation {
    fn current_position(&self) -> Result<Coordinates, LocationError> {
        self.0.ok_or(LocationError::Unavailable)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: Coordinates,
    pub zoom: u8,
}

/// Raw form submission: the clicked map point plus untyped field values.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkoutRequest {
    pub kind: String,
    pub coordinates: Coordinates,
    pub distance: String,
    pub duration: String,
    /// Cadence for running, elevation gain for cycling
    pub cadence_or_elevation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    NewWorkout(NewWorkoutRequest),
    Select(String),
    Reset,
}

/// Result of handling an event, ready to show to the user
#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    Created { id: String },
    /// Accepted in memory but the write to storage failed
    CreatedUnsaved { id: String, message: String },
    Rejected { message: String },
    PanTo(MapView),
    Ignored,
    Cleared,
}

/// Owns the workout store and its persistence for the lifetime of the app.
pub struct ActivityController<S: KeyValueStore, M: MarkerSink> {
    store: WorkoutStore,
    persistence: PersistenceAdapter<S>,
    markers: M,
    map_zoom: u8,
    map_view: Option<MapView>,
}

impl<S: KeyValueStore, M: MarkerSink> ActivityController<S, M> {
    /// Restore saved workouts and place a marker for each, in store order.
    /// Unreadable history is logged and treated as empty.
    pub fn start(persistence: PersistenceAdapter<S>, markers: M, map_zoom: u8) -> Self {
        let mut store = WorkoutStore::new();
        match persistence.load() {
            Ok(records) => {
                if let Err(e) = store.hydrate(records) {
                    tracing::warn!(error = %e, "starting with empty history");
                }
            }
            Err(e) => tracing::warn!(error = %e, "starting with empty history"),
        }
        tracing::info!(count = store.len(), "restored workouts");

        let mut controller = Self {
            store,
            persistence,
            markers,
            map_zoom,
            map_view: None,
        };
        for workout in controller.store.all() {
            controller.markers.place(&Marker::from(workout));
        }
        controller
    }

    /// Centre the map on the current position, if one can be had.
    pub fn locate(&mut self, provider: &impl LocationProvider) -> Option<MapView> {
        match provider.current_position() {
            Ok(center) => {
                let view = MapView {
                    center,
                    zoom: self.map_zoom,
                };
                self.map_view = Some(view);
                Some(view)
            }
            Err(e) => {
                tracing::warn!(error = %e, "no map context");
                None
            }
        }
    }

    pub fn handle(&mut self, event: AppEvent) -> Feedback {
        match event {
            AppEvent::NewWorkout(request) => self.submit(request),
            AppEvent::Select(id) => self.select(&id),
            AppEvent::Reset => self.reset(),
        }
    }

    /// Validate, build, append and save. The save happens before returning
    /// so an accepted workout is never only in memory unless storage failed.
    pub fn submit(&mut self, request: NewWorkoutRequest) -> Feedback {
        let checked = validate_coordinates(request.coordinates).and_then(|coordinates| {
            validate_form(
                &request.kind,
                &request.distance,
                &request.duration,
                &request.cadence_or_elevation,
            )
            .map(|input| (coordinates, input))
        });
        let (coordinates, input) = match checked {
            Ok(checked) => checked,
            Err(e) => {
                tracing::info!(error = %e, kind = %request.kind, "rejected workout");
                return Feedback::Rejected {
                    message: e.to_string(),
                };
            }
        };

        let workout = Workout::create(coordinates, input);
        let id = workout.id().to_string();
        let marker = Marker::from(&workout);
        self.store.append(workout);
        tracing::info!(id = %id, kind = %marker.kind, "added workout");

        let saved = self.persistence.save(self.store.all());
        self.markers.place(&marker);

        match saved {
            Ok(()) => Feedback::Created { id },
            Err(e) => {
                tracing::error!(id = %id, error = %e, "workout not persisted");
                Feedback::CreatedUnsaved {
                    id,
                    message: e.to_string(),
                }
            }
        }
    }

    /// Pan to the selected workout; unknown ids are ignored.
    pub fn select(&mut self, id: &str) -> Feedback {
        match self.store.find_by_id(id) {
            Some(workout) => {
                let view = MapView {
                    center: workout.coordinates(),
                    zoom: self.map_zoom,
                };
                self.map_view = Some(view);
                Feedback::PanTo(view)
            }
            None => {
                tracing::debug!(id, "selection matched no workout");
                Feedback::Ignored
            }
        }
    }

    /// Drop every workout, in memory and in storage.
    pub fn reset(&mut self) -> Feedback {
        self.store.clear();
        if let Err(e) = self.persistence.clear() {
            tracing::error!(error = %e, "failed to clear stored workouts");
        }
        tracing::info!("workout history reset");
        Feedback::Cleared
    }

    pub fn store(&self) -> &WorkoutStore {
        &self.store
    }

    pub fn persistence(&self) -> &PersistenceAdapter<S> {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut PersistenceAdapter<S> {
        &mut self.persistence
    }

    pub fn markers(&self) -> &M {
        &self.markers
    }

    pub fn map_view(&self) -> Option<MapView> {
        self.map_view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKeyValueStore;
    use assert_matches::assert_matches;

    fn controller() -> ActivityController<MemoryKeyValueStore, RecordingMarkers> {
        ActivityController::start(
            PersistenceAdapter::new(MemoryKeyValueStore::new()),
            RecordingMarkers::default(),
            13,
        )
    }

    fn request(kind: &str, extra: &str) -> NewWorkoutRequest {
        NewWorkoutRequest {
            kind: kind.to_string(),
            coordinates: Coordinates::new(51.5, -0.12),
            distance: "5".to_string(),
            duration: "25".to_string(),
            cadence_or_elevation: extra.to_string(),
        }
    }

    #[test]
    fn submit_appends_saves_and_places_marker() {
        let mut c = controller();
        let feedback = c.handle(AppEvent::NewWorkout(request("running", "180")));
        assert_matches!(feedback, Feedback::Created { .. });
        assert_eq!(c.store().len(), 1);
        assert_eq!(c.markers().placed.len(), 1);
        assert_eq!(c.persistence().load().unwrap().len(), 1);
    }

    #[test]
    fn rejected_submit_changes_nothing() {
        let mut c = controller();
        let feedback = c.submit(request("running", "0"));
        assert_matches!(feedback, Feedback::Rejected { message } if message.contains("cadence"));
        assert!(c.store().is_empty());
        assert!(c.markers().placed.is_empty());
        assert!(!c.persistence().substrate().contains("workouts"));
    }

    #[test]
    fn unusable_position_is_rejected() {
        let mut c = controller();
        let mut req = request("running", "180");
        req.coordinates = Coordinates::new(f64::NAN, -0.12);
        let feedback = c.submit(req);
        assert_matches!(feedback, Feedback::Rejected { message } if message.contains("latitude"));
        assert!(c.store().is_empty());
        assert!(c.markers().placed.is_empty());
        assert!(!c.persistence().substrate().contains("workouts"));
    }

    #[test]
    fn overflowing_speed_is_rejected_before_saving() {
        let mut c = controller();
        let mut req = request("cycling", "0");
        req.distance = "1e308".to_string();
        req.duration = "1".to_string();
        assert_matches!(c.submit(req), Feedback::Rejected { message } if message.contains("speed"));
        assert!(c.store().is_empty());
        assert!(!c.persistence().substrate().contains("workouts"));
    }

    #[test]
    fn failed_save_keeps_workout_in_memory() {
        let mut c = controller();
        c.persistence_mut().substrate_mut().set_reject_writes(true);
        let feedback = c.submit(request("cycling", "40"));
        assert_matches!(feedback, Feedback::CreatedUnsaved { .. });
        assert_eq!(c.store().len(), 1);
        assert_eq!(c.markers().placed.len(), 1);
    }

    #[test]
    fn select_pans_or_ignores() {
        let mut c = controller();
        let id = match c.submit(request("running", "170")) {
            Feedback::Created { id } => id,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(
            c.handle(AppEvent::Select(id)),
            Feedback::PanTo(MapView {
                center: Coordinates::new(51.5, -0.12),
                zoom: 13
            })
        );
        assert_eq!(c.select("missing"), Feedback::Ignored);
        assert!(c.map_view().is_some());
    }

    #[test]
    fn reset_clears_store_and_storage() {
        let mut c = controller();
        c.submit(request("running", "170"));
        assert_eq!(c.handle(AppEvent::Reset), Feedback::Cleared);
        assert!(c.store().is_empty());
        assert!(c.persistence().load().unwrap().is_empty());
    }

    #[test]
    fn locate_falls_back_to_no_map() {
        let mut c = controller();
        assert_eq!(c.locate(&FixedLocation(None)), None);
        let view = c.locate(&FixedLocation(Some(Coordinates::new(1.0, 2.0)))).unwrap();
        assert_eq!(view.zoom, 13);
        assert_eq!(c.map_view(), Some(view));
    }

    #[test]
    fn corrupt_history_starts_empty() {
        let mut kv = MemoryKeyValueStore::new();
        kv.set("workouts", "{ nope").unwrap();
        let c = ActivityController::start(PersistenceAdapter::new(kv), RecordingMarkers::default(), 13);
        assert!(c.store().is_empty());
        assert!(c.markers().placed.is_empty());
    }
}
