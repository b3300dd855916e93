use crate::persistence::{PersistenceError, WorkoutRecord};
use crate::workout::{reserve_id, Workout};

/// Ordered, in-memory collection of workouts, oldest first.
#[derive(Debug, Default)]
pub struct WorkoutStore {
    workouts: Vec<Workout>,
}

impl WorkoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids are unique by construction, so no duplicate check is made.
    pub fn append(&mut self, workout: Workout) {
        self.workouts.push(workout);
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id() == id)
    }

    pub fn all(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn last(&self) -> Option<&Workout> {
        self.workouts.last()
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    pub fn clear(&mut self) {
        self.workouts.clear();
    }

    /// Replace the contents with workouts rebuilt from persisted records.
    ///
    /// Records are trusted: nothing is revalidated or recomputed. If any
    /// record cannot be rebuilt the store is left as it was.
    pub fn hydrate(&mut self, records: Vec<WorkoutRecord>) -> Result<(), PersistenceError> {
        let restored = records
            .into_iter()
            .map(Workout::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        for workout in &restored {
            reserve_id(workout.id());
        }
        tracing::debug!(count = restored.len(), "hydrated workout store");
        self.workouts = restored;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{validate, RawFields};
    use crate::workout::{Coordinates, WorkoutKind};

    fn run(distance: f64) -> Workout {
        let input = validate(WorkoutKind::Running, RawFields::new(distance, 30.0, 170.0)).unwrap();
        Workout::create(Coordinates::new(10.0, 20.0), input)
    }

    #[test]
    fn append_preserves_insertion_order() {
        let mut store = WorkoutStore::new();
        store.append(run(1.0));
        store.append(run(2.0));
        store.append(run(3.0));
        let distances: Vec<f64> = store.all().iter().map(|w| w.distance_km()).collect();
        assert_eq!(distances, vec![1.0, 2.0, 3.0]);
        assert_eq!(store.last().map(|w| w.distance_km()), Some(3.0));
    }

    #[test]
    fn find_by_id_hit_and_miss() {
        let mut store = WorkoutStore::new();
        let a = run(4.0);
        let id = a.id().to_string();
        store.append(a);
        store.append(run(6.0));

        assert_eq!(store.find_by_id(&id).map(|w| w.distance_km()), Some(4.0));
        assert!(store.find_by_id("0000000000").is_none());
    }

    #[test]
    fn clear_empties_the_store() {
        let mut store = WorkoutStore::new();
        store.append(run(1.0));
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn hydrate_keeps_ids_and_order() {
        let originals = vec![run(1.5), run(2.5)];
        let records: Vec<WorkoutRecord> = originals.iter().map(WorkoutRecord::from).collect();

        let mut store = WorkoutStore::new();
        store.hydrate(records).unwrap();
        assert_eq!(store.all(), &originals[..]);
    }

    #[test]
    fn failed_hydrate_leaves_store_untouched() {
        let mut store = WorkoutStore::new();
        store.append(run(9.0));

        let mut broken = WorkoutRecord::from(&run(1.0));
        broken.pace_min_per_km = None;
        assert!(store.hydrate(vec![broken]).is_err());
        assert_eq!(store.len(), 1);
        assert_eq!(store.all()[0].distance_km(), 9.0);
    }
}
