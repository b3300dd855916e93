use chrono::{Local, TimeZone};
use tempfile::tempdir;
use waymark::persistence::{PersistenceAdapter, PersistenceError};
use waymark::storage::{KeyValueStore, SqliteKeyValueStore};
use waymark::store::WorkoutStore;
use waymark::validation::{validate, RawFields};
use waymark::workout::{Coordinates, Workout, WorkoutKind};

fn workouts() -> Vec<Workout> {
    let run = validate(WorkoutKind::Running, RawFields::new(5.0, 25.0, 180.0)).unwrap();
    let ride = validate(WorkoutKind::Cycling, RawFields::new(27.0, 95.0, 0.0)).unwrap();
    let odd = validate(WorkoutKind::Running, RawFields::new(3.0, 20.0, 171.0)).unwrap();
    vec![
        Workout::create_at(
            Coordinates::new(51.5, -0.12),
            run,
            Local.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap(),
        ),
        Workout::create_at(
            Coordinates::new(45.76, 4.84),
            ride,
            Local.with_ymd_and_hms(2024, 7, 4, 17, 5, 0).unwrap(),
        ),
        Workout::create_at(
            Coordinates::new(-33.87, 151.21),
            odd,
            Local.with_ymd_and_hms(2024, 11, 30, 6, 0, 0).unwrap(),
        ),
    ]
}

#[test]
fn known_date_running_scenario_survives_restart() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("workouts.db");

    let original = workouts().remove(0);
    assert_eq!(original.pace_min_per_km(), Some(5.0));
    assert_eq!(original.description(), "Running March 15");

    {
        let mut adapter = PersistenceAdapter::new(SqliteKeyValueStore::open(&db).unwrap());
        adapter.save(std::slice::from_ref(&original)).unwrap();
    }

    let adapter = PersistenceAdapter::new(SqliteKeyValueStore::open(&db).unwrap());
    let mut store = WorkoutStore::new();
    store.hydrate(adapter.load().unwrap()).unwrap();

    let restored = store.find_by_id(original.id()).unwrap();
    assert_eq!(restored, &original);
    assert_eq!(restored.pace_min_per_km(), Some(5.0));
    assert_eq!(restored.created_at(), original.created_at());
}

#[test]
fn whole_history_round_trips_in_order() {
    let originals = workouts();
    let mut adapter = PersistenceAdapter::new(SqliteKeyValueStore::open_in_memory().unwrap());
    adapter.save(&originals).unwrap();

    let mut store = WorkoutStore::new();
    store.hydrate(adapter.load().unwrap()).unwrap();
    assert_eq!(store.all(), &originals[..]);
    assert_eq!(store.all()[2].pace_min_per_km(), Some(20.0 / 3.0));
    assert_eq!(store.all()[1].speed_km_per_h(), Some(27.0 / (95.0 / 60.0)));
}

#[test]
fn save_overwrites_previous_blob() {
    let originals = workouts();
    let mut adapter = PersistenceAdapter::new(SqliteKeyValueStore::open_in_memory().unwrap());
    adapter.save(&originals).unwrap();
    adapter.save(&originals[..1]).unwrap();
    assert_eq!(adapter.load().unwrap().len(), 1);
}

#[test]
fn clear_then_load_is_empty_and_key_absent() {
    let mut adapter = PersistenceAdapter::new(SqliteKeyValueStore::open_in_memory().unwrap());
    adapter.save(&workouts()).unwrap();
    adapter.clear().unwrap();
    assert!(adapter.load().unwrap().is_empty());
    assert_eq!(adapter.substrate().get("workouts").unwrap(), None);
}

#[test]
fn garbage_under_key_is_corrupt_data() {
    let mut kv = SqliteKeyValueStore::open_in_memory().unwrap();
    kv.set("workouts", "this is not json").unwrap();
    let adapter = PersistenceAdapter::new(kv);
    assert!(matches!(adapter.load(), Err(PersistenceError::CorruptData(_))));
}
