use chrono::NaiveDate;
use miletrack_core::{storage::GarageStorage, CarService, CoreError, ReadingService};
use miletrack_domain::{Car, Garage, Reading};
use miletrack_storage_json::{JsonGarageStorage, StoragePaths};
use std::fs;
use tempfile::tempdir;

fn sample_garage(name: &str) -> Garage {
    let mut garage = Garage::new(name);
    let car = Car::new("Work", Some(12_000.0))
        .with_delivery_mileage(15.0)
        .with_contract(NaiveDate::from_ymd_opt(2027, 6, 30).unwrap(), 36)
        .with_registration("AB12 CDE");
    let car_id = CarService::add(&mut garage, car).expect("add car");
    let date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
    ReadingService::add(&mut garage, Reading::new(car_id, date, 1_000.0).with_notes("service"))
        .expect("add reading");
    garage
}

#[test]
fn json_storage_can_save_and_load_garage() {
    let dir = tempdir().expect("tempdir");
    let storage =
        JsonGarageStorage::new(StoragePaths::from_data_root(dir.path())).expect("create storage");

    let garage = sample_garage("Family Cars");
    storage.save_garage("Family Cars", &garage).expect("save garage");
    let loaded = storage.load_garage("Family Cars").expect("load garage");

    assert_eq!(loaded.name, "Family Cars");
    assert_eq!(loaded.cars, garage.cars);
    assert_eq!(loaded.readings, garage.readings);
    assert_eq!(loaded.revision, garage.revision);

    let path = storage.garage_path("Family Cars");
    assert_eq!(path, dir.path().join("garages").join("family_cars.json"));
    assert_eq!(storage.list_garages().unwrap(), vec!["family_cars".to_string()]);
}

#[test]
fn garage_files_use_camel_case_fields() {
    let dir = tempdir().expect("tempdir");
    let storage =
        JsonGarageStorage::new(StoragePaths::from_data_root(dir.path())).expect("create storage");
    storage
        .save_garage("layout", &sample_garage("Layout"))
        .expect("save garage");

    let raw = fs::read_to_string(storage.garage_path("layout")).expect("read file");
    for field in [
        "\"annualLimit\"",
        "\"deliveryMileage\"",
        "\"contractEndDate\": \"2027-06-30\"",
        "\"contractMonths\"",
        "\"registrationNumber\"",
        "\"isDefault\"",
        "\"carId\"",
    ] {
        assert!(raw.contains(field), "missing {field} in {raw}");
    }
}

#[test]
fn loading_an_unknown_garage_is_not_found() {
    let dir = tempdir().expect("tempdir");
    let storage =
        JsonGarageStorage::new(StoragePaths::from_data_root(dir.path())).expect("create storage");
    let err = storage.load_garage("nowhere").unwrap_err();
    assert!(matches!(err, CoreError::GarageNotFound(_)));
}

#[test]
fn json_storage_creates_and_restores_backups() {
    let dir = tempdir().expect("tempdir");
    let paths = StoragePaths::from_data_root(dir.path());
    let storage = JsonGarageStorage::new(paths.clone()).expect("create storage");

    let original = sample_garage("Backup");
    storage.save_garage("backup", &original).expect("save garage");

    let info = storage
        .backup_garage("backup", &original, Some("Before import"))
        .expect("create backup");
    assert!(info.id.starts_with("backup_"));
    assert!(info.id.ends_with("_before-import.json"));
    assert_eq!(info.path.parent(), Some(paths.backup_root.join("backup").as_path()));

    let mut changed = original.clone();
    changed.readings.clear();
    changed.touch();
    storage.save_garage("backup", &changed).expect("save changed garage");

    let backups = storage.list_backups("backup").expect("list backups");
    assert!(backups.iter().any(|entry| entry.id == info.id));

    let restored = storage.restore_backup(&info).expect("restore backup");
    assert_eq!(restored.readings.len(), 1);
    let reloaded = storage.load_garage("backup").expect("reload");
    assert_eq!(reloaded.readings, original.readings);
}

#[test]
fn backups_are_pruned_to_retention() {
    let dir = tempdir().expect("tempdir");
    let storage = JsonGarageStorage::with_retention(StoragePaths::from_data_root(dir.path()), 2)
        .expect("create storage");
    let garage = sample_garage("Pruned");

    for note in ["first", "second", "third"] {
        storage
            .backup_garage("pruned", &garage, Some(note))
            .expect("backup");
    }

    let backups = storage.list_backups("pruned").expect("list backups");
    assert_eq!(backups.len(), 2);
    let metadata = storage.list_backup_metadata("pruned").expect("metadata");
    assert!(metadata.iter().all(|row| row.size_bytes > 0));
}

#[test]
fn metadata_summarizes_each_garage() {
    let dir = tempdir().expect("tempdir");
    let storage =
        JsonGarageStorage::new(StoragePaths::from_data_root(dir.path())).expect("create storage");
    storage.save_garage("b", &sample_garage("Beta")).expect("save");
    storage.save_garage("a", &Garage::new("Alpha")).expect("save");

    let rows = storage.list_garage_metadata().expect("metadata");
    let names: Vec<&str> = rows.iter().map(|row| row.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Beta"]);
    assert_eq!(rows[1].car_count, 1);
    assert_eq!(rows[1].reading_count, 1);

    storage.delete_garage("a").expect("delete");
    assert_eq!(storage.list_garages().unwrap(), vec!["b".to_string()]);
}

#[test]
fn garages_can_be_saved_to_arbitrary_paths() {
    let dir = tempdir().expect("tempdir");
    let storage =
        JsonGarageStorage::new(StoragePaths::from_data_root(dir.path())).expect("create storage");
    let target = dir.path().join("exports").join("copy.json");
    let garage = sample_garage("Export");

    storage
        .save_garage_to_path(&garage, &target)
        .expect("save to path");
    let loaded = storage.load_garage_from_path(&target).expect("load from path");
    assert_eq!(loaded.name, "Export");
    assert_eq!(loaded.cars[0].id, garage.cars[0].id);
    assert!(!target.with_extension("json.tmp").exists());
    assert!(storage.list_backups("copy").unwrap().is_empty());
}
