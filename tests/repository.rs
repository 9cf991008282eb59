use carefile::codec::mappers;
use carefile::error::{CarefileError, DecodeError};
use carefile::model::{Entity, Gender, Medicine, Patient, Record};
use carefile::repo::Repository;
use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use std::sync::Barrier;
use std::thread;
use tempfile::TempDir;

const MEDICINE_HEADER: &str = "id,name,stock,lowStockAlert,createdAt,updatedAt";
const PARACETAMOL: &str = "M1,Paracetamol,100,20,2024-01-01T00:00:00,2024-01-01T00:00:00";

fn medicines(dir: &Path) -> Repository<Medicine> {
    Repository::open(dir, mappers::MEDICINES, ".csv").unwrap()
}

fn seed(dir: &Path, lines: &[&str]) {
    let mut content = String::from(MEDICINE_HEADER);
    content.push('\n');
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    fs::write(dir.join("medicines.csv"), content).unwrap();
}

fn ids(entities: &[Medicine]) -> Vec<&str> {
    entities.iter().map(|m| m.id()).collect()
}

#[test]
fn paracetamol_find_update_delete() {
    let temp = TempDir::new().unwrap();
    seed(temp.path(), &[PARACETAMOL]);
    let repo = medicines(temp.path());

    let mut found = repo.find_one("M1").unwrap().unwrap();
    assert_eq!(found.name, "Paracetamol");
    assert_eq!(found.stock, 100);
    assert_eq!(found.low_stock_alert, 20);
    let created = found.record.created_at;

    found.set_stock(50);
    repo.update(&found).unwrap();

    let reread = repo.find_one("M1").unwrap().unwrap();
    assert_eq!(reread.stock, 50);
    assert_eq!(reread.id(), "M1");
    assert_eq!(reread.record.created_at, created);
    assert_eq!(
        reread.record.created_at,
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    );

    repo.delete("M1").unwrap();
    assert!(repo.find_all().unwrap().is_empty());
}

#[test]
fn update_rewrites_only_the_target_row() {
    let temp = TempDir::new().unwrap();
    let other_a = "A,Aspirin,10,2,2024-01-01T00:00:00,2024-01-01T00:00:00";
    let other_c = "C,Codeine,5,1,2024-01-03T00:00:00,2024-01-03T00:00:00";
    seed(temp.path(), &[other_a, PARACETAMOL, other_c]);
    let repo = medicines(temp.path());

    let mut target = repo.find_one("M1").unwrap().unwrap();
    target.edit(|m| m.name = "Paracetamol 500".into());
    repo.update(&target).unwrap();

    let content = fs::read_to_string(temp.path().join("medicines.csv")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], MEDICINE_HEADER);
    assert_eq!(lines[1], other_a);
    assert!(lines[2].starts_with("M1,Paracetamol 500,100,20,2024-01-01T00:00:00,"));
    assert_eq!(lines[3], other_c);
}

#[test]
fn update_of_unknown_id_is_not_found_and_leaves_file_alone() {
    let temp = TempDir::new().unwrap();
    seed(temp.path(), &[PARACETAMOL]);
    let repo = medicines(temp.path());
    let before = fs::read_to_string(temp.path().join("medicines.csv")).unwrap();

    let stranger = Medicine::new("Ghost", 1, 1).with_record(Record::with_id("M9"));
    let err = repo.update(&stranger).unwrap_err();
    assert!(matches!(err, CarefileError::NotFound { ref id, .. } if id == "M9"));

    let err = repo.delete("M9").unwrap_err();
    assert!(matches!(err, CarefileError::NotFound { .. }));

    let after = fs::read_to_string(temp.path().join("medicines.csv")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn delete_removes_exactly_one_row() {
    let temp = TempDir::new().unwrap();
    let repo = medicines(temp.path());
    for name in ["Aspirin", "Bisoprolol", "Codeine"] {
        repo.save(&Medicine::new(name, 10, 2)).unwrap();
    }
    let all = repo.find_all().unwrap();
    assert_eq!(all.len(), 3);

    repo.delete(all[1].id()).unwrap();
    let rest = repo.find_all().unwrap();
    assert_eq!(rest.len(), 2);
    assert_eq!(rest[0].name, "Aspirin");
    assert_eq!(rest[1].name, "Codeine");
    assert_eq!(repo.count().unwrap(), 2);
}

#[test]
fn save_round_trips_and_keeps_insertion_order() {
    let temp = TempDir::new().unwrap();
    let repo = medicines(temp.path());
    let batch = vec![
        Medicine::new("Aspirin", 10, 2).with_record(Record::with_id("A")),
        Medicine::new("Bisoprolol", 9, 3).with_record(Record::with_id("B")),
    ];
    repo.save_all(&batch).unwrap();
    repo.save(&Medicine::new("Codeine", 1, 1).with_record(Record::with_id("C")))
        .unwrap();

    let all = repo.find_all().unwrap();
    assert_eq!(ids(&all), vec!["A", "B", "C"]);
    assert_eq!(all[0], batch[0]);
}

#[test]
fn listing_skips_malformed_rows_but_scan_reports_them() {
    let temp = TempDir::new().unwrap();
    seed(
        temp.path(),
        &[
            PARACETAMOL,
            "M2,Broken,lots,20,2024-01-01T00:00:00,2024-01-01T00:00:00",
            "M3,Short,1",
            "M4,Ibuprofen,7,3,2024-01-02T00:00:00,2024-01-02T00:00:00",
        ],
    );
    let repo = medicines(temp.path());

    assert_eq!(ids(&repo.find_all().unwrap()), vec!["M1", "M4"]);

    let scan = repo.scan_all().unwrap();
    assert_eq!(scan.entities.len(), 2);
    assert_eq!(scan.malformed.len(), 2);
    assert_eq!(scan.malformed[0].line, 3);
    assert_eq!(scan.malformed[0].key, "M2");
    assert!(matches!(
        scan.malformed[0].error,
        DecodeError::InvalidInteger { column: "stock", .. }
    ));
    assert!(matches!(
        scan.malformed[1].error,
        DecodeError::FieldCount { expected: 6, found: 3 }
    ));

    let err = repo.find_one("M2").unwrap_err();
    assert!(matches!(err, CarefileError::Decode { .. }));
}

#[test]
fn find_many_and_find_by_match_trimmed_column_values() {
    let temp = TempDir::new().unwrap();
    let path = temp.path();
    let repo: Repository<Patient> = Repository::open(path, mappers::PATIENTS, ".csv").unwrap();

    repo.save(&Patient::new("Ana", Gender::Female).with_address("Porto"))
        .unwrap();
    repo.save(&Patient::new("Bruno", Gender::Male).with_address("Lisbon"))
        .unwrap();
    repo.save(&Patient::new("Carla", Gender::Female).with_address("Porto"))
        .unwrap();

    let females = repo.find_many("gender", "Female").unwrap();
    let names: Vec<&str> = females.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Ana", "Carla"]);

    let first_in_porto = repo.find_by("address", " Porto ").unwrap().unwrap();
    assert_eq!(first_in_porto.name, "Ana");

    assert!(repo.find_by("address", "Faro").unwrap().is_none());
    assert!(repo.find_many("address", "Faro").unwrap().is_empty());

    let err = repo.find_many("bloodType", "A+").unwrap_err();
    assert!(matches!(err, CarefileError::UnknownColumn { .. }));
}

#[test]
fn duplicate_ids_are_tolerated_unless_uniqueness_is_on() {
    let temp = TempDir::new().unwrap();
    seed(temp.path(), &[PARACETAMOL]);

    let permissive = medicines(temp.path());
    let twin = Medicine::new("Paracetamol again", 5, 1).with_record(Record::with_id("M1"));
    permissive.save(&twin).unwrap();
    assert_eq!(permissive.count().unwrap(), 2);
    assert_eq!(permissive.find_one("M1").unwrap().unwrap().name, "Paracetamol");

    let strict = medicines(temp.path()).with_unique_ids(true);
    let err = strict.save(&twin).unwrap_err();
    assert!(matches!(err, CarefileError::DuplicateId { ref id, .. } if id == "M1"));

    let fresh = Medicine::new("Fresh", 1, 1).with_record(Record::with_id("N1"));
    let err = strict.save_all(&[fresh.clone(), fresh]).unwrap_err();
    assert!(matches!(err, CarefileError::DuplicateId { ref id, .. } if id == "N1"));
    assert_eq!(strict.count().unwrap(), 2);
}

#[test]
fn a_row_that_is_not_utf8_is_reported_and_the_rest_still_load() {
    let temp = TempDir::new().unwrap();
    let mut content = format!("{}\n{}\n", MEDICINE_HEADER, PARACETAMOL).into_bytes();
    content.extend_from_slice(b"M2,Caf\xe9ine,5,1,2024-01-01T00:00:00,2024-01-01T00:00:00\n");
    content.extend_from_slice(b"M3,Codeine,3,5,2024-01-01T00:00:00,2024-01-01T00:00:00\n");
    fs::write(temp.path().join("medicines.csv"), content).unwrap();
    let repo = medicines(temp.path());

    assert_eq!(ids(&repo.find_all().unwrap()), vec!["M1", "M3"]);
    assert_eq!(ids(&repo.find_many("lowStockAlert", "5").unwrap()), vec!["M3"]);
    assert_eq!(repo.count().unwrap(), 3);

    let scan = repo.scan_all().unwrap();
    assert_eq!(scan.malformed.len(), 1);
    assert_eq!(scan.malformed[0].line, 3);
    assert_eq!(scan.malformed[0].key, "M2");
    assert_eq!(scan.malformed[0].error, DecodeError::InvalidEncoding);

    let mut codeine = repo.find_one("M3").unwrap().unwrap();
    codeine.set_stock(9);
    repo.update(&codeine).unwrap();
    let raw = fs::read(temp.path().join("medicines.csv")).unwrap();
    assert!(raw.windows(4).any(|w| w == b"Caf\xe9"));
}

#[test]
fn concurrent_unique_saves_of_one_id_store_it_once() {
    let temp = TempDir::new().unwrap();
    let barrier = Barrier::new(8);

    let outcomes: Vec<bool> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let barrier = &barrier;
                let dir = temp.path();
                scope.spawn(move || {
                    let repo = medicines(dir).with_unique_ids(true);
                    let medicine = Medicine::new(format!("Batch {}", i), 1, 1)
                        .with_record(Record::with_id("SAME"));
                    barrier.wait();
                    repo.save(&medicine).is_ok()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
    assert_eq!(medicines(temp.path()).count().unwrap(), 1);
}

#[test]
fn repositories_on_the_same_file_see_each_others_writes() {
    let temp = TempDir::new().unwrap();
    let first = medicines(temp.path());
    let second = medicines(temp.path());

    first
        .save(&Medicine::new("Aspirin", 10, 2).with_record(Record::with_id("A")))
        .unwrap();
    assert_eq!(second.find_one("A").unwrap().unwrap().name, "Aspirin");

    let mut aspirin = second.find_one("A").unwrap().unwrap();
    aspirin.set_stock(3);
    second.update(&aspirin).unwrap();
    assert_eq!(first.find_one("A").unwrap().unwrap().stock, 3);
}

#[test]
fn missing_file_is_recreated_with_header_on_save() {
    let temp = TempDir::new().unwrap();
    let repo = medicines(temp.path());
    let path = temp.path().join("medicines.csv");
    fs::remove_file(&path).unwrap();

    assert!(repo.find_all().unwrap().is_empty());
    repo.save(&Medicine::new("Aspirin", 10, 2)).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with(&format!("{}\n", MEDICINE_HEADER)));
    assert_eq!(repo.count().unwrap(), 1);
}
