use chrono::NaiveDate;

use crate::{
    analysis::ReadingAnalyzer, car_service::CarService, classification::ClassificationRule,
    classification::PaceStatus, garage_service::GarageService, projection::ProjectionEngine,
    reading_service::ReadingService, storage::garage_warnings, summary_service::SummaryService,
};
use miletrack_domain::{Car, Reading};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn garage_service_creates_empty_garage() {
    let garage = GarageService::create("  Family  ").expect("create garage");
    assert_eq!(garage.name, "Family");
    assert!(garage.cars.is_empty());
    assert!(garage.readings.is_empty());
    assert!(GarageService::create(" ").is_err());
}

#[test]
fn reading_at_contract_start_expects_delivery_mileage() {
    let car = Car::new("Lease", Some(12_000.0)).with_contract(date(2027, 3, 31), 36);
    let start = ProjectionEngine::contract_window(&car)
        .expect("contract window")
        .start;
    assert_eq!(start, date(2024, 3, 31));

    let analyzed = ReadingAnalyzer::analyze(
        &car,
        &[Reading::new(car.id, start, 0.0)],
        &ClassificationRule::DeviationSign,
    );
    assert_eq!(analyzed[0].expected_mileage, Some(0.0));
    assert_eq!(analyzed[0].expected_deviation, Some(0.0));
    assert_eq!(analyzed[0].status, PaceStatus::OnTrack);
}

#[test]
fn month_end_contracts_roll_the_start_day_forward() {
    let car = Car::new("Lease", Some(6_000.0)).with_contract(date(2025, 5, 31), 3);
    let window = ProjectionEngine::contract_window(&car).expect("contract window");
    assert_eq!(window.start, date(2025, 3, 3));
    assert_eq!(window.span_days, 89);
    assert_eq!(
        ProjectionEngine::expected_mileage(&car, date(2025, 3, 3)),
        Some(0.0)
    );
    assert_eq!(
        ProjectionEngine::expected_mileage(&car, date(2025, 3, 1)),
        Some(0.0)
    );
}

#[test]
fn weekly_flow_through_services() {
    let mut garage = GarageService::create("Flow").expect("create garage");
    let car_id = CarService::add(&mut garage, Car::new("Work", Some(5_000.0))).expect("add car");

    ReadingService::add(&mut garage, Reading::new(car_id, date(2025, 1, 5), 1_000.0))
        .expect("first reading");
    ReadingService::add(&mut garage, Reading::new(car_id, date(2025, 1, 12), 1_150.0))
        .expect("second reading");

    let car = garage.car(car_id).expect("car exists");
    let readings = garage.readings_for(car_id);
    let analyzed = ReadingAnalyzer::analyze(car, &readings, &ClassificationRule::default());

    assert_eq!(analyzed[0].date(), date(2025, 1, 12));
    assert_eq!(analyzed[0].weekly_delta, Some(150.0));
    assert_eq!(analyzed[0].status, PaceStatus::OverLimit);
    assert_eq!(analyzed[1].weekly_delta, None);
    assert_eq!(analyzed[1].status, PaceStatus::NoData);

    let summary = SummaryService::progress(car, &readings, date(2025, 1, 12));
    assert_eq!(summary.reading_count, 2);
    assert_eq!(summary.average_weekly, Some(150.0));
    assert!(garage_warnings(&garage).is_empty());
}

#[test]
fn analysis_is_deterministic_and_leaves_input_untouched() {
    let car = Car::new("Stable", Some(8_000.0)).with_delivery_mileage(12.0);
    let readings = vec![
        Reading::new(car.id, date(2025, 2, 16), 400.0),
        Reading::new(car.id, date(2025, 2, 2), 100.0),
        Reading::new(car.id, date(2025, 2, 9), 260.0),
    ];
    let before = readings.clone();
    for rule in [
        ClassificationRule::default(),
        ClassificationRule::DeviationSign,
        ClassificationRule::CarPace,
    ] {
        let first = ReadingAnalyzer::analyze(&car, &readings, &rule);
        let second = ReadingAnalyzer::analyze(&car, &readings, &rule);
        assert_eq!(first, second);
    }
    assert_eq!(readings, before);
}

#[test]
fn removing_a_car_cascades_to_its_readings() {
    let mut garage = GarageService::create("Cascade").expect("create garage");
    let keep = CarService::add(&mut garage, Car::new("Keep", None)).expect("add keep");
    let drop = CarService::add(&mut garage, Car::new("Drop", None)).expect("add drop");
    ReadingService::add(&mut garage, Reading::new(keep, date(2025, 1, 5), 1.0)).expect("keep");
    ReadingService::add(&mut garage, Reading::new(drop, date(2025, 1, 5), 2.0)).expect("drop");

    CarService::remove(&mut garage, drop).expect("remove car");

    assert_eq!(garage.readings.len(), 1);
    assert!(ReadingService::for_car(&garage, drop).is_empty());
    assert!(garage_warnings(&garage).is_empty());
}
