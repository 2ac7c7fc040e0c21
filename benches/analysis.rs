use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use miletrack_core::{AnalysisCache, CarService, ClassificationRule, ReadingAnalyzer};
use miletrack_domain::{Car, Garage, Reading};
use miletrack_storage_json::{load_garage_from_path, save_garage_to_path};
use tempfile::tempdir;
use uuid::Uuid;

fn build_sample_garage(weeks: usize) -> (Garage, Uuid) {
    let mut garage = Garage::new("Benchmark");
    let end = NaiveDate::from_ymd_opt(2027, 3, 31).unwrap();
    let car = Car::new("Lease", Some(10_000.0))
        .with_delivery_mileage(12.0)
        .with_contract(end, 36);
    let car_id = CarService::add(&mut garage, car).unwrap();

    let start = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
    for week in 0..weeks {
        let date = start + Duration::weeks(week as i64);
        let mileage = 12.0 + week as f64 * (150.0 + (week % 40) as f64);
        garage.readings.push(Reading::new(car_id, date, mileage));
    }
    garage.touch();
    (garage, car_id)
}

fn bench_analyzer(c: &mut Criterion) {
    let (garage, car_id) = build_sample_garage(black_box(5_000));
    let car = garage.car(car_id).unwrap().clone();
    let readings = garage.readings_for(car_id);

    for rule in [
        ClassificationRule::default(),
        ClassificationRule::DeviationSign,
        ClassificationRule::CarPace,
    ] {
        c.bench_function(&format!("analyze_5k_{}", rule.name()), |b| {
            b.iter(|| black_box(ReadingAnalyzer::analyze(&car, &readings, &rule)))
        });
    }

    c.bench_function("chart_series_5k", |b| {
        b.iter(|| black_box(ReadingAnalyzer::chart_series(&car, &readings)))
    });
}

fn bench_cache(c: &mut Criterion) {
    let (garage, car_id) = build_sample_garage(black_box(5_000));
    let rule = ClassificationRule::default();
    let mut cache = AnalysisCache::new();
    cache.analyze(&garage, car_id, &rule).unwrap();

    c.bench_function("cached_analysis_hit", |b| {
        b.iter(|| black_box(cache.analyze(&garage, car_id, &rule).unwrap().len()))
    });
}

fn bench_garage_io(c: &mut Criterion) {
    let (garage, _) = build_sample_garage(black_box(5_000));
    let dir = tempdir().expect("tempdir");
    let file_path = dir.path().join("garage.json");

    c.bench_function("garage_save_5k", |b| {
        b.iter(|| save_garage_to_path(&garage, &file_path).expect("save garage"))
    });

    save_garage_to_path(&garage, &file_path).expect("seed");

    c.bench_function("garage_load_5k", |b| {
        b.iter(|| black_box(load_garage_from_path(&file_path).expect("load garage")))
    });
}

criterion_group!(benches, bench_analyzer, bench_cache, bench_garage_io);
criterion_main!(benches);
