//! Criterion benchmarks for the simulation hot paths.
//!
//! 1. Single race trial (full draw sequence for a 20-car field)
//! 2. Monte Carlo batch (200 trials, aggregation included)
//! 3. Tire model inner loop

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gridlab_core::domain::{
    DegradationCategory, DevelopmentProfile, Driver, DriverId, DriverTraits, EngineSupplier,
    RaceContext, RaceId, Roster, Team, TeamId, TrackCategory,
};
use gridlab_core::models::tire::pace_loss;
use gridlab_core::models::TireCompound;
use gridlab_core::sim::{run_trial, simulate_batch, CalibrationSnapshot};

fn make_roster(field: usize) -> Roster {
    let teams: Vec<Team> = (0..field / 2)
        .map(|i| Team {
            id: TeamId::new(format!("team-{i}")),
            car_rating: 72.0 + (i as f64) * 2.0,
            reliability: 0.05,
            supplier: EngineSupplier::Meridian,
        })
        .collect();
    let drivers: Vec<Driver> = (0..field)
        .map(|i| Driver {
            id: DriverId::new(format!("driver-{i}")),
            team: TeamId::new(format!("team-{}", i / 2)),
            rating: 70.0 + (i as f64) * 1.5,
            wet_skill: 1.0 + (i % 4) as f64 * 0.05,
            traits: DriverTraits::default(),
            development: DevelopmentProfile::Prime,
            track_affinity: None,
        })
        .collect();
    Roster::new(drivers, teams)
}

fn make_context() -> RaceContext {
    RaceContext {
        race_id: RaceId::new("bench-ring"),
        round: 10,
        total_laps: 60,
        category: TrackCategory::Permanent,
        safety_car_probability: 0.35,
        rain_probability: 0.15,
        track_temp_c: 33.0,
        degradation: DegradationCategory::Medium,
        drs_zones: 2,
    }
}

fn bench_single_trial(c: &mut Criterion) {
    let roster = make_roster(20);
    let ctx = make_context();
    let snapshot = CalibrationSnapshot::default();

    c.bench_function("single_trial_20_cars", |b| {
        let mut seed = 0u64;
        b.iter(|| {
            seed = seed.wrapping_add(1);
            black_box(run_trial(&roster, &ctx, &snapshot, seed).unwrap())
        })
    });
}

fn bench_batch(c: &mut Criterion) {
    let roster = make_roster(20);
    let ctx = make_context();
    let snapshot = CalibrationSnapshot::default();

    c.bench_function("batch_200_trials", |b| {
        b.iter(|| black_box(simulate_batch(&roster, &ctx, &snapshot, 200, 42).unwrap()))
    });
}

fn bench_tire_model(c: &mut Criterion) {
    c.bench_function("tire_pace_loss", |b| {
        b.iter(|| {
            for laps in 0..60 {
                black_box(pace_loss(
                    TireCompound::Soft,
                    laps,
                    34.0,
                    1.05,
                    DegradationCategory::High,
                    80.0,
                ));
            }
        })
    });
}

criterion_group!(benches, bench_single_trial, bench_batch, bench_tire_model);
criterion_main!(benches);
