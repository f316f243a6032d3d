//! Background simulation worker — batches run off the caller's thread.
//!
//! Communication is via `mpsc` channels: one value-typed request in, one
//! value-typed response out when the whole batch completes. No partial or
//! streaming delivery, no shared mutable state across the boundary, and no
//! cancellation of an in-flight batch — callers queue or drop superseding
//! work themselves. The worker creates a private rayon pool for trial
//! parallelism (not the global pool).

use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use gridlab_core::domain::{RaceContext, Roster};
use gridlab_core::sim::{simulate_batch, AggregateStats, CalibrationSnapshot};

/// A complete batch request: everything the worker needs, by value.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub roster: Roster,
    pub context: RaceContext,
    pub snapshot: CalibrationSnapshot,
    pub trials: u32,
    pub master_seed: u64,
}

/// Commands sent to the worker.
#[derive(Debug)]
pub enum SimCommand {
    RunBatch(Box<BatchRequest>),
    Shutdown,
}

/// Responses sent back to the caller. Exactly one per `RunBatch`.
#[derive(Debug, Clone)]
pub enum SimResponse {
    BatchComplete(Box<AggregateStats>),
    BatchFailed { error: String },
}

/// Spawn the background worker thread.
pub fn spawn_worker(rx: Receiver<SimCommand>, tx: Sender<SimResponse>) -> JoinHandle<()> {
    thread::Builder::new()
        .name("gridlab-worker".into())
        .spawn(move || {
            worker_loop(rx, tx);
        })
        .expect("failed to spawn worker thread")
}

fn worker_loop(rx: Receiver<SimCommand>, tx: Sender<SimResponse>) {
    // Private rayon pool: batch parallelism must not contend with whatever
    // the host application runs on the global pool.
    let pool = rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("gridlab-pool-{i}"))
        .build()
        .expect("failed to build worker rayon pool");

    loop {
        match rx.recv() {
            Ok(SimCommand::Shutdown) | Err(_) => break,
            Ok(SimCommand::RunBatch(request)) => {
                let response = pool.install(|| handle_batch(&request));
                let _ = tx.send(response);
            }
        }
    }
}

fn handle_batch(request: &BatchRequest) -> SimResponse {
    info!(
        race = %request.context.race_id,
        trials = request.trials,
        seed = request.master_seed,
        "running batch"
    );
    match simulate_batch(
        &request.roster,
        &request.context,
        &request.snapshot,
        request.trials,
        request.master_seed,
    ) {
        Ok(stats) => SimResponse::BatchComplete(Box::new(stats)),
        Err(e) => {
            warn!(race = %request.context.race_id, error = %e, "batch failed");
            SimResponse::BatchFailed {
                error: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    use gridlab_core::domain::{
        DegradationCategory, DevelopmentProfile, Driver, DriverId, DriverTraits, EngineSupplier,
        RaceId, Team, TeamId, TrackCategory,
    };

    fn request(trials: u32) -> BatchRequest {
        let teams = vec![Team {
            id: TeamId::new("solo"),
            car_rating: 85.0,
            reliability: 0.05,
            supplier: EngineSupplier::Meridian,
        }];
        let drivers = (0..4)
            .map(|i| Driver {
                id: DriverId::new(format!("d{i}")),
                team: TeamId::new("solo"),
                rating: 80.0 + i as f64,
                wet_skill: 1.0,
                traits: DriverTraits::default(),
                development: DevelopmentProfile::Prime,
                track_affinity: None,
            })
            .collect();
        BatchRequest {
            roster: Roster::new(drivers, teams),
            context: RaceContext {
                race_id: RaceId::new("worker-ring"),
                round: 1,
                total_laps: 40,
                category: TrackCategory::Permanent,
                safety_car_probability: 0.3,
                rain_probability: 0.1,
                track_temp_c: 30.0,
                degradation: DegradationCategory::Medium,
                drs_zones: 2,
            },
            snapshot: CalibrationSnapshot::default(),
            trials,
            master_seed: 42,
        }
    }

    #[test]
    fn worker_shuts_down_cleanly() {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, _resp_rx) = mpsc::channel();
        let handle = spawn_worker(cmd_rx, resp_tx);
        cmd_tx.send(SimCommand::Shutdown).unwrap();
        handle.join().expect("worker should join cleanly");
    }

    #[test]
    fn worker_completes_a_batch() {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let handle = spawn_worker(cmd_rx, resp_tx);

        cmd_tx
            .send(SimCommand::RunBatch(Box::new(request(100))))
            .unwrap();
        match resp_rx.recv().unwrap() {
            SimResponse::BatchComplete(stats) => {
                assert_eq!(stats.trials, 100);
                assert_eq!(stats.drivers.len(), 4);
            }
            SimResponse::BatchFailed { error } => panic!("batch failed: {error}"),
        }

        cmd_tx.send(SimCommand::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn worker_reports_typed_failure_without_dying() {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let handle = spawn_worker(cmd_rx, resp_tx);

        // Zero trials: a typed failure, then the worker keeps serving.
        cmd_tx
            .send(SimCommand::RunBatch(Box::new(request(0))))
            .unwrap();
        assert!(matches!(
            resp_rx.recv().unwrap(),
            SimResponse::BatchFailed { .. }
        ));

        cmd_tx
            .send(SimCommand::RunBatch(Box::new(request(10))))
            .unwrap();
        assert!(matches!(
            resp_rx.recv().unwrap(),
            SimResponse::BatchComplete(_)
        ));

        cmd_tx.send(SimCommand::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn requests_queue_in_order() {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let handle = spawn_worker(cmd_rx, resp_tx);

        for trials in [10u32, 20, 30] {
            cmd_tx
                .send(SimCommand::RunBatch(Box::new(request(trials))))
                .unwrap();
        }
        for expected in [10u32, 20, 30] {
            match resp_rx.recv().unwrap() {
                SimResponse::BatchComplete(stats) => assert_eq!(stats.trials, expected),
                SimResponse::BatchFailed { error } => panic!("batch failed: {error}"),
            }
        }

        cmd_tx.send(SimCommand::Shutdown).unwrap();
        handle.join().unwrap();
    }
}
