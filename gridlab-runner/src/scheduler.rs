//! Lap-refresh gate: debounced re-simulation scheduling.
//!
//! Live consumers re-trigger a prediction batch every fixed number of laps.
//! The gate keeps a last-processed marker so repeated calls for a lap that
//! already triggered (or for laps inside an already-processed interval) are
//! no-ops; the decision to dispatch a new batch stays with the caller.

/// Debounce guard for periodic batch refreshes.
#[derive(Debug, Clone)]
pub struct RefreshGate {
    interval_laps: u32,
    last_bucket: Option<u32>,
}

impl RefreshGate {
    /// `interval_laps` of 0 is treated as 1 (refresh every lap).
    pub fn new(interval_laps: u32) -> Self {
        Self {
            interval_laps: interval_laps.max(1),
            last_bucket: None,
        }
    }

    /// True exactly once per crossed interval boundary.
    ///
    /// Laps before the first boundary never trigger; out-of-order or
    /// repeated laps inside a processed interval are no-ops.
    pub fn should_refresh(&mut self, lap: u32) -> bool {
        let bucket = lap / self.interval_laps;
        if bucket == 0 {
            return false;
        }
        match self.last_bucket {
            Some(last) if bucket <= last => false,
            _ => {
                self.last_bucket = Some(bucket);
                true
            }
        }
    }

    /// Forget the marker at the start of a new race.
    pub fn reset(&mut self) {
        self.last_bucket = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_interval() {
        let mut gate = RefreshGate::new(5);
        assert!(!gate.should_refresh(1));
        assert!(!gate.should_refresh(4));
        assert!(gate.should_refresh(5));
        assert!(!gate.should_refresh(5)); // repeated call, same lap
        assert!(!gate.should_refresh(6));
        assert!(!gate.should_refresh(9));
        assert!(gate.should_refresh(10));
    }

    #[test]
    fn skipped_intervals_still_fire_once() {
        let mut gate = RefreshGate::new(5);
        // Telemetry jumped from lap 3 to lap 17: one refresh, not three.
        assert!(!gate.should_refresh(3));
        assert!(gate.should_refresh(17));
        assert!(!gate.should_refresh(18));
    }

    #[test]
    fn out_of_order_laps_are_no_ops() {
        let mut gate = RefreshGate::new(5);
        assert!(gate.should_refresh(10));
        assert!(!gate.should_refresh(7));
        assert!(!gate.should_refresh(10));
        assert!(gate.should_refresh(15));
    }

    #[test]
    fn reset_rearms_the_gate() {
        let mut gate = RefreshGate::new(5);
        assert!(gate.should_refresh(10));
        gate.reset();
        assert!(gate.should_refresh(5));
    }

    #[test]
    fn zero_interval_degrades_to_every_lap() {
        let mut gate = RefreshGate::new(0);
        assert!(gate.should_refresh(1));
        assert!(!gate.should_refresh(1));
        assert!(gate.should_refresh(2));
    }
}
