//! Tick function for the delivery progress simulator.
//!
//! [`advance`] performs exactly one simulator tick on a job. The caller
//! (one task per active job in `mediadesk-worker`) owns the timer and a
//! [`ProgressCursor`] holding the fractional progress accumulated so far.
//!
//! Per tick:
//!
//! 1. Terminal job: stop.
//! 2. `queued`: wait while `scheduled_for` is in the future, otherwise move
//!    to `processing` and stamp `started_at`. No progress this tick.
//! 3. `processing` with accumulated progress >= [`PROCESSING_THRESHOLD`]:
//!    move to `delivering`. No progress this tick.
//! 4. Otherwise add `base_increment * jitter` (jitter in 0.8..=1.2),
//!    clamped to 100.
//! 5. Recompute every destination through the stagger policy.
//! 6. All destinations completed: job `completed` at 100.
//!
//! The stagger multiplier is `1 + (count - 1 - index) * 0.1`: the first
//! destination runs fastest and the last one tracks overall progress
//! exactly, so destinations complete in creation order and the final one
//! completes on the same tick the job reaches 100.

use std::time::Duration;

use rand::Rng;

use crate::delivery::job::{DeliveryJob, DestinationStatus, JobStatus};
use crate::error::CoreError;
use crate::types::Timestamp;

/// Default interval between simulator ticks.
pub const DEFAULT_TICK: Duration = Duration::from_millis(500);

/// Default simulated duration of a full delivery.
pub const DEFAULT_TOTAL_DURATION: Duration = Duration::from_secs(10);

/// Accumulated progress at which `processing` hands over to `delivering`.
pub const PROCESSING_THRESHOLD: f64 = 10.0;

/// Lower bound of the per-tick jitter factor.
pub const JITTER_MIN: f64 = 0.8;

/// Upper bound of the per-tick jitter factor.
pub const JITTER_MAX: f64 = 1.2;

/// Per-position weight of the destination stagger policy.
pub const STAGGER_STEP: f64 = 0.1;

/// Tick cadence and total simulated duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    pub tick: Duration,
    pub total_duration: Duration,
}

impl SimulationParams {
    /// Validate and build parameters. The tick must be non-zero and no
    /// longer than the total duration.
    pub fn new(tick: Duration, total_duration: Duration) -> Result<Self, CoreError> {
        if tick.is_zero() {
            return Err(CoreError::Validation(
                "Simulator tick must be greater than zero".to_string(),
            ));
        }
        if total_duration < tick {
            return Err(CoreError::Validation(format!(
                "Total duration ({} ms) must be at least one tick ({} ms)",
                total_duration.as_millis(),
                tick.as_millis()
            )));
        }
        Ok(Self {
            tick,
            total_duration,
        })
    }

    /// Progress added per tick before jitter: `100 / (total / tick)`.
    pub fn base_increment(&self) -> f64 {
        let ticks = self.total_duration.as_secs_f64() / self.tick.as_secs_f64();
        100.0 / ticks
    }
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            tick: DEFAULT_TICK,
            total_duration: DEFAULT_TOTAL_DURATION,
        }
    }
}

/// Fractional progress carried between ticks of one simulator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgressCursor {
    accumulated: f64,
}

impl ProgressCursor {
    /// Start from a job's stored progress (0 for new jobs, non-zero when a
    /// simulator is resumed after a restart).
    pub fn resume(job: &DeliveryJob) -> Self {
        Self {
            accumulated: f64::from(job.progress),
        }
    }

    pub fn accumulated(&self) -> f64 {
        self.accumulated
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Job is terminal; the simulator should exit.
    Stopped,
    /// Job is queued with a future `scheduled_for`.
    Waiting,
    /// `queued` → `processing`.
    Started,
    /// `processing` → `delivering`.
    HandedOff,
    /// Progress advanced without a status change.
    Advanced,
    /// Every destination finished; the simulator should exit.
    Completed,
}

impl TickOutcome {
    /// Whether the simulator loop should exit after this tick.
    pub fn is_final(self) -> bool {
        matches!(self, Self::Stopped | Self::Completed)
    }
}

/// Stagger multiplier for the destination at `index` of `count`.
pub fn stagger_multiplier(index: usize, count: usize) -> f64 {
    let behind = count.saturating_sub(index + 1);
    1.0 + behind as f64 * STAGGER_STEP
}

/// Progress of the destination at `index` of `count` given the job's overall
/// accumulated progress.
pub fn destination_progress(overall: f64, index: usize, count: usize) -> f64 {
    (overall * stagger_multiplier(index, count)).min(100.0)
}

/// Run one simulator tick against `job`.
pub fn advance<R: Rng + ?Sized>(
    job: &mut DeliveryJob,
    cursor: &mut ProgressCursor,
    params: &SimulationParams,
    rng: &mut R,
    now: Timestamp,
) -> TickOutcome {
    match job.status {
        status if status.is_terminal() => return TickOutcome::Stopped,
        JobStatus::Queued => {
            if job.scheduled_for.is_some_and(|at| at > now) {
                return TickOutcome::Waiting;
            }
            job.status = JobStatus::Processing;
            job.started_at = Some(now);
            // A retried job re-enters here with progress reset to 0.
            *cursor = ProgressCursor::resume(job);
            return TickOutcome::Started;
        }
        JobStatus::Processing if cursor.accumulated >= PROCESSING_THRESHOLD => {
            job.status = JobStatus::Delivering;
            return TickOutcome::HandedOff;
        }
        _ => {}
    }

    let jitter = rng.random_range(JITTER_MIN..=JITTER_MAX);
    cursor.accumulated = (cursor.accumulated + params.base_increment() * jitter).min(100.0);

    let job_id = job.id;
    let count = job.destinations.len();
    for (index, dest) in job.destinations.iter_mut().enumerate() {
        if matches!(
            dest.status,
            DestinationStatus::Completed | DestinationStatus::Failed
        ) {
            continue;
        }
        let progress = destination_progress(cursor.accumulated, index, count);
        if progress >= 100.0 {
            dest.progress = 100;
            dest.status = DestinationStatus::Completed;
            dest.url = Some(dest.platform.delivered_url(job_id, index));
        } else {
            dest.progress = dest.progress.max(progress.floor() as u8);
            if progress > 0.0 && dest.status == DestinationStatus::Pending {
                dest.status = DestinationStatus::Uploading;
            }
        }
    }

    if job
        .destinations
        .iter()
        .all(|d| d.status == DestinationStatus::Completed)
    {
        job.status = JobStatus::Completed;
        job.progress = 100;
        job.completed_at = Some(now);
        return TickOutcome::Completed;
    }

    // 100 is reserved for the completed state.
    let overall = (cursor.accumulated.floor() as u8).min(99);
    job.progress = job.progress.max(overall);
    TickOutcome::Advanced
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
