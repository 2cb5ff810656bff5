//! The spooler: a playback engine that replays a [`SimulationLog`] against a
//! [`Scene`] at a speed-scaled real-time rate.
//!
//! # Architecture
//!
//! A [`Spooler`] is a cheap handle around shared state. At most one
//! playback loop runs per spooler; [`Spooler::run`] spawns it on the
//! ambient tokio runtime and hands back a [`RunCompletion`] that resolves
//! when the loop returns to idle.
//!
//! The loop only suspends between steps. Applying a step's events and
//! notifying listeners are synchronous, so [`Spooler::pause`] and
//! [`Spooler::reset`] can never observe a half-applied step. Stopping is
//! cooperative: `pause` raises a flag and wakes the loop, which notices the
//! flag at its next step boundary.
//!
//! Position state lives behind a [`std::sync::Mutex`] that is never held
//! across an `.await`. Listeners are called after every lock is released.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::{Deserialize, Serialize};
use tickreel_events::ApplyError;
use tickreel_scene::Scene;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{PlaybackConfig, SpeedScale, is_positive};
use crate::listeners::{ListenerId, ListenerRegistry, StepListener};
use crate::log::SimulationLog;

/// Errors raised by playback operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpoolerError {
    /// An event failed to apply; the step was not completed.
    #[error("failed to apply step {step}: {source}")]
    Apply {
        /// The step whose events were being applied.
        step: u64,
        /// The underlying apply error.
        source: ApplyError,
    },

    /// A speed factor or speed delta was not a positive finite number.
    #[error("invalid speed {value}: must be a positive finite number")]
    InvalidSpeed {
        /// The rejected value.
        value: f64,
    },

    /// The operation needs the spooler to be idle, but a loop is running.
    #[error("playback loop is running")]
    NotIdle,

    /// The playback loop task ended without producing a result.
    #[error("playback loop aborted: {reason}")]
    LoopAborted {
        /// Why the task ended.
        reason: String,
    },
}

/// Future returned by [`Spooler::run`], resolving to the step the loop
/// stopped at. Cloning it yields another handle to the same run.
pub type RunCompletion = Shared<BoxFuture<'static, Result<u64, SpoolerError>>>;

/// Whether a playback loop is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// No loop is running.
    Idle,
    /// A loop is advancing through the log.
    Running,
    /// A loop is running but has been asked to stop at its next step boundary.
    StopRequested,
}

/// Point-in-time view of a spooler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpoolerStatus {
    /// Current playback position.
    pub current_step: u64,
    /// Highest step whose events have been applied, if any.
    pub last_applied_step: Option<u64>,
    /// Largest timestamp in the log.
    pub total_steps: u64,
    /// Current speed factor.
    pub speed_factor: f64,
    /// Loop state.
    pub run_state: RunState,
}

struct Playback<S> {
    scene: S,
    current_step: u64,
    last_applied: Option<u64>,
}

impl<S: Scene> Playback<S> {
    /// Apply every event at `step`, in log order.
    fn apply_step(&mut self, log: &SimulationLog, step: u64) -> Result<(), SpoolerError> {
        let mut applied: usize = 0;
        for event in log.events_at(step) {
            event
                .apply(&mut self.scene)
                .map_err(|source| SpoolerError::Apply { step, source })?;
            applied = applied.saturating_add(1);
        }
        self.last_applied = Some(step);
        debug!(step, events = applied, "Step applied");
        Ok(())
    }

    /// Apply the current step unless it has already been applied.
    fn catch_up_current(&mut self, log: &SimulationLog) -> Result<u64, SpoolerError> {
        let step = self.current_step;
        if self.last_applied.is_none_or(|last| step > last) {
            self.apply_step(log, step)?;
        }
        Ok(step)
    }

    /// Apply every step after the last applied one up to `target`, without
    /// waiting. On failure the position stays on the last completed step.
    fn fast_forward(&mut self, log: &SimulationLog, target: u64) -> Result<(), SpoolerError> {
        let first = self.last_applied.map_or(0, |last| last.saturating_add(1));
        for step in first..=target {
            if let Err(err) = self.apply_step(log, step) {
                self.current_step = self.last_applied.unwrap_or(0);
                return Err(err);
            }
        }
        self.current_step = target;
        Ok(())
    }

    fn rewind(&mut self) {
        self.scene.reset_all();
        self.current_step = 0;
        self.last_applied = None;
    }
}

struct Inner<S> {
    log: SimulationLog,
    playback: Mutex<Playback<S>>,
    listeners: Mutex<ListenerRegistry>,
    /// Bits of the current `f64` speed factor.
    speed: AtomicU64,
    speed_scale: SpeedScale,
    speed_step: f64,
    stop_requested: AtomicBool,
    stop_notify: Notify,
    /// Completion of the active loop; `Some` exactly while a loop runs.
    run_slot: Mutex<Option<RunCompletion>>,
}

impl<S> Inner<S> {
    fn playback(&self) -> MutexGuard<'_, Playback<S>> {
        self.playback.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners(&self) -> MutexGuard<'_, ListenerRegistry> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run_slot(&self) -> MutexGuard<'_, Option<RunCompletion>> {
        self.run_slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn speed_factor(&self) -> f64 {
        f64::from_bits(self.speed.load(Ordering::Acquire))
    }

    fn notify(&self, step: u64) {
        let listeners = self.listeners().snapshot();
        for listener in listeners {
            listener.on_step_changed(step);
        }
    }
}

/// Clears the run slot when the loop task ends, including by panic.
struct RunGuard<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Drop for RunGuard<S> {
    fn drop(&mut self) {
        let mut slot = self.inner.run_slot();
        *slot = None;
        self.inner.stop_requested.store(false, Ordering::Release);
    }
}

/// Playback engine handle. Clones share the same engine.
pub struct Spooler<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for Spooler<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> std::fmt::Debug for Spooler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spooler")
            .field("total_steps", &self.inner.log.total_steps())
            .field("speed_factor", &self.inner.speed_factor())
            .finish_non_exhaustive()
    }
}

impl<S: Scene + Send + 'static> Spooler<S> {
    /// Create a spooler at step 0 with speed factor 1 and additive speed
    /// steps of 1.
    pub fn new(log: SimulationLog, scene: S) -> Self {
        Self::build(log, scene, PlaybackConfig::default())
    }

    /// Create a spooler using the given playback settings.
    ///
    /// # Errors
    ///
    /// Returns [`SpoolerError::InvalidSpeed`] if the configured speed factor
    /// or speed step is not a positive finite number.
    pub fn with_config(
        log: SimulationLog,
        scene: S,
        config: PlaybackConfig,
    ) -> Result<Self, SpoolerError> {
        validate_speed(config.speed_factor)?;
        validate_speed(config.speed_step)?;
        Ok(Self::build(log, scene, config))
    }

    fn build(log: SimulationLog, scene: S, config: PlaybackConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                log,
                playback: Mutex::new(Playback {
                    scene,
                    current_step: 0,
                    last_applied: None,
                }),
                listeners: Mutex::new(ListenerRegistry::default()),
                speed: AtomicU64::new(config.speed_factor.to_bits()),
                speed_scale: config.speed_scale,
                speed_step: config.speed_step,
                stop_requested: AtomicBool::new(false),
                stop_notify: Notify::new(),
                run_slot: Mutex::new(None),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Loop control
    // -----------------------------------------------------------------------

    /// Start playing from the current step.
    ///
    /// If a loop is already running this is a no-op that returns the
    /// existing completion. Outside a tokio runtime no loop is started and
    /// the completion resolves to [`SpoolerError::LoopAborted`].
    pub fn run(&self) -> RunCompletion {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("Playback requested outside a tokio runtime");
            return futures::future::ready(Err(SpoolerError::LoopAborted {
                reason: String::from("no tokio runtime"),
            }))
            .boxed()
            .shared();
        };

        let mut slot = self.inner.run_slot();
        if let Some(existing) = slot.as_ref() {
            return existing.clone();
        }

        // The slot is locked here; a task dropped unpolled must not touch it.
        let spooler = self.clone();
        let handle = runtime.spawn(async move {
            let _guard = RunGuard {
                inner: Arc::clone(&spooler.inner),
            };
            spooler.play().await
        });
        let completion = async move {
            handle.await.unwrap_or_else(|err| {
                Err(SpoolerError::LoopAborted {
                    reason: err.to_string(),
                })
            })
        }
        .boxed()
        .shared();

        *slot = Some(completion.clone());
        completion
    }

    /// Stop a running loop at its next step boundary.
    ///
    /// Resolves immediately when idle. Otherwise resolves once the loop has
    /// finished its in-flight step and gone idle; no further events are
    /// applied after that until playback is started again.
    pub async fn pause(&self) {
        let pending = {
            let slot = self.inner.run_slot();
            slot.as_ref().map(|completion| {
                self.inner.stop_requested.store(true, Ordering::Release);
                self.inner.stop_notify.notify_one();
                completion.clone()
            })
        };
        if let Some(completion) = pending {
            info!("Pause requested");
            if let Err(err) = completion.await {
                warn!(error = %err, "Playback loop ended with an error");
            }
        }
    }

    /// Pause, rewind to step 0, and restore every entity to its initial
    /// state. Listeners are notified with `0`.
    pub async fn reset(&self) {
        loop {
            self.pause().await;
            if self.with_idle(Playback::rewind).is_some() {
                break;
            }
        }
        info!("Playback reset");
        self.inner.notify(0);
    }

    /// Apply the step after the last applied one (step 0 on a fresh
    /// spooler), clamped to the last step.
    ///
    /// # Errors
    ///
    /// Returns [`SpoolerError::NotIdle`] while a loop is running, or
    /// [`SpoolerError::Apply`] if an event fails.
    pub fn advance_one_step(&self) -> Result<u64, SpoolerError> {
        let total = self.inner.log.total_steps();
        let log = &self.inner.log;
        let step = self
            .with_idle(|playback| -> Result<u64, SpoolerError> {
                let target = playback
                    .last_applied
                    .map_or(0, |last| last.saturating_add(1))
                    .min(total);
                playback.apply_step(log, target)?;
                playback.current_step = target;
                Ok(target)
            })
            .ok_or(SpoolerError::NotIdle)??;
        self.inner.notify(step);
        Ok(step)
    }

    /// Seek to `value`, rounded to the nearest step (halves round up) and
    /// clamped to `0..=total_steps`.
    ///
    /// A running loop is paused first. Seeking backward rewinds the scene
    /// once and replays from step 0; seeking forward applies only the
    /// steps not yet applied. Neither waits between steps, and listeners
    /// are notified once with the final step.
    ///
    /// # Errors
    ///
    /// Returns [`SpoolerError::Apply`] if an event fails; the position then
    /// stays on the last completed step.
    pub async fn skip_to(&self, value: f64) -> Result<u64, SpoolerError> {
        let total = self.inner.log.total_steps();
        let target = round_step(value, total);
        let log = &self.inner.log;
        let outcome = loop {
            self.pause().await;
            let seek = self.with_idle(|playback| {
                let from = playback.current_step;
                if target < from {
                    info!(from, to = target, "Seeking backward");
                    playback.rewind();
                } else {
                    info!(from, to = target, "Seeking forward");
                }
                playback.fast_forward(log, target)
            });
            if let Some(outcome) = seek {
                break outcome;
            }
        };
        outcome?;
        self.inner.notify(target);
        Ok(target)
    }

    async fn play(self) -> Result<u64, SpoolerError> {
        info!(
            from = self.current_step(),
            total_steps = self.inner.log.total_steps(),
            speed_factor = self.inner.speed_factor(),
            "Playback started"
        );
        let result = self.play_steps().await;
        match &result {
            Ok(step) => info!(step, "Playback stopped"),
            Err(err) => warn!(error = %err, "Playback failed"),
        }
        result
    }

    async fn play_steps(&self) -> Result<u64, SpoolerError> {
        let total = self.inner.log.total_steps();
        loop {
            let step = self.inner.playback().catch_up_current(&self.inner.log)?;
            self.inner.notify(step);
            if step >= total {
                return Ok(step);
            }
            if self.wait_step().await {
                return Ok(step);
            }
            {
                let mut playback = self.inner.playback();
                playback.current_step = playback.current_step.saturating_add(1).min(total);
            }
        }
    }

    /// Wait one step duration. Returns `true` if a stop was requested.
    async fn wait_step(&self) -> bool {
        let duration = step_duration(self.inner.speed_factor());
        let deadline = Instant::now().checked_add(duration);
        loop {
            if self.inner.stop_requested.load(Ordering::Acquire) {
                return true;
            }
            let stop = self.inner.stop_notify.notified();
            match deadline {
                Some(deadline) => {
                    tokio::select! {
                        () = tokio::time::sleep_until(deadline) => {
                            return self.inner.stop_requested.load(Ordering::Acquire);
                        }
                        () = stop => {}
                    }
                }
                None => stop.await,
            }
        }
    }

    /// Run `f` on the playback state if no loop is running. The run slot
    /// stays locked for the duration so no loop can start meanwhile.
    fn with_idle<R>(&self, f: impl FnOnce(&mut Playback<S>) -> R) -> Option<R> {
        let slot = self.inner.run_slot();
        if slot.is_some() {
            return None;
        }
        let mut playback = self.inner.playback();
        let result = f(&mut playback);
        drop(playback);
        drop(slot);
        Some(result)
    }

    // -----------------------------------------------------------------------
    // Speed
    // -----------------------------------------------------------------------

    /// Current speed factor.
    pub fn speed_factor(&self) -> f64 {
        self.inner.speed_factor()
    }

    /// Configured default delta for speed changes.
    pub fn speed_step(&self) -> f64 {
        self.inner.speed_step
    }

    /// Set the speed factor; one step then lasts `1 / value` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`SpoolerError::InvalidSpeed`] if `value` is not a positive
    /// finite number. The stored factor is unchanged in that case.
    pub fn set_speed_factor(&self, value: f64) -> Result<f64, SpoolerError> {
        validate_speed(value)?;
        self.inner.speed.store(value.to_bits(), Ordering::Release);
        info!(speed_factor = value, "Speed changed");
        Ok(value)
    }

    /// Increase the speed factor by `by` according to the speed scale.
    ///
    /// # Errors
    ///
    /// Returns [`SpoolerError::InvalidSpeed`] if `by` or the result is not a
    /// positive finite number.
    pub fn increase_speed(&self, by: f64) -> Result<f64, SpoolerError> {
        let scale = self.inner.speed_scale;
        self.adjust_speed(by, |current| scale.increase(current, by))
    }

    /// Decrease the speed factor by `by` according to the speed scale.
    ///
    /// # Errors
    ///
    /// Returns [`SpoolerError::InvalidSpeed`] if `by` or the result is not a
    /// positive finite number; e.g. decreasing `1.0` by `1.0` additively.
    pub fn decrease_speed(&self, by: f64) -> Result<f64, SpoolerError> {
        let scale = self.inner.speed_scale;
        self.adjust_speed(by, |current| scale.decrease(current, by))
    }

    fn adjust_speed(&self, by: f64, next: impl Fn(f64) -> f64) -> Result<f64, SpoolerError> {
        validate_speed(by)?;
        let mut rejected = None;
        let update = self
            .inner
            .speed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                let candidate = next(f64::from_bits(bits));
                if is_positive(candidate) {
                    Some(candidate.to_bits())
                } else {
                    rejected = Some(candidate);
                    None
                }
            });
        match update {
            Ok(previous) => {
                let value = next(f64::from_bits(previous));
                info!(speed_factor = value, "Speed changed");
                Ok(value)
            }
            Err(_) => Err(SpoolerError::InvalidSpeed {
                value: rejected.unwrap_or(by),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Listeners
    // -----------------------------------------------------------------------

    /// Register a position-changed listener.
    pub fn add_step_changed_listener<L>(&self, listener: L) -> ListenerId
    where
        L: StepListener + 'static,
    {
        self.add_shared_step_changed_listener(Arc::new(listener))
    }

    /// Register an already shared listener. Registering the same listener
    /// twice yields two independent registrations.
    pub fn add_shared_step_changed_listener(&self, listener: Arc<dyn StepListener>) -> ListenerId {
        self.inner.listeners().add(listener)
    }

    /// Remove a listener. Returns `false` if `id` was not registered.
    pub fn remove_step_changed_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners().remove(id)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners().len()
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    /// Largest timestamp in the log.
    pub fn total_steps(&self) -> u64 {
        self.inner.log.total_steps()
    }

    /// Current playback position.
    pub fn current_step(&self) -> u64 {
        self.inner.playback().current_step
    }

    /// The log being replayed.
    pub fn log(&self) -> &SimulationLog {
        &self.inner.log
    }

    /// Loop state.
    pub fn run_state(&self) -> RunState {
        let slot = self.inner.run_slot();
        if slot.is_none() {
            RunState::Idle
        } else if self.inner.stop_requested.load(Ordering::Acquire) {
            RunState::StopRequested
        } else {
            RunState::Running
        }
    }

    /// Snapshot of position, speed, and loop state.
    pub fn status(&self) -> SpoolerStatus {
        let run_state = self.run_state();
        let (current_step, last_applied_step) = {
            let playback = self.inner.playback();
            (playback.current_step, playback.last_applied)
        };
        SpoolerStatus {
            current_step,
            last_applied_step,
            total_steps: self.inner.log.total_steps(),
            speed_factor: self.inner.speed_factor(),
            run_state,
        }
    }

    /// Read the scene. Do not call spooler methods from inside `f`.
    pub fn inspect_scene<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.playback().scene)
    }
}

fn validate_speed(value: f64) -> Result<(), SpoolerError> {
    if is_positive(value) {
        Ok(())
    } else {
        Err(SpoolerError::InvalidSpeed { value })
    }
}

/// Wall-clock duration of one step at `speed_factor`.
fn step_duration(speed_factor: f64) -> Duration {
    Duration::try_from_secs_f64(speed_factor.recip()).unwrap_or(Duration::MAX)
}

/// Round to the nearest step, halves up, clamped to `0..=total`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_step(value: f64, total: u64) -> u64 {
    // `round` sends halves away from zero; negatives then saturate to 0
    // and NaN maps to 0.
    let rounded = value.round() as u64;
    rounded.min(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_up() {
        assert_eq!(round_step(1.49, 10), 1);
        assert_eq!(round_step(1.5, 10), 2);
        assert_eq!(round_step(1.51, 10), 2);
        assert_eq!(round_step(0.0, 10), 0);
        assert_eq!(round_step(2.5, 10), 3);
    }

    #[test]
    fn just_below_a_half_rounds_down() {
        let below_half = f64::from_bits(0x3FDF_FFFF_FFFF_FFFF);
        assert!(below_half < 0.5);
        assert_eq!(round_step(below_half, 10), 0);
        assert_eq!(round_step(-0.5, 10), 0);
    }

    #[test]
    fn clamps_out_of_range_targets() {
        assert_eq!(round_step(-3.0, 10), 0);
        assert_eq!(round_step(42.0, 10), 10);
        assert_eq!(round_step(f64::NAN, 10), 0);
        assert_eq!(round_step(f64::INFINITY, 10), 10);
        assert_eq!(round_step(f64::NEG_INFINITY, 10), 0);
    }

    #[test]
    fn step_duration_scales_with_speed() {
        assert_eq!(step_duration(1.0), Duration::from_secs(1));
        assert_eq!(step_duration(2.0), Duration::from_millis(500));
        assert_eq!(step_duration(0.5), Duration::from_secs(2));
        assert_eq!(step_duration(f64::MIN_POSITIVE), Duration::MAX);
    }

    #[test]
    fn speed_validation() {
        assert!(validate_speed(2.0).is_ok());
        for value in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                validate_speed(value),
                Err(SpoolerError::InvalidSpeed { .. })
            ));
        }
    }
}
