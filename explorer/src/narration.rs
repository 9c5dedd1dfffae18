//! Time-paced voice narration of route steps.
//!
//! Each call to [`Narrator::schedule`] starts a new generation. Step `i` is
//! due at `start + i * interval`, measured from the moment of scheduling, and
//! is only spoken if its generation is still current when it comes due.
//! Cancelling bumps the generation under the same lock the timer task takes
//! before speaking, so nothing is spoken once `cancel` has returned.

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use tokio::{
    task::JoinHandle,
    time::{sleep_until, Instant},
};

use crate::{config::DEFAULT_NARRATION_INTERVAL, models::Step};

/// Text-to-speech output. Calls are fire-and-forget.
pub trait SpeechSink: Send + Sync {
    fn speak(&self, text: &str);

    /// Interrupts whatever is currently being spoken.
    fn stop(&self);
}

/// Speech sink that writes utterances to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSpeech;

impl SpeechSink for LogSpeech {
    fn speak(&self, text: &str) {
        tracing::info!(target: "explorer::speech", "{text}");
    }

    fn stop(&self) {
        tracing::debug!(target: "explorer::speech", "speech stopped");
    }
}

#[derive(Default)]
struct Schedule {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

#[derive(Clone)]
pub struct Narrator {
    sink: Arc<dyn SpeechSink>,
    interval: Duration,
    schedule: Arc<Mutex<Schedule>>,
}

/// Handle to one scheduled narration. Cancelling a handle whose generation has
/// already been superseded does nothing.
#[derive(Clone)]
pub struct NarrationHandle {
    generation: u64,
    narrator: Narrator,
}

impl NarrationHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        self.narrator.generation() == self.generation
    }

    pub fn cancel(&self) {
        let mut schedule = self.narrator.lock();
        if schedule.generation == self.generation {
            self.narrator.invalidate(&mut schedule);
        }
    }
}

impl Narrator {
    pub fn new(sink: Arc<dyn SpeechSink>) -> Self {
        Self::with_interval(sink, DEFAULT_NARRATION_INTERVAL)
    }

    pub fn with_interval(sink: Arc<dyn SpeechSink>, interval: Duration) -> Self {
        Self {
            sink,
            interval,
            schedule: Arc::new(Mutex::new(Schedule::default())),
        }
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Cancels any running narration, then speaks `steps` one per interval.
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, steps: Vec<Step>) -> NarrationHandle {
        let mut schedule = self.lock();
        self.invalidate(&mut schedule);
        let generation = schedule.generation;

        tracing::debug!("narration {generation}: {} steps", steps.len());

        let state = Arc::clone(&self.schedule);
        let sink = Arc::clone(&self.sink);
        let interval = self.interval;
        let start = Instant::now();

        schedule.task = Some(tokio::spawn(async move {
            for (index, step) in steps.into_iter().enumerate() {
                let Some(due) = u32::try_from(index)
                    .ok()
                    .and_then(|index| interval.checked_mul(index))
                    .and_then(|offset| start.checked_add(offset))
                else {
                    tracing::warn!("narration {generation}: step {index} is out of range");
                    return;
                };
                sleep_until(due).await;
                let current = lock(&state);
                if current.generation != generation {
                    return;
                }
                sink.speak(&step.text);
            }
        }));

        NarrationHandle {
            generation,
            narrator: self.clone(),
        }
    }

    /// Stops the current narration, if any.
    pub fn cancel(&self) {
        let mut schedule = self.lock();
        self.invalidate(&mut schedule);
    }

    fn invalidate(&self, schedule: &mut Schedule) {
        schedule.generation += 1;
        if let Some(task) = schedule.task.take() {
            task.abort();
        }
        self.sink.stop();
    }

    fn lock(&self) -> MutexGuard<'_, Schedule> {
        lock(&self.schedule)
    }
}

fn lock(schedule: &Mutex<Schedule>) -> MutexGuard<'_, Schedule> {
    schedule.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
