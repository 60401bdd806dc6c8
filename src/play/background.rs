//! Playback on a dedicated thread, with a one-shot completion signal.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::{PlayEngine, PlayStats, PlaybackError};
use crate::io::MidiSink;
use crate::score::Event;

/// Shared stop flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// What a background run hands back: its result, and the sink unless the
/// thread died with it.
#[derive(Debug)]
pub struct PlaybackOutcome<S> {
    pub result: Result<PlayStats, PlaybackError>,
    pub sink: Option<S>,
}

/// A running background playback.
pub struct PlaybackHandle<S> {
    done: Receiver<Result<PlayStats, PlaybackError>>,
    thread: Option<JoinHandle<S>>,
    cancel: CancelToken,
    progress: Arc<AtomicUsize>,
    total: usize,
    started: Instant,
    length: Duration,
}

pub(super) fn spawn<S: MidiSink + 'static>(
    engine: PlayEngine,
    mut sink: S,
    events: Vec<Event>,
    cancel: CancelToken,
) -> PlaybackHandle<S> {
    let (tx, done) = mpsc::sync_channel(1);
    let progress = Arc::new(AtomicUsize::new(0));
    let total = events.len();
    let length = events
        .last()
        .map(|e| engine.deadline(e))
        .unwrap_or_default();

    let thread = {
        let cancel = cancel.clone();
        let progress = progress.clone();
        thread::spawn(move || {
            let result = engine.run(&mut sink, &events, &cancel, |n| {
                progress.store(n, Ordering::Relaxed);
            });
            // The receiver may already be gone; the result is then unwanted.
            let _ = tx.send(result);
            sink
        })
    };

    PlaybackHandle {
        done,
        thread: Some(thread),
        cancel,
        progress,
        total,
        started: Instant::now(),
        length,
    }
}

impl<S> PlaybackHandle<S> {
    /// Events handled so far.
    pub fn progress(&self) -> usize {
        self.progress.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Wall-clock time of the last event.
    pub fn length(&self) -> Duration {
        self.length
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block until the run ends.
    pub fn wait(mut self) -> PlaybackOutcome<S> {
        let result = self
            .done
            .recv()
            .unwrap_or(Err(PlaybackError::WorkerPanicked));
        let sink = self.thread.take().and_then(|t| t.join().ok());
        PlaybackOutcome { result, sink }
    }
}

impl<S> Drop for PlaybackHandle<S> {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.cancel.cancel();
            let _ = thread.join();
        }
    }
}
