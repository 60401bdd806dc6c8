//! Play engine — walks a sorted event list against the clock and sends each
//! event to a [`MidiSink`].

mod background;

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{trace, warn};

pub use background::{CancelToken, PlaybackHandle, PlaybackOutcome};

use crate::io::{DeviceError, MidiSink, CC_VOLUME};
use crate::score::{is_valid_tempo, Event, EventAction, Payload, DRUM_CHANNEL};

/// Longest single sleep between cancellation checks.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("output device is not connected")]
    NotConnected,
    #[error("nothing to play")]
    NoEvents,
    #[error("tempo {0} BPM cannot be played")]
    InvalidTempo(f64),
    #[error("dispatch failed after {dispatched} events: {source}")]
    Dispatch {
        dispatched: usize,
        source: DeviceError,
    },
    #[error("playback cancelled after {dispatched} events")]
    Cancelled { dispatched: usize },
    #[error("playback thread panicked")]
    WorkerPanicked,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayStats {
    pub dispatched: usize,
    /// Events dropped instead of sent, such as drum-kit program changes off
    /// the drum channel.
    pub suppressed: usize,
    pub elapsed: Duration,
}

impl fmt::Display for PlayStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} events sent, {} suppressed in {:.2}s",
            self.dispatched,
            self.suppressed,
            self.elapsed.as_secs_f64()
        )
    }
}

enum Dispatched {
    Sent,
    Suppressed,
}

/// Plays events at a fixed tempo.
#[derive(Debug, Clone, Copy)]
pub struct PlayEngine {
    bpm: f64,
    realtime: bool,
}

impl PlayEngine {
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm,
            realtime: true,
        }
    }

    /// An engine that sends every event without waiting for its deadline.
    pub fn immediate(bpm: f64) -> Self {
        Self {
            bpm,
            realtime: false,
        }
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Offset of `event` from the start of playback.
    pub fn deadline(&self, event: &Event) -> Duration {
        event.time.to_duration(self.bpm)
    }

    /// Play `events` (already sorted) on the calling thread.
    pub fn play<S: MidiSink + ?Sized>(
        &self,
        sink: &mut S,
        events: &[Event],
        cancel: &CancelToken,
    ) -> Result<PlayStats, PlaybackError> {
        self.run(sink, events, cancel, |_| {})
    }

    /// Play on a background thread. The sink moves to the thread and comes
    /// back through [`PlaybackHandle::wait`].
    pub fn play_async<S: MidiSink + 'static>(
        self,
        sink: S,
        events: Vec<Event>,
        cancel: CancelToken,
    ) -> PlaybackHandle<S> {
        background::spawn(self, sink, events, cancel)
    }

    fn run<S: MidiSink + ?Sized>(
        &self,
        sink: &mut S,
        events: &[Event],
        cancel: &CancelToken,
        mut on_dispatch: impl FnMut(usize),
    ) -> Result<PlayStats, PlaybackError> {
        if events.is_empty() {
            return Err(PlaybackError::NoEvents);
        }
        if !is_valid_tempo(self.bpm) {
            return Err(PlaybackError::InvalidTempo(self.bpm));
        }
        if !sink.is_connected() {
            return Err(PlaybackError::NotConnected);
        }

        let start = Instant::now();
        let end = events.iter().map(|e| e.time).max().unwrap_or_default();
        if start.checked_add(end.to_duration(self.bpm)).is_none() {
            return Err(PlaybackError::InvalidTempo(self.bpm));
        }
        let mut stats = PlayStats::default();
        let mut sounding: Vec<(u8, u8)> = Vec::new();

        for event in events {
            if !self.wait_until(start + self.deadline(event), cancel) {
                silence(sink, &sounding);
                return Err(PlaybackError::Cancelled {
                    dispatched: stats.dispatched,
                });
            }

            match dispatch(sink, event) {
                Ok(Dispatched::Sent) => stats.dispatched += 1,
                Ok(Dispatched::Suppressed) => stats.suppressed += 1,
                Err(source) => {
                    return Err(PlaybackError::Dispatch {
                        dispatched: stats.dispatched,
                        source,
                    })
                }
            }
            track_sounding(&mut sounding, event);
            on_dispatch(stats.dispatched + stats.suppressed);
        }

        stats.elapsed = start.elapsed();
        Ok(stats)
    }

    /// Sleep until `deadline`. Returns `false` if cancelled first.
    fn wait_until(&self, deadline: Instant, cancel: &CancelToken) -> bool {
        loop {
            if cancel.is_cancelled() {
                return false;
            }
            if !self.realtime {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep((deadline - now).min(POLL_INTERVAL));
        }
    }
}

fn dispatch<S: MidiSink + ?Sized>(sink: &mut S, event: &Event) -> Result<Dispatched, DeviceError> {
    let channel = event.channel;
    match (event.action, event.payload) {
        (EventAction::NoteOn, Payload::Pitch(pitch)) => {
            sink.send_note_on(channel, pitch, event.velocity)?
        }
        (EventAction::NoteOff, Payload::Pitch(pitch)) => {
            sink.send_note_off(channel, pitch, event.velocity)?
        }
        (EventAction::ProgramChange, Payload::Instrument(instrument)) => {
            if instrument.is_drum_kit() && channel != DRUM_CHANNEL {
                warn!(
                    instrument = %instrument,
                    channel,
                    "drum kit program change off the drum channel, not sent"
                );
                return Ok(Dispatched::Suppressed);
            }
            sink.send_program_change(channel, instrument.midi_program())?
        }
        (EventAction::VolumeChange, Payload::Volume(volume)) => {
            sink.send_control_change(channel, CC_VOLUME, volume)?
        }
        (action, payload) => {
            warn!(action = action.label(), ?payload, "event payload does not fit its action");
            return Ok(Dispatched::Suppressed);
        }
    }
    trace!(time = %event.time, action = event.action.label(), channel, source = %event.source, "dispatched");
    Ok(Dispatched::Sent)
}

fn track_sounding(sounding: &mut Vec<(u8, u8)>, event: &Event) {
    let Payload::Pitch(pitch) = event.payload else {
        return;
    };
    match event.action {
        EventAction::NoteOn => sounding.push((event.channel, pitch)),
        EventAction::NoteOff => {
            if let Some(i) = sounding.iter().position(|&n| n == (event.channel, pitch)) {
                sounding.swap_remove(i);
            }
        }
        _ => {}
    }
}

/// Best-effort note-offs for everything still sounding.
fn silence<S: MidiSink + ?Sized>(sink: &mut S, sounding: &[(u8, u8)]) {
    for &(channel, pitch) in sounding {
        if let Err(e) = sink.send_note_off(channel, pitch, 0) {
            warn!(channel, pitch, error = %e, "could not silence note");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{MemoryDevice, SentMessage};
    use crate::score::{Beat, EventKind, InstrumentId, PlayableId};

    fn src() -> PlayableId {
        PlayableId::new("test")
    }

    fn note(beat: u32, pitch: u8) -> Vec<Event> {
        let on = Event::note_on(
            Beat::from_beats(beat),
            Beat::from_beats(1),
            EventKind::Note,
            pitch,
            0,
            100,
            src(),
        );
        let off = Event::note_off_for(&on);
        vec![on, off]
    }

    #[test]
    fn deadline_uses_tempo() {
        let engine = PlayEngine::new(120.0);
        let event = &note(2, 60)[0];
        assert_eq!(engine.deadline(event), Duration::from_secs(1));
    }

    #[test]
    fn empty_list_is_an_error() {
        let mut device = MemoryDevice::connected();
        let err = PlayEngine::immediate(120.0)
            .play(&mut device, &[], &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, PlaybackError::NoEvents));
    }

    #[test]
    fn disconnected_sink_is_an_error() {
        let mut device = MemoryDevice::new();
        let err = PlayEngine::immediate(120.0)
            .play(&mut device, &note(0, 60), &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, PlaybackError::NotConnected));
    }

    #[test]
    fn unusable_tempos_are_rejected() {
        for bpm in [f64::NAN, f64::INFINITY, 0.0, -90.0, 1e-300] {
            let mut device = MemoryDevice::connected();
            let err = PlayEngine::immediate(bpm)
                .play(&mut device, &note(2, 60), &CancelToken::new())
                .unwrap_err();
            assert!(matches!(err, PlaybackError::InvalidTempo(_)), "{bpm}");
            assert!(device.is_empty());
        }
    }

    #[test]
    fn events_map_to_messages() {
        let mut device = MemoryDevice::connected();
        let mut events = vec![
            Event::program_change(Beat::ZERO, InstrumentId(40), 1, src()),
            Event::volume_change(Beat::ZERO, 80, 1, src()),
        ];
        events.extend(note(0, 64));
        let stats = PlayEngine::immediate(120.0)
            .play(&mut device, &events, &CancelToken::new())
            .unwrap();
        assert_eq!(stats.dispatched, 4);
        assert_eq!(
            device.messages(),
            vec![
                SentMessage::ProgramChange {
                    channel: 1,
                    program: 40
                },
                SentMessage::ControlChange {
                    channel: 1,
                    controller: CC_VOLUME,
                    value: 80
                },
                SentMessage::NoteOn {
                    channel: 0,
                    pitch: 64,
                    velocity: 100
                },
                SentMessage::NoteOff {
                    channel: 0,
                    pitch: 64,
                    velocity: 0
                },
            ]
        );
    }

    #[test]
    fn drum_kit_program_change_off_drum_channel_is_suppressed() {
        let mut device = MemoryDevice::connected();
        let mut events = vec![Event::program_change(
            Beat::ZERO,
            InstrumentId::STANDARD_DRUM_KIT,
            3,
            src(),
        )];
        events.extend(note(0, 36));
        let stats = PlayEngine::immediate(120.0)
            .play(&mut device, &events, &CancelToken::new())
            .unwrap();
        assert_eq!(stats.suppressed, 1);
        assert_eq!(stats.dispatched, 2);
        assert!(!device
            .messages()
            .iter()
            .any(|m| matches!(m, SentMessage::ProgramChange { .. })));
    }

    #[test]
    fn drum_kit_on_drum_channel_sends_program_zero() {
        let mut device = MemoryDevice::connected();
        let events = vec![Event::program_change(
            Beat::ZERO,
            InstrumentId::TR808_DRUM_KIT,
            DRUM_CHANNEL,
            src(),
        )];
        PlayEngine::immediate(120.0)
            .play(&mut device, &events, &CancelToken::new())
            .unwrap();
        assert_eq!(
            device.messages(),
            vec![SentMessage::ProgramChange {
                channel: DRUM_CHANNEL,
                program: 0
            }]
        );
    }

    #[test]
    fn device_failure_reports_progress() {
        let mut device = MemoryDevice::connected().fail_after(3);
        let mut events = note(0, 60);
        events.extend(note(1, 62));
        let err = PlayEngine::immediate(120.0)
            .play(&mut device, &events, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, PlaybackError::Dispatch { dispatched: 3, .. }));
    }

    #[test]
    fn cancelled_before_start_sends_nothing() {
        let mut device = MemoryDevice::connected();
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = PlayEngine::new(120.0)
            .play(&mut device, &note(0, 60), &cancel)
            .unwrap_err();
        assert!(matches!(err, PlaybackError::Cancelled { dispatched: 0 }));
        assert!(device.is_empty());
    }

    #[test]
    fn realtime_playback_waits_for_deadlines() {
        let mut device = MemoryDevice::connected();
        // 6000 bpm: one beat is 10ms.
        let mut events = note(0, 60);
        events.extend(note(2, 62));
        crate::score::sort_events(&mut events);
        let stats = PlayEngine::new(6000.0)
            .play(&mut device, &events, &CancelToken::new())
            .unwrap();
        assert!(stats.elapsed >= Duration::from_millis(30));
        assert_eq!(device.len(), 4);
    }
}
