//! Playback integration tests — compiled scores played into a recording device.
//!
//! Tempos are high so that real-time runs stay in the millisecond range.

use std::thread;
use std::time::Duration;

use catrock::dsl::Compiler;
use catrock::io::{MemoryDevice, MidiSink, SentMessage, CC_VOLUME};
use catrock::play::{CancelToken, PlayEngine, PlaybackError};

/// One beat lasts 10ms.
const FAST_BPM: f64 = 6000.0;

fn note_ons(messages: &[SentMessage]) -> Vec<u8> {
    messages
        .iter()
        .filter_map(|m| match m {
            SentMessage::NoteOn { pitch, .. } => Some(*pitch),
            _ => None,
        })
        .collect()
}

#[test]
fn melody_plays_in_order() {
    let score = Compiler::compile("C4 D4 E4 F4").unwrap();
    let mut device = MemoryDevice::connected();
    let stats = PlayEngine::new(FAST_BPM)
        .play(&mut device, &score.events(), &CancelToken::new())
        .unwrap();

    assert_eq!(stats.dispatched, 8);
    assert_eq!(stats.suppressed, 0);
    assert!(stats.elapsed >= Duration::from_millis(40));
    assert_eq!(note_ons(&device.messages()), vec![60, 62, 64, 65]);
}

#[test]
fn container_settings_become_messages() {
    let score =
        Compiler::compile("track lead {\n set { instrument: 81\n channel: 3\n volume: 64 }\n A4\n}")
            .unwrap();
    let mut device = MemoryDevice::connected();
    PlayEngine::immediate(score.bpm)
        .play(&mut device, &score.events(), &CancelToken::new())
        .unwrap();

    assert_eq!(
        device.messages(),
        vec![
            SentMessage::ProgramChange {
                channel: 3,
                program: 81
            },
            SentMessage::ControlChange {
                channel: 3,
                controller: CC_VOLUME,
                value: 64
            },
            SentMessage::NoteOn {
                channel: 3,
                pitch: 69,
                velocity: 64
            },
            SentMessage::NoteOff {
                channel: 3,
                pitch: 69,
                velocity: 0
            },
        ]
    );
}

#[test]
fn drum_kit_with_explicit_channel_is_not_sent_as_program() {
    let score =
        Compiler::compile("track drums {\n set { instrument: 130\n channel: 2 }\n C2\n}").unwrap();
    let mut device = MemoryDevice::connected();
    let stats = PlayEngine::immediate(score.bpm)
        .play(&mut device, &score.events(), &CancelToken::new())
        .unwrap();

    assert_eq!(stats.suppressed, 1);
    assert_eq!(stats.dispatched, 2);
    assert!(device
        .messages()
        .iter()
        .all(|m| !matches!(m, SentMessage::ProgramChange { .. })));
}

#[test]
fn async_playback_reports_through_the_handle() {
    let score = Compiler::compile("C4 E4 G4 C5").unwrap();
    let device = MemoryDevice::connected();
    let log = device.clone();

    let handle = PlayEngine::new(FAST_BPM).play_async(device, score.events(), CancelToken::new());
    assert_eq!(handle.total(), 8);
    let outcome = handle.wait();

    let stats = outcome.result.unwrap();
    assert_eq!(stats.dispatched, 8);
    assert_eq!(log.len(), 8);
    let mut sink = outcome.sink.expect("sink returned");
    assert!(sink.is_connected());
    sink.disconnect().unwrap();
    assert!(!sink.is_connected());
}

#[test]
fn cancelling_stops_and_silences() {
    // Two long notes at normal tempo: the second would start after 2s.
    let score = Compiler::compile("track t { C4 whole\nE4 whole }\nG4 whole").unwrap();
    let device = MemoryDevice::connected();
    let log = device.clone();
    let cancel = CancelToken::new();

    let handle = PlayEngine::new(120.0).play_async(device, score.events(), cancel.clone());
    while handle.progress() < 2 {
        thread::sleep(Duration::from_millis(1));
    }
    cancel.cancel();
    let outcome = handle.wait();

    assert!(matches!(
        outcome.result,
        Err(PlaybackError::Cancelled { dispatched: 2 })
    ));
    let messages = log.messages();
    assert_eq!(note_ons(&messages), vec![60, 64]);
    let offs = messages
        .iter()
        .filter(|m| matches!(m, SentMessage::NoteOff { .. }))
        .count();
    assert_eq!(offs, 2);
}

#[test]
fn async_failure_is_reported() {
    let score = Compiler::compile("C4 D4").unwrap();
    let device = MemoryDevice::connected().fail_after(1);
    let outcome = PlayEngine::immediate(120.0)
        .play_async(device, score.events(), CancelToken::new())
        .wait();
    assert!(matches!(
        outcome.result,
        Err(PlaybackError::Dispatch { dispatched: 1, .. })
    ));
}

#[test]
fn async_empty_timeline() {
    let outcome = PlayEngine::immediate(120.0)
        .play_async(MemoryDevice::connected(), Vec::new(), CancelToken::new())
        .wait();
    assert!(matches!(outcome.result, Err(PlaybackError::NoEvents)));
}
