//! Compile pipeline integration tests — source text → score → sorted events.

use assert_approx_eq::assert_approx_eq;

use catrock::dsl::{CompileError, Compiler};
use catrock::score::{Beat, Event, EventAction, EventStats, Payload, DRUM_CHANNEL};

fn events(src: &str) -> Vec<Event> {
    Compiler::compile(src).expect("compile failed").events()
}

fn note_ons(events: &[Event]) -> Vec<&Event> {
    events
        .iter()
        .filter(|e| e.action == EventAction::NoteOn)
        .collect()
}

fn song_src() -> &'static str {
    "// a short song
set {
  BPM: 96
  volume: 90
}

section verse {
  track band {
    section melody {
      set { instrument: 73 }
      E4/8 D4/8 C4 D4 E4 E4 E4 half
    }
    section chords {
      set { instrument: 0\n volume: 70 }
      [C] whole
      [G] whole
    }
  }
}

section fill {
  set { instrument: 128 }
  (C2 D2 C2)/2 rest half
}
"
}

// =============================================================================
// Timing
// =============================================================================

#[test]
fn two_quarters_at_120_last_one_second() {
    let score = Compiler::compile("C4 quarter\nD4 quarter").unwrap();
    assert_eq!(score.duration(), Beat::from_beats(2));
    assert_approx_eq!(score.seconds(), 1.0, 1e-9);
}

#[test]
fn midi_numbers() {
    let evs = events("C4 A4 Cs4 Db4 C5 C0");
    let pitches: Vec<Option<u8>> = note_ons(&evs).iter().map(|e| e.pitch()).collect();
    assert_eq!(
        pitches,
        vec![Some(60), Some(69), Some(61), Some(61), Some(72), Some(12)]
    );
}

#[test]
fn section_places_children_in_sequence() {
    let evs = events("section s { C4 D4 }");
    let ons = note_ons(&evs);
    assert_eq!(ons[0].time, Beat::ZERO);
    assert_eq!(ons[1].time, Beat::from_beats(1));
}

#[test]
fn track_places_children_together() {
    let score = Compiler::compile("track t { C4 quarter\nE4 half }").unwrap();
    assert_eq!(score.duration(), Beat::from_beats(2));
    let evs = score.events();
    for on in note_ons(&evs) {
        assert_eq!(on.time, Beat::ZERO);
    }
}

#[test]
fn note_on_sorts_before_note_off_at_equal_time() {
    let evs = events("C4 D4 E4");
    for pair in evs.windows(2) {
        assert!(pair[0].time <= pair[1].time);
        if pair[0].time == pair[1].time {
            assert!(pair[0].action <= pair[1].action);
        }
    }
    // D4's note-on shares beat 1 with C4's note-off.
    let at_one: Vec<EventAction> = evs
        .iter()
        .filter(|e| e.time == Beat::from_beats(1))
        .map(|e| e.action)
        .collect();
    assert_eq!(at_one, vec![EventAction::NoteOn, EventAction::NoteOff]);
}

#[test]
fn quarter_suffix_on_a_group_changes_nothing() {
    let plain = Compiler::compile("(C4 D4 E4)").unwrap();
    let quarter = Compiler::compile("(C4 D4 E4)/4").unwrap();
    assert_eq!(quarter.duration(), Beat::from_beats(3));
    assert_eq!(plain.events(), quarter.events());
}

#[test]
fn dotted_values() {
    let score = Compiler::compile("C4/4. D4 eighth").unwrap();
    assert_eq!(score.duration(), Beat::from_beats(2));
}

#[test]
fn triplet_group() {
    let score = Compiler::compile("(C4 D4 E4)/2 F4").unwrap();
    assert_eq!(score.duration(), Beat::from_beats(3));
    let evs = score.events();
    let ons = note_ons(&evs);
    assert_eq!(ons[3].time, Beat::from_beats(2));
    assert_eq!(ons[1].time, Beat::from_ticks(640));
}

// =============================================================================
// A whole song
// =============================================================================

#[test]
fn song_compiles_with_expected_shape() {
    let score = Compiler::compile(song_src()).unwrap();
    assert_approx_eq!(score.bpm, 96.0);
    assert_eq!(score.volume, 90);
    // verse: max(melody 7, chords 8) = 8, fill: 2 + 2 = 4
    assert_eq!(score.duration(), Beat::from_beats(12));
}

#[test]
fn song_controls_and_channels() {
    let evs = events(song_src());
    let stats = EventStats::from_events(&evs);
    assert_eq!(stats.note_ons, stats.note_offs);
    // melody and drums change program; chords keep piano but lower volume.
    assert_eq!(stats.program_changes, 2);
    assert_eq!(stats.volume_changes, 1);

    let drum_change = evs
        .iter()
        .find(|e| e.payload == Payload::Instrument(catrock::score::InstrumentId(128)))
        .unwrap();
    assert_eq!(drum_change.channel, DRUM_CHANNEL);
    assert_eq!(drum_change.time, Beat::from_beats(8));

    let chord_velocity = evs
        .iter()
        .find(|e| e.action == EventAction::NoteOn && e.pitch() == Some(67))
        .map(|e| e.velocity);
    assert_eq!(chord_velocity, Some(70));
}

#[test]
fn compiling_twice_is_deterministic() {
    assert_eq!(events(song_src()), events(song_src()));
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn syntax_errors_carry_positions() {
    let err = Compiler::compile("C4\ntrack t {\n  D4 %\n}").unwrap_err();
    let CompileError::Syntax(diagnostics) = err else {
        panic!("expected syntax error");
    };
    assert_eq!(diagnostics.len(), 1);
    assert_eq!((diagnostics[0].line, diagnostics[0].col), (3, 6));
}

#[test]
fn unknown_parameter_fails_generation() {
    let err = Compiler::compile("set { swing: 3 }\nC4").unwrap_err();
    assert!(matches!(err, CompileError::Parameters(_)));
    assert!(err.to_string().contains("swing"));
}

#[test]
fn comments_only_has_nothing_to_play() {
    assert_eq!(
        Compiler::compile("// nothing here\n").unwrap_err(),
        CompileError::NoPlayables
    );
}

#[test]
fn json_export_has_one_object_per_event() {
    let evs = events("[C4 E4 G4]");
    let json = serde_json::to_value(&evs).unwrap();
    let array = json.as_array().unwrap();
    assert_eq!(array.len(), 6);
    assert_eq!(array[0]["action"], "note_on");
    assert_eq!(array[0]["kind"], "chord");
}
