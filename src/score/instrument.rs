//! Instrument table: General MIDI programs 0-127 plus drum kits from 128.

use std::fmt;

use serde::Serialize;

/// MIDI channel (zero-based) reserved for percussion.
pub const DRUM_CHANNEL: u8 = 9;

/// Highest valid instrument id.
pub const MAX_INSTRUMENT: u16 = 132;

const DRUM_KIT_BASE: u16 = 128;

/// An instrument reference. Ids below 128 are General MIDI programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct InstrumentId(pub u16);

impl InstrumentId {
    pub const ACOUSTIC_GRAND_PIANO: InstrumentId = InstrumentId(0);
    pub const STANDARD_DRUM_KIT: InstrumentId = InstrumentId(128);
    pub const ROOM_DRUM_KIT: InstrumentId = InstrumentId(129);
    pub const POWER_DRUM_KIT: InstrumentId = InstrumentId(130);
    pub const ELECTRONIC_DRUM_KIT: InstrumentId = InstrumentId(131);
    pub const TR808_DRUM_KIT: InstrumentId = InstrumentId(132);

    /// `None` for ids past the last drum kit.
    pub fn new(id: u16) -> Option<Self> {
        (id <= MAX_INSTRUMENT).then_some(Self(id))
    }

    pub fn is_drum_kit(self) -> bool {
        (DRUM_KIT_BASE..=MAX_INSTRUMENT).contains(&self.0)
    }

    /// Program number sent on the wire. Drum kits select program 0 on the drum channel.
    pub fn midi_program(self) -> u8 {
        if self.0 < DRUM_KIT_BASE {
            self.0 as u8
        } else {
            0
        }
    }

    pub fn name(self) -> &'static str {
        match self.0 {
            id @ 0..=127 => GM_PROGRAM_NAMES[id as usize],
            128 => "Standard Drum Kit",
            129 => "Room Drum Kit",
            130 => "Power Drum Kit",
            131 => "Electronic Drum Kit",
            132 => "TR-808 Drum Kit",
            _ => "Unknown",
        }
    }

    /// Channel an instrument should play on when none is configured.
    pub fn default_channel(self) -> u8 {
        if self.is_drum_kit() {
            DRUM_CHANNEL
        } else {
            0
        }
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}

static GM_PROGRAM_NAMES: [&str; 128] = [
    "Acoustic Grand Piano",
    "Bright Acoustic Piano",
    "Electric Grand Piano",
    "Honky-tonk Piano",
    "Electric Piano 1",
    "Electric Piano 2",
    "Harpsichord",
    "Clavinet",
    "Celesta",
    "Glockenspiel",
    "Music Box",
    "Vibraphone",
    "Marimba",
    "Xylophone",
    "Tubular Bells",
    "Dulcimer",
    "Drawbar Organ",
    "Percussive Organ",
    "Rock Organ",
    "Church Organ",
    "Reed Organ",
    "Accordion",
    "Harmonica",
    "Tango Accordion",
    "Acoustic Guitar (nylon)",
    "Acoustic Guitar (steel)",
    "Electric Guitar (jazz)",
    "Electric Guitar (clean)",
    "Electric Guitar (muted)",
    "Overdriven Guitar",
    "Distortion Guitar",
    "Guitar Harmonics",
    "Acoustic Bass",
    "Electric Bass (finger)",
    "Electric Bass (pick)",
    "Fretless Bass",
    "Slap Bass 1",
    "Slap Bass 2",
    "Synth Bass 1",
    "Synth Bass 2",
    "Violin",
    "Viola",
    "Cello",
    "Contrabass",
    "Tremolo Strings",
    "Pizzicato Strings",
    "Orchestral Harp",
    "Timpani",
    "String Ensemble 1",
    "String Ensemble 2",
    "Synth Strings 1",
    "Synth Strings 2",
    "Choir Aahs",
    "Voice Oohs",
    "Synth Voice",
    "Orchestra Hit",
    "Trumpet",
    "Trombone",
    "Tuba",
    "Muted Trumpet",
    "French Horn",
    "Brass Section",
    "Synth Brass 1",
    "Synth Brass 2",
    "Soprano Sax",
    "Alto Sax",
    "Tenor Sax",
    "Baritone Sax",
    "Oboe",
    "English Horn",
    "Bassoon",
    "Clarinet",
    "Piccolo",
    "Flute",
    "Recorder",
    "Pan Flute",
    "Blown Bottle",
    "Shakuhachi",
    "Whistle",
    "Ocarina",
    "Lead 1 (square)",
    "Lead 2 (sawtooth)",
    "Lead 3 (calliope)",
    "Lead 4 (chiff)",
    "Lead 5 (charang)",
    "Lead 6 (voice)",
    "Lead 7 (fifths)",
    "Lead 8 (bass + lead)",
    "Pad 1 (new age)",
    "Pad 2 (warm)",
    "Pad 3 (polysynth)",
    "Pad 4 (choir)",
    "Pad 5 (bowed)",
    "Pad 6 (metallic)",
    "Pad 7 (halo)",
    "Pad 8 (sweep)",
    "FX 1 (rain)",
    "FX 2 (soundtrack)",
    "FX 3 (crystal)",
    "FX 4 (atmosphere)",
    "FX 5 (brightness)",
    "FX 6 (goblins)",
    "FX 7 (echoes)",
    "FX 8 (sci-fi)",
    "Sitar",
    "Banjo",
    "Shamisen",
    "Koto",
    "Kalimba",
    "Bagpipe",
    "Fiddle",
    "Shanai",
    "Tinkle Bell",
    "Agogo",
    "Steel Drums",
    "Woodblock",
    "Taiko Drum",
    "Melodic Tom",
    "Synth Drum",
    "Reverse Cymbal",
    "Guitar Fret Noise",
    "Breath Noise",
    "Seashore",
    "Bird Tweet",
    "Telephone Ring",
    "Helicopter",
    "Applause",
    "Gunshot",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gm_programs_are_not_drum_kits() {
        assert!(!InstrumentId(0).is_drum_kit());
        assert!(!InstrumentId(127).is_drum_kit());
    }

    #[test]
    fn drum_kits_from_128() {
        assert!(InstrumentId::STANDARD_DRUM_KIT.is_drum_kit());
        assert!(InstrumentId::TR808_DRUM_KIT.is_drum_kit());
        assert_eq!(InstrumentId::STANDARD_DRUM_KIT.midi_program(), 0);
        assert_eq!(InstrumentId::POWER_DRUM_KIT.default_channel(), DRUM_CHANNEL);
    }

    #[test]
    fn program_numbers_pass_through() {
        assert_eq!(InstrumentId(40).midi_program(), 40);
        assert_eq!(InstrumentId(40).name(), "Violin");
        assert_eq!(InstrumentId(40).default_channel(), 0);
    }

    #[test]
    fn out_of_range_ids_rejected() {
        assert_eq!(InstrumentId::new(132), Some(InstrumentId::TR808_DRUM_KIT));
        assert_eq!(InstrumentId::new(133), None);
    }

    #[test]
    fn display_includes_id() {
        assert_eq!(
            InstrumentId::ACOUSTIC_GRAND_PIANO.to_string(),
            "Acoustic Grand Piano (0)"
        );
    }
}
