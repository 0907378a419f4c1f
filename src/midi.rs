// melody-scribe -- describing music in YAML and compiling it to MIDI
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Encoding a music document as Standard MIDI File.
//!
//! The file uses format 1: the first track only carries tempo and time
//! signature, followed by one track per track of the document.
//!
//! Every note lasts at least one tick, however short its duration. Notes with
//! velocity 0 are left out, since MIDI reads a silent note-on as a note-off.

use log::{debug, info};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use snafu::Snafu;

use crate::music::{MusicDocument, TimeSignature, Track};

pub const DEFAULT_TICKS_PER_QUARTER: u16 = 480;

/// Largest tick that fits into a MIDI delta time (28 bits).
const MAX_TICK: u32 = 0x0FFF_FFFF;
/// Largest tempo value in microseconds per quarter note (24 bits).
const MAX_TEMPO_MICROS: u32 = 0xFF_FFFF;
/// Largest resolution of metrical timing (15 bits).
const MAX_TICKS_PER_QUARTER: u16 = 0x7FFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Resolution of the file, in ticks per quarter note.
    pub ticks_per_quarter: u16,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            ticks_per_quarter: DEFAULT_TICKS_PER_QUARTER,
        }
    }
}

/// A valid document that a MIDI file cannot express.
#[derive(Debug, Clone, PartialEq, Snafu)]
pub enum EncodingError {
    #[snafu(display("time signature denominator {} is not a power of two", denominator))]
    Denominator { denominator: u32 },
    #[snafu(display("time signature numerator {} is larger than 255", numerator))]
    Numerator { numerator: u32 },
    #[snafu(display("tempo of {} BPM cannot be stored in a MIDI file", bpm))]
    Tempo { bpm: u32 },
    #[snafu(display("{} ticks per quarter note is out of range 1..=32767", ticks))]
    Resolution { ticks: u16 },
    #[snafu(display("track {:?} lasts too long for a MIDI file ({}s)", track, seconds))]
    TooLong { track: String, seconds: f64 },
    #[snafu(display("could not write MIDI data: {}", message))]
    Write { message: String },
}

/// Encode a document with the default options.
pub fn encode(doc: &MusicDocument) -> Result<Vec<u8>, EncodingError> {
    encode_with(doc, EncodeOptions::default())
}

pub fn encode_with(doc: &MusicDocument, options: EncodeOptions) -> Result<Vec<u8>, EncodingError> {
    let tpq = options.ticks_per_quarter;
    if tpq == 0 || tpq > MAX_TICKS_PER_QUARTER {
        return Err(EncodingError::Resolution { ticks: tpq });
    }
    if doc.program_changes.is_some() {
        debug!("program changes are not part of the MIDI output");
    }

    let mut tracks = Vec::with_capacity(doc.tracks.len() + 1);
    tracks.push(conductor_track(doc.tempo, doc.time_signature)?);
    for track in &doc.tracks {
        tracks.push(track_events(track, doc.tempo, tpq)?);
    }

    let smf = Smf {
        header: Header {
            format: Format::Parallel,
            timing: Timing::Metrical(tpq.into()),
        },
        tracks,
    };

    let mut out = Vec::new();
    smf.write(&mut out).map_err(|err| EncodingError::Write {
        message: err.to_string(),
    })?;
    info!(
        "encoded {} tracks at {} ticks per quarter ({} bytes)",
        doc.tracks.len(),
        tpq,
        out.len()
    );
    Ok(out)
}

fn conductor_track(
    bpm: u32,
    time_signature: TimeSignature,
) -> Result<Vec<TrackEvent<'static>>, EncodingError> {
    let micros_per_quarter = 60_000_000 / bpm;
    if micros_per_quarter == 0 || micros_per_quarter > MAX_TEMPO_MICROS {
        return Err(EncodingError::Tempo { bpm });
    }

    let TimeSignature {
        numerator,
        denominator,
    } = time_signature;
    if numerator > u32::from(u8::MAX) {
        return Err(EncodingError::Numerator { numerator });
    }
    if !denominator.is_power_of_two() {
        return Err(EncodingError::Denominator { denominator });
    }

    Ok(vec![
        meta(MetaMessage::Tempo(micros_per_quarter.into())),
        meta(MetaMessage::TimeSignature(
            numerator as u8,
            denominator.trailing_zeros() as u8,
            24, // MIDI clocks per metronome click
            8,  // 32nd notes per quarter note
        )),
        meta(MetaMessage::EndOfTrack),
    ])
}

/// Convert seconds to ticks at the given tempo and resolution.
fn to_ticks(seconds: f64, bpm: u32, tpq: u16) -> Option<u32> {
    let ticks = (seconds * f64::from(bpm) / 60.0 * f64::from(tpq)).round();
    if ticks.is_finite() && ticks >= 0.0 && ticks <= f64::from(MAX_TICK) {
        Some(ticks as u32)
    } else {
        None
    }
}

fn meta(message: MetaMessage) -> TrackEvent {
    TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(message),
    }
}

fn track_events(track: &Track, bpm: u32, tpq: u16) -> Result<Vec<TrackEvent>, EncodingError> {
    let channel = track.channel.into();

    // (absolute tick, note-offs sort before note-ons on the same tick, event)
    let mut timed = Vec::with_capacity(2 * track.notes.len());
    for note in &track.notes {
        if note.velocity == 0 {
            debug!("track {:?}: skipping silent note {}", track.name, note.pitch);
            continue;
        }
        let too_long = || EncodingError::TooLong {
            track: track.name.clone(),
            seconds: note.end(),
        };
        let on = to_ticks(note.start, bpm, tpq).ok_or_else(too_long)?;
        let off = to_ticks(note.end(), bpm, tpq).ok_or_else(too_long)?;
        // the release must not sort before the note's own start
        let off = off.max(on + 1);
        if off > MAX_TICK {
            return Err(too_long());
        }
        timed.push((
            on,
            1,
            MidiMessage::NoteOn {
                key: note.pitch.into(),
                vel: note.velocity.into(),
            },
        ));
        timed.push((
            off,
            0,
            MidiMessage::NoteOff {
                key: note.pitch.into(),
                vel: 0.into(),
            },
        ));
    }
    timed.sort_by_key(|(tick, rank, _)| (*tick, *rank));

    let mut events = Vec::with_capacity(timed.len() + 3);
    events.push(meta(MetaMessage::TrackName(track.name.as_bytes())));
    events.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Midi {
            channel,
            message: MidiMessage::ProgramChange {
                program: track.program.into(),
            },
        },
    });

    let mut previous = 0;
    for (tick, _, message) in timed {
        events.push(TrackEvent {
            delta: (tick - previous).into(),
            kind: TrackEventKind::Midi { channel, message },
        });
        previous = tick;
    }
    events.push(meta(MetaMessage::EndOfTrack));

    debug!(
        "track {:?}: {} events, last at tick {}",
        track.name,
        events.len(),
        previous
    );
    Ok(events)
}
