// melody-scribe -- describing music in YAML and compiling it to MIDI
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! The canonical description of a piece of music.
//!
//! Values of these types only come out of [`crate::validate`], which guarantees
//! that every field is filled in and within its range.

use crate::raw::RawNode;

pub const DEFAULT_TEMPO: u32 = 120;
pub const DEFAULT_VELOCITY: u8 = 80;
pub const DEFAULT_START: f64 = 0.0;
pub const DEFAULT_DURATION: f64 = 1.0;

/// MIDI only has 16 channels.
pub const MAX_CHANNEL: u8 = 15;
/// Largest value of a 7 bit MIDI data byte (notes, velocities, programs).
pub const MAX_DATA: u8 = 127;

/// A complete song, as described by one YAML document.
#[derive(Debug, Clone, PartialEq)]
pub struct MusicDocument {
    /// The speed of the song measured in beats per minute.
    pub tempo: u32,
    pub time_signature: TimeSignature,
    /// The tracks of the song, playing simultaneously.
    pub tracks: Vec<Track>,
    pub program_changes: Option<Unvalidated>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    /// Beats per measure.
    pub numerator: u32,
    /// The note value of one beat, e.g. 4 for quarter notes.
    pub denominator: u32,
}

impl Default for TimeSignature {
    fn default() -> Self {
        TimeSignature {
            numerator: 4,
            denominator: 4,
        }
    }
}

/// A single instrument voice.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub name: String,
    /// MIDI channel, 0 to 15.
    pub channel: u8,
    /// General MIDI program (instrument), 0 to 127.
    pub program: u8,
    /// The notes in source order. They are not necessarily sorted by start time.
    pub notes: Vec<Note>,
}

impl Track {
    /// Name of a track that was not given one in the source. `index` starts at 0.
    pub fn default_name(index: usize) -> String {
        format!("Track {}", index + 1)
    }

    /// Time when the last note of this track is released, in seconds.
    pub fn length(&self) -> f64 {
        self.notes.iter().map(Note::end).fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Which key is pressed, as MIDI note number. C4 is 60.
    pub pitch: u8,
    /// How hard the key is pressed.
    pub velocity: u8,
    /// Time when the key is pressed, in seconds.
    pub start: f64,
    /// How long the key is held, in seconds.
    pub duration: f64,
}

impl Note {
    /// Time when the key is released, in seconds.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// A part of the source that is carried along without being checked.
#[derive(Debug, Clone, PartialEq)]
pub struct Unvalidated(pub RawNode);

impl Unvalidated {
    pub fn raw(&self) -> &RawNode {
        &self.0
    }
}

impl MusicDocument {
    /// Time when the last note of the song is released, in seconds.
    pub fn length(&self) -> f64 {
        self.tracks.iter().map(Track::length).fold(0.0, f64::max)
    }

    pub fn note_count(&self) -> usize {
        self.tracks.iter().map(|track| track.notes.len()).sum()
    }
}
