// melody-scribe -- describing music in YAML and compiling it to MIDI
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Turning an untyped tree into a [`MusicDocument`].
//!
//! The tree is walked depth first, visiting the fields of each level in the
//! order in which they are declared in [`crate::music`]. Absent fields get
//! their default value, present ones are checked for shape and range.

mod error;
#[cfg(test)]
mod expect_tests;

use std::convert::TryFrom;

use log::debug;

pub use self::error::{Bounds, FieldPath, Number, ValidationError, ValidationErrorKind};

use crate::music::*;
use crate::raw::{Mapping, RawNode, Scalar};

const DOCUMENT_KEYS: &[&str] = &["tempo", "time_signature", "tracks", "program_changes"];
const TRACK_KEYS: &[&str] = &["name", "channel", "program", "notes"];
const NOTE_KEYS: &[&str] = &["note", "pitch", "velocity", "start", "duration"];

/// Check a parsed document and fill in all defaults.
///
/// Stops at the first problem in walk order, which is the first entry that
/// [`diagnose`] would report.
///
/// # Examples
///
/// ```
/// # use melody_scribe::{raw, validate};
/// let doc = validate::canonicalize(&raw::parse("tempo: 100").unwrap()).unwrap();
/// assert_eq!(doc.tempo, 100);
/// assert!(doc.tracks.is_empty());
/// ```
pub fn canonicalize(node: &RawNode) -> Result<MusicDocument, ValidationError> {
    let mut checker = Checker::default();
    let document = checker.document(node);
    match checker.errors.into_iter().next() {
        Some(err) => Err(err),
        None => Ok(document),
    }
}

/// Find every problem of a parsed document, in walk order.
///
/// An empty result means that [`canonicalize`] succeeds.
pub fn diagnose(node: &RawNode) -> Vec<ValidationError> {
    let mut checker = Checker::default();
    checker.document(node);
    checker.errors
}

/// Collects errors while walking the tree.
///
/// Failed fields are replaced by their defaults so that the walk can continue
/// and find the problems further down.
#[derive(Default)]
struct Checker {
    errors: Vec<ValidationError>,
}

impl Checker {
    fn error(&mut self, err: ValidationError) {
        debug!("{}", err);
        self.errors.push(err);
    }

    fn or_default<T>(&mut self, result: Result<T, ValidationError>, default: T) -> T {
        match result {
            Ok(value) => value,
            Err(err) => {
                self.error(err);
                default
            }
        }
    }

    fn document(&mut self, node: &RawNode) -> MusicDocument {
        let path = FieldPath::root();
        let mut document = MusicDocument {
            tempo: DEFAULT_TEMPO,
            time_signature: TimeSignature::default(),
            tracks: Vec::new(),
            program_changes: None,
        };

        let root = match node.as_mapping() {
            Some(root) => root,
            None => {
                self.error(shape_mismatch(&path, "a mapping", node));
                return document;
            }
        };
        log_unknown_keys(root, &path, DOCUMENT_KEYS);

        let tempo = optional(root, "tempo", &path, tempo);
        document.tempo = self.or_default(tempo, None).unwrap_or(DEFAULT_TEMPO);

        let time_signature = optional(root, "time_signature", &path, time_signature);
        document.time_signature = self.or_default(time_signature, None).unwrap_or_default();

        document.tracks = self.tracks(root, &path.key("tracks"));

        // no schema to check against, the payload is handed on as is
        document.program_changes = field(root, "program_changes").cloned().map(Unvalidated);

        document
    }

    fn tracks(&mut self, root: &Mapping, path: &FieldPath) -> Vec<Track> {
        let node = match field(root, "tracks") {
            Some(node) => node,
            None => return Vec::new(),
        };
        let items = match node.as_sequence() {
            Some(items) => items,
            None => {
                self.error(shape_mismatch(path, "a sequence of tracks", node));
                return Vec::new();
            }
        };

        let mut tracks = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            if let Some(track) = self.track(index, item, &path.index(index)) {
                tracks.push(track);
            }
        }
        tracks
    }

    fn track(&mut self, index: usize, node: &RawNode, path: &FieldPath) -> Option<Track> {
        let map = match node.as_mapping() {
            Some(map) => map,
            None => {
                self.error(shape_mismatch(path, "a mapping", node));
                return None;
            }
        };
        log_unknown_keys(map, path, TRACK_KEYS);

        let name = optional(map, "name", path, string);
        let name = self
            .or_default(name, None)
            .unwrap_or_else(|| Track::default_name(index));

        let channel = optional(map, "channel", path, |node, path| {
            midi_int(node, path, "channel", MAX_CHANNEL)
        });
        let channel = self.or_default(channel, None).unwrap_or(0);

        let program = optional(map, "program", path, |node, path| {
            midi_int(node, path, "program", MAX_DATA)
        });
        let program = self.or_default(program, None).unwrap_or(0);

        let notes = self.notes(map, &path.key("notes"));

        Some(Track {
            name,
            channel,
            program,
            notes,
        })
    }

    fn notes(&mut self, track: &Mapping, path: &FieldPath) -> Vec<Note> {
        let node = match field(track, "notes") {
            Some(node) => node,
            None => return Vec::new(),
        };
        let items = match node.as_sequence() {
            Some(items) => items,
            None => {
                self.error(shape_mismatch(path, "a sequence of notes", node));
                return Vec::new();
            }
        };

        let mut notes = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            if let Some(note) = self.note(item, &path.index(index)) {
                notes.push(note);
            }
        }
        notes
    }

    fn note(&mut self, node: &RawNode, path: &FieldPath) -> Option<Note> {
        let map = match node.as_mapping() {
            Some(map) => map,
            None => {
                self.error(shape_mismatch(path, "a mapping", node));
                return None;
            }
        };
        log_unknown_keys(map, path, NOTE_KEYS);

        let pitch = match pitch(map, path) {
            Ok(pitch) => Some(pitch),
            Err(err) => {
                self.error(err);
                None
            }
        };

        let velocity = optional(map, "velocity", path, |node, path| {
            midi_int(node, path, "velocity", MAX_DATA)
        });
        let velocity = self.or_default(velocity, None).unwrap_or(DEFAULT_VELOCITY);

        let start = optional(map, "start", path, |node, path| {
            seconds(node, path, "start", Bounds::NonNegative)
        });
        let start = self.or_default(start, None).unwrap_or(DEFAULT_START);

        let duration = optional(map, "duration", path, |node, path| {
            seconds(node, path, "duration", Bounds::Positive)
        });
        let duration = self.or_default(duration, None).unwrap_or(DEFAULT_DURATION);

        Some(Note {
            pitch: pitch?,
            velocity,
            start,
            duration,
        })
    }
}

/// Look up a key, treating an explicit `null` like a missing key.
fn field<'a>(map: &'a Mapping, key: &str) -> Option<&'a RawNode> {
    map.get(key).filter(|node| !node.is_null())
}

/// Check an optional field. `Ok(None)` if it is not there.
fn optional<T, F>(
    map: &Mapping,
    key: &'static str,
    path: &FieldPath,
    check: F,
) -> Result<Option<T>, ValidationError>
where
    F: FnOnce(&RawNode, &FieldPath) -> Result<T, ValidationError>,
{
    match field(map, key) {
        Some(node) => check(node, &path.key(key)).map(Some),
        None => Ok(None),
    }
}

fn log_unknown_keys(map: &Mapping, path: &FieldPath, known: &[&str]) {
    for key in map.keys().filter(|key| !known.contains(key)) {
        debug!("{}: ignoring unknown key `{}`", path, key);
    }
}

fn shape_mismatch(path: &FieldPath, expected: &'static str, found: &RawNode) -> ValidationError {
    ValidationError::ShapeMismatch {
        path: path.clone(),
        expected,
        found: found.kind().to_string(),
    }
}

fn integer(node: &RawNode, path: &FieldPath) -> Result<i128, ValidationError> {
    match node {
        RawNode::Scalar(Scalar::Int(i)) => Ok(*i),
        _ => Err(shape_mismatch(path, "an integer", node)),
    }
}

fn string(node: &RawNode, path: &FieldPath) -> Result<String, ValidationError> {
    match node {
        RawNode::Scalar(Scalar::Str(s)) => Ok(s.clone()),
        _ => Err(shape_mismatch(path, "a string", node)),
    }
}

/// An integer in `0..=max`.
fn midi_int(
    node: &RawNode,
    path: &FieldPath,
    field: &'static str,
    max: u8,
) -> Result<u8, ValidationError> {
    let value = integer(node, path)?;
    u8::try_from(value)
        .ok()
        .filter(|v| *v <= max)
        .ok_or_else(|| ValidationError::RangeError {
            path: path.clone(),
            field,
            value: Number::Int(value),
            allowed: Bounds::Inclusive {
                min: 0,
                max: max.into(),
            },
        })
}

/// A time in seconds, given as integer or float.
fn seconds(
    node: &RawNode,
    path: &FieldPath,
    field: &'static str,
    allowed: Bounds,
) -> Result<f64, ValidationError> {
    let value = match node {
        RawNode::Scalar(Scalar::Int(i)) => *i as f64,
        RawNode::Scalar(Scalar::Float(x)) if x.is_finite() => *x,
        RawNode::Scalar(Scalar::Float(_)) => {
            return Err(ValidationError::ShapeMismatch {
                path: path.clone(),
                expected: "a finite number",
                found: "a non-finite float".into(),
            })
        }
        _ => return Err(shape_mismatch(path, "a number", node)),
    };
    if allowed.contains(value) {
        Ok(value)
    } else {
        Err(ValidationError::RangeError {
            path: path.clone(),
            field,
            value: Number::Float(value),
            allowed,
        })
    }
}

fn tempo(node: &RawNode, path: &FieldPath) -> Result<u32, ValidationError> {
    let value = integer(node, path)?;
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| ValidationError::RangeError {
            path: path.clone(),
            field: "tempo",
            value: Number::Int(value),
            allowed: Bounds::Inclusive {
                min: 1,
                max: u32::MAX.into(),
            },
        })
}

fn time_signature(node: &RawNode, path: &FieldPath) -> Result<TimeSignature, ValidationError> {
    const EXPECTED: &str = "a sequence of two positive integers";
    let items = node
        .as_sequence()
        .ok_or_else(|| shape_mismatch(path, EXPECTED, node))?;
    if items.len() != 2 {
        return Err(ValidationError::ShapeMismatch {
            path: path.clone(),
            expected: EXPECTED,
            found: format!("a sequence of {} items", items.len()),
        });
    }

    let positive = |item: &RawNode| match item {
        RawNode::Scalar(Scalar::Int(i)) => u32::try_from(*i)
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| ValidationError::ShapeMismatch {
                path: path.clone(),
                expected: EXPECTED,
                found: format!("the integer {}", i),
            }),
        _ => Err(shape_mismatch(path, EXPECTED, item)),
    };
    Ok(TimeSignature {
        numerator: positive(&items[0])?,
        denominator: positive(&items[1])?,
    })
}

/// The pitch is given as `note`, or as `pitch`, but not both.
fn pitch(note: &Mapping, path: &FieldPath) -> Result<u8, ValidationError> {
    let pitch_path = path.key("pitch");
    match (field(note, "note"), field(note, "pitch")) {
        (Some(_), Some(_)) => Err(ValidationError::ShapeMismatch {
            path: pitch_path,
            expected: "only one of `note` and `pitch`",
            found: "both".into(),
        }),
        (Some(node), None) | (None, Some(node)) => midi_int(node, &pitch_path, "pitch", MAX_DATA),
        (None, None) => Err(ValidationError::MissingField {
            path: path.clone(),
            field: "pitch",
        }),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::raw::parse;

    fn check(text: &str) -> Result<MusicDocument, ValidationError> {
        canonicalize(&parse(text).expect("valid yaml"))
    }

    fn check_err(text: &str) -> ValidationError {
        check(text).expect_err("invalid document")
    }

    #[test]
    fn defaults_are_filled_in() {
        let doc = check("tracks:\n  - notes:\n      - note: 64\n").unwrap();
        assert_eq!(doc.tempo, 120);
        assert_eq!(doc.time_signature, TimeSignature::default());
        let track = &doc.tracks[0];
        assert_eq!(track.name, "Track 1");
        assert_eq!(track.channel, 0);
        assert_eq!(track.program, 0);
        assert_eq!(
            track.notes,
            vec![Note {
                pitch: 64,
                velocity: 80,
                start: 0.0,
                duration: 1.0
            }]
        );
    }

    #[test]
    fn explicit_null_means_default() {
        let doc = check("tempo: ~\ntime_signature:\ntracks:\n").unwrap();
        assert_eq!(doc.tempo, 120);
        assert!(doc.tracks.is_empty());
    }

    #[test]
    fn default_names_follow_position() {
        let doc = check("tracks:\n  - name: Bass\n  - {}\n  - {}\n").unwrap();
        let names: Vec<_> = doc.tracks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Bass", "Track 2", "Track 3"]);
    }

    #[test]
    fn zero_tracks_is_valid() {
        let doc = check("tempo: 100").unwrap();
        assert_eq!(doc.tempo, 100);
        assert!(doc.tracks.is_empty());
        assert_eq!(check("tracks: []").unwrap().tracks, vec![]);
    }

    #[test]
    fn pitch_range() {
        let doc = check("tracks:\n  - notes:\n      - note: 127\n").unwrap();
        assert_eq!(doc.tracks[0].notes[0].pitch, 127);

        let err = check_err("tracks:\n  - notes:\n      - note: 128\n");
        assert_eq!(err.kind(), ValidationErrorKind::RangeError);
        assert_eq!(err.path().to_string(), "$.tracks[0].notes[0].pitch");
    }

    #[test]
    fn pitch_alias() {
        let doc = check("tracks:\n  - notes:\n      - pitch: 48\n").unwrap();
        assert_eq!(doc.tracks[0].notes[0].pitch, 48);

        let err = check_err("tracks:\n  - notes:\n      - {note: 48, pitch: 48}\n");
        assert_eq!(err.kind(), ValidationErrorKind::ShapeMismatch);
        assert_eq!(err.path().to_string(), "$.tracks[0].notes[0].pitch");
    }

    #[test]
    fn missing_pitch() {
        let err = check_err("tracks:\n  - notes:\n      - velocity: 10\n");
        assert_eq!(
            err,
            ValidationError::MissingField {
                path: FieldPath::root().key("tracks").index(0).key("notes").index(0),
                field: "pitch",
            }
        );
    }

    #[test]
    fn negative_tempo() {
        let err = check_err("tempo: -5");
        assert_eq!(err.kind(), ValidationErrorKind::RangeError);
        assert_eq!(err.path().to_string(), "$.tempo");
        assert_eq!(check_err("tempo: 0").kind(), ValidationErrorKind::RangeError);
    }

    #[test]
    fn huge_integers_are_out_of_range() {
        let err = check_err("tempo: 18446744073709551615");
        assert_eq!(
            err.to_string(),
            "$.tempo: tempo 18446744073709551615 is out of range 1..=4294967295"
        );
        let err = check_err("tracks:\n  - channel: 9223372036854775808\n");
        assert_eq!(err.kind(), ValidationErrorKind::RangeError);
        assert_eq!(err.path().to_string(), "$.tracks[0].channel");
    }

    #[test]
    fn fractional_tempo() {
        let err = check_err("tempo: 90.5");
        assert_eq!(err.kind(), ValidationErrorKind::ShapeMismatch);
        assert_eq!(err.path().to_string(), "$.tempo");
        assert_eq!(check_err("tempo: fast").kind(), ValidationErrorKind::ShapeMismatch);
    }

    #[test]
    fn time_signature_shapes() {
        let doc = check("time_signature: [3, 8]").unwrap();
        assert_eq!(
            doc.time_signature,
            TimeSignature {
                numerator: 3,
                denominator: 8
            }
        );

        for text in &[
            "time_signature: [3]",
            "time_signature: [3, 4, 4]",
            "time_signature: [3, 0]",
            "time_signature: [-3, 4]",
            "time_signature: [3.5, 4]",
            "time_signature: 3/4",
        ] {
            let err = check_err(text);
            assert_eq!(err.kind(), ValidationErrorKind::ShapeMismatch, "{}", text);
            assert_eq!(err.path().to_string(), "$.time_signature", "{}", text);
        }
    }

    #[test]
    fn channel_is_not_clamped() {
        let err = check_err("tracks:\n  - channel: 16\n");
        assert_eq!(
            err,
            ValidationError::RangeError {
                path: FieldPath::root().key("tracks").index(0).key("channel"),
                field: "channel",
                value: Number::Int(16),
                allowed: Bounds::Inclusive { min: 0, max: 15 },
            }
        );
        assert_eq!(check("tracks:\n  - channel: 15\n").unwrap().tracks[0].channel, 15);
    }

    #[test]
    fn program_range() {
        let err = check_err("tracks:\n  - program: -1\n");
        assert_eq!(err.kind(), ValidationErrorKind::RangeError);
        assert_eq!(err.path().to_string(), "$.tracks[0].program");
    }

    #[test]
    fn note_timing() {
        let doc = check("tracks:\n  - notes:\n      - {note: 60, start: 2, duration: 0.25}\n").unwrap();
        let note = &doc.tracks[0].notes[0];
        assert_eq!(note.start, 2.0);
        assert_eq!(note.duration, 0.25);

        let err = check_err("tracks:\n  - notes:\n      - {note: 60, duration: 0}\n");
        assert_eq!(err.kind(), ValidationErrorKind::RangeError);
        assert_eq!(err.path().to_string(), "$.tracks[0].notes[0].duration");

        let err = check_err("tracks:\n  - notes:\n      - {note: 60, start: -0.5}\n");
        assert_eq!(err.kind(), ValidationErrorKind::RangeError);

        let err = check_err("tracks:\n  - notes:\n      - {note: 60, start: .inf}\n");
        assert_eq!(err.kind(), ValidationErrorKind::ShapeMismatch);
    }

    #[test]
    fn root_must_be_a_mapping() {
        for text in &["- 1\n- 2\n", "42", "just text"] {
            let err = check_err(text);
            assert_eq!(err.kind(), ValidationErrorKind::ShapeMismatch);
            assert!(err.path().is_root());
        }
    }

    #[test]
    fn tracks_must_be_a_sequence() {
        let err = check_err("tracks: {name: Lead}");
        assert_eq!(err.kind(), ValidationErrorKind::ShapeMismatch);
        assert_eq!(err.path().to_string(), "$.tracks");

        let err = check_err("tracks:\n  - Lead\n");
        assert_eq!(err.path().to_string(), "$.tracks[0]");
    }

    #[test]
    fn program_changes_pass_through() {
        let doc = check("program_changes:\n  - {channel: 0, program: 5, at: 1.5}\n").unwrap();
        let payload = doc.program_changes.expect("payload");
        let expected = parse("- {channel: 0, program: 5, at: 1.5}").unwrap();
        assert_eq!(payload.raw(), &expected);

        assert_eq!(check("tempo: 90").unwrap().program_changes, None);
        // anything goes, even things that would be invalid elsewhere
        assert!(check("program_changes: -5").is_ok());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let doc = check("title: Etude\ntracks:\n  - {name: Lead, color: red}\n").unwrap();
        assert_eq!(doc.tracks[0].name, "Lead");
    }

    #[test]
    fn first_error_in_walk_order_wins() {
        let text = "tempo: 0\ntracks:\n  - channel: 99\n    notes:\n      - velocity: 200\n";
        let err = check_err(text);
        assert_eq!(err.path().to_string(), "$.tempo");

        let all = diagnose(&parse(text).unwrap());
        let paths: Vec<_> = all.iter().map(|e| e.path().to_string()).collect();
        assert_eq!(
            paths,
            vec![
                "$.tempo",
                "$.tracks[0].channel",
                "$.tracks[0].notes[0]",
                "$.tracks[0].notes[0].velocity",
            ]
        );
        assert_eq!(all[0], err);
    }

    #[test]
    fn deterministic() {
        let text = "tempo: 90\ntracks:\n  - notes:\n      - note: 60\n      - note: 200\n";
        let node = parse(text).unwrap();
        assert_eq!(canonicalize(&node), canonicalize(&node));
        assert_eq!(canonicalize(&parse(text).unwrap()), canonicalize(&node));
    }
}
