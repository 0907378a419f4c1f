// melody-scribe -- describing music in YAML and compiling it to MIDI
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Human readable overview of a music document.

use std::fmt;

use serde_yaml::Value;

use crate::music::{MusicDocument, Note, Track};

/// Shown when there is no document to preview.
pub const PLACEHOLDER: &str = "Enter valid YAML to see preview";

/// Displays a document, or a placeholder if there is none yet.
pub struct Preview<'a>(pub Option<&'a MusicDocument>);

pub fn render(document: Option<&MusicDocument>) -> String {
    Preview(document).to_string()
}

impl fmt::Display for Preview<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let doc = match self.0 {
            Some(doc) => doc,
            None => return writeln!(f, "{}", PLACEHOLDER),
        };

        writeln!(f, "Song Settings")?;
        writeln!(f, "  Tempo:          {} BPM", doc.tempo)?;
        writeln!(
            f,
            "  Time Signature: {}/{}",
            doc.time_signature.numerator, doc.time_signature.denominator
        )?;

        writeln!(f, "Tracks ({})", doc.tracks.len())?;
        for track in &doc.tracks {
            write_track(f, track)?;
        }

        if let Some(payload) = &doc.program_changes {
            writeln!(f, "Program Changes")?;
            match serde_yaml::to_string(&Value::from(payload.raw())) {
                Ok(yaml) => {
                    for line in yaml.lines() {
                        writeln!(f, "  {}", line)?;
                    }
                }
                Err(err) => writeln!(f, "  ({})", err)?,
            }
        }
        Ok(())
    }
}

fn write_track(f: &mut fmt::Formatter<'_>, track: &Track) -> fmt::Result {
    writeln!(
        f,
        "  {} [Channel {}] [Program {}] {} notes",
        track.name,
        track.channel,
        track.program,
        track.notes.len()
    )?;
    for note in &track.notes {
        write_note(f, note)?;
    }
    Ok(())
}

fn write_note(f: &mut fmt::Formatter<'_>, note: &Note) -> fmt::Result {
    writeln!(
        f,
        "    Note {:3}  Vel: {:3}  Start: {}s  Duration: {}s",
        note.pitch, note.velocity, note.start, note.duration
    )
}
