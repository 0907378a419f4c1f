// melody-scribe -- describing music in YAML and compiling it to MIDI
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! From source text to a music document, and the state of an editing session.

use log::{debug, info};
use snafu::{ResultExt, Snafu};

use crate::music::MusicDocument;
use crate::raw::{self, SyntaxError};
use crate::validate::{self, ValidationError};

/// A short piece showing every part of the format.
pub const EXAMPLE: &str = r#"# MIDI Configuration
tempo: 120
time_signature: [4, 4]
tracks:
  - name: "Piano"
    channel: 0
    program: 0
    notes:
      - note: 60  # C4
        velocity: 80
        start: 0.0
        duration: 1.0
      - note: 64  # E4
        velocity: 80
        start: 0.0
        duration: 1.0
      - note: 67  # G4
        velocity: 80
        start: 0.0
        duration: 1.0
  - name: "Bass"
    channel: 1
    program: 32
    notes:
      - note: 36  # C2
        velocity: 100
        start: 0.0
        duration: 2.0
"#;

/// Why a text did not produce a document.
#[derive(Debug, Clone, PartialEq, Snafu)]
pub enum Error {
    #[snafu(display("{}", source))]
    Syntax { source: SyntaxError },
    #[snafu(display("{}", source))]
    Validation { source: ValidationError },
}

/// The result of running the pipeline on one text.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The text is empty or only whitespace. Nothing was parsed.
    Empty,
    Valid(MusicDocument),
    Invalid(Error),
}

/// Parse and canonicalize a text.
///
/// Blank text is not a document yet rather than a broken one, so it never
/// produces an error.
pub fn process(text: &str) -> Outcome {
    if text.trim().is_empty() {
        return Outcome::Empty;
    }
    match compile(text) {
        Ok(document) => Outcome::Valid(document),
        Err(err) => Outcome::Invalid(err),
    }
}

/// Parse and canonicalize a text, without the special case for blank input.
pub fn compile(text: &str) -> Result<MusicDocument, Error> {
    let node = raw::parse(text).context(Syntax)?;
    validate::canonicalize(&node).context(Validation)
}

/// What to tell the user after an explicit request for validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub valid: bool,
    pub message: String,
}

impl Verdict {
    pub const VALID_MESSAGE: &'static str = "Your YAML syntax is correct!";
    pub const EMPTY_MESSAGE: &'static str = "Nothing to validate";
}

/// The state behind an editor: the current text and the last document it produced.
///
/// An edit that does not produce a document leaves the previous one in place,
/// so a preview can keep showing it while the user is typing.
#[derive(Debug, Clone, Default)]
pub struct Session {
    text: String,
    document: Option<MusicDocument>,
    error: Option<Error>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the text and process it.
    pub fn edit<S: Into<String>>(&mut self, text: S) {
        self.text = text.into();
        match process(&self.text) {
            Outcome::Empty => {
                debug!("empty text, keeping previous state");
            }
            Outcome::Valid(document) => {
                debug!(
                    "document with {} tracks and {} notes",
                    document.tracks.len(),
                    document.note_count()
                );
                self.document = Some(document);
                self.error = None;
            }
            Outcome::Invalid(err) => {
                debug!("invalid document: {}", err);
                self.error = Some(err);
            }
        }
    }

    /// Replace the text with [`EXAMPLE`].
    pub fn load_example(&mut self) {
        info!("loading example document");
        self.edit(EXAMPLE);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The last document that was produced successfully.
    pub fn document(&self) -> Option<&MusicDocument> {
        self.document.as_ref()
    }

    /// The problem with the current text, if it has one.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Whether the current text is fine, i.e. blank or a valid document.
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Check the current text on request of the user.
    pub fn validate(&self) -> Verdict {
        match process(&self.text) {
            Outcome::Empty => Verdict {
                valid: false,
                message: Verdict::EMPTY_MESSAGE.into(),
            },
            Outcome::Valid(_) => Verdict {
                valid: true,
                message: Verdict::VALID_MESSAGE.into(),
            },
            Outcome::Invalid(err) => Verdict {
                valid: false,
                message: err.to_string(),
            },
        }
    }
}
