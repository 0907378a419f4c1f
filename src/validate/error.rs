// melody-scribe -- describing music in YAML and compiling it to MIDI
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! What can be wrong with a document that is valid YAML.

use std::fmt;

use snafu::Snafu;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(&'static str),
    Index(usize),
}

/// Location of a value inside the document, written like `$.tracks[0].notes[2].pitch`.
///
/// # Examples
///
/// ```
/// # use melody_scribe::validate::FieldPath;
/// let path = FieldPath::root().key("tracks").index(0).key("channel");
/// assert_eq!(path.to_string(), "$.tracks[0].channel");
/// assert_eq!(FieldPath::root().to_string(), "$");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// The path of the whole document.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn key(&self, key: &'static str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Key(key));
        FieldPath { segments }
    }

    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        FieldPath { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for segment in &self.segments {
            match segment {
                Segment::Key(key) => write!(f, ".{}", key)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// A numeric value that failed a range check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i128),
    Float(f64),
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) => write!(f, "{}", x),
        }
    }
}

/// The values a field may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bounds {
    /// An integer between `min` and `max`, both included.
    Inclusive { min: i64, max: i64 },
    /// Zero or more.
    NonNegative,
    /// Strictly more than zero.
    Positive,
}

impl Bounds {
    pub fn contains(self, value: f64) -> bool {
        match self {
            Bounds::Inclusive { min, max } => value >= min as f64 && value <= max as f64,
            Bounds::NonNegative => value >= 0.0,
            Bounds::Positive => value > 0.0,
        }
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bounds::Inclusive { min, max } => write!(f, "{}..={}", min, max),
            Bounds::NonNegative => write!(f, ">= 0"),
            Bounds::Positive => write!(f, "> 0"),
        }
    }
}

/// The broad category of a [`ValidationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    ShapeMismatch,
    RangeError,
    MissingField,
}

/// The document parsed, but does not describe music.
#[derive(Debug, Clone, PartialEq, Snafu)]
pub enum ValidationError {
    /// A value has the wrong type or structure.
    #[snafu(display("{}: expected {}, found {}", path, expected, found))]
    ShapeMismatch {
        path: FieldPath,
        expected: &'static str,
        found: String,
    },
    /// A number is outside of what the field allows.
    #[snafu(display("{}: {} {} is out of range {}", path, field, value, allowed))]
    RangeError {
        path: FieldPath,
        field: &'static str,
        value: Number,
        allowed: Bounds,
    },
    /// A field without default value is not there.
    #[snafu(display("{}: missing required field `{}`", path, field))]
    MissingField {
        path: FieldPath,
        field: &'static str,
    },
}

impl ValidationError {
    pub fn kind(&self) -> ValidationErrorKind {
        match self {
            ValidationError::ShapeMismatch { .. } => ValidationErrorKind::ShapeMismatch,
            ValidationError::RangeError { .. } => ValidationErrorKind::RangeError,
            ValidationError::MissingField { .. } => ValidationErrorKind::MissingField,
        }
    }

    /// Where in the document the problem is.
    pub fn path(&self) -> &FieldPath {
        match self {
            ValidationError::ShapeMismatch { path, .. }
            | ValidationError::RangeError { path, .. }
            | ValidationError::MissingField { path, .. } => path,
        }
    }
}
