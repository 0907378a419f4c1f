// melody-scribe -- describing music in YAML and compiling it to MIDI
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Parsing YAML text into an untyped tree.
//!
//! The tree knows nothing about music. It only keeps the shape of the source
//! (scalars, sequences and mappings) so that the validator can match on it.

use std::convert::TryFrom;
use std::fmt;

use log::trace;
use serde_yaml::Value;

use crate::line_map::Pos;

/// A leaf of the untyped tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    /// Wide enough for every integer YAML hands us, `i64::MIN..=u64::MAX`.
    Int(i128),
    Float(f64),
    Str(String),
}

/// The untyped result of parsing a document.
#[derive(Debug, Clone, PartialEq)]
pub enum RawNode {
    Scalar(Scalar),
    Sequence(Vec<RawNode>),
    Mapping(Mapping),
}

/// String-keyed mapping that remembers the order of its keys.
///
/// Keys are unique; the parser rejects documents where they are not.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mapping {
    entries: Vec<(String, RawNode)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&RawNode> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert a new entry at the end. Returns the entry back if the key already exists.
    pub fn insert(&mut self, key: String, value: RawNode) -> Result<(), (String, RawNode)> {
        if self.contains_key(&key) {
            return Err((key, value));
        }
        self.entries.push((key, value));
        Ok(())
    }

    /// Iterate the entries in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RawNode {
    /// A short description of the kind of node, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            RawNode::Scalar(Scalar::Null) => "null",
            RawNode::Scalar(Scalar::Bool(_)) => "a boolean",
            RawNode::Scalar(Scalar::Int(_)) => "an integer",
            RawNode::Scalar(Scalar::Float(_)) => "a float",
            RawNode::Scalar(Scalar::Str(_)) => "a string",
            RawNode::Sequence(_) => "a sequence",
            RawNode::Mapping(_) => "a mapping",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawNode::Scalar(Scalar::Null))
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        if let RawNode::Mapping(m) = self {
            Some(m)
        } else {
            None
        }
    }

    pub fn as_sequence(&self) -> Option<&[RawNode]> {
        if let RawNode::Sequence(items) = self {
            Some(items)
        } else {
            None
        }
    }
}

/// The text is not valid YAML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// Human readable description, as reported by the YAML parser.
    pub message: String,
    /// Where the parser gave up, if known.
    pub location: Option<Pos>,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SyntaxError {}

impl From<serde_yaml::Error> for SyntaxError {
    fn from(err: serde_yaml::Error) -> Self {
        SyntaxError {
            location: err.location().map(|loc| Pos {
                line: loc.line(),
                column: loc.column(),
            }),
            message: err.to_string(),
        }
    }
}

/// Parse YAML text into an untyped tree.
///
/// # Examples
///
/// ```
/// # use melody_scribe::raw::{parse, RawNode, Scalar};
/// let node = parse("tempo: 90").unwrap();
/// let tempo = node.as_mapping().and_then(|m| m.get("tempo"));
/// assert_eq!(tempo, Some(&RawNode::Scalar(Scalar::Int(90))));
///
/// assert!(parse("tempo: [1,2").is_err());
/// ```
pub fn parse(text: &str) -> Result<RawNode, SyntaxError> {
    let value: Value = serde_yaml::from_str(text)?;
    let node = from_yaml(value)?;
    trace!("parsed {} into a tree", node.kind());
    Ok(node)
}

fn from_yaml(value: Value) -> Result<RawNode, SyntaxError> {
    Ok(match value {
        Value::Null => RawNode::Scalar(Scalar::Null),
        Value::Bool(b) => RawNode::Scalar(Scalar::Bool(b)),
        Value::Number(n) => RawNode::Scalar(if let Some(i) = n.as_i64() {
            Scalar::Int(i.into())
        } else if let Some(u) = n.as_u64() {
            Scalar::Int(u.into())
        } else {
            Scalar::Float(n.as_f64().unwrap_or(f64::NAN))
        }),
        Value::String(s) => RawNode::Scalar(Scalar::Str(s)),
        Value::Sequence(items) => RawNode::Sequence(
            items
                .into_iter()
                .map(from_yaml)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Mapping(entries) => {
            let mut mapping = Mapping::new();
            for (key, value) in entries {
                let key = key_string(key)?;
                mapping
                    .insert(key, from_yaml(value)?)
                    .map_err(|(key, _)| SyntaxError {
                        message: format!("duplicate entry with key {:?}", key),
                        location: None,
                    })?;
            }
            RawNode::Mapping(mapping)
        }
        Value::Tagged(tagged) => from_yaml(tagged.value)?,
    })
}

/// Scalar keys are used by their textual form, e.g. `1: x` has the key `"1"`.
fn key_string(key: Value) -> Result<String, SyntaxError> {
    match key {
        Value::String(s) => Ok(s),
        Value::Null => Ok("null".into()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Tagged(tagged) => key_string(tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => Err(SyntaxError {
            message: "only scalar mapping keys are supported".into(),
            location: None,
        }),
    }
}

impl From<&Scalar> for Value {
    fn from(scalar: &Scalar) -> Self {
        match scalar {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Int(i) => match (i64::try_from(*i), u64::try_from(*i)) {
                (Ok(i), _) => Value::Number(i.into()),
                (_, Ok(u)) => Value::Number(u.into()),
                _ => Value::Number((*i as f64).into()),
            },
            Scalar::Float(f) => Value::Number((*f).into()),
            Scalar::Str(s) => Value::String(s.clone()),
        }
    }
}

impl From<&RawNode> for Value {
    fn from(node: &RawNode) -> Self {
        match node {
            RawNode::Scalar(scalar) => scalar.into(),
            RawNode::Sequence(items) => Value::Sequence(items.iter().map(Value::from).collect()),
            RawNode::Mapping(mapping) => {
                let mut out = serde_yaml::Mapping::new();
                for (key, value) in mapping.iter() {
                    out.insert(Value::String(key.to_string()), value.into());
                }
                Value::Mapping(out)
            }
        }
    }
}
