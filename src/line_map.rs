// melody-scribe -- describing music in YAML and compiling it to MIDI
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Pointing at places in the YAML source.

use std::fmt::{self, Write};
use std::ops::Range;

/// Position inside a text in a form that's useful for human readers.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Pos {
    /// Line number, starting at 1
    pub line: usize,
    /// Position within the line, in characters, starting at 1
    pub column: usize,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Splits a source text into lines for printing excerpts of it.
pub struct LineMap<'a> {
    /// Ordered vector of the position of line breaks (`\n`)
    line_offsets: Vec<usize>,
    source: &'a str,
}

impl<'a> LineMap<'a> {
    pub fn new(s: &'a str) -> Self {
        Self {
            line_offsets: s
                .char_indices()
                .filter_map(|(pos, ch)| if ch == '\n' { Some(pos) } else { None })
                .collect(),
            source: s,
        }
    }

    /// Number of lines in the source. A trailing line break starts an (empty) extra line.
    pub fn line_count(&self) -> usize {
        self.line_offsets.len() + 1
    }

    /// Return the byte range of the given line (starting at 1), without its line break.
    ///
    /// # Examples
    ///
    /// ```
    /// # use melody_scribe::line_map::LineMap;
    /// let m = LineMap::new("tempo: 90\ntracks: []\n");
    /// assert_eq!(m.line_span(1), 0..9);
    /// assert_eq!(m.line_span(2), 10..20);
    /// assert_eq!(m.line_span(3), 21..21);
    /// ```
    pub fn line_span(&self, line: usize) -> Range<usize> {
        let begin = if line <= 1 {
            0
        } else if line - 2 >= self.line_offsets.len() {
            self.source.len()
        } else {
            self.line_offsets[line - 2] + 1
        };

        let end = if line >= 1 && line - 1 < self.line_offsets.len() {
            self.line_offsets[line - 1]
        } else {
            self.source.len()
        };
        begin..end
    }

    /// Prints the line containing `pos`, plus one before and one after, with line numbers,
    /// and places a `^` under the column of `pos`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use melody_scribe::line_map::*;
    /// let m = LineMap::new("tempo: 90\ntracks: [\nfoo: 1");
    /// assert_eq!(
    ///   m.highlight(Pos { line: 2, column: 9 }, false),
    /// r#"   1|tempo: 90
    ///    2|tracks: [
    ///              ^
    ///    3|foo: 1
    /// "#
    /// )
    /// ```
    pub fn highlight(&self, pos: Pos, colored: bool) -> String {
        let red = "\x1b[31;1m";
        let reset = "\x1b[0m";

        let mut out = String::new();
        let line = pos.line.max(1).min(self.line_count());
        let display_start = 1.max(line - 1);
        let display_end = self.line_count().min(line + 1);
        for current in display_start..=display_end {
            let span = self.line_span(current);
            let line_str = &self.source[span];

            if colored && current == line {
                write!(&mut out, "{}{:4}|{}", red, current, reset).unwrap();
            } else {
                write!(&mut out, "{:4}|", current).unwrap();
            }
            out.push_str(line_str);
            out.push('\n');

            if current == line {
                out.push_str("     ");
                for _ in 1..pos.column.max(1) {
                    out.push(' ');
                }
                if colored {
                    write!(&mut out, "{}^{}", red, reset).unwrap();
                } else {
                    out.push('^');
                }
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn highlight_first_line() {
        let m = LineMap::new("tempo: [1,2\n");
        assert_eq!(
            m.highlight(Pos { line: 1, column: 8 }, false),
            "   1|tempo: [1,2\n            ^\n   2|\n"
        );
    }

    #[test]
    fn highlight_clamps_lines_past_the_end() {
        let m = LineMap::new("a: 1");
        assert_eq!(
            m.highlight(Pos { line: 7, column: 1 }, false),
            "   1|a: 1\n     ^\n"
        );
    }

    #[test]
    fn pos_display() {
        assert_eq!(Pos { line: 3, column: 14 }.to_string(), "3:14");
    }
}
