use super::{canonicalize, diagnose};
use crate::raw::parse;
use expect_test::{expect, Expect};

fn check(input: &str, output: Expect) {
    let node = parse(input).expect("valid yaml");
    let result = canonicalize(&node);
    let debug = format!("{:#?}", result);
    output.assert_eq(&debug);
}

fn check_diagnostics(input: &str, output: Expect) {
    let node = parse(input).expect("valid yaml");
    let messages: Vec<String> = diagnose(&node).iter().map(|e| e.to_string()).collect();
    output.assert_eq(&messages.join("\n"));
}

#[test]
fn canonicalize_lead_example() {
    check(
        r#"tempo: 90
tracks:
  - name: "Lead"
    notes:
      - note: 60
"#,
        expect![[r#"
            Ok(
                MusicDocument {
                    tempo: 90,
                    time_signature: TimeSignature {
                        numerator: 4,
                        denominator: 4,
                    },
                    tracks: [
                        Track {
                            name: "Lead",
                            channel: 0,
                            program: 0,
                            notes: [
                                Note {
                                    pitch: 60,
                                    velocity: 80,
                                    start: 0.0,
                                    duration: 1.0,
                                },
                            ],
                        },
                    ],
                    program_changes: None,
                },
            )"#]],
    );
}

#[test]
fn canonicalize_two_tracks() {
    check(
        r"time_signature: [6, 8]
tracks:
  - channel: 9
    notes:
      - {note: 36, velocity: 127, start: 0.5, duration: 0.25}
  - name: Pad
    program: 88
",
        expect![[r#"
            Ok(
                MusicDocument {
                    tempo: 120,
                    time_signature: TimeSignature {
                        numerator: 6,
                        denominator: 8,
                    },
                    tracks: [
                        Track {
                            name: "Track 1",
                            channel: 9,
                            program: 0,
                            notes: [
                                Note {
                                    pitch: 36,
                                    velocity: 127,
                                    start: 0.5,
                                    duration: 0.25,
                                },
                            ],
                        },
                        Track {
                            name: "Pad",
                            channel: 0,
                            program: 88,
                            notes: [],
                        },
                    ],
                    program_changes: None,
                },
            )"#]],
    );
}

#[test]
fn diagnose_everything_wrong() {
    check_diagnostics(
        r"tempo: -5
time_signature: [4]
tracks:
  - name: 7
    channel: 16
    program: 128
    notes:
      - velocity: 80
      - note: 128
        start: -1
        duration: 0
      - 60
",
        expect![[r#"
            $.tempo: tempo -5 is out of range 1..=4294967295
            $.time_signature: expected a sequence of two positive integers, found a sequence of 1 items
            $.tracks[0].name: expected a string, found an integer
            $.tracks[0].channel: channel 16 is out of range 0..=15
            $.tracks[0].program: program 128 is out of range 0..=127
            $.tracks[0].notes[0]: missing required field `pitch`
            $.tracks[0].notes[1].pitch: pitch 128 is out of range 0..=127
            $.tracks[0].notes[1].start: start -1 is out of range >= 0
            $.tracks[0].notes[1].duration: duration 0 is out of range > 0
            $.tracks[0].notes[2]: expected a mapping, found an integer"#]],
    );
}

#[test]
fn diagnose_valid_document() {
    check_diagnostics("tempo: 100", expect![[r#""#]]);
}
