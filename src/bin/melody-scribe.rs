// melody-scribe -- describing music in YAML and compiling it to MIDI
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! `melody-scribe` checks a YAML description of music, previews it, and writes it as MIDI file.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

use log::{error, info};
use snafu::{ResultExt, Snafu};
use structopt::StructOpt;

use melody_scribe::line_map::LineMap;
use melody_scribe::pipeline::{self, Outcome};
use melody_scribe::raw::{self, SyntaxError};
use melody_scribe::{midi, preview, validate};

#[derive(Debug, StructOpt)]
#[structopt(name = "melody-scribe", about = "Convert YAML to MIDI with ease")]
struct Opt {
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: usize,

    /// The YAML description of the music. Read from standard input if not given.
    #[structopt(parse(from_os_str))]
    source: Option<PathBuf>,

    /// Write the music to this file as Standard MIDI File.
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    /// Resolution of the MIDI file.
    #[structopt(long, default_value = "480")]
    ticks_per_quarter: u16,

    /// Dump the canonical description of the song.
    #[structopt(long)]
    #[allow(clippy::option_option)]
    dump_description: Option<Option<PathBuf>>,

    /// Print an example document and exit.
    #[structopt(long)]
    example: bool,

    /// Do not color the source excerpts of syntax errors.
    #[structopt(long)]
    no_color: bool,
}

#[derive(Debug, Snafu)]
enum CliError {
    #[snafu(display("could not set up logging: {}", source))]
    Logger { source: log::SetLoggerError },
    #[snafu(display("could not read {}: {}", path.display(), source))]
    ReadSource { path: PathBuf, source: io::Error },
    #[snafu(display("could not read standard input: {}", source))]
    ReadStdin { source: io::Error },
    #[snafu(display("could not write {}: {}", path.display(), source))]
    WriteOutput { path: PathBuf, source: io::Error },
    #[snafu(display("{}", source))]
    Encode { source: midi::EncodingError },
}

fn main() {
    let opt = Opt::from_args();
    match run(opt) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(err) => {
            eprintln!("error: {}", err);
            process::exit(2);
        }
    }
}

/// Returns whether the document was valid.
fn run(opt: Opt) -> Result<bool, CliError> {
    let level = match opt.verbose {
        0 => log::Level::Info,
        1 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    simple_logger::init_with_level(level).context(Logger)?;

    if opt.example {
        print!("{}", pipeline::EXAMPLE);
        return Ok(true);
    }

    let (name, text) = match &opt.source {
        Some(path) => (
            path.display().to_string(),
            std::fs::read_to_string(path).context(ReadSource { path })?,
        ),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).context(ReadStdin)?;
            ("<stdin>".to_string(), text)
        }
    };

    info!("checking {}", name);
    let document = match pipeline::process(&text) {
        Outcome::Valid(document) => document,
        Outcome::Empty => {
            error!("{} does not contain a document", name);
            return Ok(false);
        }
        Outcome::Invalid(pipeline::Error::Syntax { source }) => {
            log_syntax_error(&name, &text, &source, !opt.no_color);
            return Ok(false);
        }
        Outcome::Invalid(pipeline::Error::Validation { .. }) => {
            log_validation_errors(&name, &text);
            return Ok(false);
        }
    };

    let dump_out = opt
        .dump_description
        .map(|path| path.unwrap_or_else(|| "/dev/stdout".into()));
    if let Some(dump_out_path) = dump_out {
        let mut f = File::create(&dump_out_path).context(WriteOutput {
            path: &dump_out_path,
        })?;
        writeln!(f, "{:#?}", document).context(WriteOutput {
            path: &dump_out_path,
        })?;
    }

    print!("{}", preview::Preview(Some(&document)));

    if let Some(output) = &opt.output {
        let options = midi::EncodeOptions {
            ticks_per_quarter: opt.ticks_per_quarter,
        };
        let bytes = midi::encode_with(&document, options).context(Encode)?;
        std::fs::write(output, &bytes).context(WriteOutput { path: output })?;
        info!("wrote {}", output.display());
    }
    Ok(true)
}

fn log_syntax_error(name: &str, text: &str, err: &SyntaxError, colored: bool) {
    use std::fmt::Write;
    let mut buf = String::new();
    write!(&mut buf, "{}", err).unwrap();
    if let Some(pos) = err.location {
        writeln!(&mut buf, " ({} {})", name, pos).unwrap();
        buf.push_str(&LineMap::new(text).highlight(pos, colored));
    }
    error!("{}", buf);
}

/// Report every problem of the document, not just the first one.
fn log_validation_errors(name: &str, text: &str) {
    let node = match raw::parse(text) {
        Ok(node) => node,
        Err(err) => {
            error!("{}: {}", name, err);
            return;
        }
    };
    let errors = validate::diagnose(&node);
    for err in &errors {
        error!("{}: {}", name, err);
    }
    error!("{}: {} problems found", name, errors.len());
}
