// drs-summary: Summary tallies for aligned Oxford Nanopore direct RNA sequencing reads.
//
// Copyright 2026 drs-summary contributors.
//
// Copyrights in this project are retained by contributors. No copyright assignment
// is required to contribute to this project.
//
// Except as otherwise noted (below and/or in individual files), this
// project is licensed under the Apache License, Version 2.0
// <LICENSE-APACHE> or <http://www.apache.org/licenses/LICENSE-2.0> or
// the MIT license, <LICENSE-MIT> or <http://opensource.org/licenses/MIT>,
// at your option.
//
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(version)]
#[command(about = "Tally read lengths, aligned lengths, and 3' end positions for aligned ONT DRS reads.")]
pub struct Cli {
    // Input bam file
    #[arg(required = true, help = "Input .bam file (the index must exist next to it)")]
    pub infile: PathBuf,

    // Prefix for output file names
    #[arg(short = 'p', long = "prefix", help = "Prefix string for output filenames, defaults to the input file name")]
    pub prefix: Option<String>,

    // Region to summarize
    #[arg(long = "reference", default_value = "1", help = "Reference sequence name to summarize")]
    pub reference: String,

    #[arg(long = "start", default_value_t = 0, help = "Region start coordinate, 0-based inclusive")]
    pub start: i64,

    #[arg(long = "end", default_value_t = 10000, help = "Region end coordinate, exclusive")]
    pub end: i64,

    // Verbosity
    #[arg(short = 'v', long = "verbose", default_value_t = false)]
    pub verbose: bool,
}
