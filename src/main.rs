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
use std::io::BufWriter;
use std::io::Write;

use clap::Parser;

use drs_summary::Region;

mod cli;

/// Initializes the logger with verbosity given in `log_max_level`.
fn init_log(log_max_level: usize) {
    stderrlog::new()
    .module(module_path!())
    .quiet(false)
    .verbosity(log_max_level)
    .timestamp(stderrlog::Timestamp::Off)
    .init()
    .unwrap();
}

fn main() {
    let cli = cli::Cli::parse();
    init_log(if cli.verbose { 3 } else { 2 });

    // No files are written in this version, but the prefix is resolved the
    // same way the eventual summary outputs will name themselves.
    let prefix = cli.prefix.clone().unwrap_or_else(|| {
        cli.infile
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    });
    log::debug!("Output prefix set to {}", prefix);

    let region = Region {
        name: cli.reference.clone(),
        start: cli.start,
        end: cli.end,
    };

    log::info!("Parsing alignment data from {}...", cli.infile.display());

    let stdout = std::io::stdout();
    let mut conn_out = BufWriter::new(stdout.lock());
    let tallies = drs_summary::summarize_bam_region(&cli.infile, &region, &mut conn_out)
        .expect("Indexed .bam input");
    conn_out.flush().expect("Writable stdout");

    log::debug!(
        "Tallied {} reads over {} into {} query length, {} aligned length, and {} end position buckets",
        tallies.all_query_lengths.len(),
        region,
        tallies.query_lengths.len(),
        tallies.aligned_lengths.len(),
        tallies.end_positions.values().map(|ends| ends.len()).sum::<usize>(),
    );

    log::info!("Finished. Have a nice day! ;)");
}
