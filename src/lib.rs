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

//! drs-summary is a library and a command-line client for tallying aligned
//! Oxford Nanopore direct RNA sequencing (DRS) reads from an indexed .bam
//! file.
//!
//! For each read aligned within one reference region, three tallies are
//! accumulated:
//!
//!   - Read names grouped by query length.
//!   - Read names grouped by aligned (reference-span) length.
//!   - Read names grouped by reference name and the position of the read's
//!     3' end on the reference.
//!
//! The 3' end of a reverse-strand alignment is its leftmost reference
//! coordinate, so the end position tally always follows the strand flag.
//!
//! All tallies preserve arrival order: keys appear in the order they were
//! first seen and the names in each bucket are appended in the order the
//! records arrived.
//!
//! ## Usage
//!
//! ### Command line
//!
//! ```text
//! drs-summary reads.bam --reference 1 --start 0 --end 10000
//! ```
//!
//! Read names are printed to stdout in arrival order while the tallies are
//! built. The two progress messages are logged to stderr.
//!
//! ### Rust API
//!
//! [summarize_bam_region] runs the whole pass over one region of an indexed
//! .bam file and returns the tallies. For record streams that are already
//! in memory, use [tally_records](aggregate::tally_records) directly; see
//! its documentation for an example.

use std::fmt;
use std::io::Write;
use std::path::Path;

use bstr::BString;

pub mod aggregate;
pub mod bam;

type E = Box<dyn std::error::Error>;

/// One aligned read, reduced to the fields the tallies consume.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AlnRecord {
    /// Read name. Not guaranteed unique in the input but treated as if it were.
    pub query_name: BString,
    /// Length of the read sequence stored in the record.
    pub query_length: usize,
    /// Length of the alignment's footprint on the reference, or None for a
    /// record without a reference span.
    pub reference_length: Option<u64>,
    /// Index into the reference name table.
    pub reference_id: usize,
    /// Leftmost aligned reference coordinate, 0-based.
    pub reference_start: i64,
    /// One past the rightmost aligned reference coordinate.
    pub reference_end: i64,
    /// Strand flag.
    pub is_reverse: bool,
}

/// A half-open coordinate interval on a named reference sequence.
///
/// ## Usage
/// ```rust
/// use drs_summary::Region;
///
/// let region = Region { name: "1".to_string(), start: 0, end: 10000 };
///
/// assert_eq!(region.to_string(), "1:0-10000");
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Region {
    pub name: String,
    pub start: i64,
    pub end: i64,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}-{}", self.name, self.start, self.end)
    }
}

/// Tally all reads aligned within `region` in an indexed .bam file.
///
/// Opens the file at `bam_path`, reads the reference name table from its
/// header, and runs [tally_records](aggregate::tally_records) over the
/// records the index returns for `region`. The name of each record is
/// written to `conn_out` as it is processed, followed by one empty line
/// after the stream is exhausted.
///
/// Returns the accumulated [ReadTallies](aggregate::ReadTallies).
///
/// ## Errors
///
/// Errors from opening or querying the file, from decoding a record, and
/// from a record whose reference id is not a valid index into the header's
/// reference table all propagate to the caller. The file handle is released
/// when this function returns, on success or on error.
pub fn summarize_bam_region<W: Write>(
    bam_path: &Path,
    region: &Region,
    conn_out: &mut W,
) -> Result<aggregate::ReadTallies, E> {
    let mut source = bam::BamSource::open(bam_path)?;
    let references = source.references().to_vec();
    let records = source.query(region)?;
    aggregate::tally_records(records, &references, conn_out)
}
