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
use std::io::Write;

use bstr::BString;
use indexmap::IndexMap;

use crate::AlnRecord;

type E = Box<dyn std::error::Error>;

/// Read names sharing one tally key, in arrival order.
pub type NameList = Vec<BString>;

#[derive(Debug, Clone)]
pub struct InvalidReferenceId {
    pub reference_id: usize,
    pub n_references: usize,
}

impl std::fmt::Display for InvalidReferenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Reference id {} is not an index into the reference table ({} entries)",
            self.reference_id, self.n_references
        )
    }
}

impl std::error::Error for InvalidReferenceId {}

/// Accumulated tallies for one aggregation run.
///
/// Every mapping is insertion-ordered: keys appear in the order they were
/// first created and the [NameList] buckets only ever grow at the end.
/// State is fresh per run, nothing persists across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadTallies {
    /// Read names grouped by query length.
    pub query_lengths: IndexMap<usize, NameList>,
    /// Read names grouped by aligned (reference-span) length. Records
    /// without a reference span land in the None bucket.
    pub aligned_lengths: IndexMap<Option<u64>, NameList>,
    /// Read names grouped by reference name, then by the position of the
    /// read's 3' end on that reference.
    pub end_positions: IndexMap<String, IndexMap<i64, NameList>>,
    /// Query lengths in arrival order.
    pub all_query_lengths: Vec<usize>,
    /// Aligned lengths in arrival order.
    pub all_aligned_lengths: Vec<Option<u64>>,
}

/// Fold one record into the tallies.
///
/// The record's name is appended to its query length bucket, its aligned
/// length bucket, and its end position bucket under the reference named by
/// `record.reference_id`. The end position is the alignment start for a
/// reverse-strand read and the alignment end otherwise, i.e. always the
/// coordinate of the read's 3' end. The name is then written to `conn_out`
/// as a progress line.
///
/// ## Errors
///
/// Returns [InvalidReferenceId] if `record.reference_id` does not index
/// into `references`. The tallies keep whatever was appended before the
/// error surfaced, matching a run that aborts mid-stream.
pub fn process_record<W: Write>(
    record: &AlnRecord,
    references: &[String],
    tallies: &mut ReadTallies,
    conn_out: &mut W,
) -> Result<(), E> {
    tallies.all_query_lengths.push(record.query_length);
    tallies
        .query_lengths
        .entry(record.query_length)
        .or_default()
        .push(record.query_name.clone());

    tallies.all_aligned_lengths.push(record.reference_length);
    tallies
        .aligned_lengths
        .entry(record.reference_length)
        .or_default()
        .push(record.query_name.clone());

    let read_ref = references
        .get(record.reference_id)
        .ok_or(InvalidReferenceId {
            reference_id: record.reference_id,
            n_references: references.len(),
        })?;

    let read_end = if record.is_reverse {
        record.reference_start
    } else {
        record.reference_end
    };

    tallies
        .end_positions
        .entry(read_ref.clone())
        .or_default()
        .entry(read_end)
        .or_default()
        .push(record.query_name.clone());

    writeln!(conn_out, "{}", record.query_name)?;

    Ok(())
}

/// Tally a stream of records in arrival order.
///
/// Starts from empty [ReadTallies] and calls [process_record] on each
/// record the iterator yields, with no buffering, reordering, or skipping.
/// One empty line is written to `conn_out` after the stream is exhausted.
///
/// The first record or tally error aborts the run and propagates.
///
/// ## Usage
/// ```rust
/// use bstr::BString;
/// use drs_summary::AlnRecord;
/// use drs_summary::aggregate::tally_records;
///
/// let references = vec!["1".to_string(), "2".to_string()];
/// let records: Vec<Result<AlnRecord, Box<dyn std::error::Error>>> = vec![
///     Ok(AlnRecord {
///         query_name: BString::from("r1"),
///         query_length: 100,
///         reference_length: Some(95),
///         reference_id: 0,
///         reference_start: 500,
///         reference_end: 595,
///         is_reverse: false,
///     }),
///     Ok(AlnRecord {
///         query_name: BString::from("r2"),
///         query_length: 80,
///         reference_length: Some(80),
///         reference_id: 0,
///         reference_start: 200,
///         reference_end: 280,
///         is_reverse: true,
///     }),
/// ];
///
/// let mut progress: Vec<u8> = Vec::new();
/// let tallies = tally_records(records, &references, &mut progress).unwrap();
///
/// // r2 is reverse-strand, so its 3' end is the alignment start.
/// assert_eq!(tallies.end_positions["1"][&595], vec![BString::from("r1")]);
/// assert_eq!(tallies.end_positions["1"][&200], vec![BString::from("r2")]);
/// assert_eq!(progress, b"r1\nr2\n\n");
/// ```
pub fn tally_records<I, W>(
    records: I,
    references: &[String],
    conn_out: &mut W,
) -> Result<ReadTallies, E>
where
    I: IntoIterator<Item = Result<AlnRecord, E>>,
    W: Write,
{
    let mut tallies = ReadTallies::default();
    for record in records {
        process_record(&record?, references, &mut tallies, conn_out)?;
    }
    writeln!(conn_out)?;
    Ok(tallies)
}

// Tests
#[cfg(test)]
mod tests {
    use bstr::BString;

    use crate::AlnRecord;

    fn record(
        name: &str,
        query_length: usize,
        reference_length: Option<u64>,
        reference_id: usize,
        reference_start: i64,
        reference_end: i64,
        is_reverse: bool,
    ) -> AlnRecord {
        AlnRecord {
            query_name: BString::from(name),
            query_length,
            reference_length,
            reference_id,
            reference_start,
            reference_end,
            is_reverse,
        }
    }

    fn names(names: &[&str]) -> Vec<BString> {
        names.iter().map(|name| BString::from(*name)).collect()
    }

    #[test]
    fn tally_three_reads() {
        use super::tally_records;

        let references = vec!["1".to_string(), "2".to_string()];
        let records = vec![
            Ok(record("r1", 100, Some(95), 0, 500, 595, false)),
            Ok(record("r2", 80, Some(80), 0, 200, 280, true)),
            Ok(record("r3", 100, Some(90), 0, 700, 790, false)),
        ];

        let mut progress: Vec<u8> = Vec::new();
        let got = tally_records(records, &references, &mut progress).unwrap();

        assert_eq!(got.query_lengths[&100], names(&["r1", "r3"]));
        assert_eq!(got.query_lengths[&80], names(&["r2"]));
        assert_eq!(got.query_lengths.len(), 2);

        assert_eq!(got.aligned_lengths[&Some(95)], names(&["r1"]));
        assert_eq!(got.aligned_lengths[&Some(80)], names(&["r2"]));
        assert_eq!(got.aligned_lengths[&Some(90)], names(&["r3"]));
        assert_eq!(got.aligned_lengths.len(), 3);

        // r2 ends at its alignment start because it is reverse-strand.
        assert_eq!(got.end_positions["1"][&595], names(&["r1"]));
        assert_eq!(got.end_positions["1"][&200], names(&["r2"]));
        assert_eq!(got.end_positions["1"][&790], names(&["r3"]));
        assert_eq!(got.end_positions.len(), 1);

        assert_eq!(got.all_query_lengths, vec![100, 80, 100]);
        assert_eq!(got.all_aligned_lengths, vec![Some(95), Some(80), Some(90)]);

        assert_eq!(progress, b"r1\nr2\nr3\n\n");
    }

    #[test]
    fn buckets_preserve_arrival_order() {
        use super::tally_records;

        let references = vec!["1".to_string()];
        let records = vec![
            Ok(record("r1", 50, Some(50), 0, 100, 150, false)),
            Ok(record("r2", 60, Some(50), 0, 100, 150, false)),
            Ok(record("r3", 50, Some(50), 0, 100, 150, false)),
        ];

        let mut progress: Vec<u8> = Vec::new();
        let got = tally_records(records, &references, &mut progress).unwrap();

        assert_eq!(got.query_lengths[&50], names(&["r1", "r3"]));
        assert_eq!(got.aligned_lengths[&Some(50)], names(&["r1", "r2", "r3"]));
        assert_eq!(got.end_positions["1"][&150], names(&["r1", "r2", "r3"]));
    }

    #[test]
    fn missing_reference_length_lands_in_none_bucket() {
        use super::tally_records;

        let references = vec!["1".to_string()];
        let records = vec![
            Ok(record("r1", 40, Some(40), 0, 100, 140, false)),
            Ok(record("r2", 40, None, 0, 100, 140, false)),
        ];

        let mut progress: Vec<u8> = Vec::new();
        let got = tally_records(records, &references, &mut progress).unwrap();

        assert_eq!(got.aligned_lengths[&Some(40)], names(&["r1"]));
        assert_eq!(got.aligned_lengths[&None], names(&["r2"]));
        assert_eq!(got.all_aligned_lengths, vec![Some(40), None]);
    }

    #[test]
    fn invalid_reference_id_is_an_error() {
        use super::process_record;
        use super::ReadTallies;

        let references = vec!["1".to_string()];
        let bad = record("r1", 40, Some(40), 2, 100, 140, false);

        let mut tallies = ReadTallies::default();
        let mut progress: Vec<u8> = Vec::new();
        let got = process_record(&bad, &references, &mut tallies, &mut progress);

        assert!(got.is_err());
        assert_eq!(
            got.unwrap_err().to_string(),
            "Reference id 2 is not an index into the reference table (1 entries)"
        );
        // The length tallies were updated before the failure surfaced.
        assert_eq!(tallies.query_lengths[&40], names(&["r1"]));
        assert!(tallies.end_positions.is_empty());
        assert!(progress.is_empty());
    }

    #[test]
    fn repeated_runs_are_identical() {
        use super::tally_records;

        let references = vec!["1".to_string(), "2".to_string()];
        let build = || {
            vec![
                Ok(record("r1", 100, Some(95), 0, 500, 595, false)),
                Ok(record("r2", 80, Some(80), 1, 200, 280, true)),
            ]
        };

        let mut progress_a: Vec<u8> = Vec::new();
        let mut progress_b: Vec<u8> = Vec::new();
        let first = tally_records(build(), &references, &mut progress_a).unwrap();
        let second = tally_records(build(), &references, &mut progress_b).unwrap();

        assert_eq!(first, second);
        assert_eq!(progress_a, progress_b);
    }

    #[test]
    fn empty_stream_yields_empty_tallies() {
        use super::tally_records;

        let references = vec!["1".to_string()];
        let records: Vec<Result<AlnRecord, super::E>> = Vec::new();

        let mut progress: Vec<u8> = Vec::new();
        let got = tally_records(records, &references, &mut progress).unwrap();

        assert!(got.query_lengths.is_empty());
        assert!(got.aligned_lengths.is_empty());
        assert!(got.end_positions.is_empty());
        assert_eq!(progress, b"\n");
    }
}
