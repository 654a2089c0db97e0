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
use std::path::Path;

use bstr::BString;
use rust_htslib::bam;
use rust_htslib::bam::ext::BamRecordExtensions;
use rust_htslib::bam::Read;

use crate::AlnRecord;
use crate::Region;

type E = Box<dyn std::error::Error>;

#[derive(Debug, Clone)]
pub struct UnplacedRecord {
    pub query_name: BString,
}

impl std::fmt::Display for UnplacedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Record {} has no reference sequence id",
            self.query_name
        )
    }
}

impl std::error::Error for UnplacedRecord {}

/// An indexed .bam file opened for region queries.
///
/// Wraps the htslib reader behind the two capabilities the tallies need:
/// the ordered reference name table from the header, and a lazy record
/// stream for one region. The underlying file handle is closed on drop.
pub struct BamSource {
    reader: bam::IndexedReader,
    references: Vec<String>,
}

impl BamSource {
    /// Open `path` and its index, and read the reference name table.
    pub fn open(
        path: &Path,
    ) -> Result<Self, E> {
        let reader = bam::IndexedReader::from_path(path)?;
        let references = reader
            .header()
            .target_names()
            .iter()
            .map(|name| String::from_utf8_lossy(name).to_string())
            .collect();
        Ok(Self { reader, references })
    }

    /// Reference names in header order, indexable by reference id.
    pub fn references(&self) -> &[String] {
        &self.references
    }

    /// Records overlapping `region`, decoded lazily in file order.
    pub fn query(
        &mut self,
        region: &Region,
    ) -> Result<impl Iterator<Item = Result<AlnRecord, E>> + '_, E> {
        self.reader
            .fetch((region.name.as_str(), region.start, region.end))?;
        Ok(self.reader.records().map(|result| {
            let record = result?;
            aln_record_from_bam(&record)
        }))
    }
}

/// Reduce an htslib record to the fields the tallies consume.
///
/// The aligned length is the record's footprint on the reference, None when
/// the unmapped flag is set. A record without a reference sequence id is
/// rejected with [UnplacedRecord] since none of the tallies can place it.
pub fn aln_record_from_bam(
    record: &bam::Record,
) -> Result<AlnRecord, E> {
    let query_name = BString::from(record.qname());
    let reference_id = usize::try_from(record.tid()).map_err(|_| UnplacedRecord {
        query_name: query_name.clone(),
    })?;

    let reference_start = record.pos();
    let reference_end = record.reference_end();
    let reference_length = if record.is_unmapped() {
        None
    } else {
        Some((reference_end - reference_start) as u64)
    };

    Ok(AlnRecord {
        query_name,
        query_length: record.seq_len(),
        reference_length,
        reference_id,
        reference_start,
        reference_end,
        is_reverse: record.is_reverse(),
    })
}
