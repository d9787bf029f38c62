//! Source file parser for the places index.
//!
//! Reads the tab-separated source file and converts each row into a canonical
//! `Place`. The source layout is `[id, name, address, phone, lon, lat]` with a
//! header row; note that longitude precedes latitude in the source columns.

use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};

use crate::errors::IngestError;
use places_shared::{GeoPoint, Place};

const COL_ID: usize = 0;
const COL_NAME: usize = 1;
const COL_ADDRESS: usize = 2;
const COL_PHONE: usize = 3;
const COL_LON: usize = 4;
const COL_LAT: usize = 5;

/// Convert one source row into a `Place`.
///
/// Pure transform with no side effects. The id must parse as a non-negative
/// integer and both coordinates as finite floats; any failure rejects the row
/// with a `MalformedRecord` carrying the 1-based source line. Text columns
/// are accepted as-is, empty or not.
///
/// Indexed ids are the 0-based source ids shifted up by one, so the first
/// data row becomes place 1.
pub fn parse_record(record: &StringRecord, line: u64) -> Result<Place, IngestError> {
    let field = |index: usize, name: &str| {
        record
            .get(index)
            .ok_or_else(|| IngestError::malformed(line, format!("missing '{}' column", name)))
    };

    let source_id: u64 = field(COL_ID, "id")?
        .trim()
        .parse()
        .map_err(|_| IngestError::malformed(line, "id is not a non-negative integer"))?;
    let lon: f64 = field(COL_LON, "lon")?
        .trim()
        .parse()
        .map_err(|_| IngestError::malformed(line, "lon is not a number"))?;
    let lat: f64 = field(COL_LAT, "lat")?
        .trim()
        .parse()
        .map_err(|_| IngestError::malformed(line, "lat is not a number"))?;

    let location = GeoPoint::new(lat, lon);
    if !location.is_finite() {
        return Err(IngestError::malformed(line, "coordinates are not finite"));
    }

    Ok(Place::new(
        source_id + 1,
        field(COL_NAME, "name")?,
        field(COL_ADDRESS, "address")?,
        field(COL_PHONE, "phone")?,
        location,
    ))
}

/// Iterator over the places in a tab-separated source file.
///
/// The header row is skipped; each subsequent row yields either a `Place` or
/// a `MalformedRecord` error, letting the caller decide how to handle bad
/// rows without losing its position in the file.
pub struct PlaceRecords {
    records: StringRecordsIntoIter<File>,
    line: u64,
}

impl std::fmt::Debug for PlaceRecords {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaceRecords")
            .field("line", &self.line)
            .finish_non_exhaustive()
    }
}

impl PlaceRecords {
    /// Open the source file for reading.
    pub fn open(path: &Path) -> Result<Self, IngestError> {
        let reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| IngestError::source(e.to_string()))?;

        // The header occupies line 1; data rows start at line 2.
        Ok(Self {
            records: reader.into_records(),
            line: 1,
        })
    }
}

impl Iterator for PlaceRecords {
    type Item = Result<Place, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        self.line += 1;
        Some(match record {
            Ok(record) => parse_record(&record, self.line),
            Err(e) => Err(IngestError::malformed(self.line, e.to_string())),
        })
    }
}
