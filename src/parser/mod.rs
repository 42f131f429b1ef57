/*!
Parsing pipeline: MRT record framing, BGP message decoding, and the
filtering iterators that tie them together.
*/
pub(crate) mod bgp;
pub mod filter;
pub mod iters;
pub mod mrt;
pub(crate) mod utils;

use crate::error::ParserError;
use crate::io::{open_cached_source, open_source};
use crate::models::MrtRecord;
pub use crate::parser::filter::{Filter, Filterable};
pub use crate::parser::iters::{
    ElemIterator, FallibleElemIterator, FallibleRecordIterator, RecordIterator,
};
pub use crate::parser::mrt::elem::ElemExtractor;
pub use crate::parser::mrt::parse_mrt_record;
use std::io::Read;

/// A streaming MRT parser over a local file, a remote URL, or any reader.
///
/// Records are pulled lazily: nothing is read from the source until the
/// parser is iterated or [next_record](MrtParser::next_record) is called.
pub struct MrtParser {
    reader: Box<dyn Read + Send>,
    filters: Vec<Filter>,
}

impl MrtParser {
    /// Open a parser over a local path or a remote URL. Compressed sources
    /// (gzip, bzip2) are decompressed transparently based on the file suffix.
    pub fn new(path: &str) -> Result<MrtParser, ParserError> {
        Ok(MrtParser {
            reader: open_source(path)?,
            filters: vec![],
        })
    }

    /// Like [new](MrtParser::new), but remote files are first downloaded into
    /// `cache_dir` and re-opened from there. Local paths bypass the cache.
    pub fn new_cached(path: &str, cache_dir: &str) -> Result<MrtParser, ParserError> {
        Ok(MrtParser {
            reader: open_cached_source(path, cache_dir)?,
            filters: vec![],
        })
    }

    /// Build a parser from an already-open reader. The reader must yield raw
    /// (uncompressed) MRT bytes.
    pub fn from_reader(reader: impl Read + Send + 'static) -> MrtParser {
        MrtParser {
            reader: Box::new(reader),
            filters: vec![],
        }
    }

    /// Attach a filter by name and value. Element iteration yields only
    /// matching elements; record iteration yields records with at least one
    /// matching element, and peer index tables always pass through.
    ///
    /// See [Filter::new] for the recognized names and value formats.
    pub fn add_filter(mut self, filter_type: &str, filter_value: &str) -> Result<Self, ParserError> {
        self.filters.push(Filter::new(filter_type, filter_value)?);
        Ok(self)
    }

    /// Read and parse the next MRT record from the source.
    ///
    /// Returns [ParserError::EofExpected] at a clean end of stream.
    pub fn next_record(&mut self) -> Result<MrtRecord, ParserError> {
        parse_mrt_record(&mut self.reader)
    }

    /// Iterate over MRT records, logging and skipping parse errors. Attached
    /// filters apply at record granularity.
    pub fn into_record_iter(self) -> RecordIterator {
        RecordIterator::new(self)
    }

    /// Iterate over per-prefix route elements, applying any attached filters.
    pub fn into_elem_iter(self) -> ElemIterator {
        ElemIterator::new(self)
    }

    /// Like [into_record_iter](Self::into_record_iter), but parse errors are
    /// yielded to the caller instead of skipped.
    pub fn into_fallible_record_iter(self) -> FallibleRecordIterator {
        FallibleRecordIterator::new(self)
    }

    /// Like [into_elem_iter](Self::into_elem_iter), but parse errors are
    /// yielded to the caller instead of skipped.
    pub fn into_fallible_elem_iter(self) -> FallibleElemIterator {
        FallibleElemIterator::new(self)
    }
}
