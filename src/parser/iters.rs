/*!
Lazy iterators over MRT records and route elements.

[RecordIterator] and [ElemIterator] log and skip records that fail to
parse, stopping only on IO errors or end of stream. The fallible variants
surface every error to the caller instead.
*/
use crate::error::ParserError;
use crate::models::{MrtMessage, MrtRecord, RouteElem, TableDumpV2Message};
use crate::parser::filter::{Filter, Filterable};
use crate::parser::mrt::elem::ElemExtractor;
use crate::parser::MrtParser;
use log::{error, warn};

/// Record-level filter check: a record passes when any of its elements
/// matches the filter set. Peer index tables carry no elements but are
/// required to interpret the RIB records after them, so they always pass.
fn record_matches(extractor: &mut ElemExtractor, filters: &[Filter], record: &MrtRecord) -> bool {
    if filters.is_empty() {
        return true;
    }
    if matches!(
        record.message,
        MrtMessage::TableDumpV2(TableDumpV2Message::PeerIndexTable(_))
    ) {
        // still feed it to the extractor so later RIB records resolve peers
        extractor.record_to_elems(record.clone());
        return true;
    }
    extractor
        .record_to_elems(record.clone())
        .iter()
        .any(|elem| elem.match_filters(filters))
}

/// Iterating a parser directly yields filtered [RouteElem]s.
impl IntoIterator for MrtParser {
    type Item = RouteElem;
    type IntoIter = ElemIterator;

    fn into_iter(self) -> Self::IntoIter {
        ElemIterator::new(self)
    }
}

pub struct RecordIterator {
    parser: MrtParser,
    extractor: ElemExtractor,
    filters: Vec<Filter>,
    pub count: u64,
}

impl RecordIterator {
    pub(crate) fn new(mut parser: MrtParser) -> RecordIterator {
        let filters = std::mem::take(&mut parser.filters);
        RecordIterator {
            parser,
            extractor: ElemExtractor::new(),
            filters,
            count: 0,
        }
    }
}

impl Iterator for RecordIterator {
    type Item = MrtRecord;

    fn next(&mut self) -> Option<MrtRecord> {
        loop {
            match self.parser.next_record() {
                Ok(record) => {
                    if !record_matches(&mut self.extractor, &self.filters, &record) {
                        continue;
                    }
                    self.count += 1;
                    return Some(record);
                }
                Err(ParserError::EofExpected) => return None,
                Err(ParserError::IoError(e)) => {
                    // an unreadable source cannot produce further records
                    error!("IO error reading MRT stream: {}", e);
                    return None;
                }
                Err(e) => {
                    warn!("skipping unparsable record: {}", e);
                }
            }
        }
    }
}

pub struct ElemIterator {
    record_iter: RecordIterator,
    extractor: ElemExtractor,
    filters: Vec<Filter>,
    // elements of the current record in reverse order, popped from the back
    cache_elems: Vec<RouteElem>,
    pub count: u64,
}

impl ElemIterator {
    pub(crate) fn new(mut parser: MrtParser) -> ElemIterator {
        let filters = std::mem::take(&mut parser.filters);
        ElemIterator {
            record_iter: RecordIterator::new(parser),
            extractor: ElemExtractor::new(),
            filters,
            cache_elems: vec![],
            count: 0,
        }
    }
}

impl Iterator for ElemIterator {
    type Item = RouteElem;

    fn next(&mut self) -> Option<RouteElem> {
        loop {
            if let Some(elem) = self.cache_elems.pop() {
                if elem.match_filters(&self.filters) {
                    self.count += 1;
                    return Some(elem);
                }
                continue;
            }

            let record = self.record_iter.next()?;
            let mut elems = self.extractor.record_to_elems(record);
            elems.reverse();
            self.cache_elems = elems;
        }
    }
}

/// Record iterator that yields parse errors instead of skipping them.
/// Iteration still ends at a clean end of stream.
pub struct FallibleRecordIterator {
    parser: MrtParser,
    extractor: ElemExtractor,
    filters: Vec<Filter>,
    pub count: u64,
}

impl FallibleRecordIterator {
    pub(crate) fn new(mut parser: MrtParser) -> FallibleRecordIterator {
        let filters = std::mem::take(&mut parser.filters);
        FallibleRecordIterator {
            parser,
            extractor: ElemExtractor::new(),
            filters,
            count: 0,
        }
    }
}

impl Iterator for FallibleRecordIterator {
    type Item = Result<MrtRecord, ParserError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.parser.next_record() {
                Ok(record) => {
                    if !record_matches(&mut self.extractor, &self.filters, &record) {
                        continue;
                    }
                    self.count += 1;
                    return Some(Ok(record));
                }
                Err(ParserError::EofExpected) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Element iterator that yields parse errors instead of skipping them.
pub struct FallibleElemIterator {
    record_iter: FallibleRecordIterator,
    extractor: ElemExtractor,
    filters: Vec<Filter>,
    cache_elems: Vec<RouteElem>,
    pub count: u64,
}

impl FallibleElemIterator {
    pub(crate) fn new(mut parser: MrtParser) -> FallibleElemIterator {
        let filters = std::mem::take(&mut parser.filters);
        FallibleElemIterator {
            record_iter: FallibleRecordIterator::new(parser),
            extractor: ElemExtractor::new(),
            filters,
            cache_elems: vec![],
            count: 0,
        }
    }
}

impl Iterator for FallibleElemIterator {
    type Item = Result<RouteElem, ParserError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(elem) = self.cache_elems.pop() {
                if elem.match_filters(&self.filters) {
                    self.count += 1;
                    return Some(Ok(elem));
                }
                continue;
            }

            match self.record_iter.next()? {
                Ok(record) => {
                    let mut elems = self.extractor.record_to_elems(record);
                    elems.reverse();
                    self.cache_elems = elems;
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
