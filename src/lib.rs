/*!
bgpsieve is a streaming parser and filter engine for MRT-encoded BGP data.

The pipeline has four stages:

1. **Source reader** ([io]): opens a local file or remote URL, transparently
   decompressing `gz`/`bz2` content, with optional on-disk caching of remote
   files keyed by URL.
2. **Record decoder** ([parser::mrt]): incrementally decodes the MRT envelope
   and the nested BGP messages into [MrtRecord]s.
3. **Filter engine** ([parser::filter]): evaluates declarative filters, built
   from `(name, value)` string pairs such as `("peer_ips", "10.0.0.1,10.0.0.2")`,
   against flattened per-prefix [RouteElem]s.
4. **Iterator** ([parser::iters]): lazily yields the records or elements that
   pass the filters.

# Example

```no_run
use bgpsieve::MrtParser;

let parser = MrtParser::new("http://archive.routeviews.org/bgpdata/2021.10/UPDATES/updates.20211001.0000.bz2")
    .unwrap()
    .add_filter("peer_ips", "185.1.8.65,2001:7f8:73:0:3:fa4:0:1")
    .unwrap();

if let Some(elem) = parser.into_iter().next() {
    println!("{}", elem);
    println!("origin ASNs: {:?}", elem.origin_asns);
}
```
*/
pub mod error;
pub(crate) mod io;
pub mod models;
pub mod parser;

pub use crate::error::ParserError;
pub use crate::models::{ElemType, MrtRecord, RouteElem};
pub use crate::parser::filter::{Filter, Filterable};
pub use crate::parser::iters::{
    ElemIterator, FallibleElemIterator, FallibleRecordIterator, RecordIterator,
};
pub use crate::parser::{ElemExtractor, MrtParser};
