//! MRT record decoding (RFC 6396): the common header, the BGP4MP and
//! TABLE_DUMP_V2 bodies, and the flattening of records into route elements.
pub(crate) mod bgp4mp;
pub mod elem;
pub(crate) mod header;
pub(crate) mod record;
pub(crate) mod table_dump_v2;

pub use header::parse_common_header;
pub use record::{parse_mrt_body, parse_mrt_record};
