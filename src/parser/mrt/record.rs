use crate::error::ParserError;
use crate::models::*;
use crate::parser::mrt::bgp4mp::parse_bgp4mp;
use crate::parser::mrt::header::parse_common_header;
use crate::parser::mrt::table_dump_v2::parse_table_dump_v2_message;
use bytes::{Bytes, BytesMut};
use std::io::Read;

/// Read one full MRT record from the reader: common header first, then the
/// body length it declares, then a dispatch on entry type.
///
/// A clean end of stream (EOF exactly at a record boundary) becomes
/// [ParserError::EofExpected].
pub fn parse_mrt_record(input: &mut impl Read) -> Result<MrtRecord, ParserError> {
    let common_header = match parse_common_header(input) {
        Ok(header) => header,
        Err(ParserError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ParserError::EofExpected);
        }
        Err(e) => return Err(e),
    };

    let mut buffer = BytesMut::zeroed(common_header.length as usize);
    input
        .take(common_header.length as u64)
        .read_exact(&mut buffer)?;

    let message = parse_mrt_body(
        common_header.entry_type,
        common_header.entry_subtype,
        buffer.freeze(),
    )?;

    Ok(MrtRecord {
        common_header,
        message,
    })
}

/// Parse an MRT message body given the entry type and subtype from its
/// common header.
pub fn parse_mrt_body(
    entry_type: EntryType,
    entry_subtype: u16,
    data: Bytes,
) -> Result<MrtMessage, ParserError> {
    match entry_type {
        EntryType::BGP4MP | EntryType::BGP4MP_ET => {
            parse_bgp4mp(entry_subtype, data).map(MrtMessage::Bgp4Mp)
        }
        EntryType::TABLE_DUMP_V2 => {
            parse_table_dump_v2_message(entry_subtype, data).map(MrtMessage::TableDumpV2)
        }
        other => Err(ParserError::UnsupportedMrtType {
            mrt_type: other,
            subtype: entry_subtype,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{Buf, BufMut};

    #[test]
    fn test_eof_at_record_boundary() {
        let mut reader = Bytes::new().reader();
        assert!(matches!(
            parse_mrt_record(&mut reader),
            Err(ParserError::EofExpected)
        ));
    }

    #[test]
    fn test_eof_mid_header_is_still_clean() {
        // read_exact reports UnexpectedEof wherever the header is cut short
        let mut reader = Bytes::from_static(&[0, 0, 0, 1, 0, 16]).reader();
        assert!(matches!(
            parse_mrt_record(&mut reader),
            Err(ParserError::EofExpected)
        ));
    }

    #[test]
    fn test_truncated_body() {
        let mut data = BytesMut::new();
        data.put_u32(0); // timestamp
        data.put_u16(EntryType::BGP4MP as u16);
        data.put_u16(Bgp4MpType::MessageAs4 as u16);
        data.put_u32(100); // declares more than follows
        data.put_u16(0);
        let mut reader = data.freeze().reader();
        assert!(matches!(
            parse_mrt_record(&mut reader),
            Err(ParserError::IoError(_))
        ));
    }

    #[test]
    fn test_unsupported_entry_type() {
        let result = parse_mrt_body(EntryType::OSPFv2, 0, Bytes::new());
        assert!(matches!(
            result,
            Err(ParserError::UnsupportedMrtType {
                mrt_type: EntryType::OSPFv2,
                subtype: 0
            })
        ));
    }
}
