use crate::error::ParserError;
use crate::models::{CommonHeader, EntryType};
use bytes::Buf;
use std::io::Read;

/// Parse the MRT common header (RFC 6396 section 2).
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           Timestamp                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |             Type              |            Subtype            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                             Length                            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// `_ET` records carry an extra 4-byte microsecond timestamp between the
/// length field and the message, and count it in the length field. The
/// returned header's `length` covers the message only.
pub fn parse_common_header<T: Read>(input: &mut T) -> Result<CommonHeader, ParserError> {
    let mut raw_bytes = [0u8; 12];
    input.read_exact(&mut raw_bytes)?;
    let mut data = &raw_bytes[..];

    let timestamp = data.get_u32();
    let entry_type = EntryType::try_from(data.get_u16())?;
    let entry_subtype = data.get_u16();
    let mut length = data.get_u32();

    let microsecond_timestamp = match entry_type {
        EntryType::BGP4MP_ET | EntryType::ISIS_ET | EntryType::OSPFv3_ET => {
            if length < 4 {
                return Err(ParserError::ParseError(format!(
                    "extended-timestamp record with length {} < 4",
                    length
                )));
            }
            length -= 4;
            let mut raw_bytes = [0u8; 4];
            input.read_exact(&mut raw_bytes)?;
            Some((&raw_bytes[..]).get_u32())
        }
        _ => None,
    };

    Ok(CommonHeader {
        timestamp,
        microsecond_timestamp,
        entry_type,
        entry_subtype,
        length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{Buf, Bytes};

    #[test]
    fn test_parse_common_header() {
        let bytes = Bytes::from_static(&[
            0, 0, 0, 1, // timestamp
            0, 16, // entry type: BGP4MP
            0, 4, // subtype
            0, 0, 0, 5, // length
        ]);
        let mut reader = bytes.reader();
        let header = parse_common_header(&mut reader).unwrap();
        assert_eq!(
            header,
            CommonHeader {
                timestamp: 1,
                microsecond_timestamp: None,
                entry_type: EntryType::BGP4MP,
                entry_subtype: 4,
                length: 5,
            }
        );
    }

    #[test]
    fn test_parse_common_header_et() {
        let bytes = Bytes::from_static(&[
            0, 0, 0, 1, // timestamp
            0, 17, // entry type: BGP4MP_ET
            0, 4, // subtype
            0, 0, 0, 9, // length, including the microsecond field
            0, 3, 130, 112, // 230_000 microseconds
        ]);
        let mut reader = bytes.reader();
        let header = parse_common_header(&mut reader).unwrap();
        assert_eq!(header.microsecond_timestamp, Some(230_000));
        // microsecond field stripped from the stored length
        assert_eq!(header.length, 5);
    }

    #[test]
    fn test_parse_common_header_et_invalid_length() {
        let bytes = Bytes::from_static(&[
            0, 0, 0, 0, // timestamp
            0, 17, // entry type: BGP4MP_ET
            0, 0, // subtype
            0, 0, 0, 3, // length too short to hold the microsecond field
        ]);
        let mut reader = bytes.reader();
        assert!(parse_common_header(&mut reader).is_err());
    }

    #[test]
    fn test_parse_common_header_deprecated_type() {
        // deprecated types still frame, so the header must parse
        let bytes = Bytes::from_static(&[
            0, 0, 0, 0, // timestamp
            0, 5, // deprecated entry type: BGP
            0, 0, // subtype
            0, 0, 0, 6, // length
        ]);
        let mut reader = bytes.reader();
        let header = parse_common_header(&mut reader).unwrap();
        assert_eq!(header.entry_type, EntryType::BGP);
        assert_eq!(header.length, 6);
    }

    #[test]
    fn test_parse_common_header_unknown_type() {
        let bytes = Bytes::from_static(&[
            0, 0, 0, 0, // timestamp
            0, 99, // unassigned entry type
            0, 0, // subtype
            0, 0, 0, 0, // length
        ]);
        let mut reader = bytes.reader();
        assert!(matches!(
            parse_common_header(&mut reader),
            Err(ParserError::UnrecognizedEnumVariant { .. })
        ));
    }
}
