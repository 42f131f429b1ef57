//! Bounds-checked readers for the wire-level integer, address and prefix
//! fields shared by every decoder in the crate.
use crate::error::ParserError;
use crate::models::*;
use bytes::{Buf, Bytes};
use ipnet::IpNet;
use log::debug;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

impl ReadUtils for Bytes {}

/// Extension trait over [Buf] that turns out-of-bounds reads into
/// [ParserError::ShortInput] instead of panics.
pub trait ReadUtils: Buf {
    #[inline]
    fn expect_remaining(&self, n: usize) -> Result<(), ParserError> {
        match self.remaining() >= n {
            true => Ok(()),
            false => Err(ParserError::ShortInput { expected: n }),
        }
    }

    #[inline]
    fn read_u8(&mut self) -> Result<u8, ParserError> {
        self.expect_remaining(1)?;
        Ok(self.get_u8())
    }

    #[inline]
    fn read_u16(&mut self) -> Result<u16, ParserError> {
        self.expect_remaining(2)?;
        Ok(self.get_u16())
    }

    #[inline]
    fn read_u32(&mut self) -> Result<u32, ParserError> {
        self.expect_remaining(4)?;
        Ok(self.get_u32())
    }

    fn read_ipv4_address(&mut self) -> Result<Ipv4Addr, ParserError> {
        self.read_u32().map(Ipv4Addr::from)
    }

    fn read_ipv6_address(&mut self) -> Result<Ipv6Addr, ParserError> {
        self.expect_remaining(16)?;
        Ok(Ipv6Addr::from(self.get_u128()))
    }

    fn read_address(&mut self, afi: Afi) -> Result<IpAddr, ParserError> {
        match afi {
            Afi::Ipv4 => self.read_ipv4_address().map(IpAddr::V4),
            Afi::Ipv6 => self.read_ipv6_address().map(IpAddr::V6),
        }
    }

    #[inline]
    fn read_asn(&mut self, asn_len: AsnLength) -> Result<Asn, ParserError> {
        match asn_len {
            AsnLength::Bits16 => self.read_u16().map(Asn::new_16bit),
            AsnLength::Bits32 => self.read_u32().map(Asn::new_32bit),
        }
    }

    fn read_asns(&mut self, asn_len: AsnLength, count: usize) -> Result<Vec<Asn>, ParserError> {
        let width = match asn_len {
            AsnLength::Bits16 => 2,
            AsnLength::Bits32 => 4,
        };
        self.expect_remaining(count * width)?;

        let mut asns = Vec::with_capacity(count);
        for _ in 0..count {
            asns.push(self.read_asn(asn_len)?);
        }
        Ok(asns)
    }

    fn read_afi(&mut self) -> Result<Afi, ParserError> {
        Afi::try_from(self.read_u16()?).map_err(ParserError::from)
    }

    fn read_safi(&mut self) -> Result<Safi, ParserError> {
        Safi::try_from(self.read_u8()?).map_err(ParserError::from)
    }

    /// Read one NLRI-encoded prefix: an optional 4-byte path identifier,
    /// the length in bits, then just enough bytes to cover that length.
    fn read_nlri_prefix(&mut self, afi: Afi, add_path: bool) -> Result<NetworkPrefix, ParserError> {
        let path_id = if add_path { self.read_u32()? } else { 0 };

        let bit_len = self.read_u8()?;
        let byte_len = (bit_len as usize).div_ceil(8);

        let max_bytes = match afi {
            Afi::Ipv4 => 4,
            Afi::Ipv6 => 16,
        };
        if byte_len > max_bytes {
            return Err(ParserError::ParseError(format!(
                "invalid {:?} prefix length: {} bits",
                afi, bit_len
            )));
        }
        self.expect_remaining(byte_len)?;

        let addr = match afi {
            Afi::Ipv4 => {
                let mut octets = [0u8; 4];
                self.copy_to_slice(&mut octets[..byte_len]);
                IpAddr::V4(Ipv4Addr::from(octets))
            }
            Afi::Ipv6 => {
                let mut octets = [0u8; 16];
                self.copy_to_slice(&mut octets[..byte_len]);
                IpAddr::V6(Ipv6Addr::from(octets))
            }
        };

        let prefix = IpNet::new(addr, bit_len)?;
        Ok(NetworkPrefix::new(prefix, path_id))
    }

    fn read_n_bytes(&mut self, n: usize) -> Result<Vec<u8>, ParserError> {
        self.expect_remaining(n)?;
        Ok(self.copy_to_bytes(n).into())
    }
}

/// Parse a run of NLRI-encoded prefixes until the input is exhausted.
///
/// Collectors occasionally wrap ADD-PATH NLRI in a non-ADD-PATH subtype. A
/// leading zero byte in an allegedly non-ADD-PATH NLRI section is the tell
/// (a zero prefix length mid-message is otherwise meaningless), so parsing
/// retries in ADD-PATH mode, and falls back if that guess fails too.
pub fn parse_nlri_list(
    mut input: Bytes,
    add_path: bool,
    afi: Afi,
) -> Result<Vec<NetworkPrefix>, ParserError> {
    let mut assume_add_path = add_path;
    let mut pristine_copy = None;

    let mut prefixes = vec![];
    while input.remaining() > 0 {
        if !assume_add_path && input[0] == 0 {
            debug!("leading zero in non-ADD-PATH NLRI, retrying as ADD-PATH");
            assume_add_path = true;
            pristine_copy = Some(input.clone());
        }
        match input.read_nlri_prefix(afi, assume_add_path) {
            Ok(prefix) => prefixes.push(prefix),
            Err(e) => match pristine_copy.take() {
                // the ADD-PATH guess was wrong, replay as declared
                Some(mut copy) => {
                    prefixes.clear();
                    while copy.remaining() > 0 {
                        prefixes.push(copy.read_nlri_prefix(afi, add_path)?);
                    }
                    return Ok(prefixes);
                }
                None => return Err(e),
            },
        }
    }

    Ok(prefixes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_short_input() {
        let mut data = Bytes::from_static(&[0x01]);
        assert!(matches!(
            data.read_u32(),
            Err(ParserError::ShortInput { expected: 4 })
        ));
    }

    #[test]
    fn test_read_nlri_prefix_partial_bytes() {
        // 22-bit prefix occupies 3 bytes on the wire
        let mut data = Bytes::from_static(&[22, 190, 115, 192]);
        let prefix = data.read_nlri_prefix(Afi::Ipv4, false).unwrap();
        assert_eq!(
            prefix,
            NetworkPrefix::from_str("190.115.192.0/22").unwrap()
        );
        assert_eq!(data.remaining(), 0);
    }

    #[test]
    fn test_read_nlri_prefix_with_path_id() {
        let mut data = Bytes::from_static(&[0, 0, 0, 123, 24, 192, 0, 2]);
        let prefix = data.read_nlri_prefix(Afi::Ipv4, true).unwrap();
        assert_eq!(prefix.prefix, IpNet::from_str("192.0.2.0/24").unwrap());
        assert_eq!(prefix.path_id, 123);
    }

    #[test]
    fn test_read_nlri_prefix_oversized() {
        // 33 bits is invalid for IPv4
        let mut data = Bytes::from_static(&[33, 1, 2, 3, 4, 5]);
        assert!(data.read_nlri_prefix(Afi::Ipv4, false).is_err());
    }

    #[test]
    fn test_parse_nlri_list_add_path_guess() {
        // declared non-ADD-PATH but actually carries path identifiers
        let data = Bytes::from_static(&[
            0, 0, 0, 1, 24, 192, 0, 2, // 192.0.2.0/24 path_id 1
            0, 0, 0, 2, 24, 198, 51, 100, // 198.51.100.0/24 path_id 2
        ]);
        let prefixes = parse_nlri_list(data, false, Afi::Ipv4).unwrap();
        assert_eq!(prefixes.len(), 2);
        assert_eq!(prefixes[0].path_id, 1);
        assert_eq!(
            prefixes[1].prefix,
            IpNet::from_str("198.51.100.0/24").unwrap()
        );
    }

    #[test]
    fn test_read_asns_short_input() {
        let mut data = Bytes::from_static(&[0, 1, 0, 2]);
        assert!(data.read_asns(AsnLength::Bits32, 2).is_err());
        let mut data = Bytes::from_static(&[0, 1, 0, 2]);
        let asns = data.read_asns(AsnLength::Bits16, 2).unwrap();
        assert_eq!(asns, vec![Asn::new_16bit(1), Asn::new_16bit(2)]);
    }
}
