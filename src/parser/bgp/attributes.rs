//! Path attribute decoding (RFC 4271 section 4.3 and the multiprotocol
//! extensions of RFC 4760).
use crate::error::ParserError;
use crate::models::*;
use crate::parser::utils::{parse_nlri_list, ReadUtils};
use bytes::{Buf, Bytes};
use log::{debug, warn};
use std::net::{IpAddr, Ipv4Addr};

const AS_PATH_AS_SET: u8 = 1;
const AS_PATH_AS_SEQUENCE: u8 = 2;
const AS_PATH_CONFED_SEQUENCE: u8 = 3;
const AS_PATH_CONFED_SET: u8 = 4;

/// Parse the whole path attribute section of an UPDATE message or RIB
/// entry.
///
/// `afi`, `safi` and `prefixes` carry the RIB context for TABLE_DUMP_V2
/// attributes, where MP_REACH_NLRI is stripped down to the next hop
/// (RFC 6396 section 4.3.4). For UPDATE messages all three are `None`.
///
/// A malformed attribute marked PARTIAL is logged and skipped; any other
/// malformed attribute fails the whole section.
pub fn parse_attributes(
    mut data: Bytes,
    asn_len: AsnLength,
    add_path: bool,
    afi: Option<Afi>,
    safi: Option<Safi>,
    prefixes: Option<&[NetworkPrefix]>,
) -> Result<Vec<Attribute>, ParserError> {
    let mut attributes: Vec<Attribute> = Vec::with_capacity(8);

    // flag(1) + type(1) + length(1) is the minimum attribute size
    while data.remaining() >= 3 {
        let flag = AttrFlags::from_bits_retain(data.read_u8()?);
        let type_code = data.read_u8()?;
        let attr_length = match flag.contains(AttrFlags::EXTENDED) {
            false => data.read_u8()? as usize,
            true => data.read_u16()? as usize,
        };
        debug!("reading attribute: type {}, length {}", type_code, attr_length);

        let attr_type = match AttrType::from(type_code) {
            attr_type @ AttrType::Unknown(code) => {
                let bytes = data.read_n_bytes(attr_length)?;
                let value = match is_deprecated_attr_type(code) {
                    true => AttributeValue::Deprecated(AttrRaw { attr_type, bytes }),
                    false => AttributeValue::Unknown(AttrRaw { attr_type, bytes }),
                };
                attributes.push(Attribute { value, flag });
                continue;
            }
            known => known,
        };

        data.expect_remaining(attr_length)?;
        let mut attr_data = data.split_to(attr_length);

        let attr = match attr_type {
            AttrType::ORIGIN => parse_origin(attr_data),
            AttrType::AS_PATH => parse_as_path(attr_data, asn_len).map(|path| {
                AttributeValue::AsPath {
                    path,
                    is_as4: false,
                }
            }),
            AttrType::NEXT_HOP => attr_data.read_ipv4_address().map(|addr| {
                AttributeValue::NextHop(IpAddr::V4(addr))
            }),
            AttrType::MULTI_EXIT_DISCRIMINATOR => attr_data
                .read_u32()
                .map(AttributeValue::MultiExitDiscriminator),
            AttrType::LOCAL_PREFERENCE => {
                attr_data.read_u32().map(AttributeValue::LocalPreference)
            }
            AttrType::ATOMIC_AGGREGATE => Ok(AttributeValue::AtomicAggregate),
            AttrType::AGGREGATOR => {
                parse_aggregator(attr_data, asn_len).map(|(asn, id)| AttributeValue::Aggregator {
                    asn,
                    id,
                    is_as4: false,
                })
            }
            AttrType::COMMUNITIES => parse_communities(attr_data),
            AttrType::ORIGINATOR_ID => attr_data
                .read_ipv4_address()
                .map(AttributeValue::OriginatorId),
            AttrType::CLUSTER_LIST => parse_clusters(attr_data),
            AttrType::MP_REACHABLE_NLRI => {
                parse_mp_nlri(attr_data, afi, safi, prefixes, true, add_path)
            }
            AttrType::MP_UNREACHABLE_NLRI => {
                parse_mp_nlri(attr_data, afi, safi, prefixes, false, add_path)
            }
            AttrType::EXTENDED_COMMUNITIES => parse_extended_communities(attr_data),
            AttrType::AS4_PATH => parse_as_path(attr_data, AsnLength::Bits32).map(|path| {
                AttributeValue::AsPath { path, is_as4: true }
            }),
            AttrType::AS4_AGGREGATOR => parse_aggregator(attr_data, AsnLength::Bits32).map(
                |(asn, id)| AttributeValue::Aggregator {
                    asn,
                    id,
                    is_as4: true,
                },
            ),
            AttrType::LARGE_COMMUNITIES => parse_large_communities(attr_data),
            AttrType::Unknown(_) => unreachable!("handled above"),
        };

        match attr {
            Ok(value) => attributes.push(Attribute { value, flag }),
            Err(e) if flag.contains(AttrFlags::PARTIAL) => {
                // partial optional transitive attributes may legitimately
                // carry content this parser cannot finish (RFC 4271 4.3)
                warn!("skipping malformed partial attribute: {}", e);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(attributes)
}

fn parse_origin(mut input: Bytes) -> Result<AttributeValue, ParserError> {
    Origin::try_from(input.read_u8()?)
        .map(AttributeValue::Origin)
        .map_err(ParserError::from)
}

pub fn parse_as_path(mut input: Bytes, asn_len: AsnLength) -> Result<AsPath, ParserError> {
    let mut segments = vec![];
    while input.remaining() > 0 {
        let segment_type = input.read_u8()?;
        let count = input.read_u8()? as usize;
        let asns = input.read_asns(asn_len, count)?;
        segments.push(match segment_type {
            AS_PATH_AS_SET => AsPathSegment::AsSet(asns),
            AS_PATH_AS_SEQUENCE => AsPathSegment::AsSequence(asns),
            AS_PATH_CONFED_SEQUENCE => AsPathSegment::ConfedSequence(asns),
            AS_PATH_CONFED_SET => AsPathSegment::ConfedSet(asns),
            other => {
                return Err(ParserError::ParseError(format!(
                    "invalid AS path segment type: {}",
                    other
                )))
            }
        });
    }
    Ok(AsPath::from_segments(segments))
}

fn parse_aggregator(
    mut input: Bytes,
    asn_len: AsnLength,
) -> Result<(Asn, Ipv4Addr), ParserError> {
    let asn = input.read_asn(asn_len)?;
    let id = input.read_ipv4_address()?;
    Ok((asn, id))
}

fn parse_communities(mut input: Bytes) -> Result<AttributeValue, ParserError> {
    const COMMUNITY_NO_EXPORT: u32 = 0xffffff01;
    const COMMUNITY_NO_ADVERTISE: u32 = 0xffffff02;
    const COMMUNITY_NO_EXPORT_SUBCONFED: u32 = 0xffffff03;

    let mut communities = Vec::with_capacity(input.remaining() / 4);
    while input.remaining() > 0 {
        communities.push(match input.read_u32()? {
            COMMUNITY_NO_EXPORT => Community::NoExport,
            COMMUNITY_NO_ADVERTISE => Community::NoAdvertise,
            COMMUNITY_NO_EXPORT_SUBCONFED => Community::NoExportSubConfed,
            value => {
                let asn = Asn::new_16bit((value >> 16) as u16);
                Community::Custom(asn, (value & 0xffff) as u16)
            }
        });
    }
    Ok(AttributeValue::Communities(communities))
}

fn parse_clusters(mut input: Bytes) -> Result<AttributeValue, ParserError> {
    let mut clusters = Vec::with_capacity(input.remaining() / 4);
    while input.remaining() > 0 {
        clusters.push(input.read_ipv4_address()?);
    }
    Ok(AttributeValue::Clusters(clusters))
}

fn parse_extended_communities(mut input: Bytes) -> Result<AttributeValue, ParserError> {
    let mut communities = Vec::with_capacity(input.remaining() / 8);
    while input.remaining() > 0 {
        let ec_type = input.read_u8()?;
        let ec_subtype = input.read_u8()?;
        let mut value = [0u8; 6];
        input.expect_remaining(6)?;
        input.copy_to_slice(&mut value);
        communities.push(ExtendedCommunity {
            ec_type,
            ec_subtype,
            value,
        });
    }
    Ok(AttributeValue::ExtendedCommunities(communities))
}

fn parse_large_communities(mut input: Bytes) -> Result<AttributeValue, ParserError> {
    let mut communities = Vec::with_capacity(input.remaining() / 12);
    while input.remaining() > 0 {
        let global_administrator = input.read_u32()?;
        let local_data = [input.read_u32()?, input.read_u32()?];
        communities.push(LargeCommunity::new(global_administrator, local_data));
    }
    Ok(AttributeValue::LargeCommunities(communities))
}

/// MP_REACH_NLRI / MP_UNREACH_NLRI (RFC 4760 section 3 and 4).
///
/// ```text
/// +---------------------------------------------------------+
/// | Address Family Identifier (2 octets)                    |
/// +---------------------------------------------------------+
/// | Subsequent Address Family Identifier (1 octet)          |
/// +---------------------------------------------------------+
/// | Length of Next Hop Network Address (1 octet)            |
/// +---------------------------------------------------------+
/// | Network Address of Next Hop (variable)                  |
/// +---------------------------------------------------------+
/// | Reserved (1 octet)                                      |
/// +---------------------------------------------------------+
/// | Network Layer Reachability Information (variable)       |
/// +---------------------------------------------------------+
/// ```
///
/// In RIB context (`afi`/`safi`/`prefixes` provided) the attribute holds
/// only the next hop fields, unless it starts with a zero byte, which
/// signals a full on-wire encoding: a real AFI always has a zero high
/// octet, while a next-hop length octet never does.
fn parse_mp_nlri(
    mut input: Bytes,
    afi: Option<Afi>,
    safi: Option<Safi>,
    prefixes: Option<&[NetworkPrefix]>,
    reachable: bool,
    add_path: bool,
) -> Result<AttributeValue, ParserError> {
    input.expect_remaining(1)?;
    let full_encoding = input[0] == 0;

    let afi = match afi {
        Some(afi) if !full_encoding => afi,
        _ => input.read_afi()?,
    };
    let safi = match safi {
        Some(safi) if !full_encoding => safi,
        _ => input.read_safi()?,
    };

    let mut next_hop = None;
    if reachable {
        let next_hop_length = input.read_u8()? as usize;
        input.expect_remaining(next_hop_length)?;
        next_hop = parse_mp_next_hop(input.split_to(next_hop_length))?;
    }

    let prefixes = match prefixes {
        Some(rib_prefixes) if !full_encoding => rib_prefixes.to_vec(),
        _ => {
            if reachable && input.read_u8()? != 0 {
                warn!("MP_REACH_NLRI reserved byte is not zero");
            }
            parse_nlri_list(input, add_path, afi)?
        }
    };

    let nlri = Nlri {
        afi,
        safi,
        next_hop,
        prefixes,
    };
    Ok(match reachable {
        true => AttributeValue::MpReachNlri(nlri),
        false => AttributeValue::MpUnreachNlri(nlri),
    })
}

fn parse_mp_next_hop(mut input: Bytes) -> Result<Option<NextHopAddress>, ParserError> {
    let output = match input.remaining() {
        0 => None,
        4 => Some(NextHopAddress::Ipv4(input.read_ipv4_address()?)),
        16 => Some(NextHopAddress::Ipv6(input.read_ipv6_address()?)),
        32 => Some(NextHopAddress::Ipv6LinkLocal(
            input.read_ipv6_address()?,
            input.read_ipv6_address()?,
        )),
        n => {
            return Err(ParserError::ParseError(format!(
                "invalid next hop length: {}",
                n
            )))
        }
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{BufMut, BytesMut};
    use std::net::Ipv6Addr;
    use std::str::FromStr;

    #[test]
    fn test_parse_origin() {
        let attrs = parse_attributes(
            Bytes::from_static(&[0x40, 1, 1, 2]),
            AsnLength::Bits32,
            false,
            None,
            None,
            None,
        )
        .unwrap();
        assert_eq!(attrs[0].value, AttributeValue::Origin(Origin::INCOMPLETE));
    }

    #[test]
    fn test_parse_as_path_segments() {
        let mut data = BytesMut::new();
        data.put_u8(AS_PATH_AS_SEQUENCE);
        data.put_u8(2);
        data.put_u32(65001);
        data.put_u32(65002);
        data.put_u8(AS_PATH_AS_SET);
        data.put_u8(2);
        data.put_u32(65003);
        data.put_u32(65004);

        let path = parse_as_path(data.freeze(), AsnLength::Bits32).unwrap();
        assert_eq!(path.segments.len(), 2);
        assert_eq!(path.count_asns(), 3);
        assert_eq!(path.to_string(), "65001 65002 {65003,65004}");
    }

    #[test]
    fn test_parse_communities() {
        let mut data = BytesMut::new();
        data.put_u32(0xffffff01);
        data.put_u32((65001 << 16) | 100);
        let value = parse_communities(data.freeze()).unwrap();
        assert_eq!(
            value,
            AttributeValue::Communities(vec![
                Community::NoExport,
                Community::Custom(Asn::new_16bit(65001), 100),
            ])
        );
    }

    #[test]
    fn test_parse_large_communities() {
        let mut data = BytesMut::new();
        data.put_u32(65001);
        data.put_u32(1);
        data.put_u32(2);
        let value = parse_large_communities(data.freeze()).unwrap();
        assert_eq!(
            value,
            AttributeValue::LargeCommunities(vec![LargeCommunity::new(65001, [1, 2])])
        );
    }

    #[test]
    fn test_parse_mp_reach_full_encoding() {
        let mut data = BytesMut::new();
        data.put_u16(Afi::Ipv6 as u16);
        data.put_u8(Safi::Unicast as u8);
        data.put_u8(16); // next hop length
        data.put_u128(u128::from(Ipv6Addr::from_str("2001:db8::1").unwrap()));
        data.put_u8(0); // reserved
        data.put_u8(32); // 2001:db8::/32
        data.put_slice(&[0x20, 0x01, 0x0d, 0xb8]);

        let value = parse_mp_nlri(data.freeze(), None, None, None, true, false).unwrap();
        let AttributeValue::MpReachNlri(nlri) = value else {
            panic!("expected MP_REACH_NLRI");
        };
        assert_eq!(nlri.afi, Afi::Ipv6);
        assert_eq!(
            nlri.next_hop,
            Some(NextHopAddress::Ipv6(
                Ipv6Addr::from_str("2001:db8::1").unwrap()
            ))
        );
        assert_eq!(
            nlri.prefixes,
            vec![NetworkPrefix::from_str("2001:db8::/32").unwrap()]
        );
    }

    #[test]
    fn test_parse_mp_reach_rib_context() {
        // RIB-encoded MP_REACH carries the next hop only
        let mut data = BytesMut::new();
        data.put_u8(16);
        data.put_u128(u128::from(Ipv6Addr::from_str("2001:db8::1").unwrap()));

        let prefix = NetworkPrefix::from_str("2001:db8:1000::/36").unwrap();
        let value = parse_mp_nlri(
            data.freeze(),
            Some(Afi::Ipv6),
            Some(Safi::Unicast),
            Some(&[prefix]),
            true,
            false,
        )
        .unwrap();
        let AttributeValue::MpReachNlri(nlri) = value else {
            panic!("expected MP_REACH_NLRI");
        };
        assert_eq!(nlri.prefixes, vec![prefix]);
        assert_eq!(
            nlri.next_hop,
            Some(NextHopAddress::Ipv6(
                Ipv6Addr::from_str("2001:db8::1").unwrap()
            ))
        );
    }

    #[test]
    fn test_unknown_attribute_kept_raw() {
        // type 200 is neither decoded nor deprecated
        let attrs = parse_attributes(
            Bytes::from_static(&[0xc0, 200, 2, 0xbe, 0xef]),
            AsnLength::Bits32,
            false,
            None,
            None,
            None,
        )
        .unwrap();
        assert_eq!(
            attrs[0].value,
            AttributeValue::Unknown(AttrRaw {
                attr_type: AttrType::Unknown(200),
                bytes: vec![0xbe, 0xef],
            })
        );
    }

    #[test]
    fn test_malformed_partial_attribute_skipped() {
        let mut data = BytesMut::new();
        // partial optional transitive AGGREGATOR with a truncated body
        data.put_slice(&[0xe0, 7, 2, 0, 1]);
        // followed by a valid ORIGIN
        data.put_slice(&[0x40, 1, 1, 0]);
        let attrs = parse_attributes(
            data.freeze(),
            AsnLength::Bits32,
            false,
            None,
            None,
            None,
        )
        .unwrap();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].value, AttributeValue::Origin(Origin::IGP));
    }
}
