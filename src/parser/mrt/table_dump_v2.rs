//! TABLE_DUMP_V2 decoding (RFC 6396 section 4.3, ADD-PATH from RFC 8050).
use crate::error::ParserError;
use crate::models::*;
use crate::parser::bgp::attributes::parse_attributes;
use crate::parser::utils::ReadUtils;
use bytes::{Buf, Bytes};
use log::warn;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};

pub fn parse_table_dump_v2_message(
    subtype: u16,
    mut input: Bytes,
) -> Result<TableDumpV2Message, ParserError> {
    let rib_type = TableDumpV2Type::try_from(subtype)?;

    match rib_type {
        TableDumpV2Type::PeerIndexTable => {
            parse_peer_index_table(&mut input).map(TableDumpV2Message::PeerIndexTable)
        }
        TableDumpV2Type::RibIpv4Unicast
        | TableDumpV2Type::RibIpv4Multicast
        | TableDumpV2Type::RibIpv6Unicast
        | TableDumpV2Type::RibIpv6Multicast
        | TableDumpV2Type::RibIpv4UnicastAddPath
        | TableDumpV2Type::RibIpv4MulticastAddPath
        | TableDumpV2Type::RibIpv6UnicastAddPath
        | TableDumpV2Type::RibIpv6MulticastAddPath => {
            parse_rib_afi_entries(&mut input, rib_type).map(TableDumpV2Message::RibAfiEntries)
        }
        TableDumpV2Type::RibGeneric
        | TableDumpV2Type::RibGenericAddPath
        | TableDumpV2Type::GeoPeerTable => Err(ParserError::UnsupportedMrtType {
            mrt_type: EntryType::TABLE_DUMP_V2,
            subtype,
        }),
    }
}

/// PEER_INDEX_TABLE (RFC 6396 section 4.3.1): collector id, view name, and
/// the peer list that RIB entries reference by index.
fn parse_peer_index_table(data: &mut Bytes) -> Result<PeerIndexTable, ParserError> {
    let collector_bgp_id = Ipv4Addr::from(data.read_u32()?);

    let view_name_length = data.read_u16()?;
    let view_name = String::from_utf8(data.read_n_bytes(view_name_length as usize)?)
        .unwrap_or_default();

    let peer_count = data.read_u16()?;
    let mut peers = HashMap::with_capacity(peer_count as usize);
    for index in 0..peer_count {
        let peer_type = PeerType::from_bits_retain(data.read_u8()?);
        let afi = match peer_type.contains(PeerType::ADDRESS_FAMILY_IPV6) {
            true => Afi::Ipv6,
            false => Afi::Ipv4,
        };
        let asn_len = match peer_type.contains(PeerType::AS_SIZE_32BIT) {
            true => AsnLength::Bits32,
            false => AsnLength::Bits16,
        };

        let peer_bgp_id = Ipv4Addr::from(data.read_u32()?);
        let peer_address: IpAddr = data.read_address(afi)?;
        let peer_asn = data.read_asn(asn_len)?;
        peers.insert(
            index,
            Peer {
                peer_type,
                peer_bgp_id,
                peer_address,
                peer_asn,
            },
        );
    }

    Ok(PeerIndexTable {
        collector_bgp_id,
        view_name,
        peers,
    })
}

fn rib_type_afi_safi(rib_type: TableDumpV2Type) -> Result<(Afi, Safi), ParserError> {
    let pair = match rib_type {
        TableDumpV2Type::RibIpv4Unicast | TableDumpV2Type::RibIpv4UnicastAddPath => {
            (Afi::Ipv4, Safi::Unicast)
        }
        TableDumpV2Type::RibIpv4Multicast | TableDumpV2Type::RibIpv4MulticastAddPath => {
            (Afi::Ipv4, Safi::Multicast)
        }
        TableDumpV2Type::RibIpv6Unicast | TableDumpV2Type::RibIpv6UnicastAddPath => {
            (Afi::Ipv6, Safi::Unicast)
        }
        TableDumpV2Type::RibIpv6Multicast | TableDumpV2Type::RibIpv6MulticastAddPath => {
            (Afi::Ipv6, Safi::Multicast)
        }
        other => {
            return Err(ParserError::ParseError(format!(
                "not an AFI-specific RIB type: {:?}",
                other
            )))
        }
    };
    Ok(pair)
}

/// RIB AFI-specific entries (RFC 6396 section 4.3.2): sequence number, the
/// shared prefix, then one entry per peer carrying it.
///
/// A malformed entry stops entry parsing for this prefix but keeps the
/// entries decoded so far.
fn parse_rib_afi_entries(
    data: &mut Bytes,
    rib_type: TableDumpV2Type,
) -> Result<RibAfiEntries, ParserError> {
    let (afi, safi) = rib_type_afi_safi(rib_type)?;
    let add_path = matches!(
        rib_type,
        TableDumpV2Type::RibIpv4UnicastAddPath
            | TableDumpV2Type::RibIpv4MulticastAddPath
            | TableDumpV2Type::RibIpv6UnicastAddPath
            | TableDumpV2Type::RibIpv6MulticastAddPath
    );

    let sequence_number = data.read_u32()?;
    // the shared prefix never carries a path identifier; for ADD-PATH
    // subtypes the identifier sits in each entry instead (RFC 8050)
    let prefix = data.read_nlri_prefix(afi, false)?;

    let entry_count = data.read_u16()?;
    let mut rib_entries = Vec::with_capacity(entry_count as usize);
    for _ in 0..entry_count {
        match parse_rib_entry(data, add_path, afi, safi, prefix) {
            Ok(entry) => rib_entries.push(entry),
            Err(e) => {
                warn!("stopping RIB entry parsing early: {}", e);
                break;
            }
        }
    }

    Ok(RibAfiEntries {
        rib_type,
        sequence_number,
        prefix,
        rib_entries,
    })
}

fn parse_rib_entry(
    input: &mut Bytes,
    add_path: bool,
    afi: Afi,
    safi: Safi,
    prefix: NetworkPrefix,
) -> Result<RibEntry, ParserError> {
    let peer_index = input.read_u16()?;
    let originated_time = input.read_u32()?;
    if add_path {
        let _path_id = input.read_u32()?;
    }
    let attribute_length = input.read_u16()? as usize;

    input.expect_remaining(attribute_length)?;
    let attr_data = input.split_to(attribute_length);
    // attributes in TABLE_DUMP_V2 always use 4-byte ASNs
    let attributes = parse_attributes(
        attr_data,
        AsnLength::Bits32,
        add_path,
        Some(afi),
        Some(safi),
        Some(&[prefix]),
    )?;

    Ok(RibEntry {
        peer_index,
        originated_time,
        attributes,
    })
}
