//! BGP4MP message body decoding (RFC 6396 section 4.4).
use crate::error::ParserError;
use crate::models::*;
use crate::parser::bgp::parse_bgp_message;
use crate::parser::utils::ReadUtils;
use bytes::{Buf, Bytes};

pub fn parse_bgp4mp(subtype: u16, input: Bytes) -> Result<Bgp4Mp, ParserError> {
    let msg_type = Bgp4MpType::try_from(subtype)?;
    let msg = match msg_type {
        Bgp4MpType::StateChange => {
            Bgp4Mp::StateChange(parse_bgp4mp_state_change(input, AsnLength::Bits16, msg_type)?)
        }
        Bgp4MpType::StateChangeAs4 => {
            Bgp4Mp::StateChange(parse_bgp4mp_state_change(input, AsnLength::Bits32, msg_type)?)
        }
        Bgp4MpType::Message | Bgp4MpType::MessageLocal => {
            Bgp4Mp::Message(parse_bgp4mp_message(input, false, AsnLength::Bits16, msg_type)?)
        }
        Bgp4MpType::MessageAs4 | Bgp4MpType::MessageAs4Local => {
            Bgp4Mp::Message(parse_bgp4mp_message(input, false, AsnLength::Bits32, msg_type)?)
        }
        Bgp4MpType::MessageAddpath | Bgp4MpType::MessageLocalAddpath => {
            Bgp4Mp::Message(parse_bgp4mp_message(input, true, AsnLength::Bits16, msg_type)?)
        }
        Bgp4MpType::MessageAs4Addpath | Bgp4MpType::MessageLocalAs4Addpath => {
            Bgp4Mp::Message(parse_bgp4mp_message(input, true, AsnLength::Bits32, msg_type)?)
        }
    };
    Ok(msg)
}

/// Size of the BGP4MP peering header: two ASNs, interface index, AFI, and
/// two addresses of the AFI's width.
fn peering_header_size(afi: Afi, asn_len: AsnLength) -> usize {
    let addr_size = match afi {
        Afi::Ipv4 => 4,
        Afi::Ipv6 => 16,
    };
    let asn_size = match asn_len {
        AsnLength::Bits16 => 2,
        AsnLength::Bits32 => 4,
    };
    2 * asn_size + 2 + 2 + 2 * addr_size
}

fn parse_bgp4mp_message(
    mut data: Bytes,
    add_path: bool,
    asn_len: AsnLength,
    msg_type: Bgp4MpType,
) -> Result<Bgp4MpMessage, ParserError> {
    let total_size = data.len();

    let peer_asn = data.read_asn(asn_len)?;
    let local_asn = data.read_asn(asn_len)?;
    let interface_index = data.read_u16()?;
    let afi = data.read_afi()?;
    let peer_ip = data.read_address(afi)?;
    let local_ip = data.read_address(afi)?;

    let bgp_msg_size = total_size - peering_header_size(afi, asn_len);
    if bgp_msg_size != data.remaining() {
        return Err(ParserError::TruncatedMsg(format!(
            "truncated BGP4MP message: expected {} bytes, {} available",
            bgp_msg_size,
            data.remaining()
        )));
    }

    let bgp_message = parse_bgp_message(&mut data, add_path, asn_len)?;

    Ok(Bgp4MpMessage {
        msg_type,
        peer_asn,
        local_asn,
        interface_index,
        peer_ip,
        local_ip,
        bgp_message,
    })
}

fn parse_bgp4mp_state_change(
    mut data: Bytes,
    asn_len: AsnLength,
    msg_type: Bgp4MpType,
) -> Result<Bgp4MpStateChange, ParserError> {
    let peer_asn = data.read_asn(asn_len)?;
    let local_asn = data.read_asn(asn_len)?;
    let interface_index = data.read_u16()?;
    let afi = data.read_afi()?;
    let peer_ip = data.read_address(afi)?;
    let local_ip = data.read_address(afi)?;
    let old_state = BgpState::try_from(data.read_u16()?)?;
    let new_state = BgpState::try_from(data.read_u16()?)?;

    Ok(Bgp4MpStateChange {
        msg_type,
        peer_asn,
        local_asn,
        interface_index,
        peer_ip,
        local_ip,
        old_state,
        new_state,
    })
}
