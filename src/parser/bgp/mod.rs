//! BGP message decoding (RFC 4271 section 4).
pub(crate) mod attributes;

use crate::error::ParserError;
use crate::models::*;
use crate::parser::bgp::attributes::parse_attributes;
use crate::parser::utils::{parse_nlri_list, ReadUtils};
use bytes::{Buf, Bytes};
use std::net::Ipv4Addr;

/// Parse one BGP message: 16-byte marker, length, type octet, then a body
/// dispatch.
///
/// ```text
/// 0                   1                   2                   3
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           Marker                              |
/// +                          (16 octets)                          +
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |          Length               |      Type     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
pub fn parse_bgp_message(
    data: &mut Bytes,
    add_path: bool,
    asn_len: AsnLength,
) -> Result<BgpMessage, ParserError> {
    let total_size = data.len();
    data.expect_remaining(19)?;
    data.advance(16); // marker, all ones, not validated

    // length covers the 19-byte header; padding after the message is not
    // allowed (RFC 4271 section 4.1)
    let length = data.read_u16()? as usize;
    if !(19..=4096).contains(&length) {
        return Err(ParserError::ParseError(format!(
            "invalid BGP message length {}",
            length
        )));
    }

    let body_length = match length > total_size {
        // tolerate a message length overrunning its MRT container and clamp
        // to what is available
        true => total_size - 19,
        false => length - 19,
    };

    let msg_type = BgpMessageType::try_from(data.read_u8()?)?;
    data.expect_remaining(body_length)?;
    let mut body = data.split_to(body_length);

    Ok(match msg_type {
        BgpMessageType::OPEN => BgpMessage::Open(parse_bgp_open_message(&mut body)?),
        BgpMessageType::UPDATE => {
            BgpMessage::Update(parse_bgp_update_message(body, add_path, asn_len)?)
        }
        BgpMessageType::NOTIFICATION => {
            BgpMessage::Notification(parse_bgp_notification_message(body)?)
        }
        BgpMessageType::KEEPALIVE => BgpMessage::KeepAlive,
    })
}

/// OPEN message (RFC 4271 section 4.2). Optional parameters are kept as
/// raw type/value pairs.
fn parse_bgp_open_message(input: &mut Bytes) -> Result<BgpOpenMessage, ParserError> {
    let version = input.read_u8()?;
    let asn = Asn::new_16bit(input.read_u16()?);
    let hold_time = input.read_u16()?;
    let sender_ip = Ipv4Addr::from(input.read_u32()?);

    let opt_params_len = input.read_u8()? as usize;
    input.expect_remaining(opt_params_len)?;
    let mut params_data = input.split_to(opt_params_len);

    let mut opt_params = vec![];
    while params_data.remaining() >= 2 {
        opt_params.push(parse_opt_param(&mut params_data)?);
    }

    Ok(BgpOpenMessage {
        version,
        asn,
        hold_time,
        sender_ip,
        opt_params,
    })
}

fn parse_opt_param(data: &mut Bytes) -> Result<OptParam, ParserError> {
    let param_type = data.read_u8()?;
    let param_length = data.read_u8()? as usize;
    let param_value = data.read_n_bytes(param_length)?;
    Ok(OptParam {
        param_type,
        param_value,
    })
}

/// UPDATE message (RFC 4271 section 4.3).
///
/// ```text
/// +-----------------------------------------------------+
/// |   Withdrawn Routes Length (2 octets)                |
/// +-----------------------------------------------------+
/// |   Withdrawn Routes (variable)                       |
/// +-----------------------------------------------------+
/// |   Total Path Attribute Length (2 octets)            |
/// +-----------------------------------------------------+
/// |   Path Attributes (variable)                        |
/// +-----------------------------------------------------+
/// |   Network Layer Reachability Information (variable) |
/// +-----------------------------------------------------+
/// ```
fn parse_bgp_update_message(
    mut input: Bytes,
    add_path: bool,
    asn_len: AsnLength,
) -> Result<BgpUpdateMessage, ParserError> {
    let withdrawn_length = input.read_u16()? as usize;
    input.expect_remaining(withdrawn_length)?;
    let withdrawn_data = input.split_to(withdrawn_length);
    let withdrawn_prefixes = parse_nlri_list(withdrawn_data, add_path, Afi::Ipv4)?;

    let attribute_length = input.read_u16()? as usize;
    input.expect_remaining(attribute_length)?;
    let attribute_data = input.split_to(attribute_length);
    let attributes = parse_attributes(attribute_data, asn_len, add_path, None, None, None)?;

    // the remainder is the announced NLRI
    let announced_prefixes = parse_nlri_list(input, add_path, Afi::Ipv4)?;

    Ok(BgpUpdateMessage {
        withdrawn_prefixes,
        attributes,
        announced_prefixes,
    })
}

/// NOTIFICATION message (RFC 4271 section 4.5).
fn parse_bgp_notification_message(mut input: Bytes) -> Result<BgpNotificationMessage, ParserError> {
    let error_code = input.read_u8()?;
    let error_subcode = input.read_u8()?;
    let data = input.read_n_bytes(input.remaining())?;
    Ok(BgpNotificationMessage {
        error_code,
        error_subcode,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::{BufMut, BytesMut};
    use std::str::FromStr;

    fn with_header(msg_type: BgpMessageType, body: &[u8]) -> Bytes {
        let mut data = BytesMut::new();
        data.put_slice(&[0xff; 16]);
        data.put_u16(19 + body.len() as u16);
        data.put_u8(msg_type as u8);
        data.put_slice(body);
        data.freeze()
    }

    #[test]
    fn test_parse_keepalive() {
        let mut data = with_header(BgpMessageType::KEEPALIVE, &[]);
        let msg = parse_bgp_message(&mut data, false, AsnLength::Bits32).unwrap();
        assert_eq!(msg, BgpMessage::KeepAlive);
    }

    #[test]
    fn test_parse_open() {
        let mut body = BytesMut::new();
        body.put_u8(4); // version
        body.put_u16(65000);
        body.put_u16(180); // hold time
        body.put_u32(u32::from(Ipv4Addr::new(192, 0, 2, 1)));
        body.put_u8(4); // optional parameters length
        body.put_slice(&[2, 2, 0x41, 0x04]); // one capability parameter

        let mut data = with_header(BgpMessageType::OPEN, &body);
        let msg = parse_bgp_message(&mut data, false, AsnLength::Bits16).unwrap();
        let BgpMessage::Open(open) = msg else {
            panic!("expected an open message");
        };
        assert_eq!(open.version, 4);
        assert_eq!(open.asn, Asn::new_16bit(65000));
        assert_eq!(open.hold_time, 180);
        assert_eq!(open.opt_params.len(), 1);
        assert_eq!(open.opt_params[0].param_type, 2);
    }

    #[test]
    fn test_parse_update_announce() {
        let mut body = BytesMut::new();
        body.put_u16(0); // no withdrawals
        let mut attrs = BytesMut::new();
        // ORIGIN IGP
        attrs.put_slice(&[0x40, 1, 1, 0]);
        // AS_PATH: sequence [65001, 65002]
        attrs.put_slice(&[0x40, 2, 10, 2, 2]);
        attrs.put_u32(65001);
        attrs.put_u32(65002);
        // NEXT_HOP
        attrs.put_slice(&[0x40, 3, 4, 10, 0, 0, 1]);
        body.put_u16(attrs.len() as u16);
        body.put_slice(&attrs);
        body.put_slice(&[24, 192, 0, 2]); // announce 192.0.2.0/24

        let mut data = with_header(BgpMessageType::UPDATE, &body);
        let msg = parse_bgp_message(&mut data, false, AsnLength::Bits32).unwrap();
        let BgpMessage::Update(update) = msg else {
            panic!("expected an update message");
        };
        assert!(update.withdrawn_prefixes.is_empty());
        assert_eq!(update.attributes.len(), 3);
        assert_eq!(
            update.announced_prefixes,
            vec![NetworkPrefix::from_str("192.0.2.0/24").unwrap()]
        );
    }

    #[test]
    fn test_parse_update_withdraw() {
        let mut body = BytesMut::new();
        body.put_u16(4);
        body.put_slice(&[24, 203, 0, 113]); // withdraw 203.0.113.0/24
        body.put_u16(0); // no attributes

        let mut data = with_header(BgpMessageType::UPDATE, &body);
        let msg = parse_bgp_message(&mut data, false, AsnLength::Bits32).unwrap();
        let BgpMessage::Update(update) = msg else {
            panic!("expected an update message");
        };
        assert_eq!(
            update.withdrawn_prefixes,
            vec![NetworkPrefix::from_str("203.0.113.0/24").unwrap()]
        );
        assert!(update.announced_prefixes.is_empty());
    }

    #[test]
    fn test_parse_notification() {
        let mut data = with_header(BgpMessageType::NOTIFICATION, &[6, 2, 0xde, 0xad]);
        let msg = parse_bgp_message(&mut data, false, AsnLength::Bits32).unwrap();
        let BgpMessage::Notification(notification) = msg else {
            panic!("expected a notification message");
        };
        assert_eq!(notification.error_code, 6); // cease
        assert_eq!(notification.error_subcode, 2); // administrative shutdown
        assert_eq!(notification.data, vec![0xde, 0xad]);
    }

    #[test]
    fn test_invalid_length() {
        let mut data = BytesMut::new();
        data.put_slice(&[0xff; 16]);
        data.put_u16(10); // below the 19-byte minimum
        data.put_u8(BgpMessageType::KEEPALIVE as u8);
        let mut data = data.freeze();
        assert!(parse_bgp_message(&mut data, false, AsnLength::Bits32).is_err());
    }
}
