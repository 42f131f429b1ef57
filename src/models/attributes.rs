//! BGP path attribute types and values.
use crate::models::*;
use bitflags::bitflags;
use num_enum::TryFromPrimitive;
use std::fmt::{Display, Formatter};
use std::net::{IpAddr, Ipv4Addr};

/// Path attribute type codes from the IANA registry.
///
/// Only the types this parser decodes get their own variant; everything else
/// is carried through as [AttrType::Unknown] with its raw bytes preserved.
///
/// <https://www.iana.org/assignments/bgp-parameters/bgp-parameters.xhtml#bgp-parameters-2>
#[allow(non_camel_case_types)]
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum AttrType {
    ORIGIN,
    AS_PATH,
    NEXT_HOP,
    MULTI_EXIT_DISCRIMINATOR,
    LOCAL_PREFERENCE,
    ATOMIC_AGGREGATE,
    AGGREGATOR,
    COMMUNITIES,
    ORIGINATOR_ID,
    CLUSTER_LIST,
    MP_REACHABLE_NLRI,
    MP_UNREACHABLE_NLRI,
    EXTENDED_COMMUNITIES,
    AS4_PATH,
    AS4_AGGREGATOR,
    LARGE_COMMUNITIES,
    Unknown(u8),
}

impl From<u8> for AttrType {
    fn from(value: u8) -> Self {
        match value {
            1 => AttrType::ORIGIN,
            2 => AttrType::AS_PATH,
            3 => AttrType::NEXT_HOP,
            4 => AttrType::MULTI_EXIT_DISCRIMINATOR,
            5 => AttrType::LOCAL_PREFERENCE,
            6 => AttrType::ATOMIC_AGGREGATE,
            7 => AttrType::AGGREGATOR,
            8 => AttrType::COMMUNITIES,
            9 => AttrType::ORIGINATOR_ID,
            10 => AttrType::CLUSTER_LIST,
            14 => AttrType::MP_REACHABLE_NLRI,
            15 => AttrType::MP_UNREACHABLE_NLRI,
            16 => AttrType::EXTENDED_COMMUNITIES,
            17 => AttrType::AS4_PATH,
            18 => AttrType::AS4_AGGREGATOR,
            32 => AttrType::LARGE_COMMUNITIES,
            other => AttrType::Unknown(other),
        }
    }
}

/// Attribute type codes deprecated by IANA, kept apart from truly unknown
/// codes so they can be reported differently.
pub const fn is_deprecated_attr_type(attr_type: u8) -> bool {
    // DPA (11), ADVERTISER (12), RCID_PATH (13), MP variants long retired,
    // CONNECTOR (20), AS_PATHLIMIT (21), plus the 28-31 and 129/241-243 blocks
    matches!(
        attr_type,
        11 | 12 | 13 | 19 | 20 | 21 | 28 | 30 | 31 | 129 | 241 | 242 | 243
    )
}

bitflags! {
    /// Attribute flags octet (RFC 4271 section 4.3).
    #[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize))]
    pub struct AttrFlags: u8 {
        const OPTIONAL = 0b1000_0000;
        const TRANSITIVE = 0b0100_0000;
        const PARTIAL = 0b0010_0000;
        const EXTENDED = 0b0001_0000;
    }
}

/// ORIGIN attribute value (RFC 4271 section 5.1.1).
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
pub enum Origin {
    IGP = 0,
    EGP = 1,
    INCOMPLETE = 2,
}

impl Display for Origin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Origin::IGP => "IGP",
            Origin::EGP => "EGP",
            Origin::INCOMPLETE => "INCOMPLETE",
        };
        write!(f, "{}", s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Origin {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Multiprotocol NLRI carried in MP_REACH_NLRI / MP_UNREACH_NLRI (RFC 4760).
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Nlri {
    pub afi: Afi,
    pub safi: Safi,
    pub next_hop: Option<NextHopAddress>,
    pub prefixes: Vec<NetworkPrefix>,
}

/// An attribute this parser does not decode, preserved byte-for-byte.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AttrRaw {
    pub attr_type: AttrType,
    pub bytes: Vec<u8>,
}

/// A parsed path attribute value.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum AttributeValue {
    Origin(Origin),
    AsPath { path: AsPath, is_as4: bool },
    NextHop(IpAddr),
    MultiExitDiscriminator(u32),
    LocalPreference(u32),
    AtomicAggregate,
    Aggregator { asn: Asn, id: Ipv4Addr, is_as4: bool },
    Communities(Vec<Community>),
    ExtendedCommunities(Vec<ExtendedCommunity>),
    LargeCommunities(Vec<LargeCommunity>),
    OriginatorId(Ipv4Addr),
    Clusters(Vec<Ipv4Addr>),
    MpReachNlri(Nlri),
    MpUnreachNlri(Nlri),
    Deprecated(AttrRaw),
    Unknown(AttrRaw),
}

/// An attribute value paired with its flags octet.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Attribute {
    pub value: AttributeValue,
    pub flag: AttrFlags,
}
