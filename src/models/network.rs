//! Network-level types: AS numbers, address families, prefixes and next hops.
use ipnet::IpNet;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// AS number wire length: 16 or 32 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum AsnLength {
    Bits16,
    Bits32,
}

/// ASN -- Autonomous System Number.
///
/// Equality and ordering only consider the numeric value; the wire length is
/// kept so a record can be re-interpreted in its original context.
#[derive(Debug, Clone, Copy, Eq, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(into = "u32"))]
pub struct Asn {
    pub asn: u32,
    pub len: AsnLength,
}

impl Asn {
    pub const fn new_16bit(asn: u16) -> Self {
        Asn {
            asn: asn as u32,
            len: AsnLength::Bits16,
        }
    }

    pub const fn new_32bit(asn: u32) -> Self {
        Asn {
            asn,
            len: AsnLength::Bits32,
        }
    }

    pub const fn to_u32(self) -> u32 {
        self.asn
    }

    pub const fn is_four_byte(&self) -> bool {
        matches!(self.len, AsnLength::Bits32)
    }

    /// Checks if the ASN is in a private-use range per RFC 6996.
    pub const fn is_private(&self) -> bool {
        matches!(self.asn, 64512..=65534 | 4200000000..=4294967294)
    }
}

impl PartialEq for Asn {
    fn eq(&self, other: &Self) -> bool {
        self.asn == other.asn
    }
}

impl PartialEq<u32> for Asn {
    fn eq(&self, other: &u32) -> bool {
        self.asn == *other
    }
}

impl Hash for Asn {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.asn.hash(state);
    }
}

impl From<u32> for Asn {
    fn from(v: u32) -> Self {
        Asn::new_32bit(v)
    }
}

impl From<Asn> for u32 {
    fn from(v: Asn) -> Self {
        v.asn
    }
}

impl Display for Asn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.asn)
    }
}

/// AFI -- Address Family Identifier.
///
/// <https://www.iana.org/assignments/address-family-numbers/address-family-numbers.xhtml>
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u16)]
pub enum Afi {
    Ipv4 = 1,
    Ipv6 = 2,
}

impl From<IpAddr> for Afi {
    #[inline]
    fn from(value: IpAddr) -> Self {
        match value {
            IpAddr::V4(_) => Afi::Ipv4,
            IpAddr::V6(_) => Afi::Ipv6,
        }
    }
}

/// SAFI -- Subsequent Address Family Identifier.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum Safi {
    Unicast = 1,
    Multicast = 2,
    UnicastMulticast = 3,
}

/// A network prefix with its ADD-PATH path identifier.
///
/// `path_id` is zero for prefixes from messages without the ADD-PATH
/// capability (RFC 7911).
#[derive(PartialEq, Eq, Clone, Copy, Hash)]
pub struct NetworkPrefix {
    pub prefix: IpNet,
    pub path_id: u32,
}

impl NetworkPrefix {
    pub fn new(prefix: IpNet, path_id: u32) -> NetworkPrefix {
        NetworkPrefix { prefix, path_id }
    }
}

impl Debug for NetworkPrefix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.path_id {
            0 => write!(f, "{}", self.prefix),
            id => write!(f, "{}#{}", self.prefix, id),
        }
    }
}

impl Display for NetworkPrefix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix)
    }
}

impl FromStr for NetworkPrefix {
    type Err = ipnet::AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(NetworkPrefix {
            prefix: IpNet::from_str(s)?,
            path_id: 0,
        })
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for NetworkPrefix {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.prefix.to_string())
    }
}

/// Next-hop address from a MP_REACH_NLRI attribute (RFC 4760 section 3).
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum NextHopAddress {
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    /// Global and link-local address pair.
    Ipv6LinkLocal(Ipv6Addr, Ipv6Addr),
}

impl NextHopAddress {
    /// The global address, dropping the link-local part if present.
    pub const fn addr(&self) -> IpAddr {
        match self {
            NextHopAddress::Ipv4(addr) => IpAddr::V4(*addr),
            NextHopAddress::Ipv6(addr) => IpAddr::V6(*addr),
            NextHopAddress::Ipv6LinkLocal(addr, _) => IpAddr::V6(*addr),
        }
    }
}

impl Display for NextHopAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.addr())
    }
}
