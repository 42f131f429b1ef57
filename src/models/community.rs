//! BGP community values: regular, extended and large communities.
use crate::models::Asn;
use std::fmt::{Display, Formatter};

/// Regular community (RFC 1997), with the well-known values called out.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum Community {
    NoExport,
    NoAdvertise,
    NoExportSubConfed,
    Custom(Asn, u16),
}

impl Display for Community {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Community::NoExport => write!(f, "no-export"),
            Community::NoAdvertise => write!(f, "no-advertise"),
            Community::NoExportSubConfed => write!(f, "no-export-sub-confed"),
            Community::Custom(asn, value) => write!(f, "{}:{}", asn, value),
        }
    }
}

/// Large community (RFC 8092): a global administrator and two local parts.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub struct LargeCommunity {
    pub global_administrator: u32,
    pub local_data: [u32; 2],
}

impl LargeCommunity {
    pub fn new(global_administrator: u32, local_data: [u32; 2]) -> LargeCommunity {
        LargeCommunity {
            global_administrator,
            local_data,
        }
    }
}

impl Display for LargeCommunity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "lg:{}:{}:{}",
            self.global_administrator, self.local_data[0], self.local_data[1]
        )
    }
}

/// Extended community (RFC 4360), kept as its raw 8-octet encoding.
///
/// The type zoo for extended communities is large and route analysis rarely
/// needs it decoded; the raw form round-trips everything.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub struct ExtendedCommunity {
    pub ec_type: u8,
    pub ec_subtype: u8,
    pub value: [u8; 6],
}

impl Display for ExtendedCommunity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ecomm:{:02x}:{:02x}", self.ec_type, self.ec_subtype)?;
        for byte in &self.value {
            write!(f, ":{:02x}", byte)?;
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::*;
    use serde::{Serialize, Serializer};

    impl Serialize for Community {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&self.to_string())
        }
    }

    impl Serialize for LargeCommunity {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&self.to_string())
        }
    }

    impl Serialize for ExtendedCommunity {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&self.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Community::NoExport.to_string(), "no-export");
        assert_eq!(
            Community::Custom(Asn::new_16bit(13335), 100).to_string(),
            "13335:100"
        );
        assert_eq!(
            LargeCommunity::new(13335, [1, 2]).to_string(),
            "lg:13335:1:2"
        );
        assert_eq!(
            ExtendedCommunity {
                ec_type: 0x00,
                ec_subtype: 0x02,
                value: [0, 1, 0, 0, 0, 5],
            }
            .to_string(),
            "ecomm:00:02:00:01:00:00:00:05"
        );
    }
}
