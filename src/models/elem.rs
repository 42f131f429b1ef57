//! Flattened per-prefix route elements.
//!
//! One MRT record can carry reachability information for many prefixes. A
//! [RouteElem] is the per-prefix flattening of that record: every announced
//! or withdrawn prefix becomes one element carrying a full copy of the
//! relevant attributes, which is the most convenient shape for filtering
//! and per-prefix analysis (at the cost of duplicating shared attributes).
use crate::models::*;
use itertools::Itertools;
use std::fmt::{Display, Formatter};
use std::net::IpAddr;

/// Whether an element announces or withdraws its prefix.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ElemType {
    ANNOUNCE,
    WITHDRAW,
}

impl ElemType {
    pub fn is_announce(&self) -> bool {
        matches!(self, ElemType::ANNOUNCE)
    }
}

/// A single per-prefix BGP element.
///
/// `origin_asns` is derived from the merged AS path: the last ASN of a path
/// ending in a sequence, or all members of a trailing AS set. Withdrawals
/// carry no attributes, so every optional field of a withdrawal is `None`.
#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RouteElem {
    pub timestamp: f64,
    pub elem_type: ElemType,
    pub peer_ip: IpAddr,
    pub peer_asn: Asn,
    pub prefix: NetworkPrefix,
    pub next_hop: Option<IpAddr>,
    pub as_path: Option<AsPath>,
    pub origin_asns: Option<Vec<Asn>>,
    pub origin: Option<Origin>,
    pub local_pref: Option<u32>,
    pub med: Option<u32>,
    pub communities: Option<Vec<Community>>,
    pub atomic: bool,
    pub aggr_asn: Option<Asn>,
    pub aggr_ip: Option<IpAddr>,
}

impl RouteElem {
    /// The single origin ASN, if the path origin is unambiguous.
    pub fn origin_asn(&self) -> Option<Asn> {
        match self.origin_asns.as_deref() {
            Some([asn]) => Some(*asn),
            _ => None,
        }
    }
}

#[inline(always)]
fn option_to_string<T: Display>(o: &Option<T>) -> String {
    o.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

impl Display for RouteElem {
    /// Pipe-separated single-line form, in bgpdump field order.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let elem_type = match self.elem_type {
            ElemType::ANNOUNCE => "A",
            ElemType::WITHDRAW => "W",
        };
        let communities = self
            .communities
            .as_ref()
            .map(|cs| cs.iter().join(" "))
            .unwrap_or_default();
        write!(
            f,
            "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}",
            elem_type,
            self.timestamp,
            self.peer_ip,
            self.peer_asn,
            self.prefix,
            option_to_string(&self.as_path),
            option_to_string(&self.origin),
            option_to_string(&self.next_hop),
            option_to_string(&self.local_pref),
            option_to_string(&self.med),
            communities,
            if self.atomic { "AG" } else { "NAG" },
            option_to_string(&self.aggr_asn),
            option_to_string(&self.aggr_ip),
        )
    }
}
