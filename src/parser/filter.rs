/*!
Declarative filters evaluated against [RouteElem]s.

Filters are constructed from `(name, value)` string pairs via
[Filter::new]. Multi-value filters (`peer_ips`, `peer_asns`,
`origin_asns`, `prefixes`) take a comma-separated list and match when any listed value
matches; a list of attached filters matches when every filter matches.

Supported names:

- `origin_asn` / `origin_asns`: route originated by the given ASN(s)
- `prefix` / `prefix_super` / `prefix_sub` / `prefix_super_sub`: prefix
  match with optional super- and sub-prefix inclusion
- `prefixes`: exact match against any of the listed prefixes
- `peer_ip` / `peer_ips`: collector peer address(es)
- `peer_asn` / `peer_asns`: collector peer ASN(s)
- `type`: `a` (announce) or `w` (withdraw)
- `ts_start` / `start_ts`, `ts_end` / `end_ts`: unix timestamp (float) or
  RFC 3339 datetime
- `as_path`: regular expression over the space-separated AS path
- `ip_version`: `ipv4` or `ipv6`
*/
use crate::error::ParserError;
use crate::models::*;
use chrono::DateTime;
use ipnet::IpNet;
use regex::Regex;
use std::net::IpAddr;
use std::str::FromStr;

/// How a `prefix` filter treats related prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixMatchType {
    /// The exact prefix only.
    Exact,
    /// The prefix and its super-prefixes.
    IncludeSuper,
    /// The prefix and its sub-prefixes.
    IncludeSub,
    /// The prefix, its super-prefixes and its sub-prefixes.
    IncludeSuperSub,
}

#[derive(Debug, Clone)]
pub enum Filter {
    OriginAsn(u32),
    OriginAsns(Vec<u32>),
    Prefix(IpNet, PrefixMatchType),
    Prefixes(Vec<IpNet>),
    PeerIp(IpAddr),
    PeerIps(Vec<IpAddr>),
    PeerAsn(u32),
    PeerAsns(Vec<u32>),
    Type(ElemType),
    TsStart(f64),
    TsEnd(f64),
    AsPath(Regex),
    IpVersion(Afi),
}

fn parse_timestamp(value: &str) -> Result<f64, ParserError> {
    if let Ok(ts) = f64::from_str(value) {
        return Ok(ts);
    }
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => Ok(dt.timestamp_micros() as f64 / 1_000_000.0),
        Err(_) => Err(ParserError::FilterError(format!(
            "cannot parse timestamp (unix or RFC 3339) from {}",
            value
        ))),
    }
}

fn parse_list<T: FromStr>(value: &str, what: &str) -> Result<Vec<T>, ParserError> {
    value
        .split(',')
        .map(|part| {
            T::from_str(part.trim()).map_err(|_| {
                ParserError::FilterError(format!("cannot parse {} from {}", what, part))
            })
        })
        .collect()
}

impl Filter {
    pub fn new(filter_type: &str, filter_value: &str) -> Result<Filter, ParserError> {
        match filter_type {
            "origin_asn" => match u32::from_str(filter_value) {
                Ok(asn) => Ok(Filter::OriginAsn(asn)),
                Err(_) => Err(ParserError::FilterError(format!(
                    "cannot parse origin ASN from {}",
                    filter_value
                ))),
            },
            "origin_asns" => parse_list(filter_value, "origin ASN").map(Filter::OriginAsns),
            "prefix" | "prefix_super" | "prefix_sub" | "prefix_super_sub" => {
                let match_type = match filter_type {
                    "prefix" => PrefixMatchType::Exact,
                    "prefix_super" => PrefixMatchType::IncludeSuper,
                    "prefix_sub" => PrefixMatchType::IncludeSub,
                    _ => PrefixMatchType::IncludeSuperSub,
                };
                match IpNet::from_str(filter_value) {
                    Ok(prefix) => Ok(Filter::Prefix(prefix, match_type)),
                    Err(_) => Err(ParserError::FilterError(format!(
                        "cannot parse prefix from {}",
                        filter_value
                    ))),
                }
            }
            "prefixes" => parse_list(filter_value, "prefix").map(Filter::Prefixes),
            "peer_ip" => match IpAddr::from_str(filter_value) {
                Ok(addr) => Ok(Filter::PeerIp(addr)),
                Err(_) => Err(ParserError::FilterError(format!(
                    "cannot parse peer IP from {}",
                    filter_value
                ))),
            },
            "peer_ips" => parse_list(filter_value, "peer IP").map(Filter::PeerIps),
            "peer_asn" => match u32::from_str(filter_value) {
                Ok(asn) => Ok(Filter::PeerAsn(asn)),
                Err(_) => Err(ParserError::FilterError(format!(
                    "cannot parse peer ASN from {}",
                    filter_value
                ))),
            },
            "peer_asns" => parse_list(filter_value, "peer ASN").map(Filter::PeerAsns),
            "type" => match filter_value {
                "a" | "announce" | "announcement" => Ok(Filter::Type(ElemType::ANNOUNCE)),
                "w" | "withdraw" | "withdrawal" => Ok(Filter::Type(ElemType::WITHDRAW)),
                _ => Err(ParserError::FilterError(format!(
                    "cannot parse element type from {}",
                    filter_value
                ))),
            },
            "ts_start" | "start_ts" => parse_timestamp(filter_value).map(Filter::TsStart),
            "ts_end" | "end_ts" => parse_timestamp(filter_value).map(Filter::TsEnd),
            "as_path" => match Regex::new(filter_value) {
                Ok(regex) => Ok(Filter::AsPath(regex)),
                Err(_) => Err(ParserError::FilterError(format!(
                    "cannot parse AS path regex from {}",
                    filter_value
                ))),
            },
            "ip_version" => match filter_value {
                "ipv4" | "v4" | "4" => Ok(Filter::IpVersion(Afi::Ipv4)),
                "ipv6" | "v6" | "6" => Ok(Filter::IpVersion(Afi::Ipv6)),
                _ => Err(ParserError::FilterError(format!(
                    "cannot parse IP version from {}",
                    filter_value
                ))),
            },
            _ => Err(ParserError::FilterError(format!(
                "unknown filter type: {}",
                filter_type
            ))),
        }
    }
}

fn prefix_match(filter_prefix: &IpNet, elem_prefix: &IpNet, match_type: PrefixMatchType) -> bool {
    let exact = filter_prefix == elem_prefix;
    match match_type {
        PrefixMatchType::Exact => exact,
        PrefixMatchType::IncludeSuper => exact || elem_prefix.contains(filter_prefix),
        PrefixMatchType::IncludeSub => exact || filter_prefix.contains(elem_prefix),
        PrefixMatchType::IncludeSuperSub => {
            exact || elem_prefix.contains(filter_prefix) || filter_prefix.contains(elem_prefix)
        }
    }
}

pub trait Filterable {
    fn match_filter(&self, filter: &Filter) -> bool;
    fn match_filters(&self, filters: &[Filter]) -> bool;
}

impl Filterable for RouteElem {
    fn match_filter(&self, filter: &Filter) -> bool {
        match filter {
            Filter::OriginAsn(asn) => match &self.origin_asns {
                Some(origins) => origins.iter().any(|origin| origin == asn),
                None => false,
            },
            Filter::OriginAsns(asns) => match &self.origin_asns {
                Some(origins) => origins
                    .iter()
                    .any(|origin| asns.iter().any(|asn| origin == asn)),
                None => false,
            },
            Filter::Prefix(prefix, match_type) => {
                prefix_match(prefix, &self.prefix.prefix, *match_type)
            }
            Filter::Prefixes(prefixes) => prefixes.contains(&self.prefix.prefix),
            Filter::PeerIp(addr) => self.peer_ip == *addr,
            Filter::PeerIps(addrs) => addrs.contains(&self.peer_ip),
            Filter::PeerAsn(asn) => self.peer_asn == *asn,
            Filter::PeerAsns(asns) => asns.iter().any(|asn| self.peer_asn == *asn),
            Filter::Type(elem_type) => self.elem_type == *elem_type,
            Filter::TsStart(ts) => self.timestamp >= *ts,
            Filter::TsEnd(ts) => self.timestamp <= *ts,
            Filter::AsPath(regex) => match &self.as_path {
                Some(path) => regex.is_match(&path.to_string()),
                None => false,
            },
            Filter::IpVersion(afi) => Afi::from(self.prefix.prefix.addr()) == *afi,
        }
    }

    fn match_filters(&self, filters: &[Filter]) -> bool {
        filters.iter().all(|filter| self.match_filter(filter))
    }
}
