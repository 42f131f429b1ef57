//! Flattening MRT records into per-prefix [RouteElem]s.
use crate::models::*;
use log::warn;
use std::net::IpAddr;

/// Stateful record-to-element converter.
///
/// TABLE_DUMP_V2 RIB entries reference peers by index into the
/// PEER_INDEX_TABLE record that leads the dump, so conversion must see that
/// record before any RIB record and keeps it in between.
#[derive(Default)]
pub struct ElemExtractor {
    peer_table: Option<PeerIndexTable>,
}

/// The attribute values the element layer cares about, pulled out of one
/// attribute list.
#[derive(Default)]
struct PathAttrs {
    as_path: Option<AsPath>,
    as4_path: Option<AsPath>,
    origin: Option<Origin>,
    next_hop: Option<IpAddr>,
    local_pref: Option<u32>,
    med: Option<u32>,
    communities: Option<Vec<Community>>,
    atomic: bool,
    aggregator: Option<(Asn, IpAddr)>,
    announced: Option<Nlri>,
    withdrawn: Option<Nlri>,
}

impl PathAttrs {
    fn from_attributes(attributes: Vec<Attribute>) -> PathAttrs {
        let mut extracted = PathAttrs::default();
        for attr in attributes {
            match attr.value {
                AttributeValue::Origin(v) => extracted.origin = Some(v),
                AttributeValue::AsPath { path, is_as4: false } => {
                    extracted.as_path = Some(path)
                }
                AttributeValue::AsPath { path, is_as4: true } => {
                    extracted.as4_path = Some(path)
                }
                AttributeValue::NextHop(v) => extracted.next_hop = Some(v),
                AttributeValue::MultiExitDiscriminator(v) => extracted.med = Some(v),
                AttributeValue::LocalPreference(v) => extracted.local_pref = Some(v),
                AttributeValue::AtomicAggregate => extracted.atomic = true,
                AttributeValue::Aggregator { asn, id, .. } => {
                    extracted.aggregator = Some((asn, IpAddr::V4(id)))
                }
                AttributeValue::Communities(v) => extracted.communities = Some(v),
                AttributeValue::MpReachNlri(v) => extracted.announced = Some(v),
                AttributeValue::MpUnreachNlri(v) => extracted.withdrawn = Some(v),
                _ => {}
            }
        }
        extracted
    }

    /// AS path with AS4_PATH merged in when both are present.
    fn merged_path(&self) -> Option<AsPath> {
        match (&self.as_path, &self.as4_path) {
            (None, None) => None,
            (Some(path), None) => Some(path.clone()),
            (None, Some(path)) => Some(path.clone()),
            (Some(path), Some(path4)) => Some(AsPath::merge_aspath_as4path(path, path4)),
        }
    }

    /// NEXT_HOP attribute, falling back to the MP_REACH_NLRI next hop.
    fn effective_next_hop(&self) -> Option<IpAddr> {
        self.next_hop.or_else(|| {
            self.announced
                .as_ref()
                .and_then(|nlri| nlri.next_hop.as_ref())
                .map(NextHopAddress::addr)
        })
    }
}

impl ElemExtractor {
    pub fn new() -> ElemExtractor {
        ElemExtractor::default()
    }

    /// Convert one MRT record into its per-prefix elements.
    ///
    /// State changes, OPEN, NOTIFICATION and KEEPALIVE messages produce no
    /// elements. A RIB record arriving without a preceding peer index table
    /// is logged and dropped rather than failing the stream.
    pub fn record_to_elems(&mut self, record: MrtRecord) -> Vec<RouteElem> {
        let timestamp = record.common_header.timestamp_secs();
        match record.message {
            MrtMessage::Bgp4Mp(Bgp4Mp::StateChange(_)) => vec![],
            MrtMessage::Bgp4Mp(Bgp4Mp::Message(msg)) => {
                bgp4mp_message_to_elems(msg, timestamp)
            }
            MrtMessage::TableDumpV2(TableDumpV2Message::PeerIndexTable(table)) => {
                self.peer_table = Some(table);
                vec![]
            }
            MrtMessage::TableDumpV2(TableDumpV2Message::RibAfiEntries(rib)) => {
                let Some(peer_table) = &self.peer_table else {
                    warn!("RIB record before peer index table, dropping");
                    return vec![];
                };
                rib_to_elems(rib, peer_table, timestamp)
            }
        }
    }
}

fn bgp4mp_message_to_elems(msg: Bgp4MpMessage, timestamp: f64) -> Vec<RouteElem> {
    let BgpMessage::Update(update) = msg.bgp_message else {
        return vec![];
    };
    let peer_ip = msg.peer_ip;
    let peer_asn = msg.peer_asn;

    let attrs = PathAttrs::from_attributes(update.attributes);
    let as_path = attrs.merged_path();
    let origin_asns = as_path.as_ref().and_then(AsPath::origin_asns);
    let next_hop = attrs.effective_next_hop();

    let mut elems = vec![];

    let announce = |prefix: NetworkPrefix| RouteElem {
        timestamp,
        elem_type: ElemType::ANNOUNCE,
        peer_ip,
        peer_asn,
        prefix,
        next_hop,
        as_path: as_path.clone(),
        origin_asns: origin_asns.clone(),
        origin: attrs.origin,
        local_pref: attrs.local_pref,
        med: attrs.med,
        communities: attrs.communities.clone(),
        atomic: attrs.atomic,
        aggr_asn: attrs.aggregator.map(|(asn, _)| asn),
        aggr_ip: attrs.aggregator.map(|(_, ip)| ip),
    };

    elems.extend(update.announced_prefixes.into_iter().map(announce));
    if let Some(nlri) = &attrs.announced {
        elems.extend(nlri.prefixes.iter().copied().map(announce));
    }

    let withdraw = |prefix: NetworkPrefix| RouteElem {
        timestamp,
        elem_type: ElemType::WITHDRAW,
        peer_ip,
        peer_asn,
        prefix,
        next_hop: None,
        as_path: None,
        origin_asns: None,
        origin: None,
        local_pref: None,
        med: None,
        communities: None,
        atomic: false,
        aggr_asn: None,
        aggr_ip: None,
    };

    elems.extend(update.withdrawn_prefixes.into_iter().map(withdraw));
    if let Some(nlri) = &attrs.withdrawn {
        elems.extend(nlri.prefixes.iter().copied().map(withdraw));
    }

    elems
}

fn rib_to_elems(
    rib: RibAfiEntries,
    peer_table: &PeerIndexTable,
    timestamp: f64,
) -> Vec<RouteElem> {
    let prefix = rib.prefix;
    let mut elems = Vec::with_capacity(rib.rib_entries.len());

    for entry in rib.rib_entries {
        let Some(peer) = peer_table.get_peer(entry.peer_index) else {
            warn!("RIB entry references unknown peer index {}", entry.peer_index);
            continue;
        };

        let attrs = PathAttrs::from_attributes(entry.attributes);
        let as_path = attrs.merged_path();
        let origin_asns = as_path.as_ref().and_then(AsPath::origin_asns);
        let next_hop = attrs.effective_next_hop();

        elems.push(RouteElem {
            timestamp,
            elem_type: ElemType::ANNOUNCE,
            peer_ip: peer.peer_address,
            peer_asn: peer.peer_asn,
            prefix,
            next_hop,
            as_path,
            origin_asns,
            origin: attrs.origin,
            local_pref: attrs.local_pref,
            med: attrs.med,
            communities: attrs.communities,
            atomic: attrs.atomic,
            aggr_asn: attrs.aggregator.map(|(asn, _)| asn),
            aggr_ip: attrs.aggregator.map(|(_, ip)| ip),
        });
    }

    elems
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::net::Ipv4Addr;
    use std::str::FromStr;

    fn update_record(update: BgpUpdateMessage) -> MrtRecord {
        MrtRecord {
            common_header: CommonHeader {
                timestamp: 1637437798,
                microsecond_timestamp: None,
                entry_type: EntryType::BGP4MP,
                entry_subtype: Bgp4MpType::MessageAs4 as u16,
                length: 0,
            },
            message: MrtMessage::Bgp4Mp(Bgp4Mp::Message(Bgp4MpMessage {
                msg_type: Bgp4MpType::MessageAs4,
                peer_asn: Asn::new_32bit(65001),
                local_asn: Asn::new_32bit(65002),
                interface_index: 0,
                peer_ip: IpAddr::from_str("10.0.0.1").unwrap(),
                local_ip: IpAddr::from_str("10.0.0.2").unwrap(),
                bgp_message: BgpMessage::Update(update),
            })),
        }
    }

    fn transitive(value: AttributeValue) -> Attribute {
        Attribute {
            value,
            flag: AttrFlags::TRANSITIVE,
        }
    }

    #[test]
    fn test_update_to_elems() {
        let update = BgpUpdateMessage {
            withdrawn_prefixes: vec![NetworkPrefix::from_str("203.0.113.0/24").unwrap()],
            attributes: vec![
                transitive(AttributeValue::Origin(Origin::IGP)),
                transitive(AttributeValue::AsPath {
                    path: AsPath::from_sequence([65001, 65003]),
                    is_as4: false,
                }),
                transitive(AttributeValue::NextHop(
                    IpAddr::from_str("10.0.0.1").unwrap(),
                )),
            ],
            announced_prefixes: vec![NetworkPrefix::from_str("192.0.2.0/24").unwrap()],
        };

        let mut extractor = ElemExtractor::new();
        let elems = extractor.record_to_elems(update_record(update));
        assert_eq!(elems.len(), 2);

        let announce = &elems[0];
        assert_eq!(announce.elem_type, ElemType::ANNOUNCE);
        assert_eq!(announce.prefix.prefix.to_string(), "192.0.2.0/24");
        assert_eq!(announce.origin_asns, Some(vec![Asn::new_32bit(65003)]));
        assert_eq!(announce.next_hop, Some(IpAddr::from_str("10.0.0.1").unwrap()));

        let withdraw = &elems[1];
        assert_eq!(withdraw.elem_type, ElemType::WITHDRAW);
        assert_eq!(withdraw.prefix.prefix.to_string(), "203.0.113.0/24");
        assert!(withdraw.as_path.is_none());
    }

    #[test]
    fn test_mp_reach_next_hop_fallback() {
        let prefix = NetworkPrefix::from_str("2001:db8::/32").unwrap();
        let update = BgpUpdateMessage {
            withdrawn_prefixes: vec![],
            attributes: vec![transitive(AttributeValue::MpReachNlri(Nlri {
                afi: Afi::Ipv6,
                safi: Safi::Unicast,
                next_hop: Some(NextHopAddress::Ipv6(
                    "2001:db8::1".parse().unwrap(),
                )),
                prefixes: vec![prefix],
            }))],
            announced_prefixes: vec![],
        };

        let mut extractor = ElemExtractor::new();
        let elems = extractor.record_to_elems(update_record(update));
        assert_eq!(elems.len(), 1);
        assert_eq!(elems[0].prefix, prefix);
        assert_eq!(
            elems[0].next_hop,
            Some(IpAddr::from_str("2001:db8::1").unwrap())
        );
    }

    #[test]
    fn test_rib_record_without_peer_table_dropped() {
        let record = MrtRecord {
            common_header: CommonHeader {
                timestamp: 0,
                microsecond_timestamp: None,
                entry_type: EntryType::TABLE_DUMP_V2,
                entry_subtype: TableDumpV2Type::RibIpv4Unicast as u16,
                length: 0,
            },
            message: MrtMessage::TableDumpV2(TableDumpV2Message::RibAfiEntries(
                RibAfiEntries {
                    rib_type: TableDumpV2Type::RibIpv4Unicast,
                    sequence_number: 0,
                    prefix: NetworkPrefix::from_str("192.0.2.0/24").unwrap(),
                    rib_entries: vec![RibEntry {
                        peer_index: 0,
                        originated_time: 0,
                        attributes: vec![],
                    }],
                },
            )),
        };

        let mut extractor = ElemExtractor::new();
        assert!(extractor.record_to_elems(record).is_empty());
    }

    #[test]
    fn test_rib_entries_to_elems() {
        let mut peers = HashMap::new();
        peers.insert(
            0,
            Peer::new(
                Ipv4Addr::new(10, 0, 0, 1),
                IpAddr::from_str("10.0.0.1").unwrap(),
                Asn::new_32bit(65001),
            ),
        );
        let table_record = MrtRecord {
            common_header: CommonHeader {
                timestamp: 0,
                microsecond_timestamp: None,
                entry_type: EntryType::TABLE_DUMP_V2,
                entry_subtype: TableDumpV2Type::PeerIndexTable as u16,
                length: 0,
            },
            message: MrtMessage::TableDumpV2(TableDumpV2Message::PeerIndexTable(
                PeerIndexTable {
                    collector_bgp_id: Ipv4Addr::new(192, 0, 2, 1),
                    view_name: String::new(),
                    peers,
                },
            )),
        };

        let rib_record = MrtRecord {
            common_header: CommonHeader {
                timestamp: 1637437798,
                microsecond_timestamp: None,
                entry_type: EntryType::TABLE_DUMP_V2,
                entry_subtype: TableDumpV2Type::RibIpv4Unicast as u16,
                length: 0,
            },
            message: MrtMessage::TableDumpV2(TableDumpV2Message::RibAfiEntries(
                RibAfiEntries {
                    rib_type: TableDumpV2Type::RibIpv4Unicast,
                    sequence_number: 1,
                    prefix: NetworkPrefix::from_str("192.0.2.0/24").unwrap(),
                    rib_entries: vec![RibEntry {
                        peer_index: 0,
                        originated_time: 1637437000,
                        attributes: vec![
                            transitive(AttributeValue::Origin(Origin::IGP)),
                            transitive(AttributeValue::AsPath {
                                path: AsPath::from_sequence([65001, 65010]),
                                is_as4: false,
                            }),
                        ],
                    }],
                },
            )),
        };

        let mut extractor = ElemExtractor::new();
        assert!(extractor.record_to_elems(table_record).is_empty());
        let elems = extractor.record_to_elems(rib_record);
        assert_eq!(elems.len(), 1);
        assert_eq!(elems[0].peer_asn, Asn::new_32bit(65001));
        assert_eq!(elems[0].origin_asn(), Some(Asn::new_32bit(65010)));
    }
}
