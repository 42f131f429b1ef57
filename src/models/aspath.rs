//! AS path segments, AS_PATH/AS4_PATH merging and origin extraction.
use crate::models::Asn;
use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// One segment of an AS path (RFC 4271 section 4.3, RFC 5065).
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum AsPathSegment {
    AsSequence(Vec<Asn>),
    AsSet(Vec<Asn>),
    ConfedSequence(Vec<Asn>),
    ConfedSet(Vec<Asn>),
}

impl AsPathSegment {
    /// Number of ASNs this segment contributes to the path length.
    ///
    /// A set counts as one hop regardless of its size; confederation
    /// segments do not count (RFC 5065 section 5.3).
    pub fn count_asns(&self) -> usize {
        match self {
            AsPathSegment::AsSequence(v) => v.len(),
            AsPathSegment::AsSet(_) => 1,
            AsPathSegment::ConfedSequence(_) | AsPathSegment::ConfedSet(_) => 0,
        }
    }
}

/// An ordered list of AS path segments.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Default)]
pub struct AsPath {
    pub segments: Vec<AsPathSegment>,
}

impl AsPath {
    pub fn from_segments(segments: Vec<AsPathSegment>) -> AsPath {
        AsPath { segments }
    }

    /// Convenience constructor for a path consisting of a single sequence.
    pub fn from_sequence<I: IntoIterator<Item = u32>>(asns: I) -> AsPath {
        AsPath {
            segments: vec![AsPathSegment::AsSequence(
                asns.into_iter().map(Asn::new_32bit).collect(),
            )],
        }
    }

    pub fn count_asns(&self) -> usize {
        self.segments.iter().map(AsPathSegment::count_asns).sum()
    }

    /// The origin ASNs of this path.
    ///
    /// A path ending in a sequence has exactly one origin; a path ending in
    /// an AS set yields every member of the set. Paths ending in a
    /// confederation segment have no meaningful origin.
    pub fn origin_asns(&self) -> Option<Vec<Asn>> {
        match self.segments.last()? {
            AsPathSegment::AsSequence(v) => v.last().map(|asn| vec![*asn]),
            AsPathSegment::AsSet(v) => Some(v.clone()),
            AsPathSegment::ConfedSequence(_) | AsPathSegment::ConfedSet(_) => None,
        }
    }

    /// Reconstruct the 4-byte path from AS_PATH and AS4_PATH per
    /// RFC 6793 section 4.2.3.
    ///
    /// When AS_PATH carries more ASNs than AS4_PATH, the leading excess of
    /// AS_PATH is prepended to AS4_PATH; when it carries fewer, AS4_PATH is
    /// ignored altogether.
    pub fn merge_aspath_as4path(aspath: &AsPath, as4path: &AsPath) -> AsPath {
        if aspath.count_asns() < as4path.count_asns() {
            return aspath.clone();
        }

        let mut as4_segments = as4path.segments.iter();
        let mut merged = Vec::with_capacity(aspath.segments.len());

        for segment in &aspath.segments {
            match (segment, as4_segments.next()) {
                (AsPathSegment::AsSequence(seq), Some(AsPathSegment::AsSequence(seq4)))
                    if seq.len() >= seq4.len() =>
                {
                    let mut combined = Vec::with_capacity(seq.len());
                    combined.extend_from_slice(&seq[..seq.len() - seq4.len()]);
                    combined.extend_from_slice(seq4);
                    merged.push(AsPathSegment::AsSequence(combined));
                }
                (_, Some(segment4)) => merged.push(segment4.clone()),
                // AS4_PATH exhausted, keep the 2-byte segment as-is
                (_, None) => merged.push(segment.clone()),
            }
        }

        AsPath { segments: merged }
    }
}

impl Display for AsPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            self.segments
                .iter()
                .map(|segment| match segment {
                    AsPathSegment::AsSequence(v) | AsPathSegment::ConfedSequence(v) =>
                        v.iter().join(" "),
                    AsPathSegment::AsSet(v) | AsPathSegment::ConfedSet(v) =>
                        format!("{{{}}}", v.iter().join(",")),
                })
                .join(" ")
        )
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for AsPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let path = AsPath::from_segments(vec![
            AsPathSegment::AsSequence(vec![Asn::new_32bit(174), Asn::new_32bit(1916)]),
            AsPathSegment::AsSet(vec![Asn::new_32bit(52888), Asn::new_32bit(52889)]),
        ]);
        assert_eq!(path.to_string(), "174 1916 {52888,52889}");
    }

    #[test]
    fn test_origin_from_sequence() {
        let path = AsPath::from_sequence([174, 1916, 52888]);
        assert_eq!(
            path.origin_asns(),
            Some(vec![Asn::new_32bit(52888)])
        );
    }

    #[test]
    fn test_origin_from_set() {
        let path = AsPath::from_segments(vec![
            AsPathSegment::AsSequence(vec![Asn::new_32bit(174)]),
            AsPathSegment::AsSet(vec![Asn::new_32bit(100), Asn::new_32bit(200)]),
        ]);
        assert_eq!(
            path.origin_asns(),
            Some(vec![Asn::new_32bit(100), Asn::new_32bit(200)])
        );
        assert_eq!(AsPath::default().origin_asns(), None);
    }

    #[test]
    fn test_merge_as4path_longer_prefix() {
        // AS_PATH has one extra leading hop not present in AS4_PATH
        let as_path = AsPath::from_sequence([65000, 23456, 23456]);
        let as4_path = AsPath::from_sequence([400001, 400002]);
        let merged = AsPath::merge_aspath_as4path(&as_path, &as4_path);
        assert_eq!(
            merged,
            AsPath::from_sequence([65000, 400001, 400002])
        );
    }

    #[test]
    fn test_merge_as4path_ignored_when_longer() {
        // AS4_PATH longer than AS_PATH: ignore AS4_PATH entirely
        let as_path = AsPath::from_sequence([65000]);
        let as4_path = AsPath::from_sequence([400001, 400002]);
        let merged = AsPath::merge_aspath_as4path(&as_path, &as4_path);
        assert_eq!(merged, as_path);
    }

    #[test]
    fn test_count_asns() {
        let path = AsPath::from_segments(vec![
            AsPathSegment::AsSequence(vec![Asn::new_32bit(1), Asn::new_32bit(2)]),
            AsPathSegment::AsSet(vec![Asn::new_32bit(3), Asn::new_32bit(4)]),
            AsPathSegment::ConfedSequence(vec![Asn::new_32bit(5)]),
        ]);
        assert_eq!(path.count_asns(), 3);
    }
}
