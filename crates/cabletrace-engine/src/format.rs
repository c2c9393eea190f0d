//! Human-readable renderings of a route path.

use std::collections::HashSet;

use crate::network::Network;
use crate::stitch::RoutePath;

/// Render `path` as segment identifiers joined by transition
/// separators, e.g. `S1,S2 || S3,S4`.
#[must_use]
pub fn describe_path(network: &Network, path: &RoutePath) -> String {
    let mut out = String::new();
    for (i, &idx) in path.segments.iter().enumerate() {
        if i > 0 {
            out.push_str(path.transitions[i - 1].separator());
        }
        out.push_str(&network.segment(idx).id);
    }
    out
}

/// Distinct branch codes along `path` in first-seen order, joined by
/// commas. Empty codes are skipped.
#[must_use]
pub fn branch_summary(network: &Network, path: &RoutePath, separator: char) -> String {
    let mut seen = HashSet::new();
    path.segments
        .iter()
        .map(|&idx| network.segment(idx).branch_code(separator))
        .filter(|code| !code.is_empty() && seen.insert(*code))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::network::tests::straight;
    use crate::types::{EngineConfig, SegmentKind};

    fn network() -> Network {
        let mut tagged = straight("CT-04-B2", SegmentKind::Tray, 5.0, 6.0);
        tagged.branch = Some("RISER".to_string());
        Network::build(
            vec![
                straight("CT-01-B1", SegmentKind::Tray, 0.0, 1.0),
                straight("CT-02-B1", SegmentKind::Tray, 1.0, 2.0),
                straight("CD-03-B2", SegmentKind::Conduit, 2.0, 3.0),
                tagged,
            ],
            &EngineConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn description_uses_separators() {
        let net = network();
        // Indices follow sorted ids: CD-03, CT-01, CT-02, CT-04.
        let path = RoutePath::classify(&net, vec![1, 2, 0, 3], &EngineConfig::default());
        assert_eq!(
            describe_path(&net, &path),
            "CT-01-B1,CT-02-B1 + CD-03-B2 >> CT-04-B2"
        );
    }

    #[test]
    fn empty_path_is_empty_string() {
        let net = network();
        let path = RoutePath::classify(&net, Vec::new(), &EngineConfig::default());
        assert_eq!(describe_path(&net, &path), "");
        assert_eq!(branch_summary(&net, &path, '-'), "");
    }

    #[test]
    fn summary_deduplicates_in_order() {
        let net = network();
        let path = RoutePath::classify(&net, vec![1, 2, 0, 3], &EngineConfig::default());
        assert_eq!(branch_summary(&net, &path, '-'), "B1,B2,RISER");
    }

    #[test]
    fn summary_without_separator_uses_whole_id() {
        let net = network();
        let path = RoutePath::classify(&net, vec![1, 2], &EngineConfig::default());
        assert_eq!(branch_summary(&net, &path, '/'), "CT-01-B1,CT-02-B1");
    }
}
