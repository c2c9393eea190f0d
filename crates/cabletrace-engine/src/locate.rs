//! Candidate locator: resolve free-text endpoint labels to equipment
//! records, and equipment locations to the nearest assigned segment.

use crate::network::Network;
use crate::types::{Equipment, Point3};

/// Find the equipment records a route endpoint label may refer to.
///
/// Matching is tiered. A record matches a tier when its field for that
/// tier is non-empty and appears, case-insensitively, inside `label`.
///
/// 1. Structured code. If anything matches, return those records.
/// 2. Display name, only when tier 1 matched nothing.
///
/// A label can legitimately name several physical instances, so the
/// result may hold more than one record. Records are returned sorted by
/// id so callers see the same order regardless of input order. A blank
/// label matches nothing.
#[must_use]
pub fn locate_candidates<'a>(label: &str, equipment: &'a [Equipment]) -> Vec<&'a Equipment> {
    let needle = label.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let by_code = matching(&needle, equipment, |e| &e.structured_code);
    if by_code.is_empty() {
        matching(&needle, equipment, |e| &e.display_name)
    } else {
        by_code
    }
}

/// Records whose `field` is non-empty and contained in `needle`, which
/// must already be lowercase.
fn matching<'a>(
    needle: &str,
    equipment: &'a [Equipment],
    field: fn(&Equipment) -> &String,
) -> Vec<&'a Equipment> {
    let mut hits: Vec<&Equipment> = equipment
        .iter()
        .filter(|e| {
            let value = field(e).trim();
            !value.is_empty() && needle.contains(&value.to_lowercase())
        })
        .collect();
    hits.sort_by(|a, b| a.id.cmp(&b.id));
    hits
}

/// The allowed segment closest to `location`.
///
/// Distance is measured to each segment's bounding box, so equipment
/// sitting beside a long tray run picks that run rather than a short
/// fitting whose centre happens to be nearer. Ties fall back to the
/// centroid distance, then to the lower index.
///
/// Returns `None` if `allowed` is empty.
#[must_use]
pub fn nearest_segment(network: &Network, allowed: &[usize], location: Point3) -> Option<usize> {
    allowed
        .iter()
        .map(|&idx| {
            let segment = network.segment(idx);
            let to_box = segment.bbox.distance_to_point(location);
            let to_center = segment.location().distance_squared(location);
            (to_box, to_center, idx)
        })
        .min_by(|a, b| {
            a.0.total_cmp(&b.0)
                .then(a.1.total_cmp(&b.1))
                .then(a.2.cmp(&b.2))
        })
        .map(|(_, _, idx)| idx)
}
