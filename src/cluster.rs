use std::collections::HashSet;

use crate::data::{Organization, Position};

const TILE_SIZE: f64 = 256.0;

/// One meeting marker as the clustering pass sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterPoint {
    pub id: i32,
    pub org: Organization,
    pub position: Position,
}

/// A group of markers rendered as a single map icon. `anchor` is the
/// position of the first member, so cluster placement is stable for a given
/// input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub members: Vec<ClusterPoint>,
    pub anchor: Position,
}

/// Web-mercator world pixel coordinates of `position` at `zoom`.
pub fn project(position: Position, zoom: f64) -> (f64, f64) {
    let scale = TILE_SIZE * 2f64.powf(zoom);

    let x = (position.longitude + 180.0) / 360.0 * scale;

    let lat_rad = position.latitude.to_radians();
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0 * scale;

    (x, y)
}

/// Greedy proximity grouping: each point joins the first existing cluster
/// whose anchor is within `radius_px` on screen at `zoom`, else starts a
/// cluster of its own. Deterministic for a given input order.
pub fn cluster_markers(points: &[ClusterPoint], zoom: f64, radius_px: f64) -> Vec<Cluster> {
    let mut clusters: Vec<Cluster> = Vec::new();

    for point in points {
        let (x, y) = project(point.position, zoom);

        let joined = clusters.iter_mut().find(|cluster| {
            let (cx, cy) = project(cluster.anchor, zoom);
            ((x - cx).powi(2) + (y - cy).powi(2)).sqrt() <= radius_px
        });

        match joined {
            Some(cluster) => cluster.members.push(*point),
            None => clusters.push(Cluster {
                members: vec![*point],
                anchor: point.position,
            }),
        }
    }

    clusters
}

/// Picks the members whose logos make up a cluster icon: one marker per
/// distinct organization first (first-seen, original order), remaining
/// slots filled with leftover markers in original order, capped at `cap`.
/// The result is reversed so that when rendered in order, the
/// distinct-organization logos land on top of the stack.
pub fn sample_cluster_icons(members: &[ClusterPoint], cap: usize) -> Vec<ClusterPoint> {
    let mut sample: Vec<ClusterPoint> = Vec::new();
    let mut seen_orgs = HashSet::new();

    for member in members {
        if seen_orgs.insert(member.org) {
            sample.push(*member);
        }
    }

    sample.truncate(cap);

    for member in members {
        if sample.len() >= cap {
            break;
        }

        if !sample.iter().any(|picked| picked.id == member.id) {
            sample.push(*member);
        }
    }

    sample.reverse();
    sample
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: i32, org: Organization, latitude: f64, longitude: f64) -> ClusterPoint {
        ClusterPoint {
            id,
            org,
            position: Position::new(latitude, longitude),
        }
    }

    #[test]
    fn sample_takes_one_marker_per_org_then_reverses() {
        let members = [
            point(1, Organization::AnonymousAlcoholics, 0.0, 0.0),
            point(2, Organization::DebtorsAnonymous, 0.0, 0.0),
            point(3, Organization::AnonymousAlcoholics, 0.0, 0.0),
            point(4, Organization::NarcoticsAnonymous, 0.0, 0.0),
        ];

        let sample = sample_cluster_icons(&members, 3);

        let ids: Vec<i32> = sample.iter().map(|member| member.id).collect();
        assert_eq!(ids, vec![4, 2, 1]);
    }

    #[test]
    fn leftover_markers_fill_the_remaining_slots_in_order() {
        let members = [
            point(1, Organization::AnonymousAlcoholics, 0.0, 0.0),
            point(2, Organization::AnonymousAlcoholics, 0.0, 0.0),
            point(3, Organization::AnonymousAlcoholics, 0.0, 0.0),
        ];

        let sample = sample_cluster_icons(&members, 2);

        let ids: Vec<i32> = sample.iter().map(|member| member.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn nearby_markers_group_at_low_zoom_but_not_at_high_zoom() {
        let points = [
            point(1, Organization::AnonymousAlcoholics, 52.370, 4.890),
            point(2, Organization::NarcoticsAnonymous, 52.372, 4.893),
        ];

        let low_zoom = cluster_markers(&points, 5.0, 64.0);
        assert_eq!(low_zoom.len(), 1);
        assert_eq!(low_zoom[0].members.len(), 2);

        let high_zoom = cluster_markers(&points, 17.0, 64.0);
        assert_eq!(high_zoom.len(), 2);
    }

    #[test]
    fn distant_markers_never_group() {
        let points = [
            point(1, Organization::AnonymousAlcoholics, 52.37, 4.89),
            point(2, Organization::NarcoticsAnonymous, 48.85, 2.35),
        ];

        let clusters = cluster_markers(&points, 5.0, 64.0);
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn cluster_anchor_is_the_first_member_position() {
        let points = [
            point(1, Organization::AnonymousAlcoholics, 52.370, 4.890),
            point(2, Organization::NarcoticsAnonymous, 52.371, 4.891),
        ];

        let clusters = cluster_markers(&points, 3.0, 64.0);
        assert_eq!(clusters[0].anchor, Position::new(52.370, 4.890));
    }

    #[test]
    fn grouping_is_deterministic_for_a_given_order() {
        let points = [
            point(1, Organization::AnonymousAlcoholics, 10.0, 10.0),
            point(2, Organization::DebtorsAnonymous, 10.001, 10.001),
            point(3, Organization::NarcoticsAnonymous, 10.002, 10.002),
        ];

        let first = cluster_markers(&points, 4.0, 64.0);
        let second = cluster_markers(&points, 4.0, 64.0);
        assert_eq!(first, second);
    }
}
