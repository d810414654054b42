//! Broad-phase pair finding
//!
//! Implementations only shortlist pairs whose bounds overlap; the narrow phase
//! decides actual contact. Every implementation must return the same pairs in
//! the same canonical order, so swapping algorithms never changes results.

use crate::core::config::BroadPhaseKind;
use crate::foundation::collections::{OrderedPair, ShapeId};

use super::collision::Bounds;

/// Broad-phase input for one collider
#[derive(Debug, Clone, Copy)]
pub struct Proxy {
    /// Collider handle
    pub shape: ShapeId,
    /// Bounds swept over this step's motion
    pub bounds: Bounds,
    /// Whether the collider belongs to an awake body
    pub active: bool,
}

/// Abstract interface for broad-phase collision detection
pub trait BroadPhase {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Canonical, sorted, duplicate-free pairs of overlapping proxies where at
    /// least one side is active
    fn find_pairs(&mut self, proxies: &[Proxy]) -> Vec<OrderedPair<ShapeId>>;
}

/// Create the broad phase selected in the configuration
pub fn create(kind: BroadPhaseKind) -> Box<dyn BroadPhase> {
    match kind {
        BroadPhaseKind::BruteForce => Box::new(BruteForce),
        BroadPhaseKind::SweepAndPrune => Box::new(SweepAndPrune::default()),
    }
}

fn wants_pair(a: &Proxy, b: &Proxy) -> bool {
    (a.active || b.active) && a.bounds.intersects(&b.bounds)
}

fn finish(mut pairs: Vec<OrderedPair<ShapeId>>) -> Vec<OrderedPair<ShapeId>> {
    pairs.sort_unstable();
    pairs.dedup();
    pairs
}

/// Tests every pair of proxies
#[derive(Debug, Default)]
pub struct BruteForce;

impl BroadPhase for BruteForce {
    fn name(&self) -> &'static str {
        "brute-force"
    }

    fn find_pairs(&mut self, proxies: &[Proxy]) -> Vec<OrderedPair<ShapeId>> {
        let mut pairs = Vec::new();
        for (i, a) in proxies.iter().enumerate() {
            for b in &proxies[i + 1..] {
                if wants_pair(a, b) {
                    pairs.push(OrderedPair::new(a.shape, b.shape));
                }
            }
        }
        finish(pairs)
    }
}

/// Sorts proxies along x and only tests proxies whose x intervals overlap
#[derive(Debug, Default)]
pub struct SweepAndPrune {
    // reused between steps to avoid reallocating
    order: Vec<usize>,
}

impl BroadPhase for SweepAndPrune {
    fn name(&self) -> &'static str {
        "sweep-and-prune"
    }

    fn find_pairs(&mut self, proxies: &[Proxy]) -> Vec<OrderedPair<ShapeId>> {
        self.order.clear();
        self.order.extend(0..proxies.len());
        self.order
            .sort_by(|&a, &b| proxies[a].bounds.min().x.total_cmp(&proxies[b].bounds.min().x));

        let mut pairs = Vec::new();
        for (position, &i) in self.order.iter().enumerate() {
            let a = &proxies[i];
            let max_x = a.bounds.max().x;
            for &j in &self.order[position + 1..] {
                let b = &proxies[j];
                if b.bounds.min().x > max_x {
                    break;
                }
                if wants_pair(a, b) {
                    pairs.push(OrderedPair::new(a.shape, b.shape));
                }
            }
        }
        finish(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::SlotMap;
    use crate::foundation::math::Vec3;

    fn proxies() -> Vec<Proxy> {
        let mut shapes: SlotMap<ShapeId, ()> = SlotMap::with_key();
        let layout = [
            (Vec3::new(0.0, 0.0, 0.0), true),
            (Vec3::new(1.5, 0.0, 0.0), true),
            (Vec3::new(-1.5, 0.0, 0.0), false),
            (Vec3::new(10.0, 0.0, 0.0), true),
            (Vec3::new(-1.5, 1.5, 0.0), false),
            (Vec3::new(3.0, 0.0, 0.0), true),
        ];
        layout
            .iter()
            .map(|(center, active)| Proxy {
                shape: shapes.insert(()),
                bounds: Bounds::new(*center, Vec3::repeat(1.0)),
                active: *active,
            })
            .collect()
    }

    #[test]
    fn test_brute_force_pairs() {
        let proxies = proxies();
        let pairs = BruteForce.find_pairs(&proxies);
        let expected = vec![
            OrderedPair::new(proxies[0].shape, proxies[1].shape),
            OrderedPair::new(proxies[0].shape, proxies[2].shape),
            OrderedPair::new(proxies[0].shape, proxies[4].shape),
            OrderedPair::new(proxies[1].shape, proxies[5].shape),
        ];
        // 2 and 4 overlap but are both inactive
        assert_eq!(pairs, finish(expected));
    }

    #[test]
    fn test_sweep_and_prune_matches_brute_force() {
        let proxies = proxies();
        let brute = BruteForce.find_pairs(&proxies);

        let mut reversed = proxies.clone();
        reversed.reverse();
        let mut sap = SweepAndPrune::default();
        assert_eq!(sap.find_pairs(&proxies), brute);
        assert_eq!(sap.find_pairs(&reversed), brute);
    }
}
