//! Contact data produced by the narrow phase
//!
//! A [`ContactManifold`] is the persisted contact state of one collider pair.
//! It survives across steps while the pair keeps touching so the solver can
//! warm-start from last step's impulses.

use crate::foundation::collections::{ActorId, OrderedPair, ShapeId};
use crate::foundation::math::Vec3;

/// Distance within which a new contact point inherits an old point's impulses
pub const WARM_START_TOLERANCE: f32 = 0.1;

/// One point of contact between two shapes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    /// World-space position
    pub position: Vec3,
    /// Signed distance along the manifold normal; negative means overlapping
    pub separation: f32,
    /// Accumulated normal impulse
    pub normal_impulse: f32,
    /// Accumulated friction impulse, tangent to the normal
    pub tangent_impulse: Vec3,
    /// Target normal velocity from restitution, fixed for the step
    pub(crate) velocity_bias: f32,
}

impl ContactPoint {
    /// New contact point without solver history
    pub fn new(position: Vec3, separation: f32) -> Self {
        Self {
            position,
            separation,
            normal_impulse: 0.0,
            tangent_impulse: Vec3::zeros(),
            velocity_bias: 0.0,
        }
    }

    /// Overlap depth, zero when not overlapping
    pub fn penetration(&self) -> f32 {
        (-self.separation).max(0.0)
    }
}

/// Fresh narrow-phase result for one pair
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    /// Unit normal pointing from the first shape to the second
    pub normal: Vec3,
    /// Contact points in no particular order
    pub points: Vec<ContactPoint>,
}

impl Contact {
    /// Smallest separation among the points
    pub fn min_separation(&self) -> f32 {
        self.points
            .iter()
            .map(|p| p.separation)
            .fold(f32::INFINITY, f32::min)
    }
}

/// Persisted contact state for one canonical shape pair
#[derive(Debug, Clone)]
pub struct ContactManifold {
    pair: OrderedPair<ShapeId>,
    actor_a: Option<ActorId>,
    actor_b: Option<ActorId>,
    /// Unit normal from `shape_a()` to `shape_b()`
    pub normal: Vec3,
    /// Up to the configured number of contact points
    pub points: Vec<ContactPoint>,
    /// Neither shape gets a contact response
    pub is_trigger: bool,
    /// Combined friction coefficient
    pub friction: f32,
    /// Combined restitution coefficient
    pub restitution: f32,
    pub(crate) created_step: u64,
    pub(crate) touched_step: u64,
}

impl ContactManifold {
    pub(crate) fn new(
        pair: OrderedPair<ShapeId>,
        actors: (Option<ActorId>, Option<ActorId>),
        is_trigger: bool,
        friction: f32,
        restitution: f32,
        step: u64,
    ) -> Self {
        Self {
            pair,
            actor_a: actors.0,
            actor_b: actors.1,
            normal: Vec3::zeros(),
            points: Vec::new(),
            is_trigger,
            friction,
            restitution,
            created_step: step,
            touched_step: step,
        }
    }

    /// Canonical pair key
    pub fn pair(&self) -> OrderedPair<ShapeId> {
        self.pair
    }

    /// Lower shape of the pair
    pub fn shape_a(&self) -> ShapeId {
        self.pair.first()
    }

    /// Higher shape of the pair
    pub fn shape_b(&self) -> ShapeId {
        self.pair.second()
    }

    /// Body owning `shape_a`, if any
    pub fn actor_a(&self) -> Option<ActorId> {
        self.actor_a
    }

    /// Body owning `shape_b`, if any
    pub fn actor_b(&self) -> Option<ActorId> {
        self.actor_b
    }

    /// True if either side is `actor`
    pub fn involves_actor(&self, actor: ActorId) -> bool {
        self.actor_a == Some(actor) || self.actor_b == Some(actor)
    }

    /// Deepest overlap among the current points
    pub fn max_penetration(&self) -> f32 {
        self.points.iter().map(ContactPoint::penetration).fold(0.0, f32::max)
    }

    /// Replace the points with fresh narrow-phase data
    ///
    /// Each new point inherits the impulses of the nearest unmatched old point
    /// within [`WARM_START_TOLERANCE`]; the rest start from zero.
    pub(crate) fn update(&mut self, contact: Contact, step: u64) {
        let mut previous = std::mem::take(&mut self.points);
        let same_normal = self.normal.dot(&contact.normal) > 0.9;

        self.points = contact
            .points
            .into_iter()
            .map(|mut point| {
                if same_normal {
                    let nearest = previous
                        .iter()
                        .enumerate()
                        .map(|(i, old)| (i, (old.position - point.position).magnitude_squared()))
                        .filter(|(_, d)| *d <= WARM_START_TOLERANCE * WARM_START_TOLERANCE)
                        .min_by(|x, y| x.1.total_cmp(&y.1));
                    if let Some((index, _)) = nearest {
                        let old = previous.swap_remove(index);
                        point.normal_impulse = old.normal_impulse;
                        point.tangent_impulse = old.tangent_impulse;
                    }
                }
                point
            })
            .collect();
        self.normal = contact.normal;
        self.touched_step = step;
    }

    /// Keep the pair alive this step without solvable points
    pub(crate) fn touch_without_points(&mut self, step: u64) {
        self.points.clear();
        self.touched_step = step;
    }

    /// True if first seen this step
    pub(crate) fn is_new(&self, step: u64) -> bool {
        self.created_step == step
    }
}
