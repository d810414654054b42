//! Contact and trigger events
//!
//! Each step the manifold cache is diffed against the previous step. A pair
//! produces at most one event per step: `Enter` when it first touches, `Stay`
//! while it keeps touching, `Exit` on the first step it no longer does. Each
//! pair event is delivered once to each side, from that side's point of view.

use crate::foundation::collections::{GameObjectId, ShapeId};
use crate::foundation::math::Vec3;

use super::contact::ContactPoint;

/// Which transition an event reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactPhase {
    /// Pair started touching this step
    Enter,
    /// Pair touched last step and still does
    Stay,
    /// Pair touched last step and no longer does
    Exit,
}

/// One side's view of a pair transition
#[derive(Debug, Clone, PartialEq)]
pub struct ContactEvent {
    /// Transition kind
    pub phase: ContactPhase,
    /// True if either collider is a trigger
    pub is_trigger: bool,
    /// Collider receiving the event
    pub shape: ShapeId,
    /// Game object owning `shape`
    pub object: GameObjectId,
    /// Collider on the other side
    pub other_shape: ShapeId,
    /// Game object owning `other_shape`
    pub other_object: GameObjectId,
    /// Unit normal pointing from this collider towards the other
    pub normal: Vec3,
    /// Contact points; empty for triggers and exits
    pub points: Vec<ContactPoint>,
    /// Other body's velocity minus this body's velocity
    pub relative_velocity: Vec3,
}

impl ContactEvent {
    /// Deepest point of contact, if any
    pub fn deepest_point(&self) -> Option<&ContactPoint> {
        self.points
            .iter()
            .min_by(|a, b| a.separation.total_cmp(&b.separation))
    }
}

/// Callback registered on a collider
pub type ContactHandler = Box<dyn FnMut(&ContactEvent)>;
