//! Transform hierarchy node
//!
//! A [`Transform`] stores the local position, rotation and scale of one game
//! object together with its parent and child handles. The world transform is
//! derived by composing the chain up to the root and cached until the node or
//! one of its ancestors changes; the [`Scene`](super::Scene) owns the
//! hierarchy operations that need to see more than one node.

use std::cell::Cell;

use crate::foundation::collections::GameObjectId;
use crate::foundation::math::{Quat, Trs, Vec3};

/// Local placement of a game object in its parent's space
#[derive(Debug, Clone)]
pub struct Transform {
    local: Trs,
    parent: Option<GameObjectId>,
    children: Vec<GameObjectId>,
    // None means stale; a stale node never has a cached descendant
    world: Cell<Option<Trs>>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Trs::identity())
    }
}

impl Transform {
    /// Root transform with the given local placement
    pub fn new(local: Trs) -> Self {
        Self {
            local,
            parent: None,
            children: Vec::new(),
            world: Cell::new(None),
        }
    }

    /// Local translation, rotation and scale
    pub fn local(&self) -> &Trs {
        &self.local
    }

    /// Position relative to the parent
    pub fn local_position(&self) -> Vec3 {
        self.local.position
    }

    /// Rotation relative to the parent
    pub fn local_rotation(&self) -> Quat {
        self.local.rotation
    }

    /// Scale relative to the parent
    pub fn local_scale(&self) -> Vec3 {
        self.local.scale
    }

    /// Parent object, `None` for roots
    pub fn parent(&self) -> Option<GameObjectId> {
        self.parent
    }

    /// Direct children in attachment order
    pub fn children(&self) -> &[GameObjectId] {
        &self.children
    }

    pub(crate) fn set_local(&mut self, local: Trs) {
        self.local = local;
    }

    pub(crate) fn set_parent_link(&mut self, parent: Option<GameObjectId>) {
        self.parent = parent;
    }

    pub(crate) fn push_child(&mut self, child: GameObjectId) {
        self.children.push(child);
    }

    /// Remove `child` from the child list; false if it was not there
    pub(crate) fn remove_child(&mut self, child: GameObjectId) -> bool {
        let before = self.children.len();
        self.children.retain(|c| *c != child);
        self.children.len() != before
    }

    pub(crate) fn cached_world(&self) -> Option<Trs> {
        self.world.get()
    }

    pub(crate) fn cache_world(&self, world: Trs) {
        self.world.set(Some(world));
    }

    /// Drop the cached world transform; returns false if it was already stale
    pub(crate) fn invalidate(&self) -> bool {
        self.world.take().is_some()
    }
}

/// Unit vectors of a world rotation
pub mod axes {
    use super::{Quat, Vec3};

    /// Local +Z in world space
    pub fn forward(rotation: &Quat) -> Vec3 {
        rotation * Vec3::z()
    }

    /// Local +X in world space
    pub fn right(rotation: &Quat) -> Vec3 {
        rotation * Vec3::x()
    }

    /// Local +Y in world space
    pub fn up(rotation: &Quat) -> Vec3 {
        rotation * Vec3::y()
    }
}
