//! Game object record

use crate::foundation::collections::{ComponentId, GameObjectId};

use super::transform::Transform;

/// A named node in the scene owning a transform and a list of components
#[derive(Debug)]
pub struct GameObject {
    id: GameObjectId,
    name: String,
    active: bool,
    pending_destroy: bool,
    pub(crate) transform: Transform,
    pub(crate) components: Vec<ComponentId>,
}

impl GameObject {
    pub(crate) fn new(id: GameObjectId, name: String, transform: Transform) -> Self {
        Self {
            id,
            name,
            active: true,
            pending_destroy: false,
            transform,
            components: Vec::new(),
        }
    }

    /// Handle of this object
    pub fn id(&self) -> GameObjectId {
        self.id
    }

    /// Display name, not necessarily unique
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local active flag; see `Scene::is_active_in_hierarchy` for the effective state
    pub fn is_active_self(&self) -> bool {
        self.active
    }

    /// True once `Scene::destroy` queued this object or an ancestor
    pub fn is_pending_destroy(&self) -> bool {
        self.pending_destroy
    }

    /// Placement in the hierarchy
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Components in the order they were added
    pub fn components(&self) -> &[ComponentId] {
        &self.components
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub(crate) fn mark_pending_destroy(&mut self) {
        self.pending_destroy = true;
    }
}
