//! Registered collider state

use std::fmt;

use crate::foundation::collections::{ActorId, GameObjectId, ShapeId};
use crate::foundation::math::Vec3;

use super::collider::ColliderDesc;
use super::collision::WorldShape;
use super::events::{ContactEvent, ContactHandler};

/// A collider admitted to the simulation
///
/// Carries its world-space shape as of the last completed step plus the
/// collide and trigger handlers registered on it.
pub struct PhysicsShape {
    id: ShapeId,
    owner: GameObjectId,
    desc: ColliderDesc,
    pub(crate) actor: Option<ActorId>,
    pub(crate) world: WorldShape,
    /// World center minus the owning actor's position, fixed for one step
    pub(crate) offset: Vec3,
    collide_handlers: Vec<ContactHandler>,
    trigger_handlers: Vec<ContactHandler>,
}

impl PhysicsShape {
    pub(crate) fn new(
        id: ShapeId,
        owner: GameObjectId,
        desc: ColliderDesc,
        actor: Option<ActorId>,
        world: WorldShape,
    ) -> Self {
        Self {
            id,
            owner,
            desc,
            actor,
            world,
            offset: Vec3::zeros(),
            collide_handlers: Vec::new(),
            trigger_handlers: Vec::new(),
        }
    }

    /// Handle of this shape
    pub fn id(&self) -> ShapeId {
        self.id
    }

    /// Game object carrying the Collider
    pub fn owner(&self) -> GameObjectId {
        self.owner
    }

    /// Authored settings
    pub fn desc(&self) -> &ColliderDesc {
        &self.desc
    }

    /// Body this collider moves with; `None` for static colliders
    pub fn actor(&self) -> Option<ActorId> {
        self.actor
    }

    /// True if this collider only reports overlaps
    pub fn is_trigger(&self) -> bool {
        self.desc.is_trigger
    }

    /// World-space shape as of the last completed step
    pub fn world_shape(&self) -> &WorldShape {
        &self.world
    }

    pub(crate) fn add_collide(&mut self, handler: ContactHandler) {
        self.collide_handlers.push(handler);
    }

    pub(crate) fn add_trigger(&mut self, handler: ContactHandler) {
        self.trigger_handlers.push(handler);
    }

    /// Invoke the handlers matching the event kind
    pub(crate) fn dispatch(&mut self, event: &ContactEvent) {
        let handlers = if event.is_trigger {
            &mut self.trigger_handlers
        } else {
            &mut self.collide_handlers
        };
        for handler in handlers.iter_mut() {
            handler(event);
        }
    }
}

impl fmt::Debug for PhysicsShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicsShape")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("desc", &self.desc)
            .field("actor", &self.actor)
            .field("world", &self.world)
            .field("collide_handlers", &self.collide_handlers.len())
            .field("trigger_handlers", &self.trigger_handlers.len())
            .finish()
    }
}
