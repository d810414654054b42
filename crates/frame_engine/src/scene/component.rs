//! Components attached to game objects
//!
//! Three kinds exist: user [`Behaviour`]s, and the built-in [`Rigidbody`] and
//! [`Collider`] which carry physics descriptions and, once awoken, the
//! handles of their registered physics counterparts.

use std::fmt;

use crate::foundation::collections::{ActorId, ComponentId, GameObjectId, ShapeId};
use crate::physics::{ColliderDesc, RigidbodyDesc};

use super::behaviour::{Behaviour, Capabilities};

/// Makes its game object a simulated body
#[derive(Debug, Clone)]
pub struct Rigidbody {
    desc: RigidbodyDesc,
    pub(crate) actor: Option<ActorId>,
}

impl Rigidbody {
    pub(crate) fn new(desc: RigidbodyDesc) -> Self {
        Self { desc, actor: None }
    }

    /// Authored settings
    pub fn desc(&self) -> &RigidbodyDesc {
        &self.desc
    }

    /// Registered body, `None` before the component awakens
    pub fn actor(&self) -> Option<ActorId> {
        self.actor
    }
}

/// Gives its game object a collision shape
#[derive(Debug, Clone)]
pub struct Collider {
    desc: ColliderDesc,
    pub(crate) shape: Option<ShapeId>,
    pub(crate) attached: Option<ActorId>,
}

impl Collider {
    pub(crate) fn new(desc: ColliderDesc) -> Self {
        Self {
            desc,
            shape: None,
            attached: None,
        }
    }

    /// Authored settings
    pub fn desc(&self) -> &ColliderDesc {
        &self.desc
    }

    /// Registered shape, `None` before the component awakens
    pub fn shape(&self) -> Option<ShapeId> {
        self.shape
    }

    /// Body the shape moves with; `None` for static colliders
    pub fn attached_actor(&self) -> Option<ActorId> {
        self.attached
    }
}

pub(crate) enum ComponentKind {
    // None while the behaviour is running one of its own hooks
    Behaviour {
        instance: Option<Box<dyn Behaviour>>,
        capabilities: Capabilities,
    },
    Rigidbody(Rigidbody),
    Collider(Collider),
}

/// A component slot in the scene
pub struct Component {
    id: ComponentId,
    owner: GameObjectId,
    enabled: bool,
    pending_destroy: bool,
    pub(crate) awoken: bool,
    pub(crate) started: bool,
    pub(crate) kind: ComponentKind,
}

impl Component {
    pub(crate) fn new(id: ComponentId, owner: GameObjectId, kind: ComponentKind) -> Self {
        Self {
            id,
            owner,
            enabled: true,
            pending_destroy: false,
            awoken: false,
            started: false,
            kind,
        }
    }

    /// Handle of this component
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Object the component belongs to
    pub fn owner(&self) -> GameObjectId {
        self.owner
    }

    /// Disabled behaviours skip start and the update phases; disabled
    /// rigidbodies and colliders are out of the simulation
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// True once queued by `Scene::destroy_component`
    pub fn is_pending_destroy(&self) -> bool {
        self.pending_destroy
    }

    /// True once `awake` ran (or the physics registration happened)
    pub fn is_awake(&self) -> bool {
        self.awoken
    }

    /// True once `start` ran
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Hooks implemented; empty for built-in components
    pub fn capabilities(&self) -> Capabilities {
        match &self.kind {
            ComponentKind::Behaviour { capabilities, .. } => *capabilities,
            _ => Capabilities::empty(),
        }
    }

    /// True for user behaviours
    pub fn is_behaviour(&self) -> bool {
        matches!(self.kind, ComponentKind::Behaviour { .. })
    }

    /// The rigidbody, if this component is one
    pub fn as_rigidbody(&self) -> Option<&Rigidbody> {
        match &self.kind {
            ComponentKind::Rigidbody(rigidbody) => Some(rigidbody),
            _ => None,
        }
    }

    /// The collider, if this component is one
    pub fn as_collider(&self) -> Option<&Collider> {
        match &self.kind {
            ComponentKind::Collider(collider) => Some(collider),
            _ => None,
        }
    }

    /// The behaviour as its concrete type
    ///
    /// Returns `None` for other types, and while the behaviour is executing
    /// one of its own hooks.
    pub fn behaviour<T: Behaviour>(&self) -> Option<&T> {
        match &self.kind {
            ComponentKind::Behaviour {
                instance: Some(instance),
                ..
            } => (**instance).as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Mutable access to the behaviour as its concrete type
    pub fn behaviour_mut<T: Behaviour>(&mut self) -> Option<&mut T> {
        match &mut self.kind {
            ComponentKind::Behaviour {
                instance: Some(instance),
                ..
            } => (**instance).as_any_mut().downcast_mut::<T>(),
            _ => None,
        }
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn mark_pending_destroy(&mut self) {
        self.pending_destroy = true;
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            ComponentKind::Behaviour { .. } => "Behaviour",
            ComponentKind::Rigidbody(_) => "Rigidbody",
            ComponentKind::Collider(_) => "Collider",
        };
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("kind", &kind)
            .field("enabled", &self.enabled)
            .field("pending_destroy", &self.pending_destroy)
            .field("awoken", &self.awoken)
            .field("started", &self.started)
            .finish()
    }
}
