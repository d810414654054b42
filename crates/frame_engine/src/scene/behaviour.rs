//! Scripted behaviours
//!
//! A [`Behaviour`] is user code attached to a game object. It declares the
//! hooks it implements through [`Capabilities`]; the player loop only visits
//! a behaviour in phases its set contains. Every hook receives a
//! [`BehaviourContext`] giving mutable access to the scene and the physics
//! manager, and returns a `Result` so a failure stays local to the component.

use std::any::Any;

use bitflags::bitflags;
use thiserror::Error;

use crate::foundation::collections::{ActorId, ComponentId, GameObjectId};
use crate::foundation::math::Vec3;
use crate::foundation::time::Time;
use crate::physics::{ContactEvent, Physics, PhysicsError};

use super::error::SceneError;
use super::Scene;

bitflags! {
    /// Hooks a behaviour implements
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u16 {
        /// `awake`, once when the component is first activated
        const AWAKE = 1 << 0;
        /// `start`, once before the first update
        const START = 1 << 1;
        /// `fixed_update`, once per physics step
        const FIXED_UPDATE = 1 << 2;
        /// `update`, once per frame
        const UPDATE = 1 << 3;
        /// `late_update`, once per frame after every `update`
        const LATE_UPDATE = 1 << 4;
        /// `on_destroy`, when the owning object is removed
        const ON_DESTROY = 1 << 5;
        /// `on_trigger_enter`, `on_trigger_stay` and `on_trigger_exit`
        const TRIGGER = 1 << 6;
        /// `on_collision_enter`, `on_collision_stay` and `on_collision_exit`
        const COLLISION = 1 << 7;
    }
}

/// Failure reported by a behaviour hook
#[derive(Error, Debug)]
pub enum BehaviourError {
    /// Free-form failure
    #[error("{0}")]
    Failed(String),

    /// A component the behaviour depends on is absent
    #[error("Missing component: {0}")]
    MissingComponent(&'static str),

    /// A scene operation failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// A physics operation failed
    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),
}

/// Result type of every behaviour hook
pub type BehaviourResult = Result<(), BehaviourError>;

/// Access to the concrete type behind a `dyn Behaviour`
pub trait AsAny: Any {
    /// Borrow as `Any`
    fn as_any(&self) -> &dyn Any;
    /// Mutably borrow as `Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Everything a hook may touch while it runs
pub struct BehaviourContext<'a> {
    /// Object owning the behaviour
    pub object: GameObjectId,
    /// The behaviour's own component
    pub component: ComponentId,
    /// Active scene
    pub scene: &'a mut Scene,
    /// Physics manager
    pub physics: &'a mut Physics,
    /// Frame clock; `delta_time` is the fixed step inside `fixed_update`
    pub time: &'a Time,
}

impl BehaviourContext<'_> {
    /// World position of the owning object
    pub fn position(&self) -> Vec3 {
        self.scene
            .world_transform(self.object)
            .map_or_else(Vec3::zeros, |trs| trs.position)
    }

    /// Simulated body of the owning object, once its rigidbody has awoken
    pub fn actor(&self) -> Option<ActorId> {
        self.scene.rigidbody_actor(self.object)
    }

    /// Queue the owning object for destruction at the end of the frame
    pub fn destroy_self(&mut self) -> BehaviourResult {
        self.scene.destroy(self.object)?;
        Ok(())
    }
}

/// User script attached to a game object
///
/// Every hook defaults to doing nothing. Implementors override the hooks
/// they need and report them from [`capabilities`](Behaviour::capabilities).
pub trait Behaviour: AsAny {
    /// Hooks this behaviour implements
    fn capabilities(&self) -> Capabilities;

    /// Called once when the component is first activated
    fn awake(&mut self, _ctx: &mut BehaviourContext<'_>) -> BehaviourResult {
        Ok(())
    }

    /// Called once before the component's first update
    fn start(&mut self, _ctx: &mut BehaviourContext<'_>) -> BehaviourResult {
        Ok(())
    }

    /// Called before every physics step
    fn fixed_update(&mut self, _ctx: &mut BehaviourContext<'_>) -> BehaviourResult {
        Ok(())
    }

    /// Called once per frame
    fn update(&mut self, _ctx: &mut BehaviourContext<'_>) -> BehaviourResult {
        Ok(())
    }

    /// Called once per frame after every update
    fn late_update(&mut self, _ctx: &mut BehaviourContext<'_>) -> BehaviourResult {
        Ok(())
    }

    /// Called when the owning object is destroyed
    fn on_destroy(&mut self, _ctx: &mut BehaviourContext<'_>) -> BehaviourResult {
        Ok(())
    }

    /// A collider on this object started overlapping a trigger, or vice versa
    fn on_trigger_enter(&mut self, _ctx: &mut BehaviourContext<'_>, _event: &ContactEvent) -> BehaviourResult {
        Ok(())
    }

    /// A trigger overlap persisted through another step
    fn on_trigger_stay(&mut self, _ctx: &mut BehaviourContext<'_>, _event: &ContactEvent) -> BehaviourResult {
        Ok(())
    }

    /// A trigger overlap ended
    fn on_trigger_exit(&mut self, _ctx: &mut BehaviourContext<'_>, _event: &ContactEvent) -> BehaviourResult {
        Ok(())
    }

    /// A collider on this object started touching another
    fn on_collision_enter(&mut self, _ctx: &mut BehaviourContext<'_>, _event: &ContactEvent) -> BehaviourResult {
        Ok(())
    }

    /// A contact persisted through another step
    fn on_collision_stay(&mut self, _ctx: &mut BehaviourContext<'_>, _event: &ContactEvent) -> BehaviourResult {
        Ok(())
    }

    /// A contact ended
    fn on_collision_exit(&mut self, _ctx: &mut BehaviourContext<'_>, _event: &ContactEvent) -> BehaviourResult {
        Ok(())
    }
}

/// A single hook invocation
#[derive(Debug, Clone, Copy)]
pub(crate) enum Hook<'e> {
    Awake,
    Start,
    FixedUpdate,
    Update,
    LateUpdate,
    OnDestroy,
    Contact(&'e ContactEvent),
}

impl Hook<'_> {
    pub(crate) fn capability(self) -> Capabilities {
        match self {
            Self::Awake => Capabilities::AWAKE,
            Self::Start => Capabilities::START,
            Self::FixedUpdate => Capabilities::FIXED_UPDATE,
            Self::Update => Capabilities::UPDATE,
            Self::LateUpdate => Capabilities::LATE_UPDATE,
            Self::OnDestroy => Capabilities::ON_DESTROY,
            Self::Contact(event) if event.is_trigger => Capabilities::TRIGGER,
            Self::Contact(_) => Capabilities::COLLISION,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Awake => "awake",
            Self::Start => "start",
            Self::FixedUpdate => "fixed_update",
            Self::Update => "update",
            Self::LateUpdate => "late_update",
            Self::OnDestroy => "on_destroy",
            Self::Contact(event) if event.is_trigger => "on_trigger",
            Self::Contact(_) => "on_collision",
        }
    }

    fn call(self, behaviour: &mut dyn Behaviour, ctx: &mut BehaviourContext<'_>) -> BehaviourResult {
        use crate::physics::ContactPhase::{Enter, Exit, Stay};

        match self {
            Self::Awake => behaviour.awake(ctx),
            Self::Start => behaviour.start(ctx),
            Self::FixedUpdate => behaviour.fixed_update(ctx),
            Self::Update => behaviour.update(ctx),
            Self::LateUpdate => behaviour.late_update(ctx),
            Self::OnDestroy => behaviour.on_destroy(ctx),
            Self::Contact(event) => match (event.is_trigger, event.phase) {
                (true, Enter) => behaviour.on_trigger_enter(ctx, event),
                (true, Stay) => behaviour.on_trigger_stay(ctx, event),
                (true, Exit) => behaviour.on_trigger_exit(ctx, event),
                (false, Enter) => behaviour.on_collision_enter(ctx, event),
                (false, Stay) => behaviour.on_collision_stay(ctx, event),
                (false, Exit) => behaviour.on_collision_exit(ctx, event),
            },
        }
    }
}

/// Run `hook` on the behaviour stored in `component`
///
/// The behaviour is taken out of the scene for the duration of the call, so
/// it may freely mutate the scene, including adding components and queueing
/// destruction. Returns `Ok` without calling anything when the component is
/// not a behaviour or lacks the capability.
pub(crate) fn invoke(
    scene: &mut Scene,
    physics: &mut Physics,
    time: &Time,
    component: ComponentId,
    hook: Hook<'_>,
) -> BehaviourResult {
    let Some(object) = scene.component(component).map(super::Component::owner) else {
        return Ok(());
    };
    if !scene.component_capabilities(component).contains(hook.capability()) {
        return Ok(());
    }
    let Some(mut behaviour) = scene.take_behaviour(component) else {
        return Ok(());
    };

    let mut ctx = BehaviourContext {
        object,
        component,
        scene: &mut *scene,
        physics: &mut *physics,
        time,
    };
    let result = hook.call(behaviour.as_mut(), &mut ctx);
    scene.restore_behaviour(component, behaviour);
    result
}
