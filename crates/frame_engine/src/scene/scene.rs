//! Scene container
//!
//! A [`Scene`] owns every game object and component in two arenas and keeps
//! the insertion order of components, which is the order the player loop
//! visits them in. Destruction is deferred: [`Scene::destroy`] and
//! [`Scene::destroy_component`] only queue, and the queues are drained once
//! per frame after LateUpdate.
//!
//! Rigidbodies and colliders are in the simulation only while they are
//! enabled and their object is active in the hierarchy.

use std::collections::HashSet;

use crate::foundation::collections::{ActorId, ComponentId, GameObjectId, SlotMap};
use crate::foundation::math::{Pose, Quat, Trs, Vec3};
use crate::physics::{ColliderDesc, Physics, PhysicsError, RigidbodyDesc, TransformAccess};

use super::behaviour::{Behaviour, Capabilities};
use super::component::{Collider, Component, ComponentKind, Rigidbody};
use super::error::SceneError;
use super::game_object::GameObject;
use super::transform::{axes, Transform};

/// A set of game objects simulated together
pub struct Scene {
    name: String,
    objects: SlotMap<GameObjectId, GameObject>,
    components: SlotMap<ComponentId, Component>,
    order: Vec<ComponentId>,
    roots: Vec<GameObjectId>,
    destroy_queue: Vec<GameObjectId>,
    component_destroy_queue: Vec<ComponentId>,
    attachments_dirty: bool,
    enablement_dirty: bool,
}

impl Scene {
    /// Create an empty scene
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: SlotMap::with_key(),
            components: SlotMap::with_key(),
            order: Vec::new(),
            roots: Vec::new(),
            destroy_queue: Vec::new(),
            component_destroy_queue: Vec::new(),
            attachments_dirty: false,
            enablement_dirty: false,
        }
    }

    /// Scene name
    pub fn name(&self) -> &str {
        &self.name
    }

    // ------------------------------------------------------------------
    // Game objects

    /// Create a root object at the origin
    pub fn create_object(&mut self, name: impl Into<String>) -> GameObjectId {
        self.create_object_at(name, Trs::identity())
    }

    /// Create a root object with the given transform
    pub fn create_object_at(&mut self, name: impl Into<String>, trs: Trs) -> GameObjectId {
        let name = name.into();
        let id = self
            .objects
            .insert_with_key(|id| GameObject::new(id, name, Transform::new(trs)));
        self.roots.push(id);
        id
    }

    /// Create an object parented to `parent`, placed at `local` in the parent's space
    pub fn create_child(
        &mut self,
        name: impl Into<String>,
        parent: GameObjectId,
        local: Trs,
    ) -> Result<GameObjectId, SceneError> {
        if !self.objects.contains_key(parent) {
            return Err(SceneError::UnknownObject(parent));
        }
        let id = self.create_object_at(name, local);
        self.set_parent(id, Some(parent), false)?;
        Ok(id)
    }

    /// Look up an object
    pub fn object(&self, id: GameObjectId) -> Option<&GameObject> {
        self.objects.get(id)
    }

    /// True while the object exists, including while it waits for destruction
    pub fn contains(&self, id: GameObjectId) -> bool {
        self.objects.contains_key(id)
    }

    /// Number of live objects
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Every live object, in arena order
    pub fn objects(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.values()
    }

    /// Objects without a parent, in creation order
    pub fn roots(&self) -> &[GameObjectId] {
        &self.roots
    }

    /// First object named `name`, searching depth-first from the roots
    pub fn find(&self, name: &str) -> Option<GameObjectId> {
        let mut stack: Vec<GameObjectId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(object) = self.objects.get(id) else {
                continue;
            };
            if object.name() == name {
                return Some(id);
            }
            stack.extend(object.transform.children().iter().rev());
        }
        None
    }

    /// Rename an object
    pub fn set_name(&mut self, id: GameObjectId, name: impl Into<String>) -> Result<(), SceneError> {
        self.object_mut(id)?.set_name(name.into());
        Ok(())
    }

    /// Activate or deactivate an object
    ///
    /// Inactive objects and their descendants receive no behaviour callbacks,
    /// and their rigidbodies and colliders leave the simulation until the
    /// object is active again.
    pub fn set_active(&mut self, id: GameObjectId, active: bool) -> Result<(), SceneError> {
        self.object_mut(id)?.set_active(active);
        self.enablement_dirty = true;
        Ok(())
    }

    /// True if the object and all of its ancestors are active
    pub fn is_active_in_hierarchy(&self, id: GameObjectId) -> bool {
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            match self.objects.get(node) {
                Some(object) if object.is_active_self() => cursor = object.transform.parent(),
                _ => return false,
            }
        }
        true
    }

    fn object_mut(&mut self, id: GameObjectId) -> Result<&mut GameObject, SceneError> {
        self.objects.get_mut(id).ok_or(SceneError::UnknownObject(id))
    }

    // ------------------------------------------------------------------
    // Transforms

    /// Local transform relative to the parent
    pub fn local_transform(&self, id: GameObjectId) -> Option<Trs> {
        self.objects.get(id).map(|o| *o.transform.local())
    }

    /// World transform, composed from the root down and cached
    pub fn world_transform(&self, id: GameObjectId) -> Option<Trs> {
        let object = self.objects.get(id)?;
        if let Some(world) = object.transform.cached_world() {
            return Some(world);
        }
        let world = match object.transform.parent() {
            Some(parent) => {
                let Some(parent_world) = self.world_transform(parent) else {
                    debug_assert!(false, "object {id:?} has a dangling parent {parent:?}");
                    log::error!("Object {id:?} has a dangling parent {parent:?}");
                    return None;
                };
                parent_world.combine(object.transform.local())
            }
            None => *object.transform.local(),
        };
        object.transform.cache_world(world);
        Some(world)
    }

    /// World position
    pub fn position(&self, id: GameObjectId) -> Option<Vec3> {
        self.world_transform(id).map(|trs| trs.position)
    }

    /// World rotation
    pub fn rotation(&self, id: GameObjectId) -> Option<Quat> {
        self.world_transform(id).map(|trs| trs.rotation)
    }

    /// Local +Z axis in world space
    pub fn forward(&self, id: GameObjectId) -> Option<Vec3> {
        self.rotation(id).map(|r| axes::forward(&r))
    }

    /// Local +X axis in world space
    pub fn right(&self, id: GameObjectId) -> Option<Vec3> {
        self.rotation(id).map(|r| axes::right(&r))
    }

    /// Local +Y axis in world space
    pub fn up(&self, id: GameObjectId) -> Option<Vec3> {
        self.rotation(id).map(|r| axes::up(&r))
    }

    /// Map a point from the object's local space to world space
    pub fn transform_point(&self, id: GameObjectId, point: &Vec3) -> Option<Vec3> {
        self.world_transform(id).map(|trs| trs.transform_point(point))
    }

    /// Rotate a direction from local to world space; scale is ignored
    pub fn transform_direction(&self, id: GameObjectId, direction: &Vec3) -> Option<Vec3> {
        self.rotation(id).map(|r| r * direction)
    }

    /// Map a world-space point into the object's local space
    pub fn inverse_transform_point(&self, id: GameObjectId, point: &Vec3) -> Option<Vec3> {
        self.world_transform(id).map(|trs| trs.inverse_transform_point(point))
    }

    /// Replace the local transform
    pub fn set_local_transform(&mut self, id: GameObjectId, local: Trs) -> Result<(), SceneError> {
        self.object_mut(id)?.transform.set_local(local);
        self.invalidate_subtree(id);
        Ok(())
    }

    /// Set the position relative to the parent
    pub fn set_local_position(&mut self, id: GameObjectId, position: Vec3) -> Result<(), SceneError> {
        self.update_local(id, |local| local.position = position)
    }

    /// Set the rotation relative to the parent
    pub fn set_local_rotation(&mut self, id: GameObjectId, rotation: Quat) -> Result<(), SceneError> {
        self.update_local(id, |local| local.rotation = rotation)
    }

    /// Set the scale relative to the parent
    pub fn set_local_scale(&mut self, id: GameObjectId, scale: Vec3) -> Result<(), SceneError> {
        self.update_local(id, |local| local.scale = scale)
    }

    /// Move the object so its world position becomes `position`
    pub fn set_position(&mut self, id: GameObjectId, position: Vec3) -> Result<(), SceneError> {
        self.set_world(id, Some(position), None)
    }

    /// Turn the object so its world rotation becomes `rotation`
    pub fn set_rotation(&mut self, id: GameObjectId, rotation: Quat) -> Result<(), SceneError> {
        self.set_world(id, None, Some(rotation))
    }

    /// Reparent `child` under `parent`, or make it a root with `None`
    ///
    /// With `world_position_stays` the object keeps its world placement and
    /// its local transform is recomputed; otherwise the local transform is
    /// kept and the object moves with its new parent. Fails with
    /// [`SceneError::HierarchyCycle`] if `parent` is `child` or one of its
    /// descendants.
    pub fn set_parent(
        &mut self,
        child: GameObjectId,
        parent: Option<GameObjectId>,
        world_position_stays: bool,
    ) -> Result<(), SceneError> {
        let old_parent = self
            .objects
            .get(child)
            .ok_or(SceneError::UnknownObject(child))?
            .transform
            .parent();
        if let Some(parent) = parent {
            if !self.objects.contains_key(parent) {
                return Err(SceneError::UnknownObject(parent));
            }
            let mut cursor = Some(parent);
            while let Some(node) = cursor {
                if node == child {
                    return Err(SceneError::HierarchyCycle { child, parent });
                }
                cursor = self.objects.get(node).and_then(|o| o.transform.parent());
            }
        }
        if old_parent == parent {
            return Ok(());
        }

        let world = if world_position_stays {
            self.world_transform(child)
        } else {
            None
        };

        match old_parent {
            Some(old) => {
                let unlinked = self
                    .objects
                    .get_mut(old)
                    .is_some_and(|o| o.transform.remove_child(child));
                if !unlinked {
                    return Err(SceneError::HierarchyCorrupted(format!(
                        "{child:?} is not listed under its parent {old:?}"
                    )));
                }
            }
            None => self.roots.retain(|r| *r != child),
        }
        match parent {
            Some(parent) => self.object_mut(parent)?.transform.push_child(child),
            None => self.roots.push(child),
        }
        self.object_mut(child)?.transform.set_parent_link(parent);
        self.invalidate_subtree(child);

        if let Some(world) = world {
            let local = match parent.and_then(|p| self.world_transform(p)) {
                Some(parent_world) => world.relative_to(&parent_world),
                None => world,
            };
            self.object_mut(child)?.transform.set_local(local);
            self.invalidate_subtree(child);
        }

        // colliders may now belong to a different rigidbody, and the new
        // parent may be inactive
        self.attachments_dirty = true;
        self.enablement_dirty = true;
        Ok(())
    }

    fn update_local<F: FnOnce(&mut Trs)>(&mut self, id: GameObjectId, edit: F) -> Result<(), SceneError> {
        let transform = &mut self.object_mut(id)?.transform;
        let mut local = *transform.local();
        edit(&mut local);
        transform.set_local(local);
        self.invalidate_subtree(id);
        Ok(())
    }

    fn set_world(&mut self, id: GameObjectId, position: Option<Vec3>, rotation: Option<Quat>) -> Result<(), SceneError> {
        let parent = self
            .objects
            .get(id)
            .ok_or(SceneError::UnknownObject(id))?
            .transform
            .parent();
        let parent_world = match parent {
            Some(parent) => Some(self.world_transform(parent).ok_or_else(|| {
                SceneError::HierarchyCorrupted(format!("{id:?} has a dangling parent {parent:?}"))
            })?),
            None => None,
        };

        self.update_local(id, |local| {
            if let Some(position) = position {
                local.position = parent_world.map_or(position, |p| p.inverse_transform_point(&position));
            }
            if let Some(rotation) = rotation {
                local.rotation = parent_world.map_or(rotation, |p| p.rotation.inverse() * rotation);
            }
        })
    }

    fn invalidate_subtree(&self, id: GameObjectId) {
        let mut stack = vec![id];
        let mut first = true;
        while let Some(node) = stack.pop() {
            let Some(object) = self.objects.get(node) else {
                continue;
            };
            // a stale node never has cached descendants
            if object.transform.invalidate() || first {
                stack.extend_from_slice(object.transform.children());
            }
            first = false;
        }
    }

    // ------------------------------------------------------------------
    // Components

    /// Attach a behaviour; it awakens at the start of the next frame
    pub fn add_behaviour<B: Behaviour>(&mut self, object: GameObjectId, behaviour: B) -> Result<ComponentId, SceneError> {
        let capabilities = behaviour.capabilities();
        self.insert_component(
            object,
            ComponentKind::Behaviour {
                instance: Some(Box::new(behaviour)),
                capabilities,
            },
        )
    }

    /// Attach a rigidbody; the description is validated now, the body is
    /// registered with physics when the component awakens
    pub fn add_rigidbody(&mut self, object: GameObjectId, desc: RigidbodyDesc) -> Result<ComponentId, SceneError> {
        if let Err(err) = desc.validate() {
            log::warn!("Rejected rigidbody on {object:?}: {err}");
            return Err(err.into());
        }
        if self.find_rigidbody(object).is_some() {
            return Err(SceneError::DuplicateRigidbody(object));
        }
        self.insert_component(object, ComponentKind::Rigidbody(Rigidbody::new(desc)))
    }

    /// Attach a collider; the description is validated now, the shape is
    /// registered with physics when the component awakens
    pub fn add_collider(&mut self, object: GameObjectId, desc: ColliderDesc) -> Result<ComponentId, SceneError> {
        if let Err(err) = desc.validate() {
            log::warn!("Rejected collider on {object:?}: {err}");
            return Err(err.into());
        }
        self.insert_component(object, ComponentKind::Collider(Collider::new(desc)))
    }

    fn insert_component(&mut self, object: GameObjectId, kind: ComponentKind) -> Result<ComponentId, SceneError> {
        if !self.objects.contains_key(object) {
            return Err(SceneError::UnknownObject(object));
        }
        let id = self
            .components
            .insert_with_key(|id| Component::new(id, object, kind));
        self.object_mut(object)?.components.push(id);
        self.order.push(id);
        Ok(id)
    }

    /// Look up a component
    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id)
    }

    /// Number of live components
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Enable or disable a component
    ///
    /// A disabled rigidbody or collider is unregistered from physics before
    /// the next step and registered again once re-enabled.
    pub fn set_component_enabled(&mut self, id: ComponentId, enabled: bool) -> Result<(), SceneError> {
        let component = self.components.get_mut(id).ok_or(SceneError::UnknownComponent(id))?;
        component.set_enabled(enabled);
        if !component.is_behaviour() {
            self.enablement_dirty = true;
        }
        Ok(())
    }

    /// First behaviour of type `T` on `object`
    pub fn get_component<T: Behaviour>(&self, object: GameObjectId) -> Option<&T> {
        self.objects
            .get(object)?
            .components
            .iter()
            .find_map(|id| self.components.get(*id)?.behaviour::<T>())
    }

    /// Mutable access to the first behaviour of type `T` on `object`
    pub fn get_component_mut<T: Behaviour>(&mut self, object: GameObjectId) -> Option<&mut T> {
        let id = self.objects.get(object)?.components.iter().copied().find(|id| {
            self.components
                .get(*id)
                .is_some_and(|c| c.behaviour::<T>().is_some())
        })?;
        self.components.get_mut(id)?.behaviour_mut::<T>()
    }

    /// Registered body of the rigidbody on `object`, once it has awoken
    pub fn rigidbody_actor(&self, object: GameObjectId) -> Option<ActorId> {
        self.find_rigidbody(object).and_then(|(_, rigidbody)| rigidbody.actor())
    }

    fn find_rigidbody(&self, object: GameObjectId) -> Option<(ComponentId, &Rigidbody)> {
        self.objects.get(object)?.components.iter().find_map(|id| {
            self.components
                .get(*id)?
                .as_rigidbody()
                .map(|rigidbody| (*id, rigidbody))
        })
    }

    /// Nearest registered body on `object` or its ancestors
    fn nearest_actor(&self, object: GameObjectId) -> Option<ActorId> {
        let mut cursor = Some(object);
        while let Some(node) = cursor {
            if let Some(actor) = self.rigidbody_actor(node) {
                return Some(actor);
            }
            cursor = self.objects.get(node).and_then(|o| o.transform.parent());
        }
        None
    }

    // ------------------------------------------------------------------
    // Player loop support

    /// Components in insertion order
    pub(crate) fn component_order(&self) -> &[ComponentId] {
        &self.order
    }

    pub(crate) fn component_capabilities(&self, id: ComponentId) -> Capabilities {
        self.components
            .get(id)
            .map_or_else(Capabilities::empty, Component::capabilities)
    }

    /// Components that have not awoken yet and whose object is active
    pub(crate) fn pending_awake(&self) -> Vec<ComponentId> {
        self.order
            .iter()
            .copied()
            .filter(|id| {
                self.components.get(*id).is_some_and(|c| {
                    !c.awoken
                        && !c.is_pending_destroy()
                        && self.is_active_in_hierarchy(c.owner())
                        && !self.objects.get(c.owner()).is_some_and(GameObject::is_pending_destroy)
                })
            })
            .collect()
    }

    /// True if `id` is an enabled, awake behaviour on an active object
    pub(crate) fn is_runnable(&self, id: ComponentId) -> bool {
        self.components.get(id).is_some_and(|c| {
            c.is_behaviour()
                && c.awoken
                && c.is_enabled()
                && !c.is_pending_destroy()
                && self.is_active_in_hierarchy(c.owner())
        })
    }

    /// Behaviours on `object` that can receive contact callbacks
    pub(crate) fn contact_receivers(&self, object: GameObjectId) -> Vec<ComponentId> {
        let Some(object) = self.objects.get(object) else {
            return Vec::new();
        };
        object
            .components
            .iter()
            .copied()
            .filter(|id| {
                self.components.get(*id).is_some_and(|c| {
                    c.awoken
                        && !c.is_pending_destroy()
                        && c.capabilities().intersects(Capabilities::TRIGGER | Capabilities::COLLISION)
                })
            })
            .collect()
    }

    pub(crate) fn mark_awoken(&mut self, id: ComponentId) {
        if let Some(component) = self.components.get_mut(id) {
            component.awoken = true;
        }
    }

    /// Flag a behaviour as started; false if it already was
    pub(crate) fn mark_started(&mut self, id: ComponentId) -> bool {
        match self.components.get_mut(id) {
            Some(component) if !component.started => {
                component.started = true;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn is_started(&self, id: ComponentId) -> bool {
        self.components.get(id).is_some_and(Component::is_started)
    }

    pub(crate) fn take_behaviour(&mut self, id: ComponentId) -> Option<Box<dyn Behaviour>> {
        match &mut self.components.get_mut(id)?.kind {
            ComponentKind::Behaviour { instance, .. } => instance.take(),
            _ => None,
        }
    }

    pub(crate) fn restore_behaviour(&mut self, id: ComponentId, behaviour: Box<dyn Behaviour>) {
        if let Some(ComponentKind::Behaviour { instance, .. }) = self.components.get_mut(id).map(|c| &mut c.kind) {
            *instance = Some(behaviour);
        }
    }

    // ------------------------------------------------------------------
    // Physics registration

    /// Register an awakening rigidbody or collider with `physics`
    ///
    /// Does nothing for behaviours. The component is marked awake even when
    /// registration fails, so a rejected description is reported once. A
    /// disabled component awakens without registering.
    pub(crate) fn register_physics(&mut self, physics: &mut Physics, id: ComponentId) -> Result<(), SceneError> {
        let component = self.components.get(id).ok_or(SceneError::UnknownComponent(id))?;
        let owner = component.owner();
        if !component.is_behaviour() && !self.simulates(component) {
            self.mark_awoken(id);
            return Ok(());
        }
        let world = self.world_transform(owner).ok_or(SceneError::UnknownObject(owner))?;

        let registered = match &component.kind {
            ComponentKind::Rigidbody(rigidbody) => {
                let pose = Pose {
                    position: world.position,
                    rotation: world.rotation,
                };
                physics
                    .register_rigidbody(owner, rigidbody.desc().clone(), pose)
                    .map(|actor| (Some(actor), None))
            }
            ComponentKind::Collider(collider) => {
                let actor = self.nearest_actor(owner);
                physics
                    .register_collider(owner, collider.desc().clone(), actor, &world)
                    .map(|shape| (actor, Some(shape)))
            }
            ComponentKind::Behaviour { .. } => return Ok(()),
        };

        let component = self.components.get_mut(id).ok_or(SceneError::UnknownComponent(id))?;
        component.awoken = true;
        let (actor, shape) = registered?;
        match &mut component.kind {
            ComponentKind::Rigidbody(rigidbody) => {
                rigidbody.actor = actor;
                // colliders below may have registered as static before this body
                self.attachments_dirty = true;
            }
            ComponentKind::Collider(collider) => {
                collider.shape = shape;
                collider.attached = actor;
            }
            ComponentKind::Behaviour { .. } => {}
        }
        Ok(())
    }

    fn simulates(&self, component: &Component) -> bool {
        component.is_enabled() && self.is_active_in_hierarchy(component.owner())
    }

    /// Bring physics in line with the scene before a step: enablement
    /// first, then collider attachments
    pub(crate) fn sync_physics(&mut self, physics: &mut Physics) -> Result<(), SceneError> {
        self.sync_enabled_physics(physics)?;
        self.refresh_attachments(physics)?;
        Ok(())
    }

    /// Unregister awake rigidbodies and colliders that were disabled or
    /// deactivated, and register the ones that came back
    fn sync_enabled_physics(&mut self, physics: &mut Physics) -> Result<(), SceneError> {
        if !std::mem::take(&mut self.enablement_dirty) {
            return Ok(());
        }
        let mut leaving = Vec::new();
        let mut joining = Vec::new();
        for id in &self.order {
            let Some(component) = self.components.get(*id) else {
                continue;
            };
            let registered = match &component.kind {
                ComponentKind::Rigidbody(rigidbody) => rigidbody.actor.is_some(),
                ComponentKind::Collider(collider) => collider.shape.is_some(),
                ComponentKind::Behaviour { .. } => continue,
            };
            if !component.awoken || component.is_pending_destroy() {
                continue;
            }
            match (registered, self.simulates(component)) {
                (true, false) => leaving.push(*id),
                (false, true) => joining.push(*id),
                _ => {}
            }
        }

        // colliders leave before their bodies; bodies join before their colliders
        leaving.sort_by_key(|id| self.components.get(*id).is_some_and(|c| c.as_rigidbody().is_some()));
        joining.sort_by_key(|id| self.components.get(*id).is_some_and(|c| c.as_collider().is_some()));
        for id in leaving {
            self.unregister_physics(physics, id)?;
        }
        for id in joining {
            self.register_physics(physics, id)?;
        }
        Ok(())
    }

    /// Remove the physics counterpart of a rigidbody or collider
    ///
    /// Colliders of a removed body turn static until the next attachment
    /// refresh finds them another body.
    fn unregister_physics(&mut self, physics: &mut Physics, id: ComponentId) -> Result<(), SceneError> {
        let component = self.components.get_mut(id).ok_or(SceneError::UnknownComponent(id))?;
        match &mut component.kind {
            ComponentKind::Rigidbody(rigidbody) => {
                if let Some(actor) = rigidbody.actor.take() {
                    physics.remove_actor(actor)?;
                    self.attachments_dirty = true;
                }
            }
            ComponentKind::Collider(collider) => {
                collider.attached = None;
                if let Some(shape) = collider.shape.take() {
                    physics.remove_collider(shape)?;
                }
            }
            ComponentKind::Behaviour { .. } => {}
        }
        Ok(())
    }

    /// Re-attach every registered collider to its nearest rigidbody after
    /// reparenting or a late rigidbody registration
    pub(crate) fn refresh_attachments(&mut self, physics: &mut Physics) -> Result<(), PhysicsError> {
        if !std::mem::take(&mut self.attachments_dirty) {
            return Ok(());
        }
        let changes: Vec<_> = self
            .order
            .iter()
            .filter_map(|id| {
                let component = self.components.get(*id)?;
                let collider = component.as_collider()?;
                let shape = collider.shape()?;
                let nearest = self.nearest_actor(component.owner());
                (nearest != collider.attached_actor()).then_some((*id, shape, nearest))
            })
            .collect();

        for (id, shape, actor) in changes {
            physics.attach_collider(shape, actor)?;
            if let Some(ComponentKind::Collider(collider)) = self.components.get_mut(id).map(|c| &mut c.kind) {
                collider.attached = actor;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Destruction

    /// Queue `id` and its descendants for destruction at the end of the frame
    ///
    /// Queuing an object twice is harmless.
    pub fn destroy(&mut self, id: GameObjectId) -> Result<(), SceneError> {
        let object = self.object_mut(id)?;
        if object.is_pending_destroy() {
            return Ok(());
        }
        for node in self.subtree(id) {
            if let Some(object) = self.objects.get_mut(node) {
                object.mark_pending_destroy();
            }
        }
        self.destroy_queue.push(id);
        Ok(())
    }

    /// Objects waiting in the destroy queue
    pub fn pending_destroy_count(&self) -> usize {
        self.destroy_queue.len()
    }

    /// Queue a single component for destruction at the end of the frame
    ///
    /// The component receives no further callbacks once queued. Destroying a
    /// rigidbody or collider removes its physics counterpart; colliders that
    /// moved with a destroyed rigidbody move on to the next body up the
    /// hierarchy, or turn static.
    pub fn destroy_component(&mut self, id: ComponentId) -> Result<(), SceneError> {
        let component = self.components.get_mut(id).ok_or(SceneError::UnknownComponent(id))?;
        if component.is_pending_destroy() {
            return Ok(());
        }
        component.mark_pending_destroy();
        self.component_destroy_queue.push(id);
        Ok(())
    }

    /// Components waiting in the destroy queue
    pub fn pending_component_destroy_count(&self) -> usize {
        self.component_destroy_queue.len()
    }

    /// Drain the component queue, skipping components whose whole object
    /// is being destroyed anyway
    pub(crate) fn take_component_destroy_set(&mut self, doomed_objects: &[GameObjectId]) -> Vec<ComponentId> {
        let doomed: HashSet<GameObjectId> = doomed_objects.iter().copied().collect();
        std::mem::take(&mut self.component_destroy_queue)
            .into_iter()
            .filter(|id| {
                self.components
                    .get(*id)
                    .is_some_and(|c| !doomed.contains(&c.owner()))
            })
            .collect()
    }

    /// Remove single components, unregistering their physics first
    pub(crate) fn remove_components(&mut self, physics: &mut Physics, ids: &[ComponentId]) -> Result<(), SceneError> {
        let corrupted = |what: String| SceneError::HierarchyCorrupted(what);
        for id in ids {
            self.unregister_physics(physics, *id)
                .map_err(|err| corrupted(format!("component {id:?}: {err}")))?;
            let component = self
                .components
                .remove(*id)
                .ok_or_else(|| corrupted(format!("{id:?} vanished before removal")))?;
            let owner = component.owner();
            let object = self
                .objects
                .get_mut(owner)
                .ok_or_else(|| corrupted(format!("{id:?} belongs to a missing object {owner:?}")))?;
            let before = object.components.len();
            object.components.retain(|c| c != id);
            if object.components.len() == before {
                return Err(corrupted(format!("{id:?} is not listed on its object {owner:?}")));
            }
        }
        let removed: HashSet<ComponentId> = ids.iter().copied().collect();
        self.order.retain(|id| !removed.contains(id));
        self.refresh_attachments(physics)?;
        Ok(())
    }

    /// `id` and all of its descendants, parents before children
    fn subtree(&self, id: GameObjectId) -> Vec<GameObjectId> {
        let mut nodes = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if let Some(object) = self.objects.get(node) {
                nodes.push(node);
                stack.extend(object.transform.children().iter().rev());
            }
        }
        nodes
    }

    /// Drain the queue, expanded to whole subtrees and deduplicated
    pub(crate) fn take_destroy_set(&mut self) -> Vec<GameObjectId> {
        let queue = std::mem::take(&mut self.destroy_queue);
        let mut seen = HashSet::new();
        let mut nodes = Vec::new();
        for root in queue {
            for node in self.subtree(root) {
                if seen.insert(node) {
                    nodes.push(node);
                }
            }
        }
        nodes
    }

    /// Queue every root, tearing down the whole scene at the next drain
    pub(crate) fn destroy_all(&mut self) {
        for root in self.roots.clone() {
            if let Err(err) = self.destroy(root) {
                log::error!("Failed to queue root {root:?} for teardown: {err}");
            }
        }
    }

    /// Remove `nodes` and their components, unregistering physics first
    ///
    /// `nodes` must be closed under descendants. Any disagreement between the
    /// hierarchy links or between components and physics means the scene is
    /// corrupt and is reported as [`SceneError::HierarchyCorrupted`].
    pub(crate) fn remove_objects(&mut self, physics: &mut Physics, nodes: &[GameObjectId]) -> Result<(), SceneError> {
        let doomed: HashSet<GameObjectId> = nodes.iter().copied().collect();
        let corrupted = |what: String| SceneError::HierarchyCorrupted(what);

        // shapes first, so removing a body never turns a dying shape static
        let mut shapes = Vec::new();
        let mut actors = Vec::new();
        let mut components = Vec::new();
        for node in nodes {
            let object = self
                .objects
                .get(*node)
                .ok_or_else(|| corrupted(format!("{node:?} vanished before removal")))?;
            for id in &object.components {
                let component = self
                    .components
                    .get(*id)
                    .ok_or_else(|| corrupted(format!("{node:?} lists a missing component {id:?}")))?;
                match &component.kind {
                    ComponentKind::Collider(collider) => shapes.extend(collider.shape()),
                    ComponentKind::Rigidbody(rigidbody) => actors.extend(rigidbody.actor()),
                    ComponentKind::Behaviour { .. } => {}
                }
                components.push(*id);
            }
        }
        for shape in shapes {
            physics
                .remove_collider(shape)
                .map_err(|err| corrupted(format!("collider {shape:?}: {err}")))?;
        }
        for actor in actors {
            physics
                .remove_actor(actor)
                .map_err(|err| corrupted(format!("rigidbody {actor:?}: {err}")))?;
        }

        let removed: HashSet<ComponentId> = components.iter().copied().collect();
        for id in components {
            self.components.remove(id);
        }
        self.order.retain(|id| !removed.contains(id));

        for node in nodes {
            let parent = self.objects.get(*node).and_then(|o| o.transform.parent());
            match parent {
                Some(parent) if doomed.contains(&parent) => {}
                Some(parent) => {
                    let unlinked = self
                        .objects
                        .get_mut(parent)
                        .is_some_and(|o| o.transform.remove_child(*node));
                    if !unlinked {
                        return Err(corrupted(format!("{node:?} is not listed under its parent {parent:?}")));
                    }
                }
                None => {
                    let before = self.roots.len();
                    self.roots.retain(|r| r != node);
                    if self.roots.len() == before {
                        return Err(corrupted(format!("root {node:?} is missing from the root list")));
                    }
                }
            }
        }
        for node in nodes {
            self.objects.remove(*node);
        }
        self.destroy_queue.retain(|id| !doomed.contains(id));
        self.component_destroy_queue.retain(|id| self.components.contains_key(*id));
        Ok(())
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("name", &self.name)
            .field("objects", &self.objects.len())
            .field("components", &self.components.len())
            .field("pending_destroy", &self.destroy_queue.len())
            .finish()
    }
}

impl TransformAccess for Scene {
    fn world_trs(&self, object: GameObjectId) -> Option<Trs> {
        self.world_transform(object)
    }

    fn set_world_pose(&mut self, object: GameObjectId, pose: &Pose) {
        if let Err(err) = self.set_world(object, Some(pose.position), Some(pose.rotation)) {
            debug_assert!(false, "physics wrote to {object:?}: {err}");
            log::error!("Physics could not move {object:?}: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::behaviour::BehaviourContext;
    use approx::assert_relative_eq;

    struct Marker(u32);

    impl Behaviour for Marker {
        fn capabilities(&self) -> Capabilities {
            Capabilities::empty()
        }
    }

    struct Other;

    impl Behaviour for Other {
        fn capabilities(&self) -> Capabilities {
            Capabilities::UPDATE
        }

        fn update(&mut self, _ctx: &mut BehaviourContext<'_>) -> crate::scene::BehaviourResult {
            Ok(())
        }
    }

    #[test]
    fn test_world_transform_composes_chain() {
        let mut scene = Scene::new("test");
        let root = scene.create_object_at(
            "root",
            Trs {
                position: Vec3::new(1.0, 0.0, 0.0),
                rotation: Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2),
                scale: Vec3::repeat(2.0),
            },
        );
        let child = scene
            .create_child("child", root, Trs::from_position(Vec3::new(0.0, 0.0, 1.0)))
            .unwrap();

        // rotated +Z becomes +X, scaled by 2, offset by the root position
        assert_relative_eq!(scene.position(child).unwrap(), Vec3::new(3.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(scene.forward(child).unwrap(), Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_moving_parent_invalidates_cached_children() {
        let mut scene = Scene::new("test");
        let root = scene.create_object("root");
        let child = scene
            .create_child("child", root, Trs::from_position(Vec3::new(0.0, 1.0, 0.0)))
            .unwrap();
        let grandchild = scene
            .create_child("grandchild", child, Trs::from_position(Vec3::new(0.0, 1.0, 0.0)))
            .unwrap();
        assert_relative_eq!(scene.position(grandchild).unwrap(), Vec3::new(0.0, 2.0, 0.0));

        scene.set_position(root, Vec3::new(5.0, 0.0, 0.0)).unwrap();
        assert_relative_eq!(scene.position(grandchild).unwrap(), Vec3::new(5.0, 2.0, 0.0));
    }

    #[test]
    fn test_set_position_converts_through_parent() {
        let mut scene = Scene::new("test");
        let root = scene.create_object_at(
            "root",
            Trs {
                scale: Vec3::repeat(2.0),
                ..Trs::from_position(Vec3::new(0.0, 10.0, 0.0))
            },
        );
        let child = scene.create_child("child", root, Trs::identity()).unwrap();

        scene.set_position(child, Vec3::new(4.0, 10.0, 0.0)).unwrap();
        assert_relative_eq!(scene.local_transform(child).unwrap().position, Vec3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(scene.position(child).unwrap(), Vec3::new(4.0, 10.0, 0.0));
    }

    #[test]
    fn test_rotation_and_local_edits_follow_the_parent() {
        let mut scene = Scene::new("test");
        let quarter = Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2);
        let root = scene.create_object("root");
        scene.set_rotation(root, quarter).unwrap();
        let child = scene.create_child("child", root, Trs::identity()).unwrap();

        scene.set_local_position(child, Vec3::new(0.0, 0.0, 1.0)).unwrap();
        assert_relative_eq!(scene.position(child).unwrap(), Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(
            scene.transform_direction(child, &Vec3::z()).unwrap(),
            Vec3::new(1.0, 0.0, 0.0),
            epsilon = 1e-5
        );

        // a world rotation on the child is stored relative to the parent
        scene.set_rotation(child, Quat::identity()).unwrap();
        assert_relative_eq!(scene.rotation(child).unwrap(), Quat::identity(), epsilon = 1e-5);
        assert_relative_eq!(scene.local_transform(child).unwrap().rotation, quarter.inverse(), epsilon = 1e-5);

        scene.set_local_scale(root, Vec3::repeat(3.0)).unwrap();
        let point = scene.transform_point(child, &Vec3::x()).unwrap();
        assert_relative_eq!(point, Vec3::new(6.0, 0.0, 0.0), epsilon = 1e-4);
        assert_relative_eq!(scene.inverse_transform_point(child, &point).unwrap(), Vec3::x(), epsilon = 1e-4);
    }

    #[test]
    fn test_set_parent_rejects_cycles() {
        let mut scene = Scene::new("test");
        let a = scene.create_object("a");
        let b = scene.create_child("b", a, Trs::identity()).unwrap();
        let c = scene.create_child("c", b, Trs::identity()).unwrap();

        assert_eq!(
            scene.set_parent(a, Some(c), true),
            Err(SceneError::HierarchyCycle { child: a, parent: c })
        );
        assert_eq!(
            scene.set_parent(a, Some(a), true),
            Err(SceneError::HierarchyCycle { child: a, parent: a })
        );
        assert_eq!(scene.object(a).unwrap().transform().parent(), None);
    }

    #[test]
    fn test_set_parent_keeps_world_position() {
        let mut scene = Scene::new("test");
        let anchor = scene.create_object_at("anchor", Trs::from_position(Vec3::new(0.0, 3.0, 0.0)));
        let object = scene.create_object_at("object", Trs::from_position(Vec3::new(1.0, 1.0, 1.0)));

        scene.set_parent(object, Some(anchor), true).unwrap();
        assert_relative_eq!(scene.position(object).unwrap(), Vec3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(scene.local_transform(object).unwrap().position, Vec3::new(1.0, -2.0, 1.0));
        assert_eq!(scene.roots(), &[anchor]);

        scene.set_parent(object, None, false).unwrap();
        assert_relative_eq!(scene.position(object).unwrap(), Vec3::new(1.0, -2.0, 1.0));
        assert_eq!(scene.roots(), &[anchor, object]);
    }

    #[test]
    fn test_find_searches_depth_first() {
        let mut scene = Scene::new("test");
        let a = scene.create_object("a");
        let target = scene.create_child("target", a, Trs::identity()).unwrap();
        scene.create_object("target");

        assert_eq!(scene.find("target"), Some(target));
        assert_eq!(scene.find("missing"), None);
    }

    #[test]
    fn test_inactive_parent_deactivates_children() {
        let mut scene = Scene::new("test");
        let a = scene.create_object("a");
        let b = scene.create_child("b", a, Trs::identity()).unwrap();

        scene.set_active(a, false).unwrap();
        assert!(!scene.is_active_in_hierarchy(b));
        assert!(scene.object(b).unwrap().is_active_self());
    }

    #[test]
    fn test_get_component_downcasts() {
        let mut scene = Scene::new("test");
        let object = scene.create_object("object");
        scene.add_behaviour(object, Other).unwrap();
        scene.add_behaviour(object, Marker(7)).unwrap();

        assert_eq!(scene.get_component::<Marker>(object).map(|m| m.0), Some(7));
        scene.get_component_mut::<Marker>(object).unwrap().0 = 9;
        assert_eq!(scene.get_component::<Marker>(object).map(|m| m.0), Some(9));
    }

    #[test]
    fn test_invalid_physics_components_are_rejected() {
        let mut scene = Scene::new("test");
        let object = scene.create_object("object");

        assert_eq!(
            scene.add_rigidbody(object, RigidbodyDesc::dynamic(-1.0)),
            Err(SceneError::Physics(PhysicsError::InvalidMass(-1.0)))
        );
        assert!(matches!(
            scene.add_collider(object, ColliderDesc::sphere(0.0)),
            Err(SceneError::Physics(PhysicsError::DegenerateShape(_)))
        ));
        scene.add_rigidbody(object, RigidbodyDesc::default()).unwrap();
        assert_eq!(
            scene.add_rigidbody(object, RigidbodyDesc::default()),
            Err(SceneError::DuplicateRigidbody(object))
        );
        assert_eq!(scene.component_count(), 1);
    }

    #[test]
    fn test_destroy_is_deferred_and_recursive() {
        let mut scene = Scene::new("test");
        let mut physics = Physics::default();
        let a = scene.create_object("a");
        let b = scene.create_child("b", a, Trs::identity()).unwrap();
        let keep = scene.create_object("keep");
        scene.add_behaviour(b, Marker(1)).unwrap();

        scene.destroy(a).unwrap();
        scene.destroy(a).unwrap();
        assert!(scene.contains(b));
        assert!(scene.object(b).unwrap().is_pending_destroy());
        assert_eq!(scene.pending_destroy_count(), 1);

        let doomed = scene.take_destroy_set();
        assert_eq!(doomed, vec![a, b]);
        scene.remove_objects(&mut physics, &doomed).unwrap();
        assert!(!scene.contains(a) && !scene.contains(b));
        assert_eq!(scene.roots(), &[keep]);
        assert_eq!(scene.component_count(), 0);
        assert!(scene.component_order().is_empty());
    }

    #[test]
    fn test_collider_attaches_to_ancestor_body() {
        let mut scene = Scene::new("test");
        let mut physics = Physics::default();
        let body = scene.create_object("body");
        let part = scene
            .create_child("part", body, Trs::from_position(Vec3::new(0.0, 1.0, 0.0)))
            .unwrap();
        let collider = scene.add_collider(part, ColliderDesc::sphere(0.5)).unwrap();
        let rigidbody = scene.add_rigidbody(body, RigidbodyDesc::default()).unwrap();

        // collider registers first as static, then follows the late body
        scene.register_physics(&mut physics, collider).unwrap();
        scene.register_physics(&mut physics, rigidbody).unwrap();
        scene.refresh_attachments(&mut physics).unwrap();

        let actor = scene.rigidbody_actor(body).unwrap();
        let shape = scene.component(collider).unwrap().as_collider().unwrap();
        assert_eq!(shape.attached_actor(), Some(actor));
        assert_eq!(physics.shape(shape.shape().unwrap()).unwrap().actor(), Some(actor));
    }
}
