//! Scene Manager - owner of the active scene
//!
//! Loading a scene tears down the previous one completely: every awake
//! component receives `on_destroy`, then every physics body and shape it
//! registered is removed, so nothing of the old scene survives into the
//! first frame of the new one.

use crate::foundation::time::Time;
use crate::physics::Physics;

use super::error::SceneError;
use super::lifecycle::{self, DestroyReport};
use super::Scene;

/// Holds the active scene
#[derive(Debug, Default)]
pub struct SceneManager {
    active: Option<Scene>,
    loads: u64,
}

impl SceneManager {
    /// Create a manager with no active scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene currently simulated, if any
    pub fn active_scene(&self) -> Option<&Scene> {
        self.active.as_ref()
    }

    /// Mutable access to the active scene
    pub fn active_scene_mut(&mut self) -> Option<&mut Scene> {
        self.active.as_mut()
    }

    /// True if a scene is loaded
    pub fn has_active_scene(&self) -> bool {
        self.active.is_some()
    }

    /// Number of scenes loaded so far
    pub fn load_count(&self) -> u64 {
        self.loads
    }

    /// Make `scene` the active scene, tearing down the previous one
    ///
    /// The new scene's components awaken at the start of the next frame.
    pub fn load_scene(&mut self, scene: Scene, physics: &mut Physics, time: &Time) -> Result<(), SceneError> {
        self.unload_active(physics, time)?;
        log::info!(
            "Loaded scene '{}' ({} objects, {} components)",
            scene.name(),
            scene.object_count(),
            scene.component_count()
        );
        self.active = Some(scene);
        self.loads += 1;
        Ok(())
    }

    /// Tear down and drop the active scene, returning it emptied
    pub fn unload_active(&mut self, physics: &mut Physics, time: &Time) -> Result<Option<Scene>, SceneError> {
        let Some(mut scene) = self.active.take() else {
            return Ok(None);
        };
        let DestroyReport { destroyed, failures, .. } = lifecycle::teardown(&mut scene, physics, time)?;
        log::info!("Unloaded scene '{}' ({destroyed} objects destroyed, {failures} on_destroy failures)", scene.name());
        Ok(Some(scene))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{ColliderDesc, RigidbodyDesc};

    fn populated(name: &str, physics: &mut Physics) -> Scene {
        let mut scene = Scene::new(name);
        let body = scene.create_object("body");
        scene.add_rigidbody(body, RigidbodyDesc::default()).unwrap();
        scene.add_collider(body, ColliderDesc::sphere(0.5)).unwrap();
        for id in scene.pending_awake() {
            scene.register_physics(physics, id).unwrap();
        }
        scene
    }

    #[test]
    fn test_load_replaces_and_tears_down_previous_scene() {
        let mut physics = Physics::default();
        let time = Time::default();
        let mut manager = SceneManager::new();
        assert!(!manager.has_active_scene());

        let first = populated("first", &mut physics);
        manager.load_scene(first, &mut physics, &time).unwrap();
        assert_eq!(physics.actor_count(), 1);

        manager.load_scene(Scene::new("second"), &mut physics, &time).unwrap();
        assert_eq!(manager.active_scene().map(Scene::name), Some("second"));
        assert_eq!(manager.load_count(), 2);
        assert_eq!(physics.actor_count(), 0);
        assert_eq!(physics.shape_count(), 0);
    }

    #[test]
    fn test_unload_without_scene_is_noop() {
        let mut physics = Physics::default();
        let mut manager = SceneManager::new();
        assert!(manager.unload_active(&mut physics, &Time::default()).unwrap().is_none());
    }

    #[test]
    fn test_unload_returns_empty_scene() {
        let mut physics = Physics::default();
        let time = Time::default();
        let mut manager = SceneManager::new();
        let scene = populated("level", &mut physics);
        manager.load_scene(scene, &mut physics, &time).unwrap();

        let unloaded = manager.unload_active(&mut physics, &time).unwrap().unwrap();
        assert_eq!(unloaded.object_count(), 0);
        assert!(manager.active_scene_mut().is_none());
    }
}
