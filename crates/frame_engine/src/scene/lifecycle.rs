//! Deferred destruction
//!
//! The single safe point at which game objects and components leave a
//! scene. Everything queued first receives `on_destroy`, then physics
//! entries are unregistered and the arenas are pruned.

use crate::foundation::time::Time;
use crate::physics::Physics;

use super::behaviour::{self, Hook};
use super::error::SceneError;
use super::Scene;

/// Upper bound on drain passes when `on_destroy` keeps queueing more objects
const MAX_DESTROY_PASSES: usize = 16;

/// Outcome of draining the destroy queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DestroyReport {
    /// Objects removed from the scene
    pub destroyed: usize,
    /// Components removed on their own, outside a destroyed object
    pub destroyed_components: usize,
    /// `on_destroy` hooks that returned an error
    pub failures: usize,
}

/// Drain the destroy queue of `scene`
///
/// `on_destroy` runs for every awake component of every doomed object, in
/// hierarchy order, then for individually destroyed components, before
/// anything is removed. Hook failures are logged and
/// counted; a [`SceneError::HierarchyCorrupted`] from the removal itself is
/// returned, since the scene can no longer be trusted.
pub(crate) fn destroy_pending(scene: &mut Scene, physics: &mut Physics, time: &Time) -> Result<DestroyReport, SceneError> {
    let mut report = DestroyReport::default();

    for _ in 0..MAX_DESTROY_PASSES {
        let doomed = scene.take_destroy_set();
        let lone = scene.take_component_destroy_set(&doomed);
        if doomed.is_empty() && lone.is_empty() {
            return Ok(report);
        }

        let mut hooks = Vec::new();
        for object in &doomed {
            if let Some(object) = scene.object(*object) {
                hooks.extend(
                    object
                        .components()
                        .iter()
                        .copied()
                        .filter(|id| scene.component(*id).is_some_and(|c| c.is_awake())),
                );
            }
        }
        hooks.extend(
            lone.iter()
                .copied()
                .filter(|id| scene.component(*id).is_some_and(|c| c.is_awake())),
        );
        for id in hooks {
            if let Err(err) = behaviour::invoke(scene, physics, time, id, Hook::OnDestroy) {
                report.failures += 1;
                log::error!("Component {id:?} failed in {}: {err}", Hook::OnDestroy.name());
            }
        }

        scene.remove_components(physics, &lone)?;
        scene.remove_objects(physics, &doomed)?;
        report.destroyed += doomed.len();
        report.destroyed_components += lone.len();
        log::debug!(
            "Destroyed {} objects and {} components in scene '{}'",
            doomed.len(),
            lone.len(),
            scene.name()
        );
    }

    if scene.pending_destroy_count() > 0 || scene.pending_component_destroy_count() > 0 {
        log::warn!(
            "Destroy queues still hold {} objects and {} components after {MAX_DESTROY_PASSES} passes; deferring to the next frame",
            scene.pending_destroy_count(),
            scene.pending_component_destroy_count()
        );
    }
    Ok(report)
}

/// Destroy every object in `scene`
pub(crate) fn teardown(scene: &mut Scene, physics: &mut Physics, time: &Time) -> Result<DestroyReport, SceneError> {
    scene.destroy_all();
    let report = destroy_pending(scene, physics, time)?;
    if scene.object_count() > 0 {
        // objects spawned by on_destroy during teardown
        scene.destroy_all();
        let rest = destroy_pending(scene, physics, time)?;
        return Ok(DestroyReport {
            destroyed: report.destroyed + rest.destroyed,
            destroyed_components: report.destroyed_components + rest.destroyed_components,
            failures: report.failures + rest.failures,
        });
    }
    Ok(report)
}
