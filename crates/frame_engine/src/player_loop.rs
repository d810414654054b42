//! Player loop - the per-frame scheduler
//!
//! One call to [`PlayerLoop::run_frame`] drives a whole frame:
//!
//! ```text
//! Awake (new components) → Start (new components)
//!     → [FixedUpdate → Physics step → contact callbacks]*
//!     → Update → LateUpdate → destroy queue → Render hook
//! ```
//!
//! Variable frame time is turned into fixed physics steps through an
//! accumulator. At most `max_fixed_steps_per_frame` steps run per frame;
//! whole steps beyond the cap are dropped so a slow frame cannot snowball.
//!
//! Within a phase, components run in insertion order over a snapshot taken
//! when the phase begins, so components added mid-phase wait for the next
//! phase. A failing hook is logged and counted and never stops the phase.

use crate::core::config::TimeConfig;
use crate::foundation::collections::ComponentId;
use crate::foundation::time::Time;
use crate::physics::{ContactEvent, Physics};
use crate::scene::{self, Hook, Scene, SceneError};

/// Counters describing one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    /// Frame number, starting at 1
    pub frame: u64,
    /// Fixed steps run this frame
    pub fixed_steps: u32,
    /// Simulation time discarded by the catch-up cap, in seconds
    pub dropped_time: f32,
    /// Components that awoke this frame
    pub awakened: usize,
    /// Behaviours that started this frame
    pub started: usize,
    /// Hooks that returned an error, plus rejected physics registrations
    pub callback_failures: usize,
    /// Objects removed at the end of the frame
    pub destroyed_objects: usize,
    /// Components destroyed on their own at the end of the frame
    pub destroyed_components: usize,
    /// Contact events dispatched to behaviours
    pub contact_callbacks: usize,
}

/// Frame scheduler owning the simulation clock
#[derive(Debug, Clone)]
pub struct PlayerLoop {
    time: Time,
    accumulator: f32,
    max_fixed_steps: u32,
    max_frame_delta: f32,
    last_stats: FrameStats,
}

impl Default for PlayerLoop {
    fn default() -> Self {
        Self::new(&TimeConfig::default(), 0.25)
    }
}

impl PlayerLoop {
    /// Create a scheduler from time settings
    pub fn new(config: &TimeConfig, max_frame_delta: f32) -> Self {
        let mut time = Time::new(config.fixed_delta_time);
        time.set_time_scale(config.time_scale);
        Self {
            time,
            accumulator: 0.0,
            max_fixed_steps: config.max_fixed_steps_per_frame.max(1),
            max_frame_delta,
            last_stats: FrameStats::default(),
        }
    }

    /// Simulation clock
    pub fn time(&self) -> &Time {
        &self.time
    }

    /// Scale applied to subsequent frame deltas
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time.set_time_scale(scale);
    }

    /// Simulation time not yet consumed by fixed steps
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Statistics of the most recent frame
    pub fn last_frame_stats(&self) -> FrameStats {
        self.last_stats
    }

    /// Run one frame of `frame_delta` seconds
    ///
    /// `render` is called last, after the destroy queue has been drained,
    /// with read-only access to the scene. Only destruction bookkeeping
    /// errors are returned; they mean the scene is corrupt.
    pub fn run_frame<R>(
        &mut self,
        scene: &mut Scene,
        physics: &mut Physics,
        frame_delta: f32,
        render: R,
    ) -> Result<FrameStats, SceneError>
    where
        R: FnOnce(&Scene, &Time),
    {
        let delta = if frame_delta.is_finite() {
            frame_delta.clamp(0.0, self.max_frame_delta)
        } else {
            log::warn!("Ignoring non-finite frame delta {frame_delta}");
            0.0
        };
        let scaled = self.time.begin_frame(delta);
        let mut stats = FrameStats {
            frame: self.time.frame_count(),
            ..Default::default()
        };

        self.awake_phase(scene, physics, &mut stats);
        self.start_phase(scene, physics, &mut stats);

        self.accumulator += scaled;
        let fixed = self.time.fixed_delta_time();
        while self.accumulator >= fixed && stats.fixed_steps < self.max_fixed_steps {
            self.time.enter_fixed_step();
            self.run_phase(scene, physics, Hook::FixedUpdate, &mut stats);
            if let Err(err) = scene.sync_physics(physics) {
                stats.callback_failures += 1;
                log::error!("Failed to sync physics components: {err}");
            }
            physics.step(scene, fixed);
            self.dispatch_contacts(scene, physics, &mut stats);
            self.time.exit_fixed_step();
            self.accumulator -= fixed;
            stats.fixed_steps += 1;
        }
        if self.accumulator >= fixed {
            let dropped = (self.accumulator / fixed).floor() * fixed;
            self.accumulator -= dropped;
            stats.dropped_time = dropped;
            log::warn!(
                "Frame {} hit the cap of {} fixed steps; dropped {dropped:.4}s of simulation time",
                stats.frame,
                self.max_fixed_steps
            );
        }

        self.run_phase(scene, physics, Hook::Update, &mut stats);
        self.run_phase(scene, physics, Hook::LateUpdate, &mut stats);

        let report = scene::destroy_pending(scene, physics, &self.time)?;
        stats.destroyed_objects = report.destroyed;
        stats.destroyed_components = report.destroyed_components;
        stats.callback_failures += report.failures;

        render(scene, &self.time);

        log::trace!("Frame {}: {stats:?}", stats.frame);
        self.last_stats = stats;
        Ok(stats)
    }

    /// Register new physics components, then wake new behaviours
    fn awake_phase(&self, scene: &mut Scene, physics: &mut Physics, stats: &mut FrameStats) {
        let pending = scene.pending_awake();
        if pending.is_empty() {
            return;
        }

        // bodies first, so colliders find the rigidbody they belong to
        let (bodies, rest): (Vec<ComponentId>, Vec<ComponentId>) = pending
            .into_iter()
            .partition(|id| scene.component(*id).is_some_and(|c| c.as_rigidbody().is_some()));
        let (behaviours, colliders): (Vec<ComponentId>, Vec<ComponentId>) = rest
            .into_iter()
            .partition(|id| scene.component(*id).is_some_and(|c| c.is_behaviour()));

        for id in bodies.into_iter().chain(colliders) {
            stats.awakened += 1;
            if let Err(err) = scene.register_physics(physics, id) {
                stats.callback_failures += 1;
                log::warn!("Component {id:?} was not admitted to physics: {err}");
            }
        }
        if let Err(err) = scene.sync_physics(physics) {
            stats.callback_failures += 1;
            log::error!("Failed to sync physics components: {err}");
        }

        for id in behaviours {
            // an earlier awake may have deactivated this object
            let active = scene
                .component(id)
                .is_some_and(|c| !c.is_awake() && scene.is_active_in_hierarchy(c.owner()));
            if !active {
                continue;
            }
            scene.mark_awoken(id);
            stats.awakened += 1;
            self.call(scene, physics, id, Hook::Awake, stats);
        }
    }

    fn start_phase(&self, scene: &mut Scene, physics: &mut Physics, stats: &mut FrameStats) {
        let targets: Vec<ComponentId> = scene
            .component_order()
            .iter()
            .copied()
            .filter(|id| scene.is_runnable(*id) && !scene.is_started(*id))
            .collect();

        for id in targets {
            if scene.is_runnable(id) && scene.mark_started(id) {
                stats.started += 1;
                self.call(scene, physics, id, Hook::Start, stats);
            }
        }
    }

    /// Visit every started behaviour implementing `hook`
    fn run_phase(&self, scene: &mut Scene, physics: &mut Physics, hook: Hook<'_>, stats: &mut FrameStats) {
        let capability = hook.capability();
        let targets: Vec<ComponentId> = scene
            .component_order()
            .iter()
            .copied()
            .filter(|id| {
                scene.is_runnable(*id) && scene.is_started(*id) && scene.component_capabilities(*id).contains(capability)
            })
            .collect();

        for id in targets {
            // an earlier hook in this phase may have disabled it
            if scene.is_runnable(id) {
                self.call(scene, physics, id, hook, stats);
            }
        }
    }

    /// Deliver the last step's contact events to behaviours on both sides
    ///
    /// A collider attached to a rigidbody on an ancestor also reports to the
    /// behaviours on the rigidbody's object.
    fn dispatch_contacts(&self, scene: &mut Scene, physics: &mut Physics, stats: &mut FrameStats) {
        let events: Vec<ContactEvent> = physics.events().to_vec();
        for event in &events {
            let mut receivers = scene.contact_receivers(event.object);
            let body_owner = physics
                .shape(event.shape)
                .and_then(|shape| shape.actor())
                .and_then(|actor| physics.actor(actor))
                .map(|actor| actor.owner())
                .filter(|owner| *owner != event.object);
            if let Some(owner) = body_owner {
                receivers.extend(scene.contact_receivers(owner));
            }

            for id in receivers {
                if scene.component_capabilities(id).contains(Hook::Contact(event).capability()) {
                    stats.contact_callbacks += 1;
                    self.call(scene, physics, id, Hook::Contact(event), stats);
                }
            }
        }
    }

    fn call(&self, scene: &mut Scene, physics: &mut Physics, id: ComponentId, hook: Hook<'_>, stats: &mut FrameStats) {
        if let Err(err) = scene::invoke(scene, physics, &self.time, id, hook) {
            stats.callback_failures += 1;
            log::error!("Component {id:?} failed in {}: {err}", hook.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::GameObjectId;
    use crate::scene::{Behaviour, BehaviourContext, BehaviourError, BehaviourResult, Capabilities};
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Journal = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        label: &'static str,
        journal: Journal,
        capabilities: Capabilities,
        fail_update: bool,
    }

    impl Recorder {
        fn new(label: &'static str, journal: &Journal) -> Self {
            Self {
                label,
                journal: Rc::clone(journal),
                capabilities: Capabilities::AWAKE
                    | Capabilities::START
                    | Capabilities::FIXED_UPDATE
                    | Capabilities::UPDATE
                    | Capabilities::LATE_UPDATE,
                fail_update: false,
            }
        }

        fn note(&self, hook: &str) {
            self.journal.borrow_mut().push(format!("{}:{hook}", self.label));
        }
    }

    impl Behaviour for Recorder {
        fn capabilities(&self) -> Capabilities {
            self.capabilities
        }

        fn awake(&mut self, _ctx: &mut BehaviourContext<'_>) -> BehaviourResult {
            self.note("awake");
            Ok(())
        }

        fn start(&mut self, _ctx: &mut BehaviourContext<'_>) -> BehaviourResult {
            self.note("start");
            Ok(())
        }

        fn fixed_update(&mut self, ctx: &mut BehaviourContext<'_>) -> BehaviourResult {
            assert_relative_eq!(ctx.time.delta_time(), ctx.time.fixed_delta_time());
            self.note("fixed");
            Ok(())
        }

        fn update(&mut self, _ctx: &mut BehaviourContext<'_>) -> BehaviourResult {
            self.note("update");
            if self.fail_update {
                return Err(BehaviourError::Failed("update exploded".into()));
            }
            Ok(())
        }

        fn late_update(&mut self, _ctx: &mut BehaviourContext<'_>) -> BehaviourResult {
            self.note("late");
            Ok(())
        }
    }

    /// Spawns a child object with a recorder during its first update
    struct Spawner {
        journal: Journal,
        spawned: Option<GameObjectId>,
    }

    impl Behaviour for Spawner {
        fn capabilities(&self) -> Capabilities {
            Capabilities::UPDATE
        }

        fn update(&mut self, ctx: &mut BehaviourContext<'_>) -> BehaviourResult {
            if self.spawned.is_none() {
                let object = ctx.scene.create_object("spawned");
                ctx.scene.add_behaviour(object, Recorder::new("spawned", &self.journal))?;
                self.spawned = Some(object);
            }
            Ok(())
        }
    }

    fn step_config() -> TimeConfig {
        TimeConfig::default().with_fixed_delta_time(0.01).with_max_fixed_steps(3)
    }

    #[test]
    fn test_phase_order_within_a_frame() {
        let journal: Journal = Rc::default();
        let mut scene = Scene::new("test");
        let mut physics = Physics::default();
        let mut player_loop = PlayerLoop::new(&step_config(), 1.0);
        let object = scene.create_object("object");
        scene.add_behaviour(object, Recorder::new("a", &journal)).unwrap();
        scene.add_behaviour(object, Recorder::new("b", &journal)).unwrap();

        let stats = player_loop
            .run_frame(&mut scene, &mut physics, 0.02, |_, _| {})
            .unwrap();

        assert_eq!(stats.fixed_steps, 2);
        assert_eq!(
            *journal.borrow(),
            [
                "a:awake", "b:awake", "a:start", "b:start", "a:fixed", "b:fixed", "a:fixed", "b:fixed", "a:update",
                "b:update", "a:late", "b:late",
            ]
        );
    }

    #[test]
    fn test_awake_and_start_run_once() {
        let journal: Journal = Rc::default();
        let mut scene = Scene::new("test");
        let mut physics = Physics::default();
        let mut player_loop = PlayerLoop::new(&step_config(), 1.0);
        let object = scene.create_object("object");
        scene.add_behaviour(object, Recorder::new("a", &journal)).unwrap();

        for _ in 0..3 {
            player_loop.run_frame(&mut scene, &mut physics, 0.0, |_, _| {}).unwrap();
        }
        let journal = journal.borrow();
        assert_eq!(journal.iter().filter(|e| *e == "a:awake").count(), 1);
        assert_eq!(journal.iter().filter(|e| *e == "a:start").count(), 1);
        assert_eq!(journal.iter().filter(|e| *e == "a:update").count(), 3);
    }

    #[test]
    fn test_accumulator_carries_remainder() {
        let mut scene = Scene::new("test");
        let mut physics = Physics::default();
        let mut player_loop = PlayerLoop::new(&TimeConfig::default().with_fixed_delta_time(0.25), 1.0);

        let first = player_loop.run_frame(&mut scene, &mut physics, 0.375, |_, _| {}).unwrap();
        assert_eq!(first.fixed_steps, 1);
        assert_relative_eq!(player_loop.accumulator(), 0.125);

        let second = player_loop.run_frame(&mut scene, &mut physics, 0.125, |_, _| {}).unwrap();
        assert_eq!(second.fixed_steps, 1);
        assert_relative_eq!(player_loop.accumulator(), 0.0);
    }

    #[test]
    fn test_catch_up_is_capped_and_surplus_dropped() {
        let mut scene = Scene::new("test");
        let mut physics = Physics::default();
        let config = TimeConfig::default().with_fixed_delta_time(0.125).with_max_fixed_steps(2);
        let mut player_loop = PlayerLoop::new(&config, 10.0);

        let stats = player_loop.run_frame(&mut scene, &mut physics, 0.625, |_, _| {}).unwrap();
        assert_eq!(stats.fixed_steps, 2);
        assert_relative_eq!(stats.dropped_time, 0.375);
        assert_relative_eq!(player_loop.accumulator(), 0.0);
        assert_eq!(physics.step_count(), 2);
    }

    #[test]
    fn test_frame_delta_is_clamped() {
        let mut scene = Scene::new("test");
        let mut physics = Physics::default();
        let config = TimeConfig::default().with_fixed_delta_time(0.125).with_max_fixed_steps(100);
        let mut player_loop = PlayerLoop::new(&config, 0.25);

        let stats = player_loop.run_frame(&mut scene, &mut physics, 5.0, |_, _| {}).unwrap();
        assert_eq!(stats.fixed_steps, 2);
        assert_relative_eq!(player_loop.time().unscaled_delta_time(), 0.25);
    }

    #[test]
    fn test_zero_time_scale_runs_no_fixed_steps() {
        let mut scene = Scene::new("test");
        let mut physics = Physics::default();
        let mut player_loop = PlayerLoop::new(&step_config().with_time_scale(0.0), 1.0);

        let stats = player_loop.run_frame(&mut scene, &mut physics, 0.1, |_, _| {}).unwrap();
        assert_eq!(stats.fixed_steps, 0);
        assert_eq!(physics.step_count(), 0);
    }

    #[test]
    fn test_failing_update_does_not_stop_phase() {
        let journal: Journal = Rc::default();
        let mut scene = Scene::new("test");
        let mut physics = Physics::default();
        let mut player_loop = PlayerLoop::new(&step_config(), 1.0);
        let object = scene.create_object("object");
        scene
            .add_behaviour(
                object,
                Recorder {
                    fail_update: true,
                    ..Recorder::new("a", &journal)
                },
            )
            .unwrap();
        scene.add_behaviour(object, Recorder::new("b", &journal)).unwrap();

        for _ in 0..2 {
            let stats = player_loop.run_frame(&mut scene, &mut physics, 0.0, |_, _| {}).unwrap();
            assert_eq!(stats.callback_failures, 1);
        }
        // the failing component is not disabled
        assert_eq!(journal.borrow().iter().filter(|e| *e == "a:update").count(), 2);
        assert_eq!(journal.borrow().iter().filter(|e| *e == "b:late").count(), 2);
    }

    #[test]
    fn test_components_added_mid_phase_wait_for_next_frame() {
        let journal: Journal = Rc::default();
        let mut scene = Scene::new("test");
        let mut physics = Physics::default();
        let mut player_loop = PlayerLoop::new(&step_config(), 1.0);
        let object = scene.create_object("spawner");
        scene
            .add_behaviour(
                object,
                Spawner {
                    journal: Rc::clone(&journal),
                    spawned: None,
                },
            )
            .unwrap();

        player_loop.run_frame(&mut scene, &mut physics, 0.0, |_, _| {}).unwrap();
        assert!(journal.borrow().is_empty());

        player_loop.run_frame(&mut scene, &mut physics, 0.0, |_, _| {}).unwrap();
        assert_eq!(
            *journal.borrow(),
            ["spawned:awake", "spawned:start", "spawned:update", "spawned:late"]
        );
    }

    #[test]
    fn test_disabled_and_inactive_behaviours_are_skipped() {
        let journal: Journal = Rc::default();
        let mut scene = Scene::new("test");
        let mut physics = Physics::default();
        let mut player_loop = PlayerLoop::new(&step_config(), 1.0);
        let enabled = scene.create_object("enabled");
        let disabled_component = scene.add_behaviour(enabled, Recorder::new("off", &journal)).unwrap();
        scene.set_component_enabled(disabled_component, false).unwrap();
        let inactive = scene.create_object("inactive");
        scene.add_behaviour(inactive, Recorder::new("asleep", &journal)).unwrap();
        scene.set_active(inactive, false).unwrap();

        player_loop.run_frame(&mut scene, &mut physics, 0.0, |_, _| {}).unwrap();
        // disabled components still awaken; inactive objects do not
        assert_eq!(*journal.borrow(), ["off:awake"]);

        scene.set_active(inactive, true).unwrap();
        player_loop.run_frame(&mut scene, &mut physics, 0.0, |_, _| {}).unwrap();
        assert_eq!(journal.borrow()[1..], ["asleep:awake", "asleep:start", "asleep:update", "asleep:late"]);
    }

    #[test]
    fn test_render_hook_runs_after_destruction() {
        let mut scene = Scene::new("test");
        let mut physics = Physics::default();
        let mut player_loop = PlayerLoop::default();
        let doomed = scene.create_object("doomed");
        scene.destroy(doomed).unwrap();

        let mut seen = None;
        let stats = player_loop
            .run_frame(&mut scene, &mut physics, 0.0, |scene, time| {
                seen = Some((scene.object_count(), time.frame_count()));
            })
            .unwrap();
        assert_eq!(stats.destroyed_objects, 1);
        assert_eq!(seen, Some((0, 1)));
    }
}
