//! Drop demo: spheres fall onto a ground box, one passes a pickup trigger

use frame_engine::foundation::math::Quat;
use frame_engine::physics::Ray;
use frame_engine::prelude::*;

// Scene layout
const SPHERE_COUNT: usize = 4;
const SPHERE_RADIUS: f32 = 0.5;
const DROP_HEIGHT: f32 = 8.0;
const SPHERE_SPACING: f32 = 1.5;
const PICKUP_HEIGHT: f32 = 4.0;
const SPIN_SPEED: f32 = 1.5; // radians per second

// Synthetic clock
const FRAME_DELTA: f32 = 1.0 / 60.0;
const MAX_FRAMES: u64 = 1200;

/// Logs every impact with its closing speed
struct ImpactLogger {
    impacts: u32,
}

impl Behaviour for ImpactLogger {
    fn capabilities(&self) -> Capabilities {
        Capabilities::COLLISION
    }

    fn on_collision_enter(&mut self, ctx: &mut BehaviourContext<'_>, event: &ContactEvent) -> BehaviourResult {
        self.impacts += 1;
        let name = ctx.scene.object(ctx.object).map_or("?", |o| o.name());
        log::info!(
            "{name} hit something at {:.2} m/s (impact #{})",
            event.relative_velocity.norm(),
            self.impacts
        );
        Ok(())
    }
}

/// Spinning trigger that disappears when something passes through it
struct Pickup {
    collected: bool,
}

impl Behaviour for Pickup {
    fn capabilities(&self) -> Capabilities {
        Capabilities::UPDATE | Capabilities::TRIGGER | Capabilities::ON_DESTROY
    }

    fn update(&mut self, ctx: &mut BehaviourContext<'_>) -> BehaviourResult {
        let angle = SPIN_SPEED * ctx.time.time() as f32;
        let spin = Quat::from_axis_angle(&Vec3::y_axis(), angle);
        ctx.scene.set_local_rotation(ctx.object, spin)?;
        Ok(())
    }

    fn on_trigger_enter(&mut self, ctx: &mut BehaviourContext<'_>, event: &ContactEvent) -> BehaviourResult {
        if self.collected {
            return Ok(());
        }
        self.collected = true;
        let by = ctx.scene.object(event.other_object).map_or("?", |o| o.name());
        log::info!("Pickup collected by {by}");
        ctx.destroy_self()
    }

    fn on_destroy(&mut self, _ctx: &mut BehaviourContext<'_>) -> BehaviourResult {
        log::info!("Pickup removed from the scene");
        Ok(())
    }
}

fn build_scene() -> Result<(Scene, Vec<GameObjectId>), SceneError> {
    let mut scene = Scene::new("Drop Demo");

    let ground = scene.create_object_at("Ground", Trs::from_position(Vec3::new(0.0, -0.5, 0.0)));
    scene.add_collider(
        ground,
        ColliderDesc::cuboid(Vec3::new(10.0, 0.5, 10.0)).with_material(PhysicsMaterial::new(0.6, 0.0)),
    )?;

    let mut spheres = Vec::with_capacity(SPHERE_COUNT);
    for i in 0..SPHERE_COUNT {
        let x = (i as f32 - (SPHERE_COUNT - 1) as f32 * 0.5) * SPHERE_SPACING;
        let y = DROP_HEIGHT + i as f32;
        let sphere = scene.create_object_at(format!("Sphere {i}"), Trs::from_position(Vec3::new(x, y, 0.0)));
        scene.add_rigidbody(sphere, RigidbodyDesc::dynamic(1.0 + i as f32))?;
        scene.add_collider(
            sphere,
            ColliderDesc::sphere(SPHERE_RADIUS).with_material(PhysicsMaterial::new(0.5, 0.3)),
        )?;
        scene.add_behaviour(sphere, ImpactLogger { impacts: 0 })?;
        spheres.push(sphere);
    }

    let first_x = scene.position(spheres[0]).map_or(0.0, |p| p.x);
    let pickup = scene.create_object_at("Pickup", Trs::from_position(Vec3::new(first_x, PICKUP_HEIGHT, 0.0)));
    scene.add_collider(pickup, ColliderDesc::sphere(0.75).with_trigger(true))?;
    scene.add_behaviour(pickup, Pickup { collected: false })?;

    Ok((scene, spheres))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ApplicationConfig::new("Drop Demo");
    let mut engine = Engine::new(config)?;

    let (scene, spheres) = build_scene()?;
    engine.load_scene(scene)?;

    let mut frame = 0;
    while frame < MAX_FRAMES {
        let stats = engine.frame(FRAME_DELTA, |scene, time| {
            if time.frame_count() % 60 == 0 {
                let heights: Vec<String> = spheres
                    .iter()
                    .filter_map(|&s| scene.position(s))
                    .map(|p| format!("{:.2}", p.y))
                    .collect();
                log::info!("t={:.1}s heights=[{}]", time.time(), heights.join(", "));
            }
        })?;
        frame = stats.frame;

        let all_asleep = spheres.iter().all(|&s| {
            engine
                .active_scene()
                .and_then(|scene| scene.rigidbody_actor(s))
                .is_some_and(|actor| engine.physics().is_sleeping(actor).unwrap_or(false))
        });
        if all_asleep {
            log::info!("Every sphere is asleep after {frame} frames");
            break;
        }
    }

    let probe = Ray::new(Vec3::new(0.0, 20.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
    if let Some(hit) = engine.physics().raycast(&probe, 50.0) {
        let name = engine
            .active_scene()
            .and_then(|scene| scene.object(hit.object))
            .map_or("?", |o| o.name());
        log::info!("Downward probe hit {name} at y={:.2}", hit.point.y);
    }

    let step = engine.physics().last_step_stats();
    log::info!(
        "Last step: {} awake, {} sleeping, {} manifolds",
        step.awake_actors,
        step.sleeping_actors,
        step.manifolds
    );

    engine.unload_scene()?;
    Ok(())
}
