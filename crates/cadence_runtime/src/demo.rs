//! Headless demo scene
//!
//! A player and a few drifting drones are shot at by turrets firing homing
//! projectiles. Projectiles expire on their own; hits knock health down,
//! grant a short invulnerability window and slow the game for a moment.

use cadence_core::aging::{Aging, AgingSystem, Timebomb};
use cadence_core::ecs::{AspectMut, EcsResult, Entity, Frame, System, SystemDescriptor, World};
use cadence_core::math::{DeterministicRng, Vec2};
use cadence_core::{define_component, spawn};
use std::time::Duration;
use tracing::{debug, info};

const PROJECTILE_SPEED: f32 = 40.0;
const PROJECTILE_LIFETIME: Duration = Duration::from_secs(3);
const PROJECTILE_RADIUS: f32 = 1.5;
const PROJECTILE_DAMAGE: i32 = 15;
const HOMING_TURN_RATE: f32 = 3.0;
const INVULNERABILITY: Duration = Duration::from_millis(500);
const HIT_SLOW_FACTOR: u32 = 3;
const HIT_SLOW_DURATION: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy)]
pub struct Position(pub Vec2);
define_component!(Position, 1, "Position");

#[derive(Debug, Clone, Copy)]
pub struct Velocity(pub Vec2);
define_component!(Velocity, 2, "Velocity");

#[derive(Debug, Clone, Copy)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}
define_component!(Health, 3, "Health");

impl Health {
    pub fn full(max: i32) -> Self {
        Self { current: max, max }
    }
}

#[derive(Debug)]
pub struct PlayerTag;
define_component!(PlayerTag, 4, "PlayerTag");

#[derive(Debug)]
pub struct Projectile {
    pub damage: i32,
    pub radius: f32,
    pub lifetime: Timebomb,
}
define_component!(Projectile, 5, "Projectile");

impl Aging for Projectile {
    fn timebomb(&self) -> &Timebomb {
        &self.lifetime
    }

    fn timebomb_mut(&mut self) -> &mut Timebomb {
        &mut self.lifetime
    }
}

/// Steers towards another entity. The target is a plain id and may be gone.
#[derive(Debug)]
pub struct Homing {
    pub target: Entity,
    pub speed: f32,
    pub turn_rate: f32,
}
define_component!(Homing, 6, "Homing");

#[derive(Debug)]
pub struct Invulnerable(pub Timebomb);
define_component!(Invulnerable, 7, "Invulnerable");

impl Aging for Invulnerable {
    fn timebomb(&self) -> &Timebomb {
        &self.0
    }

    fn timebomb_mut(&mut self) -> &mut Timebomb {
        &mut self.0
    }
}

#[derive(Debug)]
pub struct Turret {
    pub target: Entity,
    pub interval: Duration,
    pub cooldown: Duration,
    pub rng: DeterministicRng,
}
define_component!(Turret, 8, "Turret");

/// Fires a homing projectile at its target every `interval`.
pub struct TurretSystem;

impl System for TurretSystem {
    type State = ();

    fn descriptor(&self) -> SystemDescriptor {
        SystemDescriptor::new("turrets")
            .require::<Turret>()
            .require::<Position>()
    }

    fn update(&self, world: &mut World, frame: &Frame<'_>) -> EcsResult<()> {
        let mut shots = Vec::new();
        for &entity in frame.entities() {
            let Some(mut aspect) = world.aspect_mut::<Self>(entity) else {
                continue;
            };
            let origin = aspect.get::<Position>()?.0;
            let turret = aspect.get_mut::<Turret>()?;
            turret.cooldown = turret.cooldown.saturating_sub(frame.delta());
            if !turret.cooldown.is_zero() {
                continue;
            }
            turret.cooldown = turret.interval;
            shots.push((origin, turret.rng.unit_vec2(), turret.target));
        }

        for (origin, heading, target) in shots {
            if !world.contains(target) {
                continue;
            }
            let shot = spawn!(
                world,
                Position(origin),
                Velocity(heading * PROJECTILE_SPEED),
                Projectile {
                    damage: PROJECTILE_DAMAGE,
                    radius: PROJECTILE_RADIUS,
                    lifetime: Timebomb::remove_entity(PROJECTILE_LIFETIME),
                },
                Homing {
                    target,
                    speed: PROJECTILE_SPEED,
                    turn_rate: HOMING_TURN_RATE,
                }
            )?;
            debug!(%shot, %target, "projectile fired");
        }
        Ok(())
    }
}

/// Bends velocity towards the target's position.
pub struct HomingSystem;

impl System for HomingSystem {
    type State = ();

    fn descriptor(&self) -> SystemDescriptor {
        SystemDescriptor::new("homing")
            .require::<Homing>()
            .require::<Velocity>()
            .require::<Position>()
    }

    fn update(&self, world: &mut World, frame: &Frame<'_>) -> EcsResult<()> {
        for &entity in frame.entities() {
            let (target, speed, turn_rate) = match world.aspect::<Self>(entity) {
                Some(aspect) => {
                    let homing = aspect.get::<Homing>()?;
                    (homing.target, homing.speed, homing.turn_rate)
                }
                None => continue,
            };

            let Some(goal) = world.try_get::<Position>(target).map(|p| p.0) else {
                // Target is gone; keep flying straight.
                world.detach_if_exists::<Homing>(entity);
                continue;
            };

            let Some(mut aspect) = world.aspect_mut::<Self>(entity) else {
                continue;
            };
            let position = aspect.get::<Position>()?.0;
            let desired = (goal - position).normalize_or_zero() * speed;
            let blend = (turn_rate * frame.delta_secs()).min(1.0);
            let velocity = &mut aspect.get_mut::<Velocity>()?.0;
            *velocity = velocity.lerp(desired, blend);
        }
        Ok(())
    }
}

/// Integrates velocity into position.
pub struct MovementSystem;

impl System for MovementSystem {
    type State = ();

    fn descriptor(&self) -> SystemDescriptor {
        SystemDescriptor::new("movement")
            .require::<Velocity>()
            .watch::<Position>()
    }

    fn update(&self, world: &mut World, frame: &Frame<'_>) -> EcsResult<()> {
        if frame.delta().is_zero() {
            return Ok(());
        }
        for &entity in frame.entities() {
            let Some(mut aspect) = world.aspect_mut::<Self>(entity) else {
                continue;
            };
            let velocity = aspect.get::<Velocity>()?.0;
            if velocity == Vec2::ZERO {
                continue;
            }
            aspect.get_mut::<Position>()?.0 += velocity * frame.delta_secs();
            aspect.dirty::<Position>()?;
        }
        Ok(())
    }
}

/// Checks projectiles that moved this frame against everything with vitals.
pub struct HitSystem;

impl System for HitSystem {
    type State = ();

    fn descriptor(&self) -> SystemDescriptor {
        SystemDescriptor::new("hits")
            .require::<Projectile>()
            .watch::<Position>()
    }

    fn update(&self, world: &mut World, frame: &Frame<'_>) -> EcsResult<()> {
        let Some(moved) = frame.dirty() else {
            return Ok(());
        };
        let candidates = world.aspect_entities::<VitalsSystem>()?;

        for projectile in moved.iter() {
            let (at, damage, radius) = match world.aspect::<Self>(projectile) {
                Some(aspect) => {
                    let shot = aspect.get::<Projectile>()?;
                    if shot.lifetime.is_fused() {
                        continue;
                    }
                    (aspect.get::<Position>()?.0, shot.damage, shot.radius)
                }
                None => continue,
            };

            let victim = candidates.iter().copied().find(|&candidate| {
                world
                    .try_get::<Position>(candidate)
                    .is_some_and(|p| p.0.distance(at) <= radius)
            });
            let Some(victim) = victim else {
                continue;
            };

            // The projectile's aging system removes it later this frame.
            world.get_mut::<Projectile>(projectile)?.lifetime.fuse();
            if world.has::<Invulnerable>(victim) {
                debug!(%projectile, %victim, "hit absorbed");
                continue;
            }

            world.modify(victim, |health: &mut Health| {
                health.current = (health.current - damage).max(0);
            })?;
            world.attach(victim, Invulnerable(Timebomb::remove_component(INVULNERABILITY)))?;
            world
                .slow_motion_mut()
                .request(HIT_SLOW_FACTOR, HIT_SLOW_DURATION);
            info!(%projectile, %victim, damage, "hit");
        }
        Ok(())
    }
}

/// Reacts to health changes. The aspect state remembers the last value seen.
pub struct VitalsSystem;

impl System for VitalsSystem {
    type State = i32;

    fn descriptor(&self) -> SystemDescriptor {
        SystemDescriptor::new("vitals")
            .require::<Position>()
            .watch::<Health>()
    }

    fn on_add(&self, aspect: &mut AspectMut<'_, i32>) {
        let current = aspect.get::<Health>().map_or(0, |h| h.current);
        *aspect.state_mut() = current;
    }

    fn on_remove(&self, aspect: &mut AspectMut<'_, i32>) {
        let current = aspect.get::<Health>().map_or(0, |h| h.current);
        debug!(entity = %aspect.entity(), current, "vitals released");
    }

    fn update(&self, world: &mut World, frame: &Frame<'_>) -> EcsResult<()> {
        let Some(changed) = frame.dirty() else {
            return Ok(());
        };
        for entity in changed.iter() {
            let (current, max, previous) = match world.aspect::<Self>(entity) {
                Some(aspect) => {
                    let health = aspect.get::<Health>()?;
                    (health.current, health.max, *aspect.state())
                }
                None => continue,
            };

            if current <= 0 {
                let player = world.has::<PlayerTag>(entity);
                info!(%entity, player, "destroyed");
                world.destroy_entity(entity)?;
                continue;
            }

            info!(%entity, from = previous, to = current, max, "health changed");
            if let Some(mut aspect) = world.aspect_mut::<Self>(entity) {
                *aspect.state_mut() = current;
            }
        }
        Ok(())
    }
}

/// Handles to the entities the scene starts with.
#[derive(Debug, Clone)]
pub struct Scene {
    pub player: Entity,
    pub drones: Vec<Entity>,
    pub turrets: Vec<Entity>,
}

/// Register the demo systems in update order.
pub fn register_systems(world: &mut World) -> EcsResult<()> {
    world.register_system(TurretSystem)?;
    world.register_system(HomingSystem)?;
    world.register_system(MovementSystem)?;
    world.register_system(HitSystem)?;
    world.register_system(VitalsSystem)?;
    world.register_system(AgingSystem::<Projectile>::new())?;
    world.register_system(AgingSystem::<Invulnerable>::new())?;
    Ok(())
}

/// Register systems and spawn the starting entities.
pub fn populate(world: &mut World, seed: u64) -> EcsResult<Scene> {
    register_systems(world)?;

    let player = spawn!(
        world,
        PlayerTag,
        Position(Vec2::ZERO),
        Health::full(100),
        Invulnerable(Timebomb::remove_component(Duration::from_secs(1)))
    )?;

    let mut rng = DeterministicRng::new(seed);
    let mut drones = Vec::new();
    for _ in 0..3 {
        let start = Vec2::new(rng.range_f32(-25.0, 25.0), rng.range_f32(-25.0, 25.0));
        let drift = rng.unit_vec2() * rng.range_f32(1.0, 4.0);
        drones.push(spawn!(
            world,
            Position(start),
            Velocity(drift),
            Health::full(30)
        )?);
    }

    let mut turrets = Vec::new();
    for (index, (corner, target)) in [
        (Vec2::new(30.0, 30.0), player),
        (Vec2::new(-30.0, -20.0), drones[0]),
        (Vec2::new(30.0, -30.0), drones[1]),
    ]
    .into_iter()
    .enumerate()
    {
        let interval = Duration::from_millis(600 + 150 * index as u64);
        turrets.push(spawn!(
            world,
            Position(corner),
            Turret {
                target,
                interval,
                cooldown: interval,
                rng: DeterministicRng::new(seed.wrapping_add(index as u64 + 1)),
            }
        )?);
    }

    info!(
        entities = world.entity_count(),
        systems = world.system_count(),
        "scene populated"
    );
    Ok(Scene {
        player,
        drones,
        turrets,
    })
}
