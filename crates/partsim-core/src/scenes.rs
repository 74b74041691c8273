//! Ready-made systems: which forces, constraints, integrator and lifecycle
//! each demo uses. Pure configuration over [`SystemBuilder`].

use glam::{Vec3, Vec4};
use rand::Rng;

use crate::config::SimConfig;
use crate::constraints::{Constraint, HitResponse, SlidePlane};
use crate::error::SimError;
use crate::forces::{Flocking, Force, ForceKind, Spring, SpringSet, Tornado};
use crate::integrator::Integrator;
use crate::lifecycle::{FountainSpawn, Lifecycle, SpawnRegion, TornadoSpawn, INIT_VEL};
use crate::math::{sample_unit_ball_or_center, Aabb};
use crate::particle::ParticleInit;
use crate::system::{ParticleSystem, SystemBuilder};
use crate::targeting::Target;

/// The demo systems.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scene {
    Bouncy,
    Cloth,
    ReevesFire,
    Tornado,
    Boids,
    Falling,
}

impl Scene {
    pub const ALL: [Scene; 6] = [
        Scene::Bouncy,
        Scene::Cloth,
        Scene::ReevesFire,
        Scene::Tornado,
        Scene::Boids,
        Scene::Falling,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scene::Bouncy => "bouncy",
            Scene::Cloth => "cloth",
            Scene::ReevesFire => "reeves_fire",
            Scene::Tornado => "tornado",
            Scene::Boids => "boids",
            Scene::Falling => "falling",
        }
    }

    pub fn from_name(name: &str) -> Option<Scene> {
        Scene::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Build the scene with roughly `count` particles. Cloth rounds to a
    /// square grid (plus its two holders).
    pub fn build(self, count: usize) -> Result<ParticleSystem, SimError> {
        match self {
            Scene::Bouncy => bouncy(count),
            Scene::Cloth => {
                let side = ((count as f32).sqrt() as usize).max(2);
                cloth(side, side)
            }
            Scene::ReevesFire => reeves_fire(count),
            Scene::Tornado => tornado(count),
            Scene::Boids => boids(count),
            Scene::Falling => falling(count),
        }
    }
}

fn config(integrator: Integrator, response: HitResponse) -> SimConfig {
    SimConfig {
        integrator,
        collision_response: response,
        ..Default::default()
    }
}

/// Uniform draw used for the render size of fresh particles.
fn diameter<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen_range(2.0..12.0)
}

/// Bouncing balls in a 2 m cube, closed-form integration with impulsive
/// walls.
pub fn bouncy(count: usize) -> Result<ParticleSystem, SimError> {
    let cfg = config(Integrator::OldGood, HitResponse::Impulsive);
    SystemBuilder::new(count)
        .with_config(cfg.clone())
        .with_force(Force::earth_gravity(Target::ALL, cfg.gravity))
        .with_force(Force::drag(Target::ALL, 0.15))
        .with_constraint(Constraint::volume(Target::ALL, Vec3::ZERO, Vec3::splat(2.0)))
        .with_spawner(|_, rng| {
            let u = sample_unit_ball_or_center(rng);
            let w = sample_unit_ball_or_center(rng);
            ParticleInit {
                position: Vec3::splat(0.8) + 0.1 * u,
                velocity: INIT_VEL * (Vec3::splat(0.4) + 0.2 * w),
                color: Vec4::new(0.8, 0.2, 0.2, 1.0),
                mass: 1.0,
                diameter: diameter(rng),
                render_mode: 0,
                age: rng.gen_range(30.0..130.0),
            }
        })
        .build()
}

/// A `rows x cols` sheet hanging from two anchored holder particles, plus
/// those holders. Cloth particle `(r, c)` has index `r * cols + c`.
/// An empty sheet is [`SimError::Empty`].
pub fn cloth(rows: usize, cols: usize) -> Result<ParticleSystem, SimError> {
    if rows == 0 || cols == 0 {
        return Err(SimError::Empty);
    }
    let n = rows * cols;
    let holders = Target::Range { first: n, count: 2 };
    let spring = Spring {
        stiffness: 40.0,
        damping: 3.0,
        rest_length: 1.0,
    };
    let height = 5.0;

    let mut particles = Vec::with_capacity(n + 2);
    for r in 0..rows {
        for c in 0..cols {
            particles.push(ParticleInit {
                position: Vec3::new(c as f32, height, -(r as f32)),
                color: Vec4::new(0.9, 0.9, 0.9, 1.0),
                ..Default::default()
            });
        }
    }
    for x in [-1.0, cols as f32] {
        particles.push(ParticleInit {
            position: Vec3::new(x, height, 0.0),
            color: Vec4::new(0.5, 0.5, 0.5, 1.0),
            ..Default::default()
        });
    }

    let box_len = 20.0;
    let cfg = config(Integrator::Midpoint, HitResponse::Impulsive);
    let sheet = Target::Range { first: 0, count: n };
    SystemBuilder::new(n + 2)
        .with_particles(particles)
        .with_force(Force::new(
            ForceKind::SpringSet(SpringSet::grid(
                spring.stiffness,
                spring.damping,
                0,
                cols,
                rows,
                1.0,
            )),
            Target::ALL,
        ))
        .with_force(Force::spring(n, 0, spring))
        .with_force(Force::spring(n + 1, cols - 1, spring))
        .with_force(Force::drag(sheet, 0.1))
        .with_force(Force::earth_gravity(sheet, cfg.gravity))
        .with_force(Force::anchor(holders))
        .with_constraint(
            Constraint::volume(
                Target::ALL,
                Vec3::new(-box_len, -2.0 * box_len, -0.5 * box_len),
                Vec3::splat(box_len),
            )
            .with_restitution(0.9),
        )
        .with_constraint(Constraint::anchor(holders, None))
        .with_config(cfg)
        .build()
}

/// Fountain of short-lived embers in a 20 m cube.
pub fn reeves_fire(count: usize) -> Result<ParticleSystem, SimError> {
    let ember = Vec4::new(1.0, 0.3, 0.0, 1.0);
    let mut fountain = FountainSpawn::default();
    fountain.spawn.region = SpawnRegion::Ball {
        center: Vec3::new(10.0, 10.0, 1.0),
        scale: Vec3::ONE,
    };
    fountain.spawn.color = Some(ember);
    let spawn = fountain.spawn;

    let cfg = config(Integrator::OldGood, HitResponse::Impulsive);
    SystemBuilder::new(count)
        .with_config(cfg.clone())
        .with_force(Force::earth_gravity(Target::ALL, cfg.gravity))
        .with_force(Force::drag(Target::ALL, 0.15))
        .with_constraint(Constraint::volume(Target::ALL, Vec3::ZERO, Vec3::splat(20.0)))
        .with_lifecycle(Lifecycle::fountain(fountain))
        .with_spawner(move |_, rng| {
            let mut p = spawn.sample(rng, ember);
            p.diameter = diameter(rng);
            p.age = rng.gen_range(20.0..25.0);
            p
        })
        .build()
}

/// Particles swirling up a funnel; anything leaving the working volume or
/// the funnel radius respawns near its base.
pub fn tornado(count: usize) -> Result<ParticleSystem, SimError> {
    let bounds = Aabb::new(Vec3::new(-10.0, -10.0, 0.0), Vec3::new(10.0, 10.0, 15.0));
    let vortex = Tornado::new(Vec3::ZERO, 5.0, 10.0);
    let spawn = TornadoSpawn {
        bounds,
        max_radius: Some(vortex.radius),
        axis: vortex.center,
        ..Default::default()
    };
    let region = spawn.spawn.region;

    let cfg = config(Integrator::Midpoint, HitResponse::VelocityReversal);
    SystemBuilder::new(count)
        .with_config(cfg.clone())
        .with_force(Force::earth_gravity(Target::ALL, cfg.gravity))
        .with_force(Force::drag(Target::ALL, 0.15))
        .with_force(Force::tornado(Target::ALL, vortex))
        .with_constraint(Constraint::volume(Target::ALL, bounds.min, bounds.max))
        .with_lifecycle(Lifecycle::tornado(spawn))
        .with_spawner(move |_, rng| {
            let w = sample_unit_ball_or_center(rng);
            ParticleInit {
                position: region.sample(rng),
                velocity: INIT_VEL * 0.2 * Vec3::new(w.x, w.y, 1.0),
                color: Vec4::new(0.5, 0.5, 0.5, 1.0),
                mass: 1.0,
                diameter: diameter(rng),
                render_mode: 0,
                age: rng.gen_range(50.0..100.0),
            }
        })
        .build()
}

/// A flock in a periodic box, steering around an obstacle at the origin.
pub fn boids(count: usize) -> Result<ParticleSystem, SimError> {
    let cfg = config(Integrator::Midpoint, HitResponse::VelocityReversal);
    SystemBuilder::new(count)
        .with_config(cfg)
        .with_force(Force::flocking(Target::ALL, Flocking::default()))
        .with_constraint(Constraint::wrap(
            Target::ALL,
            Vec3::new(-20.0, -10.0, -10.0),
            Vec3::new(20.0, 10.0, 10.0),
        ))
        .with_spawner(|_, rng| {
            let u = sample_unit_ball_or_center(rng);
            let w = sample_unit_ball_or_center(rng);
            ParticleInit {
                position: Vec3::splat(5.0) + 5.0 * u,
                velocity: INIT_VEL * Vec3::new(-1.0 + 0.5 * w.x, 0.05 * w.y, 0.05 * w.z),
                color: Vec4::new(1.0, 1.0, 0.0, 1.0),
                mass: 1.0,
                diameter: diameter(rng),
                render_mode: 0,
                age: rng.gen_range(50.0..100.0),
            }
        })
        .build()
}

/// Particles raining through a periodic box onto a square floor.
pub fn falling(count: usize) -> Result<ParticleSystem, SimError> {
    let cfg = config(Integrator::Midpoint, HitResponse::Slide);
    let floor = SlidePlane {
        x_min: -7.0,
        x_max: 7.0,
        y_min: -7.0,
        y_max: 7.0,
        z: 0.0,
    };
    SystemBuilder::new(count)
        .with_config(cfg.clone())
        .with_force(Force::earth_gravity(Target::ALL, cfg.gravity))
        .with_constraint(Constraint::wrap(Target::ALL, Vec3::splat(-12.0), Vec3::splat(12.0)))
        .with_constraint(Constraint::slide(Target::ALL, floor))
        .with_spawner(|_, rng| {
            let u = sample_unit_ball_or_center(rng);
            let w = sample_unit_ball_or_center(rng);
            ParticleInit {
                position: Vec3::new(2.0 * u.x, 2.0 * u.y, 5.0 + 2.0 * u.z),
                velocity: INIT_VEL * 0.8 * Vec3::new(w.x, w.y, 0.0),
                color: Vec4::ONE,
                mass: 1.0,
                diameter: diameter(rng),
                render_mode: 0,
                age: rng.gen_range(50.0..100.0),
            }
        })
        .build()
}
