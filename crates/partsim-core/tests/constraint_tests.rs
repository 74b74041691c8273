use glam::Vec3;
use partsim_core::config::SimConfig;
use partsim_core::constraints::{enforce_constraints, Constraint, HitResponse, SlidePlane};
use partsim_core::forces::Force;
use partsim_core::integrator::Integrator;
use partsim_core::math::sample_unit_ball_or_center;
use partsim_core::particle::{ParticleInit, StateBuffer};
use partsim_core::scenes;
use partsim_core::system::SystemBuilder;
use partsim_core::targeting::Target;

fn one(position: Vec3, velocity: Vec3) -> StateBuffer {
    let mut s = StateBuffer::new(1);
    s.write(
        0,
        &ParticleInit {
            position,
            velocity,
            ..Default::default()
        },
    );
    s
}

#[test]
fn test_bouncy_particles_stay_inside_volume() {
    let mut sys = scenes::bouncy(200).unwrap();
    for tick in 0..600 {
        sys.step(16.0);
        let state = sys.state();
        for i in 0..state.count() {
            let p = state.position(i);
            assert!(
                p.cmpge(Vec3::splat(0.1 - 1e-5)).all() && p.cmple(Vec3::splat(1.9 + 1e-5)).all(),
                "tick {tick}: particle {i} escaped to {p:?}"
            );
        }
    }
}

#[test]
fn test_velocity_reversal_particles_stay_inside_volume() {
    let config = SimConfig {
        integrator: Integrator::SymplecticEuler,
        collision_response: HitResponse::VelocityReversal,
        restitution: 0.9,
        ..Default::default()
    };
    let mut sys = SystemBuilder::new(200)
        .with_config(config.clone())
        .with_force(Force::earth_gravity(Target::ALL, config.gravity))
        .with_constraint(Constraint::volume(Target::ALL, Vec3::ZERO, Vec3::splat(4.0)))
        .with_spawner(|_, rng| ParticleInit {
            position: Vec3::splat(2.0) + sample_unit_ball_or_center(rng),
            velocity: 8.0 * sample_unit_ball_or_center(rng),
            ..Default::default()
        })
        .build()
        .unwrap();

    for tick in 0..600 {
        sys.step(16.0);
        let state = sys.state();
        for i in 0..state.count() {
            let p = state.position(i);
            assert!(
                p.cmpge(Vec3::splat(0.1 - 1e-5)).all() && p.cmple(Vec3::splat(3.9 + 1e-5)).all(),
                "tick {tick}: particle {i} escaped to {p:?}"
            );
        }
    }
}

#[test]
fn test_restitution_defaults_to_config() {
    let floor = Constraint::volume(Target::ALL, Vec3::splat(-5.0), Vec3::splat(5.0))
        .with_response(HitResponse::Impulsive);

    let bounce = |c: &Constraint, restitution: f32| {
        let config = SimConfig {
            restitution,
            drag: 1.0,
            ..Default::default()
        };
        let prev = one(Vec3::new(0.0, 0.0, -4.8), Vec3::new(0.0, 0.0, -2.0));
        let mut next = one(Vec3::new(0.0, 0.0, -5.2), Vec3::new(0.0, 0.0, -2.2));
        enforce_constraints(&prev, &mut next, std::slice::from_ref(c), &config);
        next.velocity(0).z
    };

    assert!((bounce(&floor, 1.0) - 2.0).abs() < 1e-6);
    assert!((bounce(&floor, 0.1) - 0.2).abs() < 1e-6);
    // A constraint's own coefficient wins over the config.
    let own = floor.clone().with_restitution(0.5);
    assert!((bounce(&own, 0.1) - 1.0).abs() < 1e-6);
}

#[test]
fn test_velocity_reversal_bounces_inward() {
    let prev = one(Vec3::new(1.8, 1.0, 1.0), Vec3::new(3.0, 0.0, 0.0));
    let mut next = one(Vec3::new(2.5, 1.0, 1.0), Vec3::new(3.0, 0.0, 0.0));
    let c = Constraint::volume(Target::ALL, Vec3::ZERO, Vec3::splat(2.0))
        .with_response(HitResponse::VelocityReversal)
        .with_restitution(0.5);
    enforce_constraints(&prev, &mut next, &[c], &SimConfig::default());

    assert!((next.position(0).x - 1.9).abs() < 1e-6);
    assert!((next.velocity(0).x + 1.5).abs() < 1e-6, "v = {:?}", next.velocity(0));
}

#[test]
fn test_impulsive_floor_hit_always_leaves_surface() {
    let config = SimConfig::default();
    let floor = Constraint::volume(Target::ALL, Vec3::splat(-5.0), Vec3::splat(5.0))
        .with_response(HitResponse::Impulsive)
        .with_restitution(0.8);

    // Previous velocity pointing up or down: the result must point up.
    for vz_prev in [-2.0, 0.5] {
        let prev = one(Vec3::new(0.0, 0.0, -4.8), Vec3::new(1.0, 0.0, vz_prev));
        let mut next = one(Vec3::new(0.0, 0.0, -5.2), Vec3::new(1.0, 0.0, -2.2));
        enforce_constraints(&prev, &mut next, std::slice::from_ref(&floor), &config);

        let v = next.velocity(0);
        let expected = 0.8 * (vz_prev * config.drag).abs();
        assert!((next.position(0).z + 4.9).abs() < 1e-6);
        assert!((v.z - expected).abs() < 1e-6, "vz = {}, expected {expected}", v.z);
        assert_eq!(v.x, 1.0, "tangential velocity kept");
    }
}

#[test]
fn test_stop_and_slide_responses() {
    let prev = one(Vec3::ZERO, Vec3::ZERO);
    let wall = |r| Constraint::volume(Target::ALL, Vec3::splat(-1.0), Vec3::splat(1.0)).with_response(r);

    let mut next = one(Vec3::new(0.0, 0.0, -1.5), Vec3::new(2.0, 0.0, -3.0));
    enforce_constraints(&prev, &mut next, &[wall(HitResponse::Stop)], &SimConfig::default());
    assert_eq!(next.velocity(0), Vec3::ZERO);

    let mut next = one(Vec3::new(0.0, 0.0, -1.5), Vec3::new(2.0, 0.0, -3.0));
    enforce_constraints(&prev, &mut next, &[wall(HitResponse::Slide)], &SimConfig::default());
    assert_eq!(next.velocity(0), Vec3::new(2.0, 0.0, 0.0));
    assert!((next.position(0).z + 0.9).abs() < 1e-6);
}

#[test]
fn test_wrap_reenters_opposite_face() {
    let prev = one(Vec3::ZERO, Vec3::ZERO);
    let mut next = one(Vec3::new(11.0, -10.5, 3.0), Vec3::X);
    let c = Constraint::wrap(Target::ALL, Vec3::splat(-10.0), Vec3::splat(10.0));
    enforce_constraints(&prev, &mut next, &[c], &SimConfig::default());
    let p = next.position(0);
    assert!((p - Vec3::new(-9.0, 9.5, 3.0)).length() < 1e-5, "p = {p:?}");
    assert_eq!(next.velocity(0), Vec3::X);
}

#[test]
fn test_constraints_run_in_catalog_order() {
    let prev = one(Vec3::ZERO, Vec3::ZERO);
    let pin = Vec3::new(50.0, 0.0, 0.0);
    let wrap = Constraint::wrap(Target::ALL, Vec3::splat(-10.0), Vec3::splat(10.0));
    let anchor = Constraint::anchor(Target::ALL, Some(pin));

    let mut next = one(Vec3::ONE, Vec3::ONE);
    enforce_constraints(&prev, &mut next, &[wrap.clone(), anchor.clone()], &SimConfig::default());
    assert_eq!(next.position(0), pin);
    assert_eq!(next.velocity(0), Vec3::ZERO);

    let mut next = one(Vec3::ONE, Vec3::ONE);
    enforce_constraints(&prev, &mut next, &[anchor, wrap], &SimConfig::default());
    assert!((next.position(0) - Vec3::new(-10.0, 0.0, 0.0)).length() < 1e-5);
}

#[test]
fn test_disabled_constraint_is_skipped() {
    let prev = one(Vec3::ZERO, Vec3::ZERO);
    let mut next = one(Vec3::splat(30.0), Vec3::ONE);
    let mut c = Constraint::volume(Target::ALL, Vec3::ZERO, Vec3::ONE);
    c.enabled = false;
    enforce_constraints(&prev, &mut next, &[c], &SimConfig::default());
    assert_eq!(next.position(0), Vec3::splat(30.0));
}

#[test]
fn test_rod_restores_length_and_rope_goes_slack() {
    let mut prev = StateBuffer::new(2);
    prev.write(0, &ParticleInit::default());
    prev.write(1, &ParticleInit { position: Vec3::X, ..Default::default() });

    let mut next = prev.clone();
    next.set_position(1, Vec3::new(3.0, 0.0, 0.0));
    enforce_constraints(&prev, &mut next, &[Constraint::rod(0, 1, 1.0)], &SimConfig::default());
    let d = (next.position(1) - next.position(0)).length();
    assert!((d - 1.0).abs() < 1e-5, "rod length {d}");

    let mut next = prev.clone();
    next.set_position(1, Vec3::new(0.5, 0.0, 0.0));
    enforce_constraints(&prev, &mut next, &[Constraint::rope(0, 1, 1.0)], &SimConfig::default());
    assert_eq!(next.position(1), Vec3::new(0.5, 0.0, 0.0), "slack rope must not pull");
}

#[test]
fn test_slide_plane_catches_particles_from_above_only() {
    let plane = SlidePlane {
        x_min: -1.0,
        x_max: 1.0,
        y_min: -1.0,
        y_max: 1.0,
        z: 0.0,
    };
    let c = Constraint::slide(Target::ALL, plane);

    let prev = one(Vec3::new(0.0, 0.0, 0.2), Vec3::new(1.0, 0.0, -3.0));
    let mut next = one(Vec3::new(0.05, 0.0, -0.1), Vec3::new(1.0, 0.0, -3.0));
    enforce_constraints(&prev, &mut next, std::slice::from_ref(&c), &SimConfig::default());
    assert_eq!(next.position(0).z, 0.0);
    assert_eq!(next.velocity(0).z, 0.0);
    assert_eq!(next.velocity(0).x, 1.0);

    // Coming from below passes through.
    let prev = one(Vec3::new(0.0, 0.0, -0.2), Vec3::new(0.0, 0.0, 3.0));
    let mut next = one(Vec3::new(0.0, 0.0, 0.1), Vec3::new(0.0, 0.0, 3.0));
    enforce_constraints(&prev, &mut next, &[c], &SimConfig::default());
    assert_eq!(next.position(0).z, 0.1);
}

#[test]
fn test_out_of_range_constraint_is_reported_and_disabled() {
    let sys = partsim_core::SystemBuilder::new(10)
        .with_constraint(Constraint::volume(
            Target::Range { first: 8, count: 4 },
            Vec3::ZERO,
            Vec3::ONE,
        ))
        .with_constraint(Constraint::rod(3, 10, 1.0))
        .build()
        .unwrap();
    assert_eq!(sys.diagnostics().len(), 2);
    assert!(sys.constraints().iter().all(|c| !c.enabled));
    assert!(sys.line_indices().is_empty());
}
