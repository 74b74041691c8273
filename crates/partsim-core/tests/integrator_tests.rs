use glam::Vec3;
use partsim_core::config::{SimConfig, Timestep};
use partsim_core::forces::Force;
use partsim_core::integrator::Integrator;
use partsim_core::particle::ParticleInit;
use partsim_core::system::SystemBuilder;
use partsim_core::targeting::Target;

fn fixed(integrator: Integrator) -> SimConfig {
    SimConfig {
        integrator,
        timestep: Timestep::Fixed(1000.0 / 60.0),
        ..Default::default()
    }
}

#[test]
fn test_old_good_free_fall_matches_closed_form() {
    let config = SimConfig {
        drag: 1.0,
        ..fixed(Integrator::OldGood)
    };
    let dt = config.frame_seconds(0.0);
    let mut sys = SystemBuilder::new(1).with_config(config).build().unwrap();

    let mut expected_z = 0.0;
    let mut vz = 0.0;
    for _ in 0..60 {
        sys.step(16.0);
        vz -= 9.832 * dt;
        expected_z += vz * dt;
    }

    let state = sys.state();
    assert!(
        (state.velocity(0).z + 9.832).abs() < 1e-3,
        "after one second vz should be -g, got {}",
        state.velocity(0).z
    );
    assert!(
        (state.position(0).z - expected_z).abs() < 1e-4,
        "z = {}, expected {expected_z}",
        state.position(0).z
    );
    assert!((expected_z + 4.998).abs() < 1e-2);
}

#[test]
fn test_old_good_ignores_force_catalog() {
    let config = SimConfig {
        gravity: 0.0,
        drag: 1.0,
        ..fixed(Integrator::OldGood)
    };
    let mut sys = SystemBuilder::new(1)
        .with_config(config)
        .with_force(Force::earth_gravity(Target::ALL, 100.0))
        .build()
        .unwrap();
    sys.step(16.0);
    assert_eq!(sys.state().velocity(0), Vec3::ZERO);
    assert_eq!(sys.state().position(0), Vec3::ZERO);
}

#[test]
fn test_drag_never_increases_speed() {
    for integrator in [Integrator::Euler, Integrator::Midpoint, Integrator::SymplecticEuler] {
        let particles = vec![ParticleInit {
            velocity: Vec3::new(4.0, -2.0, 1.0),
            ..Default::default()
        }];
        let mut sys = SystemBuilder::new(1)
            .with_particles(particles)
            .with_config(fixed(integrator))
            .with_force(Force::drag(Target::ALL, 0.8))
            .build()
            .unwrap();

        let mut speed = sys.state().velocity(0).length();
        for tick in 0..300 {
            sys.step(16.0);
            let s = sys.state().velocity(0).length();
            assert!(
                s <= speed,
                "{}: speed grew from {speed} to {s} at tick {tick}",
                integrator.name()
            );
            speed = s;
        }
        assert!(speed < 4.0 * 0.5, "{}: drag barely acted", integrator.name());
    }
}

#[test]
fn test_integration_preserves_non_kinematic_fields() {
    for integrator in [
        Integrator::Euler,
        Integrator::Midpoint,
        Integrator::SymplecticEuler,
        Integrator::OldGood,
    ] {
        let init = ParticleInit {
            velocity: Vec3::new(1.0, 1.0, 0.0),
            mass: 3.0,
            diameter: 7.0,
            render_mode: 2,
            age: 55.0,
            ..Default::default()
        };
        let mut sys = SystemBuilder::new(1)
            .with_particles(vec![init])
            .with_config(fixed(integrator))
            .with_force(Force::earth_gravity(Target::ALL, 9.832))
            .build()
            .unwrap();
        for _ in 0..10 {
            sys.step(16.0);
        }
        let s = sys.state();
        assert_eq!(s.mass(0), 3.0, "{}", integrator.name());
        assert_eq!(s.diameter(0), 7.0, "{}", integrator.name());
        assert_eq!(s.render_mode(0), 2, "{}", integrator.name());
        assert_eq!(s.age(0), 55.0, "{}", integrator.name());
        assert_eq!(s.color(0), init.color, "{}", integrator.name());
        assert_eq!(s.position4(0).w, 1.0, "{}", integrator.name());
    }
}

#[test]
fn test_midpoint_beats_euler_on_a_spring() {
    use partsim_core::forces::Spring;

    let run = |integrator| {
        let particles = vec![
            ParticleInit::default(),
            ParticleInit {
                position: Vec3::new(1.5, 0.0, 0.0),
                ..Default::default()
            },
        ];
        let spring = Spring {
            stiffness: 20.0,
            damping: 0.0,
            rest_length: 1.0,
        };
        let mut sys = SystemBuilder::new(2)
            .with_particles(particles)
            .with_config(fixed(integrator))
            .with_force(Force::spring(0, 1, spring))
            .build()
            .unwrap();
        for _ in 0..600 {
            sys.step(16.0);
        }
        let s = sys.state();
        let stretch = (s.position(1) - s.position(0)).length() - 1.0;
        let rel_v = s.velocity(1) - s.velocity(0);
        // Energy of the relative oscillator; starts at k * 0.5^2 / 2.
        0.5 * 20.0 * stretch * stretch + 0.25 * rel_v.length_squared()
    };

    let start = 0.5 * 20.0 * 0.25;
    let euler = run(Integrator::Euler);
    let midpoint = run(Integrator::Midpoint);
    assert!(euler > start, "explicit Euler should gain energy, got {euler}");
    assert!(
        (midpoint - start).abs() < (euler - start).abs(),
        "midpoint drift {midpoint} vs euler drift {euler}"
    );
}
