use std::f64::consts::PI;

use approx::assert_relative_eq;
use nalgebra::{Point2, Vector2};
use rand::SeedableRng;
use rand_chacha::ChaChaRng;

use crate::config::{CollisionMode, DragRelease, GravityMode, QuadTreeConfig, SimulationConfig};
use crate::error::SimError;
use crate::particle::{ParticleId, ParticleState};
use crate::scenario::{populate_uniform, ScenarioParams};
use crate::simulation::Simulation;

/// Gravity too weak to matter over a few ticks
fn ballistic_config() -> SimulationConfig {
    SimulationConfig {
        gravitational_constant: 1e-12,
        ..Default::default()
    }
}

fn make_sim(config: SimulationConfig) -> Simulation {
    Simulation::new(config).unwrap()
}

#[test]
fn test_new_simulation() {
    let sim = make_sim(SimulationConfig::default());

    assert_eq!(sim.particle_count(), 0);
    assert_eq!(sim.time(), 0.0);
    assert_eq!(sim.ticks(), 0);
    assert_eq!(sim.total_mass(), 0.0);
}

#[test]
fn test_new_rejects_invalid_config() {
    let config = SimulationConfig {
        timestep: -1.0,
        ..Default::default()
    };
    assert!(matches!(Simulation::new(config), Err(SimError::InvalidConfig(_))));
}

#[test]
fn test_spawn_particle() {
    let mut sim = make_sim(SimulationConfig::default());

    let id1 = sim.spawn_particle(1.0, 2.0, 3.0, 4.0, 25.0 * PI, 1.0).unwrap();
    let id2 = sim.spawn_particle(-1.0, 0.0, 0.0, 0.0, 1.0, 1.0).unwrap();

    assert_eq!(id1, ParticleId(0));
    assert_eq!(id2, ParticleId(1));
    assert_eq!(sim.particle_count(), 2);
    assert_eq!(sim.position(id1), Some(Point2::new(1.0, 2.0)));
    assert_eq!(sim.velocity(id1), Some(Vector2::new(3.0, 4.0)));
    assert_eq!(sim.density(id1), Some(1.0));
    assert_relative_eq!(sim.radius(id1).unwrap(), 5.0, epsilon = 1e-12);
    assert_eq!(sim.particle(id1).unwrap().acceleration, Vector2::zeros());
}

#[test]
fn test_spawn_rejects_invalid_values() {
    let mut sim = make_sim(SimulationConfig::default());

    let cases = [
        ((0.0, 0.0, 0.0, 0.0, 0.0, 1.0), "mass"),
        ((0.0, 0.0, 0.0, 0.0, -1.0, 1.0), "mass"),
        ((0.0, 0.0, 0.0, 0.0, f64::NAN, 1.0), "mass"),
        ((0.0, 0.0, 0.0, 0.0, f64::INFINITY, 1.0), "mass"),
        ((0.0, 0.0, 0.0, 0.0, 1.0, 0.0), "density"),
        ((0.0, 0.0, 0.0, 0.0, 1.0, -3.0), "density"),
        ((f64::NAN, 0.0, 0.0, 0.0, 1.0, 1.0), "x"),
        ((0.0, 0.0, 0.0, f64::INFINITY, 1.0, 1.0), "vy"),
    ];

    for ((x, y, vx, vy, mass, density), expected) in cases {
        match sim.spawn_particle(x, y, vx, vy, mass, density) {
            Err(SimError::InvalidParticle { field, .. }) => assert_eq!(field, expected),
            other => panic!("expected InvalidParticle for {expected}, got {other:?}"),
        }
    }
    assert_eq!(sim.particle_count(), 0);
}

#[test]
fn test_particle_limit() {
    let mut sim = make_sim(SimulationConfig {
        max_particles: 2,
        ..Default::default()
    });

    sim.spawn_particle(0.0, 0.0, 0.0, 0.0, 1.0, 1.0).unwrap();
    sim.spawn_particle(10.0, 0.0, 0.0, 0.0, 1.0, 1.0).unwrap();
    let err = sim.spawn_particle(20.0, 0.0, 0.0, 0.0, 1.0, 1.0).unwrap_err();

    assert_eq!(err, SimError::ParticleLimit { limit: 2 });
    assert_eq!(sim.particle_count(), 2);
}

#[test]
fn test_kill_particle() {
    let mut sim = make_sim(SimulationConfig::default());
    let id = sim.spawn_particle(0.0, 0.0, 0.0, 0.0, 1.0, 1.0).unwrap();

    assert!(sim.kill_particle(id));
    assert!(!sim.is_alive(id));
    assert_eq!(sim.particle_count(), 0);

    assert!(!sim.kill_particle(id));
    assert!(!sim.kill_particle(ParticleId(999)));
}

#[test]
fn test_lookup_by_id_survives_removals() {
    let mut sim = make_sim(ballistic_config());
    let ids: Vec<ParticleId> = (0..5)
        .map(|i| {
            let x = -400.0 + 200.0 * i as f64;
            sim.spawn_particle(x, 0.0, 0.0, 0.0, 1.0 + i as f64, 1.0).unwrap()
        })
        .collect();

    assert!(sim.kill_particle(ids[1]));
    for (i, &id) in ids.iter().enumerate().filter(|&(i, _)| i != 1) {
        assert_eq!(sim.mass(id), Some(1.0 + i as f64));
        assert_eq!(sim.position(id), Some(Point2::new(-400.0 + 200.0 * i as f64, 0.0)));
    }

    // Overlaps ids[0], which is lighter and gets absorbed
    let bullet = sim.spawn_particle(-399.0, 0.0, 0.0, 0.0, 10.0, 1.0).unwrap();
    let report = sim.step_simulation(0.01);
    assert_eq!(report.removed, vec![ids[0]]);

    assert!(!sim.is_alive(ids[0]));
    assert_eq!(sim.mass(bullet), Some(11.0));
    assert_eq!(sim.mass(ids[3]), Some(4.0));
    assert_eq!(sim.mass(ids[4]), Some(5.0));
    assert!(sim.set_frozen(ids[4], true).is_ok());
    assert!(sim.particle(ids[4]).unwrap().frozen);
}

#[test]
fn test_ids_are_not_reused() {
    let mut sim = make_sim(SimulationConfig::default());
    let first = sim.spawn_particle(0.0, 0.0, 0.0, 0.0, 1.0, 1.0).unwrap();
    sim.kill_particle(first);

    let second = sim.spawn_particle(0.0, 0.0, 0.0, 0.0, 1.0, 1.0).unwrap();
    assert_ne!(first, second);
}

#[test]
fn test_query_particle_at() {
    let mut sim = make_sim(SimulationConfig::default());
    // Radius 5 each, overlapping around x = 4
    let a = sim.spawn_particle(0.0, 0.0, 0.0, 0.0, 25.0 * PI, 1.0).unwrap();
    let b = sim.spawn_particle(8.0, 0.0, 0.0, 0.0, 25.0 * PI, 1.0).unwrap();

    assert_eq!(sim.query_particle_at(Point2::new(-3.0, 0.0)), Some(a));
    assert_eq!(sim.query_particle_at(Point2::new(12.0, 0.0)), Some(b));
    assert_eq!(sim.query_particle_at(Point2::new(4.0, 0.0)), Some(a));
    assert_eq!(sim.query_particle_at(Point2::new(0.0, 20.0)), None);
}

#[test]
fn test_lone_particle_feels_no_self_force() {
    let mut sim = make_sim(SimulationConfig::default());
    let id = sim.spawn_particle(123.0, -45.0, 0.0, 0.0, 1.0, 1.0).unwrap();

    for _ in 0..10 {
        sim.step_simulation(0.01);
    }

    assert_eq!(sim.position(id), Some(Point2::new(123.0, -45.0)));
    assert_eq!(sim.velocity(id), Some(Vector2::zeros()));
}

#[test]
fn test_step_advances_time_and_ignores_bad_dt() {
    let mut sim = make_sim(SimulationConfig::default());
    sim.spawn_particle(0.0, 0.0, 1.0, 0.0, 1.0, 1.0).unwrap();

    sim.step_simulation(0.5);
    assert_eq!(sim.time(), 0.5);
    assert_eq!(sim.ticks(), 1);

    for dt in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        assert_eq!(sim.step_simulation(dt), Default::default());
    }
    assert_eq!(sim.time(), 0.5);
    assert_eq!(sim.ticks(), 1);
}

#[test]
fn test_wall_reflection() {
    let mut sim = make_sim(SimulationConfig::default());
    let h = sim.config().world_half_extent;
    let id = sim.spawn_particle(0.0, 0.0, 10.0, 0.0, 1.0, 1.0).unwrap();
    let r = sim.radius(id).unwrap();
    sim.kill_particle(id);

    let id = sim.spawn_particle(h - r, 0.0, 10.0, 0.0, 1.0, 1.0).unwrap();
    let report = sim.step_simulation(0.01);

    assert_eq!(report.wall_hits, 1);
    assert_eq!(sim.velocity(id).unwrap().x, -10.0);
    assert_eq!(sim.position(id).unwrap().x, h - r);
}

#[test]
fn test_two_body_attraction() {
    let mut sim = make_sim(SimulationConfig::default());
    let a = sim.spawn_particle(-100.0, 0.0, 0.0, 0.0, 1000.0, 1.0).unwrap();
    let b = sim.spawn_particle(100.0, 0.0, 0.0, 0.0, 1000.0, 1.0).unwrap();

    for _ in 0..5 {
        sim.step_simulation(0.01);
    }

    assert!(sim.velocity(a).unwrap().x > 0.0);
    assert!(sim.velocity(b).unwrap().x < 0.0);
    let momentum = sim.total_momentum();
    assert!(momentum.magnitude() < 1e-9, "momentum {momentum:?}");
}

#[test]
fn test_merge_conserves_mass_and_momentum() {
    let mut sim = make_sim(ballistic_config());
    let heavy = sim.spawn_particle(-10.0, 0.0, 5.0, 0.0, 10.0, 1.0).unwrap();
    let light = sim.spawn_particle(10.0, 0.0, -5.0, 0.0, 5.0, 1.0).unwrap();
    let momentum = sim.total_momentum();

    let report = sim.step_simulation(1.0);

    assert_eq!(report.merges, 1);
    assert_eq!(report.removed, vec![light]);
    assert_eq!(sim.particle_count(), 1);
    assert!(sim.is_alive(heavy));
    assert!(!sim.is_alive(light));
    assert_relative_eq!(sim.mass(heavy).unwrap(), 15.0);
    assert_relative_eq!(sim.total_momentum().x, momentum.x, epsilon = 1e-9);
    assert_relative_eq!(sim.velocity(heavy).unwrap().x, 25.0 / 15.0, epsilon = 1e-9);
    // Survivor stays where it was after the drift
    assert_relative_eq!(sim.position(heavy).unwrap().x, -5.0, epsilon = 1e-9);
}

#[test]
fn test_equal_mass_merge_keeps_lower_id() {
    let mut sim = make_sim(ballistic_config());
    let first = sim.spawn_particle(-10.0, 0.0, 5.0, 0.0, 8.0, 1.0).unwrap();
    let second = sim.spawn_particle(10.0, 0.0, -5.0, 0.0, 8.0, 1.0).unwrap();

    sim.step_simulation(1.0);

    assert!(sim.is_alive(first));
    assert!(!sim.is_alive(second));
    assert_relative_eq!(sim.velocity(first).unwrap().x, 0.0, epsilon = 1e-9);
}

#[test]
fn test_merge_grows_radius_from_combined_density() {
    let mut sim = make_sim(ballistic_config());
    let a = sim.spawn_particle(0.0, 0.0, 0.0, 0.0, 100.0 * PI, 1.0).unwrap();
    sim.spawn_particle(12.0, 0.0, 0.0, 0.0, 25.0 * PI, 1.0).unwrap();

    // Radii 10 and 5 overlap at distance 12
    let report = sim.step_simulation(0.01);

    assert_eq!(report.merges, 1);
    assert_relative_eq!(sim.density(a).unwrap(), 1.0, epsilon = 1e-9);
    assert_relative_eq!(sim.radius(a).unwrap(), 125.0f64.sqrt(), epsilon = 1e-9);
}

#[test]
fn test_bounce_mode_reverses_head_on_pair() {
    let mut sim = make_sim(SimulationConfig {
        collision_mode: CollisionMode::Bounce,
        ..ballistic_config()
    });
    let a = sim.spawn_particle(-10.0, 0.0, 5.0, 0.0, 25.0 * PI, 1.0).unwrap();
    let b = sim.spawn_particle(10.0, 0.0, -5.0, 0.0, 25.0 * PI, 1.0).unwrap();
    let energy = sim.kinetic_energy();

    let report = sim.step_simulation(1.0);

    assert_eq!(report.bounces, 1);
    assert_eq!(report.merges, 0);
    assert_eq!(sim.particle_count(), 2);
    assert_relative_eq!(sim.velocity(a).unwrap().x, -5.0, epsilon = 1e-6);
    assert_relative_eq!(sim.velocity(b).unwrap().x, 5.0, epsilon = 1e-6);
    assert_relative_eq!(sim.kinetic_energy(), energy, epsilon = 1e-6);
}

#[test]
fn test_frozen_particle_attracts_but_stays() {
    let mut sim = make_sim(SimulationConfig::default());
    let anchor = sim.spawn_particle(0.0, 0.0, 0.0, 0.0, 1000.0, 1.0).unwrap();
    let orbiter = sim.spawn_particle(100.0, 0.0, 0.0, 0.0, 1.0, 1.0).unwrap();
    sim.set_frozen(anchor, true).unwrap();

    for _ in 0..10 {
        sim.step_simulation(0.01);
    }

    assert_eq!(sim.position(anchor), Some(Point2::new(0.0, 0.0)));
    assert_eq!(sim.velocity(anchor), Some(Vector2::zeros()));
    assert!(sim.velocity(orbiter).unwrap().x < 0.0);

    sim.set_frozen(anchor, false).unwrap();
    sim.step_simulation(0.01);
    assert!(sim.velocity(anchor).unwrap().x > 0.0);
    sim.step_simulation(0.01);
    assert!(sim.position(anchor).unwrap().x > 0.0);
}

#[test]
fn test_frozen_particle_can_be_hit() {
    let mut sim = make_sim(ballistic_config());
    let anchor = sim.spawn_particle(0.0, 0.0, 0.0, 0.0, 100.0, 1.0).unwrap();
    let bullet = sim.spawn_particle(20.0, 0.0, -50.0, 0.0, 1.0, 1.0).unwrap();
    sim.set_frozen(anchor, true).unwrap();

    // Contact falls inside the look-ahead of the first tick
    let report = sim.step_simulation(0.2);

    assert_eq!(report.merges, 1);
    assert!(sim.is_alive(anchor));
    assert!(!sim.is_alive(bullet));
    assert!(sim.particle(anchor).unwrap().frozen);
    assert_relative_eq!(sim.mass(anchor).unwrap(), 101.0);
}

#[test]
fn test_frozen_particle_with_leftover_velocity_does_not_reach_out() {
    let mut sim = make_sim(ballistic_config());
    let anchor = sim.spawn_particle(0.0, 0.0, 50.0, 0.0, 100.0, 1.0).unwrap();
    let target = sim.spawn_particle(30.0, 0.0, 0.0, 0.0, 1.0, 1.0).unwrap();
    sim.set_frozen(anchor, true).unwrap();

    // 50 * 0.5 would cover the gap if the anchor's velocity counted
    let report = sim.step_simulation(0.5);

    assert_eq!(report.merges, 0);
    assert!(sim.is_alive(target));
    assert_eq!(sim.position(anchor), Some(Point2::new(0.0, 0.0)));
    assert_relative_eq!(sim.position(target).unwrap().x, 30.0, epsilon = 1e-6);
}

#[test]
fn test_set_frozen_unknown_particle() {
    let mut sim = make_sim(SimulationConfig::default());
    assert_eq!(
        sim.set_frozen(ParticleId(3), true),
        Err(SimError::UnknownParticle(ParticleId(3)))
    );
}

#[test]
fn test_drag_moves_particle_and_releases_cursor_velocity() {
    let mut sim = make_sim(SimulationConfig::default());
    let held = sim.spawn_particle(0.0, 0.0, 0.0, 0.0, 1000.0, 1.0).unwrap();
    let other = sim.spawn_particle(100.0, 0.0, 0.0, 0.0, 1.0, 1.0).unwrap();

    sim.begin_drag(held).unwrap();
    assert_eq!(sim.particle(held).unwrap().state, ParticleState::Dragged);
    sim.drag_to(held, Point2::new(10.0, 0.0), 0.1).unwrap();
    assert_eq!(sim.position(held), Some(Point2::new(10.0, 0.0)));

    sim.step_simulation(0.01);

    // Not integrated while held, but still a gravity source
    assert_eq!(sim.position(held), Some(Point2::new(10.0, 0.0)));
    assert!(sim.velocity(other).unwrap().x < 0.0);

    sim.end_drag(held).unwrap();
    let particle = sim.particle(held).unwrap();
    assert_eq!(particle.state, ParticleState::Free);
    assert_relative_eq!(particle.velocity.x, 100.0, epsilon = 1e-9);
    assert_eq!(particle.acceleration, Vector2::zeros());
}

#[test]
fn test_drag_release_fixed_speed() {
    let mut sim = make_sim(SimulationConfig {
        drag_release: DragRelease::FixedSpeed(5.0),
        ..Default::default()
    });
    let id = sim.spawn_particle(0.0, 0.0, 0.0, 0.0, 1.0, 1.0).unwrap();
    let still = sim.spawn_particle(500.0, 0.0, 0.0, 0.0, 1.0, 1.0).unwrap();

    sim.begin_drag(id).unwrap();
    sim.drag_to(id, Point2::new(30.0, 40.0), 0.5).unwrap();
    sim.end_drag(id).unwrap();

    let v = sim.velocity(id).unwrap();
    assert_relative_eq!(v.x, 3.0, epsilon = 1e-12);
    assert_relative_eq!(v.y, 4.0, epsilon = 1e-12);

    // A release without motion stays at rest
    sim.begin_drag(still).unwrap();
    sim.end_drag(still).unwrap();
    assert_eq!(sim.velocity(still), Some(Vector2::zeros()));
}

#[test]
fn test_dragged_particle_does_not_merge() {
    let mut sim = make_sim(ballistic_config());
    let held = sim.spawn_particle(0.0, 0.0, 0.0, 0.0, 100.0, 1.0).unwrap();
    let other = sim.spawn_particle(2.0, 0.0, 0.0, 0.0, 1.0, 1.0).unwrap();

    sim.begin_drag(held).unwrap();
    let report = sim.step_simulation(0.01);

    assert_eq!(report.merges, 0);
    assert!(sim.is_alive(held) && sim.is_alive(other));
}

#[test]
fn test_drag_requires_begin() {
    let mut sim = make_sim(SimulationConfig::default());
    let id = sim.spawn_particle(0.0, 0.0, 0.0, 0.0, 1.0, 1.0).unwrap();

    assert!(sim.drag_to(id, Point2::new(1.0, 1.0), 0.1).is_err());
    assert!(sim.begin_drag(ParticleId(77)).is_err());
}

#[test]
fn test_preview_is_inert_until_committed() {
    let mut sim = make_sim(SimulationConfig::default());
    let probe = sim.spawn_particle(100.0, 0.0, 0.0, 0.0, 1.0, 1.0).unwrap();
    let preview = sim.spawn_preview(0.0, 0.0, 0.0, 0.0, 1e6, 1.0).unwrap();

    assert_eq!(sim.query_particle_at(Point2::new(0.0, 0.0)), None);
    assert_eq!(sim.total_mass(), 1.0);

    sim.step_simulation(0.01);
    assert_eq!(sim.velocity(probe), Some(Vector2::zeros()));
    assert_eq!(sim.tree_stats().inserted, 1);

    sim.update_preview(preview, 0.0, 0.0, 0.0, 0.0, 5e5, 1.0).unwrap();
    assert!(sim.update_preview(preview, 0.0, 0.0, 0.0, 0.0, -1.0, 1.0).is_err());
    sim.commit_preview(preview).unwrap();

    assert_eq!(sim.query_particle_at(Point2::new(0.0, 0.0)), Some(preview));
    sim.step_simulation(0.01);
    assert!(sim.velocity(probe).unwrap().x < 0.0);
}

#[test]
fn test_preview_cancelled_by_kill() {
    let mut sim = make_sim(SimulationConfig::default());
    let preview = sim.spawn_preview(0.0, 0.0, 0.0, 0.0, 1.0, 1.0).unwrap();

    assert!(sim.kill_particle(preview));
    assert_eq!(sim.commit_preview(preview), Err(SimError::UnknownParticle(preview)));
}

#[test]
fn test_advance_runs_fixed_ticks() {
    let mut sim = make_sim(SimulationConfig {
        timestep: 0.01,
        ..Default::default()
    });
    let id = sim.spawn_particle(0.0, 0.0, 10.0, 0.0, 1.0, 1.0).unwrap();

    let frame = sim.advance(0.025);

    assert_eq!(frame.ticks, 2);
    assert_eq!(frame.dropped_time, 0.0);
    assert_relative_eq!(sim.interpolation_alpha(), 0.5, epsilon = 1e-9);
    assert_relative_eq!(sim.position(id).unwrap().x, 0.2, epsilon = 1e-12);
    assert_relative_eq!(sim.render_position(id).unwrap().x, 0.15, epsilon = 1e-9);

    // Carried remainder completes the next tick
    assert_eq!(sim.advance(0.006).ticks, 1);
}

#[test]
fn test_advance_caps_catch_up() {
    let mut sim = make_sim(SimulationConfig {
        timestep: 0.01,
        max_catch_up_ticks: 3,
        ..Default::default()
    });

    let frame = sim.advance(1.0);

    assert_eq!(frame.ticks, 3);
    assert!(frame.dropped_time > 0.9);
    assert!((0.0..=1.0).contains(&sim.interpolation_alpha()));
    assert_eq!(sim.ticks(), 3);
    assert_eq!(sim.advance(-1.0).ticks, 0);
}

#[test]
fn test_mass_is_conserved_over_a_random_run() {
    let mut sim = make_sim(SimulationConfig {
        world_half_extent: 200.0,
        ..Default::default()
    });
    let mut rng = ChaChaRng::seed_from_u64(11);
    let params = ScenarioParams {
        max_density: 1,
        ..Default::default()
    };
    populate_uniform(&mut sim, 300, &params, &mut rng).unwrap();
    let initial_mass = sim.total_mass();
    let initial_count = sim.particle_count();

    let mut merges = 0;
    let mut removed = 0;
    for _ in 0..50 {
        let report = sim.step_simulation(0.01);
        merges += report.merges;
        removed += report.removed.len();

        for p in sim.particles() {
            assert!(p.position.x.abs() <= 200.0 && p.position.y.abs() <= 200.0);
        }
    }

    assert!(merges > 0);
    assert_eq!(merges, removed);
    assert_eq!(sim.particle_count(), initial_count - removed);
    assert_relative_eq!(sim.total_mass(), initial_mass, max_relative = 1e-12);
}

#[test]
fn test_parallel_matches_sequential() {
    let run = |parallel: bool| {
        let mut sim = make_sim(SimulationConfig {
            world_half_extent: 300.0,
            parallel,
            ..Default::default()
        });
        let mut rng = ChaChaRng::seed_from_u64(5);
        populate_uniform(&mut sim, 200, &ScenarioParams::default(), &mut rng).unwrap();
        for _ in 0..20 {
            sim.step_simulation(0.01);
        }
        sim.particles()
            .map(|p| (p.id, p.position, p.velocity))
            .collect::<Vec<_>>()
    };

    assert_eq!(run(false), run(true));
}

#[test]
fn test_direct_gravity_matches_exact_tree() {
    let run = |config: SimulationConfig| {
        let mut sim = make_sim(config);
        // Power-of-two masses keep leaf centers of mass exact
        sim.spawn_particle(-50.0, 0.0, 0.0, 1.0, 128.0, 1.0).unwrap();
        sim.spawn_particle(50.0, 10.0, 0.0, -1.0, 32.0, 1.0).unwrap();
        sim.spawn_particle(0.0, 80.0, 2.0, 0.0, 64.0, 1.0).unwrap();
        for _ in 0..10 {
            sim.step_simulation(0.01);
        }
        sim.particles().map(|p| p.velocity).collect::<Vec<_>>()
    };

    let direct = run(SimulationConfig {
        gravity: GravityMode::Direct,
        ..Default::default()
    });
    let tree = run(SimulationConfig {
        theta: 0.0,
        quadtree: QuadTreeConfig {
            max_depth: 12,
            leaf_capacity: 1,
            max_nodes: 4096,
        },
        ..Default::default()
    });

    for (d, t) in direct.iter().zip(&tree) {
        assert_relative_eq!(d.x, t.x, epsilon = 1e-9);
        assert_relative_eq!(d.y, t.y, epsilon = 1e-9);
    }
}

#[test]
fn test_indices_are_rebuilt_each_tick() {
    let mut sim = make_sim(SimulationConfig::default());
    for i in 0..10 {
        sim.spawn_particle(i as f64 * 30.0, 0.0, 0.0, 0.0, 1.0, 1.0).unwrap();
    }

    sim.step_simulation(0.01);

    assert_eq!(sim.tree_stats().inserted, 10);
    assert_eq!(sim.grid().len(), 10);
    assert_relative_eq!(sim.tree().root_mass(), 10.0);
}
