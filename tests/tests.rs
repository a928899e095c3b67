use orbsim::error::SimError;
use orbsim::simulation::driver::Simulation;
use orbsim::simulation::forces::{
    ConservativeSet, ForceLaw, ForceSet, HarmonicSpring, NewtonianGravity, UniformField,
};
use orbsim::simulation::integrator::{
    euler_step, euler_step_r, verlet_step_r, EulerIntegrator, FrameState, Integrator,
    VerletIntegrator, VerletPhase,
};
use orbsim::simulation::pairs::{
    above, below, force_pairs, force_pairs_of, left, rectangular_mesh, right, ring_strand,
    ring_with_center, single_strand,
};
use orbsim::simulation::states::{Body, ForcePair, NVec3};
use orbsim::simulation::vector::unit;

/// Two bodies at rest, separated along the x-axis around the origin
pub fn two_body_line(dist: f64, m1: f64, m2: f64) -> Vec<Body> {
    vec![
        Body::at_rest(m1, NVec3::new(-dist / 2.0, 0.0, 0.0)),
        Body::at_rest(m2, NVec3::new(dist / 2.0, 0.0, 0.0)),
    ]
}

fn pairs(list: &[(usize, usize)]) -> Vec<ForcePair> {
    list.iter().copied().map(ForcePair::from).collect()
}

fn positions(bodies: &[Body]) -> Vec<NVec3> {
    bodies.iter().map(|b| b.x).collect()
}

fn masses(bodies: &[Body]) -> Vec<f64> {
    bodies.iter().map(|b| b.m).collect()
}

/// Forces of a conservative set on `bodies`
pub fn forces_on(set: &ConservativeSet, bodies: &[Body]) -> Vec<NVec3> {
    let mut out = vec![NVec3::zeros(); bodies.len()];
    set.accumulate_forces(&positions(bodies), &masses(bodies), &mut out)
        .expect("force evaluation failed");
    out
}

fn assert_vec_close(actual: NVec3, expected: NVec3, tol: f64) {
    assert!(
        (actual - expected).norm() < tol,
        "expected {:?}, got {:?}",
        expected,
        actual
    );
}

// ==================================================================================
// Pair topologies
// ==================================================================================

#[test]
fn force_pairs_canonical_order() {
    let expected = pairs(&[
        (0, 1), (0, 2), (0, 3), (0, 4),
        (1, 2), (1, 3), (1, 4),
        (2, 3), (2, 4),
        (3, 4),
    ]);
    assert_eq!(force_pairs(5), expected);

    let expected = pairs(&[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
    assert_eq!(force_pairs(4), expected);

    assert!(force_pairs(1).is_empty());
    assert!(force_pairs(0).is_empty());
}

#[test]
fn force_pairs_over_index_list() {
    let expected = pairs(&[
        (0, 3), (0, 2), (0, 6), (0, 7),
        (3, 2), (3, 6), (3, 7),
        (2, 6), (2, 7),
        (6, 7),
    ]);
    assert_eq!(force_pairs_of(&[0, 3, 2, 6, 7]), expected);
}

#[test]
fn strands_and_rings() {
    assert_eq!(single_strand(4), pairs(&[(0, 1), (1, 2), (2, 3)]));
    assert_eq!(ring_strand(4), pairs(&[(0, 1), (1, 2), (2, 3), (3, 0)]));
    // two bodies: the closing link would duplicate (0, 1)
    assert_eq!(ring_strand(2), pairs(&[(0, 1)]));
    assert_eq!(
        ring_with_center(5),
        pairs(&[(0, 1), (1, 2), (2, 3), (3, 0), (4, 0), (4, 1), (4, 2), (4, 3)])
    );
}

#[test]
fn mesh_neighbours() {
    let indices = [0, 2, 4, 10, 12];
    let (w, len) = (3, 13);

    let up: Vec<_> = indices.iter().map(|&i| above(i, w)).collect();
    let down: Vec<_> = indices.iter().map(|&i| below(i, w, len)).collect();
    let east: Vec<_> = indices.iter().map(|&i| right(i, w, len)).collect();
    let west: Vec<_> = indices.iter().map(|&i| left(i, w)).collect();

    assert_eq!(up, vec![None, None, Some(1), Some(7), Some(9)]);
    assert_eq!(down, vec![Some(3), Some(5), Some(7), None, None]);
    assert_eq!(east, vec![Some(1), None, Some(5), Some(11), None]);
    assert_eq!(west, vec![None, Some(1), Some(3), Some(9), None]);
}

#[test]
fn rectangular_mesh_links_each_neighbour_once() {
    assert_eq!(rectangular_mesh(2, 2, 0), pairs(&[(0, 2), (0, 1), (1, 3), (2, 3)]));

    // 3x3 grid: 6 horizontal + 6 vertical links
    let mesh = rectangular_mesh(3, 3, 0);
    assert_eq!(mesh.len(), 12);
    for (k, p) in mesh.iter().enumerate() {
        let reversed = ForcePair::new(p.j, p.i);
        assert!(!mesh[k + 1..].contains(p) && !mesh.contains(&reversed), "duplicate link {:?}", p);
    }
}

#[test]
fn pair_check_rejects_bad_indices() {
    assert_eq!(ForcePair::new(1, 1).check(3), Err(SimError::SelfPair(1)));
    assert_eq!(
        ForcePair::new(0, 3).check(3),
        Err(SimError::PairOutOfBounds { i: 0, j: 3, n: 3 })
    );
    assert!(ForcePair::new(0, 2).check(3).is_ok());
}

#[test]
fn unit_of_zero_vector_fails() {
    assert_eq!(unit(&NVec3::zeros()), Err(SimError::ZeroLengthVector));
    assert_vec_close(unit(&NVec3::new(0.0, 3.0, 4.0)).unwrap(), NVec3::new(0.0, 0.6, 0.8), 1e-15);
}

// ==================================================================================
// Gravity tests
// ==================================================================================

#[test]
fn gravity_newton_third_law() {
    let bodies = vec![
        Body::at_rest(2.0, NVec3::new(0.3, -1.0, 0.5)),
        Body::at_rest(3.0, NVec3::new(-0.7, 0.2, 1.1)),
        Body::at_rest(0.5, NVec3::new(1.5, 1.0, -0.4)),
    ];
    let set = ConservativeSet::new().with(NewtonianGravity::new(0.1, 3));
    let f = forces_on(&set, &bodies);

    let net: NVec3 = f.iter().sum();
    assert!(net.norm() < 1e-12, "Net force not zero: {:?}", net);
}

#[test]
fn gravity_points_toward_other_body() {
    let bodies = two_body_line(2.0, 1.0, 1.0);
    let set = ConservativeSet::new().with(NewtonianGravity::new(1.0, 2));
    let f = forces_on(&set, &bodies);

    let dx = bodies[1].x - bodies[0].x;
    assert!(f[0].dot(&dx) > 0.0, "Force is not toward second body");
    assert!(f[1].dot(&dx) < 0.0, "Reaction is not toward first body");
}

#[test]
fn gravity_magnitude_and_inverse_square() {
    let g = 0.1;
    let set = ConservativeSet::new().with(NewtonianGravity::new(g, 2));

    let f_r = forces_on(&set, &two_body_line(1.0, 2.0, 3.0));
    let f_2r = forces_on(&set, &two_body_line(2.0, 2.0, 3.0));

    assert_vec_close(f_r[0], NVec3::new(g * 6.0, 0.0, 0.0), 1e-12);
    let ratio = f_r[0].norm() / f_2r[0].norm();
    assert!((ratio - 4.0).abs() < 1e-9, "Expected 4x, got {}", ratio);
}

#[test]
fn gravity_coincident_bodies_is_an_error() {
    let bodies = vec![Body::at_rest(1.0, NVec3::zeros()), Body::at_rest(1.0, NVec3::zeros())];
    let set = ConservativeSet::new().with(NewtonianGravity::new(1.0, 2));
    let mut out = vec![NVec3::zeros(); 2];

    let err = set
        .accumulate_forces(&positions(&bodies), &masses(&bodies), &mut out)
        .unwrap_err();
    assert_eq!(err, SimError::CoincidentBodies { i: 0, j: 1 });
}

#[test]
fn gravity_on_subset_of_pairs() {
    let bodies = vec![
        Body::at_rest(1.0, NVec3::new(0.0, 0.0, 0.0)),
        Body::at_rest(1.0, NVec3::new(1.0, 0.0, 0.0)),
        Body::at_rest(1.0, NVec3::new(0.0, 1.0, 0.0)),
    ];
    let set = ConservativeSet::new().with(NewtonianGravity::with_pairs(1.0, pairs(&[(0, 1)])));
    let f = forces_on(&set, &bodies);

    assert_eq!(f[2], NVec3::zeros());
    assert_vec_close(f[0], NVec3::new(1.0, 0.0, 0.0), 1e-12);
}

#[test]
fn accumulate_overwrites_stale_buffer() {
    let bodies = two_body_line(1.0, 1.0, 1.0);
    let set = ConservativeSet::new().with(NewtonianGravity::new(1.0, 2));
    let mut out = vec![NVec3::new(100.0, 100.0, 100.0); 2];
    set.accumulate_forces(&positions(&bodies), &masses(&bodies), &mut out).unwrap();

    assert_vec_close(out[0], NVec3::new(1.0, 0.0, 0.0), 1e-12);
}

// ==================================================================================
// Spring and field tests
// ==================================================================================

#[test]
fn stretched_spring_pulls_together() {
    let bodies = two_body_line(2.0, 1.0, 1.0);
    let set = ConservativeSet::new().with(HarmonicSpring::new(3.0, 1.0, pairs(&[(0, 1)])));
    let f = forces_on(&set, &bodies);

    assert_vec_close(f[0], NVec3::new(3.0, 0.0, 0.0), 1e-12);
    assert_vec_close(f[1], NVec3::new(-3.0, 0.0, 0.0), 1e-12);
}

#[test]
fn compressed_spring_pushes_apart() {
    let bodies = two_body_line(0.5, 1.0, 1.0);
    let set = ConservativeSet::new().with(HarmonicSpring::new(3.0, 1.0, pairs(&[(0, 1)])));
    let f = forces_on(&set, &bodies);

    assert_vec_close(f[0], NVec3::new(-1.5, 0.0, 0.0), 1e-12);
    assert_vec_close(f[1], NVec3::new(1.5, 0.0, 0.0), 1e-12);
}

#[test]
fn driven_spring_adds_constant_term() {
    let bodies = two_body_line(1.0, 1.0, 1.0);
    let drive = NVec3::new(0.0, 0.0, 0.25);
    let spring = HarmonicSpring::new(3.0, 1.0, pairs(&[(0, 1)])).driven(drive);
    let f = forces_on(&ConservativeSet::new().with(spring), &bodies);

    assert_vec_close(f[0], drive, 1e-12);
    assert_vec_close(f[1], -drive, 1e-12);
}

#[test]
fn damped_spring_opposes_relative_velocity() {
    let x = vec![NVec3::zeros(), NVec3::new(1.0, 0.0, 0.0)];
    let v = vec![NVec3::new(1.0, 0.0, 0.0), NVec3::zeros()];
    let m = vec![1.0, 1.0];
    let damped = HarmonicSpring::new(3.0, 1.0, pairs(&[(0, 1)])).damped(0.5);
    let set = ForceSet::new().with_dissipative(damped);

    let mut out = vec![NVec3::zeros(); 2];
    set.accumulate_forces(&x, &v, &m, &mut out).unwrap();

    assert_vec_close(out[0], NVec3::new(-0.5, 0.0, 0.0), 1e-12);
    assert_vec_close(out[1], NVec3::new(0.5, 0.0, 0.0), 1e-12);
}

#[test]
fn conservative_set_refuses_damping() {
    let damped = HarmonicSpring::new(1.0, 1.0, pairs(&[(0, 1)])).damped(0.1);
    let result = ConservativeSet::new().try_with_law(ForceLaw::DampedSpring(damped.clone()));
    assert_eq!(
        result.err(),
        Some(SimError::VelocityDependentLaw("damped_spring".to_string()))
    );

    // the Euler side accepts it
    let set = ForceSet::new().with_law(ForceLaw::DampedSpring(damped));
    assert_eq!(set.len(), 1);
}

#[test]
fn uniform_field_acts_on_every_body() {
    let bodies = two_body_line(1.0, 1.0, 4.0);
    let field = NVec3::new(0.0, -2.0, 0.0);
    let f = forces_on(&ConservativeSet::new().with(UniformField { force: field }), &bodies);

    assert_eq!(f, vec![field, field]);
}

#[test]
fn spring_pairs_validated_against_body_count() {
    let spring = HarmonicSpring::new(1.0, 1.0, pairs(&[(0, 2)]));
    let result = VerletIntegrator::new(
        &two_body_line(1.0, 1.0, 1.0),
        ConservativeSet::new().with(spring),
        0.01,
    );
    assert_eq!(result.err(), Some(SimError::PairOutOfBounds { i: 0, j: 2, n: 2 }));
}

// ==================================================================================
// Integrator tests
// ==================================================================================

#[test]
fn step_formulas() {
    let r = NVec3::new(1.0, 2.0, 3.0);
    let v = NVec3::new(0.5, 0.0, -1.0);
    let a = NVec3::new(2.0, 4.0, 0.0);
    let dt = 0.1;

    assert_vec_close(euler_step_r(r, v, a, dt), NVec3::new(1.06, 2.02, 2.9), 1e-12);

    let (r1, v1) = euler_step(r, v, a, dt);
    assert_vec_close(v1, NVec3::new(0.7, 0.4, -1.0), 1e-12);
    assert_vec_close(r1, NVec3::new(1.06, 2.02, 2.9), 1e-12);

    let r_prev = NVec3::new(0.9, 2.0, 3.1);
    assert_vec_close(verlet_step_r(r, r_prev, a, dt), NVec3::new(1.12, 2.04, 2.9), 1e-12);
}

#[test]
fn verlet_bootstrap_then_recurrence() {
    let field = NVec3::new(0.0, 0.0, -1.0);
    let x0 = NVec3::new(1.0, 0.0, 0.0);
    let v0 = NVec3::new(0.0, 2.0, 0.0);
    let dt = 0.01;
    let bodies = vec![Body::new(2.0, x0, v0)];
    let set = ConservativeSet::new().with(UniformField { force: field });
    let mut verlet = VerletIntegrator::new(&bodies, set, dt).unwrap();
    let a = field / 2.0;

    assert_eq!(verlet.phase(), VerletPhase::Uninitialized);
    verlet.step().unwrap();
    assert_eq!(verlet.phase(), VerletPhase::Bootstrapped);
    let r1 = verlet.positions()[0];
    assert_vec_close(r1, x0 + v0 * dt + 0.5 * a * dt * dt, 1e-14);

    verlet.step().unwrap();
    assert_eq!(verlet.phase(), VerletPhase::Stepping);
    assert_vec_close(verlet.positions()[0], 2.0 * r1 - x0 + a * dt * dt, 1e-14);

    // constant acceleration is integrated exactly
    for _ in 0..98 {
        verlet.step().unwrap();
    }
    let t = verlet.time();
    assert!((t - 1.0).abs() < 1e-12);
    assert_vec_close(verlet.positions()[0], x0 + v0 * t + 0.5 * a * t * t, 1e-10);
}

#[test]
fn verlet_state_reports_last_acceleration() {
    let bodies = two_body_line(1.0, 1.0, 1.0);
    let set = ConservativeSet::new().with(NewtonianGravity::new(1.0, 2));
    let mut verlet = VerletIntegrator::new(&bodies, set, 1e-3).unwrap();
    verlet.step().unwrap();

    let state = verlet.state();
    assert!(state.velocities().is_none());
    assert_vec_close(state.accelerations()[0], NVec3::new(1.0, 0.0, 0.0), 1e-12);
    assert!((state.time() - 1e-3).abs() < 1e-15);
}

#[test]
fn verlet_estimated_velocities() {
    let v0 = NVec3::new(0.0, 1.0, 0.0);
    let bodies = vec![Body::new(1.0, NVec3::zeros(), v0)];
    let mut verlet = VerletIntegrator::new(&bodies, ConservativeSet::new(), 0.1).unwrap();

    assert_eq!(verlet.estimated_velocities(), vec![v0]);
    verlet.step().unwrap();
    verlet.step().unwrap();
    assert_vec_close(verlet.estimated_velocities()[0], v0, 1e-12);
    assert_vec_close(verlet.bodies()[0].x, 0.2 * v0, 1e-12);
}

#[test]
fn euler_keeps_velocities() {
    let field = NVec3::new(1.0, 0.0, 0.0);
    let bodies = vec![Body::at_rest(1.0, NVec3::zeros())];
    let set = ForceSet::new().with(UniformField { force: field });
    let mut euler = EulerIntegrator::new(&bodies, set, 0.1).unwrap();

    for _ in 0..10 {
        euler.step().unwrap();
    }
    let state = euler.state();
    assert_vec_close(state.v[0], NVec3::new(1.0, 0.0, 0.0), 1e-12);
    assert_vec_close(state.x[0], NVec3::new(0.5, 0.0, 0.0), 1e-12);
    assert_eq!(state.velocities().map(|v| v.len()), Some(1));
}

#[test]
fn euler_accepts_conservative_set() {
    let set = ConservativeSet::new().with(NewtonianGravity::new(1.0, 2));
    let euler = EulerIntegrator::new(&two_body_line(1.0, 1.0, 1.0), set, 0.01);
    assert!(euler.is_ok());
}

#[test]
fn damping_drains_spring_energy() {
    let bodies = vec![
        Body::at_rest(1.0, NVec3::zeros()),
        Body::at_rest(1.0, NVec3::new(1.5, 0.0, 0.0)),
    ];
    let set = ForceSet::new().with_dissipative(HarmonicSpring::new(10.0, 1.0, pairs(&[(0, 1)])).damped(1.0));
    let mut euler = EulerIntegrator::new(&bodies, set, 1e-3).unwrap();
    for _ in 0..20_000 {
        euler.step().unwrap();
    }
    let d = (euler.state().x[1] - euler.state().x[0]).norm();
    assert!((d - 1.0).abs() < 1e-3, "Spring did not settle at rest length, d = {}", d);
}

#[test]
fn integrators_reject_bad_input() {
    let bad_mass = vec![Body::at_rest(0.0, NVec3::zeros())];
    assert_eq!(
        VerletIntegrator::new(&bad_mass, ConservativeSet::new(), 0.1).err(),
        Some(SimError::NonPositiveMass { index: 0, mass: 0.0 })
    );
    let ok = vec![Body::at_rest(1.0, NVec3::zeros())];
    assert!(matches!(
        EulerIntegrator::new(&ok, ForceSet::new(), 0.0),
        Err(SimError::InvalidConfig(_))
    ));
}

#[test]
fn coincident_bodies_abort_the_step() {
    let bodies = vec![Body::at_rest(1.0, NVec3::zeros()), Body::at_rest(1.0, NVec3::zeros())];
    let set = ConservativeSet::new().with(NewtonianGravity::new(1.0, 2));
    let mut verlet = VerletIntegrator::new(&bodies, set, 0.01).unwrap();

    assert_eq!(verlet.step(), Err(SimError::CoincidentBodies { i: 0, j: 1 }));
}

// ==================================================================================
// Frame driver tests
// ==================================================================================

fn falling_body_sim(steps_per_frame: usize, num_frames: usize) -> Simulation<VerletIntegrator> {
    let bodies = vec![Body::new(1.0, NVec3::zeros(), NVec3::new(1.0, 0.0, 0.0))];
    let set = ConservativeSet::new().with(UniformField { force: NVec3::new(0.0, -1.0, 0.0) });
    let verlet = VerletIntegrator::new(&bodies, set, 0.01).unwrap();
    Simulation::new(verlet, steps_per_frame, num_frames).unwrap()
}

#[test]
fn iterate_yields_num_frames_after_first_block() {
    let mut sim = falling_body_sim(3, 5);
    let times = sim.iterate(|state| state.t).unwrap();

    assert_eq!(times.len(), 5);
    let expected = [0.03, 0.06, 0.09, 0.12, 0.15];
    for (t, e) in times.iter().zip(expected) {
        assert!((t - e).abs() < 1e-12, "expected t = {}, got {}", e, t);
    }
    assert_eq!(sim.frame(), 5);
    assert_eq!(sim.integrator().time(), times[4]);
}

#[test]
fn live_stepping_matches_batch() {
    let mut batch = falling_body_sim(4, 6);
    let batch_positions = batch.iterate(|state| state.x.clone()).unwrap();

    let mut live = falling_body_sim(4, 6);
    let mut live_positions = Vec::new();
    for _ in 0..live.num_frames() {
        live.step().unwrap();
        live_positions.push(live.record(|state| state.x.clone()));
    }

    assert_eq!(batch_positions, live_positions);
}

#[test]
fn snapshots_align_with_bodies() {
    let mut sim = falling_body_sim(2, 3);
    let snaps = sim.snapshots().unwrap();

    assert_eq!(snaps.len(), 3);
    assert!(snaps.iter().all(|s| s.bodies.len() == 1 && s.bodies[0].m == 1.0));
    assert!(snaps.iter().all(|s| s.bodies[0].v.is_none()));
    assert_eq!(snaps[2].mass_positions()[0].1, snaps[2].bodies[0].x);
}

#[test]
fn frames_stop_after_error() {
    let bodies = vec![Body::at_rest(1.0, NVec3::zeros()), Body::at_rest(1.0, NVec3::zeros())];
    let set = ConservativeSet::new().with(NewtonianGravity::new(1.0, 2));
    let verlet = VerletIntegrator::new(&bodies, set, 0.01).unwrap();
    let mut sim = Simulation::new(verlet, 2, 10).unwrap();

    let results: Vec<_> = sim.frames(|state| state.t).collect();
    assert_eq!(results.len(), 1);
    assert!(results[0].is_err());
}

#[test]
fn zero_steps_per_frame_is_rejected() {
    let verlet = VerletIntegrator::new(&two_body_line(1.0, 1.0, 1.0), ConservativeSet::new(), 0.1).unwrap();
    assert!(matches!(Simulation::new(verlet, 0, 10), Err(SimError::InvalidConfig(_))));
}
