// tests/guided_growth.rs
use glam::DVec3;
use turtle_flora::{
    GuidanceConfig, GuidedTurtle, Interpreter, MeshBuffer, Skeleton, SkeletonSpec, Turtle,
    TurtlePopulation, TurtleState, parse_symbols,
};

const EPS: f64 = 1e-9;

fn forked_skeleton() -> Skeleton {
    // Root at the origin with two children up and to either side.
    Skeleton::from_spec(&SkeletonSpec::branch(
        DVec3::ZERO,
        vec![
            SkeletonSpec::leaf(DVec3::new(3.0, 0.0, 4.0)),
            SkeletonSpec::leaf(DVec3::new(-3.0, 0.0, 4.0)),
        ],
    ))
}

#[test]
fn test_member_at_fork_branches() {
    let skeleton = forked_skeleton();
    let mut population =
        TurtlePopulation::new(&skeleton, GuidanceConfig::default(), TurtleState::default());

    assert!(population.consider_data());

    let members = population.members();
    assert_eq!(members.len(), 2);

    let root = skeleton.root();
    let mut cursors: Vec<_> = members.iter().map(|m| m.cursor).collect();
    cursors.sort_unstable();
    let mut expected = root.children.clone();
    expected.sort_unstable();
    assert_eq!(cursors, expected, "Each member targets a distinct child");

    for member in members {
        let target = skeleton.node(member.cursor).unwrap().point;
        let heading = (target - member.turtle.position).normalize();
        assert!((member.turtle.direction - heading).length() < EPS);
        assert!(member.turtle.is_orthonormal(EPS));
        // leniency 0.5 of the distance 5 to either child.
        assert!((member.turtle.step_size - 2.5).abs() < EPS);
        assert_eq!(member.initial_step_size, 0.5);
    }
}

#[test]
fn test_distant_member_steers_without_branching() {
    let mut skeleton = Skeleton::new(DVec3::new(0.0, 8.0, 0.0));
    skeleton.add_child(Skeleton::ROOT, DVec3::new(0.0, 9.0, 0.0));
    let mut population =
        TurtlePopulation::new(&skeleton, GuidanceConfig::default(), TurtleState::default());

    population.steer();

    let members = population.members();
    assert_eq!(members.len(), 1);
    let member = &members[0];
    assert_eq!(member.cursor, Skeleton::ROOT);
    assert!((member.turtle.direction - DVec3::Y).length() < EPS);
    assert!((member.turtle.step_size - 4.0).abs() < EPS);
    assert_eq!(member.turtle.position, DVec3::ZERO);
    assert!(member.turtle.is_orthonormal(EPS));
}

#[test]
fn test_leaf_restores_initial_step() {
    let skeleton = Skeleton::new(DVec3::ZERO);
    let mut turtle = TurtleState::default();
    turtle.step_size = 3.0;
    turtle.yaw_left(Some(0.2));
    let pose = turtle.clone();

    let mut population = TurtlePopulation::with_members(
        &skeleton,
        GuidanceConfig::default(),
        vec![GuidedTurtle {
            turtle,
            cursor: Skeleton::ROOT,
            initial_step_size: 0.5,
        }],
    );
    population.steer();

    let member = &population.members()[0];
    assert_eq!(member.turtle.step_size, 0.5);
    assert_eq!(member.turtle.direction, pose.direction);
    assert_eq!(member.turtle.position, pose.position);
    assert_eq!(member.cursor, Skeleton::ROOT);
}

#[test]
fn test_parallel_heading_needs_no_rotation() {
    let mut skeleton = Skeleton::new(DVec3::ZERO);
    skeleton.add_child(Skeleton::ROOT, DVec3::new(0.0, 0.0, 2.0));
    let mut population =
        TurtlePopulation::new(&skeleton, GuidanceConfig::default(), TurtleState::default());

    population.steer();

    let turtle = &population.members()[0].turtle;
    assert_eq!(turtle.up, DVec3::Y);
    assert_eq!(turtle.left, DVec3::X);
    assert_eq!(turtle.direction, DVec3::Z);
    assert!(turtle.up.is_finite() && turtle.left.is_finite());
}

#[test]
fn test_target_behind_keeps_right_handed_frame() {
    let mut skeleton = Skeleton::new(DVec3::ZERO);
    skeleton.add_child(Skeleton::ROOT, DVec3::new(0.0, 0.0, -3.0));
    let mut population =
        TurtlePopulation::new(&skeleton, GuidanceConfig::default(), TurtleState::default());

    population.steer();
    population.horiz();

    let turtle = &population.members()[0].turtle;
    assert!((turtle.direction + DVec3::Z).length() < EPS);
    assert!(turtle.is_orthonormal(EPS));
    assert!((turtle.direction.cross(turtle.left) - turtle.up).length() < EPS);
    assert!((turtle.up - DVec3::Y).length() < EPS, "horiz keeps up");
    assert!((turtle.step_size - 1.5).abs() < EPS);
}

#[test]
fn test_broadcast_applies_to_every_member() {
    let skeleton = forked_skeleton();
    let mut population =
        TurtlePopulation::new(&skeleton, GuidanceConfig::default(), TurtleState::default());
    population.steer();

    let mut mesh = MeshBuffer::new();
    population.set_radius(0.3);
    population.forward(None, &mut mesh);

    assert_eq!(mesh.face_count(), 8, "Two members, one tube each");
    for member in population.members() {
        assert_eq!(member.turtle.radius, 0.3);
        // Step size 2.5 along a unit heading from the origin.
        assert!((member.turtle.position.length() - 2.5).abs() < EPS);
    }
}

#[test]
fn test_clone_is_independent() {
    let skeleton = forked_skeleton();
    let mut population =
        TurtlePopulation::new(&skeleton, GuidanceConfig::default(), TurtleState::default());
    let snapshot = population.clone();

    population.consider_data();
    population.skip(Some(1.0));

    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.members()[0].turtle, TurtleState::default());
}

#[test]
fn test_interpreted_growth_along_chain() {
    let mut skeleton = Skeleton::new(DVec3::ZERO);
    skeleton.add_child(Skeleton::ROOT, DVec3::new(0.0, 0.0, 2.0));
    let population =
        TurtlePopulation::new(&skeleton, GuidanceConfig::default(), TurtleState::default());

    // ? aims at (0, 0, 2) with step 1; F walks there halfway; ? at the leaf restores 0.5.
    let program = parse_symbols("?F?F").unwrap();
    let drawing = Interpreter::default().draw(&program, population).unwrap();

    assert_eq!(drawing.mesh.face_count(), 8);
    assert_eq!(drawing.report.unresolved, 0);
    let member = &drawing.turtle.members()[0];
    assert!((member.turtle.position - DVec3::new(0.0, 0.0, 1.5)).length() < EPS);
}

#[test]
fn test_population_push_pop() {
    let skeleton = forked_skeleton();
    let population =
        TurtlePopulation::new(&skeleton, GuidanceConfig::default(), TurtleState::default());

    // The fork only happens inside the bracket.
    let program = parse_symbols("[?F]F").unwrap();
    let drawing = Interpreter::default().draw(&program, population).unwrap();

    assert_eq!(drawing.turtle.len(), 1);
    assert_eq!(drawing.mesh.face_count(), 12);
    assert!((drawing.turtle.members()[0].turtle.position.z - 0.5).abs() < EPS);
}
