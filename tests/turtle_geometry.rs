// tests/turtle_geometry.rs
use glam::DVec3;
use std::f64::consts::FRAC_PI_2;
use turtle_flora::{MeshBuffer, Turtle, TurtleConfig, TurtleState};

const EPS: f64 = 1e-9;

fn close(a: DVec3, b: DVec3) -> bool {
    (a - b).length() <= EPS
}

fn frames_match(a: &TurtleState, b: &TurtleState) -> bool {
    close(a.direction, b.direction) && close(a.up, b.up) && close(a.left, b.left)
}

#[test]
fn test_forward_emits_tube_segment() {
    let mut turtle = TurtleState::default();
    let mut mesh = MeshBuffer::new();
    let start = turtle.position;
    let heading = turtle.direction;

    turtle.forward(Some(2.0), &mut mesh);

    assert!(close(turtle.position, start + heading * 2.0));
    assert_eq!(mesh.face_count(), 4);
    assert!(mesh.faces.iter().all(|f| f.len() == 4));

    // First quad starts at position - radius * up and extrudes along the heading.
    let quad = mesh.face(0).unwrap();
    assert!(close(quad[0], start - 0.1 * DVec3::Y));
    assert!(close(quad[1], start - 0.1 * DVec3::Y + 2.0 * DVec3::Z));
}

#[test]
fn test_forward_defaults_to_step_size() {
    let mut turtle = TurtleState::new(&TurtleConfig {
        step_size: 1.25,
        ..Default::default()
    });
    let mut mesh = MeshBuffer::new();
    turtle.forward(None, &mut mesh);
    assert!(close(turtle.position, DVec3::new(0.0, 0.0, 1.25)));
}

#[test]
fn test_skip_moves_without_faces() {
    let mut turtle = TurtleState::default();
    turtle.skip(Some(3.0));
    turtle.skip(None);
    assert!(close(turtle.position, DVec3::new(0.0, 0.0, 3.5)));
}

#[test]
fn test_radius_scales_cross_section() {
    let mut turtle = TurtleState::default();
    let mut mesh = MeshBuffer::new();
    turtle.set_radius(0.5);
    turtle.forward(Some(1.0), &mut mesh);
    let (lo, hi) = mesh.bounds().unwrap();
    assert!(close(lo, DVec3::new(-0.5, -0.5, 0.0)));
    assert!(close(hi, DVec3::new(0.5, 0.5, 1.0)));
}

#[test]
fn test_polygon_recording() {
    let mut turtle = TurtleState::default();
    let mut mesh = MeshBuffer::new();
    let start = turtle.position;

    turtle.start_poly();
    turtle.forward(Some(1.0), &mut mesh);
    turtle.yaw_right(Some(FRAC_PI_2));
    turtle.forward(Some(2.0), &mut mesh);
    turtle.end_poly(&mut mesh);

    assert_eq!(mesh.face_count(), 9);
    let polygon = mesh.face(8).unwrap();
    assert_eq!(polygon.len(), 3);
    assert!(close(polygon[0], start));
    assert!(close(polygon[1], DVec3::new(0.0, 0.0, 1.0)));
    assert!(close(polygon[2], DVec3::new(2.0, 0.0, 1.0)));
    assert!(!turtle.recording);
}

#[test]
fn test_polygon_from_skips() {
    let mut turtle = TurtleState::default();
    let mut faces = Vec::new();
    let mut sink = |f: &[DVec3]| faces.push(f.to_vec());

    turtle.start_poly();
    turtle.skip(Some(1.0));
    turtle.pitch_up(Some(FRAC_PI_2));
    turtle.skip(Some(1.0));
    turtle.end_poly(&mut sink);

    assert_eq!(faces.len(), 1);
    assert_eq!(faces[0].len(), 3);
}

#[test]
fn test_degenerate_polygon_is_dropped() {
    let mut turtle = TurtleState::default();
    let mut mesh = MeshBuffer::new();
    turtle.start_poly();
    turtle.skip(Some(1.0));
    turtle.end_poly(&mut mesh);
    assert!(mesh.is_empty());
    assert!(!turtle.recording);
}

#[test]
fn test_yaw_right_swings_heading_onto_left() {
    let mut turtle = TurtleState::default();
    turtle.yaw_right(Some(FRAC_PI_2));
    assert!(close(turtle.direction, DVec3::X));
    assert!(close(turtle.left, -DVec3::Z));
    assert!(close(turtle.up, DVec3::Y));
}

#[test]
fn test_rotation_pairs_cancel() {
    let reference = TurtleState::default();
    let theta = 0.731;

    let mut t = reference.clone();
    t.yaw_left(Some(theta));
    t.yaw_right(Some(theta));
    assert!(frames_match(&t, &reference));

    let mut t = reference.clone();
    t.pitch_up(Some(theta));
    t.pitch_down(Some(theta));
    assert!(frames_match(&t, &reference));

    let mut t = reference.clone();
    t.roll_left(None);
    t.roll_right(None);
    assert!(frames_match(&t, &reference));
}

#[test]
fn test_zero_rotation_is_identity() {
    let reference = TurtleState::default();
    let mut t = reference.clone();
    t.yaw_left(Some(0.0));
    t.pitch_down(Some(0.0));
    t.roll_right(Some(0.0));
    assert_eq!(t.direction, reference.direction);
    assert_eq!(t.up, reference.up);
    assert_eq!(t.left, reference.left);
}

fn rotation_cycle(t: &mut TurtleState, steps: usize) {
    for i in 0..steps {
        match i % 3 {
            0 => t.yaw_left(Some(0.37)),
            1 => t.pitch_up(Some(1.1)),
            _ => t.roll_right(Some(2.3)),
        }
    }
}

#[test]
fn test_renormalized_frame_stays_orthonormal() {
    let mut t = TurtleState::new(&TurtleConfig {
        renormalize: true,
        ..Default::default()
    });
    rotation_cycle(&mut t, 200);
    assert!(t.is_orthonormal(1e-9));
}

#[test]
fn test_default_frame_drifts_slowly() {
    // Without renormalization error compounds, but a short chain is still clean.
    let mut t = TurtleState::default();
    rotation_cycle(&mut t, 20);
    assert!(t.is_orthonormal(1e-10));
    assert!(!t.renormalize);
}

#[test]
fn test_horiz_keeps_clean_frame_and_repairs_drift() {
    let mut t = TurtleState::default();
    t.yaw_right(Some(0.4));
    t.pitch_up(Some(0.2));
    let before = t.clone();
    t.horiz();
    assert!(frames_match(&t, &before));

    t.up = t.up * 1.1 + t.direction * 0.05;
    t.left = (t.left + t.up * 0.02) * 0.9;
    t.horiz();
    assert!(t.is_orthonormal(1e-9));
}

#[test]
fn test_renormalize_flag_is_carried_from_config() {
    let mut t = TurtleState::new(&TurtleConfig {
        renormalize: true,
        ..Default::default()
    });
    t.direction *= 1.5;
    t.yaw_left(Some(0.1));
    assert!(t.is_orthonormal(1e-12));
}
