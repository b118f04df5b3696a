//! End-to-end wall runs through the block world.

use glam::Vec3;
use rstest::rstest;
use test_utils::{
    airborne_body, assert_vec3_near, controller, controller_with, run_moves, scenario_world,
    wall_side_body, STEP,
};
use wallrun::{Block, MoveInput, MovementConfig, MovementMode, WallRunSide, WallRunStatus};

const RIGHT: MovementMode = MovementMode::WallRun(WallRunSide::Right);

fn along_wall() -> MoveInput {
    MoveInput {
        acceleration: Vec3::new(0.0, -1500.0, 0.0),
        jump: false,
    }
}

#[rstest]
fn falling_beside_a_wall_starts_a_right_wall_run() {
    let world = scenario_world();
    let mut body = wall_side_body(500.0);
    let mut movement = controller();

    movement.perform_move(&mut body, &world, &MoveInput::default(), STEP);

    assert_eq!(movement.mode(), RIGHT);
    assert_eq!(movement.wall_run_status(), WallRunStatus::Right);
    assert_vec3_near(movement.wall_run_normal(), Vec3::NEG_X, 1e-5);
}

#[rstest]
fn falling_in_open_air_never_starts_a_run() {
    let world = scenario_world();
    let mut body = airborne_body(800.0);
    body.velocity = Vec3::new(300.0, -300.0, 0.0);
    let mut movement = controller();

    run_moves(&mut movement, &mut body, &world, along_wall(), STEP, 10);

    assert!(movement.mode().is_falling());
    assert_eq!(movement.wall_run_normal(), Vec3::ZERO);
}

#[rstest]
fn speed_along_the_wall_must_reach_the_minimum() {
    let mut config = MovementConfig::default();
    // 424 cm/s overall, but only 300 cm/s once projected onto the wall.
    config.wall_run.min_wall_run_speed = 400.0;
    let world = scenario_world();
    let mut body = wall_side_body(500.0);
    let mut movement = controller_with(config);

    movement.perform_move(&mut body, &world, &MoveInput::default(), STEP);

    assert!(movement.mode().is_falling());
}

#[rstest]
fn running_keeps_the_body_against_the_wall() {
    let world = scenario_world();
    let mut body = wall_side_body(500.0);
    let mut movement = controller();

    run_moves(&mut movement, &mut body, &world, along_wall(), STEP, 60);

    assert_eq!(movement.mode(), RIGHT);
    assert!(body.location.x > 58.0 && body.location.x <= 60.0, "{body:?}");
    assert!(body.location.y < -100.0);
    // Accelerating along the travel direction cancels gravity.
    assert!((body.location.z - 500.0).abs() < 1.0, "{body:?}");
}

#[rstest]
fn exhausted_stamina_ends_the_run() {
    let world = scenario_world();
    let mut body = wall_side_body(3000.0);
    let mut movement = controller();

    run_moves(&mut movement, &mut body, &world, along_wall(), 0.25, 10);
    assert_eq!(movement.mode(), RIGHT);
    assert!(movement.stamina().state().current_value > 0.0);

    movement.perform_move(&mut body, &world, &along_wall(), 0.25);
    assert!(movement.mode().is_falling());
    assert!(movement.stamina().state().overheat);
    assert_eq!(movement.stamina().state().current_value, 0.0);
    assert!(!movement.is_wall_run_enabled());
}

#[rstest]
fn overheated_body_cannot_reenter_until_recovered() {
    let world = scenario_world();
    let mut body = wall_side_body(3000.0);
    let mut movement = controller();
    run_moves(&mut movement, &mut body, &world, along_wall(), 0.25, 11);
    assert!(movement.mode().is_falling());

    let mut again = wall_side_body(3000.0);
    movement.perform_move(&mut again, &world, &MoveInput::default(), STEP);
    assert!(movement.mode().is_falling());
}

#[rstest]
fn ground_below_the_run_ends_it() {
    let world = scenario_world().with_block(Block::new(
        Vec3::new(-200.0, -1000.0, 0.0),
        Vec3::new(99.0, -300.0, 100.0),
    ));
    let mut body = wall_side_body(200.0);
    let mut movement = controller();

    movement.perform_move(&mut body, &world, &along_wall(), STEP);
    assert_eq!(movement.mode(), RIGHT);

    let mut moves = 1;
    while movement.mode().is_wall_run() && moves < 120 {
        movement.perform_move(&mut body, &world, &along_wall(), STEP);
        moves += 1;
    }
    assert!(movement.mode().is_falling());
    assert!(body.location.y <= -300.0 && body.location.y > -1000.0, "{body:?}");
}

#[rstest]
fn jumping_off_pushes_away_from_the_wall() {
    let world = scenario_world();
    let mut body = wall_side_body(500.0);
    let mut movement = controller();
    run_moves(&mut movement, &mut body, &world, along_wall(), STEP, 5);
    assert_eq!(movement.mode(), RIGHT);

    let jump = MoveInput {
        jump: true,
        ..along_wall()
    };
    movement.perform_move(&mut body, &world, &jump, STEP);

    assert!(movement.mode().is_falling());
    assert_eq!(movement.wall_run_normal(), Vec3::ZERO);
    assert!(body.velocity.x < 0.0);
    assert!(body.velocity.z > 0.0);
}
