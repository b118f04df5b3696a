use std::f32::consts::FRAC_PI_2;

use approx::assert_relative_eq;
use glam::Vec3;
use rstest::{fixture, rstest};

use super::*;
use crate::collision::{HitResult, MockCollisionWorld};
use crate::config::GravityScaleCurve;
use crate::mode::WallRunSide;
use crate::world::{Block, BlockWorld};
use crate::{DEFAULT_GRAVITY_Z, MAX_SIMULATION_TIME_STEP};

const BODY: BodyId = BodyId(1);
const DT: f32 = 1.0 / 60.0;
const RIGHT: MovementMode = MovementMode::WallRun(WallRunSide::Right);

/// Floor with its top at z = 0 and a wall whose face is the plane x = 100.
#[fixture]
fn world() -> BlockWorld {
    BlockWorld::new()
        .with_block(Block::new(
            Vec3::new(-5000.0, -5000.0, -100.0),
            Vec3::new(5000.0, 5000.0, 0.0),
        ))
        .with_block(Block::new(
            Vec3::new(100.0, -5000.0, 0.0),
            Vec3::new(120.0, 5000.0, 5000.0),
        ))
}

/// Airborne body beside the wall, facing -Y so the wall is on its right.
#[fixture]
fn body() -> CharacterBody {
    let mut body = CharacterBody::new(BODY, Vec3::new(30.0, 0.0, 500.0)).facing_yaw(-FRAC_PI_2);
    body.velocity = Vec3::new(300.0, -300.0, -100.0);
    body
}

#[fixture]
fn movement() -> WallRunMovement {
    WallRunMovement::new(BODY, StandardMovement::default(), MovementConfig::default())
}

fn settings_with_curve() -> MovementConfig {
    let mut config = MovementConfig::default();
    config.wall_run.gravity_scale_curve = Some(GravityScaleCurve::new(vec![
        (-1.0, 1.0),
        (0.0, 0.5),
        (1.0, 0.25),
    ]));
    config
}

fn wall_hit(normal: Vec3) -> HitResult {
    HitResult {
        time: 0.5,
        location: Vec3::ZERO,
        impact_point: Vec3::ZERO,
        normal,
        start_penetrating: false,
    }
}

#[rstest]
fn right_vector_follows_yaw(body: CharacterBody) {
    assert_relative_eq!(body.right_vector().x, 1.0, epsilon = 1e-6);
    assert_relative_eq!(body.right_vector().y, 0.0, epsilon = 1e-6);
}

#[rstest]
fn falling_into_a_right_wall_starts_wall_run(
    world: BlockWorld,
    mut body: CharacterBody,
    mut movement: WallRunMovement,
) {
    assert!(movement.try_wall_run(&mut body, &world));
    assert_eq!(movement.mode(), RIGHT);
    assert_eq!(movement.wall_run_status(), WallRunStatus::Right);
    assert_eq!(movement.wall_run_normal(), Vec3::NEG_X);
    assert_eq!(body.velocity, Vec3::new(0.0, -300.0, 0.0));
}

#[rstest]
fn head_on_approach_leaves_too_little_speed_along_the_wall(
    world: BlockWorld,
    mut body: CharacterBody,
    mut movement: WallRunMovement,
) {
    body.velocity = Vec3::new(300.0, 0.0, -100.0);
    assert!(!movement.try_wall_run(&mut body, &world));
    assert_eq!(movement.mode(), MovementMode::Falling);
    assert_eq!(body.velocity, Vec3::new(300.0, 0.0, -100.0));
}

#[rstest]
#[case(Vec3::new(199.0, 0.0, 0.0))]
#[case(Vec3::new(100.0, -100.0, 500.0))]
#[case(Vec3::new(0.0, 0.0, -300.0))]
#[case(Vec3::new(-141.0, 141.0, -50.0))]
fn slow_bodies_never_start_wall_running(
    world: BlockWorld,
    mut body: CharacterBody,
    mut movement: WallRunMovement,
    #[case] velocity: Vec3,
) {
    body.velocity = velocity;
    assert!(!movement.try_wall_run(&mut body, &world));
}

#[rstest]
fn fast_fall_prevents_entry(
    world: BlockWorld,
    mut body: CharacterBody,
    mut movement: WallRunMovement,
) {
    body.velocity = Vec3::new(300.0, -300.0, -401.0);
    assert!(!movement.try_wall_run(&mut body, &world));
}

#[rstest]
fn upward_speed_is_clamped_on_entry(
    world: BlockWorld,
    mut body: CharacterBody,
    mut movement: WallRunMovement,
) {
    body.velocity = Vec3::new(300.0, -300.0, 650.0);
    assert!(movement.try_wall_run(&mut body, &world));
    assert_eq!(body.velocity.z, 200.0);
}

#[rstest]
fn moving_away_from_the_wall_does_not_qualify(
    world: BlockWorld,
    mut body: CharacterBody,
    mut movement: WallRunMovement,
) {
    body.velocity = Vec3::new(-50.0, -300.0, 0.0);
    assert!(!movement.try_wall_run(&mut body, &world));
}

#[rstest]
fn nearby_floor_prevents_entry(
    world: BlockWorld,
    mut body: CharacterBody,
    mut movement: WallRunMovement,
) {
    body.location.z = 110.0;
    assert!(!movement.try_wall_run(&mut body, &world));
}

#[rstest]
fn only_falling_bodies_can_start(
    world: BlockWorld,
    mut body: CharacterBody,
    mut movement: WallRunMovement,
) {
    movement.set_movement_mode(&body, &world, MovementMode::Walking);
    assert!(!movement.try_wall_run(&mut body, &world));
}

#[rstest]
fn overheated_stamina_prevents_entry(
    world: BlockWorld,
    mut body: CharacterBody,
    mut movement: WallRunMovement,
) {
    movement.restore_stamina(crate::stamina::StaminaState {
        overheat: true,
        ..crate::stamina::StaminaState::at_max(0.0)
    });
    assert!(!movement.is_wall_run_enabled());
    assert!(!movement.try_wall_run(&mut body, &world));
}

#[rstest]
fn disabled_flag_prevents_entry(
    world: BlockWorld,
    mut body: CharacterBody,
    mut movement: WallRunMovement,
) {
    movement.set_wall_run_enable_flag(false);
    assert!(!movement.try_wall_run(&mut body, &world));
}

#[rstest]
fn left_side_wins_when_both_sides_qualify(mut body: CharacterBody, mut movement: WallRunMovement) {
    let mut world = MockCollisionWorld::new();
    world.expect_line_trace().returning(|start, end, _| {
        if end.z < start.z {
            None
        } else {
            Some(wall_hit(Vec3::Y))
        }
    });
    assert!(movement.try_wall_run(&mut body, &world));
    assert_eq!(movement.mode(), MovementMode::WallRun(WallRunSide::Left));
    assert_eq!(movement.wall_run_normal(), Vec3::Y);
}

#[rstest]
fn entering_without_a_normal_probes_for_one(
    world: BlockWorld,
    body: CharacterBody,
    mut movement: WallRunMovement,
) {
    movement.set_movement_mode(&body, &world, RIGHT);
    assert_eq!(movement.wall_run_normal(), Vec3::NEG_X);
    movement.set_movement_mode(&body, &world, MovementMode::Falling);
    assert_eq!(movement.wall_run_normal(), Vec3::ZERO);
}

#[rstest]
fn mode_changes_announce_stamina_use(
    world: BlockWorld,
    body: CharacterBody,
    mut movement: WallRunMovement,
) {
    movement.set_movement_mode(&body, &world, RIGHT);
    movement.set_movement_mode(&body, &world, MovementMode::Falling);
    let stamina: Vec<_> = movement
        .drain_events()
        .filter_map(|event| match event {
            MovementEvent::Stamina(change) => Some(change),
            _ => None,
        })
        .collect();
    assert_eq!(stamina.len(), 2);
    assert_eq!(stamina[0].add_value_per_second, -40.0);
    assert_eq!(stamina[1].add_value_per_second, 0.0);
    assert!(stamina.iter().all(|change| change.instigator == BODY));
}

#[rstest]
fn observers_see_mode_changes(
    world: BlockWorld,
    body: CharacterBody,
    mut movement: WallRunMovement,
) {
    let id = movement.register_mode_observer(
        Some(Box::new(|current: MovementMode, _previous: MovementMode| {
            i32::from(current.is_wall_run())
        })),
        true,
    );
    movement.set_movement_mode(&body, &world, MovementMode::Walking);
    movement.set_movement_mode(&body, &world, RIGHT);
    movement.set_movement_mode(&body, &world, MovementMode::Falling);
    let fired: Vec<_> = movement
        .drain_events()
        .filter_map(|event| match event {
            MovementEvent::ModeChanged(change) => Some(change),
            _ => None,
        })
        .collect();
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].observer, id);
    assert_eq!(fired[0].current, RIGHT);
    assert_eq!(fired[0].previous, MovementMode::Walking);
    assert!(!movement.unregister_mode_observer(id));
}

#[rstest]
fn wall_run_overrides_speed_braking_and_jump(
    world: BlockWorld,
    body: CharacterBody,
    mut movement: WallRunMovement,
) {
    assert!(!movement.can_attempt_jump());
    assert_eq!(movement.max_speed(), 600.0);
    movement.set_movement_mode(&body, &world, RIGHT);
    assert_eq!(movement.max_speed(), 800.0);
    assert_eq!(movement.max_braking_deceleration(), 0.0);
    assert!(movement.can_attempt_jump());
}

#[rstest]
fn jumping_off_a_wall_pushes_away_from_it(
    world: BlockWorld,
    mut body: CharacterBody,
    mut movement: WallRunMovement,
) {
    assert!(movement.try_wall_run(&mut body, &world));
    assert!(movement.do_jump(&mut body, &world));
    assert_eq!(movement.mode(), MovementMode::Falling);
    assert_eq!(movement.wall_run_normal(), Vec3::ZERO);
    assert_eq!(body.velocity, Vec3::new(-200.0, -300.0, 420.0));
}

#[rstest]
fn falling_bodies_cannot_jump(
    world: BlockWorld,
    mut body: CharacterBody,
    mut movement: WallRunMovement,
) {
    let before = body.velocity;
    assert!(!movement.do_jump(&mut body, &world));
    assert_eq!(body.velocity, before);
}

#[rstest]
fn gravity_scale_is_zero_while_rising() {
    let movement = WallRunMovement::new(BODY, StandardMovement::default(), settings_with_curve());
    let velocity = Vec3::new(0.0, -300.0, 10.0);
    assert_eq!(movement.wall_gravity_scale(Vec3::Y * 1000.0, velocity), 0.0);
    assert_eq!(movement.wall_gravity_scale(Vec3::NEG_Y * 1000.0, velocity), 0.0);
}

#[rstest]
#[case(Vec3::Y * 1000.0, 0.4)]
#[case(Vec3::NEG_Y * 1000.0, 0.0)]
#[case(Vec3::ZERO, 0.0)]
fn gravity_scale_without_curve(
    movement: WallRunMovement,
    #[case] acceleration: Vec3,
    #[case] expected: f32,
) {
    let velocity = Vec3::new(0.0, -300.0, -10.0);
    assert_eq!(movement.wall_gravity_scale(acceleration, velocity), expected);
}

#[rstest]
fn gravity_scale_follows_curve_when_falling() {
    let movement = WallRunMovement::new(BODY, StandardMovement::default(), settings_with_curve());
    let velocity = Vec3::new(0.0, -300.0, -10.0);
    assert_relative_eq!(movement.wall_gravity_scale(Vec3::Y, velocity), 1.0);
    assert_relative_eq!(movement.wall_gravity_scale(Vec3::NEG_Y, velocity), 0.25);
    assert_relative_eq!(movement.wall_gravity_scale(Vec3::X, velocity), 0.5);
}

#[rstest]
#[case(Vec3::NEG_X, true)]
#[case(Vec3::new(-1.0, 1.0, 0.0), false)]
#[case(Vec3::X, false)]
#[case(Vec3::ZERO, false)]
fn pull_away_compares_against_sine_of_angle(
    movement: WallRunMovement,
    #[case] acceleration: Vec3,
    #[case] expected: bool,
) {
    assert_eq!(movement.is_pull_away(acceleration, Vec3::NEG_X), expected);
}

#[rstest]
fn blocked_slide_uses_forward_tangent_for_each_side() {
    let delta = Vec3::new(0.0, -10.0, 0.0);
    let right = calc_delta_after_blocked(WallRunSide::Right, delta, Vec3::ZERO, Vec3::NEG_X);
    let left = calc_delta_after_blocked(WallRunSide::Left, delta, Vec3::ZERO, Vec3::X);
    assert_relative_eq!(right.y, -10.0);
    assert_relative_eq!(left.y, -10.0);
}

#[rstest]
fn wall_run_moves_along_the_wall(
    world: BlockWorld,
    mut body: CharacterBody,
    mut movement: WallRunMovement,
) {
    movement.perform_move(&mut body, &world, &MoveInput::default(), DT);
    assert_eq!(movement.mode(), RIGHT);
    assert_relative_eq!(body.location.y, -5.0, epsilon = 1e-3);
    assert_relative_eq!(body.location.z, 500.0, epsilon = 1e-3);
    assert!(body.location.x > 30.0);
    assert!(body.velocity.y < 0.0);
}

#[rstest]
fn floor_below_ends_the_wall_run(
    world: BlockWorld,
    mut body: CharacterBody,
    mut movement: WallRunMovement,
) {
    assert!(movement.try_wall_run(&mut body, &world));
    body.location.z = 110.0;
    movement.perform_move(&mut body, &world, &MoveInput::default(), DT);
    assert_eq!(movement.mode(), MovementMode::Falling);
    assert_eq!(movement.wall_run_normal(), Vec3::ZERO);
}

#[rstest]
fn floor_reached_mid_tick_hands_the_rest_to_falling(
    mut body: CharacterBody,
    mut movement: WallRunMovement,
) {
    // Raised ledge starting just ahead of the body, its top 110 below the
    // capsule centre: inside the floor probe, below the capsule.
    let world = world().with_block(Block::new(
        Vec3::new(-200.0, -1000.0, 0.0),
        Vec3::new(99.0, -10.0, 390.0),
    ));
    assert!(movement.try_wall_run(&mut body, &world));
    let tick = 4.0 * MAX_SIMULATION_TIME_STEP;

    movement.perform_move(&mut body, &world, &MoveInput::default(), tick);

    assert_eq!(movement.mode(), MovementMode::Falling);
    assert_eq!(movement.wall_run_normal(), Vec3::ZERO);
    // One substep on the wall without gravity, then three substeps falling.
    let falling_time = tick - MAX_SIMULATION_TIME_STEP;
    assert_relative_eq!(body.velocity.z, DEFAULT_GRAVITY_Z * falling_time, epsilon = 0.5);
    assert!(body.location.z > 390.0 + 90.0);
}

#[rstest]
fn pulling_away_drops_off_the_wall(
    world: BlockWorld,
    mut body: CharacterBody,
    mut movement: WallRunMovement,
) {
    assert!(movement.try_wall_run(&mut body, &world));
    let input = MoveInput {
        acceleration: Vec3::NEG_X * 2048.0,
        jump: false,
    };
    movement.perform_move(&mut body, &world, &input, DT);
    assert_eq!(movement.mode(), MovementMode::Falling);
    assert!(body.velocity.z < 0.0);
}

#[rstest]
fn losing_speed_reverts_the_substep_and_falls(
    world: BlockWorld,
    mut body: CharacterBody,
    mut movement: WallRunMovement,
) {
    assert!(movement.try_wall_run(&mut body, &world));
    body.velocity = Vec3::new(0.0, -201.0, 0.0);
    let input = MoveInput {
        acceleration: Vec3::Y * 2048.0,
        jump: false,
    };
    movement.perform_move(&mut body, &world, &input, DT);
    assert_eq!(movement.mode(), MovementMode::Falling);
}

#[rstest]
fn disabling_mid_run_exits_before_physics(
    world: BlockWorld,
    mut body: CharacterBody,
    mut movement: WallRunMovement,
) {
    assert!(movement.try_wall_run(&mut body, &world));
    movement.set_wall_run_enable_flag(false);
    movement.perform_move(&mut body, &world, &MoveInput::default(), DT);
    assert_eq!(movement.mode(), MovementMode::Falling);
}

#[rstest]
fn jump_input_is_handled_before_physics(
    world: BlockWorld,
    mut body: CharacterBody,
    mut movement: WallRunMovement,
) {
    assert!(movement.try_wall_run(&mut body, &world));
    let input = MoveInput {
        acceleration: Vec3::ZERO,
        jump: true,
    };
    movement.perform_move(&mut body, &world, &input, DT);
    assert_eq!(movement.mode(), MovementMode::Falling);
    assert!(body.velocity.z > 0.0);
    assert!(body.velocity.x < 0.0);
}
