//! Integration tests for the drive path: query decode, mixing, and the
//! motor output stage.

use rs_rover::hal::{mock_stage, MockCamera, MockLight, MockPwm};
use rs_rover::motor::percent_to_duty;
use rs_rover::query::{parse_control, parse_drive};
use rs_rover::traits::Wheel;
use rs_rover::{
    CarState, DriveCommand, HBridgeWheel, MotorOutputStage, Polarity, QueryError, Rover, RoverError,
    ServoWheel, WheelSpeed,
};

type MockRover = Rover<HBridgeWheel<MockPwm>, MockCamera, MockLight>;

fn rover() -> MockRover {
    Rover::new(mock_stage(), MockCamera::new(), MockLight::new())
}

/// Exactly one channel non-zero, with the expected magnitude.
fn assert_one_active(wheel: &HBridgeWheel<MockPwm>, speed: i32) {
    let forward = wheel.forward_channel().duty;
    let reverse = wheel.reverse_channel().duty;
    let expected = percent_to_duty(speed).min(65535);
    if speed == 0 {
        assert_eq!((forward, reverse), (0, 0));
    } else {
        assert!(forward == 0 || reverse == 0, "both inputs high");
        assert_eq!(forward + reverse, expected);
    }
}

#[test]
fn mixed_speeds_are_clamped_independently() {
    let mut rover = rover();

    let cases = [
        ((100, 100), (100, 0)),
        ((100, -100), (0, 100)),
        ((-80, 50), (-30, -100)),
        ((70, 20), (90, 50)),
        ((0, 0), (0, 0)),
    ];

    for ((forward, steer), (left, right)) in cases {
        let applied = rover.drive(DriveCommand::new(forward, steer)).unwrap();
        assert_eq!(applied, WheelSpeed::new(left, right), "{} {}", forward, steer);
        assert_one_active(rover.motors().left(), left);
        assert_one_active(rover.motors().right(), right);
    }
}

#[test]
fn out_of_range_command_is_not_rejected() {
    let mut rover = rover();
    let cmd = parse_drive("forward=500&steer=-300").unwrap();
    assert_eq!(cmd, DriveCommand::new(500, -300));

    let applied = rover.drive(cmd).unwrap();
    assert!(applied.in_range());
    assert_eq!(applied, WheelSpeed::new(100, 100));
}

#[test]
fn positive_speed_is_vehicle_forward_on_both_sides() {
    let mut rover = rover();
    rover.drive(DriveCommand::new(50, 0)).unwrap();

    // Left is mounted mirrored, so vehicle-forward drives its reverse input.
    assert_eq!(rover.motors().left().reverse_channel().duty, 32768);
    assert_eq!(rover.motors().left().forward_channel().duty, 0);
    assert_eq!(rover.motors().right().forward_channel().duty, 32768);
    assert_eq!(rover.motors().right().reverse_channel().duty, 0);
}

#[test]
fn direction_change_zeroes_idle_input_first() {
    let mut stage = MotorOutputStage::new(
        HBridgeWheel::new(MockPwm::new(), MockPwm::new(), Polarity::Normal),
        HBridgeWheel::new(MockPwm::new(), MockPwm::new(), Polarity::Normal),
    );
    stage.set_wheel_speed(Wheel::Left, 100, 0).unwrap();
    stage.set_wheel_speed(Wheel::Left, -100, 0).unwrap();

    let left = stage.left();
    // Each write pair starts with the input that goes idle.
    assert_eq!(left.reverse_channel().history, vec![0, 65535]);
    assert_eq!(left.forward_channel().history, vec![65535, 0]);
}

#[test]
fn motor_failure_surfaces_as_500() {
    let stage = MotorOutputStage::new(
        HBridgeWheel::new(MockPwm::failing(), MockPwm::failing(), Polarity::Normal),
        HBridgeWheel::new(MockPwm::new(), MockPwm::new(), Polarity::Normal),
    );
    let mut rover = Rover::new(stage, MockCamera::new(), MockLight::new());

    let err = rover.drive(DriveCommand::new(10, 0)).unwrap_err();
    assert!(matches!(err, RoverError::Motor(_)));
    assert_eq!(err.status_code(), 500);
    assert_eq!(rover.state().last_drive, None);
}

#[test]
fn failed_right_wheel_stops_left_wheel_too() {
    let stage = MotorOutputStage::new(
        HBridgeWheel::new(MockPwm::new(), MockPwm::new(), Polarity::Normal),
        HBridgeWheel::new(MockPwm::failing(), MockPwm::failing(), Polarity::Normal),
    );
    let mut rover = Rover::new(stage, MockCamera::new(), MockLight::new());

    let err = rover.drive(DriveCommand::new(50, 0)).unwrap_err();
    assert_eq!(err.status_code(), 500);

    let left = rover.motors().left();
    // Left was driven, then pulled back to zero when the right write failed.
    assert_eq!(left.forward_channel().history, vec![32768, 0]);
    assert_eq!(left.reverse_channel().duty, 0);
    assert_eq!(rover.state().last_drive, None);
}

#[test]
fn failed_car_command_keeps_previous_car_state() {
    let stage = MotorOutputStage::new(
        HBridgeWheel::new(MockPwm::new(), MockPwm::new(), Polarity::Normal),
        HBridgeWheel::new(MockPwm::new(), MockPwm::failing(), Polarity::Normal),
    );
    let mut rover = Rover::new(stage, MockCamera::new(), MockLight::new());

    assert!(rover.control(parse_control("var=car&val=2").unwrap()).is_err());
    assert_eq!(rover.state().car, CarState::Stopped);
    assert_eq!(rover.motors().left().reverse_channel().duty, 0);
    assert_eq!(rover.motors().left().forward_channel().duty, 0);
}

#[test]
fn teleop_query_decodes_to_the_same_command() {
    for cmd in [
        DriveCommand::new(100, -100),
        DriveCommand::new(-37, 12),
        DriveCommand::stop(),
    ] {
        let path = cmd.path();
        let query = path.split_once('?').map(|(_, q)| q).unwrap();
        assert_eq!(parse_drive(query).unwrap(), cmd, "{}", path);
    }
}

#[test]
fn missing_parameter_never_reaches_motors() {
    let err = parse_drive("steer=10").unwrap_err();
    assert_eq!(err, QueryError::Missing("forward".into()));
    assert_eq!(RoverError::from(err).status_code(), 404);
}

#[test]
fn button_turns_do_not_change_car_state() {
    let mut rover = rover();
    rover.control(parse_control("var=car&val=2").unwrap()).unwrap();
    assert_eq!(rover.state().car, CarState::Backward);
    assert_eq!(rover.state().last_drive, Some(WheelSpeed::new(-100, -100)));

    rover.control(parse_control("var=car&val=3").unwrap()).unwrap();
    assert_eq!(rover.state().car, CarState::Backward);
    assert_eq!(rover.state().last_drive, Some(WheelSpeed::new(-100, 100)));

    rover.control(parse_control("var=car&val=0").unwrap()).unwrap();
    assert_eq!(rover.state().car, CarState::Stopped);
    assert_eq!(rover.state().last_drive, Some(WheelSpeed::STOPPED));
}

#[test]
fn trim_change_stops_the_rover() {
    let mut rover = rover();
    rover.control(parse_control("var=car&val=1").unwrap()).unwrap();
    rover.control(parse_control("var=ltrim&val=500").unwrap()).unwrap();

    assert_eq!(rover.state().left_trim, 192);
    assert_eq!(rover.state().car, CarState::Stopped);
    assert_eq!(rover.state().last_drive, Some(WheelSpeed::STOPPED));
}

#[test]
fn servo_stage_applies_trim_and_polarity() {
    let mut stage = MotorOutputStage::new(
        ServoWheel::new(MockPwm::new(), Polarity::Inverted),
        ServoWheel::new(MockPwm::new(), Polarity::Normal),
    );

    stage.apply(WheelSpeed::new(100, 100), (0, 0)).unwrap();
    assert_eq!(stage.left().channel().duty, 4915 - 1638);
    assert_eq!(stage.right().channel().duty, 4915 + 1638);

    // Stopped with trim holds the trimmed neutral.
    stage.apply(WheelSpeed::STOPPED, (0, 20)).unwrap();
    assert_eq!(stage.left().channel().duty, 0);
    assert_eq!(stage.right().channel().duty, 4935);
}
