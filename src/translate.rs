//! Message translation between the robot topics and the mavconn wire model.

use crate::mavconn::msg::{Attitude, GpsGlobalOrigin, LocalPositionNed, SetLocalPositionSetpoint};
use crate::ros::{Point3, PoseStamped, Quaternion, WaypointGoal};

/// Converts one pose sample into the attitude and local-position messages
/// sent to the flight controller. Both carry the same microsecond timestamp
/// derived from the sample.
pub fn pose_to_telemetry(pose: &PoseStamped) -> (Attitude, LocalPositionNed) {
    let time_usec = pose.stamp_ns / 1000;

    let (yaw, pitch, roll) = euler_ypr(pose.orientation);

    let attitude = Attitude {
        time_usec,
        roll: roll as f32,
        pitch: pitch as f32,
        yaw: yaw as f32,
        rollspeed: 0.0,
        pitchspeed: 0.0,
        yawspeed: 0.0,
    };

    let position = LocalPositionNed {
        time_usec,
        x: pose.position.x as f32,
        y: pose.position.y as f32,
        z: pose.position.z as f32,
        vx: 0.0,
        vy: 0.0,
        vz: 0.0,
    };

    (attitude, position)
}

/// Extracts yaw, pitch, roll (intrinsic Z-Y-X) from a quaternion.
///
/// The yaw→pitch→roll order is a contract with the flight controller's
/// attitude consumer; do not swap it for another convention. Gimbal lock
/// (|pitch| = 90°) collapses yaw and roll into one degree of freedom, which
/// is a known limitation of this decomposition.
pub fn euler_ypr(q: Quaternion) -> (f64, f64, f64) {
    let Quaternion { x, y, z, w } = q;

    let yaw = (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z));

    let sin_pitch = 2.0 * (w * y - z * x);
    let pitch = sin_pitch.clamp(-1.0, 1.0).asin();

    let roll = (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y));

    (yaw, pitch, roll)
}

/// Converts an inbound position setpoint into a waypoint goal for the
/// robot side. Speed, accuracy, and timeout are fixed policy values, not
/// derived from the setpoint.
pub fn setpoint_to_goal(setpoint: &SetLocalPositionSetpoint) -> WaypointGoal {
    WaypointGoal {
        goal_pos: Point3 {
            x: setpoint.x as f64,
            y: setpoint.y as f64,
            z: setpoint.z as f64,
        },
        goal_yaw: setpoint.yaw,
        max_speed: Point3 {
            x: 2.0,
            y: 2.0,
            z: 2.0,
        },
        accuracy_position: 0.25,
        accuracy_orientation: 0.1,
        timeout: 60.0,
    }
}

/// Wraps the current reference origin into the wire message. The triple is
/// always sent whole, never as a delta.
pub fn origin_to_message(latitude: f64, longitude: f64, altitude: f64) -> GpsGlobalOrigin {
    GpsGlobalOrigin {
        latitude,
        longitude,
        altitude,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn identity_pose() {
        let pose = PoseStamped {
            stamp_ns: 1_500_000_000,
            position: Point3 {
                x: 1.5,
                y: -2.5,
                z: 0.75,
            },
            orientation: Quaternion::IDENTITY,
        };

        let (attitude, position) = pose_to_telemetry(&pose);

        assert_eq!(attitude.roll, 0.0);
        assert_eq!(attitude.pitch, 0.0);
        assert_eq!(attitude.yaw, 0.0);
        assert_eq!(position.x, 1.5);
        assert_eq!(position.y, -2.5);
        assert_eq!(position.z, 0.75);
    }

    #[test]
    fn timestamps_match_and_are_microseconds() {
        let pose = PoseStamped {
            stamp_ns: 1_234_567_891,
            position: Point3::default(),
            orientation: Quaternion::IDENTITY,
        };

        let (attitude, position) = pose_to_telemetry(&pose);
        assert_eq!(attitude.time_usec, position.time_usec);
        assert_eq!(attitude.time_usec, 1_234_567);
    }

    #[test]
    fn pure_yaw_rotation() {
        // 90° about Z
        let half = FRAC_PI_2 / 2.0;
        let q = Quaternion {
            x: 0.0,
            y: 0.0,
            z: half.sin(),
            w: half.cos(),
        };

        let (yaw, pitch, roll) = euler_ypr(q);
        assert!((yaw - FRAC_PI_2).abs() < 1e-9);
        assert!(pitch.abs() < 1e-9);
        assert!(roll.abs() < 1e-9);
    }

    #[test]
    fn pure_roll_rotation() {
        let half = 0.3_f64 / 2.0;
        let q = Quaternion {
            x: half.sin(),
            y: 0.0,
            z: 0.0,
            w: half.cos(),
        };

        let (yaw, pitch, roll) = euler_ypr(q);
        assert!(yaw.abs() < 1e-9);
        assert!(pitch.abs() < 1e-9);
        assert!((roll - 0.3).abs() < 1e-9);
    }

    #[test]
    fn degenerate_quaternion_still_produces_angles() {
        // not normalized; the decomposition must not panic
        let q = Quaternion {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 0.0,
        };

        let (yaw, pitch, roll) = euler_ypr(q);
        assert!(yaw.is_finite() && pitch.is_finite() && roll.is_finite());
    }

    #[test]
    fn goal_fixed_defaults() {
        let setpoint = SetLocalPositionSetpoint {
            x: 1.0,
            y: 2.0,
            z: 3.0,
            yaw: 0.5,
        };

        let goal = setpoint_to_goal(&setpoint);

        assert_eq!(goal.goal_pos.x, 1.0);
        assert_eq!(goal.goal_pos.y, 2.0);
        assert_eq!(goal.goal_pos.z, 3.0);
        assert_eq!(goal.goal_yaw, 0.5);
        assert_eq!(goal.max_speed.x, 2.0);
        assert_eq!(goal.max_speed.y, 2.0);
        assert_eq!(goal.max_speed.z, 2.0);
        assert_eq!(goal.accuracy_position, 0.25);
        assert_eq!(goal.accuracy_orientation, 0.1);
        assert_eq!(goal.timeout, 60.0);
    }
}
