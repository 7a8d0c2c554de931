//! Bridge between a robot's topic pub/sub side and a mavconn-style
//! packetized link.
//!
//! Pose samples from the robot become attitude and local-position
//! containers on the link; position setpoints from the link become waypoint
//! goals on the robot side; the GPS reference origin is polled from the
//! parameter server and forwarded whenever it shifts. [`geo`] carries the
//! lat/long ↔ UTM math used across the mavconn ground tooling.

pub mod bridge;
pub mod config;
pub mod geo;
pub mod mavconn;
pub mod origin;
pub mod ros;
pub mod task;
pub mod translate;
