//! Transport-A seam: the robot-side pub/sub topics and parameter server.
//!
//! The concrete ROS binding lives outside this crate; the bridge only sees a
//! pose subscription channel, a goal publication channel, and a polled
//! parameter store. The channel ends returned by [`endpoints`] are what the
//! binding connects to.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

/// A timestamped pose sample from the robot's pose topic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseStamped {
    /// Sample time in nanoseconds since the epoch.
    pub stamp_ns: u64,
    pub position: Point3,
    pub orientation: Quaternion,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };
}

/// A waypoint goal published on the robot's goal topic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaypointGoal {
    pub goal_pos: Point3,
    pub goal_yaw: f32,
    pub max_speed: Point3,
    pub accuracy_position: f32,
    pub accuracy_orientation: f32,
    pub timeout: f32,
}

/// Pose subscription half handed to the bridge.
pub type PoseRx = flume::Receiver<PoseStamped>;
/// Pose publication half handed to the robot-side binding.
pub type PoseTx = flume::Sender<PoseStamped>;
/// Goal subscription half handed to the robot-side binding.
pub type GoalRx = flume::Receiver<WaypointGoal>;
/// Goal publication half handed to the bridge.
pub type GoalTx = flume::Sender<WaypointGoal>;

/// The bridge's ends of the transport-A topics.
pub struct RosHandle {
    pub pose_rx: PoseRx,
    pub goal_tx: GoalTx,
    pub params: ParamStore,
}

/// The robot-side binding's ends of the transport-A topics.
pub struct RosEndpoints {
    pub pose_tx: PoseTx,
    pub goal_rx: GoalRx,
    pub params: ParamStore,
}

/// Creates the paired topic channels and a shared parameter store.
pub fn endpoints() -> (RosHandle, RosEndpoints) {
    let (pose_tx, pose_rx) = flume::bounded(256);
    let (goal_tx, goal_rx) = flume::bounded(256);
    let params = ParamStore::new();

    (
        RosHandle {
            pose_rx,
            goal_tx,
            params: params.clone(),
        },
        RosEndpoints {
            pose_tx,
            goal_rx,
            params,
        },
    )
}

/// Shared parameter server cache. Values are set by the robot-side binding
/// and polled by the bridge; there is no change notification.
#[derive(Clone, Default)]
pub struct ParamStore {
    values: Arc<RwLock<HashMap<String, f64>>>,
}

impl ParamStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key`, or `None` if the parameter has
    /// never been set.
    pub fn get_cached(&self, key: &str) -> Option<f64> {
        self.values
            .read()
            .expect("param store lock poisoned")
            .get(key)
            .copied()
    }

    pub fn set(&self, key: impl Into<String>, value: f64) {
        self.values
            .write()
            .expect("param store lock poisoned")
            .insert(key.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_store_roundtrip() {
        let params = ParamStore::new();
        assert_eq!(params.get_cached("/gps_ref_latitude"), None);

        params.set("/gps_ref_latitude", 47.0);
        assert_eq!(params.get_cached("/gps_ref_latitude"), Some(47.0));

        // clones observe the same map
        let clone = params.clone();
        clone.set("/gps_ref_latitude", 47.5);
        assert_eq!(params.get_cached("/gps_ref_latitude"), Some(47.5));
    }
}
