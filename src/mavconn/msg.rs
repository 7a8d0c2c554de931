//! Container framing and message payloads for the mavconn link.
//!
//! A container is `sysid u8, compid u8, msgid u16 LE` followed by the
//! payload. Message ids and payload layouts follow MAVLink numbering; all
//! multi-byte fields are little-endian.

use anyhow::{ensure, Context};
use bytes::{Buf, BufMut, Bytes, BytesMut};

pub const MSG_ID_ATTITUDE: u16 = 30;
pub const MSG_ID_LOCAL_POSITION_NED: u16 = 32;
pub const MSG_ID_GPS_GLOBAL_ORIGIN: u16 = 49;
pub const MSG_ID_SET_LOCAL_POSITION_SETPOINT: u16 = 50;

const CONTAINER_HEADER_LEN: usize = 4;

/// A decoded container: routing header plus the still-encoded payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub sysid: u8,
    pub compid: u8,
    pub msgid: u16,
    pub payload: Bytes,
}

impl Container {
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(CONTAINER_HEADER_LEN + self.payload.len());
        buf.put_u8(self.sysid);
        buf.put_u8(self.compid);
        buf.put_u16_le(self.msgid);
        buf.extend_from_slice(&self.payload);
        buf.freeze()
    }

    pub fn decode(mut buf: Bytes) -> anyhow::Result<Container> {
        ensure!(
            buf.len() >= CONTAINER_HEADER_LEN,
            "container too short: {} bytes",
            buf.len()
        );

        let sysid = buf.get_u8();
        let compid = buf.get_u8();
        let msgid = buf.get_u16_le();

        Ok(Container {
            sysid,
            compid,
            msgid,
            payload: buf,
        })
    }
}

/// Vehicle attitude in radians. Timestamp is in microseconds; the angular
/// rates are carried on the wire but the bridge always sends them as zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attitude {
    pub time_usec: u64,
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub rollspeed: f32,
    pub pitchspeed: f32,
    pub yawspeed: f32,
}

impl Attitude {
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(32);
        buf.put_u64_le(self.time_usec);
        buf.put_f32_le(self.roll);
        buf.put_f32_le(self.pitch);
        buf.put_f32_le(self.yaw);
        buf.put_f32_le(self.rollspeed);
        buf.put_f32_le(self.pitchspeed);
        buf.put_f32_le(self.yawspeed);
        buf.freeze()
    }

    pub fn decode(mut buf: Bytes) -> anyhow::Result<Attitude> {
        ensure!(buf.len() >= 32, "attitude payload too short");
        Ok(Attitude {
            time_usec: buf.get_u64_le(),
            roll: buf.get_f32_le(),
            pitch: buf.get_f32_le(),
            yaw: buf.get_f32_le(),
            rollspeed: buf.get_f32_le(),
            pitchspeed: buf.get_f32_le(),
            yawspeed: buf.get_f32_le(),
        })
    }
}

/// Local position in the NED frame. Velocities are carried on the wire but
/// the bridge always sends them as zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalPositionNed {
    pub time_usec: u64,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,
}

impl LocalPositionNed {
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(32);
        buf.put_u64_le(self.time_usec);
        buf.put_f32_le(self.x);
        buf.put_f32_le(self.y);
        buf.put_f32_le(self.z);
        buf.put_f32_le(self.vx);
        buf.put_f32_le(self.vy);
        buf.put_f32_le(self.vz);
        buf.freeze()
    }

    pub fn decode(mut buf: Bytes) -> anyhow::Result<LocalPositionNed> {
        ensure!(buf.len() >= 32, "local position payload too short");
        Ok(LocalPositionNed {
            time_usec: buf.get_u64_le(),
            x: buf.get_f32_le(),
            y: buf.get_f32_le(),
            z: buf.get_f32_le(),
            vx: buf.get_f32_le(),
            vy: buf.get_f32_le(),
            vz: buf.get_f32_le(),
        })
    }
}

/// The GPS reference origin shared with the flight controller. Always a full
/// triple; a partial update is never sent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsGlobalOrigin {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl GpsGlobalOrigin {
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(24);
        buf.put_f64_le(self.latitude);
        buf.put_f64_le(self.longitude);
        buf.put_f64_le(self.altitude);
        buf.freeze()
    }

    pub fn decode(mut buf: Bytes) -> anyhow::Result<GpsGlobalOrigin> {
        ensure!(buf.len() >= 24, "origin payload too short");
        Ok(GpsGlobalOrigin {
            latitude: buf.get_f64_le(),
            longitude: buf.get_f64_le(),
            altitude: buf.get_f64_le(),
        })
    }
}

/// A local position setpoint received from the flight-controller side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetLocalPositionSetpoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub yaw: f32,
}

impl SetLocalPositionSetpoint {
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(16);
        buf.put_f32_le(self.x);
        buf.put_f32_le(self.y);
        buf.put_f32_le(self.z);
        buf.put_f32_le(self.yaw);
        buf.freeze()
    }

    pub fn decode(mut buf: Bytes) -> anyhow::Result<SetLocalPositionSetpoint> {
        ensure!(buf.len() >= 16, "setpoint payload too short");
        Ok(SetLocalPositionSetpoint {
            x: buf.get_f32_le(),
            y: buf.get_f32_le(),
            z: buf.get_f32_le(),
            yaw: buf.get_f32_le(),
        })
    }
}

/// The bridge's outbound message set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutboundMessage {
    Attitude(Attitude),
    LocalPositionNed(LocalPositionNed),
    GpsGlobalOrigin(GpsGlobalOrigin),
}

impl OutboundMessage {
    pub fn msgid(&self) -> u16 {
        match self {
            OutboundMessage::Attitude(_) => MSG_ID_ATTITUDE,
            OutboundMessage::LocalPositionNed(_) => MSG_ID_LOCAL_POSITION_NED,
            OutboundMessage::GpsGlobalOrigin(_) => MSG_ID_GPS_GLOBAL_ORIGIN,
        }
    }

    pub fn encode_payload(&self) -> Bytes {
        match self {
            OutboundMessage::Attitude(m) => m.encode(),
            OutboundMessage::LocalPositionNed(m) => m.encode(),
            OutboundMessage::GpsGlobalOrigin(m) => m.encode(),
        }
    }
}

/// Frames an outbound message into a container datagram.
pub fn pack(sysid: u8, compid: u8, message: &OutboundMessage) -> Bytes {
    Container {
        sysid,
        compid,
        msgid: message.msgid(),
        payload: message.encode_payload(),
    }
    .encode()
}

/// Parses a received datagram into a container, keeping the payload encoded
/// for the dispatch layer.
pub fn unpack(datagram: Bytes) -> anyhow::Result<Container> {
    Container::decode(datagram).context("malformed container")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_framing() {
        let setpoint = SetLocalPositionSetpoint {
            x: 1.0,
            y: 2.0,
            z: 3.0,
            yaw: 0.5,
        };

        let datagram = Container {
            sysid: 42,
            compid: 199,
            msgid: MSG_ID_SET_LOCAL_POSITION_SETPOINT,
            payload: setpoint.encode(),
        }
        .encode();

        let container = unpack(datagram).unwrap();
        assert_eq!(container.sysid, 42);
        assert_eq!(container.compid, 199);
        assert_eq!(container.msgid, MSG_ID_SET_LOCAL_POSITION_SETPOINT);

        let decoded = SetLocalPositionSetpoint::decode(container.payload).unwrap();
        assert_eq!(decoded, setpoint);
    }

    #[test]
    fn short_container_rejected() {
        assert!(unpack(Bytes::from_static(&[42, 199, 30])).is_err());
        assert!(SetLocalPositionSetpoint::decode(Bytes::from_static(&[0; 8])).is_err());
    }

    #[test]
    fn attitude_wire_layout() {
        let att = Attitude {
            time_usec: 1234567,
            roll: 0.1,
            pitch: -0.2,
            yaw: 1.5,
            rollspeed: 0.0,
            pitchspeed: 0.0,
            yawspeed: 0.0,
        };

        let bytes = att.encode();
        assert_eq!(bytes.len(), 32);
        assert_eq!(Attitude::decode(bytes).unwrap(), att);
    }

    #[test]
    fn origin_carries_full_triple() {
        let origin = GpsGlobalOrigin {
            latitude: 47.5,
            longitude: 8.5,
            altitude: 550.0,
        };

        let packed = pack(42, 199, &OutboundMessage::GpsGlobalOrigin(origin));
        let container = unpack(packed).unwrap();
        assert_eq!(container.msgid, MSG_ID_GPS_GLOBAL_ORIGIN);
        assert_eq!(GpsGlobalOrigin::decode(container.payload).unwrap(), origin);
    }
}
