//! Inbound message dispatch.
//!
//! Handlers are registered per msgid; the event loop decodes a container
//! and hands its payload to the matching handler. Containers with no
//! registered handler are ignored without a warning so that newer peers can
//! add message types without breaking older bridges.

use std::collections::HashMap;

use bytes::Bytes;
use tracing::*;

use crate::mavconn::msg::Container;

type Handler = Box<dyn FnMut(Bytes) -> anyhow::Result<()> + Send>;

#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<u16, Handler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `msgid`, replacing any previous handler.
    pub fn register<F>(&mut self, msgid: u16, handler: F)
    where
        F: FnMut(Bytes) -> anyhow::Result<()> + Send + 'static,
    {
        self.handlers.insert(msgid, Box::new(handler));
    }

    /// Routes one container. Unknown msgids are dropped silently; handler
    /// errors propagate to the event loop.
    pub fn dispatch(&mut self, container: Container) -> anyhow::Result<()> {
        match self.handlers.get_mut(&container.msgid) {
            Some(handler) => handler(container.payload),
            None => {
                trace!("ignoring container with msgid {}", container.msgid);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mavconn::msg::{self, SetLocalPositionSetpoint, MSG_ID_SET_LOCAL_POSITION_SETPOINT};

    #[test]
    fn routes_to_registered_handler() {
        let (tx, rx) = flume::unbounded();

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(MSG_ID_SET_LOCAL_POSITION_SETPOINT, move |payload| {
            let setpoint = SetLocalPositionSetpoint::decode(payload)?;
            tx.send(setpoint)?;
            Ok(())
        });

        let setpoint = SetLocalPositionSetpoint {
            x: 1.0,
            y: 2.0,
            z: 3.0,
            yaw: 0.5,
        };
        let container = msg::Container {
            sysid: 1,
            compid: 1,
            msgid: MSG_ID_SET_LOCAL_POSITION_SETPOINT,
            payload: setpoint.encode(),
        };

        dispatcher.dispatch(container).unwrap();
        assert_eq!(rx.try_recv().unwrap(), setpoint);
    }

    #[test]
    fn unknown_msgid_is_ignored() {
        let mut dispatcher = Dispatcher::new();
        let container = msg::Container {
            sysid: 1,
            compid: 1,
            msgid: 9999,
            payload: Bytes::from_static(&[1, 2, 3]),
        };

        // no handler registered: not an error
        dispatcher.dispatch(container).unwrap();
    }
}
