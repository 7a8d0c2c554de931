//! Bridge assembly: owns the link and the transport-A channel ends, wires
//! the translators into the two event loops, and manages the task
//! lifecycle.
//!
//! Three flows share the link's send primitive:
//!
//! - pose topic → attitude + local position containers (PoseTask)
//! - setpoint container → waypoint goal topic (LinkTask)
//! - parameter poll → gps global origin container (OriginTask)

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tokio::select;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::config::BridgeConfig;
use crate::mavconn::dispatch::Dispatcher;
use crate::mavconn::msg::{
    OutboundMessage, SetLocalPositionSetpoint, MSG_ID_SET_LOCAL_POSITION_SETPOINT,
};
use crate::mavconn::MavconnLink;
use crate::origin;
use crate::ros::{GoalTx, PoseRx, RosHandle};
use crate::task::Task;
use crate::translate::{pose_to_telemetry, setpoint_to_goal};

/// Forwards pose samples from the robot's pose topic to the link.
///
/// Translation and publish happen inline before the next sample is taken,
/// so a slow link send backpressures the pose channel. Accepted: the pose
/// stream is low-rate and the channel is bounded.
pub struct PoseTask {
    pose_rx: PoseRx,
    link: Arc<MavconnLink>,
}

#[async_trait]
impl Task for PoseTask {
    fn name(&self) -> &'static str {
        "bridge/pose"
    }

    async fn run(self: Box<Self>, cancel: CancellationToken) -> anyhow::Result<()> {
        let Self { pose_rx, link } = *self;

        let loop_fut = async move {
            while let Ok(pose) = pose_rx.recv_async().await {
                let (attitude, position) = pose_to_telemetry(&pose);

                link.send(&OutboundMessage::Attitude(attitude)).await?;
                link.send(&OutboundMessage::LocalPositionNed(position)).await?;

                debug!("sent mavconn local position and attitude messages");
            }

            Ok::<_, anyhow::Error>(())
        };

        select! {
            _ = cancel.cancelled() => {}
            res = loop_fut => { res? }
        }

        Ok(())
    }
}

/// Drains inbound containers from the link and dispatches them.
///
/// Each iteration is one bounded readiness wait; a timeout with nothing
/// pending just re-enters the wait after checking for shutdown. Bad input
/// (unparseable datagrams, short payloads) is logged and skipped; only
/// socket failures take the task down.
pub struct LinkTask {
    link: Arc<MavconnLink>,
    dispatcher: Dispatcher,
}

#[async_trait]
impl Task for LinkTask {
    fn name(&self) -> &'static str {
        "bridge/link"
    }

    async fn run(self: Box<Self>, cancel: CancellationToken) -> anyhow::Result<()> {
        let Self {
            link,
            mut dispatcher,
        } = *self;

        while !cancel.is_cancelled() {
            let recv = select! {
                _ = cancel.cancelled() => break,
                res = link.recv_timeout() => res?,
            };

            if let Some(container) = recv {
                let msgid = container.msgid;
                if let Err(err) = dispatcher.dispatch(container) {
                    warn!("dropping container with msgid {msgid}: {err:#}");
                }
            }
        }

        Ok(())
    }
}

/// Builds the dispatcher for the link's inbound side. Currently only the
/// local position setpoint is handled; everything else passes through the
/// dispatcher's ignore path.
fn inbound_dispatcher(goal_tx: GoalTx) -> Dispatcher {
    let mut dispatcher = Dispatcher::new();

    dispatcher.register(MSG_ID_SET_LOCAL_POSITION_SETPOINT, move |payload| {
        let setpoint = SetLocalPositionSetpoint::decode(payload)?;
        let goal = setpoint_to_goal(&setpoint);

        goal_tx
            .send(goal)
            .context("goal topic subscriber went away")?;

        debug!(
            "sent waypoint goal [{:.2} {:.2} {:.2} {:.2}]",
            setpoint.x, setpoint.y, setpoint.z, setpoint.yaw
        );

        Ok(())
    });

    dispatcher
}

/// The assembled bridge: link plus the tasks that drive it.
pub struct Bridge {
    tasks: Vec<Box<dyn Task>>,
}

impl Bridge {
    /// Opens the link and wires the tasks. Failure to open the link is
    /// fatal to the caller; there is nothing to bridge without it.
    pub async fn new(config: &BridgeConfig, ros: RosHandle) -> anyhow::Result<Bridge> {
        let link = MavconnLink::open(&config.url, config.sysid, config.compid)
            .await
            .with_context(|| format!("failed to open mavconn link {:?}", config.url))?;

        Ok(Self::with_link(link, ros))
    }

    /// Wires the tasks onto an already-open link. Tests use this to run the
    /// bridge over a loopback socket pair.
    pub fn with_link(link: MavconnLink, ros: RosHandle) -> Bridge {
        let link = Arc::new(link);

        let RosHandle {
            pose_rx,
            goal_tx,
            params,
        } = ros;

        let tasks: Vec<Box<dyn Task>> = vec![
            Box::new(PoseTask {
                pose_rx,
                link: link.clone(),
            }),
            Box::new(LinkTask {
                link: link.clone(),
                dispatcher: inbound_dispatcher(goal_tx),
            }),
            Box::new(origin::create_task(params, link)),
        ];

        Bridge { tasks }
    }

    /// Spawns the bridge onto the runtime and returns a handle for stopping
    /// it. Callers that need to tie the lifetime to an external signal (as
    /// main does with ctrl-c) can use [`Bridge::run`] directly instead.
    pub fn start(self) -> BridgeHandle {
        let cancel = CancellationToken::new();
        let join = tokio::spawn(self.run(cancel.clone()));

        BridgeHandle { cancel, join }
    }

    /// Runs all tasks until `cancel` fires or one of them fails. On
    /// cancellation the readiness loop exits first among the link users;
    /// the link socket closes when the last task drops its handle.
    pub async fn run(self, cancel: CancellationToken) -> anyhow::Result<()> {
        let mut join_set = JoinSet::new();

        for task in self.tasks {
            debug!("starting {} task", task.name());
            join_set.spawn(task.run(cancel.clone()));
        }

        while let Some(res) = join_set.join_next().await {
            // if task panicked, then will be Some(Err)
            // if task terminated w/ error, then will be Some(Ok(Err))
            // need to propagate errors in both cases

            match res {
                Err(err) => {
                    cancel.cancel();
                    return Err(err).context("task failed");
                }
                Ok(Err(err)) => {
                    cancel.cancel();
                    return Err(err).context("task terminated with error");
                }
                _ => {
                    info!("exited task");
                }
            }
        }

        Ok(())
    }
}

/// A running bridge. Dropping the handle without calling [`stop`] detaches
/// the tasks; they keep running until the runtime shuts down.
///
/// [`stop`]: BridgeHandle::stop
pub struct BridgeHandle {
    cancel: CancellationToken,
    join: tokio::task::JoinHandle<anyhow::Result<()>>,
}

impl BridgeHandle {
    /// Signals shutdown and waits for the tasks to drain. In-flight sends
    /// finish; nothing is cancelled mid-datagram.
    pub async fn stop(self) -> anyhow::Result<()> {
        self.cancel.cancel();
        self.join.await.context("bridge task panicked")?
    }
}
