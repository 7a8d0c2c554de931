//! Reference-origin propagation.
//!
//! The robot side publishes its GPS reference origin through three
//! parameters on the parameter server. There is no change notification, so
//! the bridge polls on a fixed period and forwards the origin to the flight
//! controller whenever any of the three values moves.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::mavconn::msg::OutboundMessage;
use crate::mavconn::MavconnLink;
use crate::ros::ParamStore;
use crate::task::Task;
use crate::translate::origin_to_message;

pub const PARAM_REF_LATITUDE: &str = "/gps_ref_latitude";
pub const PARAM_REF_LONGITUDE: &str = "/gps_ref_longitude";
pub const PARAM_REF_ALTITUDE: &str = "/gps_ref_altitude";

/// Poll period for the parameter server.
pub const POLL_PERIOD: Duration = Duration::from_secs(2);

/// The cached reference origin. All three values zero means the origin has
/// never been set; the sentinel is only reset by process restart.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Origin {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

/// Polls the parameter server and tracks the last origin seen.
pub struct OriginWatcher {
    params: ParamStore,
    cached: Origin,
}

impl OriginWatcher {
    pub fn new(params: ParamStore) -> Self {
        OriginWatcher {
            params,
            cached: Origin::default(),
        }
    }

    /// Performs one polling round. Returns the full updated origin if any
    /// of the three parameters changed, `None` otherwise.
    ///
    /// Comparison is exact equality, not a tolerance: a value that
    /// round-trips bit-identically through the parameter server counts as
    /// unchanged. A parameter that is absent this round also counts as
    /// unchanged.
    pub fn poll(&mut self) -> Option<Origin> {
        let params = &self.params;
        let cached = &mut self.cached;
        let mut shifted = false;

        #[allow(clippy::float_cmp)]
        let mut check = |key: &str, slot: &mut f64| {
            if let Some(value) = params.get_cached(key) {
                if value != *slot {
                    *slot = value;
                    shifted = true;
                }
            }
        };

        check(PARAM_REF_LATITUDE, &mut cached.latitude);
        check(PARAM_REF_LONGITUDE, &mut cached.longitude);
        check(PARAM_REF_ALTITUDE, &mut cached.altitude);

        if shifted {
            Some(self.cached)
        } else {
            None
        }
    }
}

pub fn create_task(params: ParamStore, link: Arc<MavconnLink>) -> OriginTask {
    OriginTask {
        watcher: OriginWatcher::new(params),
        link,
    }
}

/// Periodic task driving [`OriginWatcher`] and publishing updates on the
/// link.
pub struct OriginTask {
    watcher: OriginWatcher,
    link: Arc<MavconnLink>,
}

#[async_trait]
impl Task for OriginTask {
    fn name(&self) -> &'static str {
        "origin"
    }

    async fn run(self: Box<Self>, cancel: CancellationToken) -> anyhow::Result<()> {
        let Self { mut watcher, link } = *self;

        let loop_fut = async move {
            let mut ticks = tokio::time::interval(POLL_PERIOD);
            ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticks.tick().await;

                if let Some(origin) = watcher.poll() {
                    let message = origin_to_message(origin.latitude, origin.longitude, origin.altitude);
                    link.send(&OutboundMessage::GpsGlobalOrigin(message)).await?;

                    debug!(
                        "sent gps global origin [{} {} {}]",
                        origin.latitude, origin.longitude, origin.altitude
                    );
                }
            }

            #[allow(unreachable_code)]
            Ok::<_, anyhow::Error>(())
        };

        select! {
            _ = cancel.cancelled() => {}
            res = loop_fut => { res? }
        }

        Ok(())
    }
}
