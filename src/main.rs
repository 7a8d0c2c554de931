use anyhow::Context;
use clap::Parser;
use ctrlc;
use tokio_util::sync::CancellationToken;
use tracing::metadata::LevelFilter;
use tracing_subscriber::{filter::Targets, layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[macro_use]
extern crate tracing;

use mavconn_bridge::{bridge, ros};

mod cli;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    // setup colorful backtraces
    color_backtrace::install();

    let args = cli::MainArgs::parse();

    // --verbose surfaces the per-message translation events
    let default_level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let mut targets = Targets::new().with_default(default_level);

    if let Ok(directives) = std::env::var("RUST_LOG") {
        for directive in directives.split(',') {
            if let Some((target, level)) = directive.split_once('=') {
                targets = targets.with_target(
                    target,
                    level.parse::<LevelFilter>().context("invalid log level")?,
                );
            } else {
                targets = targets.with_default(
                    directive
                        .parse::<LevelFilter>()
                        .context("invalid log level")?,
                );
            }
        }
    }

    let (writer, _guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::hourly("logs", "mavconn-bridge"));

    tracing_subscriber::registry()
        // writer that outputs to console
        .with(tracing_subscriber::fmt::layer().with_filter(targets))
        // writer that outputs to files
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(
                    Targets::new().with_targets(vec![("mavconn_bridge", LevelFilter::DEBUG)]),
                ),
        )
        .init();

    let config = args.to_config();
    debug!("bridge config: {:?}", config);

    // the robot-side binding attaches to these ends; they stay alive for
    // the lifetime of the process
    let (handle, _endpoints) = ros::endpoints();

    // fatal if the link cannot be opened
    let bridge = bridge::Bridge::new(&config, handle)
        .await
        .context("failed to start bridge")?;

    let cancel = CancellationToken::new();

    ctrlc::set_handler({
        let cancel = cancel.clone();
        move || {
            info!("received interrupt, shutting down");
            cancel.cancel();
        }
    })
    .expect("could not set ctrl+c handler");

    bridge.run(cancel).await
}
