use clap::Parser;

use mavconn_bridge::config::BridgeConfig;

/// Translate messages between the robot pub/sub side and the mavconn
/// network.
#[derive(Debug, Parser)]
pub struct MainArgs {
    /// ID of this system, 1-255
    #[clap(long, short = 'a', default_value = "42")]
    pub sysid: u8,

    /// ID of this component, 1-255
    #[clap(long, short = 'c', default_value = "199")]
    pub compid: u8,

    /// Link URL to connect to (udpm:// or udp://host:port)
    #[clap(long, short = 'l', default_value = "udpm://")]
    pub url: String,

    /// Verbose output
    #[clap(long, short = 'v')]
    pub verbose: bool,
}

impl MainArgs {
    pub fn to_config(&self) -> BridgeConfig {
        BridgeConfig {
            sysid: self.sysid,
            compid: self.compid,
            url: self.url.clone(),
        }
    }
}
