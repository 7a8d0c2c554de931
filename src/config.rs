use serde::Deserialize;

/// Bridge settings. Defaults match the deployed mavconn network: system 42,
/// component 199, LCM-style multicast with the stock group.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    pub sysid: u8,
    pub compid: u8,
    pub url: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            sysid: 42,
            compid: 199,
            url: "udpm://".into(),
        }
    }
}
