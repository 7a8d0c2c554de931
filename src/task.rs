use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// A long-running unit of the bridge. Tasks run until cancelled or until
/// their transport fails.
#[async_trait]
pub trait Task: Send {
    fn name(&self) -> &'static str;

    async fn run(self: Box<Self>, cancel: CancellationToken) -> anyhow::Result<()>;
}
