use super::context::BuildContext;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait WorkflowPhase: Send + Sync {
    async fn execute(&self, context: &mut BuildContext) -> Result<()>;
}
