use async_trait::async_trait;

use super::*;

/// Something that can list the cluster's nodes.
#[async_trait]
pub trait NodeSource: Send + Sync {
    type Error: Error + Send + Sync + 'static;

    async fn list_nodes(&self) -> Result<Vec<corev1::Node>, Self::Error>;
}
