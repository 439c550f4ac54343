use super::*;

/// Outcome of the most recent collection pass.
#[derive(Debug, Default)]
pub(crate) struct Inventory {
    latest: RwLock<MetricBuffer>,
}

impl Inventory {
    pub(crate) async fn latest(&self) -> MetricBuffer {
        self.latest.read().await.clone()
    }

    pub(crate) async fn publish(&self, buffer: MetricBuffer) {
        *self.latest.write().await = buffer;
    }
}

/// Runs a collection pass every `interval` until `cancel` fires.
pub(crate) async fn collect_nodes<S>(
    collector: NodeCollector<S>,
    inventory: Arc<Inventory>,
    interval: Duration,
    cancel: CancellationToken,
) where
    S: NodeSource,
{
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let mut buffer = MetricBuffer::new();
        collector.collect(&cancel, &mut buffer).await;
        if cancel.is_cancelled() {
            break;
        }

        for error in buffer.errors() {
            tracing::warn!(%error, "Node collection failed");
        }
        tracing::debug!(records = buffer.metrics().len(), "Collection pass finished");
        inventory.publish(buffer).await;
    }

    tracing::info!("Node collection stopped");
}
