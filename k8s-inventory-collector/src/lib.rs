use std::error::Error;

use constcat::concat;
use k8s_inventory::Accumulator;
use k8s_inventory::FieldValue;
use k8s_inventory::Fields;
use k8s_inventory::NodeSource;
use k8s_inventory::QuantityExt as _;
use k8s_inventory::Tags;
use k8s_inventory::NODE_MEASUREMENT;
use k8s_inventory_ext as k8s;
use tokio_util::sync::CancellationToken;

use k8s::corev1;
use k8s::resource::Quantity;
use k8s::NodeExt as _;
use k8s::ResourceList;

const READY: &str = "Ready";
const CAPACITY_PREFIX: &str = "capacity_";
const ALLOCATABLE_PREFIX: &str = "allocatable_";

const CAPACITY: ResourceFields = ResourceFields {
    cpu: concat!(CAPACITY_PREFIX, "cpu_cores"),
    memory: concat!(CAPACITY_PREFIX, "memory_bytes"),
    pods: concat!(CAPACITY_PREFIX, "pods"),
};

const ALLOCATABLE: ResourceFields = ResourceFields {
    cpu: concat!(ALLOCATABLE_PREFIX, "cpu_cores"),
    memory: concat!(ALLOCATABLE_PREFIX, "memory_bytes"),
    pods: concat!(ALLOCATABLE_PREFIX, "pods"),
};

#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("failed to list nodes")]
    List(#[source] Box<dyn Error + Send + Sync>),
    #[error("node listing cancelled")]
    Cancelled,
    #[error("node without a name")]
    MissingNodeName,
}

/// Turns the cluster's nodes into `kubernetes_node` records.
#[derive(Debug)]
pub struct NodeCollector<S> {
    source: S,
}

impl<S: NodeSource> NodeCollector<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Runs one collection pass.
    ///
    /// Failing to list the nodes, cancellation, or a node that cannot be
    /// gathered ends the pass. The error is reported to `acc` once; records
    /// of nodes gathered before it stay in `acc`.
    pub async fn collect(&self, cancel: &CancellationToken, acc: &mut impl Accumulator) {
        if let Err(err) = self.try_collect(cancel, acc).await {
            acc.add_error(&err);
        }
    }

    async fn try_collect(
        &self,
        cancel: &CancellationToken,
        acc: &mut impl Accumulator,
    ) -> Result<(), CollectError> {
        let nodes = self.list_nodes(cancel).await?;
        tracing::debug!(count = nodes.len(), "Gathering nodes");
        for node in &nodes {
            gather_node(node, acc)?;
        }
        Ok(())
    }

    async fn list_nodes(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<corev1::Node>, CollectError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(CollectError::Cancelled),
            nodes = self.source.list_nodes() => nodes.map_err(|err| CollectError::List(Box::new(err))),
        }
    }
}

/// Emits the resource summary record of `node`, then one record per status
/// condition.
///
/// The condition records share one tag set: every condition overwrites
/// `status`, and the node info tags added on `Ready` stay on the records of
/// the conditions that follow it.
pub fn gather_node(node: &corev1::Node, acc: &mut impl Accumulator) -> Result<(), CollectError> {
    let name = node.node_name().ok_or(CollectError::MissingNodeName)?;
    let mut tags = Tags::from([("node_name".to_string(), name.to_string())]);

    let mut fields = Fields::new();
    if let Some(capacity) = node.capacity() {
        CAPACITY.gather(capacity, &mut fields);
    }
    if let Some(allocatable) = node.allocatable() {
        ALLOCATABLE.gather(allocatable, &mut fields);
    }
    acc.add_fields(NODE_MEASUREMENT, fields, tags.clone());

    for condition in node.conditions() {
        let fields = Fields::from([(
            "condition".to_string(),
            FieldValue::from(condition.type_.as_str()),
        )]);
        tags.insert("status".to_string(), condition.status.to_lowercase());

        if condition.type_ == READY {
            if let Some(info) = node.node_info() {
                add_node_info(&mut tags, info, node.spec.as_ref());
            }
        }

        acc.add_fields(NODE_MEASUREMENT, fields, tags.clone());
    }

    Ok(())
}

fn add_node_info(
    tags: &mut Tags,
    info: &corev1::NodeSystemInfo,
    spec: Option<&corev1::NodeSpec>,
) {
    let mut tag = |key: &str, value: &str| tags.insert(key.to_string(), value.to_string());

    tag("machine_id", &info.machine_id);
    tag("architecture", &info.architecture);
    tag("boot_id", &info.boot_id);
    tag("container_runtime_version", &info.container_runtime_version);
    tag("kernel_version", &info.kernel_version);
    tag("kubelet_version", &info.kubelet_version);
    tag("kube_proxy_version", &info.kube_proxy_version);
    tag("os_image", &info.os_image);
    tag("os", &info.operating_system);
    tag("system_uuid", &info.system_uuid);

    if let Some(spec) = spec {
        tag("pod_cidr", spec.pod_cidr.as_deref().unwrap_or_default());
        tag("provider_id", spec.provider_id.as_deref().unwrap_or_default());
    }
}

/// Field names for the `cpu`, `memory` and `pods` entries of one resource list.
#[derive(Debug)]
struct ResourceFields {
    cpu: &'static str,
    memory: &'static str,
    pods: &'static str,
}

impl ResourceFields {
    fn gather(&self, resources: &ResourceList, fields: &mut Fields) {
        for (resource, quantity) in resources {
            let (field, value) = match resource.as_str() {
                "cpu" => (self.cpu, integer(quantity)),
                "memory" => (self.memory, bytes(quantity)),
                "pods" => (self.pods, integer(quantity)),
                _ => continue,
            };
            fields.insert(field.to_string(), FieldValue::from(value));
        }
    }
}

fn integer(quantity: &Quantity) -> i64 {
    quantity.to_integer().unwrap_or_else(|err| {
        tracing::debug!(%err, "Failed to parse quantity");
        0
    })
}

fn bytes(quantity: &Quantity) -> i64 {
    quantity.to_bytes(1.0).unwrap_or_else(|err| {
        tracing::debug!(%err, "Failed to parse quantity");
        0
    })
}

#[cfg(test)]
mod tests;
