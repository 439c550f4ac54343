use super::*;

/// Read access to the parts of a node the inventory cares about, plus a few
/// builders for assembling nodes by hand.
pub trait NodeExt {
    fn new(name: impl ToString) -> Self;

    fn node_name(&self) -> Option<&str>;
    fn capacity(&self) -> Option<&ResourceList>;
    fn allocatable(&self) -> Option<&ResourceList>;
    fn conditions(&self) -> &[corev1::NodeCondition];
    fn node_info(&self) -> Option<&corev1::NodeSystemInfo>;

    fn with_capacity<I, K, V>(self, resources: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: ToString,
        V: ToString;
    fn with_allocatable<I, K, V>(self, resources: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: ToString,
        V: ToString;
    fn with_condition(self, type_: impl ToString, status: impl ToString) -> Self;
    fn with_node_info(self, info: corev1::NodeSystemInfo) -> Self;
    fn with_spec(self, spec: corev1::NodeSpec) -> Self;
}

impl NodeExt for corev1::Node {
    fn new(name: impl ToString) -> Self {
        Self {
            metadata: <metav1::ObjectMeta as ObjectMetaExt>::new(name),
            ..default()
        }
    }

    fn node_name(&self) -> Option<&str> {
        self.metadata.name.as_deref()
    }

    fn capacity(&self) -> Option<&ResourceList> {
        self.status.as_ref()?.capacity.as_ref()
    }

    fn allocatable(&self) -> Option<&ResourceList> {
        self.status.as_ref()?.allocatable.as_ref()
    }

    fn conditions(&self) -> &[corev1::NodeCondition] {
        self.status
            .as_ref()
            .and_then(|status| status.conditions.as_deref())
            .unwrap_or_default()
    }

    fn node_info(&self) -> Option<&corev1::NodeSystemInfo> {
        self.status.as_ref()?.node_info.as_ref()
    }

    fn with_capacity<I, K, V>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: ToString,
        V: ToString,
    {
        self.status.get_or_insert_with(default).capacity = Some(resource_list(resources));
        self
    }

    fn with_allocatable<I, K, V>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: ToString,
        V: ToString,
    {
        self.status.get_or_insert_with(default).allocatable = Some(resource_list(resources));
        self
    }

    fn with_condition(mut self, type_: impl ToString, status: impl ToString) -> Self {
        let condition = corev1::NodeCondition {
            type_: type_.to_string(),
            status: status.to_string(),
            ..default()
        };
        self.status
            .get_or_insert_with(default)
            .conditions
            .get_or_insert_with(Vec::new)
            .push(condition);
        self
    }

    fn with_node_info(mut self, info: corev1::NodeSystemInfo) -> Self {
        self.status.get_or_insert_with(default).node_info = Some(info);
        self
    }

    fn with_spec(self, spec: corev1::NodeSpec) -> Self {
        Self {
            spec: Some(spec),
            ..self
        }
    }
}

fn resource_list<I, K, V>(resources: I) -> ResourceList
where
    I: IntoIterator<Item = (K, V)>,
    K: ToString,
    V: ToString,
{
    resources
        .into_iter()
        .map(|(name, quantity)| (name.to_string(), resource::Quantity(quantity.to_string())))
        .collect()
}
