use std::fmt::Debug;

use async_trait::async_trait;
use k8s_inventory::NodeSource;
use k8s_inventory_ext as k8s;
use kube::api;

use k8s::corev1;

pub struct KubeApi {
    list_params: api::ListParams,
    client: kube::Client,
}

impl KubeApi {
    /// Create a KubeApi configured with a default Kubernetes client.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn run() -> Result<(), kube::Error> {
    /// let api = k8s_inventory_kubeapi::KubeApi::new().await?;
    /// // use `api`...
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new() -> kube::Result<Self> {
        kube::Client::try_default().await.map(Self::with_client)
    }

    /// Create a KubeApi backed by the provided Kubernetes client.
    ///
    /// The returned KubeApi lists every node with default `ListParams`.
    pub fn with_client(client: kube::Client) -> Self {
        Self {
            list_params: api::ListParams::default(),
            client,
        }
    }

    /// Restricts node listing to nodes matching `selector`.
    ///
    /// ```no_run
    /// # async fn run() -> Result<(), kube::Error> {
    /// let api = k8s_inventory_kubeapi::KubeApi::new()
    ///     .await?
    ///     .label_selector("node-role.kubernetes.io/worker");
    /// # Ok(())
    /// # }
    /// ```
    pub fn label_selector(self, selector: &str) -> Self {
        Self {
            list_params: self.list_params.labels(selector),
            ..self
        }
    }

    /// Lists all Nodes in the cluster, including their status.
    ///
    /// # Returns
    ///
    /// A `kube::Result` containing one `corev1::Node` per discovered Node; the
    /// `Err` variant indicates a request or API error.
    pub async fn list_nodes(&self) -> kube::Result<Vec<corev1::Node>> {
        let lp = self.list_params();
        let nodes = self.nodes().list(lp).await?.items;
        tracing::debug!(count = nodes.len(), "Listed nodes");
        Ok(nodes)
    }

    /// Returns an Api handle scoped to all Nodes using the configured Kubernetes client.
    fn nodes(&self) -> api::Api<corev1::Node> {
        api::Api::all(self.client.clone())
    }

    /// Accesses the list query parameters applied to node list requests.
    fn list_params(&self) -> &api::ListParams {
        &self.list_params
    }
}

#[async_trait]
impl NodeSource for KubeApi {
    type Error = kube::Error;

    async fn list_nodes(&self) -> Result<Vec<corev1::Node>, Self::Error> {
        Self::list_nodes(self).await
    }
}

impl Debug for KubeApi {
    /// Formats the `KubeApi` for debugging, showing `list_params` while redacting the `client`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeApi")
            .field("list_params", &self.list_params)
            .field("client", &"<kube::Client>")
            .finish()
    }
}
