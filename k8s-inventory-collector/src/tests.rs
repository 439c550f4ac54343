use std::time::Duration;

use async_trait::async_trait;
use k8s_inventory::Metric;
use k8s_inventory::MetricBuffer;

use super::*;

const NODE_INFO_TAGS: [&str; 10] = [
    "machine_id",
    "architecture",
    "boot_id",
    "container_runtime_version",
    "kernel_version",
    "kubelet_version",
    "kube_proxy_version",
    "os_image",
    "os",
    "system_uuid",
];

#[derive(Debug, thiserror::Error)]
#[error("connection refused")]
struct Unreachable;

mockall::mock! {
    Source {}

    #[async_trait]
    impl NodeSource for Source {
        type Error = Unreachable;

        async fn list_nodes(&self) -> Result<Vec<corev1::Node>, Unreachable>;
    }
}

/// Never answers a list request.
#[derive(Debug)]
struct Stalled;

#[async_trait]
impl NodeSource for Stalled {
    type Error = Unreachable;

    async fn list_nodes(&self) -> Result<Vec<corev1::Node>, Unreachable> {
        std::future::pending().await
    }
}

fn source(nodes: Vec<corev1::Node>) -> MockSource {
    let mut source = MockSource::new();
    source
        .expect_list_nodes()
        .returning(move || Ok(nodes.clone()));
    source
}

fn node_info() -> corev1::NodeSystemInfo {
    corev1::NodeSystemInfo {
        machine_id: "ec2a9f3c".to_string(),
        architecture: "amd64".to_string(),
        boot_id: "4c2d1f5e".to_string(),
        container_runtime_version: "containerd://1.7.13".to_string(),
        kernel_version: "6.1.0-18-cloud-amd64".to_string(),
        kubelet_version: "v1.30.2".to_string(),
        kube_proxy_version: "v1.30.2".to_string(),
        os_image: "Debian GNU/Linux 12 (bookworm)".to_string(),
        operating_system: "linux".to_string(),
        system_uuid: "ec2a9f3c-0000-0000-0000-000000000000".to_string(),
        ..k8s::default()
    }
}

fn worker(name: &str) -> corev1::Node {
    corev1::Node::new(name)
        .with_capacity([
            ("cpu", "4"),
            ("memory", "8Gi"),
            ("pods", "110"),
            ("ephemeral-storage", "100Gi"),
        ])
        .with_allocatable([
            ("cpu", "3"),
            ("memory", "7Gi"),
            ("pods", "100"),
            ("hugepages-2Mi", "0"),
        ])
        .with_condition("MemoryPressure", "False")
        .with_condition("Ready", "True")
        .with_condition("DiskPressure", "False")
        .with_node_info(node_info())
        .with_spec(corev1::NodeSpec {
            pod_cidr: Some("10.244.1.0/24".to_string()),
            provider_id: Some("aws:///us-east-1a/i-0abc".to_string()),
            ..k8s::default()
        })
}

async fn collect(source: MockSource) -> MetricBuffer {
    let collector = NodeCollector::new(source);
    let mut buffer = MetricBuffer::new();
    collector.collect(&CancellationToken::new(), &mut buffer).await;
    buffer
}

fn gather(node: &corev1::Node) -> Vec<Metric> {
    let mut buffer = MetricBuffer::new();
    gather_node(node, &mut buffer).unwrap();
    assert!(buffer.errors().is_empty());
    buffer.metrics().to_vec()
}

fn has_node_info(metric: &Metric) -> bool {
    NODE_INFO_TAGS.iter().all(|tag| metric.tag(tag).is_some())
}

#[test]
fn resource_summary() {
    let metrics = gather(&worker("node-1"));
    let summary = &metrics[0];

    let expected = Fields::from([
        ("capacity_cpu_cores".to_string(), FieldValue::Integer(4)),
        ("capacity_memory_bytes".to_string(), FieldValue::Integer(8_589_934_592)),
        ("capacity_pods".to_string(), FieldValue::Integer(110)),
        ("allocatable_cpu_cores".to_string(), FieldValue::Integer(3)),
        ("allocatable_memory_bytes".to_string(), FieldValue::Integer(7_516_192_768)),
        ("allocatable_pods".to_string(), FieldValue::Integer(100)),
    ]);
    assert_eq!(summary.measurement, NODE_MEASUREMENT);
    assert_eq!(summary.fields, expected);
    assert_eq!(
        summary.tags,
        Tags::from([("node_name".to_string(), "node-1".to_string())])
    );
}

#[test]
fn allocatable_is_independent_of_capacity() {
    let node = corev1::Node::new("node-1").with_allocatable([("cpu", "2"), ("memory", "1Gi")]);
    let metrics = gather(&node);

    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].field("allocatable_cpu_cores"), Some(&FieldValue::Integer(2)));
    assert_eq!(
        metrics[0].field("allocatable_memory_bytes"),
        Some(&FieldValue::Integer(1_073_741_824))
    );
    assert!(metrics[0].field("capacity_cpu_cores").is_none());
    assert!(metrics[0].field("allocatable_pods").is_none());
}

#[test]
fn unknown_resources_are_ignored() {
    let node = corev1::Node::new("node-1").with_capacity([("ephemeral-storage", "100Gi")]);
    let metrics = gather(&node);
    assert!(metrics[0].fields.is_empty());
}

#[test]
fn unparsable_quantities_are_zero() {
    let node = corev1::Node::new("node-1").with_capacity([("cpu", "3500m"), ("memory", "lots")]);
    let metrics = gather(&node);
    assert_eq!(metrics[0].field("capacity_cpu_cores"), Some(&FieldValue::Integer(0)));
    assert_eq!(metrics[0].field("capacity_memory_bytes"), Some(&FieldValue::Integer(0)));
}

#[test]
fn one_record_per_condition() {
    let metrics = gather(&worker("node-1"));
    assert_eq!(metrics.len(), 4);

    let conditions = metrics[1..]
        .iter()
        .map(|metric| (metric.field("condition"), metric.tag("status")))
        .collect::<Vec<_>>();
    assert_eq!(
        conditions,
        [
            (Some(&FieldValue::from("MemoryPressure")), Some("false")),
            (Some(&FieldValue::from("Ready")), Some("true")),
            (Some(&FieldValue::from("DiskPressure")), Some("false")),
        ]
    );
    for metric in &metrics[1..] {
        assert_eq!(metric.measurement, NODE_MEASUREMENT);
        assert_eq!(metric.fields.len(), 1);
        assert_eq!(metric.tag("node_name"), Some("node-1"));
    }
}

#[test]
fn node_info_persists_after_ready() {
    let metrics = gather(&worker("node-1"));
    let (memory_pressure, ready, disk_pressure) = (&metrics[1], &metrics[2], &metrics[3]);

    assert!(!has_node_info(&metrics[0]));
    assert!(!has_node_info(memory_pressure));
    assert!(memory_pressure.tag("pod_cidr").is_none());

    assert!(has_node_info(ready));
    assert_eq!(ready.tag("os"), Some("linux"));
    assert_eq!(ready.tag("kubelet_version"), Some("v1.30.2"));
    assert_eq!(ready.tag("pod_cidr"), Some("10.244.1.0/24"));
    assert_eq!(ready.tag("provider_id"), Some("aws:///us-east-1a/i-0abc"));

    assert!(has_node_info(disk_pressure));
    assert_eq!(disk_pressure.tag("status"), Some("false"));
    assert_eq!(disk_pressure.tag("pod_cidr"), Some("10.244.1.0/24"));
}

#[test]
fn ready_without_node_info() {
    let node = corev1::Node::new("node-1")
        .with_condition("Ready", "True")
        .with_spec(corev1::NodeSpec {
            pod_cidr: Some("10.244.1.0/24".to_string()),
            ..k8s::default()
        });
    let metrics = gather(&node);

    assert_eq!(metrics.len(), 2);
    assert_eq!(
        metrics[1].tags,
        Tags::from([
            ("node_name".to_string(), "node-1".to_string()),
            ("status".to_string(), "true".to_string()),
        ])
    );
}

#[test]
fn ready_without_spec() {
    let node = corev1::Node::new("node-1")
        .with_condition("Ready", "Unknown")
        .with_node_info(node_info());
    let metrics = gather(&node);

    assert!(has_node_info(&metrics[1]));
    assert_eq!(metrics[1].tag("status"), Some("unknown"));
    assert!(metrics[1].tag("pod_cidr").is_none());
    assert!(metrics[1].tag("provider_id").is_none());
}

#[test]
fn spec_without_pod_cidr() {
    let node = corev1::Node::new("node-1")
        .with_condition("Ready", "True")
        .with_node_info(node_info())
        .with_spec(k8s::default());
    let metrics = gather(&node);

    assert_eq!(metrics[1].tag("pod_cidr"), Some(""));
    assert_eq!(metrics[1].tag("provider_id"), Some(""));
}

#[test]
fn only_exact_ready_adds_node_info() {
    let node = corev1::Node::new("node-1")
        .with_condition("ready", "True")
        .with_condition("NotReady", "True")
        .with_node_info(node_info());
    let metrics = gather(&node);
    assert!(metrics.iter().all(|metric| !has_node_info(metric)));
}

#[test]
fn missing_node_name() {
    let mut buffer = MetricBuffer::new();
    let err = gather_node(&k8s::default(), &mut buffer).unwrap_err();
    assert!(matches!(err, CollectError::MissingNodeName));
    assert!(buffer.metrics().is_empty());
}

#[tokio::test]
async fn collects_every_node() {
    let buffer = collect(source(vec![worker("node-1"), worker("node-2")])).await;

    assert!(buffer.errors().is_empty());
    assert_eq!(buffer.metrics().len(), 8);
    let second = &buffer.metrics()[4..];
    assert!(second
        .iter()
        .all(|metric| metric.tag("node_name") == Some("node-2")));
    assert!(!has_node_info(&second[0]));
    assert!(second[0].tag("status").is_none());
    assert!(!has_node_info(&second[1]));
}

#[tokio::test]
async fn empty_cluster() {
    let buffer = collect(source(Vec::new())).await;
    assert!(buffer.is_empty());
}

#[tokio::test]
async fn list_failure() {
    let mut source = MockSource::new();
    source
        .expect_list_nodes()
        .times(1)
        .returning(|| Err(Unreachable));
    let buffer = collect(source).await;

    assert!(buffer.metrics().is_empty());
    assert_eq!(buffer.errors(), ["failed to list nodes: connection refused"]);
}

#[tokio::test]
async fn cancelled() {
    let collector = NodeCollector::new(source(vec![worker("node-1")]));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut buffer = MetricBuffer::new();
    collector.collect(&cancel, &mut buffer).await;

    assert!(buffer.metrics().is_empty());
    assert_eq!(buffer.errors(), ["node listing cancelled"]);
}

#[tokio::test]
async fn cancelled_while_listing() {
    let collector = NodeCollector::new(Stalled);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let mut buffer = MetricBuffer::new();
    tokio::time::timeout(Duration::from_secs(5), collector.collect(&cancel, &mut buffer))
        .await
        .unwrap();

    assert!(cancel.is_cancelled());
    assert!(buffer.metrics().is_empty());
    assert_eq!(buffer.errors(), ["node listing cancelled"]);
}

#[tokio::test]
async fn node_failure_stops_the_pass() {
    let nameless = corev1::Node {
        status: worker("nameless").status,
        ..k8s::default()
    };
    let buffer = collect(source(vec![worker("node-1"), nameless, worker("node-3")])).await;

    assert_eq!(buffer.metrics().len(), 4);
    assert!(buffer
        .metrics()
        .iter()
        .all(|metric| metric.tag("node_name") == Some("node-1")));
    assert_eq!(buffer.errors(), ["node without a name"]);
}
