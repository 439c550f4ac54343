use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::apimachinery::pkg::api::resource;
use serde::Serialize;
use time::OffsetDateTime;

pub use accumulator::Accumulator;
pub use accumulator::MetricBuffer;
pub use metric::FieldValue;
pub use metric::Fields;
pub use metric::Metric;
pub use metric::Tags;
pub use quantity::QuantityExt;
pub use quantity::QuantityParseError;
pub use source::NodeSource;

mod accumulator;
mod metric;
mod quantity;
mod source;

/// Measurement name shared by every record describing a node.
pub const NODE_MEASUREMENT: &str = "kubernetes_node";
