use super::*;

/// Sink for the records and errors produced by a collection pass.
pub trait Accumulator {
    fn add_fields(&mut self, measurement: &str, fields: Fields, tags: Tags);

    fn add_error(&mut self, error: &(dyn Error + 'static));
}

/// In-memory accumulator holding the outcome of one collection pass.
///
/// Records are stamped with the time they were added.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MetricBuffer {
    metrics: Vec<Metric>,
    errors: Vec<String>,
}

impl MetricBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.errors.is_empty()
    }

    /// Renders every record carrying at least one field as line protocol,
    /// one record per line.
    pub fn to_line_protocol(&self) -> String {
        self.metrics
            .iter()
            .filter_map(Metric::to_line_protocol)
            .fold(String::new(), |mut text, line| {
                text.push_str(&line);
                text.push('\n');
                text
            })
    }
}

impl Accumulator for MetricBuffer {
    fn add_fields(&mut self, measurement: &str, fields: Fields, tags: Tags) {
        let metric = Metric::new(measurement, fields, tags, OffsetDateTime::now_utc());
        self.metrics.push(metric);
    }

    fn add_error(&mut self, error: &(dyn Error + 'static)) {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        self.errors.push(message);
    }
}
