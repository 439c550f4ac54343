use std::fmt::Write as _;

use super::*;

/// Field set of a record, ordered by field name.
pub type Fields = BTreeMap<String, FieldValue>;

/// Tag set of a record, ordered by tag name.
pub type Tags = BTreeMap<String, String>;

/// A single field value: either an integer or a string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    String(String),
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl fmt::Display for FieldValue {
    /// Renders the value the way line protocol expects it: integers carry an
    /// `i` suffix, strings are double quoted with `"` and `\` escaped.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}i"),
            Self::String(value) => {
                f.write_char('"')?;
                for c in value.chars() {
                    if matches!(c, '"' | '\\') {
                        f.write_char('\\')?;
                    }
                    f.write_char(c)?;
                }
                f.write_char('"')
            }
        }
    }
}

/// One emitted metric record.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Metric {
    pub measurement: String,
    pub tags: Tags,
    pub fields: Fields,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl Metric {
    pub fn new(
        measurement: impl ToString,
        fields: Fields,
        tags: Tags,
        timestamp: OffsetDateTime,
    ) -> Self {
        Self {
            measurement: measurement.to_string(),
            tags,
            fields,
            timestamp,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    /// Renders the record as a single line of InfluxDB line protocol.
    ///
    /// Tags with an empty value are left out. Returns `None` for a record
    /// without fields since line protocol cannot express it.
    pub fn to_line_protocol(&self) -> Option<String> {
        if self.fields.is_empty() {
            return None;
        }

        let mut line = escape(&self.measurement, &[',', ' ']);
        for (key, value) in self.tags.iter().filter(|(_, value)| !value.is_empty()) {
            let _ = write!(
                line,
                ",{}={}",
                escape(key, &[',', '=', ' ']),
                escape(value, &[',', '=', ' '])
            );
        }

        let fields = self
            .fields
            .iter()
            .map(|(key, value)| format!("{}={value}", escape(key, &[',', '=', ' '])))
            .collect::<Vec<_>>()
            .join(",");
        let _ = write!(line, " {fields} {}", self.timestamp.unix_timestamp_nanos());

        Some(line)
    }
}

fn escape(text: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
