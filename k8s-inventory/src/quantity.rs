use super::*;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum QuantityParseError {
    #[error("empty quantity")]
    Empty,
    #[error("invalid number in quantity {0:?}")]
    InvalidNumber(String),
    #[error("unknown suffix {suffix:?} in quantity {quantity:?}")]
    UnknownSuffix { quantity: String, suffix: String },
    #[error("quantity {0:?} is not a plain integer")]
    NotInteger(String),
}

pub trait QuantityExt {
    /// Parses the quantity as a plain base-10 integer, without suffix handling.
    fn to_integer(&self) -> Result<i64, QuantityParseError>;

    /// Parses the quantity, applying its binary, decimal or exponent suffix.
    fn to_f64(&self) -> Result<f64, QuantityParseError>;

    /// Converts the quantity to a byte count scaled by `multiplier`.
    ///
    /// Multipliers below 1 are treated as 1. The result is truncated.
    ///
    /// ```
    /// # use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    /// use k8s_inventory::QuantityExt as _;
    ///
    /// let memory = Quantity("8Gi".to_string());
    /// assert_eq!(memory.to_bytes(1.0), Ok(8_589_934_592));
    /// ```
    fn to_bytes(&self, multiplier: f64) -> Result<i64, QuantityParseError>;
}

impl QuantityExt for resource::Quantity {
    fn to_integer(&self) -> Result<i64, QuantityParseError> {
        self.0
            .parse()
            .map_err(|_| QuantityParseError::NotInteger(self.0.clone()))
    }

    fn to_f64(&self) -> Result<f64, QuantityParseError> {
        parse(&self.0)
    }

    fn to_bytes(&self, multiplier: f64) -> Result<i64, QuantityParseError> {
        let multiplier = multiplier.max(1.0);
        self.to_f64().map(|value| (value * multiplier) as i64)
    }
}

fn parse(quantity: &str) -> Result<f64, QuantityParseError> {
    let text = quantity.trim();
    if text.is_empty() {
        return Err(QuantityParseError::Empty);
    }

    let split = text
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.')))
        .unwrap_or(text.len());
    let (number, suffix) = text.split_at(split);

    let invalid_number = || QuantityParseError::InvalidNumber(quantity.to_string());
    let value = number.parse::<f64>().map_err(|_| invalid_number())?;
    let scale = Scale::from_suffix(suffix).ok_or_else(|| QuantityParseError::UnknownSuffix {
        quantity: quantity.to_string(),
        suffix: suffix.to_string(),
    })?;

    match scale {
        Scale::Binary(power) => Ok(value * 1024_f64.powi(power)),
        // A single conversion of the full decimal keeps `4.1G` at 4100000000
        Scale::Decimal(exponent) => {
            let number = number.trim_end_matches('.');
            format!("{number}e{exponent}")
                .parse::<f64>()
                .map_err(|_| invalid_number())
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Scale {
    /// Power of 1024
    Binary(i32),
    /// Power of 10
    Decimal(i32),
}

impl Scale {
    fn from_suffix(suffix: &str) -> Option<Self> {
        let scale = match suffix {
            "" => Self::Decimal(0),
            "Ki" => Self::Binary(1),
            "Mi" => Self::Binary(2),
            "Gi" => Self::Binary(3),
            "Ti" => Self::Binary(4),
            "Pi" => Self::Binary(5),
            "Ei" => Self::Binary(6),
            "n" => Self::Decimal(-9),
            "u" => Self::Decimal(-6),
            "m" => Self::Decimal(-3),
            "k" => Self::Decimal(3),
            "M" => Self::Decimal(6),
            "G" => Self::Decimal(9),
            "T" => Self::Decimal(12),
            "P" => Self::Decimal(15),
            "E" => Self::Decimal(18),
            other => Self::Decimal(other.strip_prefix(['e', 'E'])?.parse().ok()?),
        };
        Some(scale)
    }
}
