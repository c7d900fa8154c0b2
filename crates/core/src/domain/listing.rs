use serde::{Deserialize, Deserializer, Serialize};

/// A property listing, used both as the comparison base and as a candidate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub property_id: i64,
    #[serde(default)]
    pub apt_name: Option<String>,
    #[serde(default)]
    pub deal_type: Option<DealType>,

    #[serde(default, deserialize_with = "loose_text")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub deposit: Option<String>,
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub floor: Option<i32>,
    #[serde(default)]
    pub build_year: Option<i32>,

    /// Distance from the base listing in meters.
    #[serde(default)]
    pub dist_m: Option<f64>,

    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub recent_price_series: Option<Vec<PricePoint>>,
    #[serde(default)]
    pub trend: Option<Trend>,

    #[serde(default)]
    pub extra: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: String,
    #[serde(deserialize_with = "required_loose_text")]
    pub amount: String,
}

/// Monthly rent (월세), deposit lease (전세) or sale (매매).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "String")]
pub enum DealType {
    MonthlyRent,
    DepositLease,
    Sale,
    Unspecified,
}

pub const MONTHLY_RENT_LITERAL: &str = "월세";

impl From<String> for DealType {
    fn from(s: String) -> Self {
        match s.trim() {
            MONTHLY_RENT_LITERAL | "MONTHLY_RENT" => Self::MonthlyRent,
            "전세" | "DEPOSIT_LEASE" => Self::DepositLease,
            "매매" | "SALE" => Self::Sale,
            _ => Self::Unspecified,
        }
    }
}

/// Recent price movement classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "String")]
pub enum Trend {
    Up,
    Down,
    Flat,
    Unknown,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Flat => "FLAT",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl From<String> for Trend {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "UP" => Self::Up,
            "DOWN" => Self::Down,
            "FLAT" => Self::Flat,
            _ => Self::Unknown,
        }
    }
}

// Prices arrive as locale formatted text ("43,000") but some clients send bare numbers.
fn loose_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match v {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Null) | None => None,
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "expected string or number, got {other}"
            )))
        }
    })
}

fn required_loose_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    loose_text(deserializer)?.ok_or_else(|| serde::de::Error::custom("amount must not be null"))
}
