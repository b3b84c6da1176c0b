// ABOUTME: Account type definitions shared across dorxl packages
// ABOUTME: Strict AccountEntry, lenient AccountRecord wire shape, and SubscriptionType

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscriber plan category reported by the profile service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionType {
    Prepaid,
    Postpaid,
    Prioritas,
    PrioHybrid,
    Go,
    /// Any category this build does not know about, kept verbatim
    Other(String),
    #[default]
    Unknown,
}

impl SubscriptionType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Prepaid => "PREPAID",
            Self::Postpaid => "POSTPAID",
            Self::Prioritas => "PRIORITAS",
            Self::PrioHybrid => "PRIOHYBRID",
            Self::Go => "GO",
            Self::Other(raw) => raw,
            Self::Unknown => "",
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl fmt::Display for SubscriptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(match trimmed.to_uppercase().as_str() {
            "" => Self::Unknown,
            "PREPAID" => Self::Prepaid,
            "POSTPAID" => Self::Postpaid,
            "PRIORITAS" => Self::Prioritas,
            "PRIOHYBRID" => Self::PrioHybrid,
            "GO" => Self::Go,
            _ => Self::Other(trimmed.to_string()),
        })
    }
}

impl From<String> for SubscriptionType {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(parsed) => parsed,
            Err(never) => match never {},
        }
    }
}

impl From<&str> for SubscriptionType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<SubscriptionType> for String {
    fn from(value: SubscriptionType) -> Self {
        value.as_str().to_string()
    }
}

/// A linked subscriber and its long-lived refresh credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountEntry {
    pub number: u64,
    #[serde(default)]
    pub subscriber_id: String,
    #[serde(default)]
    pub subscription_type: SubscriptionType,
    pub refresh_token: String,
}

impl AccountEntry {
    pub fn new(number: u64, refresh_token: impl Into<String>) -> Self {
        Self {
            number,
            subscriber_id: String::new(),
            subscription_type: SubscriptionType::Unknown,
            refresh_token: refresh_token.into(),
        }
    }
}

/// Required field absent from a stored account record
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MissingField {
    #[error("missing field `number`")]
    Number,
    #[error("missing field `refresh_token`")]
    RefreshToken,
}

/// Account as read back from a persistence backend
///
/// Backends may hold records written by older or hand-edited stores, so every
/// field is optional here and validation happens in [`AccountRecord::into_entry`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AccountRecord {
    #[serde(default, deserialize_with = "deserialize_number")]
    pub number: Option<u64>,
    #[serde(default)]
    pub subscriber_id: Option<String>,
    #[serde(default)]
    pub subscription_type: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl AccountRecord {
    pub fn into_entry(self) -> Result<AccountEntry, MissingField> {
        let number = self.number.ok_or(MissingField::Number)?;
        let refresh_token = self
            .refresh_token
            .filter(|token| !token.trim().is_empty())
            .ok_or(MissingField::RefreshToken)?;

        Ok(AccountEntry {
            number,
            subscriber_id: self.subscriber_id.unwrap_or_default(),
            subscription_type: self
                .subscription_type
                .map(SubscriptionType::from)
                .unwrap_or_default(),
            refresh_token,
        })
    }
}

impl From<AccountEntry> for AccountRecord {
    fn from(entry: AccountEntry) -> Self {
        Self {
            number: Some(entry.number),
            subscriber_id: Some(entry.subscriber_id),
            subscription_type: Some(entry.subscription_type.into()),
            refresh_token: Some(entry.refresh_token),
        }
    }
}

/// Numbers were historically written both as JSON integers and digit strings
fn deserialize_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberRepr {
        Int(u64),
        Text(String),
        Other(serde_json::Value),
    }

    Ok(match Option::<NumberRepr>::deserialize(deserializer)? {
        Some(NumberRepr::Int(n)) => Some(n),
        Some(NumberRepr::Text(s)) => s.trim().parse().ok(),
        Some(NumberRepr::Other(_)) | None => None,
    })
}
