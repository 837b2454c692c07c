//! Wire types for the sync protocol (`/sync/push`, `/sync/pull`,
//! `/categories`).
//!
//! Scope: types only — no HTTP code.
//!
//! Notes
//! - The server is inconsistent about field spelling (snake_case vs
//!   camelCase) and timestamp encoding (ISO-8601 strings vs epoch millis).
//!   This module is the single place both are normalized; internal code only
//!   ever sees snake_case fields and epoch millis.
//! - Fields a record cannot be applied without (`category_id`, `habit_id`,
//!   `user_id`) are `Option` here so one malformed record can be skipped
//!   without failing the whole batch.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::{iso_to_millis, millis_to_iso};

/// Epoch-millis instant that tolerates the server's encoding drift.
///
/// Deserializes from an integer (epoch millis) or an ISO-8601 string;
/// serializes as an ISO-8601 string, which is what the push endpoint expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireInstant(pub i64);

impl Serialize for WireInstant {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&millis_to_iso(self.0))
    }
}

impl<'de> Deserialize<'de> for WireInstant {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;
        impl<'de> serde::de::Visitor<'de> for V {
            type Value = WireInstant;

            fn expecting(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "epoch milliseconds or an ISO-8601 timestamp string")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(WireInstant(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(WireInstant(value as i64))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(WireInstant(value as i64))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                iso_to_millis(value)
                    .map(WireInstant)
                    .ok_or_else(|| E::invalid_value(serde::de::Unexpected::Str(value), &self))
            }
        }
        deserializer.deserialize_any(V)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

/// Structured schedule descriptor.
///
/// Stored and transmitted as a JSON blob, but business logic only ever sees
/// this enum; (de)serialization of the blob lives here and in the storage
/// adapter. Shapes this client doesn't know are carried through untouched as
/// [`Frequency::Opaque`] so a newer server can't corrupt local data.
#[derive(Debug, Clone, PartialEq)]
pub enum Frequency {
    Daily,
    /// N times per week, days unspecified.
    Weekly { times: u32 },
    SpecificDays { days: Vec<Weekday> },
    Opaque(Value),
}

impl Frequency {
    pub fn as_value(&self) -> Value {
        match self {
            Frequency::Daily => serde_json::json!({ "type": "daily" }),
            Frequency::Weekly { times } => serde_json::json!({ "type": "weekly", "times": times }),
            Frequency::SpecificDays { days } => {
                serde_json::json!({ "type": "specific_days", "days": days })
            }
            Frequency::Opaque(v) => v.clone(),
        }
    }

    pub fn from_value(value: Value) -> Frequency {
        // The server sometimes double-encodes the blob as a JSON string.
        if let Value::String(s) = &value
            && let Ok(inner) = serde_json::from_str::<Value>(s)
        {
            return Self::from_value(inner);
        }

        let kind = value.get("type").and_then(Value::as_str);
        match kind {
            Some("daily") => Frequency::Daily,
            Some("weekly") => match value.get("times").and_then(Value::as_u64) {
                Some(times) => Frequency::Weekly { times: times as u32 },
                None => Frequency::Opaque(value),
            },
            Some("specific_days") => {
                let days = value
                    .get("days")
                    .cloned()
                    .and_then(|d| serde_json::from_value::<Vec<Weekday>>(d).ok());
                match days {
                    Some(days) => Frequency::SpecificDays { days },
                    None => Frequency::Opaque(value),
                }
            }
            _ => Frequency::Opaque(value),
        }
    }

    /// Serialize for the `habits.frequency` text column.
    pub fn to_storage(&self) -> String {
        self.as_value().to_string()
    }

    /// Decode the `habits.frequency` text column. A blob that isn't valid
    /// JSON is preserved verbatim as an opaque string value.
    pub fn from_storage(raw: &str) -> Frequency {
        match serde_json::from_str::<Value>(raw) {
            Ok(v) => Self::from_value(v),
            Err(_) => Frequency::Opaque(Value::String(raw.to_string())),
        }
    }
}

impl Serialize for Frequency {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.as_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Frequency {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Frequency::from_value(Value::deserialize(deserializer)?))
    }
}

/// One entity type's slice of a sync payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSet<T> {
    #[serde(default = "Vec::new")]
    pub created: Vec<T>,
    #[serde(default = "Vec::new")]
    pub updated: Vec<T>,
    #[serde(default = "Vec::new")]
    pub deleted: Vec<String>,
}

// Manual impl: a derived Default would needlessly require T: Default.
impl<T> Default for RecordSet<T> {
    fn default() -> Self {
        RecordSet {
            created: Vec::new(),
            updated: Vec::new(),
            deleted: Vec::new(),
        }
    }
}

impl<T> RecordSet<T> {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncChanges {
    #[serde(default)]
    pub habits: RecordSet<HabitRecord>,
    #[serde(default)]
    pub logs: RecordSet<LogRecord>,
}

/// Body of `POST /sync/push`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushPayload {
    pub changes: SyncChanges,
}

/// Body of `POST /sync/pull`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub last_pulled_at: i64,
}

/// Response of both sync endpoints: the server's view of current state plus
/// the instant it was computed (the next pull watermark).
#[derive(Debug, Clone, Deserialize)]
pub struct SyncEnvelope {
    #[serde(default)]
    pub changes: SyncChanges,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitRecord {
    pub id: String,
    #[serde(default, alias = "categoryId", skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, alias = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        rename = "frequency_json",
        alias = "frequencyJson",
        alias = "frequency",
        skip_serializing_if = "Option::is_none"
    )]
    pub frequency: Option<Frequency>,
    #[serde(default, rename = "type", alias = "habitType", skip_serializing_if = "Option::is_none")]
    pub habit_type: Option<String>,
    #[serde(default, alias = "goalId", skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<String>,
    #[serde(default, alias = "isArchived")]
    pub is_archived: bool,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<WireInstant>,
    #[serde(default, alias = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<WireInstant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: String,
    #[serde(default, alias = "habitId", skip_serializing_if = "Option::is_none")]
    pub habit_id: Option<String>,
    #[serde(default, alias = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub value: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<WireInstant>,
    #[serde(default, alias = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<WireInstant>,
}

/// Entry of the `GET /categories` reference list (camelCase on the wire).
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRecord {
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, rename = "createdAt", alias = "created_at")]
    pub created_at: Option<WireInstant>,
    #[serde(default, rename = "updatedAt", alias = "updated_at")]
    pub updated_at: Option<WireInstant>,
}
