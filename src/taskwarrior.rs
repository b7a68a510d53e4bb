//! Taskwarrior task records
//!
//! The normalized form every service emits, serialized in the shape
//! `task import` accepts. Dates use taskwarrior's compact UTC format.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Date format used by taskwarrior for import/export
pub const DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Taskwarrior priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "")]
    None,
    #[serde(rename = "L")]
    Low,
    #[default]
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "H")]
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::None => write!(f, ""),
            Priority::Low => write!(f, "L"),
            Priority::Medium => write!(f, "M"),
            Priority::High => write!(f, "H"),
        }
    }
}

/// Kind of a user-defined attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UdaType {
    Numeric,
    String,
    Date,
}

impl fmt::Display for UdaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UdaType::Numeric => write!(f, "numeric"),
            UdaType::String => write!(f, "string"),
            UdaType::Date => write!(f, "date"),
        }
    }
}

/// Declaration of a user-defined attribute a service attaches to its tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdaDefinition {
    pub name: &'static str,
    pub kind: UdaType,
    pub label: &'static str,
}

/// Value of a user-defined attribute
#[derive(Debug, Clone, PartialEq)]
pub enum UdaValue {
    Numeric(i64),
    String(String),
    Date(DateTime<Utc>),
}

impl Serialize for UdaValue {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            UdaValue::Numeric(n) => serializer.serialize_i64(*n),
            UdaValue::String(s) => serializer.serialize_str(s),
            UdaValue::Date(d) => serialize_date(d, serializer),
        }
    }
}

fn serialize_date<S>(date: &DateTime<Utc>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&date.format(DATE_FORMAT))
}

/// A normalized task ready for taskwarrior
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRecord {
    pub description: String,
    pub project: String,
    pub priority: Priority,
    pub tags: Vec<String>,
    #[serde(serialize_with = "serialize_date")]
    pub entry: DateTime<Utc>,
    #[serde(serialize_with = "serialize_date")]
    pub due: DateTime<Utc>,
    /// Service-specific attributes, keyed by UDA name
    #[serde(flatten)]
    pub udas: BTreeMap<String, UdaValue>,
}

impl TaskRecord {
    /// Look up a UDA value by name
    pub fn uda(&self, name: &str) -> Option<&UdaValue> {
        self.udas.get(name)
    }
}

/// Drop seconds and sub-second precision
pub fn truncate_to_minute(at: DateTime<Utc>) -> DateTime<Utc> {
    at.with_nanosecond(0)
        .and_then(|d| d.with_second(0))
        .unwrap_or(at)
}

/// Render UDA declarations as taskrc lines
pub fn uda_config_lines(service: &str, udas: &[UdaDefinition]) -> Vec<String> {
    let mut lines = Vec::with_capacity(udas.len() * 2 + 2);
    lines.push(format!("# {} UDAs", service));
    for uda in udas {
        lines.push(format!("uda.{}.type={}", uda.name, uda.kind));
        lines.push(format!("uda.{}.label={}", uda.name, uda.label));
    }
    lines.push(format!("# END {} UDAs", service));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_record() -> TaskRecord {
        let mut udas = BTreeMap::new();
        udas.insert("choreid".to_string(), UdaValue::Numeric(42));
        udas.insert("chorename".to_string(), UdaValue::String("Trash".to_string()));
        udas.insert(
            "choredone".to_string(),
            UdaValue::Date(Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap()),
        );

        TaskRecord {
            description: "(bw)Is# - Trash".to_string(),
            project: String::new(),
            priority: Priority::Medium,
            tags: vec![],
            entry: Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap(),
            due: Utc.with_ymd_and_hms(2023, 11, 20, 8, 0, 0).unwrap(),
            udas,
        }
    }

    #[test]
    fn test_truncate_to_minute() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 34, 56).unwrap()
            + chrono::Duration::milliseconds(789);
        assert_eq!(
            truncate_to_minute(at),
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 34, 0).unwrap()
        );
    }

    #[test]
    fn test_record_serialization() {
        let json = serde_json::to_value(sample_record()).unwrap();

        assert_eq!(json["description"], "(bw)Is# - Trash");
        assert_eq!(json["project"], "");
        assert_eq!(json["priority"], "M");
        assert_eq!(json["tags"], serde_json::json!([]));
        assert_eq!(json["entry"], "20231114T221320Z");
        assert_eq!(json["due"], "20231120T080000Z");
        assert_eq!(json["choreid"], 42);
        assert_eq!(json["chorename"], "Trash");
        assert_eq!(json["choredone"], "20231114T221320Z");
    }

    #[test]
    fn test_priority_serialization() {
        assert_eq!(serde_json::to_string(&Priority::None).unwrap(), "\"\"");
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"H\"");
        let parsed: Priority = serde_yaml::from_str("L").unwrap();
        assert_eq!(parsed, Priority::Low);
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_uda_config_lines() {
        let udas = [UdaDefinition {
            name: "choreid",
            kind: UdaType::Numeric,
            label: "Chore ID",
        }];
        let lines = uda_config_lines("Flatastic", &udas);
        assert_eq!(
            lines,
            vec![
                "# Flatastic UDAs",
                "uda.choreid.type=numeric",
                "uda.choreid.label=Chore ID",
                "# END Flatastic UDAs",
            ]
        );
    }
}
