use std::fmt;

use chrono::{DateTime, FixedOffset, Offset, SecondsFormat, TimeZone};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// 规范化后的绝对时间：保留所选时区偏移，以 RFC 3339（秒精度）发送给服务端。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTime(DateTime<FixedOffset>);

impl ResolvedTime {
    pub fn new(instant: DateTime<FixedOffset>) -> Self {
        Self(instant)
    }

    /// Keep the instant and the offset it carries in its own zone.
    pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self {
        Self(dt.with_timezone(&dt.offset().fix()))
    }

    pub fn instant(&self) -> DateTime<FixedOffset> {
        self.0
    }

    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

impl fmt::Display for ResolvedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl Serialize for ResolvedTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

/// Scan order hint sent to the service. Absent means the service default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
}

/// One search per invocation; sent as query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<ResolvedTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<ResolvedTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
}

/// 日志事件。未识别的字段原样保留，JSON 输出时一并写出。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub time: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub program: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(default)]
    pub logs: Vec<LogEvent>,
    #[serde(default)]
    pub page_info: PageInfo,
}

impl Page {
    /// Cursor of the following page; an empty string counts as none.
    pub fn next_page(&self) -> Option<&str> {
        self.page_info
            .next_page
            .as_deref()
            .filter(|token| !token.is_empty())
    }
}
