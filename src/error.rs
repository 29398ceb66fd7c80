use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LogSearchError>;

/// 时间参数来源，用于区分 `--min-time` 与 `--max-time` 的解析失败。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFlag {
    MinTime,
    MaxTime,
}

impl fmt::Display for TimeFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeFlag::MinTime => f.write_str("--min-time"),
            TimeFlag::MaxTime => f.write_str("--max-time"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LogSearchError {
    #[error("配置错误: {path} - {reason}")]
    ConfigError { path: PathBuf, reason: String },

    #[error("配置错误: 未找到 token，请设置 SWO_API_TOKEN 或在配置文件中填写 token")]
    MissingToken,

    #[error("参数解析失败: {flag} - {source}")]
    TimeFlag {
        flag: TimeFlag,
        #[source]
        source: Box<LogSearchError>,
    },

    #[error("时间解析错误: {input}")]
    InvalidDateTime { input: String },

    #[error("请求失败: {0}")]
    Http(#[from] reqwest::Error),

    #[error("服务端错误: {status} - {body}")]
    Service { status: u16, body: String },

    #[error("无效请求: {0}")]
    InvalidRequest(String),

    #[error("输出错误: {0}")]
    RenderError(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LogSearchError {
    pub fn time_flag(flag: TimeFlag, source: LogSearchError) -> Self {
        LogSearchError::TimeFlag {
            flag,
            source: Box::new(source),
        }
    }
}
