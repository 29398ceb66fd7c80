use chrono::{Duration, TimeZone};

use crate::error::{LogSearchError, Result, TimeFlag};
use crate::model::{Direction, ResolvedTime, SearchRequest};
use crate::timeparse::TimeResolver;

pub const DEFAULT_MIN_TIME: &str = "1 hour ago";

/// How far back follow mode starts tailing.
pub const FOLLOW_LOOKBACK_SECS: i64 = 10;

/// Raw `logs get` flag values, before any resolution.
#[derive(Debug, Clone, Default)]
pub struct GetArgs {
    pub terms: Vec<String>,
    pub group: Option<String>,
    pub system: Option<String>,
    pub min_time: Option<String>,
    pub max_time: Option<String>,
    pub json: bool,
    pub follow: bool,
}

/// 构建结果：发给服务端的请求，以及只影响本地输出的选项。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPlan {
    pub request: SearchRequest,
    pub json_out: bool,
    pub follow: bool,
}

#[derive(Clone, Default)]
pub struct QueryBuilder;

impl QueryBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build<Tz: TimeZone>(&self, args: &GetArgs, resolver: &TimeResolver<Tz>) -> Result<SearchPlan> {
        let mut request = SearchRequest {
            filter: compose_filter(&args.terms, args.system.as_deref()),
            group: non_empty(args.group.as_deref()),
            ..Default::default()
        };

        if let Some(max_time) = non_empty(args.max_time.as_deref()) {
            let end = resolver
                .resolve(&max_time)
                .map_err(|e| LogSearchError::time_flag(TimeFlag::MaxTime, e))?;
            request.end_time = Some(end);
        }

        if args.follow {
            // tailing always starts just behind the invocation time
            let start = resolver.now().clone() - Duration::seconds(FOLLOW_LOOKBACK_SECS);
            request.start_time = Some(ResolvedTime::from_datetime(&start));
            request.direction = Some(Direction::Forward);
        } else if let Some(min_time) = non_empty(args.min_time.as_deref()) {
            let start = resolver
                .resolve(&min_time)
                .map_err(|e| LogSearchError::time_flag(TimeFlag::MinTime, e))?;
            request.start_time = Some(start);
        }

        Ok(SearchPlan {
            request,
            json_out: args.json,
            follow: args.follow,
        })
    }
}

/// Terms joined by a single space, plus `host:<system>` when a system is given.
fn compose_filter(terms: &[String], system: Option<&str>) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    let joined = terms.join(" ");
    if !joined.is_empty() {
        parts.push(joined);
    }
    if let Some(system) = system.filter(|s| !s.is_empty()) {
        parts.push(format!("host:{system}"));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}
