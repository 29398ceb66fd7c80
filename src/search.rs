use std::io::Write;
use std::time::Duration;

use async_stream::try_stream;
use futures::{stream::BoxStream, TryStreamExt};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::client::LogService;
use crate::error::Result;
use crate::model::{Page, SearchRequest};
use crate::query::SearchPlan;
use crate::render::render_events;

/// Pause between follow-mode fetches after an empty page.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Lazy, non-restartable page sequence for one search.
///
/// The walk continues while a page carries a `nextPage` cursor and ends on a
/// null response or a page without one. With `follow` set, a page with no
/// events is followed by a `poll_interval` pause before the next fetch; since
/// the service keeps handing out cursors at the tail, that sequence is
/// effectively unbounded.
pub fn pages<'a, S>(
    service: &'a S,
    request: &'a SearchRequest,
    follow: bool,
    poll_interval: Duration,
) -> BoxStream<'a, Result<Page>>
where
    S: LogService + ?Sized,
{
    let stream = try_stream! {
        let mut current = service.search(request).await?;
        while let Some(page) = current.take() {
            let cursor = page.next_page().map(str::to_owned);
            let drained = page.logs.is_empty();
            yield page;

            let cursor = match cursor {
                Some(cursor) => cursor,
                None => {
                    debug!("no next page cursor, search finished");
                    break;
                }
            };
            if follow && drained {
                sleep(poll_interval).await;
            }
            current = service.next_page(request, &cursor).await?;
        }
    };
    Box::pin(stream)
}

/// 结果输出器：逐页拉取并渲染，follow 模式下持续轮询。
pub struct ResultStreamer<S> {
    service: S,
    poll_interval: Duration,
}

impl<S: LogService> ResultStreamer<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Render every page of `plan` into `out`; returns the number of events written.
    pub async fn run<W: Write>(&self, plan: &SearchPlan, out: &mut W) -> Result<usize> {
        if plan.follow {
            info!("following new log events, interrupt to stop");
        }
        let mut pages = pages(&self.service, &plan.request, plan.follow, self.poll_interval);
        let mut rendered = 0usize;
        while let Some(page) = pages.try_next().await? {
            render_events(out, &page.logs, plan.json_out)?;
            out.flush()?;
            rendered += page.logs.len();
        }
        Ok(rendered)
    }
}
