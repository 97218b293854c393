use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::history::{HistoryAccessor, PageRequest};
use crate::message::{Message, Timestamp};
use crate::sink::Sink;
use crate::window::TimeWindow;
use crate::{AppError, Result};

/// Counters describing one export run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub pages: usize,
    pub emitted: usize,
    pub duplicates_skipped: usize,
    pub out_of_range_skipped: usize,
    pub cancelled: bool,
}

/// Walks a channel's history backwards, page by page, from the window's
/// ceiling down to its floor.
///
/// Every page is requested as `floor < ts < ceiling` and the ceiling is then
/// lowered to the oldest timestamp the page contained. A message is
/// identified by its `ts`, which Slack keeps unique within a channel.
/// Accessors that treat the ceiling as inclusive hand back the boundary
/// message again; it is dropped, and a page holding nothing but that
/// message moves the ceiling one microsecond below it.
pub struct PaginationEngine<A> {
    accessor: A,
    channel_id: String,
    page_size: u16,
    cancel: Option<Arc<AtomicBool>>,
}

impl<A: HistoryAccessor> PaginationEngine<A> {
    pub fn new(accessor: A, channel_id: impl Into<String>, page_size: u16) -> Self {
        Self {
            accessor,
            channel_id: channel_id.into(),
            page_size: page_size.max(1),
            cancel: None,
        }
    }

    /// Stop before the next page request once `flag` is set.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn into_inner(self) -> A {
        self.accessor
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    pub fn run<S: Sink + ?Sized>(&mut self, window: TimeWindow, sink: &mut S) -> Result<FetchSummary> {
        let mut window = window;
        let mut summary = FetchSummary::default();

        // `ts` of the oldest message emitted so far
        let mut last_emitted: Option<Timestamp> = None;

        while !window.is_exhausted() {
            if self.is_cancelled() {
                info!(emitted = summary.emitted, "export cancelled");
                summary.cancelled = true;
                break;
            }

            let request = PageRequest {
                channel_id: self.channel_id.clone(),
                oldest: window.floor(),
                latest: window.ceiling(),
                limit: self.page_size,
            };
            debug!(
                channel = %request.channel_id,
                oldest = %request.oldest,
                latest = %request.latest,
                limit = request.limit,
                "requesting history page"
            );

            let page = match self.accessor.fetch_page(&request) {
                Ok(page) => page,
                Err(AppError::Cancelled) => {
                    info!(emitted = summary.emitted, "export cancelled");
                    summary.cancelled = true;
                    break;
                }
                Err(e) => return Err(e),
            };
            summary.pages += 1;

            if page.is_empty() {
                debug!("empty page, history exhausted");
                break;
            }

            // parse everything first: a bad timestamp aborts before any of this page is emitted
            let mut stamped = page
                .messages
                .into_iter()
                .map(|m| Ok((m.timestamp()?, m)))
                .collect::<Result<Vec<(Timestamp, Message)>>>()?;
            stamped.sort_by(|a, b| b.0.cmp(&a.0));

            let Some(page_oldest) = stamped.last().map(|(ts, _)| *ts) else {
                break;
            };

            let mut fresh = 0;
            for (ts, message) in stamped {
                if last_emitted == Some(ts) {
                    summary.duplicates_skipped += 1;
                    continue;
                }
                if !window.contains(ts) {
                    summary.out_of_range_skipped += 1;
                    continue;
                }

                sink.accept(message)?;
                last_emitted = Some(ts);
                summary.emitted += 1;
                fresh += 1;
            }

            debug!(
                fresh,
                oldest = %page_oldest,
                has_more = page.has_more,
                "page processed"
            );

            if window.advance_to(page_oldest) {
                continue;
            }
            if page_oldest == window.ceiling() {
                // only the boundary message came back, it has been emitted already
                window.advance_to(page_oldest.prev());
            } else {
                warn!(
                    ceiling = %window.ceiling(),
                    oldest = %page_oldest,
                    "page held only messages newer than the cursor, stopping"
                );
                break;
            }
        }

        Ok(summary)
    }
}
