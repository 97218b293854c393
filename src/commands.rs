use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tracing::info;

use crate::error::Result;
use crate::fetcher::{FetchSummary, PaginationEngine};
use crate::history::{ChannelDirectory, HistoryAccessor};
use crate::resolve::resolve_channel;
use crate::retry::RetryingAccessor;
use crate::settings::ExportConfig;
use crate::slack::SlackAccessor;
use crate::window::TimeWindow;

pub fn run_export<W: Write>(
    config: &ExportConfig,
    runtime: Handle,
    cancel: Arc<AtomicBool>,
    out: W,
) -> Result<FetchSummary> {
    let accessor = SlackAccessor::connect(config, runtime)?;
    let accessor = RetryingAccessor::new(accessor, config.retry).with_cancel(cancel.clone());
    export_channel(accessor, config, Utc::now(), cancel, out)
}

/// Resolve the channel, then stream its history for the configured window
/// into `out`. Output written before a failure is flushed, not discarded.
pub fn export_channel<A, W>(
    mut accessor: A,
    config: &ExportConfig,
    now: DateTime<Utc>,
    cancel: Arc<AtomicBool>,
    out: W,
) -> Result<FetchSummary>
where
    A: HistoryAccessor + ChannelDirectory,
    W: Write,
{
    let channel_id = resolve_channel(&mut accessor, &config.channel)?;
    let window = TimeWindow::ending_at(now, config.days_ago)?;

    info!(
        channel = %channel_id,
        days_ago = config.days_ago,
        oldest = %window.floor(),
        "exporting channel history"
    );

    let mut sink = config.format.sink(out, config.print_attachments, config.utc);
    let mut engine =
        PaginationEngine::new(accessor, channel_id, config.page_size).with_cancel(cancel);

    let result = engine.run(window, sink.as_mut());
    let flushed = sink.finish();
    let summary = result?;
    flushed?;

    info!(
        messages = summary.emitted,
        pages = summary.pages,
        duplicates = summary.duplicates_skipped,
        out_of_range = summary.out_of_range_skipped,
        "export finished"
    );
    Ok(summary)
}
