//! Slack Web API backed accessors.
//!
//! Bot and user tokens go through slack-morphism; session tokens, which
//! need the browser's `d` cookie on every call, go through a plain
//! reqwest client.

pub mod morphism;
pub mod web;

use tokio::runtime::Handle;
use tracing::debug;

use crate::history::{ChannelDirectory, ChannelPage, HistoryAccessor, Page, PageRequest};
use crate::settings::ExportConfig;
use crate::Result;

pub use morphism::MorphismAccessor;
pub use web::WebApiAccessor;

/// Used when a rate limited response carries no `Retry-After`.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

pub enum SlackAccessor {
    Morphism(MorphismAccessor),
    Web(WebApiAccessor),
}

impl SlackAccessor {
    pub fn connect(config: &ExportConfig, runtime: Handle) -> Result<Self> {
        if config.cookie.is_some() || config.api_base_url.is_some() {
            debug!("using session-aware web API client");
            Ok(SlackAccessor::Web(WebApiAccessor::new(
                &config.token,
                config.cookie.as_deref(),
                config.api_base_url.as_deref(),
            )?))
        } else {
            debug!("using slack-morphism client");
            Ok(SlackAccessor::Morphism(MorphismAccessor::new(
                &config.token,
                runtime,
            )?))
        }
    }
}

impl HistoryAccessor for SlackAccessor {
    fn fetch_page(&mut self, request: &PageRequest) -> Result<Page> {
        match self {
            SlackAccessor::Morphism(accessor) => accessor.fetch_page(request),
            SlackAccessor::Web(accessor) => accessor.fetch_page(request),
        }
    }
}

impl ChannelDirectory for SlackAccessor {
    fn list_channels(&mut self, cursor: Option<&str>) -> Result<ChannelPage> {
        match self {
            SlackAccessor::Morphism(accessor) => accessor.list_channels(cursor),
            SlackAccessor::Web(accessor) => accessor.list_channels(cursor),
        }
    }
}
