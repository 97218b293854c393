pub mod cli;
pub mod commands;
pub mod error;
pub mod fetcher;
pub mod history;
pub mod message;
pub mod resolve;
pub mod retry;
pub mod settings;
pub mod sink;
pub mod slack;
pub mod window;

#[cfg(test)]
mod testing;

pub use cli::Cli;
pub use error::{AppError, Result};
pub use fetcher::{FetchSummary, PaginationEngine};
pub use history::{ChannelDirectory, HistoryAccessor, Page, PageRequest};
pub use message::{Attachment, Message, Timestamp};
pub use settings::{ExportConfig, Settings};
pub use sink::{OutputFormat, Sink};
