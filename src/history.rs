use serde::{Deserialize, Serialize};

use crate::message::{Message, Timestamp};
use crate::{AppError, Result};

/// Largest `limit` accepted by `conversations.history`.
pub const MAX_PAGE_SIZE: u16 = 1000;

/// One `conversations.history` call: messages of `channel_id` with
/// `oldest < ts < latest`, newest first, at most `limit` of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub channel_id: String,
    pub oldest: Timestamp,
    pub latest: Timestamp,
    pub limit: u16,
}

impl PageRequest {
    /// Query parameters of the `conversations.history` call, shared by every
    /// adapter so they ask Slack the same question.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("channel", self.channel_id.clone()),
            ("oldest", self.oldest.to_string()),
            ("latest", self.latest.to_string()),
            ("limit", self.limit.to_string()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub messages: Vec<Message>,
    pub has_more: bool,
}

impl Page {
    pub fn new(messages: Vec<Message>, has_more: bool) -> Self {
        Self { messages, has_more }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Bounded access to a channel's history.
pub trait HistoryAccessor {
    fn fetch_page(&mut self, request: &PageRequest) -> Result<Page>;
}

impl<T: HistoryAccessor + ?Sized> HistoryAccessor for &mut T {
    fn fetch_page(&mut self, request: &PageRequest) -> Result<Page> {
        (**self).fetch_page(request)
    }
}

impl<T: HistoryAccessor + ?Sized> HistoryAccessor for Box<T> {
    fn fetch_page(&mut self, request: &PageRequest) -> Result<Page> {
        (**self).fetch_page(request)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelPage {
    pub channels: Vec<ChannelInfo>,
    pub next_cursor: Option<String>,
}

/// Cursor-paginated listing of the conversations visible to the token.
pub trait ChannelDirectory {
    fn list_channels(&mut self, cursor: Option<&str>) -> Result<ChannelPage>;
}

impl<T: ChannelDirectory + ?Sized> ChannelDirectory for &mut T {
    fn list_channels(&mut self, cursor: Option<&str>) -> Result<ChannelPage> {
        (**self).list_channels(cursor)
    }
}

#[derive(Deserialize)]
struct HistoryResponse {
    ok: Option<bool>,
    error: Option<String>,
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default)]
    has_more: bool,
}

#[derive(Deserialize)]
struct ConversationsListResponse {
    ok: Option<bool>,
    error: Option<String>,
    #[serde(default)]
    channels: Vec<ChannelEntry>,
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Deserialize)]
struct ChannelEntry {
    id: String,
    name: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMetadata {
    next_cursor: Option<String>,
}

fn check_ok(ok: Option<bool>, error: Option<String>) -> Result<()> {
    match ok {
        Some(false) => Err(AppError::SlackApi(
            error.unwrap_or_else(|| "unknown error".to_string()),
        )),
        _ => Ok(()),
    }
}

/// Decode a `conversations.history` JSON body into a [`Page`].
///
/// Bodies that went through a typed client may lack the `ok` flag; those
/// are treated as successful.
pub fn decode_history(value: serde_json::Value) -> Result<Page> {
    let response: HistoryResponse =
        serde_json::from_value(value).map_err(|e| AppError::JsonParse(e.to_string()))?;
    check_ok(response.ok, response.error)?;
    Ok(Page::new(response.messages, response.has_more))
}

/// Decode a `conversations.list` JSON body into a [`ChannelPage`].
pub fn decode_channel_list(value: serde_json::Value) -> Result<ChannelPage> {
    let response: ConversationsListResponse =
        serde_json::from_value(value).map_err(|e| AppError::JsonParse(e.to_string()))?;
    check_ok(response.ok, response.error)?;

    let channels = response
        .channels
        .into_iter()
        .map(|c| ChannelInfo {
            id: c.id,
            name: c.name.unwrap_or_else(|| "unknown".to_string()),
        })
        .collect();
    let next_cursor = response
        .response_metadata
        .and_then(|meta| meta.next_cursor)
        .filter(|cursor| !cursor.is_empty());

    Ok(ChannelPage {
        channels,
        next_cursor,
    })
}
