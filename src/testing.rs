//! In-memory accessors shared by the unit tests.

use std::collections::VecDeque;

use crate::history::{ChannelDirectory, ChannelInfo, ChannelPage, HistoryAccessor, Page, PageRequest};
use crate::message::{Message, Timestamp};
use crate::{AppError, Result};

pub fn msg(secs: i64, text: &str) -> Message {
    Message::new(Timestamp::from_secs(secs).to_string(), "U1", text)
}

/// `count` messages, newest first, starting at `newest` and `step` seconds apart.
pub fn spaced_history(newest: i64, step: i64, count: i64) -> Vec<Message> {
    (0..count)
        .map(|i| msg(newest - i * step, &format!("message {}", i)))
        .collect()
}

/// A channel history held in memory, answering requests the way Slack does.
pub struct VecHistory {
    messages: Vec<Message>,
    pub inclusive_latest: bool,
    pub honor_oldest: bool,
    pub requests: Vec<PageRequest>,
    pub channels: Vec<ChannelInfo>,
    pub channels_per_page: usize,
    pub channel_requests: usize,
}

impl VecHistory {
    pub fn new(mut messages: Vec<Message>) -> Self {
        messages.sort_by_key(|m| std::cmp::Reverse(m.timestamp().unwrap()));
        Self {
            messages,
            inclusive_latest: false,
            honor_oldest: true,
            requests: Vec::new(),
            channels: Vec::new(),
            channels_per_page: 2,
            channel_requests: 0,
        }
    }

    pub fn with_channels(mut self, channels: &[(&str, &str)]) -> Self {
        self.channels = channels
            .iter()
            .map(|(id, name)| ChannelInfo {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect();
        self
    }
}

impl HistoryAccessor for VecHistory {
    fn fetch_page(&mut self, request: &PageRequest) -> Result<Page> {
        self.requests.push(request.clone());

        let matching: Vec<&Message> = self
            .messages
            .iter()
            .filter(|m| {
                let ts = m.timestamp().unwrap();
                let below = ts < request.latest || (self.inclusive_latest && ts == request.latest);
                let above = !self.honor_oldest || ts > request.oldest;
                below && above
            })
            .collect();

        let limit = usize::from(request.limit);
        Ok(Page::new(
            matching.iter().take(limit).map(|m| (*m).clone()).collect(),
            matching.len() > limit,
        ))
    }
}

impl ChannelDirectory for VecHistory {
    fn list_channels(&mut self, cursor: Option<&str>) -> Result<ChannelPage> {
        self.channel_requests += 1;
        let start: usize = cursor.map(|c| c.parse().unwrap()).unwrap_or(0);
        let end = (start + self.channels_per_page).min(self.channels.len());
        Ok(ChannelPage {
            channels: self.channels[start..end].to_vec(),
            next_cursor: (end < self.channels.len()).then(|| end.to_string()),
        })
    }
}

/// Replays a fixed script of results, then returns empty pages.
#[derive(Default)]
pub struct ScriptedAccessor {
    script: VecDeque<Result<Page>>,
    pub requests: Vec<PageRequest>,
}

impl ScriptedAccessor {
    pub fn push(&mut self, page: Page) {
        self.script.push_back(Ok(page));
    }

    pub fn push_err(&mut self, err: AppError) {
        self.script.push_back(Err(err));
    }
}

impl HistoryAccessor for ScriptedAccessor {
    fn fetch_page(&mut self, request: &PageRequest) -> Result<Page> {
        self.requests.push(request.clone());
        self.script.pop_front().unwrap_or_else(|| Ok(Page::default()))
    }
}
