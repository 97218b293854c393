use slack_morphism::errors::SlackClientError;
use slack_morphism::prelude::*;
use tokio::runtime::Handle;

use crate::history::{
    ChannelDirectory, ChannelPage, HistoryAccessor, Page, PageRequest, decode_channel_list,
    decode_history,
};
use crate::slack::DEFAULT_RETRY_AFTER_SECS;
use crate::{AppError, Result};

const CHANNEL_PAGE_SIZE: u16 = 200;

/// Blocking facade over the async slack-morphism client.
pub struct MorphismAccessor {
    client: SlackClient<SlackClientHyperHttpsConnector>,
    token: SlackApiToken,
    runtime: Handle,
}

impl MorphismAccessor {
    pub fn new(token: &str, runtime: Handle) -> Result<Self> {
        let _guard = runtime.enter();
        let connector =
            SlackClientHyperConnector::new().map_err(|e| AppError::SlackApi(e.to_string()))?;
        Ok(Self {
            client: SlackClient::new(connector),
            token: SlackApiToken::new(SlackApiTokenValue(token.to_string())),
            runtime,
        })
    }
}

fn map_client_error(err: SlackClientError) -> AppError {
    match err {
        SlackClientError::RateLimitError(e) => AppError::SlackRateLimit {
            retry_after_secs: e
                .retry_after
                .map(|d| d.as_secs())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        SlackClientError::ApiError(e) => AppError::SlackApi(e.code),
        e @ (SlackClientError::HttpError(_) | SlackClientError::HttpProtocolError(_)) => {
            AppError::Http(e.to_string())
        }
        e => AppError::SlackApi(e.to_string()),
    }
}

impl HistoryAccessor for MorphismAccessor {
    /// History goes through the client's raw JSON call: the typed response
    /// only models part of a message and would drop the rest of the record.
    fn fetch_page(&mut self, request: &PageRequest) -> Result<Page> {
        let session = self.client.open_session(&self.token);
        let params: Vec<(&str, Option<String>)> = request
            .query_params()
            .into_iter()
            .map(|(key, value)| (key, Some(value)))
            .collect();

        let value: serde_json::Value = self
            .runtime
            .block_on(
                session
                    .http_session_api
                    .http_get("conversations.history", &params, None),
            )
            .map_err(map_client_error)?;

        decode_history(value)
    }
}

impl ChannelDirectory for MorphismAccessor {
    fn list_channels(&mut self, cursor: Option<&str>) -> Result<ChannelPage> {
        let session = self.client.open_session(&self.token);
        let api_request = SlackApiConversationsListRequest::new()
            .with_limit(CHANNEL_PAGE_SIZE)
            .with_types(vec![
                SlackConversationType::Public,
                SlackConversationType::Private,
            ])
            .opt_cursor(cursor.map(|c| SlackCursorId(c.to_string())));

        let response = self
            .runtime
            .block_on(session.conversations_list(&api_request))
            .map_err(map_client_error)?;

        let value =
            serde_json::to_value(&response).map_err(|e| AppError::JsonParse(e.to_string()))?;
        decode_channel_list(value)
    }
}
