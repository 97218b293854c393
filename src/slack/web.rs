use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, COOKIE, RETRY_AFTER};
use url::{Url, form_urlencoded};

use crate::history::{
    ChannelDirectory, ChannelPage, HistoryAccessor, Page, PageRequest, decode_channel_list,
    decode_history,
};
use crate::slack::DEFAULT_RETRY_AFTER_SECS;
use crate::{AppError, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api/";

const CHANNEL_PAGE_SIZE: &str = "200";

/// Calls the Web API directly, sending the session cookie along with the
/// token when one is configured.
pub struct WebApiAccessor {
    client: Client,
    base_url: Url,
    token: String,
    cookie: Option<String>,
}

impl WebApiAccessor {
    pub fn new(token: &str, cookie: Option<&str>, base_url: Option<&str>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Http(e.to_string()))?;
        Ok(Self {
            client,
            base_url: parse_base_url(base_url.unwrap_or(DEFAULT_API_BASE_URL))?,
            token: token.to_string(),
            cookie: cookie.map(str::to_string),
        })
    }

    fn call(&self, method: &str, params: &[(&str, String)]) -> Result<serde_json::Value> {
        let url = self
            .base_url
            .join(method)
            .map_err(|e| AppError::InvalidConfig(e.to_string()))?;

        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        let mut request = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body);
        if let Some(cookie) = &self.cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().map_err(|e| AppError::Http(e.to_string()))?;
        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let body = response.text().map_err(|e| AppError::Http(e.to_string()))?;

        check_response(status, retry_after, &body)
    }
}

/// Base URLs must end in `/` for `join` to append the method name.
fn parse_base_url(raw: &str) -> Result<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&normalized).map_err(|e| AppError::InvalidConfig(format!("api base url {}: {}", raw, e)))
}

fn parse_retry_after(value: &str) -> Option<u64> {
    let value = value.trim();
    let whole = value.split_once('.').map_or(value, |(whole, _)| whole);
    whole.parse().ok()
}

pub(super) fn check_response(
    status: StatusCode,
    retry_after: Option<u64>,
    body: &str,
) -> Result<serde_json::Value> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(AppError::SlackRateLimit {
            retry_after_secs: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        });
    }
    if status.is_server_error() {
        return Err(AppError::Http(format!("HTTP {}", status)));
    }
    if !status.is_success() {
        return Err(AppError::SlackApi(format!("HTTP {}: {}", status, body.trim())));
    }

    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| AppError::JsonParse(e.to_string()))?;
    if value.get("error").and_then(|e| e.as_str()) == Some("ratelimited") {
        return Err(AppError::SlackRateLimit {
            retry_after_secs: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        });
    }
    Ok(value)
}

impl HistoryAccessor for WebApiAccessor {
    fn fetch_page(&mut self, request: &PageRequest) -> Result<Page> {
        decode_history(self.call("conversations.history", &request.query_params())?)
    }
}

impl ChannelDirectory for WebApiAccessor {
    fn list_channels(&mut self, cursor: Option<&str>) -> Result<ChannelPage> {
        let mut params = vec![
            ("types", "public_channel,private_channel".to_string()),
            ("exclude_archived", "false".to_string()),
            ("limit", CHANNEL_PAGE_SIZE.to_string()),
        ];
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor.to_string()));
        }
        decode_channel_list(self.call("conversations.list", &params)?)
    }
}
