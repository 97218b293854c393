use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::cli::Cli;
use crate::history::MAX_PAGE_SIZE;
use crate::retry::RetryPolicy;
use crate::sink::OutputFormat;
use crate::{AppError, Result};

pub const SETTINGS_FILE: &str = "slack-history.toml";

pub const DEFAULT_DAYS_AGO: u32 = 90;
pub const DEFAULT_LOG_LEVEL: &str = "info";

const TOKEN_ENV: &str = "SLACK_TOKEN";
const COOKIE_ENV: &str = "SLACK_COOKIE";

/// Optional on-disk defaults. Every key may be omitted.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub slack: SlackSettings,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SlackSettings {
    pub token: Option<String>,
    pub cookie: Option<String>,
    pub api_base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExportSettings {
    pub days_ago: Option<u32>,
    pub format: Option<OutputFormat>,
    pub attachments: Option<bool>,
    pub page_size: Option<u16>,
    pub utc: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetrySettings {
    pub max_retries: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogSettings {
    pub level: Option<String>,
}

impl Settings {
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| AppError::ReadFile {
            path: path.display().to_string(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| AppError::TomlParse(e.to_string()))
    }
}

/// Everything one export run needs, fixed before the first request.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    pub token: String,
    pub cookie: Option<String>,
    pub api_base_url: Option<String>,
    pub channel: String,
    pub days_ago: u32,
    pub format: OutputFormat,
    pub print_attachments: bool,
    pub utc: bool,
    pub page_size: u16,
    pub retry: RetryPolicy,
    pub log_level: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ExportConfig {
    /// Merge command line, environment and settings file, in that order of
    /// precedence.
    pub fn resolve(cli: &Cli, settings: Settings, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let token = non_empty(cli.api_token.clone())
            .or_else(|| non_empty(env(TOKEN_ENV)))
            .or_else(|| non_empty(settings.slack.token))
            .ok_or(AppError::MissingToken)?;

        let channel = non_empty(cli.channel.clone()).ok_or(AppError::MissingChannel)?;

        let cookie = non_empty(cli.cookie.clone())
            .or_else(|| non_empty(env(COOKIE_ENV)))
            .or_else(|| non_empty(settings.slack.cookie));

        let format = if cli.json {
            OutputFormat::Json
        } else {
            cli.format.or(settings.export.format).unwrap_or_default()
        };

        let page_size = cli
            .page_size
            .or(settings.export.page_size)
            .unwrap_or(MAX_PAGE_SIZE);
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(AppError::InvalidConfig(format!(
                "page size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, page_size
            )));
        }

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_retries: cli
                .retries
                .or(settings.retry.max_retries)
                .unwrap_or(defaults.max_retries),
            base_delay: settings
                .retry
                .base_delay_ms
                .map_or(defaults.base_delay, Duration::from_millis),
            max_delay: settings
                .retry
                .max_delay_ms
                .map_or(defaults.max_delay, Duration::from_millis),
        };

        Ok(Self {
            token,
            cookie,
            api_base_url: non_empty(settings.slack.api_base_url),
            channel,
            days_ago: cli
                .ago
                .or(settings.export.days_ago)
                .unwrap_or(DEFAULT_DAYS_AGO),
            format,
            print_attachments: cli.attachments || settings.export.attachments.unwrap_or(false),
            utc: cli.utc || settings.export.utc.unwrap_or(false),
            page_size,
            retry,
            log_level: settings
                .log
                .level
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }
}
