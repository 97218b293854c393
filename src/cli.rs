use std::path::PathBuf;

use clap::Parser;

use crate::settings::SETTINGS_FILE;
use crate::sink::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "slack-history")]
#[command(about = "Dump the recent message history of a Slack channel")]
pub struct Cli {
    /// API token, defaults to $SLACK_TOKEN
    #[arg(long = "api-token", alias = "api_token")]
    pub api_token: Option<String>,

    /// Cookie header sent with session (xoxc) tokens, defaults to $SLACK_COOKIE
    #[arg(long)]
    pub cookie: Option<String>,

    /// Channel name or id
    #[arg(short, long)]
    pub channel: Option<String>,

    /// Number of days back [default: 90]
    #[arg(long)]
    pub ago: Option<u32>,

    /// Print attachment fallback text below each message
    #[arg(long)]
    pub attachments: bool,

    /// Output format [default: text]
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Dump a JSON stream, same as --format json
    #[arg(long, conflicts_with = "format")]
    pub json: bool,

    /// Render text timestamps in UTC instead of local time
    #[arg(long)]
    pub utc: bool,

    /// Messages requested per history call, 1 to 1000 [default: 1000]
    #[arg(long)]
    pub page_size: Option<u16>,

    /// Retries for rate limited or failed requests, 0 to fail fast [default: 3]
    #[arg(long)]
    pub retries: Option<u32>,

    /// Settings file
    #[arg(long, default_value = SETTINGS_FILE)]
    pub config: PathBuf,
}
