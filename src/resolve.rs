use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::history::ChannelDirectory;
use crate::{AppError, Result};

static CHANNEL_ID: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new("C[A-Z0-9]{10}").ok());

/// Finds a channel id (`C` followed by ten upper-case letters or digits)
/// anywhere in `s`.
pub fn find_channel_id(s: &str) -> Option<&str> {
    CHANNEL_ID.as_ref()?.find(s).map(|m| m.as_str())
}

/// Turn the `--channel` argument into a channel id, listing the workspace
/// conversations only when the argument is not already an id.
pub fn resolve_channel<D: ChannelDirectory + ?Sized>(directory: &mut D, channel: &str) -> Result<String> {
    if let Some(id) = find_channel_id(channel) {
        info!("assuming {} is a channel id", id);
        return Ok(id.to_string());
    }

    let name = channel.strip_prefix('#').unwrap_or(channel);
    let mut cursor: Option<String> = None;
    let mut pages = 0;

    loop {
        let page = directory.list_channels(cursor.as_deref())?;
        pages += 1;

        if let Some(found) = page.channels.into_iter().find(|c| c.name == name) {
            info!(channel = name, id = %found.id, "resolved channel");
            return Ok(found.id);
        }

        match page.next_cursor {
            Some(next) if !next.is_empty() => cursor = Some(next),
            _ => break,
        }
    }

    debug!(pages, "channel listing exhausted");
    Err(AppError::ChannelNotFound(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::VecHistory;

    fn directory() -> VecHistory {
        VecHistory::new(Vec::new()).with_channels(&[
            ("C0000000001", "general"),
            ("C0000000002", "random"),
            ("G0000000003", "secret-plans"),
            ("C0000000004", "eng-backend"),
            ("C0000000005", "eng"),
        ])
    }

    #[test]
    fn test_find_channel_id() {
        assert_eq!(find_channel_id("C01ABCDEF23"), Some("C01ABCDEF23"));
        assert_eq!(find_channel_id("<#C01ABCDEF23|general>"), Some("C01ABCDEF23"));
        assert_eq!(find_channel_id("general"), None);
        assert_eq!(find_channel_id("C01abcdef23"), None);
        assert_eq!(find_channel_id("C01ABC"), None);
        assert_eq!(find_channel_id("ß"), None);
        assert_eq!(find_channel_id("xC01ABCDEF23456"), Some("C01ABCDEF23"));
    }

    #[test]
    fn test_channel_id_skips_listing() {
        let mut dir = directory();
        let id = resolve_channel(&mut dir, "C9999999999").unwrap();
        assert_eq!(id, "C9999999999");
        assert_eq!(dir.channel_requests, 0);
    }

    #[test]
    fn test_resolves_name_on_first_page() {
        let mut dir = directory();
        assert_eq!(resolve_channel(&mut dir, "random").unwrap(), "C0000000002");
        assert_eq!(dir.channel_requests, 1);
    }

    #[test]
    fn test_follows_cursor_to_later_pages() {
        let mut dir = directory();
        assert_eq!(resolve_channel(&mut dir, "#eng").unwrap(), "C0000000005");
        assert_eq!(dir.channel_requests, 3);
    }

    #[test]
    fn test_private_channel_name() {
        let mut dir = directory();
        assert_eq!(resolve_channel(&mut dir, "secret-plans").unwrap(), "G0000000003");
    }

    #[test]
    fn test_unknown_name() {
        let mut dir = directory();
        let err = resolve_channel(&mut dir, "nope").unwrap_err();
        assert!(matches!(err, AppError::ChannelNotFound(ref n) if n == "nope"));
        assert_eq!(dir.channel_requests, 3);
    }

    #[test]
    fn test_exact_match_only() {
        let mut dir = directory();
        assert!(resolve_channel(&mut dir, "eng-").is_err());
    }
}
