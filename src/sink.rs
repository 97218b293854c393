use std::io::Write;

use chrono::{Local, SecondsFormat};
use clap::ValueEnum;
use serde::Deserialize;

use crate::message::Message;
use crate::{AppError, Result};

/// Consumer of exported messages, fed in emission order.
pub trait Sink {
    fn accept(&mut self, message: Message) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Sink for Vec<Message> {
    fn accept(&mut self, message: Message) -> Result<()> {
        self.push(message);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// One human readable line per message
    #[default]
    Text,
    /// One JSON object per line
    #[value(alias = "json-stream")]
    #[serde(alias = "json-stream")]
    Json,
}

impl OutputFormat {
    pub fn sink<'a, W: Write + 'a>(
        self,
        out: W,
        print_attachments: bool,
        utc: bool,
    ) -> Box<dyn Sink + 'a> {
        match self {
            OutputFormat::Text => Box::new(TextSink::new(out, print_attachments, utc)),
            OutputFormat::Json => Box::new(JsonStreamSink::new(out)),
        }
    }
}

/// Renders `<RFC3339> <author>: <text>` lines, the author padded or cut to
/// eight characters.
pub struct TextSink<W: Write> {
    out: W,
    print_attachments: bool,
    utc: bool,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W, print_attachments: bool, utc: bool) -> Self {
        Self {
            out,
            print_attachments,
            utc,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn render_line(message: &Message, utc: bool) -> Result<String> {
    let dt = message
        .timestamp()?
        .to_datetime()
        .ok_or_else(|| AppError::InvalidTimestamp(message.ts.clone()))?;
    let stamp = if utc {
        dt.to_rfc3339_opts(SecondsFormat::Secs, true)
    } else {
        dt.with_timezone(&Local)
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    };
    Ok(format!("{} {:<8.8}: {}", stamp, message.author(), message.text))
}

impl<W: Write> Sink for TextSink<W> {
    fn accept(&mut self, message: Message) -> Result<()> {
        writeln!(self.out, "{}", render_line(&message, self.utc)?)?;
        if self.print_attachments {
            for attachment in &message.attachments {
                writeln!(self.out, "atmt: {}", attachment.fallback)?;
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Writes each message as a standalone JSON object followed by a newline.
pub struct JsonStreamSink<W: Write> {
    out: W,
}

impl<W: Write> JsonStreamSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Sink for JsonStreamSink<W> {
    fn accept(&mut self, message: Message) -> Result<()> {
        serde_json::to_writer(&mut self.out, &message)
            .map_err(|e| AppError::JsonSerialize(e.to_string()))?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
