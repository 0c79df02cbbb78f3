//! Raw IRC line relay over stdio
//!
//! Reads server lines such as `:nick!user@host PRIVMSG #chan :text` on
//! stdin and writes `PRIVMSG #chan :reply` for each reply on stdout.
//! Everything that is not a PRIVMSG is skipped.

use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use urltitles::{ChatMessage, MessageHandler};

/// Replies buffered ahead of the writer
const REPLY_QUEUE: usize = 64;

/// Parse a raw PRIVMSG line into a chat message
///
/// The prefix is optional; without one the message has no sender.
pub fn parse_privmsg(line: &str) -> Option<ChatMessage> {
    let line = line.trim_end_matches(['\r', '\n']);

    let (nick, rest) = match line.strip_prefix(':') {
        Some(prefixed) => {
            let (prefix, rest) = prefixed.split_once(' ')?;
            let nick = prefix.split('!').next().unwrap_or(prefix);
            (Some(nick), rest)
        }
        None => (None, line),
    };

    let rest = rest.strip_prefix("PRIVMSG ")?;
    let (target, text) = rest.split_once(' ')?;
    let text = text.strip_prefix(':').unwrap_or(text);

    Some(ChatMessage::new(nick, target, text))
}

/// Format a reply for the message's target
///
/// Private messages are answered to the sender.
pub fn format_privmsg(message: &ChatMessage, reply: &str) -> String {
    let to = if message.is_channel() {
        message.target.as_str()
    } else {
        message.nick.as_deref().unwrap_or(&message.target)
    };
    format!("PRIVMSG {} :{}", to, reply)
}

/// Relay stdin to stdout until EOF
pub async fn run_relay<H>(handler: Arc<H>) -> io::Result<()>
where
    H: MessageHandler + 'static,
{
    let input = BufReader::new(tokio::io::stdin());
    relay(input, tokio::io::stdout(), handler).await.map(|_| ())
}

/// Relay raw IRC lines from `input` to `output`
///
/// Lines that are not valid UTF-8 are decoded lossily. Every PRIVMSG is
/// handled on its own task, so a slow URL delays only its own replies. A
/// single writer task serializes output lines. Returns the writer once input
/// is exhausted and all replies are written.
pub async fn relay<R, W, H>(input: R, output: W, handler: Arc<H>) -> io::Result<W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
    H: MessageHandler + 'static,
{
    let (tx, rx) = mpsc::channel::<String>(REPLY_QUEUE);
    let writer = tokio::spawn(write_lines(rx, output));

    let mut lines = input.split(b'\n');
    loop {
        let line = match lines.next_segment().await {
            Ok(Some(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Error reading input, stopping");
                break;
            }
        };

        let Some(message) = parse_privmsg(&line) else {
            debug!(line = %line, "Skipping non-PRIVMSG line");
            continue;
        };

        let handler = Arc::clone(&handler);
        let tx = tx.clone();
        tokio::spawn(async move {
            for reply in handler.handle(&message).await {
                if tx.send(format_privmsg(&message, &reply)).await.is_err() {
                    break;
                }
            }
        });
    }

    drop(tx);
    writer
        .await
        .map_err(io::Error::other)?
}

async fn write_lines<W>(mut rx: mpsc::Receiver<String>, mut output: W) -> io::Result<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        output.write_all(line.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }
    Ok(output)
}
