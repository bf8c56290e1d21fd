//! Console transport - drives the engine from stdin for local use.
//!
//! The real conversational transport is outside this crate's scope; this
//! adapter maps terminal lines onto the engine's event shapes so the whole
//! workflow can be exercised end to end:
//!
//! - `/start`, `/cancel` - the start and cancel commands
//! - `/photo <url>` - an image made reachable by URL
//! - `/pick <token>` - a menu selection (tokens are printed with each menu)
//! - `/quit` - leave the console
//! - anything else - a free-text message (`\n` stands for a line break)

use std::sync::Arc;

use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::application::{Engine, Event, Reply};
use crate::domain::foundation::UserId;

/// Line-oriented console session for a single local user.
pub struct ConsoleTransport {
    engine: Arc<Engine>,
    user_id: UserId,
    display_name: String,
}

impl ConsoleTransport {
    pub fn new(engine: Arc<Engine>, user_id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            engine,
            user_id,
            display_name: display_name.into(),
        }
    }

    /// Reads lines from stdin until EOF or `/quit`.
    pub async fn run(&self) -> io::Result<()> {
        let mut lines = BufReader::new(io::stdin()).lines();
        let mut stdout = io::stdout();

        stdout
            .write_all(b"tallybot console. /start to begin, /quit to leave.\n> ")
            .await?;
        stdout.flush().await?;

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line == "/quit" {
                break;
            }
            if line.is_empty() {
                stdout.write_all(b"> ").await?;
                stdout.flush().await?;
                continue;
            }

            let event = parse_line(line);
            let reply = self
                .engine
                .dispatch(&self.user_id, &self.display_name, event)
                .await;

            stdout.write_all(render(&reply).as_bytes()).await?;
            stdout.write_all(b"\n> ").await?;
            stdout.flush().await?;
        }
        Ok(())
    }
}

/// Maps one console line onto an inbound event.
fn parse_line(line: &str) -> Event {
    if line == "/start" {
        return Event::Start;
    }
    if line == "/cancel" {
        return Event::Cancel;
    }
    if let Some(url) = line.strip_prefix("/photo ") {
        return Event::Photo {
            url: url.trim().to_string(),
        };
    }
    if let Some(token) = line.strip_prefix("/pick ") {
        return Event::Select(token.trim().to_string());
    }
    Event::Text(line.replace("\\n", "\n"))
}

/// Renders a reply, listing menu rows as `[token] label`.
fn render(reply: &Reply) -> String {
    let mut out = reply.text.clone();
    if let Some(menu) = &reply.menu {
        for row in menu.rows() {
            for button in row {
                out.push_str(&format!("\n  [{}] {}", button.token, button.label));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_line_maps_commands() {
        assert_eq!(parse_line("/start"), Event::Start);
        assert_eq!(parse_line("/cancel"), Event::Cancel);
        assert_eq!(
            parse_line("/photo https://example.com/a.jpg"),
            Event::Photo {
                url: "https://example.com/a.jpg".to_string()
            }
        );
        assert_eq!(
            parse_line("/pick mode_text"),
            Event::Select("mode_text".to_string())
        );
    }

    #[test]
    fn parse_line_expands_escaped_newlines() {
        assert_eq!(
            parse_line("Banda: 10\\nDube: 20"),
            Event::Text("Banda: 10\nDube: 20".to_string())
        );
    }
}
