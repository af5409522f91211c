// SPDX-License-Identifier: MIT OR Apache-2.0

//! Headless host protocol (stdio JSON lines).
//!
//! Each stdin line is one host event, tagged by `event`:
//!
//! ```text
//! {"event": "type", "text": "mach"}
//! {"event": "key", "key": "ArrowDown"}
//! {"event": "pointer", "x": 10.0, "y": 300.0}
//! {"event": "layout", "input": {"x": 0, "y": 0, "width": 300, "height": 40}}
//! {"event": "submit"}
//! ```
//!
//! A snapshot line is written after every applied event, including timer
//! and request completions. Pointer presses go through the process-wide
//! hub and are answered once the session has seen them. At end of input the
//! driver waits for outstanding work before exiting; `quit` exits at once.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use shahquery::backend::Backend;
use shahquery::controller::Controller;
use shahquery::session::{Event, Key, Layout, ModalTarget, Point, PointerHub, Region, SessionSettings};

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum HostEvent {
    Type {
        text: String,
    },
    Key {
        key: Key,
    },
    Pointer {
        x: f64,
        y: f64,
    },
    Focus,
    Layout {
        #[serde(default)]
        input: Option<Region>,
        #[serde(default)]
        panel: Option<Region>,
    },
    Submit,
    PickSuggestion {
        index: usize,
    },
    SelectResult {
        doc_id: String,
    },
    ModalClick {
        target: ModalTarget,
    },
    Snapshot,
    Quit,
}

impl HostEvent {
    /// Session event for this host event, if it maps to one
    fn into_event(self) -> Option<Event> {
        Some(match self {
            HostEvent::Type { text } => Event::QueryChanged(text),
            HostEvent::Key { key } => Event::Key(key),
            HostEvent::Focus => Event::Focus,
            HostEvent::Layout { input, panel } => Event::Layout(Layout { input, panel }),
            HostEvent::Submit => Event::Submit,
            HostEvent::PickSuggestion { index } => Event::SuggestionClicked(index),
            HostEvent::SelectResult { doc_id } => Event::ResultSelected(doc_id),
            HostEvent::ModalClick { target } => Event::ModalClicked(target),
            HostEvent::Pointer { .. } | HostEvent::Snapshot | HostEvent::Quit => return None,
        })
    }
}

pub async fn run<B: Backend>(backend: Arc<B>, settings: SessionSettings) -> Result<()> {
    let hub = PointerHub::global();
    let mut controller = Controller::mount(backend, settings, hub);
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();
    let mut stdin_open = true;

    loop {
        if !stdin_open && !controller.is_busy() {
            if controller.drain() > 0 {
                write_snapshot(&mut stdout, &controller).await?;
            }
            break;
        }

        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line.context("reading stdin")? else {
                    debug!("stdin closed, settling outstanding work");
                    stdin_open = false;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let host_event = match serde_json::from_str::<HostEvent>(&line) {
                    Ok(event) => event,
                    Err(err) => {
                        let error = json!({ "error": format!("parse error: {}", err) });
                        write_line(&mut stdout, &error).await?;
                        continue;
                    }
                };
                match host_event {
                    HostEvent::Quit => break,
                    HostEvent::Pointer { x, y } => {
                        let delivered = hub.press(Point::new(x, y));
                        debug!(delivered, "pointer press broadcast");
                        continue;
                    }
                    other => {
                        if let Some(event) = other.into_event() {
                            controller.dispatch(event);
                        }
                    }
                }
                write_snapshot(&mut stdout, &controller).await?;
            }
            Some(event) = controller.next_event() => {
                controller.dispatch(event);
                write_snapshot(&mut stdout, &controller).await?;
            }
        }
    }

    Ok(())
}

async fn write_snapshot<B: Backend>(
    stdout: &mut io::Stdout,
    controller: &Controller<B>,
) -> Result<()> {
    write_line(stdout, &controller.session().snapshot()).await
}

/// Always compact: one value per line
async fn write_line<T: Serialize>(stdout: &mut io::Stdout, value: &T) -> Result<()> {
    let mut buf = serde_json::to_vec(value).context("serializing snapshot")?;
    buf.push(b'\n');
    stdout.write_all(&buf).await?;
    stdout.flush().await?;
    Ok(())
}
