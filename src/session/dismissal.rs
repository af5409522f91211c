// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outside-click dismissal of the suggestion panel
//!
//! Pointer presses are process-wide: a [`PointerHub`] fans every press out
//! to the controllers currently mounted. Each controller holds exactly one
//! [`PointerSubscription`], and dropping it deregisters the listener.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// A pointer location in host coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned screen rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Region {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Edges are inclusive on the top/left and exclusive on the bottom/right.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x < self.x + self.width
            && point.y < self.y + self.height
    }
}

/// Where the host drew the input field and the suggestion panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub input: Option<Region>,
    #[serde(default)]
    pub panel: Option<Region>,
}

impl Layout {
    /// True when the press hits neither the input nor the rendered panel
    pub fn is_outside(&self, point: Point, panel_rendered: bool) -> bool {
        let in_input = self.input.is_some_and(|r| r.contains(point));
        let in_panel = panel_rendered && self.panel.is_some_and(|r| r.contains(point));
        !in_input && !in_panel
    }
}

static GLOBAL_HUB: Lazy<PointerHub> = Lazy::new(PointerHub::new);

#[derive(Debug, Default)]
struct HubInner {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<u64, UnboundedSender<Point>>>,
}

impl HubInner {
    fn listeners(&self) -> MutexGuard<'_, HashMap<u64, UnboundedSender<Point>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Source of pointer-press events
#[derive(Debug, Clone, Default)]
pub struct PointerHub {
    inner: Arc<HubInner>,
}

impl PointerHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide hub the binary feeds pointer input into
    pub fn global() -> &'static PointerHub {
        &GLOBAL_HUB
    }

    /// Register a listener that lives as long as the returned guard
    pub fn subscribe(&self) -> PointerSubscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.listeners().insert(id, tx);
        debug!(id, "pointer listener registered");
        PointerSubscription {
            id,
            hub: Arc::downgrade(&self.inner),
            rx,
        }
    }

    /// Deliver a press to every live listener; returns how many received it
    pub fn press(&self, point: Point) -> usize {
        let mut listeners = self.inner.listeners();
        listeners.retain(|_, tx| tx.send(point).is_ok());
        listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners().len()
    }
}

/// Registration guard for one pointer listener
#[derive(Debug)]
pub struct PointerSubscription {
    id: u64,
    hub: Weak<HubInner>,
    rx: UnboundedReceiver<Point>,
}

impl PointerSubscription {
    pub async fn recv(&mut self) -> Option<Point> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Point> {
        self.rx.try_recv().ok()
    }
}

impl Drop for PointerSubscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.listeners().remove(&self.id);
            debug!(id = self.id, "pointer listener removed");
        }
    }
}
