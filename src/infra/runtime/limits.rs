use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::infra::config::ToolConfig;

/// Build a reqwest client bounded by the tool's connect/overall timeouts.
pub fn make_http_client(cfg: &ToolConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(cfg.connect_timeout())
        .timeout(cfg.timeout())
        .build()
}

pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Tweet,
    Dm,
}

impl Endpoint {
    /// Successful calls allowed per window.
    pub fn limit(self) -> usize {
        match self {
            Endpoint::Tweet => 300,
            Endpoint::Dm => 1000,
        }
    }
}

/// Process-local sliding-window quota guard. Clones share one window, so a
/// single instance covers every MCP session.
#[derive(Debug, Clone, Default)]
pub struct RateWindow(Arc<Mutex<HashMap<Endpoint, VecDeque<Instant>>>>);

impl RateWindow {
    /// Reserve a slot before calling upstream. Check and reservation happen
    /// under one lock, so concurrent callers cannot overshoot the limit.
    /// `None` means the window is full.
    pub fn try_acquire(&self, endpoint: Endpoint) -> Option<Instant> {
        self.try_acquire_at(endpoint, Instant::now())
    }

    /// Give back a slot whose upstream call failed.
    pub fn release(&self, endpoint: Endpoint, slot: Instant) {
        let Ok(mut windows) = self.0.lock() else {
            return;
        };
        if let Some(stamps) = windows.get_mut(&endpoint) {
            if let Some(pos) = stamps.iter().rposition(|t| *t == slot) {
                stamps.remove(pos);
            }
        }
    }

    pub(crate) fn try_acquire_at(&self, endpoint: Endpoint, now: Instant) -> Option<Instant> {
        // A poisoned lock only means another caller panicked mid-update.
        let mut windows = self.0.lock().unwrap_or_else(|e| e.into_inner());
        let stamps = windows.entry(endpoint).or_default();
        while stamps
            .front()
            .is_some_and(|t| now.saturating_duration_since(*t) >= RATE_LIMIT_WINDOW)
        {
            stamps.pop_front();
        }
        if stamps.len() >= endpoint.limit() {
            return None;
        }
        stamps.push_back(now);
        Some(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dm_window_fills_then_drains() {
        let w = RateWindow::default();
        let t0 = Instant::now();
        for _ in 0..Endpoint::Dm.limit() {
            assert!(w.try_acquire_at(Endpoint::Dm, t0).is_some());
        }
        assert!(w.try_acquire_at(Endpoint::Dm, t0).is_none());
        assert!(w
            .try_acquire_at(Endpoint::Dm, t0 + Duration::from_secs(14 * 60))
            .is_none());
        assert!(w.try_acquire_at(Endpoint::Dm, t0 + RATE_LIMIT_WINDOW).is_some());
    }

    #[test]
    fn endpoints_are_tracked_separately() {
        let w = RateWindow::default();
        let t0 = Instant::now();
        for _ in 0..Endpoint::Tweet.limit() {
            w.try_acquire_at(Endpoint::Tweet, t0);
        }
        assert!(w.try_acquire_at(Endpoint::Tweet, t0).is_none());
        assert!(w.try_acquire_at(Endpoint::Dm, t0).is_some());
    }

    #[test]
    fn clones_share_the_window() {
        let a = RateWindow::default();
        let b = a.clone();
        let t0 = Instant::now();
        for _ in 0..Endpoint::Tweet.limit() {
            a.try_acquire_at(Endpoint::Tweet, t0);
        }
        assert!(b.try_acquire_at(Endpoint::Tweet, t0).is_none());
    }

    #[test]
    fn released_slot_can_be_reused() {
        let w = RateWindow::default();
        let t0 = Instant::now();
        let mut last = None;
        for _ in 0..Endpoint::Tweet.limit() {
            last = w.try_acquire_at(Endpoint::Tweet, t0);
        }
        assert!(w.try_acquire_at(Endpoint::Tweet, t0).is_none());
        w.release(Endpoint::Tweet, last.unwrap());
        assert!(w.try_acquire_at(Endpoint::Tweet, t0).is_some());
    }

    #[test]
    fn concurrent_acquirers_never_exceed_limit() {
        let w = RateWindow::default();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let w = w.clone();
                std::thread::spawn(move || {
                    (0..Endpoint::Tweet.limit())
                        .filter(|_| w.try_acquire(Endpoint::Tweet).is_some())
                        .count()
                })
            })
            .collect();
        let granted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(granted, Endpoint::Tweet.limit());
    }

    #[test]
    fn client_builds_with_default_timeouts() {
        assert!(make_http_client(&ToolConfig::default()).is_ok());
    }
}
