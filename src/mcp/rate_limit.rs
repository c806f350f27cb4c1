// file: src/mcp/rate_limit.rs
// description: fixed-window request limiting for tool calls
// reference: https://doc.rust-lang.org/std/time/struct.Instant.html

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::warn;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Allows `max_requests` per caller in each fixed window. The window for a
/// caller starts with its first request and resets once it has elapsed.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    windows: Mutex<HashMap<String, Window>>,
    max_requests: u32,
    window: Duration,
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    /// Record a request for `caller`; `false` when it is over the limit.
    pub fn check(&self, caller: &str) -> bool {
        self.check_at(caller, Instant::now())
    }

    pub fn check_at(&self, caller: &str, now: Instant) -> bool {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let entry = windows.entry(caller.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.saturating_duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= self.max_requests {
            warn!(
                caller,
                requests = entry.count,
                max = self.max_requests,
                "Rate limit exceeded"
            );
            return false;
        }

        entry.count += 1;
        true
    }
}
