use nearby_core::Status;
use std::time::Duration;
use tokio::time::Instant;

/// Derives the local status from user activity and page visibility.
///
/// Every method returns the status to announce, if any.
#[derive(Debug)]
pub struct ActivityMonitor {
    idle_timeout: Duration,
    last_activity: Instant,
    idle: bool,
}

impl ActivityMonitor {
    pub fn new(idle_timeout: Duration, now: Instant) -> Self {
        Self {
            idle_timeout,
            last_activity: now,
            idle: false,
        }
    }

    /// Any input resets the idle timer; coming back from idle goes online.
    pub fn record_activity(&mut self, now: Instant) -> Option<Status> {
        self.last_activity = now;
        if self.idle {
            self.idle = false;
            return Some(Status::Online);
        }
        None
    }

    pub fn tick(&mut self, now: Instant) -> Option<Status> {
        if !self.idle && now.saturating_duration_since(self.last_activity) >= self.idle_timeout {
            self.idle = true;
            return Some(Status::Idle);
        }
        None
    }

    /// Hidden pages report away. The idle timer keeps running underneath.
    pub fn set_visible(&self, visible: bool) -> Option<Status> {
        if !visible {
            Some(Status::Away)
        } else if self.idle {
            Some(Status::Idle)
        } else {
            Some(Status::Online)
        }
    }

    pub fn is_idle(&self) -> bool {
        self.idle
    }
}
