use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::models::{DetailedMeme, Thumbnail};

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// One-shot timer that is re-armed after each firing while anything is
/// visible. Disarmed means no deadline at all.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecayTimer {
    deadline: Option<Instant>,
}

impl DecayTimer {
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Arms from `now` if something is visible and the timer is idle;
    /// disarms if nothing is visible. An armed timer keeps its deadline.
    pub fn sync(&mut self, visible: bool, now: Instant) {
        if !visible {
            self.deadline = None;
        } else if self.deadline.is_none() {
            self.deadline = Some(now + TICK_INTERVAL);
        }
    }

    /// Whole intervals elapsed since the deadline, counting the one due
    /// at the deadline itself. Zero while not due.
    fn due_ticks(&self, now: Instant) -> u32 {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                let late = now.duration_since(deadline).as_nanos() / TICK_INTERVAL.as_nanos();
                u32::try_from(late).unwrap_or(u32::MAX).saturating_add(1)
            }
            _ => 0,
        }
    }

    fn rearm(&mut self, visible: bool, next: Instant) {
        self.deadline = visible.then_some(next);
    }
}

/// Holds the visible memes and counts their lifetimes down locally between
/// refreshes. Snapshots handed out are never mutated; each tick swaps in
/// fresh allocations.
#[derive(Debug)]
pub struct DecaySimulator {
    thumbnails: Arc<[Thumbnail]>,
    detail: Option<Arc<DetailedMeme>>,
    timer: DecayTimer,
}

impl Default for DecaySimulator {
    fn default() -> Self {
        Self {
            thumbnails: Arc::from(Vec::new()),
            detail: None,
            timer: DecayTimer::default(),
        }
    }
}

impl DecaySimulator {
    pub fn thumbnails(&self) -> Arc<[Thumbnail]> {
        Arc::clone(&self.thumbnails)
    }

    pub fn detail(&self) -> Option<Arc<DetailedMeme>> {
        self.detail.clone()
    }

    pub fn is_visible(&self) -> bool {
        !self.thumbnails.is_empty() || self.detail.is_some()
    }

    pub fn timer(&self) -> DecayTimer {
        self.timer
    }

    /// Swaps in a server list. Entries that already reached zero are dropped.
    pub fn replace_thumbnails(&mut self, thumbnails: Vec<Thumbnail>, now: Instant) {
        let alive: Vec<Thumbnail> = thumbnails
            .into_iter()
            .filter(|thumb| thumb.time_to_live > 0)
            .collect();
        self.thumbnails = Arc::from(alive);
        self.timer.sync(self.is_visible(), now);
    }

    pub fn replace_detail(&mut self, detail: Option<DetailedMeme>, now: Instant) {
        self.detail = detail
            .filter(|meme| meme.time_to_live > 0)
            .map(Arc::new);
        self.timer.sync(self.is_visible(), now);
    }

    /// Applies every tick that fell due by `now`, so a late call catches
    /// up. The next deadline stays on the original one-second grid.
    /// Returns whether anything ticked.
    pub fn advance(&mut self, now: Instant) -> bool {
        let ticks = self.timer.due_ticks(now);
        let Some(deadline) = self.timer.deadline else {
            return false;
        };
        if ticks == 0 {
            return false;
        }
        self.step(i64::from(ticks));
        let next = deadline
            .checked_add(TICK_INTERVAL * ticks)
            .unwrap_or(now + TICK_INTERVAL);
        self.timer.rearm(self.is_visible(), next);
        true
    }

    /// One decay step, then re-arm from `now` only if something is still
    /// visible.
    pub fn tick(&mut self, now: Instant) {
        self.step(1);
        self.timer.rearm(self.is_visible(), now + TICK_INTERVAL);
    }

    fn step(&mut self, seconds: i64) {
        if !self.thumbnails.is_empty() {
            self.thumbnails = Arc::from(decay_thumbnails(&self.thumbnails, seconds));
        }
        if let Some(detail) = self.detail.take() {
            self.detail = decay_detail(&detail, seconds).map(Arc::new);
        }
    }
}

/// Every thumbnail loses `seconds`; those that reach zero are gone.
pub fn decay_thumbnails(thumbnails: &[Thumbnail], seconds: i64) -> Vec<Thumbnail> {
    thumbnails
        .iter()
        .filter(|thumb| thumb.time_to_live > seconds)
        .map(|thumb| Thumbnail {
            time_to_live: thumb.time_to_live - seconds,
            ..thumb.clone()
        })
        .collect()
}

/// `None` once the meme has run out of time.
pub fn decay_detail(meme: &DetailedMeme, seconds: i64) -> Option<DetailedMeme> {
    let remaining = meme.time_to_live.saturating_sub(seconds);
    (remaining > 0).then(|| DetailedMeme {
        time_to_live: remaining,
        ..meme.clone()
    })
}
