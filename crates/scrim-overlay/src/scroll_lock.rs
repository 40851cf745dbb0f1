#![forbid(unsafe_code)]

//! Body scroll lock while anything is stacked.
//!
//! Engaging records the scroll position and disables scrolling with padding
//! equal to the vanished scrollbar. Releasing restores both. Each call is a
//! no-op when the lock is already in the requested state, so the host sees
//! exactly one lock and one unlock per busy period.

use scrim_core::{Host, ScrollPosition};

#[derive(Debug, Default)]
pub struct ScrollLock {
    saved: Option<ScrollPosition>,
}

impl ScrollLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_engaged(&self) -> bool {
        self.saved.is_some()
    }

    /// Lock scrolling. Returns `true` if this call changed the state.
    pub fn engage(&mut self, host: &mut impl Host) -> bool {
        if self.saved.is_some() {
            return false;
        }
        let position = host.scroll_position();
        let compensation = host.scrollbar_width();
        host.set_scroll_locked(true, compensation);
        self.saved = Some(position);
        tracing::debug!(x = position.x, y = position.y, compensation, "scroll locked");
        true
    }

    /// Unlock scrolling and put the page back where it was.
    pub fn release(&mut self, host: &mut impl Host) -> bool {
        let Some(position) = self.saved.take() else {
            return false;
        };
        host.set_scroll_locked(false, 0.0);
        host.scroll_to(position);
        tracing::debug!(x = position.x, y = position.y, "scroll unlocked");
        true
    }

    /// Engage when `occupied`, release otherwise.
    pub fn sync(&mut self, host: &mut impl Host, occupied: bool) -> bool {
        if occupied {
            self.engage(host)
        } else {
            self.release(host)
        }
    }
}
