#![forbid(unsafe_code)]

//! Focus controller: one trap per open overlay, only the top one live.
//!
//! Frames are pushed as overlays become `open` and popped when their exit
//! completes. Pushing suspends the frame below, remembering where focus was
//! inside it; popping the top frame resumes the one below.
//!
//! # Restore order on close
//!
//! 1. The trigger recorded when the overlay started entering, if attached.
//! 2. The resumed frame's last focused element, or its first focusable.
//! 3. The host's default focus target.
//!
//! Closing a frame that is not on top changes nothing about current focus.

use scrim_core::{ElementId, Host, OverlayId};

#[derive(Debug, Clone)]
struct TrapFrame {
    overlay: OverlayId,
    trigger: Option<ElementId>,
    last_focused: Option<ElementId>,
}

/// Stack of focus traps. The last frame owns focus.
#[derive(Debug, Default)]
pub struct FocusController {
    frames: Vec<TrapFrame>,
}

impl FocusController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay currently owning the trap.
    #[must_use]
    pub fn owner(&self) -> Option<OverlayId> {
        self.frames.last().map(|f| f.overlay)
    }

    /// Trap focus inside `overlay`, suspending the current owner.
    pub fn activate(
        &mut self,
        host: &mut impl Host,
        overlay: OverlayId,
        trigger: Option<ElementId>,
    ) {
        if let Some(top) = self.frames.last_mut() {
            let active = host.active_element();
            if active.is_some_and(|a| host.focusables(top.overlay).contains(&a)) {
                top.last_focused = active;
            }
            tracing::debug!(suspended = %top.overlay, by = %overlay, "focus trap suspended");
        }
        let first = host.focusables(overlay).first().copied();
        if let Some(element) = first {
            host.focus(element);
        }
        self.frames.push(TrapFrame {
            overlay,
            trigger,
            last_focused: first,
        });
    }

    /// Remove the frame for `overlay`, restoring focus if it was on top.
    ///
    /// Returns the element focus moved to.
    pub fn release(&mut self, host: &mut impl Host, overlay: OverlayId) -> Option<ElementId> {
        let idx = self.frames.iter().position(|f| f.overlay == overlay)?;
        let was_top = idx + 1 == self.frames.len();
        let frame = self.frames.remove(idx);
        if !was_top {
            return None;
        }

        let target = frame
            .trigger
            .filter(|t| host.is_attached(*t))
            .or_else(|| self.resume_target(&*host))
            .or_else(|| host.default_focus_target());
        if let Some(element) = target {
            host.focus(element);
            if let Some(top) = self.frames.last_mut()
                && host.focusables(top.overlay).contains(&element)
            {
                top.last_focused = Some(element);
            }
        }
        tracing::debug!(%overlay, restored = ?target, "focus trap released");
        target
    }

    fn resume_target(&self, host: &impl Host) -> Option<ElementId> {
        let top = self.frames.last()?;
        top.last_focused
            .filter(|e| host.is_attached(*e))
            .or_else(|| host.focusables(top.overlay).first().copied())
    }

    /// Move focus to the next (or previous) focusable inside the trap,
    /// wrapping at the ends. Returns `false` when nothing is trapped.
    pub fn cycle(&mut self, host: &mut impl Host, forward: bool) -> bool {
        let Some(top) = self.frames.last_mut() else {
            return false;
        };
        let items = host.focusables(top.overlay);
        if items.is_empty() {
            return true;
        }
        let current = host
            .active_element()
            .and_then(|a| items.iter().position(|e| *e == a));
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => items.len() - 1,
            (Some(i), true) => (i + 1) % items.len(),
            (Some(i), false) => (i + items.len() - 1) % items.len(),
        };
        host.focus(items[next]);
        top.last_focused = Some(items[next]);
        true
    }

    /// React to focus landing on `element`. Focus outside the trap is pulled
    /// back. Returns `true` if focus was moved.
    pub fn enforce(&mut self, host: &mut impl Host, element: ElementId) -> bool {
        let Some(top) = self.frames.last_mut() else {
            return false;
        };
        let items = host.focusables(top.overlay);
        if items.contains(&element) {
            top.last_focused = Some(element);
            return false;
        }
        let back = top
            .last_focused
            .filter(|e| items.contains(e))
            .or_else(|| items.first().copied());
        match back {
            Some(back) => {
                host.focus(back);
                tracing::trace!(
                    escaped = element.0,
                    refocused = back.0,
                    "focus pulled back into trap"
                );
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrim_core::testing::ScriptedHost;

    fn id(n: u64) -> OverlayId {
        OverlayId::from_raw(n)
    }

    #[test]
    fn activate_focuses_first_focusable() {
        let mut host = ScriptedHost::new();
        let mut focus = FocusController::new();
        focus.activate(&mut host, id(1), Some(ElementId(5)));
        assert_eq!(host.active_element(), Some(ScriptedHost::generated_focusables(id(1))[0]));
        assert_eq!(focus.owner(), Some(id(1)));
        assert_eq!(focus.frames[0].trigger, Some(ElementId(5)));
    }

    #[test]
    fn release_restores_attached_trigger() {
        let mut host = ScriptedHost::new();
        host.attach(ElementId(5));
        let mut focus = FocusController::new();
        focus.activate(&mut host, id(1), Some(ElementId(5)));
        assert_eq!(focus.release(&mut host, id(1)), Some(ElementId(5)));
        assert_eq!(host.active_element(), Some(ElementId(5)));
        assert!(focus.frames.is_empty());
    }

    #[test]
    fn detached_trigger_falls_back_to_default() {
        let mut host = ScriptedHost::new();
        host.attach(ElementId(5));
        host.set_default_focus(ElementId(99));
        let mut focus = FocusController::new();
        focus.activate(&mut host, id(1), Some(ElementId(5)));
        host.detach(ElementId(5));
        assert_eq!(focus.release(&mut host, id(1)), Some(ElementId(99)));
    }

    #[test]
    fn nested_trap_suspends_and_resumes() {
        let mut host = ScriptedHost::new();
        let mut focus = FocusController::new();
        focus.activate(&mut host, id(1), None);
        let lower = ScriptedHost::generated_focusables(id(1));
        host.focus(lower[2]);

        focus.activate(&mut host, id(2), Some(ElementId(12345)));
        assert_eq!(focus.owner(), Some(id(2)));

        // Trigger 12345 was never attached, so the suspended frame resumes
        // at the element it last had focused.
        focus.release(&mut host, id(2));
        assert_eq!(focus.owner(), Some(id(1)));
        assert_eq!(host.active_element(), Some(lower[2]));
    }

    #[test]
    fn releasing_lower_frame_keeps_focus() {
        let mut host = ScriptedHost::new();
        let mut focus = FocusController::new();
        focus.activate(&mut host, id(1), None);
        focus.activate(&mut host, id(2), None);
        let before = host.active_element();
        assert_eq!(focus.release(&mut host, id(1)), None);
        assert_eq!(host.active_element(), before);
        assert_eq!(focus.owner(), Some(id(2)));
    }

    #[test]
    fn tab_wraps_within_trap() {
        let mut host = ScriptedHost::new();
        let mut focus = FocusController::new();
        focus.activate(&mut host, id(3), None);
        let items = ScriptedHost::generated_focusables(id(3));

        assert!(focus.cycle(&mut host, true));
        assert!(focus.cycle(&mut host, true));
        assert_eq!(host.active_element(), Some(items[2]));
        focus.cycle(&mut host, true);
        assert_eq!(host.active_element(), Some(items[0]));
        focus.cycle(&mut host, false);
        assert_eq!(host.active_element(), Some(items[2]));
    }

    #[test]
    fn tab_without_trap_is_unhandled() {
        let mut host = ScriptedHost::new();
        let mut focus = FocusController::new();
        assert!(!focus.cycle(&mut host, true));
    }

    #[test]
    fn focus_escaping_trap_is_pulled_back() {
        let mut host = ScriptedHost::new();
        let mut focus = FocusController::new();
        focus.activate(&mut host, id(4), None);
        let items = ScriptedHost::generated_focusables(id(4));
        focus.cycle(&mut host, true);

        host.attach(ElementId(77));
        host.set_active(Some(ElementId(77)));
        assert!(focus.enforce(&mut host, ElementId(77)));
        assert_eq!(host.active_element(), Some(items[1]));

        assert!(!focus.enforce(&mut host, items[0]));
    }
}
