#![forbid(unsafe_code)]

//! Read-only projections of engine state.
//!
//! The engine republishes these after every public operation. Consumers
//! subscribe to the observables (or bind derived values to them) and never
//! get a path back into the engine's state. Publishing an unchanged value is
//! a no-op, so subscribers only hear real changes.
//!
//! Lifecycle transitions are also broadcast one by one as [`OverlayEvent`]s
//! on the engine's event stream.

use crate::analytics::AnalyticsSummary;
use scrim_core::{CloseReason, DismissTrigger, OverlayError, OverlayId, OverlayStatus, Variant};
use scrim_runtime::{Binding, Observable, bind_mapped, bind_mapped2};

/// One row of the stack snapshot, bottom first.
#[derive(Debug, Clone, PartialEq)]
pub struct StackItem {
    pub id: OverlayId,
    pub variant: Variant,
    pub status: OverlayStatus,
    pub z_index: i32,
}

/// Lifecycle notifications, in the order they happen.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEvent {
    Queued { id: OverlayId, variant: Variant },
    Entering { id: OverlayId, z_index: i32 },
    Opened { id: OverlayId },
    Exiting { id: OverlayId, trigger: DismissTrigger },
    Closed { id: OverlayId, reason: CloseReason },
    /// A dedupe hit replaced the props of an existing instance.
    Refreshed { id: OverlayId },
    /// Displayed drag offset changed.
    DragMoved { id: OverlayId, offset: f64 },
    DragReleased { id: OverlayId, committed: bool },
    /// A runtime error was absorbed.
    Error(OverlayError),
}

impl OverlayEvent {
    /// The overlay this event is about, if any.
    #[must_use]
    pub fn overlay(&self) -> Option<OverlayId> {
        match self {
            Self::Queued { id, .. }
            | Self::Entering { id, .. }
            | Self::Opened { id }
            | Self::Exiting { id, .. }
            | Self::Closed { id, .. }
            | Self::Refreshed { id }
            | Self::DragMoved { id, .. }
            | Self::DragReleased { id, .. } => Some(*id),
            Self::Error(error) => error.overlay(),
        }
    }
}

/// Observable projections. Clones share the same observables.
#[derive(Debug, Clone)]
pub struct OverlayViews {
    stack: Observable<Vec<StackItem>>,
    queue_len: Observable<usize>,
    focus_owner: Observable<Option<OverlayId>>,
    scroll_locked: Observable<bool>,
    analytics: Observable<AnalyticsSummary>,
}

impl Default for OverlayViews {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayViews {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stack: Observable::new(Vec::new()),
            queue_len: Observable::new(0),
            focus_owner: Observable::new(None),
            scroll_locked: Observable::new(false),
            analytics: Observable::new(AnalyticsSummary::default()),
        }
    }

    /// Stacked instances, bottom first.
    #[must_use]
    pub fn stack(&self) -> &Observable<Vec<StackItem>> {
        &self.stack
    }

    /// Requests waiting for admission or for their enter transition.
    #[must_use]
    pub fn queue_len(&self) -> &Observable<usize> {
        &self.queue_len
    }

    #[must_use]
    pub fn focus_owner(&self) -> &Observable<Option<OverlayId>> {
        &self.focus_owner
    }

    #[must_use]
    pub fn scroll_locked(&self) -> &Observable<bool> {
        &self.scroll_locked
    }

    #[must_use]
    pub fn analytics(&self) -> &Observable<AnalyticsSummary> {
        &self.analytics
    }

    /// Whether anything is stacked or waiting to be.
    #[must_use]
    pub fn is_busy(&self) -> Binding<bool> {
        bind_mapped2(&self.stack, &self.queue_len, |stack, queued| {
            !stack.is_empty() || *queued > 0
        })
    }

    #[must_use]
    pub fn depth(&self) -> Binding<usize> {
        bind_mapped(&self.stack, Vec::len)
    }

    /// Variant of the topmost stacked instance.
    #[must_use]
    pub fn top_variant(&self) -> Binding<Option<Variant>> {
        bind_mapped(&self.stack, |stack| stack.last().map(|item| item.variant.clone()))
    }

    pub(crate) fn publish(
        &self,
        stack: Vec<StackItem>,
        queue_len: usize,
        focus_owner: Option<OverlayId>,
        scroll_locked: bool,
        analytics: &AnalyticsSummary,
    ) {
        self.stack.set(stack);
        self.queue_len.set(queue_len);
        self.focus_owner.set(focus_owner);
        self.scroll_locked.set(scroll_locked);
        if self.analytics.with(|current| current != analytics) {
            self.analytics.set(analytics.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn unchanged_publish_is_silent() {
        let views = OverlayViews::new();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let _sub = views.queue_len().subscribe(move |_| counter.set(counter.get() + 1));

        let summary = AnalyticsSummary::default();
        views.publish(Vec::new(), 2, None, true, &summary);
        views.publish(Vec::new(), 2, None, true, &summary);
        assert_eq!(hits.get(), 1);
        assert!(views.scroll_locked().get());
        assert_eq!(views.analytics().version(), 0);
    }

    #[test]
    fn clones_share_projections() {
        let views = OverlayViews::new();
        let other = views.clone();
        let id = OverlayId::from_raw(9);
        views.publish(
            vec![StackItem {
                id,
                variant: Variant::Form,
                status: OverlayStatus::Open,
                z_index: 1000,
            }],
            0,
            Some(id),
            true,
            &AnalyticsSummary::default(),
        );
        assert_eq!(other.focus_owner().get(), Some(id));
        assert_eq!(other.stack().get().len(), 1);
    }

    #[test]
    fn derived_views_follow_publishes() {
        let views = OverlayViews::new();
        let busy = views.is_busy();
        let top = views.top_variant();
        assert!(!busy.get());
        assert_eq!(top.get(), None);

        views.publish(Vec::new(), 1, None, false, &AnalyticsSummary::default());
        assert!(busy.get());
        assert_eq!(views.depth().get(), 0);

        views.publish(
            vec![StackItem {
                id: OverlayId::from_raw(3),
                variant: Variant::Gallery,
                status: OverlayStatus::Entering,
                z_index: 1000,
            }],
            0,
            None,
            true,
            &AnalyticsSummary::default(),
        );
        assert!(busy.get());
        assert_eq!(views.depth().get(), 1);
        assert_eq!(top.get(), Some(Variant::Gallery));
    }

    #[test]
    fn event_overlay() {
        let id = OverlayId::from_raw(4);
        assert_eq!(OverlayEvent::Opened { id }.overlay(), Some(id));
        assert_eq!(
            OverlayEvent::Error(OverlayError::SyncChannel("gone".into())).overlay(),
            None
        );
    }
}
