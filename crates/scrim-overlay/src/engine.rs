#![forbid(unsafe_code)]

//! The modal stack manager.
//!
//! [`OverlayEngine`] owns every overlay record in an arena keyed by
//! [`OverlayId`] and drives each one through
//! `queued → entering → open → exiting → closed`. All mutation happens in the
//! engine's own transition functions; callers only see handles, snapshots,
//! and the read-only projections.
//!
//! # Invariants
//!
//! - At most one enter or exit transition is in flight. Work that has to
//!   wait is kept in a FIFO of pending operations and started by `pump`
//!   when the orchestrator goes idle.
//! - Z-indexes are recomputed from stack position on every push and remove,
//!   so they stay strictly increasing after out-of-order closes.
//! - Only the topmost `open` instance owns the focus trap and receives
//!   backdrop, Escape, and pointer input.
//! - The scroll lock is held while anything is stacked or about to enter,
//!   and released once when the stack drains.
//! - Every instance that starts entering reaches `closed`; its timers,
//!   gesture, focus frame, and portal reference are released on the way.
//!
//! # Failure Modes
//!
//! Only invalid arguments come back to the caller. Mount failures, transition
//! timeouts, gesture conflicts, queue overflow, and sync channel failures are
//! logged, counted by the analytics recorder, and broadcast as
//! [`OverlayEvent::Error`].
//!
//! # Example
//!
//! ```
//! use scrim_core::testing::ScriptedHost;
//! use scrim_core::{OpenOptions, OverlayStatus, Variant};
//! use scrim_overlay::OverlayEngine;
//! use serde_json::json;
//!
//! let mut engine = OverlayEngine::builder(ScriptedHost::new()).build().unwrap();
//! let handle = engine
//!     .open(Variant::Confirmation, json!({ "msg": "Delete?" }), OpenOptions::new())
//!     .unwrap();
//! assert_eq!(handle.status(&engine), Some(OverlayStatus::Open));
//!
//! engine.close(handle.id());
//! assert_eq!(handle.status(&engine), Some(OverlayStatus::Closed));
//! assert!(!engine.is_scroll_locked());
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use ahash::{AHashMap, AHashSet};
use scrim_core::preset::{GESTURE_DISMISS_PRESET, NO_ANIMATION_PRESET};
use scrim_core::{
    AnimationPreset, Axis, Clock, CloseReason, DismissPolicy, DismissTrigger, Easing, ElementId,
    Host, InputEvent, Key, OpenOptions, OverlayConfig, OverlayError, OverlayId, OverlayStatus,
    Point, PointerId, PortalKey, PresetTable, Props, SystemClock, TabId, TransitionPhase, Variant,
};
use scrim_runtime::{
    EventStream, PersistedOverlay, SessionStorage, SyncError, SyncKind, SyncTransport,
};
use web_time::Instant;

use crate::analytics::AnalyticsRecorder;
use crate::animation::{AnimationOrchestrator, Settled, Started, TransitionView};
use crate::focus::FocusController;
use crate::gesture::{GestureController, GestureState};
use crate::handle::{OverlayHandle, OverlaySnapshot};
use crate::mirror::{MirrorAction, MirrorKey, SyncBridge};
use crate::persistence::Persistence;
use crate::portal::PortalMount;
use crate::queue::{QueueScheduler, admits};
use crate::scroll_lock::ScrollLock;
use crate::stack::OverlayStack;
use crate::timers::Timers;
use crate::variants::NOTIFICATION;
use crate::views::{OverlayEvent, OverlayViews, StackItem};

/// Work waiting for the orchestrator to go idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingOp {
    Enter(OverlayId),
    Exit(OverlayId),
}

impl PendingOp {
    fn enter_id(&self) -> Option<OverlayId> {
        match self {
            Self::Enter(id) => Some(*id),
            Self::Exit(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Record {
    variant: Variant,
    props: Props,
    status: OverlayStatus,
    z_index: Option<i32>,
    dismiss: DismissPolicy,
    preset: String,
    priority: i32,
    dedupe_key: Option<String>,
    trigger: Option<ElementId>,
    portal: PortalKey,
    auto_dismiss: Option<Duration>,
    opened_at_ms: Option<u64>,
    closed_at_ms: Option<u64>,
    close_reason: Option<CloseReason>,
    /// Close requested while entering; honoured once the enter settles.
    deferred_close: Option<DismissTrigger>,
    /// Set once an exit has been queued or started.
    exit_trigger: Option<DismissTrigger>,
    exit_from_offset: f64,
    mirror: Option<MirrorKey>,
    announced: bool,
}

impl Record {
    /// Queued, entering, or open, with no close on the way.
    fn is_live(&self) -> bool {
        match self.status {
            OverlayStatus::Queued => true,
            OverlayStatus::Entering => self.deferred_close.is_none(),
            OverlayStatus::Open => self.exit_trigger.is_none(),
            OverlayStatus::Exiting | OverlayStatus::Closed => false,
        }
    }
}

fn instant_preset() -> AnimationPreset {
    AnimationPreset::new(NO_ANIMATION_PRESET, Duration::ZERO, Duration::ZERO, Easing::Linear)
}

/// Builder for [`OverlayEngine`].
pub struct OverlayEngineBuilder<H: Host> {
    host: H,
    config: OverlayConfig,
    clock: Option<Box<dyn Clock>>,
    presets: PresetTable,
    variants: Vec<String>,
    axis: Axis,
    transport: Option<Box<dyn SyncTransport>>,
    tab: Option<TabId>,
    storage: Option<Box<dyn SessionStorage>>,
}

impl<H: Host> OverlayEngineBuilder<H> {
    fn new(host: H) -> Self {
        Self {
            host,
            config: OverlayConfig::default(),
            clock: None,
            presets: PresetTable::builtin(),
            variants: Vec::new(),
            axis: Axis::Vertical,
            transport: None,
            tab: None,
            storage: None,
        }
    }

    #[must_use]
    pub fn config(mut self, config: OverlayConfig) -> Self {
        self.config = config;
        self
    }

    /// Time source (default: [`SystemClock`]).
    #[must_use]
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Register an extra animation preset, or replace a built-in one.
    #[must_use]
    pub fn preset(mut self, preset: AnimationPreset) -> Self {
        self.presets.insert(preset);
        self
    }

    /// Register a custom variant name.
    #[must_use]
    pub fn variant(mut self, name: impl Into<String>) -> Self {
        self.variants.push(name.into());
        self
    }

    /// Axis along which drags dismiss (default vertical).
    #[must_use]
    pub fn gesture_axis(mut self, axis: Axis) -> Self {
        self.axis = axis;
        self
    }

    /// Cross-tab transport. Only used when `sync_across_tabs` is set.
    #[must_use]
    pub fn sync(mut self, transport: impl SyncTransport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Identity of this tab in sync messages (default: random).
    #[must_use]
    pub fn tab(mut self, tab: TabId) -> Self {
        self.tab = Some(tab);
        self
    }

    /// Session storage. Only used when `session_id` is set.
    #[must_use]
    pub fn storage(mut self, storage: impl SessionStorage + 'static) -> Self {
        self.storage = Some(Box::new(storage));
        self
    }

    /// Validate the configuration and assemble the engine.
    ///
    /// # Errors
    ///
    /// [`OverlayError::InvalidArgument`] for an invalid configuration or a
    /// bad custom variant name.
    pub fn build(self) -> Result<OverlayEngine<H>, OverlayError> {
        let Self {
            host,
            config,
            clock,
            presets,
            variants,
            axis,
            transport,
            tab,
            storage,
        } = self;
        config.validate_with(&presets)?;

        let clock = clock.unwrap_or_else(|| Box::new(SystemClock));
        let tab =
            tab.unwrap_or_else(|| TabId(ahash::RandomState::new().hash_one(clock.wall_millis())));
        let transport = if config.sync_across_tabs { transport } else { None };
        let missing_transport = config.sync_across_tabs && transport.is_none();
        let persistence = match (&config.session_id, storage) {
            (Some(session), Some(storage)) => Some(Persistence::new(storage, session.clone())),
            (Some(session), None) => {
                tracing::debug!(session = %session, "no session storage attached, persistence off");
                None
            }
            (None, _) => None,
        };

        let mut engine = OverlayEngine {
            host,
            stack: OverlayStack::new(config.base_z_index, config.z_index_step),
            config,
            clock,
            presets,
            custom_variants: AHashSet::new(),
            records: AHashMap::new(),
            closed: VecDeque::new(),
            queue: QueueScheduler::new(),
            pending: VecDeque::new(),
            pumping: false,
            portals: PortalMount::new(),
            focus: FocusController::new(),
            gesture: GestureController::new(axis),
            animation: AnimationOrchestrator::new(),
            scroll: ScrollLock::new(),
            timers: Timers::new(),
            analytics: AnalyticsRecorder::new(),
            sync: SyncBridge::new(tab, transport),
            persistence,
            views: OverlayViews::new(),
            events: EventStream::new(),
        };
        for name in variants {
            engine.register_variant(name)?;
        }
        if missing_transport {
            engine.report(OverlayError::SyncChannel("no transport attached".to_owned()));
        }
        tracing::debug!(tab = %tab, sync = engine.sync.is_enabled(), "overlay engine ready");
        engine.refresh_views();
        Ok(engine)
    }
}

/// Headless overlay orchestration engine.
pub struct OverlayEngine<H: Host> {
    host: H,
    config: OverlayConfig,
    clock: Box<dyn Clock>,
    presets: PresetTable,
    custom_variants: AHashSet<String>,
    records: AHashMap<OverlayId, Record>,
    /// Closed ids, oldest first, for pruning.
    closed: VecDeque<OverlayId>,
    stack: OverlayStack,
    queue: QueueScheduler,
    pending: VecDeque<PendingOp>,
    pumping: bool,
    portals: PortalMount,
    focus: FocusController,
    gesture: GestureController,
    animation: AnimationOrchestrator,
    scroll: ScrollLock,
    timers: Timers,
    analytics: AnalyticsRecorder,
    sync: SyncBridge,
    persistence: Option<Persistence>,
    views: OverlayViews,
    events: EventStream<OverlayEvent>,
}

impl<H: Host> std::fmt::Debug for OverlayEngine<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayEngine")
            .field("stack", &self.stack.ids().collect::<Vec<_>>())
            .field("queued", &self.queue_len())
            .field("records", &self.records.len())
            .field("busy", &self.animation.is_busy())
            .field("sync", &self.sync)
            .finish()
    }
}

impl<H: Host> OverlayEngine<H> {
    #[must_use]
    pub fn builder(host: H) -> OverlayEngineBuilder<H> {
        OverlayEngineBuilder::new(host)
    }

    // --- Public operations ---

    /// Request an overlay.
    ///
    /// The request is queued and admitted according to its queue policy;
    /// the returned handle tracks it either way. A request whose dedupe key
    /// matches a live instance returns that instance's handle instead.
    ///
    /// # Errors
    ///
    /// [`OverlayError::InvalidArgument`] for an unregistered custom variant
    /// or an unknown animation preset.
    pub fn open(
        &mut self,
        variant: impl Into<Variant>,
        props: Props,
        options: OpenOptions,
    ) -> Result<OverlayHandle, OverlayError> {
        let variant = variant.into();
        let _span = tracing::debug_span!("open", %variant).entered();
        let handle = self.enqueue(variant, props, options, None)?;
        self.flush();
        Ok(handle)
    }

    /// Programmatic close.
    ///
    /// Open instances start exiting; an entering instance exits as soon as
    /// its enter settles. Anything else is left alone: use
    /// [`cancel`](Self::cancel) to withdraw a queued request.
    pub fn close(&mut self, id: OverlayId) {
        let _span = tracing::debug_span!("close", overlay = %id).entered();
        if self.close_with(id, DismissTrigger::Programmatic) {
            self.flush();
        }
    }

    /// Withdraw a request that has not started entering. Returns `true` if
    /// it was withdrawn.
    pub fn cancel(&mut self, id: OverlayId) -> bool {
        let _span = tracing::debug_span!("cancel", overlay = %id).entered();
        if !self.withdraw(id) {
            return false;
        }
        self.admit_from_queue();
        self.flush();
        true
    }

    /// Discard every queued request and close the stack top-down, one exit
    /// at a time.
    pub fn close_all(&mut self) {
        let _span = tracing::debug_span!("close_all").entered();
        let mut withdrawn: Vec<OverlayId> =
            self.pending.iter().filter_map(PendingOp::enter_id).collect();
        self.pending.retain(|op| matches!(op, PendingOp::Exit(_)));
        withdrawn.extend(self.queue.drain());
        for id in withdrawn {
            self.finalize(id, CloseReason::Cancelled);
        }
        let top_down: Vec<OverlayId> = self.stack.ids().rev().collect();
        for id in top_down {
            self.close_with(id, DismissTrigger::Programmatic);
        }
        self.flush();
    }

    /// Snapshot of one instance. `None` for unknown or pruned ids.
    #[must_use]
    pub fn query(&self, id: OverlayId) -> Option<OverlaySnapshot> {
        let record = self.records.get(&id)?;
        Some(OverlaySnapshot {
            id,
            variant: record.variant.clone(),
            status: record.status,
            z_index: record.z_index,
            opened_at: record.opened_at_ms,
            closed_at: record.closed_at_ms,
            close_reason: record.close_reason.clone(),
            props: record.props.clone(),
        })
    }

    #[must_use]
    pub fn status(&self, id: OverlayId) -> Option<OverlayStatus> {
        self.records.get(&id).map(|r| r.status)
    }

    /// Route host input. Returns `true` if the event was consumed.
    pub fn handle_input(&mut self, event: InputEvent) -> bool {
        let _span = tracing::trace_span!("input", ?event).entered();
        let consumed = match event {
            InputEvent::Key(Key::Escape) => self.dismiss_top(DismissTrigger::Escape, None),
            InputEvent::Key(Key::Tab) => self.focus.cycle(&mut self.host, true),
            InputEvent::Key(Key::BackTab) => self.focus.cycle(&mut self.host, false),
            InputEvent::Key(_) => false,
            InputEvent::FocusIn(element) => self.focus.enforce(&mut self.host, element),
            InputEvent::BackdropClick { target } => {
                self.dismiss_top(DismissTrigger::Backdrop, Some(target))
            }
            InputEvent::PointerDown {
                target,
                pointer,
                position,
            } => self.pointer_down(target, pointer, position),
            InputEvent::PointerMove { pointer, position } => self.pointer_move(pointer, position),
            InputEvent::PointerUp { pointer, position } => self.pointer_up(pointer, position),
            InputEvent::PointerCancel { pointer } => self.pointer_cancel(pointer),
        };
        self.flush();
        consumed
    }

    /// Advance time-driven work: transition settling and timeouts,
    /// auto-dismiss timers, and inbound sync messages.
    pub fn tick(&mut self) {
        let _span = tracing::trace_span!("tick").entered();
        let now = self.clock.now();
        if let Some(settled) = self.animation.poll(now, self.config.animation_timeout()) {
            self.apply_settled(settled);
        }
        for id in self.timers.take_due(now) {
            self.close_with(id, DismissTrigger::AutoDismiss);
        }
        self.receive_sync();
        self.flush();
    }

    /// The host reports that its transition for `id` finished. Late or
    /// unknown completions are ignored.
    pub fn transition_finished(&mut self, id: OverlayId) {
        let _span = tracing::debug_span!("transition_finished", overlay = %id).entered();
        if let Some(settled) = self.animation.finish(id) {
            self.apply_settled(settled);
            self.flush();
        }
    }

    /// Earliest instant at which [`tick`](Self::tick) has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        let animation = self.animation.deadline(self.config.animation_timeout());
        match (animation, self.timers.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Register a custom variant so it can be opened.
    ///
    /// # Errors
    ///
    /// [`OverlayError::InvalidArgument`] for an empty name or the name of a
    /// built-in variant.
    pub fn register_variant(&mut self, name: impl Into<String>) -> Result<Variant, OverlayError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(OverlayError::InvalidArgument(
                "variant name must not be empty".to_owned(),
            ));
        }
        let variant = Variant::from(name.clone());
        if !variant.is_custom() {
            return Err(OverlayError::InvalidArgument(format!(
                "'{name}' is a built-in variant"
            )));
        }
        self.custom_variants.insert(name);
        Ok(variant)
    }

    /// Re-open the overlays saved by a previous run of this session.
    ///
    /// Entries that no longer validate are skipped with a warning; storage
    /// failures resume nothing.
    pub fn resume(&mut self) -> Vec<OverlayHandle> {
        let _span = tracing::debug_span!("resume").entered();
        let saved = match self.persistence.as_ref().map(Persistence::load) {
            None => return Vec::new(),
            Some(Ok(saved)) => saved,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "cannot read saved overlays");
                return Vec::new();
            }
        };
        let mut handles = Vec::with_capacity(saved.len());
        for entry in saved {
            let mut options = OpenOptions::new().priority(entry.priority);
            options.preset = entry.preset;
            options.dismiss = entry.dismiss;
            match self.enqueue(entry.variant, entry.props, options, None) {
                Ok(handle) => handles.push(handle),
                Err(e) => tracing::warn!(error = %e, "skipping saved overlay"),
            }
        }
        self.flush();
        tracing::debug!(count = handles.len(), "overlays resumed");
        handles
    }

    // --- Accessors ---

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host access, for scripting a test host. The engine assumes
    /// nothing else creates roots, moves focus into overlays, or toggles
    /// the scroll lock.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    #[must_use]
    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    #[must_use]
    pub fn presets(&self) -> &PresetTable {
        &self.presets
    }

    #[must_use]
    pub fn analytics(&self) -> &AnalyticsRecorder {
        &self.analytics
    }

    #[must_use]
    pub fn views(&self) -> &OverlayViews {
        &self.views
    }

    /// Lifecycle event stream.
    #[must_use]
    pub fn events(&self) -> &EventStream<OverlayEvent> {
        &self.events
    }

    /// Stacked ids, bottom first.
    #[must_use]
    pub fn stack_ids(&self) -> Vec<OverlayId> {
        self.stack.ids().collect()
    }

    #[must_use]
    pub fn top(&self) -> Option<OverlayId> {
        self.stack.top_id()
    }

    /// Requests not yet entering: queued plus admitted-but-waiting.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len() + self.pending_enters()
    }

    #[must_use]
    pub fn focus_owner(&self) -> Option<OverlayId> {
        self.focus.owner()
    }

    #[must_use]
    pub fn is_scroll_locked(&self) -> bool {
        self.scroll.is_engaged()
    }

    #[must_use]
    pub fn gesture_state(&self) -> Option<GestureState> {
        self.gesture.state(&self.config.gesture)
    }

    #[must_use]
    pub fn active_transition(&self) -> Option<TransitionView> {
        self.animation.view(self.clock.now())
    }

    #[must_use]
    pub fn tab_id(&self) -> TabId {
        self.sync.tab()
    }

    #[must_use]
    pub fn is_sync_enabled(&self) -> bool {
        self.sync.is_enabled()
    }

    // --- Admission ---

    fn enqueue(
        &mut self,
        variant: Variant,
        props: Props,
        options: OpenOptions,
        mirror: Option<(MirrorKey, u64)>,
    ) -> Result<OverlayHandle, OverlayError> {
        if let Variant::Custom(name) = &variant
            && !self.custom_variants.contains(name)
        {
            return Err(OverlayError::InvalidArgument(format!("unknown variant '{name}'")));
        }
        let preset = options
            .preset
            .unwrap_or_else(|| self.config.animation_preset.clone());
        if !self.presets.contains(&preset) {
            return Err(OverlayError::InvalidArgument(format!(
                "unknown animation preset '{preset}'"
            )));
        }

        if let Some(key) = options.dedupe_key.as_deref()
            && let Some(existing) = self.find_live(key)
        {
            if self.config.refresh_on_dedupe
                && let Some(record) = self.records.get_mut(&existing)
            {
                record.props = props;
                self.events.emit(OverlayEvent::Refreshed { id: existing });
            }
            tracing::debug!(overlay = %existing, dedupe_key = key, "duplicate request collapsed");
            return Ok(OverlayHandle::new(existing));
        }

        let policy = options.queue_policy.unwrap_or(self.config.queue_policy);
        let auto_dismiss = match options.auto_dismiss {
            Some(after) if after.is_zero() => None,
            Some(after) => Some(after),
            None if variant.is_notification_class() => self.config.notification_auto_dismiss(),
            None => None,
        };
        let id = OverlayId::next();
        self.analytics.requested(id, variant.clone(), self.clock.now());
        if let Some((key, stamp)) = mirror {
            self.sync.bind(key, id, stamp);
        }
        self.records.insert(
            id,
            Record {
                variant: variant.clone(),
                props,
                status: OverlayStatus::Queued,
                z_index: None,
                dismiss: options.dismiss.unwrap_or_default(),
                preset,
                priority: options.priority,
                dedupe_key: options.dedupe_key,
                trigger: options.trigger,
                portal: options.portal.unwrap_or_default(),
                auto_dismiss,
                opened_at_ms: None,
                closed_at_ms: None,
                close_reason: None,
                deferred_close: None,
                exit_trigger: None,
                exit_from_offset: 0.0,
                mirror: mirror.map(|(key, _)| key),
                announced: false,
            },
        );
        self.queue.push(id, options.priority, policy);
        tracing::debug!(overlay = %id, %variant, ?policy, priority = options.priority, "queued");
        self.events.emit(OverlayEvent::Queued { id, variant });

        self.admit_from_queue();
        let capacity = self.config.queue_capacity;
        for dropped in self.queue.enforce_capacity(capacity) {
            self.report(OverlayError::QueueOverflow { dropped, capacity });
            self.finalize(dropped, CloseReason::QueueOverflow);
        }
        Ok(OverlayHandle::new(id))
    }

    fn find_live(&self, dedupe_key: &str) -> Option<OverlayId> {
        self.records
            .iter()
            .find(|(_, r)| r.dedupe_key.as_deref() == Some(dedupe_key) && r.is_live())
            .map(|(id, _)| *id)
    }

    fn pending_enters(&self) -> usize {
        self.pending.iter().filter(|op| op.enter_id().is_some()).count()
    }

    /// Move admissible requests from the queue head to the pending FIFO.
    /// The head blocks everything behind it.
    fn admit_from_queue(&mut self) {
        while let Some(head) = self.queue.head().copied() {
            if !admits(
                head.policy,
                self.stack.depth(),
                self.pending_enters(),
                self.config.max_stack_depth,
            ) {
                break;
            }
            self.queue.pop_head();
            tracing::debug!(overlay = %head.id, priority = head.priority, "admitted");
            self.pending.push_back(PendingOp::Enter(head.id));
        }
    }

    /// Withdraw a queued request. Returns `false` if `id` is not queued.
    fn withdraw(&mut self, id: OverlayId) -> bool {
        if self
            .records
            .get(&id)
            .is_none_or(|r| r.status != OverlayStatus::Queued)
        {
            return false;
        }
        self.queue.remove(id);
        self.pending.retain(|op| *op != PendingOp::Enter(id));
        self.finalize(id, CloseReason::Cancelled);
        true
    }

    // --- Transition sequencing ---

    /// Start pending work until a transition is in flight or nothing is left.
    fn pump(&mut self) {
        if self.pumping {
            return;
        }
        self.pumping = true;
        while !self.animation.is_busy() {
            let Some(op) = self.pending.pop_front() else {
                break;
            };
            match op {
                PendingOp::Enter(id) => self.begin_enter(id),
                PendingOp::Exit(id) => self.begin_exit(id),
            }
        }
        self.pumping = false;
        let occupied = !self.stack.is_empty() || self.pending_enters() > 0;
        self.scroll.sync(&mut self.host, occupied);
    }

    fn begin_enter(&mut self, id: OverlayId) {
        let Some(record) = self.records.get(&id) else {
            return;
        };
        if record.status != OverlayStatus::Queued {
            return;
        }
        let portal = record.portal.clone();
        let explicit_trigger = record.trigger;
        let announce = record.variant.is_notification_class() && record.mirror.is_none();

        if let Err(source) = self.portals.acquire(&mut self.host, &portal) {
            let detail = source.to_string();
            self.report(OverlayError::Mount {
                overlay: id,
                source,
            });
            self.finalize(id, CloseReason::MountFailed { detail });
            return;
        }
        let trigger = explicit_trigger.or_else(|| self.host.active_element());
        let z_index = self.stack.push(id);
        self.sync_z_indices();
        self.snap_back_covered(id);

        let Some(record) = self.records.get_mut(&id) else {
            return;
        };
        record.status = OverlayStatus::Entering;
        record.trigger = trigger;
        let announcement = (announce && self.sync.is_enabled()).then(|| {
            record.announced = true;
            SyncKind::Opened {
                remote_id: id,
                variant: record.variant.clone(),
                props: record.props.clone(),
            }
        });

        tracing::debug!(overlay = %id, z_index, "entering");
        self.events.emit(OverlayEvent::Entering { id, z_index });
        self.scroll.engage(&mut self.host);
        if let Some(kind) = announcement {
            self.announce(kind);
        }
        self.start_transition(id, TransitionPhase::Enter);
    }

    fn begin_exit(&mut self, id: OverlayId) {
        let Some(record) = self.records.get_mut(&id) else {
            return;
        };
        if record.status != OverlayStatus::Open {
            return;
        }
        let trigger = record.exit_trigger.unwrap_or(DismissTrigger::Programmatic);
        record.status = OverlayStatus::Exiting;
        tracing::debug!(overlay = %id, %trigger, "exiting");
        self.events.emit(OverlayEvent::Exiting { id, trigger });
        self.start_transition(id, TransitionPhase::Exit);
    }

    fn start_transition(&mut self, id: OverlayId, phase: TransitionPhase) {
        let Some(record) = self.records.get(&id) else {
            return;
        };
        let gesture_exit = phase == TransitionPhase::Exit
            && record.exit_trigger == Some(DismissTrigger::Gesture);
        let reduced = self.config.reduced_motion;
        let (name, from_offset) = if reduced {
            (NO_ANIMATION_PRESET, 0.0)
        } else if gesture_exit {
            (GESTURE_DISMISS_PRESET, record.exit_from_offset)
        } else {
            (record.preset.as_str(), 0.0)
        };
        let preset = self.presets.get(name).cloned().unwrap_or_else(instant_preset);
        let now = self.clock.now();
        let started = self
            .animation
            .start(&mut self.host, id, phase, &preset, from_offset, reduced, now);
        if let Started::Settled(settled) = started {
            self.apply_settled(settled);
        }
    }

    fn apply_settled(&mut self, settled: Settled) {
        if settled.timed_out {
            self.report(OverlayError::AnimationTimeout {
                overlay: settled.overlay,
                phase: settled.phase,
            });
        }
        match settled.phase {
            TransitionPhase::Enter => self.on_entered(settled.overlay),
            TransitionPhase::Exit => self.on_exited(settled.overlay),
        }
    }

    fn on_entered(&mut self, id: OverlayId) {
        let now = self.clock.now();
        let wall = self.clock.wall_millis();
        let Some(record) = self.records.get_mut(&id) else {
            return;
        };
        if record.status != OverlayStatus::Entering {
            return;
        }
        record.status = OverlayStatus::Open;
        record.opened_at_ms = Some(wall);
        let trigger = record.trigger;
        let auto_dismiss = record.auto_dismiss;
        let deferred = record.deferred_close.take();

        self.analytics.opened(id, now);
        self.focus.activate(&mut self.host, id, trigger);
        tracing::debug!(overlay = %id, "open");
        self.events.emit(OverlayEvent::Opened { id });

        if let Some(trigger) = deferred {
            self.request_exit(id, trigger, true);
        } else if let Some(after) = auto_dismiss {
            self.timers.arm(id, now + after);
        }
    }

    fn on_exited(&mut self, id: OverlayId) {
        let Some(record) = self.records.get(&id) else {
            return;
        };
        if record.status != OverlayStatus::Exiting {
            return;
        }
        let trigger = record.exit_trigger.unwrap_or(DismissTrigger::Programmatic);
        let portal = record.portal.clone();

        self.stack.remove(id);
        self.sync_z_indices();
        self.focus.release(&mut self.host, id);
        self.portals.release(&mut self.host, &portal);
        self.finalize(id, CloseReason::Dismissed { trigger });
        self.admit_from_queue();
    }

    /// Close `id` for `trigger`. Returns `true` if a close was scheduled.
    fn close_with(&mut self, id: OverlayId, trigger: DismissTrigger) -> bool {
        let Some(record) = self.records.get_mut(&id) else {
            return false;
        };
        match record.status {
            OverlayStatus::Open if record.exit_trigger.is_none() => {
                self.request_exit(id, trigger, false);
                true
            }
            OverlayStatus::Entering if record.deferred_close.is_none() => {
                record.deferred_close = Some(trigger);
                tracing::debug!(overlay = %id, %trigger, "close deferred until enter settles");
                true
            }
            _ => false,
        }
    }

    /// Queue the exit of an open instance. `urgent` exits run before any
    /// other pending work.
    fn request_exit(&mut self, id: OverlayId, trigger: DismissTrigger, urgent: bool) {
        let Some(record) = self.records.get_mut(&id) else {
            return;
        };
        record.exit_trigger = Some(trigger);
        self.timers.clear(id);
        self.gesture.cancel_for(id);
        tracing::debug!(overlay = %id, %trigger, "exit requested");
        if urgent {
            self.pending.push_front(PendingOp::Exit(id));
        } else {
            self.pending.push_back(PendingOp::Exit(id));
        }
    }

    /// Move `id` to `closed` and release everything tied to it.
    fn finalize(&mut self, id: OverlayId, reason: CloseReason) {
        let now = self.clock.now();
        let wall = self.clock.wall_millis();
        let Some(record) = self.records.get_mut(&id) else {
            return;
        };
        if record.status == OverlayStatus::Closed {
            return;
        }
        record.status = OverlayStatus::Closed;
        record.z_index = None;
        record.closed_at_ms = Some(wall);
        record.close_reason = Some(reason.clone());
        let announced = record.announced;
        let mirror = record.mirror;

        self.timers.clear(id);
        self.gesture.cancel_for(id);
        let trigger = match &reason {
            CloseReason::Dismissed { trigger } => Some(*trigger),
            _ => None,
        };
        self.analytics.closed(id, trigger, now);
        tracing::debug!(overlay = %id, %reason, "closed");
        self.events.emit(OverlayEvent::Closed { id, reason });
        if announced {
            self.announce(SyncKind::Closed { remote_id: id });
        }
        if let Some(key) = mirror {
            self.sync.forget(key);
        }

        self.closed.push_back(id);
        while self.closed.len() > self.config.closed_history {
            if let Some(old) = self.closed.pop_front() {
                self.records.remove(&old);
                self.analytics.forget(old);
            }
        }
    }

    fn sync_z_indices(&mut self) {
        for entry in self.stack.entries() {
            if let Some(record) = self.records.get_mut(&entry.id) {
                record.z_index = Some(entry.z_index);
            }
        }
    }

    // --- Input ---

    /// Topmost instance, if it is open and not already closing.
    fn interactive_top(&self) -> Option<OverlayId> {
        let top = self.stack.top_id()?;
        self.records
            .get(&top)
            .filter(|r| r.status == OverlayStatus::Open && r.exit_trigger.is_none())
            .map(|_| top)
    }

    fn dismiss_top(&mut self, trigger: DismissTrigger, target: Option<OverlayId>) -> bool {
        let enabled = match trigger {
            DismissTrigger::Escape => self.config.dismiss_on_escape,
            DismissTrigger::Backdrop => self.config.dismiss_on_backdrop_click,
            _ => true,
        };
        let Some(top) = self.interactive_top() else {
            return false;
        };
        if !enabled || target.is_some_and(|t| t != top) {
            return false;
        }
        let allowed = self
            .records
            .get(&top)
            .is_some_and(|r| r.dismiss.allows(trigger));
        allowed && self.close_with(top, trigger)
    }

    fn pointer_down(&mut self, target: OverlayId, pointer: PointerId, position: Point) -> bool {
        if !self.config.gesture.enabled || self.interactive_top() != Some(target) {
            return false;
        }
        let draggable = self
            .records
            .get(&target)
            .is_some_and(|r| r.dismiss.allows(DismissTrigger::Gesture));
        if !draggable {
            return false;
        }
        match self.gesture.begin(target, pointer, position, self.clock.now()) {
            Ok(()) => true,
            Err(error) => {
                self.report(error);
                false
            }
        }
    }

    fn pointer_move(&mut self, pointer: PointerId, position: Point) -> bool {
        let now = self.clock.now();
        match self.gesture.drag(pointer, position, now, &self.config.gesture) {
            Some((id, offset)) => {
                self.events.emit(OverlayEvent::DragMoved { id, offset });
                true
            }
            None => false,
        }
    }

    fn pointer_up(&mut self, pointer: PointerId, position: Point) -> bool {
        let Some(dragging) = self.gesture.dragging() else {
            return false;
        };
        let axis_length = self
            .host
            .extent(dragging, self.gesture.axis())
            .filter(|len| *len > 0.0)
            .unwrap_or(self.config.gesture.fallback_axis_length);
        let now = self.clock.now();
        let Some(outcome) =
            self.gesture
                .release(pointer, position, now, axis_length, &self.config.gesture)
        else {
            return false;
        };
        // A drag only dismisses the instance that is still on top.
        let committed = outcome.committed() && self.interactive_top() == Some(outcome.overlay);
        self.events.emit(OverlayEvent::DragReleased {
            id: outcome.overlay,
            committed,
        });
        if committed {
            if let Some(record) = self.records.get_mut(&outcome.overlay) {
                record.exit_from_offset = outcome.drag_offset;
            }
            self.close_with(outcome.overlay, DismissTrigger::Gesture);
        }
        true
    }

    /// Snap back a drag whose instance was just covered by `top`.
    fn snap_back_covered(&mut self, top: OverlayId) {
        let Some(covered) = self.gesture.dragging().filter(|id| *id != top) else {
            return;
        };
        if self.gesture.cancel_for(covered) {
            self.events.emit(OverlayEvent::DragReleased {
                id: covered,
                committed: false,
            });
        }
    }

    fn pointer_cancel(&mut self, pointer: PointerId) -> bool {
        match self.gesture.cancel_pointer(pointer) {
            Some(id) => {
                self.events.emit(OverlayEvent::DragReleased {
                    id,
                    committed: false,
                });
                true
            }
            None => false,
        }
    }

    // --- Sync ---

    fn announce(&mut self, kind: SyncKind) {
        let stamp = self.clock.wall_millis();
        if let Err(e) = self.sync.publish(kind, stamp) {
            self.sync_failed(&e);
        }
    }

    fn receive_sync(&mut self) {
        let messages = match self.sync.receive() {
            Ok(messages) => messages,
            Err(e) => {
                self.sync_failed(&e);
                return;
            }
        };
        for message in messages {
            match self.sync.resolve(message) {
                Some(MirrorAction::Open {
                    key,
                    stamp,
                    variant,
                    props,
                }) => {
                    tracing::debug!(origin = %key.0, remote = %key.1, "mirroring remote overlay");
                    let options = NOTIFICATION.options();
                    if let Err(e) = self.enqueue(variant, props, options, Some((key, stamp))) {
                        tracing::warn!(error = %e, "cannot mirror remote overlay");
                    }
                }
                Some(MirrorAction::Close(local)) => {
                    if !self.withdraw(local) {
                        self.close_with(local, DismissTrigger::Remote);
                    }
                }
                None => {}
            }
        }
    }

    fn sync_failed(&mut self, error: &SyncError) {
        self.sync.disable();
        self.report(OverlayError::SyncChannel(error.to_string()));
    }

    // --- Bookkeeping ---

    /// Log, count, and broadcast an absorbed runtime error.
    fn report(&mut self, error: OverlayError) {
        self.analytics.error(&error);
        self.events.emit(OverlayEvent::Error(error));
    }

    /// Run pending work, then save and republish state.
    fn flush(&mut self) {
        self.pump();
        self.persist();
        self.refresh_views();
    }

    fn persist(&mut self) {
        if self.persistence.is_none() {
            return;
        }
        let snapshot = self.persisted();
        if let Some(persistence) = self.persistence.as_mut()
            && let Err(e) = persistence.save(&snapshot)
        {
            tracing::warn!(error = %e, "cannot save overlays");
        }
    }

    /// Locally owned live instances in stack, pending, then queue order.
    fn persisted(&self) -> Vec<PersistedOverlay> {
        self.stack
            .ids()
            .chain(self.pending.iter().filter_map(PendingOp::enter_id))
            .chain(self.queue.ids())
            .filter_map(|id| self.records.get(&id))
            .filter(|r| r.mirror.is_none() && r.is_live())
            .map(|r| PersistedOverlay {
                variant: r.variant.clone(),
                props: r.props.clone(),
                preset: Some(r.preset.clone()),
                dismiss: Some(r.dismiss),
                priority: r.priority,
            })
            .collect()
    }

    fn refresh_views(&self) {
        let stack = self
            .stack
            .entries()
            .iter()
            .filter_map(|entry| {
                self.records.get(&entry.id).map(|r| StackItem {
                    id: entry.id,
                    variant: r.variant.clone(),
                    status: r.status,
                    z_index: entry.z_index,
                })
            })
            .collect();
        self.views.publish(
            stack,
            self.queue_len(),
            self.focus.owner(),
            self.scroll.is_engaged(),
            self.analytics.summary(),
        );
    }
}
