#![forbid(unsafe_code)]

//! Scripted in-memory host for tests and headless demos.
//!
//! [`ScriptedHost`] behaves like a tiny document: it hands out portal roots,
//! tracks the focused element, keeps a scroll offset, and records every call
//! the engine makes so tests can assert on them.
//!
//! Each overlay gets three generated focusable elements unless the test
//! scripts a different list with [`ScriptedHost::set_focusables`]. Generated
//! elements count as attached.

use crate::event::Axis;
use crate::host::{Host, HostError, ScrollPosition, TransitionAck};
use crate::id::{ElementId, NodeId, OverlayId, PortalKey};
use crate::preset::{AnimationPreset, TransitionPhase};
use std::collections::{BTreeMap, HashMap, HashSet};

const GENERATED_BASE: u64 = 1_000_000;

/// One transition request received from the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionCall {
    pub overlay: OverlayId,
    pub phase: TransitionPhase,
    pub preset: String,
}

/// In-memory [`Host`] with call recording.
#[derive(Debug, Clone)]
pub struct ScriptedHost {
    next_node: u64,
    roots: BTreeMap<u64, PortalKey>,
    created_roots: Vec<PortalKey>,
    removed_roots: Vec<NodeId>,
    mount_fails: bool,
    attached: HashSet<ElementId>,
    detached: HashSet<ElementId>,
    active: Option<ElementId>,
    focus_log: Vec<ElementId>,
    focusables: HashMap<OverlayId, Vec<ElementId>>,
    default_focus: Option<ElementId>,
    scroll: ScrollPosition,
    scrollbar_width: f64,
    scroll_locked: bool,
    compensation: f64,
    lock_calls: Vec<bool>,
    ack: TransitionAck,
    transitions: Vec<TransitionCall>,
    extents: HashMap<OverlayId, f64>,
}

impl Default for ScriptedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedHost {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_node: 1,
            roots: BTreeMap::new(),
            created_roots: Vec::new(),
            removed_roots: Vec::new(),
            mount_fails: false,
            attached: HashSet::new(),
            detached: HashSet::new(),
            active: None,
            focus_log: Vec::new(),
            focusables: HashMap::new(),
            default_focus: None,
            scroll: ScrollPosition::default(),
            scrollbar_width: 0.0,
            scroll_locked: false,
            compensation: 0.0,
            lock_calls: Vec::new(),
            ack: TransitionAck::Immediate,
            transitions: Vec::new(),
            extents: HashMap::new(),
        }
    }

    // --- Scripting ---

    /// Attach a page element (e.g. a trigger button).
    pub fn attach(&mut self, element: ElementId) {
        self.detached.remove(&element);
        self.attached.insert(element);
    }

    /// Remove an element from the document.
    pub fn detach(&mut self, element: ElementId) {
        self.attached.remove(&element);
        self.detached.insert(element);
    }

    /// Focus a page element directly, as a user click would.
    pub fn set_active(&mut self, element: Option<ElementId>) {
        self.active = element;
    }

    /// Make subsequent `create_root` calls fail.
    pub fn fail_mounts(&mut self, fail: bool) {
        self.mount_fails = fail;
    }

    pub fn set_focusables(&mut self, overlay: OverlayId, elements: Vec<ElementId>) {
        for element in &elements {
            self.attached.insert(*element);
        }
        self.focusables.insert(overlay, elements);
    }

    pub fn set_default_focus(&mut self, element: ElementId) {
        self.attach(element);
        self.default_focus = Some(element);
    }

    pub fn set_scroll(&mut self, position: ScrollPosition) {
        self.scroll = position;
    }

    pub fn set_scrollbar_width(&mut self, width: f64) {
        self.scrollbar_width = width;
    }

    /// How the host acknowledges transitions (default: `Immediate`).
    pub fn set_transition_ack(&mut self, ack: TransitionAck) {
        self.ack = ack;
    }

    pub fn set_extent(&mut self, overlay: OverlayId, extent: f64) {
        self.extents.insert(overlay, extent);
    }

    // --- Inspection ---

    /// Generated focusable elements for `overlay`.
    #[must_use]
    pub fn generated_focusables(overlay: OverlayId) -> Vec<ElementId> {
        (1..=3)
            .map(|k| ElementId(GENERATED_BASE + overlay.get() * 10 + k))
            .collect()
    }

    #[must_use]
    pub fn live_roots(&self) -> usize {
        self.roots.len()
    }

    #[must_use]
    pub fn created_roots(&self) -> &[PortalKey] {
        &self.created_roots
    }

    #[must_use]
    pub fn removed_roots(&self) -> &[NodeId] {
        &self.removed_roots
    }

    #[must_use]
    pub fn focus_log(&self) -> &[ElementId] {
        &self.focus_log
    }

    #[must_use]
    pub fn scroll(&self) -> ScrollPosition {
        self.scroll
    }

    #[must_use]
    pub fn is_scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    #[must_use]
    pub fn compensation(&self) -> f64 {
        self.compensation
    }

    /// Every `set_scroll_locked` call in order.
    #[must_use]
    pub fn lock_calls(&self) -> &[bool] {
        &self.lock_calls
    }

    #[must_use]
    pub fn transitions(&self) -> &[TransitionCall] {
        &self.transitions
    }

    fn is_generated(element: ElementId) -> bool {
        element.0 > GENERATED_BASE
    }
}

impl Host for ScriptedHost {
    fn create_root(&mut self, key: &PortalKey) -> Result<NodeId, HostError> {
        if self.mount_fails {
            return Err(HostError::NotReady);
        }
        let id = self.next_node;
        self.next_node += 1;
        self.roots.insert(id, key.clone());
        self.created_roots.push(key.clone());
        Ok(NodeId(id))
    }

    fn remove_root(&mut self, node: NodeId) {
        self.roots.remove(&node.0);
        self.removed_roots.push(node);
    }

    fn active_element(&self) -> Option<ElementId> {
        self.active
    }

    fn focus(&mut self, element: ElementId) {
        self.active = Some(element);
        self.focus_log.push(element);
    }

    fn is_attached(&self, element: ElementId) -> bool {
        !self.detached.contains(&element)
            && (self.attached.contains(&element) || Self::is_generated(element))
    }

    fn focusables(&self, overlay: OverlayId) -> Vec<ElementId> {
        self.focusables
            .get(&overlay)
            .cloned()
            .unwrap_or_else(|| Self::generated_focusables(overlay))
    }

    fn default_focus_target(&self) -> Option<ElementId> {
        self.default_focus
    }

    fn scroll_position(&self) -> ScrollPosition {
        self.scroll
    }

    fn scroll_to(&mut self, position: ScrollPosition) {
        self.scroll = position;
    }

    fn scrollbar_width(&self) -> f64 {
        self.scrollbar_width
    }

    fn set_scroll_locked(&mut self, locked: bool, compensation: f64) {
        self.scroll_locked = locked;
        self.compensation = if locked { compensation } else { 0.0 };
        self.lock_calls.push(locked);
    }

    fn start_transition(
        &mut self,
        overlay: OverlayId,
        phase: TransitionPhase,
        preset: &AnimationPreset,
    ) -> TransitionAck {
        self.transitions.push(TransitionCall {
            overlay,
            phase,
            preset: preset.name.clone(),
        });
        self.ack
    }

    fn extent(&self, overlay: OverlayId, _axis: Axis) -> Option<f64> {
        self.extents.get(&overlay).copied()
    }
}
