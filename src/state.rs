//! Per-hypothesis scoring context.
//!
//! Beam search spawns and discards thousands of hypotheses per sentence, so
//! their LM contexts are not individually owned allocations. A
//! [`StateArena`] owned by the search session stores every window in one
//! flat token pool; hypotheses keep a [`StateId`] handle. States are never
//! edited after allocation, so sibling hypotheses may share their parent's
//! handle freely. The whole arena is cleared with [`StateArena::reset`] once
//! the sentence is finished.

use crate::trie::NodeId;
use crate::vocab::TokenId;

/// Pushes `token` at the front of `window`, keeping at most `capacity`
/// entries. The oldest entry falls off the back once the window is full.
pub fn shift_or_push(window: &mut Vec<TokenId>, capacity: usize, token: TokenId) {
    if capacity == 0 {
        window.clear();
        return;
    }
    if window.len() < capacity {
        window.push(token);
    }
    window.truncate(capacity);

    for i in (1..window.len()).rev() {
        window[i] = window[i - 1];
    }
    window[0] = token;
}

/// Handle to a context state inside a [`StateArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(u32);

#[derive(Debug, Clone, Copy)]
struct ContextState {
    start: u32,
    len: u32,
    last_match: Option<NodeId>,
}

/// Session-scoped storage for context states.
#[derive(Debug, Default)]
pub struct StateArena {
    tokens: Vec<TokenId>,
    states: Vec<ContextState>,
}

impl StateArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(states: usize, order: usize) -> Self {
        Self {
            tokens: Vec::with_capacity(states * order.saturating_sub(1)),
            states: Vec::with_capacity(states),
        }
    }

    /// Stores a copy of `window` (most recent token first).
    pub fn alloc(&mut self, window: &[TokenId], last_match: Option<NodeId>) -> StateId {
        let start = self.tokens.len() as u32;
        self.tokens.extend_from_slice(window);
        self.states.push(ContextState {
            start,
            len: window.len() as u32,
            last_match,
        });
        StateId((self.states.len() - 1) as u32)
    }

    /// Context words of a state, most recent first.
    ///
    /// # Panics
    /// Panics if `id` was issued before the last [`reset`](Self::reset).
    pub fn window(&self, id: StateId) -> &[TokenId] {
        let state = &self.states[id.0 as usize];
        let start = state.start as usize;
        &self.tokens[start..start + state.len as usize]
    }

    /// Trie node where the last scoring step of this state ended.
    pub fn last_match(&self, id: StateId) -> Option<NodeId> {
        self.states[id.0 as usize].last_match
    }

    /// Whether two states score every continuation identically, which is
    /// the condition for recombining their hypotheses.
    pub fn same_context(&self, a: StateId, b: StateId) -> bool {
        self.window(a) == self.window(b)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Drops every state. Outstanding handles become invalid.
    pub fn reset(&mut self) {
        self.tokens.clear();
        self.states.clear();
    }
}
