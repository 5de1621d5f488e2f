//! Central application state.
//!
//! `App` is the view-model: the post list with its markers, the verbatim
//! feed fragment it was parsed from, the filter form, and transient UI
//! state. Network callbacks never touch the presentation — they mutate
//! this state through [`AppEvent`]s, and the renderer maps it to the
//! terminal each frame.

use crate::api::{ApiClient, Flag};
use crate::feed::{parse_fragment, Markers, Post};
use crate::form::FilterForm;
use std::borrow::Cow;
use std::sync::Arc;
use tokio::time::Instant;

// ============================================================================
// Input Modes
// ============================================================================

/// Which control currently receives keystrokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    /// Normal list navigation and toggle keys.
    Browse,
    /// Editing the subreddit filter input.
    EditSubreddit { input: String },
    /// Editing the maximum-age filter input.
    EditAge { input: String },
}

// ============================================================================
// Background Task Events
// ============================================================================

/// Events from spawned network tasks back to the event loop.
pub enum AppEvent {
    /// The server confirmed a flag toggle; the optimistic state stands.
    ToggleConfirmed {
        post_id: String,
        flag: Flag,
        state: bool,
    },
    /// The server answered `success: false`; restore the pre-toggle
    /// marker snapshot.
    ToggleRejected {
        post_id: String,
        flag: Flag,
        prior: Markers,
    },
    /// Batch mark-read succeeded; the feed should now be reloaded with
    /// the current filter values.
    ReadAllComplete { count: usize },
    /// Batch mark-read failed (server rejection or transport). The chain
    /// stops here; nothing was changed optimistically.
    ReadAllFailed { error: String },
    /// A fresh feed fragment (or listing page) arrived.
    FeedLoaded { html: String },
    /// Feed reload failed; the current feed stays in place.
    FeedLoadFailed { error: String },
    /// A background task panicked.
    TaskPanicked { task: &'static str, error: String },
}

// ============================================================================
// Application State
// ============================================================================

pub struct App {
    pub api: ApiClient,

    /// Rendered posts, in feed order. Wrapped in `Arc` so spawned tasks
    /// can hold read-only clones; mutations go through `Arc::make_mut`
    /// on the event-loop thread only.
    pub posts: Arc<Vec<Post>>,

    /// The feed container's content, byte-for-byte as the server sent
    /// it. Replaced wholesale on refresh, never merged.
    pub feed_html: String,

    pub form: FilterForm,

    // UI state
    pub selected: usize,
    pub mode: InputMode,
    pub needs_redraw: bool,
    /// True while a feed reload is in flight (spinner in the header).
    pub refreshing: bool,

    /// Status message with expiry — Cow avoids allocation for static
    /// literals.
    pub status_message: Option<(Cow<'static, str>, Instant)>,
}

impl App {
    pub fn new(api: ApiClient, form: FilterForm) -> Self {
        Self {
            api,
            posts: Arc::new(Vec::new()),
            feed_html: String::new(),
            form,
            selected: 0,
            mode: InputMode::Browse,
            needs_redraw: true,
            refreshing: false,
            status_message: None,
        }
    }

    // ------------------------------------------------------------------
    // Feed replacement
    // ------------------------------------------------------------------

    /// Replaces the feed wholesale: stores `html` verbatim and reparses
    /// the post list. Every existing marker is destroyed with the old
    /// feed; the selection is clamped into the new list.
    pub fn replace_feed(&mut self, html: String) {
        let posts = parse_fragment(&html);
        tracing::info!(posts = posts.len(), bytes = html.len(), "Feed replaced");
        self.feed_html = html;
        self.posts = Arc::new(posts);
        self.clamp_selection();
        self.needs_redraw = true;
    }

    /// All rendered post identifiers, in feed order.
    pub fn post_ids(&self) -> Vec<String> {
        self.posts.iter().map(|p| p.id.clone()).collect()
    }

    // ------------------------------------------------------------------
    // Optimistic toggling
    // ------------------------------------------------------------------

    /// Applies the optimistic flip for `flag` on `post_id`.
    ///
    /// Returns the pre-toggle marker snapshot (for compensation) and the
    /// new optimistic state, or `None` if the post is gone (e.g. the feed
    /// was replaced under a queued key event).
    ///
    /// All `Arc::make_mut` calls on `self.posts` must happen on the event
    /// loop thread; spawned tasks only read clones.
    pub fn toggle_marker(&mut self, post_id: &str, flag: Flag) -> Option<(Markers, bool)> {
        let posts = Arc::make_mut(&mut self.posts);
        let post = posts.iter_mut().find(|p| p.id == post_id)?;
        let prior = post.markers;
        let state = post.markers.toggle(flag);
        self.needs_redraw = true;
        Some((prior, state))
    }

    /// Settles a confirmed toggle: pins the flag to the server-confirmed
    /// state. Normally a no-op (the optimistic state already matches),
    /// but with rapid re-toggling the last-arriving response wins.
    pub fn confirm_marker(&mut self, post_id: &str, flag: Flag, state: bool) {
        let posts = Arc::make_mut(&mut self.posts);
        if let Some(post) = posts.iter_mut().find(|p| p.id == post_id) {
            match flag {
                Flag::Read => {
                    post.markers.read = state;
                    post.markers.not_read = !state;
                }
                Flag::Saved => post.markers.saved = state,
                Flag::Loved => post.markers.loved = state,
            }
            self.needs_redraw = true;
        }
    }

    /// Compensates a rejected toggle: restores the full pre-toggle
    /// snapshot. Restoring all four markers keeps `not-read` from
    /// drifting away from `read` on a failed read toggle.
    pub fn rollback_markers(&mut self, post_id: &str, prior: Markers) {
        let posts = Arc::make_mut(&mut self.posts);
        if let Some(post) = posts.iter_mut().find(|p| p.id == post_id) {
            post.markers = prior;
            self.needs_redraw = true;
        }
    }

    // ------------------------------------------------------------------
    // Selection and navigation
    // ------------------------------------------------------------------

    pub fn selected_post(&self) -> Option<&Post> {
        self.posts.get(self.selected)
    }

    pub fn nav_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
        self.needs_redraw = true;
    }

    pub fn nav_down(&mut self) {
        if !self.posts.is_empty() {
            let max_index = self.posts.len().saturating_sub(1);
            self.selected = self.selected.saturating_add(1).min(max_index);
        }
        self.needs_redraw = true;
    }

    /// Clamps the selection after any operation that shrank the list.
    pub fn clamp_selection(&mut self) {
        self.selected = if self.posts.is_empty() {
            0
        } else {
            self.selected.min(self.posts.len().saturating_sub(1))
        };
    }

    // ------------------------------------------------------------------
    // Status line
    // ------------------------------------------------------------------

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
        self.needs_redraw = true;
    }

    /// Clear status message if expired (older than 3 seconds).
    /// Returns true if a message was actually cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= 3 {
                self.status_message = None;
                self.needs_redraw = true;
                return true;
            }
        }
        false
    }
}
