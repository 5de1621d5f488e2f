//! # lurk
//!
//! Terminal client for a self-hosted reddit reader service.
//!
//! The server stores submissions with three independent status flags
//! (read, saved, loved) and renders the feed listing as markup. This
//! client browses that feed in a TUI and talks back over a small JSON
//! API:
//!
//! - Flag toggles are **optimistic**: the marker flips on the keypress,
//!   and is rolled back only if the server explicitly answers
//!   `success: false`. Transport failures leave the optimistic state in
//!   place.
//! - "Mark all read" is one batch request over the rendered post ids;
//!   on success the feed is reloaded with the current filter values.
//! - Feed reloads replace the rendered fragment wholesale — the server
//!   is the source of truth, and nothing is diffed client-side.

pub mod api;
pub mod app;
pub mod config;
pub mod feed;
pub mod form;
pub mod ui;
pub mod util;
