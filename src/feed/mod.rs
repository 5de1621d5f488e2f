//! Feed model: posts, status markers, and fragment parsing.
//!
//! The server is the source of truth for the feed. The client receives a
//! server-rendered markup fragment, stores it verbatim, and parses it into
//! [`Post`] view-models for display. A refresh replaces the whole feed;
//! nothing is diffed or merged.
//!
//! # Module Structure
//!
//! - [`fragment`] - Lenient markup scanning of the rendered feed fragment

pub mod fragment;

pub use fragment::parse_fragment;

use crate::api::Flag;

/// Per-post visual status markers.
///
/// All four are independent booleans parsed from marker classes in the
/// fragment. `read` and `not_read` are distinct markers (the template
/// styles and filters them separately); toggling `read` keeps `not_read`
/// at its logical opposite, but a fragment is free to disagree and the
/// parser preserves what the server rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Markers {
    pub read: bool,
    pub not_read: bool,
    pub saved: bool,
    pub loved: bool,
}

impl Markers {
    /// Flips the marker for `flag` to its logical negation and returns the
    /// new state.
    ///
    /// Toggling [`Flag::Read`] also sets `not_read` to the opposite of the
    /// new `read` state, in the same synchronous step.
    pub fn toggle(&mut self, flag: Flag) -> bool {
        match flag {
            Flag::Read => {
                self.read = !self.read;
                self.not_read = !self.read;
                self.read
            }
            Flag::Saved => {
                self.saved = !self.saved;
                self.saved
            }
            Flag::Loved => {
                self.loved = !self.loved;
                self.loved
            }
        }
    }

    /// Current state of one flag.
    pub fn get(&self, flag: Flag) -> bool {
        match flag {
            Flag::Read => self.read,
            Flag::Saved => self.saved,
            Flag::Loved => self.loved,
        }
    }
}

/// A displayed submission, parsed from one `.post` element.
///
/// Field set follows the server's submission record: identifier, title,
/// outbound link, comments link, counts, subreddit, creation time, and the
/// three status flags (plus the `not-read` styling marker).
#[derive(Debug, Clone)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub url: String,
    pub comments_link: Option<String>,
    pub subreddit: Option<String>,
    pub score: Option<i64>,
    pub num_comments: Option<i64>,
    /// Creation time as a unix timestamp (`data-created`).
    pub created: Option<i64>,
    pub markers: Markers,
}
