//! Wire types for the reader server's JSON API.
//!
//! Every mutating endpoint answers with a `success` boolean; `/feedmore`
//! additionally carries the rendered feed fragment. Unknown fields are
//! ignored so the client stays compatible with server-side additions.

use serde::{Deserialize, Serialize};

/// Response from the toggle endpoints (`/readit`, `/saveit`, `/loveit`)
/// and from `/readall`.
///
/// `success: false` means the server rejected the mutation (e.g. unknown
/// post id) and the caller must compensate. A missing field is treated as
/// failure rather than silently confirming an optimistic update.
#[derive(Debug, Clone, Deserialize)]
pub struct ToggleResponse {
    #[serde(default)]
    pub success: bool,
}

/// Response from `/feedmore`: a server-rendered feed fragment.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedMoreResponse {
    #[serde(default)]
    pub success: bool,
    /// Rendered markup for the feed container. Replaced wholesale on the
    /// client; never diffed.
    pub html: Option<String>,
}

/// Request body for `/readall`.
///
/// `posts` preserves rendered feed order; the server marks every listed
/// submission as read in one statement.
#[derive(Debug, Clone, Serialize)]
pub struct ReadAllRequest {
    pub posts: Vec<String>,
}

/// Request body for `/feedmore`.
///
/// Both values are passed through from the filter form verbatim; the
/// server owns parsing and validation of the age expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedQuery {
    pub subreddit: String,
    pub max_age: String,
}
