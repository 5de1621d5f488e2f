//! Filter form model.
//!
//! Mirrors the listing page's filter controls: a subreddit input, a
//! maximum-age input, and two checkbox/hidden-field pairs ("show unread"
//! and "ignore"). The hidden fields carry the parameter's explicit `0`
//! value; the server treats an absent parameter as its permissive default.
//!
//! The submission guard implements "include this hidden default only when
//! its override is not selected": right before the parameters are
//! collected, a checked checkbox disables its paired hidden field, which
//! removes the parameter from the submitted data entirely.

use crate::api::FeedQuery;

/// A hidden input paired with a checkbox override.
///
/// `disabled` mirrors the DOM `disabled` property: a disabled field is
/// excluded from submission; an enabled one submits its default value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiddenDefault {
    name: &'static str,
    value: &'static str,
    disabled: bool,
}

impl HiddenDefault {
    fn new(name: &'static str, value: &'static str) -> Self {
        Self {
            name,
            value,
            disabled: false,
        }
    }
}

/// View-model for the feed filter form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterForm {
    /// Subreddit name; empty targets the front listing.
    pub subreddit: String,
    /// Maximum post age, passed through to the server verbatim.
    pub max_age: String,
    /// "Show unread" checkbox state.
    pub show_unread: bool,
    /// "Ignore filtered subreddits" checkbox state.
    pub ignore_filtered: bool,
    unread_hidden: HiddenDefault,
    ignore_hidden: HiddenDefault,
}

impl Default for FilterForm {
    fn default() -> Self {
        Self {
            subreddit: String::new(),
            max_age: String::new(),
            show_unread: false,
            ignore_filtered: false,
            unread_hidden: HiddenDefault::new("unread", "0"),
            ignore_hidden: HiddenDefault::new("ignore", "0"),
        }
    }
}

impl FilterForm {
    pub fn new(subreddit: String, max_age: String) -> Self {
        Self {
            subreddit,
            max_age,
            ..Self::default()
        }
    }

    /// Applies the pre-submission guard: each checked checkbox disables
    /// its paired hidden field.
    pub fn apply_guard(&mut self) {
        self.unread_hidden.disabled = self.show_unread;
        self.ignore_hidden.disabled = self.ignore_filtered;
    }

    /// Collects the submitted parameter list, in form order, with the
    /// guard applied.
    ///
    /// Empty text inputs are omitted (the browser submits them, but the
    /// server treats empty and absent identically; omitting keeps request
    /// logs readable). Disabled hidden fields are absent; enabled ones
    /// submit their default value.
    pub fn submit_params(&mut self) -> Vec<(String, String)> {
        self.apply_guard();

        let mut params = Vec::new();
        if !self.max_age.is_empty() {
            params.push(("days".to_string(), self.max_age.clone()));
        }
        for hidden in [&self.unread_hidden, &self.ignore_hidden] {
            if !hidden.disabled {
                params.push((hidden.name.to_string(), hidden.value.to_string()));
            }
        }
        params
    }

    /// The `/feedmore` request body: subreddit and max-age, verbatim.
    pub fn feed_params(&self) -> FeedQuery {
        FeedQuery {
            subreddit: self.subreddit.clone(),
            max_age: self.max_age.clone(),
        }
    }
}
