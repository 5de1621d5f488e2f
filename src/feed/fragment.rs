//! Lenient scanner for server-rendered feed fragments.
//!
//! The fragment is template output, not guaranteed well-formed XML, so the
//! scanner is configured to tolerate mismatched and unmatched end tags and
//! simply stops at the first unrecoverable error, keeping every post fully
//! parsed before that point. It never fails: the worst malformed input
//! yields an empty post list.
//!
//! # Fragment contract
//!
//! - A post is an element carrying class `post`, with its identifier in
//!   `data-id` and optional `data-score`, `data-comments`,
//!   `data-subreddit`, `data-created` attributes.
//! - Status markers are the classes `read-it`, `not-read`, `saved`,
//!   `loved`, on the post element itself or on any descendant (the
//!   template attaches them to the toggle buttons).
//! - The outbound link is an anchor with class `reddit-link`; its `href`
//!   is the URL, its text the title. An anchor with class `comments-link`
//!   carries the discussion URL.
//!
//! Posts missing an identifier or an outbound link are skipped with a
//! debug log; document order is preserved.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{Markers, Post};

/// Marker classes recognized on post elements and their descendants.
const CLASS_READ: &str = "read-it";
const CLASS_NOT_READ: &str = "not-read";
const CLASS_SAVED: &str = "saved";
const CLASS_LOVED: &str = "loved";

/// Accumulator for the post element currently being scanned.
#[derive(Default)]
struct PartialPost {
    id: String,
    title: String,
    url: Option<String>,
    comments_link: Option<String>,
    subreddit: Option<String>,
    score: Option<i64>,
    num_comments: Option<i64>,
    created: Option<i64>,
    markers: Markers,
    /// Nesting depth below the post element, for matching its end tag.
    depth: usize,
    /// True while inside the `reddit-link` anchor (title text capture).
    in_title: bool,
    /// Depth at which the title anchor opened.
    title_depth: usize,
}

impl PartialPost {
    fn finish(self) -> Option<Post> {
        if self.id.is_empty() {
            tracing::debug!("Skipping post element without data-id");
            return None;
        }
        let Some(url) = self.url else {
            tracing::debug!(post_id = %self.id, "Skipping post without reddit-link");
            return None;
        };
        Some(Post {
            id: self.id,
            title: self.title.trim().to_string(),
            url,
            comments_link: self.comments_link,
            subreddit: self.subreddit,
            score: self.score,
            num_comments: self.num_comments,
            created: self.created,
            markers: self.markers,
        })
    }
}

/// Parses a feed fragment into posts, in document order.
pub fn parse_fragment(html: &str) -> Vec<Post> {
    let mut reader = Reader::from_str(html);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut posts = Vec::new();
    let mut current: Option<PartialPost> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                handle_element(&e, &mut current, &mut posts, false);
            }
            Ok(Event::Empty(e)) => {
                handle_element(&e, &mut current, &mut posts, true);
            }
            Ok(Event::Text(t)) => {
                if let Some(post) = current.as_mut() {
                    if post.in_title {
                        let text = match t.unescape() {
                            Ok(s) => s.into_owned(),
                            // Unknown entities (&nbsp; and friends) are
                            // common in template output; keep the raw text.
                            Err(_) => String::from_utf8_lossy(&t).into_owned(),
                        };
                        post.title.push_str(&text);
                    }
                }
            }
            Ok(Event::End(_)) => {
                let post_closed = matches!(current.as_ref(), Some(p) if p.depth == 0);
                if post_closed {
                    // The post element itself closed.
                    if let Some(done) = current.take().and_then(PartialPost::finish) {
                        posts.push(done);
                    }
                } else if let Some(post) = current.as_mut() {
                    if post.in_title && post.depth == post.title_depth {
                        post.in_title = false;
                    }
                    post.depth -= 1;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {} // comments, CDATA, doctype, processing instructions
            Err(e) => {
                tracing::debug!(error = %e, position = reader.buffer_position(), "Stopping fragment scan on parse error");
                break;
            }
        }
    }

    // An unclosed trailing post still counts if it got far enough.
    if let Some(done) = current.take().and_then(PartialPost::finish) {
        posts.push(done);
    }

    posts
}

/// Processes one opening (or self-closing) element.
fn handle_element(
    e: &BytesStart<'_>,
    current: &mut Option<PartialPost>,
    posts: &mut Vec<Post>,
    self_closing: bool,
) {
    let classes = attr(e, b"class").unwrap_or_default();

    if has_class(&classes, "post") {
        // Malformed nesting: a new post opening inside an unclosed one is
        // treated as a sibling.
        if let Some(done) = current.take().and_then(PartialPost::finish) {
            posts.push(done);
        }

        let mut post = PartialPost {
            id: attr(e, b"data-id").unwrap_or_default(),
            subreddit: attr(e, b"data-subreddit"),
            score: attr_i64(e, b"data-score"),
            num_comments: attr_i64(e, b"data-comments"),
            created: attr_i64(e, b"data-created"),
            ..PartialPost::default()
        };
        apply_marker_classes(&mut post.markers, &classes);

        if self_closing {
            // No children means no link; finish() drops it with a log.
            if let Some(done) = post.finish() {
                posts.push(done);
            }
        } else {
            *current = Some(post);
        }
        return;
    }

    let Some(post) = current.as_mut() else {
        return;
    };

    apply_marker_classes(&mut post.markers, &classes);

    if has_class(&classes, "reddit-link") {
        if post.url.is_none() {
            post.url = attr(e, b"href");
        }
        if !self_closing {
            post.in_title = true;
            post.title_depth = post.depth + 1;
        }
    } else if has_class(&classes, "comments-link") && post.comments_link.is_none() {
        post.comments_link = attr(e, b"href");
    }

    if !self_closing {
        post.depth += 1;
    }
}

/// Reads one attribute as a string, unescaping entities where possible.
fn attr(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    let attr = e.try_get_attribute(name).ok().flatten()?;
    match attr.unescape_value() {
        Ok(v) => Some(v.into_owned()),
        Err(_) => Some(String::from_utf8_lossy(&attr.value).into_owned()),
    }
}

fn attr_i64(e: &BytesStart<'_>, name: &[u8]) -> Option<i64> {
    attr(e, name).and_then(|v| v.trim().parse().ok())
}

/// Whitespace-separated class list membership test.
fn has_class(classes: &str, name: &str) -> bool {
    classes.split_whitespace().any(|c| c == name)
}

fn apply_marker_classes(markers: &mut Markers, classes: &str) {
    if has_class(classes, CLASS_READ) {
        markers.read = true;
    }
    if has_class(classes, CLASS_NOT_READ) {
        markers.not_read = true;
    }
    if has_class(classes, CLASS_SAVED) {
        markers.saved = true;
    }
    if has_class(classes, CLASS_LOVED) {
        markers.loved = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const SAMPLE: &str = r#"
        <div id="feed">
          <div class="post not-read" data-id="t3_a" data-score="1200" data-comments="45" data-subreddit="rust" data-created="1700000000">
            <a class="reddit-link" href="https://example.com/one">First post</a>
            <a class="comments-link" href="https://reddit.example/r/rust/comments/a">45 comments</a>
            <span class="toggle saved"></span>
          </div>
          <div class="post read-it" data-id="t3_b" data-subreddit="pics">
            <a class="reddit-link" href="https://example.com/two">Second &amp; final</a>
            <span class="toggle loved"></span>
          </div>
        </div>
    "#;

    #[test]
    fn parses_posts_in_document_order() {
        let posts = parse_fragment(SAMPLE);
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, "t3_a");
        assert_eq!(posts[1].id, "t3_b");
    }

    #[test]
    fn reads_post_fields() {
        let posts = parse_fragment(SAMPLE);
        let first = &posts[0];
        assert_eq!(first.title, "First post");
        assert_eq!(first.url, "https://example.com/one");
        assert_eq!(
            first.comments_link.as_deref(),
            Some("https://reddit.example/r/rust/comments/a")
        );
        assert_eq!(first.subreddit.as_deref(), Some("rust"));
        assert_eq!(first.score, Some(1200));
        assert_eq!(first.num_comments, Some(45));
        assert_eq!(first.created, Some(1_700_000_000));
    }

    #[test]
    fn unescapes_entities_in_titles() {
        let posts = parse_fragment(SAMPLE);
        assert_eq!(posts[1].title, "Second & final");
    }

    #[test]
    fn reads_markers_from_post_and_descendants() {
        let posts = parse_fragment(SAMPLE);
        assert!(!posts[0].markers.read);
        assert!(posts[0].markers.not_read);
        assert!(posts[0].markers.saved);
        assert!(!posts[0].markers.loved);

        assert!(posts[1].markers.read);
        assert!(!posts[1].markers.not_read);
        assert!(posts[1].markers.loved);
    }

    #[test]
    fn skips_post_without_id() {
        let html = r#"
            <div class="post"><a class="reddit-link" href="https://x.example/">No id</a></div>
            <div class="post" data-id="t3_ok"><a class="reddit-link" href="https://x.example/ok">Ok</a></div>
        "#;
        let posts = parse_fragment(html);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "t3_ok");
    }

    #[test]
    fn skips_post_without_link() {
        let html = r#"<div class="post" data-id="t3_x"><span>no anchor</span></div>"#;
        assert!(parse_fragment(html).is_empty());
    }

    #[test]
    fn keeps_posts_parsed_before_malformed_tail() {
        let html = r#"
            <div class="post" data-id="t3_a"><a class="reddit-link" href="https://x.example/a">A</a></div>
            <div <<<<
        "#;
        let posts = parse_fragment(html);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "t3_a");
    }

    #[test]
    fn unclosed_trailing_post_is_kept() {
        let html =
            r#"<div class="post" data-id="t3_a"><a class="reddit-link" href="https://x.example/a">A</a>"#;
        let posts = parse_fragment(html);
        assert_eq!(posts.len(), 1);
    }

    #[test]
    fn nested_markup_in_title_anchor() {
        let html = r#"
            <div class="post" data-id="t3_a">
              <a class="reddit-link" href="https://x.example/a">Hello <em>world</em>!</a>
            </div>
        "#;
        let posts = parse_fragment(html);
        assert_eq!(posts[0].title, "Hello world!");
    }

    #[test]
    fn non_numeric_data_attributes_become_none() {
        let html = r#"
            <div class="post" data-id="t3_a" data-score="a lot">
              <a class="reddit-link" href="https://x.example/a">A</a>
            </div>
        "#;
        let posts = parse_fragment(html);
        assert_eq!(posts[0].score, None);
    }

    #[test]
    fn empty_fragment_yields_no_posts() {
        assert!(parse_fragment("").is_empty());
        assert!(parse_fragment("   \n  ").is_empty());
    }

    proptest! {
        #[test]
        fn never_panics_on_arbitrary_input(s in any::<String>()) {
            let _ = parse_fragment(&s);
        }
    }
}
