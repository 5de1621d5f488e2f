//! View rendering: maps the view-model to the terminal frame.
//!
//! Layout is a fixed three-band stack: the filter bar, the post list,
//! and the status line. Rendering is pure — it reads `App` and draws;
//! all mutation happens in the input and event handlers.

use crate::app::{App, InputMode};
use crate::feed::Post;
use crate::util::truncate_to_width;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

pub(super) fn render(f: &mut Frame, app: &App) {
    let bands = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // filter bar
            Constraint::Min(1),    // post list
            Constraint::Length(1), // status line
        ])
        .split(f.area());

    render_filter_bar(f, app, bands[0]);
    render_posts(f, app, bands[1]);
    render_status(f, app, bands[2]);
}

fn checkbox(checked: bool) -> &'static str {
    if checked {
        "[x]"
    } else {
        "[ ]"
    }
}

fn render_filter_bar(f: &mut Frame, app: &App, area: Rect) {
    let accent = Style::default().fg(Color::Cyan);

    let (subreddit, age) = match &app.mode {
        InputMode::EditSubreddit { input } => (format!("{}_", input), app.form.max_age.clone()),
        InputMode::EditAge { input } => (app.form.subreddit.clone(), format!("{}_", input)),
        InputMode::Browse => (app.form.subreddit.clone(), app.form.max_age.clone()),
    };
    let subreddit = if subreddit.is_empty() {
        "all".to_string()
    } else {
        subreddit
    };
    let age = if age.is_empty() {
        "any".to_string()
    } else {
        age
    };

    let mut spans = vec![
        Span::raw(" r/"),
        Span::styled(subreddit, accent),
        Span::raw("  age: "),
        Span::styled(age, accent),
        Span::raw("  "),
        Span::raw(checkbox(app.form.show_unread)),
        Span::raw(" unread  "),
        Span::raw(checkbox(app.form.ignore_filtered)),
        Span::raw(" ignore"),
    ];
    if app.refreshing {
        spans.push(Span::styled(
            "  loading...",
            Style::default().fg(Color::Yellow),
        ));
    }

    let title = match app.mode {
        InputMode::EditSubreddit { .. } => " filters (editing subreddit) ",
        InputMode::EditAge { .. } => " filters (editing age) ",
        InputMode::Browse => " lurk ",
    };

    let bar = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(bar, area);
}

fn render_posts(f: &mut Frame, app: &App, area: Rect) {
    if app.posts.is_empty() {
        let empty = Paragraph::new("No posts. R to reload, / to pick a subreddit.")
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(empty, area);
        return;
    }

    let width = area.width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = app
        .posts
        .iter()
        .map(|post| ListItem::new(post_line(post, width)))
        .collect();

    let list = List::new(items)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(app.selected));
    f.render_stateful_widget(list, area, &mut state);
}

/// One list row: marker badges, score, title, subreddit, comment count.
fn post_line(post: &Post, width: usize) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();

    // Marker badges. `not-read` gets the bullet; `read` dims the title.
    spans.push(if post.markers.not_read {
        Span::styled("● ", Style::default().fg(Color::Blue))
    } else {
        Span::raw("  ")
    });
    spans.push(if post.markers.saved {
        Span::styled("★ ", Style::default().fg(Color::Yellow))
    } else {
        Span::raw("  ")
    });
    spans.push(if post.markers.loved {
        Span::styled("♥ ", Style::default().fg(Color::Red))
    } else {
        Span::raw("  ")
    });

    if let Some(score) = post.score {
        spans.push(Span::styled(
            format!("{:>5} ", score),
            Style::default().fg(Color::Green),
        ));
    }

    let title_style = if post.markers.read {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };
    let used: usize = spans.iter().map(|s| s.content.len()).sum();
    let title_width = width.saturating_sub(used + 24);
    spans.push(Span::styled(
        truncate_to_width(&post.title, title_width).into_owned(),
        title_style,
    ));

    if let Some(sr) = &post.subreddit {
        spans.push(Span::styled(
            format!("  r/{}", sr),
            Style::default().fg(Color::Magenta),
        ));
    }
    if let Some(n) = post.num_comments {
        spans.push(Span::styled(
            format!("  {}c", n),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if let Some(created) = post.created {
        spans.push(Span::styled(
            format!("  {}", format_age(created)),
            Style::default().fg(Color::DarkGray),
        ));
    }

    Line::from(spans)
}

/// Compact relative age from a unix timestamp: "5m", "3h", "2d".
fn format_age(created: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let secs = now.saturating_sub(created).max(0);
    match secs {
        s if s < 3600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h", s / 3600),
        s => format!("{}d", s / 86_400),
    }
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let line = match &app.status_message {
        Some((msg, _)) => Line::from(Span::styled(
            msg.to_string(),
            Style::default().fg(Color::Yellow),
        )),
        None => Line::from(Span::styled(
            " r read  s save  l love  o open  O open all  A read all  R reload  f filters  q quit",
            Style::default().fg(Color::DarkGray),
        )),
    };
    f.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkbox_renders_both_states() {
        assert_eq!(checkbox(true), "[x]");
        assert_eq!(checkbox(false), "[ ]");
    }

    #[test]
    fn format_age_buckets() {
        let now = chrono::Utc::now().timestamp();
        assert_eq!(format_age(now - 120), "2m");
        assert_eq!(format_age(now - 7200), "2h");
        assert_eq!(format_age(now - 172_800), "2d");
    }

    #[test]
    fn format_age_clamps_future_timestamps() {
        let now = chrono::Utc::now().timestamp();
        assert_eq!(format_age(now + 600), "0m");
    }
}
