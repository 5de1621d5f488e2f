//! Keyboard input handling.
//!
//! Browse mode drives the list and the toggle/refresh actions; the two
//! edit modes capture text for the filter inputs. Toggle keys apply the
//! optimistic flip synchronously and spawn the network request; the
//! settle/rollback half lives in `events.rs`.

use crate::api::Flag;
use crate::app::{App, AppEvent, InputMode};
use crate::util::validate_url_for_open;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::helpers::{catch_task_panic, spawn_feed_reload, spawn_form_submit};
use super::loop_runner::Action;

pub(super) async fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    // Ctrl+C quits from any mode.
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(Action::Quit);
    }

    match app.mode {
        InputMode::Browse => handle_browse_input(app, code, event_tx),
        InputMode::EditSubreddit { .. } | InputMode::EditAge { .. } => {
            handle_edit_input(app, code, event_tx);
            Ok(Action::Continue)
        }
    }
}

fn handle_browse_input(
    app: &mut App,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => return Ok(Action::Quit),

        KeyCode::Char('j') | KeyCode::Down => app.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.nav_up(),

        // Flag toggles on the selected post
        KeyCode::Char('r') => handle_flag_toggle(app, Flag::Read, event_tx),
        KeyCode::Char('s') => handle_flag_toggle(app, Flag::Saved, event_tx),
        KeyCode::Char('l') => handle_flag_toggle(app, Flag::Loved, event_tx),

        // Links
        KeyCode::Char('o') | KeyCode::Enter => handle_open_selected(app),
        KeyCode::Char('c') => handle_open_comments(app),
        KeyCode::Char('O') => handle_open_all(app),

        // Feed refresh
        KeyCode::Char('A') => handle_read_all(app, event_tx),
        KeyCode::Char('R') => spawn_feed_reload(app, event_tx),
        KeyCode::Char('f') => spawn_form_submit(app, event_tx),

        // Filter form controls
        KeyCode::Char('u') => {
            app.form.show_unread = !app.form.show_unread;
            app.needs_redraw = true;
        }
        KeyCode::Char('i') => {
            app.form.ignore_filtered = !app.form.ignore_filtered;
            app.needs_redraw = true;
        }
        KeyCode::Char('/') => {
            app.mode = InputMode::EditSubreddit {
                input: app.form.subreddit.clone(),
            };
            app.needs_redraw = true;
        }
        KeyCode::Char('d') => {
            app.mode = InputMode::EditAge {
                input: app.form.max_age.clone(),
            };
            app.needs_redraw = true;
        }

        _ => {}
    }
    Ok(Action::Continue)
}

/// Text entry for the subreddit/age filter inputs. Enter commits the
/// value and submits the form; Esc abandons the edit.
fn handle_edit_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    let input = match &mut app.mode {
        InputMode::EditSubreddit { input } | InputMode::EditAge { input } => input,
        InputMode::Browse => return,
    };

    match code {
        KeyCode::Char(c) => {
            input.push(c);
        }
        KeyCode::Backspace => {
            input.pop();
        }
        KeyCode::Enter => {
            let value = input.clone();
            match app.mode {
                InputMode::EditSubreddit { .. } => app.form.subreddit = value,
                InputMode::EditAge { .. } => app.form.max_age = value,
                InputMode::Browse => unreachable!(),
            }
            app.mode = InputMode::Browse;
            spawn_form_submit(app, event_tx);
        }
        KeyCode::Esc => {
            app.mode = InputMode::Browse;
        }
        _ => {}
    }
    app.needs_redraw = true;
}

/// Optimistic flag toggle on the selected post.
///
/// The marker flips before the request leaves; the response decides
/// whether it stays. A transport failure deliberately leaves the
/// optimistic state in place — only an explicit `success: false` rolls
/// back, via `ToggleRejected`.
fn handle_flag_toggle(app: &mut App, flag: Flag, event_tx: &mpsc::Sender<AppEvent>) {
    let Some(post) = app.selected_post() else {
        return;
    };
    let post_id = post.id.clone();

    let Some((prior, state)) = app.toggle_marker(&post_id, flag) else {
        return;
    };

    let api = app.api.clone();
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let tx_panic = tx.clone();
        match catch_task_panic(async {
            match api.toggle(flag, &post_id).await {
                Ok(true) => {
                    if let Err(e) = tx
                        .send(AppEvent::ToggleConfirmed {
                            post_id,
                            flag,
                            state,
                        })
                        .await
                    {
                        tracing::warn!(error = %e, event = "ToggleConfirmed", "Channel send failed (receiver dropped)");
                    }
                }
                Ok(false) => {
                    if let Err(e) = tx
                        .send(AppEvent::ToggleRejected {
                            post_id,
                            flag,
                            prior,
                        })
                        .await
                    {
                        tracing::warn!(error = %e, event = "ToggleRejected", "Channel send failed (receiver dropped)");
                    }
                }
                Err(e) => {
                    // Transport failure: no rollback, the optimistic
                    // marker stays until the next feed replacement.
                    tracing::warn!(
                        error = %e,
                        post_id = %post_id,
                        flag = flag.name(),
                        "Toggle request failed in transit, leaving optimistic marker"
                    );
                }
            }
        })
        .await
        {
            Ok(()) => {}
            Err(panic_msg) => {
                tracing::error!(task = "flag_toggle", error = %panic_msg, "Background task panicked");
                let _ = tx_panic
                    .send(AppEvent::TaskPanicked {
                        task: "flag_toggle",
                        error: panic_msg,
                    })
                    .await;
            }
        }
    });
}

/// Batch mark-read over every rendered post, in feed order.
///
/// No optimistic mutation here: the posts stay as they are until the
/// confirmed batch chains into a feed reload.
fn handle_read_all(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let ids = app.post_ids();
    if ids.is_empty() {
        app.set_status("Feed is empty");
        return;
    }
    let count = ids.len();
    app.set_status(format!("Marking {} posts read...", count));

    let api = app.api.clone();
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let tx_panic = tx.clone();
        match catch_task_panic(async {
            let event = match api.read_all(ids).await {
                Ok(true) => AppEvent::ReadAllComplete { count },
                Ok(false) => AppEvent::ReadAllFailed {
                    error: "server refused batch mark-read".to_string(),
                },
                Err(e) => AppEvent::ReadAllFailed {
                    error: e.to_string(),
                },
            };
            if let Err(e) = tx.send(event).await {
                tracing::warn!(error = %e, "Channel send failed (receiver dropped)");
            }
        })
        .await
        {
            Ok(()) => {}
            Err(panic_msg) => {
                tracing::error!(task = "read_all", error = %panic_msg, "Background task panicked");
                let _ = tx_panic
                    .send(AppEvent::TaskPanicked {
                        task: "read_all",
                        error: panic_msg,
                    })
                    .await;
            }
        }
    });
}

fn handle_open_selected(app: &mut App) {
    let Some(post) = app.selected_post() else {
        return;
    };
    let url = post.url.clone();
    open_link(app, &url);
}

fn handle_open_comments(app: &mut App) {
    let Some(post) = app.selected_post() else {
        return;
    };
    match post.comments_link.clone() {
        Some(url) => open_link(app, &url),
        None => app.set_status("Post has no comments link"),
    }
}

/// Opens every rendered post link in the browser. Per-link failures are
/// logged and skipped; there is no failure path for the action itself.
fn handle_open_all(app: &mut App) {
    let mut opened = 0usize;
    for post in app.posts.iter() {
        // Validate before open::that() — the fragment is server-rendered,
        // but a link with a stray scheme must not reach the shell.
        if let Err(e) = validate_url_for_open(&post.url) {
            tracing::warn!(post_id = %post.id, error = %e, "Skipping unopenable link");
            continue;
        }
        match open::that_detached(&post.url) {
            Ok(()) => opened += 1,
            Err(e) => tracing::warn!(post_id = %post.id, error = %e, "Failed to open link"),
        }
    }
    app.set_status(format!("Opened {} of {} links", opened, app.posts.len()));
}

fn open_link(app: &mut App, url: &str) {
    if let Err(e) = validate_url_for_open(url) {
        app.set_status(format!("Refusing to open link: {}", e));
        return;
    }
    if let Err(e) = open::that(url) {
        app.set_status(format!("Failed to open link: {}", e));
    } else {
        app.set_status("Opened in browser");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::form::FilterForm;

    fn test_app() -> App {
        let api = ApiClient::new(reqwest::Client::new(), "http://127.0.0.1:9").unwrap();
        let mut app = App::new(api, FilterForm::default());
        app.replace_feed(
            r#"<div class="post not-read" data-id="t3_a">
                 <a class="reddit-link" href="https://x.example/a">A</a>
               </div>"#
                .to_string(),
        );
        app
    }

    #[tokio::test]
    async fn toggle_key_applies_marker_before_response() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(4);

        handle_browse_input(&mut app, KeyCode::Char('r'), &tx).unwrap();

        // Applied synchronously; the spawned request has not settled.
        assert!(app.posts[0].markers.read);
        assert!(!app.posts[0].markers.not_read);
    }

    #[tokio::test]
    async fn checkbox_keys_flip_form_state() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(4);

        handle_browse_input(&mut app, KeyCode::Char('u'), &tx).unwrap();
        assert!(app.form.show_unread);
        handle_browse_input(&mut app, KeyCode::Char('i'), &tx).unwrap();
        assert!(app.form.ignore_filtered);
        handle_browse_input(&mut app, KeyCode::Char('u'), &tx).unwrap();
        assert!(!app.form.show_unread);
    }

    #[tokio::test]
    async fn edit_mode_commits_on_enter() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(4);

        handle_browse_input(&mut app, KeyCode::Char('/'), &tx).unwrap();
        assert!(matches!(app.mode, InputMode::EditSubreddit { .. }));

        for c in "pics".chars() {
            handle_edit_input(&mut app, KeyCode::Char(c), &tx);
        }
        handle_edit_input(&mut app, KeyCode::Enter, &tx);

        assert_eq!(app.form.subreddit, "pics");
        assert!(matches!(app.mode, InputMode::Browse));
        // Enter submitted the form.
        assert!(app.refreshing);
    }

    #[tokio::test]
    async fn edit_mode_esc_abandons_input() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(4);

        handle_browse_input(&mut app, KeyCode::Char('d'), &tx).unwrap();
        handle_edit_input(&mut app, KeyCode::Char('7'), &tx);
        handle_edit_input(&mut app, KeyCode::Esc, &tx);

        assert_eq!(app.form.max_age, "");
        assert!(matches!(app.mode, InputMode::Browse));
    }

    #[tokio::test]
    async fn quit_keys() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(4);

        let action = handle_input(&mut app, KeyCode::Char('q'), KeyModifiers::NONE, &tx)
            .await
            .unwrap();
        assert!(matches!(action, Action::Quit));

        let action = handle_input(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL, &tx)
            .await
            .unwrap();
        assert!(matches!(action, Action::Quit));
    }
}
