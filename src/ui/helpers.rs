//! Helper functions shared across the UI layer: panic-safe task
//! spawning and the feed reload tasks used from both input handlers and
//! event handlers.

use crate::app::{App, AppEvent};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;

/// Wraps a future so a panic inside a spawned task becomes an
/// `Err(message)` instead of silently vanishing into the runtime.
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic payload".to_string()
            }
        })
}

/// Spawns a `/feedmore` reload with the current filter values.
///
/// Used by the refresh key and by the batch mark-read chain (a confirmed
/// `readall` triggers a reload). A reload already in flight is left alone;
/// the feed is replaced wholesale anyway, so queueing another brings
/// nothing.
pub(super) fn spawn_feed_reload(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if app.refreshing {
        tracing::debug!("Feed reload already in flight, ignoring");
        return;
    }
    app.refreshing = true;
    app.needs_redraw = true;

    let api = app.api.clone();
    let query = app.form.feed_params();
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let tx_panic = tx.clone();
        match catch_task_panic(async {
            let event = match api.feed_more(&query).await {
                Ok(resp) if resp.success => match resp.html {
                    Some(html) => AppEvent::FeedLoaded { html },
                    None => AppEvent::FeedLoadFailed {
                        error: "response missing html field".to_string(),
                    },
                },
                Ok(_) => AppEvent::FeedLoadFailed {
                    error: "server refused feed request".to_string(),
                },
                Err(e) => {
                    tracing::error!(error = %e, "Feed reload failed");
                    AppEvent::FeedLoadFailed {
                        error: e.to_string(),
                    }
                }
            };
            if let Err(e) = tx.send(event).await {
                tracing::warn!(error = %e, "Channel send failed (receiver dropped)");
            }
        })
        .await
        {
            Ok(()) => {}
            Err(panic_msg) => {
                tracing::error!(task = "feed_reload", error = %panic_msg, "Background task panicked");
                let _ = tx_panic
                    .send(AppEvent::TaskPanicked {
                        task: "feed_reload",
                        error: panic_msg,
                    })
                    .await;
            }
        }
    });
}

/// Spawns a full filter-form submission: fetches the listing route with
/// the guard-filtered parameters and replaces the feed from the result.
pub(super) fn spawn_form_submit(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if app.refreshing {
        tracing::debug!("Feed reload already in flight, ignoring");
        return;
    }
    app.refreshing = true;
    app.needs_redraw = true;

    let api = app.api.clone();
    let subreddit = app.form.subreddit.clone();
    let params = app.form.submit_params();
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let tx_panic = tx.clone();
        match catch_task_panic(async {
            let event = match api.fetch_listing(&subreddit, &params).await {
                Ok(html) => AppEvent::FeedLoaded { html },
                Err(e) => {
                    tracing::error!(error = %e, subreddit = %subreddit, "Form submission failed");
                    AppEvent::FeedLoadFailed {
                        error: e.to_string(),
                    }
                }
            };
            if let Err(e) = tx.send(event).await {
                tracing::warn!(error = %e, "Channel send failed (receiver dropped)");
            }
        })
        .await
        {
            Ok(()) => {}
            Err(panic_msg) => {
                tracing::error!(task = "form_submit", error = %panic_msg, "Background task panicked");
                let _ = tx_panic
                    .send(AppEvent::TaskPanicked {
                        task: "form_submit",
                        error: panic_msg,
                    })
                    .await;
            }
        }
    });
}
