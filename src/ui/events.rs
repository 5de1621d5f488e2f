//! Background task event processing.
//!
//! Network callbacks land here. Handlers mutate the view-model only; the
//! next frame renders the result. This is where the optimistic toggle
//! protocol settles: confirmations pin the server state, rejections
//! restore the pre-toggle snapshot, and a confirmed batch mark-read
//! chains into a feed reload.

use crate::api::Flag;
use crate::app::{App, AppEvent};
use crate::feed::Markers;
use tokio::sync::mpsc;

use super::helpers::spawn_feed_reload;

pub(super) async fn handle_app_event(
    app: &mut App,
    event: AppEvent,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    match event {
        AppEvent::ToggleConfirmed {
            post_id,
            flag,
            state,
        } => handle_toggle_confirmed(app, &post_id, flag, state),
        AppEvent::ToggleRejected {
            post_id,
            flag,
            prior,
        } => handle_toggle_rejected(app, &post_id, flag, prior),
        AppEvent::ReadAllComplete { count } => {
            tracing::info!(count, "Batch mark-read confirmed, reloading feed");
            app.set_status(format!("Marked {} posts read", count));
            spawn_feed_reload(app, event_tx);
        }
        AppEvent::ReadAllFailed { error } => {
            // Nothing was applied optimistically, so there is nothing to
            // roll back; the chain just stops.
            tracing::error!(error = %error, "Batch mark-read failed");
            app.set_status("Mark all read failed");
        }
        AppEvent::FeedLoaded { html } => {
            app.refreshing = false;
            app.replace_feed(html);
            app.set_status(format!("Feed updated: {} posts", app.posts.len()));
        }
        AppEvent::FeedLoadFailed { error } => {
            app.refreshing = false;
            tracing::error!(error = %error, "Feed reload failed, keeping current feed");
            app.set_status("Feed reload failed");
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error = %error, "Background task panicked");
            app.set_status(format!("Internal error in {}", task));
        }
    }
}

/// The optimistic state is now the confirmed state. With rapid
/// re-toggling of one flag the responses race; the last one to arrive
/// wins, whatever the click order was.
fn handle_toggle_confirmed(app: &mut App, post_id: &str, flag: Flag, state: bool) {
    tracing::debug!(post_id, flag = flag.name(), state, "Toggle confirmed");
    app.confirm_marker(post_id, flag, state);
}

/// Compensating action: the server said no, so the marker goes back to
/// its pre-toggle snapshot.
fn handle_toggle_rejected(app: &mut App, post_id: &str, flag: Flag, prior: Markers) {
    tracing::warn!(post_id, flag = flag.name(), "Toggle rejected, rolling back");
    app.rollback_markers(post_id, prior);
    app.set_status(format!("Server rejected {} toggle - reverted", flag.name()));
}
