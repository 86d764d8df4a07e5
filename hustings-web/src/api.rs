use chrono::Utc;
use futures::{channel::oneshot, pin_mut, select, FutureExt, SinkExt, StreamExt};
use hustings_client::{
    api::{FeedMessage, FeedRequest, PostId, Subscription, Time},
    Notification,
};
use ws_stream_wasm::{WsMessage, WsMeta};

use crate::{ui, LoginInfo};

// Pings will be sent every PING_INTERVAL
const PING_INTERVAL_SECS: i64 = 10;
// If the interval between two pongs is more than DISCONNECT_INTERVAL, disconnect
const DISCONNECT_INTERVAL_SECS: i64 = 20;
// Space each reconnect attempt by ATTEMPT_SPACING
const ATTEMPT_SPACING_SECS: i64 = 1;

pub async fn sleep_for(d: chrono::Duration) {
    let d = d.to_std().unwrap_or(std::time::Duration::from_secs(0));
    if let Err(err) = wasm_timer::Delay::new(d).await {
        tracing::warn!(?err, "timer failed");
    }
}

async fn sleep_until(t: Time) {
    sleep_for(t - Utc::now()).await
}

fn encode(req: &FeedRequest) -> WsMessage {
    WsMessage::Text(serde_json::to_string(req).unwrap_or_default())
}

/// Fires `PollTick`s for `post` until `cancel`'s receiver is dropped
pub async fn start_poll_timer(
    post: PostId,
    period: chrono::Duration,
    scope: yew::html::Scope<ui::CommentPanel>,
    mut cancel: oneshot::Sender<()>,
) {
    let mut cancellation = cancel.cancellation().fuse();
    loop {
        let tick = sleep_for(period).fuse();
        pin_mut!(tick);
        select! {
            _ = cancellation => return,
            _ = tick => scope.send_message(ui::PanelMsg::PollTick(post.clone())),
        }
    }
}

/// Listens to the comment and reply changes of `post` until `cancel`'s receiver is dropped,
/// reconnecting as needed
pub async fn start_change_feed(
    login: LoginInfo,
    post: PostId,
    scope: yew::html::Scope<ui::CommentPanel>,
    mut cancel: oneshot::Sender<()>,
) {
    let ws_url = match login.host.strip_prefix("http") {
        Some(rest) => format!("ws{rest}/ws/changes"),
        None => {
            tracing::error!(
                host = ?login.host,
                "host is not an http url, realtime updates disabled"
            );
            return;
        }
    };
    let mut first_attempt = true;
    'reconnect: loop {
        match first_attempt {
            true => first_attempt = false,
            false => {
                tracing::warn!(?post, "lost change feed connection");
                scope.send_message(ui::PanelMsg::FeedDisconnected(post.clone()));
                sleep_for(chrono::Duration::seconds(ATTEMPT_SPACING_SECS)).await;
            }
        }
        if cancel.is_canceled() {
            return;
        }

        let mut sock = match WsMeta::connect(&ws_url, None).await {
            Ok((_, s)) => s,
            Err(err) => {
                tracing::warn!(?err, "failed connecting to change feed");
                continue 'reconnect;
            }
        };

        for sub in Subscription::for_post(&post) {
            if let Err(err) = sock.send(encode(&FeedRequest::Subscribe(sub))).await {
                tracing::warn!(?err, "failed subscribing to change feed");
                continue 'reconnect;
            }
        }
        tracing::info!(?post, "subscribed to change feed");
        scope.send_message(ui::PanelMsg::FeedConnected(post.clone()));

        let mut next_ping = Utc::now();
        let mut last_pong = Utc::now();
        let mut sock = sock.fuse();
        let mut cancellation = cancel.cancellation().fuse();
        loop {
            let delay_pong_reception =
                sleep_until(last_pong + chrono::Duration::seconds(DISCONNECT_INTERVAL_SECS)).fuse();
            let delay_ping_send = sleep_until(next_ping).fuse();
            pin_mut!(delay_ping_send, delay_pong_reception);
            select! {
                _ = cancellation => {
                    if let Err(err) = sock.into_inner().close().await {
                        tracing::debug!(?err, "change feed did not close cleanly");
                    }
                    tracing::info!(?post, "disconnected from change feed");
                    return;
                }
                _ = delay_pong_reception => continue 'reconnect,
                _ = delay_ping_send => {
                    if sock.send(encode(&FeedRequest::Ping)).await.is_err() {
                        continue 'reconnect;
                    }
                    next_ping += chrono::Duration::seconds(PING_INTERVAL_SECS);
                }
                msg = sock.next() => {
                    let msg = match msg {
                        None => continue 'reconnect,
                        Some(WsMessage::Text(t)) => serde_json::from_str::<FeedMessage>(&t),
                        Some(WsMessage::Binary(b)) => serde_json::from_slice::<FeedMessage>(&b),
                    };
                    match msg {
                        Err(err) => tracing::warn!(?err, "dropping malformed change notification"),
                        Ok(FeedMessage::Pong) => last_pong = Utc::now(),
                        Ok(FeedMessage::Subscribed(sub)) => {
                            tracing::debug!(?sub, "subscription acknowledged")
                        }
                        Ok(msg) => {
                            if let Some(n) = Notification::from_feed(msg) {
                                scope.send_message(ui::PanelMsg::Notification(post.clone(), n));
                            }
                        }
                    }
                }
            }
        }
    }
}
