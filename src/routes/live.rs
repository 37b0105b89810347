use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;

use crate::{models::MovieCard, routes::AppState, services::DebouncedSearch};

/// Frame sent for each published result set
#[derive(Debug, Serialize)]
struct LiveResults {
    seq: u64,
    query: String,
    movies: Vec<MovieCard>,
}

/// Upgrades to a socket where text frames are queries and replies are result frames
pub async fn live_search(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (search, mut results) = DebouncedSearch::new(state.catalog.clone(), state.search_debounce);
    let posters = state.posters.clone();

    let mut send_task = tokio::spawn(async move {
        while results.changed().await.is_ok() {
            let frame = results.borrow_and_update().as_ref().map(|r| LiveResults {
                seq: r.seq,
                query: r.query.clone(),
                movies: r
                    .movies
                    .iter()
                    .cloned()
                    .map(|movie| posters.card(movie, None))
                    .collect(),
            });
            let Some(frame) = frame else { continue };

            let text = match serde_json::to_string(&frame) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode live search frame");
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            match message {
                Message::Text(query) => {
                    search.submit(query);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    tracing::debug!("Live search socket closed");
}
