use std::time::Instant;

use log::{debug, info, warn};
use serde_json::Value;

use crate::error::{BoardError, GatewayError};
use crate::models::{DetailedMeme, MemeId, Thumbnail};

use super::{MemeBoard, Notice};

pub enum AppMessage {
    HealthChecked(Result<Value, GatewayError>),
    ThumbnailsLoaded {
        generation: u64,
        result: Result<Vec<Thumbnail>, GatewayError>,
    },
    MemeLoaded {
        id: MemeId,
        result: Result<DetailedMeme, GatewayError>,
    },
    MemePosted(Result<MemeId, BoardError>),
    MemeLiked {
        id: MemeId,
        result: Result<(), GatewayError>,
    },
}

pub(super) fn process_message(board: &mut MemeBoard, message: AppMessage, now: Instant) {
    match message {
        AppMessage::HealthChecked(result) => board.handle_health_checked(result),
        AppMessage::ThumbnailsLoaded { generation, result } => {
            board.handle_thumbnails_loaded(generation, result, now)
        }
        AppMessage::MemeLoaded { id, result } => board.handle_meme_loaded(id, result, now),
        AppMessage::MemePosted(result) => board.handle_meme_posted(result),
        AppMessage::MemeLiked { id, result } => board.handle_meme_liked(id, result, now),
    }
}

impl MemeBoard {
    fn handle_health_checked(&mut self, result: Result<Value, GatewayError>) {
        match result {
            Ok(body) => {
                let said = match body {
                    Value::String(text) => text,
                    other => other.to_string(),
                };
                self.notify(Notice::Info(format!("The server is alive and says {said}")));
            }
            Err(err) => self.notify(Notice::Error(err.into())),
        }
    }

    fn handle_thumbnails_loaded(
        &mut self,
        generation: u64,
        result: Result<Vec<Thumbnail>, GatewayError>,
        now: Instant,
    ) {
        if generation != self.refresh_generation {
            debug!(
                "dropping thumbnail list {generation}, newer refresh {} pending",
                self.refresh_generation
            );
            return;
        }
        match result {
            Ok(thumbnails) => {
                debug!("loaded {} thumbnails", thumbnails.len());
                self.decay.replace_thumbnails(thumbnails, now);
            }
            Err(err) => {
                // Stale memes would keep counting down with no way to correct
                // them, so a failed refresh empties the board.
                self.decay.replace_thumbnails(Vec::new(), now);
                self.notify(Notice::Error(err.into()));
            }
        }
    }

    fn handle_meme_loaded(
        &mut self,
        id: MemeId,
        result: Result<DetailedMeme, GatewayError>,
        now: Instant,
    ) {
        if self.pending_open.as_ref() != Some(&id) {
            debug!("ignoring meme {id}, no longer requested");
            return;
        }
        self.pending_open = None;
        match result {
            Ok(meme) => self.decay.replace_detail(Some(meme), now),
            Err(err) => {
                warn!("failed to open meme {id}: {err}");
                self.notify(Notice::Error(err.into()));
            }
        }
    }

    fn handle_meme_posted(&mut self, result: Result<MemeId, BoardError>) {
        self.posting = false;
        match result {
            Ok(id) => {
                info!("meme {id} posted");
                self.notify(Notice::Info(format!("Your meme (id {id}) posted!")));
            }
            Err(err) => self.notify(Notice::Error(err)),
        }
        self.refresh();
    }

    fn handle_meme_liked(&mut self, id: MemeId, result: Result<(), GatewayError>, now: Instant) {
        if self.liking.as_ref() == Some(&id) {
            self.liking = None;
        }
        match result {
            Ok(()) => {
                info!("liked meme {id}");
                self.notify(Notice::Info("Thanks for liking this meme!".into()));
                self.pending_open = None;
                self.decay.replace_detail(None, now);
                self.refresh();
            }
            Err(err) => {
                warn!("failed to like meme {id}: {err}");
                self.notify(Notice::Error(err.into()));
            }
        }
    }
}
