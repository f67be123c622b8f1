use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use log::{error, info};

use crate::api::Gateway;
use crate::error::BoardError;
use crate::models::{CreateMemeInput, LikeInput, MemeId};
use crate::upload::{make_data_url, MemeFile};

use super::messages::AppMessage;

pub fn check_health(gateway: Arc<dyn Gateway>, tx: Sender<AppMessage>) {
    thread::spawn(move || {
        let result = gateway.check_health();
        if tx.send(AppMessage::HealthChecked(result)).is_err() {
            error!("failed to send HealthChecked message");
        }
    });
}

pub fn load_thumbnails(gateway: Arc<dyn Gateway>, tx: Sender<AppMessage>, generation: u64) {
    thread::spawn(move || {
        let result = gateway.list_thumbnails();
        if tx
            .send(AppMessage::ThumbnailsLoaded { generation, result })
            .is_err()
        {
            error!("failed to send ThumbnailsLoaded message");
        }
    });
}

pub fn load_meme(gateway: Arc<dyn Gateway>, tx: Sender<AppMessage>, id: MemeId) {
    thread::spawn(move || {
        let result = gateway.fetch_meme(&id);
        if tx.send(AppMessage::MemeLoaded { id, result }).is_err() {
            error!("failed to send MemeLoaded message");
        }
    });
}

pub fn post_meme(
    gateway: Arc<dyn Gateway>,
    tx: Sender<AppMessage>,
    user_name: String,
    file: Arc<dyn MemeFile>,
) {
    thread::spawn(move || {
        let result = match make_data_url(file.as_ref()) {
            Ok(image) => {
                info!("posting {} ({} bytes) as {user_name}", file.name(), file.size());
                gateway
                    .create_meme(&CreateMemeInput { user_name, image })
                    .map_err(BoardError::from)
            }
            Err(err) => {
                error!("failed to encode {}: {err}", file.name());
                Err(BoardError::Encoding(err.to_string()))
            }
        };
        if tx.send(AppMessage::MemePosted(result)).is_err() {
            error!("failed to send MemePosted message");
        }
    });
}

pub fn like_meme(gateway: Arc<dyn Gateway>, tx: Sender<AppMessage>, id: MemeId, input: LikeInput) {
    thread::spawn(move || {
        let result = gateway.like_meme(&id, &input);
        if tx.send(AppMessage::MemeLiked { id, result }).is_err() {
            error!("failed to send MemeLiked message");
        }
    });
}
