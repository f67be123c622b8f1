//! The board engine: session state, the decaying meme sets, and the
//! dispatcher that turns user intents into gateway calls.
//!
//! Network calls run on worker threads and report back over a channel. All
//! state lives on the thread that owns [`MemeBoard`] and only changes when
//! that thread calls [`MemeBoard::update`] or [`MemeBoard::pump`].

use std::collections::VecDeque;
use std::fmt;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::api::Gateway;
use crate::error::{BoardError, ValidationError};
use crate::models::{DetailedMeme, MemeId, Thumbnail};
use crate::upload::MemeFile;

pub mod decay;
mod messages;
pub mod session;
mod tasks;

pub use decay::{DecaySimulator, DecayTimer, TICK_INTERVAL};
pub use messages::AppMessage;
pub use session::{check_like, PostRequest, Session};

/// A discrete user action.
#[derive(Debug, Clone)]
pub enum Intent {
    CheckHealth,
    SelectFile(Arc<dyn MemeFile>),
    SetUserName(String),
    Post,
    Open(MemeId),
    Like(MemeId),
    Close,
    Refresh,
}

/// Something the presentation layer should tell the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(BoardError),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Info(text) => f.write_str(text),
            Notice::Error(err) => write!(f, "{err}"),
        }
    }
}

pub struct MemeBoard {
    gateway: Arc<dyn Gateway>,
    tx: Sender<AppMessage>,
    rx: Receiver<AppMessage>,
    session: Session,
    decay: DecaySimulator,
    notices: VecDeque<Notice>,
    refresh_generation: u64,
    pending_open: Option<MemeId>,
    posting: bool,
    liking: Option<MemeId>,
}

impl MemeBoard {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            gateway,
            tx,
            rx,
            session: Session::default(),
            decay: DecaySimulator::default(),
            notices: VecDeque::new(),
            refresh_generation: 0,
            pending_open: None,
            posting: false,
            liking: None,
        }
    }

    pub fn thumbnails(&self) -> Arc<[Thumbnail]> {
        self.decay.thumbnails()
    }

    pub fn detail(&self) -> Option<Arc<DetailedMeme>> {
        self.decay.detail()
    }

    pub fn user_name(&self) -> Option<&str> {
        self.session.user_name()
    }

    pub fn staged_file(&self) -> Option<&Arc<dyn MemeFile>> {
        self.session.staged_file()
    }

    pub fn is_posting(&self) -> bool {
        self.posting
    }

    pub fn is_liking(&self) -> bool {
        self.liking.is_some()
    }

    pub fn timer(&self) -> DecayTimer {
        self.decay.timer()
    }

    /// Whether the Like action should be offered for the open meme.
    pub fn can_like(&self) -> bool {
        if self.liking.is_some() {
            return false;
        }
        match (self.decay.detail(), self.session.user_name()) {
            (Some(meme), Some(user)) => check_like(&meme, user).is_ok(),
            _ => false,
        }
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    /// Runs an intent. Local rejections are returned and also queued as a
    /// notice; network outcomes arrive later through [`MemeBoard::update`].
    pub fn dispatch(&mut self, intent: Intent) -> Result<(), ValidationError> {
        debug!("dispatching {intent:?}");
        let outcome = match intent {
            Intent::CheckHealth => {
                self.check_health();
                Ok(())
            }
            Intent::SelectFile(file) => self.select_file(file),
            Intent::SetUserName(name) => self.set_user_name(&name),
            Intent::Post => self.post(),
            Intent::Open(id) => {
                self.open(id);
                Ok(())
            }
            Intent::Like(id) => self.like(&id),
            Intent::Close => {
                self.close();
                Ok(())
            }
            Intent::Refresh => {
                self.refresh();
                Ok(())
            }
        };
        if let Err(err) = &outcome {
            warn!("intent rejected: {err}");
            self.notify(Notice::Error(err.clone().into()));
        }
        outcome
    }

    pub fn check_health(&mut self) {
        tasks::check_health(self.gateway.clone(), self.tx.clone());
    }

    pub fn select_file(&mut self, file: Arc<dyn MemeFile>) -> Result<(), ValidationError> {
        self.session.stage_file(file)
    }

    pub fn set_user_name(&mut self, name: &str) -> Result<(), ValidationError> {
        self.session.set_user_name(name)?;
        self.refresh();
        Ok(())
    }

    /// Posts the staged file. The stage is emptied immediately; the board is
    /// refreshed once the gateway answers, whatever the answer.
    pub fn post(&mut self) -> Result<(), ValidationError> {
        if self.posting {
            return Err(ValidationError::PostInFlight);
        }
        let PostRequest { user_name, file } = self.session.take_post_request()?;
        self.posting = true;
        tasks::post_meme(self.gateway.clone(), self.tx.clone(), user_name, file);
        Ok(())
    }

    pub fn open(&mut self, id: MemeId) {
        self.pending_open = Some(id.clone());
        tasks::load_meme(self.gateway.clone(), self.tx.clone(), id);
    }

    /// Likes the open meme. On success the detail view closes, so the user
    /// has to reopen it to see the new like count. Only one like may be in
    /// flight, since the open detail still shows the old likers until then.
    pub fn like(&mut self, id: &MemeId) -> Result<(), ValidationError> {
        if self.liking.is_some() {
            return Err(ValidationError::LikeInFlight);
        }
        let meme = self
            .decay
            .detail()
            .filter(|meme| &meme.id == id)
            .ok_or(ValidationError::NoOpenMeme)?;
        let input = self.session.like_input(&meme)?;
        self.liking = Some(id.clone());
        tasks::like_meme(self.gateway.clone(), self.tx.clone(), id.clone(), input);
        Ok(())
    }

    pub fn close(&mut self) {
        self.pending_open = None;
        self.decay.replace_detail(None, Instant::now());
    }

    /// Requests a new thumbnail list. Only the newest request may replace
    /// the board.
    pub fn refresh(&mut self) {
        self.refresh_generation += 1;
        tasks::load_thumbnails(self.gateway.clone(), self.tx.clone(), self.refresh_generation);
    }

    /// Applies finished network calls, then ticks the countdown if due.
    pub fn update(&mut self, now: Instant) {
        while let Ok(message) = self.rx.try_recv() {
            messages::process_message(self, message, now);
        }
        self.decay.advance(now);
    }

    /// Like [`MemeBoard::update`] but first waits up to `timeout` for a
    /// network result. Returns how many results were applied.
    pub fn pump(&mut self, timeout: Duration) -> usize {
        let mut applied = 0;
        match self.rx.recv_timeout(timeout) {
            Ok(message) => {
                messages::process_message(self, message, Instant::now());
                applied += 1;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                warn!("message channel closed");
            }
        }
        let now = Instant::now();
        while let Ok(message) = self.rx.try_recv() {
            messages::process_message(self, message, now);
            applied += 1;
        }
        self.decay.advance(now);
        applied
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push_back(notice);
    }
}
