use std::sync::Arc;

use crate::error::ValidationError;
use crate::models::{names_match, DetailedMeme, LikeInput};
use crate::upload::{validate_meme_file, MemeFile};

/// Who the user is and what they are about to post.
#[derive(Debug, Default)]
pub struct Session {
    user_name: Option<String>,
    staged: Option<Arc<dyn MemeFile>>,
}

/// Everything a post needs, taken out of the session in one go.
#[derive(Debug)]
pub struct PostRequest {
    pub user_name: String,
    pub file: Arc<dyn MemeFile>,
}

impl Session {
    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub fn staged_file(&self) -> Option<&Arc<dyn MemeFile>> {
        self.staged.as_ref()
    }

    /// Trims and stores the name. Only the first accepted name sticks.
    pub fn set_user_name(&mut self, raw: &str) -> Result<&str, ValidationError> {
        if self.user_name.is_some() {
            return Err(ValidationError::UserNameLocked);
        }
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingUserName);
        }
        Ok(self.user_name.insert(trimmed.to_string()).as_str())
    }

    /// Validates at selection time. A rejected file leaves nothing staged.
    pub fn stage_file(&mut self, file: Arc<dyn MemeFile>) -> Result<(), ValidationError> {
        if let Err(err) = validate_meme_file(file.as_ref()) {
            self.staged = None;
            return Err(err);
        }
        self.staged = Some(file);
        Ok(())
    }

    /// Hands out the name and staged file for a post, leaving the slot empty.
    /// Nothing is taken when a precondition fails.
    pub fn take_post_request(&mut self) -> Result<PostRequest, ValidationError> {
        let user_name = self
            .user_name
            .clone()
            .ok_or(ValidationError::MissingUserName)?;
        let file = self.staged.take().ok_or(ValidationError::NothingStaged)?;
        Ok(PostRequest { user_name, file })
    }

    /// Builds the like body if this user may like `meme`.
    pub fn like_input(&self, meme: &DetailedMeme) -> Result<LikeInput, ValidationError> {
        let user_name = self.user_name().ok_or(ValidationError::MissingUserName)?;
        check_like(meme, user_name)?;
        Ok(LikeInput {
            user_name: user_name.to_string(),
        })
    }
}

/// Posters may not like their own memes, and nobody likes twice.
pub fn check_like(meme: &DetailedMeme, user_name: &str) -> Result<(), ValidationError> {
    if names_match(&meme.user_name, user_name) {
        return Err(ValidationError::SelfLike);
    }
    if meme.liked_by(user_name) {
        return Err(ValidationError::AlreadyLiked);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MemeId;
    use crate::upload::{InMemoryFile, MAX_MEME_BYTES};

    fn image(size: usize) -> Arc<dyn MemeFile> {
        Arc::new(InMemoryFile {
            name: "cat.png".into(),
            mime: Some("image/png".into()),
            bytes: vec![7; size],
        })
    }

    fn meme(poster: &str, likes: &[&str]) -> DetailedMeme {
        DetailedMeme {
            id: MemeId::from(1),
            user_name: poster.into(),
            time_posted: 0,
            time_to_live: 60,
            image_url: String::new(),
            likes: likes.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn blank_name_is_rejected_and_left_unset() {
        let mut session = Session::default();
        assert_eq!(session.set_user_name("  "), Err(ValidationError::MissingUserName));
        assert_eq!(session.user_name(), None);
    }

    #[test]
    fn name_is_trimmed() {
        let mut session = Session::default();
        assert_eq!(session.set_user_name("  Ann  "), Ok("Ann"));
        assert_eq!(session.user_name(), Some("Ann"));
    }

    #[test]
    fn name_is_locked_once_set() {
        let mut session = Session::default();
        session.set_user_name("Ann").unwrap();
        assert_eq!(session.set_user_name("Bob"), Err(ValidationError::UserNameLocked));
        assert_eq!(session.user_name(), Some("Ann"));
    }

    #[test]
    fn rejected_selection_clears_previous_stage() {
        let mut session = Session::default();
        session.stage_file(image(10)).unwrap();
        assert!(session.staged_file().is_some());

        let err = session.stage_file(image(MAX_MEME_BYTES as usize + 1)).unwrap_err();
        assert!(matches!(err, ValidationError::FileTooLarge { .. }));
        assert!(session.staged_file().is_none());
    }

    #[test]
    fn post_request_needs_name_then_file() {
        let mut session = Session::default();
        session.stage_file(image(10)).unwrap();
        assert_eq!(
            session.take_post_request().unwrap_err(),
            ValidationError::MissingUserName
        );
        assert!(session.staged_file().is_some());

        session.set_user_name("Ann").unwrap();
        let request = session.take_post_request().unwrap();
        assert_eq!(request.user_name, "Ann");
        assert!(session.staged_file().is_none());
        assert_eq!(
            session.take_post_request().unwrap_err(),
            ValidationError::NothingStaged
        );
    }

    #[test]
    fn self_like_is_blocked_regardless_of_case() {
        assert_eq!(check_like(&meme("Ann", &[]), "ann"), Err(ValidationError::SelfLike));
    }

    #[test]
    fn repeat_like_is_blocked_regardless_of_case() {
        assert_eq!(
            check_like(&meme("Ann", &["BOB"]), "bob"),
            Err(ValidationError::AlreadyLiked)
        );
        assert_eq!(check_like(&meme("Ann", &["Carol"]), "bob"), Ok(()));
    }

    #[test]
    fn like_input_requires_name() {
        let session = Session::default();
        assert_eq!(
            session.like_input(&meme("Ann", &[])).unwrap_err(),
            ValidationError::MissingUserName
        );
    }
}
