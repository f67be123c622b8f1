use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{classify, FailedAttempt, GatewayError};
use crate::models::{
    CreateMemeInput, CreateMemeResponse, DetailedMeme, LikeInput, MemeId, Thumbnail,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// The five remote operations the board needs from the gateway.
///
/// Every method returns either its typed payload or a classified
/// [`GatewayError`]; callers never see raw transport errors.
#[cfg_attr(test, mockall::automock)]
pub trait Gateway: Send + Sync {
    fn check_health(&self) -> Result<Value, GatewayError>;
    fn list_thumbnails(&self) -> Result<Vec<Thumbnail>, GatewayError>;
    fn fetch_meme(&self, id: &MemeId) -> Result<DetailedMeme, GatewayError>;
    fn create_meme(&self, input: &CreateMemeInput) -> Result<MemeId, GatewayError>;
    fn like_meme(&self, id: &MemeId, input: &LikeInput) -> Result<(), GatewayError>;
}

#[derive(Clone)]
pub struct GatewayClient {
    base_url: Url,
    client: Client,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base = sanitize_base_url(base_url.into())?;
        let base = Url::parse(&base).context("invalid gateway URL")?;
        if base.cannot_be_a_base() {
            anyhow::bail!("gateway URL {base} cannot carry a path");
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: base,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Appends one path segment to the base URL. The segment is
    /// percent-encoded, so ids cannot escape into other paths or a query.
    fn url(&self, segment: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(segment);
        }
        url
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, GatewayError> {
        let response = request.send().map_err(|err| {
            warn!("gateway request failed before a response arrived: {err}");
            classify(FailedAttempt::NoResponse(err.to_string()))
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.bytes().map_err(|err| {
            classify(FailedAttempt::NoResponse(format!("{status}: {err}")))
        })?;
        let err = classify(FailedAttempt::Rejected {
            status,
            body: body.as_ref(),
        });
        warn!("gateway rejected request with {status}: {err}");
        Err(err)
    }

    fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let response = self.send(request)?;
        response
            .json()
            .map_err(|err| classify(FailedAttempt::Undecodable(err.to_string())))
    }
}

impl Gateway for GatewayClient {
    fn check_health(&self) -> Result<Value, GatewayError> {
        debug!("GET /health-check");
        self.send_json(self.client.get(self.url("health-check")))
    }

    fn list_thumbnails(&self) -> Result<Vec<Thumbnail>, GatewayError> {
        debug!("GET /thumbnails");
        self.send_json(self.client.get(self.url("thumbnails")))
    }

    fn fetch_meme(&self, id: &MemeId) -> Result<DetailedMeme, GatewayError> {
        debug!("GET /{id}");
        self.send_json(self.client.get(self.url(id.as_str())))
    }

    fn create_meme(&self, input: &CreateMemeInput) -> Result<MemeId, GatewayError> {
        debug!("POST / ({} byte payload)", input.image.len());
        let created: CreateMemeResponse =
            self.send_json(self.client.post(self.url("")).json(input))?;
        Ok(created.id)
    }

    fn like_meme(&self, id: &MemeId, input: &LikeInput) -> Result<(), GatewayError> {
        debug!("PUT /{id}");
        self.send(self.client.put(self.url(id.as_str())).json(input))?;
        Ok(())
    }
}

fn sanitize_base_url(mut base: String) -> Result<String> {
    base = base.trim().to_string();
    if !base.starts_with("http://") && !base.starts_with("https://") {
        base = format!("http://{base}");
    }
    while base.ends_with('/') {
        base.pop();
    }
    let _ = Url::parse(&base).context("invalid gateway URL")?;
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_adds_scheme_and_strips_slashes() {
        assert_eq!(
            sanitize_base_url("memes.example.com/prod//".into()).unwrap(),
            "http://memes.example.com/prod"
        );
        assert_eq!(
            sanitize_base_url("https://memes.example.com".into()).unwrap(),
            "https://memes.example.com"
        );
    }

    #[test]
    fn sanitize_rejects_garbage() {
        assert!(sanitize_base_url("http://exa mple.com".into()).is_err());
    }

    #[test]
    fn urls_keep_base_path_prefix() {
        let client = GatewayClient::new("https://gw.example.com/stage").unwrap();
        assert_eq!(
            client.url("thumbnails").as_str(),
            "https://gw.example.com/stage/thumbnails"
        );
        assert_eq!(client.url("42").as_str(), "https://gw.example.com/stage/42");
        assert_eq!(client.url("").as_str(), "https://gw.example.com/stage/");
    }

    #[test]
    fn urls_without_base_path() {
        let client = GatewayClient::new("gw.example.com").unwrap();
        assert_eq!(client.url("thumbnails").as_str(), "http://gw.example.com/thumbnails");
        assert_eq!(client.url("").as_str(), "http://gw.example.com/");
    }

    #[test]
    fn meme_ids_stay_one_encoded_segment() {
        let client = GatewayClient::new("https://gw.example.com/stage").unwrap();
        let url = client.url("a/b?x=1");
        assert_eq!(url.path(), "/stage/a%2Fb%3Fx=1");
        assert_eq!(url.query(), None);

        let url = client.url("thumbnails#top");
        assert_eq!(url.path(), "/stage/thumbnails%23top");
        assert_eq!(url.fragment(), None);
    }
}
