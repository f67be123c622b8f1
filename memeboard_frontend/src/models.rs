use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier assigned by the gateway. The gateway may hand out numbers or
/// strings; both are kept as text so they can be echoed back in paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MemeId(String);

impl MemeId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for MemeId {
    fn from(raw: u64) -> Self {
        Self(raw.to_string())
    }
}

impl From<&str> for MemeId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl<'de> Deserialize<'de> for MemeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(serde_json::Number),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => MemeId(n.to_string()),
            RawId::Text(s) => MemeId(s),
        })
    }
}

/// Accepts any JSON number. Fractions are rounded down to whole seconds.
fn ttl_seconds<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Number::deserialize(deserializer)?;
    if let Some(secs) = raw.as_i64() {
        return Ok(secs);
    }
    match raw.as_f64() {
        Some(secs) if secs.is_finite() => Ok(secs.floor() as i64),
        _ => Err(serde::de::Error::custom(format!("invalid timeToLive {raw}"))),
    }
}

/// List-view projection of a meme as returned by `GET /thumbnails`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thumbnail {
    pub id: MemeId,
    pub user_name: String,
    /// Seconds since the Unix epoch.
    pub time_posted: i64,
    /// Remaining lifetime in whole seconds. May arrive at or below zero
    /// for memes that expired while the list was being built.
    #[serde(deserialize_with = "ttl_seconds")]
    pub time_to_live: i64,
    pub image_url: String,
}

impl Thumbnail {
    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.time_posted, 0)
    }
}

/// Full view of a single meme as returned by `GET /{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedMeme {
    pub id: MemeId,
    pub user_name: String,
    /// Seconds since the Unix epoch.
    pub time_posted: i64,
    #[serde(deserialize_with = "ttl_seconds")]
    pub time_to_live: i64,
    pub image_url: String,
    #[serde(default)]
    pub likes: Vec<String>,
}

impl DetailedMeme {
    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.time_posted, 0)
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn liked_by(&self, user_name: &str) -> bool {
        self.likes.iter().any(|liker| names_match(liker, user_name))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemeInput {
    pub user_name: String,
    /// Base64 data URL including its `data:<mime>;base64,` header.
    pub image: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMemeResponse {
    pub id: MemeId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeInput {
    pub user_name: String,
}

/// User names are compared without regard to case.
pub fn names_match(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_thumbnail_with_numeric_id() {
        let raw = r#"{
            "id": 17,
            "userName": "Ann",
            "timePosted": 1700000000,
            "timeToLive": 3600,
            "imageUrl": "data:image/png;base64,AAAA"
        }"#;
        let thumb: Thumbnail = serde_json::from_str(raw).unwrap();
        assert_eq!(
            thumb,
            Thumbnail {
                id: MemeId::from(17),
                user_name: "Ann".into(),
                time_posted: 1_700_000_000,
                time_to_live: 3600,
                image_url: "data:image/png;base64,AAAA".into(),
            }
        );
        assert_eq!(thumb.posted_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn decodes_detail_with_string_id_and_missing_likes() {
        let raw = r#"{
            "id": "abc",
            "userName": "Bob",
            "timePosted": 1,
            "timeToLive": 5,
            "imageUrl": "data:,"
        }"#;
        let meme: DetailedMeme = serde_json::from_str(raw).unwrap();
        assert_eq!(meme.id.as_str(), "abc");
        assert!(meme.likes.is_empty());
    }

    #[test]
    fn expired_and_fractional_ttls_still_decode() {
        let raw = r#"[
            {"id": 1, "userName": "Ann", "timePosted": 1, "timeToLive": 30, "imageUrl": "data:,"},
            {"id": 2, "userName": "Bob", "timePosted": 1, "timeToLive": -1, "imageUrl": "data:,"},
            {"id": 3, "userName": "Cy", "timePosted": 1, "timeToLive": 12.7, "imageUrl": "data:,"}
        ]"#;
        let thumbs: Vec<Thumbnail> = serde_json::from_str(raw).unwrap();
        let ttls: Vec<i64> = thumbs.iter().map(|t| t.time_to_live).collect();
        assert_eq!(ttls, vec![30, -1, 12]);
    }

    #[test]
    fn liked_by_ignores_case() {
        let meme = DetailedMeme {
            id: MemeId::from(1),
            user_name: "Ann".into(),
            time_posted: 0,
            time_to_live: 10,
            image_url: String::new(),
            likes: vec!["Carol".into()],
        };
        assert!(meme.liked_by("carol"));
        assert!(!meme.liked_by("ann"));
    }

    #[test]
    fn request_bodies_use_camel_case() {
        let body = serde_json::to_value(CreateMemeInput {
            user_name: "Ann".into(),
            image: "data:,".into(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "userName": "Ann", "image": "data:," }));

        let like = serde_json::to_value(LikeInput { user_name: "Bob".into() }).unwrap();
        assert_eq!(like, serde_json::json!({ "userName": "Bob" }));
    }
}
