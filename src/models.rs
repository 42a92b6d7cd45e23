use serde::Deserialize;
use serde_json::Value;

/// Subset of the currently-playing response the host cares about.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurrentlyPlaying {
    #[serde(default)]
    pub is_playing: bool,
    pub progress_ms: Option<u64>,
    pub currently_playing_type: Option<String>,
    /// `null` for ads and some podcast states.
    pub item: Option<Track>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Track {
    pub name: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub artists: Vec<Artist>,
    pub album: Option<Album>,
}

impl Track {
    /// "Artist A, Artist B - Title"
    pub fn summary(&self) -> String {
        let artists = self
            .artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        if artists.is_empty() {
            self.name.clone()
        } else {
            format!("{} - {}", artists, self.name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Artist {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Album {
    pub name: String,
}

/// Body of `{"error": {...}}` responses, including the one synthesized for
/// an empty player response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiErrorDetail {
    pub status: Option<u16>,
    #[serde(default)]
    pub message: String,
    pub details: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NowPlaying {
    Playing(CurrentlyPlaying),
    /// Nothing loaded in the player; `message` is the transport error text.
    Nothing { message: String, details: String },
    Error(ApiErrorDetail),
}

impl NowPlaying {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        if let Some(err) = value.get("error") {
            let detail: ApiErrorDetail = if err.is_object() {
                serde_json::from_value(err.clone())?
            } else {
                ApiErrorDetail {
                    status: None,
                    message: err.as_str().map(str::to_string).unwrap_or_else(|| err.to_string()),
                    details: None,
                }
            };
            return Ok(match detail.details {
                Some(details) => NowPlaying::Nothing {
                    message: detail.message,
                    details,
                },
                None => NowPlaying::Error(detail),
            });
        }
        Ok(NowPlaying::Playing(serde_json::from_value(value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_playing_track() {
        let v = json!({
            "is_playing": true,
            "progress_ms": 1200,
            "currently_playing_type": "track",
            "item": {
                "name": "Song",
                "duration_ms": 180000,
                "artists": [{"name": "A"}, {"name": "B"}],
                "album": {"name": "Album"}
            }
        });
        match NowPlaying::from_value(v).unwrap() {
            NowPlaying::Playing(cp) => {
                assert!(cp.is_playing);
                assert_eq!(cp.item.unwrap().summary(), "A, B - Song");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn classifies_error_bodies() {
        let expired = json!({"error": {"status": 401, "message": "The access token expired"}});
        assert_eq!(
            NowPlaying::from_value(expired).unwrap(),
            NowPlaying::Error(ApiErrorDetail {
                status: Some(401),
                message: "The access token expired".into(),
                details: None,
            })
        );
        let nothing = json!({"error": {"message": "reset", "details": "idle"}});
        assert!(matches!(
            NowPlaying::from_value(nothing).unwrap(),
            NowPlaying::Nothing { .. }
        ));
    }
}
