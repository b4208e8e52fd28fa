use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;
use serde::Serialize;

static DRIVE_FILE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-\w]{25,}").expect("static regex"));

/// How a lesson video should be embedded by the player.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VideoEmbed {
    Youtube { video_id: String, url: String },
    Drive { file_id: String, url: String },
    Direct { url: String },
    Hosted { playback_id: String, url: String },
}

impl VideoEmbed {
    pub fn url(&self) -> &str {
        match self {
            Self::Youtube { url, .. }
            | Self::Drive { url, .. }
            | Self::Direct { url }
            | Self::Hosted { url, .. } => url,
        }
    }
}

/// HLS stream of an asset ingested by the video host.
pub fn hosted_embed(playback_id: &str) -> VideoEmbed {
    VideoEmbed::Hosted {
        playback_id: playback_id.to_string(),
        url: format!("https://stream.mux.com/{playback_id}.m3u8"),
    }
}

/// Video id of a `youtu.be/<id>` link or of the `v` query parameter of a
/// `youtube.com` link. Scheme-less links are read as https.
fn youtube_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).or_else(|_| Url::parse(&format!("https://{url}"))).ok()?;
    let host = parsed.host_str()?;

    let id = if host == "youtu.be" || host.ends_with(".youtu.be") {
        parsed.path_segments()?.next().map(str::to_string)
    } else {
        parsed
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())
    }?;

    (!id.is_empty()).then_some(id)
}

/// Turns a stored video URL into something a player can embed. YouTube and
/// Google Drive share links become their embed endpoints, anything else is
/// played directly. Returns `None` when no playable URL can be derived.
pub fn resolve_embed(url: &str) -> Option<VideoEmbed> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    if url.contains("youtube.com") || url.contains("youtu.be") {
        let id = youtube_id(url)?;
        return Some(VideoEmbed::Youtube {
            video_id: id.to_string(),
            url: format!("https://www.youtube.com/embed/{id}?modestbranding=1&rel=0"),
        });
    }

    if url.contains("drive.google.com") {
        let id = DRIVE_FILE_ID.find(url)?.as_str();
        return Some(VideoEmbed::Drive {
            file_id: id.to_string(),
            url: format!("https://drive.google.com/file/d/{id}/preview"),
        });
    }

    Some(VideoEmbed::Direct {
        url: url.to_string(),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn youtube_watch_url() {
        let embed = resolve_embed("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42").unwrap();
        assert_eq!(
            embed,
            VideoEmbed::Youtube {
                video_id: String::from("dQw4w9WgXcQ"),
                url: String::from("https://www.youtube.com/embed/dQw4w9WgXcQ?modestbranding=1&rel=0"),
            }
        );
    }

    #[test]
    fn youtube_short_link() {
        let embed = resolve_embed("https://youtu.be/dQw4w9WgXcQ?si=share").unwrap();
        assert_eq!(
            embed.url(),
            "https://www.youtube.com/embed/dQw4w9WgXcQ?modestbranding=1&rel=0"
        );
    }

    #[test]
    fn youtube_reads_only_the_v_parameter() {
        let embed =
            resolve_embed("https://www.youtube.com/watch?dev=1&feature=share&v=dQw4w9WgXcQ").unwrap();
        assert_eq!(
            embed,
            VideoEmbed::Youtube {
                video_id: String::from("dQw4w9WgXcQ"),
                url: String::from("https://www.youtube.com/embed/dQw4w9WgXcQ?modestbranding=1&rel=0"),
            }
        );
    }

    #[test]
    fn youtube_link_without_scheme() {
        let embed = resolve_embed("youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(
            embed.url(),
            "https://www.youtube.com/embed/dQw4w9WgXcQ?modestbranding=1&rel=0"
        );
    }

    #[test]
    fn youtube_without_id_is_unplayable() {
        assert_eq!(resolve_embed("https://www.youtube.com/channel"), None);
    }

    #[test]
    fn drive_share_link() {
        let embed = resolve_embed(
            "https://drive.google.com/file/d/1AbCdEfGhIjKlMnOpQrStUvWxYz012345/view?usp=sharing",
        )
        .unwrap();
        assert_eq!(
            embed.url(),
            "https://drive.google.com/file/d/1AbCdEfGhIjKlMnOpQrStUvWxYz012345/preview"
        );
    }

    #[test]
    fn drive_without_file_id() {
        assert_eq!(resolve_embed("https://drive.google.com/drive/my-drive"), None);
    }

    #[test]
    fn anything_else_is_direct() {
        let embed = resolve_embed(" https://cdn.example.com/lesson1.mp4 ").unwrap();
        assert_eq!(
            embed,
            VideoEmbed::Direct {
                url: String::from("https://cdn.example.com/lesson1.mp4")
            }
        );
    }

    #[test]
    fn hosted_stream() {
        assert_eq!(hosted_embed("pb123").url(), "https://stream.mux.com/pb123.m3u8");
    }

    #[test]
    fn empty_url() {
        assert_eq!(resolve_embed("   "), None);
    }
}
