use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
    audio::track::{ResolvedTrack, StreamSource, TrackMetadata, TrackResolver},
    error::UserError,
};

/// Resuelve tracks usando yt-dlp (URLs directas o búsquedas en YouTube).
#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    binary: String,
    socket_timeout: Duration,
}

impl Default for YtDlpResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl YtDlpResolver {
    pub fn new() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            socket_timeout: Duration::from_secs(15),
        }
    }

    /// Verifica que yt-dlp y ffmpeg estén disponibles
    pub async fn verify_dependencies(&self) -> Result<()> {
        match tokio::process::Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
        {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout);
                info!("✅ yt-dlp versión: {}", version.trim());
            }
            _ => {
                error!("❌ yt-dlp no encontrado. Instala con: pip install yt-dlp");
                anyhow::bail!("yt-dlp no disponible");
            }
        }

        match tokio::process::Command::new("ffmpeg")
            .arg("-version")
            .output()
            .await
        {
            Ok(output) if output.status.success() => info!("✅ ffmpeg disponible"),
            _ => {
                error!("❌ ffmpeg no encontrado. Instala con: sudo apt install ffmpeg");
                anyhow::bail!("ffmpeg no disponible");
            }
        }

        Ok(())
    }

    /// URLs are passed through, anything else becomes a single-result search.
    pub fn target_for(query: &str) -> String {
        match Url::parse(query) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => query.to_string(),
            _ => format!("ytsearch1:{}", query),
        }
    }

    async fn fetch_info(&self, query: &str) -> Result<ResolvedTrack> {
        let mut cmd = tokio::process::Command::new(&self.binary);
        cmd.args([
            "--dump-json",
            "--no-playlist",
            "--skip-download",
            "--quiet",
            "--no-warnings",
            "--format",
            "bestaudio/best",
            "--socket-timeout",
        ])
        .arg(self.socket_timeout.as_secs().to_string());

        if let Some(cookies) = find_cookies_file().await {
            cmd.arg("--cookies").arg(cookies);
        }
        cmd.arg(Self::target_for(query));

        let output = cmd.output().await.context("yt-dlp process error")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp failed: {}", stderr.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout
            .lines()
            .find(|line| !line.trim().is_empty())
            .context("no results")?;
        parse_info(line)
    }
}

#[async_trait]
impl TrackResolver for YtDlpResolver {
    async fn resolve(&self, query: &str) -> Result<ResolvedTrack, UserError> {
        debug!("🔍 Resolviendo con yt-dlp: {}", query);
        self.fetch_info(query).await.map_err(|e| {
            warn!("⚠️ No se pudo resolver \"{}\": {:#}", query, e);
            UserError::TrackNotFound(format!("Failed to fetch info for \"{}\" ({:#}).", query, e))
        })
    }
}

/// Campos relevantes de la salida `--dump-json`.
#[derive(Debug, Deserialize)]
struct VideoInfo {
    title: String,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    uploader_url: Option<String>,
    #[serde(default)]
    channel_url: Option<String>,
    webpage_url: String,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    abr: Option<f64>,
    #[serde(default)]
    thumbnail: Option<String>,
}

fn parse_info(json: &str) -> Result<ResolvedTrack> {
    let info: VideoInfo = serde_json::from_str(json).context("invalid yt-dlp output")?;

    let metadata = TrackMetadata {
        title: info.title,
        author: info
            .uploader
            .or(info.channel)
            .unwrap_or_else(|| "Unknown".to_string()),
        author_url: info.uploader_url.or(info.channel_url),
        url: info.webpage_url.clone(),
        duration: info
            .duration
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f64),
        bitrate_kbps: info
            .abr
            .filter(|abr| abr.is_finite() && *abr > 0.0)
            .map(|abr| abr.round() as u32),
        thumbnail: info.thumbnail,
    };

    Ok(ResolvedTrack {
        metadata,
        source: StreamSource(info.webpage_url),
    })
}

/// Busca archivo de cookies disponible
async fn find_cookies_file() -> Option<String> {
    let candidates = [
        format!(
            "{}/.config/yt-dlp/cookies.txt",
            std::env::var("HOME").unwrap_or_default()
        ),
        "./cookies.txt".to_string(),
    ];

    for path in candidates {
        if tokio::fs::metadata(&path).await.is_ok() {
            debug!("🍪 Cookies encontradas en: {}", path);
            return Some(path);
        }
    }
    None
}
