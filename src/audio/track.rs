use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};
use std::{fmt, time::Duration};
use tracing::info;

use crate::error::UserError;

/// Canal de voz donde debe sonar un track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceTarget {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
}

/// Pedido de reproducción hecho por un usuario.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackOrder {
    /// URL or free-text search query.
    pub query: String,
    pub requester_id: UserId,
    pub requester_name: String,
    /// Channel the order was sent from; notifications go there.
    pub text_channel: ChannelId,
    pub message_id: MessageId,
    pub voice_target: VoiceTarget,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
    pub title: String,
    pub author: String,
    pub author_url: Option<String>,
    /// Page of the track, used in links.
    pub url: String,
    pub duration: Option<Duration>,
    /// Bitrate of the original audio, kbps.
    pub bitrate_kbps: Option<u32>,
    pub thumbnail: Option<String>,
}

/// Locator handed to the voice transport to open the audio stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSource(pub String);

impl StreamSource {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTrack {
    pub metadata: TrackMetadata,
    pub source: StreamSource,
}

/// Resuelve URLs o búsquedas a metadatos de un track.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackResolver: Send + Sync {
    /// Fails with [`UserError::TrackNotFound`] when nothing matches `query`.
    async fn resolve(&self, query: &str) -> Result<ResolvedTrack, UserError>;
}

/// Immutable track: the order that requested it plus metadata fetched once.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    order: TrackOrder,
    metadata: TrackMetadata,
    source: StreamSource,
}

impl AudioTrack {
    /// Resolves `order.query` and builds the track.
    pub async fn create(order: TrackOrder, resolver: &dyn TrackResolver) -> Result<Self, UserError> {
        let started = tokio::time::Instant::now();
        let ResolvedTrack { metadata, source } = resolver.resolve(&order.query).await?;
        info!(
            "🔍 Track resuelto: {} ({:?})",
            metadata.title,
            started.elapsed()
        );
        Ok(Self::from_parts(order, metadata, source))
    }

    pub fn from_parts(order: TrackOrder, metadata: TrackMetadata, source: StreamSource) -> Self {
        Self {
            order,
            metadata,
            source,
        }
    }

    pub fn order(&self) -> &TrackOrder {
        &self.order
    }

    pub fn metadata(&self) -> &TrackMetadata {
        &self.metadata
    }

    pub fn source(&self) -> &StreamSource {
        &self.source
    }

    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    pub fn duration(&self) -> Option<Duration> {
        self.metadata.duration
    }

    pub fn voice_target(&self) -> VoiceTarget {
        self.order.voice_target
    }

    /// One-line markdown: `**[author](channel)** - [**"title"**](url)`.
    pub fn to_md(&self) -> String {
        let author = match &self.metadata.author_url {
            Some(url) => format!("**[{}]({})**", self.metadata.author, url),
            None => format!("**{}**", self.metadata.author),
        };
        format!(
            "{} - [**\"{}\"**]({})",
            author, self.metadata.title, self.metadata.url
        )
    }
}

impl fmt::Display for AudioTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.metadata.author, self.metadata.title)
    }
}
