//! # Voice transport
//!
//! Seam between the player and the voice backend. [`VoiceTransport`] joins
//! channels, a [`VoiceConnection`] plays one stream at a time and every stream
//! is driven through its [`StreamDispatcher`]. [`VoiceManager`] owns the single
//! connection of the bot and reuses it while the channel stays the same.

use anyhow::Result;
use async_trait::async_trait;
use std::{fmt, time::Duration};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use super::track::{StreamSource, VoiceTarget};
use crate::{error::UserError, sync::FreezeGuard};

/// Eventos de un stream de audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Start,
    End,
    Error(String),
}

/// Player-wide stream settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamOptions {
    pub bitrate_kbps: u32,
    /// Linear, `0.0..=1.0`.
    pub volume: f32,
    /// Times each audio packet is sent.
    pub passes: u8,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            bitrate_kbps: 128,
            volume: 1.0,
            passes: 1,
        }
    }
}

/// Control de un stream activo.
pub trait StreamDispatcher: Send + Sync {
    fn pause(&self) -> Result<()>;
    fn resume(&self) -> Result<()>;
    /// Forces the stream to end; an [`StreamEvent::End`] follows.
    fn stop(&self) -> Result<()>;
    fn set_volume(&self, volume: f32) -> Result<()>;
    fn set_bitrate(&self, kbps: u32) -> Result<()>;
    /// Time the stream has been playing, pauses excluded.
    fn stream_time(&self) -> Duration;
}

pub type StreamHandle = (Box<dyn StreamDispatcher>, UnboundedReceiver<StreamEvent>);

#[async_trait]
pub trait VoiceConnection: Send + Sync {
    fn target(&self) -> VoiceTarget;

    async fn play(&self, source: &StreamSource, options: &StreamOptions) -> Result<StreamHandle>;

    async fn disconnect(&self) -> Result<()>;
}

#[async_trait]
pub trait VoiceTransport: Send + Sync {
    async fn join(&self, target: VoiceTarget) -> Result<Box<dyn VoiceConnection>>;
}

/// Owner of the single voice connection.
pub struct VoiceManager {
    transport: Box<dyn VoiceTransport>,
    connection: Option<Box<dyn VoiceConnection>>,
    freeze_guard: FreezeGuard,
}

impl fmt::Debug for VoiceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceManager")
            .field("target", &self.connection.as_ref().map(|c| c.target()))
            .finish_non_exhaustive()
    }
}

impl VoiceManager {
    pub fn new(transport: Box<dyn VoiceTransport>, freeze_guard: FreezeGuard) -> Self {
        Self {
            transport,
            connection: None,
            freeze_guard,
        }
    }

    pub fn connection(&self) -> Option<&dyn VoiceConnection> {
        self.connection.as_deref()
    }

    /// Connects to `target`, reusing the current connection when it is bound
    /// to the same channel. Returns `true` if a new connection was made.
    pub async fn connect(&mut self, target: VoiceTarget) -> Result<bool, UserError> {
        if self
            .connection
            .as_ref()
            .is_some_and(|conn| conn.target() == target)
        {
            return Ok(false);
        }

        let guard = self.freeze_guard.clone();
        guard.watch("connect_to_voice_channel", self.reconnect(target)).await?;
        Ok(true)
    }

    async fn reconnect(&mut self, target: VoiceTarget) -> Result<(), UserError> {
        if let Some(previous) = self.connection.take() {
            info!("🔌 Cambiando de canal de voz: {} -> {}", previous.target().channel_id, target.channel_id);
            if let Err(e) = previous.disconnect().await {
                warn!("⚠️ Error al desconectar canal anterior: {:?}", e);
            }
        }

        let connection = self.transport.join(target).await.map_err(|e| {
            UserError::VoiceConnection(format!(
                "I couldn't join your voice channel <#{}> ({}).",
                target.channel_id, e
            ))
        })?;
        info!("🔊 Conectado al canal de voz {}", target.channel_id);
        self.connection = Some(connection);
        Ok(())
    }

    /// Desconecta del canal actual, si hay alguno.
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(connection) = self.connection.take() {
            connection.disconnect().await?;
            info!("👋 Desconectado del canal de voz");
        }
        Ok(())
    }
}
