//! Chat notifications for queue events.

use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::{
    audio::{AudioPlayer, QueueEvent},
    cmd::ChatTransport,
    ui::embeds::{self, EmbedReply},
};

/// Envía un embed por cada evento de la cola al canal donde se pidió el track.
pub struct QueueNotifier {
    transport: Arc<dyn ChatTransport>,
    player: Arc<AudioPlayer>,
}

impl QueueNotifier {
    pub fn new(transport: Arc<dyn ChatTransport>, player: Arc<AudioPlayer>) -> Self {
        Self { transport, player }
    }

    /// Consumes events until the queue is dropped.
    pub async fn run(self, mut events: UnboundedReceiver<QueueEvent>) {
        while let Some(event) = events.recv().await {
            self.notify(event).await;
        }
        debug!("📪 Canal de eventos de la cola cerrado");
    }

    pub async fn notify(&self, event: QueueEvent) {
        let (track, embed) = match event {
            QueueEvent::TrackScheduled { track, index } => {
                let embed = embeds::track_scheduled(&track, index);
                (track, embed)
            }
            QueueEvent::TrackStart(track) => {
                info!("▶️ Reproduciendo: {}", track);
                let embed = embeds::now_playing(&track, self.player.bitrate());
                (track, embed)
            }
            QueueEvent::TrackEnd(track) => {
                info!("🏁 Terminó: {}", track);
                let embed = embeds::track_finished(&track);
                (track, embed)
            }
            QueueEvent::TrackInterrupt(track) => {
                let embed = embeds::track_skipped(&track);
                (track, embed)
            }
            QueueEvent::ConnectedToVoiceChannel(track) => {
                let embed = embeds::connected_to_voice(&track);
                (track, embed)
            }
            QueueEvent::TrackFailed { track, error } => {
                warn!("❌ Track fallido {}: {}", track, error);
                let embed = embeds::track_failed(&track, &error);
                (track, embed)
            }
        };

        self.send(track.order().text_channel, embed).await;
    }

    async fn send(&self, channel: serenity::model::id::ChannelId, embed: EmbedReply) {
        if let Err(e) = self.transport.send(channel, embed.into()).await {
            warn!("⚠️ No se pudo enviar la notificación a {}: {:?}", channel, e);
        }
    }
}
