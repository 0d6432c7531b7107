use anyhow::Result;
use parking_lot::{Mutex, RwLock};
use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info, warn};

use super::{
    track::AudioTrack,
    voice::{StreamDispatcher, StreamEvent, StreamOptions, VoiceManager},
};
use crate::error::UserError;

/// Motivo de fin de un stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// El track terminó solo.
    Finished,
    /// Terminado a la fuerza (skip).
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    Started,
    Ended(EndReason),
    Failed(String),
}

/// Result of [`AudioPlayer::stream`].
#[derive(Debug)]
pub struct StreamStarted {
    /// `true` when the voice connection had to be (re)established.
    pub new_connection: bool,
    /// Start followed by exactly one `Ended` or `Failed`.
    pub events: UnboundedReceiver<PlaybackEvent>,
}

struct ActiveStream {
    id: u64,
    dispatcher: Box<dyn StreamDispatcher>,
    paused: bool,
    interrupted: Arc<AtomicBool>,
}

/// Single-track player. Owns the voice connection and the stream settings.
pub struct AudioPlayer {
    voice: tokio::sync::Mutex<VoiceManager>,
    options: RwLock<StreamOptions>,
    current: Arc<Mutex<Option<ActiveStream>>>,
    next_stream_id: AtomicU64,
}

impl AudioPlayer {
    pub fn new(voice: VoiceManager, options: StreamOptions) -> Self {
        Self {
            voice: tokio::sync::Mutex::new(voice),
            options: RwLock::new(options),
            current: Arc::new(Mutex::new(None)),
            next_stream_id: AtomicU64::new(1),
        }
    }

    /// Streams `track` into its voice channel, ending the current stream first.
    pub async fn stream(&self, track: &AudioTrack) -> Result<StreamStarted, UserError> {
        if self.is_streaming() {
            self.end_streaming();
        }
        let options = *self.options.read();

        let mut voice = self.voice.lock().await;
        let new_connection = voice.connect(track.voice_target()).await?;
        let connection = voice.connection().ok_or_else(|| {
            UserError::VoiceConnection("Voice connection was lost.".to_string())
        })?;
        let (dispatcher, mut stream_events) = connection
            .play(track.source(), &options)
            .await
            .map_err(|e| {
                UserError::Streaming(format!("Failed to stream {} ({}).", track.to_md(), e))
            })?;
        drop(voice);

        let id = self.next_stream_id.fetch_add(1, Ordering::Relaxed);
        let interrupted = Arc::new(AtomicBool::new(false));
        *self.current.lock() = Some(ActiveStream {
            id,
            dispatcher,
            paused: false,
            interrupted: interrupted.clone(),
        });
        info!("🎵 Reproduciendo: {}", track);

        let (tx, rx) = mpsc::unbounded_channel();
        let current = self.current.clone();
        tokio::spawn(async move {
            let end_reason = || {
                if interrupted.load(Ordering::SeqCst) {
                    EndReason::Interrupted
                } else {
                    EndReason::Finished
                }
            };
            let finish = |event: PlaybackEvent| {
                // Solo limpiar si sigue siendo este stream
                let mut current = current.lock();
                if current.as_ref().is_some_and(|s| s.id == id) {
                    *current = None;
                }
                drop(current);
                let _ = tx.send(event);
            };

            while let Some(event) = stream_events.recv().await {
                match event {
                    StreamEvent::Start => {
                        let _ = tx.send(PlaybackEvent::Started);
                    }
                    StreamEvent::End => {
                        let reason = end_reason();
                        debug!("⏹️ Stream #{} terminado: {:?}", id, reason);
                        finish(PlaybackEvent::Ended(reason));
                        return;
                    }
                    StreamEvent::Error(e) => {
                        warn!("❌ Error en stream #{}: {}", id, e);
                        finish(PlaybackEvent::Failed(e));
                        return;
                    }
                }
            }
            // El transporte cerró el canal sin evento final
            finish(PlaybackEvent::Ended(end_reason()));
        });

        Ok(StreamStarted {
            new_connection,
            events: rx,
        })
    }

    pub fn is_streaming(&self) -> bool {
        self.current.lock().is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.current.lock().as_ref().is_some_and(|s| s.paused)
    }

    /// Forces the current stream to end, tagged as interrupted. Returns
    /// `false` when there is no stream or its end was already requested.
    pub fn end_streaming(&self) -> bool {
        let current = self.current.lock();
        let Some(stream) = current.as_ref() else {
            return false;
        };
        if stream.interrupted.swap(true, Ordering::SeqCst) {
            return false;
        }
        if let Err(e) = stream.dispatcher.stop() {
            warn!("⚠️ Error al detener stream #{}: {:?}", stream.id, e);
        }
        true
    }

    /// Pausa el stream actual. No-op si no hay ninguno.
    pub fn pause(&self) -> Result<()> {
        if let Some(stream) = self.current.lock().as_mut() {
            stream.dispatcher.pause()?;
            stream.paused = true;
            info!("⏸️ Reproducción pausada");
        }
        Ok(())
    }

    /// Reanuda el stream actual. No-op si no hay ninguno.
    pub fn resume(&self) -> Result<()> {
        if let Some(stream) = self.current.lock().as_mut() {
            stream.dispatcher.resume()?;
            stream.paused = false;
            info!("▶️ Reproducción reanudada");
        }
        Ok(())
    }

    /// Time the current track has been playing, pauses excluded.
    pub fn streaming_time(&self) -> Option<Duration> {
        self.current
            .lock()
            .as_ref()
            .map(|s| s.dispatcher.stream_time())
    }

    pub fn options(&self) -> StreamOptions {
        *self.options.read()
    }

    pub fn volume(&self) -> f32 {
        self.options.read().volume
    }

    /// Linear volume `0.0..=1.0`, applied live.
    pub fn set_volume(&self, volume: f32) -> Result<()> {
        let volume = volume.clamp(0.0, 1.0);
        self.options.write().volume = volume;
        if let Some(stream) = self.current.lock().as_ref() {
            stream.dispatcher.set_volume(volume)?;
        }
        info!("🔊 Volumen ajustado a {}%", (volume * 100.0).round());
        Ok(())
    }

    pub fn bitrate(&self) -> u32 {
        self.options.read().bitrate_kbps
    }

    /// Bitrate in kbps, applied live.
    pub fn set_bitrate(&self, kbps: u32) -> Result<()> {
        self.options.write().bitrate_kbps = kbps;
        if let Some(stream) = self.current.lock().as_ref() {
            stream.dispatcher.set_bitrate(kbps)?;
        }
        info!("📶 Bitrate ajustado a {} kbps", kbps);
        Ok(())
    }

    pub fn passes(&self) -> u8 {
        self.options.read().passes
    }

    /// Se aplica a partir del siguiente track.
    pub fn set_passes(&self, passes: u8) {
        self.options.write().passes = passes;
        info!("📦 Packet passes ajustado a {}", passes);
    }

    /// Ends the current stream and leaves the voice channel.
    pub async fn shutdown(&self) -> Result<()> {
        self.end_streaming();
        self.voice.lock().await.disconnect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{
        track::{fixtures, AudioTrack},
        voice::{StreamHandle, VoiceConnection, VoiceTransport},
    };
    use crate::sync::FreezeGuard;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc::UnboundedSender;

    /// Dispatcher whose `stop` emits the end event like a real backend.
    struct EchoDispatcher {
        events: UnboundedSender<StreamEvent>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl StreamDispatcher for EchoDispatcher {
        fn pause(&self) -> Result<()> {
            self.calls.lock().push("pause".into());
            Ok(())
        }
        fn resume(&self) -> Result<()> {
            self.calls.lock().push("resume".into());
            Ok(())
        }
        fn stop(&self) -> Result<()> {
            self.calls.lock().push("stop".into());
            let _ = self.events.send(StreamEvent::End);
            Ok(())
        }
        fn set_volume(&self, volume: f32) -> Result<()> {
            self.calls.lock().push(format!("volume {}", volume));
            Ok(())
        }
        fn set_bitrate(&self, kbps: u32) -> Result<()> {
            self.calls.lock().push(format!("bitrate {}", kbps));
            Ok(())
        }
        fn stream_time(&self) -> Duration {
            Duration::from_secs(42)
        }
    }

    #[derive(Clone, Default)]
    struct EchoTransport {
        calls: Arc<Mutex<Vec<String>>>,
        senders: Arc<Mutex<Vec<UnboundedSender<StreamEvent>>>>,
    }

    struct EchoConnection(crate::audio::track::VoiceTarget, EchoTransport);

    #[async_trait]
    impl VoiceConnection for EchoConnection {
        fn target(&self) -> crate::audio::track::VoiceTarget {
            self.0
        }
        async fn play(&self, _: &crate::audio::track::StreamSource, _: &StreamOptions) -> Result<StreamHandle> {
            let (tx, rx) = mpsc::unbounded_channel();
            self.1.senders.lock().push(tx.clone());
            let _ = tx.send(StreamEvent::Start);
            Ok((
                Box::new(EchoDispatcher {
                    events: tx,
                    calls: self.1.calls.clone(),
                }),
                rx,
            ))
        }
        async fn disconnect(&self) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl VoiceTransport for EchoTransport {
        async fn join(&self, target: crate::audio::track::VoiceTarget) -> Result<Box<dyn VoiceConnection>> {
            Ok(Box::new(EchoConnection(target, self.clone())))
        }
    }

    fn player(transport: &EchoTransport) -> AudioPlayer {
        let guard = FreezeGuard::with_hook(Duration::from_secs(30), |_| {});
        AudioPlayer::new(
            VoiceManager::new(Box::new(transport.clone()), guard),
            StreamOptions::default(),
        )
    }

    fn track(title: &str) -> AudioTrack {
        let resolved = fixtures::resolved(title);
        AudioTrack::from_parts(fixtures::order(title), resolved.metadata, resolved.source)
    }

    #[tokio::test]
    async fn test_natural_end_is_finished() {
        let transport = EchoTransport::default();
        let player = player(&transport);

        let mut started = player.stream(&track("a")).await.unwrap();
        assert!(started.new_connection);
        assert!(player.is_streaming());
        assert_eq!(started.events.recv().await, Some(PlaybackEvent::Started));

        let _ = transport.senders.lock()[0].send(StreamEvent::End);
        assert_eq!(
            started.events.recv().await,
            Some(PlaybackEvent::Ended(EndReason::Finished))
        );
        assert!(!player.is_streaming());
    }

    #[tokio::test]
    async fn test_forced_end_is_interrupted() {
        let transport = EchoTransport::default();
        let player = player(&transport);

        let mut started = player.stream(&track("a")).await.unwrap();
        player.end_streaming();

        assert_eq!(started.events.recv().await, Some(PlaybackEvent::Started));
        assert_eq!(
            started.events.recv().await,
            Some(PlaybackEvent::Ended(EndReason::Interrupted))
        );
    }

    #[tokio::test]
    async fn test_end_streaming_stops_once() {
        let transport = EchoTransport::default();
        let player = player(&transport);

        assert!(!player.end_streaming());
        let _started = player.stream(&track("a")).await.unwrap();
        assert!(player.end_streaming());
        assert!(!player.end_streaming());
        assert_eq!(*transport.calls.lock(), vec!["stop"]);
    }

    #[tokio::test]
    async fn test_pause_resume_and_live_settings() {
        let transport = EchoTransport::default();
        let player = player(&transport);

        let _started = player.stream(&track("a")).await.unwrap();
        player.pause().unwrap();
        assert!(player.is_paused());
        player.resume().unwrap();
        assert!(!player.is_paused());

        player.set_volume(0.5).unwrap();
        player.set_bitrate(64).unwrap();
        player.set_passes(3);

        assert_eq!(
            *transport.calls.lock(),
            vec!["pause", "resume", "volume 0.5", "bitrate 64"]
        );
        assert_eq!(
            player.options(),
            StreamOptions {
                bitrate_kbps: 64,
                volume: 0.5,
                passes: 3
            }
        );
        assert_eq!(player.streaming_time(), Some(Duration::from_secs(42)));
    }

    #[tokio::test]
    async fn test_second_stream_reuses_connection() {
        let transport = EchoTransport::default();
        let player = player(&transport);

        let first = player.stream(&track("a")).await.unwrap();
        let second = player.stream(&track("b")).await.unwrap();
        assert!(first.new_connection);
        assert!(!second.new_connection);
    }
}
