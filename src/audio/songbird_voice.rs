//! Voice transport backed by songbird.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use songbird::{
    driver::Bitrate,
    input::{Input, YoutubeDl},
    tracks::TrackHandle,
    Call, Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent,
};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{
        mpsc::{self, UnboundedSender},
        Mutex,
    },
    time::Instant,
};
use tracing::{debug, error, info};

use super::{
    track::{StreamSource, VoiceTarget},
    voice::{StreamDispatcher, StreamEvent, StreamHandle, StreamOptions, VoiceConnection, VoiceTransport},
};

/// Exponent of the perceptual volume curve (≈ 6 dB per halving).
const LOG_VOLUME_EXPONENT: f32 = 1.660964;

/// Convierte volumen lineal a ganancia logarítmica.
pub fn logarithmic_gain(volume: f32) -> f32 {
    volume.clamp(0.0, 1.0).powf(LOG_VOLUME_EXPONENT)
}

pub struct SongbirdTransport {
    manager: Arc<Songbird>,
    http: reqwest::Client,
}

impl SongbirdTransport {
    pub fn new(manager: Arc<Songbird>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;
        Ok(Self { manager, http })
    }
}

#[async_trait]
impl VoiceTransport for SongbirdTransport {
    async fn join(&self, target: VoiceTarget) -> Result<Box<dyn VoiceConnection>> {
        let call = self
            .manager
            .join(target.guild_id, target.channel_id)
            .await
            .map_err(|e| anyhow!("join failed: {}", e))?;

        info!("🎤 Unido al canal de voz {} en {}", target.channel_id, target.guild_id);
        Ok(Box::new(SongbirdConnection {
            target,
            call,
            manager: self.manager.clone(),
            http: self.http.clone(),
        }))
    }
}

struct SongbirdConnection {
    target: VoiceTarget,
    call: Arc<Mutex<Call>>,
    manager: Arc<Songbird>,
    http: reqwest::Client,
}

#[async_trait]
impl VoiceConnection for SongbirdConnection {
    fn target(&self) -> VoiceTarget {
        self.target
    }

    async fn play(&self, source: &StreamSource, options: &StreamOptions) -> Result<StreamHandle> {
        let input: Input = YoutubeDl::new(self.http.clone(), source.as_str().to_string()).into();
        if options.passes > 1 {
            debug!("📦 songbird no soporta packet passes ({}), se ignora", options.passes);
        }

        let handle = {
            let mut call = self.call.lock().await;
            call.set_bitrate(Bitrate::BitsPerSecond(kbps_to_bps(options.bitrate_kbps)));
            call.play_input(input)
        };
        handle.set_volume(logarithmic_gain(options.volume))?;

        let (tx, rx) = mpsc::unbounded_channel();
        for (event, kind) in forwarded_events() {
            handle.add_event(
                Event::Track(event),
                TrackEventForwarder {
                    kind,
                    events: tx.clone(),
                },
            )?;
        }

        let dispatcher = SongbirdDispatcher {
            handle,
            call: self.call.clone(),
            clock: SyncMutex::new(PlayClock::started()),
        };
        Ok((Box::new(dispatcher), rx))
    }

    async fn disconnect(&self) -> Result<()> {
        self.manager
            .remove(self.target.guild_id)
            .await
            .map_err(|e| anyhow!("leave failed: {}", e))
    }
}

fn kbps_to_bps(kbps: u32) -> i32 {
    i32::try_from(kbps.saturating_mul(1000)).unwrap_or(i32::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Forwarded {
    Start,
    End,
    Error,
}

/// Eventos de songbird que se reenvían al player.
///
/// `Playable` marca el inicio real del track; `Play` solo se dispara al
/// salir de una pausa.
fn forwarded_events() -> [(TrackEvent, Forwarded); 3] {
    [
        (TrackEvent::Playable, Forwarded::Start),
        (TrackEvent::End, Forwarded::End),
        (TrackEvent::Error, Forwarded::Error),
    ]
}

struct TrackEventForwarder {
    kind: Forwarded,
    events: UnboundedSender<StreamEvent>,
}

#[async_trait]
impl VoiceEventHandler for TrackEventForwarder {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let event = match self.kind {
            Forwarded::Start => StreamEvent::Start,
            Forwarded::End => StreamEvent::End,
            Forwarded::Error => {
                let reason = match ctx {
                    EventContext::Track(tracks) => tracks
                        .first()
                        .map(|(state, _)| format!("{:?}", state.playing))
                        .unwrap_or_else(|| "unknown".to_string()),
                    _ => "unknown".to_string(),
                };
                error!("❌ Error de reproducción: {}", reason);
                StreamEvent::Error(reason)
            }
        };
        let _ = self.events.send(event);
        None
    }
}

/// Tiempo de reproducción sin contar pausas.
#[derive(Debug)]
struct PlayClock {
    played: Duration,
    resumed_at: Option<Instant>,
}

impl PlayClock {
    fn started() -> Self {
        Self {
            played: Duration::ZERO,
            resumed_at: Some(Instant::now()),
        }
    }

    fn pause(&mut self) {
        if let Some(at) = self.resumed_at.take() {
            self.played += at.elapsed();
        }
    }

    fn resume(&mut self) {
        self.resumed_at.get_or_insert_with(Instant::now);
    }

    fn elapsed(&self) -> Duration {
        self.played + self.resumed_at.map(|at| at.elapsed()).unwrap_or_default()
    }
}

struct SongbirdDispatcher {
    handle: TrackHandle,
    call: Arc<Mutex<Call>>,
    clock: SyncMutex<PlayClock>,
}

impl StreamDispatcher for SongbirdDispatcher {
    fn pause(&self) -> Result<()> {
        self.handle.pause()?;
        self.clock.lock().pause();
        Ok(())
    }

    fn resume(&self) -> Result<()> {
        self.handle.play()?;
        self.clock.lock().resume();
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.handle.stop()?;
        Ok(())
    }

    fn set_volume(&self, volume: f32) -> Result<()> {
        self.handle.set_volume(logarithmic_gain(volume))?;
        Ok(())
    }

    fn set_bitrate(&self, kbps: u32) -> Result<()> {
        // El bitrate vive en la llamada, no en el track
        let call = self.call.clone();
        tokio::spawn(async move {
            call.lock()
                .await
                .set_bitrate(Bitrate::BitsPerSecond(kbps_to_bps(kbps)));
        });
        Ok(())
    }

    fn stream_time(&self) -> Duration {
        self.clock.lock().elapsed()
    }
}
