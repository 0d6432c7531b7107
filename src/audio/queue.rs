//! # Audio queue
//!
//! FIFO of ordered tracks with at most one of them streaming. The head of the
//! queue is the streaming (or about to stream) track; it is removed only when
//! its stream ends, after which the next head starts automatically.
//!
//! Mutations (`enqueue`, `skip`, advancing after a stream ends) are serialized
//! by an [`AsyncMutex`]. User requests fail fast with `QueueBusy` while it is
//! held, internal advancing waits for it.
//!
//! Lifecycle notifications are published as [`QueueEvent`]s on the channel
//! returned by [`AudioQueue::new`].

use parking_lot::Mutex;
use std::{collections::VecDeque, sync::Arc};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use super::{
    player::{AudioPlayer, EndReason, PlaybackEvent},
    track::{AudioTrack, TrackOrder, TrackResolver},
};
use crate::{
    error::{CommandResult, UserError},
    sync::{AsyncMutex, ExclusiveGuard, FreezeGuard},
};

#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    /// Enqueued behind another track; `index` is its position (head is `0`).
    TrackScheduled { track: Arc<AudioTrack>, index: usize },
    TrackStart(Arc<AudioTrack>),
    /// Terminó sin interrupciones.
    TrackEnd(Arc<AudioTrack>),
    /// Terminado con skip.
    TrackInterrupt(Arc<AudioTrack>),
    /// A new voice connection was established for this track.
    ConnectedToVoiceChannel(Arc<AudioTrack>),
    /// The track could not be streamed; the queue moved on.
    TrackFailed { track: Arc<AudioTrack>, error: UserError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Idle,
    Streaming,
    Paused,
}

pub struct AudioQueue {
    tracks: Mutex<VecDeque<Arc<AudioTrack>>>,
    mutex: AsyncMutex,
    player: Arc<AudioPlayer>,
    resolver: Arc<dyn TrackResolver>,
    max_size: usize,
    events: UnboundedSender<QueueEvent>,
    freeze_guard: FreezeGuard,
}

impl AudioQueue {
    pub fn new(
        player: Arc<AudioPlayer>,
        resolver: Arc<dyn TrackResolver>,
        max_size: usize,
        freeze_guard: FreezeGuard,
    ) -> (Arc<Self>, UnboundedReceiver<QueueEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let queue = Arc::new(Self {
            tracks: Mutex::new(VecDeque::with_capacity(max_size)),
            mutex: AsyncMutex::new(),
            player,
            resolver,
            max_size,
            events,
            freeze_guard,
        });
        (queue, rx)
    }

    /// Resolves `order` and streams it right away if the queue is empty,
    /// otherwise appends it and emits [`QueueEvent::TrackScheduled`].
    pub async fn enqueue(self: &Arc<Self>, order: TrackOrder) -> Result<(), UserError> {
        let _guard = self.try_lock()?;
        self.freeze_guard
            .watch("enqueue", self.enqueue_locked(order))
            .await
    }

    async fn enqueue_locked(self: &Arc<Self>, order: TrackOrder) -> Result<(), UserError> {
        let pending = {
            let tracks = self.tracks.lock();
            tracks.len() - self.finished_heads(&tracks)
        };
        if pending >= self.max_size {
            return Err(UserError::QueueOverflow(format!(
                "Audio queue is full, you cannot enqueue more than `{}` tracks.",
                self.max_size
            )));
        }

        let track = Arc::new(AudioTrack::create(order, self.resolver.as_ref()).await?);

        let (index, finished) = {
            let mut tracks = self.tracks.lock();
            let finished = self.finished_heads(&tracks);
            tracks.push_back(track.clone());
            (tracks.len() - 1 - finished, finished)
        };

        if index > 0 {
            info!("📝 Agregado a la cola (#{}): {}", index, track);
            self.emit(QueueEvent::TrackScheduled { track, index });
        } else if finished == 0 {
            self.stream_head().await;
        } else {
            // El watcher del track terminado lo inicia al avanzar
            debug!("📝 {} sigue al track que acaba de terminar", track);
        }
        Ok(())
    }

    /// `1` when the head already finished streaming and its watcher has not
    /// removed it yet. Caller holds the queue mutex and the `tracks` lock.
    fn finished_heads(&self, tracks: &VecDeque<Arc<AudioTrack>>) -> usize {
        usize::from(!tracks.is_empty() && !self.player.is_streaming())
    }

    /// Streams the head; tracks that fail to start are reported and dropped
    /// until one starts or the queue is empty. Caller holds the mutex.
    async fn stream_head(self: &Arc<Self>) {
        loop {
            let Some(track) = self.current_track() else {
                debug!("📭 Cola vacía");
                return;
            };

            match self.player.stream(&track).await {
                Ok(started) => {
                    if started.new_connection {
                        self.emit(QueueEvent::ConnectedToVoiceChannel(track.clone()));
                    }
                    self.watch_stream(track, started.events);
                    return;
                }
                Err(error) => {
                    warn!("❌ No se pudo reproducir {}: {}", track, error);
                    self.tracks.lock().pop_front();
                    self.emit(QueueEvent::TrackFailed { track, error });
                }
            }
        }
    }

    /// Translates playback events of `track`, then advances the queue.
    fn watch_stream(self: &Arc<Self>, track: Arc<AudioTrack>, mut events: UnboundedReceiver<PlaybackEvent>) {
        let queue = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    PlaybackEvent::Started => {
                        queue.emit(QueueEvent::TrackStart(track.clone()));
                    }
                    PlaybackEvent::Ended(EndReason::Finished) => {
                        queue.emit(QueueEvent::TrackEnd(track.clone()));
                        break;
                    }
                    PlaybackEvent::Ended(EndReason::Interrupted) => {
                        queue.emit(QueueEvent::TrackInterrupt(track.clone()));
                        break;
                    }
                    PlaybackEvent::Failed(reason) => {
                        let error = UserError::Streaming(format!(
                            "Streaming of {} failed ({}).",
                            track.to_md(),
                            reason
                        ));
                        queue.emit(QueueEvent::TrackFailed {
                            track: track.clone(),
                            error,
                        });
                        break;
                    }
                }
            }

            let _guard = queue.mutex.acquire().await;
            {
                let mut tracks = queue.tracks.lock();
                if tracks.front().is_some_and(|head| Arc::ptr_eq(head, &track)) {
                    tracks.pop_front();
                } else {
                    warn!("⚠️ La cabeza de la cola no es el track terminado: {}", track);
                }
            }
            queue.stream_head().await;
        });
    }

    /// Forces the current stream to end; the next track starts afterwards.
    pub fn skip(&self) -> CommandResult<Arc<AudioTrack>> {
        let _guard = self.try_lock()?;
        let track = self.ensure_streaming()?;
        if !self.player.end_streaming() {
            return Err(UserError::NotStreaming(format!(
                "Track {} is already being skipped.",
                track.to_md()
            ))
            .into());
        }
        info!("⏭️ Saltando: {}", track);
        Ok(track)
    }

    pub fn pause(&self) -> CommandResult<Arc<AudioTrack>> {
        let track = self.ensure_streaming()?;
        if self.player.is_paused() {
            return Err(UserError::AlreadyPaused(format!(
                "Track {} is already on pause.",
                track.to_md()
            ))
            .into());
        }
        self.player.pause()?;
        Ok(track)
    }

    pub fn resume(&self) -> CommandResult<Arc<AudioTrack>> {
        let track = self.ensure_streaming()?;
        if !self.player.is_paused() {
            return Err(UserError::NotPaused(format!("Track {} was not paused.", track.to_md())).into());
        }
        self.player.resume()?;
        Ok(track)
    }

    pub fn state(&self) -> QueueState {
        if !self.player.is_streaming() {
            QueueState::Idle
        } else if self.player.is_paused() {
            QueueState::Paused
        } else {
            QueueState::Streaming
        }
    }

    /// Head of the queue.
    pub fn current_track(&self) -> Option<Arc<AudioTrack>> {
        self.tracks.lock().front().cloned()
    }

    /// Snapshot, head first.
    pub fn tracks(&self) -> Vec<Arc<AudioTrack>> {
        self.tracks.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tracks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.lock().is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn player(&self) -> &Arc<AudioPlayer> {
        &self.player
    }

    fn try_lock(&self) -> Result<ExclusiveGuard, UserError> {
        self.mutex.try_acquire().ok_or_else(|| {
            UserError::QueueBusy(
                "Audio queue is processing another request, please try again later.".to_string(),
            )
        })
    }

    fn ensure_streaming(&self) -> Result<Arc<AudioTrack>, UserError> {
        let no_audio = || UserError::NotStreaming("No audio track is currently playing.".to_string());
        if !self.player.is_streaming() {
            return Err(no_audio());
        }
        self.current_track().ok_or_else(no_audio)
    }

    fn emit(&self, event: QueueEvent) {
        if self.events.send(event).is_err() {
            debug!("Nadie escucha los eventos de la cola");
        }
    }
}
