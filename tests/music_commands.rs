//! End-to-end: chat messages through the dispatcher into the music queue.

use async_trait::async_trait;
use parking_lot::Mutex;
use pony_bot::{
    audio::{
        track::{ResolvedTrack, StreamSource, TrackMetadata},
        voice::{
            StreamDispatcher, StreamEvent, StreamHandle, StreamOptions, VoiceConnection,
            VoiceTransport,
        },
        AudioPlayer, AudioQueue, QueueState, TrackResolver, VoiceManager, VoiceTarget,
    },
    bot::{commands::build_registry, events::QueueNotifier},
    cmd::{ChatTransport, CommandMessage, Dispatcher, HandlingOutcome},
    error::UserError,
    sync::FreezeGuard,
    ui::embeds::Reply,
};
use pretty_assertions::assert_eq;
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::sync::mpsc::{self, UnboundedSender};

const TEXT_CHANNEL: u64 = 100;
const VOICE_CHANNEL: u64 = 200;

/// Resolves any query to a track titled after it; `missing` is not found.
struct TitleResolver;

#[async_trait]
impl TrackResolver for TitleResolver {
    async fn resolve(&self, query: &str) -> Result<ResolvedTrack, UserError> {
        if query == "missing" {
            return Err(UserError::TrackNotFound(format!("Nothing found for \"{}\".", query)));
        }
        Ok(ResolvedTrack {
            metadata: TrackMetadata {
                title: query.to_string(),
                author: "Pinkie".into(),
                author_url: None,
                url: format!("https://youtu.be/{}", query.replace(' ', "_")),
                duration: Some(Duration::from_secs(180)),
                bitrate_kbps: Some(128),
                thumbnail: None,
            },
            source: StreamSource(query.to_string()),
        })
    }
}

#[derive(Clone, Default)]
struct FakeVoice {
    streams: Arc<Mutex<Vec<(String, UnboundedSender<StreamEvent>)>>>,
    paused: Arc<Mutex<bool>>,
    volume: Arc<Mutex<f32>>,
}

impl FakeVoice {
    fn streamed(&self) -> Vec<String> {
        self.streams.lock().iter().map(|(s, _)| s.clone()).collect()
    }

    fn finish_latest(&self) {
        if let Some((_, tx)) = self.streams.lock().last() {
            let _ = tx.send(StreamEvent::End);
        }
    }
}

struct FakeDispatcher {
    events: UnboundedSender<StreamEvent>,
    voice: FakeVoice,
}

impl StreamDispatcher for FakeDispatcher {
    fn pause(&self) -> anyhow::Result<()> {
        *self.voice.paused.lock() = true;
        Ok(())
    }

    fn resume(&self) -> anyhow::Result<()> {
        *self.voice.paused.lock() = false;
        Ok(())
    }

    fn stop(&self) -> anyhow::Result<()> {
        let _ = self.events.send(StreamEvent::End);
        Ok(())
    }

    fn set_volume(&self, volume: f32) -> anyhow::Result<()> {
        *self.voice.volume.lock() = volume;
        Ok(())
    }

    fn set_bitrate(&self, _: u32) -> anyhow::Result<()> {
        Ok(())
    }

    fn stream_time(&self) -> Duration {
        Duration::from_secs(42)
    }
}

struct FakeConnection {
    target: VoiceTarget,
    voice: FakeVoice,
}

#[async_trait]
impl VoiceConnection for FakeConnection {
    fn target(&self) -> VoiceTarget {
        self.target
    }

    async fn play(&self, source: &StreamSource, _: &StreamOptions) -> anyhow::Result<StreamHandle> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(StreamEvent::Start);
        self.voice
            .streams
            .lock()
            .push((source.as_str().to_string(), tx.clone()));
        Ok((
            Box::new(FakeDispatcher {
                events: tx,
                voice: self.voice.clone(),
            }),
            rx,
        ))
    }

    async fn disconnect(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl VoiceTransport for FakeVoice {
    async fn join(&self, target: VoiceTarget) -> anyhow::Result<Box<dyn VoiceConnection>> {
        Ok(Box::new(FakeConnection {
            target,
            voice: self.clone(),
        }))
    }
}

#[derive(Default)]
struct FakeChat {
    sent: Mutex<Vec<Reply>>,
}

impl FakeChat {
    fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .map(|reply| match reply {
                Reply::Text(text) => text.clone(),
                Reply::Embed(embed) => format!("{} | {}", embed.title, embed.description),
            })
            .collect()
    }

    fn last(&self) -> String {
        self.texts().pop().unwrap_or_default()
    }

    fn clear(&self) {
        self.sent.lock().clear();
    }
}

#[async_trait]
impl ChatTransport for FakeChat {
    async fn send(&self, _channel: ChannelId, reply: Reply) -> anyhow::Result<()> {
        self.sent.lock().push(reply);
        Ok(())
    }

    async fn reply(&self, _to: &CommandMessage, reply: Reply) -> anyhow::Result<()> {
        self.sent.lock().push(reply);
        Ok(())
    }
}

struct Harness {
    dispatcher: Dispatcher,
    queue: Arc<AudioQueue>,
    voice: FakeVoice,
    chat: Arc<FakeChat>,
    next_id: AtomicU64,
}

impl Harness {
    fn new(max_queue_size: usize) -> Self {
        let guard = FreezeGuard::with_hook(Duration::from_secs(30), |_| {});
        let voice = FakeVoice::default();
        let player = Arc::new(AudioPlayer::new(
            VoiceManager::new(Box::new(voice.clone()), guard.clone()),
            StreamOptions::default(),
        ));
        let (queue, events) = AudioQueue::new(
            player.clone(),
            Arc::new(TitleResolver),
            max_queue_size,
            guard.clone(),
        );
        let chat = Arc::new(FakeChat::default());
        tokio::spawn(QueueNotifier::new(chat.clone(), player).run(events));

        let registry = Arc::new(build_registry(queue.clone()).unwrap());
        Self {
            dispatcher: Dispatcher::new(registry, "!", false, guard),
            queue,
            voice,
            chat,
            next_id: AtomicU64::new(1),
        }
    }

    /// Sends `content` as user `author`, standing in the voice channel.
    async fn say(&self, author: u64, content: &str) -> HandlingOutcome {
        self.send(author, content, Some(ChannelId::new(VOICE_CHANNEL))).await
    }

    async fn send(&self, author: u64, content: &str, voice: Option<ChannelId>) -> HandlingOutcome {
        let msg = CommandMessage {
            id: MessageId::new(self.next_id.fetch_add(1, Ordering::Relaxed)),
            channel_id: ChannelId::new(TEXT_CHANNEL),
            guild_id: Some(GuildId::new(1)),
            author_id: UserId::new(author),
            author_name: format!("pony{}", author),
            author_is_bot: false,
            content: content.to_string(),
            roles: Vec::new(),
            voice_channel: voice,
        };
        let outcome = self.dispatcher.dispatch(&msg, self.chat.as_ref()).await;
        settle().await;
        outcome
    }
}

async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_music_requires_voice_channel() {
    let h = Harness::new(20);

    assert_eq!(
        h.send(1, "!music winter wrap up", None).await,
        HandlingOutcome::UserError
    );
    assert_eq!(
        h.chat.last(),
        "Not in a voice channel error. | You need to be in a voice channel before playing the music."
    );
    assert!(h.queue.is_empty());
}

#[tokio::test]
async fn test_enqueue_pause_resume_skip() {
    let h = Harness::new(20);

    assert_eq!(h.say(1, "!music winter wrap up").await, HandlingOutcome::Success);
    assert_eq!(h.say(2, "!m \"smile song\"").await, HandlingOutcome::Success);
    assert_eq!(h.queue.state(), QueueState::Streaming);
    assert_eq!(h.voice.streamed(), vec!["winter wrap up"]);

    let texts = h.chat.texts();
    assert!(texts.iter().any(|t| t.contains("Connected to voice channel <#200>.")));
    assert!(texts.iter().any(|t| t.contains("was scheduled to be `#1` in the queue.")));
    h.chat.clear();

    assert_eq!(h.say(3, "!pause").await, HandlingOutcome::Success);
    assert!(h.chat.last().ends_with("was set on pause."));
    assert!(*h.voice.paused.lock());
    assert_eq!(h.queue.state(), QueueState::Paused);

    assert_eq!(h.say(3, "!p").await, HandlingOutcome::UserError);
    assert!(h.chat.last().starts_with("Audio is already paused error."));

    assert_eq!(h.say(3, "!resume").await, HandlingOutcome::Success);
    assert!(h.chat.last().ends_with("was resumed."));
    assert_eq!(h.say(3, "!r").await, HandlingOutcome::UserError);
    assert!(h.chat.last().ends_with("was not paused."));

    assert_eq!(h.say(3, "!skip").await, HandlingOutcome::Success);
    assert_eq!(h.voice.streamed(), vec!["winter wrap up", "smile song"]);
    assert!(h.chat.texts().iter().any(|t| t.contains("was skipped.")));

    h.voice.finish_latest();
    settle().await;
    assert_eq!(h.queue.state(), QueueState::Idle);
    assert!(h.queue.is_empty());
    assert!(h.chat.last().ends_with("has finished."));

    assert_eq!(h.say(3, "!s").await, HandlingOutcome::UserError);
    assert_eq!(
        h.chat.last(),
        "No audio is streaming error. | No audio track is currently playing."
    );
}

#[tokio::test]
async fn test_music_cooldown_and_queue_listing() {
    let h = Harness::new(20);

    assert_eq!(h.say(1, "!music first").await, HandlingOutcome::Success);
    assert_eq!(h.say(1, "!music second").await, HandlingOutcome::UserError);
    assert!(h.chat.last().starts_with("Command cooldown error. | You have to wait"));

    assert_eq!(h.say(2, "!music second").await, HandlingOutcome::Success);
    assert_eq!(h.say(3, "!M").await, HandlingOutcome::Success);

    let sent = h.chat.sent.lock();
    let Some(Reply::Embed(listing)) = sent.last() else {
        panic!("expected the queue listing");
    };
    assert!(listing.description.starts_with("Active "));
    assert!(listing.description.contains("\"first\""));
    assert_eq!(listing.fields.len(), 1);
    assert_eq!(listing.fields[0].name, "#1");
    assert!(listing.footer.as_deref().is_some_and(|f| f.contains("0:42 / 3:00")));
}

#[tokio::test]
async fn test_queue_overflow_and_unknown_track() {
    let h = Harness::new(2);

    assert_eq!(h.say(1, "!music missing").await, HandlingOutcome::UserError);
    assert!(h.chat.last().starts_with("Track search error."));
    assert!(h.queue.is_empty());

    assert_eq!(h.say(2, "!music one").await, HandlingOutcome::Success);
    assert_eq!(h.say(3, "!music two").await, HandlingOutcome::Success);
    assert_eq!(h.say(4, "!music three").await, HandlingOutcome::UserError);
    assert_eq!(
        h.chat.last(),
        "Audio queue overflow error. | Audio queue is full, you cannot enqueue more than `2` tracks."
    );
    assert_eq!(h.queue.len(), 2);
}

#[tokio::test]
async fn test_player_settings_commands() {
    let h = Harness::new(20);
    h.say(1, "!music tune").await;

    assert_eq!(h.say(1, "!volume 50").await, HandlingOutcome::Success);
    assert_eq!(h.chat.last(), "Current music volume was set to `50%`");
    assert_eq!(*h.voice.volume.lock(), 0.5);
    assert_eq!(h.say(1, "!v").await, HandlingOutcome::Success);
    assert_eq!(h.chat.last(), "Current music volume is `50%`");

    assert_eq!(h.say(1, "!volume 150").await, HandlingOutcome::UserError);
    assert!(h.chat.last().contains("is not a valid value for `<volume_percentage>`"));
    assert!(h.chat.last().contains("Usage: `!volume <volume_percentage?>`"));

    assert_eq!(h.say(1, "!bitrate 96").await, HandlingOutcome::Success);
    assert_eq!(h.chat.last(), "Current audio bitrate was set to `96 kbps`");
    assert_eq!(h.say(1, "!br").await, HandlingOutcome::Success);
    assert_eq!(
        h.chat.last(),
        "Current audio bitrate setting is at `96 kbps`.\nCurrent track original bitrate: `128 kbps`."
    );
    assert_eq!(h.say(1, "!bitrate 4").await, HandlingOutcome::UserError);

    assert_eq!(h.say(1, "!packet-passes 3").await, HandlingOutcome::Success);
    assert!(h.chat.last().starts_with("Current audio packet passes amount was set to `3`."));
    assert_eq!(h.queue.player().passes(), 3);
    assert_eq!(h.say(1, "!pp").await, HandlingOutcome::Success);
    assert_eq!(h.chat.last(), "Current packet passes amount setting is `3`.");
}

#[tokio::test]
async fn test_help_lists_and_describes_commands() {
    let h = Harness::new(20);

    assert_eq!(h.say(1, "!help").await, HandlingOutcome::Success);
    let listing = h.chat.last();
    assert!(listing.contains("`!music <...youtube_url_or_vid_name?>`"));
    assert!(listing.contains("`!packet-passes <amount?>`"));

    assert_eq!(h.say(1, "!h m").await, HandlingOutcome::Success);
    let sent = h.chat.sent.lock();
    let Some(Reply::Embed(detail)) = sent.last() else {
        panic!("expected the help detail");
    };
    let field = |name: &str| {
        detail
            .fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.clone())
    };
    assert_eq!(field("Aliases").as_deref(), Some("`music`, `m`"));
    assert_eq!(field("Cooldown").as_deref(), Some("5s"));
    drop(sent);

    assert_eq!(h.say(1, "!help nope").await, HandlingOutcome::UserError);
    assert!(h.chat.last().starts_with("Unknown command error."));
}
