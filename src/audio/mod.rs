//! # Audio Module
//!
//! Music playback for Pony Bot: a single voice connection, a single player
//! and a FIFO queue of tracks ordered by users.
//!
//! ## Architecture
//!
//! ### [`track`] - Tracks
//! - [`track::AudioTrack`] couples the user's order with metadata resolved once
//! - [`track::TrackResolver`] is the seam to the metadata backend
//!
//! ### [`voice`] - Voice Transport
//! - Joins voice channels and reuses the connection for the same channel
//! - Streams are controlled through [`voice::StreamDispatcher`]
//!
//! ### [`player`] - Audio Player
//! - Streams one track at a time and reports [`player::PlaybackEvent`]s
//! - Holds the live volume, bitrate and packet passes settings
//!
//! ### [`queue`] - Queue Management
//! - Enqueue, skip, pause and resume serialized through one async mutex
//! - Advances to the next track when the current one ends
//! - Publishes [`queue::QueueEvent`]s for the chat notifier
//!
//! ### [`songbird_voice`] - Songbird backend
//! - Production [`voice::VoiceTransport`] on top of songbird and yt-dlp

pub mod player;
pub mod queue;
pub mod songbird_voice;
pub mod track;
pub mod voice;

pub use player::{AudioPlayer, EndReason, PlaybackEvent};
pub use queue::{AudioQueue, QueueEvent, QueueState};
pub use track::{AudioTrack, TrackOrder, TrackResolver, VoiceTarget};
pub use voice::{StreamOptions, VoiceManager};
