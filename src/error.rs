//! # Errors
//!
//! Error taxonomy shared by the command engine and the music queue.
//!
//! - [`UserError`]: caused by the person issuing a command. These are expected
//!   outcomes, they are replied to the caller and never logged as failures.
//! - [`CommandError`]: what a command handler returns. Either a [`UserError`]
//!   relayed verbatim or an internal error that gets logged with full detail.

use thiserror::Error;

/// Errores causados por el usuario (no por bugs de la aplicación).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserError {
    #[error("Command parameters parsing error: {0}")]
    Syntax(String),

    #[error("Unknown command error: {0}")]
    UnknownCommand(String),

    #[error("Command access error: {0}")]
    Access(String),

    #[error("Command cooldown error: {0}")]
    Cooldown(String),

    #[error("Invalid command parameters error: {0}")]
    InvalidParameters(String),

    #[error("Audio queue overflow error: {0}")]
    QueueOverflow(String),

    #[error("Audio queue is busy error: {0}")]
    QueueBusy(String),

    #[error("No audio is streaming error: {0}")]
    NotStreaming(String),

    #[error("Audio is already paused error: {0}")]
    AlreadyPaused(String),

    #[error("Audio is not paused error: {0}")]
    NotPaused(String),

    #[error("Not in a voice channel error: {0}")]
    NotInVoiceChannel(String),

    #[error("Track search error: {0}")]
    TrackNotFound(String),

    #[error("Voice connection error: {0}")]
    VoiceConnection(String),

    #[error("Audio streaming error: {0}")]
    Streaming(String),
}

impl UserError {
    /// Short name of the kind of this error, used as the reply title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Syntax(_) => "Command parameters parsing error.",
            Self::UnknownCommand(_) => "Unknown command error.",
            Self::Access(_) => "Command access error.",
            Self::Cooldown(_) => "Command cooldown error.",
            Self::InvalidParameters(_) => "Invalid command parameters error.",
            Self::QueueOverflow(_) => "Audio queue overflow error.",
            Self::QueueBusy(_) => "Audio queue is busy error.",
            Self::NotStreaming(_) => "No audio is streaming error.",
            Self::AlreadyPaused(_) => "Audio is already paused error.",
            Self::NotPaused(_) => "Audio is not paused error.",
            Self::NotInVoiceChannel(_) => "Not in a voice channel error.",
            Self::TrackNotFound(_) => "Track search error.",
            Self::VoiceConnection(_) => "Voice connection error.",
            Self::Streaming(_) => "Audio streaming error.",
        }
    }

    /// Detailed explanation of why this error happened.
    pub fn description(&self) -> &str {
        match self {
            Self::Syntax(d)
            | Self::UnknownCommand(d)
            | Self::Access(d)
            | Self::Cooldown(d)
            | Self::InvalidParameters(d)
            | Self::QueueOverflow(d)
            | Self::QueueBusy(d)
            | Self::NotStreaming(d)
            | Self::AlreadyPaused(d)
            | Self::NotPaused(d)
            | Self::NotInVoiceChannel(d)
            | Self::TrackNotFound(d)
            | Self::VoiceConnection(d)
            | Self::Streaming(d) => d,
        }
    }
}

/// Resultado de error de un handler de comando.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    User(#[from] UserError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type CommandResult<T = ()> = std::result::Result<T, CommandError>;
