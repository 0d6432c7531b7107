//! # Chat commands
//!
//! Every command the bot understands, registered once at startup into an
//! immutable [`CommandRegistry`].
//!
//! | Command | Aliases | Parameters |
//! |---------|---------|------------|
//! | `music` | `m` | `<...youtube_url_or_vid_name?>` |
//! | `pause` | `p` | |
//! | `resume` | `r` | |
//! | `skip` | `s` | |
//! | `volume` | `v` | `<volume_percentage?>` |
//! | `bitrate` | `br` | `<value_kbps?>` |
//! | `packet-passes` | `pp` | `<amount?>` |
//! | `help` | `h` | `<command?>` |

use anyhow::Result;
use std::{sync::Arc, time::Duration};

use crate::{
    audio::AudioQueue,
    cmd::{CommandDescriptor, CommandRegistry, ParamDef, ParamKind, ParamSchema},
    config::{BITRATE_RANGE, PASSES_RANGE},
};

pub mod help;
pub mod music;
pub mod playback;
pub mod settings;

pub use help::HelpCommand;
pub use music::MusicCommand;
pub use playback::{PauseCommand, ResumeCommand, SkipCommand};
pub use settings::{BitrateCommand, PacketPassesCommand, VolumeCommand};

/// Cooldown del comando `music` por usuario.
pub const MUSIC_COOLDOWN: Duration = Duration::from_secs(5);

/// Builds the registry with every command bound to `queue`.
pub fn build_registry(queue: Arc<AudioQueue>) -> Result<CommandRegistry> {
    let (min_bitrate, max_bitrate) = BITRATE_RANGE;
    let (min_passes, max_passes) = PASSES_RANGE;

    let registry = CommandRegistry::builder()
        .register(
            CommandDescriptor::new("music", MusicCommand::new(queue.clone()))
                .with_alias("m")
                .with_description(
                    "Plays the music from YouTube by url or search query. \
                     Lists the audio queue when called without parameters.",
                )
                .with_cooldown(MUSIC_COOLDOWN)
                .with_params(ParamSchema::new(vec![ParamDef::new(
                    "youtube_url_or_vid_name",
                    "YouTube video url or a search query",
                )
                .optional()
                .variadic()])?),
        )
        .register(
            CommandDescriptor::new("pause", PauseCommand::new(queue.clone()))
                .with_alias("p")
                .with_description("Pauses the current track."),
        )
        .register(
            CommandDescriptor::new("resume", ResumeCommand::new(queue.clone()))
                .with_alias("r")
                .with_description("Resumes the paused track."),
        )
        .register(
            CommandDescriptor::new("skip", SkipCommand::new(queue.clone()))
                .with_alias("s")
                .with_description("Skips the current track and plays the next one."),
        )
        .register(
            CommandDescriptor::new("volume", VolumeCommand::new(queue.clone()))
                .with_alias("v")
                .with_description("Shows or sets the music volume.")
                .with_params(ParamSchema::new(vec![ParamDef::new(
                    "volume_percentage",
                    "New volume in percents",
                )
                .kind(ParamKind::Integer {
                    min: Some(0),
                    max: Some(100),
                })
                .optional()])?),
        )
        .register(
            CommandDescriptor::new("bitrate", BitrateCommand::new(queue.clone()))
                .with_alias("br")
                .with_description("Shows or sets the audio bitrate.")
                .with_params(ParamSchema::new(vec![ParamDef::new(
                    "value_kbps",
                    "New bitrate in kbps",
                )
                .kind(ParamKind::Integer {
                    min: Some(i64::from(min_bitrate)),
                    max: Some(i64::from(max_bitrate)),
                })
                .optional()])?),
        )
        .register(
            CommandDescriptor::new("packet-passes", PacketPassesCommand::new(queue))
                .with_alias("pp")
                .with_description(
                    "Shows or sets how many times each audio packet is sent. \
                     Higher values help on lossy connections.",
                )
                .with_params(ParamSchema::new(vec![ParamDef::new(
                    "amount",
                    "Packet passes amount",
                )
                .kind(ParamKind::Integer {
                    min: Some(i64::from(min_passes)),
                    max: Some(i64::from(max_passes)),
                })
                .optional()])?),
        )
        .register(
            CommandDescriptor::new("help", HelpCommand)
                .with_alias("h")
                .with_description("Lists the commands or describes one of them.")
                .with_params(ParamSchema::new(vec![ParamDef::new(
                    "command",
                    "Command name or alias",
                )
                .optional()])?),
        )
        .build();

    Ok(registry)
}
