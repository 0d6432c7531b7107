//! Player-wide settings: volume, bitrate and packet passes.

use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    audio::AudioQueue,
    cmd::{CommandContext, CommandHandler},
    error::CommandResult,
};

pub struct VolumeCommand {
    queue: Arc<AudioQueue>,
}

impl VolumeCommand {
    pub fn new(queue: Arc<AudioQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl CommandHandler for VolumeCommand {
    async fn handle(&self, ctx: CommandContext<'_>) -> CommandResult {
        let player = self.queue.player();
        let reply = match ctx.params.integer(0) {
            None => format!(
                "Current music volume is `{}%`",
                (player.volume() * 100.0).round()
            ),
            Some(percentage) => {
                player.set_volume(percentage as f32 / 100.0)?;
                format!("Current music volume was set to `{}%`", percentage)
            }
        };
        ctx.reply(reply).await?;
        Ok(())
    }
}

pub struct BitrateCommand {
    queue: Arc<AudioQueue>,
}

impl BitrateCommand {
    pub fn new(queue: Arc<AudioQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl CommandHandler for BitrateCommand {
    async fn handle(&self, ctx: CommandContext<'_>) -> CommandResult {
        let player = self.queue.player();
        let reply = match ctx.params.integer(0) {
            None => {
                let original = self
                    .queue
                    .current_track()
                    .and_then(|track| track.metadata().bitrate_kbps)
                    .map(|kbps| format!("{} kbps", kbps))
                    .unwrap_or_else(|| "none".to_string());
                format!(
                    "Current audio bitrate setting is at `{} kbps`.\nCurrent track original bitrate: `{}`.",
                    player.bitrate(),
                    original
                )
            }
            Some(kbps) => {
                // El schema limita el rango a 8..=192
                let kbps = u32::try_from(kbps).map_err(anyhow::Error::from)?;
                player.set_bitrate(kbps)?;
                format!("Current audio bitrate was set to `{} kbps`", kbps)
            }
        };
        ctx.reply(reply).await?;
        Ok(())
    }
}

pub struct PacketPassesCommand {
    queue: Arc<AudioQueue>,
}

impl PacketPassesCommand {
    pub fn new(queue: Arc<AudioQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl CommandHandler for PacketPassesCommand {
    async fn handle(&self, ctx: CommandContext<'_>) -> CommandResult {
        let player = self.queue.player();
        let reply = match ctx.params.integer(0) {
            None => format!(
                "Current packet passes amount setting is `{}`.",
                player.passes()
            ),
            Some(amount) => {
                let amount = u8::try_from(amount).map_err(anyhow::Error::from)?;
                player.set_passes(amount);
                format!(
                    "Current audio packet passes amount was set to `{}`.\n\
                     It will be applied as soon as the next track gets to be played.",
                    amount
                )
            }
        };
        ctx.reply(reply).await?;
        Ok(())
    }
}
