use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    audio::AudioQueue,
    cmd::{CommandContext, CommandHandler},
    error::CommandResult,
    ui::embeds,
};

pub struct PauseCommand {
    queue: Arc<AudioQueue>,
}

impl PauseCommand {
    pub fn new(queue: Arc<AudioQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl CommandHandler for PauseCommand {
    async fn handle(&self, ctx: CommandContext<'_>) -> CommandResult {
        let track = self.queue.pause()?;
        ctx.reply(embeds::track_paused(&track)).await?;
        Ok(())
    }
}

pub struct ResumeCommand {
    queue: Arc<AudioQueue>,
}

impl ResumeCommand {
    pub fn new(queue: Arc<AudioQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl CommandHandler for ResumeCommand {
    async fn handle(&self, ctx: CommandContext<'_>) -> CommandResult {
        let track = self.queue.resume()?;
        ctx.reply(embeds::track_resumed(&track)).await?;
        Ok(())
    }
}

/// The "skipped" notice is sent by the notifier once the stream ends.
pub struct SkipCommand {
    queue: Arc<AudioQueue>,
}

impl SkipCommand {
    pub fn new(queue: Arc<AudioQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl CommandHandler for SkipCommand {
    async fn handle(&self, _ctx: CommandContext<'_>) -> CommandResult {
        self.queue.skip()?;
        Ok(())
    }
}
