use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::{
    audio::{AudioQueue, TrackOrder, VoiceTarget},
    cmd::{CommandContext, CommandHandler, ParamValue},
    error::{CommandResult, UserError},
    ui::embeds,
};

/// `music [youtube_url_or_vid_name]`: encola o lista la cola.
pub struct MusicCommand {
    queue: Arc<AudioQueue>,
}

impl MusicCommand {
    pub fn new(queue: Arc<AudioQueue>) -> Self {
        Self { queue }
    }

    async fn list_queue(&self, ctx: &CommandContext<'_>) -> CommandResult {
        let embed = embeds::queue_listing(
            &self.queue.tracks(),
            self.queue.state(),
            self.queue.player().streaming_time(),
        );
        ctx.reply(embed).await?;
        Ok(())
    }
}

#[async_trait]
impl CommandHandler for MusicCommand {
    async fn handle(&self, ctx: CommandContext<'_>) -> CommandResult {
        let query = ctx
            .params
            .list(0)
            .map(|words| {
                words
                    .iter()
                    .map(ParamValue::to_string)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();

        if query.is_empty() {
            return self.list_queue(&ctx).await;
        }

        let msg = ctx.message;
        let (Some(guild_id), Some(channel_id)) = (msg.guild_id, msg.voice_channel) else {
            return Err(UserError::NotInVoiceChannel(
                "You need to be in a voice channel before playing the music.".to_string(),
            )
            .into());
        };

        info!("🎵 {} pidió: {}", msg.author_name, query);
        let order = TrackOrder {
            query,
            requester_id: msg.author_id,
            requester_name: msg.author_name.clone(),
            text_channel: msg.channel_id,
            message_id: msg.id,
            voice_target: VoiceTarget {
                guild_id,
                channel_id,
            },
        };
        self.queue.enqueue(order).await?;
        Ok(())
    }
}
