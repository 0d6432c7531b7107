use anyhow::Result;
use async_trait::async_trait;
use serenity::{
    builder::CreateMessage,
    http::Http,
    model::id::ChannelId,
};
use std::sync::Arc;

use crate::{
    cmd::{ChatTransport, CommandMessage},
    ui::embeds::Reply,
};

/// [`ChatTransport`] sobre la API HTTP de Discord.
#[derive(Clone)]
pub struct SerenityTransport {
    http: Arc<Http>,
}

impl SerenityTransport {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

fn build_message(reply: Reply) -> CreateMessage {
    match reply {
        Reply::Text(text) => CreateMessage::new().content(text),
        Reply::Embed(embed) => CreateMessage::new().embed(embed.to_create_embed()),
    }
}

#[async_trait]
impl ChatTransport for SerenityTransport {
    async fn send(&self, channel: ChannelId, reply: Reply) -> Result<()> {
        channel.send_message(&self.http, build_message(reply)).await?;
        Ok(())
    }

    async fn reply(&self, to: &CommandMessage, reply: Reply) -> Result<()> {
        to.channel_id
            .send_message(
                &self.http,
                build_message(reply).reference_message((to.channel_id, to.id)),
            )
            .await?;
        Ok(())
    }
}
