//! # Bot Module
//!
//! Discord side of Pony Bot.
//!
//! - [`PonyBot`] implements Serenity's [`EventHandler`]: every guild message is
//!   turned into a [`CommandMessage`] and handed to the [`Dispatcher`]
//! - [`transport::SerenityTransport`] sends replies and notifications
//! - [`events::QueueNotifier`] turns queue events into chat embeds
//! - [`commands`] holds the command handlers and the registry builder
//!
//! ## Message flow
//!
//! Role names and the author's voice channel are read from the guild cache
//! while the message is converted, so command handlers never touch Serenity.

use serenity::{
    all::{Context, EventHandler, Message, Ready},
    async_trait,
    model::id::ChannelId,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub mod commands;
pub mod events;
pub mod transport;

use crate::{
    cmd::{ChatTransport, CommandMessage, Dispatcher},
    ui::embeds,
};
use transport::SerenityTransport;

pub struct PonyBot {
    dispatcher: Arc<Dispatcher>,
    log_channel_id: Option<ChannelId>,
}

impl PonyBot {
    pub fn new(dispatcher: Arc<Dispatcher>, log_channel_id: Option<u64>) -> Self {
        Self {
            dispatcher,
            log_channel_id: log_channel_id.map(ChannelId::new),
        }
    }

    /// Builds the transport-agnostic message; `None` for messages that can
    /// never be commands.
    fn command_message(&self, ctx: &Context, msg: &Message) -> Option<CommandMessage> {
        if msg.author.bot || !msg.content.trim_start().starts_with(self.dispatcher.prefix()) {
            return None;
        }

        let (roles, voice_channel) = msg
            .guild_id
            .and_then(|guild_id| {
                let guild = ctx.cache.guild(guild_id)?;
                let role_ids = guild
                    .members
                    .get(&msg.author.id)
                    .map(|member| member.roles.clone())
                    .or_else(|| msg.member.as_ref().map(|member| member.roles.clone()))
                    .unwrap_or_default();
                let roles = role_ids
                    .iter()
                    .filter_map(|id| guild.roles.get(id).map(|role| role.name.clone()))
                    .collect::<Vec<_>>();
                let voice_channel = guild
                    .voice_states
                    .get(&msg.author.id)
                    .and_then(|state| state.channel_id);
                Some((roles, voice_channel))
            })
            .unwrap_or_default();

        Some(CommandMessage {
            id: msg.id,
            channel_id: msg.channel_id,
            guild_id: msg.guild_id,
            author_id: msg.author.id,
            author_name: msg.author.name.clone(),
            author_is_bot: msg.author.bot,
            content: msg.content.clone(),
            roles,
            voice_channel,
        })
    }
}

#[async_trait]
impl EventHandler for PonyBot {
    /// Resolves the log channel and posts the online notice there. A log
    /// channel that cannot be resolved is fatal.
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🤖 {} está en línea!", ready.user.name);
        info!("📊 Conectado a {} servidores", ready.guilds.len());

        let Some(channel_id) = self.log_channel_id else {
            return;
        };
        if let Err(e) = channel_id.to_channel(&ctx.http).await {
            error!("❌ No se pudo resolver el canal de logs {}: {:?}", channel_id, e);
            std::process::exit(1);
        }

        let notice = embeds::success(
            "🟢 Online",
            format!(
                "{} is online and listening to `{}` commands.",
                ready.user.name,
                self.dispatcher.prefix()
            ),
        );
        let transport = SerenityTransport::new(ctx.http.clone());
        if let Err(e) = transport.send(channel_id, notice.into()).await {
            warn!("⚠️ No se pudo publicar en el canal de logs: {:?}", e);
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let Some(command) = self.command_message(&ctx, &msg) else {
            return;
        };

        let transport = SerenityTransport::new(ctx.http.clone());
        let outcome = self.dispatcher.dispatch(&command, &transport).await;
        debug!("📨 {} -> {:?}", command.content, outcome);
    }
}
