//! # Dispatch engine
//!
//! Turns an inbound chat message into a command invocation:
//!
//! 1. skip messages from bots and messages without the prefix;
//! 2. split `<prefix><name> <args>` and tokenize the arguments;
//! 3. look the command up, then enforce role limit, cooldown and parameters;
//! 4. run the handler.
//!
//! Every failure ends up as a [`HandlingOutcome`]; nothing is propagated past
//! [`Dispatcher::dispatch`].

use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::{
    params::Params,
    registry::{CommandDescriptor, CommandRegistry},
    tokenizer::tokenize_default,
};
use crate::{
    error::{CommandError, UserError},
    sync::FreezeGuard,
    ui::embeds::{self, Reply},
};

/// Transport-agnostic view of an inbound chat message.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub guild_id: Option<GuildId>,
    pub author_id: UserId,
    pub author_name: String,
    pub author_is_bot: bool,
    pub content: String,
    /// Nombres de los roles del autor en el servidor.
    pub roles: Vec<String>,
    /// Canal de voz en el que está el autor, si alguno.
    pub voice_channel: Option<ChannelId>,
}

/// Envío de respuestas al chat.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, channel: ChannelId, reply: Reply) -> anyhow::Result<()>;

    async fn reply(&self, to: &CommandMessage, reply: Reply) -> anyhow::Result<()>;
}

/// Everything a handler receives.
pub struct CommandContext<'a> {
    /// Name as typed by the user.
    pub command: &'a str,
    pub descriptor: &'a CommandDescriptor,
    pub message: &'a CommandMessage,
    pub params: Params,
    pub transport: &'a dyn ChatTransport,
    pub registry: &'a CommandRegistry,
    pub prefix: &'a str,
}

impl CommandContext<'_> {
    pub async fn reply(&self, reply: impl Into<Reply>) -> anyhow::Result<()> {
        self.transport.reply(self.message, reply.into()).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlingOutcome {
    /// Not a command: no prefix, or sent by a bot.
    Skipped,
    UnknownCommand,
    Success,
    UserError,
    InternalError,
}

pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
    prefix: String,
    production: bool,
    reply_to_unknown: bool,
    freeze_guard: FreezeGuard,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<CommandRegistry>,
        prefix: impl Into<String>,
        production: bool,
        freeze_guard: FreezeGuard,
    ) -> Self {
        Self {
            registry,
            prefix: prefix.into(),
            production,
            reply_to_unknown: false,
            freeze_guard,
        }
    }

    /// Reply to unknown commands with an error instead of ignoring them.
    pub fn with_unknown_command_replies(mut self, enabled: bool) -> Self {
        self.reply_to_unknown = enabled;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Handles `msg`, replying through `transport`. Never fails.
    pub async fn dispatch(&self, msg: &CommandMessage, transport: &dyn ChatTransport) -> HandlingOutcome {
        self.freeze_guard
            .watch("dispatch", self.dispatch_unguarded(msg, transport))
            .await
    }

    async fn dispatch_unguarded(
        &self,
        msg: &CommandMessage,
        transport: &dyn ChatTransport,
    ) -> HandlingOutcome {
        let content = msg.content.trim();
        if msg.author_is_bot {
            return HandlingOutcome::Skipped;
        }
        let Some(unprefixed) = content.strip_prefix(self.prefix.as_str()) else {
            return HandlingOutcome::Skipped;
        };

        match self.invoke(unprefixed, msg, transport).await {
            Ok(Some(())) => HandlingOutcome::Success,
            Ok(None) => {
                if self.reply_to_unknown {
                    let (name, _) = split_command_name(unprefixed);
                    let err = UserError::UnknownCommand(format!(
                        "Command \"{}\" is not supported.\nUse `{}help` to list available commands.",
                        name, self.prefix
                    ));
                    self.send_reply(transport, msg, embeds::user_error(&err).into())
                        .await;
                }
                HandlingOutcome::UnknownCommand
            }
            Err(CommandError::User(err)) => {
                debug!("🙅 {} ({}): {}", msg.author_name, msg.author_id, err);
                self.send_reply(transport, msg, embeds::user_error(&err).into())
                    .await;
                HandlingOutcome::UserError
            }
            Err(CommandError::Internal(err)) => {
                error!("❌ Error interno manejando \"{}\": {:?}", content, err);
                let report = if self.production {
                    "Internal error occurred.".to_string()
                } else {
                    format!("Internal error: {:#}", err)
                };
                self.send_reply(transport, msg, Reply::Text(report)).await;
                HandlingOutcome::InternalError
            }
        }
    }

    /// `Ok(None)` cuando el comando no existe.
    async fn invoke(
        &self,
        unprefixed: &str,
        msg: &CommandMessage,
        transport: &dyn ChatTransport,
    ) -> Result<Option<()>, CommandError> {
        let (name, remainder) = split_command_name(unprefixed);
        let tokens = tokenize_default(remainder)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| UserError::Syntax(err.to_string()))?;

        let Some(descriptor) = self.registry.lookup(name) else {
            debug!("❓ Comando desconocido: {}", name);
            return Ok(None);
        };

        if let Some(limit) = descriptor.role_limit() {
            let role_match = limit.check(&msg.roles);
            if !role_match.matches {
                return Err(UserError::Access(limit.access_error_message(name, &role_match)).into());
            }
        }

        if let Some(cooldown) = descriptor.cooldown() {
            if let Some(remaining) = cooldown.remaining(msg.author_id) {
                return Err(UserError::Cooldown(cooldown.error_message(name, remaining)).into());
            }
            cooldown.record(msg.author_id);
        }

        let params = self.validate_params(descriptor, name, &tokens)?;

        debug!("▶️ {} invoca {} {:?}", msg.author_name, descriptor.name(), tokens);
        let ctx = CommandContext {
            command: name,
            descriptor,
            message: msg,
            params,
            transport,
            registry: &self.registry,
            prefix: &self.prefix,
        };
        descriptor.handler().handle(ctx).await?;

        Ok(Some(()))
    }

    fn validate_params(
        &self,
        descriptor: &CommandDescriptor,
        name: &str,
        tokens: &[String],
    ) -> Result<Params, UserError> {
        let usage = descriptor.usage_template(&self.prefix);
        match descriptor.schema() {
            None if tokens.is_empty() => Ok(Params::default()),
            None => Err(UserError::InvalidParameters(format!(
                "Command \"{}\" expects `0` parameters.\nUsage: {}",
                name, usage
            ))),
            Some(schema) => schema
                .validate(tokens)
                .map_err(|err| UserError::InvalidParameters(format!("{}\nUsage: {}", err, usage))),
        }
    }

    async fn send_reply(&self, transport: &dyn ChatTransport, msg: &CommandMessage, reply: Reply) {
        if let Err(err) = transport.reply(msg, reply).await {
            warn!("⚠️ No se pudo responder al mensaje {}: {:?}", msg.id, err);
        }
    }
}

/// Splits at the first character outside `[A-Za-z0-9_-]`.
fn split_command_name(unprefixed: &str) -> (&str, &str) {
    let end = unprefixed
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(unprefixed.len());
    unprefixed.split_at(end)
}
