//! # Command registry
//!
//! Commands are described by a [`CommandDescriptor`] and registered once at
//! startup through [`CommandRegistryBuilder`]. The built [`CommandRegistry`]
//! is immutable and maps every lowercase alias to its descriptor.

use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tracing::warn;

use super::{
    cooldown::CooldownTracker, dispatch::CommandContext, params::ParamSchema,
    role_limit::RoleLimit,
};
use crate::error::CommandResult;

/// Lógica de negocio de un comando.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, ctx: CommandContext<'_>) -> CommandResult;
}

/// Immutable description of a command and its policies.
pub struct CommandDescriptor {
    aliases: Vec<String>,
    description: String,
    cooldown: Option<CooldownTracker>,
    role_limit: Option<RoleLimit>,
    params: Option<ParamSchema>,
    handler: Arc<dyn CommandHandler>,
}

impl std::fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("aliases", &self.aliases)
            .field("cooldown", &self.cooldown.as_ref().map(|t| t.cooldown()))
            .field("role_limit", &self.role_limit)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl CommandDescriptor {
    /// `name` is the canonical alias shown in usage templates.
    pub fn new<H>(name: impl Into<String>, handler: H) -> Self
    where
        H: CommandHandler + 'static,
    {
        Self {
            aliases: vec![name.into()],
            description: String::new(),
            cooldown: None,
            role_limit: None,
            params: None,
            handler: Arc::new(handler),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = Some(CooldownTracker::new(cooldown));
        self
    }

    pub fn with_role_limit(mut self, limit: RoleLimit) -> Self {
        self.role_limit = Some(limit);
        self
    }

    pub fn with_params(mut self, schema: ParamSchema) -> Self {
        self.params = Some(schema);
        self
    }

    pub fn name(&self) -> &str {
        &self.aliases[0]
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn cooldown(&self) -> Option<&CooldownTracker> {
        self.cooldown.as_ref()
    }

    pub fn role_limit(&self) -> Option<&RoleLimit> {
        self.role_limit.as_ref()
    }

    pub fn schema(&self) -> Option<&ParamSchema> {
        self.params.as_ref()
    }

    pub fn handler(&self) -> &Arc<dyn CommandHandler> {
        &self.handler
    }

    /// Plantilla de uso, p.ej. `` `!music <youtube_url_or_vid_name?>` ``.
    pub fn usage_template(&self, prefix: &str) -> String {
        let params = self
            .params
            .as_ref()
            .map(|schema| schema.usage())
            .filter(|usage| !usage.is_empty())
            .map(|usage| format!(" {}", usage))
            .unwrap_or_default();

        format!("`{}{}{}`", prefix, self.name(), params)
    }
}

/// Alias (en minúsculas) → descriptor.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    by_alias: HashMap<String, Arc<CommandDescriptor>>,
    ordered: Vec<Arc<CommandDescriptor>>,
}

#[derive(Debug, Default)]
pub struct CommandRegistryBuilder {
    registry: CommandRegistry,
}

impl CommandRegistryBuilder {
    /// Registers `descriptor` under all of its aliases. A duplicate alias
    /// overrides the earlier mapping.
    pub fn register(mut self, descriptor: CommandDescriptor) -> Self {
        let descriptor = Arc::new(descriptor);

        for alias in descriptor.aliases() {
            let key = alias.to_lowercase();
            if let Some(previous) = self.registry.by_alias.insert(key, descriptor.clone()) {
                warn!(
                    "⚠️ Alias \"{}\" de \"{}\" reemplazado por \"{}\"",
                    alias,
                    previous.name(),
                    descriptor.name()
                );
            }
        }
        self.registry.ordered.push(descriptor);
        self
    }

    pub fn build(self) -> CommandRegistry {
        self.registry
    }
}

impl CommandRegistry {
    pub fn builder() -> CommandRegistryBuilder {
        CommandRegistryBuilder::default()
    }

    /// Búsqueda sin distinción de mayúsculas.
    pub fn lookup(&self, name: &str) -> Option<&Arc<CommandDescriptor>> {
        self.by_alias.get(&name.to_lowercase())
    }

    /// Descriptors still reachable by at least one alias, in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &Arc<CommandDescriptor>> {
        self.ordered.iter().filter(move |descriptor| {
            descriptor.aliases().iter().any(|alias| {
                self.lookup(alias)
                    .is_some_and(|found| Arc::ptr_eq(found, descriptor))
            })
        })
    }

    pub fn len(&self) -> usize {
        self.descriptors().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
