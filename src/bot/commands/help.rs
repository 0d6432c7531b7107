use async_trait::async_trait;

use crate::{
    cmd::{CommandContext, CommandHandler},
    error::{CommandResult, UserError},
    ui::embeds,
};

/// `help [command]`
pub struct HelpCommand;

#[async_trait]
impl CommandHandler for HelpCommand {
    async fn handle(&self, ctx: CommandContext<'_>) -> CommandResult {
        let embed = match ctx.params.text(0) {
            None => embeds::help_list(ctx.registry, ctx.prefix),
            Some(name) => {
                let name = name.strip_prefix(ctx.prefix).unwrap_or(name);
                let descriptor = ctx.registry.lookup(name).ok_or_else(|| {
                    UserError::UnknownCommand(format!("Command \"{}\" is not supported.", name))
                })?;
                embeds::help_detail(descriptor, ctx.prefix)
            }
        };
        ctx.reply(embed).await?;
        Ok(())
    }
}
