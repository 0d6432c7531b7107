//! Command engine: tokenizing, validating and dispatching chat commands.

pub mod cooldown;
pub mod dispatch;
pub mod params;
pub mod registry;
pub mod role_limit;
pub mod tokenizer;

pub use dispatch::{ChatTransport, CommandContext, CommandMessage, Dispatcher, HandlingOutcome};
pub use params::{ParamDef, ParamKind, ParamSchema, ParamValue, Params};
pub use registry::{CommandDescriptor, CommandHandler, CommandRegistry};
pub use role_limit::RoleLimit;
