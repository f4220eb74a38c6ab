//! Command surface
//!
//! Scripts drive callouts with three sub-commands, matched case-insensitively:
//!
//! ```text
//! Write <entity> <text_with_underscores>
//! Setup <entity> <Field> <value>
//! Erase <entity>
//! ```
//!
//! `<entity>` is `0` for the entity running the command, a negative number for
//! the player, a positive event id, or an event name. Commands aimed at an
//! entity that cannot be found do nothing.

use crate::error::{CalloutError, Result};
use crate::label::LabelId;
use crate::session::CalloutSession;
use crate::style::SetupField;
use crate::world::{EntityId, WorldModel};

/// Who issued a command
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CommandContext {
    /// The entity whose script is running, target of reference `0`
    pub executing: Option<EntityId>,
}

impl CommandContext {
    pub fn executing(entity: EntityId) -> Self {
        CommandContext {
            executing: Some(entity),
        }
    }
}

/// A parsed entity reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRef {
    Executing,
    Player,
    Event(u32),
    Name(String),
}

impl EntityRef {
    /// Integral numbers select by id, anything else is a name
    pub fn parse(token: &str) -> Self {
        match token.trim().parse::<f64>() {
            Ok(n) if n.is_finite() && n.fract() == 0.0 && n <= u32::MAX as f64 => {
                if n == 0.0 {
                    EntityRef::Executing
                } else if n < 0.0 {
                    EntityRef::Player
                } else {
                    EntityRef::Event(n as u32)
                }
            }
            _ => EntityRef::Name(token.to_string()),
        }
    }

    pub fn resolve(&self, world: &impl WorldModel, ctx: &CommandContext) -> Option<EntityId> {
        match self {
            EntityRef::Executing => ctx.executing,
            EntityRef::Player => world.player(),
            EntityRef::Event(id) => world.event(*id),
            EntityRef::Name(name) => find_by_name(world, name),
        }
    }
}

/// First map event whose name is exactly `name`
pub fn find_by_name(world: &impl WorldModel, name: &str) -> Option<EntityId> {
    world
        .events()
        .into_iter()
        .find(|(_, event_name)| *event_name == name)
        .map(|(entity, _)| entity)
}

/// Resolves a reference token to an entity.
///
/// A numeric token that selects nothing is retried as a name, so an event
/// literally named "7" is still reachable.
pub fn resolve_entity(world: &impl WorldModel, ctx: &CommandContext, token: &str) -> Option<EntityId> {
    let reference = EntityRef::parse(token);
    reference.resolve(world, ctx).or_else(|| match reference {
        EntityRef::Name(_) => None,
        _ => find_by_name(world, token),
    })
}

/// One parsed sub-command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Write { target: String, text: String },
    Setup { target: String, field: SetupField, value: String },
    Erase { target: String },
}

impl Command {
    /// Parses the arguments following the command keyword.
    /// Tokens past the ones a sub-command uses are ignored.
    pub fn parse(args: &[&str]) -> Result<Self> {
        let sub = args.first().ok_or(CalloutError::MissingArgument("sub-command"))?;
        let target = args
            .get(1)
            .ok_or(CalloutError::MissingArgument("entity"))?
            .to_string();

        if sub.eq_ignore_ascii_case("write") {
            let text = args.get(2).ok_or(CalloutError::MissingArgument("text"))?;
            Ok(Command::Write {
                target,
                text: text.replace('_', " "),
            })
        } else if sub.eq_ignore_ascii_case("setup") {
            let field = args.get(2).ok_or(CalloutError::MissingArgument("field"))?;
            let value = args.get(3).ok_or(CalloutError::MissingArgument("value"))?;
            Ok(Command::Setup {
                target,
                field: field.parse()?,
                value: value.to_string(),
            })
        } else if sub.eq_ignore_ascii_case("erase") {
            Ok(Command::Erase { target })
        } else {
            Err(CalloutError::UnknownCommand(sub.to_string()))
        }
    }

    pub fn target(&self) -> &str {
        match self {
            Command::Write { target, .. }
            | Command::Setup { target, .. }
            | Command::Erase { target } => target,
        }
    }
}

/// What a command did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dispatch {
    Wrote(LabelId),
    Configured(SetupField),
    /// Number of labels scheduled to expire
    Erased(usize),
    /// The entity reference matched nothing; nothing happened
    EntityNotFound,
    /// The command was not for callouts, or its target is going away
    Ignored,
}

/// Runs `command` against the entity it names
pub fn dispatch(
    session: &mut CalloutSession,
    world: &impl WorldModel,
    ctx: &CommandContext,
    command: &Command,
) -> Result<Dispatch> {
    let Some(entity) = resolve_entity(world, ctx, command.target()) else {
        log::debug!("no entity matches {:?}, ignoring {:?}", command.target(), command);
        return Ok(Dispatch::EntityNotFound);
    };

    match command {
        Command::Write { text, .. } => Ok(session
            .create_text(world, entity, text)
            .map_or(Dispatch::Ignored, Dispatch::Wrote)),
        Command::Setup { field, value, .. } => {
            session.setup(entity, *field, value)?;
            Ok(Dispatch::Configured(*field))
        }
        Command::Erase { .. } => Ok(Dispatch::Erased(session.clear_text(entity))),
    }
}
