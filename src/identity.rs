//! Identity resolution for staffbook commands.
//!
//! Every command needs to know who is acting. The name is resolved through a
//! chain:
//!
//! 1. `--as <user>`: explicit per-command override
//! 2. `STAFFBOOK_USER` env var: session level
//! 3. `user` in `~/.staffbook/config.toml`: default for single-user machines
//!
//! The resolved name is then looked up in the config's `[roles]` and
//! `[scopes]` tables to produce an [`Actor`].

use std::env;

use crate::config::Config;
use crate::model::Actor;

/// Error message shown when no user can be resolved.
pub const USER_REQUIRED: &str = "user required: pass --as <user>, \
    set STAFFBOOK_USER, or add `user = \"...\"` to ~/.staffbook/config.toml";

/// Resolve the acting user from the tiered resolution chain.
pub fn resolve_actor(explicit: Option<&str>, config: &Config) -> Result<Actor, String> {
    let from_env = env::var("STAFFBOOK_USER").ok();
    let name = pick_name(explicit, from_env.as_deref(), config.user.as_deref())
        .ok_or(USER_REQUIRED)?;
    Ok(actor_for(name, config))
}

/// First non-empty name in resolution order.
fn pick_name<'a>(
    explicit: Option<&'a str>,
    from_env: Option<&'a str>,
    from_config: Option<&'a str>,
) -> Option<&'a str> {
    [explicit, from_env, from_config]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|name| !name.is_empty())
}

/// Builds the actor for a known name using the configured role and scope.
pub fn actor_for(name: &str, config: &Config) -> Actor {
    let actor = Actor {
        name: name.to_string(),
        role: config.role_of(name),
        department: config.scopes.get(name).cloned(),
    };
    tracing::debug!(user = %actor.name, role = %actor.role, "resolved actor");
    actor
}
