//! The six plugin component loaders (spec.md §4.6): commands, tools,
//! providers, skills, profiles, hooks. Each kind, except hooks and
//! profiles, has the same shape: `load_from_plugin(plugin) ->
//! map[name]thing`.

pub mod commands;
pub mod hooks;
pub mod profiles;
pub mod providers;
pub mod skills;
pub mod tools;
