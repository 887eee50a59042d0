//! Lifecycle events that can trigger hooks.

use std::fmt;

/// A named point in the processor's lifecycle at which zero or more hooks
/// may fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    /// New session begins. Cannot block or modify.
    SessionStart,
    /// Session ends (normal or error). Cannot block or modify.
    SessionEnd,
    /// Before a tool is executed. Can block and modify input.
    PreToolUse,
    /// After a tool completes. Can modify output.
    PostToolUse,
    /// Before sending the user message to the LLM. Can block and modify.
    PreMessage,
    /// After receiving the LLM response. Can modify.
    PostMessage,
    /// User submits input. Can block and modify.
    UserPromptSubmit,
    /// Before context window compaction. Can modify strategy.
    ///
    /// The compaction subsystem itself is out of scope; this variant is a
    /// slot a future compaction layer invokes.
    PreCompact,
    /// When an error occurs. Cannot block or modify.
    Error,
    /// A plugin has finished registering all of its components.
    PluginInit,
    /// The process is shutting down; fired once per initialized plugin.
    PluginShutdown,
}

impl HookEvent {
    /// Whether hooks for this event can block the operation.
    #[must_use]
    pub fn can_block(self) -> bool {
        matches!(
            self,
            Self::PreToolUse | Self::PreMessage | Self::UserPromptSubmit
        )
    }

    /// Whether hooks for this event can modify data.
    #[must_use]
    pub fn can_modify(self) -> bool {
        matches!(
            self,
            Self::PreToolUse
                | Self::PostToolUse
                | Self::PreMessage
                | Self::PostMessage
                | Self::UserPromptSubmit
                | Self::PreCompact
        )
    }

    /// The wire/log name of this event (snake_case).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SessionStart => "session_start",
            Self::SessionEnd => "session_end",
            Self::PreToolUse => "pre_tool_use",
            Self::PostToolUse => "post_tool_use",
            Self::PreMessage => "pre_message",
            Self::PostMessage => "post_message",
            Self::UserPromptSubmit => "user_prompt_submit",
            Self::PreCompact => "pre_compact",
            Self::Error => "error",
            Self::PluginInit => "plugin_init",
            Self::PluginShutdown => "plugin_shutdown",
        }
    }

    /// Parse an event from its wire/log name.
    #[must_use]
    pub fn from_str_opt(s: &str) -> Option<Self> {
        Some(match s {
            "session_start" => Self::SessionStart,
            "session_end" => Self::SessionEnd,
            "pre_tool_use" => Self::PreToolUse,
            "post_tool_use" => Self::PostToolUse,
            "pre_message" => Self::PreMessage,
            "post_message" => Self::PostMessage,
            "user_prompt_submit" => Self::UserPromptSubmit,
            "pre_compact" => Self::PreCompact,
            "error" => Self::Error,
            "plugin_init" => Self::PluginInit,
            "plugin_shutdown" => Self::PluginShutdown,
            _ => return None,
        })
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_table_matches_spec() {
        for e in [
            HookEvent::SessionStart,
            HookEvent::SessionEnd,
            HookEvent::Error,
            HookEvent::PluginInit,
            HookEvent::PluginShutdown,
        ] {
            assert!(!e.can_block());
            assert!(!e.can_modify());
        }
        for e in [
            HookEvent::PreToolUse,
            HookEvent::PreMessage,
            HookEvent::UserPromptSubmit,
        ] {
            assert!(e.can_block());
            assert!(e.can_modify());
        }
        for e in [HookEvent::PostToolUse, HookEvent::PostMessage, HookEvent::PreCompact] {
            assert!(!e.can_block());
            assert!(e.can_modify());
        }
    }

    #[test]
    fn round_trips_through_str() {
        for e in [
            HookEvent::SessionStart,
            HookEvent::PreToolUse,
            HookEvent::PreCompact,
            HookEvent::PluginShutdown,
        ] {
            assert_eq!(HookEvent::from_str_opt(e.as_str()), Some(e));
        }
        assert_eq!(HookEvent::from_str_opt("nonsense"), None);
    }
}
