//! `Injection` and `ConversationContext`: the assembled system prompt
//! plus full provenance for replay.

use brynhild_logger::content_hash;
pub use brynhild_logger::InjectionLocation;
use brynhild_profiles::ModelProfile;
use brynhild_skills::SkillRegistry;

/// One piece of content folded into the system prompt, recorded so a
/// replay reader can reconstruct the exact bytes (spec.md §4.8).
#[derive(Debug, Clone, PartialEq)]
pub struct Injection {
    /// What produced this injection: `rules`, `skill_metadata`, or
    /// `profile`.
    pub source: String,
    /// Where the content was placed relative to the base prompt.
    pub location: InjectionLocation,
    /// The injected content itself.
    pub content: String,
    /// Free-form origin tag (a rule file path, a profile name).
    pub origin: Option<String>,
    /// Reserved for trigger-based injections (skill triggers); always
    /// `None` for the sources this builder produces on its own.
    pub trigger_type: Option<String>,
    /// The text that matched the trigger, if any.
    pub trigger_match: Option<String>,
}

impl Injection {
    /// 16-hex-char prefix of `SHA-256(content)`, the same hash a
    /// conversation log records alongside this injection.
    #[must_use]
    pub fn content_hash(&self) -> String {
        content_hash(&self.content)
    }
}

/// The result of one `ContextBuilder::build` call: a fully assembled
/// system prompt plus everything needed to log and later replay it.
pub struct ConversationContext {
    /// The final system prompt sent to the provider.
    pub system_prompt: String,
    /// The caller-provided starting prompt, before any injections.
    pub base_prompt: String,
    /// Every injection applied, in application order.
    pub injections: Vec<Injection>,
    /// The resolved model profile, if any matched.
    pub profile: Option<ModelProfile>,
    /// The skill registry built for this context (held so later turns can
    /// reuse it for `/skill` triggers without rediscovering).
    pub skill_registry: SkillRegistry,
}

impl ConversationContext {
    /// 16-hex-char prefix of `SHA-256(system_prompt)`, the value a
    /// `context_ready` event should record.
    #[must_use]
    pub fn prompt_hash(&self) -> String {
        content_hash(&self.system_prompt)
    }
}
