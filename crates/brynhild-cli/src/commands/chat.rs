//! `brynhild chat` (spec.md §6): assemble every subsystem for one turn.
//!
//! No concrete [`brynhild_llm::LlmProvider`] is implemented anywhere in
//! this workspace (spec.md §1 treats wire-protocol providers as an
//! external collaborator's concern), so this command wires up
//! everything up to the point a real provider call would happen, then
//! reports a clean failure if none is configured.

use std::io::Read;

use brynhild_context::ContextBuilder;
use brynhild_logger::ConversationLogger;
use brynhild_runtime::ConversationProcessor;
use brynhild_session::SessionManager;

use crate::app::App;
use crate::callbacks::TerminalCallbacks;
use crate::commands::api::expected_env_var;

/// Resolve the prompt from the positional argument, or stdin if piped.
fn resolve_prompt(prompt: Option<String>) -> Option<String> {
    if let Some(p) = prompt {
        return Some(p);
    }
    if atty_is_terminal() {
        return None;
    }
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf).ok()?;
    let trimmed = buf.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn atty_is_terminal() -> bool {
    use std::io::IsTerminal;
    std::io::stdin().is_terminal()
}

/// Run one chat turn. `json` requests machine-readable output; `print`
/// (`-p`) disables interactive permission prompts.
pub async fn run(app: &mut App, prompt: Option<String>, session_id: Option<String>, print: bool, json: bool) -> anyhow::Result<()> {
    let Some(prompt) = resolve_prompt(prompt) else {
        anyhow::bail!("no prompt given (pass one as an argument or pipe it on stdin)");
    };

    if expected_env_var(&app.provider).is_none_or(|var| std::env::var(var).unwrap_or_default().is_empty()) {
        let var = expected_env_var(&app.provider).unwrap_or("<unknown credential env var>");
        anyhow::bail!(
            "no usable provider configured for '{}': set {var} (no wire-protocol provider is bundled in this build)",
            app.provider
        );
    }

    let sessions = SessionManager::new(app.sessions_dir.clone());
    let cwd_str = app.cwd.display().to_string();
    let mut session = sessions.get_or_create(session_id.as_deref(), &cwd_str, &app.model, &app.provider);

    let skills = app.skill_registry();
    let context = ContextBuilder::build(
        "You are Brynhild, an agentic coding assistant.",
        Some(&mut app.rules),
        skills,
        true,
        &app.profiles,
        &app.model,
        Some(app.provider.as_str()),
    )?;

    std::fs::create_dir_all(&app.logs_dir)?;
    let log_path = app.log_path(&session.id);
    let private_mode = crate::app::cfg_nested_str(&app.config, "logging", "private_mode")
        .map(|v| v == "true")
        .unwrap_or(false);
    let mut logger = ConversationLogger::open(&log_path, private_mode)?;
    logger.log_session_start(&session.id, &app.model, &app.provider)?;
    logger.log_context_init(&context.base_prompt)?;
    logger.log_context_ready(&context.prompt_hash())?;

    let mut processor = ConversationProcessor::new(session.id.clone(), app.cwd.clone());
    processor.load_messages(session.messages.clone());
    let _callbacks = TerminalCallbacks::new(!print);

    tracing::debug!(
        system_prompt_hash = %context.prompt_hash(),
        loaded_messages = processor.messages().len(),
        json_output = json,
        "turn prepared; stopping before the unimplemented provider call"
    );

    // Everything up to the provider call is wired and working; no
    // concrete LlmProvider exists in this workspace (spec.md §1 treats
    // wire-protocol providers as an external collaborator's concern).
    session.updated_at = chrono::Utc::now();
    anyhow::bail!(
        "provider '{}' has no wire-protocol implementation bundled in this build; \
         the conversation was prepared through context/hooks/session assembly but no LLM call can be made",
        app.provider
    )
}
