//! `brynhild api test` (spec.md §6): checks that the configured
//! provider's expected credential is present in the environment, without
//! making a network call (no wire-protocol provider is implemented in
//! this workspace; spec.md §1 treats that as an external collaborator).

use crate::app::App;

/// Map a provider name to the environment variable it expects to find
/// its credential in (spec.md §3/6).
#[must_use]
pub fn expected_env_var(provider: &str) -> Option<&'static str> {
    match provider {
        "anthropic" => Some("ANTHROPIC_API_KEY"),
        "openrouter" => Some("OPENROUTER_API_KEY"),
        "openai" => Some("OPENAI_API_KEY"),
        "ollama" => Some("OLLAMA_HOST"),
        _ => None,
    }
}

/// Check that the active provider's credential env var is set.
pub fn test(app: &App) -> anyhow::Result<()> {
    let provider = app.provider.as_str();
    let Some(env_var) = expected_env_var(provider) else {
        anyhow::bail!("unknown provider '{provider}': no credential env var mapping");
    };
    match std::env::var(env_var) {
        Ok(value) if !value.is_empty() => {
            println!("provider: {provider}");
            println!("{env_var}: set");
            Ok(())
        }
        _ => {
            anyhow::bail!("provider '{provider}' requires {env_var}, which is not set");
        }
    }
}
