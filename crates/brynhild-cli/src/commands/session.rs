//! `brynhild session list|show|delete|rename` (spec.md §6).

use brynhild_session::SessionManager;

use crate::app::App;

/// List every saved session, newest first.
pub fn list(app: &App) -> anyhow::Result<()> {
    let manager = SessionManager::new(app.sessions_dir.clone());
    let sessions = manager.list_sessions()?;
    if sessions.is_empty() {
        println!("no sessions");
        return Ok(());
    }
    for session in sessions {
        let summary = session.summary();
        let title = summary.title.as_deref().unwrap_or("(untitled)");
        println!(
            "{}\t{}\t{}\t{} msgs\t{}",
            summary.id,
            summary.updated_at.to_rfc3339(),
            summary.model,
            summary.message_count,
            title
        );
    }
    Ok(())
}

/// Print a session's full message history.
pub fn show(app: &App, session_id: &str) -> anyhow::Result<()> {
    let manager = SessionManager::new(app.sessions_dir.clone());
    let Some(session) = manager.load(session_id)? else {
        anyhow::bail!("no such session: {session_id}");
    };
    println!("id:       {}", session.id);
    println!("cwd:      {}", session.cwd);
    println!("model:    {} ({})", session.model, session.provider);
    println!("created:  {}", session.created_at.to_rfc3339());
    println!("updated:  {}", session.updated_at.to_rfc3339());
    println!();
    for message in &session.messages {
        let text = message.text().unwrap_or("<no text>");
        println!("[{}] {}", message.role(), text);
    }
    Ok(())
}

/// Delete a session. Returns an error (exit 1) if it didn't exist.
pub fn delete(app: &App, session_id: &str) -> anyhow::Result<()> {
    let manager = SessionManager::new(app.sessions_dir.clone());
    if !manager.delete(session_id)? {
        anyhow::bail!("no such session: {session_id}");
    }
    println!("deleted {session_id}");
    Ok(())
}

/// Rename a session.
pub fn rename(app: &App, old_id: &str, new_id: &str) -> anyhow::Result<()> {
    let manager = SessionManager::new(app.sessions_dir.clone());
    manager.rename(old_id, new_id)?;
    println!("renamed {old_id} -> {new_id}");
    Ok(())
}
