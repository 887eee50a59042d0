//! Bootstraps the library crates into a ready-to-use session context.
//!
//! Every subcommand that touches more than bare config starts from
//! [`App::bootstrap`], which assembles config, hooks, tools, skills, and
//! profiles exactly the way `ConversationProcessor::run_turn` expects them
//! wired (spec.md §4.16).

use std::path::{Path, PathBuf};

use brynhild_config::{ConfigLoader, DeepChainMap};
use brynhild_hooks::{HookDefinition, HookManager, HooksManifest};
use brynhild_plugins::discovery::{EntryPointRegistry, PluginDiscovery};
use brynhild_plugins::loader::{hooks as hooks_loader, profiles as profiles_loader, skills as skills_loader};
use brynhild_plugins::{Plugin, PluginRegistry};
use brynhild_profiles::ProfileManager;
use brynhild_rules::RulesManager;
use brynhild_skills::SkillRegistry;
use brynhild_tools::{BashTool, EditFileTool, InspectTool, LearnSkillTool, ReadFileTool, ToolContext, ToolRegistry, WriteFileTool};
use brynhild_core::HookEvent;

/// Everything a turn needs, assembled once per invocation.
pub struct App {
    /// The merged configuration map.
    pub config: DeepChainMap,
    /// The project root the CLI was invoked against.
    pub cwd: PathBuf,
    /// Resolved model identifier (`model.name`, falling back to `default`).
    pub model: String,
    /// Resolved provider name (`model.provider`).
    pub provider: String,
    /// Discovered and enable-filtered plugins.
    pub plugins: Vec<Plugin>,
    /// Registered hook chains, including every enabled plugin's `hooks.yaml`
    /// and the project's own `.brynhild/hooks.yaml`.
    pub hooks: HookManager,
    /// Built-in tools plus the skill-lookup tool.
    pub tools: ToolRegistry,
    /// Sandbox/context every tool call runs against.
    pub tool_ctx: ToolContext,
    /// Model-profile resolution (user > plugin > builtin).
    pub profiles: ProfileManager,
    /// Project/global rule-file discovery, cached across turns.
    pub rules: RulesManager,

    /// `.brynhild/sessions` under the project root.
    pub sessions_dir: PathBuf,
    /// `.brynhild/logs` under the project root.
    pub logs_dir: PathBuf,
}

fn config_home() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("brynhild"))
}

impl App {
    /// Load configuration, discover plugins, and wire up hooks/tools/
    /// profiles/rules for `cwd`.
    ///
    /// # Errors
    /// Returns an error if the configuration layers can't be parsed, the
    /// project root is rejected as too broad, or a plugin declares a
    /// colliding profile name.
    pub fn bootstrap(cwd: PathBuf) -> anyhow::Result<Self> {
        let allow_home = std::env::var("BRYNHILD_ALLOW_HOME_DIR")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let (config, _layers) = ConfigLoader::new()
            .with_project_root(cwd.clone())
            .allow_home_directory(allow_home)
            .load()?;

        let model = cfg_nested_str(&config, "model", "name").unwrap_or_else(|| "default".to_string());
        let provider = cfg_nested_str(&config, "model", "provider").unwrap_or_else(|| "anthropic".to_string());

        let global_dir = config_home();
        let plugins = PluginDiscovery::discover(global_dir.as_deref(), Some(&cwd), &EntryPointRegistry::new());
        let state_path = PluginRegistry::default_state_path()
            .unwrap_or_else(|| cwd.join(".brynhild").join("plugins.yaml"));
        let registry = PluginRegistry::load(plugins, state_path)?;
        let enabled: Vec<&Plugin> = registry.get_enabled_plugins();

        let mut hooks = HookManager::new();
        for plugin in &enabled {
            hooks_loader::register_from_plugin(&mut hooks, plugin);
        }
        register_project_hooks(&mut hooks, &cwd);

        let mut profiles = ProfileManager::new();
        for plugin in &enabled {
            for (_, profile) in profiles_loader::load_from_plugin(plugin) {
                profiles.insert_plugin(profile, plugin.name())?;
            }
        }
        if let Some(dir) = global_dir.as_ref().map(|d| d.join("profiles")) {
            profiles.load_user_profiles_dir(&dir)?;
        }

        let plugin_skill_dirs = skills_loader::plugin_skill_dirs(&enabled);
        let skills = SkillRegistry::discover(
            None,
            global_dir.as_ref().map(|d| d.join("skills")).as_deref(),
            &plugin_skill_dirs,
            Some(&cwd.join(".brynhild").join("skills")),
        );

        let mut tools = ToolRegistry::new();
        tools.register(Box::new(BashTool));
        tools.register(Box::new(ReadFileTool));
        tools.register(Box::new(WriteFileTool));
        tools.register(Box::new(EditFileTool));
        tools.register(Box::new(InspectTool));
        tools.register(Box::new(LearnSkillTool::new(skills)));

        let tool_ctx = ToolContext::new(cwd.clone());

        let boundary = brynhild_core::discover_project_root(&cwd).unwrap_or_else(|| cwd.clone());
        let mut rules = RulesManager::new(cwd.clone(), Some(boundary));
        if let Some(dir) = global_dir.as_ref().map(|d| d.join("rules")) {
            rules = rules.with_global_rules_dir(dir);
        }

        let sessions_dir = cwd.join(".brynhild").join("sessions");
        let logs_dir = cwd.join(".brynhild").join("logs");

        Ok(Self {
            config,
            cwd,
            model,
            provider,
            plugins: registry.plugins().to_vec(),
            hooks,
            tools,
            tool_ctx,
            profiles,
            rules,
            sessions_dir,
            logs_dir,
        })
    }

    /// Build a fresh skill registry for a turn (discovery is cheap and the
    /// registry used by `LearnSkillTool` is already consumed, so turns that
    /// need one for `ContextBuilder`/`run_turn` rediscover independently).
    #[must_use]
    pub fn skill_registry(&self) -> SkillRegistry {
        let enabled: Vec<&Plugin> = self.plugins.iter().filter(|p| p.enabled).collect();
        let plugin_skill_dirs = skills_loader::plugin_skill_dirs(&enabled);
        let global_dir = config_home();
        SkillRegistry::discover(
            None,
            global_dir.as_ref().map(|d| d.join("skills")).as_deref(),
            &plugin_skill_dirs,
            Some(&self.cwd.join(".brynhild").join("skills")),
        )
    }

    /// The log file path for a given session id.
    #[must_use]
    pub fn log_path(&self, session_id: &str) -> PathBuf {
        self.logs_dir.join(format!("{session_id}.jsonl"))
    }
}

/// Parse `<cwd>/.brynhild/hooks.yaml`, if present, into `manager` the same
/// way a plugin's `hooks.yaml` is registered.
fn register_project_hooks(manager: &mut HookManager, cwd: &Path) {
    let path = cwd.join(".brynhild").join("hooks.yaml");
    let Ok(text) = std::fs::read_to_string(&path) else {
        return;
    };
    let manifest: HooksManifest = match serde_yaml::from_str(&text) {
        Ok(manifest) => manifest,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "skipping invalid project hooks.yaml");
            return;
        }
    };
    for (event_name, definitions) in manifest.hooks {
        let Some(event) = HookEvent::from_str_opt(&event_name) else {
            tracing::warn!(event = %event_name, "unknown hook event in project hooks.yaml, skipping");
            continue;
        };
        register_all(manager, event, definitions);
    }
}

fn register_all(manager: &mut HookManager, event: HookEvent, definitions: Vec<HookDefinition>) {
    for definition in definitions {
        manager.register(event, definition);
    }
}

/// Read `config[top][key]` as a string, if both levels exist and the leaf
/// is a scalar string.
#[must_use]
pub fn cfg_nested_str(config: &DeepChainMap, top: &str, key: &str) -> Option<String> {
    use brynhild_config::Frozen;
    let Ok(Frozen::Mapping(section)) = config.get(top) else {
        return None;
    };
    match section.get(key)? {
        Frozen::Scalar(brynhild_config::Value::String(s)) => Some(s),
        _ => None,
    }
}
