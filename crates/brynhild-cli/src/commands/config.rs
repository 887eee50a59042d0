//! `brynhild config show|path` (spec.md §6).

use crate::app::App;

/// Print the fully merged configuration as YAML.
pub fn show(app: &App) -> anyhow::Result<()> {
    let dict: serde_json::Value = app.config.to_dict().into();
    let yaml = serde_yaml::to_string(&dict)?;
    print!("{yaml}");
    Ok(())
}

/// Print which configuration layers contributed, highest priority first.
pub fn path(cwd: std::path::PathBuf) -> anyhow::Result<()> {
    let loader = brynhild_config::ConfigLoader::new().with_project_root(cwd);
    let (_, layers) = loader.load()?;
    for layer in layers {
        let kind = match layer.kind {
            brynhild_config::ConfigLayerKind::EnvOverrides => "env-overrides",
            brynhild_config::ConfigLayerKind::Project => "project",
            brynhild_config::ConfigLayerKind::User => "user",
            brynhild_config::ConfigLayerKind::Deployment => "deployment",
            brynhild_config::ConfigLayerKind::Site => "site",
            brynhild_config::ConfigLayerKind::Defaults => "defaults",
        };
        match layer.path {
            Some(path) => println!("{kind}\t{}", path.display()),
            None => println!("{kind}\t<none>"),
        }
    }
    Ok(())
}
