use crate::output::print_json;
use agile_core::{config::Config, issue, paths, types::Stage};
use anyhow::Context;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let fresh = issue::init(root)
        .with_context(|| format!("failed to create {}", paths::agile_dir(root).display()))?;

    let config_path = paths::config_path(root);
    let config_created = !config_path.exists();
    if config_created {
        Config::default()
            .save(root)
            .context("failed to write agile/config.yaml")?;
    }

    if json {
        return print_json(&serde_json::json!({
            "root": root,
            "created": fresh,
            "config_created": config_created,
        }));
    }

    println!("Initializing agile in: {}", root.display());
    for stage in Stage::all() {
        println!("  ready:   {}/{stage}", paths::AGILE_DIR);
    }
    println!("  ready:   {}", paths::ARCHIVE_DIR);
    if config_created {
        println!("  created: {}", paths::CONFIG_FILE);
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
    }
    Ok(())
}
