use colored::Colorize;

use plugin_studio_core::{Result, Scaffolder};

use super::Context;
use crate::prompt::Prompt;

/// Scaffold a marketplace in the root if there is none, otherwise add a
/// plugin to the existing one
pub fn run(ctx: &Context) -> Result<()> {
    let scaffolder = Scaffolder::new(&ctx.root);
    let prompt = Prompt::new();

    if scaffolder.has_marketplace() {
        ctx.logger.info("Marketplace found. Creating plugin...");
        return create_plugin(ctx, &scaffolder, &prompt);
    }

    create_marketplace(ctx, &scaffolder, &prompt)?;
    if prompt.ask_create_plugin()? {
        create_plugin(ctx, &scaffolder, &prompt)?;
    }
    Ok(())
}

fn create_marketplace(ctx: &Context, scaffolder: &Scaffolder, prompt: &Prompt) -> Result<()> {
    ctx.logger.info("No marketplace found. Creating one...");
    ctx.logger.blank();

    let name = prompt.ask_marketplace_name()?;
    let owner = prompt.ask_owner_name()?;
    let email = prompt.ask_owner_email()?;
    let description = prompt.ask_description("Marketplace")?;

    scaffolder.create_marketplace(&name, &owner, email.as_deref(), Some(&description))?;

    ctx.logger
        .success(&format!("Created marketplace {}", name.bold()));
    ctx.logger.info(&format!(
        "  {}",
        ".claude-plugin/marketplace.json".bright_black()
    ));
    ctx.logger.blank();
    Ok(())
}

fn create_plugin(ctx: &Context, scaffolder: &Scaffolder, prompt: &Prompt) -> Result<()> {
    let mut name = prompt.ask_plugin_name()?;
    while scaffolder.plugin_exists(&name) || ctx.root.join(&name).exists() {
        ctx.logger
            .error(&format!("Plugin \"{}\" already exists in marketplace", name));
        name = prompt.ask_plugin_name()?;
    }
    let description = prompt.ask_description("Plugin")?;

    scaffolder.create_plugin(&name, Some(&description))?;
    scaffolder.add_plugin_to_marketplace(&name, Some(&description))?;

    ctx.logger.success(&format!("Created plugin {}", name.bold()));
    for file in created_files(&name) {
        ctx.logger.info(&format!("  {}", file.bright_black()));
    }
    ctx.logger.blank();
    Ok(())
}

fn created_files(plugin: &str) -> [String; 2] {
    [
        format!("{plugin}/.claude-plugin/plugin.json"),
        format!("{plugin}/skills/summarize-project/SKILL.md"),
    ]
}
