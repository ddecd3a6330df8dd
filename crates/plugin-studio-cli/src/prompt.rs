//! Interactive prompts (dialoguer)

use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, MultiSelect};

use plugin_studio_core::{is_kebab_case, DiscoveredItem, Result, StudioError};

pub struct Prompt {
    theme: ColorfulTheme,
}

impl Default for Prompt {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompt {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }

    /// Pick items to watch. Zero or one item is returned without asking;
    /// otherwise everything starts checked.
    pub fn select_items(&self, items: &[DiscoveredItem]) -> Result<Vec<DiscoveredItem>> {
        if items.len() <= 1 {
            return Ok(items.to_vec());
        }

        let labels: Vec<String> = items.iter().map(item_label).collect();
        let defaults = vec![true; items.len()];

        let selections = MultiSelect::with_theme(&self.theme)
            .with_prompt("Select plugins/marketplaces to watch (space to toggle, enter to confirm)")
            .items(&labels)
            .defaults(&defaults)
            .interact()
            .map_err(prompt_error)?;

        Ok(selections.into_iter().map(|i| items[i].clone()).collect())
    }

    pub fn ask_marketplace_name(&self) -> Result<String> {
        self.ask_kebab_name("Marketplace name (kebab-case)")
    }

    pub fn ask_plugin_name(&self) -> Result<String> {
        self.ask_kebab_name("Plugin name (kebab-case)")
    }

    pub fn ask_owner_name(&self) -> Result<String> {
        let name: String = Input::with_theme(&self.theme)
            .with_prompt("Owner name")
            .validate_with(|input: &String| -> std::result::Result<(), &'static str> {
                if input.trim().is_empty() {
                    Err("Owner name is required")
                } else {
                    Ok(())
                }
            })
            .interact_text()
            .map_err(prompt_error)?;
        Ok(name.trim().to_string())
    }

    /// Empty answer means no email
    pub fn ask_owner_email(&self) -> Result<Option<String>> {
        let email: String = Input::with_theme(&self.theme)
            .with_prompt("Owner email (optional)")
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)?;
        let email = email.trim();
        Ok((!email.is_empty()).then(|| email.to_string()))
    }

    pub fn ask_description(&self, what: &str) -> Result<String> {
        let description: String = Input::with_theme(&self.theme)
            .with_prompt(format!("{what} description"))
            .validate_with(|input: &String| -> std::result::Result<(), &'static str> {
                if input.trim().is_empty() {
                    Err("Description is required")
                } else {
                    Ok(())
                }
            })
            .interact_text()
            .map_err(prompt_error)?;
        Ok(description.trim().to_string())
    }

    pub fn ask_create_plugin(&self) -> Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt("Create a plugin now?")
            .default(true)
            .interact()
            .map_err(prompt_error)
    }

    fn ask_kebab_name(&self, prompt: &str) -> Result<String> {
        let name: String = Input::with_theme(&self.theme)
            .with_prompt(prompt)
            .validate_with(|input: &String| check_kebab_name(input))
            .interact_text()
            .map_err(prompt_error)?;
        Ok(name.trim().to_string())
    }
}

fn check_kebab_name(input: &str) -> std::result::Result<(), &'static str> {
    let input = input.trim();
    if input.is_empty() {
        Err("Name is required")
    } else if !is_kebab_case(input) {
        Err("Name must be kebab-case (lowercase letters, numbers, hyphens)")
    } else {
        Ok(())
    }
}

pub fn item_label(item: &DiscoveredItem) -> String {
    format!(
        "{} {} {}",
        format!("[{}]", item.kind).cyan(),
        item.name.bold(),
        item.path.display().to_string().bright_black()
    )
}

fn prompt_error(e: dialoguer::Error) -> StudioError {
    StudioError::Prompt(e.to_string())
}
