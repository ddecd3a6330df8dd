use plugin_studio_core::{Result, StudioError, Validator};

use super::Context;

/// Validate every discovered item once. Fails when any item is invalid.
pub async fn run(ctx: &Context) -> Result<()> {
    let items = ctx.scan()?;
    let validator = Validator::from_config(&ctx.config);

    let mut failed = 0;
    for item in &items {
        ctx.logger.info(&format!("Validating {}...", item.name));

        let result = validator.validate_item(item).await;
        if result.valid {
            ctx.logger.success(&format!("{} is valid", item.name));
        } else {
            failed += 1;
            ctx.logger.validation_errors(&result.errors);
        }
    }

    if failed > 0 {
        return Err(StudioError::ValidationFailed { count: failed });
    }
    Ok(())
}
