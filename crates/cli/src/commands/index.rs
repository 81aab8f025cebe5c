//! Email/mobile index commands.

use basket_core::{Email, EmailMobileIndex};
use basket_data::UserDataSource;

use super::{CommandError, Context, parse_mobile, print_json};

/// Print the index, or an empty one if it was never written.
///
/// # Errors
///
/// Returns `CommandError::DataSource` if the read fails.
pub async fn show(ctx: &Context) -> Result<(), CommandError> {
    let index = ctx
        .source
        .get_emails_and_mobiles()
        .await?
        .unwrap_or_default();
    print_json(&index)
}

/// Record an email and mobile number in the index.
///
/// # Errors
///
/// Returns `CommandError::InvalidEmail`/`InvalidMobile` for malformed input,
/// or `CommandError::DataSource` if the write fails.
pub async fn add(ctx: &Context, email: &str, mobile: &str) -> Result<(), CommandError> {
    let email = Email::parse(email)?;
    let mobile = parse_mobile(mobile)?;
    ctx.source.update_emails_and_mobiles(&email, &mobile).await?;

    let index: EmailMobileIndex = ctx
        .source
        .get_emails_and_mobiles()
        .await?
        .unwrap_or_default();
    tracing::info!(
        emails = index.emails.len(),
        mobiles = index.mobiles.len(),
        "Index updated"
    );
    Ok(())
}
