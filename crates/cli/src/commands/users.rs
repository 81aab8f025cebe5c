//! User lookup commands.

use basket_core::UserId;
use basket_data::{DataSourceError, UserDataSource};

use super::{CommandError, Context, parse_mobile, print_json};

/// Print one user, looked up by ID or by mobile number.
///
/// # Errors
///
/// Returns `CommandError::DataSource` with `NotFound` if there is no match.
pub async fn show(
    ctx: &Context,
    id: Option<&str>,
    mobile: Option<&str>,
) -> Result<(), CommandError> {
    let user = match (id, mobile) {
        (Some(id), _) => ctx.source.get_user_by_id(&UserId::new(id)).await?,
        (None, Some(mobile)) => {
            ctx.source
                .get_user_by_mobile(&parse_mobile(mobile)?)
                .await?
        }
        (None, None) => return Err(DataSourceError::user_not_found().into()),
    };
    print_json(&user)
}

/// Check a mobile/password pair and print the matching user IDs.
///
/// # Errors
///
/// Returns `CommandError::InvalidMobile` for a malformed number, or
/// `CommandError::DataSource` if the lookup fails.
pub async fn login(ctx: &Context, mobile: &str, password: &str) -> Result<(), CommandError> {
    let matches = ctx
        .source
        .get_user_by_mobile_and_password(&parse_mobile(mobile)?, password)
        .await?;

    if matches.is_empty() {
        tracing::warn!(mobile, "Invalid credentials");
    } else {
        tracing::info!(count = matches.len(), "Credentials accepted");
    }

    let ids: Vec<&UserId> = matches.iter().map(|u| &u.user_id).collect();
    print_json(&ids)
}
