//! Seed the store with users from a YAML file.
//!
//! # File format
//!
//! ```yaml
//! users:
//!   - userId: u-1
//!     name: Asha
//!     email: asha@example.com
//!     mobile: "9876543210"
//!     password: hunter22
//!     addresses:
//!       - addressId: home
//!         city: Pune
//!     cart: []
//! ```
//!
//! Users whose `userId` already exists are skipped. Every added user with an
//! email is also recorded in the email/mobile index.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use basket_core::UserRecord;
use basket_data::{DataSourceError, UserDataSource};

use super::{CommandError, Context};

/// Top-level layout of a seed file.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub users: Vec<UserRecord>,
}

/// Counts reported after seeding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub inserted: usize,
    pub skipped: usize,
}

/// Read `path` and add its users.
///
/// # Errors
///
/// Returns `CommandError::ReadFile` or `CommandError::InvalidYaml` if the file
/// cannot be loaded, or `CommandError::DataSource` on the first write that
/// fails for a reason other than a duplicate user.
pub async fn from_file(ctx: &Context, path: &Path) -> Result<SeedSummary, CommandError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
    let file: SeedFile = serde_yaml::from_str(&content)?;
    info!(path = %path.display(), users = file.users.len(), "Parsed seed file");

    let summary = seed_users(&ctx.source, &file.users).await?;

    info!("Seeding complete!");
    info!("  Users inserted: {}", summary.inserted);
    info!("  Users skipped (already exist): {}", summary.skipped);
    info!("  Store: {}", ctx.data_path().display());
    Ok(summary)
}

/// Add `users` through `source`, skipping duplicates.
///
/// # Errors
///
/// Returns the first `DataSourceError` that is not a `Conflict`.
pub async fn seed_users(
    source: &impl UserDataSource,
    users: &[UserRecord],
) -> Result<SeedSummary, CommandError> {
    let mut summary = SeedSummary::default();

    for user in users {
        match source.add_user(user).await {
            Ok(_) => summary.inserted += 1,
            Err(DataSourceError::Conflict(reason)) => {
                warn!(user_id = %user.user_id, %reason, "Skipping existing user");
                summary.skipped += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        }

        if let Some(email) = &user.email {
            source.update_emails_and_mobiles(email, &user.mobile).await?;
        }
    }

    Ok(summary)
}
