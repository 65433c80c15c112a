//! Upstream session token commands.
//!
//! # Usage
//!
//! ```bash
//! # Acquire a token for the driver listing report (default purpose)
//! edepot token
//!
//! # Acquire a token for a specific report
//! edepot token --purpose CMS_TaiKhoan_ThongTin
//! ```

use edepot_client::{EDepotClient, EDepotConfig};

use super::CommandError;

/// Acquire a session token and report whether it succeeded.
///
/// The token itself is never printed.
pub async fn acquire(purpose: Option<&str>) -> Result<(), CommandError> {
    let config = EDepotConfig::from_env()?;
    let client = EDepotClient::new(&config)?;
    let purpose_label = purpose.unwrap_or(&config.driver_report).to_string();

    if client.acquire_token(purpose, None).await {
        tracing::info!("Acquired session token for {purpose_label}");
        Ok(())
    } else {
        Err(CommandError::TokenRejected(purpose_label))
    }
}
