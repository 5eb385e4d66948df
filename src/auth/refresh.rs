// Token refresh calls

use anyhow::{Context, Result};
use reqwest::{Client, Url};
use std::time::Duration;

use super::types::{RefreshRequest, RefreshResponse};
use crate::realm::Realm;
use crate::store::TokenPair;

/// Call the realm's refresh endpoint with its stored refresh token.
///
/// The call carries its own timeout: a refresh that never settles would
/// otherwise leave the realm in flight forever with every later failure
/// queued behind it, so a hang is forced onto the failure path.
pub async fn refresh_realm(
    client: &Client,
    base_url: &Url,
    realm: Realm,
    refresh_token: &str,
    timeout: Duration,
) -> Result<TokenPair> {
    tracing::info!(realm = ?realm, "Refreshing session token...");

    let url = base_url
        .join(realm.refresh_path())
        .context("Invalid refresh endpoint URL")?;

    let request = RefreshRequest {
        refresh_token: refresh_token.to_string(),
    };

    let response = client
        .post(url)
        .timeout(timeout)
        .json(&request)
        .send()
        .await
        .context("Failed to send refresh request")?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        tracing::error!(
            realm = ?realm,
            status = %status,
            body = %error_text,
            "Token refresh rejected"
        );
        anyhow::bail!("Token refresh failed: {} - {}", status, error_text);
    }

    let data: RefreshResponse = response
        .json()
        .await
        .context("Failed to parse refresh response")?;

    if data.token.is_empty() {
        anyhow::bail!("Refresh response does not contain a token");
    }

    // Keep the old refresh token unless the backend rotated it
    let rotated = data
        .refresh_token
        .unwrap_or_else(|| refresh_token.to_string());

    tracing::info!(realm = ?realm, "Session token refreshed");

    Ok(TokenPair::new(data.token, rotated))
}
