use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

use crate::error::ZoomError;

const REACHABILITY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared HTTP client. Only the connect phase is bounded here; body reads are
/// bounded per chunk by the download executor.
pub fn build_client(connect_timeout: Duration) -> Result<Client, ZoomError> {
    Ok(Client::builder()
        .connect_timeout(connect_timeout)
        .user_agent(concat!("zoomdl/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Fails with [`ZoomError::NetworkUnavailable`] when `url` cannot be reached.
/// Any HTTP response, whatever its status, counts as reachable.
pub async fn check_reachability(client: &Client, url: &str) -> Result<(), ZoomError> {
    match client.get(url).timeout(REACHABILITY_TIMEOUT).send().await {
        Ok(response) => {
            debug!("Reachability check {} returned {}", url, response.status());
            Ok(())
        }
        Err(err) if err.is_connect() || err.is_timeout() => {
            Err(ZoomError::NetworkUnavailable(err.to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

/// Append the access token as a query parameter, keeping existing ones.
pub fn authorize_url(download_url: &str, access_token: &str) -> String {
    match Url::parse(download_url) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("access_token", access_token);
            url.into()
        }
        Err(_) => format!("{download_url}?access_token={access_token}"),
    }
}
