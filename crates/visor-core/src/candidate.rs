//! Candidate reachability probing
//!
//! Basic checking for ICE-style streaming candidates. A probe issues a
//! single GET and resolves as soon as response headers are observed;
//! streaming endpoints hold the connection open indefinitely, so full
//! completion is never required.

use reqwest::Client;
use tracing::{debug, warn};

/// Probes a candidate URL, resolving exactly once with the
/// reachability verdict.
///
/// The verdict is optimistic by design: observed response headers count
/// as reachable regardless of status code, and an exchange that
/// terminates without any observable response is also reported
/// reachable, since streaming sources routinely drop probe requests
/// instead of answering them. Only a missing transport produces
/// `false` (see [`check_candidate`]).
pub async fn probe_candidate(url: &str) -> bool {
    debug!(url, "checking candidate");
    let client = match Client::builder().build() {
        Ok(client) => client,
        Err(error) => {
            warn!(url, %error, "no transport available for candidate check");
            return false;
        }
    };

    match client.get(url).send().await {
        Ok(response) => {
            debug!(url, status = %response.status(), "candidate responded");
            // Closing the exchange inside the completion turn crashed
            // transports in the field; release it on the next tick.
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                drop(response);
            });
            true
        }
        Err(error) => {
            debug!(url, %error, "candidate exchange ended without a response");
            true
        }
    }
}

/// Checks a candidate URL and invokes `callback(url, reachable)`
/// exactly once.
///
/// The probe runs on the current tokio runtime and the callback is
/// delivered from its task queue, never synchronously from this call.
/// Without a runtime there is no asynchronous transport at all and the
/// callback fires synchronously with `false`. Concurrent checks are
/// fully independent.
pub fn check_candidate<F>(url: impl Into<String>, callback: F)
where
    F: FnOnce(&str, bool) + Send + 'static,
{
    let url = url.into();
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                let reachable = probe_candidate(&url).await;
                callback(&url, reachable);
            });
        }
        Err(_) => {
            warn!(url = %url, "no asynchronous transport for candidate check");
            callback(&url, false);
        }
    }
}
