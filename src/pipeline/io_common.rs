use crate::pipeline::*;

use std::time::Duration;

/// Fixed timeout applied to every outgoing request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Performs a single blocking GET against a reference service.
///
/// There is exactly one attempt and no backoff: callers either treat a
/// failure as fatal or substitute a default and continue.
pub fn http_get_text(url: &str) -> PipelineResult<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context(HttpRequestSnafu { url })?;
    let response = client.get(url).send().context(HttpRequestSnafu { url })?;
    let status = response.status();
    ensure!(
        status.is_success(),
        HttpStatusSnafu {
            url,
            status: status.as_u16()
        }
    );
    response.text().context(HttpRequestSnafu { url })
}
