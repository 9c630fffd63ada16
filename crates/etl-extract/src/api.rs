//! REST API extraction.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::info;

use etl_core::error::{EtlError, Result};
use etl_core::frame::SourceFrame;

use crate::json_file::frame_from_json_value;

/// HTTP request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Issue a GET request and map the JSON response body to a frame.
///
/// A transport failure, a timeout, or a non-2xx status is
/// [`EtlError::Network`]; a 2xx response whose body is not valid JSON is
/// [`EtlError::Parse`]. There is no retry: a failed request ends the run.
pub fn extract_from_api(url: &str, params: &BTreeMap<String, String>) -> Result<SourceFrame> {
    let client = Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|error| EtlError::Network(error.to_string()))?;

    let mut request = client.get(url);
    if !params.is_empty() {
        request = request.query(params);
    }
    let response = request
        .send()
        .map_err(|error| EtlError::Network(error.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(EtlError::Network(format!("{url} returned {status}")));
    }

    let body = response
        .text()
        .map_err(|error| EtlError::Network(error.to_string()))?;
    let value: serde_json::Value =
        serde_json::from_str(&body).map_err(|error| EtlError::parse(url, error.to_string()))?;

    let frame = frame_from_json_value(&value, url)?;
    info!(
        source = %url,
        rows = frame.row_count(),
        columns = frame.column_count(),
        "api extraction complete"
    );
    Ok(frame)
}
