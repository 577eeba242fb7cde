use crate::PlatformCredentials;
use lazy_static::lazy_static;
use log::warn;
use std::io;
use std_semaphore::Semaphore;

/// The maximum number of simultaneous HTTP requests allowed.
///
/// Used in conjunction with a semaphore to limit the number of active requests
/// against the platform data service at any given time. Adjusting this value
/// should be based on the service's capacity and the application's needs.
const SIMULTANEOUS_REQUESTS_LIMIT: isize = 20;

/// Enumeration representing the types of HTTP request methods.
///
/// Used throughout the gateway to specify the method for a request. The `Put`
/// and `Post` variants carry the JSON body to send.
#[derive(Clone)]
pub enum HttpMethod {
    Get,
    Put(serde_json::Value),
    Post(serde_json::Value),
    Delete,
}

// Type alias for HTTP request results: either a successful blocking response
// or an error represented by a u16 status code (0 for transport failures).
pub type HttpRequestResult = Result<reqwest::blocking::Response, u16>;

// Global semaphore for managing simultaneous HTTP requests. Initialized once
// and kept for the duration of the program.
lazy_static! {
    static ref SEMAPHORE: Semaphore = Semaphore::new(SIMULTANEOUS_REQUESTS_LIMIT);
}

/// Sends an HTTP request with a single attempt.
///
/// Constructs and sends a request using the shared blocking client from the
/// credentials. Network or client errors map to the generic error code 0.
/// Designed to be called within the retry loop of `send_http_request`.
fn send_http_request_single_attempt(
    method: HttpMethod,
    url: &str,
    platform_info: &PlatformCredentials,
    params: Vec<(String, String)>,
) -> HttpRequestResult {
    let _guard = SEMAPHORE.access();

    let request_builder = match &method {
        HttpMethod::Get => platform_info
            .client
            .get(url)
            .bearer_auth(&platform_info.token_platform)
            .query(&params),
        HttpMethod::Put(body) => platform_info
            .client
            .put(url)
            .bearer_auth(&platform_info.token_platform)
            .json(body),
        HttpMethod::Post(body) => platform_info
            .client
            .post(url)
            .bearer_auth(&platform_info.token_platform)
            .json(body),
        HttpMethod::Delete => platform_info
            .client
            .delete(url)
            .bearer_auth(&platform_info.token_platform)
            .query(&params),
    };

    let response = request_builder.send();

    match response {
        Ok(response) if response.status().is_success() => Ok(response),
        Ok(response) => Err(response.status().as_u16()),
        Err(_) => Err(0),
    }
}

/// Sends an HTTP request with retry logic.
///
/// Attempts the request up to `max_attempts` times. A delay is introduced
/// between retries for 403 responses, which usually represent rate limiting or
/// similar temporary restrictions. Other failures are returned immediately.
pub fn send_http_request(
    method: HttpMethod,
    url: &str,
    platform_info: &PlatformCredentials,
    params: Vec<(String, String)>,
) -> Result<reqwest::blocking::Response, Box<dyn std::error::Error>> {
    let mut attempts = 0;
    let max_attempts = 5;

    // Retry loop.
    while attempts < max_attempts {
        match send_http_request_single_attempt(method.clone(), url, platform_info, params.clone()) {
            Ok(response) => return Ok(response),
            Err(status) if status == 403 && attempts < max_attempts - 1 => {
                // Retry for 403 status codes.
                attempts += 1;
                warn!(
                    "request to {} rejected with 403, retrying ({}/{})",
                    url, attempts, max_attempts
                );
                std::thread::sleep(std::time::Duration::from_millis(1000));
            }
            Err(status) => {
                return Err(Box::new(io::Error::new(
                    io::ErrorKind::Other,
                    format!("HTTP request failed with status code: {}", status),
                )));
            }
        }
    }

    Err(Box::new(io::Error::new(
        io::ErrorKind::PermissionDenied,
        "All retry attempts failed with status 403",
    )))
}
