use std::{sync::OnceLock, time::Duration};

use reqwest::{Client, header};

/// Image generation can take well over a minute for large outputs
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Shared HTTP client so batch fan-out reuses pooled connections per provider
pub fn http_client() -> Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();

    CLIENT
        .get_or_init(|| {
            let mut headers = header::HeaderMap::new();
            headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
            headers.insert(
                header::USER_AGENT,
                header::HeaderValue::from_static(concat!("pixelmuse/", env!("CARGO_PKG_VERSION"))),
            );

            Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .connect_timeout(Duration::from_secs(15))
                .pool_idle_timeout(Some(Duration::from_secs(30)))
                .tcp_keepalive(Some(Duration::from_secs(60)))
                .default_headers(headers)
                .build()
                .expect("Failed to build default HTTP client")
        })
        .clone()
}
