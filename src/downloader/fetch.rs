use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;

pub fn bytes(client: &Client, url: &str) -> Result<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("GET {} failed", url))?;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        bail!("GET {} returned HTTP {}", url, status);
    }

    Ok(response.bytes()?.to_vec())
}

pub fn text(client: &Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("GET {} failed", url))?;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        bail!("GET {} returned HTTP {}", url, status);
    }

    Ok(response.text()?)
}
