//! Image retrieval for the viewer
//!
//! Every image is handed to the viewer as PNG, whatever the wiki serves.

use image::ImageFormat;
use reqwest::Client;
use std::io::Cursor;
use thiserror::Error;

/// User agent sent with image requests; the image host rejects unknown agents
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (compatible; Magic Browser)";

/// Why an image could not be shown
#[derive(Debug, Error)]
pub enum ImageFetchError {
    #[error("request for {url} failed: {source}")]
    Network {
        url: String,
        source: reqwest::Error,
    },

    #[error("HTTP {code} for {url}")]
    HttpStatus { url: String, code: u16 },

    #[error("could not decode image from {url}: {source}")]
    Decode {
        url: String,
        source: image::ImageError,
    },

    #[error("could not encode PNG: {0}")]
    Encode(#[source] image::ImageError),
}

/// Builds the client used for image requests
pub fn build_image_client() -> Result<Client, reqwest::Error> {
    Client::builder().user_agent(BROWSER_USER_AGENT).build()
}

/// Fetches `url` and returns the image as PNG bytes
///
/// PNG responses are passed through untouched; anything else the `image`
/// crate can decode is re-encoded.
pub async fn fetch_image_bytes(client: &Client, url: &str) -> Result<Vec<u8>, ImageFetchError> {
    tracing::debug!("Fetching image: {}", url);

    let network = |source| ImageFetchError::Network {
        url: url.to_string(),
        source,
    };

    let response = client.get(url).send().await.map_err(network)?;
    let status = response.status();
    if !status.is_success() {
        return Err(ImageFetchError::HttpStatus {
            url: url.to_string(),
            code: status.as_u16(),
        });
    }

    let bytes = response.bytes().await.map_err(network)?;

    if matches!(image::guess_format(&bytes), Ok(ImageFormat::Png)) {
        return Ok(bytes.to_vec());
    }

    let decoded = image::load_from_memory(&bytes).map_err(|source| ImageFetchError::Decode {
        url: url.to_string(),
        source,
    })?;
    encode_png(&decoded)
}

/// Encodes a decoded image as PNG
pub fn encode_png(image: &image::DynamicImage) -> Result<Vec<u8>, ImageFetchError> {
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(ImageFetchError::Encode)?;
    Ok(png)
}
