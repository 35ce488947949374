use crate::http_client::Session;
use chrono::NaiveDate;
use futures::StreamExt;
use log::{debug, info};
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::{fs::File, io::AsyncWriteExt};
use url::Url;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("`{0}` is not a valid image url")]
    InvalidUrl(String, #[source] url::ParseError),
    #[error("request for image {0} failed")]
    Network(String, #[source] reqwest_middleware::Error),
    #[error("image {url} returned {status}")]
    HttpStatus { url: String, status: StatusCode },
    #[error("error while receiving image {0}")]
    Stream(String, #[source] reqwest::Error),
    #[error("unable to write {}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),
}

/// `{id}-{YYYY-MM-DD}{ext}`, `ext` being the extension of the url path
/// including its dot, or nothing when the path has none.
pub fn image_filename(image_url: &Url, comic_id: &str, date: NaiveDate) -> String {
    let ext = Path::new(image_url.path())
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    format!("{}-{}{}", comic_id, date.format("%Y-%m-%d"), ext)
}

/// Streams `image_url` into `dir` and returns the file name written.
///
/// Nothing is created unless the server answered with a success status. A
/// transfer that breaks halfway leaves the partial file behind. `timeout`
/// bounds the whole transfer, body included.
pub async fn download(
    http: &Session,
    image_url: &str,
    comic_id: &str,
    date: NaiveDate,
    dir: &Path,
    timeout: Duration,
) -> Result<String, DownloadError> {
    let url = Url::parse(image_url)
        .map_err(|e| DownloadError::InvalidUrl(image_url.to_string(), e))?;
    let filename = image_filename(&url, comic_id, date);

    let res = http
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| DownloadError::Network(image_url.to_string(), e))?;
    if !res.status().is_success() {
        return Err(DownloadError::HttpStatus {
            url: image_url.to_string(),
            status: res.status(),
        });
    }

    let path = dir.join(&filename);
    debug!("Creating {}", path.display());
    let io_err = |e| DownloadError::Io(path.clone(), e);
    let mut file = File::create(&path).await.map_err(io_err)?;

    let mut written = 0;
    let mut stream = res.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DownloadError::Stream(image_url.to_string(), e))?;
        file.write_all(&chunk).await.map_err(io_err)?;
        written += chunk.len();
    }
    file.flush().await.map_err(io_err)?;

    info!("Wrote {} ({} bytes)", filename, written);
    Ok(filename)
}
