use crate::configuration::HttpSettings;
use crate::download::{self, DownloadError};
use crate::extract::{extract, ExtractError};
use crate::http_client::{self, Session, SessionError};
use crate::models::{ComicRule, FetchResult};
use chrono::NaiveDate;
use log::{debug, warn};
use reqwest::StatusCode;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("request for {0} failed")]
    Network(String, #[source] reqwest_middleware::Error),
    #[error("{url} returned {status}")]
    HttpStatus { url: String, status: StatusCode },
    #[error("unable to read body of {0}")]
    Body(String, #[source] reqwest::Error),
    #[error("{what} pattern `{pattern}` matched nothing on {url}")]
    ExtractionFailed {
        what: &'static str,
        pattern: String,
        url: String,
    },
    #[error(transparent)]
    InvalidPattern(#[from] ExtractError),
    #[error(transparent)]
    Download(#[from] DownloadError),
}

/// Everything a fetch needs besides the rule itself.
#[derive(Debug, Clone, Copy)]
pub struct FetchContext<'a> {
    pub date: NaiveDate,
    pub dir: &'a Path,
    pub http: &'a HttpSettings,
}

/// Resolves the image of one comic and stores it as `{id}-{date}{ext}` in the
/// output directory.
pub async fn fetch(
    rule: &ComicRule,
    id: &str,
    ctx: FetchContext<'_>,
) -> Result<FetchResult, FetchError> {
    let http = http_client::session(rule.agent.as_deref(), ctx.http)?;

    let mut page_url = rule.url.clone();
    let mut page = get_text(&http, &page_url, ctx.http.timeout()).await?;

    if let Some(url_change) = &rule.url_change {
        page_url = required(&page, url_change, "url_change", &page_url)?;
        debug!("{}: following {}", id, page_url);
        page = get_text(&http, &page_url, ctx.http.timeout()).await?;
    }

    let reference = required(&page, &rule.pattern, "image", &page_url)?;
    let image_url = match &rule.base {
        Some(base) => format!("{}{}", base, reference),
        None => reference,
    };
    debug!("{}: image at {}", id, image_url);

    let caption = match &rule.alt {
        Some(alt) => {
            let caption = extract(&page, alt)?;
            if caption.is_none() {
                warn!("{}: alt pattern matched nothing, leaving caption empty", id);
            }
            caption
        }
        None => None,
    };

    let image = download::download(
        &http,
        &image_url,
        id,
        ctx.date,
        ctx.dir,
        ctx.http.image_timeout(),
    )
    .await?;

    Ok(FetchResult {
        image_url,
        image,
        caption,
    })
}

async fn get_text(http: &Session, url: &str, timeout: Duration) -> Result<String, FetchError> {
    let res = http
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| FetchError::Network(url.to_string(), e))?;
    if !res.status().is_success() {
        return Err(FetchError::HttpStatus {
            url: url.to_string(),
            status: res.status(),
        });
    }
    res.text()
        .await
        .map_err(|e| FetchError::Body(url.to_string(), e))
}

fn required(
    page: &str,
    pattern: &str,
    what: &'static str,
    url: &str,
) -> Result<String, FetchError> {
    extract(page, pattern)?.ok_or_else(|| FetchError::ExtractionFailed {
        what,
        pattern: pattern.to_string(),
        url: url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    fn no_retries() -> HttpSettings {
        HttpSettings {
            retries: 0,
            ..HttpSettings::default()
        }
    }

    fn rule(url: String) -> ComicRule {
        ComicRule {
            title: "Foo Bar".into(),
            url,
            pattern: "src=\"([^\"]+)\"".into(),
            url_change: None,
            base: None,
            alt: None,
            agent: None,
        }
    }

    async fn serve(server: &MockServer, at: &str, body: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(body)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn absolute_image_reference() {
        let server = MockServer::start().await;
        let image_url = format!("{}/foo.png", server.uri());
        let page = format!("<html><img src=\"{}\"></html>", image_url);
        serve(&server, "/a", ResponseTemplate::new(200).set_body_string(page)).await;
        serve(
            &server,
            "/foo.png",
            ResponseTemplate::new(200).set_body_bytes(b"PNG".to_vec()),
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let http = no_retries();
        let ctx = FetchContext {
            date: date(),
            dir: dir.path(),
            http: &http,
        };

        let result = fetch(&rule(format!("{}/a", server.uri())), "foobar", ctx)
            .await
            .unwrap();

        assert_eq!(image_url, result.image_url);
        assert_eq!("foobar-2024-03-09.png", result.image);
        assert_eq!(None, result.caption);
        assert_eq!(b"PNG".to_vec(), std::fs::read(dir.path().join(result.image)).unwrap());
    }

    #[tokio::test]
    async fn interstitial_base_and_caption() {
        let server = MockServer::start().await;
        let landing = "<a class=\"today\" href=\"URI/2024/03/09\">today</a>\
                       <img src=\"/wrong.png\" title=\"landing caption\">"
            .replace("URI", &server.uri());
        let strip = "<img\n  title=\"Second page\ncaption\"\n  src=\"/strips/0309.jpg\">";
        serve(&server, "/latest", ResponseTemplate::new(200).set_body_string(landing)).await;
        serve(&server, "/2024/03/09", ResponseTemplate::new(200).set_body_string(strip)).await;
        Mock::given(method("GET"))
            .and(path("/strips/0309.jpg"))
            .and(header("user-agent", "Mozilla/5.0"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"JPG".to_vec()))
            .expect(1)
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let http = no_retries();
        let ctx = FetchContext {
            date: date(),
            dir: dir.path(),
            http: &http,
        };
        let rule = ComicRule {
            url_change: Some("class=\"today\" href=\"([^\"]+)\"".into()),
            base: Some(server.uri()),
            alt: Some("title=\"(.*?)\"".into()),
            agent: Some("Mozilla/5.0".into()),
            ..rule(format!("{}/latest", server.uri()))
        };

        let result = fetch(&rule, "foobar", ctx).await.unwrap();

        assert_eq!(format!("{}/strips/0309.jpg", server.uri()), result.image_url);
        assert_eq!("foobar-2024-03-09.jpg", result.image);
        assert_eq!(Some("Second page\ncaption".to_string()), result.caption);
    }

    #[tokio::test]
    async fn base_is_plain_concatenation() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/a",
            ResponseTemplate::new(200).set_body_string("<img src=\"img/x.gif\">"),
        )
        .await;
        serve(&server, "/img/x.gif", ResponseTemplate::new(200)).await;
        let dir = tempfile::tempdir().unwrap();
        let http = no_retries();
        let ctx = FetchContext {
            date: date(),
            dir: dir.path(),
            http: &http,
        };
        let rule = ComicRule {
            base: Some(format!("{}/", server.uri())),
            ..rule(format!("{}/a", server.uri()))
        };

        let result = fetch(&rule, "foobar", ctx).await.unwrap();
        assert_eq!(format!("{}/img/x.gif", server.uri()), result.image_url);
    }

    #[tokio::test]
    async fn missing_caption_is_tolerated() {
        let server = MockServer::start().await;
        let page = format!("<img src=\"{}/foo.png\">", server.uri());
        serve(&server, "/a", ResponseTemplate::new(200).set_body_string(page)).await;
        serve(&server, "/foo.png", ResponseTemplate::new(200)).await;
        let dir = tempfile::tempdir().unwrap();
        let http = no_retries();
        let ctx = FetchContext {
            date: date(),
            dir: dir.path(),
            http: &http,
        };
        let rule = ComicRule {
            alt: Some("title=\"([^\"]+)\"".into()),
            ..rule(format!("{}/a", server.uri()))
        };

        let result = fetch(&rule, "foobar", ctx).await.unwrap();
        assert_eq!(None, result.caption);
    }

    #[tokio::test]
    async fn url_change_without_match_fails() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/a",
            ResponseTemplate::new(200).set_body_string("<img src=\"http://x/foo.png\">"),
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let http = no_retries();
        let ctx = FetchContext {
            date: date(),
            dir: dir.path(),
            http: &http,
        };
        let rule = ComicRule {
            url_change: Some("href=\"([^\"]+)\"".into()),
            ..rule(format!("{}/a", server.uri()))
        };

        let err = fetch(&rule, "foobar", ctx).await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::ExtractionFailed { what: "url_change", .. }
        ));
        assert_eq!(0, std::fs::read_dir(dir.path()).unwrap().count());
    }

    #[tokio::test]
    async fn error_page_fails() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/a",
            ResponseTemplate::new(403).set_body_string("<img src=\"http://x/foo.png\">"),
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let http = no_retries();
        let ctx = FetchContext {
            date: date(),
            dir: dir.path(),
            http: &http,
        };

        let err = fetch(&rule(format!("{}/a", server.uri())), "foobar", ctx)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FetchError::HttpStatus { status, .. } if status == StatusCode::FORBIDDEN
        ));
    }

    #[tokio::test]
    async fn slow_page_times_out() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/a",
            ResponseTemplate::new(200)
                .set_body_string("<img src=\"http://x/foo.png\">")
                .set_delay(std::time::Duration::from_millis(1500)),
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let http = HttpSettings {
            timeout_seconds: 1,
            ..no_retries()
        };
        let ctx = FetchContext {
            date: date(),
            dir: dir.path(),
            http: &http,
        };

        let err = fetch(&rule(format!("{}/a", server.uri())), "foobar", ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Network(..)));
    }

    #[tokio::test]
    async fn invalid_pattern_fails() {
        let server = MockServer::start().await;
        serve(&server, "/a", ResponseTemplate::new(200).set_body_string("x")).await;
        let dir = tempfile::tempdir().unwrap();
        let http = no_retries();
        let ctx = FetchContext {
            date: date(),
            dir: dir.path(),
            http: &http,
        };
        let rule = ComicRule {
            pattern: "src=\"([^\"]+\"".into(),
            ..rule(format!("{}/a", server.uri()))
        };

        let err = fetch(&rule, "foobar", ctx).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidPattern(_)));
    }
}
