//! Artefact retrieval from the OpenVINO storage server.
//!
//! [`Downloader`] fetches a URL into a local file; [`Retriever`] adds the
//! read-through cache used for both the storage manifest and the package
//! archives. Both are traits so tests can inject behaviour without network
//! access.

use crate::filetree::STORAGE_URL;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// Connection timeout for storage requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Overall timeout for a single download; archives run to a few hundred MB.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Trait for downloading a URL into a local file.
///
/// # Examples
///
/// ```
/// use openvino_installer::artefact::download::HttpDownloader;
///
/// let downloader = HttpDownloader;
/// // Use downloader.download(url, dest) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait Downloader {
    /// Download `url` and write the body to `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the file cannot be written.
    fn download(&self, url: &str, dest: &Path) -> Result<(), DownloadError>;
}

/// Trait for obtaining a file either from the cache or from the network.
#[cfg_attr(test, mockall::automock)]
pub trait Retriever {
    /// Ensure the file behind `url` exists at `local_path` and return that path.
    ///
    /// # Errors
    ///
    /// Returns an error if neither the cache nor the network can supply the
    /// file.
    fn fetch_or_cache_hit(&self, url: &str, local_path: &Path) -> Result<PathBuf, DownloadError>;
}

/// Errors arising from artefact retrieval.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested file was not found (HTTP 404).
    #[error("artefact not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// The URL has no final path segment to name the local file after.
    #[error("cannot derive a file name from {url}")]
    MissingFileName {
        /// The offending URL.
        url: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP-based downloader using `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpDownloader;

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        info!("downloading: {url} ==> {}", dest.display());
        let bytes = download_to_file(url, dest)?;
        info!("finished downloading {bytes} bytes");
        Ok(())
    }
}

/// Retriever that consults a cache directory before downloading.
///
/// Cache entries are keyed by the file name of the requested local path,
/// prefixed with the URL's host for anything not served by the default
/// storage server. Without a cache directory every request goes to the
/// network. A cache directory that is also the download directory works:
/// a file is never copied onto itself.
pub struct CachedRetriever<'a> {
    downloader: &'a dyn Downloader,
    cache_dir: Option<PathBuf>,
}

impl<'a> CachedRetriever<'a> {
    /// Create a retriever backed by `cache_dir`.
    #[must_use]
    pub fn new(downloader: &'a dyn Downloader, cache_dir: Option<PathBuf>) -> Self {
        Self {
            downloader,
            cache_dir,
        }
    }

    /// The cache directory, if caching is enabled.
    #[must_use]
    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }
}

impl Retriever for CachedRetriever<'_> {
    fn fetch_or_cache_hit(&self, url: &str, local_path: &Path) -> Result<PathBuf, DownloadError> {
        let Some(cache_dir) = self.cache_dir.as_deref() else {
            self.downloader.download(url, local_path)?;
            return Ok(local_path.to_path_buf());
        };

        let key = cache_key(url, local_path)?;
        let cached = cache_dir.join(&key);
        if cached.is_file() {
            info!("cache hit for {key}: {}", cached.display());
            if !is_same_file(&cached, local_path) {
                copy_file(&cached, local_path)?;
            }
            return Ok(local_path.to_path_buf());
        }

        debug!("cache miss for {key}");
        self.downloader.download(url, local_path)?;
        if is_same_file(local_path, &cached) {
            return Ok(local_path.to_path_buf());
        }
        if let Err(e) = copy_file(local_path, &cached) {
            warn!("could not store {key} in cache {}: {e}", cache_dir.display());
        }
        Ok(local_path.to_path_buf())
    }
}

/// Return the last path segment of `url`, like `wget` would name the file.
///
/// # Examples
///
/// ```
/// use openvino_installer::artefact::download::file_name_from_url;
///
/// assert_eq!(
///     file_name_from_url("https://storage.openvinotoolkit.org/filetree.json"),
///     Some("filetree.json")
/// );
/// assert_eq!(file_name_from_url("https://example.test/dir/"), None);
/// ```
#[must_use]
pub fn file_name_from_url(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().filter(|segment| !segment.is_empty())
}

/// The cache key for a request: the local file name, else the URL's.
///
/// Files from a host other than the default storage server are prefixed
/// with that host, so a mirror's `filetree.json` never replaces the public
/// one.
fn cache_key(url: &str, local_path: &Path) -> Result<String, DownloadError> {
    let name = local_path
        .file_name()
        .and_then(|name| name.to_str())
        .or_else(|| file_name_from_url(url))
        .ok_or_else(|| DownloadError::MissingFileName {
            url: url.to_owned(),
        })?;
    match url_host(url) {
        Some(host) if Some(host) != url_host(STORAGE_URL) => {
            Ok(format!("{}_{name}", host.replace(':', "_")))
        }
        _ => Ok(name.to_owned()),
    }
}

/// The `host[:port]` part of an absolute URL.
fn url_host(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next()?;
    let host = authority.rsplit('@').next()?;
    (!host.is_empty()).then_some(host)
}

/// Whether both paths name the same existing file.
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Copy `from` to `to`, creating parent directories as needed.
fn copy_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(from, to)?;
    Ok(())
}

/// Download a URL into `dest` via a temporary sibling file.
fn download_to_file(url: &str, dest: &Path) -> Result<u64, DownloadError> {
    let response = http_agent()
        .get(url)
        .call()
        .map_err(|e| map_ureq_error(url, &e))?;

    let parent = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let mut staged = tempfile::NamedTempFile::new_in(parent)?;
    let bytes = std::io::copy(&mut response.into_body().as_reader(), &mut staged)
        .map_err(|e| DownloadError::HttpError {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
    staged.persist(dest).map_err(|e| DownloadError::Io(e.error))?;
    Ok(bytes)
}

/// Shared `ureq` agent with request timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_connect(Some(CONNECT_TIMEOUT))
            .timeout_global(Some(DOWNLOAD_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::HttpError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const URL: &str = "https://storage.openvinotoolkit.org/filetree.json";

    fn write_body(dest: &Path, body: &[u8]) -> Result<(), DownloadError> {
        std::fs::write(dest, body).map_err(DownloadError::Io)
    }

    #[test]
    fn map_ureq_error_maps_404_to_not_found() {
        let err = ureq::Error::StatusCode(404);
        let mapped = map_ureq_error("https://example.test/filetree.json", &err);
        assert!(matches!(mapped, DownloadError::NotFound { .. }));
    }

    #[test]
    fn map_ureq_error_maps_other_status_to_http_error() {
        let err = ureq::Error::StatusCode(500);
        let mapped = map_ureq_error("https://example.test/filetree.json", &err);
        assert!(matches!(mapped, DownloadError::HttpError { .. }));
    }

    #[rstest]
    #[case::plain("https://example.test/a/b.tgz", Some("b.tgz"))]
    #[case::query("https://example.test/a/b.zip?sig=1", Some("b.zip"))]
    #[case::fragment("https://example.test/a/b.zip#frag", Some("b.zip"))]
    #[case::trailing_slash("https://example.test/a/", None)]
    fn derives_file_name_from_url(#[case] url: &str, #[case] expected: Option<&str>) {
        assert_eq!(file_name_from_url(url), expected);
    }

    #[test]
    fn without_cache_downloads_directly() {
        let temp = tempfile::tempdir().expect("temp dir");
        let dest = temp.path().join("filetree.json");

        let expected = dest.clone();
        let mut downloader = MockDownloader::new();
        downloader
            .expect_download()
            .withf(move |url, dest| url == URL && dest == expected.as_path())
            .times(1)
            .returning(|_, dest| write_body(dest, b"{}"));

        let retriever = CachedRetriever::new(&downloader, None);
        let path = retriever.fetch_or_cache_hit(URL, &dest).expect("download");
        assert_eq!(path, dest);
        assert!(dest.exists());
    }

    #[test]
    fn cache_miss_downloads_and_stores() {
        let temp = tempfile::tempdir().expect("temp dir");
        let cache_dir = temp.path().join("cache");
        let dest = temp.path().join("work").join("filetree.json");

        let mut downloader = MockDownloader::new();
        downloader
            .expect_download()
            .times(1)
            .returning(|_, dest| {
                std::fs::create_dir_all(dest.parent().expect("parent")).map_err(DownloadError::Io)?;
                write_body(dest, b"fresh")
            });

        let retriever = CachedRetriever::new(&downloader, Some(cache_dir.clone()));
        retriever.fetch_or_cache_hit(URL, &dest).expect("download");

        let stored = std::fs::read(cache_dir.join("filetree.json")).expect("cached copy");
        assert_eq!(stored, b"fresh");
    }

    #[test]
    fn cache_hit_skips_the_network() {
        let temp = tempfile::tempdir().expect("temp dir");
        let cache_dir = temp.path().join("cache");
        std::fs::create_dir_all(&cache_dir).expect("cache dir");
        std::fs::write(cache_dir.join("filetree.json"), b"cached").expect("seed cache");
        let dest = temp.path().join("filetree.json");

        let mut downloader = MockDownloader::new();
        downloader.expect_download().never();

        let retriever = CachedRetriever::new(&downloader, Some(cache_dir));
        let path = retriever.fetch_or_cache_hit(URL, &dest).expect("cache hit");
        assert_eq!(std::fs::read(path).expect("restored"), b"cached");
    }

    #[test]
    fn download_errors_propagate_and_nothing_is_cached() {
        let temp = tempfile::tempdir().expect("temp dir");
        let cache_dir = temp.path().join("cache");
        let dest = temp.path().join("filetree.json");

        let mut downloader = MockDownloader::new();
        downloader.expect_download().returning(|url, _| {
            Err(DownloadError::NotFound {
                url: url.to_owned(),
            })
        });

        let retriever = CachedRetriever::new(&downloader, Some(cache_dir.clone()));
        let err = retriever
            .fetch_or_cache_hit(URL, &dest)
            .expect_err("not found");
        assert!(matches!(err, DownloadError::NotFound { .. }));
        assert!(!cache_dir.join("filetree.json").exists());
    }

    #[rstest]
    #[case::default_storage(URL, "filetree.json", "filetree.json")]
    #[case::mirror("https://mirror.example.test/ov/filetree.json", "filetree.json", "mirror.example.test_filetree.json")]
    #[case::mirror_with_port("http://localhost:8080/filetree.json", "filetree.json", "localhost_8080_filetree.json")]
    #[case::url_name("https://storage.openvinotoolkit.org/pkg.tgz", "/", "pkg.tgz")]
    fn cache_key_names_the_source(#[case] url: &str, #[case] local: &str, #[case] expected: &str) {
        let key = cache_key(url, Path::new(local)).expect("cache key");
        assert_eq!(key, expected);
    }

    #[test]
    fn mirror_and_default_manifests_are_cached_apart() {
        let temp = tempfile::tempdir().expect("temp dir");
        let cache_dir = temp.path().join("cache");
        let dest = temp.path().join("filetree.json");
        let mirror = "https://mirror.example.test/filetree.json";

        let mut downloader = MockDownloader::new();
        downloader
            .expect_download()
            .times(2)
            .returning(|url, dest| write_body(dest, url.as_bytes()));

        let retriever = CachedRetriever::new(&downloader, Some(cache_dir.clone()));
        retriever.fetch_or_cache_hit(URL, &dest).expect("default");
        std::fs::remove_file(&dest).expect("clear download dir");
        retriever.fetch_or_cache_hit(mirror, &dest).expect("mirror");

        assert_eq!(std::fs::read(&dest).expect("mirror copy"), mirror.as_bytes());
        assert_eq!(
            std::fs::read(cache_dir.join("filetree.json")).expect("default cached"),
            URL.as_bytes()
        );
    }

    #[test]
    fn cache_in_download_dir_keeps_the_downloaded_file() {
        let temp = tempfile::tempdir().expect("temp dir");
        let dest = temp.path().join("filetree.json");

        let mut downloader = MockDownloader::new();
        downloader
            .expect_download()
            .times(1)
            .returning(|_, dest| write_body(dest, b"{\"name\":\"production\"}"));

        let retriever = CachedRetriever::new(&downloader, Some(temp.path().to_path_buf()));
        retriever.fetch_or_cache_hit(URL, &dest).expect("miss");
        assert_eq!(std::fs::read(&dest).expect("downloaded"), b"{\"name\":\"production\"}");

        let aliased = CachedRetriever::new(&downloader, Some(temp.path().join(".")));
        aliased.fetch_or_cache_hit(URL, &dest).expect("hit");
        assert_eq!(std::fs::read(&dest).expect("still intact"), b"{\"name\":\"production\"}");
    }
}
