//! Locating and fetching the homework page, with an on-disk cache.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::errors::FocstestError;

/// Website and path homework pages are fetched from.
pub const BASE_URL: &str = "https://rpucella.net/courses/focs-sp22/homeworks/";

/// How long a cached page is used before fetching it again.
pub const CACHE_TIMEOUT: Duration = Duration::from_secs(1800);

const CACHE_DIR_NAME: &str = "focstest-cache";

static HOMEWORK_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^homework(\d{1,2})\.ml").expect("homework file pattern is valid"));

/// Where the html page comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    /// A local html file.
    File(PathBuf),
    /// A url, fetched through the cache.
    Url(Url),
    /// A url inferred from the name of the file under test.
    Infer,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub base_url: String,
    pub cache_dir: PathBuf,
    pub cache_timeout: Duration,
    pub use_cache: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            cache_dir: std::env::temp_dir().join(CACHE_DIR_NAME),
            cache_timeout: CACHE_TIMEOUT,
            use_cache: true,
        }
    }
}

/// An html page and the file it was read from.
#[derive(Debug, Clone)]
pub struct Page {
    pub html: String,
    pub path: PathBuf,
}

/// Parses a user-supplied url, defaulting to https and allowing the domain
/// to be given without a leading `//`.
///
/// Returns `None` if the url has no domain.
pub fn parse_url(url: &str) -> Option<Url> {
    let candidate = if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{}", url.trim_start_matches("//"))
    };
    Url::parse(&candidate)
        .ok()
        .filter(|parsed| parsed.host_str().is_some_and(|host| !host.is_empty()))
}

/// Infers the homework page from a file named like `homework3.ml`.
pub fn infer_url(ocaml_file: &Path, base_url: &str) -> Option<Url> {
    let name = ocaml_file.file_name()?.to_str()?;
    let number = HOMEWORK_FILE.captures(name)?.get(1)?.as_str();
    Url::parse(base_url)
        .ok()?
        .join(&format!("{}/index.html", number))
        .ok()
}

/// A filesystem-safe cache file name for a url.
///
/// The scheme, a trailing `/` and a trailing `/index.html` do not change the name.
pub fn cache_filename(url: &Url) -> PathBuf {
    const BAD_CHARS: &[char] = &['\0', '\\', '/', ':', '*', '?', '"', '>', '<', '|'];

    let host = url.host_str().unwrap_or("").replace('.', "_");
    let name = format!("{}{}", host, url.path());
    let name = name.trim_end_matches('/');
    let name = name.strip_suffix("/index.html").unwrap_or(name);
    let mut name: String = name
        .chars()
        .map(|c| if BAD_CHARS.contains(&c) { '_' } else { c })
        .collect();
    if Path::new(&name).extension().is_none() {
        name.push_str(".html");
    }
    PathBuf::from(name)
}

/// Loads the html page for `ocaml_file` from `source`.
///
/// # Errors
/// * [`FocstestError::UrlInference`] if the url must be inferred and cannot be
/// * [`FocstestError::InputFile`] if a local file cannot be read
/// * [`FocstestError::Fetch`] if the page cannot be fetched and is not cached
pub fn load_page(ocaml_file: &Path, source: PageSource, config: &FetchConfig) -> Result<Page, FocstestError> {
    match source {
        PageSource::File(path) => {
            let html = fs::read_to_string(&path).map_err(|source| FocstestError::InputFile {
                description: "html file",
                path: path.clone(),
                source,
            })?;
            Ok(Page { html, path })
        }
        PageSource::Url(url) => fetch_url(&url, config),
        PageSource::Infer => {
            let url = infer_url(ocaml_file, &config.base_url).ok_or_else(|| FocstestError::UrlInference {
                ocaml_file: ocaml_file.to_path_buf(),
            })?;
            fetch_url(&url, config)
        }
    }
}

/// Gets a page through the cache.
///
/// A fresh cached copy is used as is. When the server cannot be reached a
/// stale copy is used instead, if there is one.
pub fn fetch_url(url: &Url, config: &FetchConfig) -> Result<Page, FocstestError> {
    let cache_dir = ensure_cache_dir(&config.cache_dir)?;
    let path = cache_dir.join(cache_filename(url));

    let cached_age = fs::metadata(&path)
        .and_then(|meta| meta.modified())
        .ok()
        .map(|modified| SystemTime::now().duration_since(modified).unwrap_or_default());
    let is_cached = cached_age.is_some();
    let is_fresh = cached_age.is_some_and(|age| age < config.cache_timeout);

    if config.use_cache && is_fresh {
        debug!("Using cached version of page at {}", path.display());
        return read_cached(&path).map(|html| Page { html, path });
    }

    info!("Fetching {}", url);
    let response = match ureq::get(url.as_str()).call() {
        Ok(response) => response,
        Err(ureq::Error::Transport(transport)) if config.use_cache && is_cached => {
            warn!(
                "Unable to connect to {}, using cached version at {}: {}",
                url,
                path.display(),
                transport
            );
            return read_cached(&path).map(|html| Page { html, path });
        }
        Err(e) => return Err(FocstestError::fetch(url, e)),
    };
    let html = response.into_string().map_err(|e| FocstestError::Fetch {
        url: url.to_string(),
        reason: e.to_string(),
        hint: None,
    })?;

    match fs::write(&path, &html) {
        Ok(()) => debug!("Saved {} to cache at {}", url, path.display()),
        Err(e) => warn!("Unable to cache {} at {}: {}", url, path.display(), e),
    }
    Ok(Page { html, path })
}

fn ensure_cache_dir(dir: &Path) -> Result<&Path, FocstestError> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|source| FocstestError::InputFile {
            description: "cache directory",
            path: dir.to_path_buf(),
            source,
        })?;
        info!("Created cache directory at {}", dir.display());
    }
    Ok(dir)
}

fn read_cached(path: &Path) -> Result<String, FocstestError> {
    fs::read_to_string(path).map_err(|source: io::Error| FocstestError::InputFile {
        description: "cached page",
        path: path.to_path_buf(),
        source,
    })
}
