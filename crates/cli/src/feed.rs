//! Release feed: PyPI's "latest updates" RSS.
//!
//! Each `<item>` is one release. Its `<title>` is `"<name> <version>"` and its
//! `<pubDate>` is when the release was published. Items are parsed one by one;
//! a malformed item becomes an `Err` in the returned list and does not stop the
//! rest of the feed from being read.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

const USER_AGENT: &str = concat!("bumpwatch/", env!("CARGO_PKG_VERSION"));

/// `12 May 2016 21:45:18 GMT`
const PYPI_DATE_FORMAT: &str = "%d %b %Y %H:%M:%S GMT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub name: String,
    pub version: String,
    pub released_on: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Network(String),

    #[error("feed returned HTTP {0}")]
    Http(u16),

    #[error("cannot read feed file {path}: {message}")]
    Io { path: String, message: String },

    /// The document itself is broken; nothing after the error can be trusted.
    #[error("malformed feed XML: {0}")]
    Xml(String),

    /// One item could not be understood. The rest of the feed is unaffected.
    #[error("unparseable feed item '{title}': {reason}")]
    UnparseableEntry { title: String, reason: String },
}

/// Outcome of one poll: document-level failure, or one result per item.
pub type PollResult = Result<Vec<Result<FeedEntry, FeedError>>, FeedError>;

/// Something that can be asked for the current state of the release feed.
/// Every call is a fresh read.
pub trait FeedSource {
    fn poll(&self) -> PollResult;
}

// ── Parsing ─────────────────────────────────────────────────────────

/// Build an entry from an item's title and publication date.
pub fn parse_entry(title: &str, pub_date: &str) -> Result<FeedEntry, FeedError> {
    let unparseable = |reason: String| FeedError::UnparseableEntry {
        title: title.to_string(),
        reason,
    };

    let parts: Vec<&str> = title.trim().split(' ').collect();
    let [name, version] = parts.as_slice() else {
        return Err(unparseable(format!(
            "expected '<name> <version>', got {} space-separated parts",
            parts.len()
        )));
    };
    if name.is_empty() || version.is_empty() {
        return Err(unparseable("expected '<name> <version>'".to_string()));
    }

    let released_on = parse_pub_date(pub_date.trim())
        .ok_or_else(|| unparseable(format!("bad pubDate '{}'", pub_date.trim())))?;

    Ok(FeedEntry {
        name: name.to_string(),
        version: version.to_string(),
        released_on,
    })
}

fn parse_pub_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, PYPI_DATE_FORMAT) {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc2822(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse an RSS document into per-item results.
pub fn parse_feed(xml: &str) -> PollResult {
    // No trim_text: text around an entity reference arrives as separate
    // events and its spaces matter. Fields are trimmed once complete.
    let mut reader = Reader::from_str(xml.trim_start());
    let mut buf = Vec::new();

    let mut entries = Vec::new();
    let mut in_item = false;
    let mut field: Option<ItemField> = None;
    let mut title: Option<String> = None;
    let mut pub_date: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"item" => {
                    in_item = true;
                    title = None;
                    pub_date = None;
                }
                b"title" if in_item => field = Some(ItemField::Title),
                b"pubDate" if in_item => field = Some(ItemField::PubDate),
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                let text = String::from_utf8_lossy(e.as_ref()).to_string();
                append_field(field, &text, &mut title, &mut pub_date);
            }
            Ok(Event::GeneralRef(ref e)) => {
                let text = resolve_entity(&String::from_utf8_lossy(e));
                append_field(field, &text, &mut title, &mut pub_date);
            }
            Ok(Event::CData(ref e)) => {
                let text = String::from_utf8_lossy(e.as_ref()).to_string();
                append_field(field, &text, &mut title, &mut pub_date);
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"item" => {
                    in_item = false;
                    field = None;
                    entries.push(finish_item(title.take(), pub_date.take()));
                }
                b"title" | b"pubDate" => field = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(FeedError::Xml(format!(
                    "at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

#[derive(Debug, Clone, Copy)]
enum ItemField {
    Title,
    PubDate,
}

fn append_field(
    field: Option<ItemField>,
    text: &str,
    title: &mut Option<String>,
    pub_date: &mut Option<String>,
) {
    let slot = match field {
        Some(ItemField::Title) => title,
        Some(ItemField::PubDate) => pub_date,
        None => return,
    };
    slot.get_or_insert_with(String::new).push_str(text);
}

fn finish_item(title: Option<String>, pub_date: Option<String>) -> Result<FeedEntry, FeedError> {
    match (title, pub_date) {
        (Some(title), Some(pub_date)) => parse_entry(&title, &pub_date),
        (title, _) => Err(FeedError::UnparseableEntry {
            title: title.unwrap_or_default(),
            reason: "item needs both <title> and <pubDate>".to_string(),
        }),
    }
}

/// Resolve the 5 predefined XML entities and character references.
/// Anything else is kept as written.
fn resolve_entity(name: &str) -> String {
    let resolved = match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => name
            .strip_prefix("#x")
            .map(|hex| u32::from_str_radix(hex, 16))
            .or_else(|| name.strip_prefix('#').map(str::parse))
            .and_then(Result::ok)
            .and_then(char::from_u32),
    };
    match resolved {
        Some(c) => c.to_string(),
        None => format!("&{};", name),
    }
}

// ── Sources ─────────────────────────────────────────────────────────

/// The live feed, fetched over HTTP.
pub struct PypiFeed {
    http: reqwest::blocking::Client,
    url: String,
}

impl PypiFeed {
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self, FeedError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FeedError::Network(e.to_string()))?;
        Ok(Self {
            http,
            url: url.to_string(),
        })
    }

}

impl FeedSource for PypiFeed {
    fn poll(&self) -> PollResult {
        tracing::debug!(url = %self.url, "polling release feed");
        let response = self
            .http
            .get(&self.url)
            .send()
            .map_err(|e| FeedError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Http(status.as_u16()));
        }
        let body = response
            .text()
            .map_err(|e| FeedError::Network(e.to_string()))?;
        parse_feed(&body)
    }
}

/// A feed saved on disk. Used for offline runs and replaying a past feed.
pub struct FileFeed {
    path: PathBuf,
}

impl FileFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FeedSource for FileFeed {
    fn poll(&self) -> PollResult {
        let xml = std::fs::read_to_string(&self.path).map_err(|e| FeedError::Io {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        parse_feed(&xml)
    }
}
