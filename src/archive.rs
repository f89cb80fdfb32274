//! Article archive access: link discovery on the listing page and per-article extraction.
//!
//! The HTML handling is split into pure functions ([`discover_article_links`],
//! [`extract_article`]) so it can be exercised without a network; [`HttpContentFetcher`] only
//! adds the blocking HTTP layer on top.

use crate::config::ArchiveConfig;
use crate::error::FetchError;
use crate::types::article_data::ArticleContent;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::time::Duration;

const UNTITLED: &str = "Untitled Article";
const UNKNOWN_DATE: &str = "Unknown Date";

static DATED_HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\d{8}/|/\d{6}/|/\d{4}/\d{2}/\d{2}/").expect("dated href regex"));
static URL_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\d{4})(\d{2})(\d{2})/").expect("url date regex"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

static ARTICLE_CONTAINERS: Lazy<Selector> =
    Lazy::new(|| selector(".post-list article, article.post, .articles-list .article, .entry"));
static LINKS: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static LIST_LINKS: Lazy<Selector> = Lazy::new(|| selector("li a[href]"));
static TITLES: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["h1.entry-title", "h1.post-title", "h1", ".article-title"]
        .iter()
        .map(|css| selector(css))
        .collect()
});
static DATES: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "time",
        ".post-date",
        ".entry-date",
        ".date",
        r#"meta[property="article:published_time"]"#,
    ]
    .iter()
    .map(|css| selector(css))
    .collect()
});
static CONTENT_BLOCKS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [".post-content", ".entry-content", "article", ".article-content", ".content", "main"]
        .iter()
        .map(|css| selector(css))
        .collect()
});
static BODY: Lazy<Selector> = Lazy::new(|| selector("body"));
static BOILERPLATE: Lazy<Selector> =
    Lazy::new(|| selector("nav, header, footer, .sidebar, .navigation, .comments"));
static TEXT_BLOCKS: Lazy<Selector> = Lazy::new(|| selector("p, h2, h3, h4"));

/// Source of article pages.
pub trait ContentFetcher {
    /// Article URLs listed on the index page, in first-seen order.
    fn discover_articles(&self, index_url: &str) -> Result<Vec<String>, FetchError>;

    fn fetch_article(&self, url: &str) -> Result<ArticleContent, FetchError>;
}

fn parse_url(url: &str) -> Result<Url, FetchError> {
    Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Article links found on an index page.
///
/// Tries the archive's article containers first, then any link whose path carries a date,
/// then links inside list items. Results are absolute, unique, on the index host and free of
/// fragments.
pub fn discover_article_links(index_html: &str, index_url: &Url) -> Vec<String> {
    let document = Html::parse_document(index_html);

    let containers: Vec<ElementRef<'_>> = document.select(&ARTICLE_CONTAINERS).collect();
    let mut hrefs: Vec<&str> = if !containers.is_empty() {
        containers
            .iter()
            .flat_map(|c| c.select(&LINKS))
            .filter_map(|a| a.value().attr("href"))
            .collect()
    } else {
        document
            .select(&LINKS)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| DATED_HREF.is_match(href))
            .collect()
    };

    if hrefs.is_empty() {
        hrefs = document
            .select(&LIST_LINKS)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| !href.ends_with(".jpg") && !href.ends_with(".png"))
            .collect();
    }

    let mut seen = HashSet::new();
    hrefs
        .into_iter()
        .filter_map(|href| index_url.join(href).ok())
        .filter(|url| url.host_str() == index_url.host_str())
        .map(String::from)
        .filter(|url| !url.contains('#'))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

fn first_text(document: &Html, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|sel| {
        document
            .select(sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    })
}

fn find_date(document: &Html, url: &str) -> String {
    for sel in DATES.iter() {
        if let Some(el) = document.select(sel).next() {
            let value = el
                .value()
                .attr("datetime")
                .or_else(|| el.value().attr("content"))
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| el.text().collect::<String>().trim().to_string());
            if !value.is_empty() {
                return value;
            }
        }
    }
    match URL_DATE.captures(url) {
        Some(caps) => format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]),
        None => UNKNOWN_DATE.to_string(),
    }
}

fn stripped_lines<'a>(texts: impl Iterator<Item = &'a str>) -> String {
    texts
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text and block HTML of `body`, skipping navigation and other page chrome.
fn body_without_boilerplate(body: ElementRef<'_>) -> (String, String) {
    let excluded: HashSet<_> = body.select(&BOILERPLATE).map(|el| el.id()).collect();

    let text = stripped_lines(
        body.descendants()
            .filter(|node| !node.ancestors().any(|a| excluded.contains(&a.id())))
            .filter_map(|node| node.value().as_text().map(|t| &**t)),
    );
    let html = body
        .select(&TEXT_BLOCKS)
        .filter(|el| !excluded.contains(&el.id()) && !el.ancestors().any(|a| excluded.contains(&a.id())))
        .map(|el| el.html())
        .collect::<Vec<_>>()
        .join("\n");
    (text, html)
}

/// Title, date and content block of one article page.
pub fn extract_article(html: &str, url: &str) -> ArticleContent {
    let document = Html::parse_document(html);
    let title = first_text(&document, &TITLES).unwrap_or_else(|| UNTITLED.to_string());
    let date = find_date(&document, url);

    let content = CONTENT_BLOCKS
        .iter()
        .find_map(|sel| document.select(sel).next());
    let (text, block_html) = match content {
        Some(el) => (stripped_lines(el.text()), el.html()),
        None => match document.select(&BODY).next() {
            Some(body) => body_without_boilerplate(body),
            None => (String::new(), String::new()),
        },
    };

    ArticleContent {
        title,
        date,
        text,
        html: block_html,
        url: url.to_string(),
    }
}

/// Blocking HTTP fetcher with a browser-like identity and a fixed pause before each article.
pub struct HttpContentFetcher {
    client: reqwest::blocking::Client,
    request_timeout: Duration,
    index_timeout: Duration,
    request_delay: Duration,
}

impl HttpContentFetcher {
    pub fn new(config: &ArchiveConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|source| FetchError::Http {
                url: config.index_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            index_timeout: Duration::from_secs(config.index_timeout_secs),
            request_delay: Duration::from_millis(config.request_delay_ms),
        })
    }

    fn get_text(&self, url: &Url, timeout: Duration) -> Result<String, FetchError> {
        let http_err = |source| FetchError::Http {
            url: url.to_string(),
            source,
        };
        let res = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .map_err(http_err)?;
        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        res.text().map_err(http_err)
    }
}

impl ContentFetcher for HttpContentFetcher {
    fn discover_articles(&self, index_url: &str) -> Result<Vec<String>, FetchError> {
        let index = parse_url(index_url)?;
        let html = self.get_text(&index, self.index_timeout)?;
        let links = discover_article_links(&html, &index);
        tracing::info!(index = %index, found = links.len(), "discovered article links");
        Ok(links)
    }

    fn fetch_article(&self, url: &str) -> Result<ArticleContent, FetchError> {
        let parsed = parse_url(url)?;
        if !self.request_delay.is_zero() {
            std::thread::sleep(self.request_delay);
        }
        let html = self.get_text(&parsed, self.request_timeout)?;
        let article = extract_article(&html, url);
        tracing::debug!(url, title = %article.title, date = %article.date, chars = article.text.len(), "extracted article");
        Ok(article)
    }
}
