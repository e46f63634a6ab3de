//! Maps listing scraper.
//!
//! Drives a headless browser to the search results feed, scrolls it
//! incrementally and extracts the visible entries. Stops at `maxResults`, or
//! once a scroll reaches the end of the feed without revealing new entries.
//! The browser session is closed on every exit path.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder, Locator};
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use serde_json::json;

use super::{Scraper, ScraperError};
use crate::models::scrape::{GoogleMapsParams, MapsListing};

const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/";
const FEED_SELECTOR: &str = r#"div[role="feed"]"#;

/// Scrolls that reveal nothing new before the run gives up, even mid-feed.
const MAX_STALE_SCROLLS: u32 = 3;

/// Scroll the feed to the bottom and report where it ended up.
const SCROLL_FEED_JS: &str = r#"
const feed = document.querySelector('div[role="feed"]');
if (!feed) { return null; }
feed.scrollTop = feed.scrollHeight;
return { scrollTop: feed.scrollTop, scrollHeight: feed.scrollHeight, clientHeight: feed.clientHeight };
"#;

/// Browser settings for the maps scraper.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub navigation_timeout: Duration,
    pub scroll_settle: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".to_string(),
            navigation_timeout: Duration::from_secs(30),
            scroll_settle: Duration::from_millis(1500),
        }
    }
}

/// Feed scroll position after a scroll step.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedPosition {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl FeedPosition {
    /// True once the visible window touches the bottom of the feed.
    pub fn at_end(&self) -> bool {
        self.scroll_top + self.client_height >= self.scroll_height - 1.0
    }
}

/// One open browser page.
#[async_trait]
pub trait BrowserSession: Send {
    async fn goto(&mut self, url: &str) -> Result<(), ScraperError>;
    async fn wait_for(&mut self, css: &str, timeout: Duration) -> Result<(), ScraperError>;
    /// Scroll the results feed; `None` when the feed is gone.
    async fn scroll_feed(&mut self) -> Result<Option<FeedPosition>, ScraperError>;
    async fn page_source(&mut self) -> Result<String, ScraperError>;
    async fn close(&mut self) -> Result<(), ScraperError>;
}

/// Opens browser sessions.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, ScraperError>;
}

/// Launches headless Chrome sessions through a WebDriver server.
pub struct WebDriverLauncher {
    config: BrowserConfig,
}

impl WebDriverLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BrowserLauncher for WebDriverLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, ScraperError> {
        let mut capabilities = serde_json::Map::new();
        capabilities.insert(
            "goog:chromeOptions".to_string(),
            json!({ "args": ["--headless=new", "--no-sandbox", "--disable-dev-shm-usage", "--lang=en-US"] }),
        );

        let client = ClientBuilder::native()
            .capabilities(capabilities)
            .connect(&self.config.webdriver_url)
            .await
            .map_err(|e| ScraperError::Browser(e.to_string()))?;

        Ok(Box::new(WebDriverSession {
            client,
            navigation_timeout: self.config.navigation_timeout,
        }))
    }
}

struct WebDriverSession {
    client: Client,
    navigation_timeout: Duration,
}

fn browser_err(e: fantoccini::error::CmdError) -> ScraperError {
    ScraperError::Browser(e.to_string())
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn goto(&mut self, url: &str) -> Result<(), ScraperError> {
        tokio::time::timeout(self.navigation_timeout, self.client.goto(url))
            .await
            .map_err(|_| ScraperError::Timeout("navigating to the search page"))?
            .map_err(browser_err)
    }

    async fn wait_for(&mut self, css: &str, timeout: Duration) -> Result<(), ScraperError> {
        self.client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(css))
            .await
            .map(|_| ())
            .map_err(|e| ScraperError::FeedMissing(e.to_string()))
    }

    async fn scroll_feed(&mut self) -> Result<Option<FeedPosition>, ScraperError> {
        let value = self
            .client
            .execute(SCROLL_FEED_JS, Vec::new())
            .await
            .map_err(browser_err)?;
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ScraperError::Browser(format!("unexpected scroll position: {}", e)))
    }

    async fn page_source(&mut self) -> Result<String, ScraperError> {
        self.client.source().await.map_err(browser_err)
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        self.client.clone().close().await.map_err(browser_err)
    }
}

pub struct GoogleMapsScraper<L> {
    launcher: L,
    config: BrowserConfig,
}

impl<L: BrowserLauncher> GoogleMapsScraper<L> {
    pub fn new(launcher: L, config: BrowserConfig) -> Self {
        Self { launcher, config }
    }

    async fn collect(
        &self,
        session: &mut dyn BrowserSession,
        params: &GoogleMapsParams,
    ) -> Result<Vec<MapsListing>, ScraperError> {
        let limit = params.max_results as usize;
        session.goto(&search_url(params)).await?;
        session.wait_for(FEED_SELECTOR, self.config.navigation_timeout).await?;

        let mut seen = HashSet::new();
        let mut listings = Vec::new();
        let mut stale_scrolls = 0;

        loop {
            let html = session.page_source().await?;
            let added = merge_new(&mut listings, &mut seen, parse_feed(&html), limit);
            tracing::debug!(added, total = listings.len(), "Extracted feed entries");

            if listings.len() >= limit {
                break;
            }

            stale_scrolls = if added == 0 { stale_scrolls + 1 } else { 0 };
            if stale_scrolls >= MAX_STALE_SCROLLS {
                break;
            }

            let Some(position) = session.scroll_feed().await? else {
                break;
            };
            tokio::time::sleep(self.config.scroll_settle).await;

            if added == 0 && position.at_end() {
                break;
            }
        }

        Ok(listings)
    }
}

#[async_trait]
impl<L: BrowserLauncher> Scraper for GoogleMapsScraper<L> {
    type Params = GoogleMapsParams;
    type Record = MapsListing;

    async fn scrape(&self, params: &GoogleMapsParams) -> Result<Vec<MapsListing>, ScraperError> {
        let mut session = self.launcher.launch().await?;
        let result = self.collect(session.as_mut(), params).await;

        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "Failed to close browser session");
        }

        result
    }
}

/// Build the search URL, e.g. `.../maps/search/coffee+in+Portland`.
pub fn search_url(params: &GoogleMapsParams) -> String {
    let term = match params.location.as_deref() {
        Some(location) => format!("{} in {}", params.query, location),
        None => params.query.clone(),
    };
    let encoded: String = url::form_urlencoded::byte_serialize(term.as_bytes()).collect();
    format!("{}{}", MAPS_SEARCH_URL, encoded)
}

/// Append unseen listings (deduplicated by name) up to `limit`; returns how many were added.
pub fn merge_new(
    listings: &mut Vec<MapsListing>,
    seen: &mut HashSet<String>,
    batch: Vec<MapsListing>,
    limit: usize,
) -> usize {
    let before = listings.len();
    for listing in batch {
        if listings.len() >= limit {
            break;
        }
        if seen.insert(listing.name.to_lowercase()) {
            listings.push(listing);
        }
    }
    listings.len() - before
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn looks_like_phone(text: &str) -> bool {
    let digits = text.chars().filter(|c| c.is_ascii_digit()).count();
    digits >= 7
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || " +-().".contains(c))
}

/// Extract listing cards from the results feed HTML, in feed order.
pub fn parse_feed(html: &str) -> Vec<MapsListing> {
    let document = Html::parse_document(html);
    let card_sel = Selector::parse(r#"div[role="feed"] div[role="article"]"#).expect("valid selector");
    let link_sel = Selector::parse("a.hfpxzc").expect("valid selector");
    let name_sel = Selector::parse(".qBF1Pd").expect("valid selector");
    let rating_sel = Selector::parse("span.MW4etd").expect("valid selector");
    let reviews_sel = Selector::parse("span.UY7F9").expect("valid selector");
    let info_sel = Selector::parse(".W4Efsd .W4Efsd").expect("valid selector");
    let span_sel = Selector::parse("span").expect("valid selector");
    let website_sel = Selector::parse(r#"a[data-value="Website"]"#).expect("valid selector");
    let phone_sel = Selector::parse("span.UsdlK").expect("valid selector");

    let mut listings = Vec::new();

    for card in document.select(&card_sel) {
        let link = card.select(&link_sel).next();
        let name = card
            .value()
            .attr("aria-label")
            .map(str::to_string)
            .or_else(|| link.and_then(|a| a.value().attr("aria-label")).map(str::to_string))
            .or_else(|| card.select(&name_sel).next().map(text_of))
            .and_then(non_empty);

        let Some(name) = name else {
            continue;
        };

        let rating = card
            .select(&rating_sel)
            .next()
            .and_then(|e| text_of(e).replace(',', ".").parse::<f32>().ok());

        let review_count = card.select(&reviews_sel).next().and_then(|e| {
            let digits: String = text_of(e).chars().filter(|c| c.is_ascii_digit()).collect();
            digits.parse::<u32>().ok()
        });

        // First info line: "Category · Address"; a later line may carry the phone.
        let mut category = None;
        let mut address = None;
        let mut phone = card.select(&phone_sel).next().map(text_of).and_then(non_empty);

        if let Some(info) = card.select(&info_sel).next() {
            let parts: Vec<String> = info
                .select(&span_sel)
                .filter(|span| span.children().all(|child| child.value().is_text()))
                .map(text_of)
                .map(|t| t.trim_matches(|c: char| c == '·' || c.is_whitespace()).to_string())
                .filter(|t| !t.is_empty())
                .collect();

            let mut rest = parts.into_iter();
            category = rest.next();
            for part in rest {
                if looks_like_phone(&part) {
                    phone.get_or_insert(part);
                } else if address.is_none() {
                    address = Some(part);
                }
            }
        }

        listings.push(MapsListing {
            name,
            category,
            address,
            phone,
            website: card
                .select(&website_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(str::to_string),
            rating,
            review_count,
            maps_url: link.and_then(|a| a.value().attr("href")).map(str::to_string),
        });
    }

    listings
}
