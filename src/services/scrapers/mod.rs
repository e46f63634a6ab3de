//! Scraper strategies.
//!
//! Each strategy takes its own validated params type and yields an ordered
//! list of records, or fails. An empty list is a successful run.

use std::sync::Arc;

use async_trait::async_trait;

use crate::models::scrape::{
    AdIntelligenceParams, AdIntelligenceReport, EmailCandidate, EmailFinderParams,
    GoogleMapsParams, LinkedInCompany, LinkedInParams, MapsListing, ScrapeParams, ScrapeResults,
};

pub mod ad_intelligence;
pub mod email_finder;
pub mod google_maps;
pub mod linkedin;

pub use ad_intelligence::AdIntelligenceScraper;
pub use email_finder::{EmailFinder, HickoryMxLookup, MxLookup};
pub use google_maps::{BrowserConfig, BrowserLauncher, BrowserSession, GoogleMapsScraper, WebDriverLauncher};
pub use linkedin::LinkedInScraper;

#[async_trait]
pub trait Scraper: Send + Sync {
    type Params: Send + Sync;
    type Record: Send;

    async fn scrape(&self, params: &Self::Params) -> Result<Vec<Self::Record>, ScraperError>;
}

pub type DynScraper<P, R> = Arc<dyn Scraper<Params = P, Record = R>>;

/// One strategy per scraper kind. Cheap to clone.
#[derive(Clone)]
pub struct ScraperSet {
    pub google_maps: DynScraper<GoogleMapsParams, MapsListing>,
    pub linkedin: DynScraper<LinkedInParams, LinkedInCompany>,
    pub email_finder: DynScraper<EmailFinderParams, EmailCandidate>,
    pub ad_intelligence: DynScraper<AdIntelligenceParams, AdIntelligenceReport>,
}

impl ScraperSet {
    /// Live strategies: WebDriver for maps, DNS for mail-exchange checks.
    pub fn live(browser: BrowserConfig, dns_timeout: std::time::Duration) -> Self {
        Self {
            google_maps: Arc::new(GoogleMapsScraper::new(WebDriverLauncher::new(browser.clone()), browser)),
            linkedin: Arc::new(LinkedInScraper),
            email_finder: Arc::new(EmailFinder::new(HickoryMxLookup::new(dns_timeout))),
            ad_intelligence: Arc::new(AdIntelligenceScraper),
        }
    }

    /// Dispatch to the strategy matching the params variant.
    pub async fn run(&self, params: &ScrapeParams) -> Result<ScrapeResults, ScraperError> {
        Ok(match params {
            ScrapeParams::GoogleMaps(p) => ScrapeResults::GoogleMaps(self.google_maps.scrape(p).await?),
            ScrapeParams::Linkedin(p) => ScrapeResults::Linkedin(self.linkedin.scrape(p).await?),
            ScrapeParams::EmailFinder(p) => {
                ScrapeResults::EmailFinder(self.email_finder.scrape(p).await?)
            }
            ScrapeParams::AdIntelligence(p) => {
                ScrapeResults::AdIntelligence(self.ad_intelligence.scrape(p).await?)
            }
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Timed out while {0}")]
    Timeout(&'static str),

    #[error("Listing feed did not load: {0}")]
    FeedMissing(String),

    #[error("Mail-exchange lookup failed for {domain}: {message}")]
    Dns { domain: String, message: String },

    #[error("Could not derive a domain from company name {0:?}")]
    NoDomain(String),

    #[error("Scraper panicked")]
    Panicked,
}
