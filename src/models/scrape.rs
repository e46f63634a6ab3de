use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The closed set of scraper kinds a job can request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScraperKind {
    GoogleMaps,
    Linkedin,
    EmailFinder,
    AdIntelligence,
}

fn default_maps_max_results() -> u32 {
    100
}

fn default_linkedin_max_results() -> u32 {
    50
}

/// Parameters for a maps listing search.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GoogleMapsParams {
    #[garde(length(min = 1, max = 500))]
    pub query: String,

    #[garde(length(min = 1, max = 200))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[garde(range(min = 1, max = 500))]
    #[serde(default = "default_maps_max_results")]
    pub max_results: u32,
}

/// Parameters for a professional-network company search.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LinkedInParams {
    #[garde(length(min = 1, max = 500))]
    pub keywords: String,

    #[garde(length(min = 1, max = 200))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[garde(length(min = 1, max = 200))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,

    #[garde(length(min = 1, max = 50))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_size: Option<String>,

    #[garde(range(min = 1, max = 100))]
    #[serde(default = "default_linkedin_max_results")]
    pub max_results: u32,
}

/// Strip scheme, `www.`, path and trailing dots from a caller-supplied domain.
pub fn normalize_domain(domain: &str) -> String {
    let domain = domain.trim().to_lowercase();
    let domain = domain
        .strip_prefix("https://")
        .or_else(|| domain.strip_prefix("http://"))
        .unwrap_or(&domain);
    let domain = domain.strip_prefix("www.").unwrap_or(domain);
    let domain = domain.split(['/', '?', '#']).next().unwrap_or(domain);
    domain.trim_end_matches('.').to_string()
}

/// True when the normalized host is dotted, e.g. `acme.com`, with no empty labels,
/// whitespace or `@`.
pub fn is_domain_name(raw: &str) -> bool {
    let host = normalize_domain(raw);
    host.contains('.')
        && !host.contains(|c: char| c.is_whitespace() || c == '@')
        && host.split('.').all(|label| !label.is_empty())
}

fn domain_name(value: &str, _ctx: &()) -> garde::Result {
    if is_domain_name(value) {
        Ok(())
    } else {
        Err(garde::Error::new("must be a domain such as example.com"))
    }
}

fn optional_domain_name(value: &Option<String>, ctx: &()) -> garde::Result {
    value.as_deref().map_or(Ok(()), |domain| domain_name(domain, ctx))
}

/// Parameters for email-pattern discovery.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmailFinderParams {
    #[garde(length(min = 1, max = 200))]
    pub company_name: String,

    #[garde(length(min = 3, max = 253), custom(optional_domain_name))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    #[garde(length(min = 1, max = 100))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[garde(length(min = 1, max = 100))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Ad platforms covered by the ad-intelligence placeholder.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AdPlatform {
    Google,
    Facebook,
    #[default]
    All,
}

impl AdPlatform {
    /// Expand `All` into the concrete platforms, in a stable order.
    pub fn expand(self) -> Vec<AdPlatform> {
        match self {
            AdPlatform::All => vec![AdPlatform::Google, AdPlatform::Facebook],
            platform => vec![platform],
        }
    }
}

/// Parameters for ad-spend analysis of a domain.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdIntelligenceParams {
    #[garde(length(min = 3, max = 253), custom(domain_name))]
    pub domain: String,

    #[garde(skip)]
    #[serde(default)]
    pub platform: AdPlatform,
}

/// Validated, strongly-typed parameters of a job. One variant per scraper kind.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ScrapeParams {
    GoogleMaps(GoogleMapsParams),
    Linkedin(LinkedInParams),
    EmailFinder(EmailFinderParams),
    AdIntelligence(AdIntelligenceParams),
}

impl ScrapeParams {
    /// Decode the raw `params` object according to the requested kind.
    pub fn from_value(kind: ScraperKind, value: serde_json::Value) -> Result<Self, serde_json::Error> {
        // Omitted params behave like an empty object so defaults apply.
        let value = if value.is_null() {
            serde_json::Value::Object(Default::default())
        } else {
            value
        };

        Ok(match kind {
            ScraperKind::GoogleMaps => ScrapeParams::GoogleMaps(serde_json::from_value(value)?),
            ScraperKind::Linkedin => ScrapeParams::Linkedin(serde_json::from_value(value)?),
            ScraperKind::EmailFinder => ScrapeParams::EmailFinder(serde_json::from_value(value)?),
            ScraperKind::AdIntelligence => {
                ScrapeParams::AdIntelligence(serde_json::from_value(value)?)
            }
        })
    }

    pub fn kind(&self) -> ScraperKind {
        match self {
            ScrapeParams::GoogleMaps(_) => ScraperKind::GoogleMaps,
            ScrapeParams::Linkedin(_) => ScraperKind::Linkedin,
            ScrapeParams::EmailFinder(_) => ScraperKind::EmailFinder,
            ScrapeParams::AdIntelligence(_) => ScraperKind::AdIntelligence,
        }
    }

    /// Run the type-specific garde rules.
    pub fn validate(&self) -> Result<(), garde::Report> {
        match self {
            ScrapeParams::GoogleMaps(p) => p.validate(),
            ScrapeParams::Linkedin(p) => p.validate(),
            ScrapeParams::EmailFinder(p) => p.validate(),
            ScrapeParams::AdIntelligence(p) => p.validate(),
        }
    }
}

/// A business entry extracted from a maps search feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MapsListing {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maps_url: Option<String>,
}

/// A company record from the professional-network placeholder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LinkedInCompany {
    pub name: String,
    pub linkedin_url: String,
    pub industry: String,
    pub company_size: String,
    pub location: String,
    pub description: String,
    pub synthetic: bool,
}

/// Where an email candidate came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EmailSource {
    /// Derived from a person's first/last name.
    PatternMatching,
    /// Role-based mailbox such as `info@`.
    GenericPattern,
}

/// A guessed email address for a company domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmailCandidate {
    pub email: String,
    pub domain: String,
    pub pattern: String,
    pub source: EmailSource,
    pub confidence: f32,
    pub mx_verified: bool,
}

/// Synthetic ad-spend summary for one platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdIntelligenceReport {
    pub domain: String,
    pub platform: AdPlatform,
    pub estimated_monthly_spend: u32,
    pub active_ads: u32,
    pub top_keywords: Vec<String>,
    pub ad_formats: Vec<String>,
    pub synthetic: bool,
}

/// Ordered results of a completed job, typed by scraper kind.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ScrapeResults {
    GoogleMaps(Vec<MapsListing>),
    Linkedin(Vec<LinkedInCompany>),
    EmailFinder(Vec<EmailCandidate>),
    AdIntelligence(Vec<AdIntelligenceReport>),
}

impl ScrapeResults {
    pub fn len(&self) -> usize {
        match self {
            ScrapeResults::GoogleMaps(r) => r.len(),
            ScrapeResults::Linkedin(r) => r.len(),
            ScrapeResults::EmailFinder(r) => r.len(),
            ScrapeResults::AdIntelligence(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
