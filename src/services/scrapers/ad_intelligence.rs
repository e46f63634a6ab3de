//! Ad-spend intelligence placeholder.
//!
//! Returns structured, deterministic figures per platform so downstream
//! consumers can be built before a real data provider is wired in.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::email_finder::normalize_domain;
use super::{Scraper, ScraperError};
use crate::models::scrape::{AdIntelligenceParams, AdIntelligenceReport, AdPlatform};

const KEYWORD_TEMPLATES: &[&str] = &[
    "{} pricing",
    "{} reviews",
    "best {}",
    "{} near me",
    "{} alternatives",
    "buy {}",
];

pub struct AdIntelligenceScraper;

#[async_trait]
impl Scraper for AdIntelligenceScraper {
    type Params = AdIntelligenceParams;
    type Record = AdIntelligenceReport;

    async fn scrape(
        &self,
        params: &AdIntelligenceParams,
    ) -> Result<Vec<AdIntelligenceReport>, ScraperError> {
        let domain = normalize_domain(&params.domain);
        Ok(params
            .platform
            .expand()
            .into_iter()
            .map(|platform| report_for(&domain, platform))
            .collect())
    }
}

/// Build one report; the figures are seeded from a digest of domain + platform.
pub fn report_for(domain: &str, platform: AdPlatform) -> AdIntelligenceReport {
    let digest = Sha256::new()
        .chain_update(domain.as_bytes())
        .chain_update(b":")
        .chain_update(platform.to_string().as_bytes())
        .finalize();

    let spend_seed = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    let ads_seed = u32::from(digest[4]);
    let keyword_count = 3 + usize::from(digest[5] % 3);

    let brand = domain.split('.').next().unwrap_or(domain);
    let top_keywords = KEYWORD_TEMPLATES
        .iter()
        .cycle()
        .skip(usize::from(digest[6]) % KEYWORD_TEMPLATES.len())
        .take(keyword_count)
        .map(|template| template.replace("{}", brand))
        .collect();

    let ad_formats = match platform {
        AdPlatform::Facebook => vec!["image".to_string(), "video".to_string(), "carousel".to_string()],
        _ => vec!["search".to_string(), "display".to_string()],
    };

    AdIntelligenceReport {
        domain: domain.to_string(),
        platform,
        // Rounded to the nearest hundred in [500, 50_000).
        estimated_monthly_spend: 500 + (spend_seed % 495) * 100,
        active_ads: 1 + ads_seed % 60,
        top_keywords,
        ad_formats,
        synthetic: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_all_expands_to_both_platforms() {
        let params = AdIntelligenceParams {
            domain: "https://www.acme.com".to_string(),
            platform: AdPlatform::All,
        };
        let reports = AdIntelligenceScraper.scrape(&params).await.unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].platform, AdPlatform::Google);
        assert_eq!(reports[1].platform, AdPlatform::Facebook);
        assert!(reports.iter().all(|r| r.domain == "acme.com" && r.synthetic));
    }

    #[test]
    fn test_report_is_deterministic() {
        assert_eq!(report_for("acme.com", AdPlatform::Google), report_for("acme.com", AdPlatform::Google));
    }

    #[test]
    fn test_report_ranges() {
        for domain in ["acme.com", "globex.io", "initech.net"] {
            let report = report_for(domain, AdPlatform::Facebook);
            assert!((500..50_000).contains(&report.estimated_monthly_spend));
            assert_eq!(report.estimated_monthly_spend % 100, 0);
            assert!((1..=60).contains(&report.active_ads));
            assert!((3..=5).contains(&report.top_keywords.len()));
            assert!(report.ad_formats.contains(&"video".to_string()));
        }
    }
}
