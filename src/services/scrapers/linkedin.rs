//! Professional-network company search.
//!
//! Live scraping is not performed (terms-of-service constraints). This strategy
//! returns deterministic records built from the search inputs so callers can
//! integrate against the contract. Every record is marked `synthetic`.

use async_trait::async_trait;

use super::{Scraper, ScraperError};
use crate::models::scrape::{LinkedInCompany, LinkedInParams};

/// Upper bound on synthetic records per run.
const SYNTHETIC_LIMIT: u32 = 10;

const NAME_SUFFIXES: &[&str] = &["Labs", "Group", "Partners", "Solutions", "Systems"];

pub struct LinkedInScraper;

#[async_trait]
impl Scraper for LinkedInScraper {
    type Params = LinkedInParams;
    type Record = LinkedInCompany;

    async fn scrape(&self, params: &LinkedInParams) -> Result<Vec<LinkedInCompany>, ScraperError> {
        Ok(synthesize(params))
    }
}

fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn slug(input: &str) -> String {
    input
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

pub fn synthesize(params: &LinkedInParams) -> Vec<LinkedInCompany> {
    let base = title_case(&params.keywords);
    let industry = params.industry.clone().unwrap_or_else(|| "Technology".to_string());
    let location = params.location.clone().unwrap_or_else(|| "United States".to_string());
    let company_size = params.company_size.clone().unwrap_or_else(|| "11-50".to_string());

    (0..params.max_results.min(SYNTHETIC_LIMIT))
        .map(|i| {
            let suffix = NAME_SUFFIXES[i as usize % NAME_SUFFIXES.len()];
            let name = if i < NAME_SUFFIXES.len() as u32 {
                format!("{} {}", base, suffix)
            } else {
                format!("{} {} {}", base, suffix, i / NAME_SUFFIXES.len() as u32 + 1)
            };
            LinkedInCompany {
                linkedin_url: format!("https://www.linkedin.com/company/{}", slug(&name)),
                description: format!("{} company in {} focused on {}", industry, location, params.keywords),
                industry: industry.clone(),
                company_size: company_size.clone(),
                location: location.clone(),
                synthetic: true,
                name,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(max_results: u32) -> LinkedInParams {
        LinkedInParams {
            keywords: "cloud security".to_string(),
            location: Some("Austin, TX".to_string()),
            industry: None,
            company_size: None,
            max_results,
        }
    }

    #[test]
    fn test_respects_max_results_and_limit() {
        assert_eq!(synthesize(&params(3)).len(), 3);
        assert_eq!(synthesize(&params(50)).len(), SYNTHETIC_LIMIT as usize);
    }

    #[test]
    fn test_deterministic_and_unique() {
        let first = synthesize(&params(10));
        let second = synthesize(&params(10));
        assert_eq!(first, second);

        let mut names: Vec<_> = first.iter().map(|c| c.name.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 10);
    }

    #[test]
    fn test_record_fields() {
        let records = synthesize(&params(1));
        assert_eq!(records[0].name, "Cloud Security Labs");
        assert_eq!(records[0].linkedin_url, "https://www.linkedin.com/company/cloud-security-labs");
        assert_eq!(records[0].location, "Austin, TX");
        assert_eq!(records[0].industry, "Technology");
        assert!(records[0].synthetic);
    }
}
