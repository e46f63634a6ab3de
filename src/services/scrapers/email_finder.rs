//! Email-pattern discovery.
//!
//! Guesses addresses for a company domain from common naming conventions and
//! role mailboxes, then keeps them only if the domain accepts mail (has MX).
//! This is an existence check on the domain, not mailbox verification.

use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::TokioAsyncResolver;

use super::{Scraper, ScraperError};
use crate::models::scrape::{EmailCandidate, EmailFinderParams, EmailSource};

pub use crate::models::scrape::normalize_domain;

/// Legal-form words dropped when deriving a domain from a company name.
const COMPANY_SUFFIXES: &[&str] = &[
    "inc", "incorporated", "llc", "ltd", "limited", "corp", "corporation", "co", "company", "gmbh",
    "plc", "sa", "ag",
];

const GENERIC_MAILBOXES: &[&str] = &["info", "contact", "hello", "sales", "support"];

const GENERIC_CONFIDENCE: f32 = 0.5;

/// Answers whether a domain publishes at least one MX record.
#[async_trait]
pub trait MxLookup: Send + Sync {
    async fn has_mx(&self, domain: &str) -> Result<bool, ScraperError>;
}

/// DNS-backed MX lookup with a fixed timeout.
pub struct HickoryMxLookup {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl HickoryMxLookup {
    pub fn new(timeout: Duration) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), opts),
            timeout,
        }
    }
}

#[async_trait]
impl MxLookup for HickoryMxLookup {
    async fn has_mx(&self, domain: &str) -> Result<bool, ScraperError> {
        let lookup = tokio::time::timeout(self.timeout, self.resolver.mx_lookup(domain))
            .await
            .map_err(|_| ScraperError::Timeout("looking up mail-exchange records"))?;

        match lookup {
            Ok(records) => Ok(records.iter().next().is_some()),
            Err(e) if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) => Ok(false),
            Err(e) => Err(ScraperError::Dns {
                domain: domain.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

pub struct EmailFinder<M> {
    mx: M,
}

impl<M: MxLookup> EmailFinder<M> {
    pub fn new(mx: M) -> Self {
        Self { mx }
    }
}

#[async_trait]
impl<M: MxLookup> Scraper for EmailFinder<M> {
    type Params = EmailFinderParams;
    type Record = EmailCandidate;

    async fn scrape(&self, params: &EmailFinderParams) -> Result<Vec<EmailCandidate>, ScraperError> {
        let domain = match params.domain.as_deref() {
            Some(domain) => normalize_domain(domain),
            None => derive_domain(&params.company_name)
                .ok_or_else(|| ScraperError::NoDomain(params.company_name.clone()))?,
        };

        let candidates = generate_candidates(
            &domain,
            params.first_name.as_deref(),
            params.last_name.as_deref(),
        );

        if !self.mx.has_mx(&domain).await? {
            tracing::info!(domain = %domain, "Domain has no mail-exchange records");
            return Ok(Vec::new());
        }

        Ok(candidates
            .into_iter()
            .map(|c| EmailCandidate {
                mx_verified: true,
                ..c
            })
            .collect())
    }
}

/// Guess `<name>.com` from a company name, e.g. "Acme Corp" → "acme.com".
pub fn derive_domain(company_name: &str) -> Option<String> {
    let lowered = company_name.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|w| w.trim_matches('.'))
        .filter(|w| !w.is_empty())
        .collect();

    let meaningful: Vec<&str> = words
        .iter()
        .copied()
        .filter(|w| !COMPANY_SUFFIXES.contains(w))
        .collect();
    // A name made only of suffixes ("Company Inc") keeps its words.
    let words = if meaningful.is_empty() { words } else { meaningful };

    let stem: String = words
        .concat()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();

    if stem.is_empty() {
        None
    } else {
        Some(format!("{}.com", stem))
    }
}

fn name_part(name: Option<&str>) -> Option<String> {
    let cleaned: String = name?
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Personal patterns first (most likely first), then role mailboxes.
pub fn generate_candidates(
    domain: &str,
    first_name: Option<&str>,
    last_name: Option<&str>,
) -> Vec<EmailCandidate> {
    let first = name_part(first_name);
    let last = name_part(last_name);

    let mut patterns: Vec<(&'static str, String, f32)> = Vec::new();
    match (&first, &last) {
        (Some(f), Some(l)) => {
            let initial = &f[..1];
            let last_initial = &l[..1];
            patterns.push(("first.last", format!("{}.{}", f, l), 0.9));
            patterns.push(("firstlast", format!("{}{}", f, l), 0.75));
            patterns.push(("first", f.clone(), 0.7));
            patterns.push(("flast", format!("{}{}", initial, l), 0.65));
            patterns.push(("first_last", format!("{}_{}", f, l), 0.5));
            patterns.push(("firstl", format!("{}{}", f, last_initial), 0.4));
        }
        (Some(f), None) => patterns.push(("first", f.clone(), 0.6)),
        (None, Some(l)) => patterns.push(("last", l.clone(), 0.4)),
        (None, None) => {}
    }

    let personal = patterns.into_iter().map(|(pattern, local, confidence)| EmailCandidate {
        email: format!("{}@{}", local, domain),
        domain: domain.to_string(),
        pattern: pattern.to_string(),
        source: EmailSource::PatternMatching,
        confidence,
        mx_verified: false,
    });

    let generic = GENERIC_MAILBOXES.iter().map(|mailbox| EmailCandidate {
        email: format!("{}@{}", mailbox, domain),
        domain: domain.to_string(),
        pattern: mailbox.to_string(),
        source: EmailSource::GenericPattern,
        confidence: GENERIC_CONFIDENCE,
        mx_verified: false,
    });

    personal.chain(generic).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticMx(Result<bool, &'static str>);

    #[async_trait]
    impl MxLookup for StaticMx {
        async fn has_mx(&self, domain: &str) -> Result<bool, ScraperError> {
            self.0.map_err(|m| ScraperError::Dns {
                domain: domain.to_string(),
                message: m.to_string(),
            })
        }
    }

    fn params(company: &str, first: Option<&str>, last: Option<&str>) -> EmailFinderParams {
        EmailFinderParams {
            company_name: company.to_string(),
            domain: None,
            first_name: first.map(str::to_string),
            last_name: last.map(str::to_string),
        }
    }

    #[test]
    fn test_derive_domain() {
        assert_eq!(derive_domain("Acme Corp").as_deref(), Some("acme.com"));
        assert_eq!(derive_domain("Blue Sky Plumbing, LLC").as_deref(), Some("blueskyplumbing.com"));
        assert_eq!(derive_domain("Müller & Söhne GmbH").as_deref(), Some("mllershne.com"));
        assert_eq!(derive_domain("Company").as_deref(), Some("company.com"));
        assert_eq!(derive_domain("!!!"), None);
    }

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("https://www.Acme.com/about"), "acme.com");
        assert_eq!(normalize_domain("acme.io."), "acme.io");
    }

    #[test]
    fn test_generic_only_without_names() {
        let candidates = generate_candidates("acme.com", None, None);
        assert_eq!(candidates.len(), GENERIC_MAILBOXES.len());
        assert!(candidates.iter().all(|c| c.source == EmailSource::GenericPattern));
        assert_eq!(candidates[0].email, "info@acme.com");
    }

    #[test]
    fn test_personal_patterns_come_first() {
        let candidates = generate_candidates("acme.com", Some("Jane"), Some("O'Neil"));
        assert_eq!(candidates[0].email, "jane.oneil@acme.com");
        assert_eq!(candidates[3].email, "joneil@acme.com");
        assert_eq!(candidates[5].email, "janeo@acme.com");
        assert_eq!(candidates.len(), 6 + GENERIC_MAILBOXES.len());
        assert_eq!(candidates[6].source, EmailSource::GenericPattern);
    }

    #[tokio::test]
    async fn test_mx_present_marks_verified() {
        let finder = EmailFinder::new(StaticMx(Ok(true)));
        let results = finder.scrape(&params("Acme Corp", None, None)).await.unwrap();
        assert_eq!(results.len(), GENERIC_MAILBOXES.len());
        assert!(results.iter().all(|c| c.mx_verified && c.domain == "acme.com"));
    }

    #[tokio::test]
    async fn test_no_mx_is_empty_success() {
        let finder = EmailFinder::new(StaticMx(Ok(false)));
        let results = finder.scrape(&params("Acme Corp", Some("Jane"), None)).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_error_fails_the_run() {
        let finder = EmailFinder::new(StaticMx(Err("SERVFAIL")));
        let err = finder.scrape(&params("Acme Corp", None, None)).await.unwrap_err();
        assert!(matches!(err, ScraperError::Dns { .. }));
    }

    #[tokio::test]
    async fn test_explicit_domain_wins() {
        let finder = EmailFinder::new(StaticMx(Ok(true)));
        let mut p = params("Acme Corp", None, None);
        p.domain = Some("acme-industries.io".to_string());
        let results = finder.scrape(&p).await.unwrap();
        assert!(results.iter().all(|c| c.email.ends_with("@acme-industries.io")));
    }
}
