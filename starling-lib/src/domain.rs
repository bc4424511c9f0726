//! Domain normalisation and the cached domain-limit matcher.
//!
//! Every domain key entering the core is punycode. Limits match a domain
//! and all of its subdomains; the matcher returns the longest matching
//! suffix, load-through cached per punified input.

use crate::error::{Error, ErrorKind};
use crate::globals::GLOBALS;
use crate::model::DomainLimit;
use crate::store::Page;
use moka::future::Cache;
use std::sync::Arc;

/// Normalise a domain name to its punycode (ASCII-compatible) form.
/// Idempotent: `punify(punify(d)) == punify(d)`.
pub fn punify(domain: &str) -> Result<String, Error> {
    let trimmed = domain.trim().trim_end_matches('.').to_lowercase();
    if trimmed.is_empty()
        || trimmed.contains('/')
        || trimmed.contains('@')
        || trimmed.contains(char::is_whitespace)
    {
        return Err(ErrorKind::BadDomain(domain.to_owned()).into());
    }

    // The url crate applies IDNA mapping to the host of a special-scheme
    // URL, which is exactly the normalisation we want.
    let parsed = url::Url::parse(&format!("https://{trimmed}"))?;
    match parsed.host() {
        Some(url::Host::Domain(host)) => Ok(host.to_lowercase()),
        _ => Err(ErrorKind::BadDomain(domain.to_owned()).into()),
    }
}

/// Punify and reject this instance's own host, which is never a valid
/// limit target.
pub fn normalize_limit_domain(domain: &str) -> Result<String, Error> {
    let domain = punify(domain)?;
    if domain == GLOBALS.settings.read().instance_host {
        return Err(ErrorKind::InvalidInput("cannot limit own domain".to_owned()).into());
    }
    Ok(domain)
}

/// Cached longest-suffix matcher over the stored domain limits.
pub struct DomainLimits {
    cache: Cache<String, Option<DomainLimit>>,
}

impl Default for DomainLimits {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainLimits {
    pub(crate) fn new() -> DomainLimits {
        DomainLimits {
            cache: Cache::new(10_000),
        }
    }

    /// Longest-suffix match of `domain` against the stored limits.
    /// Closed under punify: `match(d) == match(punify(d))`.
    pub async fn match_domain(&self, domain: &str) -> Result<Option<DomainLimit>, Error> {
        let domain = punify(domain)?;
        let result = self
            .cache
            .try_get_with(domain.clone(), async move {
                let mut candidate = domain.as_str();
                loop {
                    if let Some(limit) =
                        GLOBALS.store().get_domain_limit_by_domain(candidate).await?
                    {
                        return Ok::<_, Error>(Some(limit));
                    }
                    match candidate.find('.') {
                        Some(dot) => candidate = &candidate[dot + 1..],
                        None => return Ok(None),
                    }
                }
            })
            .await
            .map_err(|e: Arc<Error>| (*e).clone())?;
        Ok(result)
    }

    /// Create a limit. The domain is normalised first; the cache is
    /// invalidated wholesale because one new limit can change the match
    /// for any number of subdomains.
    pub async fn create(&self, mut limit: DomainLimit) -> Result<DomainLimit, Error> {
        limit.domain = normalize_limit_domain(&limit.domain)?;
        GLOBALS.store().put_domain_limit(&limit).await?;
        self.cache.invalidate_all();
        tracing::info!("domain limit created for {}", limit.domain);
        Ok(limit)
    }

    pub async fn update(&self, mut limit: DomainLimit) -> Result<DomainLimit, Error> {
        limit.domain = normalize_limit_domain(&limit.domain)?;
        limit.updated_at = chrono::Utc::now();
        GLOBALS.store().update_domain_limit(&limit).await?;
        self.cache.invalidate_all();
        Ok(limit)
    }

    pub async fn delete(&self, id: crate::model::Id) -> Result<(), Error> {
        GLOBALS.store().delete_domain_limit(id).await?;
        self.cache.invalidate_all();
        Ok(())
    }

    /// Every stored limit, paged
    pub async fn list(&self, page: Page) -> Result<Vec<DomainLimit>, Error> {
        GLOBALS.store().get_domain_limits(page).await
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_punify_idempotent() {
        let once = punify("Bücher.example").unwrap();
        assert_eq!(once, "xn--bcher-kva.example");
        assert_eq!(punify(&once).unwrap(), once);
    }

    #[test]
    fn test_punify_trims_and_lowercases() {
        assert_eq!(punify(" Example.ORG. ").unwrap(), "example.org");
    }

    #[test]
    fn test_punify_rejects_junk() {
        assert!(punify("").is_err());
        assert!(punify("not a domain").is_err());
        assert!(punify("example.org/path").is_err());
        assert!(punify("user@example.org").is_err());
    }
}
