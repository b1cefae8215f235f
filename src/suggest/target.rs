//! Lookup-target plausibility
//!
//! A settled URL is only looked up if it parses as an absolute URL whose
//! host looks resolvable.

use url::{Host, Url};

/// True for absolute URLs with a dotted host ending in a label of at
/// least two characters, a local host name, or an IP literal.
pub fn is_plausible_url(raw: &str) -> bool {
    let Ok(parsed) = Url::parse(raw.trim()) else {
        return false;
    };
    match parsed.host() {
        Some(Host::Domain(domain)) => is_plausible_domain(domain),
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => true,
        None => false,
    }
}

fn is_plausible_domain(domain: &str) -> bool {
    let domain = domain.trim_end_matches('.');
    if domain == "localhost" || domain.ends_with(".localhost") || domain.ends_with(".local") {
        return true;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|l| !l.is_empty())
        && labels.last().is_some_and(|tld| tld.chars().count() >= 2)
}
