//! Keyword URL template expansion

use url::{form_urlencoded, Url};

pub const SEARCH_TERMS_PLACEHOLDER: &str = "{searchTerms}";
pub const BASE_URL_PLACEHOLDER: &str = "{google:baseURL}";

/// Flag parameter appended to provider fallback URLs
const FALLBACK_FLAG: (&str, &str) = ("qf", "f");

/// Expands `template` for `search_terms`, using the terms as the fallback query.
pub fn resolve(template: &str, search_terms: &str, base_search_url: &str) -> String {
    resolve_query(template, search_terms, search_terms, base_search_url)
}

/// Expands `template` for a keyword query.
///
/// `{searchTerms}` is replaced verbatim, without percent-encoding. Templates
/// rooted at `{google:baseURL}` carry provider placeholders that cannot be
/// expanded here; they are replaced by a plain `<base>/search` URL carrying the
/// full `query`.
pub fn resolve_query(
    template: &str,
    query: &str,
    search_terms: &str,
    base_search_url: &str,
) -> String {
    if template.starts_with(BASE_URL_PLACEHOLDER) {
        return fallback_search_url(query, base_search_url);
    }
    template.replace(SEARCH_TERMS_PLACEHOLDER, search_terms)
}

fn fallback_search_url(query: &str, base_search_url: &str) -> String {
    // `search` replaces the last path segment of the base, as a relative link would
    match Url::parse(base_search_url).and_then(|base| base.join("search")) {
        Ok(mut url) => {
            url.query_pairs_mut()
                .clear()
                .append_pair("q", query)
                .append_pair(FALLBACK_FLAG.0, FALLBACK_FLAG.1);
            url.to_string()
        }
        // not a URL; keep the provider value as given
        Err(_) => {
            let params = form_urlencoded::Serializer::new(String::new())
                .append_pair("q", query)
                .append_pair(FALLBACK_FLAG.0, FALLBACK_FLAG.1)
                .finish();
            format!("{}/search?{}", base_search_url.trim_end_matches('/'), params)
        }
    }
}
