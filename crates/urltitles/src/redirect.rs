//! Short annotations for redirected requests

use crate::types::RedirectHop;
use url::Url;

/// Summarize what a redirect chain changed
///
/// Only chains with at least one 301/302 hop are considered. Reports the
/// final host when the host changed, else the final scheme in upper case
/// when only the scheme changed. Path-only redirects return `None`.
pub fn summarize_redirects(chain: &[RedirectHop]) -> Option<String> {
    let (last, history) = chain.split_last()?;
    if !history
        .iter()
        .any(|hop| matches!(hop.status_code, 301 | 302))
    {
        return None;
    }

    let start = Url::parse(&chain[0].url).ok()?;
    let end = Url::parse(&last.url).ok()?;

    if start.host_str() != end.host_str() {
        return end.host_str().map(str::to_string);
    }

    if start.scheme() != end.scheme() {
        return Some(end.scheme().to_uppercase());
    }

    None
}
