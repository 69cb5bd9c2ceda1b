use crate::driver::HttpRequest;
use crate::projector::fields::{project_request, project_response, Projection};
use serde::Serialize;

/// One hop of a redirect chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedirectEntry {
    pub url: String,
    pub request: Projection,
    /// Empty when the driver recorded no response for the hop
    pub response: Projection,
}

/// Builds redirect chain records for the request that ended a navigation
///
/// Entries are oldest first, exactly as the request reports its history; the
/// request itself is not part of its own chain.
pub fn redirect_chain(request: &HttpRequest) -> Vec<RedirectEntry> {
    request
        .redirect_chain
        .iter()
        .map(|hop| {
            if hop.response.is_none() {
                tracing::debug!("No response recorded for redirect hop {}", hop.url);
            }
            RedirectEntry {
                url: hop.url.clone(),
                request: project_request(Some(hop)),
                response: project_response(hop.response.as_ref()),
            }
        })
        .collect()
}
