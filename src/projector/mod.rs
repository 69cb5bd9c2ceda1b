//! Response projector
//!
//! Turns driver request/response objects into the plain records that appear
//! in a crawl result. Projection is generic: an object exposes named
//! accessors through [`Accessors`], and [`project`] copies the requested
//! subset into a [`Projection`]. The same operation builds both the response
//! shape (`ok`, `url`, `status`, `headers`) and the request shape
//! (`headers`).

mod chain;
mod fields;

pub use chain::{redirect_chain, RedirectEntry};
pub use fields::{
    project, project_request, project_response, Accessors, Projection, REQUEST_FIELDS,
    RESPONSE_FIELDS,
};
