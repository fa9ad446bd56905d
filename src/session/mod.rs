//! Session module - the form controller and its HTTP surface.
//!
//! - `controller` - session state and the generation transition
//! - `store` - moka-backed session storage
//! - `models` - API request and response bodies
//! - `multipart_parser` - form upload parsing
//! - `page` - the HTML form
//! - `handlers` - actix-web handlers and route configuration

pub mod controller;
pub mod handlers;
pub mod models;
pub mod multipart_parser;
pub mod page;
pub mod store;

pub use controller::{generate, DownloadablePdf, FormStatus, GenerationError, SessionState};
pub use store::SessionStore;
