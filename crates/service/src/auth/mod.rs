//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Two sign-in strategies feed the same session issuer: a Google-compatible
//! OAuth code flow and a fixed-identity bypass for automated tests.

pub mod base_url;
pub mod domain;
pub mod errors;
pub mod oauth;
pub mod repo;
pub mod repository;
pub mod service;
pub mod session;

pub use service::{AuthService, AuthSettings};
pub use session::{SessionClaims, SessionIssuer};
