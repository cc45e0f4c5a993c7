//! Authentication module
//!
//! Supports: API key header and Bearer token
//!
//! Each upstream service uses exactly one scheme: the lifelog API takes an
//! `X-API-Key` header, Notion and OpenAI take a bearer token.

mod authenticator;

pub use authenticator::{AuthConfig, Authenticator};
