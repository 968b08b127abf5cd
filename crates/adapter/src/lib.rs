//! Uniform request construction for incompatible text-generation HTTP
//! backends.
//!
//! A [`template::BackendTemplate`] declares the request/response shape of
//! one backend (OpenAI-compatible, Ollama, Cohere, AI Horde, or a fully
//! custom string template). Given a template, a [`samplers::SamplerPreset`]
//! and a conversation, the [`builder::RequestBuilder`] produces the final
//! request body and auth headers for the external HTTP transport. Model
//! identifiers and context lengths are pulled back out of arbitrarily
//! shaped catalog responses with [`path::resolve`].
//!
//! Request building is pure and synchronous; the only async operation in
//! the crate is [`catalog::CatalogFetcher::fetch`].

pub mod builder;
pub mod catalog;
pub mod context;
pub mod error;
pub mod path;
pub mod samplers;
pub mod template;

pub use builder::{RequestBody, RequestBuilder};
pub use error::{Error, Result};
