//! # formwire - YAML-driven forms and endpoint calls
//!
//! formwire turns two kinds of YAML documents into working UI glue:
//!
//! - **Form schemas** become a validation-aware [`domain::FormState`] and an
//!   HTML widget tree rendered by [`adapters::html_renderer::HtmlRenderer`]
//! - **Endpoint catalogs** become an [`adapters::api_service::ApiService`]
//!   with payload validation, mocking, GET memoization, bearer tokens and
//!   retry
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use formwire::adapters::api_service::ApiService;
//! use formwire::adapters::http_transport::ReqwestTransport;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let catalog = std::fs::read_to_string("api.yaml")?;
//!     let service = ApiService::from_yaml(&catalog, Arc::new(ReqwestTransport::default()))?;
//!
//!     let result = service.call("getUser", json!({ "id": 1 }), None).await;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Config**: typed YAML documents, validated once at load
//! - **Validation**: one compiled rule set per control, two agreeing views
//! - **Domain**: form state machine, widgets, result envelope, transport port
//! - **Adapters**: API service, transports, cache, token, HTML rendering

pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod validation;
