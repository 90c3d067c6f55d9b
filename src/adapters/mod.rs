pub mod api_service;
pub mod fixture_transport;
pub mod html_renderer;
pub mod http_transport;
pub mod response_cache;
pub mod token_store;
