pub mod response_cache;
pub mod service_auth;
