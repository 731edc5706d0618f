pub mod argo_domain;
pub mod config;
pub mod http;
pub mod notify;
pub mod protocol;
pub mod subscription;
pub mod version;
pub mod xray;
