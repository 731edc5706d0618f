use tracing::{debug, warn};

/// Domain substituted into links when no fixed Argo domain is configured.
/// Links built with it import fine but do not connect.
pub const PLACEHOLDER_ARGO_DOMAIN: &str = "your-temporary-argo-domain.trycloudflare.com";

/// Returns the public domain clients should connect through.
///
/// A configured domain is trusted as-is; no DNS lookup is attempted.
pub fn resolve(argo_domain: &str, placeholder: &str) -> String {
    if !argo_domain.is_empty() {
        debug!(argo_domain, "using configured argo domain");
        return argo_domain.to_string();
    }

    warn!(
        placeholder,
        "ARGO_DOMAIN is not set; subscription links will point at a placeholder domain"
    );
    placeholder.to_string()
}
