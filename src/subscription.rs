use base64::Engine as _;
use serde::Serialize;

use crate::{
    argo_domain,
    config::Config,
    protocol::{TROJAN_WS_PATH_ENCODED, VLESS_WS_PATH_ENCODED, VMESS_WS_PATH_WITH_EARLY_DATA},
};

/// Everything a single link needs. `domain` is both the TLS SNI and the
/// websocket `Host`; `host:port` is the front the client dials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkParams<'a> {
    pub uuid: &'a str,
    pub host: &'a str,
    pub port: u16,
    pub domain: &'a str,
    pub label: &'a str,
}

pub fn build_vless(p: &LinkParams<'_>) -> String {
    format!(
        "vless://{}@{}:{}?encryption=none&security=tls&sni={}&type=ws&host={}&path={}#{}",
        p.uuid, p.host, p.port, p.domain, p.domain, VLESS_WS_PATH_ENCODED, p.label
    )
}

// Field order is the order most clients emit; keep it stable.
#[derive(Debug, Serialize)]
struct VmessShareObject<'a> {
    v: &'static str,
    ps: &'a str,
    add: &'a str,
    port: u16,
    id: &'a str,
    aid: &'static str,
    scy: &'static str,
    net: &'static str,
    #[serde(rename = "type")]
    header_type: &'static str,
    host: &'a str,
    path: &'static str,
    tls: &'static str,
    sni: &'a str,
    alpn: &'static str,
}

pub fn build_vmess(p: &LinkParams<'_>) -> String {
    let obj = VmessShareObject {
        v: "2",
        ps: p.label,
        add: p.host,
        port: p.port,
        id: p.uuid,
        aid: "0",
        scy: "none",
        net: "ws",
        header_type: "none",
        host: p.domain,
        path: VMESS_WS_PATH_WITH_EARLY_DATA,
        tls: "tls",
        sni: p.domain,
        alpn: "",
    };
    let json = vmess_json(&obj);
    format!(
        "vmess://{}",
        base64::engine::general_purpose::STANDARD.encode(json.as_bytes())
    )
}

fn vmess_json(obj: &VmessShareObject<'_>) -> String {
    // Only borrowed strings and integers: serialization cannot fail.
    serde_json::to_string(obj).unwrap_or_default()
}

pub fn build_trojan(p: &LinkParams<'_>) -> String {
    format!(
        "trojan://{}@{}:{}?security=tls&sni={}&type=ws&host={}&path={}#{}",
        p.uuid, p.host, p.port, p.domain, p.domain, TROJAN_WS_PATH_ENCODED, p.label
    )
}

/// Joins links with a blank line between each, ending in a newline.
pub fn join_links<S: AsRef<str>>(links: &[S]) -> String {
    let mut out = String::new();
    for (idx, link) in links.iter().enumerate() {
        if idx > 0 {
            out.push_str("\n\n");
        }
        out.push_str(link.as_ref());
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// The subscription body: joined links, base64 (standard alphabet, padded).
pub fn combine<S: AsRef<str>>(links: &[S]) -> String {
    base64::engine::general_purpose::STANDARD.encode(join_links(links).as_bytes())
}

/// VLESS, VMess and Trojan links, in that order, for the current config.
pub fn build_links(config: &Config) -> [String; 3] {
    let domain = argo_domain::resolve(&config.argo_domain, &config.argo_placeholder_domain);
    let label = config.link_label();
    let params = LinkParams {
        uuid: &config.uuid,
        host: &config.cfip,
        port: config.cfport,
        domain: &domain,
        label: &label,
    };
    [
        build_vless(&params),
        build_vmess(&params),
        build_trojan(&params),
    ]
}

pub fn build_raw_text(config: &Config) -> String {
    join_links(&build_links(config))
}

pub fn build_base64(config: &Config) -> String {
    combine(&build_links(config))
}
