//! Xray server configuration document.
//!
//! Nothing in this process runs Xray; the document describes how an external
//! engine should route the Argo traffic, and its JSON shape follows Xray's
//! config format so that engine can load it unchanged.

use serde::Serialize;

pub mod builder;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerConfig {
    pub log: LogConfig,
    pub inbounds: Vec<Inbound>,
    pub dns: DnsConfig,
    pub outbounds: Vec<Outbound>,
}

impl ServerConfig {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogConfig {
    pub access: String,
    pub error: String,
    pub loglevel: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InboundProtocol {
    Vless,
    Vmess,
    Trojan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inbound {
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen: Option<String>,
    pub protocol: InboundProtocol,
    pub settings: InboundSettings,
    pub stream_settings: StreamSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sniffing: Option<Sniffing>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InboundSettings {
    pub clients: Vec<Client>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decryption: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<Fallback>,
}

/// One inbound user. VLESS/VMess identify by `id`, Trojan by `password`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alter_id: Option<u32>,
}

/// Fallback target on the entry listener; a missing `path` is the default route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fallback {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub dest: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Tcp,
    Ws,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Security {
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSettings {
    pub network: Network,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Security>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_settings: Option<WsSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WsSettings {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sniffing {
    pub enabled: bool,
    pub dest_override: Vec<String>,
    pub metadata_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsConfig {
    pub servers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outbound {
    pub protocol: String,
    pub tag: String,
}
