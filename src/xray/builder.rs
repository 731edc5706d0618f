use crate::{
    config::Config,
    protocol::{
        LOOPBACK_LISTEN, TROJAN_WS_PATH, TROJAN_WS_PORT, VLESS_FLOW_XTLS_RPRX_VISION,
        VLESS_TCP_PORT, VLESS_WS_PATH, VLESS_WS_PORT, VMESS_WS_PATH, VMESS_WS_PORT,
    },
    xray::{
        Client, DnsConfig, Fallback, Inbound, InboundProtocol, InboundSettings, LogConfig,
        Network, Outbound, Security, ServerConfig, Sniffing, StreamSettings, WsSettings,
    },
};

const DNS_SERVER_DOH_LOCAL: &str = "https+local://8.8.8.8/dns-query";
const DECRYPTION_NONE: &str = "none";

pub fn build_server_config(config: &Config) -> ServerConfig {
    let uuid = config.uuid.as_str();

    ServerConfig {
        log: LogConfig {
            access: "/dev/null".to_string(),
            error: "/dev/null".to_string(),
            loglevel: "none".to_string(),
        },
        inbounds: vec![
            argo_entry_inbound(config.argo_port, uuid),
            vless_tcp_inbound(uuid),
            vless_ws_inbound(uuid),
            vmess_ws_inbound(uuid),
            trojan_ws_inbound(uuid),
        ],
        dns: DnsConfig {
            servers: vec![DNS_SERVER_DOH_LOCAL.to_string()],
        },
        outbounds: vec![
            Outbound {
                protocol: "freedom".to_string(),
                tag: "direct".to_string(),
            },
            Outbound {
                protocol: "blackhole".to_string(),
                tag: "block".to_string(),
            },
        ],
    }
}

// The path-less fallback is listed first; Xray matches the most specific path
// and only uses it when no path fallback applies.
fn argo_entry_inbound(argo_port: u16, uuid: &str) -> Inbound {
    Inbound {
        port: argo_port,
        listen: None,
        protocol: InboundProtocol::Vless,
        settings: InboundSettings {
            clients: vec![Client {
                id: Some(uuid.to_string()),
                flow: Some(VLESS_FLOW_XTLS_RPRX_VISION.to_string()),
                ..Client::default()
            }],
            decryption: Some(DECRYPTION_NONE.to_string()),
            fallbacks: vec![
                Fallback {
                    path: None,
                    dest: VLESS_TCP_PORT,
                },
                path_fallback(VLESS_WS_PATH, VLESS_WS_PORT),
                path_fallback(VMESS_WS_PATH, VMESS_WS_PORT),
                path_fallback(TROJAN_WS_PATH, TROJAN_WS_PORT),
            ],
        },
        stream_settings: StreamSettings {
            network: Network::Tcp,
            security: None,
            ws_settings: None,
        },
        sniffing: None,
    }
}

fn vless_tcp_inbound(uuid: &str) -> Inbound {
    Inbound {
        port: VLESS_TCP_PORT,
        listen: Some(LOOPBACK_LISTEN.to_string()),
        protocol: InboundProtocol::Vless,
        settings: InboundSettings {
            clients: vec![Client {
                id: Some(uuid.to_string()),
                ..Client::default()
            }],
            decryption: Some(DECRYPTION_NONE.to_string()),
            fallbacks: vec![],
        },
        stream_settings: StreamSettings {
            network: Network::Tcp,
            security: Some(Security::None),
            ws_settings: None,
        },
        sniffing: None,
    }
}

fn vless_ws_inbound(uuid: &str) -> Inbound {
    Inbound {
        port: VLESS_WS_PORT,
        listen: Some(LOOPBACK_LISTEN.to_string()),
        protocol: InboundProtocol::Vless,
        settings: InboundSettings {
            clients: vec![Client {
                id: Some(uuid.to_string()),
                level: Some(0),
                ..Client::default()
            }],
            decryption: Some(DECRYPTION_NONE.to_string()),
            fallbacks: vec![],
        },
        stream_settings: ws_stream(VLESS_WS_PATH, Some(Security::None)),
        sniffing: Some(default_sniffing()),
    }
}

fn vmess_ws_inbound(uuid: &str) -> Inbound {
    Inbound {
        port: VMESS_WS_PORT,
        listen: Some(LOOPBACK_LISTEN.to_string()),
        protocol: InboundProtocol::Vmess,
        settings: InboundSettings {
            clients: vec![Client {
                id: Some(uuid.to_string()),
                alter_id: Some(0),
                ..Client::default()
            }],
            decryption: None,
            fallbacks: vec![],
        },
        stream_settings: ws_stream(VMESS_WS_PATH, None),
        sniffing: Some(default_sniffing()),
    }
}

fn trojan_ws_inbound(uuid: &str) -> Inbound {
    Inbound {
        port: TROJAN_WS_PORT,
        listen: Some(LOOPBACK_LISTEN.to_string()),
        protocol: InboundProtocol::Trojan,
        settings: InboundSettings {
            clients: vec![Client {
                password: Some(uuid.to_string()),
                ..Client::default()
            }],
            decryption: None,
            fallbacks: vec![],
        },
        stream_settings: ws_stream(TROJAN_WS_PATH, Some(Security::None)),
        sniffing: Some(default_sniffing()),
    }
}

fn path_fallback(path: &str, dest: u16) -> Fallback {
    Fallback {
        path: Some(path.to_string()),
        dest,
    }
}

fn ws_stream(path: &str, security: Option<Security>) -> StreamSettings {
    StreamSettings {
        network: Network::Ws,
        security,
        ws_settings: Some(WsSettings {
            path: path.to_string(),
        }),
    }
}

fn default_sniffing() -> Sniffing {
    Sniffing {
        enabled: true,
        dest_override: vec!["http".to_string(), "tls".to_string(), "quic".to_string()],
        metadata_only: false,
    }
}
