use std::{
    convert::Infallible,
    net::{IpAddr, SocketAddr},
};

use clap::{Args, Parser, Subcommand};

pub const DEFAULT_UUID: &str = "9afd1229-b893-40c1-84dd-51e7ce204913";
pub const DEFAULT_NAME: &str = "Vls";
pub const DEFAULT_CFIP: &str = "www.visa.com.sg";
pub const DEFAULT_SUB_PATH: &str = "sub";
pub const DEFAULT_ISP: &str = "Cloudflare";
pub const DEFAULT_KEEPALIVE_URL: &str = "https://oooo.serv00.net/add-url";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "argo-sub",
    about = "VLESS/VMess/Trojan subscription server for Argo tunnels",
    version = crate::version::VERSION,
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub config: Config,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve the subscription over HTTP (default).
    Run,

    /// Print the Xray server configuration document as JSON.
    #[command(name = "config")]
    PrintConfig,

    /// Print the subscription payload.
    #[command(name = "links")]
    PrintLinks(LinksArgs),
}

#[derive(Args, Debug, Clone)]
pub struct LinksArgs {
    /// Print the plain link list instead of the base64 payload.
    #[arg(long)]
    pub raw: bool,
}

// Process-wide parameters, resolved once at startup and never mutated.
#[derive(Args, Debug, Clone)]
pub struct Config {
    #[arg(
        long,
        global = true,
        env = "UUID",
        value_name = "UUID",
        default_value = DEFAULT_UUID,
        value_parser = parse_uuid
    )]
    pub uuid: String,

    #[arg(
        long,
        global = true,
        env = "NAME",
        value_name = "NAME",
        default_value = DEFAULT_NAME,
        value_parser = text_or(DEFAULT_NAME)
    )]
    pub name: String,

    #[arg(
        long,
        global = true,
        env = "CFIP",
        value_name = "HOST",
        default_value = DEFAULT_CFIP,
        value_parser = text_or(DEFAULT_CFIP)
    )]
    pub cfip: String,

    #[arg(
        long,
        global = true,
        env = "CFPORT",
        value_name = "PORT",
        default_value = "443",
        value_parser = port_or(443)
    )]
    pub cfport: u16,

    #[arg(
        long = "argo-domain",
        global = true,
        env = "ARGO_DOMAIN",
        value_name = "DOMAIN",
        default_value = ""
    )]
    pub argo_domain: String,

    /// Tunnel credentials; accepted for compatibility, the tunnel itself runs elsewhere.
    #[arg(
        long = "argo-auth",
        global = true,
        env = "ARGO_AUTH",
        value_name = "TOKEN",
        default_value = "",
        hide_env_values = true
    )]
    pub argo_auth: String,

    #[arg(
        long = "argo-port",
        global = true,
        env = "ARGO_PORT",
        value_name = "PORT",
        default_value = "8001",
        value_parser = port_or(8001)
    )]
    pub argo_port: u16,

    #[arg(
        long = "argo-placeholder-domain",
        global = true,
        env = "ARGO_PLACEHOLDER_DOMAIN",
        value_name = "DOMAIN",
        default_value = crate::argo_domain::PLACEHOLDER_ARGO_DOMAIN,
        value_parser = text_or(crate::argo_domain::PLACEHOLDER_ARGO_DOMAIN)
    )]
    pub argo_placeholder_domain: String,

    #[arg(
        long = "sub-path",
        global = true,
        env = "SUB_PATH",
        value_name = "SEGMENT",
        default_value = DEFAULT_SUB_PATH,
        value_parser = parse_sub_path
    )]
    pub sub_path: String,

    #[arg(
        long = "isp",
        global = true,
        env = "ISP",
        value_name = "LABEL",
        default_value = DEFAULT_ISP
    )]
    pub isp: String,

    #[arg(
        long = "upload-url",
        global = true,
        env = "UPLOAD_URL",
        value_name = "URL",
        default_value = ""
    )]
    pub upload_url: String,

    #[arg(
        long = "project-url",
        global = true,
        env = "PROJECT_URL",
        value_name = "URL",
        default_value = ""
    )]
    pub project_url: String,

    #[arg(
        long = "auto-access",
        global = true,
        env = "AUTO_ACCESS",
        value_name = "BOOL",
        default_value = "false",
        action = clap::ArgAction::Set,
        value_parser = parse_auto_access
    )]
    pub auto_access: bool,

    #[arg(
        long = "keepalive-url",
        global = true,
        env = "KEEPALIVE_URL",
        value_name = "URL",
        default_value = DEFAULT_KEEPALIVE_URL,
        value_parser = text_or(DEFAULT_KEEPALIVE_URL)
    )]
    pub keepalive_url: String,

    /// Takes precedence over --port when set. An empty value counts as unset.
    // Fully qualified so clap keeps the empty default instead of treating the
    // flag as optional.
    #[arg(
        long = "server-port",
        global = true,
        env = "SERVER_PORT",
        value_name = "PORT",
        default_value = "",
        hide_default_value = true,
        value_parser = optional_port
    )]
    pub server_port: std::option::Option<u16>,

    #[arg(
        long,
        global = true,
        env = "PORT",
        value_name = "PORT",
        default_value = "3000",
        value_parser = port_or(3000)
    )]
    pub port: u16,

    #[arg(
        long = "bind-host",
        global = true,
        env = "BIND_HOST",
        value_name = "IP",
        default_value = "0.0.0.0"
    )]
    pub bind_host: IpAddr,
}

impl Config {
    pub fn listen_port(&self) -> u16 {
        self.server_port.unwrap_or(self.port)
    }

    /// Whether the identity is UUID-formatted. Other strings still work as a
    /// Trojan password but VLESS/VMess clients will reject them.
    pub fn uuid_is_well_formed(&self) -> bool {
        uuid::Uuid::parse_str(&self.uuid).is_ok()
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_host, self.listen_port())
    }

    /// Fragment shared by every generated link: `{name}-{isp}`.
    pub fn link_label(&self) -> String {
        format!("{}-{}", self.name, self.isp)
    }

    /// Route served by the subscription handler, e.g. `/sub`.
    pub fn sub_route(&self) -> String {
        format!("/{}", self.sub_path)
    }

    /// Public URL of the subscription, when the project URL is known.
    pub fn subscription_url(&self) -> Option<String> {
        if self.project_url.is_empty() {
            return None;
        }
        Some(format!(
            "{}/{}",
            self.project_url.trim_end_matches('/'),
            self.sub_path
        ))
    }
}

fn parse_uuid(value: &str) -> Result<String, Infallible> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(DEFAULT_UUID.to_string());
    }
    Ok(trimmed.to_string())
}

fn parse_sub_path(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(DEFAULT_SUB_PATH.to_string());
    }
    if trimmed.contains(['/', '?', '#']) || trimmed.chars().any(char::is_whitespace) {
        return Err("sub path must be a single path segment".to_string());
    }
    if trimmed.starts_with([':', '*']) {
        return Err("sub path must not start with ':' or '*'".to_string());
    }
    Ok(trimmed.to_string())
}

// Only the literal "true" turns keep-alive on.
fn parse_auto_access(value: &str) -> Result<bool, Infallible> {
    Ok(value == "true")
}

fn text_or(
    default: &'static str,
) -> impl Fn(&str) -> Result<String, Infallible> + Clone + Send + Sync + 'static {
    move |value: &str| {
        if value.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(value.to_string())
        }
    }
}

fn port_or(default: u16) -> impl Fn(&str) -> Result<u16, String> + Clone + Send + Sync + 'static {
    move |value: &str| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(default);
        }
        match trimmed.parse::<u16>() {
            Ok(port) if port != 0 => Ok(port),
            _ => Err(format!("invalid port {trimmed:?}: expected 1..=65535")),
        }
    }
}

fn optional_port(value: &str) -> Result<Option<u16>, String> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    port_or(0)(value).map(Some)
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        uuid: DEFAULT_UUID.to_string(),
        name: DEFAULT_NAME.to_string(),
        cfip: DEFAULT_CFIP.to_string(),
        cfport: 443,
        argo_domain: "tunnel.example.com".to_string(),
        argo_auth: String::new(),
        argo_port: 8001,
        argo_placeholder_domain: crate::argo_domain::PLACEHOLDER_ARGO_DOMAIN.to_string(),
        sub_path: DEFAULT_SUB_PATH.to_string(),
        isp: DEFAULT_ISP.to_string(),
        upload_url: String::new(),
        project_url: String::new(),
        auto_access: false,
        keepalive_url: DEFAULT_KEEPALIVE_URL.to_string(),
        server_port: None,
        port: 3000,
        bind_host: IpAddr::from([127, 0, 0, 1]),
    }
}
