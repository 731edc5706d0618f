//! Wire constants shared by the server document and the client links.
//!
//! The percent-encoded paths are written out by hand rather than computed so
//! the generated links stay byte-identical to what existing clients import.

pub const VLESS_FLOW_XTLS_RPRX_VISION: &str = "xtls-rprx-vision";

pub const VLESS_WS_PATH: &str = "/vless-argo";
pub const VMESS_WS_PATH: &str = "/vmess-argo";
pub const TROJAN_WS_PATH: &str = "/trojan-argo";

/// Early-data hint appended to the websocket path on the client side.
pub const WS_EARLY_DATA_QUERY: &str = "?ed=2560";

/// `/vless-argo?ed=2560`, percent-encoded for a query value.
pub const VLESS_WS_PATH_ENCODED: &str = "%2Fvless-argo%3Fed%3D2560";
/// `/trojan-argo?ed=2560`, percent-encoded for a query value.
pub const TROJAN_WS_PATH_ENCODED: &str = "%2Ftrojan-argo%3Fed%3D2560";
/// VMess carries its path inside JSON, so it stays unencoded.
pub const VMESS_WS_PATH_WITH_EARLY_DATA: &str = "/vmess-argo?ed=2560";

/// Loopback listener ports behind the Argo entry listener. Not configurable.
pub const VLESS_TCP_PORT: u16 = 3001;
pub const VLESS_WS_PORT: u16 = 3002;
pub const VMESS_WS_PORT: u16 = 3003;
pub const TROJAN_WS_PORT: u16 = 3004;

pub const LOOPBACK_LISTEN: &str = "127.0.0.1";

#[cfg(test)]
pub(crate) fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap();
            out.push(u8::from_str_radix(hex, 16).unwrap());
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).unwrap()
}
