//! SOCKS4/5 and HTTP proxy outbounds.

use super::stream::apply_stream;
use super::{Endpoint, Outbound, TranslateOptions};
use sb_profile::{SocksHttpBean, SocksVersion};
use serde_json::json;

pub fn socks_http(
    bean: &SocksHttpBean,
    is_http: bool,
    ep: Endpoint<'_>,
    opts: &TranslateOptions,
) -> Outbound {
    let mut o = Outbound::new();
    o.insert("type".into(), json!(if is_http { "http" } else { "socks" }));
    if !is_http && bean.version == SocksVersion::V4 {
        o.insert("version".into(), json!("4"));
    }
    ep.insert_into(&mut o);
    // credentials only when both are set
    if !bean.username.is_empty() && !bean.password.is_empty() {
        o.insert("username".into(), json!(bean.username));
        o.insert("password".into(), json!(bean.password));
    }
    apply_stream(&mut o, &bean.stream, opts);
    o
}

#[cfg(test)]
mod tests {
    use super::*;

    const EP: Endpoint<'static> = Endpoint {
        server: "10.0.0.1",
        port: 1080,
    };

    #[test]
    fn socks4_has_version_and_no_partial_auth() {
        let b = SocksHttpBean {
            version: SocksVersion::V4,
            username: "only-user".into(),
            ..Default::default()
        };
        let o = socks_http(&b, false, EP, &TranslateOptions::default());
        assert_eq!(o["type"], json!("socks"));
        assert_eq!(o["version"], json!("4"));
        assert!(!o.contains_key("username"));
    }

    #[test]
    fn http_with_credentials() {
        let b = SocksHttpBean {
            version: SocksVersion::V4,
            username: "u".into(),
            password: "p".into(),
            ..Default::default()
        };
        let o = socks_http(&b, true, EP, &TranslateOptions::default());
        assert_eq!(o["type"], json!("http"));
        assert!(!o.contains_key("version"));
        assert_eq!(o["username"], json!("u"));
        assert_eq!(o["server"], json!("10.0.0.1"));
    }
}
