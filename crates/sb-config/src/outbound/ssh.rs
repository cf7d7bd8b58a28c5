//! SSH tunnel outbound.

use super::{Endpoint, Outbound};
use sb_profile::SshBean;
use serde_json::json;

pub fn ssh(bean: &SshBean, ep: Endpoint<'_>) -> Outbound {
    let mut o = Outbound::new();
    o.insert("type".into(), json!("ssh"));
    ep.insert_into(&mut o);
    o.insert("user".into(), json!(bean.user));
    o.insert("password".into(), json!(bean.password));
    o.insert("private_key".into(), json!(bean.private_key));
    o.insert("private_key_path".into(), json!(bean.private_key_path));
    o.insert("private_key_passphrase".into(), json!(bean.private_key_passphrase));
    o.insert("host_key".into(), json!(bean.host_key));
    o.insert("host_key_algorithms".into(), json!(bean.host_key_algorithms));
    o.insert("client_version".into(), json!(bean.client_version));
    o
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ssh_fields() {
        let b = SshBean {
            user: "root".into(),
            host_key: vec!["ssh-ed25519 AAAA".into()],
            ..Default::default()
        };
        let o = ssh(
            &b,
            Endpoint {
                server: "h",
                port: 22,
            },
        );
        assert_eq!(o["type"], json!("ssh"));
        assert_eq!(o["user"], json!("root"));
        assert_eq!(o["host_key"], json!(["ssh-ed25519 AAAA"]));
        assert_eq!(o["host_key_algorithms"], json!([]));
    }
}
