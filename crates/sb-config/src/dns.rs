//! DNS server address parsing.
//!
//! Maps a user-facing resolver address to the engine's server `type` plus an
//! optional `server` field.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DnsAddress {
    pub kind: &'static str,
    /// Empty for `local` and `dhcp`.
    pub server: String,
}

impl DnsAddress {
    fn new(kind: &'static str, server: impl Into<String>) -> Self {
        Self {
            kind,
            server: server.into(),
        }
    }
}

/// Scheme table for addresses that keep everything after the scheme.
const PASSTHROUGH: &[(&str, &str)] = &[("tcp://", "tcp"), ("tls://", "tls"), ("quic://", "quic")];

/// Scheme table for addresses that keep only the host (path dropped).
const HOST_ONLY: &[(&str, &str)] = &[("https://", "https"), ("h3://", "h3")];

pub fn parse_dns_address(input: &str) -> DnsAddress {
    if input == "local" {
        return DnsAddress::new("local", "");
    }
    if input.starts_with("dhcp://") {
        return DnsAddress::new("dhcp", "");
    }
    for (scheme, kind) in PASSTHROUGH {
        if let Some(rest) = input.strip_prefix(scheme) {
            return DnsAddress::new(kind, rest);
        }
    }
    for (scheme, kind) in HOST_ONLY {
        if let Some(rest) = input.strip_prefix(scheme) {
            let host = rest.split('/').next().unwrap_or_default();
            return DnsAddress::new(kind, host);
        }
    }
    DnsAddress::new("udp", input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schemes() {
        assert_eq!(parse_dns_address("local"), DnsAddress::new("local", ""));
        assert_eq!(parse_dns_address("dhcp://auto"), DnsAddress::new("dhcp", ""));
        assert_eq!(parse_dns_address("tcp://1.1.1.1:53"), DnsAddress::new("tcp", "1.1.1.1:53"));
        assert_eq!(parse_dns_address("tls://dns.google"), DnsAddress::new("tls", "dns.google"));
        assert_eq!(
            parse_dns_address("https://dns.google/dns-query"),
            DnsAddress::new("https", "dns.google")
        );
        assert_eq!(
            parse_dns_address("h3://cloudflare-dns.com/dns-query"),
            DnsAddress::new("h3", "cloudflare-dns.com")
        );
        assert_eq!(parse_dns_address("quic://dns.adguard.com"), DnsAddress::new("quic", "dns.adguard.com"));
        assert_eq!(parse_dns_address("223.5.5.5"), DnsAddress::new("udp", "223.5.5.5"));
    }
}
