//! Rule classifier: raw rule lines → typed match buckets.
//! 规则分类：把原始规则行按前缀拆分为匹配类别。
//!
//! Domain entries understand `full:`, `domain:`, `regexp:`, `keyword:` and
//! `geosite:`; IP entries understand `geoip:`. Unprefixed entries fall back to
//! an exact domain (lower-cased) or a literal CIDR. Values are never validated
//! here; the engine owns that.

use serde_json::{json, Map, Value};

/// Domain sub-type selected by a prefix.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DomainKind {
    Full,
    Suffix,
    Regex,
    Keyword,
    Geosite,
}

/// IP sub-type selected by a prefix.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IpKind {
    Cidr,
    Geoip,
}

/// Closed prefix table for domain rules.
pub const DOMAIN_PREFIXES: &[(&str, DomainKind)] = &[
    ("geosite:", DomainKind::Geosite),
    ("full:", DomainKind::Full),
    ("domain:", DomainKind::Suffix),
    ("regexp:", DomainKind::Regex),
    ("keyword:", DomainKind::Keyword),
];

/// Closed prefix table for IP rules.
pub const IP_PREFIXES: &[(&str, IpKind)] = &[("geoip:", IpKind::Geoip)];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RuleMode {
    Domain,
    Ip,
}

/// Classified rule entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleList {
    pub full: Vec<String>,
    pub suffix: Vec<String>,
    pub keyword: Vec<String>,
    pub regex: Vec<String>,
    pub geosite: Vec<String>,
    pub cidr: Vec<String>,
    pub geoip: Vec<String>,
    mode: Option<RuleMode>,
}

impl RuleList {
    #[must_use]
    pub fn mode(&self) -> Option<RuleMode> {
        self.mode
    }

    pub fn is_empty(&self) -> bool {
        self.full.is_empty()
            && self.suffix.is_empty()
            && self.keyword.is_empty()
            && self.regex.is_empty()
            && self.geosite.is_empty()
            && self.cidr.is_empty()
            && self.geoip.is_empty()
    }

    /// Render as an engine rule object. Every key of the mode is present,
    /// empty buckets included.
    pub fn to_json(&self) -> Map<String, Value> {
        let v = match self.mode {
            Some(RuleMode::Ip) => json!({
                "ip_cidr": self.cidr,
                "geoip": self.geoip,
            }),
            _ => json!({
                "domain": self.full,
                "domain_suffix": self.suffix,
                "domain_keyword": self.keyword,
                "domain_regex": self.regex,
                "geosite": self.geosite,
            }),
        };
        match v {
            Value::Object(m) => m,
            _ => Map::new(),
        }
    }
}

fn classify_domain(entry: &str) -> (DomainKind, String) {
    for (prefix, kind) in DOMAIN_PREFIXES {
        if let Some(rest) = entry.strip_prefix(prefix) {
            let value = match kind {
                DomainKind::Geosite => rest.to_string(),
                _ => rest.to_lowercase(),
            };
            return (*kind, value);
        }
    }
    (DomainKind::Full, entry.to_lowercase())
}

fn classify_ip(entry: &str) -> (IpKind, String) {
    for (prefix, kind) in IP_PREFIXES {
        if let Some(rest) = entry.strip_prefix(prefix) {
            return (*kind, rest.to_string());
        }
    }
    (IpKind::Cidr, entry.to_string())
}

/// Classify `entries` in order. Returns `None` when nothing was produced,
/// which callers read as "omit this rule".
pub fn classify<I, S>(entries: I, mode: RuleMode) -> Option<RuleList>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut list = RuleList {
        mode: Some(mode),
        ..Default::default()
    };
    for entry in entries {
        let entry = entry.as_ref();
        match mode {
            RuleMode::Domain => {
                let (kind, value) = classify_domain(entry);
                let bucket = match kind {
                    DomainKind::Full => &mut list.full,
                    DomainKind::Suffix => &mut list.suffix,
                    DomainKind::Regex => &mut list.regex,
                    DomainKind::Keyword => &mut list.keyword,
                    DomainKind::Geosite => &mut list.geosite,
                };
                bucket.push(value);
            }
            RuleMode::Ip => {
                let (kind, value) = classify_ip(entry);
                match kind {
                    IpKind::Cidr => list.cidr.push(value),
                    IpKind::Geoip => list.geoip.push(value),
                }
            }
        }
    }
    if list.is_empty() {
        None
    } else {
        Some(list)
    }
}

/// Split a multi-line settings field into rule entries.
///
/// Lines are trimmed; blank lines and lines starting with `#` are skipped.
pub fn split_rule_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIXED: [&str; 5] = [
        "full:example.com",
        "domain:sub.com",
        "geosite:cn",
        "1.2.3.0/24",
        "geoip:private",
    ];

    #[test]
    fn domain_mode_buckets() {
        let l = classify(MIXED, RuleMode::Domain).unwrap();
        assert_eq!(l.suffix, vec!["sub.com"]);
        assert_eq!(l.geosite, vec!["cn"]);
        // unprefixed entries are exact domains in domain mode
        assert_eq!(l.full, vec!["example.com", "1.2.3.0/24", "geoip:private"]);
    }

    #[test]
    fn ip_mode_buckets() {
        let l = classify(MIXED, RuleMode::Ip).unwrap();
        assert_eq!(l.geoip, vec!["private"]);
        assert!(l.cidr.contains(&"1.2.3.0/24".to_string()));
    }

    #[test]
    fn mixed_prefix_entries_split_by_mode() {
        let d = classify(["full:example.com", "domain:sub.com", "geosite:cn"], RuleMode::Domain)
            .unwrap();
        assert_eq!(d.full, vec!["example.com"]);
        assert_eq!(d.suffix, vec!["sub.com"]);
        assert_eq!(d.geosite, vec!["cn"]);
        let i = classify(["1.2.3.0/24", "geoip:private"], RuleMode::Ip).unwrap();
        assert_eq!(i.cidr, vec!["1.2.3.0/24"]);
        assert_eq!(i.geoip, vec!["private"]);
    }

    #[test]
    fn lowercases_domains_but_not_geosite() {
        let l = classify(
            ["Example.COM", "keyword:GooGle", "regexp:^A.*", "geosite:Geolocation-!CN"],
            RuleMode::Domain,
        )
        .unwrap();
        assert_eq!(l.full, vec!["example.com"]);
        assert_eq!(l.keyword, vec!["google"]);
        assert_eq!(l.regex, vec!["^a.*"]);
        assert_eq!(l.geosite, vec!["Geolocation-!CN"]);
    }

    #[test]
    fn empty_input_omits_rule() {
        assert!(classify(Vec::<String>::new(), RuleMode::Domain).is_none());
        assert!(classify(Vec::<String>::new(), RuleMode::Ip).is_none());
    }

    #[test]
    fn json_keys_always_present() {
        let l = classify(["geosite:cn"], RuleMode::Domain).unwrap();
        let j = l.to_json();
        for k in ["domain", "domain_suffix", "domain_keyword", "domain_regex", "geosite"] {
            assert!(j.contains_key(k), "missing {k}");
        }
        let l = classify(["10.0.0.0/8"], RuleMode::Ip).unwrap();
        let j = l.to_json();
        assert_eq!(j.len(), 2);
        assert_eq!(j["geoip"], serde_json::json!([]));
    }

    #[test]
    fn split_lines_skips_comments() {
        let v = split_rule_lines("  a.com \n\n# note\nb.com\r\n");
        assert_eq!(v, vec!["a.com", "b.com"]);
    }
}
