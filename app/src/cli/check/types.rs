use sb_types::{BuildError, ErrorClass, ProfileId};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckEntry {
    pub profile: ProfileId,
    pub name: String,
    pub ok: bool,
    /// Outbounds in the test configuration
    pub outbounds: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<ErrorClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckEntry {
    pub fn passed(profile: ProfileId, name: String, outbounds: usize) -> Self {
        Self {
            profile,
            name,
            ok: true,
            outbounds,
            class: None,
            message: None,
        }
    }

    pub fn failed(profile: ProfileId, name: String, err: &BuildError) -> Self {
        Self {
            profile,
            name,
            ok: false,
            outbounds: 0,
            class: Some(err.class()),
            message: Some(err.to_string()),
        }
    }

    pub fn to_line(&self) -> String {
        match &self.message {
            None => format!(
                "ok    {:>6} {} ({} outbounds)",
                self.profile, self.name, self.outbounds
            ),
            Some(msg) => format!("FAIL  {:>6} {}: {}", self.profile, self.name, msg),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub ok: bool,
    pub total: usize,
    pub failed: usize,
    pub entries: Vec<CheckEntry>,
}

impl CheckReport {
    pub fn new(mut entries: Vec<CheckEntry>) -> Self {
        entries.sort_by_key(|e| e.profile);
        let failed = entries.iter().filter(|e| !e.ok).count();
        Self {
            ok: failed == 0,
            total: entries.len(),
            failed,
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_sorts_and_counts() {
        let r = CheckReport::new(vec![
            CheckEntry::failed(3, "c".into(), &BuildError::ChainMissing(9)),
            CheckEntry::passed(1, "a".into(), 2),
        ]);
        assert!(!r.ok);
        assert_eq!(r.failed, 1);
        assert_eq!(r.entries[0].profile, 1);
        assert_eq!(r.entries[1].class, Some(ErrorClass::Resolution));
        assert!(r.entries[1].to_line().contains("chain missing profile: 9"));
    }
}
