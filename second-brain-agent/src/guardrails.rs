//! Regex-based PII detection and redaction.

use regex::{NoExpand, Regex, RegexBuilder};
use serde::Serialize;

pub const REDACTED: &str = "[REDACTED]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiKind {
    Email,
    Phone,
    Ssn,
    CreditCard,
    IpAddress,
}

impl PiiKind {
    /// Redaction order; earlier patterns see the text first.
    pub const ALL: [PiiKind; 5] = [
        PiiKind::Email,
        PiiKind::Phone,
        PiiKind::Ssn,
        PiiKind::CreditCard,
        PiiKind::IpAddress,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PiiKind::Email => "email",
            PiiKind::Phone => "phone",
            PiiKind::Ssn => "ssn",
            PiiKind::CreditCard => "credit_card",
            PiiKind::IpAddress => "ip_address",
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            PiiKind::Email => r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b",
            PiiKind::Phone => r"\b(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b",
            PiiKind::Ssn => r"\b\d{3}-\d{2}-\d{4}\b",
            PiiKind::CreditCard => r"\b\d{4}[-.\s]?\d{4}[-.\s]?\d{4}[-.\s]?\d{4}\b",
            PiiKind::IpAddress => r"\b(?:\d{1,3}\.){3}\d{1,3}\b",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PiiEntity {
    pub kind: PiiKind,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PiiReport {
    pub has_pii: bool,
    pub entities: Vec<PiiEntity>,
}

#[derive(Debug, Clone)]
pub struct PiiGuard {
    enabled: bool,
    patterns: Vec<(PiiKind, Regex)>,
}

impl PiiGuard {
    pub fn new(enabled: bool) -> Result<Self, regex::Error> {
        let patterns = PiiKind::ALL
            .iter()
            .map(|kind| {
                RegexBuilder::new(kind.pattern())
                    .case_insensitive(true)
                    .build()
                    .map(|re| (*kind, re))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { enabled, patterns })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Replace every PII match with `[REDACTED]`. Disabled guards and
    /// empty text pass through unchanged.
    pub fn sanitize(&self, text: &str) -> String {
        if !self.enabled || text.is_empty() {
            return text.to_string();
        }

        let span = tracing::debug_span!(
            "guardrails.sanitize",
            input_length = text.chars().count(),
            pii_detected = tracing::field::Empty
        );
        let _enter = span.enter();

        let mut sanitized = text.to_string();
        for (_, re) in &self.patterns {
            sanitized = re.replace_all(&sanitized, NoExpand(REDACTED)).into_owned();
        }
        span.record("pii_detected", sanitized != text);
        sanitized
    }

    /// Find PII without redacting, ordered by position.
    pub fn detect_pii(&self, text: &str) -> PiiReport {
        if !self.enabled || text.is_empty() {
            return PiiReport::default();
        }

        let mut entities: Vec<PiiEntity> = self
            .patterns
            .iter()
            .flat_map(|(kind, re)| {
                re.find_iter(text).map(move |m| PiiEntity {
                    kind: *kind,
                    text: m.as_str().to_string(),
                    start: m.start(),
                    end: m.end(),
                })
            })
            .collect();
        entities.sort_by_key(|entity| (entity.start, entity.end));

        tracing::debug!(entities = entities.len(), "guardrails.detect_pii");
        PiiReport {
            has_pii: !entities.is_empty(),
            entities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> PiiGuard {
        PiiGuard::new(true).unwrap()
    }

    #[test]
    fn redacts_each_kind() {
        let g = guard();
        assert_eq!(g.sanitize("mail John.Doe@Example.COM now"), "mail [REDACTED] now");
        assert_eq!(g.sanitize("call 555-123-4567"), "call [REDACTED]");
        assert_eq!(g.sanitize("call +1 555.123.4567"), "call +[REDACTED]");
        assert_eq!(g.sanitize("ssn 123-45-6789."), "ssn [REDACTED].");
        assert_eq!(g.sanitize("card 4111-1111-1111-1111"), "card [REDACTED]");
        assert_eq!(g.sanitize("card 4111 1111 1111 1111"), "card [REDACTED]");
        assert_eq!(g.sanitize("host 192.168.1.10 up"), "host [REDACTED] up");
    }

    #[test]
    fn text_without_pii_is_unchanged() {
        let text = "Learning goals: finish the Rust book by 2026.";
        assert_eq!(guard().sanitize(text), text);
    }

    #[test]
    fn disabled_guard_and_empty_text_pass_through() {
        let g = PiiGuard::new(false).unwrap();
        assert!(!g.is_enabled());
        assert_eq!(g.sanitize("a@b.io"), "a@b.io");
        assert_eq!(g.detect_pii("a@b.io"), PiiReport::default());
        assert_eq!(guard().sanitize(""), "");
    }

    #[test]
    fn detect_reports_entities_in_order() {
        let report = guard().detect_pii("ip 10.0.0.1 and mail me@site.org");
        assert!(report.has_pii);
        let kinds: Vec<_> = report.entities.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![PiiKind::IpAddress, PiiKind::Email]);
        assert_eq!(report.entities[0].text, "10.0.0.1");
        assert_eq!(report.entities[1].start, 21);
    }

    #[test]
    fn detect_without_pii() {
        let report = guard().detect_pii("nothing to see");
        assert!(!report.has_pii);
        assert!(report.entities.is_empty());
    }
}
