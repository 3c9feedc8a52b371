//! Substring rules turning Marauder console output into semantic events.
//!
//! The firmware has no structured response format, so the rules match the
//! text it is known to print. They live behind [`Classifier`] so another rule
//! set can be swapped in without touching the transport code.

use serde::{Deserialize, Serialize};

/// Semantic event derived from a received line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "line", rename_all = "snake_case")]
pub enum ClassifiedEvent {
    /// A scan result line naming an access point; carries the raw line.
    SsidDiscovered(String),
    ScanComplete,
    AttackStarted,
}

/// Maps one received line to zero or more events. Must be pure.
pub trait Classifier: Send + Sync {
    fn classify(&self, line: &str) -> Vec<ClassifiedEvent>;
}

/// Rules matching the stock Marauder firmware output.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarauderClassifier;

impl Classifier for MarauderClassifier {
    fn classify(&self, line: &str) -> Vec<ClassifiedEvent> {
        classify_line(line)
    }
}

/// Evaluate every rule independently against `line`.
pub fn classify_line(line: &str) -> Vec<ClassifiedEvent> {
    let mut events = Vec::new();
    if line.contains("SSID") && line.contains("CH:") {
        events.push(ClassifiedEvent::SsidDiscovered(line.to_string()));
    }
    if line.to_lowercase().contains("scan complete") {
        events.push(ClassifiedEvent::ScanComplete);
    }
    if line.contains("[Deauth]") || line.contains("[Beacon]") {
        events.push(ClassifiedEvent::AttackStarted);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ssid_line_keeps_raw_text() {
        assert_eq!(
            classify_line("CH: 6 SSID: TestNet"),
            vec![ClassifiedEvent::SsidDiscovered("CH: 6 SSID: TestNet".to_string())]
        );
    }

    #[test]
    fn ssid_requires_both_markers() {
        assert!(classify_line("SSID: TestNet").is_empty());
        assert!(classify_line("CH: 11").is_empty());
        // Case sensitive on both markers.
        assert!(classify_line("ch: 6 ssid: TestNet").is_empty());
    }

    #[test]
    fn scan_complete_is_case_insensitive() {
        assert_eq!(classify_line("Scan Complete!"), vec![ClassifiedEvent::ScanComplete]);
        assert_eq!(classify_line("SCAN COMPLETE"), vec![ClassifiedEvent::ScanComplete]);
    }

    #[test]
    fn attack_markers() {
        assert_eq!(
            classify_line("[Deauth] sent 50 packets"),
            vec![ClassifiedEvent::AttackStarted]
        );
        assert_eq!(classify_line("[Beacon] spamming"), vec![ClassifiedEvent::AttackStarted]);
        // Either marker, once.
        assert_eq!(
            classify_line("[Deauth][Beacon]"),
            vec![ClassifiedEvent::AttackStarted]
        );
        assert!(classify_line("[deauth] lowercase").is_empty());
    }

    #[test]
    fn rules_are_independent() {
        let events = classify_line("CH: 1 SSID: x scan complete [Beacon]");
        assert_eq!(
            events,
            vec![
                ClassifiedEvent::SsidDiscovered("CH: 1 SSID: x scan complete [Beacon]".to_string()),
                ClassifiedEvent::ScanComplete,
                ClassifiedEvent::AttackStarted,
            ]
        );
    }

    #[test]
    fn unmatched_line_yields_nothing() {
        assert!(MarauderClassifier.classify("> help").is_empty());
    }

    #[test]
    fn events_serialize_tagged() {
        let json = serde_json::to_string(&ClassifiedEvent::SsidDiscovered("CH: 1 SSID: a".into()))
            .expect("serialize");
        assert_eq!(json, r#"{"kind":"ssid_discovered","line":"CH: 1 SSID: a"}"#);
        let json = serde_json::to_string(&ClassifiedEvent::ScanComplete).expect("serialize");
        assert_eq!(json, r#"{"kind":"scan_complete"}"#);
    }
}
