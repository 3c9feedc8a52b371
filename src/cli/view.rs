//! Text rendering of session events for the console.
//!
//! Holds the little state the console shows besides the scrolling output:
//! a status line and the SSIDs discovered by the last scan.

use crate::protocol::{ClassifiedEvent, SessionEvent};

pub const STATUS_DISCONNECTED: &str = "Disconnected";
pub const STATUS_SCANNING: &str = "Scanning for Wi-Fi...";
pub const STATUS_SCAN_COMPLETE: &str = "Wi-Fi Scan Complete!";
pub const STATUS_BEACON: &str = "Starting Beacon Attack!";
pub const STATUS_DEAUTH: &str = "Starting Deauth Attack!";
pub const STATUS_ATTACK_STARTED: &str = "Attack started!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleView {
    status: String,
    ssids: Vec<String>,
}

impl Default for ConsoleView {
    fn default() -> Self {
        Self {
            status: STATUS_DISCONNECTED.to_string(),
            ssids: Vec::new(),
        }
    }
}

impl ConsoleView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn ssids(&self) -> &[String] {
        &self.ssids
    }

    /// Set the status line and return its printable form.
    pub fn set_status(&mut self, status: &str) -> String {
        self.status = status.to_string();
        format!("Status: {status}")
    }

    pub fn clear_ssids(&mut self) {
        self.ssids.clear();
    }

    /// Fold one event into the view, returning the line to print, if any.
    pub fn apply(&mut self, event: &SessionEvent) -> Option<String> {
        match event {
            SessionEvent::Connected { port } => {
                self.status = format!("Connected to {port}");
                Some(format!("Connected to {port}"))
            }
            SessionEvent::Disconnected => {
                self.status = STATUS_DISCONNECTED.to_string();
                Some("Disconnected.".to_string())
            }
            SessionEvent::LineReceived { line } => Some(format!("RECV: {line}")),
            SessionEvent::Classified { event } => match event {
                ClassifiedEvent::SsidDiscovered(line) => {
                    self.ssids.push(line.clone());
                    None
                }
                ClassifiedEvent::ScanComplete => Some(self.set_status(STATUS_SCAN_COMPLETE)),
                ClassifiedEvent::AttackStarted => Some(self.set_status(STATUS_ATTACK_STARTED)),
            },
            SessionEvent::Sent { command } => Some(format!("SENT: {command}")),
            SessionEvent::SendError { message } => Some(format!("Send Error: {message}")),
            SessionEvent::ReadError { message } => Some(format!("ERROR: {message}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> SessionEvent {
        SessionEvent::LineReceived {
            line: text.to_string(),
        }
    }

    #[test]
    fn connection_lifecycle_updates_status() {
        let mut view = ConsoleView::new();
        assert_eq!(view.status(), "Disconnected");

        let out = view.apply(&SessionEvent::Connected {
            port: "COM3".to_string(),
        });
        assert_eq!(out.as_deref(), Some("Connected to COM3"));
        assert_eq!(view.status(), "Connected to COM3");

        let out = view.apply(&SessionEvent::Disconnected);
        assert_eq!(out.as_deref(), Some("Disconnected."));
        assert_eq!(view.status(), "Disconnected");
    }

    #[test]
    fn scan_results_collect_ssids() {
        let mut view = ConsoleView::new();
        view.set_status(STATUS_SCANNING);
        assert_eq!(view.apply(&line("CH: 6 SSID: TestNet")).as_deref(), Some("RECV: CH: 6 SSID: TestNet"));
        let ssid = SessionEvent::Classified {
            event: ClassifiedEvent::SsidDiscovered("CH: 6 SSID: TestNet".to_string()),
        };
        assert_eq!(view.apply(&ssid), None);
        assert_eq!(view.ssids(), ["CH: 6 SSID: TestNet".to_string()]);

        let done = SessionEvent::Classified {
            event: ClassifiedEvent::ScanComplete,
        };
        assert_eq!(view.apply(&done).as_deref(), Some("Status: Wi-Fi Scan Complete!"));
        assert_eq!(view.status(), STATUS_SCAN_COMPLETE);

        view.clear_ssids();
        assert!(view.ssids().is_empty());
    }

    #[test]
    fn attack_and_errors_render() {
        let mut view = ConsoleView::new();
        let attack = SessionEvent::Classified {
            event: ClassifiedEvent::AttackStarted,
        };
        assert_eq!(view.apply(&attack).as_deref(), Some("Status: Attack started!"));
        assert_eq!(
            view.apply(&SessionEvent::Sent {
                command: "stop".to_string()
            })
            .as_deref(),
            Some("SENT: stop")
        );
        assert_eq!(
            view.apply(&SessionEvent::SendError {
                message: "broken pipe".to_string()
            })
            .as_deref(),
            Some("Send Error: broken pipe")
        );
        assert_eq!(
            view.apply(&SessionEvent::ReadError {
                message: "glitch".to_string()
            })
            .as_deref(),
            Some("ERROR: glitch")
        );
    }
}
