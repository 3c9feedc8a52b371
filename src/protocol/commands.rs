//! Marauder command vocabulary.
//!
//! The session never validates outbound text against this list; it only
//! feeds autocomplete and the canned actions of the console.

use derive_more::{Display, Error};

/// Commands understood by the Marauder firmware CLI.
pub const MARAUDER_COMMANDS: [&str; 58] = [
    "channel -s",
    "settings -s",
    "settings -r",
    "clearlist -a",
    "clearlist -c",
    "clearlist -s",
    "reboot",
    "update -s",
    "update -w",
    "ls",
    "led -s",
    "led -p",
    "gpsdata",
    "gps",
    "nmea",
    "evilportal",
    "packetcount",
    "pingscan",
    "portscan",
    "sigmon",
    "scanall",
    "scanap",
    "scansta",
    "sniffraw",
    "sniffbeacon",
    "sniffprobe",
    "sniffpwn",
    "sniffpinescan",
    "sniffmultissid",
    "sniffesp",
    "sniffdeauth",
    "sniffpmkid",
    "stopscan",
    "attack -t beacon",
    "attack -t deauth",
    "attack -t probe",
    "attack -t rickroll",
    "info",
    "list -s",
    "list -a",
    "list -c",
    "list -t",
    "list -i",
    "select -a",
    "select -s",
    "select -c",
    "ssid -a",
    "ssid -r",
    "save -a",
    "save -s",
    "load -a",
    "load -s",
    "join -a",
    "sniffbt",
    "blespam",
    "spoofat",
    "sniffskim",
    "stop",
];

pub const SCAN_WIFI: &str = "scan -t wifi";
pub const ATTACK_BEACON: &str = "attack -t beacon";
pub const ATTACK_DEAUTH: &str = "attack -t deauth";
pub const STOP: &str = "stop";

#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum CommandError {
    #[display("fake SSID cannot be empty")]
    EmptySsid,
}

/// Vocabulary entries starting with `typed` (compared lowercase).
pub fn suggest(typed: &str) -> Vec<&'static str> {
    let typed = typed.to_lowercase();
    if typed.is_empty() {
        return Vec::new();
    }
    MARAUDER_COMMANDS
        .iter()
        .copied()
        .filter(|cmd| cmd.starts_with(&typed))
        .collect()
}

/// `ssid -a "<name>"`, adding a fake SSID to the beacon list.
pub fn add_ssid(name: &str) -> Result<String, CommandError> {
    if name.is_empty() {
        return Err(CommandError::EmptySsid);
    }
    Ok(format!("ssid -a \"{name}\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_has_no_duplicates() {
        let mut sorted = MARAUDER_COMMANDS.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), MARAUDER_COMMANDS.len());
    }

    #[test]
    fn suggest_matches_prefix_in_vocabulary_order() {
        assert_eq!(
            suggest("attack"),
            vec![
                "attack -t beacon",
                "attack -t deauth",
                "attack -t probe",
                "attack -t rickroll"
            ]
        );
        assert_eq!(suggest("SNIFFB"), vec!["sniffbeacon", "sniffbt"]);
    }

    #[test]
    fn suggest_empty_or_unknown() {
        assert!(suggest("").is_empty());
        assert!(suggest("xyz").is_empty());
    }

    #[test]
    fn add_ssid_quotes_name() {
        assert_eq!(add_ssid("Free WiFi").as_deref(), Ok("ssid -a \"Free WiFi\""));
        assert_eq!(add_ssid(""), Err(CommandError::EmptySsid));
    }
}
