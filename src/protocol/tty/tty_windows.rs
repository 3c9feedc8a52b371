use std::{cmp::Ordering, collections::HashSet};

use serialport::SerialPortInfo;

/// Dedup COM names case-insensitively and sort by COM number.
pub fn sort_and_dedup_ports(raw_ports: Vec<SerialPortInfo>) -> Vec<SerialPortInfo> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut ports: Vec<SerialPortInfo> = Vec::new();

    for port in raw_ports.into_iter() {
        let up = port.port_name.to_uppercase();
        let key = extract_com_base(&up).unwrap_or(up);
        if seen.insert(key) {
            ports.push(port);
        }
    }

    fn com_index(name: &str) -> Option<u32> {
        name.to_uppercase().strip_prefix("COM")?.parse::<u32>().ok()
    }

    ports.sort_by(|a, b| match (com_index(&a.port_name), com_index(&b.port_name)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.port_name.cmp(&b.port_name),
    });

    ports
}

// "COM" followed by digits anywhere in the name (handles NULL_COM3 etc.)
fn extract_com_base(s: &str) -> Option<String> {
    let start = s.find("COM")?;
    let digits: String = s[start + 3..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        None
    } else {
        Some(format!("COM{digits}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialport::SerialPortType;

    fn make_com(name: &str) -> SerialPortInfo {
        SerialPortInfo {
            port_name: name.to_string(),
            port_type: SerialPortType::Unknown,
        }
    }

    #[test]
    fn windows_sort_numeric_and_dedup() {
        let input = vec![make_com("COM10"), make_com("COM3"), make_com("com3"), make_com("COM2")];
        let names: Vec<_> = sort_and_dedup_ports(input)
            .into_iter()
            .map(|p| p.port_name)
            .collect();
        assert_eq!(names, vec!["COM2", "COM3", "COM10"]);
    }

    #[test]
    fn windows_null_com_dedup() {
        let input = vec![make_com("COM3"), make_com("NULL_COM3"), make_com("Com4")];
        let out = sort_and_dedup_ports(input);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].port_name, "COM3");
    }
}
