use std::collections::HashSet;

use serialport::{SerialPortInfo, SerialPortType};

/// Dedup by device basename (plus USB ids) and put likely ESP32 bridges first.
pub fn sort_and_dedup_ports(raw_ports: Vec<SerialPortInfo>) -> Vec<SerialPortInfo> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut ports: Vec<SerialPortInfo> = Vec::new();

    for p in raw_ports.into_iter() {
        let base = match p.port_name.rsplit('/').next() {
            Some(b) => b.to_lowercase(),
            None => p.port_name.to_lowercase(),
        };
        let key = match &p.port_type {
            SerialPortType::UsbPort(info) => format!("{}:vid={:04x}:pid={:04x}", base, info.vid, info.pid),
            _ => base,
        };

        if seen.insert(key) {
            ports.push(p);
        }
    }

    // Priority sort: USB/ACM first, then ttys
    fn priority(name: &str) -> i32 {
        let n = name.to_lowercase();
        if n.contains("ttyusb") || n.contains("usb") {
            0
        } else if n.contains("acm") {
            1
        } else if n.contains("ttys") || n.contains("serial") {
            2
        } else {
            10
        }
    }

    ports.sort_by(|a, b| {
        let pa = priority(&a.port_name);
        let pb = priority(&b.port_name);
        if pa != pb {
            pa.cmp(&pb)
        } else {
            a.port_name.cmp(&b.port_name)
        }
    });

    ports
}
