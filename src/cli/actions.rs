use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;

use super::{
    config::ConsoleConfig,
    console::{print_event, Console},
    view::ConsoleView,
};
use crate::protocol::{tty, SendOutcome, Session};

/// Dispatch on the parsed arguments.
pub fn run(matches: &ArgMatches) -> Result<()> {
    let json = matches.get_flag("json");

    if matches.get_flag("list-ports") {
        list_ports(json);
        return Ok(());
    }

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => ConsoleConfig::from_file(path)?,
        None => ConsoleConfig::default(),
    };
    if let Some(port) = matches.get_one::<String>("port") {
        config.port = Some(port.clone());
    }
    if let Some(ms) = matches.get_one::<u64>("listen-ms") {
        config.listen_ms = *ms;
    }

    let session = Session::serial();
    if let Some(command) = matches.get_one::<String>("send") {
        let port = config
            .port
            .clone()
            .ok_or_else(|| anyhow!("--send needs a port (use --port or the config file)"))?;
        return send_once(
            &session,
            &port,
            command,
            Duration::from_millis(config.listen_ms),
            json,
        );
    }

    Console::new(Arc::new(session), config, json).run()
}

/// Print attached serial ports, one per line or as a JSON array.
pub fn list_ports(json: bool) {
    let ports = tty::enumerate_ports();
    if json {
        match serde_json::to_string_pretty(&ports) {
            Ok(s) => println!("{s}"),
            Err(err) => log::error!("Failed to encode port list: {err}"),
        }
        return;
    }
    if ports.is_empty() {
        eprintln!("No serial ports found");
    }
    for p in ports.iter() {
        println!("{}\t{}", p.port_name, p.port_type);
    }
}

/// Connect, send `command`, print device output for `listen`, disconnect.
pub fn send_once(
    session: &Session,
    port: &str,
    command: &str,
    listen: Duration,
    json: bool,
) -> Result<()> {
    let events = session.events();
    let mut view = ConsoleView::new();

    session
        .connect(port)
        .with_context(|| format!("Connection to {port} failed"))?;

    let sent = session.send(command);
    let deadline = Instant::now() + listen;
    if matches!(sent, Ok(SendOutcome::Sent(_))) {
        while let Ok(event) = events.recv_deadline(deadline) {
            print_event(&mut view, &event, json);
        }
    }

    session.disconnect();
    for event in events.drain() {
        print_event(&mut view, &event, json);
    }

    match sent {
        Ok(SendOutcome::Sent(_)) => Ok(()),
        Ok(SendOutcome::Skipped) => Err(anyhow!("Nothing to send: command is blank")),
        Ok(SendOutcome::NotConnected) => Err(anyhow!("Not connected to {port}")),
        Err(err) => Err(err).context("Command was not delivered"),
    }
}
