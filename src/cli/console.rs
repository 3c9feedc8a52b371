//! Interactive line console.
//!
//! Plain input lines go straight to the device. Lines starting with `:` are
//! console commands mirroring the buttons of the desktop tool.

use std::{
    io::{self, BufRead},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use parking_lot::Mutex;

use super::{config::ConsoleConfig, view, view::ConsoleView};
use crate::protocol::{
    commands::{self, ATTACK_BEACON, ATTACK_DEAUTH, SCAN_WIFI, STOP},
    SendOutcome, Session, SessionEvent,
};

const HELP: &str = "\
Lines without a leading ':' are sent to the device as-is.
  :ports              list serial ports
  :connect [PORT]     connect (default: --port, config, or first port found)
  :disconnect         close the connection
  :scan               clear the SSID list and scan for Wi-Fi
  :beacon | :deauth   start an attack
  :stop               stop the running scan or attack
  :ssid [NAME]        add a fake SSID to the beacon list
  :ssids              show SSIDs found by the last scan
  :suggest PREFIX     complete a Marauder command
  :status             show the status line
  :quit               disconnect and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Send(String),
    Ports,
    Connect(Option<String>),
    Disconnect,
    Scan,
    Beacon,
    Deauth,
    Stop,
    Ssid(Option<String>),
    Ssids,
    Suggest(String),
    Status,
    Help,
    Quit,
    Unknown(String),
}

impl ConsoleInput {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix(':') else {
            return Self::Send(trimmed.to_string());
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim().to_string()).filter(|a| !a.is_empty())),
            None => (rest, None),
        };
        match name {
            "ports" => Self::Ports,
            "connect" => Self::Connect(arg),
            "disconnect" => Self::Disconnect,
            "scan" => Self::Scan,
            "beacon" => Self::Beacon,
            "deauth" => Self::Deauth,
            "stop" => Self::Stop,
            "ssid" => Self::Ssid(arg),
            "ssids" => Self::Ssids,
            "suggest" => Self::Suggest(arg.unwrap_or_default()),
            "status" => Self::Status,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        }
    }
}

pub struct Console {
    session: Arc<Session>,
    config: ConsoleConfig,
    view: Arc<Mutex<ConsoleView>>,
    json: bool,
}

impl Console {
    pub fn new(session: Arc<Session>, config: ConsoleConfig, json: bool) -> Self {
        Self {
            session,
            config,
            view: Arc::new(Mutex::new(ConsoleView::new())),
            json,
        }
    }

    /// Read stdin until EOF or `:quit`, then disconnect.
    pub fn run(self) -> Result<()> {
        let handler_session = Arc::clone(&self.session);
        ctrlc::set_handler(move || {
            handler_session.disconnect();
            std::process::exit(130);
        })
        .context("Failed to install Ctrl-C handler")?;

        let stop = Arc::new(AtomicBool::new(false));
        let printer = self.spawn_printer(Arc::clone(&stop))?;

        if let Some(port) = self.config.port.clone() {
            self.connect(Some(port));
        }
        self.notice("Type :help for console commands.");

        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = line.context("Failed to read from stdin")?;
            if !self.handle(ConsoleInput::parse(&line)) {
                break;
            }
        }

        self.session.disconnect();
        stop.store(true, Ordering::Release);
        if printer.join().is_err() {
            log::warn!("Event printer thread panicked");
        }
        Ok(())
    }

    fn spawn_printer(&self, stop: Arc<AtomicBool>) -> Result<thread::JoinHandle<()>> {
        let events = self.session.events();
        let view = Arc::clone(&self.view);
        let json = self.json;
        thread::Builder::new()
            .name("marauder-printer".to_string())
            .spawn(move || loop {
                match events.recv_timeout(Duration::from_millis(100)) {
                    Ok(event) => print_event(&mut view.lock(), &event, json),
                    Err(flume::RecvTimeoutError::Timeout) => {
                        if stop.load(Ordering::Acquire) {
                            break;
                        }
                    }
                    Err(flume::RecvTimeoutError::Disconnected) => break,
                }
            })
            .context("Failed to start event printer")
    }

    /// Execute one input; returns false when the console should exit.
    pub fn handle(&self, input: ConsoleInput) -> bool {
        match input {
            ConsoleInput::Send(command) => self.send(&command),
            ConsoleInput::Ports => {
                let ports = self.session.list_available_ports();
                if ports.is_empty() {
                    self.notice("No COM found");
                }
                for port in ports {
                    self.notice(&port);
                }
            }
            ConsoleInput::Connect(port) => self.connect(port),
            ConsoleInput::Disconnect => {
                if !self.session.is_connected() {
                    self.notice("Not connected to ESP32");
                }
                self.session.disconnect();
            }
            ConsoleInput::Scan => {
                let status = {
                    let mut state = self.view.lock();
                    state.clear_ssids();
                    state.set_status(view::STATUS_SCANNING)
                };
                self.notice(&status);
                self.send(SCAN_WIFI);
            }
            ConsoleInput::Beacon => {
                let status = self.view.lock().set_status(view::STATUS_BEACON);
                self.notice(&status);
                self.send(ATTACK_BEACON);
            }
            ConsoleInput::Deauth => {
                let status = self.view.lock().set_status(view::STATUS_DEAUTH);
                self.notice(&status);
                self.send(ATTACK_DEAUTH);
            }
            ConsoleInput::Stop => self.send(STOP),
            ConsoleInput::Ssid(name) => {
                let name = name.unwrap_or_else(|| self.config.fake_ssid.clone());
                match commands::add_ssid(&name) {
                    Ok(command) => self.send(&command),
                    Err(err) => self.notice(&format!("Input Error: {err}")),
                }
            }
            ConsoleInput::Ssids => {
                let ssids = self.view.lock().ssids().to_vec();
                if ssids.is_empty() {
                    self.notice("No SSIDs discovered yet");
                }
                for ssid in ssids {
                    self.notice(&ssid);
                }
            }
            ConsoleInput::Suggest(prefix) => {
                let matches = commands::suggest(&prefix);
                if matches.is_empty() {
                    self.notice("No matching commands");
                }
                for cmd in matches {
                    self.notice(cmd);
                }
            }
            ConsoleInput::Status => {
                let status = self.view.lock().status().to_string();
                self.notice(&format!("Status: {status}"));
            }
            ConsoleInput::Help => self.notice(HELP),
            ConsoleInput::Quit => return false,
            ConsoleInput::Unknown(name) => {
                self.notice(&format!("Unknown console command ':{name}', try :help"))
            }
        }
        true
    }

    fn connect(&self, port: Option<String>) {
        let port = port
            .or_else(|| self.config.port.clone())
            .or_else(|| self.session.list_available_ports().into_iter().next());
        let Some(port) = port else {
            self.notice("Connection Error: No COM port selected or available.");
            return;
        };
        if let Err(err) = self.session.connect(&port) {
            self.notice(&format!("Connection Error: {err}"));
        }
    }

    fn send(&self, command: &str) {
        match self.session.send(command) {
            Ok(SendOutcome::NotConnected) => self.notice("Not connected to ESP32"),
            // Sent commands and failures are rendered from the event stream.
            Ok(SendOutcome::Sent(_)) | Ok(SendOutcome::Skipped) | Err(_) => {}
        }
    }

    /// Console-local output; kept off stdout in JSON mode.
    fn notice(&self, text: &str) {
        if self.json {
            eprintln!("{text}");
        } else {
            println!("{text}");
        }
    }
}

/// Render one event the way the console prints it.
pub fn print_event(view: &mut ConsoleView, event: &SessionEvent, json: bool) {
    let text = view.apply(event);
    if json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(err) => log::warn!("Failed to encode event {event:?}: {err}"),
        }
    } else if let Some(text) = text {
        println!("{text}");
    }
}
