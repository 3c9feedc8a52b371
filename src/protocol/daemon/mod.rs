pub mod serial_daemon;
