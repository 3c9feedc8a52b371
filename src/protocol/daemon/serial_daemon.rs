use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use flume::Sender;

use crate::protocol::{
    classify::Classifier,
    session::{teardown, LinkSlot, SessionEvent, SharedTransport},
    transport::{decode_line, ReadError},
};

/// Everything the reader thread owns for one connection.
pub(crate) struct ReaderContext {
    pub link_id: u64,
    pub port: String,
    pub transport: SharedTransport,
    pub running: Arc<AtomicBool>,
    pub slot: Arc<LinkSlot>,
    pub classifier: Arc<dyn Classifier>,
    pub evt_tx: Sender<SessionEvent>,
    pub poll_interval: Duration,
}

/// Boot the serial read loop for one connection.
/// Must be started in a separate thread, otherwise it will block the caller.
///
/// Runs until the running flag is cleared or the transport fails. Lines are
/// published in arrival order, each followed by its classified events.
pub(crate) fn boot_serial_loop(ctx: ReaderContext) {
    log::debug!("Reader for {} started", ctx.port);
    let fatal = poll_lines(&ctx);

    let ReaderContext {
        link_id,
        port,
        transport,
        slot,
        evt_tx,
        ..
    } = ctx;
    // Release our handle first so teardown closes the port for good.
    drop(transport);

    if let Some(err) = fatal {
        log::warn!("Reader for {port} stopped: {err}");
        if let Some(link) = slot.take(Some(link_id)) {
            teardown(link, &evt_tx);
        }
    } else {
        log::debug!("Reader for {port} stopped");
    }
}

fn poll_lines(ctx: &ReaderContext) -> Option<ReadError> {
    while ctx.running.load(Ordering::Acquire) {
        let step = {
            let mut transport = ctx.transport.lock();
            match transport.bytes_available() {
                Ok(0) => Ok(None),
                Ok(_) => transport.read_line().map(Some),
                Err(err) => Err(err),
            }
        };

        match step {
            Ok(Some(raw)) => publish_line(ctx, &raw),
            Ok(None) => thread::sleep(ctx.poll_interval),
            Err(err) => {
                let _ = ctx.evt_tx.send(SessionEvent::ReadError {
                    message: err.to_string(),
                });
                if err.is_fatal() {
                    return Some(err);
                }
                log::warn!("Read from {} failed: {err}", ctx.port);
                thread::sleep(ctx.poll_interval);
            }
        }
    }
    None
}

fn publish_line(ctx: &ReaderContext, raw: &[u8]) {
    let line = decode_line(raw);
    if line.is_empty() {
        return;
    }
    log::trace!("{} <- {line}", ctx.port);
    let events = ctx.classifier.classify(&line);
    let _ = ctx.evt_tx.send(SessionEvent::LineReceived { line });
    for event in events {
        log::debug!("Classified line from {}: {event:?}", ctx.port);
        let _ = ctx.evt_tx.send(SessionEvent::Classified { event });
    }
}
