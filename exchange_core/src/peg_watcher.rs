//! Background peg polling and event broadcasting.
//!
//! The `PegWatcher` runs a background thread that reads a price from a feed on a fixed
//! interval, grades it with a `PegMonitor` and broadcasts the report to every subscriber
//! using `crossbeam_channel`. Subscribers register by sending a `Sender<PegEvent>` to the
//! subscription channel (see `PegWatcher::subscription`), or by calling
//! `PegWatcher::subscribe`.
//!
//! Event model:
//! - `PegEvent::Report(PegHealthReport)` — one graded price observation.
//! - `PegEvent::Shutdown` — the watcher stopped; consumers should finish.
//!
//! Design notes:
//! - The monitor is owned by the thread and handed back by `PegWatcher::stop`, so the
//!   report history survives the watcher.
//! - Broadcast is best-effort: if sending to a subscriber fails, it is removed.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, select, unbounded};
use exchange_common::{ExchangeError, Result};
use log::{debug, info, warn};
use rand::Rng;
use rust_decimal::Decimal;

use crate::model::amount::{QUOTE_SCALE, to_scale};
use crate::model::peg::{PegHealthReport, PegMonitor};

/// Message sent by the watcher to its subscribers.
#[derive(Debug, Clone)]
pub enum PegEvent {
    /// Graded price observation.
    Report(PegHealthReport),
    /// The watcher has stopped.
    Shutdown,
}

/// Handle to a running peg polling thread.
pub struct PegWatcher {
    subscribe_tx: Sender<Sender<PegEvent>>,
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<PegMonitor>>,
}

impl PegWatcher {
    /// Start polling `price_feed` every `interval`, grading prices with `monitor`.
    ///
    /// A feed returning `None` skips that tick.
    pub fn start<F>(mut monitor: PegMonitor, interval: Duration, mut price_feed: F) -> Self
    where
        F: FnMut() -> Option<Decimal> + Send + 'static,
    {
        let (subscribe_tx, subscribe_rx) = unbounded::<Sender<PegEvent>>();
        let (stop_tx, stop_rx) = unbounded::<()>();

        let handle = thread::spawn(move || {
            let mut clients: Vec<Sender<PegEvent>> = Vec::new();
            info!(
                "Peg watcher started (Thread ID: {:?}, interval {:?})",
                thread::current().id(),
                interval
            );

            loop {
                register(&subscribe_rx, &mut clients);

                match price_feed() {
                    Some(price) => {
                        let event = PegEvent::Report(monitor.check_peg_health(price));
                        clients.retain(|client_tx| client_tx.send(event.clone()).is_ok());
                    }
                    None => warn!("Price feed returned no price, skipping tick"),
                }

                select! {
                    recv(stop_rx) -> _ => break,
                    default(interval) => {}
                }
            }

            register(&subscribe_rx, &mut clients);
            for client_tx in &clients {
                let _ = client_tx.send(PegEvent::Shutdown);
            }
            info!("Peg watcher stopped");
            monitor
        });

        PegWatcher {
            subscribe_tx,
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Channel accepting per-subscriber senders.
    pub fn subscription(&self) -> Sender<Sender<PegEvent>> {
        self.subscribe_tx.clone()
    }

    /// Register a new subscriber and return its receiving end.
    pub fn subscribe(&self) -> Result<Receiver<PegEvent>> {
        let (event_tx, event_rx) = unbounded::<PegEvent>();
        self.subscribe_tx
            .send(event_tx)
            .map_err(|e| ExchangeError::ChannelSend(format!("peg subscription: {}", e)))?;
        Ok(event_rx)
    }

    /// Stop the thread, wait for it and return the monitor with its history.
    pub fn stop(mut self) -> Result<PegMonitor> {
        let _ = self.stop_tx.send(());
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ExchangeError::Thread("peg watcher".to_string())),
            None => Ok(PegMonitor::default()),
        }
    }
}

impl Drop for PegWatcher {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.stop_tx.send(());
        }
    }
}

fn register(subscribe_rx: &Receiver<Sender<PegEvent>>, clients: &mut Vec<Sender<PegEvent>>) {
    while let Ok(new_client_tx) = subscribe_rx.try_recv() {
        clients.push(new_client_tx);
        debug!("Peg watcher: new subscriber. Total: {}", clients.len());
    }
}

/// Synthetic feed: a small random walk around `start`.
///
/// Each tick moves the price by at most ±0.015% and never below 0.01. A step that
/// would overflow keeps the previous price.
pub fn simulated_feed(start: Decimal) -> impl FnMut() -> Option<Decimal> + Send + 'static {
    let floor = Decimal::new(1, 2);
    let mut price = start;
    move || {
        let basis: i64 = rand::rng().random_range(-15..=15);
        let change = Decimal::new(basis, 5);
        if let Some(next) = price.checked_mul(Decimal::ONE + change) {
            price = to_scale(next, QUOTE_SCALE).max(floor);
        }
        Some(price)
    }
}
