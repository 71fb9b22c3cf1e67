// SPDX-License-Identifier: MIT OR Apache-2.0
//! Render worker pool.
//!
//! Workers pull [`FramePlan`]s from a shared request channel and send back
//! [`RenderedFrame`]s. Results arrive in completion order, not frame order.

use crate::error::{PlaybackError, Result};
use crate::video::{FramePlan, RenderedFrame};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::mpsc;

/// A fixed set of render threads
pub struct RenderPool {
    request_tx: Option<mpsc::UnboundedSender<FramePlan>>,
    result_rx: mpsc::UnboundedReceiver<RenderedFrame>,
    workers: Vec<JoinHandle<()>>,
    in_flight: usize,
}

impl RenderPool {
    /// Spawn `threads` workers (at least one)
    pub fn new(threads: usize) -> Result<Self> {
        let (request_tx, request_rx) = mpsc::unbounded_channel::<FramePlan>();
        let (result_tx, result_rx) = mpsc::unbounded_channel();
        let request_rx = Arc::new(Mutex::new(request_rx));

        let count = threads.max(1);
        let mut workers = Vec::with_capacity(count);
        for index in 0..count {
            let request_rx = Arc::clone(&request_rx);
            let result_tx = result_tx.clone();
            let handle = std::thread::Builder::new()
                .name(format!("ordoplay-render-{index}"))
                .spawn(move || render_worker(&request_rx, &result_tx))?;
            workers.push(handle);
        }
        tracing::debug!("Started render pool with {count} workers");

        Ok(Self {
            request_tx: Some(request_tx),
            result_rx,
            workers,
            in_flight: 0,
        })
    }

    /// Number of worker threads
    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    /// Plans submitted and not yet received
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Queue a plan for rendering
    pub fn submit(&mut self, plan: FramePlan) -> Result<()> {
        let tx = self.request_tx.as_ref().ok_or(PlaybackError::PoolClosed)?;
        tx.send(plan).map_err(|_| PlaybackError::PoolClosed)?;
        self.in_flight += 1;
        Ok(())
    }

    /// A finished frame, if one is ready
    pub fn try_recv(&mut self) -> Option<RenderedFrame> {
        let frame = self.result_rx.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(frame)
    }

    /// Wait for the next finished frame.
    ///
    /// Must not be called from inside an async runtime.
    pub fn recv_blocking(&mut self) -> Result<RenderedFrame> {
        let frame = self.result_rx.blocking_recv().ok_or(PlaybackError::PoolClosed)?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Ok(frame)
    }
}

impl Drop for RenderPool {
    fn drop(&mut self) {
        self.request_tx.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::error!("Render worker panicked");
            }
        }
    }
}

fn render_worker(
    request_rx: &Mutex<mpsc::UnboundedReceiver<FramePlan>>,
    result_tx: &mpsc::UnboundedSender<RenderedFrame>,
) {
    loop {
        let Some(plan) = request_rx.lock().blocking_recv() else {
            break; // Channel closed
        };
        let frame = plan.frame;
        if result_tx.send(plan.render()).is_err() {
            tracing::debug!("Dropping rendered frame {frame}, receiver gone");
            break;
        }
    }
}
