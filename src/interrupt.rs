//! Ctrl+C handling for long extractions

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{Context, Result};
use tokio::runtime::{Builder, Runtime};

/// Cooperative stop request shared between the signal listener and a run.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Listens for Ctrl+C while alive. Dropping it stops the listener.
pub struct InterruptGuard {
    flag: InterruptFlag,
    runtime: Option<Runtime>,
}

impl InterruptGuard {
    pub fn install() -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("worldtrim-signal")
            .enable_all()
            .build()
            .context("Failed to start signal listener")?;
        let flag = InterruptFlag::new();
        let listener_flag = flag.clone();
        runtime.spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                println!("Aborting...");
                listener_flag.request_stop();
            }
        });
        Ok(Self {
            flag,
            runtime: Some(runtime),
        })
    }

    pub fn flag(&self) -> InterruptFlag {
        self.flag.clone()
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
