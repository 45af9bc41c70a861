use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::sync::Notify;

/// Single-fire cancellation token shared by the signal listener and the main
/// flow. Once fired it stays fired.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    fired: AtomicBool,
    notify: Notify,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the token. Returns `true` only for the call that actually fired it.
    pub fn trigger(&self) -> bool {
        let first = self
            .inner
            .fired
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();

        if first {
            self.inner.notify.notify_waiters();
        }
        first
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.fired.load(Ordering::SeqCst)
    }

    pub async fn wait(&self) {
        loop {
            // 先注册再检查, 避免错过 notify_waiters
            let notified = self.inner.notify.notified();
            if self.is_triggered() {
                return;
            }
            notified.await;
        }
    }

    /// Called from the signal listener. Only the first signal is acted on;
    /// returns whether this one was.
    pub fn on_signal(&self) -> bool {
        let first = self.trigger();
        if first {
            println!("\nReceived interrupt, shutting down...");
        }
        first
    }

    /// 退出信号监听: SIGINT 和 SIGTERM 都走同一条退出路径
    ///
    /// ctrlc's `termination` feature also routes SIGHUP here, so a hangup
    /// shuts down gracefully instead of killing the process.
    pub fn listen(&self) -> Result<(), ctrlc::Error> {
        let shutdown = self.clone();
        ctrlc::set_handler(move || {
            shutdown.on_signal();
        })
    }
}
