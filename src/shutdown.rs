use std::io;

use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::watch;
use tracing::{info, warn};

/// Exit status of a process killed by SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

trait Interrupts {
    /// Waits for the next interrupt. `None` once no more can arrive.
    async fn next_interrupt(&mut self) -> Option<()>;
}

impl Interrupts for Signal {
    async fn next_interrupt(&mut self) -> Option<()> {
        self.recv().await
    }
}

/// Sets the flag on the first interrupt and calls `on_repeat` on the second one.
async fn forward_interrupts<I, F>(mut interrupts: I, trigger: ShutdownTrigger, on_repeat: F)
where
    I: Interrupts,
    F: FnOnce(),
{
    if interrupts.next_interrupt().await.is_none() {
        return;
    }
    info!("interrupt received");
    trigger.trigger();

    if interrupts.next_interrupt().await.is_some() {
        warn!("second interrupt received, exiting without cleanup");
        on_repeat();
    }
}

/// Sets the shutdown flag observed by the paired [`Shutdown`]s.
#[derive(Debug)]
pub struct ShutdownTrigger(watch::Sender<bool>);

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.0.send_replace(true);
    }
}

/// A cancellation flag checked by the polling loop.
#[derive(Debug, Clone)]
pub struct Shutdown(watch::Receiver<bool>);

impl Shutdown {
    /// Returns a flag set on the first SIGINT (Ctrl-C) the process receives.
    /// A second SIGINT exits the process at once with status 130.
    ///
    /// The signal handler is installed before this returns, so an interrupt is
    /// never lost to the default handler afterwards. Must be called within a
    /// tokio runtime.
    pub fn on_interrupt() -> io::Result<Self> {
        let interrupt = signal(SignalKind::interrupt())?;
        let (trigger, shutdown) = channel();

        tokio::spawn(forward_interrupts(interrupt, trigger, || {
            std::process::exit(INTERRUPTED_EXIT_CODE)
        }));

        Ok(shutdown)
    }

    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once the flag is set. Never resolves if the trigger is dropped
    /// without firing.
    pub async fn triggered(&mut self) {
        if self.0.wait_for(|triggered| *triggered).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger(tx), Shutdown(rx))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;

    impl Interrupts for mpsc::UnboundedReceiver<()> {
        async fn next_interrupt(&mut self) -> Option<()> {
            self.recv().await
        }
    }

    #[tokio::test]
    async fn test_trigger() {
        let (trigger, mut shutdown) = channel();
        assert!(!shutdown.is_triggered());

        trigger.trigger();
        assert!(shutdown.is_triggered());
        shutdown.triggered().await;

        // stays set after the trigger is gone
        drop(trigger);
        assert!(shutdown.clone().is_triggered());
        shutdown.triggered().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_trigger_never_fires() {
        let (trigger, mut shutdown) = channel();
        drop(trigger);

        let res = tokio::time::timeout(Duration::from_secs(60), shutdown.triggered()).await;
        assert!(res.is_err());
        assert!(!shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_second_interrupt_exits() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (trigger, shutdown) = channel();
        let exited = Arc::new(AtomicBool::new(false));

        tx.send(()).unwrap();
        tx.send(()).unwrap();
        let flag = exited.clone();
        forward_interrupts(rx, trigger, move || flag.store(true, Ordering::SeqCst)).await;

        assert!(shutdown.is_triggered());
        assert!(exited.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_single_interrupt_keeps_listening() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (trigger, mut shutdown) = channel();
        let exited = Arc::new(AtomicBool::new(false));

        let flag = exited.clone();
        let listener = tokio::spawn(forward_interrupts(rx, trigger, move || {
            flag.store(true, Ordering::SeqCst)
        }));

        tx.send(()).unwrap();
        shutdown.triggered().await;
        assert!(!listener.is_finished());
        assert!(!exited.load(Ordering::SeqCst));

        drop(tx);
        listener.await.unwrap();
        assert!(!exited.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_no_interrupt_never_triggers() {
        let (tx, rx) = mpsc::unbounded_channel::<()>();
        let (trigger, shutdown) = channel();
        drop(tx);

        forward_interrupts(rx, trigger, || panic!("must not exit")).await;
        assert!(!shutdown.is_triggered());
    }
}
