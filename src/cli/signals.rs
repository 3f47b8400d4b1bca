//! Shutdown signal handling for live sessions

use std::fmt;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

/// Why the session is being ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// SIGINT (Ctrl+C)
    Interrupt,
    /// SIGTERM
    Terminate,
}

impl fmt::Display for Shutdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => write!(f, "SIGINT"),
            Self::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Listens for SIGINT and SIGTERM
pub struct ShutdownSignal {
    receiver: mpsc::Receiver<Shutdown>,
}

impl ShutdownSignal {
    /// Install handlers for both signals
    pub fn install() -> Result<Self, std::io::Error> {
        let (tx, rx) = mpsc::channel(2);

        for (kind, reason) in [
            (SignalKind::interrupt(), Shutdown::Interrupt),
            (SignalKind::terminate(), Shutdown::Terminate),
        ] {
            let mut stream = signal(kind)?;
            let tx = tx.clone();
            tokio::spawn(async move {
                if stream.recv().await.is_some() {
                    let _ = tx.send(reason).await;
                }
            });
        }

        Ok(Self { receiver: rx })
    }

    /// Wait for the first signal
    pub async fn recv(&mut self) -> Option<Shutdown> {
        self.receiver.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_display() {
        assert_eq!(Shutdown::Interrupt.to_string(), "SIGINT");
        assert_eq!(Shutdown::Terminate.to_string(), "SIGTERM");
    }

    #[tokio::test]
    async fn install_succeeds() {
        assert!(ShutdownSignal::install().is_ok());
    }
}
