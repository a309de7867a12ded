//! Recording controls from OS signals and the keyboard

use std::io::BufRead;
use std::thread;

use colored::Colorize;
use tokio::sync::mpsc;
use tracing::debug;

/// Control requests for a running recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// Pause if recording, resume if paused
    TogglePause,
    /// Stop and save (SIGINT/SIGTERM, `s`)
    Stop,
}

/// Map a line typed on stdin to a control
pub fn parse_key(line: &str) -> Option<ControlSignal> {
    match line.trim().to_lowercase().as_str() {
        "p" | "pause" | "r" | "resume" => Some(ControlSignal::TogglePause),
        "s" | "stop" | "q" | "quit" => Some(ControlSignal::Stop),
        _ => None,
    }
}

/// Control signal handler
///
/// Listens for OS signals and keyboard commands and funnels them into one
/// channel for the recording loop.
pub struct ControlSignalHandler {
    receiver: mpsc::Receiver<ControlSignal>,
}

impl ControlSignalHandler {
    /// Create a handler and start listening for OS signals.
    ///
    /// Returns the handler and a sender other sources can use to inject
    /// controls (e.g. the auto-stop timer).
    pub fn new() -> Result<(Self, mpsc::Sender<ControlSignal>), std::io::Error> {
        let (tx, rx) = mpsc::channel(10);
        install_os_signals(&tx)?;
        Ok((Self { receiver: rx }, tx))
    }

    /// Also read controls from stdin, one per line.
    ///
    /// Uses a plain thread so a pending read never holds up runtime shutdown.
    pub fn listen_stdin(tx: mpsc::Sender<ControlSignal>) {
        let spawned = thread::Builder::new()
            .name("stdin-controls".to_string())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else { break };
                    if let Some(control) = parse_key(&line) {
                        if tx.blocking_send(control).is_err() {
                            break;
                        }
                    }
                }
                debug!("stdin controls closed");
            });
        if let Err(e) = spawned {
            debug!(error = %e, "could not start stdin control thread");
        }
    }

    /// Wait for the next control
    pub async fn recv(&mut self) -> Option<ControlSignal> {
        self.receiver.recv().await
    }
}

#[cfg(unix)]
fn install_os_signals(tx: &mpsc::Sender<ControlSignal>) -> Result<(), std::io::Error> {
    use tokio::signal::unix::{signal, SignalKind};

    let forward = |kind: SignalKind, name: &'static str, control: ControlSignal| {
        let tx = tx.clone();
        signal(kind).map(|mut stream| {
            tokio::spawn(async move {
                while stream.recv().await.is_some() {
                    eprintln!("{} Received {}", "↓".cyan(), name);
                    if tx.send(control).await.is_err() {
                        break;
                    }
                }
            });
        })
    };

    forward(SignalKind::interrupt(), "SIGINT (stop)", ControlSignal::Stop)?;
    forward(SignalKind::terminate(), "SIGTERM (stop)", ControlSignal::Stop)?;
    forward(SignalKind::user_defined1(), "SIGUSR1 (pause/resume)", ControlSignal::TogglePause)?;
    Ok(())
}

#[cfg(not(unix))]
fn install_os_signals(tx: &mpsc::Sender<ControlSignal>) -> Result<(), std::io::Error> {
    let tx = tx.clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{} Received Ctrl+C (stop)", "↓".cyan());
            if tx.send(ControlSignal::Stop).await.is_err() {
                break;
            }
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_controls() {
        assert_eq!(parse_key("p"), Some(ControlSignal::TogglePause));
        assert_eq!(parse_key(" P \n"), Some(ControlSignal::TogglePause));
        assert_eq!(parse_key("resume"), Some(ControlSignal::TogglePause));
        assert_eq!(parse_key("s"), Some(ControlSignal::Stop));
        assert_eq!(parse_key("q"), Some(ControlSignal::Stop));
        assert_eq!(parse_key(""), None);
        assert_eq!(parse_key("x"), None);
    }

    #[tokio::test]
    async fn injected_controls_are_received() {
        let (mut handler, tx) = ControlSignalHandler::new().unwrap();

        tx.send(ControlSignal::TogglePause).await.unwrap();
        tx.send(ControlSignal::Stop).await.unwrap();

        assert_eq!(handler.recv().await, Some(ControlSignal::TogglePause));
        assert_eq!(handler.recv().await, Some(ControlSignal::Stop));
    }
}
