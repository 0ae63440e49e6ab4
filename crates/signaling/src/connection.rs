//! Client-Connection – Verwaltet eine einzelne TCP-Verbindung
//!
//! Jede TCP-Verbindung bekommt eine `ClientConnection` in einem eigenen
//! tokio-Task. Die Schleife liest Frames, dispatcht sie und schreibt
//! direkte Antworten sowie die Broadcaster-Queue zurueck auf den Draht.
//!
//! ## Lebenszyklus
//! ```text
//! Accept -> connect-info -> [register | find-random | ...] -> Trennung
//! ```
//!
//! ## Keepalive
//! - Client sendet periodisch `heartbeat`, Server antwortet `heartbeat-ack`
//! - Kommt innerhalb von `heartbeat_timeout_sek` kein Frame, wird die
//!   Verbindung getrennt
//! - `heartbeat_timeout_sek = 0` deaktiviert die Pruefung

use futures_util::{SinkExt, StreamExt};
use anruf_protocol::{
    signal::{ServerShutdown, SignalEvent},
    wire::FrameCodec,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use anruf_core::ConnectionId;

use crate::dispatcher::{DispatcherContext, MessageDispatcher};
use crate::handlers::session_handler;
use crate::server_state::SignalingState;

/// Verarbeitet eine einzelne TCP-Verbindung
///
/// Liest Frames via `FrameCodec`, dispatcht an `MessageDispatcher` und
/// sendet Antworten zurueck. Laeuft in einem eigenen tokio-Task.
pub struct ClientConnection {
    state: Arc<SignalingState>,
    peer_addr: SocketAddr,
}

impl ClientConnection {
    /// Erstellt eine neue ClientConnection
    pub fn neu(state: Arc<SignalingState>, peer_addr: SocketAddr) -> Self {
        Self { state, peer_addr }
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Diese Methode laeuft bis die Verbindung getrennt wird oder ein
    /// Shutdown-Signal eingeht. Der Disconnect-Pfad raeumt am Ende
    /// immer auf, egal wie die Schleife endet.
    pub async fn verarbeiten(
        self,
        stream: TcpStream,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) {
        let peer_addr = self.peer_addr;
        let verbindung = ConnectionId::new();
        let timeout_sek = self.state.config.heartbeat_timeout_sek;

        tracing::info!(peer = %peer_addr, verbindung = %verbindung, "Neue Verbindung");

        // Framed-Stream mit FrameCodec einrichten
        let mut framed = Framed::new(stream, FrameCodec::new());

        // Send-Queue registrieren, Presence eintragen, connect-info senden
        let mut sende_rx = session_handler::handle_connect(&self.state, verbindung);

        let mut ctx = DispatcherContext::neu(verbindung);
        let dispatcher = MessageDispatcher::neu(Arc::clone(&self.state));

        // Zeitpunkt des letzten empfangenen Frames
        let mut letzter_empfang = Instant::now();

        loop {
            // Heartbeat-Timeout pruefen (0 = deaktiviert)
            let timeout_verzoegerung = if timeout_sek == 0 {
                Duration::from_secs(3600)
            } else {
                let frist = letzter_empfang + Duration::from_secs(timeout_sek);
                let jetzt = Instant::now();
                if jetzt >= frist {
                    tracing::warn!(
                        peer = %peer_addr,
                        verbindung = %verbindung,
                        "Heartbeat-Timeout"
                    );
                    break;
                }
                frist.duration_since(jetzt)
            };

            tokio::select! {
                // Eingehendes Event vom Client
                frame = framed.next() => {
                    match frame {
                        Some(Ok(event)) => {
                            letzter_empfang = Instant::now();

                            if let Some(antwort) = dispatcher.dispatch(event, &mut ctx).await {
                                if let Err(e) = framed.send(antwort).await {
                                    tracing::warn!(
                                        peer = %peer_addr,
                                        fehler = %e,
                                        "Senden fehlgeschlagen"
                                    );
                                    break;
                                }
                            }
                        }
                        Some(Err(e)) => {
                            tracing::warn!(
                                peer = %peer_addr,
                                fehler = %e,
                                "Frame-Lesefehler"
                            );
                            break;
                        }
                        None => {
                            tracing::info!(peer = %peer_addr, "Verbindung vom Client getrennt");
                            break;
                        }
                    }
                }

                // Ausgehendes Event aus dem Broadcaster
                Some(ausgehend) = sende_rx.recv() => {
                    if let Err(e) = framed.send(ausgehend).await {
                        tracing::warn!(
                            peer = %peer_addr,
                            fehler = %e,
                            "Broadcast-Senden fehlgeschlagen"
                        );
                        break;
                    }
                }

                // Heartbeat-Timeout
                _ = tokio::time::sleep(timeout_verzoegerung) => {
                    // Pruefung laeuft am Schleifenkopf
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(
                            peer = %peer_addr,
                            "Shutdown-Signal – Verbindung wird getrennt"
                        );
                        // Abschiedsnachricht senden
                        let abschied = SignalEvent::ServerShutdown(ServerShutdown {
                            message: "Server wird heruntergefahren".into(),
                            timestamp: chrono::Utc::now().timestamp_millis(),
                        });
                        let _ = framed.send(abschied).await;
                        break;
                    }
                }
            }
        }

        // Cleanup beim Verbindungsende: Registry, Schlange, Paarung,
        // Presence und Send-Queue in einem Zug
        dispatcher.verbindung_getrennt(&ctx);

        tracing::info!(peer = %peer_addr, verbindung = %verbindung, "Verbindungs-Task beendet");
    }
}
