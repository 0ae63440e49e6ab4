//! anruf-server – Bibliotheks-Root
//!
//! Deklariert alle Server-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod config;

use anruf_protocol::SignalEvent;
use anruf_signaling::{SignalingConfig, SignalingServer, SignalingState};
use anyhow::Result;
use config::ServerConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Server-Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Geteilten Signaling-Zustand aufbauen
    /// 2. TCP-Listener starten (Signal-Protokoll)
    /// 3. Periodischen Statistik-Broadcast starten
    /// 4. Auf Ctrl-C warten, dann Shutdown-Signal an alle Tasks
    pub async fn starten(self) -> Result<()> {
        tracing::info!(
            server_name = %self.config.server.name,
            tcp = %self.config.tcp_bind_adresse(),
            max_clients = self.config.server.max_clients,
            "Server startet"
        );

        let state = SignalingState::neu(SignalingConfig {
            server_name: self.config.server.name.clone(),
            max_clients: self.config.server.max_clients,
            heartbeat_timeout_sek: self.config.relay.heartbeat_timeout_sek,
            stats_intervall_sek: self.config.relay.stats_intervall_sek,
        });

        let bind_addr: SocketAddr = self.config.tcp_bind_adresse().parse().map_err(|e| {
            anruf_core::RelayError::Konfiguration(format!("Ungueltige Bind-Adresse: {e}"))
        })?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // TCP-Listener
        let tcp_server = SignalingServer::neu(Arc::clone(&state), bind_addr);
        let tcp_task = tokio::spawn(tcp_server.starten(shutdown_rx.clone()));

        // Periodischer server-stats-Broadcast
        let stats_task = tokio::spawn(stats_schleife(
            Arc::clone(&state),
            shutdown_rx.clone(),
        ));

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");

        // Alle Tasks benachrichtigen; Verbindungs-Tasks verabschieden
        // sich jeweils mit einem server-shutdown-Frame
        let _ = shutdown_tx.send(true);

        match tcp_task.await {
            Ok(Err(e)) => tracing::warn!(fehler = %e, "TCP-Listener endete mit Fehler"),
            Err(e) => tracing::warn!(fehler = %e, "TCP-Task endete unsauber"),
            Ok(Ok(())) => {}
        }
        let _ = stats_task.await;

        tracing::info!("Server beendet");
        Ok(())
    }
}

/// Sendet periodisch den aktuellen Statistik-Schnappschuss an alle Clients
///
/// Rein informativ; `stats_intervall_sek = 0` deaktiviert die Schleife.
async fn stats_schleife(
    state: Arc<SignalingState>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let intervall_sek = state.config.stats_intervall_sek;
    if intervall_sek == 0 {
        return;
    }

    let mut intervall = tokio::time::interval(Duration::from_secs(intervall_sek));
    // Erster Tick feuert sofort, den ueberspringen wir
    intervall.tick().await;

    loop {
        tokio::select! {
            _ = intervall.tick() => {
                let stats = state.stats_schnappschuss();
                let empfaenger = state
                    .broadcaster
                    .an_alle_senden(SignalEvent::ServerStats(stats));
                tracing::debug!(empfaenger, "server-stats gesendet");
            }
            Ok(()) = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
}
