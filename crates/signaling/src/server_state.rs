//! Gemeinsamer Server-Zustand fuer den Signaling-Service
//!
//! Haelt die Konfiguration und alle geteilten Zustands-Manager, die sicher
//! zwischen tokio-Tasks geteilt werden koennen. Der Zustand wird beim
//! Serverstart erzeugt und per Arc in alle Verbindungs-Tasks gereicht –
//! Tests bauen sich eine frische Instanz statt auf globalem Zustand zu
//! arbeiten.

use anruf_protocol::signal::ServerStats;
use std::sync::Arc;
use std::time::Instant;

use crate::broadcast::EventBroadcaster;
use crate::matchmaking::MatchmakingQueue;
use crate::pairing::PairingTable;
use crate::presence::PresenceManager;
use crate::registry::ConnectionRegistry;

/// Konfiguration fuer den Signaling-Service
#[derive(Debug, Clone)]
pub struct SignalingConfig {
    /// Anzeigename des Servers
    pub server_name: String,
    /// Maximale gleichzeitige Clients
    pub max_clients: u32,
    /// Heartbeat-Timeout: so lange darf eine Verbindung stumm bleiben
    pub heartbeat_timeout_sek: u64,
    /// Intervall fuer den `server-stats`-Broadcast (0 = deaktiviert)
    pub stats_intervall_sek: u64,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            server_name: "Anruf Relay".to_string(),
            max_clients: 512,
            heartbeat_timeout_sek: 60,
            stats_intervall_sek: 30,
        }
    }
}

/// Gemeinsamer Server-Zustand (thread-safe, Arc-geteilt)
///
/// Alle Manager teilen ihren inneren Zustand via Clone; der State selbst
/// wird als Arc herumgereicht.
pub struct SignalingState {
    /// Server-Konfiguration (unveraenderlich nach dem Start)
    pub config: Arc<SignalingConfig>,
    /// Identitaet -> Verbindungs-Handle
    pub registry: ConnectionRegistry,
    /// Aktive Anruf-Paarungen
    pub pairings: PairingTable,
    /// Warteschlange fuer Zufalls-Anrufe
    pub queue: MatchmakingQueue,
    /// Online-Status und Heartbeat-Buchhaltung
    pub presence: PresenceManager,
    /// Event-Zustellung an Clients
    pub broadcaster: EventBroadcaster,
    /// Startzeitpunkt des Servers (fuer Uptime-Berechnung)
    pub start_time: Instant,
}

impl SignalingState {
    /// Erstellt einen neuen SignalingState
    pub fn neu(config: SignalingConfig) -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(config),
            registry: ConnectionRegistry::neu(),
            pairings: PairingTable::neu(),
            queue: MatchmakingQueue::neu(),
            presence: PresenceManager::neu(),
            broadcaster: EventBroadcaster::neu(),
            start_time: Instant::now(),
        })
    }

    /// Gibt die Uptime in Sekunden zurueck
    pub fn uptime_sek(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Erstellt den aktuellen Statistik-Schnappschuss
    pub fn stats_schnappschuss(&self) -> ServerStats {
        ServerStats {
            online: self.presence.online_anzahl(),
            waiting: self.queue.wartende_anzahl(),
            active_calls: self.pairings.paar_anzahl(),
            uptime_secs: self.uptime_sek(),
        }
    }
}
