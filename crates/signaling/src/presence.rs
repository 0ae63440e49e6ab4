//! Presence-Manager – Wer ist online, wann kam der letzte Heartbeat
//!
//! Haelt den ephemeren Verbindungszustand aller Clients: Verbindungs-
//! Zeitpunkt und letzten Heartbeat. Der Online-Zaehler wird bei jedem
//! Connect/Disconnect als `online-count` an alle Clients gebroadcastet
//! (best-effort – wer ein Update verpasst, bekommt das naechste).

use anruf_core::types::ConnectionId;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;

/// Ephemerer Zustand einer verbundenen Verbindung
#[derive(Debug, Clone, Copy)]
pub struct VerbindungsPresence {
    /// Zeitpunkt des Connects
    pub verbunden_seit: Instant,
    /// Zeitpunkt des letzten empfangenen Heartbeats (initial = Connect)
    pub letzter_heartbeat: Instant,
}

/// Verwaltet den Online-Status aller verbundenen Clients
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct PresenceManager {
    inner: Arc<DashMap<ConnectionId, VerbindungsPresence>>,
}

impl PresenceManager {
    /// Erstellt einen neuen PresenceManager
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }

    /// Registriert eine neue Verbindung als online
    pub fn client_verbunden(&self, verbindung: ConnectionId) {
        let jetzt = Instant::now();
        self.inner.insert(
            verbindung,
            VerbindungsPresence {
                verbunden_seit: jetzt,
                letzter_heartbeat: jetzt,
            },
        );
        tracing::info!(verbindung = %verbindung, online = self.inner.len(), "Client online");
    }

    /// Entfernt eine Verbindung (Verbindung getrennt)
    pub fn client_getrennt(&self, verbindung: &ConnectionId) {
        if self.inner.remove(verbindung).is_some() {
            tracing::info!(verbindung = %verbindung, online = self.inner.len(), "Client offline");
        }
    }

    /// Vermerkt einen eingegangenen Heartbeat
    pub fn heartbeat(&self, verbindung: &ConnectionId) {
        if let Some(mut presence) = self.inner.get_mut(verbindung) {
            presence.letzter_heartbeat = Instant::now();
        }
    }

    /// Gibt den Presence-Eintrag einer Verbindung zurueck
    pub fn presence_von(&self, verbindung: &ConnectionId) -> Option<VerbindungsPresence> {
        self.inner.get(verbindung).map(|eintrag| *eintrag.value())
    }

    /// Prueft ob eine Verbindung online ist
    pub fn ist_online(&self, verbindung: &ConnectionId) -> bool {
        self.inner.contains_key(verbindung)
    }

    /// Gibt die Anzahl verbundener Clients zurueck
    pub fn online_anzahl(&self) -> usize {
        self.inner.len()
    }
}

impl Default for PresenceManager {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
