//! Event-Broadcaster – Sendet Events an einzelne oder alle Clients
//!
//! Der EventBroadcaster verwaltet die Send-Queues aller verbundenen
//! Verbindungen. Zustellung ist fire-and-forget: ist eine Queue voll oder
//! geschlossen, wird das Event verworfen und nicht nachgeliefert – das
//! Relay garantiert keine Zustellung (Clients muessen verspaetete oder
//! fehlende Signaling-Nachrichten tolerieren).
//!
//! Anders als die Registry ist der Broadcaster nach Verbindungs-Handle
//! indiziert: auch anonyme Clients ohne registrierte Identitaet empfangen
//! Broadcasts wie `online-count`.

use anruf_core::types::ConnectionId;
use anruf_protocol::SignalEvent;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Groesse der Send-Queue pro Verbindung
const SEND_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// VerbindungsSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue einer verbundenen Verbindung
#[derive(Clone, Debug)]
pub struct VerbindungsSender {
    pub verbindung: ConnectionId,
    pub tx: mpsc::Sender<SignalEvent>,
}

impl VerbindungsSender {
    /// Reiht ein Event nicht-blockierend in die Send-Queue ein
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    pub fn senden(&self, event: SignalEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(e)) => {
                tracing::warn!(
                    verbindung = %self.verbindung,
                    event = e.name(),
                    "Send-Queue voll – Event verworfen"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(e)) => {
                tracing::debug!(
                    verbindung = %self.verbindung,
                    event = e.name(),
                    "Send-Queue geschlossen (Client getrennt)"
                );
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EventBroadcaster
// ---------------------------------------------------------------------------

/// Zentraler Event-Broadcaster fuer alle verbundenen Clients
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct EventBroadcaster {
    inner: Arc<EventBroadcasterInner>,
}

struct EventBroadcasterInner {
    /// Send-Queues, indiziert nach Verbindungs-Handle
    clients: DashMap<ConnectionId, VerbindungsSender>,
}

impl EventBroadcaster {
    /// Erstellt einen neuen EventBroadcaster
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(EventBroadcasterInner {
                clients: DashMap::new(),
            }),
        }
    }

    /// Registriert eine neue Verbindung und gibt ihre Empfangs-Queue zurueck
    ///
    /// Die `ClientConnection` liest aus dieser Queue und sendet via TCP.
    pub fn client_registrieren(&self, verbindung: ConnectionId) -> mpsc::Receiver<SignalEvent> {
        let (tx, rx) = mpsc::channel(SEND_QUEUE_GROESSE);
        let sender = VerbindungsSender { verbindung, tx };
        self.inner.clients.insert(verbindung, sender);
        tracing::debug!(verbindung = %verbindung, "Verbindung im Broadcaster registriert");
        rx
    }

    /// Entfernt eine Verbindung aus dem Broadcaster
    pub fn client_entfernen(&self, verbindung: &ConnectionId) {
        self.inner.clients.remove(verbindung);
        tracing::debug!(verbindung = %verbindung, "Verbindung aus Broadcaster entfernt");
    }

    /// Sendet ein Event an eine einzelne Verbindung
    ///
    /// Gibt `true` zurueck wenn die Verbindung gefunden und das Event
    /// eingereiht wurde.
    pub fn an_verbindung_senden(&self, verbindung: &ConnectionId, event: SignalEvent) -> bool {
        match self.inner.clients.get(verbindung) {
            Some(sender) => sender.senden(event),
            None => {
                tracing::debug!(
                    verbindung = %verbindung,
                    event = event.name(),
                    "Senden an unbekannte Verbindung"
                );
                false
            }
        }
    }

    /// Sendet ein Event an alle verbundenen Clients
    ///
    /// Gibt die Anzahl der erfolgreichen Sendungen zurueck.
    pub fn an_alle_senden(&self, event: SignalEvent) -> usize {
        let mut gesendet = 0;
        self.inner.clients.iter().for_each(|entry| {
            if entry.value().senden(event.clone()) {
                gesendet += 1;
            }
        });
        gesendet
    }

    /// Gibt die Anzahl der registrierten Verbindungen zurueck
    pub fn client_anzahl(&self) -> usize {
        self.inner.clients.len()
    }

    /// Prueft ob eine Verbindung registriert und ihre Queue offen ist
    ///
    /// Dient als Liveness-Pruefung beim Matchmaking: eine Verbindung deren
    /// Queue bereits geschlossen ist gilt als tot.
    pub fn ist_erreichbar(&self, verbindung: &ConnectionId) -> bool {
        self.inner
            .clients
            .get(verbindung)
            .map(|sender| !sender.tx.is_closed())
            .unwrap_or(false)
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
