//! Connection-Registry – Stabile Identitaet -> lebendes Verbindungs-Handle
//!
//! Die Registry ist die einzige Wahrheitsquelle fuer die Frage "ist diese
//! Identitaet gerade erreichbar". Direktanrufe werden ueber sie adressiert.
//!
//! Invariante: pro Identitaet hoechstens ein Verbindungs-Handle. Eine
//! erneute Registrierung derselben Identitaet von einer anderen Verbindung
//! ueberschreibt den alten Eintrag (letzter Schreiber gewinnt) und wird
//! geloggt – Identitaeten sind nicht authentifiziert.

use anruf_core::types::{ConnectionId, Identity};
use dashmap::DashMap;
use std::sync::Arc;

/// Abbildung von Identitaet auf Verbindungs-Handle
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct ConnectionRegistry {
    inner: Arc<DashMap<Identity, ConnectionId>>,
}

impl ConnectionRegistry {
    /// Erstellt eine neue, leere Registry
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }

    /// Verknuepft eine Identitaet mit einem Verbindungs-Handle
    ///
    /// Ein bestehender Eintrag fuer dieselbe Identitaet wird
    /// ueberschrieben; das verdraengte Handle wird geloggt.
    pub fn registrieren(&self, identitaet: Identity, verbindung: ConnectionId) {
        if let Some(alt) = self.inner.insert(identitaet.clone(), verbindung) {
            if alt != verbindung {
                tracing::warn!(
                    identitaet = %identitaet,
                    alt = %alt,
                    neu = %verbindung,
                    "Identitaet neu registriert – alter Eintrag verdraengt"
                );
                return;
            }
        }
        tracing::info!(identitaet = %identitaet, verbindung = %verbindung, "Identitaet registriert");
    }

    /// Loest eine Identitaet zu ihrem Verbindungs-Handle auf
    pub fn aufloesen(&self, identitaet: &Identity) -> Option<ConnectionId> {
        self.inner.get(identitaet).map(|eintrag| *eintrag.value())
    }

    /// Entfernt alle Identitaets-Eintraege die auf dieses Handle zeigen
    ///
    /// Beim Disconnect ist nur das Handle bekannt, der Mapping-Schluessel
    /// ist aber die Identitaet – daher der Rueckwaerts-Durchlauf.
    pub fn verbindung_entfernen(&self, verbindung: &ConnectionId) {
        self.inner.retain(|_, eintrag| eintrag != verbindung);
    }

    /// Gibt die Anzahl registrierter Identitaeten zurueck
    pub fn anzahl(&self) -> usize {
        self.inner.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
