//! Pairing-Table – Wer telefoniert gerade mit wem
//!
//! Eine Paarung ist die ephemere Beziehung zwischen genau zwei
//! Verbindungs-Handles waehrend ein Anruf aufgebaut wird oder laeuft,
//! mit einer designierten Initiator-Seite. Sie entsteht beim Anrufversuch
//! bzw. beim Matchmaking-Treffer und endet mit `end-call`, `not-ready`
//! oder dem Disconnect einer Seite.
//!
//! Die Tabelle macht den "aktuellen Partner" explizit: Relay-Events ohne
//! Zielangabe (`webrtc-offer`, `webrtc-answer`) und die Partner-
//! Benachrichtigung beim Disconnect werden hierueber aufgeloest.
//!
//! Invariante: ein Handle steht in hoechstens einer aktiven Paarung.

use anruf_core::types::ConnectionId;
use dashmap::DashMap;
use std::sync::Arc;

/// Entstehung einer Paarung
///
/// `not-ready` ist nur fuer vermittelte Paarungen definiert – ein
/// Direktanrufer darf dadurch nie in der Matchmaking-Schlange landen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaarungsArt {
    /// Identitaets-adressierter Anruf (`call-user`)
    Direktanruf,
    /// Zufalls-Vermittlung (`find-random`)
    Vermittlung,
}

/// Eine Seite einer aktiven Paarung
#[derive(Debug, Clone, Copy)]
struct PaarSeite {
    /// Das Handle der Gegenseite
    partner: ConnectionId,
    /// true fuer die Seite die das WebRTC-Offer erstellt
    initiator: bool,
    /// Wie die Paarung entstanden ist
    art: PaarungsArt,
}

/// Tabelle aller aktiven Anruf-Paarungen
///
/// Thread-safe via Arc + DashMap; beide Seiten einer Paarung werden
/// symmetrisch eingetragen. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct PairingTable {
    inner: Arc<DashMap<ConnectionId, PaarSeite>>,
}

impl PairingTable {
    /// Erstellt eine neue, leere Pairing-Table
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }

    /// Koppelt zwei Handles, `initiator` ist die erste Seite
    ///
    /// Schlaegt fehl wenn eine der Seiten bereits gekoppelt ist
    /// (ein Handle steht in hoechstens einer aktiven Paarung).
    pub fn koppeln(
        &self,
        initiator: ConnectionId,
        responder: ConnectionId,
        art: PaarungsArt,
    ) -> bool {
        if initiator == responder
            || self.inner.contains_key(&initiator)
            || self.inner.contains_key(&responder)
        {
            tracing::debug!(
                initiator = %initiator,
                responder = %responder,
                "Kopplung abgelehnt – eine Seite ist bereits gekoppelt"
            );
            return false;
        }

        self.inner.insert(
            initiator,
            PaarSeite {
                partner: responder,
                initiator: true,
                art,
            },
        );
        self.inner.insert(
            responder,
            PaarSeite {
                partner: initiator,
                initiator: false,
                art,
            },
        );
        tracing::debug!(initiator = %initiator, responder = %responder, art = ?art, "Paarung erstellt");
        true
    }

    /// Gibt den aktuellen Partner eines Handles zurueck
    pub fn partner_von(&self, verbindung: &ConnectionId) -> Option<ConnectionId> {
        self.inner.get(verbindung).map(|seite| seite.partner)
    }

    /// Prueft ob ein Handle gerade gekoppelt ist
    pub fn ist_gekoppelt(&self, verbindung: &ConnectionId) -> bool {
        self.inner.contains_key(verbindung)
    }

    /// Prueft ob ein Handle die Initiator-Seite seiner Paarung ist
    pub fn ist_initiator(&self, verbindung: &ConnectionId) -> bool {
        self.inner
            .get(verbindung)
            .map(|seite| seite.initiator)
            .unwrap_or(false)
    }

    /// Gibt die Entstehungsart der aktiven Paarung zurueck
    pub fn art_von(&self, verbindung: &ConnectionId) -> Option<PaarungsArt> {
        self.inner.get(verbindung).map(|seite| seite.art)
    }

    /// Loest die Paarung eines Handles auf und gibt den Partner zurueck
    ///
    /// Entfernt beide Seiten. Gibt `None` zurueck wenn das Handle nicht
    /// gekoppelt war (idempotent).
    pub fn entkoppeln(&self, verbindung: &ConnectionId) -> Option<ConnectionId> {
        let (_, seite) = self.inner.remove(verbindung)?;
        self.inner.remove(&seite.partner);
        tracing::debug!(verbindung = %verbindung, partner = %seite.partner, "Paarung aufgeloest");
        Some(seite.partner)
    }

    /// Gibt die Anzahl aktiver Paarungen zurueck
    pub fn paar_anzahl(&self) -> usize {
        self.inner.len() / 2
    }
}

impl Default for PairingTable {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn koppeln_und_partner_aufloesen() {
        let paarungen = PairingTable::neu();
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        assert!(paarungen.koppeln(a, b, PaarungsArt::Vermittlung));
        assert_eq!(paarungen.partner_von(&a), Some(b));
        assert_eq!(paarungen.partner_von(&b), Some(a));
        assert!(paarungen.ist_initiator(&a));
        assert!(!paarungen.ist_initiator(&b));
        assert_eq!(paarungen.art_von(&a), Some(PaarungsArt::Vermittlung));
        assert_eq!(paarungen.art_von(&b), Some(PaarungsArt::Vermittlung));
        assert_eq!(paarungen.paar_anzahl(), 1);
    }

    #[test]
    fn hoechstens_eine_paarung_pro_handle() {
        let paarungen = PairingTable::neu();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let c = ConnectionId::new();

        assert!(paarungen.koppeln(a, b, PaarungsArt::Vermittlung));
        assert!(!paarungen.koppeln(a, c, PaarungsArt::Direktanruf), "a ist bereits gekoppelt");
        assert!(!paarungen.koppeln(c, b, PaarungsArt::Vermittlung), "b ist bereits gekoppelt");
        assert_eq!(paarungen.partner_von(&a), Some(b));
    }

    #[test]
    fn selbst_kopplung_ist_verboten() {
        let paarungen = PairingTable::neu();
        let a = ConnectionId::new();
        assert!(!paarungen.koppeln(a, a, PaarungsArt::Vermittlung));
        assert!(!paarungen.ist_gekoppelt(&a));
    }

    #[test]
    fn entkoppeln_entfernt_beide_seiten() {
        let paarungen = PairingTable::neu();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        paarungen.koppeln(a, b, PaarungsArt::Vermittlung);

        assert_eq!(paarungen.entkoppeln(&a), Some(b));
        assert!(!paarungen.ist_gekoppelt(&a));
        assert!(!paarungen.ist_gekoppelt(&b));
        assert_eq!(paarungen.paar_anzahl(), 0);
    }

    #[test]
    fn entkoppeln_ist_idempotent() {
        let paarungen = PairingTable::neu();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        paarungen.koppeln(a, b, PaarungsArt::Vermittlung);

        assert_eq!(paarungen.entkoppeln(&b), Some(a));
        assert_eq!(paarungen.entkoppeln(&b), None);
        assert_eq!(paarungen.entkoppeln(&a), None);
    }

    #[test]
    fn nach_entkopplung_wieder_koppelbar() {
        let paarungen = PairingTable::neu();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let c = ConnectionId::new();

        paarungen.koppeln(a, b, PaarungsArt::Vermittlung);
        paarungen.entkoppeln(&a);

        assert!(paarungen.koppeln(a, c, PaarungsArt::Direktanruf));
        assert_eq!(paarungen.partner_von(&a), Some(c));
    }
}
