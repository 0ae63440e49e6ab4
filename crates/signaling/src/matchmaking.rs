//! Matchmaking-Queue – FIFO-Warteschlange fuer Zufalls-Anrufe
//!
//! Anonyme Clients reihen sich per `find-random` ein und werden paarweise
//! in Einreihungs-Reihenfolge gekoppelt: die am laengsten wartende lebende
//! Verbindung wird Initiator, die zweitlaengste Responder.
//!
//! Die Queue haelt nur den "waiting"-Teil der Zustandsmaschine; "paired"
//! lebt in der `PairingTable`, die Uebergaenge orchestrieren die Handler.
//! Tote Eintraege (Verbindung beim Pop nicht mehr erreichbar) werden
//! verworfen und nicht wieder eingereiht – die Queue heilt sich selbst.
//!
//! Schlange und Mitglieds-Index stehen hinter einem gemeinsamen Mutex,
//! damit der Match-Schritt als ganzes atomar ist und die FIFO-Paarungs-
//! Invariante auch bei nebenlaeufigen Enqueues erhalten bleibt.

use anruf_core::types::ConnectionId;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;

/// Ein wartender Client mit Einreihungs-Zeitpunkt
#[derive(Debug, Clone, Copy)]
struct WarteEintrag {
    verbindung: ConnectionId,
    seit: Instant,
}

struct Inner {
    /// FIFO-Schlange, vorne wartet der aelteste Eintrag
    schlange: VecDeque<WarteEintrag>,
    /// Mitglieds-Index – kein Handle darf zweimal in der Schlange stehen
    wartend: HashSet<ConnectionId>,
}

/// FIFO-Warteschlange fuer Zufalls-Paarungen
///
/// Thread-safe via Arc + Mutex. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct MatchmakingQueue {
    inner: Arc<Mutex<Inner>>,
}

impl MatchmakingQueue {
    /// Erstellt eine neue, leere Warteschlange
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                schlange: VecDeque::new(),
                wartend: HashSet::new(),
            })),
        }
    }

    /// Reiht eine Verbindung hinten ein
    ///
    /// Gibt `false` zurueck wenn das Handle bereits wartet (kein
    /// Doppel-Eintrag, geloggter No-op).
    pub fn einreihen(&self, verbindung: ConnectionId) -> bool {
        let mut inner = self.inner.lock();
        if !inner.wartend.insert(verbindung) {
            tracing::debug!(verbindung = %verbindung, "Bereits in der Warteschlange");
            return false;
        }
        inner.schlange.push_back(WarteEintrag {
            verbindung,
            seit: Instant::now(),
        });
        tracing::debug!(
            verbindung = %verbindung,
            wartende = inner.schlange.len(),
            "In Warteschlange eingereiht"
        );
        true
    }

    /// Reiht eine Verbindung vorne ein (bevorzugte Wieder-Vermittlung)
    ///
    /// Wird fuer den Partner eines `not-ready`-Clients verwendet: er war
    /// schon dran und soll beim naechsten Match-Schritt zuerst gezogen
    /// werden.
    pub fn vorne_einreihen(&self, verbindung: ConnectionId) -> bool {
        let mut inner = self.inner.lock();
        if !inner.wartend.insert(verbindung) {
            return false;
        }
        inner.schlange.push_front(WarteEintrag {
            verbindung,
            seit: Instant::now(),
        });
        tracing::debug!(verbindung = %verbindung, "Vorne in Warteschlange eingereiht");
        true
    }

    /// Entfernt eine Verbindung aus der Warteschlange
    ///
    /// Gibt `false` zurueck wenn das Handle nicht wartete (idempotent,
    /// deckt Cancel und Disconnect ab).
    pub fn entfernen(&self, verbindung: &ConnectionId) -> bool {
        let mut inner = self.inner.lock();
        if !inner.wartend.remove(verbindung) {
            return false;
        }
        inner
            .schlange
            .retain(|eintrag| eintrag.verbindung != *verbindung);
        tracing::debug!(verbindung = %verbindung, "Aus Warteschlange entfernt");
        true
    }

    /// Prueft ob ein Handle gerade wartet
    pub fn ist_wartend(&self, verbindung: &ConnectionId) -> bool {
        self.inner.lock().wartend.contains(verbindung)
    }

    /// Gibt die Anzahl wartender Verbindungen zurueck
    pub fn wartende_anzahl(&self) -> usize {
        self.inner.lock().schlange.len()
    }

    /// Zieht das naechste Paar aus der Schlange (Initiator, Responder)
    ///
    /// Nimmt die zwei am laengsten wartenden Eintraege deren Verbindung
    /// laut `ist_live` noch lebt; tote Eintraege werden verworfen. Findet
    /// sich kein zweiter lebender Eintrag, wandert der erste zurueck an
    /// den Kopf der Schlange und es gibt kein Paar.
    pub fn naechstes_paar(
        &self,
        ist_live: impl Fn(&ConnectionId) -> bool,
    ) -> Option<(ConnectionId, ConnectionId)> {
        let mut inner = self.inner.lock();

        let mut erster: Option<WarteEintrag> = None;
        let zweiter = loop {
            let Some(eintrag) = inner.schlange.pop_front() else {
                break None;
            };
            if !ist_live(&eintrag.verbindung) {
                inner.wartend.remove(&eintrag.verbindung);
                tracing::debug!(
                    verbindung = %eintrag.verbindung,
                    "Toter Warteschlangen-Eintrag verworfen"
                );
                continue;
            }
            match erster {
                None => erster = Some(eintrag),
                Some(_) => break Some(eintrag),
            }
        };

        match (erster, zweiter) {
            (Some(a), Some(b)) => {
                inner.wartend.remove(&a.verbindung);
                inner.wartend.remove(&b.verbindung);
                tracing::info!(
                    initiator = %a.verbindung,
                    responder = %b.verbindung,
                    gewartet_ms = a.seit.elapsed().as_millis() as u64,
                    "Zufalls-Paar gefunden"
                );
                Some((a.verbindung, b.verbindung))
            }
            (Some(a), None) => {
                // Der einzige Lebende behaelt seine Prioritaet
                inner.schlange.push_front(a);
                None
            }
            _ => None,
        }
    }
}

impl Default for MatchmakingQueue {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
