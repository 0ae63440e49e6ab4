//! Call-Handler – Registrierung und direkt adressierte Anrufe
//!
//! Das Relay ist hier im Kern zustandslos: Ziel-Identitaet via Registry
//! aufloesen, Event zustellen, fertig. Einzig `call-user` legt zusaetzlich
//! eine Paarung an, damit beim Disconnect einer Seite der Partner
//! benachrichtigt werden kann und Relay-Events ohne Zielangabe
//! (`webrtc-offer`/`webrtc-answer`) ein implizites Ziel haben.
//!
//! ## Fehlerverhalten
//! Nur `call-user` an eine unbekannte Identitaet meldet dem Absender einen
//! `call-error`; `accept-call`, `ice-candidate` und `end-call` an ein
//! verschwundenes Ziel werden stillschweigend verworfen (das Ziel ist
//! bereits weg, ein Fehler hilft niemandem).

use anruf_protocol::signal::{
    AcceptCallRequest, CallUserRequest, EndCallRequest, IceCandidate, RegisterRequest,
};
use anruf_protocol::SignalEvent;
use std::sync::Arc;

use crate::dispatcher::DispatcherContext;
use crate::pairing::PaarungsArt;
use crate::server_state::SignalingState;

/// Verarbeitet `register`: verknuepft die Identitaet mit dieser Verbindung
///
/// Keine Bestaetigung an den Client – der Eintrag gilt sofort.
pub fn handle_register(
    req: RegisterRequest,
    ctx: &mut DispatcherContext,
    state: &Arc<SignalingState>,
) -> Option<SignalEvent> {
    state
        .registry
        .registrieren(req.identity.clone(), ctx.verbindung);
    ctx.identitaet = Some(req.identity);
    None
}

/// Verarbeitet `call-user`: stellt das Offer als `incoming-call` zu
///
/// Unbekanntes Ziel ⇒ `call-error` nur an den Absender. Der Absender muss
/// selbst registriert sein, sonst fehlt dem Ziel das `from`-Feld.
pub fn handle_call_user(
    req: CallUserRequest,
    ctx: &DispatcherContext,
    state: &Arc<SignalingState>,
) -> Option<SignalEvent> {
    let Some(absender) = ctx.identitaet.clone() else {
        tracing::debug!(verbindung = %ctx.verbindung, "call-user ohne Registrierung");
        return Some(SignalEvent::call_error(
            "Nicht registriert – zuerst 'register' senden",
        ));
    };

    let Some(ziel) = state.registry.aufloesen(&req.to) else {
        tracing::debug!(verbindung = %ctx.verbindung, ziel = %req.to, "Anrufziel nicht gefunden");
        return Some(SignalEvent::call_error(format!(
            "Benutzer nicht gefunden: {}",
            req.to
        )));
    };

    // Paarung fuer Disconnect-Benachrichtigung und implizites Relay. Ist
    // eine Seite schon gekoppelt, bleibt die Zustellung trotzdem
    // best-effort – das Relay lehnt keine Offers ab.
    if state
        .pairings
        .koppeln(ctx.verbindung, ziel, PaarungsArt::Direktanruf)
    {
        // Gekoppelte Handles duerfen nicht in der Schlange stehen – wer
        // waehrend einer Zufalls-Suche direkt angerufen wird, verlaesst sie
        state.queue.entfernen(&ctx.verbindung);
        state.queue.entfernen(&ziel);
    }

    tracing::info!(von = %absender, zu = %req.to, "Anruf wird zugestellt");
    state
        .broadcaster
        .an_verbindung_senden(&ziel, SignalEvent::incoming_call(absender, req.offer));
    None
}

/// Verarbeitet `accept-call`: stellt die Answer als `call-accepted` zu
pub fn handle_accept_call(
    req: AcceptCallRequest,
    ctx: &DispatcherContext,
    state: &Arc<SignalingState>,
) -> Option<SignalEvent> {
    match state.registry.aufloesen(&req.to) {
        Some(ziel) => {
            tracing::info!(verbindung = %ctx.verbindung, zu = %req.to, "Anruf angenommen");
            state
                .broadcaster
                .an_verbindung_senden(&ziel, SignalEvent::call_accepted(req.answer));
        }
        None => {
            // Anrufer bereits weg – best-effort, kein Fehlerpfad
            tracing::debug!(zu = %req.to, "accept-call an verschwundenes Ziel verworfen");
        }
    }
    None
}

/// Verarbeitet `ice-candidate`: relayed den Kandidaten an das Ziel
pub fn handle_ice_candidate(
    req: IceCandidate,
    ctx: &DispatcherContext,
    state: &Arc<SignalingState>,
) -> Option<SignalEvent> {
    let Some(ref ziel_identitaet) = req.to else {
        tracing::debug!(verbindung = %ctx.verbindung, "ice-candidate ohne Ziel verworfen");
        return None;
    };

    match state.registry.aufloesen(ziel_identitaet) {
        Some(ziel) => {
            state.broadcaster.an_verbindung_senden(
                &ziel,
                SignalEvent::ice_candidate_zustellung(req.candidate),
            );
        }
        None => {
            tracing::debug!(zu = %ziel_identitaet, "ice-candidate an verschwundenes Ziel verworfen");
        }
    }
    None
}

/// Verarbeitet `end-call`: benachrichtigt das Ziel und loest die Paarung
pub fn handle_end_call(
    req: EndCallRequest,
    ctx: &DispatcherContext,
    state: &Arc<SignalingState>,
) -> Option<SignalEvent> {
    state.pairings.entkoppeln(&ctx.verbindung);

    match state.registry.aufloesen(&req.to) {
        Some(ziel) => {
            tracing::info!(verbindung = %ctx.verbindung, zu = %req.to, "Anruf beendet");
            state
                .broadcaster
                .an_verbindung_senden(&ziel, SignalEvent::CallEnded);
        }
        None => {
            tracing::debug!(zu = %req.to, "end-call an verschwundenes Ziel verworfen");
        }
    }
    None
}

/// Relayed `webrtc-offer`/`webrtc-answer` an den aktuellen Partner
///
/// Das Ziel ist implizit die Gegenseite der aktiven Paarung. Ohne Paarung
/// ist das Event veraltet (Partner weg, Anruf beendet) und wird verworfen.
pub fn handle_partner_relay(
    event: SignalEvent,
    ctx: &DispatcherContext,
    state: &Arc<SignalingState>,
) -> Option<SignalEvent> {
    match state.pairings.partner_von(&ctx.verbindung) {
        Some(partner) => {
            state.broadcaster.an_verbindung_senden(&partner, event);
        }
        None => {
            tracing::debug!(
                verbindung = %ctx.verbindung,
                event = event.name(),
                "Relay ohne aktive Paarung – verworfen"
            );
        }
    }
    None
}
