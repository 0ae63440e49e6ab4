//! Match-Handler – Zufalls-Matchmaking
//!
//! `find-random` reiht die Verbindung in die FIFO-Warteschlange ein; nach
//! jeder Einreihung laeuft der Match-Schritt und koppelt so lange Paare,
//! wie die Schlange mindestens zwei lebende Eintraege hat.
//!
//! ## not-ready Politik
//! Meldet ein Client nach `match-found` dass seine WebRTC-Voraussetzungen
//! fehlen, wird die Paarung aufgeloest: der Partner war bereit und kommt
//! vorne in die Schlange zurueck (bevorzugte Wieder-Vermittlung), der
//! Ablehnende faellt auf idle zurueck und muss erneut `find-random`
//! senden – ein sofortiger neuer Versuch wuerde nur das naechste
//! fehlgeschlagene Match produzieren.

use anruf_protocol::SignalEvent;
use std::sync::Arc;

use crate::dispatcher::DispatcherContext;
use crate::pairing::PaarungsArt;
use crate::server_state::SignalingState;

/// Verarbeitet `find-random`: einreihen und Match-Schritt anstossen
///
/// No-op (geloggt) wenn die Verbindung bereits wartet oder gekoppelt ist.
pub fn handle_find_random(
    ctx: &DispatcherContext,
    state: &Arc<SignalingState>,
) -> Option<SignalEvent> {
    if state.pairings.ist_gekoppelt(&ctx.verbindung) {
        tracing::debug!(
            verbindung = %ctx.verbindung,
            "find-random waehrend aktiver Paarung – ignoriert"
        );
        return None;
    }

    if !state.queue.einreihen(ctx.verbindung) {
        // bereits wartend, geloggter No-op in der Queue
        return None;
    }

    match_schritt(state);
    Some(SignalEvent::WaitingForMatch)
}

/// Verarbeitet `cancel-search`: nimmt die Verbindung aus der Schlange
///
/// Idempotent – ein Cancel ohne laufende Suche ist ein No-op.
pub fn handle_cancel_search(
    ctx: &DispatcherContext,
    state: &Arc<SignalingState>,
) -> Option<SignalEvent> {
    if state.queue.entfernen(&ctx.verbindung) {
        tracing::info!(verbindung = %ctx.verbindung, "Suche abgebrochen");
    } else {
        tracing::debug!(verbindung = %ctx.verbindung, "cancel-search ohne laufende Suche");
    }
    None
}

/// Verarbeitet `not-ready`: Match-Ablehnung nach `match-found`
///
/// Gilt nur fuer vermittelte Paarungen. Waehrend eines Direktanrufs wird
/// das Event verworfen – der Anrufer hat nie `find-random` gesendet und
/// gehoert nicht in die Schlange.
pub fn handle_not_ready(
    ctx: &DispatcherContext,
    state: &Arc<SignalingState>,
) -> Option<SignalEvent> {
    match state.pairings.art_von(&ctx.verbindung) {
        Some(PaarungsArt::Vermittlung) => {}
        Some(PaarungsArt::Direktanruf) => {
            tracing::debug!(
                verbindung = %ctx.verbindung,
                "not-ready waehrend Direktanruf – verworfen"
            );
            return None;
        }
        None => {
            tracing::debug!(verbindung = %ctx.verbindung, "not-ready ohne aktive Paarung – ignoriert");
            return None;
        }
    }

    let Some(partner) = state.pairings.entkoppeln(&ctx.verbindung) else {
        return None;
    };

    tracing::info!(
        verbindung = %ctx.verbindung,
        partner = %partner,
        "Match abgelehnt – Partner wird neu vermittelt"
    );

    if state.broadcaster.ist_erreichbar(&partner) {
        state.queue.vorne_einreihen(partner);
        state
            .broadcaster
            .an_verbindung_senden(&partner, SignalEvent::WaitingForMatch);
        match_schritt(state);
    }
    None
}

/// Koppelt so lange Paare wie die Schlange zwei lebende Eintraege hergibt
///
/// Der zuerst gezogene (am laengsten wartende) wird Initiator. Jede Seite
/// erfaehrt nur das Verbindungs-Handle des Partners.
pub(crate) fn match_schritt(state: &Arc<SignalingState>) {
    while let Some((initiator, responder)) = state
        .queue
        .naechstes_paar(|v| state.broadcaster.ist_erreichbar(v))
    {
        if !state
            .pairings
            .koppeln(initiator, responder, PaarungsArt::Vermittlung)
        {
            // Gekoppelte duerfen nicht in der Schlange stehen; den stalen
            // Eintrag verwerfen, die freie Seite behaelt ihre Prioritaet
            tracing::warn!(
                initiator = %initiator,
                responder = %responder,
                "Match-Schritt traf bereits gekoppelte Verbindung"
            );
            if !state.pairings.ist_gekoppelt(&responder) {
                state.queue.vorne_einreihen(responder);
            }
            if !state.pairings.ist_gekoppelt(&initiator) {
                state.queue.vorne_einreihen(initiator);
            }
            continue;
        }

        state
            .broadcaster
            .an_verbindung_senden(&initiator, SignalEvent::match_found(responder, true));
        state
            .broadcaster
            .an_verbindung_senden(&responder, SignalEvent::match_found(initiator, false));
    }
}
