//! Session-Handler – Connect, Heartbeat und die Disconnect-Kaskade
//!
//! Ein Reconnect ist keine Session-Wiederaufnahme: die Verbindung bekommt
//! ein frisches Handle und muss sich neu registrieren bzw. neu suchen.

use anruf_core::types::ConnectionId;
use anruf_protocol::signal::ConnectInfo;
use anruf_protocol::SignalEvent;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::dispatcher::DispatcherContext;
use crate::server_state::SignalingState;

/// Registriert eine frisch akzeptierte Verbindung
///
/// Legt die Send-Queue an, vermerkt die Verbindung im Presence-Manager,
/// stellt `connect-info` zu und broadcastet den neuen Online-Zaehler.
/// Gibt die Empfangs-Queue zurueck, aus der die `ClientConnection` liest.
pub fn handle_connect(
    state: &Arc<SignalingState>,
    verbindung: ConnectionId,
) -> mpsc::Receiver<SignalEvent> {
    let rx = state.broadcaster.client_registrieren(verbindung);
    state.presence.client_verbunden(verbindung);

    state.broadcaster.an_verbindung_senden(
        &verbindung,
        SignalEvent::ConnectInfo(ConnectInfo {
            user_id: verbindung,
            online_count: state.presence.online_anzahl(),
            server_time: chrono::Utc::now().timestamp_millis(),
        }),
    );
    online_count_broadcast(state);

    rx
}

/// Verarbeitet `heartbeat`: Buchhaltung aktualisieren, `heartbeat-ack`
pub fn handle_heartbeat(
    ctx: &DispatcherContext,
    state: &Arc<SignalingState>,
) -> Option<SignalEvent> {
    state.presence.heartbeat(&ctx.verbindung);
    Some(SignalEvent::HeartbeatAck)
}

/// Disconnect-Kaskade (explizit, Fehler oder Heartbeat-Timeout)
///
/// Reihenfolge: Registry-Eintraege, Warteschlange, Paarung (Partner
/// bekommt genau ein `call-ended` und bleibt idle – keine automatische
/// Wieder-Einreihung), Presence, Send-Queue, Online-Zaehler-Broadcast.
pub fn handle_disconnect(ctx: &DispatcherContext, state: &Arc<SignalingState>) {
    let verbindung = ctx.verbindung;

    state.registry.verbindung_entfernen(&verbindung);
    state.queue.entfernen(&verbindung);

    if let Some(partner) = state.pairings.entkoppeln(&verbindung) {
        state
            .broadcaster
            .an_verbindung_senden(&partner, SignalEvent::CallEnded);
    }

    state.presence.client_getrennt(&verbindung);
    state.broadcaster.client_entfernen(&verbindung);
    online_count_broadcast(state);

    tracing::info!(
        verbindung = %verbindung,
        identitaet = ctx.identitaet.as_ref().map(|i| i.as_str()).unwrap_or("-"),
        "Session aufgeraeumt"
    );
}

/// Broadcastet den aktuellen Online-Zaehler an alle Verbindungen
fn online_count_broadcast(state: &Arc<SignalingState>) {
    state
        .broadcaster
        .an_alle_senden(SignalEvent::online_count(state.presence.online_anzahl()));
}
