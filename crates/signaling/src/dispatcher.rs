//! Message-Dispatcher – Routet Signal-Events an die richtigen Handler
//!
//! Der Dispatcher ist die eine Stelle an der alle eingehenden Events
//! einer Verbindung verarbeitet werden: ein `match` ueber das Tagged
//! Enum, pro Event-Art ein Handler. Jedes Event wird als atomarer
//! Schritt verarbeitet; Events derselben Verbindung in Empfangs-
//! Reihenfolge. Die optionale Rueckgabe ist die direkte Antwort an den
//! Absender (z.B. `heartbeat-ack` oder `call-error`); alles andere
//! laeuft ueber den Broadcaster.

use anruf_core::types::{ConnectionId, Identity};
use anruf_protocol::SignalEvent;
use std::sync::Arc;

use crate::handlers::{call_handler, match_handler, session_handler};
use crate::server_state::SignalingState;

/// Dispatcher-Kontext – Informationen ueber die aktuelle Verbindung
#[derive(Debug, Clone)]
pub struct DispatcherContext {
    /// Server-vergebenes Verbindungs-Handle
    pub verbindung: ConnectionId,
    /// Registrierte Identitaet (None solange kein `register` kam)
    pub identitaet: Option<Identity>,
}

impl DispatcherContext {
    /// Erstellt einen Kontext fuer eine frische Verbindung
    pub fn neu(verbindung: ConnectionId) -> Self {
        Self {
            verbindung,
            identitaet: None,
        }
    }
}

/// Zentraler Message-Dispatcher
pub struct MessageDispatcher {
    state: Arc<SignalingState>,
}

impl MessageDispatcher {
    /// Erstellt einen neuen Dispatcher
    pub fn neu(state: Arc<SignalingState>) -> Self {
        Self { state }
    }

    /// Verarbeitet ein eingehendes Event und gibt die direkte Antwort zurueck
    ///
    /// Gibt `None` zurueck wenn keine direkte Antwort an den Absender
    /// geht (die meisten Events sind fire-and-forget Richtung Ziel).
    pub async fn dispatch(
        &self,
        event: SignalEvent,
        ctx: &mut DispatcherContext,
    ) -> Option<SignalEvent> {
        tracing::trace!(
            verbindung = %ctx.verbindung,
            event = event.name(),
            "Event empfangen"
        );

        match event {
            // Direktanruf
            SignalEvent::Register(req) => call_handler::handle_register(req, ctx, &self.state),
            SignalEvent::CallUser(req) => call_handler::handle_call_user(req, ctx, &self.state),
            SignalEvent::AcceptCall(req) => {
                call_handler::handle_accept_call(req, ctx, &self.state)
            }
            SignalEvent::IceCandidate(req) => {
                call_handler::handle_ice_candidate(req, ctx, &self.state)
            }
            SignalEvent::EndCall(req) => call_handler::handle_end_call(req, ctx, &self.state),

            // Relay mit implizitem Ziel (aktueller Partner)
            relay @ (SignalEvent::WebrtcOffer(_) | SignalEvent::WebrtcAnswer(_)) => {
                call_handler::handle_partner_relay(relay, ctx, &self.state)
            }

            // Matchmaking
            SignalEvent::FindRandom => match_handler::handle_find_random(ctx, &self.state),
            SignalEvent::CancelSearch => match_handler::handle_cancel_search(ctx, &self.state),
            SignalEvent::NotReady => match_handler::handle_not_ready(ctx, &self.state),

            // Keepalive
            SignalEvent::Heartbeat => session_handler::handle_heartbeat(ctx, &self.state),

            // Server->Client-Events haben auf dem Hinweg nichts verloren
            andere => {
                tracing::warn!(
                    verbindung = %ctx.verbindung,
                    event = andere.name(),
                    "Server-Event vom Client empfangen – ignoriert"
                );
                None
            }
        }
    }

    /// Raeumt eine getrennte Verbindung vollstaendig auf
    ///
    /// Wird von der `ClientConnection` nach dem Ende der Leseschleife
    /// aufgerufen – egal ob explizite Trennung, Fehler oder Timeout.
    pub fn verbindung_getrennt(&self, ctx: &DispatcherContext) {
        session_handler::handle_disconnect(ctx, &self.state);
    }
}

// ---------------------------------------------------------------------------
// Tests – decken die beobachtbaren Relay-Eigenschaften ab
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server_state::SignalingConfig;
    use crate::pairing::PaarungsArt;
    use anruf_protocol::signal::{
        AcceptCallRequest, CallUserRequest, EndCallRequest, IceCandidate, MatchFound,
        RegisterRequest,
    };
    use serde_json::json;
    use tokio::sync::mpsc;

    fn test_state() -> Arc<SignalingState> {
        SignalingState::neu(SignalingConfig::default())
    }

    /// Simuliert einen Connect: Send-Queue + Presence + Kontext
    fn verbinden(
        state: &Arc<SignalingState>,
    ) -> (DispatcherContext, mpsc::Receiver<SignalEvent>) {
        let verbindung = ConnectionId::new();
        let rx = session_handler::handle_connect(state, verbindung);
        (DispatcherContext::neu(verbindung), rx)
    }

    /// Verwirft alles was bisher in der Queue liegt (connect-info etc.)
    fn leeren(rx: &mut mpsc::Receiver<SignalEvent>) {
        while rx.try_recv().is_ok() {}
    }

    /// Zieht alle `match-found`-Events aus der Queue
    ///
    /// Broadcasts wie `online-count` landen zwischendurch in jeder Queue
    /// und werden hier uebersprungen.
    fn match_found_events(rx: &mut mpsc::Receiver<SignalEvent>) -> Vec<MatchFound> {
        let mut gefunden = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let SignalEvent::MatchFound(mf) = event {
                gefunden.push(mf);
            }
        }
        gefunden
    }

    fn register(identity: &str) -> SignalEvent {
        SignalEvent::Register(RegisterRequest {
            identity: identity.into(),
        })
    }

    #[tokio::test]
    async fn direktanruf_voller_ablauf() {
        let state = test_state();
        let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
        let (mut alice, mut alice_rx) = verbinden(&state);
        let (mut bob, mut bob_rx) = verbinden(&state);

        dispatcher.dispatch(register("alice"), &mut alice).await;
        dispatcher.dispatch(register("bob"), &mut bob).await;
        leeren(&mut alice_rx);
        leeren(&mut bob_rx);

        // alice ruft bob an
        let offer = json!({"type": "offer", "sdp": "v=0 alice"});
        let antwort = dispatcher
            .dispatch(
                SignalEvent::CallUser(CallUserRequest {
                    to: "bob".into(),
                    offer: offer.clone(),
                }),
                &mut alice,
            )
            .await;
        assert!(antwort.is_none());

        match bob_rx.try_recv().expect("bob muss incoming-call bekommen") {
            SignalEvent::IncomingCall(ic) => {
                assert_eq!(ic.from, "alice".into());
                assert_eq!(ic.offer, offer);
            }
            andere => panic!("Falsches Event: {}", andere.name()),
        }

        // bob nimmt an
        let answer = json!({"type": "answer", "sdp": "v=0 bob"});
        dispatcher
            .dispatch(
                SignalEvent::AcceptCall(AcceptCallRequest {
                    to: "alice".into(),
                    answer: answer.clone(),
                }),
                &mut bob,
            )
            .await;

        match alice_rx.try_recv().expect("alice muss call-accepted bekommen") {
            SignalEvent::CallAccepted(ca) => assert_eq!(ca.answer, answer),
            andere => panic!("Falsches Event: {}", andere.name()),
        }

        // alice legt auf
        dispatcher
            .dispatch(
                SignalEvent::EndCall(EndCallRequest { to: "bob".into() }),
                &mut alice,
            )
            .await;

        assert_eq!(
            bob_rx.try_recv().expect("bob muss call-ended bekommen").name(),
            "call-ended"
        );
        assert!(alice_rx.try_recv().is_err(), "alice bekommt nichts weiter");
        assert!(!state.pairings.ist_gekoppelt(&alice.verbindung));
    }

    #[tokio::test]
    async fn anruf_an_unbekannte_identitaet_meldet_fehler_nur_dem_absender() {
        let state = test_state();
        let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
        let (mut alice, mut alice_rx) = verbinden(&state);
        let (mut bob, mut bob_rx) = verbinden(&state);
        dispatcher.dispatch(register("alice"), &mut alice).await;
        dispatcher.dispatch(register("bob"), &mut bob).await;
        leeren(&mut alice_rx);
        leeren(&mut bob_rx);

        let antwort = dispatcher
            .dispatch(
                SignalEvent::CallUser(CallUserRequest {
                    to: "niemand".into(),
                    offer: json!({}),
                }),
                &mut alice,
            )
            .await;

        match antwort {
            Some(SignalEvent::CallError(e)) => assert!(e.message.contains("niemand")),
            andere => panic!("call-error erwartet, war: {andere:?}"),
        }
        assert!(alice_rx.try_recv().is_err(), "Fehler geht nur als direkte Antwort");
        assert!(bob_rx.try_recv().is_err(), "Niemand sonst bekommt etwas");
    }

    #[tokio::test]
    async fn call_user_ohne_registrierung_meldet_fehler() {
        let state = test_state();
        let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
        let (mut anon, _anon_rx) = verbinden(&state);
        let (mut bob, mut bob_rx) = verbinden(&state);
        dispatcher.dispatch(register("bob"), &mut bob).await;
        leeren(&mut bob_rx);

        let antwort = dispatcher
            .dispatch(
                SignalEvent::CallUser(CallUserRequest {
                    to: "bob".into(),
                    offer: json!({}),
                }),
                &mut anon,
            )
            .await;

        assert!(matches!(antwort, Some(SignalEvent::CallError(_))));
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn heartbeat_wird_bestaetigt() {
        let state = test_state();
        let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
        let (mut ctx, _rx) = verbinden(&state);

        let antwort = dispatcher.dispatch(SignalEvent::Heartbeat, &mut ctx).await;
        assert!(matches!(antwort, Some(SignalEvent::HeartbeatAck)));
    }

    #[tokio::test]
    async fn matchmaking_paart_in_fifo_reihenfolge() {
        let state = test_state();
        let dispatcher = MessageDispatcher::neu(Arc::clone(&state));

        let mut clients = Vec::new();
        for _ in 0..4 {
            let (ctx, mut rx) = verbinden(&state);
            leeren(&mut rx);
            clients.push((ctx, rx));
        }

        // find-random in Reihenfolge T1 < T2 < T3 < T4
        for (ctx, _) in clients.iter_mut() {
            let antwort = dispatcher.dispatch(SignalEvent::FindRandom, ctx).await;
            assert!(matches!(antwort, Some(SignalEvent::WaitingForMatch)));
        }

        let ids: Vec<ConnectionId> = clients.iter().map(|(ctx, _)| ctx.verbindung).collect();
        let mut gefunden = Vec::new();
        for (_, rx) in clients.iter_mut() {
            let mut matches = match_found_events(rx);
            assert_eq!(matches.len(), 1, "genau ein match-found pro Client");
            gefunden.push(matches.remove(0));
        }

        // Erstes Paar: (C1 Initiator, C2 Responder), zweites: (C3, C4)
        assert_eq!(gefunden[0].partner_id, ids[1]);
        assert!(gefunden[0].initiator);
        assert_eq!(gefunden[1].partner_id, ids[0]);
        assert!(!gefunden[1].initiator);
        assert_eq!(gefunden[2].partner_id, ids[3]);
        assert!(gefunden[2].initiator);
        assert_eq!(gefunden[3].partner_id, ids[2]);
        assert!(!gefunden[3].initiator);

        assert_eq!(state.pairings.paar_anzahl(), 2);
        assert_eq!(state.queue.wartende_anzahl(), 0);
    }

    #[tokio::test]
    async fn doppeltes_find_random_reiht_nicht_doppelt_ein() {
        let state = test_state();
        let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
        let (mut ctx, mut rx) = verbinden(&state);
        leeren(&mut rx);

        assert!(dispatcher
            .dispatch(SignalEvent::FindRandom, &mut ctx)
            .await
            .is_some());
        assert!(dispatcher
            .dispatch(SignalEvent::FindRandom, &mut ctx)
            .await
            .is_none());
        assert_eq!(state.queue.wartende_anzahl(), 1);
    }

    #[tokio::test]
    async fn getrennter_wartender_wird_nie_gematcht() {
        let state = test_state();
        let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
        let (mut c1, mut rx1) = verbinden(&state);
        leeren(&mut rx1);

        dispatcher.dispatch(SignalEvent::FindRandom, &mut c1).await;
        dispatcher.verbindung_getrennt(&c1);
        drop(rx1);

        let (mut c2, mut rx2) = verbinden(&state);
        let (mut c3, mut rx3) = verbinden(&state);
        leeren(&mut rx2);
        leeren(&mut rx3);
        dispatcher.dispatch(SignalEvent::FindRandom, &mut c2).await;
        dispatcher.dispatch(SignalEvent::FindRandom, &mut c3).await;

        // c2 und c3 finden einander, nicht den Getrennten
        match rx2.try_recv().expect("c2 muss match-found bekommen") {
            SignalEvent::MatchFound(mf) => {
                assert_eq!(mf.partner_id, c3.verbindung);
                assert!(mf.initiator);
            }
            andere => panic!("Falsches Event: {}", andere.name()),
        }
        match rx3.try_recv().expect("c3 muss match-found bekommen") {
            SignalEvent::MatchFound(mf) => assert_eq!(mf.partner_id, c2.verbindung),
            andere => panic!("Falsches Event: {}", andere.name()),
        }
    }

    #[tokio::test]
    async fn trennung_beendet_anruf_und_gibt_identitaet_frei() {
        let state = test_state();
        let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
        let (mut alice, mut alice_rx) = verbinden(&state);
        let (mut bob, mut bob_rx) = verbinden(&state);
        dispatcher.dispatch(register("alice"), &mut alice).await;
        dispatcher.dispatch(register("bob"), &mut bob).await;
        leeren(&mut alice_rx);
        leeren(&mut bob_rx);

        dispatcher
            .dispatch(
                SignalEvent::CallUser(CallUserRequest {
                    to: "bob".into(),
                    offer: json!({}),
                }),
                &mut alice,
            )
            .await;
        leeren(&mut bob_rx);

        // alice faellt weg
        dispatcher.verbindung_getrennt(&alice);
        drop(alice_rx);

        // bob bekommt genau ein call-ended (plus online-count Update)
        let mut call_ended = 0;
        while let Ok(event) = bob_rx.try_recv() {
            if event.name() == "call-ended" {
                call_ended += 1;
            }
        }
        assert_eq!(call_ended, 1);
        assert!(!state.pairings.ist_gekoppelt(&bob.verbindung));

        // "alice" ist frei und sofort neu registrierbar
        assert!(state.registry.aufloesen(&"alice".into()).is_none());
        let (mut alice2, _alice2_rx) = verbinden(&state);
        dispatcher.dispatch(register("alice"), &mut alice2).await;
        assert_eq!(
            state.registry.aufloesen(&"alice".into()),
            Some(alice2.verbindung)
        );
    }

    #[tokio::test]
    async fn doppeltes_cancel_ist_noop() {
        let state = test_state();
        let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
        let (mut ctx, mut rx) = verbinden(&state);
        leeren(&mut rx);

        dispatcher.dispatch(SignalEvent::FindRandom, &mut ctx).await;
        assert!(dispatcher
            .dispatch(SignalEvent::CancelSearch, &mut ctx)
            .await
            .is_none());
        assert!(dispatcher
            .dispatch(SignalEvent::CancelSearch, &mut ctx)
            .await
            .is_none());

        assert_eq!(state.queue.wartende_anzahl(), 0);
        assert!(rx.try_recv().is_err(), "Cancel erzeugt keine Events");
    }

    #[tokio::test]
    async fn not_ready_vermittelt_den_partner_bevorzugt_neu() {
        let state = test_state();
        let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
        let (mut c1, mut rx1) = verbinden(&state);
        let (mut c2, mut rx2) = verbinden(&state);
        leeren(&mut rx1);
        leeren(&mut rx2);

        dispatcher.dispatch(SignalEvent::FindRandom, &mut c1).await;
        dispatcher.dispatch(SignalEvent::FindRandom, &mut c2).await;
        leeren(&mut rx1);
        leeren(&mut rx2);

        // c2 kann doch nicht – c1 zurueck an den Kopf der Schlange
        dispatcher.dispatch(SignalEvent::NotReady, &mut c2).await;

        assert_eq!(
            rx1.try_recv().expect("c1 muss wieder warten").name(),
            "waiting-for-match"
        );
        assert!(state.queue.ist_wartend(&c1.verbindung));
        assert!(!state.queue.ist_wartend(&c2.verbindung), "Ablehnender ist idle");
        assert_eq!(state.pairings.paar_anzahl(), 0);

        // Der Naechste trifft auf den bevorzugten c1
        let (mut c3, mut rx3) = verbinden(&state);
        leeren(&mut rx3);
        leeren(&mut rx1);
        dispatcher.dispatch(SignalEvent::FindRandom, &mut c3).await;

        match rx1.try_recv().expect("c1 muss erneut gematcht werden") {
            SignalEvent::MatchFound(mf) => {
                assert_eq!(mf.partner_id, c3.verbindung);
                assert!(mf.initiator, "c1 wartet laenger und wird Initiator");
            }
            andere => panic!("Falsches Event: {}", andere.name()),
        }
    }

    #[tokio::test]
    async fn webrtc_offer_geht_an_den_aktuellen_partner() {
        let state = test_state();
        let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
        let (mut c1, mut rx1) = verbinden(&state);
        let (mut c2, mut rx2) = verbinden(&state);
        leeren(&mut rx1);
        leeren(&mut rx2);

        dispatcher.dispatch(SignalEvent::FindRandom, &mut c1).await;
        dispatcher.dispatch(SignalEvent::FindRandom, &mut c2).await;
        leeren(&mut rx1);
        leeren(&mut rx2);

        let offer = json!({"type": "offer", "sdp": "v=0 random"});
        dispatcher
            .dispatch(
                SignalEvent::WebrtcOffer(anruf_protocol::signal::WebrtcOffer {
                    offer: offer.clone(),
                }),
                &mut c1,
            )
            .await;

        match rx2.try_recv().expect("Partner muss das Offer bekommen") {
            SignalEvent::WebrtcOffer(wo) => assert_eq!(wo.offer, offer),
            andere => panic!("Falsches Event: {}", andere.name()),
        }
    }

    #[tokio::test]
    async fn verwaistes_webrtc_offer_wird_verworfen() {
        let state = test_state();
        let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
        let (mut ctx, mut rx) = verbinden(&state);
        leeren(&mut rx);

        let antwort = dispatcher
            .dispatch(
                SignalEvent::WebrtcOffer(anruf_protocol::signal::WebrtcOffer {
                    offer: json!({}),
                }),
                &mut ctx,
            )
            .await;

        assert!(antwort.is_none());
        assert!(rx.try_recv().is_err(), "Ohne Paarung wird nichts zugestellt");
    }

    #[tokio::test]
    async fn ice_candidate_an_verschwundenes_ziel_wird_verworfen() {
        let state = test_state();
        let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
        let (mut alice, mut alice_rx) = verbinden(&state);
        dispatcher.dispatch(register("alice"), &mut alice).await;
        leeren(&mut alice_rx);

        let antwort = dispatcher
            .dispatch(
                SignalEvent::IceCandidate(IceCandidate {
                    to: Some("weg".into()),
                    candidate: json!({"sdpMid": "0"}),
                }),
                &mut alice,
            )
            .await;

        assert!(antwort.is_none(), "Kein Fehlerpfad fuer ice-candidate");
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn online_count_folgt_connect_und_disconnect() {
        let state = test_state();
        let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
        let (c1, mut rx1) = verbinden(&state);
        leeren(&mut rx1);

        let (_c2, _rx2) = verbinden(&state);
        match rx1.try_recv().expect("Connect-Broadcast muss ankommen") {
            SignalEvent::OnlineCount(oc) => assert_eq!(oc.count, 2),
            andere => panic!("Falsches Event: {}", andere.name()),
        }

        dispatcher.verbindung_getrennt(&c1);
        assert_eq!(state.presence.online_anzahl(), 1);
    }

    #[tokio::test]
    async fn server_events_vom_client_werden_ignoriert() {
        let state = test_state();
        let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
        let (mut ctx, mut rx) = verbinden(&state);
        leeren(&mut rx);

        let antwort = dispatcher
            .dispatch(SignalEvent::CallEnded, &mut ctx)
            .await;
        assert!(antwort.is_none());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn direktanruf_nimmt_wartende_aus_der_schlange() {
        let state = test_state();
        let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
        let (mut carol, mut carol_rx) = verbinden(&state);
        let (mut dave, mut dave_rx) = verbinden(&state);
        dispatcher.dispatch(register("carol"), &mut carol).await;
        dispatcher.dispatch(register("dave"), &mut dave).await;
        leeren(&mut carol_rx);
        leeren(&mut dave_rx);

        // carol wartet auf ein Zufalls-Match, wird aber direkt angerufen
        dispatcher.dispatch(SignalEvent::FindRandom, &mut carol).await;
        dispatcher
            .dispatch(
                SignalEvent::CallUser(CallUserRequest {
                    to: "carol".into(),
                    offer: json!({}),
                }),
                &mut dave,
            )
            .await;

        assert!(
            !state.queue.ist_wartend(&carol.verbindung),
            "Direkt Angerufene muss die Schlange verlassen"
        );
        assert!(state.pairings.ist_gekoppelt(&carol.verbindung));

        // Der naechste Suchende bleibt wartend statt an der stalen
        // Paarung zu scheitern
        let (mut c3, mut rx3) = verbinden(&state);
        leeren(&mut rx3);
        dispatcher.dispatch(SignalEvent::FindRandom, &mut c3).await;

        assert!(state.queue.ist_wartend(&c3.verbindung));
        assert!(match_found_events(&mut rx3).is_empty());
    }

    #[tokio::test]
    async fn match_schritt_behaelt_die_freie_seite() {
        let state = test_state();
        let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
        let (a, _a_rx) = verbinden(&state);
        let (x, _x_rx) = verbinden(&state);
        let (mut c3, mut rx3) = verbinden(&state);
        leeren(&mut rx3);

        // Staler Zustand: a steht in der Schlange obwohl bereits gekoppelt
        state.queue.einreihen(a.verbindung);
        state
            .pairings
            .koppeln(a.verbindung, x.verbindung, PaarungsArt::Direktanruf);

        dispatcher.dispatch(SignalEvent::FindRandom, &mut c3).await;

        assert!(
            !state.queue.ist_wartend(&a.verbindung),
            "Staler Eintrag muss verworfen werden"
        );
        assert!(
            state.queue.ist_wartend(&c3.verbindung),
            "Die freie Seite bleibt wartend"
        );
        assert!(match_found_events(&mut rx3).is_empty());

        // Und sie wird als Naechste vermittelt
        let (mut c4, mut rx4) = verbinden(&state);
        leeren(&mut rx4);
        dispatcher.dispatch(SignalEvent::FindRandom, &mut c4).await;

        let matches = match_found_events(&mut rx3);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].partner_id, c4.verbindung);
        assert!(matches[0].initiator);
    }

    #[tokio::test]
    async fn not_ready_waehrend_direktanruf_wird_verworfen() {
        let state = test_state();
        let dispatcher = MessageDispatcher::neu(Arc::clone(&state));
        let (mut alice, mut alice_rx) = verbinden(&state);
        let (mut bob, mut bob_rx) = verbinden(&state);
        dispatcher.dispatch(register("alice"), &mut alice).await;
        dispatcher.dispatch(register("bob"), &mut bob).await;
        leeren(&mut alice_rx);
        leeren(&mut bob_rx);

        dispatcher
            .dispatch(
                SignalEvent::CallUser(CallUserRequest {
                    to: "bob".into(),
                    offer: json!({}),
                }),
                &mut alice,
            )
            .await;
        leeren(&mut bob_rx);

        let antwort = dispatcher.dispatch(SignalEvent::NotReady, &mut bob).await;

        assert!(antwort.is_none());
        assert!(
            !state.queue.ist_wartend(&alice.verbindung),
            "Direktanrufer gehoert nicht in die Matchmaking-Schlange"
        );
        assert!(
            alice_rx.try_recv().is_err(),
            "alice darf kein waiting-for-match bekommen"
        );
        assert!(
            state.pairings.ist_gekoppelt(&alice.verbindung),
            "Die Direktanruf-Paarung bleibt bestehen"
        );
    }
}
