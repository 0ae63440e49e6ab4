//! Signal-Events (TCP)
//!
//! Definiert alle Nachrichten die ueber die TCP-Verbindung zwischen
//! Client und Server ausgetauscht werden.
//!
//! ## Design
//! - Fire-and-forget: Events tragen keine Request-IDs, es gibt keine
//!   Bestaetigungen und keine serverseitigen Retries
//! - JSON-Serialisierung via serde, Tagged Enum mit kebab-case Event-Namen
//! - WebRTC-Payloads (Offer/Answer/Candidate) bleiben opake JSON-Werte

use anruf_core::types::{ConnectionId, Identity};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Direktanruf-Nachrichten
// ---------------------------------------------------------------------------

/// Registrierung einer stabilen Identitaet (Client -> Server)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Frei gewaehlte Kennung unter der dieser Client anrufbar ist
    pub identity: Identity,
}

/// Anruf-Anfrage mit WebRTC-Offer (Client -> Server)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallUserRequest {
    /// Ziel-Identitaet
    pub to: Identity,
    /// Opakes WebRTC-Offer
    pub offer: serde_json::Value,
}

/// Zugestellter Anruf beim Ziel (Server -> Client)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingCall {
    /// Identitaet des Anrufers
    pub from: Identity,
    /// Opakes WebRTC-Offer
    pub offer: serde_json::Value,
}

/// Anruf-Annahme mit WebRTC-Answer (Client -> Server)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptCallRequest {
    /// Identitaet des urspruenglichen Anrufers
    pub to: Identity,
    /// Opake WebRTC-Answer
    pub answer: serde_json::Value,
}

/// Zugestellte Annahme beim Anrufer (Server -> Client)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallAccepted {
    /// Opake WebRTC-Answer
    pub answer: serde_json::Value,
}

/// ICE-Kandidat, in beide Richtungen relayed
///
/// Vom Client kommt `to` mitgeliefert; bei der Zustellung an das Ziel
/// laesst der Server das Feld weg.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceCandidate {
    /// Ziel-Identitaet (nur Client -> Server)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Identity>,
    /// Opaker ICE-Kandidat
    pub candidate: serde_json::Value,
}

/// Anruf beenden (Client -> Server)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndCallRequest {
    /// Identitaet des Gespraechspartners
    pub to: Identity,
}

/// Fehlermeldung an den Absender (Server -> Client)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallError {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Matchmaking-Nachrichten
// ---------------------------------------------------------------------------

/// Erfolgreiche Zufalls-Paarung (Server -> Client)
///
/// Jede Seite erfaehrt nur das Verbindungs-Handle des Partners, keine
/// weiteren Details. Genau eine Seite bekommt `initiator: true` und
/// beginnt den WebRTC-Handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchFound {
    /// Verbindungs-Handle des Partners
    pub partner_id: ConnectionId,
    /// true fuer die Seite die das Offer erstellt
    pub initiator: bool,
}

/// Relayed WebRTC-Offer an den aktuellen Partner (implizites Ziel)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebrtcOffer {
    pub offer: serde_json::Value,
}

/// Relayed WebRTC-Answer an den aktuellen Partner (implizites Ziel)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebrtcAnswer {
    pub answer: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Presence- und Lifecycle-Nachrichten
// ---------------------------------------------------------------------------

/// Begruessung nach dem Connect (Server -> Client)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectInfo {
    /// Server-vergebenes Verbindungs-Handle
    pub user_id: ConnectionId,
    /// Aktuelle Anzahl verbundener Clients
    pub online_count: usize,
    /// Serverzeit als Unix-Timestamp in Millisekunden
    pub server_time: i64,
}

/// Broadcast der aktuellen Online-Anzahl (Server -> alle Clients)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineCount {
    pub count: usize,
}

/// Periodischer Statistik-Broadcast (Server -> alle Clients)
///
/// Rein informativ, keine Korrektheitsabhaengigkeit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStats {
    /// Verbundene Clients
    pub online: usize,
    /// Clients in der Matchmaking-Warteschlange
    pub waiting: usize,
    /// Aktive Anruf-Paarungen
    pub active_calls: usize,
    /// Server-Uptime in Sekunden
    pub uptime_secs: u64,
}

/// Terminaler Broadcast beim Herunterfahren (Server -> alle Clients)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerShutdown {
    pub message: String,
    /// Unix-Timestamp in Millisekunden
    pub timestamp: i64,
}

// ---------------------------------------------------------------------------
// Haupt-Enum: SignalEvent
// ---------------------------------------------------------------------------

/// Alle moeglichen Signal-Events (typsicher via Tagged Enum)
///
/// Die Tag-Namen entsprechen den Event-Namen auf dem Draht
/// (`{"type": "call-user", "to": ..., "offer": ...}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SignalEvent {
    // Direktanruf
    Register(RegisterRequest),
    CallUser(CallUserRequest),
    IncomingCall(IncomingCall),
    AcceptCall(AcceptCallRequest),
    CallAccepted(CallAccepted),
    IceCandidate(IceCandidate),
    EndCall(EndCallRequest),
    CallEnded,
    CallError(CallError),

    // Matchmaking
    FindRandom,
    CancelSearch,
    WaitingForMatch,
    MatchFound(MatchFound),
    NotReady,
    WebrtcOffer(WebrtcOffer),
    WebrtcAnswer(WebrtcAnswer),

    // Keepalive
    Heartbeat,
    HeartbeatAck,

    // Presence & Lifecycle
    ConnectInfo(ConnectInfo),
    OnlineCount(OnlineCount),
    ServerStats(ServerStats),
    ServerShutdown(ServerShutdown),
}

impl SignalEvent {
    /// Erstellt ein `incoming-call`-Event fuer die Zustellung an das Ziel
    pub fn incoming_call(from: Identity, offer: serde_json::Value) -> Self {
        Self::IncomingCall(IncomingCall { from, offer })
    }

    /// Erstellt ein `call-accepted`-Event fuer die Zustellung an den Anrufer
    pub fn call_accepted(answer: serde_json::Value) -> Self {
        Self::CallAccepted(CallAccepted { answer })
    }

    /// Erstellt ein `ice-candidate`-Event ohne Zielfeld (Zustellung)
    pub fn ice_candidate_zustellung(candidate: serde_json::Value) -> Self {
        Self::IceCandidate(IceCandidate {
            to: None,
            candidate,
        })
    }

    /// Erstellt ein `call-error`-Event
    pub fn call_error(message: impl Into<String>) -> Self {
        Self::CallError(CallError {
            message: message.into(),
        })
    }

    /// Erstellt ein `match-found`-Event
    pub fn match_found(partner_id: ConnectionId, initiator: bool) -> Self {
        Self::MatchFound(MatchFound {
            partner_id,
            initiator,
        })
    }

    /// Erstellt ein `online-count`-Event
    pub fn online_count(count: usize) -> Self {
        Self::OnlineCount(OnlineCount { count })
    }

    /// Gibt den Draht-Namen des Events zurueck (fuer Logging)
    pub fn name(&self) -> &'static str {
        match self {
            Self::Register(_) => "register",
            Self::CallUser(_) => "call-user",
            Self::IncomingCall(_) => "incoming-call",
            Self::AcceptCall(_) => "accept-call",
            Self::CallAccepted(_) => "call-accepted",
            Self::IceCandidate(_) => "ice-candidate",
            Self::EndCall(_) => "end-call",
            Self::CallEnded => "call-ended",
            Self::CallError(_) => "call-error",
            Self::FindRandom => "find-random",
            Self::CancelSearch => "cancel-search",
            Self::WaitingForMatch => "waiting-for-match",
            Self::MatchFound(_) => "match-found",
            Self::NotReady => "not-ready",
            Self::WebrtcOffer(_) => "webrtc-offer",
            Self::WebrtcAnswer(_) => "webrtc-answer",
            Self::Heartbeat => "heartbeat",
            Self::HeartbeatAck => "heartbeat-ack",
            Self::ConnectInfo(_) => "connect-info",
            Self::OnlineCount(_) => "online-count",
            Self::ServerStats(_) => "server-stats",
            Self::ServerShutdown(_) => "server-shutdown",
        }
    }

    /// Serialisiert das Event als JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserialisiert ein Event aus JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
