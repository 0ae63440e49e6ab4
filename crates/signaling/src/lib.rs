//! anruf-signaling – TCP Signaling- und Matchmaking-Relay
//!
//! Dieser Crate implementiert den Kern von Anruf: ein Relay das zwei
//! Browser-Clients paart und die WebRTC-Handshake-Nachrichten (Offer,
//! Answer, ICE-Kandidaten) opak zwischen ihnen weiterleitet. Media
//! fliesst nie durch den Server – nach dem Handshake sprechen die
//! Browser direkt miteinander.
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (SignalingServer)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |  Heartbeat-Timeout, Send-Queue, Shutdown-Watch
//!     |
//!     v
//! MessageDispatcher
//!     |
//!     +-- CallHandler     (Register, CallUser, AcceptCall, IceCandidate, EndCall)
//!     +-- MatchHandler    (FindRandom, CancelSearch, NotReady)
//!     +-- SessionHandler  (Connect, Heartbeat, Disconnect-Kaskade)
//!
//! ConnectionRegistry  – Identitaet -> lebendes Verbindungs-Handle
//! PairingTable        – Wer telefoniert gerade mit wem
//! MatchmakingQueue    – FIFO-Warteschlange fuer Zufalls-Anrufe
//! PresenceManager     – Wer ist online, wann kam der letzte Heartbeat
//! EventBroadcaster    – Events an einzelne oder alle Clients senden
//! ```
//!
//! ## Zustandsmaschine pro Verbindung (Matchmaking)
//!
//! ```text
//! idle --find-random--> waiting --match--> paired --end/disconnect--> idle
//!   ^                      |
//!   +----cancel/disconnect-+
//! ```
//!
//! "waiting" heisst: das Handle steht in der `MatchmakingQueue`.
//! "paired" heisst: das Handle hat einen Eintrag in der `PairingTable`.

pub mod broadcast;
pub mod connection;
pub mod dispatcher;
pub mod handlers;
pub mod matchmaking;
pub mod pairing;
pub mod presence;
pub mod registry;
pub mod server_state;
pub mod tcp;

// Bequeme Re-Exporte
pub use broadcast::EventBroadcaster;
pub use connection::ClientConnection;
pub use dispatcher::{DispatcherContext, MessageDispatcher};
pub use matchmaking::MatchmakingQueue;
pub use pairing::{PaarungsArt, PairingTable};
pub use presence::PresenceManager;
pub use registry::ConnectionRegistry;
pub use server_state::{SignalingConfig, SignalingState};
pub use tcp::SignalingServer;
