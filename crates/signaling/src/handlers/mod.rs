//! Event-Handler fuer den MessageDispatcher
//!
//! Jede Datei buendelt die Handler eines Teilbereichs:
//! - `call_handler`    – Registrierung und direkt adressierte Anrufe
//! - `match_handler`   – Zufalls-Matchmaking
//! - `session_handler` – Connect, Heartbeat, Disconnect-Kaskade

pub mod call_handler;
pub mod match_handler;
pub mod session_handler;
