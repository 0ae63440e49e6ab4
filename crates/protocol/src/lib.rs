//! anruf-protocol – Wire-Protokoll des Signaling-Relays
//!
//! Definiert die Signal-Events die zwischen Client und Server ueber eine
//! persistente TCP-Verbindung ausgetauscht werden, sowie das Frame-Format
//! (Laengenpraefix + JSON).
//!
//! Das Relay versteht die WebRTC-Payloads (Offer, Answer, ICE-Kandidaten)
//! nicht – sie werden als opake `serde_json::Value` transportiert.

pub mod signal;
pub mod wire;

// Bequeme Re-Exporte
pub use signal::SignalEvent;
pub use wire::FrameCodec;
