//! Fehlertypen fuer Anruf
//!
//! Zentraler Fehler-Enum fuer die Fehlerzustaende die ueber Crate-Grenzen
//! wandern. Io-nahe Stellen (Codec, TCP) verpacken diese Fehler in
//! `std::io::Error`, alles andere nutzt den `Result`-Alias direkt.

use thiserror::Error;

/// Globaler Result-Alias fuer Anruf
pub type Result<T> = std::result::Result<T, RelayError>;

/// Alle moeglichen Fehler im Relay-System
#[derive(Debug, Error)]
pub enum RelayError {
    // --- Protokoll ---
    #[error("Ungueltige Nachricht: {0}")]
    UngueltigeNachricht(String),

    #[error("Frame zu gross: {bytes} Bytes (Maximum {maximum})")]
    FrameZuGross { bytes: usize, maximum: usize },

    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),
}
