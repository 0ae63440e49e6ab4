//! Gemeinsame Identifikationstypen fuer Anruf
//!
//! IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! verschiedenen ID-Arten zur Compilezeit auszuschliessen. Eine
//! `ConnectionId` vergibt der Server pro Verbindung; eine `Identity`
//! liefert der Client selbst und sie ist nicht authentifiziert.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server-vergebenes, eindeutiges Handle fuer eine lebende Verbindung
///
/// Wird bei jedem Connect neu vergeben. Ein Reconnect bekommt eine neue
/// ConnectionId – es gibt keine Session-Wiederaufnahme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Erstellt eine neue zufaellige ConnectionId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn:{}", self.0)
    }
}

/// Client-gelieferte Kennung fuer direkt adressierte Anrufe
///
/// Frei waehlbarer String, nicht garantiert eindeutig. Bei doppelter
/// Registrierung gewinnt der letzte Schreiber (siehe ConnectionRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub String);

impl Identity {
    /// Erstellt eine Identity aus einem beliebigen String
    pub fn neu(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Gibt den inneren String als Slice zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
