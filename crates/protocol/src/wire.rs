//! Wire-Format fuer die TCP-Verbindung
//!
//! Frame-basiertes Protokoll: Laenge (u32 big-endian) + JSON-Payload eines
//! einzelnen `SignalEvent`. Die Laenge zaehlt nur die Payload-Bytes, nicht
//! das Laengen-Feld selbst. Maximale Frame-Groesse ist konfigurierbar
//! (Standard: 256 KB – Signaling-Payloads sind klein, grosse Frames sind
//! ein Protokollfehler).

use anruf_core::RelayError;
use bytes::{Buf, BufMut, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

use crate::signal::SignalEvent;

/// Standard-maximale Frame-Groesse (256 KB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 256 * 1024;

/// Groesse des Laengen-Felds in Bytes
pub const LENGTH_FIELD_SIZE: usize = 4;

/// tokio-util Codec fuer die frame-basierte TCP-Verbindung
///
/// Implementiert `Encoder<SignalEvent>` und `Decoder` fuer die Verwendung
/// mit `tokio_util::codec::Framed`.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    /// Maximale erlaubte Frame-Groesse in Bytes
    max_frame_size: usize,
}

impl FrameCodec {
    /// Erstellt einen neuen `FrameCodec` mit Standard-Limit
    pub fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Erstellt einen `FrameCodec` mit eigenem Frame-Limit
    pub fn with_max_size(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    /// Gibt die konfigurierte maximale Frame-Groesse zurueck
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = SignalEvent;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Erst das Laengen-Feld abwarten
        if src.len() < LENGTH_FIELD_SIZE {
            return Ok(None);
        }

        // Laenge lesen ohne den Buffer zu veraendern
        let laenge = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;

        if laenge > self.max_frame_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                RelayError::FrameZuGross {
                    bytes: laenge,
                    maximum: self.max_frame_size,
                },
            ));
        }

        let gesamt = LENGTH_FIELD_SIZE + laenge;
        if src.len() < gesamt {
            // Speicher vorbelegen, der Rest des Frames kommt noch
            src.reserve(gesamt - src.len());
            return Ok(None);
        }

        src.advance(LENGTH_FIELD_SIZE);
        let payload = src.split_to(laenge);

        let event: SignalEvent = serde_json::from_slice(&payload).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                RelayError::UngueltigeNachricht(e.to_string()),
            )
        })?;

        Ok(Some(event))
    }
}

impl Encoder<SignalEvent> for FrameCodec {
    type Error = io::Error;

    fn encode(&mut self, item: SignalEvent, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let json = serde_json::to_vec(&item).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                RelayError::UngueltigeNachricht(e.to_string()),
            )
        })?;

        if json.len() > self.max_frame_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                RelayError::FrameZuGross {
                    bytes: json.len(),
                    maximum: self.max_frame_size,
                },
            ));
        }

        dst.reserve(LENGTH_FIELD_SIZE + json.len());
        dst.put_u32(json.len() as u32);
        dst.put_slice(&json);

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
