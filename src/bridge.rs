//! Messages exchanged between the host and the presentation surface
//!
//! The two sides never share state. Everything crosses as one of the enums
//! below, over a pair of unbounded channels that keep per-direction order.
//! The JSON shape (`{"type": "shoot", "serializedBlob": ...}`) is stable so
//! the same vocabulary can be carried over any text transport.

use crate::settings::{BackgroundKind, GradientStops, PresentationSettings};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Presentation → host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PresentationMessage {
    /// Ask the host to push persisted background and current settings
    GetAndUpdateCacheAndSettings,
    /// Comma-serialized PNG bytes to save
    Shoot { serialized_blob: String },
    UpdateBgColor { bg_color: String },
    UpdateBgSettings {
        background_kind: BackgroundKind,
        gradient_stops: GradientStops,
        gradient_direction: String,
    },
    CopySuccess { message: String },
    CopyError { message: String },
    ExportError { message: String },
    ShareToTwitter {
        /// Base64 PNG
        image_data: String,
        text: String,
        image_copied_to_clipboard: bool,
    },
    InvalidPasteContent,
}

/// Host → presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostMessage {
    Init { font_family: String, bg_color: String },
    Restore {
        #[serde(rename = "innerHTML")]
        inner_html: String,
        bg_color: String,
    },
    RestoreBgColor { bg_color: String },
    UpdateSettings { settings: PresentationSettings },
    /// Start a save capture
    Save,
    SaveSuccess { file_name: String, file_path: String },
    SaveError { message: String },
    ShareSuccess,
    ShareError { message: String },
}

/// Wire name of a message, for logs and errors that must not echo the
/// payload (a `shoot` blob runs to megabytes)
pub trait MessageKind {
    fn kind(&self) -> &'static str;
}

impl MessageKind for PresentationMessage {
    fn kind(&self) -> &'static str {
        match self {
            PresentationMessage::GetAndUpdateCacheAndSettings => "getAndUpdateCacheAndSettings",
            PresentationMessage::Shoot { .. } => "shoot",
            PresentationMessage::UpdateBgColor { .. } => "updateBgColor",
            PresentationMessage::UpdateBgSettings { .. } => "updateBgSettings",
            PresentationMessage::CopySuccess { .. } => "copySuccess",
            PresentationMessage::CopyError { .. } => "copyError",
            PresentationMessage::ExportError { .. } => "exportError",
            PresentationMessage::ShareToTwitter { .. } => "shareToTwitter",
            PresentationMessage::InvalidPasteContent => "invalidPasteContent",
        }
    }
}

impl MessageKind for HostMessage {
    fn kind(&self) -> &'static str {
        match self {
            HostMessage::Init { .. } => "init",
            HostMessage::Restore { .. } => "restore",
            HostMessage::RestoreBgColor { .. } => "restoreBgColor",
            HostMessage::UpdateSettings { .. } => "updateSettings",
            HostMessage::Save => "save",
            HostMessage::SaveSuccess { .. } => "saveSuccess",
            HostMessage::SaveError { .. } => "saveError",
            HostMessage::ShareSuccess => "shareSuccess",
            HostMessage::ShareError { .. } => "shareError",
        }
    }
}

/// Sending half that reports a closed peer as an error
#[derive(Debug)]
pub struct Outbox<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> Clone for Outbox<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: MessageKind> Outbox<T> {
    pub fn new(tx: mpsc::UnboundedSender<T>) -> Self {
        Self { tx }
    }

    pub fn send(&self, msg: T) -> Result<()> {
        let kind = msg.kind();
        log::trace!("-> {}", kind);
        self.tx
            .send(msg)
            .map_err(|_| Error::ChannelClosed(format!("peer dropped, undelivered {}", kind)))
    }
}

/// Host side of the bridge
#[derive(Debug)]
pub struct HostEndpoint {
    pub outbox: Outbox<HostMessage>,
    pub inbox: mpsc::UnboundedReceiver<PresentationMessage>,
}

/// Surface side of the bridge
#[derive(Debug)]
pub struct SurfaceEndpoint {
    pub outbox: Outbox<PresentationMessage>,
    pub inbox: mpsc::UnboundedReceiver<HostMessage>,
}

/// Create a connected host/surface pair
pub fn channel() -> (HostEndpoint, SurfaceEndpoint) {
    let (to_surface, surface_rx) = mpsc::unbounded_channel();
    let (to_host, host_rx) = mpsc::unbounded_channel();
    (
        HostEndpoint {
            outbox: Outbox::new(to_surface),
            inbox: host_rx,
        },
        SurfaceEndpoint {
            outbox: Outbox::new(to_host),
            inbox: surface_rx,
        },
    )
}

/// Wire form of a message
pub fn encode<T: Serialize>(msg: &T) -> Result<String> {
    Ok(serde_json::to_string(msg)?)
}

pub fn decode<'a, T: Deserialize<'a>>(data: &'a str) -> Result<T> {
    Ok(serde_json::from_str(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::SerializedImage;

    #[test]
    fn wire_names_are_camel_case() {
        let json = encode(&PresentationMessage::Shoot {
            serialized_blob: "1,2".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"shoot","serializedBlob":"1,2"}"#);

        let json = encode(&PresentationMessage::GetAndUpdateCacheAndSettings).unwrap();
        assert_eq!(json, r#"{"type":"getAndUpdateCacheAndSettings"}"#);
    }

    #[test]
    fn restore_uses_inner_html_key() {
        let msg: HostMessage =
            decode(r##"{"type":"restore","innerHTML":"<div></div>","bgColor":"#000"}"##).unwrap();
        assert_eq!(
            msg,
            HostMessage::Restore {
                inner_html: "<div></div>".into(),
                bg_color: "#000".into()
            }
        );
    }

    #[test]
    fn unknown_type_is_a_serialization_error() {
        let err = decode::<HostMessage>(r#"{"type":"explode"}"#).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[tokio::test]
    async fn channel_preserves_order_and_reports_closed_peer() {
        let (mut host, surface) = channel();
        surface.outbox.send(PresentationMessage::InvalidPasteContent).unwrap();
        surface
            .outbox
            .send(PresentationMessage::GetAndUpdateCacheAndSettings)
            .unwrap();
        assert_eq!(host.inbox.recv().await, Some(PresentationMessage::InvalidPasteContent));
        assert_eq!(
            host.inbox.recv().await,
            Some(PresentationMessage::GetAndUpdateCacheAndSettings)
        );

        drop(surface);
        assert!(matches!(
            host.outbox.send(HostMessage::Save),
            Err(Error::ChannelClosed(_))
        ));
    }

    #[test]
    fn closed_channel_error_names_only_the_message_kind() {
        let (host, surface) = channel();
        drop(host);
        let blob = SerializedImage::from_bytes(&[7u8; 4096]).into_string();
        let err = surface
            .outbox
            .send(PresentationMessage::Shoot {
                serialized_blob: blob,
            })
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("shoot"), "{}", message);
        assert!(!message.contains("7,7,7"));
        assert!(message.len() < 100);
    }
}
