//! Session lifecycle events published on the bus.

use security_core::SessionId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Started { id: SessionId, host: Option<String> },
    Stopped { id: SessionId },
    Expired { id: SessionId },
}

impl SessionEvent {
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        match self {
            Self::Started { id, .. } | Self::Stopped { id } | Self::Expired { id } => *id,
        }
    }
}
