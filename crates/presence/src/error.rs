use tessera_common::protocol::presence::{
    ServerMessage, CLOSE_INTERNAL_ERROR, CLOSE_POLICY_VIOLATION,
};

/// Terminal handshake failures, reported to the client before the
/// connection is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    AuthMissing,
    AuthInvalid,
    ServerConfigError,
    ServerInternalError,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthMissing => "AUTH_MISSING",
            Self::AuthInvalid => "AUTH_INVALID",
            Self::ServerConfigError => "SERVER_CONFIG_ERROR",
            Self::ServerInternalError => "SERVER_INTERNAL_ERROR",
        }
    }

    /// WebSocket close code paired with this error: policy violation
    /// for credential problems, internal error otherwise.
    pub const fn close_code(self) -> u16 {
        match self {
            Self::AuthMissing | Self::AuthInvalid => CLOSE_POLICY_VIOLATION,
            Self::ServerConfigError | Self::ServerInternalError => CLOSE_INTERNAL_ERROR,
        }
    }

    pub const fn default_message(self) -> &'static str {
        match self {
            Self::AuthMissing => "no credential supplied",
            Self::AuthInvalid => "credential rejected",
            Self::ServerConfigError => "presence server is misconfigured",
            Self::ServerInternalError => "internal server error",
        }
    }

    /// Credential failures use the dedicated `auth_error` frame so
    /// clients can tell "could not connect to live presence" apart
    /// from a generic connectivity error.
    pub fn to_message(self) -> ServerMessage {
        match self {
            Self::AuthMissing | Self::AuthInvalid => {
                ServerMessage::AuthError { code: self.as_str().to_string() }
            }
            Self::ServerConfigError | Self::ServerInternalError => {
                ServerMessage::Error { code: self.as_str().to_string() }
            }
        }
    }
}
