use num_enum::{FromPrimitive, IntoPrimitive};

/// Wire message type carried in the first four bytes of every envelope.
///
/// Values not known to this crate decode into [`MessageType::Unknown`] rather
/// than failing, so that the router can ignore messages it has no route for
/// without treating them as malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u32)]
pub enum MessageType {
    Multi = 1,
    ServiceMethod = 146,
    ServiceMethodResponse = 147,
    ServiceMethodCallFromClient = 151,
    ServiceMethodSendToClient = 152,
    ClientUfsLoginRequest = 5310,
    ClientUfsLoginResponse = 5311,
    ClientUfsGetFileListForApp = 5414,
    ClientUfsGetFileListForAppResponse = 5415,
    ClientUfsGetUgcDetails = 5426,
    ClientUfsGetUgcDetailsResponse = 5427,
    ClientUfsGetSingleFileInfo = 5428,
    ClientUfsGetSingleFileInfoResponse = 5429,
    ClientUfsShareFile = 5430,
    ClientUfsShareFileResponse = 5431,
    #[num_enum(catch_all)]
    Unknown(u32),
}

/// Declared family of a message type. Decides which body flavors are legal
/// and whether the header may carry a target job name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFamily {
    /// Positional fixed-layout bodies.
    Legacy,
    /// Schema-driven bodies addressed by message type alone.
    Client,
    /// Schema-driven bodies addressed by a job name; responses share one
    /// generic message type.
    ServiceMethod,
    /// Not declared by this crate; either flavor is accepted.
    Undeclared,
}

impl MessageType {
    pub fn family(self) -> MessageFamily {
        match self {
            MessageType::ServiceMethod
            | MessageType::ServiceMethodResponse
            | MessageType::ServiceMethodCallFromClient
            | MessageType::ServiceMethodSendToClient => MessageFamily::ServiceMethod,
            MessageType::ClientUfsLoginRequest | MessageType::ClientUfsLoginResponse => {
                MessageFamily::Legacy
            }
            MessageType::Unknown(_) => MessageFamily::Undeclared,
            _ => MessageFamily::Client,
        }
    }

    /// `true` for the single response type shared by every service method call.
    #[inline]
    pub fn is_generic_response(self) -> bool {
        self == MessageType::ServiceMethodResponse
    }

    #[inline]
    pub fn allows_job_name(self) -> bool {
        self.family() == MessageFamily::ServiceMethod
    }

    #[inline]
    pub fn value(self) -> u32 {
        self.into()
    }
}
