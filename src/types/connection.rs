//! Connection lifecycle state.

/// Where the client is in its connection lifecycle.
///
/// `ManuallyDisconnected` carries the user's intent: the poll tick never
/// reconnects from it. Only [`MySmartBike::disconnect`](crate::MySmartBike::disconnect)
/// enters it and only [`MySmartBike::connect`](crate::MySmartBike::connect) leaves it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No session; the next poll tick may connect.
    #[default]
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// Session open, notifications flowing.
    Connected,
    /// No session, and the user asked for it to stay that way.
    ManuallyDisconnected,
}

impl ConnectionState {
    /// Returns true if a session is established.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns true unless the user asked to stay disconnected.
    #[must_use]
    pub const fn connection_desired(self) -> bool {
        !matches!(self, Self::ManuallyDisconnected)
    }

    /// Returns true if the poll tick should attempt a connect.
    #[must_use]
    pub const fn allows_auto_connect(self) -> bool {
        matches!(self, Self::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        assert!(ConnectionState::Disconnected.allows_auto_connect());
        assert!(ConnectionState::Disconnected.connection_desired());
        assert!(!ConnectionState::Connecting.allows_auto_connect());
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Connected.allows_auto_connect());
        assert!(!ConnectionState::ManuallyDisconnected.allows_auto_connect());
        assert!(!ConnectionState::ManuallyDisconnected.connection_desired());
        assert!(!ConnectionState::ManuallyDisconnected.is_connected());
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }
}
