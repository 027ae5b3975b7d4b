use shared::domain::OrderId;
use thiserror::Error;

/// Failure taxonomy for order operations. None of these are fatal to the
/// client; every caller has a defined local recovery.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No bearer credential is stored. Raised before any request is built,
    /// so the operation never reaches the network.
    #[error("no stored credential; sign in before using the orders api")]
    MissingCredential,
    /// No viewer has been configured on the client.
    #[error("no viewer configured for order access")]
    MissingViewer,
    /// The request never produced a response: connection, timeout, or an
    /// unreadable success body.
    #[error("order request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The remote API answered with a non-success status.
    #[error("order request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// Another status update or archive for the same order has not settled.
    #[error("a mutation for order {0} is already in flight")]
    MutationInFlight(OrderId),
}
