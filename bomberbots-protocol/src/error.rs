//! Error taxonomy for the wire codec.

/// Result type for codec and transport operations.
pub type WireResult<T> = Result<T, WireError>;

/// Errors produced while encoding or decoding wire messages.
///
/// `BadRead` is deliberately context-free: over UDP it means a malformed
/// or truncated datagram, over TCP the stream transport treats it as
/// "need more bytes" and keeps filling its buffer until the message
/// completes or the peer closes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// A variant discriminant outside the declared range.
    #[error("unknown message discriminant {0}")]
    BadType(u8),

    /// Ran out of input before the message was complete.
    #[error("not enough bytes to decode message")]
    BadRead,

    /// The value cannot be represented on the wire (oversize string or
    /// datagram).
    #[error("encoded message exceeds capacity")]
    BadWrite,
}
