use core::fmt;

pub type Result<T> = core::result::Result<T, SetupError>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SetupError {
    /// A request type code outside `Standard`, `Class` and `Vendor` was supplied when building a
    /// packet.
    InvalidRequestType(u8),
    /// A Setup packet must be exactly `8` bytes long. Holds the length that was supplied.
    InvalidLength(usize),
    /// The type bits of `bmRequestType` held the reserved pattern `0b11`.
    UnknownRequestType,
    /// The recipient bits of `bmRequestType` held one of the reserved codes (`4..=31`).
    ReservedRecipient(u8),
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::InvalidRequestType(code) => write!(f, "Invalid request type code: {}", code),
            SetupError::InvalidLength(length) => {
                write!(f, "Setup packet must be 8 bytes long, but {} were supplied", length)
            }
            SetupError::UnknownRequestType => f.write_str("Reserved request type in bmRequestType"),
            SetupError::ReservedRecipient(code) => write!(f, "Reserved recipient code: {:#x}", code),
        }
    }
}
