use bit_field::BitField;

/// The type of transfer an endpoint performs.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum TransferType {
    Control = 0,
    Isochronous = 1,
    Bulk = 2,
    Interrupt = 3,
}

impl TransferType {
    /// Extract the transfer type from the `bmAttributes` field of an endpoint descriptor. Only
    /// bits `0..2` are used; the rest describe synchronization and usage for isochronous endpoints.
    pub fn from_attributes(attributes: u8) -> TransferType {
        match attributes.get_bits(0..2) {
            0 => TransferType::Control,
            1 => TransferType::Isochronous,
            2 => TransferType::Bulk,
            _ => TransferType::Interrupt,
        }
    }

    /// Isochronous and interrupt endpoints are serviced on a schedule, rather than as bandwidth
    /// becomes available.
    pub fn is_periodic(self) -> bool {
        matches!(self, TransferType::Isochronous | TransferType::Interrupt)
    }
}
