use crate::{
    descriptor::DescriptorType,
    error::SetupError,
};
use log::trace;
use mycelium_bitfield::FromBits;

/// The size, in bytes, of a Setup packet on the wire.
pub const SETUP_PACKET_SIZE: usize = 8;

/// The Setup packet that starts every control transfer. Each field is held in its decoded form;
/// the packing into `bmRequestType` only happens in [`SetupPacket::encode`] and
/// [`SetupPacket::decode`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SetupPacket {
    pub recipient: Recipient,
    pub kind: RequestKind,
    pub direction: Direction,
    /// The `bRequest` code. For `RequestKind::Standard` this is a [`StandardRequest`]; otherwise
    /// its meaning is defined by the class or vendor.
    pub request: u8,
    pub value: u16,
    pub index: u16,
    /// The number of bytes in the data stage. `0` means there is no data stage.
    pub length: u16,
}

mycelium_bitfield::bitfield! {
    /// The `bmRequestType` field of a Setup packet.
    pub struct RequestType<u8> {
        pub const RECIPIENT: Recipient;
        pub const KIND: RequestKind;
        pub const DIRECTION: Direction;
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum Recipient {
    Device = 0,
    Interface = 1,
    Endpoint = 2,
    Other = 3,
}

/// The recipient occupies bits `0..5` of `bmRequestType`, but only the first four codes are
/// assigned. Encoding always leaves bits `2..5` clear.
impl FromBits<u8> for Recipient {
    type Error = SetupError;
    const BITS: u32 = 5;

    fn try_from_bits(bits: u8) -> Result<Self, SetupError> {
        match bits {
            0 => Ok(Recipient::Device),
            1 => Ok(Recipient::Interface),
            2 => Ok(Recipient::Endpoint),
            3 => Ok(Recipient::Other),
            other => Err(SetupError::ReservedRecipient(other)),
        }
    }

    fn into_bits(self) -> u8 {
        self as u8
    }
}

/// Which specification defines the meaning of `bRequest`. Code `3` is reserved by the USB
/// specification and has no variant.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum RequestKind {
    Standard = 0,
    Class = 1,
    Vendor = 2,
}

impl RequestKind {
    /// Look up a request kind from its numeric code, for callers that only have the raw value.
    pub fn from_code(code: u8) -> Result<RequestKind, SetupError> {
        match code {
            0 => Ok(RequestKind::Standard),
            1 => Ok(RequestKind::Class),
            2 => Ok(RequestKind::Vendor),
            other => Err(SetupError::InvalidRequestType(other)),
        }
    }
}

impl FromBits<u8> for RequestKind {
    type Error = SetupError;
    const BITS: u32 = 2;

    fn try_from_bits(bits: u8) -> Result<Self, SetupError> {
        RequestKind::from_code(bits).map_err(|_| SetupError::UnknownRequestType)
    }

    fn into_bits(self) -> u8 {
        self as u8
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum Direction {
    HostToDevice = 0,
    DeviceToHost = 1,
}

impl FromBits<u8> for Direction {
    type Error = SetupError;
    const BITS: u32 = 1;

    fn try_from_bits(bits: u8) -> Result<Self, SetupError> {
        Ok(if bits == 0 { Direction::HostToDevice } else { Direction::DeviceToHost })
    }

    fn into_bits(self) -> u8 {
        self as u8
    }
}

/// The `bRequest` codes defined by chapter 9 of the USB 2.0 specification.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum StandardRequest {
    GetStatus = 0,
    ClearFeature = 1,
    SetFeature = 3,
    SetAddress = 5,
    GetDescriptor = 6,
    SetDescriptor = 7,
    GetConfiguration = 8,
    SetConfiguration = 9,
    GetInterface = 10,
    SetInterface = 11,
    SyncFrame = 12,
}

impl StandardRequest {
    pub fn from_code(code: u8) -> Option<StandardRequest> {
        match code {
            0 => Some(StandardRequest::GetStatus),
            1 => Some(StandardRequest::ClearFeature),
            3 => Some(StandardRequest::SetFeature),
            5 => Some(StandardRequest::SetAddress),
            6 => Some(StandardRequest::GetDescriptor),
            7 => Some(StandardRequest::SetDescriptor),
            8 => Some(StandardRequest::GetConfiguration),
            9 => Some(StandardRequest::SetConfiguration),
            10 => Some(StandardRequest::GetInterface),
            11 => Some(StandardRequest::SetInterface),
            12 => Some(StandardRequest::SyncFrame),
            _ => None,
        }
    }
}

impl From<StandardRequest> for u8 {
    fn from(request: StandardRequest) -> u8 {
        request as u8
    }
}

impl SetupPacket {
    /// Decode a Setup packet from the bytes received on (or destined for) a control endpoint.
    pub fn decode(bytes: &[u8]) -> Result<SetupPacket, SetupError> {
        Self::decode_inner(bytes).inspect_err(|err| trace!("Rejected setup packet {:x?}: {}", bytes, err))
    }

    fn decode_inner(bytes: &[u8]) -> Result<SetupPacket, SetupError> {
        let bytes: &[u8; SETUP_PACKET_SIZE] =
            bytes.try_into().map_err(|_| SetupError::InvalidLength(bytes.len()))?;

        /*
         * The kind is checked before the recipient, so a reserved kind is always reported as such,
         * whatever the recipient bits hold.
         */
        let request_type = RequestType::from_bits(bytes[0]);
        let kind = request_type.try_get(RequestType::KIND)?;
        let recipient = request_type.try_get(RequestType::RECIPIENT)?;
        let direction = request_type.try_get(RequestType::DIRECTION)?;

        Ok(SetupPacket {
            recipient,
            kind,
            direction,
            request: bytes[1],
            value: u16::from_le_bytes([bytes[2], bytes[3]]),
            index: u16::from_le_bytes([bytes[4], bytes[5]]),
            length: u16::from_le_bytes([bytes[6], bytes[7]]),
        })
    }

    pub fn encode(&self) -> [u8; SETUP_PACKET_SIZE] {
        let mut bytes = [0u8; SETUP_PACKET_SIZE];
        bytes[0] = self.request_type_byte();
        bytes[1] = self.request;
        bytes[2..4].copy_from_slice(&self.value.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.index.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.length.to_le_bytes());
        bytes
    }

    pub fn request_type(&self) -> RequestType {
        RequestType::new()
            .with(RequestType::RECIPIENT, self.recipient)
            .with(RequestType::KIND, self.kind)
            .with(RequestType::DIRECTION, self.direction)
    }

    pub fn request_type_byte(&self) -> u8 {
        self.request_type().bits()
    }

    /// The standard request this packet makes, if it is a standard request with a known code.
    pub fn standard_request(&self) -> Option<StandardRequest> {
        match self.kind {
            RequestKind::Standard => StandardRequest::from_code(self.request),
            _ => None,
        }
    }

    pub fn has_data_stage(&self) -> bool {
        self.length != 0
    }

    /*
     * Constructors for the standard requests. Recipients, directions, and data stage lengths are
     * fixed by section 9.4 of the USB 2.0 specification.
     */
    fn standard(
        recipient: Recipient,
        direction: Direction,
        request: StandardRequest,
        value: u16,
        index: u16,
        length: u16,
    ) -> SetupPacket {
        let request = request.into();
        SetupPacket { recipient, kind: RequestKind::Standard, direction, request, value, index, length }
    }

    pub fn get_status(recipient: Recipient, index: u16) -> SetupPacket {
        Self::standard(recipient, Direction::DeviceToHost, StandardRequest::GetStatus, 0, index, 2)
    }

    pub fn clear_feature(recipient: Recipient, feature: u16, index: u16) -> SetupPacket {
        Self::standard(recipient, Direction::HostToDevice, StandardRequest::ClearFeature, feature, index, 0)
    }

    pub fn set_feature(recipient: Recipient, feature: u16, index: u16) -> SetupPacket {
        Self::standard(recipient, Direction::HostToDevice, StandardRequest::SetFeature, feature, index, 0)
    }

    pub fn set_address(address: u8) -> SetupPacket {
        let address = address as u16;
        Self::standard(Recipient::Device, Direction::HostToDevice, StandardRequest::SetAddress, address, 0, 0)
    }

    /// Request `length` bytes of the descriptor of type `typ` at `index`. `language_id` is only
    /// used for string descriptors, and should be `0` otherwise.
    pub fn get_descriptor(typ: DescriptorType, index: u8, language_id: u16, length: u16) -> SetupPacket {
        Self::standard(
            Recipient::Device,
            Direction::DeviceToHost,
            StandardRequest::GetDescriptor,
            descriptor_value(typ, index),
            language_id,
            length,
        )
    }

    pub fn set_descriptor(typ: DescriptorType, index: u8, language_id: u16, length: u16) -> SetupPacket {
        Self::standard(
            Recipient::Device,
            Direction::HostToDevice,
            StandardRequest::SetDescriptor,
            descriptor_value(typ, index),
            language_id,
            length,
        )
    }

    pub fn get_configuration() -> SetupPacket {
        Self::standard(Recipient::Device, Direction::DeviceToHost, StandardRequest::GetConfiguration, 0, 0, 1)
    }

    pub fn set_configuration(configuration: u8) -> SetupPacket {
        Self::standard(
            Recipient::Device,
            Direction::HostToDevice,
            StandardRequest::SetConfiguration,
            configuration as u16,
            0,
            0,
        )
    }

    pub fn get_interface(interface: u16) -> SetupPacket {
        Self::standard(
            Recipient::Interface,
            Direction::DeviceToHost,
            StandardRequest::GetInterface,
            0,
            interface,
            1,
        )
    }

    pub fn set_interface(interface: u16, alternate_setting: u16) -> SetupPacket {
        Self::standard(
            Recipient::Interface,
            Direction::HostToDevice,
            StandardRequest::SetInterface,
            alternate_setting,
            interface,
            0,
        )
    }

    pub fn sync_frame(endpoint: u16) -> SetupPacket {
        Self::standard(Recipient::Endpoint, Direction::DeviceToHost, StandardRequest::SyncFrame, 0, endpoint, 2)
    }
}

impl TryFrom<&[u8]> for SetupPacket {
    type Error = SetupError;

    fn try_from(bytes: &[u8]) -> Result<SetupPacket, SetupError> {
        SetupPacket::decode(bytes)
    }
}

impl From<SetupPacket> for [u8; SETUP_PACKET_SIZE] {
    fn from(packet: SetupPacket) -> [u8; SETUP_PACKET_SIZE] {
        packet.encode()
    }
}

/// The descriptor type goes in the high byte of `wValue`, and the descriptor index in the low byte.
fn descriptor_value(typ: DescriptorType, index: u8) -> u16 {
    u16::from_le_bytes([index, typ as u8])
}

/// Builds a [`SetupPacket`] field by field. The request kind can be given as a raw code (e.g. one
/// that came from a configuration table), so building can fail with
/// [`SetupError::InvalidRequestType`].
#[derive(Clone, Copy, Debug)]
pub struct SetupPacketBuilder {
    recipient: Recipient,
    kind: u8,
    direction: Direction,
    request: u8,
    value: u16,
    index: u16,
    length: u16,
}

impl SetupPacketBuilder {
    pub fn new() -> SetupPacketBuilder {
        SetupPacketBuilder {
            recipient: Recipient::Device,
            kind: RequestKind::Standard as u8,
            direction: Direction::HostToDevice,
            request: 0,
            value: 0,
            index: 0,
            length: 0,
        }
    }

    pub fn recipient(self, recipient: Recipient) -> Self {
        SetupPacketBuilder { recipient, ..self }
    }

    pub fn kind(self, kind: RequestKind) -> Self {
        SetupPacketBuilder { kind: kind as u8, ..self }
    }

    pub fn kind_code(self, kind: u8) -> Self {
        SetupPacketBuilder { kind, ..self }
    }

    pub fn direction(self, direction: Direction) -> Self {
        SetupPacketBuilder { direction, ..self }
    }

    /// Accepts either a [`StandardRequest`] or a raw class- or vendor-defined code.
    pub fn request(self, request: impl Into<u8>) -> Self {
        SetupPacketBuilder { request: request.into(), ..self }
    }

    pub fn value(self, value: u16) -> Self {
        SetupPacketBuilder { value, ..self }
    }

    pub fn index(self, index: u16) -> Self {
        SetupPacketBuilder { index, ..self }
    }

    pub fn length(self, length: u16) -> Self {
        SetupPacketBuilder { length, ..self }
    }

    pub fn build(self) -> Result<SetupPacket, SetupError> {
        Ok(SetupPacket {
            recipient: self.recipient,
            kind: RequestKind::from_code(self.kind)?,
            direction: self.direction,
            request: self.request,
            value: self.value,
            index: self.index,
            length: self.length,
        })
    }

    pub fn encode(self) -> Result<[u8; SETUP_PACKET_SIZE], SetupError> {
        Ok(self.build()?.encode())
    }
}

impl Default for SetupPacketBuilder {
    fn default() -> Self {
        SetupPacketBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_type_layout() {
        let packet = SetupPacketBuilder::new()
            .recipient(Recipient::Endpoint)
            .kind(RequestKind::Vendor)
            .direction(Direction::DeviceToHost)
            .build()
            .unwrap();
        assert_eq!(packet.request_type_byte(), 0b1_10_00010);

        let packet =
            SetupPacketBuilder::new().recipient(Recipient::Other).kind(RequestKind::Class).build().unwrap();
        assert_eq!(packet.request_type_byte(), 0b0_01_00011);
    }

    #[test]
    fn get_device_descriptor() {
        let bytes = SetupPacketBuilder::new()
            .recipient(Recipient::Device)
            .kind(RequestKind::Standard)
            .direction(Direction::DeviceToHost)
            .request(StandardRequest::GetDescriptor)
            .value(0x0100)
            .index(0x0000)
            .length(0x0012)
            .encode()
            .unwrap();
        assert_eq!(bytes, [0x80, 0x06, 0x00, 0x01, 0x00, 0x00, 0x12, 0x00]);
        assert_eq!(SetupPacket::get_descriptor(DescriptorType::Device, 0, 0, 0x12).encode(), bytes);
    }

    #[test]
    fn set_configuration() {
        let packet = SetupPacket::decode(&[0x00, 0x09, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(
            packet,
            SetupPacket {
                recipient: Recipient::Device,
                kind: RequestKind::Standard,
                direction: Direction::HostToDevice,
                request: StandardRequest::SetConfiguration as u8,
                value: 1,
                index: 0,
                length: 0,
            }
        );
        assert_eq!(packet, SetupPacket::set_configuration(1));
        assert_eq!(packet.standard_request(), Some(StandardRequest::SetConfiguration));
        assert!(!packet.has_data_stage());
    }

    #[test]
    fn reserved_request_type() {
        assert_eq!(SetupPacketBuilder::new().kind_code(3).encode(), Err(SetupError::InvalidRequestType(3)));
        assert_eq!(SetupPacketBuilder::new().kind_code(0xff).build(), Err(SetupError::InvalidRequestType(0xff)));
        assert_eq!(SetupPacket::decode(&[0x60, 0, 0, 0, 0, 0, 0, 0]), Err(SetupError::UnknownRequestType));
        assert_eq!(SetupPacket::decode(&[0xe1, 0, 0, 0, 0, 0, 0, 0]), Err(SetupError::UnknownRequestType));
    }

    #[test]
    fn reserved_request_type_takes_precedence_over_recipient() {
        for request_type in [0x64, 0x7f, 0xe4, 0xff] {
            let bytes = [request_type, 0, 0, 0, 0, 0, 0, 0];
            assert_eq!(SetupPacket::decode(&bytes), Err(SetupError::UnknownRequestType));
        }
    }

    #[test]
    fn reserved_recipient() {
        assert_eq!(SetupPacket::decode(&[0x04, 0, 0, 0, 0, 0, 0, 0]), Err(SetupError::ReservedRecipient(4)));
        assert_eq!(SetupPacket::decode(&[0x9f, 0, 0, 0, 0, 0, 0, 0]), Err(SetupError::ReservedRecipient(0x1f)));
    }

    #[test]
    fn wrong_length() {
        assert_eq!(SetupPacket::decode(&[0; 7]), Err(SetupError::InvalidLength(7)));
        assert_eq!(SetupPacket::decode(&[0; 9]), Err(SetupError::InvalidLength(9)));
        assert_eq!(SetupPacket::decode(&[]), Err(SetupError::InvalidLength(0)));
    }

    #[test]
    fn fields_are_little_endian() {
        let packet = SetupPacketBuilder::new()
            .kind(RequestKind::Vendor)
            .request(0xa5u8)
            .value(0x1234)
            .index(0xabcd)
            .length(0xfffe)
            .build()
            .unwrap();
        assert_eq!(packet.encode(), [0x40, 0xa5, 0x34, 0x12, 0xcd, 0xab, 0xfe, 0xff]);
        assert_eq!(packet.standard_request(), None);
    }

    #[test]
    fn standard_constructors() {
        assert_eq!(SetupPacket::set_address(0x2a).encode(), [0x00, 0x05, 0x2a, 0x00, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(SetupPacket::get_configuration().encode(), [0x80, 0x08, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(
            SetupPacket::get_status(Recipient::Endpoint, 0x81).encode(),
            [0x82, 0x00, 0x00, 0x00, 0x81, 0x00, 0x02, 0x00]
        );
        assert_eq!(
            SetupPacket::clear_feature(Recipient::Endpoint, 0, 0x01).encode(),
            [0x02, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00]
        );
        assert_eq!(
            SetupPacket::set_feature(Recipient::Device, 1, 0).encode(),
            [0x00, 0x03, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]
        );
        assert_eq!(
            SetupPacket::get_descriptor(DescriptorType::String, 2, 0x0409, 0xff).encode(),
            [0x80, 0x06, 0x02, 0x03, 0x09, 0x04, 0xff, 0x00]
        );
        assert_eq!(
            SetupPacket::set_descriptor(DescriptorType::Configuration, 0, 0, 9).encode(),
            [0x00, 0x07, 0x00, 0x02, 0x00, 0x00, 0x09, 0x00]
        );
        assert_eq!(SetupPacket::get_interface(1).encode(), [0x81, 0x0a, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00]);
        assert_eq!(SetupPacket::set_interface(1, 2).encode(), [0x01, 0x0b, 0x02, 0x00, 0x01, 0x00, 0x00, 0x00]);
        assert_eq!(SetupPacket::sync_frame(0x83).encode(), [0x82, 0x0c, 0x00, 0x00, 0x83, 0x00, 0x02, 0x00]);
    }

    #[test]
    fn standard_request_codes() {
        for code in 0..=u8::MAX {
            match StandardRequest::from_code(code) {
                Some(request) => assert_eq!(u8::from(request), code),
                None => assert!(matches!(code, 2 | 4 | 13..=255)),
            }
        }
    }
}
