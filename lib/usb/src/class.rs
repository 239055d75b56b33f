use log::debug;

/// USB base class codes, as found in the `bDeviceClass` and `bInterfaceClass` fields of device
/// and interface descriptors. These are informational, and are not used when building requests.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BaseClass {
    /// The class is defined per-interface, rather than for the whole device.
    None,
    Audio,
    CommCdc,
    Hid,
    Physical,
    Image,
    Printer,
    MassStorage,
    Hub,
    CdcData,
    SmartCard,
    ContentSecurity,
    Video,
    PersonalHealthcare,
    DiagnosticDevice,
    WirelessController,
    Miscellaneous,
    ApplicationSpecific,
    VendorSpecific,
    /// A class code that isn't one of the above.
    Unknown(u8),
}

impl BaseClass {
    pub fn code(self) -> u8 {
        match self {
            BaseClass::None => 0x00,
            BaseClass::Audio => 0x01,
            BaseClass::CommCdc => 0x02,
            BaseClass::Hid => 0x03,
            BaseClass::Physical => 0x05,
            BaseClass::Image => 0x06,
            BaseClass::Printer => 0x07,
            BaseClass::MassStorage => 0x08,
            BaseClass::Hub => 0x09,
            BaseClass::CdcData => 0x0a,
            BaseClass::SmartCard => 0x0b,
            BaseClass::ContentSecurity => 0x0d,
            BaseClass::Video => 0x0e,
            BaseClass::PersonalHealthcare => 0x0f,
            BaseClass::DiagnosticDevice => 0xdc,
            BaseClass::WirelessController => 0xe0,
            BaseClass::Miscellaneous => 0xef,
            BaseClass::ApplicationSpecific => 0xfe,
            BaseClass::VendorSpecific => 0xff,
            BaseClass::Unknown(code) => code,
        }
    }

    pub fn is_known(self) -> bool {
        !matches!(self, BaseClass::Unknown(_))
    }
}

impl From<u8> for BaseClass {
    fn from(code: u8) -> BaseClass {
        classify(code)
    }
}

/// Map a raw class code to a `BaseClass`. Codes we don't know about are returned as
/// `BaseClass::Unknown`, so this never fails.
pub fn classify(code: u8) -> BaseClass {
    match code {
        0x00 => BaseClass::None,
        0x01 => BaseClass::Audio,
        0x02 => BaseClass::CommCdc,
        0x03 => BaseClass::Hid,
        0x05 => BaseClass::Physical,
        0x06 => BaseClass::Image,
        0x07 => BaseClass::Printer,
        0x08 => BaseClass::MassStorage,
        0x09 => BaseClass::Hub,
        0x0a => BaseClass::CdcData,
        0x0b => BaseClass::SmartCard,
        0x0d => BaseClass::ContentSecurity,
        0x0e => BaseClass::Video,
        0x0f => BaseClass::PersonalHealthcare,
        0xdc => BaseClass::DiagnosticDevice,
        0xe0 => BaseClass::WirelessController,
        0xef => BaseClass::Miscellaneous,
        0xfe => BaseClass::ApplicationSpecific,
        0xff => BaseClass::VendorSpecific,
        other => {
            debug!("Unrecognised USB base class: {:#x}", other);
            BaseClass::Unknown(other)
        }
    }
}
