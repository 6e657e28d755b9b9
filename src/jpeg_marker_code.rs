use crate::error::JpeglsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum JpegMarkerCode {
    /// SOF_0: Start of frame, baseline DCT.
    StartOfFrameBaseline = 0xC0,
    /// SOF_1: Start of frame, extended sequential DCT.
    StartOfFrameExtended = 0xC1,
    /// SOF_2: Start of frame, progressive DCT.
    StartOfFrameProgressive = 0xC2,
    /// SOF_3: Start of frame, lossless (sequential), used by JPEG Lossless predictive coding.
    StartOfFrameLossless = 0xC3,

    /// RST0-RST7: Restart markers.
    Restart0 = 0xD0,
    Restart1 = 0xD1,
    Restart2 = 0xD2,
    Restart3 = 0xD3,
    Restart4 = 0xD4,
    Restart5 = 0xD5,
    Restart6 = 0xD6,
    Restart7 = 0xD7,

    /// SOI: Marks the start of an image.
    StartOfImage = 0xD8,

    /// EOI: Marks the end of an image.
    EndOfImage = 0xD9,

    /// SOS: Marks the start of scan.
    StartOfScan = 0xDA,

    /// DNL: Defines the number of lines in a scan.
    DefineNumberOfLines = 0xDC,

    /// DRI: Defines the restart interval used in succeeding scans.
    DefineRestartInterval = 0xDD,

    /// APP0: Application data 0: used for JFIF header.
    ApplicationData0 = 0xE0,
    /// APP1: Application data 1: used for EXIF or XMP header.
    ApplicationData1 = 0xE1,
    /// APP2: Application data 2: used for ICC profile.
    ApplicationData2 = 0xE2,
    /// APP3: Application data 3: used for meta info
    ApplicationData3 = 0xE3,
    /// APP4: Application data 4.
    ApplicationData4 = 0xE4,
    /// APP5: Application data 5.
    ApplicationData5 = 0xE5,
    /// APP6: Application data 6.
    ApplicationData6 = 0xE6,
    /// APP7: Application data 7: used for HP color-space info.
    ApplicationData7 = 0xE7,
    /// APP8: Application data 8: used for HP color-transformation info or SPIFF header.
    ApplicationData8 = 0xE8,
    /// APP9: Application data 9.
    ApplicationData9 = 0xE9,
    /// APP10: Application data 10.
    ApplicationData10 = 0xEA,
    /// APP11: Application data 11.
    ApplicationData11 = 0xEB,
    /// APP12: Application data 12: used for Picture info.
    ApplicationData12 = 0xEC,
    /// APP13: Application data 13: used by PhotoShop IRB
    ApplicationData13 = 0xED,
    /// APP14: Application data 14: used by Adobe
    ApplicationData14 = 0xEE,
    /// APP15: Application data 15.
    ApplicationData15 = 0xEF,

    /// COM: Comment block.
    Comment = 0xFE,

    // The following markers are defined in ISO/IEC 14495-1 | ITU T.87. (JPEG-LS standard)
    /// SOF_55: Marks the start of a JPEG-LS encoded frame.
    StartOfFrameJpegls = 0xF7,

    /// LSE: Marks the start of a JPEG-LS preset parameters segment.
    JpeglsPresetParameters = 0xF8,

    // The following markers are defined in ISO/IEC 15444-1 (JPEG 2000 codestream).
    /// SOC: Start of codestream.
    StartOfCodestream = 0x4F,
    /// CAP: Extended capabilities (Part 15 / HTJ2K signalling).
    Capability = 0x50,
    /// SIZ: Image and tile size.
    ImageAndTileSize = 0x51,
    /// COD: Coding style default.
    CodingStyleDefault = 0x52,
    /// COC: Coding style component.
    CodingStyleComponent = 0x53,
    /// QCD: Quantization default.
    QuantizationDefault = 0x5C,
    /// QCC: Quantization component.
    QuantizationComponent = 0x5D,
    /// RGN: Region of interest.
    RegionOfInterest = 0x5E,
    /// POC: Progression order change.
    ProgressionOrderChange = 0x5F,
    /// COM (J2K): Codestream comment.
    J2kComment = 0x64,
    /// SOT: Start of tile-part.
    StartOfTile = 0x90,
    /// SOD: Start of data (tile-part bitstream).
    StartOfData = 0x93,
}

impl std::convert::TryFrom<u8> for JpegMarkerCode {
    type Error = JpeglsError;
    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0xC0 => Ok(Self::StartOfFrameBaseline),
            0xC1 => Ok(Self::StartOfFrameExtended),
            0xC2 => Ok(Self::StartOfFrameProgressive),
            0xC3 => Ok(Self::StartOfFrameLossless),
            0xD0 => Ok(Self::Restart0),
            0xD1 => Ok(Self::Restart1),
            0xD2 => Ok(Self::Restart2),
            0xD3 => Ok(Self::Restart3),
            0xD4 => Ok(Self::Restart4),
            0xD5 => Ok(Self::Restart5),
            0xD6 => Ok(Self::Restart6),
            0xD7 => Ok(Self::Restart7),
            0xD8 => Ok(Self::StartOfImage),
            0xD9 => Ok(Self::EndOfImage),
            0xDA => Ok(Self::StartOfScan),
            0xDC => Ok(Self::DefineNumberOfLines),
            0xDD => Ok(Self::DefineRestartInterval),
            0xE0 => Ok(Self::ApplicationData0),
            0xE1 => Ok(Self::ApplicationData1),
            0xE2 => Ok(Self::ApplicationData2),
            0xE3 => Ok(Self::ApplicationData3),
            0xE4 => Ok(Self::ApplicationData4),
            0xE5 => Ok(Self::ApplicationData5),
            0xE6 => Ok(Self::ApplicationData6),
            0xE7 => Ok(Self::ApplicationData7),
            0xE8 => Ok(Self::ApplicationData8),
            0xE9 => Ok(Self::ApplicationData9),
            0xEA => Ok(Self::ApplicationData10),
            0xEB => Ok(Self::ApplicationData11),
            0xEC => Ok(Self::ApplicationData12),
            0xED => Ok(Self::ApplicationData13),
            0xEE => Ok(Self::ApplicationData14),
            0xEF => Ok(Self::ApplicationData15),
            0xFE => Ok(Self::Comment),
            0xF7 => Ok(Self::StartOfFrameJpegls),
            0xF8 => Ok(Self::JpeglsPresetParameters),
            0x4F => Ok(Self::StartOfCodestream),
            0x50 => Ok(Self::Capability),
            0x51 => Ok(Self::ImageAndTileSize),
            0x52 => Ok(Self::CodingStyleDefault),
            0x53 => Ok(Self::CodingStyleComponent),
            0x5C => Ok(Self::QuantizationDefault),
            0x5D => Ok(Self::QuantizationComponent),
            0x5E => Ok(Self::RegionOfInterest),
            0x5F => Ok(Self::ProgressionOrderChange),
            0x64 => Ok(Self::J2kComment),
            0x90 => Ok(Self::StartOfTile),
            0x93 => Ok(Self::StartOfData),
            _ => Err(JpeglsError::InvalidData),
        }
    }
}

pub const JPEG_MARKER_START_BYTE: u8 = 0xFF;
pub const JPEG_RESTART_MARKER_BASE: u8 = 0xD0;
pub const JPEG_RESTART_MARKER_RANGE: u8 = 8;
