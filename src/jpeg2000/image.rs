//! Data structures describing a parsed/constructed JPEG 2000 codestream:
//! main header metadata, per-tile-component coefficient buffers, subbands
//! and code-blocks.

#[derive(Debug, Clone, Default)]
pub struct J2kImage {
    pub width: u32,
    pub height: u32,
    pub x_origin: u32,
    pub y_origin: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tile_x_origin: u32,
    pub tile_y_origin: u32,
    pub component_count: u32,
    pub components: Vec<J2kComponentInfo>,
    pub cod: Option<J2kCod>,
    pub qcd: Option<J2kQcd>,
    pub cap: Option<J2kCap>,
    pub roi: Option<J2kRoi>,
    /// Per-component coding-style overrides from COC marker segments.
    pub coc_overrides: Vec<(u16, J2kCod)>,
    /// Per-component quantization overrides from QCC marker segments.
    pub qcc_overrides: Vec<(u16, J2kQcd)>,
    pub icc_profile: Option<Vec<u8>>,
    pub tiles: Vec<J2kTile>,
}

impl J2kImage {
    pub fn tiles_across(&self) -> u32 {
        if self.tile_width == 0 {
            1
        } else {
            (self.width + self.tile_x_origin + self.tile_width - 1) / self.tile_width
        }
    }

    pub fn tiles_down(&self) -> u32 {
        if self.tile_height == 0 {
            1
        } else {
            (self.height + self.tile_y_origin + self.tile_height - 1) / self.tile_height
        }
    }

    pub fn tile_count(&self) -> u32 {
        self.tiles_across() * self.tiles_down()
    }

    /// The effective COD for `component_index`: a COC override if present,
    /// otherwise the main-header COD.
    pub fn cod_for_component(&self, component_index: u16) -> Option<&J2kCod> {
        self.coc_overrides
            .iter()
            .find(|(idx, _)| *idx == component_index)
            .map(|(_, cod)| cod)
            .or(self.cod.as_ref())
    }

    /// The effective QCD for `component_index`: a QCC override if present,
    /// otherwise the main-header QCD.
    pub fn qcd_for_component(&self, component_index: u16) -> Option<&J2kQcd> {
        self.qcc_overrides
            .iter()
            .find(|(idx, _)| *idx == component_index)
            .map(|(_, qcd)| qcd)
            .or(self.qcd.as_ref())
    }

    /// Pixel-space bounds (x0, y0, x1, y1) of a tile, clipped to the image.
    pub fn tile_bounds(&self, tile_index: u32) -> (u32, u32, u32, u32) {
        let across = self.tiles_across();
        let tx = tile_index % across;
        let ty = tile_index / across;
        let x0 = (self.tile_x_origin + tx * self.tile_width).max(self.x_origin);
        let y0 = (self.tile_y_origin + ty * self.tile_height).max(self.y_origin);
        let x1 = (self.tile_x_origin + (tx + 1) * self.tile_width).min(self.x_origin + self.width);
        let y1 = (self.tile_y_origin + (ty + 1) * self.tile_height).min(self.y_origin + self.height);
        (x0, y0, x1, y1)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct J2kComponentInfo {
    pub depth: u8,
    pub is_signed: bool,
    pub dx: u8,
    pub dy: u8,
}

#[derive(Debug, Clone, Default)]
pub struct J2kTile {
    pub index: u32,
    pub components: Vec<J2kTileComponent>,
}

#[derive(Debug, Clone, Default)]
pub struct J2kTileComponent {
    pub component_index: u32,
    pub width: u32,
    pub height: u32,
    pub resolutions: Vec<J2kResolution>,
    /// Reconstructed (or, for the encoder, pre-transform) sample data.
    pub data: Vec<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct J2kResolution {
    pub level: u8,
    pub width: u32,
    pub height: u32,
    pub subbands: Vec<J2kSubband>,
}

#[derive(Debug, Clone, Default)]
pub struct J2kSubband {
    pub orientation: SubbandOrientation,
    pub x0: u32,
    pub y0: u32,
    pub width: u32,
    pub height: u32,
    pub codeblocks: Vec<J2kCodeBlock>,
    /// Quantized coefficients, row-major within the subband.
    pub data: Vec<i32>,
}

impl J2kSubband {
    /// Gain bits added to the nominal dynamic range for this orientation
    /// (Annex E.1 Table E.1: LL=0, HL/LH=1, HH=2).
    pub fn gain_bits(&self) -> u8 {
        self.orientation.gain_bits()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubbandOrientation {
    #[default]
    LL,
    HL,
    LH,
    HH,
}

impl SubbandOrientation {
    pub fn gain_bits(self) -> u8 {
        match self {
            SubbandOrientation::LL => 0,
            SubbandOrientation::HL | SubbandOrientation::LH => 1,
            SubbandOrientation::HH => 2,
        }
    }

    /// Band index used to select a Zero-Coding context table (0=LL/LH, 1=HL, 2=HH).
    pub fn band_index(self) -> u8 {
        match self {
            SubbandOrientation::LL | SubbandOrientation::LH => 0,
            SubbandOrientation::HL => 1,
            SubbandOrientation::HH => 2,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct J2kCodeBlock {
    pub x0: u32,
    pub y0: u32,
    pub width: u32,
    pub height: u32,
    pub compressed_data: Vec<u8>,
    pub zero_bit_planes: u8,
    pub coding_passes: u8,
    pub max_bit_plane: u8,
}

/// Coding Style Default (COD) marker information.
#[derive(Debug, Clone, Default)]
pub struct J2kCod {
    pub coding_style: u8,
    pub progression_order: u8,
    pub number_of_layers: u16,
    pub mct: u8,
    pub decomposition_levels: u8,
    pub codeblock_width_exp: u8,
    pub codeblock_height_exp: u8,
    pub transformation: u8,
    pub precinct_sizes: Vec<u8>,
}

impl J2kCod {
    pub fn codeblock_width(&self) -> u32 {
        1 << (self.codeblock_width_exp + 2).min(10)
    }

    pub fn codeblock_height(&self) -> u32 {
        1 << (self.codeblock_height_exp + 2).min(10)
    }

    /// Transformation byte: 0 = 9-7 irreversible, 1 = 5-3 reversible.
    pub fn is_reversible(&self) -> bool {
        self.transformation == 1
    }
}

/// Quantization Default (QCD) marker information.
#[derive(Debug, Clone, Default)]
pub struct J2kQcd {
    pub quant_style: u8,
    /// One entry per (resolution, subband) in encoding order; each packs
    /// exponent (bits 11..15) and mantissa (bits 0..10) as in the SPqcd field.
    pub step_sizes: Vec<u16>,
}

impl J2kQcd {
    pub fn guard_bits(&self) -> u8 {
        self.quant_style >> 5
    }

    pub fn style(&self) -> u8 {
        self.quant_style & 0x1F
    }
}

/// Capability (CAP) marker information (Part 15).
#[derive(Debug, Clone, Default)]
pub struct J2kCap {
    pub pcap: u32,
    pub ccap: Vec<u16>,
}

/// Region of Interest (RGN) marker information.
#[derive(Debug, Clone, Copy, Default)]
pub struct J2kRoi {
    pub component_index: u8,
    pub roi_style: u8,
    pub shift_value: u8,
}
