//! Well-known numeric identifiers used in capability descriptors and filters.

/// Pack four ASCII bytes into a little-endian fourcc code.
pub const fn make_fourcc(code: &[u8; 4]) -> u32 {
    (code[0] as u32) | (code[1] as u32) << 8 | (code[2] as u32) << 16 | (code[3] as u32) << 24
}

pub mod codec {
    use super::make_fourcc;

    pub const AVC: u32 = make_fourcc(b"AVC ");
    pub const HEVC: u32 = make_fourcc(b"HEVC");
    pub const MPEG2: u32 = make_fourcc(b"MPG2");
    pub const VC1: u32 = make_fourcc(b"VC1 ");
    pub const VP8: u32 = make_fourcc(b"VP8 ");
    pub const VP9: u32 = make_fourcc(b"VP9 ");
    pub const AV1: u32 = make_fourcc(b"AV1 ");
    pub const JPEG: u32 = make_fourcc(b"JPEG");
}

pub mod color {
    use super::make_fourcc;

    pub const NV12: u32 = make_fourcc(b"NV12");
    pub const I420: u32 = make_fourcc(b"I420");
    pub const I010: u32 = make_fourcc(b"I010");
    pub const P010: u32 = make_fourcc(b"P010");
    pub const YUY2: u32 = make_fourcc(b"YUY2");
    pub const RGB4: u32 = make_fourcc(b"RGB4");
}

pub mod vpp {
    use super::make_fourcc;

    pub const DENOISE: u32 = make_fourcc(b"DNIS");
    pub const SCALING: u32 = make_fourcc(b"VSCL");
    pub const COLOR_CONVERSION: u32 = make_fourcc(b"VCSC");
    pub const PROCAMP: u32 = make_fourcc(b"PAMP");
}

pub mod resource {
    pub const SYSTEM_SURFACE: u32 = 1;
    pub const VA_SURFACE: u32 = 2;
    pub const VA_BUFFER: u32 = 3;
    pub const DX9_SURFACE: u32 = 4;
    pub const DX11_TEXTURE: u32 = 5;
    pub const DX12_RESOURCE: u32 = 6;
    pub const DMA_RESOURCE: u32 = 7;
}

pub mod acceleration {
    pub const NA: u32 = 0;
    pub const D3D11: u32 = 0x0300;
    pub const D3D12: u32 = 0x0400;
    pub const VAAPI: u32 = 0x0500;
    pub const VAAPI_DRM_RENDER_NODE: u32 = 0x0501;
}

pub mod vendor {
    pub const INTEL: u32 = 0x8086;
}
