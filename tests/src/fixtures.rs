//! Capability descriptions of typical implementations.

use vpl_dispatch_kernel::codes::{acceleration, codec, color, resource, vendor, vpp};
use vpl_dispatch_kernel::descriptor::{
    CodecProfile, DecoderCodec, EncoderCodec, ImplDescription, ImplType, MemoryDescription,
    VppFilter, VppFormat, VppMemoryDescription,
};
use vpl_dispatch_kernel::{ApiVersion, Range32U};

pub const CPU_IMPL_NAME: &str = "oneAPI VPL CPU Reference Impl";
pub const GPU_IMPL_NAME: &str = "mfx-gen";

/// Surface range advertised by the software reference implementation.
pub const CPU_SURFACE_RANGE: Range32U = Range32U::new(64, 4096, 8);

fn cpu_surface() -> MemoryDescription {
    MemoryDescription::new(resource::SYSTEM_SURFACE, CPU_SURFACE_RANGE, CPU_SURFACE_RANGE)
        .with_color_formats([color::I420, color::I010])
}

fn gpu_surface() -> MemoryDescription {
    let range = Range32U::new(16, 16384, 16);
    MemoryDescription::new(resource::VA_SURFACE, range, range)
        .with_color_formats([color::NV12, color::P010])
}

/// The software reference implementation.
pub fn cpu_reference(api_version: ApiVersion) -> ImplDescription {
    let mut desc = ImplDescription::new(CPU_IMPL_NAME, ImplType::Software, api_version)
        .with_acceleration_mode(acceleration::NA)
        .with_license("MIT")
        .with_keywords("CPU,software,reference")
        .with_vendor(vendor::INTEL, 0)
        .with_device("0000", 0)
        .with_functions([
            "MFXInitEx",
            "MFXClose",
            "MFXQueryIMPL",
            "MFXQueryVersion",
            "MFXVideoDECODE_Init",
            "MFXVideoDECODE_DecodeFrameAsync",
            "MFXVideoENCODE_Init",
            "MFXVideoVPP_Init",
        ]);

    for id in [codec::AV1, codec::AVC, codec::HEVC, codec::JPEG, codec::MPEG2] {
        desc = desc.with_decoder(
            DecoderCodec::new(id, 51).with_profile(CodecProfile::new(0, vec![cpu_surface()])),
        );
    }
    for id in [codec::AV1, codec::AVC, codec::HEVC, codec::JPEG] {
        desc = desc.with_encoder(
            EncoderCodec::new(id, 51)
                .with_bidirectional_prediction(id != codec::JPEG)
                .with_profile(CodecProfile::new(0, vec![cpu_surface()])),
        );
    }
    desc.with_vpp_filter(VppFilter::new(vpp::SCALING, 0).with_mem_desc(VppMemoryDescription {
        mem_handle_type: resource::SYSTEM_SURFACE,
        width: CPU_SURFACE_RANGE,
        height: CPU_SURFACE_RANGE,
        formats: vec![VppFormat {
            in_format: color::I420,
            out_formats: vec![color::I420, color::I010, color::RGB4],
        }],
    }))
}

/// A hardware implementation on a VA-API device.
pub fn gpu(api_version: ApiVersion) -> ImplDescription {
    let mut desc = ImplDescription::new(GPU_IMPL_NAME, ImplType::Hardware, api_version)
        .with_acceleration_mode(acceleration::VAAPI)
        .with_license("MIT")
        .with_keywords("GPU;hardware")
        .with_vendor(vendor::INTEL, 1)
        .with_device("56a0", 1)
        .with_functions(["MFXInitEx", "MFXClose", "MFXVideoDECODE_Init", "MFXVideoENCODE_Init"]);

    for id in [codec::AVC, codec::HEVC, codec::VP9, codec::AV1] {
        desc = desc.with_decoder(
            DecoderCodec::new(id, 62).with_profile(CodecProfile::new(1, vec![gpu_surface()])),
        );
    }
    for id in [codec::AVC, codec::HEVC] {
        desc = desc.with_encoder(
            EncoderCodec::new(id, 62)
                .with_bidirectional_prediction(true)
                .with_profile(CodecProfile::new(1, vec![gpu_surface()])),
        );
    }
    desc
}

/// A minimal implementation decoding exactly one codec.
pub fn single_decoder(name: &str, impl_type: ImplType, api_version: ApiVersion, codec_id: u32) -> ImplDescription {
    ImplDescription::new(name, impl_type, api_version)
        .with_decoder(DecoderCodec::new(codec_id, 51).with_profile(CodecProfile::new(0, vec![cpu_surface()])))
}

/// Parse a description written as JSON.
pub fn from_json(json: &str) -> ImplDescription {
    match serde_json::from_str(json) {
        Ok(desc) => desc,
        Err(err) => panic!("invalid description fixture: {err}"),
    }
}
