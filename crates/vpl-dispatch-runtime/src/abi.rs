//! C layouts shared with implementation runtimes and C callers.
//!
//! Capability descriptions cross the boundary as one fixed header followed
//! by nested `(count, pointer)` arrays. [`read_description`] copies such a
//! tree into an owned [`ImplDescription`]; the reverse direction lives in the
//! C surface crate, which owns the memory it hands out.

use std::ffi::{CStr, c_char, c_void};
use vpl_dispatch_kernel::descriptor::{
    CodecProfile, DecoderCodec, DeviceDescription, EncoderCodec, ImplDescription, ImplType,
    MemoryDescription, VppFilter, VppFormat, VppMemoryDescription,
};
use vpl_dispatch_kernel::{ApiVersion, Range32U};

/// `MFXQueryImplDescription` format selecting the capability tree.
pub const FORMAT_IMPL_DESCRIPTION: u32 = 1;
/// `MFXQueryImplDescription` format selecting the implemented-function list.
pub const FORMAT_IMPLEMENTED_FUNCTIONS: u32 = 2;

pub const IMPL_NAME_LEN: usize = 32;
pub const STR_FIELD_LEN: usize = 128;
pub const DEVICE_ID_LEN: usize = 32;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawStructVersion {
    pub minor: u8,
    pub major: u8,
}

impl RawStructVersion {
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { minor, major }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawVersion {
    pub minor: u16,
    pub major: u16,
}

impl From<RawVersion> for ApiVersion {
    fn from(v: RawVersion) -> Self {
        ApiVersion::new(v.major, v.minor)
    }
}

impl From<ApiVersion> for RawVersion {
    fn from(v: ApiVersion) -> Self {
        RawVersion {
            minor: v.minor,
            major: v.major,
        }
    }
}

/// Payload of a [`RawVariant`].
#[repr(C)]
#[derive(Clone, Copy)]
pub union RawVariantData {
    pub u8: u8,
    pub i8: i8,
    pub u16: u16,
    pub i16: i16,
    pub u32: u32,
    pub i32: i32,
    pub u64: u64,
    pub i64: i64,
    pub f32: f32,
    pub f64: f64,
    pub ptr: *mut c_void,
}

/// Tagged filter value as passed to `MFXSetConfigFilterProperty`.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct RawVariant {
    pub version: RawStructVersion,
    /// A [`vpl_dispatch_kernel::VariantType`] tag.
    pub type_tag: u32,
    pub data: RawVariantData,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawDeviceDescription {
    pub version: RawStructVersion,
    pub reserved: [u16; 6],
    pub media_adapter_type: u16,
    pub device_id: [c_char; DEVICE_ID_LEN],
    pub num_sub_devices: u16,
    pub sub_devices: *mut c_void,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawMemoryDescription {
    pub mem_handle_type: u32,
    pub width: Range32U,
    pub height: Range32U,
    pub reserved: [u16; 7],
    pub num_color_formats: u16,
    pub color_formats: *mut u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawCodecProfile {
    pub profile: u32,
    pub reserved: [u16; 7],
    pub num_mem_types: u16,
    pub mem_desc: *mut RawMemoryDescription,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawDecoderCodec {
    pub codec_id: u32,
    pub reserved: [u16; 8],
    pub max_codec_level: u16,
    pub num_profiles: u16,
    pub profiles: *mut RawCodecProfile,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawDecoderDescription {
    pub version: RawStructVersion,
    pub reserved: [u16; 7],
    pub num_codecs: u16,
    pub codecs: *mut RawDecoderCodec,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawEncoderCodec {
    pub codec_id: u32,
    pub max_codec_level: u16,
    pub bidirectional_prediction: u16,
    pub reserved: [u16; 7],
    pub num_profiles: u16,
    pub profiles: *mut RawCodecProfile,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawEncoderDescription {
    pub version: RawStructVersion,
    pub reserved: [u16; 7],
    pub num_codecs: u16,
    pub codecs: *mut RawEncoderCodec,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawVppFormat {
    pub in_format: u32,
    pub reserved: [u16; 5],
    pub num_out_formats: u16,
    pub out_formats: *mut u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawVppMemoryDescription {
    pub mem_handle_type: u32,
    pub width: Range32U,
    pub height: Range32U,
    pub reserved: [u16; 6],
    pub num_in_formats: u16,
    pub formats: *mut RawVppFormat,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawVppFilter {
    pub filter_fourcc: u32,
    pub max_delay_in_frames: u16,
    pub reserved: [u16; 6],
    pub num_mem_types: u16,
    pub mem_desc: *mut RawVppMemoryDescription,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawVppDescription {
    pub version: RawStructVersion,
    pub reserved: [u16; 7],
    pub num_filters: u16,
    pub filters: *mut RawVppFilter,
}

/// Fixed header of a capability description.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawImplDescription {
    pub version: RawStructVersion,
    pub impl_type: u32,
    pub acceleration_mode: u32,
    pub api_version: RawVersion,
    pub impl_name: [c_char; IMPL_NAME_LEN],
    pub license: [c_char; STR_FIELD_LEN],
    pub keywords: [c_char; STR_FIELD_LEN],
    pub vendor_id: u32,
    pub vendor_impl_id: u32,
    pub dev: RawDeviceDescription,
    pub dec: RawDecoderDescription,
    pub enc: RawEncoderDescription,
    pub vpp: RawVppDescription,
    pub pool_policy: u32,
    pub reserved: [u32; 8],
    pub num_ext_param: u32,
    pub ext_param: *mut c_void,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawImplementedFunctions {
    pub num_functions: u16,
    pub function_names: *mut *mut c_char,
}

/// Parameters of `MFXInitEx`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawInitParam {
    pub implementation: u32,
    pub version: RawVersion,
    pub external_threads: u16,
    pub ext_param: *mut c_void,
    pub num_ext_param: u16,
    pub gpu_copy: u16,
    pub reserved: [u16; 21],
}

/// Signature of `MFXQueryImplDescription`.
pub type QueryImplDescriptionFn = unsafe extern "C" fn(format: u32) -> *mut c_void;
/// Signature of `MFXReleaseImplDescription`.
pub type ReleaseImplDescriptionFn = unsafe extern "C" fn(handle: *mut c_void) -> i32;
/// Signature of `MFXInitEx`.
pub type InitExFn = unsafe extern "C" fn(param: RawInitParam, session: *mut *mut c_void) -> i32;
/// Signature of `MFXClose`.
pub type CloseFn = unsafe extern "C" fn(session: *mut c_void) -> i32;

/// Why a raw description could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum AbiError {
    #[error("description pointer is null")]
    Null,

    #[error("unknown implementation type {0}")]
    UnknownImplType(u32),
}

/// Copy a fixed-size, NUL-padded character field.
pub fn fixed_str(field: &[c_char]) -> String {
    let bytes: Vec<u8> = field
        .iter()
        .map(|&c| c as u8)
        .take_while(|&b| b != 0)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Write `value` into a fixed-size field, truncating so a terminating NUL
/// always fits.
pub fn write_fixed_str(field: &mut [c_char], value: &str) {
    field.fill(0);
    let max = field.len().saturating_sub(1);
    for (dst, &src) in field.iter_mut().zip(value.as_bytes().iter().take(max)) {
        *dst = src as c_char;
    }
}

/// # Safety
/// `ptr` must be null or point to `len` initialized values that outlive `'a`.
unsafe fn slice<'a, T>(ptr: *const T, len: usize) -> &'a [T] {
    if ptr.is_null() || len == 0 {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(ptr, len) }
    }
}

unsafe fn read_mem_desc(raw: &RawMemoryDescription) -> MemoryDescription {
    let formats = unsafe { slice(raw.color_formats, raw.num_color_formats.into()) };
    MemoryDescription::new(raw.mem_handle_type, raw.width, raw.height)
        .with_color_formats(formats.iter().copied())
}

unsafe fn read_profiles(ptr: *const RawCodecProfile, len: u16) -> Vec<CodecProfile> {
    unsafe { slice(ptr, len.into()) }
        .iter()
        .map(|p| {
            let mem = unsafe { slice(p.mem_desc, p.num_mem_types.into()) };
            CodecProfile::new(
                p.profile,
                mem.iter().map(|m| unsafe { read_mem_desc(m) }).collect(),
            )
        })
        .collect()
}

/// Copy a raw capability description into an owned one.
///
/// # Safety
/// `raw` must point to a description whose nested arrays are valid for the
/// counts they are paired with.
pub unsafe fn read_description(raw: *const RawImplDescription) -> Result<ImplDescription, AbiError> {
    let Some(raw) = (unsafe { raw.as_ref() }) else {
        return Err(AbiError::Null);
    };
    let impl_type = ImplType::from_raw(raw.impl_type).ok_or(AbiError::UnknownImplType(raw.impl_type))?;

    let decoders = unsafe { slice(raw.dec.codecs, raw.dec.num_codecs.into()) }
        .iter()
        .map(|c| DecoderCodec {
            codec_id: c.codec_id,
            max_codec_level: c.max_codec_level,
            profiles: unsafe { read_profiles(c.profiles, c.num_profiles) },
        })
        .collect();

    let encoders = unsafe { slice(raw.enc.codecs, raw.enc.num_codecs.into()) }
        .iter()
        .map(|c| EncoderCodec {
            codec_id: c.codec_id,
            max_codec_level: c.max_codec_level,
            bidirectional_prediction: c.bidirectional_prediction,
            profiles: unsafe { read_profiles(c.profiles, c.num_profiles) },
        })
        .collect();

    let vpp_filters = unsafe { slice(raw.vpp.filters, raw.vpp.num_filters.into()) }
        .iter()
        .map(|f| VppFilter {
            filter_fourcc: f.filter_fourcc,
            max_delay_in_frames: f.max_delay_in_frames,
            mem_descs: unsafe { slice(f.mem_desc, f.num_mem_types.into()) }
                .iter()
                .map(|m| VppMemoryDescription {
                    mem_handle_type: m.mem_handle_type,
                    width: m.width,
                    height: m.height,
                    formats: unsafe { slice(m.formats, m.num_in_formats.into()) }
                        .iter()
                        .map(|fmt| VppFormat {
                            in_format: fmt.in_format,
                            out_formats: unsafe { slice(fmt.out_formats, fmt.num_out_formats.into()) }
                                .to_vec(),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    Ok(ImplDescription {
        impl_type,
        acceleration_mode: raw.acceleration_mode,
        api_version: raw.api_version.into(),
        impl_name: fixed_str(&raw.impl_name),
        license: fixed_str(&raw.license),
        keywords: fixed_str(&raw.keywords),
        vendor_id: raw.vendor_id,
        vendor_impl_id: raw.vendor_impl_id,
        pool_policy: raw.pool_policy,
        device: DeviceDescription {
            device_id: fixed_str(&raw.dev.device_id),
            media_adapter_type: raw.dev.media_adapter_type,
        },
        decoders,
        encoders,
        vpp_filters,
        implemented_functions: Vec::new(),
    })
}

/// Copy a raw implemented-function list. Null entries are skipped.
///
/// # Safety
/// `raw` must be null or point to a list whose name pointers are valid
/// NUL-terminated strings.
pub unsafe fn read_implemented_functions(raw: *const RawImplementedFunctions) -> Vec<String> {
    let Some(raw) = (unsafe { raw.as_ref() }) else {
        return Vec::new();
    };
    unsafe { slice(raw.function_names.cast_const(), raw.num_functions.into()) }
        .iter()
        .filter(|name| !name.is_null())
        .map(|&name| unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned())
        .collect()
}
