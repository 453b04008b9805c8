//! Self-reported capability descriptors.
//!
//! An [`ImplDescription`] is the owned, immutable snapshot an implementation
//! reports about itself at discovery time. Its shape mirrors the property
//! namespace in [`crate::property`]: every filterable leaf corresponds to a
//! field somewhere in this tree.

use crate::variant::Range32U;
use crate::version::ApiVersion;
use serde::{Deserialize, Serialize};

/// Whether an implementation runs on the CPU or on dedicated hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ImplType {
    Software = 1,
    Hardware = 2,
}

impl ImplType {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(ImplType::Software),
            2 => Some(ImplType::Hardware),
            _ => None,
        }
    }
}

/// Device the implementation is bound to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescription {
    pub device_id: String,
    pub media_adapter_type: u16,
}

/// Memory layout a codec profile or filter can work with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryDescription {
    pub mem_handle_type: u32,
    pub width: Range32U,
    pub height: Range32U,
    pub color_formats: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecProfile {
    pub profile: u32,
    pub mem_descs: Vec<MemoryDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderCodec {
    pub codec_id: u32,
    pub max_codec_level: u16,
    pub profiles: Vec<CodecProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderCodec {
    pub codec_id: u32,
    pub max_codec_level: u16,
    pub bidirectional_prediction: u16,
    pub profiles: Vec<CodecProfile>,
}

/// One input format of a VPP filter and what it can be converted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VppFormat {
    pub in_format: u32,
    pub out_formats: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VppMemoryDescription {
    pub mem_handle_type: u32,
    pub width: Range32U,
    pub height: Range32U,
    pub formats: Vec<VppFormat>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VppFilter {
    pub filter_fourcc: u32,
    pub max_delay_in_frames: u16,
    pub mem_descs: Vec<VppMemoryDescription>,
}

/// Capability snapshot of one implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplDescription {
    pub impl_type: ImplType,
    pub acceleration_mode: u32,
    pub api_version: ApiVersion,
    pub impl_name: String,
    pub license: String,
    pub keywords: String,
    pub vendor_id: u32,
    pub vendor_impl_id: u32,
    /// Surface pool allocation policy.
    pub pool_policy: u32,
    pub device: DeviceDescription,
    pub decoders: Vec<DecoderCodec>,
    pub encoders: Vec<EncoderCodec>,
    pub vpp_filters: Vec<VppFilter>,
    pub implemented_functions: Vec<String>,
}

impl ImplDescription {
    pub fn new(impl_name: impl Into<String>, impl_type: ImplType, api_version: ApiVersion) -> Self {
        Self {
            impl_type,
            acceleration_mode: 0,
            api_version,
            impl_name: impl_name.into(),
            license: String::new(),
            keywords: String::new(),
            vendor_id: 0,
            vendor_impl_id: 0,
            pool_policy: 0,
            device: DeviceDescription::default(),
            decoders: Vec::new(),
            encoders: Vec::new(),
            vpp_filters: Vec::new(),
            implemented_functions: Vec::new(),
        }
    }

    pub fn with_acceleration_mode(mut self, mode: u32) -> Self {
        self.acceleration_mode = mode;
        self
    }

    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = license.into();
        self
    }

    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = keywords.into();
        self
    }

    pub fn with_vendor(mut self, vendor_id: u32, vendor_impl_id: u32) -> Self {
        self.vendor_id = vendor_id;
        self.vendor_impl_id = vendor_impl_id;
        self
    }

    pub fn with_pool_policy(mut self, policy: u32) -> Self {
        self.pool_policy = policy;
        self
    }

    pub fn with_device(mut self, device_id: impl Into<String>, media_adapter_type: u16) -> Self {
        self.device = DeviceDescription {
            device_id: device_id.into(),
            media_adapter_type,
        };
        self
    }

    pub fn with_decoder(mut self, decoder: DecoderCodec) -> Self {
        self.decoders.push(decoder);
        self
    }

    pub fn with_encoder(mut self, encoder: EncoderCodec) -> Self {
        self.encoders.push(encoder);
        self
    }

    pub fn with_vpp_filter(mut self, filter: VppFilter) -> Self {
        self.vpp_filters.push(filter);
        self
    }

    pub fn with_functions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.implemented_functions.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn is_hardware(&self) -> bool {
        self.impl_type == ImplType::Hardware
    }

    pub fn supports_decode(&self, codec_id: u32) -> bool {
        self.decoders.iter().any(|d| d.codec_id == codec_id)
    }

    pub fn supports_encode(&self, codec_id: u32) -> bool {
        self.encoders.iter().any(|e| e.codec_id == codec_id)
    }
}

impl MemoryDescription {
    pub fn new(mem_handle_type: u32, width: Range32U, height: Range32U) -> Self {
        Self {
            mem_handle_type,
            width,
            height,
            color_formats: Vec::new(),
        }
    }

    pub fn with_color_formats(mut self, formats: impl IntoIterator<Item = u32>) -> Self {
        self.color_formats.extend(formats);
        self
    }
}

impl CodecProfile {
    pub fn new(profile: u32, mem_descs: Vec<MemoryDescription>) -> Self {
        Self { profile, mem_descs }
    }
}

impl DecoderCodec {
    pub fn new(codec_id: u32, max_codec_level: u16) -> Self {
        Self {
            codec_id,
            max_codec_level,
            profiles: Vec::new(),
        }
    }

    pub fn with_profile(mut self, profile: CodecProfile) -> Self {
        self.profiles.push(profile);
        self
    }
}

impl EncoderCodec {
    pub fn new(codec_id: u32, max_codec_level: u16) -> Self {
        Self {
            codec_id,
            max_codec_level,
            bidirectional_prediction: 0,
            profiles: Vec::new(),
        }
    }

    pub fn with_bidirectional_prediction(mut self, enabled: bool) -> Self {
        self.bidirectional_prediction = enabled as u16;
        self
    }

    pub fn with_profile(mut self, profile: CodecProfile) -> Self {
        self.profiles.push(profile);
        self
    }
}

impl VppFilter {
    pub fn new(filter_fourcc: u32, max_delay_in_frames: u16) -> Self {
        Self {
            filter_fourcc,
            max_delay_in_frames,
            mem_descs: Vec::new(),
        }
    }

    pub fn with_mem_desc(mut self, desc: VppMemoryDescription) -> Self {
        self.mem_descs.push(desc);
        self
    }
}
