//! Raw capability descriptions handed to C callers.
//!
//! A [`DescriptionArena`] lays an owned [`ImplDescription`] out in the C
//! header-plus-arrays form and owns every buffer the header points into.
//! The header stays valid for as long as the arena lives.

use std::any::Any;
use std::ptr;
use vpl_dispatch_kernel::DispatchError;
use vpl_dispatch_kernel::descriptor::{CodecProfile, ImplDescription};
use vpl_dispatch_runtime::abi::{
    DEVICE_ID_LEN, IMPL_NAME_LEN, RawCodecProfile, RawDecoderCodec, RawDecoderDescription,
    RawDeviceDescription, RawEncoderCodec, RawEncoderDescription, RawImplDescription,
    RawMemoryDescription, RawStructVersion, RawVppDescription, RawVppFilter, RawVppFormat,
    RawVppMemoryDescription, STR_FIELD_LEN, write_fixed_str,
};

const DESCRIPTION_VERSION: RawStructVersion = RawStructVersion::new(1, 2);
const DEVICE_VERSION: RawStructVersion = RawStructVersion::new(1, 1);
const SECTION_VERSION: RawStructVersion = RawStructVersion::new(1, 0);

pub struct DescriptionArena {
    header: Box<RawImplDescription>,
    buffers: Vec<Box<dyn Any>>,
}

// Every pointer in `header` and `buffers` targets heap memory owned by
// `buffers` itself, so the arena can move between threads as a unit.
unsafe impl Send for DescriptionArena {}

impl DescriptionArena {
    pub fn build(desc: &ImplDescription) -> Result<Self, DispatchError> {
        let mut arena = Builder {
            buffers: Vec::new(),
        };

        let mut decoders = Vec::new();
        reserve(&mut decoders, desc.decoders.len())?;
        for codec in &desc.decoders {
            let (num_profiles, profiles) = arena.profiles(&codec.profiles)?;
            decoders.push(RawDecoderCodec {
                codec_id: codec.codec_id,
                reserved: [0; 8],
                max_codec_level: codec.max_codec_level,
                num_profiles,
                profiles,
            });
        }

        let mut encoders = Vec::new();
        reserve(&mut encoders, desc.encoders.len())?;
        for codec in &desc.encoders {
            let (num_profiles, profiles) = arena.profiles(&codec.profiles)?;
            encoders.push(RawEncoderCodec {
                codec_id: codec.codec_id,
                max_codec_level: codec.max_codec_level,
                bidirectional_prediction: codec.bidirectional_prediction,
                reserved: [0; 7],
                num_profiles,
                profiles,
            });
        }

        let mut filters = Vec::new();
        reserve(&mut filters, desc.vpp_filters.len())?;
        for filter in &desc.vpp_filters {
            let mut mem_descs = Vec::new();
            reserve(&mut mem_descs, filter.mem_descs.len())?;
            for mem in &filter.mem_descs {
                let mut formats = Vec::new();
                reserve(&mut formats, mem.formats.len())?;
                for format in &mem.formats {
                    let (num_out_formats, out_formats) = arena.copy(&format.out_formats)?;
                    formats.push(RawVppFormat {
                        in_format: format.in_format,
                        reserved: [0; 5],
                        num_out_formats,
                        out_formats,
                    });
                }
                let (num_in_formats, formats) = arena.keep(formats)?;
                mem_descs.push(RawVppMemoryDescription {
                    mem_handle_type: mem.mem_handle_type,
                    width: mem.width,
                    height: mem.height,
                    reserved: [0; 6],
                    num_in_formats,
                    formats,
                });
            }
            let (num_mem_types, mem_desc) = arena.keep(mem_descs)?;
            filters.push(RawVppFilter {
                filter_fourcc: filter.filter_fourcc,
                max_delay_in_frames: filter.max_delay_in_frames,
                reserved: [0; 6],
                num_mem_types,
                mem_desc,
            });
        }

        let (num_decoders, decoders) = arena.keep(decoders)?;
        let (num_encoders, encoders) = arena.keep(encoders)?;
        let (num_filters, filters) = arena.keep(filters)?;

        let mut header = Box::new(RawImplDescription {
            version: DESCRIPTION_VERSION,
            impl_type: desc.impl_type as u32,
            acceleration_mode: desc.acceleration_mode,
            api_version: desc.api_version.into(),
            impl_name: [0; IMPL_NAME_LEN],
            license: [0; STR_FIELD_LEN],
            keywords: [0; STR_FIELD_LEN],
            vendor_id: desc.vendor_id,
            vendor_impl_id: desc.vendor_impl_id,
            dev: RawDeviceDescription {
                version: DEVICE_VERSION,
                reserved: [0; 6],
                media_adapter_type: desc.device.media_adapter_type,
                device_id: [0; DEVICE_ID_LEN],
                num_sub_devices: 0,
                sub_devices: ptr::null_mut(),
            },
            dec: RawDecoderDescription {
                version: SECTION_VERSION,
                reserved: [0; 7],
                num_codecs: num_decoders,
                codecs: decoders,
            },
            enc: RawEncoderDescription {
                version: SECTION_VERSION,
                reserved: [0; 7],
                num_codecs: num_encoders,
                codecs: encoders,
            },
            vpp: RawVppDescription {
                version: SECTION_VERSION,
                reserved: [0; 7],
                num_filters,
                filters,
            },
            pool_policy: desc.pool_policy,
            reserved: [0; 8],
            num_ext_param: 0,
            ext_param: ptr::null_mut(),
        });
        write_fixed_str(&mut header.impl_name, &desc.impl_name);
        write_fixed_str(&mut header.license, &desc.license);
        write_fixed_str(&mut header.keywords, &desc.keywords);
        write_fixed_str(&mut header.dev.device_id, &desc.device.device_id);

        Ok(Self {
            header,
            buffers: arena.buffers,
        })
    }

    pub fn as_ptr(&self) -> *const RawImplDescription {
        &*self.header
    }
}

struct Builder {
    buffers: Vec<Box<dyn Any>>,
}

impl Builder {
    /// Take ownership of `items` and return its `(count, pointer)` pair.
    fn keep<T: 'static>(&mut self, mut items: Vec<T>) -> Result<(u16, *mut T), DispatchError> {
        let count = u16::try_from(items.len()).map_err(|_| DispatchError::ListTooLong {
            len: items.len(),
            max: u16::MAX as usize,
        })?;
        if items.is_empty() {
            return Ok((0, ptr::null_mut()));
        }
        let data = items.as_mut_ptr();
        self.buffers
            .try_reserve(1)
            .map_err(|e| DispatchError::MemoryAllocation(e.to_string()))?;
        self.buffers.push(Box::new(items));
        Ok((count, data))
    }

    fn copy<T: Copy + 'static>(&mut self, items: &[T]) -> Result<(u16, *mut T), DispatchError> {
        let mut owned = Vec::new();
        reserve(&mut owned, items.len())?;
        owned.extend_from_slice(items);
        self.keep(owned)
    }

    fn profiles(&mut self, profiles: &[CodecProfile]) -> Result<(u16, *mut RawCodecProfile), DispatchError> {
        let mut raw = Vec::new();
        reserve(&mut raw, profiles.len())?;
        for profile in profiles {
            let mut mem_descs = Vec::new();
            reserve(&mut mem_descs, profile.mem_descs.len())?;
            for mem in &profile.mem_descs {
                let (num_color_formats, color_formats) = self.copy(&mem.color_formats)?;
                mem_descs.push(RawMemoryDescription {
                    mem_handle_type: mem.mem_handle_type,
                    width: mem.width,
                    height: mem.height,
                    reserved: [0; 7],
                    num_color_formats,
                    color_formats,
                });
            }
            let (num_mem_types, mem_desc) = self.keep(mem_descs)?;
            raw.push(RawCodecProfile {
                profile: profile.profile,
                reserved: [0; 7],
                num_mem_types,
                mem_desc,
            });
        }
        self.keep(raw)
    }
}

fn reserve<T>(items: &mut Vec<T>, additional: usize) -> Result<(), DispatchError> {
    items
        .try_reserve_exact(additional)
        .map_err(|e| DispatchError::MemoryAllocation(e.to_string()))
}
