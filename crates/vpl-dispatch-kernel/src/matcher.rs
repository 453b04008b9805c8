//! Evaluation of filter constraints against capability descriptors.
//!
//! Every slot is first flattened into the values the descriptor advertises
//! for it (a codec id per decoder, a color format per memory description,
//! ...). A constraint on a nested list holds if any advertised value
//! satisfies the property's [`Comparison`].

use crate::descriptor::ImplDescription;
use crate::filter::FilterConfig;
use crate::property::{Comparison, PropertyDef, Slot};
use crate::variant::{PropertyValue, Range32U};
use crate::version::ApiVersion;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Observed<'a> {
    Int(i128),
    Text(&'a str),
    Range(Range32U),
}

fn observe(slot: Slot, desc: &ImplDescription) -> Vec<Observed<'_>> {
    use Observed::{Int, Range, Text};

    let dec_mem = || {
        desc.decoders
            .iter()
            .flat_map(|d| &d.profiles)
            .flat_map(|p| &p.mem_descs)
    };
    let enc_mem = || {
        desc.encoders
            .iter()
            .flat_map(|e| &e.profiles)
            .flat_map(|p| &p.mem_descs)
    };
    let vpp_mem = || desc.vpp_filters.iter().flat_map(|f| &f.mem_descs);

    match slot {
        Slot::ImplType => vec![Int(desc.impl_type as u32 as i128)],
        Slot::AccelerationMode => vec![Int(desc.acceleration_mode.into())],
        Slot::ApiVersion => vec![Int(desc.api_version.as_u32().into())],
        Slot::VendorId => vec![Int(desc.vendor_id.into())],
        Slot::VendorImplId => vec![Int(desc.vendor_impl_id.into())],
        Slot::PoolPolicy => vec![Int(desc.pool_policy.into())],
        Slot::ImplName => vec![Text(&desc.impl_name)],
        Slot::License => vec![Text(&desc.license)],
        Slot::Keywords => vec![Text(&desc.keywords)],
        Slot::DeviceId => vec![Text(&desc.device.device_id)],
        Slot::MediaAdapterType => vec![Int(desc.device.media_adapter_type.into())],

        Slot::DecoderCodecId => desc.decoders.iter().map(|d| Int(d.codec_id.into())).collect(),
        Slot::DecoderMaxCodecLevel => desc
            .decoders
            .iter()
            .map(|d| Int(d.max_codec_level.into()))
            .collect(),
        Slot::DecoderProfile => desc
            .decoders
            .iter()
            .flat_map(|d| &d.profiles)
            .map(|p| Int(p.profile.into()))
            .collect(),
        Slot::DecoderMemHandleType => dec_mem().map(|m| Int(m.mem_handle_type.into())).collect(),
        Slot::DecoderWidth => dec_mem().map(|m| Range(m.width)).collect(),
        Slot::DecoderHeight => dec_mem().map(|m| Range(m.height)).collect(),
        Slot::DecoderColorFormat => dec_mem()
            .flat_map(|m| &m.color_formats)
            .map(|&c| Int(c.into()))
            .collect(),

        Slot::EncoderCodecId => desc.encoders.iter().map(|e| Int(e.codec_id.into())).collect(),
        Slot::EncoderMaxCodecLevel => desc
            .encoders
            .iter()
            .map(|e| Int(e.max_codec_level.into()))
            .collect(),
        Slot::EncoderBiDirectionalPrediction => desc
            .encoders
            .iter()
            .map(|e| Int(e.bidirectional_prediction.into()))
            .collect(),
        Slot::EncoderProfile => desc
            .encoders
            .iter()
            .flat_map(|e| &e.profiles)
            .map(|p| Int(p.profile.into()))
            .collect(),
        Slot::EncoderMemHandleType => enc_mem().map(|m| Int(m.mem_handle_type.into())).collect(),
        Slot::EncoderWidth => enc_mem().map(|m| Range(m.width)).collect(),
        Slot::EncoderHeight => enc_mem().map(|m| Range(m.height)).collect(),
        Slot::EncoderColorFormat => enc_mem()
            .flat_map(|m| &m.color_formats)
            .map(|&c| Int(c.into()))
            .collect(),

        Slot::VppFilterFourcc => desc
            .vpp_filters
            .iter()
            .map(|f| Int(f.filter_fourcc.into()))
            .collect(),
        Slot::VppMaxDelayInFrames => desc
            .vpp_filters
            .iter()
            .map(|f| Int(f.max_delay_in_frames.into()))
            .collect(),
        Slot::VppMemHandleType => vpp_mem().map(|m| Int(m.mem_handle_type.into())).collect(),
        Slot::VppWidth => vpp_mem().map(|m| Range(m.width)).collect(),
        Slot::VppHeight => vpp_mem().map(|m| Range(m.height)).collect(),
        Slot::VppInFormat => vpp_mem()
            .flat_map(|m| &m.formats)
            .map(|f| Int(f.in_format.into()))
            .collect(),
        Slot::VppOutFormat => vpp_mem()
            .flat_map(|m| &m.formats)
            .flat_map(|f| &f.out_formats)
            .map(|&c| Int(c.into()))
            .collect(),

        Slot::FunctionName => desc
            .implemented_functions
            .iter()
            .map(|name| Text(name.as_str()))
            .collect(),
    }
}

fn keyword_tokens(field: &str) -> impl Iterator<Item = &str> {
    field
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Numeric value of a hexadecimal id such as `"56a0"`.
fn parse_hex_id(text: &str) -> Option<i128> {
    let digits = text.trim();
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);
    u32::from_str_radix(digits, 16).ok().map(i128::from)
}

fn satisfies(comparison: Comparison, requested: &PropertyValue, observed: &Observed<'_>) -> bool {
    match (comparison, observed) {
        (Comparison::Equality | Comparison::Membership, Observed::Int(have)) => {
            requested.as_integer() == Some(*have)
        }
        (Comparison::Equality | Comparison::Membership, Observed::Text(have)) => {
            match requested.as_str() {
                Some(want) => want == *have,
                None => requested
                    .as_integer()
                    .is_some_and(|want| parse_hex_id(have) == Some(want)),
            }
        }
        (Comparison::AtLeast, Observed::Int(have)) => {
            requested.as_integer().is_some_and(|want| *have >= want)
        }
        (Comparison::MinimumVersion, Observed::Int(have)) => match requested.as_integer() {
            Some(want) => match (u32::try_from(*have), u32::try_from(want)) {
                (Ok(have), Ok(want)) => {
                    ApiVersion::from_u32(have).satisfies(ApiVersion::from_u32(want))
                }
                _ => false,
            },
            None => false,
        },
        (Comparison::RangeContainment, Observed::Range(advertised)) => requested
            .as_range()
            .is_some_and(|want| advertised.contains(want)),
        (Comparison::Keyword, Observed::Text(field)) => match requested.as_str() {
            Some(want) => {
                let want = want.trim();
                keyword_tokens(field).any(|token| token == want)
            }
            None => false,
        },
        _ => false,
    }
}

/// Whether `desc` satisfies the constraint `property == value`.
pub fn evaluate(property: &PropertyDef, value: &PropertyValue, desc: &ImplDescription) -> bool {
    observe(property.slot, desc)
        .iter()
        .any(|observed| satisfies(property.comparison, value, observed))
}

/// Whether `desc` satisfies every config (logical AND; empty passes).
pub fn matches_all<'a, I>(configs: I, desc: &ImplDescription) -> bool
where
    I: IntoIterator<Item = &'a FilterConfig>,
{
    configs.into_iter().all(|config| config.accepts(desc))
}
