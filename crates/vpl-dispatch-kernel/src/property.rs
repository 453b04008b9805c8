//! Property-path resolution.
//!
//! Filter properties are addressed by dotted paths such as
//! `mfxImplDescription.mfxDecoderDescription.decoder.CodecID`. The first
//! segment is a fixed root token; the rest walks the capability tree down to
//! a leaf. Resolution is a lookup in one declarative table that binds each
//! leaf path to the descriptor [`Slot`] it reads, the value type a filter on
//! it must carry, and how the filter value is compared against the
//! descriptor.
//!
//! Paths that stop at an inner node (`mfxImplDescription.ApiVersion`) or that
//! contain an unknown segment do not resolve.

use crate::variant::VariantType;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Root token of every capability-description path.
pub const DESCRIPTION_ROOT: &str = "mfxImplDescription";
/// Root token of the implemented-function list.
pub const FUNCTIONS_ROOT: &str = "mfxImplementedFunctions";

/// Descriptor location a property reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    ImplType,
    AccelerationMode,
    ApiVersion,
    VendorId,
    VendorImplId,
    PoolPolicy,
    ImplName,
    License,
    Keywords,
    DeviceId,
    MediaAdapterType,
    DecoderCodecId,
    DecoderMaxCodecLevel,
    DecoderProfile,
    DecoderMemHandleType,
    DecoderWidth,
    DecoderHeight,
    DecoderColorFormat,
    EncoderCodecId,
    EncoderMaxCodecLevel,
    EncoderBiDirectionalPrediction,
    EncoderProfile,
    EncoderMemHandleType,
    EncoderWidth,
    EncoderHeight,
    EncoderColorFormat,
    VppFilterFourcc,
    VppMaxDelayInFrames,
    VppMemHandleType,
    VppWidth,
    VppHeight,
    VppInFormat,
    VppOutFormat,
    FunctionName,
}

/// Value a filter on a property must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Scalar(VariantType),
    /// Pointer to a NUL-terminated string.
    String,
    /// Pointer to a `{min, max, step}` range.
    Range,
    /// A hexadecimal id advertised as text. Filters carry either the text
    /// or the id as a `U16`.
    HexId,
}

impl ValueKind {
    /// The canonical wire type tag of values of this kind.
    pub fn variant_type(self) -> VariantType {
        match self {
            ValueKind::Scalar(t) => t,
            ValueKind::String | ValueKind::Range | ValueKind::HexId => VariantType::Ptr,
        }
    }

    /// Whether a value tagged `tag` is well-typed for this kind.
    pub fn accepts(self, tag: VariantType) -> bool {
        match self {
            ValueKind::HexId => matches!(tag, VariantType::Ptr | VariantType::U16),
            other => tag == other.variant_type(),
        }
    }
}

/// How a filter value is evaluated against a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// Some observed value equals the requested one.
    Equality,
    /// The requested value appears in an advertised list.
    Membership,
    /// The requested range fits in some advertised range.
    RangeContainment,
    /// Same major version, at least the requested minor.
    MinimumVersion,
    /// Some observed value is greater than or equal to the requested one.
    AtLeast,
    /// The requested token appears in a delimited text field.
    Keyword,
}

/// One resolvable leaf of the property namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyDef {
    pub path: &'static str,
    pub slot: Slot,
    pub kind: ValueKind,
    pub comparison: Comparison,
}

impl PropertyDef {
    pub fn expected_type(&self) -> VariantType {
        self.kind.variant_type()
    }

    pub fn accepts_type(&self, tag: VariantType) -> bool {
        self.kind.accepts(tag)
    }
}

const fn def(path: &'static str, slot: Slot, kind: ValueKind, comparison: Comparison) -> PropertyDef {
    PropertyDef {
        path,
        slot,
        kind,
        comparison,
    }
}

const U16: ValueKind = ValueKind::Scalar(VariantType::U16);
const U32: ValueKind = ValueKind::Scalar(VariantType::U32);

use Comparison::*;
use Slot::*;

static PROPERTIES: &[PropertyDef] = &[
    def("mfxImplDescription.Impl", ImplType, U32, Equality),
    def("mfxImplDescription.AccelerationMode", AccelerationMode, U32, Equality),
    def("mfxImplDescription.ApiVersion.Version", ApiVersion, U32, MinimumVersion),
    def("mfxImplDescription.VendorID", VendorId, U32, Equality),
    def("mfxImplDescription.VendorImplID", VendorImplId, U32, Equality),
    def("mfxImplDescription.mfxSurfacePoolMode", PoolPolicy, U32, Equality),
    def("mfxImplDescription.ImplName", ImplName, ValueKind::String, Equality),
    def("mfxImplDescription.License", License, ValueKind::String, Keyword),
    def("mfxImplDescription.Keywords", Keywords, ValueKind::String, Keyword),
    def(
        "mfxImplDescription.mfxDeviceDescription.device.DeviceID",
        DeviceId,
        ValueKind::HexId,
        Equality,
    ),
    def(
        "mfxImplDescription.mfxDeviceDescription.device.MediaAdapterType",
        MediaAdapterType,
        U16,
        Equality,
    ),
    def("mfxImplDescription.mfxDecoderDescription.decoder.CodecID", DecoderCodecId, U32, Equality),
    def(
        "mfxImplDescription.mfxDecoderDescription.decoder.MaxcodecLevel",
        DecoderMaxCodecLevel,
        U16,
        AtLeast,
    ),
    def(
        "mfxImplDescription.mfxDecoderDescription.decoder.decprofile.Profile",
        DecoderProfile,
        U32,
        Membership,
    ),
    def(
        "mfxImplDescription.mfxDecoderDescription.decoder.decprofile.decmemdesc.MemHandleType",
        DecoderMemHandleType,
        U32,
        Membership,
    ),
    def(
        "mfxImplDescription.mfxDecoderDescription.decoder.decprofile.decmemdesc.Width",
        DecoderWidth,
        ValueKind::Range,
        RangeContainment,
    ),
    def(
        "mfxImplDescription.mfxDecoderDescription.decoder.decprofile.decmemdesc.Height",
        DecoderHeight,
        ValueKind::Range,
        RangeContainment,
    ),
    def(
        "mfxImplDescription.mfxDecoderDescription.decoder.decprofile.decmemdesc.ColorFormats",
        DecoderColorFormat,
        U32,
        Membership,
    ),
    def("mfxImplDescription.mfxEncoderDescription.encoder.CodecID", EncoderCodecId, U32, Equality),
    def(
        "mfxImplDescription.mfxEncoderDescription.encoder.MaxcodecLevel",
        EncoderMaxCodecLevel,
        U16,
        AtLeast,
    ),
    def(
        "mfxImplDescription.mfxEncoderDescription.encoder.BiDirectionalPrediction",
        EncoderBiDirectionalPrediction,
        U16,
        Equality,
    ),
    def(
        "mfxImplDescription.mfxEncoderDescription.encoder.encprofile.Profile",
        EncoderProfile,
        U32,
        Membership,
    ),
    def(
        "mfxImplDescription.mfxEncoderDescription.encoder.encprofile.encmemdesc.MemHandleType",
        EncoderMemHandleType,
        U32,
        Membership,
    ),
    def(
        "mfxImplDescription.mfxEncoderDescription.encoder.encprofile.encmemdesc.Width",
        EncoderWidth,
        ValueKind::Range,
        RangeContainment,
    ),
    def(
        "mfxImplDescription.mfxEncoderDescription.encoder.encprofile.encmemdesc.Height",
        EncoderHeight,
        ValueKind::Range,
        RangeContainment,
    ),
    def(
        "mfxImplDescription.mfxEncoderDescription.encoder.encprofile.encmemdesc.ColorFormats",
        EncoderColorFormat,
        U32,
        Membership,
    ),
    def("mfxImplDescription.mfxVPPDescription.filter.FilterFourCC", VppFilterFourcc, U32, Equality),
    def(
        "mfxImplDescription.mfxVPPDescription.filter.MaxDelayInFrames",
        VppMaxDelayInFrames,
        U16,
        Equality,
    ),
    def(
        "mfxImplDescription.mfxVPPDescription.filter.memdesc.MemHandleType",
        VppMemHandleType,
        U32,
        Membership,
    ),
    def(
        "mfxImplDescription.mfxVPPDescription.filter.memdesc.Width",
        VppWidth,
        ValueKind::Range,
        RangeContainment,
    ),
    def(
        "mfxImplDescription.mfxVPPDescription.filter.memdesc.Height",
        VppHeight,
        ValueKind::Range,
        RangeContainment,
    ),
    def(
        "mfxImplDescription.mfxVPPDescription.filter.memdesc.format.InFormat",
        VppInFormat,
        U32,
        Membership,
    ),
    def(
        "mfxImplDescription.mfxVPPDescription.filter.memdesc.format.OutFormats",
        VppOutFormat,
        U32,
        Membership,
    ),
    def("mfxImplementedFunctions.FunctionsName", FunctionName, ValueKind::String, Membership),
];

fn index() -> &'static HashMap<&'static str, &'static PropertyDef> {
    static INDEX: OnceLock<HashMap<&'static str, &'static PropertyDef>> = OnceLock::new();
    INDEX.get_or_init(|| PROPERTIES.iter().map(|p| (p.path, p)).collect())
}

/// Resolve a dotted path to its property definition.
pub fn resolve(path: &str) -> Option<&'static PropertyDef> {
    index().get(path).copied()
}

/// Every resolvable property, in table order.
pub fn properties() -> &'static [PropertyDef] {
    PROPERTIES
}
