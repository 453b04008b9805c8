//! Filter configurations.
//!
//! A [`FilterConfig`] holds at most one constraint. Setting a property
//! replaces whatever constraint was there before, whether it named the same
//! path or a different one.

use crate::descriptor::ImplDescription;
use crate::error::DispatchError;
use crate::matcher;
use crate::property::{self, PropertyDef};
use crate::variant::{PropertyValue, VariantType};

/// Current constraint of a [`FilterConfig`].
#[derive(Debug, Clone, PartialEq)]
pub enum FilterState {
    /// Nothing set; every implementation passes.
    Unset,
    /// A well-typed constraint.
    Active {
        property: &'static PropertyDef,
        value: PropertyValue,
    },
    /// The last set carried the wrong type; every implementation fails until
    /// a later set succeeds.
    Rejected {
        property: &'static PropertyDef,
        actual: VariantType,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    state: FilterState,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterConfig {
    pub fn new() -> Self {
        Self {
            state: FilterState::Unset,
        }
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Constrain `path` to `value`.
    ///
    /// An unknown path leaves the current state untouched. A value of the
    /// wrong type leaves the config rejecting everything.
    pub fn set_property(&mut self, path: &str, value: PropertyValue) -> Result<(), DispatchError> {
        let property =
            property::resolve(path).ok_or_else(|| DispatchError::UnknownProperty(path.to_string()))?;

        let actual = value.variant_type();
        if !property.accepts_type(actual) || !kind_matches(property, &value) {
            return Err(self.reject(property, actual));
        }

        self.state = FilterState::Active { property, value };
        Ok(())
    }

    /// Record a type mismatch for `property` and return the matching error.
    ///
    /// Used directly by callers that can tell the type tag is wrong before
    /// they are able to decode the payload.
    pub fn reject(&mut self, property: &'static PropertyDef, actual: VariantType) -> DispatchError {
        self.state = FilterState::Rejected { property, actual };
        DispatchError::TypeMismatch {
            path: property.path.to_string(),
            expected: property.expected_type(),
            actual,
        }
    }

    /// Whether `desc` satisfies this config.
    pub fn accepts(&self, desc: &ImplDescription) -> bool {
        match &self.state {
            FilterState::Unset => true,
            FilterState::Active { property, value } => matcher::evaluate(property, value, desc),
            FilterState::Rejected { .. } => false,
        }
    }
}

fn kind_matches(property: &PropertyDef, value: &PropertyValue) -> bool {
    use crate::property::ValueKind;
    match property.kind {
        ValueKind::Scalar(_) => true,
        ValueKind::String => value.as_str().is_some(),
        ValueKind::Range => value.as_range().is_some(),
        ValueKind::HexId => value.as_str().is_some() || matches!(value, PropertyValue::U16(_)),
    }
}
