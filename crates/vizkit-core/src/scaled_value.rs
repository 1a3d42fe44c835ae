//! Magnitudes that are either absolute or relative to the scene length scale.
//!
//! Point radii, vector lengths and similar sizes are usually specified relative
//! to the size of the scene, so a default looks reasonable whether the data is
//! measured in millimetres or kilometres. `ScaledValue` records which
//! interpretation applies; [`ScaledValue::as_absolute`] resolves it against the
//! current length scale (see `StructureRegistry::length_scale` in
//! `vizkit-render`).

use std::ops::Mul;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledValue<T> {
    value: T,
    relative: bool,
}

impl<T> ScaledValue<T> {
    /// A value measured in multiples of the scene length scale.
    pub fn relative(value: T) -> Self {
        Self {
            value,
            relative: true,
        }
    }

    /// A literal value, independent of scene scale.
    pub fn absolute(value: T) -> Self {
        Self {
            value,
            relative: false,
        }
    }

    pub fn set(&mut self, value: T, relative: bool) {
        self.value = value;
        self.relative = relative;
    }

    /// Stored magnitude, not scaled.
    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    pub fn is_relative(&self) -> bool {
        self.relative
    }
}

impl<T> ScaledValue<T>
where
    T: Copy + Mul<Output = T> + From<f32>,
{
    /// Resolve to an absolute magnitude under `length_scale`.
    pub fn as_absolute(&self, length_scale: f32) -> T {
        if self.relative {
            self.value * T::from(length_scale)
        } else {
            self.value
        }
    }
}

impl<T: Default> Default for ScaledValue<T> {
    fn default() -> Self {
        Self::relative(T::default())
    }
}

/// Plain magnitudes convert as relative values.
impl<T> From<T> for ScaledValue<T> {
    fn from(value: T) -> Self {
        Self::relative(value)
    }
}

pub fn relative_value<T>(value: T) -> ScaledValue<T> {
    ScaledValue::relative(value)
}

pub fn absolute_value<T>(value: T) -> ScaledValue<T> {
    ScaledValue::absolute(value)
}
