// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Supported tensor element data types.

use std::fmt;

/// Width in bytes of one vector lane group. Matches a 256-bit register.
pub const VECTOR_BYTES: usize = 32;

/// Upper bound on [`Scalar::LANES`] over all element types.
pub const MAX_LANES: usize = 16;

/// Enumerates the numeric types a tensor can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DType {
    /// 32-bit IEEE 754 floating point.
    F32,
    /// 64-bit IEEE 754 floating point.
    F64,
}

impl DType {
    /// Returns the size of a single element in bytes.
    pub fn size_bytes(self) -> usize {
        match self {
            DType::F32 => 4,
            DType::F64 => 8,
        }
    }

    /// Returns a human-readable label for this data type.
    pub fn as_str(self) -> &'static str {
        match self {
            DType::F32 => "f32",
            DType::F64 => "f64",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Element type of a tensor.
///
/// The engine is written once over `Scalar`; lane width and gather tables are
/// derived from the element size.
pub trait Scalar:
    num_traits::Float
    + Copy
    + Default
    + Send
    + Sync
    + fmt::Debug
    + fmt::Display
    + std::ops::AddAssign
    + 'static
{
    /// Runtime tag of this element type.
    const DTYPE: DType;

    /// Number of elements processed per lane group.
    const LANES: usize = VECTOR_BYTES / std::mem::size_of::<Self>();

    /// Converts an `f64` into this element type, rounding if needed.
    fn from_f64(value: f64) -> Self;

    /// Converts an element index into this element type.
    fn from_usize(value: usize) -> Self {
        Self::from_f64(value as f64)
    }
}

impl Scalar for f64 {
    const DTYPE: DType = DType::F64;

    fn from_f64(value: f64) -> Self {
        value
    }
}

impl Scalar for f32 {
    const DTYPE: DType = DType::F32;

    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lane_widths() {
        assert_eq!(<f64 as Scalar>::LANES, 4);
        assert_eq!(<f32 as Scalar>::LANES, 8);
        assert!(<f32 as Scalar>::LANES <= MAX_LANES);
    }

    #[test]
    fn test_dtype_sizes() {
        assert_eq!(f64::DTYPE.size_bytes(), std::mem::size_of::<f64>());
        assert_eq!(f32::DTYPE.size_bytes(), std::mem::size_of::<f32>());
        assert_eq!(DType::F64.to_string(), "f64");
    }

    #[test]
    fn test_from_usize() {
        assert_eq!(<f32 as Scalar>::from_usize(7), 7.0f32);
        assert_eq!(<f64 as Scalar>::from_usize(52), 52.0);
    }
}
