// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Traversal orders.
//!
//! [`Order`] is a total order over the elements of a shape. [`AskOrder`] is
//! what callers request: a total order, or `Storage` meaning "whatever the
//! physical layout walks fastest". `Storage` never reaches the arithmetic;
//! it is resolved with [`AskOrder::resolve`] or rejected with
//! [`AskOrder::require_total`].

use crate::TensorError;
use std::fmt;

/// A total traversal order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Order {
    /// Last axis varies fastest (C order).
    #[default]
    RowMajor,
    /// First axis varies fastest (Fortran order).
    ColMajor,
}

/// A requested traversal or storage order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum AskOrder {
    RowMajor,
    ColMajor,
    /// The fastest order for the physical layout.
    #[default]
    Storage,
}

impl AskOrder {
    /// Resolves the request to a total order.
    ///
    /// Total orders pass through. `Storage` becomes `layout_hint` when the
    /// layout is ordered, else `default`.
    pub fn resolve(self, layout_hint: Option<Order>, default: Order) -> Order {
        match self {
            AskOrder::RowMajor => Order::RowMajor,
            AskOrder::ColMajor => Order::ColMajor,
            AskOrder::Storage => layout_hint.unwrap_or(default),
        }
    }

    /// Returns the total order, or `InvalidArgument` for `Storage`.
    pub fn require_total(self, op: &'static str) -> Result<Order, TensorError> {
        match self {
            AskOrder::RowMajor => Ok(Order::RowMajor),
            AskOrder::ColMajor => Ok(Order::ColMajor),
            AskOrder::Storage => Err(TensorError::invalid(
                op,
                "order must be row-major or col-major, not storage",
            )),
        }
    }
}

impl From<Order> for AskOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::RowMajor => AskOrder::RowMajor,
            Order::ColMajor => AskOrder::ColMajor,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::RowMajor => f.write_str("row-major"),
            Order::ColMajor => f.write_str("col-major"),
        }
    }
}

impl fmt::Display for AskOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AskOrder::RowMajor => f.write_str("row-major"),
            AskOrder::ColMajor => f.write_str("col-major"),
            AskOrder::Storage => f.write_str("storage"),
        }
    }
}

impl std::str::FromStr for Order {
    type Err = TensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "row-major" | "c" => Ok(Order::RowMajor),
            "col-major" | "f" => Ok(Order::ColMajor),
            other => Err(TensorError::invalid(
                "order",
                format!("unknown order '{other}'; expected 'row-major' or 'col-major'"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_total_passes_through() {
        assert_eq!(
            AskOrder::ColMajor.resolve(Some(Order::RowMajor), Order::RowMajor),
            Order::ColMajor
        );
        assert_eq!(
            AskOrder::RowMajor.resolve(None, Order::ColMajor),
            Order::RowMajor
        );
    }

    #[test]
    fn test_resolve_storage() {
        assert_eq!(
            AskOrder::Storage.resolve(Some(Order::ColMajor), Order::RowMajor),
            Order::ColMajor
        );
        assert_eq!(
            AskOrder::Storage.resolve(None, Order::ColMajor),
            Order::ColMajor
        );
    }

    #[test]
    fn test_require_total() {
        assert_eq!(AskOrder::RowMajor.require_total("mm").unwrap(), Order::RowMajor);
        assert!(matches!(
            AskOrder::Storage.require_total("mm"),
            Err(TensorError::InvalidArgument { op: "mm", .. })
        ));
    }

    #[test]
    fn test_parse() {
        assert_eq!("row-major".parse::<Order>().unwrap(), Order::RowMajor);
        assert_eq!("F".parse::<Order>().unwrap(), Order::ColMajor);
        assert!("diagonal".parse::<Order>().is_err());
    }
}
