// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Reshape, ravel and flatten.

use crate::Tensor;
use tensor_core::{AskOrder, Order, Scalar, Shape, StrideLayout, TensorError};

impl<T: Scalar> Tensor<T> {
    /// Gives the elements a new shape of the same size.
    ///
    /// Elements are matched in column-major order when `ask` is `ColMajor`
    /// and in row-major order otherwise. When the tensor is laid out densely
    /// in that order the result is a view; otherwise the elements are copied
    /// into a new buffer stored in that order.
    pub fn reshape(
        &self,
        shape: impl Into<Shape>,
        ask: AskOrder,
    ) -> Result<Tensor<T>, TensorError> {
        let shape = shape.into();
        if shape.size() != self.size() {
            return Err(TensorError::ShapeMismatch {
                op: "reshape",
                lhs: self.shape().clone(),
                rhs: shape,
            });
        }
        let cmp = match ask {
            AskOrder::ColMajor => Order::ColMajor,
            _ => Order::RowMajor,
        };
        let cmp_ask = AskOrder::from(cmp);
        let layout = self.layout();
        let compact = layout.compute_fortran_layout(cmp_ask, true);
        let reference = StrideLayout::of_dense(self.shape().clone(), layout.offset(), cmp)
            .compute_fortran_layout(cmp_ask, true);

        if compact == reference {
            if shape.size() == 0 {
                return Ok(self.view(StrideLayout::of_dense(shape, layout.offset(), cmp)));
            }
            // each new axis steps by as many positions (in cmp order) as
            // its canonical stride; read the storage delta of that step
            let canonical = shape.strides(cmp);
            let mut strides = Vec::with_capacity(shape.rank());
            for (&dim, &q) in shape.dims().iter().zip(&canonical) {
                if dim == 1 {
                    strides.push(q);
                } else {
                    let index = self.shape().index(cmp, q);
                    strides.push(layout.pointer(&index)? - layout.offset());
                }
            }
            tracing::trace!("reshape {} -> {shape}: view", self.shape());
            return Ok(self.view(StrideLayout::of(shape, layout.offset(), strides)?));
        }

        tracing::trace!("reshape {} -> {shape}: copy ({cmp})", self.shape());
        let data = self.to_vec(cmp_ask);
        let out = StrideLayout::of_dense(shape, 0, cmp);
        Ok(Tensor::from_parts(self.engine().clone(), out, data))
    }

    /// A rank-1 tensor of every element in `ask` order; a view when the
    /// elements already sit at a single stride.
    pub fn ravel(&self, ask: AskOrder) -> Result<Tensor<T>, TensorError> {
        let order = self.resolve_order(ask);
        let compact = self
            .layout()
            .compute_fortran_layout(AskOrder::from(order), true);
        if compact.rank() > 1 {
            return Ok(self.flatten(ask));
        }
        let stride = compact.strides().first().copied().unwrap_or(1);
        let layout = StrideLayout::of(Shape::vector(self.size()), compact.offset(), vec![stride])?;
        Ok(self.view(layout))
    }

    /// A new rank-1 buffer of every element in `ask` order.
    pub fn flatten(&self, ask: AskOrder) -> Tensor<T> {
        let order = self.resolve_order(ask);
        let chunks = self.chunk_iterator(AskOrder::from(order));
        let (step, len) = (chunks.loop_step(), chunks.loop_size());
        let src = self.storage().read();
        let mut data = Vec::with_capacity(self.size());
        for start in chunks {
            data.extend((0..len).map(|i| src[start + i * step]));
        }
        drop(src);
        let layout = StrideLayout::of_dense(Shape::vector(data.len()), 0, order);
        Tensor::from_parts(self.engine().clone(), layout, data)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Engine, EngineConfig};
    use tensor_core::{AskOrder, Shape, TensorError};

    fn engine() -> Engine {
        Engine::new(EngineConfig {
            cpu_threads: Some(2),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_reshape_dense_is_view() {
        let e = engine();
        let t = e.seq::<f64>(Shape::new(vec![2, 3, 4]), AskOrder::RowMajor);
        let r = t.reshape(Shape::matrix(6, 4), AskOrder::RowMajor).unwrap();
        assert!(r.shares_storage(&t));
        assert_eq!(r.layout().strides(), &[4, 1]);
        assert_eq!(r.to_vec(AskOrder::RowMajor), t.to_vec(AskOrder::RowMajor));
    }

    #[test]
    fn test_reshape_col_major_view() {
        let e = engine();
        let t = e.seq::<f64>(Shape::matrix(4, 3), AskOrder::ColMajor);
        let r = t.reshape(Shape::matrix(2, 6), AskOrder::ColMajor).unwrap();
        assert!(r.shares_storage(&t));
        assert_eq!(r.to_vec(AskOrder::ColMajor), t.to_vec(AskOrder::ColMajor));
    }

    #[test]
    fn test_reshape_unordered_copies() {
        let e = engine();
        let t = e.seq::<f64>(Shape::matrix(2, 3), AskOrder::RowMajor);
        let r = t.t_().reshape(Shape::vector(6), AskOrder::RowMajor).unwrap();
        assert!(!r.shares_storage(&t));
        assert_eq!(r.to_vec(AskOrder::RowMajor), vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
    }

    #[test]
    fn test_reshape_view_of_narrowed_rows() {
        let e = engine();
        let base = e.seq::<f64>(Shape::matrix(4, 3), AskOrder::RowMajor);
        let rows = base.narrow(0, true, 1, 3).unwrap();
        let r = rows.reshape(Shape::new(vec![3, 2]), AskOrder::RowMajor).unwrap();
        assert!(r.shares_storage(&base));
        assert_eq!(r.to_vec(AskOrder::RowMajor), vec![3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn test_reshape_size_mismatch() {
        let e = engine();
        let t = e.zeros::<f64>(Shape::matrix(2, 3), AskOrder::RowMajor);
        assert!(matches!(
            t.reshape(Shape::vector(5), AskOrder::RowMajor),
            Err(TensorError::ShapeMismatch { op: "reshape", .. })
        ));
    }

    #[test]
    fn test_ravel_and_flatten() {
        let e = engine();
        let t = e.seq::<f64>(Shape::matrix(3, 4), AskOrder::RowMajor);
        let col = t.narrow(1, true, 2, 3).unwrap();
        let raveled = col.ravel(AskOrder::RowMajor).unwrap();
        assert!(raveled.shares_storage(&t));
        assert_eq!(raveled.to_vec(AskOrder::RowMajor), vec![2.0, 6.0, 10.0]);

        let block = t.narrow(1, true, 0, 2).unwrap();
        let flat = block.ravel(AskOrder::RowMajor).unwrap();
        assert!(!flat.shares_storage(&t));
        assert_eq!(flat.to_vec(AskOrder::RowMajor), vec![0.0, 1.0, 4.0, 5.0, 8.0, 9.0]);

        let f = t.flatten(AskOrder::ColMajor);
        assert_eq!(f.shape(), &Shape::vector(12));
        assert_eq!(f.get(&[1]).unwrap(), 4.0);
    }
}
