// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Elementwise unary and binary operators.
//!
//! The in-place primitive walks the receiver's chunk descriptor in its
//! storage order. Unit-step runs are swept in `LANES`-wide slices; strided
//! runs gather each lane group through the descriptor's index table, apply
//! the operator and scatter it back. Leftovers go through a scalar tail.
//!
//! Copy-returning forms clone the receiver with [`Tensor::copy`] in the
//! engine's default order, then apply the in-place primitive.

use crate::Tensor;
use tensor_core::{AskOrder, Scalar, StrideChunkDescriptor, TensorError, MAX_LANES};

/// Unary operators applied elementwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Abs,
    Neg,
    Log,
    Log1p,
    Exp,
    Expm1,
    Sin,
    Asin,
    Sinh,
    Cos,
    Acos,
    Cosh,
    Tan,
    Atan,
    Tanh,
}

impl UnaryOp {
    pub const ALL: [UnaryOp; 15] = [
        UnaryOp::Abs,
        UnaryOp::Neg,
        UnaryOp::Log,
        UnaryOp::Log1p,
        UnaryOp::Exp,
        UnaryOp::Expm1,
        UnaryOp::Sin,
        UnaryOp::Asin,
        UnaryOp::Sinh,
        UnaryOp::Cos,
        UnaryOp::Acos,
        UnaryOp::Cosh,
        UnaryOp::Tan,
        UnaryOp::Atan,
        UnaryOp::Tanh,
    ];

    /// Applies the operator to one value.
    pub fn apply<T: Scalar>(self, x: T) -> T {
        match self {
            UnaryOp::Abs => x.abs(),
            UnaryOp::Neg => -x,
            UnaryOp::Log => x.ln(),
            UnaryOp::Log1p => x.ln_1p(),
            UnaryOp::Exp => x.exp(),
            UnaryOp::Expm1 => x.exp_m1(),
            UnaryOp::Sin => x.sin(),
            UnaryOp::Asin => x.asin(),
            UnaryOp::Sinh => x.sinh(),
            UnaryOp::Cos => x.cos(),
            UnaryOp::Acos => x.acos(),
            UnaryOp::Cosh => x.cosh(),
            UnaryOp::Tan => x.tan(),
            UnaryOp::Atan => x.atan(),
            UnaryOp::Tanh => x.tanh(),
        }
    }

    fn apply_run<T: Scalar>(self, data: &mut [T], start: usize, run: &Run<'_>) {
        match self {
            UnaryOp::Abs => map_run(data, start, run, |x: T| x.abs()),
            UnaryOp::Neg => map_run(data, start, run, |x: T| -x),
            UnaryOp::Log => map_run(data, start, run, |x: T| x.ln()),
            UnaryOp::Log1p => map_run(data, start, run, |x: T| x.ln_1p()),
            UnaryOp::Exp => map_run(data, start, run, |x: T| x.exp()),
            UnaryOp::Expm1 => map_run(data, start, run, |x: T| x.exp_m1()),
            UnaryOp::Sin => map_run(data, start, run, |x: T| x.sin()),
            UnaryOp::Asin => map_run(data, start, run, |x: T| x.asin()),
            UnaryOp::Sinh => map_run(data, start, run, |x: T| x.sinh()),
            UnaryOp::Cos => map_run(data, start, run, |x: T| x.cos()),
            UnaryOp::Acos => map_run(data, start, run, |x: T| x.acos()),
            UnaryOp::Cosh => map_run(data, start, run, |x: T| x.cosh()),
            UnaryOp::Tan => map_run(data, start, run, |x: T| x.tan()),
            UnaryOp::Atan => map_run(data, start, run, |x: T| x.atan()),
            UnaryOp::Tanh => map_run(data, start, run, |x: T| x.tanh()),
        }
    }
}

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn apply<T: Scalar>(self, a: T, b: T) -> T {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
        }
    }

    fn apply_run<T: Scalar>(self, data: &mut [T], start: usize, run: &Run<'_>, value: T) {
        match self {
            BinaryOp::Add => map_run(data, start, run, |x: T| x + value),
            BinaryOp::Sub => map_run(data, start, run, |x: T| x - value),
            BinaryOp::Mul => map_run(data, start, run, |x: T| x * value),
            BinaryOp::Div => map_run(data, start, run, |x: T| x / value),
        }
    }

    fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
        }
    }
}

/// Geometry shared by every run of one descriptor.
struct Run<'a> {
    step: usize,
    size: usize,
    lane_table: &'a [usize],
}

/// Maps `f` over one run starting at `start`.
fn map_run<T: Scalar, F: Fn(T) -> T>(data: &mut [T], start: usize, run: &Run<'_>, f: F) {
    let lanes = T::LANES;
    if run.step == 1 {
        let mut groups = data[start..start + run.size].chunks_exact_mut(lanes);
        for lane in &mut groups {
            for x in lane.iter_mut() {
                *x = f(*x);
            }
        }
        for x in groups.into_remainder() {
            *x = f(*x);
        }
        return;
    }

    let full = run.size - run.size % lanes;
    let mut buf = [T::zero(); MAX_LANES];
    let buf = &mut buf[..lanes];
    let mut i = 0;
    while i < full {
        let base = start + i * run.step;
        for (b, &ix) in buf.iter_mut().zip(run.lane_table) {
            *b = data[base + ix];
        }
        for b in buf.iter_mut() {
            *b = f(*b);
        }
        for (b, &ix) in buf.iter().zip(run.lane_table) {
            data[base + ix] = *b;
        }
        i += lanes;
    }
    for i in full..run.size {
        let p = start + i * run.step;
        data[p] = f(data[p]);
    }
}

/// `x` limited to `[min, max]`; a NaN bound leaves that side open.
fn clamp_value<T: Scalar>(x: T, min: T, max: T) -> T {
    let x = if !min.is_nan() && x < min { min } else { x };
    if !max.is_nan() && x > max {
        max
    } else {
        x
    }
}

impl<T: Scalar> Tensor<T> {
    /// Walks every run of this tensor under one write guard.
    fn for_each_run(&self, mut apply: impl FnMut(&mut [T], usize, &Run<'_>)) {
        let descriptor = StrideChunkDescriptor::of(self.layout(), AskOrder::Storage);
        let lane_table = descriptor.lane_indexes(T::LANES);
        let run = Run {
            step: descriptor.loop_step(),
            size: descriptor.loop_size(),
            lane_table: &lane_table,
        };
        let mut data = self.storage().write();
        for &start in descriptor.chunk_offsets() {
            apply(&mut data, start, &run);
        }
    }

    /// Applies `op` to every element in place.
    pub fn unary_op_(&self, op: UnaryOp) -> &Self {
        self.for_each_run(|data, start, run| op.apply_run(data, start, run));
        self
    }

    /// Copies in `ask` order and applies `op` to the copy.
    pub fn unary_op(&self, op: UnaryOp, ask: AskOrder) -> Result<Tensor<T>, TensorError> {
        let out = self.copy(ask)?;
        out.unary_op_(op);
        Ok(out)
    }

    /// Combines every element with `value` in place.
    pub fn binary_op_(&self, op: BinaryOp, value: T) -> &Self {
        self.for_each_run(|data, start, run| op.apply_run(data, start, run, value));
        self
    }

    /// Combines every element with `value` into a copy.
    pub fn binary_op(
        &self,
        op: BinaryOp,
        value: T,
        ask: AskOrder,
    ) -> Result<Tensor<T>, TensorError> {
        let out = self.copy(ask)?;
        out.binary_op_(op, value);
        Ok(out)
    }

    /// Sets every element to `value`.
    pub fn fill_(&self, value: T) -> &Self {
        self.for_each_run(|data, start, run| map_run(data, start, run, |_: T| value));
        self
    }

    /// Replaces every NaN element with `value`.
    pub fn fill_nan_(&self, value: T) -> &Self {
        self.for_each_run(|data, start, run| {
            map_run(data, start, run, |x: T| if x.is_nan() { value } else { x })
        });
        self
    }

    /// Limits every element to `[min, max]` in place. A NaN bound leaves
    /// that side unbounded and NaN elements stay NaN.
    pub fn clamp_(&self, min: T, max: T) -> &Self {
        self.for_each_run(|data, start, run| {
            map_run(data, start, run, |x: T| clamp_value(x, min, max))
        });
        self
    }

    /// [`clamp_`](Self::clamp_) applied to a copy in the default order.
    pub fn clamp(&self, min: T, max: T) -> Result<Tensor<T>, TensorError> {
        let out = self.copy(self.default_ask())?;
        out.clamp_(min, max);
        Ok(out)
    }

    /// Combines this tensor with `other` element by element, in place.
    ///
    /// Shapes must be equal; there is no broadcasting. Both operands are
    /// walked in the receiver's fast order (or the engine default when it
    /// has none), so elements are paired by logical position.
    pub fn binary_tensor_op_(&self, op: BinaryOp, other: &Tensor<T>) -> Result<&Self, TensorError> {
        if self.shape() != other.shape() {
            return Err(TensorError::ShapeMismatch {
                op: op.name(),
                lhs: self.shape().clone(),
                rhs: other.shape().clone(),
            });
        }
        let order = AskOrder::from(self.common_order());
        if self.shares_storage(other) {
            // snapshot the operand first: a position may be read after the
            // receiver has already rewritten it
            let values = other.to_vec(order);
            let mut data = self.storage().write();
            for (p, b) in self.ptr_iterator(order).zip(values) {
                data[p] = op.apply(data[p], b);
            }
        } else {
            let (mut data, rhs) = self.storage().write_with(other.storage());
            for (p, q) in self.ptr_iterator(order).zip(other.ptr_iterator(order)) {
                data[p] = op.apply(data[p], rhs[q]);
            }
        }
        Ok(self)
    }

    /// Combines this tensor with `other` element by element into a copy.
    pub fn binary_tensor_op(
        &self,
        op: BinaryOp,
        other: &Tensor<T>,
        ask: AskOrder,
    ) -> Result<Tensor<T>, TensorError> {
        let out = self.copy(ask)?;
        out.binary_tensor_op_(op, other)?;
        Ok(out)
    }

    fn default_ask(&self) -> AskOrder {
        AskOrder::from(self.engine().default_order())
    }
}

macro_rules! unary_methods {
    ($(($inplace:ident, $copy:ident, $op:ident)),* $(,)?) => {
        impl<T: Scalar> Tensor<T> {
            $(
                #[doc = concat!("In-place `", stringify!($copy), "`.")]
                pub fn $inplace(&self) -> &Self {
                    self.unary_op_(UnaryOp::$op)
                }

                #[doc = concat!("`", stringify!($copy), "` of every element, as a new tensor.")]
                pub fn $copy(&self) -> Result<Tensor<T>, TensorError> {
                    self.unary_op(UnaryOp::$op, self.default_ask())
                }
            )*
        }
    };
}

unary_methods! {
    (abs_, abs, Abs),
    (neg_, neg, Neg),
    (log_, log, Log),
    (log1p_, log1p, Log1p),
    (exp_, exp, Exp),
    (expm1_, expm1, Expm1),
    (sin_, sin, Sin),
    (asin_, asin, Asin),
    (sinh_, sinh, Sinh),
    (cos_, cos, Cos),
    (acos_, acos, Acos),
    (cosh_, cosh, Cosh),
    (tan_, tan, Tan),
    (atan_, atan, Atan),
    (tanh_, tanh, Tanh),
}

macro_rules! binary_methods {
    ($((
        $inplace:ident,
        $copy:ident,
        $tensor_inplace:ident,
        $tensor_copy:ident,
        $op:ident
    )),* $(,)?) => {
        impl<T: Scalar> Tensor<T> {
            $(
                pub fn $inplace(&self, value: T) -> &Self {
                    self.binary_op_(BinaryOp::$op, value)
                }

                pub fn $copy(&self, value: T) -> Result<Tensor<T>, TensorError> {
                    self.binary_op(BinaryOp::$op, value, self.default_ask())
                }

                pub fn $tensor_inplace(&self, other: &Tensor<T>) -> Result<&Self, TensorError> {
                    self.binary_tensor_op_(BinaryOp::$op, other)
                }

                pub fn $tensor_copy(&self, other: &Tensor<T>) -> Result<Tensor<T>, TensorError> {
                    self.binary_tensor_op(BinaryOp::$op, other, self.default_ask())
                }
            )*
        }
    };
}

binary_methods! {
    (add_, add, add_tensor_, add_tensor, Add),
    (sub_, sub, sub_tensor_, sub_tensor, Sub),
    (mul_, mul, mul_tensor_, mul_tensor, Mul),
    (div_, div, div_tensor_, div_tensor, Div),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Engine, EngineConfig};
    use tensor_core::Shape;

    fn engine() -> Engine {
        Engine::new(EngineConfig {
            cpu_threads: Some(2),
            ..Default::default()
        })
        .unwrap()
    }

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len()
            && a.iter().zip(b).all(|(x, y)| {
                (x.is_nan() && y.is_nan()) || x == y || (x - y).abs() <= 1e-12 * x.abs().max(1.0)
            })
    }

    #[test]
    fn test_unit_step_lane_sweep() {
        let e = engine();
        // 11 elements: two f64 lane groups plus a tail of 3
        let t = e.seq::<f64>(Shape::vector(11), AskOrder::RowMajor);
        t.neg_().abs_();
        let expected: Vec<f64> = (0..11).map(|i| i as f64).collect();
        assert_eq!(t.to_vec(AskOrder::RowMajor), expected);
    }

    #[test]
    fn test_strided_gather_path() {
        let e = engine();
        let base = e.seq::<f64>(Shape::matrix(9, 3), AskOrder::RowMajor);
        let col = base.narrow(1, false, 1, 2).unwrap();
        assert_eq!(col.layout().stride(0), 3);
        col.mul_(10.0);
        for r in 0..9 {
            assert_eq!(base.get(&[r, 1]).unwrap(), (r * 3 + 1) as f64 * 10.0);
            assert_eq!(base.get(&[r, 0]).unwrap(), (r * 3) as f64);
        }
    }

    #[test]
    fn test_fill_strided_view() {
        let e = engine();
        let base = e.seq::<f64>(Shape::matrix(10, 3), AskOrder::RowMajor);
        // stride 3, ten elements: two lane groups and a tail
        let col = base.narrow(1, false, 2, 3).unwrap();
        col.fill_(-1.0);
        for r in 0..10 {
            assert_eq!(base.get(&[r, 2]).unwrap(), -1.0);
            assert_eq!(base.get(&[r, 1]).unwrap(), (r * 3 + 1) as f64);
        }

        let block = base.narrow(1, true, 0, 2).unwrap().t_();
        assert!(!block.layout().is_dense());
        block.fill_(7.0);
        assert!(base.iter(AskOrder::RowMajor).all(|x| x == 7.0 || x == -1.0));
    }

    #[test]
    fn test_fill_nan_strided_view() {
        let e = engine();
        let base = e.seq::<f64>(Shape::matrix(10, 2), AskOrder::RowMajor);
        for r in [0, 4, 9] {
            base.set(&[r, 0], f64::NAN).unwrap();
        }
        base.set(&[3, 1], f64::NAN).unwrap();
        let col = base.narrow(1, false, 0, 1).unwrap();
        col.fill_nan_(100.0);
        for r in 0..10 {
            let want = if [0, 4, 9].contains(&r) { 100.0 } else { (r * 2) as f64 };
            assert_eq!(col.get(&[r]).unwrap(), want);
        }
        // outside the view the NaN survives
        assert!(base.get(&[3, 1]).unwrap().is_nan());
    }

    #[test]
    fn test_clamp_strided_view() {
        let e = engine();
        let base = e.seq::<f32>(Shape::matrix(4, 6), AskOrder::ColMajor);
        let view = base.narrow(0, true, 1, 3).unwrap().t_();
        assert!(!view.layout().is_dense());
        let expected: Vec<f32> = view
            .to_vec(AskOrder::RowMajor)
            .iter()
            .map(|&x| x.clamp(8.0, 15.0))
            .collect();

        let copied = view.clamp(8.0, 15.0).unwrap();
        assert_eq!(copied.to_vec(AskOrder::RowMajor), expected);
        assert_eq!(base.get(&[1, 0]).unwrap(), 6.0);

        view.clamp_(8.0, 15.0);
        assert_eq!(view.to_vec(AskOrder::RowMajor), expected);
        assert_eq!(base.get(&[0, 0]).unwrap(), 0.0);
        assert_eq!(base.get(&[3, 5]).unwrap(), 23.0);
    }

    #[test]
    fn test_clamp_nan_bounds_and_values() {
        let e = engine();
        let t = e.seq::<f64>(Shape::vector(6), AskOrder::RowMajor);
        t.set(&[2], f64::NAN).unwrap();
        t.clamp_(f64::NAN, 3.0);
        let got = t.to_vec(AskOrder::RowMajor);
        assert_eq!(&got[..2], &[0.0, 1.0]);
        assert!(got[2].is_nan());
        assert_eq!(&got[3..], &[3.0, 3.0, 3.0]);
        t.clamp_(1.0, f64::NAN);
        assert_eq!(t.get(&[0]).unwrap(), 1.0);
        assert_eq!(t.get(&[5]).unwrap(), 3.0);
    }

    #[test]
    fn test_scalar_binary_ops() {
        let e = engine();
        let t = e.full(Shape::vector(5), 4.0f32, AskOrder::Storage);
        t.add_(2.0).mul_(3.0).sub_(1.0).div_(17.0);
        assert!(t.iter(AskOrder::Storage).all(|x| (x - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_add_sub_identity_on_seq() {
        let e = engine();
        let t = e.seq::<f64>(Shape::new(vec![3, 4, 5]), AskOrder::ColMajor);
        let before = t.to_vec(AskOrder::RowMajor);
        t.add_(0.25).sub_(0.25);
        assert_eq!(t.to_vec(AskOrder::RowMajor), before);
    }

    #[test]
    fn test_inplace_matches_copy_for_every_op() {
        let e = engine();
        for op in UnaryOp::ALL {
            let t = e.seq::<f64>(Shape::matrix(3, 7), AskOrder::RowMajor);
            t.div_(30.0);
            let copied = t.unary_op(op, AskOrder::ColMajor).unwrap();
            t.unary_op_(op);
            assert!(
                close(&t.to_vec(AskOrder::RowMajor), &copied.to_vec(AskOrder::RowMajor)),
                "{op:?}"
            );
        }
    }

    #[test]
    fn test_named_copy_leaves_receiver() {
        let e = engine();
        let t = e.full(Shape::vector(3), -2.0f64, AskOrder::Storage);
        let a = t.abs().unwrap();
        assert_eq!(a.to_vec(AskOrder::Storage), vec![2.0; 3]);
        assert_eq!(t.to_vec(AskOrder::Storage), vec![-2.0; 3]);
        assert!(!a.shares_storage(&t));
        let s = t.add(5.0).unwrap();
        assert_eq!(s.to_vec(AskOrder::Storage), vec![3.0; 3]);
    }

    #[test]
    fn test_tensor_ops_pair_by_logical_position() {
        let e = engine();
        let c = e.seq::<f64>(Shape::matrix(2, 3), AskOrder::RowMajor);
        let f = e.seq::<f64>(Shape::matrix(2, 3), AskOrder::ColMajor);
        c.add_tensor_(&f).unwrap();
        assert_eq!(
            c.to_vec(AskOrder::RowMajor),
            vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]
        );
        let q = c.div_tensor(&f).unwrap();
        assert_eq!(q.get(&[1, 2]).unwrap(), 2.0);
    }

    #[test]
    fn test_tensor_op_shape_mismatch() {
        let e = engine();
        let a = e.zeros::<f64>(Shape::matrix(2, 3), AskOrder::RowMajor);
        let b = e.zeros::<f64>(Shape::matrix(3, 2), AskOrder::RowMajor);
        assert!(matches!(
            a.mul_tensor_(&b),
            Err(TensorError::ShapeMismatch { op: "mul", .. })
        ));
    }

    #[test]
    fn test_aliased_tensor_op() {
        let e = engine();
        let t = e.seq::<f64>(Shape::matrix(2, 2), AskOrder::RowMajor);
        t.add_tensor_(&t.t_()).unwrap();
        assert_eq!(t.to_vec(AskOrder::RowMajor), vec![0.0, 3.0, 3.0, 6.0]);
        t.sub_tensor_(&t.clone()).unwrap();
        assert!(t.iter(AskOrder::Storage).all(|x| x == 0.0));
    }
}
