//! Dense tensors over qubit wires.
//!
//! A linear map on *n* qubits is stored as a rank-2*n* array of shape
//! `[2; 2n]`, with each axis labelled by a [`Q`] naming the wire it belongs
//! to and the side (output ket or input bra) it sits on. Contraction matches
//! bras of the left operand with kets of the right operand on the same wire,
//! so composing a small operation into a large one only ever touches the axes
//! of the targeted wires.

use std::fmt;
use ndarray as nd;
use num_complex::Complex64 as C64;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TensorError {
    #[error("duplicate index {0:?}")]
    DuplicateIndex(Q),

    #[error("non-matching indices {0:?} and shape {1:?}")]
    IncompatibleShape(Box<[Q]>, Box<[usize]>),

    #[error("un-matched duplicate index in contraction {0:?}")]
    ContractDuplicateIndex(Q),

    #[error("missing index {0:?}")]
    MissingIndex(Q),

    #[error("shape error: {0}")]
    ShapeError(#[from] nd::ShapeError),
}
pub type TensorResult<T> = Result<T, TensorError>;
use TensorError::*;

/// An index for a qubit wire on a specific side of a linear map.
///
/// [`Ord`] is implemented to sort all ket indices before all bra indices,
/// deferring to the wire indices to determine orderings within those
/// subgroups.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Q {
    /// A qubit index on the output (ket) side.
    Ket(usize),

    /// A qubit index on the input (bra) side.
    Bra(usize),
}

impl Q {
    /// Return `true` if `self` is `Ket`.
    pub fn is_ket(&self) -> bool { matches!(self, Self::Ket(_)) }

    /// Return `true` if `self` is `Ket` and the wire index satisfies a
    /// predicate.
    pub fn is_ket_and<F>(&self, pred: F) -> bool
    where F: FnOnce(usize) -> bool
    {
        if let Self::Ket(k) = self { pred(*k) } else { false }
    }

    /// Return `true` if `self` is `Bra`.
    pub fn is_bra(&self) -> bool { matches!(self, Self::Bra(_)) }

    /// Return `true` if `self` is `Bra` and the wire index satisfies a
    /// predicate.
    pub fn is_bra_and<F>(&self, pred: F) -> bool
    where F: FnOnce(usize) -> bool
    {
        if let Self::Bra(k) = self { pred(*k) } else { false }
    }

    /// Return `true` if `self` is a `Bra` and `other` is a `Ket` with the same
    /// wire index.
    pub fn matches_with(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::Bra(l), Self::Ket(r)) if l == r,
        )
    }

    /// Return the wire index.
    pub fn wire_index(&self) -> usize {
        match self {
            Self::Ket(k) => *k,
            Self::Bra(k) => *k,
        }
    }
}

impl PartialOrd for Q {
    fn partial_cmp(&self, rhs: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(rhs))
    }
}

impl Ord for Q {
    fn cmp(&self, rhs: &Self) -> std::cmp::Ordering {
        match (self, rhs) {
            (Self::Ket(_), Self::Bra(_)) => std::cmp::Ordering::Less,
            (Self::Bra(_), Self::Ket(_)) => std::cmp::Ordering::Greater,
            (Self::Ket(l), Self::Ket(r)) => l.cmp(r),
            (Self::Bra(l), Self::Bra(r)) => l.cmp(r),
        }
    }
}

impl fmt::Display for Q {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

// axis labels for a matrix acting on `wires` in little-endian order: the most
// significant bit of a row (column) index belongs to the last wire
fn matrix_indices(wires: &[usize]) -> Vec<Q> {
    wires.iter().rev().map(|w| Q::Ket(*w))
        .chain(wires.iter().rev().map(|w| Q::Bra(*w)))
        .collect()
}

/// A dense tensor with labelled qubit-wire axes.
///
/// Every axis has length 2. Tensors of rank 0 are not represented; the
/// smallest tensor is a single-wire operator.
#[derive(Clone, PartialEq, Debug)]
pub struct Tensor {
    indices: Vec<Q>,
    data: nd::ArrayD<C64>,
}

impl Tensor {
    /// Create a new tensor from a square matrix acting on `wires`.
    ///
    /// The matrix must be 2<sup>*k*</sup> × 2<sup>*k*</sup> for *k* wires,
    /// with wire `wires[j]` identified with bit *j* of the row and column
    /// indices. Fails if `wires` contains duplicates or the shapes do not
    /// match.
    pub fn from_matrix(wires: &[usize], matrix: nd::Array2<C64>)
        -> TensorResult<Self>
    {
        let indices = matrix_indices(wires);
        let mb_dup =
            indices.iter().enumerate()
            .find_map(|(k, idx)| {
                indices.iter().skip(k + 1).find(|idx2| *idx2 == idx)
            });
        if let Some(dup) = mb_dup {
            return Err(DuplicateIndex(*dup));
        }
        let dim = 1_usize << wires.len();
        if wires.is_empty() || matrix.shape() != &[dim, dim] {
            let idx_strs: Box<[Q]> = indices.into();
            let array_shape: Box<[usize]> = matrix.shape().into();
            return Err(IncompatibleShape(idx_strs, array_shape));
        }
        let shape: Vec<usize> = vec![2; indices.len()];
        let data =
            matrix.as_standard_layout()
            .into_owned()
            .into_shape(shape)?;
        Ok(Self { indices, data })
    }

    /// Create the identity on wires `0..n`.
    pub fn identity(n: usize) -> TensorResult<Self> {
        let wires: Vec<usize> = (0..n).collect();
        Self::from_matrix(&wires, nd::Array2::eye(1_usize << n))
    }

    /// Return the rank of `self`.
    pub fn rank(&self) -> usize { self.indices.len() }

    /// Return a reference to all indices.
    pub fn indices(&self) -> &[Q] { &self.indices }

    /// Contract `self` with `rhs` over all common wires, consuming both.
    ///
    /// A wire is common if `self` holds its bra and `rhs` holds its ket. The
    /// result holds all non-common indices of `self` followed by those of
    /// `rhs`. Fails if a wire appears on the same side in both operands
    /// without being contracted.
    pub fn contract(self, rhs: Self) -> TensorResult<Self> {
        let mut idx_common: Vec<usize> =
            Vec::with_capacity(self.rank().max(rhs.rank()));
        // check for duplicate bras
        for idx_a in self.indices.iter() {
            if idx_a.is_ket() { continue; }
            let has_match =
                rhs.indices.iter().any(|idx_b| idx_a.matches_with(idx_b));
            let has_dup = rhs.indices.contains(idx_a);
            if has_match {
                idx_common.push(idx_a.wire_index());
            } else if has_dup {
                return Err(ContractDuplicateIndex(*idx_a));
            }
        }
        // check for duplicate kets
        for idx_b in rhs.indices.iter() {
            if idx_b.is_bra() { continue; }
            let has_match = idx_common.contains(&idx_b.wire_index());
            let has_dup = self.indices.contains(idx_b);
            if !has_match && has_dup {
                return Err(ContractDuplicateIndex(*idx_b));
            }
        }
        Self::do_contract(idx_common, self, rhs)
    }

    fn do_contract(idx_common: Vec<usize>, lhs: Self, rhs: Self)
        -> TensorResult<Self>
    {
        let Self { indices: mut idxs_a, data: mut a } = lhs;
        let Self { indices: mut idxs_b, data: mut b } = rhs;

        // swap common indices and corresponding axes to the rightmost positions
        // in a and the leftmost in b
        let n_idx_a = idxs_a.len();
        let n_common = idx_common.len();
        let n_idx_b = idxs_b.len();
        for (k_targ, idx) in idx_common.iter().enumerate() {
            let k_src =
                idxs_a.iter()
                .position(|idx_src| idx_src.is_bra_and(|ix| ix == *idx))
                .ok_or(MissingIndex(Q::Bra(*idx)))?;
            idxs_a.swap(k_src, n_idx_a - n_common + k_targ);
            a.swap_axes(k_src, n_idx_a - n_common + k_targ);

            let k_src =
                idxs_b.iter()
                .position(|idx_src| idx_src.is_ket_and(|ix| ix == *idx))
                .ok_or(MissingIndex(Q::Ket(*idx)))?;
            idxs_b.swap(k_src, k_targ);
            b.swap_axes(k_src, k_targ);
        }

        // reshape to fuse all common and non-common indices together so we can
        // use matmul and then reshape the result to un-fuse
        let dim_noncomm_a = 1_usize << (n_idx_a - n_common);
        let dim_comm = 1_usize << n_common;
        let dim_noncomm_b = 1_usize << (n_idx_b - n_common);
        let a: nd::Array2<C64> =
            a.as_standard_layout()
            .into_owned()
            .into_shape((dim_noncomm_a, dim_comm))?;
        let b: nd::Array2<C64> =
            b.as_standard_layout()
            .into_owned()
            .into_shape((dim_comm, dim_noncomm_b))?;
        let c: nd::Array2<C64> = a.dot(&b);
        let new_idxs: Vec<Q> =
            idxs_a.into_iter().take(n_idx_a - n_common)
            .chain(idxs_b.into_iter().skip(n_common))
            .collect();
        let new_shape: Vec<usize> = vec![2; new_idxs.len()];
        let data = c.into_shape(new_shape)?;
        Ok(Self { indices: new_idxs, data })
    }

    /// Flatten `self` into a 2<sup>*n*</sup> × 2<sup>*n*</sup> matrix over
    /// wires `0..n`, with wire *q* identified with bit *q* of the row and
    /// column indices.
    ///
    /// Fails if `self` does not hold exactly one ket and one bra for every
    /// wire in `0..n`.
    pub fn into_matrix(self, n: usize) -> TensorResult<nd::Array2<C64>> {
        let wires: Vec<usize> = (0..n).collect();
        let target = matrix_indices(&wires);
        if target.len() != self.indices.len() {
            let idx_strs: Box<[Q]> = self.indices.into();
            let array_shape: Box<[usize]> = self.data.shape().into();
            return Err(IncompatibleShape(idx_strs, array_shape));
        }
        let perm: Vec<usize> =
            target.iter()
            .map(|q| {
                self.indices.iter().position(|idx| idx == q)
                    .ok_or(MissingIndex(*q))
            })
            .collect::<TensorResult<_>>()?;
        let dim = 1_usize << n;
        let mat =
            self.data.permuted_axes(perm)
            .as_standard_layout()
            .into_owned()
            .into_shape((dim, dim))?;
        Ok(mat)
    }

    /// Return `true` if `self` and `other` denote the same tensor, up to an
    /// optional threshold.
    ///
    /// Specifically, `self` and `other` must have identical indices and the
    /// modulus of the difference between any two corresponding tensor elements
    /// must be less than `thresh`, which defaults to `1e-12`.
    pub fn approx_eq(&self, other: &Self, thresh: Option<f64>) -> bool {
        let eps = thresh.unwrap_or(1e-12);
        self.indices == other.indices
            && self.data.shape() == other.data.shape()
            && self.data.iter().zip(other.data.iter())
                .all(|(l, r)| (*l - *r).norm() < eps)
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.data, f)?;
        write!(f, "\n{{ ")?;
        let n_idxs = self.indices.len();
        for (k, idx) in self.indices.iter().enumerate() {
            fmt::Display::fmt(idx, f)?;
            if k < n_idxs - 1 { write!(f, ", ")?; }
        }
        write!(f, " }}")?;
        Ok(())
    }
}
