//! Standard target unitaries.

use std::f64::consts::TAU;
use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::c;

/// The 2<sup>*Q*</sup> × 2<sup>*Q*</sup> identity.
pub fn identity(n_qubits: usize) -> nd::Array2<C64> {
    nd::Array2::eye(1 << n_qubits)
}

/// The quantum Fourier transform on *Q* qubits,
/// ```text
/// F[j, k] = ω^(j k) / √N
/// ```
/// with *N* = 2<sup>*Q*</sup> and *ω* = *e*<sup>2π*i*/*N*</sup>.
pub fn qft(n_qubits: usize) -> nd::Array2<C64> {
    let n = 1_usize << n_qubits;
    let norm = (n as f64).sqrt().recip();
    // ω^(jk) only depends on jk mod N
    nd::Array2::from_shape_fn(
        (n, n),
        |(j, k)| c!(norm, e TAU * ((j * k) % n) as f64 / n as f64),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qft_is_unitary() {
        for q in 1..=4 {
            let f = qft(q);
            let prod = f.t().mapv(|x| x.conj()).dot(&f);
            let eye = identity(q);
            assert!(prod.iter().zip(&eye).all(|(a, b)| (a - b).norm() < 1e-12));
        }
    }

    #[test]
    fn qft_one_qubit_is_hadamard() {
        let h = crate::gate::Gate::H.matrix(&[]).unwrap();
        assert!(qft(1).iter().zip(&h).all(|(a, b)| (a - b).norm() < 1e-12));
    }
}
