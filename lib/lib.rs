//! Metaheuristic search for quantum circuits that approximate a target
//! unitary.
//!
//! A circuit is an ordered list of gates from a small [catalog][gate] applied
//! to chosen qubits with real parameters. Given a target 2<sup>*Q*</sup> ×
//! 2<sup>*Q*</sup> unitary and an [alphabet] of allowed gates, the searches in
//! [`search`] propose, recombine and select circuits, scoring each one by the
//! [trace distance][distance::trace_distance] between its unitary and the
//! target:
//! ```text
//! d(U, V) = 1 - |Tr(U^† V)| / 2^Q
//! ```
//! which vanishes exactly when the two agree up to a global phase.
//!
//! - [`gate`] and [`instruction`] describe individual operations.
//! - [`circuit`] holds instruction sequences and exports them as OpenQASM 2.0.
//! - [`compose`] computes circuit unitaries by successive contraction of
//! [tensors][tensor] over qubit wires.
//! - [`search`] implements random search, a genetic algorithm, and (memetic)
//! group leader optimization over a shared evaluation core.
//! - [`refine`] polishes the continuous parameters of a fixed circuit
//! structure by basin hopping.
//!
//! # Further reading
//! - A. Daskin, S. Kais, "Decomposition of unitary matrices for finding quantum
//! circuits: Application to molecular Hamiltonians."
//! [arXiv:1004.2242](https://arxiv.org/abs/1004.2242)
//! - A. Daskin, A. Grama, G. Kollias, S. Kais, "Universal programmable quantum
//! circuit schemes to emulate an operator." [J. Chem. Phys. 137,
//! 234112](https://doi.org/10.1063/1.4772185)
//!

pub mod gate;
pub mod instruction;
pub mod circuit;
pub mod tensor;
pub mod compose;
pub mod distance;
pub mod target;
pub mod alphabet;
pub mod search;
pub mod refine;

pub extern crate num_complex;
/// Handy macro to create `num_complex::Complex64`s from more natural and
/// succinct syntax.
///
/// ```
/// use std::f64::consts::PI;
/// use num_complex::Complex64;
/// use qcd::c;
///
/// assert_eq!( c!(i (-1.0)),    Complex64::new(0.0, -1.0)      );
/// assert_eq!( c!(e PI),        Complex64::cis(PI)             );
/// assert_eq!( c!(1.0),         Complex64::new(1.0, 0.0)       );
/// assert_eq!( c!(1.0 + i 1.0), Complex64::new(1.0, 1.0)       );
/// assert_eq!( c!(1.0 - i 1.0), Complex64::new(1.0, -1.0)      );
/// assert_eq!( c!(1.0 + 1.0 i), Complex64::new(1.0, 1.0)       );
/// assert_eq!( c!(1.0 - 1.0 i), Complex64::new(1.0, -1.0)      );
/// assert_eq!( c!(1.0, 1.0),    Complex64::new(1.0, 1.0)       );
/// assert_eq!( c!(1.0, e PI),   Complex64::from_polar(1.0, PI) );
/// ```
#[macro_export]
macro_rules! c {
    ( i $im:expr )
        => { $crate::num_complex::Complex64::new(0.0, $im) };
    ( e $ph:expr )
        => { $crate::num_complex::Complex64::cis($ph) };
    ( $re:expr )
        => { $crate::num_complex::Complex64::new($re, 0.0) };
    ( $re:literal + i $im:literal )
        => { $crate::num_complex::Complex64::new($re, $im) };
    ( $re:literal - i $im:literal )
        => { $crate::num_complex::Complex64::new($re, -$im) };
    ( $re:literal + $im:literal i )
        => { $crate::num_complex::Complex64::new($re, $im) };
    ( $re:literal - $im:literal i )
        => { $crate::num_complex::Complex64::new($re, -$im) };
    ( $r:expr, e $ph:expr )
        => { $crate::num_complex::Complex64::from_polar($r, $ph) };
    ( $re:expr, $im:expr )
        => { $crate::num_complex::Complex64::new($re, $im) };
}
