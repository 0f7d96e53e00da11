//! Miscellaneous tools.

use ndarray::{ self as nd, Ix1 };

/// Euclidean norm.
pub fn norm<S>(a: &nd::ArrayBase<S, Ix1>) -> f64
where S: nd::Data<Elem = f64>
{
    a.iter().map(|ak| ak * ak).sum::<f64>().sqrt()
}

/// Return `true` if no element is NaN or infinite.
pub fn all_finite<S, D>(a: &nd::ArrayBase<S, D>) -> bool
where
    S: nd::Data<Elem = f64>,
    D: nd::Dimension,
{
    a.iter().all(|ak| ak.is_finite())
}

// perform the operation `a + v * b` succinctly
pub(crate) fn array_step<S, T>(a: &nd::ArrayBase<S, Ix1>, v: f64, b: &nd::ArrayBase<T, Ix1>)
    -> nd::Array1<f64>
where
    S: nd::Data<Elem = f64>,
    T: nd::Data<Elem = f64>,
{
    nd::Zip::from(a).and(b)
        .map_collect(|ak, bk| ak + v * bk)
}

/// Forward differences `a[k + 1] - a[k]` (`n - 1` values).
pub fn array_diff<S>(a: &nd::ArrayBase<S, Ix1>) -> nd::Array1<f64>
where S: nd::Data<Elem = f64>
{
    a.iter().zip(a.iter().skip(1))
        .map(|(ak, akp1)| *akp1 - *ak)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn norms() {
        let a = nd::array![3.0, -4.0];
        assert_eq!(norm(&a), 5.0);
        assert!(!all_finite(&nd::array![1.0, f64::NAN]));
    }

    #[test]
    fn step_and_diff() {
        let a = nd::array![1.0, 2.0, 4.0];
        assert_eq!(array_step(&a, 0.5, &a), nd::array![1.5, 3.0, 6.0]);
        assert_eq!(array_diff(&a), nd::array![1.0, 2.0]);
    }
}
