//! Galois-field arithmetic over GF(2^m)
//!
//! The field is parameterized by its primitive polynomial, size and generator
//! base so the same machinery serves any small power-of-two field. QRTone
//! itself runs Reed-Solomon over GF(16) with primitive polynomial 0x13 and
//! generator base 1.
//!
//! Multiplication goes through exp/log tables built once at construction:
//! `a*b = exp[(log[a] + log[b]) mod (size-1)]`. Addition and subtraction are
//! both XOR.

use crate::errors::EccError;

/// GF(2^m) field with precomputed exp/log tables.
#[derive(Debug, Clone)]
pub struct GaloisField {
    size: i32,
    generator_base: i32,
    exp_table: Vec<i32>,
    log_table: Vec<i32>,
}

impl GaloisField {
    /// Build the field tables for the given primitive polynomial.
    ///
    /// `size` must be a power of two; the generator alpha is assumed to be 2.
    pub fn new(primitive: i32, size: i32, generator_base: i32) -> Self {
        let mut exp_table = vec![0i32; size as usize];
        let mut log_table = vec![0i32; size as usize];
        let mut x = 1i32;
        for entry in exp_table.iter_mut() {
            *entry = x;
            x *= 2;
            if x >= size {
                x ^= primitive;
                x &= size - 1;
            }
        }
        for i in 0..(size - 1) as usize {
            log_table[exp_table[i] as usize] = i as i32;
        }
        // log_table[0] stays 0 and is never read
        Self {
            size,
            generator_base,
            exp_table,
            log_table,
        }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn generator_base(&self) -> i32 {
        self.generator_base
    }

    pub fn exp(&self, power: i32) -> i32 {
        self.exp_table[power as usize]
    }

    pub fn log(&self, value: i32) -> i32 {
        self.log_table[value as usize]
    }

    /// Addition and subtraction coincide in GF(2^m).
    pub fn add(a: i32, b: i32) -> i32 {
        a ^ b
    }

    pub fn multiply(&self, a: i32, b: i32) -> i32 {
        if a == 0 || b == 0 {
            return 0;
        }
        self.exp_table[((self.log_table[a as usize] + self.log_table[b as usize])
            % (self.size - 1)) as usize]
    }

    pub fn inverse(&self, a: i32) -> i32 {
        self.exp_table[(self.size - self.log_table[a as usize] - 1) as usize]
    }

    /// Build `coefficient * x^degree`.
    pub fn monomial(&self, degree: usize, coefficient: i32) -> GfPoly {
        if coefficient == 0 {
            return GfPoly::zero();
        }
        let mut coefficients = vec![0i32; degree + 1];
        coefficients[0] = coefficient;
        GfPoly::new(&coefficients).expect("monomial coefficients are never empty")
    }
}

/// Polynomial over a [`GaloisField`], highest-degree coefficient first.
///
/// The zero polynomial is represented as `[0]`. Construction strips leading
/// zero coefficients so the leading term of any nonzero polynomial is
/// nonzero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GfPoly {
    coefficients: Vec<i32>,
}

impl GfPoly {
    pub fn new(coefficients: &[i32]) -> Result<Self, EccError> {
        if coefficients.is_empty() {
            return Err(EccError::IllegalArgument {
                reason: "polynomial needs at least one coefficient",
            });
        }
        if coefficients.len() > 1 && coefficients[0] == 0 {
            let first_non_zero = coefficients.iter().position(|&c| c != 0);
            match first_non_zero {
                None => Ok(Self::zero()),
                Some(start) => Ok(Self {
                    coefficients: coefficients[start..].to_vec(),
                }),
            }
        } else {
            Ok(Self {
                coefficients: coefficients.to_vec(),
            })
        }
    }

    pub fn zero() -> Self {
        Self {
            coefficients: vec![0],
        }
    }

    pub fn one() -> Self {
        Self {
            coefficients: vec![1],
        }
    }

    pub fn is_zero(&self) -> bool {
        self.coefficients[0] == 0
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    pub fn coefficients(&self) -> &[i32] {
        &self.coefficients
    }

    /// Coefficient of the `x^degree` term.
    pub fn coefficient(&self, degree: usize) -> i32 {
        self.coefficients[self.coefficients.len() - 1 - degree]
    }

    pub fn multiply_scalar(&self, field: &GaloisField, scalar: i32) -> GfPoly {
        if scalar == 0 {
            return GfPoly::zero();
        }
        if scalar == 1 {
            return self.clone();
        }
        let product: Vec<i32> = self
            .coefficients
            .iter()
            .map(|&c| field.multiply(c, scalar))
            .collect();
        GfPoly::new(&product).expect("scalar product keeps the coefficient count")
    }

    /// Multiply by the monomial `coefficient * x^degree`.
    pub fn multiply_by_monomial(
        &self,
        field: &GaloisField,
        degree: usize,
        coefficient: i32,
    ) -> GfPoly {
        if coefficient == 0 {
            return GfPoly::zero();
        }
        let mut product = vec![0i32; self.coefficients.len() + degree];
        for (i, &c) in self.coefficients.iter().enumerate() {
            product[i] = field.multiply(c, coefficient);
        }
        GfPoly::new(&product).expect("monomial product is never empty")
    }

    /// XOR of coefficient arrays aligned to the highest degree.
    pub fn add(&self, other: &GfPoly) -> GfPoly {
        if self.is_zero() {
            return other.clone();
        }
        if other.is_zero() {
            return self.clone();
        }
        let (smaller, larger) = if self.coefficients.len() <= other.coefficients.len() {
            (&self.coefficients, &other.coefficients)
        } else {
            (&other.coefficients, &self.coefficients)
        };
        let length_diff = larger.len() - smaller.len();
        let mut sum = larger.clone();
        for (i, &c) in smaller.iter().enumerate() {
            sum[i + length_diff] = GaloisField::add(c, larger[i + length_diff]);
        }
        GfPoly::new(&sum).expect("sum is never empty")
    }

    /// Full polynomial product (convolution of coefficients).
    pub fn multiply(&self, field: &GaloisField, other: &GfPoly) -> GfPoly {
        if self.is_zero() || other.is_zero() {
            return GfPoly::zero();
        }
        let mut product = vec![0i32; self.coefficients.len() + other.coefficients.len() - 1];
        for (i, &a) in self.coefficients.iter().enumerate() {
            for (j, &b) in other.coefficients.iter().enumerate() {
                product[i + j] = GaloisField::add(product[i + j], field.multiply(a, b));
            }
        }
        GfPoly::new(&product).expect("product is never empty")
    }

    /// Remainder of the long division of `self` by `other`.
    pub fn divide_remainder(&self, field: &GaloisField, other: &GfPoly) -> Result<GfPoly, EccError> {
        if other.is_zero() {
            return Err(EccError::DivideByZero);
        }
        let mut remainder = self.clone();
        let denominator_leading_term = other.coefficient(other.degree());
        let inverse_denominator = field.inverse(denominator_leading_term);
        while remainder.degree() >= other.degree() && !remainder.is_zero() {
            let degree_difference = remainder.degree() - other.degree();
            let scale = field.multiply(remainder.coefficient(remainder.degree()), inverse_denominator);
            let term = other.multiply_by_monomial(field, degree_difference, scale);
            remainder = remainder.add(&term);
        }
        Ok(remainder)
    }

    /// Horner evaluation of the polynomial at `a`.
    pub fn evaluate_at(&self, field: &GaloisField, a: i32) -> i32 {
        if a == 0 {
            return self.coefficient(0);
        }
        if a == 1 {
            return self
                .coefficients
                .iter()
                .fold(0, |acc, &c| GaloisField::add(acc, c));
        }
        let mut result = self.coefficients[0];
        for &c in &self.coefficients[1..] {
            result = GaloisField::add(field.multiply(a, result), c);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gf16() -> GaloisField {
        GaloisField::new(0x13, 16, 1)
    }

    #[test]
    fn exp_log_tables_are_consistent() {
        let field = gf16();
        for value in 1..16 {
            assert_eq!(value, field.exp(field.log(value)));
        }
    }

    #[test]
    fn multiply_by_inverse_is_identity() {
        let field = gf16();
        for value in 1..16 {
            assert_eq!(1, field.multiply(value, field.inverse(value)));
        }
    }

    #[test]
    fn leading_zeros_are_stripped() {
        let poly = GfPoly::new(&[0, 0, 3, 1]).unwrap();
        assert_eq!(&[3, 1], poly.coefficients());
        assert_eq!(1, poly.degree());
    }

    #[test]
    fn all_zero_collapses_to_zero_polynomial() {
        let poly = GfPoly::new(&[0, 0, 0]).unwrap();
        assert!(poly.is_zero());
        assert_eq!(0, poly.degree());
    }

    #[test]
    fn empty_coefficients_rejected() {
        assert!(GfPoly::new(&[]).is_err());
    }

    #[test]
    fn division_by_zero_fails() {
        let field = gf16();
        let poly = GfPoly::new(&[1, 2, 3]).unwrap();
        assert!(poly.divide_remainder(&field, &GfPoly::zero()).is_err());
    }

    #[test]
    fn division_remainder_has_lower_degree() {
        let field = gf16();
        let dividend = GfPoly::new(&[1, 0, 4, 8, 2]).unwrap();
        let divisor = GfPoly::new(&[1, 3, 5]).unwrap();
        let remainder = dividend.divide_remainder(&field, &divisor).unwrap();
        assert!(remainder.is_zero() || remainder.degree() < divisor.degree());
    }

    #[test]
    fn evaluate_matches_direct_expansion() {
        let field = gf16();
        // p(x) = 2x^2 + 3x + 5
        let poly = GfPoly::new(&[2, 3, 5]).unwrap();
        for a in 0..16 {
            let expected = GaloisField::add(
                GaloisField::add(field.multiply(2, field.multiply(a, a)), field.multiply(3, a)),
                5,
            );
            assert_eq!(expected, poly.evaluate_at(&field, a));
        }
    }
}
