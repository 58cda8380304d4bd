//! Systematic Reed-Solomon encoder and decoder
//!
//! The encoder appends `e` parity symbols to `k` data symbols by dividing the
//! shifted data polynomial by the generator `g(x) = prod (x - alpha^(b+i))`.
//! Generator polynomials are cached by degree and the cache only grows.
//!
//! The decoder runs the extended Euclidean algorithm over the syndrome
//! polynomial, locates errors with a Chien search and computes magnitudes
//! with Forney's formula.

use crate::errors::EccError;

use super::galois::{GaloisField, GfPoly};

/// Reed-Solomon encoder owning its field and generator cache.
#[derive(Debug, Clone)]
pub struct ReedSolomonEncoder {
    field: GaloisField,
    cached_generators: Vec<GfPoly>,
}

impl ReedSolomonEncoder {
    pub fn new(primitive: i32, size: i32, generator_base: i32) -> Self {
        Self {
            field: GaloisField::new(primitive, size, generator_base),
            cached_generators: vec![GfPoly::one()],
        }
    }

    pub fn field(&self) -> &GaloisField {
        &self.field
    }

    #[cfg(test)]
    pub(crate) fn cached_generator_count(&self) -> usize {
        self.cached_generators.len()
    }

    /// Generator polynomial of the given degree, extending the cache from the
    /// last known generator when needed.
    fn build_generator(&mut self, degree: usize) -> &GfPoly {
        while self.cached_generators.len() <= degree {
            let d = self.cached_generators.len();
            let factor = GfPoly::new(&[
                1,
                self.field
                    .exp(d as i32 - 1 + self.field.generator_base()),
            ])
            .expect("generator factor is never empty");
            let next = self
                .cached_generators
                .last()
                .expect("cache holds at least the degree-0 generator")
                .multiply(&self.field, &factor);
            self.cached_generators.push(next);
        }
        &self.cached_generators[degree]
    }

    /// Encode in place: the last `ecc_count` entries of `codeword` are
    /// replaced by parity symbols, the data entries are untouched.
    pub fn encode(&mut self, codeword: &mut [i32], ecc_count: usize) -> Result<(), EccError> {
        let data_count = codeword.len() - ecc_count;
        self.build_generator(ecc_count);
        let generator = &self.cached_generators[ecc_count];
        let info = GfPoly::new(&codeword[..data_count])?;
        let shifted = info.multiply_by_monomial(&self.field, ecc_count, 1);
        let remainder = shifted.divide_remainder(&self.field, generator)?;
        let parity = remainder.coefficients();
        let leading_zeros = ecc_count - parity.len();
        for slot in codeword[data_count..data_count + leading_zeros].iter_mut() {
            *slot = 0;
        }
        codeword[data_count + leading_zeros..].copy_from_slice(parity);
        Ok(())
    }
}

/// Decode in place, XOR-ing the Forney magnitudes at the located error
/// positions. `fixed_errors` is incremented by the number of corrected
/// symbols on success only.
pub fn decode(
    field: &GaloisField,
    codeword: &mut [i32],
    ecc_count: usize,
    fixed_errors: &mut i32,
) -> Result<(), EccError> {
    let poly = GfPoly::new(codeword)?;
    let mut syndrome_coefficients = vec![0i32; ecc_count];
    let mut no_error = true;
    for i in 0..ecc_count {
        let eval = poly.evaluate_at(field, field.exp(i as i32 + field.generator_base()));
        syndrome_coefficients[ecc_count - 1 - i] = eval;
        if eval != 0 {
            no_error = false;
        }
    }
    if no_error {
        return Ok(());
    }
    let syndrome = GfPoly::new(&syndrome_coefficients)?;
    let mono = field.monomial(ecc_count, 1);
    let (sigma, omega) = run_euclidean_algorithm(field, mono, syndrome, ecc_count)?;
    let error_locations = find_error_locations(&sigma, field)?;
    let error_magnitudes = find_error_magnitudes(&omega, field, &error_locations);
    for (&location, &magnitude) in error_locations.iter().zip(&error_magnitudes) {
        let log = field.log(location) as usize;
        if log >= codeword.len() {
            return Err(EccError::ReedSolomon {
                reason: "bad error location",
            });
        }
        let position = codeword.len() - 1 - log;
        codeword[position] = GaloisField::add(codeword[position], magnitude);
    }
    *fixed_errors += error_locations.len() as i32;
    Ok(())
}

/// Extended Euclidean algorithm yielding the error locator `sigma` and error
/// evaluator `omega`, normalized so that `sigma(0) = 1`.
fn run_euclidean_algorithm(
    field: &GaloisField,
    a: GfPoly,
    b: GfPoly,
    r_degree: usize,
) -> Result<(GfPoly, GfPoly), EccError> {
    let (a, b) = if a.degree() < b.degree() { (b, a) } else { (a, b) };
    let mut r_last = a;
    let mut r = b;
    let mut t_last = GfPoly::zero();
    let mut t = GfPoly::one();

    while r.degree() >= r_degree / 2 {
        let r_last_last = r_last;
        let t_last_last = t_last;
        r_last = r.clone();
        t_last = t.clone();

        if r_last.is_zero() {
            // Euclidean algorithm already terminated
            return Err(EccError::ReedSolomon {
                reason: "r_(i-1) was zero",
            });
        }
        r = r_last_last;
        let mut q = GfPoly::zero();
        let denominator_leading_term = r_last.coefficient(r_last.degree());
        let dlt_inverse = field.inverse(denominator_leading_term);
        while r.degree() >= r_last.degree() && !r.is_zero() {
            let degree_diff = r.degree() - r_last.degree();
            let scale = field.multiply(r.coefficient(r.degree()), dlt_inverse);
            q = q.add(&field.monomial(degree_diff, scale));
            r = r.add(&r_last.multiply_by_monomial(field, degree_diff, scale));
        }
        t = q.multiply(field, &t_last).add(&t_last_last);

        if r.degree() >= r_last.degree() {
            return Err(EccError::IllegalState {
                reason: "division did not reduce the remainder degree",
            });
        }
    }

    let sigma_tilde_at_zero = t.coefficient(0);
    if sigma_tilde_at_zero == 0 {
        return Err(EccError::ReedSolomon {
            reason: "sigma(0) was zero",
        });
    }
    let inverse = field.inverse(sigma_tilde_at_zero);
    Ok((
        t.multiply_scalar(field, inverse),
        r.multiply_scalar(field, inverse),
    ))
}

/// Chien search for the inverses of the error locator roots.
fn find_error_locations(
    error_locator: &GfPoly,
    field: &GaloisField,
) -> Result<Vec<i32>, EccError> {
    let num_errors = error_locator.degree();
    if num_errors == 1 {
        return Ok(vec![error_locator.coefficient(1)]);
    }
    let mut locations = Vec::with_capacity(num_errors);
    for i in 0..field.size() {
        if locations.len() >= num_errors {
            break;
        }
        if error_locator.evaluate_at(field, i) == 0 {
            locations.push(field.inverse(i));
        }
    }
    if locations.len() != num_errors {
        return Err(EccError::ReedSolomon {
            reason: "error locator degree does not match its root count",
        });
    }
    Ok(locations)
}

/// Forney formula for the error magnitude at each located position.
fn find_error_magnitudes(
    error_evaluator: &GfPoly,
    field: &GaloisField,
    error_locations: &[i32],
) -> Vec<i32> {
    let mut magnitudes = Vec::with_capacity(error_locations.len());
    for (i, &location) in error_locations.iter().enumerate() {
        let xi_inverse = field.inverse(location);
        let mut denominator = 1;
        for (j, &other) in error_locations.iter().enumerate() {
            if i != j {
                denominator = field.multiply(
                    denominator,
                    GaloisField::add(1, field.multiply(other, xi_inverse)),
                );
            }
        }
        let mut magnitude = field.multiply(
            error_evaluator.evaluate_at(field, xi_inverse),
            field.inverse(denominator),
        );
        if field.generator_base() != 0 {
            magnitude = field.multiply(magnitude, xi_inverse);
        }
        magnitudes.push(magnitude);
    }
    magnitudes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qrtone_encoder() -> ReedSolomonEncoder {
        ReedSolomonEncoder::new(0x13, 16, 1)
    }

    #[test]
    fn clean_codeword_decodes_unchanged() {
        let mut encoder = qrtone_encoder();
        let mut codeword = vec![0x0, 0x4, 0x6, 0xE, 0x9, 0x6, 0x3, 0x6, 0xF, 0x0, 0x0, 0x0];
        encoder.encode(&mut codeword, 2).unwrap();
        let reference = codeword.clone();
        let mut fixed = 0;
        decode(encoder.field(), &mut codeword, 2, &mut fixed).unwrap();
        assert_eq!(reference, codeword);
        assert_eq!(0, fixed);
    }

    #[test]
    fn single_error_is_corrected() {
        let mut encoder = qrtone_encoder();
        let mut codeword = vec![0x6, 0x8, 0x6, 0x5, 0x6, 0xC, 0x6, 0xC, 0x6, 0xF, 0x0, 0x0, 0x0, 0x0];
        encoder.encode(&mut codeword, 2).unwrap();
        let reference = codeword.clone();
        codeword[3] ^= 0xB;
        let mut fixed = 0;
        decode(encoder.field(), &mut codeword, 2, &mut fixed).unwrap();
        assert_eq!(reference, codeword);
        assert_eq!(1, fixed);
    }

    #[test]
    fn three_errors_corrected_at_high_ecc() {
        let mut encoder = qrtone_encoder();
        let mut codeword = vec![0x1, 0xF, 0x2, 0xE, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0];
        encoder.encode(&mut codeword, 6).unwrap();
        let reference = codeword.clone();
        codeword[0] ^= 0x5;
        codeword[4] ^= 0x9;
        codeword[8] ^= 0x3;
        let mut fixed = 0;
        decode(encoder.field(), &mut codeword, 6, &mut fixed).unwrap();
        assert_eq!(reference, codeword);
        assert_eq!(3, fixed);
    }

    #[test]
    fn generator_cache_grows_monotonically() {
        let mut encoder = qrtone_encoder();
        assert_eq!(1, encoder.cached_generator_count());
        let mut codeword = vec![1, 2, 3, 4, 0, 0];
        encoder.encode(&mut codeword, 2).unwrap();
        assert_eq!(3, encoder.cached_generator_count());
        let mut codeword = vec![1, 2, 3, 4, 0, 0, 0, 0, 0, 0];
        encoder.encode(&mut codeword, 6).unwrap();
        assert_eq!(7, encoder.cached_generator_count());
        // re-encoding at a lower degree reuses the cache
        let mut codeword = vec![5, 6, 0, 0, 0, 0];
        encoder.encode(&mut codeword, 4).unwrap();
        assert_eq!(7, encoder.cached_generator_count());
    }

    #[test]
    fn parity_padding_handles_short_remainders() {
        // All-zero data yields an all-zero remainder, exercising the leading
        // zero padding of the parity span.
        let mut encoder = qrtone_encoder();
        let mut codeword = vec![0; 12];
        encoder.encode(&mut codeword, 4).unwrap();
        assert!(codeword.iter().all(|&s| s == 0));
    }
}
