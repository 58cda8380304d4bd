//! Validation of the DSP primitives against known reference data: the
//! yearly sunspot series for the quantile estimator and peak finder, a
//! reference Hann curve and a sampled Gaussian for the peak interpolation.

use approx::assert_relative_eq;
use qrtone_core::signal_processing::{
    find_peak_location, hann_window, quadratic_interpolation, PeakFinder, Percentile,
};

/// Yearly mean sunspot numbers, 1701..2000.
const SUNSPOTS: [f64; 300] = [
    11.0, 16.0, 23.0, 36.0, 58.0, 29.0, 20.0, 10.0, 8.0, 3.0, 0.0, 0.0, 2.0, 11.0, 27.0, 47.0,
    63.0, 60.0, 39.0, 28.0, 26.0, 22.0, 11.0, 21.0, 40.0, 78.0, 122.0, 103.0, 73.0, 47.0, 35.0,
    11.0, 5.0, 16.0, 34.0, 70.0, 81.0, 111.0, 101.0, 73.0, 40.0, 20.0, 16.0, 5.0, 11.0, 22.0,
    40.0, 60.0, 80.9, 83.4, 47.7, 47.8, 30.7, 12.2, 9.6, 10.2, 32.4, 47.6, 54.0, 62.9, 85.9, 61.2,
    45.1, 36.4, 20.9, 11.4, 37.8, 69.8, 106.1, 100.8, 81.6, 66.5, 34.8, 30.6, 7.0, 19.8, 92.5,
    154.4, 125.9, 84.8, 68.1, 38.5, 22.8, 10.2, 24.1, 82.9, 132.0, 130.9, 118.1, 89.9, 66.6, 60.0,
    46.9, 41.0, 21.3, 16.0, 6.4, 4.1, 6.8, 14.5, 34.0, 45.0, 43.1, 47.5, 42.2, 28.1, 10.1, 8.1,
    2.5, 0.0, 1.4, 5.0, 12.2, 13.9, 35.4, 45.8, 41.1, 30.1, 23.9, 15.6, 6.6, 4.0, 1.8, 8.5, 16.6,
    36.3, 49.6, 64.2, 67.0, 70.9, 47.8, 27.5, 8.5, 13.2, 56.9, 121.5, 138.3, 103.2, 85.7, 64.6,
    36.7, 24.2, 10.7, 15.0, 40.1, 61.5, 98.5, 124.7, 96.3, 66.6, 64.5, 54.1, 39.0, 20.6, 6.7, 4.3,
    22.7, 54.8, 93.8, 95.8, 77.2, 59.1, 44.0, 47.0, 30.5, 16.3, 7.3, 37.6, 74.0, 139.0, 111.2,
    101.6, 66.2, 44.7, 17.0, 11.3, 12.4, 3.4, 6.0, 32.3, 54.3, 59.7, 63.7, 63.5, 52.2, 25.4, 13.1,
    6.8, 6.3, 7.1, 35.6, 73.0, 85.1, 78.0, 64.0, 41.8, 26.2, 26.7, 12.1, 9.5, 2.7, 5.0, 24.4,
    42.0, 63.5, 53.8, 62.0, 48.5, 43.9, 18.6, 5.7, 3.6, 1.4, 9.6, 47.4, 57.1, 103.9, 80.6, 63.6,
    37.6, 26.1, 14.2, 5.8, 16.7, 44.3, 63.9, 69.0, 77.8, 64.9, 35.7, 21.2, 11.1, 5.7, 8.7, 36.1,
    79.7, 114.4, 109.6, 88.8, 67.8, 47.5, 30.6, 16.3, 9.6, 33.2, 92.6, 151.6, 136.3, 134.7, 83.9,
    69.4, 31.5, 13.9, 4.4, 38.0, 141.7, 190.2, 184.8, 159.0, 112.3, 53.9, 37.5, 27.9, 10.2, 15.1,
    47.0, 93.8, 105.9, 105.5, 104.5, 66.6, 68.9, 38.0, 34.5, 15.5, 12.6, 27.5, 92.5, 155.4, 154.6,
    140.4, 115.9, 66.6, 45.9, 17.9, 13.4, 29.3, 91.9, 149.2, 153.6, 135.9, 114.2, 70.1, 50.2,
    20.5, 14.3, 31.3, 89.9, 151.5, 149.3,
];

#[test]
fn p_square_median_of_the_sunspot_series() {
    let mut percentile = Percentile::new(0.5);
    for &value in SUNSPOTS.iter() {
        percentile.add(value);
    }
    assert_relative_eq!(41.360847658017306, percentile.result(), epsilon = 1e-6);
}

#[test]
fn every_local_maximum_of_the_sunspot_series_is_found() {
    let expected = [
        5i64, 17, 27, 38, 50, 52, 61, 69, 78, 87, 102, 104, 116, 130, 137, 148, 160, 164, 170,
        177, 183, 193, 198, 205, 207, 217, 228, 237, 247, 257, 268, 272, 279, 290, 299,
    ];
    let mut finder = PeakFinder::new(-1, -1);
    let mut found = Vec::new();
    for (i, &value) in SUNSPOTS.iter().enumerate() {
        if finder.add(i as i64 + 1, value as f32) {
            found.push(finder.last_peak_index());
        }
    }
    assert_eq!(expected.to_vec(), found);
}

#[test]
fn hann_window_matches_the_reference_curve() {
    let reference = [
        0.0f32,
        0.0039426493,
        0.015708419,
        0.035111757,
        0.06184666,
        0.095491503,
        0.13551569,
        0.18128801,
        0.2320866,
        0.28711035,
        0.3454915,
        0.40630934,
        0.46860474,
        0.53139526,
        0.59369066,
        0.6545085,
        0.71288965,
        0.7679134,
        0.81871199,
        0.86448431,
        0.9045085,
        0.93815334,
        0.96488824,
        0.98429158,
        0.99605735,
        1.0,
        0.99605735,
        0.98429158,
        0.96488824,
        0.93815334,
        0.9045085,
        0.86448431,
        0.81871199,
        0.7679134,
        0.71288965,
        0.6545085,
        0.59369066,
        0.53139526,
        0.46860474,
        0.40630934,
        0.3454915,
        0.28711035,
        0.2320866,
        0.18128801,
        0.13551569,
        0.095491503,
        0.06184666,
        0.035111757,
        0.015708419,
        0.0039426493,
        0.0,
    ];
    let mut signal = vec![1.0f32; reference.len()];
    hann_window(&mut signal, reference.len(), 0);
    for (&expected, &actual) in reference.iter().zip(&signal) {
        assert_relative_eq!(expected, actual, epsilon = 1e-6);
    }
}

#[test]
fn gaussian_peak_location_recovered_from_coarse_samples() {
    const SAMPLES: usize = 521;
    const STRIDE: usize = 35;
    let sigma = 0.5;
    let mut samples = [0.0f64; SAMPLES];
    let mut max_value = 0.0;
    let mut max_index = 0;
    for (i, sample) in samples.iter_mut().enumerate() {
        *sample = (-0.5
            * ((i as f64 - SAMPLES as f64 / 2.0) / (sigma * SAMPLES as f64 / 2.0)).powi(2))
        .exp();
        if *sample > max_value {
            max_value = *sample;
            max_index = i;
        }
    }
    // coarse evaluation every STRIDE samples
    let mut window_value = 0.0;
    let mut window_index = 0;
    let mut i = STRIDE;
    while i < SAMPLES {
        if samples[i] > window_value {
            window_value = samples[i];
            window_index = i;
        }
        i += STRIDE;
    }
    let estimated = find_peak_location(
        samples[window_index - STRIDE],
        samples[window_index],
        samples[window_index + STRIDE],
        window_index as i64,
        STRIDE,
    );
    assert!(
        (estimated - max_index as i64).abs() <= 1,
        "estimated {estimated}, true peak {max_index}"
    );

    let (_, height, _) = quadratic_interpolation(
        samples[window_index - STRIDE],
        samples[window_index],
        samples[window_index + STRIDE],
    );
    assert_relative_eq!(1.0, height, epsilon = 1e-3);
}
