//! Acoustic feature extraction for speaker diarization.
//!
//! Summarizes a speech segment into a voice feature vector: energy and
//! zero-crossing rate, spectral shape over a windowed FFT, fundamental
//! frequency (autocorrelation + cepstrum), the first three formants, an
//! approximate MFCC vector, speaking rate and pause ratio, and the
//! voice-quality measures (HNR, jitter, shimmer). Degenerate input yields
//! neutral features, never an error.

use crate::defaults;
use rustfft::{FftPlanner, num_complex::Complex};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Coarse gender estimate from fundamental frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenderEstimate {
    Male,
    Female,
    Unknown,
}

/// Acoustic descriptors summarizing one speech segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceFeatures {
    /// Overall RMS energy of the segment.
    pub energy: f32,
    /// Sign changes per sample.
    pub zero_crossing_rate: f32,
    /// Power-weighted mean frequency, in Hz.
    pub spectral_centroid: f32,
    /// Frequency below which 85% of the power lies, in Hz.
    pub spectral_rolloff: f32,
    /// Power-weighted spread around the centroid, in Hz.
    pub spectral_bandwidth: f32,
    /// Median fundamental frequency over voiced frames, in Hz (0 = unvoiced).
    pub fundamental_freq: f32,
    /// First three formant frequencies, in Hz (0 = not found).
    pub formants: [f32; 3],
    /// Approximate MFCC vector.
    pub mfcc: Vec<f32>,
    /// Energy-envelope peaks per second (syllable-rate estimate).
    pub speaking_rate: f32,
    /// Fraction of low-energy frames.
    pub pause_ratio: f32,
    /// Harmonic-to-noise ratio in dB, clamped to [0, 30].
    pub hnr: f32,
    /// Relative frame-to-frame F0 deviation.
    pub jitter: f32,
    /// Relative frame-to-frame amplitude deviation.
    pub shimmer: f32,
    /// Summary voice-quality score in [0, 1].
    pub voice_quality: f32,
    /// Coarse gender estimate from F0.
    pub gender: GenderEstimate,
}

impl Default for VoiceFeatures {
    fn default() -> Self {
        Self {
            energy: 0.0,
            zero_crossing_rate: 0.0,
            spectral_centroid: 0.0,
            spectral_rolloff: 0.0,
            spectral_bandwidth: 0.0,
            fundamental_freq: 0.0,
            formants: [0.0; 3],
            mfcc: vec![0.0; defaults::MFCC_COEFFS],
            speaking_rate: 0.0,
            pause_ratio: 0.0,
            hnr: 0.0,
            jitter: 0.0,
            shimmer: 0.0,
            voice_quality: 0.0,
            gender: GenderEstimate::Unknown,
        }
    }
}

impl VoiceFeatures {
    /// True when the segment produced no usable acoustic evidence.
    pub fn is_neutral(&self) -> bool {
        self.energy < defaults::EPSILON
    }
}

/// Expected formant bands in Hz: (low, high) for F1, F2, F3.
const FORMANT_BANDS: [(f32, f32); 3] = [(250.0, 900.0), (850.0, 2500.0), (2300.0, 3500.0)];

/// Extracts voice features from raw f32 samples.
pub struct FeatureExtractor {
    sample_rate: u32,
}

impl FeatureExtractor {
    /// Creates an extractor for the given sample rate.
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    /// Extracts the full feature vector from a segment.
    ///
    /// Segments shorter than one analysis frame, or silent throughout,
    /// return neutral features.
    pub fn extract(&self, samples: &[f32]) -> VoiceFeatures {
        if samples.len() < defaults::FRAME_SIZE {
            return VoiceFeatures::default();
        }

        let energy = rms(samples);
        if energy < defaults::EPSILON {
            return VoiceFeatures::default();
        }

        let frames = self.frames(samples);
        let frame_rms: Vec<f32> = frames.iter().map(|f| rms(f)).collect();
        let max_rms = frame_rms.iter().cloned().fold(0.0f32, f32::max);
        let voiced_threshold = (0.2 * max_rms).max(defaults::EPSILON);
        let voiced: Vec<bool> = frame_rms.iter().map(|&r| r >= voiced_threshold).collect();

        let spectrum = self.mean_power_spectrum(&frames, &voiced);
        let (centroid, rolloff, bandwidth) = self.spectral_shape(&spectrum);

        let (f0_track, autocorr_peaks) = self.pitch_track(&frames, &voiced);
        let fundamental_freq = median(&f0_track);
        let formants = self.find_formants(&spectrum);
        let mfcc = self.mfcc(&spectrum);

        let duration = samples.len() as f32 / self.sample_rate as f32;
        let speaking_rate = self.speaking_rate(&frame_rms, duration);
        let pause_count = voiced.iter().filter(|v| !**v).count();
        let pause_ratio = pause_count as f32 / voiced.len().max(1) as f32;

        let hnr = hnr_db(&autocorr_peaks);
        let jitter = relative_deviation(&f0_track);
        let shimmer = {
            let voiced_amps: Vec<f32> = frame_rms
                .iter()
                .zip(&voiced)
                .filter(|(_, v)| **v)
                .map(|(r, _)| *r)
                .collect();
            relative_deviation(&voiced_amps)
        };
        let voice_quality = voice_quality_score(hnr, jitter, shimmer);
        let gender = estimate_gender(fundamental_freq);

        VoiceFeatures {
            energy,
            zero_crossing_rate: zero_crossing_rate(samples),
            spectral_centroid: centroid,
            spectral_rolloff: rolloff,
            spectral_bandwidth: bandwidth,
            fundamental_freq,
            formants,
            mfcc,
            speaking_rate,
            pause_ratio,
            hnr,
            jitter,
            shimmer,
            voice_quality,
            gender,
        }
    }

    /// Splits the segment into hopped analysis frames.
    fn frames<'a>(&self, samples: &'a [f32]) -> Vec<&'a [f32]> {
        let mut frames = Vec::new();
        let mut start = 0;
        while start + defaults::FRAME_SIZE <= samples.len() {
            frames.push(&samples[start..start + defaults::FRAME_SIZE]);
            start += defaults::HOP_SIZE;
        }
        frames
    }

    /// Averaged Hann-windowed power spectrum over voiced frames.
    ///
    /// Falls back to all frames when nothing is voiced.
    fn mean_power_spectrum(&self, frames: &[&[f32]], voiced: &[bool]) -> Vec<f32> {
        let bins = defaults::FRAME_SIZE / 2 + 1;
        let mut accum = vec![0.0f32; bins];
        let mut count = 0usize;

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(defaults::FRAME_SIZE);
        let hann = hann_window(defaults::FRAME_SIZE);

        let use_all = !voiced.iter().any(|v| *v);
        for (frame, &is_voiced) in frames.iter().zip(voiced) {
            if !is_voiced && !use_all {
                continue;
            }
            let mut buf: Vec<Complex<f32>> = frame
                .iter()
                .zip(&hann)
                .map(|(s, w)| Complex::new(s * w, 0.0))
                .collect();
            fft.process(&mut buf);
            for (k, acc) in accum.iter_mut().enumerate() {
                *acc += buf[k].norm_sqr();
            }
            count += 1;
        }

        if count > 0 {
            for acc in &mut accum {
                *acc /= count as f32;
            }
        }
        accum
    }

    /// Centroid, 85% rolloff, and bandwidth of a power spectrum.
    fn spectral_shape(&self, spectrum: &[f32]) -> (f32, f32, f32) {
        let total: f32 = spectrum.iter().sum();
        if total < defaults::EPSILON {
            return (0.0, 0.0, 0.0);
        }
        let bin_hz = self.sample_rate as f32 / defaults::FRAME_SIZE as f32;

        let centroid: f32 = spectrum
            .iter()
            .enumerate()
            .map(|(k, p)| k as f32 * bin_hz * p)
            .sum::<f32>()
            / total;

        let mut cumulative = 0.0;
        let mut rolloff = 0.0;
        for (k, p) in spectrum.iter().enumerate() {
            cumulative += p;
            if cumulative >= 0.85 * total {
                rolloff = k as f32 * bin_hz;
                break;
            }
        }

        let variance: f32 = spectrum
            .iter()
            .enumerate()
            .map(|(k, p)| {
                let d = k as f32 * bin_hz - centroid;
                d * d * p
            })
            .sum::<f32>()
            / total;

        (centroid, rolloff, variance.sqrt())
    }

    /// Per-frame F0 candidates combining autocorrelation and cepstrum, plus
    /// the normalized autocorrelation peaks used for HNR.
    fn pitch_track(&self, frames: &[&[f32]], voiced: &[bool]) -> (Vec<f32>, Vec<f32>) {
        let min_lag = (self.sample_rate as f32 / defaults::F0_MAX) as usize;
        let max_lag = ((self.sample_rate as f32 / defaults::F0_MIN) as usize)
            .min(defaults::FRAME_SIZE - 1);

        let mut track = Vec::new();
        let mut peaks = Vec::new();
        for (frame, &is_voiced) in frames.iter().zip(voiced) {
            if !is_voiced {
                continue;
            }
            let (ac_f0, ac_peak) = self.autocorr_f0(frame, min_lag, max_lag);
            let cep_f0 = self.cepstral_f0(frame, min_lag, max_lag);

            let candidate = match (ac_f0, cep_f0) {
                // Agreeing estimators reinforce each other
                (Some(a), Some(c)) if (a - c).abs() / a.max(c) < 0.2 => Some((a + c) / 2.0),
                (Some(a), _) => Some(a),
                (None, Some(c)) => Some(c),
                (None, None) => None,
            };
            if let Some(f0) = candidate {
                if (defaults::F0_MIN..=defaults::F0_MAX).contains(&f0) {
                    track.push(f0);
                    peaks.push(ac_peak);
                }
            }
        }
        (track, peaks)
    }

    /// Autocorrelation pitch candidate: the strongest normalized peak in the
    /// lag range, accepted above 0.3.
    fn autocorr_f0(&self, frame: &[f32], min_lag: usize, max_lag: usize) -> (Option<f32>, f32) {
        let r0: f32 = frame.iter().map(|s| s * s).sum();
        if r0 < defaults::EPSILON {
            return (None, 0.0);
        }

        let mut best_lag = 0usize;
        let mut best_val = 0.0f32;
        for lag in min_lag..=max_lag {
            let r: f32 = frame[..frame.len() - lag]
                .iter()
                .zip(&frame[lag..])
                .map(|(a, b)| a * b)
                .sum();
            let normalized = r / r0;
            if normalized > best_val {
                best_val = normalized;
                best_lag = lag;
            }
        }

        if best_val > 0.3 && best_lag > 0 {
            (Some(self.sample_rate as f32 / best_lag as f32), best_val)
        } else {
            (None, best_val.max(0.0))
        }
    }

    /// Cepstral pitch candidate: peak quefrency of the real cepstrum within
    /// the lag range.
    fn cepstral_f0(&self, frame: &[f32], min_lag: usize, max_lag: usize) -> Option<f32> {
        let n = defaults::FRAME_SIZE;
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n);
        let hann = hann_window(n);

        let mut buf: Vec<Complex<f32>> = frame
            .iter()
            .zip(&hann)
            .map(|(s, w)| Complex::new(s * w, 0.0))
            .collect();
        fft.process(&mut buf);

        let mut log_mag: Vec<Complex<f32>> = buf
            .iter()
            .map(|c| Complex::new((c.norm() + defaults::EPSILON).ln(), 0.0))
            .collect();
        fft.process(&mut log_mag);

        let max_lag = max_lag.min(n / 2);
        let mut best_lag = 0usize;
        let mut best_val = f32::MIN;
        for lag in min_lag..=max_lag {
            let v = log_mag[lag].re.abs();
            if v > best_val {
                best_val = v;
                best_lag = lag;
            }
        }

        // The cepstral peak must stand out against the neighborhood mean
        let window = &log_mag[min_lag..=max_lag];
        let mean = window.iter().map(|c| c.re.abs()).sum::<f32>() / window.len() as f32;
        if best_lag > 0 && best_val > 2.0 * mean {
            Some(self.sample_rate as f32 / best_lag as f32)
        } else {
            None
        }
    }

    /// Picks the strongest smoothed-spectrum peak inside each expected
    /// formant band.
    fn find_formants(&self, spectrum: &[f32]) -> [f32; 3] {
        let smoothed = moving_average(spectrum, 5);
        let bin_hz = self.sample_rate as f32 / defaults::FRAME_SIZE as f32;

        let mut formants = [0.0f32; 3];
        for (slot, &(low, high)) in FORMANT_BANDS.iter().enumerate() {
            let lo_bin = ((low / bin_hz) as usize).max(1);
            let hi_bin = ((high / bin_hz) as usize).min(smoothed.len().saturating_sub(2));
            let mut best = 0.0f32;
            for k in lo_bin..=hi_bin {
                let is_peak = smoothed[k] >= smoothed[k - 1] && smoothed[k] >= smoothed[k + 1];
                if is_peak && smoothed[k] > best {
                    best = smoothed[k];
                    formants[slot] = k as f32 * bin_hz;
                }
            }
        }
        formants
    }

    /// Approximate MFCCs: mel filterbank log energies followed by a DCT-II.
    fn mfcc(&self, spectrum: &[f32]) -> Vec<f32> {
        let filterbank = mel_filterbank(
            defaults::MEL_FILTERS,
            spectrum.len(),
            self.sample_rate as f32,
        );
        let log_energies: Vec<f32> = filterbank
            .iter()
            .map(|filter| {
                let e: f32 = filter.iter().zip(spectrum).map(|(w, p)| w * p).sum();
                (e + defaults::EPSILON).ln()
            })
            .collect();

        let n = log_energies.len() as f32;
        (0..defaults::MFCC_COEFFS)
            .map(|k| {
                log_energies
                    .iter()
                    .enumerate()
                    .map(|(i, e)| e * (PI * k as f32 * (i as f32 + 0.5) / n).cos())
                    .sum()
            })
            .collect()
    }

    /// Energy-envelope peaks per second — a rough syllable-rate estimate.
    fn speaking_rate(&self, frame_rms: &[f32], duration: f32) -> f32 {
        if duration < 1e-3 || frame_rms.len() < 3 {
            return 0.0;
        }
        let mean = frame_rms.iter().sum::<f32>() / frame_rms.len() as f32;
        let floor = mean * 1.1;
        let mut peaks = 0usize;
        for i in 1..frame_rms.len() - 1 {
            if frame_rms[i] > floor
                && frame_rms[i] >= frame_rms[i - 1]
                && frame_rms[i] > frame_rms[i + 1]
            {
                peaks += 1;
            }
        }
        peaks as f32 / duration
    }
}

/// Hann window of the given length.
pub fn hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| 0.5 - 0.5 * ((2.0 * PI * i as f32) / len as f32).cos())
        .collect()
}

/// RMS of a sample buffer.
fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

/// Sign changes per sample.
fn zero_crossing_rate(samples: &[f32]) -> f32 {
    if samples.len() < 2 {
        return 0.0;
    }
    let crossings = samples
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f32 / (samples.len() - 1) as f32
}

/// Moving average smoothing with an odd-width window.
fn moving_average(values: &[f32], width: usize) -> Vec<f32> {
    let half = width / 2;
    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(values.len());
            values[lo..hi].iter().sum::<f32>() / (hi - lo) as f32
        })
        .collect()
}

/// Triangular mel filterbank over `bins` spectrum bins.
fn mel_filterbank(filters: usize, bins: usize, sample_rate: f32) -> Vec<Vec<f32>> {
    let hz_to_mel = |hz: f32| 2595.0 * (1.0 + hz / 700.0).log10();
    let mel_to_hz = |mel: f32| 700.0 * (10.0f32.powf(mel / 2595.0) - 1.0);

    let nyquist = sample_rate / 2.0;
    let max_mel = hz_to_mel(nyquist);
    let centers: Vec<f32> = (0..filters + 2)
        .map(|i| mel_to_hz(max_mel * i as f32 / (filters + 1) as f32))
        .collect();

    let bin_hz = nyquist / (bins - 1) as f32;
    (0..filters)
        .map(|f| {
            let (lo, mid, hi) = (centers[f], centers[f + 1], centers[f + 2]);
            (0..bins)
                .map(|k| {
                    let hz = k as f32 * bin_hz;
                    if hz <= lo || hz >= hi {
                        0.0
                    } else if hz <= mid {
                        (hz - lo) / (mid - lo).max(defaults::EPSILON)
                    } else {
                        (hi - hz) / (hi - mid).max(defaults::EPSILON)
                    }
                })
                .collect()
        })
        .collect()
}

/// Harmonic-to-noise ratio in dB from normalized autocorrelation peaks.
fn hnr_db(autocorr_peaks: &[f32]) -> f32 {
    if autocorr_peaks.is_empty() {
        return 0.0;
    }
    let mean = autocorr_peaks.iter().sum::<f32>() / autocorr_peaks.len() as f32;
    let r = mean.clamp(0.0, 0.999);
    if r < defaults::EPSILON {
        return 0.0;
    }
    (10.0 * (r / (1.0 - r)).log10()).clamp(0.0, 30.0)
}

/// Mean absolute frame-to-frame deviation relative to the mean value.
fn relative_deviation(values: &[f32]) -> f32 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    if mean < defaults::EPSILON {
        return 0.0;
    }
    let mean_delta = values
        .windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .sum::<f32>()
        / (values.len() - 1) as f32;
    mean_delta / mean
}

/// Combines HNR, jitter and shimmer into one [0, 1] quality score.
fn voice_quality_score(hnr: f32, jitter: f32, shimmer: f32) -> f32 {
    let hnr_term = (hnr / 30.0).clamp(0.0, 1.0);
    let jitter_term = 1.0 - (jitter / 0.05).clamp(0.0, 1.0);
    let shimmer_term = 1.0 - (shimmer / 0.2).clamp(0.0, 1.0);
    (0.5 * hnr_term + 0.25 * jitter_term + 0.25 * shimmer_term).clamp(0.0, 1.0)
}

/// Median of a slice; 0.0 when empty.
fn median(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f32::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Coarse gender estimate from median F0: typical adult male voices sit well
/// below 165 Hz, female voices above 180 Hz; the gap stays Unknown.
fn estimate_gender(f0: f32) -> GenderEstimate {
    if f0 < defaults::EPSILON {
        GenderEstimate::Unknown
    } else if f0 < 165.0 {
        GenderEstimate::Male
    } else if f0 > 180.0 {
        GenderEstimate::Female
    } else {
        GenderEstimate::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, seconds: f32, sample_rate: u32) -> Vec<f32> {
        let n = (seconds * sample_rate as f32) as usize;
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate as f32).sin() * 0.5)
            .collect()
    }

    #[test]
    fn test_short_input_is_neutral() {
        let extractor = FeatureExtractor::new(16000);
        let features = extractor.extract(&[0.1; 100]);
        assert!(features.is_neutral());
        assert_eq!(features.gender, GenderEstimate::Unknown);
    }

    #[test]
    fn test_silence_is_neutral() {
        let extractor = FeatureExtractor::new(16000);
        let features = extractor.extract(&vec![0.0; 16000]);
        assert!(features.is_neutral());
        assert_eq!(features.fundamental_freq, 0.0);
    }

    #[test]
    fn test_f0_of_low_pitched_tone() {
        let extractor = FeatureExtractor::new(16000);
        let features = extractor.extract(&sine(120.0, 1.0, 16000));
        assert!(
            (features.fundamental_freq - 120.0).abs() < 15.0,
            "expected ~120 Hz, got {}",
            features.fundamental_freq
        );
        assert_eq!(features.gender, GenderEstimate::Male);
    }

    #[test]
    fn test_f0_of_high_pitched_tone() {
        let extractor = FeatureExtractor::new(16000);
        let features = extractor.extract(&sine(220.0, 1.0, 16000));
        assert!(
            (features.fundamental_freq - 220.0).abs() < 25.0,
            "expected ~220 Hz, got {}",
            features.fundamental_freq
        );
        assert_eq!(features.gender, GenderEstimate::Female);
    }

    #[test]
    fn test_centroid_tracks_tone_frequency() {
        let extractor = FeatureExtractor::new(16000);
        let low = extractor.extract(&sine(200.0, 0.5, 16000));
        let high = extractor.extract(&sine(2000.0, 0.5, 16000));
        assert!(high.spectral_centroid > low.spectral_centroid);
    }

    #[test]
    fn test_zcr_scales_with_frequency() {
        let extractor = FeatureExtractor::new(16000);
        let low = extractor.extract(&sine(100.0, 0.5, 16000));
        let high = extractor.extract(&sine(1000.0, 0.5, 16000));
        assert!(high.zero_crossing_rate > low.zero_crossing_rate);
    }

    #[test]
    fn test_mfcc_length() {
        let extractor = FeatureExtractor::new(16000);
        let features = extractor.extract(&sine(150.0, 0.5, 16000));
        assert_eq!(features.mfcc.len(), defaults::MFCC_COEFFS);
    }

    #[test]
    fn test_pause_ratio_of_half_silent_segment() {
        let extractor = FeatureExtractor::new(16000);
        let mut samples = sine(150.0, 0.5, 16000);
        samples.extend(vec![0.0f32; 8000]);
        let features = extractor.extract(&samples);
        assert!(
            features.pause_ratio > 0.3 && features.pause_ratio < 0.7,
            "expected roughly half pause, got {}",
            features.pause_ratio
        );
    }

    #[test]
    fn test_pure_tone_has_low_jitter_and_shimmer() {
        let extractor = FeatureExtractor::new(16000);
        let features = extractor.extract(&sine(150.0, 1.0, 16000));
        assert!(features.jitter < 0.05, "jitter {}", features.jitter);
        assert!(features.shimmer < 0.1, "shimmer {}", features.shimmer);
        assert!(features.voice_quality > 0.5);
    }

    #[test]
    fn test_rolloff_at_or_above_centroid_region() {
        let extractor = FeatureExtractor::new(16000);
        let features = extractor.extract(&sine(440.0, 0.5, 16000));
        assert!(features.spectral_rolloff >= features.spectral_centroid * 0.5);
    }

    #[test]
    fn test_hnr_db_clamps() {
        assert_eq!(hnr_db(&[]), 0.0);
        assert!(hnr_db(&[1.0]) <= 30.0);
        assert_eq!(hnr_db(&[0.0]), 0.0);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn test_relative_deviation_constant_signal() {
        assert_eq!(relative_deviation(&[0.5, 0.5, 0.5]), 0.0);
    }

    #[test]
    fn test_estimate_gender_bands() {
        assert_eq!(estimate_gender(0.0), GenderEstimate::Unknown);
        assert_eq!(estimate_gender(110.0), GenderEstimate::Male);
        assert_eq!(estimate_gender(170.0), GenderEstimate::Unknown);
        assert_eq!(estimate_gender(210.0), GenderEstimate::Female);
    }

    #[test]
    fn test_mel_filterbank_shape() {
        let bank = mel_filterbank(26, 257, 16000.0);
        assert_eq!(bank.len(), 26);
        assert!(bank.iter().all(|f| f.len() == 257));
        // Every filter has some nonzero weight
        assert!(bank.iter().all(|f| f.iter().any(|w| *w > 0.0)));
    }
}
