//! Classify measured pulse widths into bits.
//!
//! DCF77 reduces the carrier amplitude for 100 ms to transmit a `0` and for 200 ms to transmit a
//! `1`. A receiver module turns the reduction into a high pulse on its output line. Pulse widths
//! measured by a [`PulseSource`](crate::PulseSource) are mapped onto bits using [`Thresholds`].

use core::{error, fmt};
use crate::{BIT0_MAX_US, BIT1_MAX_US, MIN_PULSE_US};

/// The error type for pulse classification.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ClassifyError {
	/// No pulse was observed within the timeout.
	NoPulse,
	/// A pulse was observed, but its width (in microseconds) matches neither bit. The measured width
	/// is provided in the payload.
	OutOfRange(u32)
}

impl fmt::Display for ClassifyError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ClassifyError::NoPulse => write!(f, "No pulse"),
			ClassifyError::OutOfRange(x) => write!(f, "Pulse width out of range: {}us", x),
		}
	}
}

impl fmt::Debug for ClassifyError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

impl error::Error for ClassifyError {}

/// Pulse width thresholds, in microseconds.
///
/// A pulse of width `w` classifies as:
/// - `0` if `low_min < w <= bit0_max`
/// - `1` if `bit0_max < w <= bit1_max`
/// - an error otherwise
///
/// The [`Default`] thresholds are [`MIN_PULSE_US`], [`BIT0_MAX_US`], and [`BIT1_MAX_US`], which
/// suit most receiver modules. Modules with slow edges may need calibration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Thresholds {
	low_min: u32,
	bit0_max: u32,
	bit1_max: u32
}

impl Default for Thresholds {
	fn default() -> Self {
		Thresholds {
			low_min: MIN_PULSE_US,
			bit0_max: BIT0_MAX_US,
			bit1_max: BIT1_MAX_US
		}
	}
}

impl Thresholds {
	/// Create calibrated thresholds.
	///
	/// Returns `None` unless `low_min < bit0_max < bit1_max`.
	///
	/// # Examples
	///
	/// ```
	/// # use dcf77::Thresholds;
	/// assert!(Thresholds::new(30_000, 140_000, 250_000).is_some());
	/// assert!(Thresholds::new(30_000, 140_000, 140_000).is_none());
	/// ```
	pub const fn new(low_min: u32, bit0_max: u32, bit1_max: u32) -> Option<Thresholds> {
		if low_min < bit0_max && bit0_max < bit1_max {
			Some(Thresholds { low_min, bit0_max, bit1_max })
		} else {
			None
		}
	}

	/// Widest pulse that is still rejected as a glitch.
	pub const fn low_min(&self) -> u32 {
		self.low_min
	}

	/// Widest pulse that classifies as a `0`.
	pub const fn bit0_max(&self) -> u32 {
		self.bit0_max
	}

	/// Widest pulse that classifies as a `1`.
	pub const fn bit1_max(&self) -> u32 {
		self.bit1_max
	}

	/// Classify a measured pulse.
	///
	/// `pulse` is the value returned by [`PulseSource::measure_high`](crate::PulseSource), i.e.
	/// `None` when no pulse arrived within the timeout.
	///
	/// # Errors
	///
	/// Returns [`ClassifyError::NoPulse`] if `pulse` is `None` and [`ClassifyError::OutOfRange`] if
	/// the width is outside both bit ranges.
	///
	/// # Examples
	///
	/// ```
	/// # use dcf77::{Thresholds, ClassifyError};
	/// let t = Thresholds::default();
	/// assert_eq!(t.classify(Some(100_000)), Ok(false));
	/// assert_eq!(t.classify(Some(200_000)), Ok(true));
	/// assert_eq!(t.classify(Some(5_000)), Err(ClassifyError::OutOfRange(5_000)));
	/// assert_eq!(t.classify(None), Err(ClassifyError::NoPulse));
	/// ```
	pub const fn classify(&self, pulse: Option<u32>) -> Result<bool, ClassifyError> {
		match pulse {
			None => Err(ClassifyError::NoPulse),
			Some(w) if w > self.low_min && w <= self.bit0_max => Ok(false),
			Some(w) if w > self.bit0_max && w <= self.bit1_max => Ok(true),
			Some(w) => Err(ClassifyError::OutOfRange(w))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn classify_test() {
		let t = Thresholds::default();
		assert_eq!(t.classify(None), Err(ClassifyError::NoPulse));
		assert_eq!(t.classify(Some(0)), Err(ClassifyError::OutOfRange(0)));
		assert_eq!(t.classify(Some(20_000)), Err(ClassifyError::OutOfRange(20_000)));
		assert_eq!(t.classify(Some(20_001)), Ok(false));
		assert_eq!(t.classify(Some(95_000)), Ok(false));
		assert_eq!(t.classify(Some(130_000)), Ok(false));
		assert_eq!(t.classify(Some(130_001)), Ok(true));
		assert_eq!(t.classify(Some(190_000)), Ok(true));
		assert_eq!(t.classify(Some(240_000)), Ok(true));
		assert_eq!(t.classify(Some(240_001)), Err(ClassifyError::OutOfRange(240_001)));
		assert_eq!(t.classify(Some(u32::MAX)), Err(ClassifyError::OutOfRange(u32::MAX)));
	}

	#[test]
	fn calibrated_test() {
		let t = Thresholds::new(50_000, 150_000, 300_000).unwrap();
		assert_eq!(t.low_min(), 50_000);
		assert_eq!(t.bit0_max(), 150_000);
		assert_eq!(t.bit1_max(), 300_000);
		assert_eq!(t.classify(Some(40_000)), Err(ClassifyError::OutOfRange(40_000)));
		assert_eq!(t.classify(Some(140_000)), Ok(false));
		assert_eq!(t.classify(Some(250_000)), Ok(true));

		assert_eq!(Thresholds::new(0, 0, 1), None);
		assert_eq!(Thresholds::new(2, 1, 3), None);
		assert_eq!(Thresholds::new(1, 3, 2), None);
		assert_eq!(Thresholds::new(MIN_PULSE_US, BIT0_MAX_US, BIT1_MAX_US), Some(Thresholds::default()));
	}
}
