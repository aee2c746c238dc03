//! Acquire frames from a pulse source.
//!
//! [`FrameAcquirer`] synchronizes on the minute marker (the missing pulse in second 59) and then
//! captures one classified bit per second until a full frame of [`FRAME_LEN`] bits is collected.
//!
//! Acquisition blocks in [`PulseSource::measure_high`], which is also the only way acquisition can
//! time out. Waiting for the minute marker is unbounded: it ends once the source reports a missing
//! pulse, however long that takes.

use core::{error, fmt};
use crate::classify::{ClassifyError, Thresholds};
use crate::diagnostics::{Diagnostics, Event, Silent};
use crate::{FRAME_LEN, PULSE_TIMEOUT_US};

/// Source of measured pulse widths, typically backed by a receiver module's output line.
///
/// Implementations own the physical input (pin, audio channel, ...) and its configuration. Only
/// one acquisition should use a given signal at a time.
pub trait PulseSource {
	/// Measure the width of the next high pulse, in microseconds.
	///
	/// Blocks until a complete pulse was observed or until `timeout_us` microseconds have elapsed
	/// without one, in which case `None` is returned. If the line is already high when called, the
	/// current pulse is skipped.
	fn measure_high(&mut self, timeout_us: u32) -> Option<u32>;
}

impl<P: PulseSource + ?Sized> PulseSource for &mut P {
	fn measure_high(&mut self, timeout_us: u32) -> Option<u32> {
		(**self).measure_high(timeout_us)
	}
}

/// The error type for acquiring frames.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum AcquireError {
	/// The supplied frame buffer does not hold exactly [`FRAME_LEN`] bits. The supplied length is
	/// provided in the payload.
	InvalidSize(usize),
	/// No pulse arrived during capture, i.e. the signal was lost. The index of the bit that was
	/// being captured is provided in the payload.
	Timeout(usize),
	/// A pulse width matched neither bit. The index of the bit that was being captured and the
	/// measured width (in microseconds) are provided in the payload.
	InvalidPulse(usize, u32)
}

impl fmt::Display for AcquireError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AcquireError::InvalidSize(x) => write!(f, "Invalid frame size: {} (expected {})", x, FRAME_LEN),
			AcquireError::Timeout(i) => write!(f, "Signal lost at bit {}", i),
			AcquireError::InvalidPulse(i, x) => write!(f, "Invalid pulse at bit {}: {}us", i, x),
		}
	}
}

impl fmt::Debug for AcquireError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

impl error::Error for AcquireError {}

/// State machine for acquiring a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquireState {
	/// Measuring pulses until one is missing.
	WaitingForMinuteMarker,
	/// Capturing a bit. The payload is the index of the bit.
	Capturing(usize),
	/// All bits were captured.
	Complete,
	/// Capture was aborted. The cause is provided in the payload.
	Aborted(AcquireError)
}

impl AcquireState {
	/// Whether the state machine reached a final state.
	pub fn is_done(&self) -> bool {
		matches!(self, AcquireState::Complete | AcquireState::Aborted(_))
	}
}

/// Frame acquisition from a [`PulseSource`].
///
/// # Examples
///
/// ```
/// # use dcf77::{AcquireError, FrameAcquirer, PulseSource, Thresholds, FRAME_LEN};
/// // Signal with a minute marker, followed by three `1` bits and then silence
/// struct Short(usize);
///
/// impl PulseSource for Short {
/// 	fn measure_high(&mut self, _timeout_us: u32) -> Option<u32> {
/// 		self.0 += 1;
/// 		match self.0 {
/// 			2..=4 => Some(200_000),
/// 			_ => None
/// 		}
/// 	}
/// }
///
/// let mut acquirer = FrameAcquirer::new(Short(0), Thresholds::default());
/// let mut frame = [false; FRAME_LEN];
/// assert_eq!(acquirer.acquire(&mut frame), Err(AcquireError::Timeout(3)));
/// ```
pub struct FrameAcquirer<P, D = Silent> {
	source: P,
	thresholds: Thresholds,
	timeout: u32,
	diagnostics: D,
	state: AcquireState
}

impl<P: PulseSource> FrameAcquirer<P> {
	/// Construct a new acquirer reading from `source`.
	///
	/// The pulse timeout defaults to [`PULSE_TIMEOUT_US`], diagnostics default to [`Silent`].
	pub fn new(source: P, thresholds: Thresholds) -> FrameAcquirer<P> {
		FrameAcquirer {
			source,
			thresholds,
			timeout: PULSE_TIMEOUT_US,
			diagnostics: Silent,
			state: AcquireState::WaitingForMinuteMarker
		}
	}
}

impl<P: PulseSource, D: Diagnostics> FrameAcquirer<P, D> {
	/// Replace the diagnostics sink.
	pub fn with_diagnostics<E: Diagnostics>(self, diagnostics: E) -> FrameAcquirer<P, E> {
		FrameAcquirer {
			source: self.source,
			thresholds: self.thresholds,
			timeout: self.timeout,
			diagnostics,
			state: self.state
		}
	}

	/// Replace the pulse timeout, in microseconds.
	///
	/// The timeout must be longer than a regular gap between pulses (up to ~900 ms) and shorter
	/// than the gap at the minute marker (~1800 ms).
	pub fn with_timeout(mut self, timeout_us: u32) -> Self {
		self.timeout = timeout_us;
		self
	}

	/// The pulse source.
	pub fn source(&self) -> &P {
		&self.source
	}

	/// The pulse source, mutably.
	pub fn source_mut(&mut self) -> &mut P {
		&mut self.source
	}

	/// The diagnostics sink, mutably.
	pub fn diagnostics_mut(&mut self) -> &mut D {
		&mut self.diagnostics
	}

	/// The thresholds used to classify pulses.
	pub fn thresholds(&self) -> Thresholds {
		self.thresholds
	}

	/// The state the last acquisition ended in.
	pub fn state(&self) -> AcquireState {
		self.state
	}

	/// Consume the acquirer, returning the pulse source.
	pub fn into_source(self) -> P {
		self.source
	}

	/// Acquire one frame into `frame`.
	///
	/// Blocks until the next minute marker, then captures one bit per pulse. On success, `frame`
	/// holds the bits of the minute that just ended, ready for [`decode`](crate::decode).
	///
	/// # Errors
	///
	/// - [`AcquireError::InvalidSize`] if `frame.len() != FRAME_LEN`. The pulse source is not used.
	/// - [`AcquireError::Timeout`] if no pulse arrived during capture.
	/// - [`AcquireError::InvalidPulse`] if a pulse could not be classified.
	///
	/// On error `frame` is cleared. The caller should simply try again, which resynchronizes on
	/// the next minute marker.
	pub fn acquire(&mut self, frame: &mut [bool]) -> Result<(), AcquireError> {
		if frame.len() != FRAME_LEN {
			return Err(AcquireError::InvalidSize(frame.len()));
		}

		self.state = AcquireState::WaitingForMinuteMarker;
		while !self.state.is_done() {
			self.advance(frame);
		}

		match self.state {
			AcquireState::Aborted(e) => {
				frame.fill(false);
				Err(e)
			},
			_ => Ok(())
		}
	}

	/// Advance the state machine by one pulse.
	///
	/// The state machine advances as follows:
	/// - `WaitingForMinuteMarker` => `Capturing(0)` if no pulse arrived, else unchanged
	/// - `Capturing(n)` => `Capturing(n + 1)` if the pulse classified
	/// - `Capturing(58)` => `Complete` if the pulse classified
	/// - `Capturing(n)` => `Aborted(_)` otherwise
	///
	/// `frame` must hold at least [`FRAME_LEN`] bits.
	fn advance(&mut self, frame: &mut [bool]) {
		self.state = match self.state {
			AcquireState::WaitingForMinuteMarker => {
				self.diagnostics.record(&Event::WaitingForMinuteMarker);
				match self.source.measure_high(self.timeout) {
					Some(_) => AcquireState::WaitingForMinuteMarker,
					None => {
						self.diagnostics.record(&Event::MinuteMarker);
						AcquireState::Capturing(0)
					}
				}
			},
			AcquireState::Capturing(index) => {
				let pulse = self.source.measure_high(self.timeout);
				match self.thresholds.classify(pulse) {
					Ok(value) => {
						frame[index] = value;
						self.diagnostics.record(&Event::Bit {
							index,
							value,
							duration: pulse.unwrap_or(0)
						});
						if index + 1 < FRAME_LEN {
							AcquireState::Capturing(index + 1)
						} else {
							self.diagnostics.record(&Event::FrameComplete);
							AcquireState::Complete
						}
					},
					Err(e) => {
						let e = match e {
							ClassifyError::NoPulse => AcquireError::Timeout(index),
							ClassifyError::OutOfRange(x) => AcquireError::InvalidPulse(index, x)
						};
						self.diagnostics.record(&Event::CaptureFailed(e));
						AcquireState::Aborted(e)
					}
				}
			},
			s => s
		}
	}
}
