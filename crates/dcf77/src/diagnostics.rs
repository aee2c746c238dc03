//! Optional progress reporting.
//!
//! Decoding doesn't print anything by itself. Callers interested in progress (e.g. to visualize
//! reception quality while positioning an antenna) supply a [`Diagnostics`] implementation, which
//! receives an [`Event`] for every step of acquisition and decoding. Events have no influence on
//! results.

use core::fmt;
use crate::{AcquireError, DecodeError, DecodedTime};

/// A step of acquisition or decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
	/// Waiting for the pulse gap at the end of the minute. Reported once per measured pulse while
	/// waiting.
	WaitingForMinuteMarker,
	/// The minute marker was found, capture starts.
	MinuteMarker,
	/// A pulse was captured and classified.
	Bit {
		/// Position within the frame.
		index: usize,
		/// Classified bit value.
		value: bool,
		/// Measured pulse width, in microseconds.
		duration: u32
	},
	/// A complete frame was captured.
	FrameComplete,
	/// Capture aborted, the partial frame is discarded.
	CaptureFailed(AcquireError),
	/// A captured frame failed validation.
	DecodeFailed(DecodeError),
	/// A captured frame decoded successfully.
	Decoded(DecodedTime)
}

impl fmt::Display for Event {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Event::WaitingForMinuteMarker => write!(f, "Waiting for new minute..."),
			Event::MinuteMarker => write!(f, "Minute marker"),
			Event::Bit { index, value, duration } =>
				write!(f, "Bit {:2}: {} ({}us)", index, *value as u8, duration),
			Event::FrameComplete => write!(f, "Frame complete"),
			Event::CaptureFailed(e) => write!(f, "Capture failed: {}", e),
			Event::DecodeFailed(e) => write!(f, "Decode failed: {}", e),
			Event::Decoded(t) => write!(f, "Decoded {}", t),
		}
	}
}

/// Receiver of progress [`Event`]s.
pub trait Diagnostics {
	/// Record a single event.
	fn record(&mut self, event: &Event);
}

/// [`Diagnostics`] that discards all events.
#[derive(Default, Clone, Copy, Debug)]
pub struct Silent;

impl Diagnostics for Silent {
	#[inline(always)]
	fn record(&mut self, _event: &Event) {}
}

impl<D: Diagnostics + ?Sized> Diagnostics for &mut D {
	fn record(&mut self, event: &Event) {
		(**self).record(event)
	}
}

#[cfg(test)]
mod tests {
	extern crate std;
	use std::string::ToString;
	use super::*;
	use crate::ParityRange;

	#[test]
	fn display_test() {
		assert_eq!(Event::WaitingForMinuteMarker.to_string(), "Waiting for new minute...");
		assert_eq!(Event::MinuteMarker.to_string(), "Minute marker");
		assert_eq!(
			Event::Bit { index: 3, value: true, duration: 190_500 }.to_string(),
			"Bit  3: 1 (190500us)"
		);
		assert_eq!(
			Event::CaptureFailed(AcquireError::Timeout(12)).to_string(),
			"Capture failed: Signal lost at bit 12"
		);
		assert_eq!(
			Event::DecodeFailed(DecodeError::Parity(ParityRange::Hour)).to_string(),
			"Decode failed: Parity error in hour bits"
		);
	}

	#[test]
	fn forward_test() {
		struct Count(usize);
		impl Diagnostics for Count {
			fn record(&mut self, _event: &Event) {
				self.0 += 1;
			}
		}

		fn record_twice<D: Diagnostics>(mut d: D) {
			d.record(&Event::MinuteMarker);
			d.record(&Event::FrameComplete);
		}

		let mut c = Count(0);
		record_twice(&mut c);
		record_twice(&mut c);
		assert_eq!(c.0, 4);

		record_twice(Silent);
	}
}
