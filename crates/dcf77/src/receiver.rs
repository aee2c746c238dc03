//! Receive time values, one per minute.

use core::{error, fmt};
use crate::acquire::{AcquireError, FrameAcquirer, PulseSource};
use crate::decode::{decode, DecodeError};
use crate::diagnostics::{Diagnostics, Event, Silent};
use crate::{DecodedTime, Thresholds, FRAME_LEN};

/// The error type for receiving time values.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ReceiveError {
	/// The frame could not be captured.
	Acquire(AcquireError),
	/// The frame was captured, but is invalid.
	Decode(DecodeError)
}

impl From<AcquireError> for ReceiveError {
	fn from(e: AcquireError) -> Self {
		ReceiveError::Acquire(e)
	}
}

impl From<DecodeError> for ReceiveError {
	fn from(e: DecodeError) -> Self {
		ReceiveError::Decode(e)
	}
}

impl fmt::Display for ReceiveError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ReceiveError::Acquire(e) => write!(f, "Acquisition error: {}", e),
			ReceiveError::Decode(e) => write!(f, "Decoding error: {}", e),
		}
	}
}

impl fmt::Debug for ReceiveError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

impl error::Error for ReceiveError {
	fn source(&self) -> Option<&(dyn error::Error + 'static)> {
		match self {
			ReceiveError::Acquire(e) => Some(e),
			ReceiveError::Decode(e) => Some(e),
		}
	}
}

/// DCF77 receiver, combining [`FrameAcquirer`] and [`decode`].
///
/// Every call to [`Receiver::receive`] waits for the next minute marker, captures a frame, and
/// decodes it. The returned time is that of the minute marker that **follows** the frame. The call
/// returns when the last bit's pulse ends, just before that minute begins.
pub struct Receiver<P, D = Silent> {
	acquirer: FrameAcquirer<P, D>,
	frame: [bool; FRAME_LEN]
}

impl<P: PulseSource> Receiver<P> {
	/// Construct a new receiver reading from `source`.
	pub fn new(source: P, thresholds: Thresholds) -> Receiver<P> {
		Receiver::from_acquirer(FrameAcquirer::new(source, thresholds))
	}
}

impl<P: PulseSource, D: Diagnostics> Receiver<P, D> {
	/// Construct a receiver from a configured acquirer.
	///
	/// # Examples
	///
	/// ```
	/// # use dcf77::{FrameAcquirer, PulseSource, Receiver, Silent, Thresholds};
	/// # struct Quiet;
	/// # impl PulseSource for Quiet {
	/// # 	fn measure_high(&mut self, _timeout_us: u32) -> Option<u32> { None }
	/// # }
	/// let acquirer = FrameAcquirer::new(Quiet, Thresholds::default())
	/// 	.with_timeout(1_500_000)
	/// 	.with_diagnostics(Silent);
	/// let _receiver = Receiver::from_acquirer(acquirer);
	/// ```
	pub fn from_acquirer(acquirer: FrameAcquirer<P, D>) -> Receiver<P, D> {
		Receiver {
			acquirer,
			frame: [false; FRAME_LEN]
		}
	}

	/// The underlying acquirer.
	pub fn acquirer(&self) -> &FrameAcquirer<P, D> {
		&self.acquirer
	}

	/// The underlying acquirer, mutably.
	pub fn acquirer_mut(&mut self) -> &mut FrameAcquirer<P, D> {
		&mut self.acquirer
	}

	/// The most recently captured frame.
	///
	/// Cleared if the last capture failed.
	pub fn frame(&self) -> &[bool; FRAME_LEN] {
		&self.frame
	}

	/// Receive the next time value.
	///
	/// Blocks until a full minute has been captured (between one and two minutes, depending on
	/// when it is called).
	///
	/// # Errors
	///
	/// Returns [`ReceiveError::Acquire`] if the frame could not be captured and
	/// [`ReceiveError::Decode`] if it failed validation. Errors are expected with weak signals; the
	/// usual reaction is to call this function again.
	pub fn receive(&mut self) -> Result<DecodedTime, ReceiveError> {
		self.acquirer.acquire(&mut self.frame)?;
		match decode(&self.frame) {
			Ok(t) => {
				self.acquirer.diagnostics_mut().record(&Event::Decoded(t));
				Ok(t)
			},
			Err(e) => {
				self.acquirer.diagnostics_mut().record(&Event::DecodeFailed(e));
				Err(e.into())
			}
		}
	}
}

#[cfg(test)]
mod tests {
	extern crate std;
	use std::vec::Vec;
	use core::error::Error;
	use super::*;
	use crate::{encode, ParityRange};

	struct Script(Vec<Option<u32>>, usize);

	impl PulseSource for Script {
		fn measure_high(&mut self, _timeout_us: u32) -> Option<u32> {
			self.1 += 1;
			self.0.get(self.1 - 1).copied().flatten()
		}
	}

	fn minute(frame: &[bool]) -> impl Iterator<Item = Option<u32>> + '_ {
		core::iter::once(None).chain(frame.iter().map(|&b| Some(if b { 200_000 } else { 100_000 })))
	}

	fn sample_time() -> DecodedTime {
		DecodedTime {
			minute: 32,
			hour: 9,
			day: 19,
			weekday: 1,
			month: 10,
			year: 26,
			cest: true,
			..Default::default()
		}
	}

	#[test]
	fn receive_test() {
		let t = sample_time();
		let next = DecodedTime { minute: 33, ..t };
		let pulses: Vec<_> = minute(&encode(&t)).chain(minute(&encode(&next))).collect();

		let mut receiver = Receiver::new(Script(pulses, 0), Thresholds::default());
		assert_eq!(receiver.receive(), Ok(t));
		assert_eq!(receiver.frame(), &encode(&t));
		// Returns before the following marker is measured
		assert_eq!(receiver.acquirer().source().1, FRAME_LEN + 1);
		assert_eq!(receiver.receive(), Ok(next));
		assert_eq!(receiver.receive(), Err(ReceiveError::Acquire(AcquireError::Timeout(0))));
		assert_eq!(receiver.frame(), &[false; FRAME_LEN]);
	}

	#[test]
	fn receive_error_test() {
		let t = sample_time();
		let mut corrupt = encode(&t);
		corrupt[40] = !corrupt[40];
		let zero = encode(&DecodedTime { year: 0, ..t });

		let pulses: Vec<_> = minute(&corrupt)
			.chain(minute(&zero))
			.chain(minute(&encode(&t)))
			.collect();

		let mut receiver = Receiver::new(Script(pulses, 0), Thresholds::default());
		assert_eq!(receiver.receive(), Err(ReceiveError::Decode(DecodeError::Parity(ParityRange::Date))));
		assert_eq!(receiver.receive(), Err(ReceiveError::Decode(DecodeError::Date)));
		assert_eq!(receiver.receive(), Ok(t));
	}

	#[test]
	fn diagnostics_test() {
		struct Last(Option<Event>);
		impl Diagnostics for Last {
			fn record(&mut self, event: &Event) {
				self.0 = Some(*event);
			}
		}

		let t = sample_time();
		let mut corrupt = encode(&t);
		corrupt[22] = !corrupt[22];
		let pulses: Vec<_> = minute(&encode(&t)).chain(minute(&corrupt)).collect();

		let acquirer = FrameAcquirer::new(Script(pulses, 0), Thresholds::default())
			.with_diagnostics(Last(None));
		let mut receiver = Receiver::from_acquirer(acquirer);

		assert_eq!(receiver.receive(), Ok(t));
		assert_eq!(receiver.acquirer_mut().diagnostics_mut().0, Some(Event::Decoded(t)));

		let e = DecodeError::Parity(ParityRange::Minute);
		assert_eq!(receiver.receive(), Err(ReceiveError::Decode(e)));
		assert_eq!(receiver.acquirer_mut().diagnostics_mut().0, Some(Event::DecodeFailed(e)));
		assert_eq!(receiver.acquirer().source().1, 2 * (FRAME_LEN + 1));
	}

	#[test]
	fn error_test() {
		let e: ReceiveError = AcquireError::Timeout(5).into();
		assert_eq!(e, ReceiveError::Acquire(AcquireError::Timeout(5)));
		assert!(e.source().is_some());

		let e = ReceiveError::from(DecodeError::Date);
		assert_eq!(e, ReceiveError::Decode(DecodeError::Date));

		let e = ReceiveError::Acquire(AcquireError::InvalidPulse(7, 300_000));
		assert_eq!(std::format!("{}", e), "Acquisition error: Invalid pulse at bit 7: 300000us");
	}
}
