//! Decode the DCF77 time signal.
//!
//! A DCF77 receiver module demodulates the 77.5 kHz longwave carrier into a line that goes high
//! once per second for either ~100 ms (a `0` bit) or ~200 ms (a `1` bit). Second 59 carries no
//! pulse, which marks the start of the next minute. This crate turns a sequence of measured pulse
//! widths into a [`DecodedTime`]:
//!
//! 1. [`classify`] maps a single pulse width onto a bit.
//! 2. [`acquire`] synchronizes on the minute marker and captures a full [`FRAME_LEN`] bit frame.
//! 3. [`fields`] extracts the BCD encoded fields from the frame.
//! 4. [`validate`] checks parity and date plausibility.
//! 5. [`decode`] ties extraction and validation together.
//!
//! [`Receiver`] combines all of the above for the common case of decoding one time value per
//! minute. Pulse measurement is supplied by the caller through the [`PulseSource`] trait, so the
//! decoder can be driven by hardware, audio input, or a scripted sequence of durations.
//!
//! This crate is `no_std` and does not allocate.
//!
//! See [DCF77 documentation](https://en.wikipedia.org/wiki/DCF77#Time_code_details) for details of
//! the time code.
//!
//! # Examples
//!
//! ```
//! use dcf77::{encode, DecodedTime, Receiver, PulseSource, Thresholds};
//!
//! // A pulse source that replays one minute of a perfect signal
//! struct Perfect {
//! 	frame: [bool; dcf77::FRAME_LEN],
//! 	i: usize
//! }
//!
//! impl PulseSource for Perfect {
//! 	fn measure_high(&mut self, _timeout_us: u32) -> Option<u32> {
//! 		let i = self.i;
//! 		self.i += 1;
//! 		match i {
//! 			0 => None, // Minute marker
//! 			_ => self.frame.get(i - 1).map(|&b| if b { 200_000 } else { 100_000 })
//! 		}
//! 	}
//! }
//!
//! let time = DecodedTime {
//! 	minute: 32,
//! 	hour: 18,
//! 	day: 26,
//! 	weekday: 7,
//! 	month: 5,
//! 	year: 24,
//! 	cest: true,
//! 	..Default::default()
//! };
//!
//! let mut receiver = Receiver::new(Perfect { frame: encode(&time), i: 0 }, Thresholds::default());
//! assert_eq!(receiver.receive(), Ok(time));
//! ```

#![no_std]

use core::fmt;

pub mod classify;
pub mod acquire;
pub mod fields;
pub mod validate;
pub mod decode;
pub mod diagnostics;
pub mod receiver;

pub use classify::{Thresholds, ClassifyError};
pub use acquire::{AcquireError, AcquireState, FrameAcquirer, PulseSource};
pub use decode::{decode, encode, DecodeError};
pub use validate::ParityRange;
pub use diagnostics::{Diagnostics, Event, Silent};
pub use receiver::{Receiver, ReceiveError};

/// Number of bits in one DCF77 minute frame.
///
/// Bit 0 of a frame is the first bit after the minute marker, bit 58 is the date parity bit.
pub const FRAME_LEN: usize = 59;

/// Pulses at or below this width (in microseconds) are glitches rather than bits.
pub const MIN_PULSE_US: u32 = 20_000;

/// Longest pulse (in microseconds) that still counts as a `0` bit.
pub const BIT0_MAX_US: u32 = 130_000;

/// Longest pulse (in microseconds) that still counts as a `1` bit.
pub const BIT1_MAX_US: u32 = 240_000;

/// Time (in microseconds) to wait for a pulse before reporting that none arrived.
///
/// Regular seconds produce a pulse roughly every 1 s. The missing second 59 leaves a gap of about
/// 1.8 s, which exceeds this timeout and is detected as the minute marker.
pub const PULSE_TIMEOUT_US: u32 = 1_600_000;

/// A decoded DCF77 time value.
///
/// All values are transmitted as two BCD digits and are reported exactly as received: `year` is
/// the year within the century, `weekday` runs from 1 (Monday) to 7 (Sunday). The CET/CEST flags
/// are the raw broadcast bits and are not resolved into a UTC offset.
///
/// The broadcast carries no century. [`Display`](fmt::Display) assumes the 21st century and prints
/// `year` 93 as 2093.
///
/// A [`DecodedTime`] is only ever produced from a frame that passed parity and plausibility
/// checks, see [`decode`].
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedTime {
	/// Minute, ranged [0, 59].
	pub minute: u8,
	/// Hour, ranged [0, 23].
	pub hour: u8,
	/// Day of month, ranged [1, 31].
	pub day: u8,
	/// Day of week, ranged [1, 7] with 1 = Monday.
	pub weekday: u8,
	/// Month, ranged [1, 12].
	pub month: u8,
	/// Year within the century, ranged [0, 99].
	pub year: u8,
	/// Call bit, set by the transmitter when it is running in a fault condition.
	pub transmitter_fault: bool,
	/// A1, announces a change between CET and CEST at the end of the hour.
	pub dst_announcement: bool,
	/// Z1, CEST is in effect.
	pub cest: bool,
	/// Z2, CET is in effect.
	pub cet: bool,
	/// A2, announces a leap second at the end of the hour.
	pub leap_announcement: bool
}

impl DecodedTime {
	/// Name of the zone indicated by the raw Z1/Z2 flags.
	///
	/// Returns `None` when neither or both flags are set, which never happens in a correctly
	/// received frame but is not rejected by validation.
	///
	/// # Examples
	///
	/// ```
	/// # use dcf77::DecodedTime;
	/// let t = DecodedTime { cet: true, ..Default::default() };
	/// assert_eq!(t.zone(), Some("CET"));
	/// let t = DecodedTime { cet: true, cest: true, ..Default::default() };
	/// assert_eq!(t.zone(), None);
	/// ```
	pub fn zone(&self) -> Option<&'static str> {
		match (self.cest, self.cet) {
			(true, false) => Some("CEST"),
			(false, true) => Some("CET"),
			_ => None
		}
	}
}

impl fmt::Display for DecodedTime {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "20{:02}-{:02}-{:02} {:02}:{:02} {}",
			self.year, self.month, self.day, self.hour, self.minute, self.zone().unwrap_or("?"))
	}
}

#[cfg(test)]
mod tests {
	extern crate std;
	use std::string::ToString;
	use super::*;

	#[test]
	fn display_test() {
		let t = DecodedTime {
			minute: 7,
			hour: 9,
			day: 3,
			weekday: 2,
			month: 11,
			year: 26,
			cet: true,
			..Default::default()
		};
		assert_eq!(t.to_string(), "2026-11-03 09:07 CET");

		let t = DecodedTime { cest: true, ..t };
		assert_eq!(t.to_string(), "2026-11-03 09:07 ?");

		let t = DecodedTime { cet: false, ..t };
		assert_eq!(t.to_string(), "2026-11-03 09:07 CEST");

		let t = DecodedTime { year: 93, month: 7, day: 1, ..t };
		assert_eq!(t.to_string(), "2093-07-01 09:07 CEST");
		let t = DecodedTime { year: 0, ..t };
		assert_eq!(t.to_string(), "2000-07-01 09:07 CEST");
	}

	#[test]
	fn constants_test() {
		assert!(MIN_PULSE_US < BIT0_MAX_US);
		assert!(BIT0_MAX_US < BIT1_MAX_US);
		assert!(BIT1_MAX_US < PULSE_TIMEOUT_US);
	}
}
