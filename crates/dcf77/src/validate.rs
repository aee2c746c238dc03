//! Validate DCF77 frames.
//!
//! DCF77 protects the minute, the hour, and the date (day, weekday, month, year) with one even
//! parity bit each. The parity bit directly follows the bits it covers. A frame that passes the
//! parity checks is additionally checked for plausibility, since a transmitter fault or a capture
//! that started mid-transition can produce an all-zero date with valid parity.

use core::ops::Range;
use core::fmt;
use crate::DecodedTime;

/// Bits covered by the minute parity bit.
pub const MINUTE_PARITY: Range<usize> = 21..28;
/// Bits covered by the hour parity bit.
pub const HOUR_PARITY: Range<usize> = 29..35;
/// Bits covered by the date parity bit.
pub const DATE_PARITY: Range<usize> = 36..58;

/// A range of bits covered by a parity bit.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ParityRange {
	/// Minute bits, parity bit 28.
	Minute,
	/// Hour bits, parity bit 35.
	Hour,
	/// Date bits, parity bit 58.
	Date
}

impl ParityRange {
	/// All parity ranges, in the order they are checked.
	pub const ALL: [ParityRange; 3] = [ParityRange::Minute, ParityRange::Hour, ParityRange::Date];

	/// The covered bits. The parity bit itself is at `bits().end`.
	pub const fn bits(&self) -> Range<usize> {
		match self {
			ParityRange::Minute => MINUTE_PARITY,
			ParityRange::Hour => HOUR_PARITY,
			ParityRange::Date => DATE_PARITY
		}
	}
}

impl fmt::Display for ParityRange {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ParityRange::Minute => write!(f, "minute"),
			ParityRange::Hour => write!(f, "hour"),
			ParityRange::Date => write!(f, "date"),
		}
	}
}

impl fmt::Debug for ParityRange {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

/// Even parity of `bits`, i.e. the value the parity bit must have.
///
/// Bits beyond the end of `frame` count as `false`.
pub fn parity(frame: &[bool], bits: Range<usize>) -> bool {
	frame.iter().skip(bits.start).take(bits.len()).fold(false, |acc, &b| acc ^ b)
}

/// Check all parity bits of a frame.
///
/// # Errors
///
/// Returns the first [`ParityRange`] (in the order minute, hour, date) whose parity bit doesn't
/// match the covered bits. A parity bit missing from a short frame counts as `false`.
///
/// # Examples
///
/// ```
/// # use dcf77::validate::check_parity;
/// # use dcf77::ParityRange;
/// let mut frame = [false; dcf77::FRAME_LEN];
/// assert_eq!(check_parity(&frame), Ok(()));
///
/// frame[30] = true;
/// assert_eq!(check_parity(&frame), Err(ParityRange::Hour));
///
/// frame[35] = true;
/// assert_eq!(check_parity(&frame), Ok(()));
/// ```
pub fn check_parity(frame: &[bool]) -> Result<(), ParityRange> {
	for range in ParityRange::ALL {
		let bits = range.bits();
		let expected = frame.get(bits.end).copied().unwrap_or(false);
		if parity(frame, bits) != expected {
			return Err(range);
		}
	}
	Ok(())
}

/// Check that the decoded date is plausible.
///
/// The broadcast never encodes day, month, or year as zero. A zero value indicates a corrupted or
/// transitional capture even if parity passed.
pub fn is_plausible(time: &DecodedTime) -> bool {
	time.day != 0 && time.month != 0 && time.year != 0
}
