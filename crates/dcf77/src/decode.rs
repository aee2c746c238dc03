//! Decode complete DCF77 frames.
//!
//! [`decode`] turns a captured frame into a [`DecodedTime`], [`encode`] does the reverse. Decoding
//! never returns a partially decoded value: a frame either passes every check or yields a
//! [`DecodeError`].

use core::{error, fmt};
use crate::fields::{self, extract, flag, insert};
use crate::validate::{self, check_parity, is_plausible, ParityRange};
use crate::{DecodedTime, FRAME_LEN};

/// Bit 20 is always set, marking the start of the encoded time.
const START_OF_TIME: usize = 20;

/// The error type for decoding frames.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
	/// The frame does not hold exactly [`FRAME_LEN`] bits. The supplied length is provided in the
	/// payload.
	InvalidSize(usize),
	/// A parity bit does not match. The failing range is provided in the payload.
	Parity(ParityRange),
	/// Parity passed, but the day, month, or year decoded to zero.
	Date
}

impl fmt::Display for DecodeError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DecodeError::InvalidSize(x) => write!(f, "Invalid frame size: {} (expected {})", x, FRAME_LEN),
			DecodeError::Parity(x) => write!(f, "Parity error in {} bits", x),
			DecodeError::Date => write!(f, "Implausible date"),
		}
	}
}

impl fmt::Debug for DecodeError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

impl error::Error for DecodeError {}

/// Decode a frame into a time value.
///
/// `frame` must contain exactly [`FRAME_LEN`] bits, index 0 being the first bit after the minute
/// marker. Decoding is a pure function of the frame.
///
/// # Errors
///
/// - [`DecodeError::InvalidSize`] if `frame.len() != FRAME_LEN`.
/// - [`DecodeError::Parity`] if the minute, hour, or date parity bit doesn't match.
/// - [`DecodeError::Date`] if parity passed but day, month, or year is zero.
///
/// # Examples
///
/// ```
/// # use dcf77::{decode, encode, DecodeError, DecodedTime, ParityRange};
/// let time = DecodedTime { minute: 58, hour: 18, day: 26, weekday: 7, month: 5, year: 24, ..Default::default() };
/// let mut frame = encode(&time);
/// assert_eq!(decode(&frame), Ok(time));
///
/// // Flip the lowest minute bit
/// frame[21] = !frame[21];
/// assert_eq!(decode(&frame), Err(DecodeError::Parity(ParityRange::Minute)));
///
/// assert_eq!(decode(&frame[1..]), Err(DecodeError::InvalidSize(58)));
/// ```
pub fn decode(frame: &[bool]) -> Result<DecodedTime, DecodeError> {
	if frame.len() != FRAME_LEN {
		return Err(DecodeError::InvalidSize(frame.len()));
	}

	let time = DecodedTime {
		minute: extract(frame, fields::MINUTE),
		hour: extract(frame, fields::HOUR),
		day: extract(frame, fields::DAY),
		weekday: extract(frame, fields::WEEKDAY),
		month: extract(frame, fields::MONTH),
		year: extract(frame, fields::YEAR),
		transmitter_fault: flag(frame, fields::TRANSMITTER_FAULT),
		dst_announcement: flag(frame, fields::DST_ANNOUNCEMENT),
		cest: flag(frame, fields::CEST),
		cet: flag(frame, fields::CET),
		leap_announcement: flag(frame, fields::LEAP_ANNOUNCEMENT)
	};

	check_parity(frame).map_err(DecodeError::Parity)?;

	if !is_plausible(&time) {
		return Err(DecodeError::Date);
	}

	Ok(time)
}

/// Encode a time value into a frame, the inverse of [`decode`].
///
/// Values are encoded as given, without range checks. All parity bits are set to match and bit 20
/// (start of encoded time) is set. Bits 0-14, used by the transmitter for third party data, are
/// left clear.
///
/// # Examples
///
/// ```
/// # use dcf77::{encode, DecodedTime};
/// let frame = encode(&DecodedTime { minute: 32, ..Default::default() });
/// let minute: Vec<u8> = frame[21..29].iter().map(|&b| b as u8).collect();
/// // 32 in BCD, LSB first, followed by the parity bit
/// assert_eq!(minute, [0, 1, 0, 0, 1, 1, 0, 1]);
/// ```
pub fn encode(time: &DecodedTime) -> [bool; FRAME_LEN] {
	let mut frame = [false; FRAME_LEN];

	frame[START_OF_TIME] = true;
	for (field, value) in [
		(fields::TRANSMITTER_FAULT, time.transmitter_fault as u8),
		(fields::DST_ANNOUNCEMENT, time.dst_announcement as u8),
		(fields::CEST, time.cest as u8),
		(fields::CET, time.cet as u8),
		(fields::LEAP_ANNOUNCEMENT, time.leap_announcement as u8),
		(fields::MINUTE, time.minute),
		(fields::HOUR, time.hour),
		(fields::DAY, time.day),
		(fields::WEEKDAY, time.weekday),
		(fields::MONTH, time.month),
		(fields::YEAR, time.year)
	] {
		insert(&mut frame, field, value);
	}

	for range in ParityRange::ALL {
		let bits = range.bits();
		let end = bits.end;
		frame[end] = validate::parity(&frame, bits);
	}

	frame
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_time() -> DecodedTime {
		// Sunday, May 26, 2024. 18:58 CEST.
		DecodedTime {
			minute: 58,
			hour: 18,
			day: 26,
			weekday: 7,
			month: 5,
			year: 24,
			cest: true,
			..Default::default()
		}
	}

	/// Unpack a frame transmitted LSB first from a 64-bit word.
	fn unpack(packed: u64) -> [bool; FRAME_LEN] {
		let mut frame = [false; FRAME_LEN];
		for (i, bit) in frame.iter_mut().enumerate() {
			*bit = (packed >> i) & 1 > 0;
		}
		frame
	}

	#[test]
	fn decode_broadcast_test() {
		// Sun, May 26, 2024. 18:58 CEST, as broadcast
		let frame = unpack(0x090BE631B120000);
		assert_eq!(decode(&frame), Ok(sample_time()));

		// Sun, Mar 31, 2024. 01:39 CET, change to CEST announced
		let frame = unpack(0x907F1827350000);
		assert_eq!(decode(&frame), Ok(DecodedTime {
			minute: 39,
			hour: 1,
			day: 31,
			weekday: 7,
			month: 3,
			year: 24,
			dst_announcement: true,
			cet: true,
			..Default::default()
		}));

		// Thu, Jul 1, 1993. 01:34 CEST, leap second announced
		let frame = unpack(0x64CF018369A0000);
		assert_eq!(decode(&frame), Ok(DecodedTime {
			minute: 34,
			hour: 1,
			day: 1,
			weekday: 4,
			month: 7,
			year: 93,
			cest: true,
			leap_announcement: true,
			..Default::default()
		}));
	}

	#[test]
	fn encode_test() {
		assert_eq!(encode(&sample_time()), unpack(0x090BE631B120000));
		assert_eq!(decode(&encode(&sample_time())), Ok(sample_time()));

		let t = DecodedTime {
			minute: 7,
			hour: 23,
			day: 31,
			weekday: 5,
			month: 12,
			year: 99,
			transmitter_fault: true,
			dst_announcement: true,
			cet: true,
			leap_announcement: true,
			..Default::default()
		};
		assert_eq!(decode(&encode(&t)), Ok(t));
	}

	#[test]
	fn encode_parity_test() {
		let frame = encode(&DecodedTime { minute: 1, hour: 1, day: 1, ..Default::default() });
		// One data bit in each range, so every parity bit is set
		for range in ParityRange::ALL {
			assert!(frame[range.bits().end], "{}", range);
		}
		assert_eq!(validate::check_parity(&frame), Ok(()));
	}

	#[test]
	fn minute_32_test() {
		let mut frame = encode(&DecodedTime { day: 1, month: 1, year: 26, weekday: 4, ..Default::default() });
		let bits = [false, true, false, false, true, true, false];
		frame[21..28].copy_from_slice(&bits);
		// Three bits set, odd, so the parity bit is set
		frame[28] = true;
		let t = decode(&frame).unwrap();
		assert_eq!(t.minute, 32);
		assert_eq!(t.hour, 0);
	}

	#[test]
	fn size_test() {
		let frame = encode(&sample_time());
		assert_eq!(decode(&frame[..58]), Err(DecodeError::InvalidSize(58)));
		assert_eq!(decode(&[]), Err(DecodeError::InvalidSize(0)));

		let mut long = [false; 60];
		long[..FRAME_LEN].copy_from_slice(&frame);
		assert_eq!(decode(&long), Err(DecodeError::InvalidSize(60)));
	}

	#[test]
	fn parity_error_test() {
		let frame = encode(&sample_time());
		for range in ParityRange::ALL {
			for i in range.bits() {
				let mut f = frame;
				f[i] = !f[i];
				assert_eq!(decode(&f), Err(DecodeError::Parity(range)), "bit {}", i);
			}
		}

		// Bits outside the parity ranges don't affect the result
		for i in 0..21 {
			let mut f = frame;
			f[i] = !f[i];
			assert!(decode(&f).is_ok(), "bit {}", i);
		}
	}

	#[test]
	fn date_error_test() {
		let t = sample_time();
		for zeroed in [
			DecodedTime { day: 0, ..t },
			DecodedTime { month: 0, ..t },
			DecodedTime { year: 0, ..t },
			DecodedTime { day: 0, month: 0, year: 0, ..t }
		] {
			assert_eq!(decode(&encode(&zeroed)), Err(DecodeError::Date));
		}

		// Parity is checked before plausibility
		let mut f = encode(&DecodedTime { day: 0, ..t });
		f[29] = !f[29];
		assert_eq!(decode(&f), Err(DecodeError::Parity(ParityRange::Hour)));

		// An all-zero frame has valid parity
		assert_eq!(decode(&[false; FRAME_LEN]), Err(DecodeError::Date));
	}
}
