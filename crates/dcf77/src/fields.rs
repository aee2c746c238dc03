//! Extract fields from a DCF77 frame.
//!
//! Every numeric field is a contiguous run of bits, transmitted LSB first, holding two BCD digits:
//! the first four bits are the ones digit (weights 1, 2, 4, 8), the following bits the tens digit
//! (weights 10, 20, 40, 80). Fields shorter than eight bits simply omit the high weights, e.g. the
//! minute field has tens weights 10, 20, and 40 only. Single bit flags decode with the same
//! scheme to 0 or 1.

/// Weight of each bit within a field, starting with the first transmitted bit.
pub const WEIGHTS: [u8; 8] = [1, 2, 4, 8, 10, 20, 40, 80];

/// Position of a field within a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
	/// Index of the first (least significant) bit.
	pub offset: usize,
	/// Number of bits.
	pub length: usize
}

impl Field {
	const fn new(offset: usize, length: usize) -> Field {
		Field { offset, length }
	}

	/// Index one past the last bit of the field.
	pub const fn end(&self) -> usize {
		self.offset + self.length
	}
}

/// Call bit, set while the transmitter runs in a fault condition.
pub const TRANSMITTER_FAULT: Field = Field::new(15, 1);
/// A1, summer time announcement.
pub const DST_ANNOUNCEMENT: Field = Field::new(16, 1);
/// Z1, CEST in effect.
pub const CEST: Field = Field::new(17, 1);
/// Z2, CET in effect.
pub const CET: Field = Field::new(18, 1);
/// A2, leap second announcement.
pub const LEAP_ANNOUNCEMENT: Field = Field::new(19, 1);
/// Minute, followed by its parity bit.
pub const MINUTE: Field = Field::new(21, 7);
/// Hour, followed by its parity bit.
pub const HOUR: Field = Field::new(29, 6);
/// Day of month, first field covered by the date parity bit.
pub const DAY: Field = Field::new(36, 6);
/// Day of week.
pub const WEEKDAY: Field = Field::new(42, 3);
/// Month.
pub const MONTH: Field = Field::new(45, 5);
/// Year within the century, last field covered by the date parity bit.
pub const YEAR: Field = Field::new(50, 8);

/// Decode a field using the weighted positional scheme.
///
/// Bits beyond the end of `frame` or beyond the eight entries of [`WEIGHTS`] are ignored.
///
/// # Examples
///
/// ```
/// # use dcf77::fields::{extract, MINUTE};
/// let mut frame = [false; dcf77::FRAME_LEN];
/// // Minute 32: ones digit 2 (0100), tens digit 3 (110)
/// for (i, b) in [false, true, false, false, true, true, false].into_iter().enumerate() {
/// 	frame[MINUTE.offset + i] = b;
/// }
/// assert_eq!(extract(&frame, MINUTE), 32);
/// ```
pub fn extract(frame: &[bool], field: Field) -> u8 {
	frame.iter()
		.skip(field.offset)
		.take(field.length)
		.zip(WEIGHTS)
		.filter(|&(&bit, _)| bit)
		.fold(0, |acc, (_, w)| acc + w)
}

/// Decode a single bit field as a flag.
#[inline(always)]
pub fn flag(frame: &[bool], field: Field) -> bool {
	extract(frame, field) > 0
}

/// Encode `value` into a field, the inverse of [`extract`].
///
/// `value` is split into its ones and tens digits. Digit bits that don't fit into the field are
/// dropped, so values outside of the field's range are truncated rather than rejected.
///
/// # Examples
///
/// ```
/// # use dcf77::fields::{extract, insert, HOUR};
/// let mut frame = [false; dcf77::FRAME_LEN];
/// insert(&mut frame, HOUR, 23);
/// assert_eq!(extract(&frame, HOUR), 23);
/// ```
pub fn insert(frame: &mut [bool], field: Field, value: u8) {
	// Ones digit occupies weights 1-8, tens digit weights 10-80
	let bcd = (value % 10) | ((value / 10 % 10) << 4);
	frame.iter_mut()
		.skip(field.offset)
		.take(field.length.min(WEIGHTS.len()))
		.enumerate()
		.for_each(|(i, bit)| *bit = (bcd >> i) & 1 > 0);
}
