//! Support for command line argument parsing.
//!
//! See [crate] documentation for details on command line arguments and examples.

use std::error::Error;
use std::ffi::OsString;
use std::fmt::{Display, Debug};
use std::num::NonZero;
use std::str::FromStr;
use dcf77::Thresholds;

use crate::input::LineConfig;

/// The error type for parsing command line arguments.
#[cfg_attr(test, derive(PartialEq))]
pub enum ArgumentsError {
	/// The option was unrecognized. The option is returned as the payload of this variant.
	UnrecognizedOption(String),
	/// A positional argument was supplied, but none are accepted. The argument is returned as the
	/// payload of this variant.
	UnexpectedArgument(String),
	/// Error converting an option or parameter to UTF-8. Options are required to be UTF-8, as are
	/// most parameters (except the parameter to `-r` / `--replay`). The argument index and original
	/// [`OsString`] that could not be converted are returned as the payload of this variant.
	InvalidUTF8(usize, OsString),
	/// The provided count was invalid. The supplied count argument is returned as the payload of
	/// this variant.
	InvalidCount(String),
	/// The provided channel was invalid. The supplied channel argument is returned as the payload of
	/// this variant.
	InvalidChannel(String),
	/// The provided level was invalid. The supplied level argument is returned as the payload of
	/// this variant.
	InvalidLevel(String),
	/// A provided pulse width was invalid. The option and the supplied argument are returned as the
	/// payload of this variant.
	InvalidDuration(String, String),
	/// The pulse widths don't satisfy `min < bit0 < bit1`. The resulting widths (in microseconds)
	/// are returned as the payload of this variant.
	InvalidThresholds(u32, u32, u32),
	/// The parameter for an option was not supplied. The option is returned as the payload for this
	/// variant.
	MissingParameter(String),
	/// Help option (-h) was included, so print help details and exit.
	Help
}

impl Display for ArgumentsError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ArgumentsError::UnrecognizedOption(s) => write!(f, "Unrecognized option: {}", s),
			ArgumentsError::UnexpectedArgument(s) => write!(f, "Unexpected argument: {}", s),
			ArgumentsError::InvalidUTF8(i, v) => write!(f, "Invalid UTF-8 in argument {}: {:?}", i, v),
			ArgumentsError::InvalidCount(s) => write!(f, "Invalid count: {}", s),
			ArgumentsError::InvalidChannel(s) => write!(f, "Invalid channel: {}", s),
			ArgumentsError::InvalidLevel(s) => write!(f, "Invalid level: {}", s),
			ArgumentsError::InvalidDuration(o, s) => write!(f, "Invalid pulse width for option {}: {}", o, s),
			ArgumentsError::InvalidThresholds(l, b0, b1) =>
				write!(f, "Invalid pulse widths, expected min < bit0 < bit1: {} / {} / {}", l, b0, b1),
			ArgumentsError::MissingParameter(s) => write!(f, "Missing parameter for option {}", s),
			ArgumentsError::Help => write!(f, "Help requested")
		}
	}
}

impl Debug for ArgumentsError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		Display::fmt(self, f)
	}
}

impl Error for ArgumentsError {}

/// Convert an argument to [`&str`].
///
/// The function takes the argument index `i`, optional argument name `a`, and the argument `s`.
///
/// # Errors
///
/// Returns [`ArgumentsError::InvalidUTF8`] if the argument could not be converted to UTF-8 or
/// [`ArgumentsError::MissingParameter`] if the argument is `None`.
fn arg_to_str<'a, 'b>(i: usize, a: Option<&'a str>, s: Option<&'b OsString>)
	-> Result<&'b str, ArgumentsError>
{
	match s {
		Some(v) => v.to_str().ok_or_else(|| ArgumentsError::InvalidUTF8(i, v.clone())),
		None => Err(ArgumentsError::MissingParameter(a.map(String::from).unwrap_or_default()))
	}
}

/// Parse the parameter of option `a` (argument index `i`) into `T`.
///
/// # Errors
///
/// Returns the errors of [`arg_to_str`], or the result of `err` applied to the parameter if it
/// can't be parsed.
fn parse_param<T: FromStr>(i: usize, a: &str, s: Option<&OsString>,
	err: impl FnOnce(String) -> ArgumentsError) -> Result<T, ArgumentsError>
{
	let v = arg_to_str(i, Some(a), s)?;
	v.parse().map_err(|_| err(v.to_string()))
}

/// Parsed command line arguments.
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct Arguments {
	/// The number of time values to decode.
	pub count: NonZero<usize>,
	/// The receiver line configuration, for audio input.
	pub line: LineConfig,
	/// The replay file to read instead of audio input (if provided).
	pub replay: Option<OsString>,
	/// Pulse classification thresholds.
	pub thresholds: Thresholds,
	/// Whether to print diagnostics.
	pub verbose: bool
}

impl Arguments {
	/// Parse command line arguments.
	///
	/// The input can be any type that implements [`Iterator`] that yields [`OsString`], though
	/// typically this would be [`std::env::args_os`]. This function assumes that the application
	/// name is **not** supplied as the first item yielded by `args`, see examples for common use.
	///
	/// # Errors
	///
	/// This function can return any of the variants in [`ArgumentsError`]. See that documentation
	/// for more details.
	///
	/// # Examples
	///
	/// ```
	/// let args = match Arguments::parse(std::env::args_os().skip(1)) {
	/// 	Ok(a) => a,
	/// 	Err(e) => {
	/// 		// Handle error
	/// 		panic!("{}", e);
	/// 	}
	/// };
	/// ```
	pub fn parse(mut args: impl Iterator<Item = OsString>) -> Result<Arguments, ArgumentsError>
	{
		let mut count: Option<NonZero<usize>> = None;
		let mut line = LineConfig::default();
		let mut replay: Option<OsString> = None;
		let defaults = Thresholds::default();
		let (mut low_min, mut bit0_max, mut bit1_max) =
			(defaults.low_min(), defaults.bit0_max(), defaults.bit1_max());
		let mut verbose = false;
		let mut arg = args.next();
		let mut i = 0;
		loop {
			if arg.is_none() { break; }
			match arg_to_str(i, None, arg.as_ref())? {
				n @ ("-n" | "--count") => {
					count = Some(parse_param(i+1, n, args.next().as_ref(), ArgumentsError::InvalidCount)?);
					// Increment because we called args.next()
					i += 1;
				},
				d @ ("-d" | "--device") => {
					line.device = Some(String::from(arg_to_str(i+1, Some(d), args.next().as_ref())?));
					i += 1;
				},
				c @ ("-c" | "--channel") => {
					line.channel = parse_param(i+1, c, args.next().as_ref(), ArgumentsError::InvalidChannel)?;
					i += 1;
				},
				l @ ("-l" | "--level") => {
					let level: f32 = parse_param(i+1, l, args.next().as_ref(), ArgumentsError::InvalidLevel)?;
					if !(level > 0. && level < 1.) {
						return Err(ArgumentsError::InvalidLevel(level.to_string()));
					}
					line.level = level;
					i += 1;
				},
				r @ ("-r" | "--replay") => {
					if let Some(a) = args.next() {
						replay = Some(a);
					} else {
						return Err(ArgumentsError::MissingParameter(r.to_string()))
					}
					i += 1;
				},
				o @ ("--min" | "--bit0" | "--bit1") => {
					let v = parse_param(i+1, o, args.next().as_ref(),
						|s| ArgumentsError::InvalidDuration(o.to_string(), s))?;
					match o {
						"--min" => low_min = v,
						"--bit0" => bit0_max = v,
						_ => bit1_max = v
					}
					i += 1;
				},
				"-i" | "--invert" => line.invert = true,
				"-v" | "--verbose" => verbose = true,
				"-h" | "--help" => return Err(ArgumentsError::Help),
				v => {
					return Err(if v.starts_with('-') {
						ArgumentsError::UnrecognizedOption(v.to_string())
					} else {
						ArgumentsError::UnexpectedArgument(v.to_string())
					});
				}
			}
			arg = args.next();
			// Increment because we called args.next()
			i += 1;
		}

		Ok(Arguments {
			count: count.unwrap_or(NonZero::<usize>::MIN),
			line,
			replay,
			thresholds: Thresholds::new(low_min, bit0_max, bit1_max)
				.ok_or(ArgumentsError::InvalidThresholds(low_min, bit0_max, bit1_max))?,
			verbose
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(args: &[&str]) -> Result<Arguments, ArgumentsError> {
		Arguments::parse(args.iter().map(OsString::from))
	}

	#[test]
	fn arg_to_str_test() {
		let valid = OsString::from_str("test").unwrap();
		assert_eq!(
			arg_to_str(1, Some("arg"), Some(&valid)),
			Ok("test")
		);
		assert_eq!(
			arg_to_str(1, Some("arg"), None),
			Err(ArgumentsError::MissingParameter(String::from("arg")))
		);

		let invalid = unsafe { OsString::from_encoded_bytes_unchecked(vec![b't', 0xff, b's', b't']) };
		assert_eq!(
			arg_to_str(1, Some("arg"), Some(&invalid)),
			Err(ArgumentsError::InvalidUTF8(1, invalid.clone()))
		);
	}

	#[test]
	fn defaults_test() {
		assert_eq!(
			parse(&[]),
			Ok(Arguments {
				count: NonZero::new(1).unwrap(),
				line: LineConfig::default(),
				replay: None,
				thresholds: Thresholds::default(),
				verbose: false
			})
		);
	}

	#[test]
	fn arguments_parse_test() {
		assert_eq!(
			parse(&["-n", "5", "-d", "USB Audio", "-c", "1", "-l", "0.25", "-i", "-v"]),
			Ok(Arguments {
				count: NonZero::new(5).unwrap(),
				line: LineConfig {
					device: Some(String::from("USB Audio")),
					channel: 1,
					level: 0.25,
					invert: true
				},
				replay: None,
				thresholds: Thresholds::default(),
				verbose: true
			})
		);

		assert_eq!(
			parse(&["--replay", "minute.txt", "--count", "3", "--min", "30000", "--bit0", "150000",
				"--bit1", "260000", "--verbose"]),
			Ok(Arguments {
				count: NonZero::new(3).unwrap(),
				line: LineConfig::default(),
				replay: Some(OsString::from("minute.txt")),
				thresholds: Thresholds::new(30000, 150000, 260000).unwrap(),
				verbose: true
			})
		);

		// Later options override earlier ones
		assert_eq!(
			parse(&["-n", "2", "--count", "7", "--channel", "0", "-c", "3"]).map(|a| (a.count.get(), a.line.channel)),
			Ok((7, 3))
		);

		assert_eq!(parse(&["-h"]), Err(ArgumentsError::Help));
		assert_eq!(parse(&["-v", "--help"]), Err(ArgumentsError::Help));
	}

	#[test]
	fn arguments_error_test() {
		assert_eq!(parse(&["-n"]), Err(ArgumentsError::MissingParameter(String::from("-n"))));
		assert_eq!(parse(&["-r"]), Err(ArgumentsError::MissingParameter(String::from("-r"))));
		assert_eq!(parse(&["--device"]), Err(ArgumentsError::MissingParameter(String::from("--device"))));
		assert_eq!(parse(&["-n", "asd"]), Err(ArgumentsError::InvalidCount(String::from("asd"))));
		assert_eq!(parse(&["-n", "0"]), Err(ArgumentsError::InvalidCount(String::from("0"))));
		assert_eq!(parse(&["-n", "-5"]), Err(ArgumentsError::InvalidCount(String::from("-5"))));
		assert_eq!(parse(&["-c", "left"]), Err(ArgumentsError::InvalidChannel(String::from("left"))));
		assert_eq!(parse(&["-l", "loud"]), Err(ArgumentsError::InvalidLevel(String::from("loud"))));
		assert_eq!(parse(&["-l", "1.5"]), Err(ArgumentsError::InvalidLevel(String::from("1.5"))));
		assert_eq!(parse(&["-l", "0"]), Err(ArgumentsError::InvalidLevel(String::from("0"))));
		assert_eq!(
			parse(&["--bit0", "130ms"]),
			Err(ArgumentsError::InvalidDuration(String::from("--bit0"), String::from("130ms")))
		);
		assert_eq!(
			parse(&["--bit0", "250000"]),
			Err(ArgumentsError::InvalidThresholds(20000, 250000, 240000))
		);
		assert_eq!(parse(&["--frobnicate"]), Err(ArgumentsError::UnrecognizedOption(String::from("--frobnicate"))));
		assert_eq!(parse(&["dcf77"]), Err(ArgumentsError::UnexpectedArgument(String::from("dcf77"))));
	}
}
