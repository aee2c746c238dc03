//! Receive the DCF77 time signal using simple audio input.
//!
//! This application decodes [DCF77] from the output line of a receiver module. Inexpensive DCF77
//! receiver modules demodulate the longwave signal into a digital line that is high for 100 ms
//! (`0` bit) or 200 ms (`1` bit) once per second. Connecting that line to an audio input lets the
//! sound card sample it; no further hardware is needed. Alternatively, pulse widths recorded
//! elsewhere can be replayed from a file.
//!
//! Reception takes at least one full minute per decoded time value. Each value is printed as soon
//! as the last bit of its frame is received, just under two seconds before the printed minute
//! begins.
//!
//! [DCF77]: https://en.wikipedia.org/wiki/DCF77
//!
//! # Command Line Arguments
//!
//! General form: `timereceiver [options...]`
//!
//! | Short form | Long form   | Argument        | Default         | Description                        |
//! | ---------- | ----------- | --------------- | --------------- | ---------------------------------- |
//! | `-n`       | `--count`   | Integer > 0     | 1               | The number of time values to print |
//! | `-d`       | `--device`  | Device name     | Default input   | The audio input device to use      |
//! | `-c`       | `--channel` | Integer >= 0    | 0               | The input channel to use           |
//! | `-l`       | `--level`   | Number in (0,1) | 0.5             | Line level considered high         |
//! | `-i`       | `--invert`  |                 |                 | Treat the line as active low       |
//! | `-r`       | `--replay`  | Filename        | None            | Replay pulse widths from a file    |
//! |            | `--min`     | Microseconds    | 20000           | Shorter pulses are glitches        |
//! |            | `--bit0`    | Microseconds    | 130000          | Longest `0` pulse                  |
//! |            | `--bit1`    | Microseconds    | 240000          | Longest `1` pulse                  |
//! | `-v`       | `--verbose` |                 |                 | Print every received bit           |
//!
//! Replay files contain one entry per line: a pulse width in microseconds, or `-` for a missing
//! pulse. Blank lines and lines starting with `#` are ignored.
//!
//! # Examples
//!
//! Print the next time value from the default audio input
//! ```sh
//! timereceiver
//! ```
//!
//! Print 5 time values, showing reception details, from the right channel of a USB sound card
//! ```sh
//! timereceiver -v -n 5 -c 1 -d "USB Audio Device"
//! ```
//!
//! Decode a recording
//! ```sh
//! timereceiver -r recording.txt -n 10
//! ```

use std::error::Error;
use std::process::ExitCode;

use args::{Arguments, ArgumentsError};
use dcf77::{DecodedTime, Diagnostics, Event, FrameAcquirer, Receiver};
use input::{AudioInput, Input, ReplayPulseSource};

mod args;
mod input;

/// [`Diagnostics`] printing events to stderr, if enabled.
struct Stderr {
	enabled: bool
}

impl Diagnostics for Stderr {
	fn record(&mut self, event: &Event) {
		if self.enabled {
			eprintln!("{}", event);
		}
	}
}

/// Describe a time value for output.
///
/// Appends the weekday and any announcements to the [`DecodedTime`] display format.
///
/// # Examples
/// ```
/// let t = DecodedTime { minute: 58, hour: 18, day: 26, weekday: 7, month: 5, year: 24, cest: true, ..Default::default() };
/// assert_eq!(describe(&t), "2024-05-26 18:58 CEST Sun");
/// ```
fn describe(time: &DecodedTime) -> String {
	const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

	let mut s = format!("{} {}", time, WEEKDAYS.get(time.weekday.wrapping_sub(1) as usize).unwrap_or(&"?"));
	if time.dst_announcement {
		s.push_str(" [DST change announced]");
	}
	if time.leap_announcement {
		s.push_str(" [leap second announced]");
	}
	if time.transmitter_fault {
		s.push_str(" [transmitter fault]");
	}
	s
}

/// Receive and print time values from `source`.
///
/// Failed minutes are reported and reception continues with the next minute, until
/// `args.count` time values were printed or `source` is exhausted. Returns the number of printed
/// time values.
fn receive<P: Input>(source: P, args: &Arguments) -> usize {
	let acquirer = FrameAcquirer::new(source, args.thresholds)
		.with_diagnostics(Stderr { enabled: args.verbose });
	let mut receiver = Receiver::from_acquirer(acquirer);

	let mut received = 0;
	while received < args.count.get() {
		match receiver.receive() {
			Ok(t) => {
				println!("{}", describe(&t));
				received += 1;
			},
			// Running out of input is not a reception error
			Err(_) if receiver.acquirer().source().exhausted() => break,
			Err(e) => eprintln!("{}", e)
		}
	}
	received
}

/// Open the configured input and receive time values.
///
/// # Errors
///
/// This function can generate a variety of errors, all wrapped in `Box<dyn Error>`:
/// - [`input::ReplayError`] from reading a replay file.
/// - Audio device errors, see [`AudioInput::open`].
fn run(args: Arguments) -> Result<ExitCode, Box<dyn Error>> {
	let received = match &args.replay {
		Some(path) => receive(ReplayPulseSource::load(path)?, &args),
		None => {
			let input = AudioInput::open(&args.line)?;
			if args.verbose {
				eprintln!("Listening, the first time value follows in one to two minutes...");
			}
			receive(input, &args)
		}
	};

	Ok(if received == args.count.get() {
		ExitCode::SUCCESS
	} else {
		eprintln!("Input ended after {} of {} time value(s)", received, args.count);
		ExitCode::FAILURE
	})
}

/// Main program entry point.
///
/// Parses input arguments and receives time values. See [`crate`] documentation for details.
fn main() -> ExitCode {
	let args = match Arguments::parse(std::env::args_os().skip(1)) {
		Ok(a) => a,
		Err(e) => {
			return if let ArgumentsError::Help = e {
				println!("\
Receive the DCF77 time signal from a receiver module connected to an audio input.

Usage: timereceiver [OPTIONS]

Options:
  -n, --count <COUNT>     the number of time values to print, default 1
  -d, --device <NAME>     the audio input device, default input if not set
  -c, --channel <INDEX>   the input channel carrying the signal, default 0
  -l, --level <LEVEL>     the level (0-1) above which the line is high, default 0.5
  -i, --invert            the line is low during pulses
  -r, --replay <FILE>     replay pulse widths (us, '-' for none) from FILE
  --min <US>              pulses up to this width are glitches, default 20000
  --bit0 <US>             pulses up to this width are 0 bits, default 130000
  --bit1 <US>             pulses up to this width are 1 bits, default 240000
  -v, --verbose           print reception details

Examples:
  timereceiver
  timereceiver -v -n 5 -c 1 -d \"USB Audio Device\"
  timereceiver -r recording.txt -n 10\n");
				ExitCode::SUCCESS
			} else {
				eprintln!("{}", e);
				ExitCode::FAILURE
			}
		}
	};

	if args.replay.is_some() && (args.line.device.is_some() || args.line.channel != 0) {
		println!("Warning: --device and --channel do nothing when replaying with -r or --replay");
	}

	run(args)
		.inspect_err(|e| eprintln!("{}", e))
		.unwrap_or(ExitCode::FAILURE)
}
