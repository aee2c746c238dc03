//! Pulse sources for the receiver.
//!
//! Two sources are supported:
//! - [`AudioInput`]: the output line of a DCF77 receiver module connected to an audio input. The
//!   line level is sampled by the sound card and pulse widths are measured in sample time by
//!   [`LevelPulseSource`].
//! - [`ReplayPulseSource`]: previously recorded pulse widths read from a file, one per line.

use std::error::Error;
use std::ffi::OsStr;
use std::fmt::{self, Display, Debug};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::{fs, io, vec};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::Sample;
use dcf77::PulseSource;

/// A [`PulseSource`] that may run out of input.
pub trait Input: PulseSource {
	/// Whether the input ended. An exhausted input only ever reports missing pulses.
	fn exhausted(&self) -> bool;
}

/// Configuration of the line carrying the receiver module's output.
#[derive(Clone)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct LineConfig {
	/// Name of the audio input device, `None` for the default device.
	pub device: Option<String>,
	/// Index of the input channel the line is connected to.
	pub channel: usize,
	/// Envelope level (ranged (0, 1)) above which the line is high.
	pub level: f32,
	/// Swap high and low, for modules with an inverted output.
	pub invert: bool
}

impl Default for LineConfig {
	fn default() -> Self {
		LineConfig {
			device: None,
			channel: 0,
			level: 0.5,
			invert: false
		}
	}
}

/// Envelope decay time constant, in seconds.
const ENVELOPE_DECAY: f32 = 0.005;

/// Fraction of the configured level at which a high line drops back to low.
const HYSTERESIS: f32 = 0.8;

/// Measures high pulses in a stream of line samples.
///
/// The samples are rectified and followed by an envelope with instant attack and exponential decay,
/// which makes detection independent of the line polarity seen by AC coupled audio inputs. The
/// envelope is compared to the configured level with hysteresis.
///
/// All timing is in sample time: a timeout of `t` microseconds expires after `t * rate / 10^6`
/// samples.
pub struct LevelPulseSource<I> {
	samples: I,
	rate: u32,
	high_on: f32,
	high_off: f32,
	invert: bool,
	decay: f32,
	envelope: f32,
	above: bool,
	/// Last reported line state. Starts high so that a pulse in progress at startup is skipped.
	high: bool,
	exhausted: bool
}

impl<I: Iterator<Item = f32>> LevelPulseSource<I> {
	/// Create a new pulse source reading `samples` taken at `rate` Hz.
	pub fn new(samples: I, rate: u32, line: &LineConfig) -> LevelPulseSource<I> {
		LevelPulseSource {
			samples,
			rate,
			high_on: line.level,
			high_off: line.level * HYSTERESIS,
			invert: line.invert,
			decay: (-1.0 / (rate as f32 * ENVELOPE_DECAY)).exp(),
			envelope: 0.0,
			above: false,
			high: true,
			exhausted: false
		}
	}

	/// Read the next sample and update the line state.
	///
	/// Returns `None` when the samples run out.
	fn next_level(&mut self) -> Option<bool> {
		let sample = self.samples.next()?;
		self.envelope = sample.abs().max(self.envelope * self.decay);
		if self.above {
			self.above = self.envelope >= self.high_off;
		} else {
			self.above = self.envelope > self.high_on;
		}
		Some(self.above ^ self.invert)
	}
}

impl<I: Iterator<Item = f32>> PulseSource for LevelPulseSource<I> {
	fn measure_high(&mut self, timeout_us: u32) -> Option<u32> {
		if self.exhausted {
			return None;
		}

		let limit = timeout_us as u64 * self.rate as u64 / 1_000_000;
		let mut width: Option<u64> = None;
		for _ in 0..limit {
			let Some(high) = self.next_level() else {
				self.exhausted = true;
				return None;
			};
			let rising = high && !self.high;
			self.high = high;

			match width {
				None if rising => width = Some(1),
				None => (),
				Some(n) if high => width = Some(n + 1),
				Some(n) => return Some((n * 1_000_000 / self.rate as u64) as u32)
			}
		}
		None
	}
}

impl<I: Iterator<Item = f32>> Input for LevelPulseSource<I> {
	fn exhausted(&self) -> bool {
		self.exhausted
	}
}

/// Samples of one channel, received in chunks from the audio callback.
pub struct ChannelSamples {
	rx: Receiver<Vec<f32>>,
	chunk: vec::IntoIter<f32>
}

impl Iterator for ChannelSamples {
	type Item = f32;

	fn next(&mut self) -> Option<f32> {
		loop {
			if let Some(s) = self.chunk.next() {
				return Some(s);
			}
			// Blocks until the audio callback delivers more samples, ends when the stream is gone
			self.chunk = self.rx.recv().ok()?.into_iter();
		}
	}
}

/// Receiver module line sampled by an audio input device.
pub struct AudioInput {
	/// Kept alive for as long as samples are read.
	_stream: cpal::Stream,
	source: LevelPulseSource<ChannelSamples>
}

/// Error handler for audio streaming.
///
/// Prints the error. Reception recovers on its own at the next minute marker.
fn audio_error(error: cpal::StreamError) {
	eprintln!("Error occured on the stream: {}", error);
}

/// Build an input stream forwarding `channel` of every frame to `tx`.
fn build_stream<T>(device: &cpal::Device, config: &cpal::StreamConfig, channel: usize,
	tx: SyncSender<Vec<f32>>) -> Result<cpal::Stream, cpal::BuildStreamError>
where T: cpal::SizedSample, f32: cpal::FromSample<T>
{
	let channels = config.channels as usize;
	device.build_input_stream(
		config,
		move |data: &[T], _info: &cpal::InputCallbackInfo| {
			let chunk = data.iter()
				.skip(channel)
				.step_by(channels)
				.map(|&s| s.to_sample::<f32>())
				.collect();
			// Never block the audio thread. A full channel means the decoder is stalled anyway.
			let _ = tx.try_send(chunk);
		},
		audio_error,
		None)
}

impl AudioInput {
	/// Open the audio input described by `line` and start sampling.
	///
	/// The device's default input configuration is used; samples of any supported format are
	/// converted to `f32`.
	///
	/// # Errors
	///
	/// This function can generate a variety of errors, all wrapped in `Box<dyn Error>`:
	/// - [`cpal::DevicesError`], [`cpal::DefaultStreamConfigError`], [`cpal::BuildStreamError`],
	///   [`cpal::PlayStreamError`] from configuring the device.
	/// - `String` for missing devices, channels, or unsupported sample formats.
	pub fn open(line: &LineConfig) -> Result<AudioInput, Box<dyn Error>> {
		let host = cpal::default_host();
		let device = match &line.device {
			Some(name) => host.input_devices()?
				.find(|d| d.name().is_ok_and(|n| n == *name))
				.ok_or_else(|| format!("Audio input device not found: {}", name))?,
			None => host.default_input_device().ok_or("Failed to get default audio input device")?
		};

		let supported = device.default_input_config()?;
		let channels = supported.channels() as usize;
		if line.channel >= channels {
			return Err(format!("Input channel {} not available, device has {} channel(s)",
				line.channel, channels).into());
		}
		let rate = supported.sample_rate().0;
		let config = supported.config();

		let (tx, rx) = sync_channel::<Vec<f32>>(64);
		let stream = match supported.sample_format() {
			cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, line.channel, tx)?,
			cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, line.channel, tx)?,
			cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, line.channel, tx)?,
			cpal::SampleFormat::I32 => build_stream::<i32>(&device, &config, line.channel, tx)?,
			f => return Err(format!("Unsupported sample format: {:?}", f).into())
		};
		stream.play()?;

		let samples = ChannelSamples { rx, chunk: Vec::new().into_iter() };
		Ok(AudioInput {
			_stream: stream,
			source: LevelPulseSource::new(samples, rate, line)
		})
	}
}

impl PulseSource for AudioInput {
	fn measure_high(&mut self, timeout_us: u32) -> Option<u32> {
		self.source.measure_high(timeout_us)
	}
}

impl Input for AudioInput {
	fn exhausted(&self) -> bool {
		self.source.exhausted()
	}
}

/// The error type for reading replay files.
pub enum ReplayError {
	/// The file could not be read. The underlying error is provided in the payload.
	Io(io::Error),
	/// A line is neither a pulse width nor a missing pulse. The line number (starting at 1) and
	/// its content are provided in the payload.
	InvalidLine(usize, String)
}

impl Display for ReplayError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ReplayError::Io(e) => write!(f, "Error reading replay file: {}", e),
			ReplayError::InvalidLine(i, s) => write!(f, "Invalid replay line {}: {}", i, s),
		}
	}
}

impl Debug for ReplayError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		Display::fmt(self, f)
	}
}

impl Error for ReplayError {}

/// Replays recorded pulse widths.
///
/// The replay format has one entry per line: a pulse width in microseconds, or `-` or `0` for a
/// missing pulse. Blank lines and lines starting with `#` are ignored. The timeout passed to
/// [`PulseSource::measure_high`] is ignored, since timeouts are part of the recording.
///
/// # Examples
///
/// ```
/// let mut r = ReplayPulseSource::parse("# marker\n-\n102000\n\n198000\n").unwrap();
/// assert_eq!(r.measure_high(1_600_000), None);
/// assert_eq!(r.measure_high(1_600_000), Some(102000));
/// assert_eq!(r.measure_high(1_600_000), Some(198000));
/// assert!(r.exhausted());
/// ```
pub struct ReplayPulseSource {
	pulses: vec::IntoIter<Option<u32>>
}

impl ReplayPulseSource {
	/// Parse replay text.
	///
	/// # Errors
	///
	/// Returns [`ReplayError::InvalidLine`] for the first line that can't be parsed.
	pub fn parse(text: &str) -> Result<ReplayPulseSource, ReplayError> {
		let pulses = text.lines()
			.enumerate()
			.map(|(i, l)| (i + 1, l.trim()))
			.filter(|(_, l)| !l.is_empty() && !l.starts_with('#'))
			.map(|(i, l)| match l {
				"-" | "0" => Ok(None),
				_ => l.parse().map(Some).map_err(|_| ReplayError::InvalidLine(i, l.to_string()))
			})
			.collect::<Result<Vec<_>, _>>()?;
		Ok(ReplayPulseSource { pulses: pulses.into_iter() })
	}

	/// Read and parse a replay file.
	///
	/// # Errors
	///
	/// Returns [`ReplayError::Io`] if the file can't be read, see [`ReplayPulseSource::parse`] for
	/// other errors.
	pub fn load(path: &OsStr) -> Result<ReplayPulseSource, ReplayError> {
		let text = fs::read_to_string(path).map_err(ReplayError::Io)?;
		ReplayPulseSource::parse(&text)
	}
}

impl PulseSource for ReplayPulseSource {
	fn measure_high(&mut self, _timeout_us: u32) -> Option<u32> {
		self.pulses.next().flatten()
	}
}

impl Input for ReplayPulseSource {
	fn exhausted(&self) -> bool {
		self.pulses.len() == 0
	}
}
