//! WAV decoding for file indexing.

use std::path::Path;

use hound::{SampleFormat, WavReader};

use crate::error::Status;

/// Reads a WAV file as 16-bit mono PCM.
///
/// Multi-channel audio is down-mixed by averaging. The file must already be
/// at `sample_rate`; the scripted engine does not resample.
pub(crate) fn read_mono(path: &Path, sample_rate: u32) -> Result<Vec<i16>, (Status, String)> {
    let mut reader = WavReader::open(path).map_err(|e| decode_error(path, e))?;
    let spec = reader.spec();

    if spec.sample_rate != sample_rate {
        return Err((
            Status::InvalidArgument,
            format!(
                "{}: sample rate {} does not match the required {}",
                path.display(),
                spec.sample_rate,
                sample_rate
            ),
        ));
    }

    let interleaved: Vec<i16> = match spec.sample_format {
        SampleFormat::Int => {
            let shift = i32::from(spec.bits_per_sample) - 16;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| rescale(v, shift)))
                .collect::<Result<_, _>>()
                .map_err(|e| decode_error(path, e))?
        }
        SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16))
            .collect::<Result<_, _>>()
            .map_err(|e| decode_error(path, e))?,
    };

    let channels = usize::from(spec.channels.max(1));
    if channels == 1 {
        return Ok(interleaved);
    }
    Ok(interleaved
        .chunks_exact(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
            (sum / channels as i32) as i16
        })
        .collect())
}

fn rescale(v: i32, shift: i32) -> i16 {
    let scaled = if shift >= 0 { v >> shift } else { v << -shift };
    scaled.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

fn decode_error(path: &Path, e: hound::Error) -> (Status, String) {
    match e {
        hound::Error::IoError(e) => (Status::IoError, format!("read {}: {}", path.display(), e)),
        e => (Status::InvalidArgument, format!("decode {}: {}", path.display(), e)),
    }
}
