//! Synthetic datafile generation for `EDG`.

use std::io;
use std::path::Path;

use rand::Rng;
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

/// Smallest generated sample.
pub const MIN_SAMPLE: u32 = 1;
/// Largest generated sample.
pub const MAX_SAMPLE: u32 = 9999;

/// Writes `amount` random samples to `out`, one per line, each line
/// terminated.  Samples are produced as they are written, so memory use does
/// not grow with `amount`.
///
/// # Errors
///
/// Returns the first write error from `out`.
pub async fn write_samples<W, R>(out: &mut W, rng: &mut R, amount: u32) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
    R: Rng + ?Sized,
{
    let mut line = String::with_capacity(8);
    for _ in 0..amount {
        line.clear();
        line.push_str(&rng.gen_range(MIN_SAMPLE..=MAX_SAMPLE).to_string());
        line.push('\n');
        out.write_all(line.as_bytes()).await?;
    }
    out.flush().await
}

/// Creates (or truncates) `path` and fills it with `amount` samples through
/// a buffered writer.
///
/// # Errors
///
/// Returns any error creating or writing the file.
pub async fn generate_file<R>(path: &Path, rng: &mut R, amount: u32) -> io::Result<()>
where
    R: Rng + ?Sized,
{
    let mut out = BufWriter::new(File::create(path).await?);
    write_samples(&mut out, rng, amount).await
}
