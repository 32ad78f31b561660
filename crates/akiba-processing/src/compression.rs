//! Conditional gzip compression.
//!
//! Compression only pays off when it actually shrinks the file: the engine
//! keeps the compressed variant only when it is at least 10% smaller than
//! the original, and otherwise discards the attempt and leaves the original
//! untouched. Pre-compressed formats are skipped outright.

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use thiserror::Error;

use akiba_core::constants::{MIN_COMPRESSION_GAIN, PRECOMPRESSED_EXTENSIONS};
use akiba_storage::naming::file_extension;

/// Suffix appended to compressed files.
pub const COMPRESSED_SUFFIX: &str = ".gz";

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type CompressionOpResult<T> = Result<T, CompressionError>;

/// Outcome of a compression attempt.
#[derive(Debug, Clone)]
pub struct CompressionResult {
    /// Where the file now lives: the `.gz` path when compression was kept,
    /// the untouched original otherwise.
    pub final_path: PathBuf,
    pub original_size: u64,
    pub final_size: u64,
    pub is_compressed: bool,
}

fn gz_path_for(path: &Path) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_owned();
    os.push(COMPRESSED_SUFFIX);
    PathBuf::from(os)
}

fn gzip_to(input: &Path, output: &Path, level: u32) -> io::Result<()> {
    let reader = File::open(input)?;
    let writer = File::create(output)?;
    let mut encoder = GzEncoder::new(BufWriter::new(writer), Compression::new(level));
    io::copy(&mut BufReader::new(reader), &mut encoder)?;
    encoder.finish()?.into_inner().map_err(|e| e.into_error())?;
    Ok(())
}

fn gunzip_to(input: &Path, output: &Path) -> io::Result<()> {
    let reader = File::open(input)?;
    let mut decoder = GzDecoder::new(BufReader::new(reader));
    let mut writer = BufWriter::new(File::create(output)?);
    io::copy(&mut decoder, &mut writer)?;
    Ok(())
}

/// Gzip `path` in place, keeping the result only if it saves at least 10%.
///
/// Returns the original path unchanged for pre-compressed extensions and for
/// attempts that did not clear the size bound. On success the original file
/// is removed and the `.gz` variant takes its place. A partially written
/// `.gz` file is cleaned up before an I/O error propagates.
pub async fn compress_file(path: &Path, level: u32) -> CompressionOpResult<CompressionResult> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(CompressionError::NotFound(path.to_path_buf()));
    }

    let original_size = tokio::fs::metadata(path).await?.len();

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = file_extension(&filename);
    if PRECOMPRESSED_EXTENSIONS.contains(&ext.as_str()) {
        return Ok(CompressionResult {
            final_path: path.to_path_buf(),
            original_size,
            final_size: original_size,
            is_compressed: false,
        });
    }

    let gz_path = gz_path_for(path);

    let input = path.to_path_buf();
    let output = gz_path.clone();
    let compress_outcome =
        tokio::task::spawn_blocking(move || gzip_to(&input, &output, level)).await;

    match compress_outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            let _ = tokio::fs::remove_file(&gz_path).await;
            return Err(e.into());
        }
        Err(join_err) => {
            let _ = tokio::fs::remove_file(&gz_path).await;
            return Err(CompressionError::Io(io::Error::other(join_err)));
        }
    }

    let compressed_size = tokio::fs::metadata(&gz_path).await?.len();

    if (compressed_size as f64) < original_size as f64 * MIN_COMPRESSION_GAIN {
        tokio::fs::remove_file(path).await?;
        tracing::info!(
            path = %gz_path.display(),
            original_size,
            compressed_size,
            "Compression kept"
        );
        Ok(CompressionResult {
            final_path: gz_path,
            original_size,
            final_size: compressed_size,
            is_compressed: true,
        })
    } else {
        tokio::fs::remove_file(&gz_path).await?;
        tracing::debug!(
            path = %path.display(),
            original_size,
            compressed_size,
            "Compression discarded, below 10% gain"
        );
        Ok(CompressionResult {
            final_path: path.to_path_buf(),
            original_size,
            final_size: original_size,
            is_compressed: false,
        })
    }
}

/// Decompress a `.gz` file to `output` (or to the input path minus its
/// suffix). Inputs that do not end in `.gz` are returned unchanged.
pub async fn decompress_file(
    compressed_path: &Path,
    output_path: Option<&Path>,
) -> CompressionOpResult<PathBuf> {
    let path_str = compressed_path.to_string_lossy();
    let Some(default_output) = path_str.strip_suffix(COMPRESSED_SUFFIX) else {
        return Ok(compressed_path.to_path_buf());
    };

    if !tokio::fs::try_exists(compressed_path).await.unwrap_or(false) {
        return Err(CompressionError::NotFound(compressed_path.to_path_buf()));
    }

    let output = output_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(default_output));

    let input = compressed_path.to_path_buf();
    let out = output.clone();
    let outcome = tokio::task::spawn_blocking(move || gunzip_to(&input, &out)).await;

    match outcome {
        Ok(Ok(())) => Ok(output),
        Ok(Err(e)) => {
            let _ = tokio::fs::remove_file(&output).await;
            Err(e.into())
        }
        Err(join_err) => {
            let _ = tokio::fs::remove_file(&output).await;
            Err(CompressionError::Io(io::Error::other(join_err)))
        }
    }
}
