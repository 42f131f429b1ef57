//! Source reader: opens local or remote byte streams, with optional caching.
//!
//! All reads go through [oneio], which handles `http(s)://` fetching and
//! transparent `gz`/`bz2` decompression based on the file suffix.
use crate::ParserError;
use log::{debug, info};
use std::io::Read;
use std::path::Path;

/// Create a reader for a local file path or a remote URL.
pub(crate) fn open_source(path: &str) -> Result<Box<dyn Read + Send>, ParserError> {
    debug!("opening MRT source {}", path);
    Ok(oneio::get_reader(path)?)
}

/// Create a reader for `path`, caching remote content in `cache_dir`.
///
/// Remote files are downloaded once into `cache_dir` under a name derived
/// from the URL (see [cache_file_name]) and read from disk afterwards. Local
/// paths bypass the cache entirely.
pub(crate) fn open_cached_source(
    path: &str,
    cache_dir: &str,
) -> Result<Box<dyn Read + Send>, ParserError> {
    if !path.starts_with("http") {
        return open_source(path);
    }

    let cached_path = format!("{}/{}", cache_dir.trim_end_matches('/'), cache_file_name(path));
    if Path::new(&cached_path).exists() {
        info!("reading {} from cached copy {}", path, cached_path);
    } else {
        std::fs::create_dir_all(cache_dir)?;
        info!("downloading {} to cache file {}", path, cached_path);
        oneio::download(path, &cached_path)?;
    }
    open_source(&cached_path)
}

/// On-disk name for the cached copy of a URL.
///
/// The name keeps the remote base name so the suffix-based decompression
/// still works, and prepends a CRC32 of the full URL so two URLs with the
/// same base name do not collide.
pub(crate) fn cache_file_name(url: &str) -> String {
    let base_name = url.rsplit('/').next().unwrap_or(url);
    format!("cache-{}-{}", crc32(url), base_name)
}

/// CRC32 checksum of a string, as an 8-character hex string.
///
/// Short and stable, which is all the cache file naming needs.
fn crc32(input: &str) -> String {
    const POLYNOMIAL: u32 = 0xedb88320;

    let mut table = [0u32; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let mut crc = i as u32;
        for _ in 0..8 {
            crc = match crc & 1 {
                1 => (crc >> 1) ^ POLYNOMIAL,
                _ => crc >> 1,
            };
        }
        *entry = crc;
    }

    let mut crc = !0u32;
    for byte in input.as_bytes() {
        let index = ((crc ^ (*byte as u32)) & 0xff) as usize;
        crc = (crc >> 8) ^ table[index];
    }

    format!("{:08x}", !crc)
}
