//! Input loading: paths or URLs → in-memory payloads.
//!
//! Pages are held in memory rather than on disk: they are base64-encoded into
//! the request body anyway, and a paused job must carry them in its saved
//! state. Media types are sniffed from magic bytes first and the file
//! extension second, so a mis-named scan still goes out with the right type.

use crate::error::Doc2WordError;
use crate::pipeline::chunk::MediaPayload;
use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load every input as a media payload, preserving order.
///
/// Fails before any I/O if more than `max_files` inputs are given, and fails
/// on the first input that is missing, unreadable, or neither an image nor a
/// PDF.
pub async fn load_media(
    inputs: &[String],
    max_files: usize,
    download_timeout_secs: u64,
) -> Result<Vec<MediaPayload>, Doc2WordError> {
    if inputs.len() > max_files {
        return Err(Doc2WordError::TooManyPages {
            count: inputs.len(),
            max: max_files,
        });
    }

    let payloads = try_join_all(
        inputs
            .iter()
            .map(|input| load_one_media(input, download_timeout_secs)),
    )
    .await?;

    info!(
        "Loaded {} media file(s), {} bytes total",
        payloads.len(),
        payloads.iter().map(|p| p.bytes.len()).sum::<usize>()
    );
    Ok(payloads)
}

async fn load_one_media(input: &str, timeout_secs: u64) -> Result<MediaPayload, Doc2WordError> {
    let bytes = read_input(input, timeout_secs).await?;
    let name = display_name(input);
    let mime_type = sniff_mime(&bytes, &name);
    if !is_supported_media(&mime_type) {
        return Err(Doc2WordError::UnsupportedMediaType { name, mime_type });
    }
    debug!("{}: {} ({} bytes)", name, mime_type, bytes.len());
    Ok(MediaPayload::new(name, mime_type, bytes))
}

/// Load UTF-8 text from a path or URL.
pub async fn load_text(input: &str, download_timeout_secs: u64) -> Result<String, Doc2WordError> {
    let bytes = read_input(input, download_timeout_secs).await?;
    String::from_utf8(bytes).map_err(|_| Doc2WordError::NotUtf8 {
        path: PathBuf::from(input),
    })
}

async fn read_input(input: &str, timeout_secs: u64) -> Result<Vec<u8>, Doc2WordError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(Path::new(input)).await
    }
}

async fn read_local(path: &Path) -> Result<Vec<u8>, Doc2WordError> {
    tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => Doc2WordError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Doc2WordError::FileNotFound {
            path: path.to_path_buf(),
        },
    })
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<Vec<u8>, Doc2WordError> {
    info!("Downloading: {}", url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Doc2WordError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let to_error = |e: reqwest::Error| {
        if e.is_timeout() {
            Doc2WordError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Doc2WordError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let response = client.get(url).send().await.map_err(to_error)?;
    if !response.status().is_success() {
        return Err(Doc2WordError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }
    let bytes = response.bytes().await.map_err(to_error)?;
    Ok(bytes.to_vec())
}

/// File name for paths, last path segment (or the whole URL) for URLs.
fn display_name(input: &str) -> String {
    if is_url(input) {
        if let Ok(parsed) = reqwest::Url::parse(input) {
            if let Some(last) = parsed.path_segments().and_then(|mut s| s.next_back()) {
                if !last.is_empty() {
                    return last.to_string();
                }
            }
        }
        return input.to_string();
    }
    Path::new(input)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.to_string())
}

/// Infer a media type from magic bytes, then from the extension of `name`.
pub fn sniff_mime(bytes: &[u8], name: &str) -> String {
    let by_magic = match bytes {
        [b'%', b'P', b'D', b'F', ..] => Some("application/pdf"),
        [0x89, b'P', b'N', b'G', ..] => Some("image/png"),
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => Some("image/tiff"),
        [b'B', b'M', ..] => Some("image/bmp"),
        [_, _, _, _, b'f', b't', b'y', b'p', b'h', b'e', b'i', b'c', ..] => Some("image/heic"),
        _ => None,
    };
    if let Some(mime) = by_magic {
        return mime.to_string();
    }

    let ext = Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
    .to_string()
}

/// Images of any kind and PDF documents.
pub fn is_supported_media(mime_type: &str) -> bool {
    mime_type.starts_with("image/") || mime_type == "application/pdf"
}
