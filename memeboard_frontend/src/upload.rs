//! File staging: what a chosen file must expose before it may be posted,
//! and how its bytes become the data URL the gateway stores.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::ValidationError;

/// Largest meme the board accepts, in bytes.
pub const MAX_MEME_BYTES: u64 = 5 * 1024 * 1024;

pub const ACCEPTED_IMAGE_TYPES: &[&str] = &[
    "image/bmp",
    "image/gif",
    "image/jpeg",
    "image/png",
    "image/tiff",
];

/// A file the user picked for upload.
pub trait MemeFile: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;
    /// MIME type, if one could be determined.
    fn mime_type(&self) -> Option<&str>;
    fn size(&self) -> u64;
    fn read_bytes(&self) -> io::Result<Vec<u8>>;
}

/// A file on local disk. Type is sniffed from its leading bytes and falls
/// back to the extension.
#[derive(Debug, Clone)]
pub struct DiskFile {
    path: PathBuf,
    name: String,
    mime: Option<String>,
    size: u64,
}

impl DiskFile {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = fs::metadata(&path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a file", path.display()),
            ));
        }
        let mime = infer::get_from_path(&path)?
            .map(|kind| kind.mime_type().to_string())
            .or_else(|| mime_from_extension(&path).map(str::to_string));
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        Ok(Self {
            path,
            name,
            mime,
            size: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MemeFile for DiskFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> Option<&str> {
        self.mime.as_deref()
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn read_bytes(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }
}

/// A file already held in memory, e.g. pasted from a clipboard.
#[derive(Clone)]
pub struct InMemoryFile {
    pub name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for InMemoryFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryFile")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl MemeFile for InMemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> Option<&str> {
        self.mime.as_deref()
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn read_bytes(&self) -> io::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "bmp" => Some("image/bmp"),
        "gif" => Some("image/gif"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "tif" | "tiff" => Some("image/tiff"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}

/// Checks type first, then size.
pub fn validate_meme_file(file: &dyn MemeFile) -> Result<(), ValidationError> {
    match file.mime_type() {
        Some(mime) if ACCEPTED_IMAGE_TYPES.contains(&mime) => {}
        other => return Err(ValidationError::InvalidFileType(other.map(str::to_string))),
    }
    if file.size() > MAX_MEME_BYTES {
        return Err(ValidationError::FileTooLarge {
            size: file.size(),
            limit: MAX_MEME_BYTES,
        });
    }
    Ok(())
}

/// `data:<mime>;base64,<payload>`
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Reads the file and wraps its bytes in a data URL.
pub fn make_data_url(file: &dyn MemeFile) -> io::Result<String> {
    let bytes = file.read_bytes()?;
    let mime = file.mime_type().unwrap_or("application/octet-stream");
    Ok(encode_data_url(mime, &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn memory(mime: &str, size: usize) -> InMemoryFile {
        InMemoryFile {
            name: "meme".into(),
            mime: Some(mime.into()),
            bytes: vec![0; size],
        }
    }

    #[test]
    fn jpeg_at_exact_cap_is_accepted() {
        let file = memory("image/jpeg", MAX_MEME_BYTES as usize);
        assert_eq!(validate_meme_file(&file), Ok(()));
    }

    #[test]
    fn one_byte_over_cap_is_too_large() {
        let file = memory("image/jpeg", MAX_MEME_BYTES as usize + 1);
        assert_eq!(
            validate_meme_file(&file),
            Err(ValidationError::FileTooLarge {
                size: MAX_MEME_BYTES + 1,
                limit: MAX_MEME_BYTES
            })
        );
    }

    #[test]
    fn text_and_untyped_files_are_rejected() {
        let text = memory("text/plain", 10);
        assert_eq!(
            validate_meme_file(&text),
            Err(ValidationError::InvalidFileType(Some("text/plain".into())))
        );

        let untyped = InMemoryFile {
            name: "blob".into(),
            mime: None,
            bytes: vec![1, 2, 3],
        };
        assert_eq!(
            validate_meme_file(&untyped),
            Err(ValidationError::InvalidFileType(None))
        );
    }

    #[test]
    fn partial_type_names_do_not_match() {
        let file = memory("image/jp", 10);
        assert!(matches!(
            validate_meme_file(&file),
            Err(ValidationError::InvalidFileType(_))
        ));
    }

    #[test]
    fn data_url_keeps_header() {
        let file = InMemoryFile {
            name: "dot.gif".into(),
            mime: Some("image/gif".into()),
            bytes: b"GIF89a".to_vec(),
        };
        assert_eq!(make_data_url(&file).unwrap(), "data:image/gif;base64,R0lGODlh");
    }

    #[test]
    fn disk_file_sniffs_png_signature() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_extension");
        let mut handle = fs::File::create(&path).unwrap();
        handle
            .write_all(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0])
            .unwrap();
        drop(handle);

        let file = DiskFile::open(&path).unwrap();
        assert_eq!(file.mime_type(), Some("image/png"));
        assert_eq!(file.size(), 12);
        assert_eq!(file.name(), "no_extension");
    }

    #[test]
    fn disk_file_falls_back_to_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "hello").unwrap();

        let file = DiskFile::open(&path).unwrap();
        assert_eq!(file.mime_type(), Some("text/plain"));
        assert!(validate_meme_file(&file).is_err());
    }
}
