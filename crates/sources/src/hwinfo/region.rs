//! Byte regions a snapshot can be read from
//!
//! A region is opened once per poll and released when dropped, so no
//! mapping outlives the poll that created it.

use hwmon_link_core::SnapshotError;
use memmap2::Mmap;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A readable, mapped snapshot region
pub trait Region {
    fn bytes(&self) -> &[u8];
}

/// Opens a fresh region for each poll
pub trait RegionProvider: Send {
    fn open(&self) -> Result<Box<dyn Region>, SnapshotError>;

    /// Human-readable source description for log messages
    fn describe(&self) -> String;
}

impl Region for Vec<u8> {
    fn bytes(&self) -> &[u8] {
        self
    }
}

impl Region for Mmap {
    fn bytes(&self) -> &[u8] {
        self
    }
}

/// Serves an in-memory snapshot, or reports the source as missing
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    bytes: Option<Vec<u8>>,
}

impl MemoryProvider {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes: Some(bytes) }
    }

    /// A provider whose region never exists
    pub fn missing() -> Self {
        Self { bytes: None }
    }
}

impl RegionProvider for MemoryProvider {
    fn open(&self) -> Result<Box<dyn Region>, SnapshotError> {
        match &self.bytes {
            Some(bytes) => Ok(Box::new(bytes.clone())),
            None => Err(SnapshotError::NotFound {
                name: self.describe(),
            }),
        }
    }

    fn describe(&self) -> String {
        "in-memory snapshot".to_string()
    }
}

/// Memory-maps a dumped snapshot file
#[derive(Debug, Clone)]
pub struct FileProvider {
    path: PathBuf,
}

impl FileProvider {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl RegionProvider for FileProvider {
    fn open(&self) -> Result<Box<dyn Region>, SnapshotError> {
        let file = File::open(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SnapshotError::NotFound {
                name: self.describe(),
            },
            _ => SnapshotError::Io {
                what: self.describe(),
                source: e,
            },
        })?;

        let len = file
            .metadata()
            .map_err(|e| SnapshotError::Io {
                what: self.describe(),
                source: e,
            })?
            .len();
        if len == 0 {
            // Nothing to map; the header check reports it as truncated
            return Ok(Box::new(Vec::new()));
        }

        // SAFETY: the map is read-only and dropped at the end of the poll. A
        // producer truncating the file underneath us is outside the contract.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| SnapshotError::Io {
            what: self.describe(),
            source: e,
        })?;
        Ok(Box::new(mmap))
    }

    fn describe(&self) -> String {
        format!("snapshot file {}", self.path.display())
    }
}

/// Opens the producer's named shared memory region (Windows only)
#[derive(Debug, Clone)]
pub struct NamedRegionProvider {
    name: String,
}

impl NamedRegionProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl RegionProvider for NamedRegionProvider {
    #[cfg(windows)]
    fn open(&self) -> Result<Box<dyn Region>, SnapshotError> {
        Ok(Box::new(named::NamedView::open(&self.name)?))
    }

    #[cfg(not(windows))]
    fn open(&self) -> Result<Box<dyn Region>, SnapshotError> {
        Err(SnapshotError::Unsupported {
            name: self.name.clone(),
        })
    }

    fn describe(&self) -> String {
        format!("shared memory '{}'", self.name)
    }
}

#[cfg(windows)]
mod named {
    use super::Region;
    use hwmon_link_core::SnapshotError;
    use windows_sys::Win32::Foundation::{CloseHandle, ERROR_FILE_NOT_FOUND, HANDLE};
    use windows_sys::Win32::System::Memory::{
        MapViewOfFile, OpenFileMappingW, UnmapViewOfFile, VirtualQuery, FILE_MAP_READ,
        MEMORY_BASIC_INFORMATION, MEMORY_MAPPED_VIEW_ADDRESS,
    };

    /// A read-only view of a named file mapping
    pub(super) struct NamedView {
        handle: HANDLE,
        view: MEMORY_MAPPED_VIEW_ADDRESS,
        len: usize,
    }

    impl NamedView {
        pub(super) fn open(name: &str) -> Result<Self, SnapshotError> {
            let wide: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();

            // SAFETY: `wide` is NUL-terminated and outlives the call.
            let handle = unsafe { OpenFileMappingW(FILE_MAP_READ, 0, wide.as_ptr()) };
            if handle.is_null() {
                let err = std::io::Error::last_os_error();
                if err.raw_os_error() == Some(ERROR_FILE_NOT_FOUND as i32) {
                    return Err(SnapshotError::NotFound {
                        name: name.to_string(),
                    });
                }
                return Err(SnapshotError::Io {
                    what: format!("shared memory '{}'", name),
                    source: err,
                });
            }

            // SAFETY: `handle` is a valid mapping handle; size 0 maps the whole object.
            let view = unsafe { MapViewOfFile(handle, FILE_MAP_READ, 0, 0, 0) };
            if view.Value.is_null() {
                let err = std::io::Error::last_os_error();
                // SAFETY: closing the handle we just opened.
                unsafe { CloseHandle(handle) };
                return Err(SnapshotError::Io {
                    what: format!("view of shared memory '{}'", name),
                    source: err,
                });
            }

            // SAFETY: zeroed MEMORY_BASIC_INFORMATION is a valid out-parameter.
            let mut info: MEMORY_BASIC_INFORMATION = unsafe { std::mem::zeroed() };
            let written = unsafe {
                VirtualQuery(
                    view.Value,
                    &mut info,
                    std::mem::size_of::<MEMORY_BASIC_INFORMATION>(),
                )
            };
            let len = if written == 0 { 0 } else { info.RegionSize };

            Ok(Self { handle, view, len })
        }
    }

    impl Region for NamedView {
        fn bytes(&self) -> &[u8] {
            // SAFETY: the view stays mapped until drop and spans `len` readable bytes.
            unsafe { std::slice::from_raw_parts(self.view.Value as *const u8, self.len) }
        }
    }

    impl Drop for NamedView {
        fn drop(&mut self) {
            // SAFETY: both were obtained in `open` and are released exactly once.
            unsafe {
                UnmapViewOfFile(self.view);
                CloseHandle(self.handle);
            }
        }
    }
}
