//! Named shared-memory acquisition.
//!
//! AIDA64 owns and writes the mapping; this side only ever opens it
//! read-only, copies the NUL-terminated byte buffer out, and releases
//! everything again. The OS calls sit behind [`SharedMemoryApi`] so the
//! acquisition path can be exercised against an in-memory fake.

use thiserror::Error;

/// Why a shared-memory read failed. All variants are recoverable: the
/// caller logs and retries on its next polling tick.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// The named object does not exist - the producer is not running.
    /// Expected and frequent.
    #[error("shared memory object {name:?} not found (is the producer running?)")]
    NotFound { name: String },

    /// The object exists but mapping a view of it failed.
    #[error("failed to map view of shared memory (status {status})")]
    MapFailed { status: u32 },

    /// The platform call reported an unexpected status code.
    #[error("unexpected platform status {status} opening shared memory {name:?}")]
    Platform { name: String, status: u32 },

    /// No NUL terminator within the mapped region. Without the cap this
    /// would be an out-of-bounds walk.
    #[error("shared memory buffer not NUL-terminated within {len} mapped bytes")]
    UnterminatedBuffer { len: usize },

    /// This build has no shared-memory provider for the current platform.
    #[error("shared memory acquisition is not supported on this platform")]
    Unsupported,
}

/// Minimal surface of the OS named shared-memory API.
///
/// The contract is open -> map -> use -> unmap -> close; callers must
/// release the view and the handle on every path, including failures.
pub trait SharedMemoryApi {
    /// Handle to an opened mapping object.
    type Handle;
    /// A mapped read-only view of the whole object.
    type View: AsRef<[u8]>;

    /// Open an existing named mapping for read-only access. Never creates.
    fn open(&self, name: &str) -> Result<Self::Handle, AcquisitionError>;

    /// Map the entire object into the address space.
    fn map_view(&self, handle: &Self::Handle) -> Result<Self::View, AcquisitionError>;

    /// Release a mapped view.
    fn unmap_view(&self, view: Self::View);

    /// Close the mapping handle.
    fn close(&self, handle: Self::Handle);
}

/// Open the named mapping, copy out the bytes before the first NUL, and
/// release the view and handle regardless of outcome.
pub fn acquire_raw_buffer<A: SharedMemoryApi>(
    api: &A,
    name: &str,
) -> Result<Vec<u8>, AcquisitionError> {
    let handle = api.open(name)?;

    let result = match api.map_view(&handle) {
        Ok(view) => {
            let scanned = scan_terminated(view.as_ref());
            api.unmap_view(view);
            scanned
        }
        Err(err) => Err(err),
    };

    api.close(handle);
    result
}

/// Bytes preceding the first NUL, with the scan capped at the region size.
fn scan_terminated(region: &[u8]) -> Result<Vec<u8>, AcquisitionError> {
    match region.iter().position(|&b| b == 0) {
        Some(end) => Ok(region[..end].to_vec()),
        None => Err(AcquisitionError::UnterminatedBuffer { len: region.len() }),
    }
}

#[cfg(windows)]
mod platform {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use std::{mem, slice};

    use winapi::shared::minwindef::FALSE;
    use winapi::shared::winerror::ERROR_FILE_NOT_FOUND;
    use winapi::um::errhandlingapi::GetLastError;
    use winapi::um::handleapi::CloseHandle;
    use winapi::um::memoryapi::{MapViewOfFile, UnmapViewOfFile, VirtualQuery, FILE_MAP_READ};
    use winapi::um::winbase::OpenFileMappingW;
    use winapi::um::winnt::{HANDLE, MEMORY_BASIC_INFORMATION};

    use super::{AcquisitionError, SharedMemoryApi};

    /// Handle to an opened file-mapping object.
    #[derive(Debug)]
    pub struct MappingHandle(HANDLE);

    /// A mapped read-only view, sized by what the OS actually committed.
    #[derive(Debug)]
    pub struct MappedView {
        ptr: *const u8,
        len: usize,
    }

    impl AsRef<[u8]> for MappedView {
        fn as_ref(&self) -> &[u8] {
            // The view stays mapped for the lifetime of this value; len
            // comes from VirtualQuery on the mapped base address.
            unsafe { slice::from_raw_parts(self.ptr, self.len) }
        }
    }

    /// The real Windows provider.
    #[derive(Debug, Default)]
    pub struct SystemApi;

    impl SharedMemoryApi for SystemApi {
        type Handle = MappingHandle;
        type View = MappedView;

        fn open(&self, name: &str) -> Result<MappingHandle, AcquisitionError> {
            let wide: Vec<u16> = OsStr::new(name).encode_wide().chain(Some(0)).collect();
            let handle = unsafe { OpenFileMappingW(FILE_MAP_READ, FALSE, wide.as_ptr()) };
            if handle.is_null() {
                // Judge the outcome by the status code, not by any
                // human-readable (and locale-dependent) message.
                let status = unsafe { GetLastError() };
                return Err(if status == ERROR_FILE_NOT_FOUND {
                    AcquisitionError::NotFound {
                        name: name.to_string(),
                    }
                } else {
                    AcquisitionError::Platform {
                        name: name.to_string(),
                        status,
                    }
                });
            }
            Ok(MappingHandle(handle))
        }

        fn map_view(&self, handle: &MappingHandle) -> Result<MappedView, AcquisitionError> {
            let ptr = unsafe { MapViewOfFile(handle.0, FILE_MAP_READ, 0, 0, 0) };
            if ptr.is_null() {
                return Err(AcquisitionError::MapFailed {
                    status: unsafe { GetLastError() },
                });
            }

            let mut info: MEMORY_BASIC_INFORMATION = unsafe { mem::zeroed() };
            let written =
                unsafe { VirtualQuery(ptr, &mut info, mem::size_of::<MEMORY_BASIC_INFORMATION>()) };
            if written == 0 {
                let status = unsafe { GetLastError() };
                unsafe { UnmapViewOfFile(ptr) };
                return Err(AcquisitionError::MapFailed { status });
            }

            Ok(MappedView {
                ptr: ptr as *const u8,
                len: info.RegionSize,
            })
        }

        fn unmap_view(&self, view: MappedView) {
            unsafe { UnmapViewOfFile(view.ptr as *const winapi::ctypes::c_void) };
        }

        fn close(&self, handle: MappingHandle) {
            unsafe { CloseHandle(handle.0) };
        }
    }
}

#[cfg(not(windows))]
mod platform {
    use super::{AcquisitionError, SharedMemoryApi};

    /// Stub provider for non-Windows builds: the AIDA64 mapping only
    /// exists on Windows, so every call reports `Unsupported`.
    #[derive(Debug, Default)]
    pub struct SystemApi;

    impl SharedMemoryApi for SystemApi {
        type Handle = ();
        type View = Vec<u8>;

        fn open(&self, _name: &str) -> Result<Self::Handle, AcquisitionError> {
            Err(AcquisitionError::Unsupported)
        }

        fn map_view(&self, _handle: &Self::Handle) -> Result<Self::View, AcquisitionError> {
            Err(AcquisitionError::Unsupported)
        }

        fn unmap_view(&self, _view: Self::View) {}

        fn close(&self, _handle: Self::Handle) {}
    }
}

pub use platform::SystemApi;


#[cfg(test)]
mod tests {
    use super::fake::FakeApi;
    use super::*;

    #[test]
    fn test_acquire_returns_bytes_before_the_terminator() {
        let api = FakeApi::with_region("region", b"<xml/>\0junk after the terminator");

        let raw = acquire_raw_buffer(&api, "region").unwrap();
        assert_eq!(raw, b"<xml/>");
    }

    #[test]
    fn test_acquire_with_leading_terminator_is_empty() {
        let api = FakeApi::with_region("region", b"\0<xml/>");

        let raw = acquire_raw_buffer(&api, "region").unwrap();
        assert!(raw.is_empty());
    }

    #[test]
    fn test_acquire_missing_object_reports_not_found() {
        let api = FakeApi::default();

        let err = acquire_raw_buffer(&api, "absent").unwrap_err();
        assert!(matches!(err, AcquisitionError::NotFound { ref name } if name == "absent"));
        // Nothing was mapped, so nothing to release
        assert_eq!(api.views_unmapped.get(), 0);
        assert_eq!(api.handles_closed.get(), 0);
    }

    #[test]
    fn test_acquire_unterminated_region_is_bounded() {
        let api = FakeApi::with_region("region", b"no terminator here");

        let err = acquire_raw_buffer(&api, "region").unwrap_err();
        assert!(matches!(
            err,
            AcquisitionError::UnterminatedBuffer { len: 18 }
        ));
        // The view and handle are still released on the failure path
        assert_eq!(api.views_unmapped.get(), 1);
        assert_eq!(api.handles_closed.get(), 1);
    }

    #[test]
    fn test_acquire_releases_view_and_handle_on_success() {
        let api = FakeApi::with_region("region", b"data\0");

        acquire_raw_buffer(&api, "region").unwrap();
        assert_eq!(api.views_unmapped.get(), 1);
        assert_eq!(api.handles_closed.get(), 1);
    }

    #[test]
    fn test_acquire_closes_handle_when_mapping_fails() {
        let mut api = FakeApi::with_region("region", b"data\0");
        api.fail_map = true;

        let err = acquire_raw_buffer(&api, "region").unwrap_err();
        assert!(matches!(err, AcquisitionError::MapFailed { status: 5 }));
        assert_eq!(api.views_unmapped.get(), 0);
        assert_eq!(api.handles_closed.get(), 1);
    }

    #[cfg(not(windows))]
    #[test]
    fn test_system_api_is_unsupported_off_windows() {
        let err = acquire_raw_buffer(&SystemApi, "anything").unwrap_err();
        assert!(matches!(err, AcquisitionError::Unsupported));
    }
}
