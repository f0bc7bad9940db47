//! SharedMemoryRegion - POSIX shared memory wrapper.
//!
//! Owns an `shm_open` + `mmap` mapping. The creating side unlinks the name
//! on drop; attaching sides only unmap.

use std::ffi::CString;
use std::io;
use std::ptr::NonNull;

use crate::error::SharedMemoryError;

/// Represents a mapped shared memory region.
///
/// This struct owns the mapped memory and will unmap it on drop.
/// The memory can be shared between processes using the same name.
pub struct SharedMemoryRegion {
    /// Name of the shared memory object (without the leading slash).
    name: String,
    /// Pointer to the mapped memory.
    ptr: NonNull<u8>,
    /// Size of the mapped region in bytes.
    size: usize,
    /// File descriptor for the shared memory object.
    fd: i32,
    /// Whether this instance created the SHM (and should unlink on drop).
    is_owner: bool,
}

// SAFETY: SharedMemoryRegion owns its mapping and descriptor; moving it to
// another thread does not invalidate either.
unsafe impl Send for SharedMemoryRegion {}

// SAFETY: The region only hands out raw pointers. Access to the mapped bytes
// is serialized by the channel lock.
unsafe impl Sync for SharedMemoryRegion {}

impl SharedMemoryRegion {
    /// Maximum size for a shared memory region (1 GB).
    pub const MAX_SIZE: usize = 1024 * 1024 * 1024;

    fn c_name(name: &str) -> Result<CString, SharedMemoryError> {
        if name.is_empty() {
            return Err(SharedMemoryError::InvalidRequest {
                name: name.to_string(),
                reason: "Name cannot be empty".to_string(),
            });
        }
        CString::new(format!("/{}", name)).map_err(|e| SharedMemoryError::InvalidRequest {
            name: name.to_string(),
            reason: format!("Invalid name: {}", e),
        })
    }

    fn check_size(name: &str, size: usize) -> Result<(), SharedMemoryError> {
        if size == 0 || size > Self::MAX_SIZE {
            return Err(SharedMemoryError::InvalidRequest {
                name: name.to_string(),
                reason: format!("Size {} must be between 1 and {}", size, Self::MAX_SIZE),
            });
        }
        Ok(())
    }

    /// Create a new zero-filled shared memory region.
    ///
    /// Fails if an object with the same name already exists; callers that
    /// know the previous owner is gone use [`SharedMemoryRegion::unlink`] first.
    pub fn create(name: &str, size: usize) -> Result<Self, SharedMemoryError> {
        Self::check_size(name, size)?;
        let c_name = Self::c_name(name)?;

        // SAFETY: c_name is a valid CString, flags are valid POSIX flags
        let fd = unsafe {
            libc::shm_open(
                c_name.as_ptr(),
                libc::O_CREAT | libc::O_RDWR | libc::O_EXCL,
                0o600,
            )
        };

        if fd < 0 {
            return Err(SharedMemoryError::CreateFailed {
                name: name.to_string(),
                source: io::Error::last_os_error(),
            });
        }

        // SAFETY: fd is a valid file descriptor
        let result = unsafe { libc::ftruncate(fd, size as libc::off_t) };
        if result < 0 {
            let source = io::Error::last_os_error();
            unsafe { libc::close(fd) };
            unsafe { libc::shm_unlink(c_name.as_ptr()) };
            return Err(SharedMemoryError::CreateFailed {
                name: name.to_string(),
                source,
            });
        }

        let ptr = match Self::map(name, fd, size) {
            Ok(ptr) => ptr,
            Err(e) => {
                unsafe { libc::close(fd) };
                unsafe { libc::shm_unlink(c_name.as_ptr()) };
                return Err(e);
            }
        };

        // ftruncate already zero-fills, this only makes the contract explicit.
        // SAFETY: ptr is valid for `size` bytes
        unsafe {
            std::ptr::write_bytes(ptr.as_ptr(), 0, size);
        }

        tracing::debug!(name = %name, size = size, "Created shared memory region");

        Ok(Self {
            name: name.to_string(),
            ptr,
            size,
            fd,
            is_owner: true,
        })
    }

    /// Open an existing shared memory region of at least `size` bytes.
    pub fn open(name: &str, size: usize) -> Result<Self, SharedMemoryError> {
        Self::check_size(name, size)?;
        let c_name = Self::c_name(name)?;

        // SAFETY: c_name is a valid CString
        let fd = unsafe { libc::shm_open(c_name.as_ptr(), libc::O_RDWR, 0) };

        if fd < 0 {
            return Err(SharedMemoryError::OpenFailed {
                name: name.to_string(),
                source: io::Error::last_os_error(),
            });
        }

        // Mapping past the end of the object would fault on first access.
        // SAFETY: stat is plain old data, fd is valid
        let mut stat: libc::stat = unsafe { std::mem::zeroed() };
        if unsafe { libc::fstat(fd, &mut stat) } < 0 {
            let source = io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(SharedMemoryError::OpenFailed {
                name: name.to_string(),
                source,
            });
        }
        let actual = stat.st_size as usize;
        if actual < size {
            unsafe { libc::close(fd) };
            return Err(SharedMemoryError::SizeMismatch {
                name: name.to_string(),
                expected: size,
                actual,
            });
        }

        let ptr = match Self::map(name, fd, size) {
            Ok(ptr) => ptr,
            Err(e) => {
                unsafe { libc::close(fd) };
                return Err(e);
            }
        };

        tracing::debug!(name = %name, size = size, "Opened shared memory region");

        Ok(Self {
            name: name.to_string(),
            ptr,
            size,
            fd,
            is_owner: false,
        })
    }

    /// Remove a leftover object name. A missing object is not an error.
    pub fn unlink(name: &str) -> Result<bool, SharedMemoryError> {
        let c_name = Self::c_name(name)?;

        // SAFETY: c_name is a valid CString
        if unsafe { libc::shm_unlink(c_name.as_ptr()) } == 0 {
            tracing::debug!(name = %name, "Removed stale shared memory region");
            return Ok(true);
        }

        let errno = io::Error::last_os_error();
        if errno.raw_os_error() == Some(libc::ENOENT) {
            return Ok(false);
        }
        Err(SharedMemoryError::InvalidRequest {
            name: name.to_string(),
            reason: format!("shm_unlink failed: {}", errno),
        })
    }

    fn map(name: &str, fd: i32, size: usize) -> Result<NonNull<u8>, SharedMemoryError> {
        // SAFETY: fd is valid, size is validated, offset 0 is valid
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                0,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(SharedMemoryError::MapFailed {
                name: name.to_string(),
                source: io::Error::last_os_error(),
            });
        }

        NonNull::new(ptr as *mut u8).ok_or_else(|| SharedMemoryError::MapFailed {
            name: name.to_string(),
            source: io::Error::other("mmap returned null"),
        })
    }

    /// Get the name of this shared memory region.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the size of this shared memory region.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether this instance created the object.
    pub fn is_owner(&self) -> bool {
        self.is_owner
    }

    /// Get a raw pointer to the shared memory.
    ///
    /// Dereferencing it requires the channel lock.
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }
}

impl Drop for SharedMemoryRegion {
    fn drop(&mut self) {
        // SAFETY: ptr and size were set during creation
        let result = unsafe { libc::munmap(self.ptr.as_ptr() as *mut libc::c_void, self.size) };
        if result < 0 {
            tracing::error!(
                name = %self.name,
                error = %io::Error::last_os_error(),
                "Failed to unmap shared memory"
            );
        }

        // SAFETY: fd was opened during creation
        unsafe { libc::close(self.fd) };

        if self.is_owner {
            if let Ok(c_name) = Self::c_name(&self.name) {
                // SAFETY: c_name is a valid CString
                unsafe { libc::shm_unlink(c_name.as_ptr()) };
                tracing::debug!(name = %self.name, "Unlinked shared memory region");
            }
        }
    }
}
