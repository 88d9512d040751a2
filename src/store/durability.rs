//! Flush primitives for segment files.
//!
//! A full sync pushes data and metadata of a segment to stable storage. A
//! ranged sync only asks the kernel to write back the dirty pages of a byte
//! range and is treated as a hint.

use std::{fs::File, io};

/// Durability barrier for one segment file.
///
/// macOS and iOS use `F_FULLFSYNC` since plain `fsync` there stops at the
/// drive cache; elsewhere this is `fsync`.
pub fn full_sync(file: &File) -> io::Result<()> {
    #[cfg(any(target_os = "macos", target_os = "ios"))]
    {
        use std::os::unix::io::AsRawFd;
        // SAFETY: the descriptor comes from a live `File`.
        let result = unsafe { libc::fcntl(file.as_raw_fd(), libc::F_FULLFSYNC) };
        if result == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    #[cfg(not(any(target_os = "macos", target_os = "ios")))]
    {
        file.sync_all()
    }
}

/// Writes back `len` bytes starting at `offset` inside `file`.
pub fn sync_range(file: &File, offset: u64, len: u64) -> io::Result<()> {
    #[cfg(target_os = "linux")]
    {
        use std::os::unix::io::AsRawFd;
        let flags = libc::SYNC_FILE_RANGE_WAIT_BEFORE
            | libc::SYNC_FILE_RANGE_WRITE
            | libc::SYNC_FILE_RANGE_WAIT_AFTER;
        // SAFETY: the descriptor comes from a live `File`; the range is only
        // a hint to the kernel.
        let result = unsafe {
            libc::sync_file_range(
                file.as_raw_fd(),
                offset as libc::off64_t,
                len as libc::off64_t,
                flags,
            )
        };
        if result == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    {
        let _ = (offset, len);
        file.sync_data()
    }
}
