// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Materializing compiled artifacts as loaded libraries.
//!
//! [`UnitLoader::load`] moves an artifact out of its bundle, and
//! [`Artifact::open`] consumes the artifact: its bytes are written to a
//! private temporary file, mapped with `dlopen`, and the file is removed
//! when the returned [`Library`] is dropped.

use super::{Artifact, ArtifactBundle, LoadError};
use std::io::Write;

/// Single-use loader over one bundle.
#[derive(Debug)]
pub struct UnitLoader {
    bundle: ArtifactBundle,
}

impl UnitLoader {
    pub fn new(bundle: ArtifactBundle) -> Self {
        Self { bundle }
    }

    /// Move artifact `name` out of the bundle.
    pub fn load(&mut self, name: &str) -> Result<Artifact, LoadError> {
        let artifact = self.bundle.take(name)?;
        log::debug!(
            "[load] took '{}' ({} bytes), {} left",
            name,
            artifact.bytes().len(),
            self.bundle.len()
        );
        Ok(artifact)
    }

    /// Load and open the unit's shared library.
    pub fn load_library(&mut self) -> Result<Library, LoadError> {
        let name = self.bundle.library_name();
        self.load(&name)?.open()
    }

    pub fn remaining(&self) -> usize {
        self.bundle.len()
    }
}

impl Artifact {
    /// Materialize this artifact as a loaded shared library.
    pub fn open(self) -> Result<Library, LoadError> {
        let mut file = tempfile::Builder::new()
            .prefix("livedoc-")
            .suffix(std::env::consts::DLL_SUFFIX)
            .tempfile()
            .map_err(LoadError::Materialize)?;
        file.write_all(self.bytes()).map_err(LoadError::Materialize)?;
        file.flush().map_err(LoadError::Materialize)?;
        let path = file.into_temp_path();
        let handle = sys::open(&path)?;
        log::debug!("[load] opened '{}'", self.name());
        Ok(Library {
            handle,
            name: self.name().to_string(),
            _path: path,
        })
    }
}

/// A loaded shared library. Unloaded on drop.
#[derive(Debug)]
pub struct Library {
    handle: sys::Handle,
    name: String,
    _path: tempfile::TempPath,
}

impl Library {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Address of the exported symbol `symbol`.
    ///
    /// # Safety
    ///
    /// `T` must match the type the library exports under that name, and the
    /// reference must not outlive `self`.
    pub unsafe fn symbol<T>(&self, symbol: &str) -> Result<&T, LoadError> {
        let ptr = sys::symbol(&self.handle, symbol)?;
        Ok(&*ptr.cast::<T>())
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        sys::close(&self.handle);
    }
}

#[cfg(unix)]
mod sys {
    use super::LoadError;
    use std::ffi::{c_void, CStr, CString};
    use std::os::unix::ffi::OsStrExt;
    use std::path::Path;
    use std::ptr::NonNull;

    #[derive(Debug)]
    pub struct Handle(NonNull<c_void>);

    // dlopen handles are process-global and usable from any thread.
    unsafe impl Send for Handle {}
    unsafe impl Sync for Handle {}

    fn last_error() -> String {
        // SAFETY: dlerror returns null or a NUL-terminated thread-local string.
        unsafe {
            let message = libc::dlerror();
            if message.is_null() {
                "unknown dynamic loader error".to_string()
            } else {
                CStr::from_ptr(message).to_string_lossy().into_owned()
            }
        }
    }

    pub fn open(path: &Path) -> Result<Handle, LoadError> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| LoadError::Open(format!("path contains NUL: {}", path.display())))?;
        // SAFETY: c_path is a valid NUL-terminated string.
        let raw = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
        NonNull::new(raw)
            .map(Handle)
            .ok_or_else(|| LoadError::Open(last_error()))
    }

    pub fn symbol(handle: &Handle, name: &str) -> Result<*const c_void, LoadError> {
        let c_name =
            CString::new(name).map_err(|_| LoadError::MissingSymbol(name.to_string()))?;
        // SAFETY: handle is live for the borrow and c_name is NUL-terminated.
        let ptr = unsafe { libc::dlsym(handle.0.as_ptr(), c_name.as_ptr()) };
        if ptr.is_null() {
            Err(LoadError::MissingSymbol(name.to_string()))
        } else {
            Ok(ptr.cast_const())
        }
    }

    pub fn close(handle: &Handle) {
        // SAFETY: called once, from Library::drop.
        unsafe {
            libc::dlclose(handle.0.as_ptr());
        }
    }
}

#[cfg(not(unix))]
mod sys {
    use super::LoadError;
    use std::ffi::c_void;
    use std::path::Path;

    #[derive(Debug)]
    pub struct Handle;

    pub fn open(_path: &Path) -> Result<Handle, LoadError> {
        Err(LoadError::Unsupported)
    }

    pub fn symbol(_handle: &Handle, name: &str) -> Result<*const c_void, LoadError> {
        Err(LoadError::MissingSymbol(name.to_string()))
    }

    pub fn close(_handle: &Handle) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> UnitLoader {
        let mut bundle = ArtifactBundle::new("demo");
        bundle.insert("demo.d", b"deps".to_vec());
        UnitLoader::new(bundle)
    }

    #[test]
    fn test_unregistered_name_not_found() {
        let mut loader = loader();
        assert!(matches!(loader.load("nope"), Err(LoadError::NotFound(_))));
    }

    #[test]
    fn test_second_load_fails() {
        let mut loader = loader();
        let artifact = loader.load("demo.d").expect("first load");
        assert_eq!(artifact.into_bytes(), b"deps");
        assert_eq!(loader.remaining(), 0);
        assert!(matches!(loader.load("demo.d"), Err(LoadError::AlreadyConsumed(_))));
    }

    #[test]
    fn test_missing_library_is_not_found() {
        let mut loader = loader();
        assert!(matches!(loader.load_library(), Err(LoadError::NotFound(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_garbage_bytes_fail_to_open() {
        let mut bundle = ArtifactBundle::new("demo");
        bundle.insert(bundle.library_name(), b"not a shared object".to_vec());
        let mut loader = UnitLoader::new(bundle);
        assert!(matches!(loader.load_library(), Err(LoadError::Open(_))));
    }
}
