// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Library loading and the process-level [`Engine`] implementation.

use std::ffi::{c_char, CStr, CString, OsString};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::Arc;

use libloading::Library;
use mapnik_port::{Engine, EngineError, PixelBuffer, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use thiserror::Error;
use tracing::{debug, info};

use crate::api::{Api, RawBlob, RawImage};
use crate::map::DylibMap;

/// Environment variable naming the shim library for [`DylibEngine::from_env`].
pub const LIBRARY_ENV: &str = "MAPNIK_C_API_LIB";

/// Failure to bring up the native engine.
#[derive(Debug, Error)]
pub enum DylibError {
    /// The shared library could not be opened.
    #[error("failed to open {}: {source}", path.display())]
    Open {
        /// Library path as given.
        path: PathBuf,
        /// Loader diagnostic.
        #[source]
        source: libloading::Error,
    },
    /// The library does not export a required symbol.
    #[error("missing symbol {name}: {source}")]
    Symbol {
        /// Symbol name.
        name: &'static str,
        /// Loader diagnostic.
        #[source]
        source: libloading::Error,
    },
    /// [`LIBRARY_ENV`] is not set.
    #[error("MAPNIK_C_API_LIB is not set")]
    NotConfigured,
}

/// Engine backed by the Mapnik C shim.
///
/// Cloning is cheap; clones share the loaded library, which is unloaded when
/// the last engine and the last map created from it are dropped.
#[derive(Debug, Clone)]
pub struct DylibEngine {
    api: Arc<Api>,
}

impl DylibEngine {
    /// Load the shim from `path` and resolve all of its symbols.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DylibError> {
        let path = path.as_ref();
        // SAFETY: loading runs the library's initializers; the shim has none
        // beyond Mapnik's own static setup.
        let lib = unsafe { Library::new(path) }.map_err(|source| DylibError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        // SAFETY: symbol signatures follow the shim header documented at the crate root.
        let api = unsafe { Api::load(lib) }
            .map_err(|(name, source)| DylibError::Symbol { name, source })?;
        let engine = Self { api: Arc::new(api) };
        info!(path = %path.display(), version = %engine.version(), "mapnik engine loaded");
        Ok(engine)
    }

    /// Load the shim named by [`LIBRARY_ENV`].
    pub fn from_env() -> Result<Self, DylibError> {
        let path: OsString = std::env::var_os(LIBRARY_ENV).ok_or(DylibError::NotConfigured)?;
        Self::open(PathBuf::from(path))
    }
}

impl Engine for DylibEngine {
    type Map = DylibMap;

    fn create_default_map(&self) -> Result<DylibMap, EngineError> {
        let raw = unsafe { (self.api.map)(DEFAULT_WIDTH, DEFAULT_HEIGHT) };
        let raw = NonNull::new(raw)
            .ok_or_else(|| EngineError::Native("failed to allocate map".to_owned()))?;
        debug!("native map allocated");
        Ok(DylibMap::new(raw, Arc::clone(&self.api)))
    }

    fn encode_pixels(&self, image: &PixelBuffer, format: &str) -> Result<Vec<u8>, EngineError> {
        let format = cstring(format)?;
        let premultiplied = image.to_premultiplied();
        let raw = unsafe {
            (self.api.image_from_raw)(
                premultiplied.data().as_ptr(),
                premultiplied.width(),
                premultiplied.height(),
            )
        };
        let image = Image::new(raw, &self.api)
            .ok_or_else(|| EngineError::Native("failed to allocate image".to_owned()))?;
        image.encode(&format)
    }

    fn version(&self) -> String {
        unsafe { owned_str((self.api.version_string)()) }
    }

    fn register_datasources(&self, dir: &Path) -> Result<(), EngineError> {
        let dir_c = path_cstring(dir)?;
        if unsafe { (self.api.register_datasources)(dir_c.as_ptr()) } == 0 {
            debug!(dir = %dir.display(), "datasources registered");
            Ok(())
        } else {
            Err(EngineError::Native(format!(
                "failed to register datasources in {}",
                dir.display()
            )))
        }
    }

    fn register_fonts(&self, dir: &Path) -> Result<(), EngineError> {
        let dir_c = path_cstring(dir)?;
        if unsafe { (self.api.register_fonts)(dir_c.as_ptr()) } == 0 {
            debug!(dir = %dir.display(), "fonts registered");
            Ok(())
        } else {
            Err(EngineError::Native(format!(
                "failed to register fonts in {}",
                dir.display()
            )))
        }
    }
}

/// Owned native image, freed on drop.
pub(crate) struct Image<'a> {
    raw: NonNull<RawImage>,
    api: &'a Api,
}

impl<'a> Image<'a> {
    pub(crate) fn new(raw: *mut RawImage, api: &'a Api) -> Option<Self> {
        NonNull::new(raw).map(|raw| Self { raw, api })
    }

    fn last_error(&self) -> EngineError {
        let msg = unsafe { owned_str((self.api.image_last_error)(self.raw.as_ptr())) };
        EngineError::Native(if msg.is_empty() {
            "unknown image error".to_owned()
        } else {
            msg
        })
    }

    /// Encode with the engine's codecs.
    pub(crate) fn encode(&self, format: &CStr) -> Result<Vec<u8>, EngineError> {
        let blob = unsafe { (self.api.image_to_blob)(self.raw.as_ptr(), format.as_ptr()) };
        let Some(blob) = NonNull::new(blob) else {
            return Err(self.last_error());
        };
        // SAFETY: a non-null blob stays readable until freed below.
        let bytes = unsafe { blob_bytes(blob.as_ref()) };
        unsafe { (self.api.image_blob_free)(blob.as_ptr()) };
        bytes.ok_or_else(|| self.last_error())
    }

    /// Copy out the premultiplied RGBA8 pixels.
    pub(crate) fn to_raw(&self) -> Result<Vec<u8>, EngineError> {
        let mut len = 0usize;
        let ptr = unsafe { (self.api.image_to_raw)(self.raw.as_ptr(), &mut len) };
        if ptr.is_null() {
            return Err(self.last_error());
        }
        // SAFETY: the buffer is owned by the image and outlives this borrow.
        Ok(unsafe { std::slice::from_raw_parts(ptr, len) }.to_vec())
    }
}

/// Copy the encoded bytes of `blob`. An empty blob is a failed encode.
///
/// # Safety
/// A non-null `blob.ptr` must point at `blob.len` readable bytes.
pub(crate) unsafe fn blob_bytes(blob: &RawBlob) -> Option<Vec<u8>> {
    if blob.ptr.is_null() || blob.len == 0 {
        return None;
    }
    Some(unsafe { std::slice::from_raw_parts(blob.ptr, blob.len) }.to_vec())
}

impl Drop for Image<'_> {
    fn drop(&mut self) {
        unsafe { (self.api.image_free)(self.raw.as_ptr()) };
    }
}

pub(crate) fn cstring(s: &str) -> Result<CString, EngineError> {
    CString::new(s).map_err(|_| EngineError::InvalidArgument(format!("interior NUL in {s:?}")))
}

pub(crate) fn path_cstring(path: &Path) -> Result<CString, EngineError> {
    let s = path.to_str().ok_or_else(|| {
        EngineError::InvalidArgument(format!("{} is not valid UTF-8", path.display()))
    })?;
    cstring(s)
}

/// Copy a shim-owned C string. Null reads as empty.
///
/// # Safety
/// `ptr` must be null or point at a NUL-terminated string that stays valid
/// for the duration of the call.
pub(crate) unsafe fn owned_str(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_blobs_are_failures() {
        let null = RawBlob {
            ptr: std::ptr::null(),
            len: 16,
        };
        assert_eq!(unsafe { blob_bytes(&null) }, None);

        let bytes = [0x89u8, b'P', b'N', b'G'];
        let zero = RawBlob {
            ptr: bytes.as_ptr(),
            len: 0,
        };
        assert_eq!(unsafe { blob_bytes(&zero) }, None);

        let full = RawBlob {
            ptr: bytes.as_ptr(),
            len: bytes.len(),
        };
        assert_eq!(unsafe { blob_bytes(&full) }, Some(bytes.to_vec()));
    }

    #[test]
    fn strings_with_interior_nul_are_invalid_arguments() {
        assert!(matches!(cstring("png\0"), Err(EngineError::InvalidArgument(_))));
        assert_eq!(cstring("png256").unwrap().as_bytes(), b"png256");
        assert_eq!(unsafe { owned_str(std::ptr::null()) }, "");
    }
}
