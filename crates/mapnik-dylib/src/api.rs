// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Symbol table of the C shim.

use std::ffi::{c_char, c_double, c_int, c_uint};
use std::fmt;

use libloading::Library;

/// Opaque `mapnik_map_t`.
#[repr(C)]
pub(crate) struct RawMap {
    _private: [u8; 0],
}

/// Opaque `mapnik_image_t`.
#[repr(C)]
pub(crate) struct RawImage {
    _private: [u8; 0],
}

/// `mapnik_blob_t`: encoded bytes owned by the shim.
#[repr(C)]
pub(crate) struct RawBlob {
    pub(crate) ptr: *const u8,
    pub(crate) len: usize,
}

macro_rules! shim_api {
    ($($field:ident: fn($($arg:ty),*) $(-> $ret:ty)?;)*) => {
        /// Function pointers resolved from the shim. The library handle is
        /// kept alongside so the pointers stay valid.
        pub(crate) struct Api {
            $(pub(crate) $field: unsafe extern "C" fn($($arg),*) $(-> $ret)?,)*
            _lib: Library,
        }

        impl Api {
            /// Resolve every symbol from `lib`.
            ///
            /// # Safety
            /// `lib` must export each symbol with the signature declared here.
            pub(crate) unsafe fn load(lib: Library) -> Result<Self, (&'static str, libloading::Error)> {
                $(
                    let $field = unsafe {
                        lib.get::<unsafe extern "C" fn($($arg),*) $(-> $ret)?>(
                            concat!("mapnik_", stringify!($field), "\0").as_bytes(),
                        )
                    }
                    .map(|sym| *sym)
                    .map_err(|e| (concat!("mapnik_", stringify!($field)), e))?;
                )*
                Ok(Self { $($field,)* _lib: lib })
            }
        }
    };
}

shim_api! {
    version_string: fn() -> *const c_char;
    register_datasources: fn(*const c_char) -> c_int;
    register_fonts: fn(*const c_char) -> c_int;

    map: fn(c_uint, c_uint) -> *mut RawMap;
    map_free: fn(*mut RawMap);
    map_last_error: fn(*mut RawMap) -> *const c_char;
    map_load: fn(*mut RawMap, *const c_char) -> c_int;
    map_load_string: fn(*mut RawMap, *const c_char, *const c_char) -> c_int;
    map_zoom_all: fn(*mut RawMap) -> c_int;
    map_zoom_to_box: fn(*mut RawMap, c_double, c_double, c_double, c_double);
    map_get_srs: fn(*mut RawMap) -> *const c_char;
    map_set_srs: fn(*mut RawMap, *const c_char) -> c_int;
    map_background: fn(*mut RawMap, *mut u8);
    map_set_background: fn(*mut RawMap, u8, u8, u8, u8);
    map_width: fn(*mut RawMap) -> c_uint;
    map_height: fn(*mut RawMap) -> c_uint;
    map_resize: fn(*mut RawMap, c_uint, c_uint);
    map_scale_denominator: fn(*mut RawMap) -> c_double;
    map_set_maximum_extent: fn(*mut RawMap, c_double, c_double, c_double, c_double);
    map_reset_maximum_extent: fn(*mut RawMap);
    map_layer_count: fn(*mut RawMap) -> usize;
    map_layer_name: fn(*mut RawMap, usize) -> *const c_char;
    map_layer_is_active: fn(*mut RawMap, usize) -> c_int;
    map_layer_set_active: fn(*mut RawMap, usize, c_int);
    map_render_to_file: fn(*mut RawMap, *const c_char, c_uint, c_uint, c_double, c_double, *const c_char) -> c_int;
    map_render_to_image: fn(*mut RawMap, c_uint, c_uint, c_double, c_double) -> *mut RawImage;

    image_from_raw: fn(*const u8, c_uint, c_uint) -> *mut RawImage;
    image_free: fn(*mut RawImage);
    image_last_error: fn(*mut RawImage) -> *const c_char;
    image_to_raw: fn(*mut RawImage, *mut usize) -> *const u8;
    image_to_blob: fn(*mut RawImage, *const c_char) -> *mut RawBlob;
    image_blob_free: fn(*mut RawBlob);
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api").finish_non_exhaustive()
    }
}
