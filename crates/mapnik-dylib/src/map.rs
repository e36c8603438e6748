// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! [`NativeMap`] over a `mapnik_map_t` handle.

use std::path::Path;
use std::ptr::NonNull;
use std::sync::Arc;

use mapnik_port::{
    AlphaMode, BoundingBox, EngineError, NativeMap, PixelBuffer, RenderParams, Rgba,
};
use tracing::debug;

use crate::api::{Api, RawMap};
use crate::engine::{cstring, owned_str, path_cstring, Image};

/// One native map. Freed exactly once, when dropped.
#[derive(Debug)]
pub struct DylibMap {
    raw: NonNull<RawMap>,
    api: Arc<Api>,
}

// SAFETY: a Mapnik map has no thread affinity. The handle is uniquely owned
// and every mutating call takes `&mut self`, so it is never used from two
// threads at once.
unsafe impl Send for DylibMap {}

impl DylibMap {
    pub(crate) fn new(raw: NonNull<RawMap>, api: Arc<Api>) -> Self {
        Self { raw, api }
    }

    fn ptr(&self) -> *mut RawMap {
        self.raw.as_ptr()
    }

    fn last_error(&self) -> EngineError {
        let msg = unsafe { owned_str((self.api.map_last_error)(self.ptr())) };
        EngineError::Native(if msg.is_empty() {
            "unknown map error".to_owned()
        } else {
            msg
        })
    }

    fn check(&self, status: i32) -> Result<(), EngineError> {
        if status == 0 {
            Ok(())
        } else {
            Err(self.last_error())
        }
    }

    fn render_image(&self, params: &RenderParams) -> Result<Image<'_>, EngineError> {
        let raw = unsafe {
            (self.api.map_render_to_image)(
                self.ptr(),
                params.width,
                params.height,
                params.scale_factor,
                params.scale_denominator.unwrap_or(0.0),
            )
        };
        Image::new(raw, &self.api).ok_or_else(|| self.last_error())
    }
}

impl Drop for DylibMap {
    fn drop(&mut self) {
        unsafe { (self.api.map_free)(self.ptr()) };
        debug!("native map released");
    }
}

impl NativeMap for DylibMap {
    fn load(&mut self, path: &Path) -> Result<(), EngineError> {
        let path_c = path_cstring(path)?;
        self.check(unsafe { (self.api.map_load)(self.ptr(), path_c.as_ptr()) })
    }

    fn load_string(&mut self, description: &str, base_path: &Path) -> Result<(), EngineError> {
        let description = cstring(description)?;
        let base = path_cstring(base_path)?;
        self.check(unsafe {
            (self.api.map_load_string)(self.ptr(), description.as_ptr(), base.as_ptr())
        })
    }

    fn zoom_to_full_extent(&mut self) -> Result<(), EngineError> {
        self.check(unsafe { (self.api.map_zoom_all)(self.ptr()) })
    }

    fn zoom_to_box(&mut self, bbox: BoundingBox) {
        unsafe {
            (self.api.map_zoom_to_box)(self.ptr(), bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y);
        }
    }

    fn srs(&self) -> String {
        unsafe { owned_str((self.api.map_get_srs)(self.ptr())) }
    }

    fn set_srs(&mut self, srs: &str) -> Result<(), EngineError> {
        let srs = cstring(srs)?;
        self.check(unsafe { (self.api.map_set_srs)(self.ptr(), srs.as_ptr()) })
    }

    fn background(&self) -> Rgba {
        let mut out = [0u8; 4];
        unsafe { (self.api.map_background)(self.ptr(), out.as_mut_ptr()) };
        Rgba::from(out)
    }

    fn set_background(&mut self, color: Rgba) {
        unsafe { (self.api.map_set_background)(self.ptr(), color.r, color.g, color.b, color.a) };
    }

    fn size(&self) -> (u32, u32) {
        unsafe {
            (
                (self.api.map_width)(self.ptr()),
                (self.api.map_height)(self.ptr()),
            )
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        unsafe { (self.api.map_resize)(self.ptr(), width, height) };
    }

    fn scale_denominator(&self) -> f64 {
        unsafe { (self.api.map_scale_denominator)(self.ptr()) }
    }

    fn set_maximum_extent(&mut self, bbox: BoundingBox) {
        unsafe {
            (self.api.map_set_maximum_extent)(
                self.ptr(),
                bbox.min_x,
                bbox.min_y,
                bbox.max_x,
                bbox.max_y,
            );
        }
    }

    fn reset_maximum_extent(&mut self) {
        unsafe { (self.api.map_reset_maximum_extent)(self.ptr()) };
    }

    fn layer_names(&self) -> Vec<String> {
        let count = unsafe { (self.api.map_layer_count)(self.ptr()) };
        (0..count)
            .map(|i| unsafe { owned_str((self.api.map_layer_name)(self.ptr(), i)) })
            .collect()
    }

    fn layer_visible(&self, index: usize) -> bool {
        let count = unsafe { (self.api.map_layer_count)(self.ptr()) };
        index < count && unsafe { (self.api.map_layer_is_active)(self.ptr(), index) } != 0
    }

    fn set_layer_visible(&mut self, index: usize, visible: bool) {
        let count = unsafe { (self.api.map_layer_count)(self.ptr()) };
        if index < count {
            unsafe { (self.api.map_layer_set_active)(self.ptr(), index, i32::from(visible)) };
        }
    }

    fn render(&mut self, params: &RenderParams, format: &str) -> Result<Vec<u8>, EngineError> {
        let format = cstring(format)?;
        let image = self.render_image(params)?;
        image.encode(&format)
    }

    fn render_to_file(
        &mut self,
        params: &RenderParams,
        format: &str,
        path: &Path,
    ) -> Result<(), EngineError> {
        let format = cstring(format)?;
        let path_c = path_cstring(path)?;
        self.check(unsafe {
            (self.api.map_render_to_file)(
                self.ptr(),
                path_c.as_ptr(),
                params.width,
                params.height,
                params.scale_factor,
                params.scale_denominator.unwrap_or(0.0),
                format.as_ptr(),
            )
        })
    }

    fn render_pixels(&mut self, params: &RenderParams) -> Result<PixelBuffer, EngineError> {
        let data = self.render_image(params)?.to_raw()?;
        PixelBuffer::new(params.width, params.height, AlphaMode::Premultiplied, data)
    }
}
