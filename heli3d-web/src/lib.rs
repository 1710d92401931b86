/// Heli3D Web - WASM entry point rendering through WebGL2
///
/// The host page owns the render loop: it forwards `keydown`/`keyup`
/// `event.code` values and calls `frame(timestamp)` from
/// `requestAnimationFrame`.
use heli3d_core::{DemoConfig, FrameDriver, KeyTracker, REFERENCE_FPS};
use std::fmt::Display;
use std::sync::Once;
use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, WebGl2RenderingContext};

pub mod backend;
pub mod shaders;

pub use backend::WebGlBackend;

#[wasm_bindgen]
pub struct HeliDemo {
    canvas: HtmlCanvasElement,
    backend: WebGlBackend,
    driver: FrameDriver,
    keys: KeyTracker,
    last_timestamp: Option<f64>,
    applied_background: Option<f32>,
}

#[wasm_bindgen]
impl HeliDemo {
    /// Attach to the canvas with the given element id
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str) -> Result<HeliDemo, JsValue> {
        install_diagnostics();
        info!(canvas_id, "starting Heli3D");

        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document available"))?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("no element with id '{canvas_id}'")))?
            .dyn_into::<HtmlCanvasElement>()?;
        let gl = canvas
            .get_context("webgl2")?
            .ok_or_else(|| JsValue::from_str("WebGL2 is not supported"))?
            .dyn_into::<WebGl2RenderingContext>()?;

        let mut backend = WebGlBackend::new(gl).map_err(to_js)?;
        let driver = FrameDriver::new(&DemoConfig::default(), &mut backend).map_err(to_js)?;

        Ok(HeliDemo {
            canvas,
            backend,
            driver,
            keys: KeyTracker::new(),
            last_timestamp: None,
            applied_background: None,
        })
    }

    /// Returns false for keys the demo ignores
    pub fn key_down(&mut self, code: &str) -> bool {
        self.keys.key_down_code(code)
    }

    pub fn key_up(&mut self, code: &str) -> bool {
        self.keys.key_up_code(code)
    }

    /// Release every key, e.g. on window blur
    pub fn release_all(&mut self) {
        self.keys.reset();
    }

    /// Run one frame. `timestamp` is the `requestAnimationFrame` time in
    /// milliseconds.
    pub fn frame(&mut self, timestamp: f64) -> Result<(), JsValue> {
        let dt = frame_step(self.last_timestamp, timestamp);
        self.last_timestamp = Some(timestamp);

        let (width, height) = self.fit_canvas();
        self.backend.set_viewport(width as i32, height as i32);
        let aspect = width as f32 / height.max(1) as f32;

        let input = self.keys.snapshot();
        match self.driver.tick(&input, dt, aspect, &mut self.backend) {
            Ok(stats) => self.apply_background(stats.background_scale),
            Err(err) => {
                warn!(%err, "frame dropped");
                Ok(())
            }
        }
    }

    pub fn fan_speed(&self) -> f32 {
        self.driver.state().fan_speed.radians_per_frame()
    }

    pub fn background_scale(&self) -> f32 {
        self.driver.state().background_scale
    }
}

impl HeliDemo {
    /// Match the drawing buffer to the displayed size
    fn fit_canvas(&self) -> (u32, u32) {
        let width = self.canvas.client_width().max(1) as u32;
        let height = self.canvas.client_height().max(1) as u32;
        if self.canvas.width() != width || self.canvas.height() != height {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
        }
        (width, height)
    }

    fn apply_background(&mut self, scale: f32) -> Result<(), JsValue> {
        if self.applied_background == Some(scale) {
            return Ok(());
        }
        self.canvas
            .style()
            .set_property("background-size", &background_size_css(scale))?;
        self.applied_background = Some(scale);
        Ok(())
    }
}

static DIAGNOSTICS: Once = Once::new();

/// Route panics and `tracing` events to the browser console. Returns false
/// when an earlier call already did.
fn install_diagnostics() -> bool {
    let mut installed = false;
    DIAGNOSTICS.call_once(|| {
        #[cfg(target_arch = "wasm32")]
        {
            console_error_panic_hook::set_once();
            tracing_wasm::set_as_global_default();
        }
        installed = true;
    });
    installed
}

/// Elapsed reference frames between two animation timestamps
pub fn frame_step(previous_ms: Option<f64>, now_ms: f64) -> f32 {
    match previous_ms {
        Some(previous) if now_ms >= previous => {
            ((now_ms - previous) / 1000.0) as f32 * REFERENCE_FPS
        }
        _ => 1.0,
    }
}

/// CSS `background-size` value for the cosmetic zoom
pub fn background_size_css(scale: f32) -> String {
    format!("100% {scale:.1}%")
}

fn to_js(err: impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}
