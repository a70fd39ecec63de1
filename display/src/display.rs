use sdl2::pixels::PixelFormatEnum;
use thiserror::Error;

use oxid8_core::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use oxid8_core::FrameBuffer;

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("display init failed: {0}")]
    Init(String),
    #[error("render failed: {0}")]
    Render(String),
}

/// Window-backed renderer for the 64x32 monochrome framebuffer.
///
/// Each machine pixel becomes a `scale`-sided square of physical pixels.
/// The renderer pulls: the frontend hands it a frame whenever the shared
/// screen reports one, at whatever cadence it polls.
pub struct Display {
    canvas: sdl2::render::WindowCanvas,
}

impl Display {
    /// Open a centered window sized to the framebuffer times `scale`.
    pub fn new(sdl: &sdl2::Sdl, scale: u32) -> Result<Self, DisplayError> {
        let video = sdl.video().map_err(DisplayError::Init)?;
        let window = video
            .window(
                "oxid8",
                DISPLAY_WIDTH as u32 * scale,
                DISPLAY_HEIGHT as u32 * scale,
            )
            .position_centered()
            .opengl()
            .build()
            .map_err(|e| DisplayError::Init(e.to_string()))?;
        let canvas = window
            .into_canvas()
            .build()
            .map_err(|e| DisplayError::Init(e.to_string()))?;
        Ok(Display { canvas })
    }

    /// Upload a frame as an RGB24 texture and present it, letting SDL
    /// stretch it to the window.
    pub fn render(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError> {
        let texture_creator = self.canvas.texture_creator();
        let mut texture = texture_creator
            .create_texture_streaming(
                PixelFormatEnum::RGB24,
                DISPLAY_WIDTH as u32,
                DISPLAY_HEIGHT as u32,
            )
            .map_err(|e| DisplayError::Render(e.to_string()))?;

        texture
            .with_lock(None, |buffer: &mut [u8], _pitch: usize| {
                buffer.copy_from_slice(&rgb_bytes(frame));
            })
            .map_err(DisplayError::Render)?;

        self.canvas
            .copy(&texture, None, None)
            .map_err(DisplayError::Render)?;
        self.canvas.present();
        Ok(())
    }
}

/// Flatten the boolean framebuffer into concatenated RGB rows, white for
/// on and black for off.
fn rgb_bytes(frame: &FrameBuffer) -> Vec<u8> {
    frame
        .iter()
        .flatten()
        .flat_map(|&on| {
            let level = if on { 0xFF } else { 0x00 };
            [level; 3]
        })
        .collect()
}
