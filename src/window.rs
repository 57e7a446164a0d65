//! SDL2 presentation of a [`FrameBuffer`].
//!
//! Only built with the `window` feature. SDL is used for the window, input
//! and the final blit; all rendering happens on the CPU.

use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{Canvas, Texture, TextureCreator};
use sdl2::video::WindowContext;

use crate::render::FrameBuffer;

pub const FPS: u64 = 60;
pub const FRAME_TARGET_TIME: f64 = 1000.0 / FPS as f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    None,
    Quit,
    /// Space bar.
    TogglePause,
}

pub struct FrameLimiter {
    previous_frame_time: u64,
}

impl FrameLimiter {
    pub fn new(window: &Window) -> Self {
        Self {
            previous_frame_time: window.timer().ticks64(),
        }
    }

    /// Sleeps out the rest of the frame and returns the milliseconds since
    /// the previous call.
    pub fn wait_and_get_delta(&mut self, window: &Window) -> u64 {
        let target = FRAME_TARGET_TIME as u64;
        let mut current_time = window.timer().ticks64();
        let mut delta_time = current_time - self.previous_frame_time;

        if delta_time < target {
            std::thread::sleep(std::time::Duration::from_millis(target - delta_time));
            current_time = window.timer().ticks64();
            delta_time = current_time - self.previous_frame_time;
        }

        self.previous_frame_time = current_time;
        delta_time
    }
}

pub struct Window {
    // Declared before `texture_creator` so it is dropped first.
    texture: Texture<'static>,
    texture_creator: Box<TextureCreator<WindowContext>>,
    canvas: Canvas<sdl2::video::Window>,
    event_pump: sdl2::EventPump,
    timer_subsystem: sdl2::TimerSubsystem,
    width: u32,
    height: u32,
}

impl Window {
    /// Opens a window whose streaming texture matches a `width` x `height`
    /// frame buffer.
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self, String> {
        let sdl_context = sdl2::init()?;
        let video_subsystem = sdl_context.video()?;
        let timer_subsystem = sdl_context.timer()?;

        let window = video_subsystem
            .window(title, width, height)
            .position_centered()
            .resizable()
            .build()
            .map_err(|e| e.to_string())?;

        let canvas = window.into_canvas().build().map_err(|e| e.to_string())?;
        let texture_creator = Box::new(canvas.texture_creator());
        let event_pump = sdl_context.event_pump()?;
        let texture = Self::create_texture(&texture_creator, width, height)?;

        log::info!("Opened {width}x{height} window {title:?}");
        Ok(Self {
            texture,
            texture_creator,
            canvas,
            event_pump,
            timer_subsystem,
            width,
            height,
        })
    }

    fn create_texture(
        creator: &TextureCreator<WindowContext>,
        width: u32,
        height: u32,
    ) -> Result<Texture<'static>, String> {
        // SAFETY: the creator is boxed and owned by the same `Window` as the
        // texture, and the texture field is dropped before it.
        let creator: &'static TextureCreator<WindowContext> =
            unsafe { &*(creator as *const TextureCreator<WindowContext>) };
        creator
            .create_texture_streaming(PixelFormatEnum::ARGB8888, width, height)
            .map_err(|e| e.to_string())
    }

    pub fn poll_events(&mut self) -> WindowEvent {
        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => return WindowEvent::Quit,
                Event::KeyDown {
                    keycode: Some(Keycode::Space),
                    repeat: false,
                    ..
                } => return WindowEvent::TogglePause,
                _ => {}
            }
        }
        WindowEvent::None
    }

    /// Uploads the colour buffer and stretches it over the window.
    pub fn present(&mut self, frame: &FrameBuffer) -> Result<(), String> {
        if frame.width() != self.width || frame.height() != self.height {
            self.texture =
                Self::create_texture(&self.texture_creator, frame.width(), frame.height())?;
            self.width = frame.width();
            self.height = frame.height();
        }

        self.texture
            .update(None, frame.as_bytes(), (self.width * 4) as usize)
            .map_err(|e| e.to_string())?;

        self.canvas.clear();
        self.canvas.copy(&self.texture, None, None)?;
        self.canvas.present();
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn timer(&self) -> &sdl2::TimerSubsystem {
        &self.timer_subsystem
    }
}
