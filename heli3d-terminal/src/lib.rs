/// Terminal front end: key capture, frame loop and presentation
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use heli3d_core::{DemoConfig, FrameDriver, Key, KeyTracker, RenderError, REFERENCE_FPS};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub mod renderer;

pub use renderer::AsciiRenderer;

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: f32 = 0.5;

/// Rows reserved for the status line
const STATUS_ROWS: u16 = 1;

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    driver: FrameDriver,
    renderer: AsciiRenderer,
    keys: KeyTracker,
    /// The terminal reports key release events
    release_events: bool,
    target_frame_time: Duration,
    running: bool,
    last_tick: Instant,
    last_fps_sample: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(config: &DemoConfig, target_fps: u32) -> Result<Self, RenderError> {
        let (width, height) =
            terminal::size().map_err(|e| RenderError::Backend(format!("terminal size: {e}")))?;
        let mut renderer = AsciiRenderer::new(
            width as usize,
            height.saturating_sub(STATUS_ROWS) as usize,
        );
        let driver = FrameDriver::new(config, &mut renderer)?;
        let now = Instant::now();

        Ok(Self {
            driver,
            renderer,
            keys: KeyTracker::new(),
            release_events: false,
            target_frame_time: Duration::from_millis(1000 / u64::from(target_fps.max(1))),
            running: true,
            last_tick: now,
            last_fps_sample: now,
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        self.release_events = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if self.release_events {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        info!(release_events = self.release_events, "terminal session started");

        let result = self.main_loop();

        // Cleanup
        if self.release_events {
            execute!(stdout(), PopKeyboardEnhancementFlags)?;
        }
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        while self.running {
            let frame_start = Instant::now();

            // Drain pending input
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }
            if !self.running {
                break;
            }

            self.tick();
            self.present()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < self.target_frame_time {
                std::thread::sleep(self.target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_fps_sample).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_fps_sample).as_secs_f32();
                self.frame_count = 0;
                self.last_fps_sample = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key_event) => self.handle_key(key_event),
            Event::Resize(width, height) => {
                self.renderer
                    .resize(width as usize, height.saturating_sub(STATUS_ROWS) as usize);
            }
            Event::FocusLost => self.keys.reset(),
            _ => {}
        }
    }

    fn handle_key(&mut self, KeyEvent { code, kind, .. }: KeyEvent) {
        if matches!(code, KeyCode::Char('q') | KeyCode::Esc) && kind == KeyEventKind::Press {
            self.running = false;
            return;
        }
        let Some(key) = map_key(code) else {
            return;
        };
        match kind {
            KeyEventKind::Release => self.keys.key_up(key),
            KeyEventKind::Press | KeyEventKind::Repeat if self.release_events => {
                self.keys.key_down(key)
            }
            KeyEventKind::Press | KeyEventKind::Repeat => self.keys.key_tap(key),
        }
    }

    fn tick(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_tick).as_secs_f32() * REFERENCE_FPS;
        self.last_tick = now;

        let (width, height) = self.renderer.size();
        let aspect = width as f32 / height.max(1) as f32 * CELL_ASPECT;
        let input = self.keys.snapshot();

        if let Err(err) = self.driver.tick(&input, dt, aspect, &mut self.renderer) {
            warn!(%err, "frame dropped");
        }
        self.keys.clear_transient();
    }

    fn present(&mut self) -> io::Result<()> {
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.renderer.draw(&mut stdout)?;

        // Status line below the viewport
        let state = self.driver.state();
        let (_, height) = self.renderer.size();
        queue!(
            stdout,
            cursor::MoveTo(0, height as u16),
            terminal::Clear(terminal::ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "Heli3D | FPS: {:.1} | Fan: {:?} | Pos: ({:.1}, {:.1}, {:.1}) | Zoom: {:.1}% | 1-3=Fan A/D=Pan W/S=Fwd/Back Arrows=Move Q=Quit",
                self.fps,
                state.fan_speed,
                state.body.position.x,
                state.body.position.y,
                state.body.position.z,
                state.background_scale,
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

/// Terminal key code to demo key
pub fn map_key(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::Char('1') => Key::Digit1,
        KeyCode::Char('2') => Key::Digit2,
        KeyCode::Char('3') => Key::Digit3,
        KeyCode::Char('a' | 'A') => Key::KeyA,
        KeyCode::Char('d' | 'D') => Key::KeyD,
        KeyCode::Char('w' | 'W') => Key::KeyW,
        KeyCode::Char('s' | 'S') => Key::KeyS,
        KeyCode::Up => Key::ArrowUp,
        KeyCode::Down => Key::ArrowDown,
        KeyCode::Left => Key::ArrowLeft,
        KeyCode::Right => Key::ArrowRight,
        _ => return None,
    };
    Some(key)
}
