use std::{cell::RefCell, rc::Rc};

use meshview::{
    abs::*,
    config::ViewerConfig,
    logging,
    mouse::MouseEvent,
    render::{BufferObject, MeshData, MeshSource},
    view::{RenderMode, Surface, SurfaceHandler, View},
};
use sdl2::{event::Event, event::WindowEvent, keyboard::Keycode, mouse::MouseButton};

macro_rules! shader_program {
    ($name:ident, $gl:expr) => {{
        let vert = ShaderStage::new(
            &$gl,
            glow::VERTEX_SHADER,
            include_str!(concat!("render/shaders/", stringify!($name), "/vert.glsl")),
        )?;
        let frag = ShaderStage::new(
            &$gl,
            glow::FRAGMENT_SHADER,
            include_str!(concat!("render/shaders/", stringify!($name), "/frag.glsl")),
        )?;
        GlProgram::new(&$gl, &[&vert, &frag])?
    }};
}

const CAPTURE_PATH: &str = "meshview.png";

fn main() {
    if let Err(err) = run() {
        log::error!("{err}");
        eprintln!("meshview: {err}");
        std::process::exit(1);
    }
}

fn run() -> meshview::Result<()> {
    let config = ViewerConfig::load()?;
    logging::init(logging::parse_level(&config.log_level))?;

    let mesh = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("loading mesh from {path}");
            MeshData::from_path(path)?
        }
        None => MeshData::cube(),
    };

    let mut app = App::new(&config)?;
    let program = shader_program!(mesh, app.gl);

    let size = Rc::new(RefCell::new(WindowSize::new(config.width, config.height)));
    let mut view = View::new(GlSurface::new(&app.gl), size.clone(), &config);
    view.set_shader(program);
    view.add_object(BufferObject::new(
        "mesh",
        Box::new(MeshSource::new(mesh)),
        config.object,
    ))?;

    view.initialize_gl()?;
    let (width, height) = app.window.drawable_size();
    view.resize_gl(width, height);

    'running: loop {
        if view.surface_mut().take_redraw() {
            view.paint_gl();
            app.window.gl_swap_window();
        }

        let first = app.event_pump.wait_event();
        let pending: Vec<Event> = std::iter::once(first)
            .chain(app.event_pump.poll_iter())
            .collect();

        for event in pending {
            match event {
                Event::Quit { .. } => break 'running,
                Event::Window { win_event, .. } => {
                    view.surface_mut().handle_window_event(&win_event);
                    if let WindowEvent::SizeChanged(..) = win_event {
                        let (width, height) = app.window.drawable_size();
                        view.resize_gl(width, height);
                        view.surface_mut().request_redraw();
                    }
                }
                Event::MouseMotion {
                    x, y, mousestate, ..
                } => {
                    let event = MouseEvent::new(x as f32, y as f32, held_buttons(&mousestate));
                    view.mouse_move(&event);
                }
                Event::MouseButtonDown {
                    x,
                    y,
                    mouse_btn,
                    clicks,
                    ..
                } => {
                    let event = MouseEvent::new(x as f32, y as f32, pressed_button(mouse_btn));
                    view.mouse_press(&event);
                    if mouse_btn == MouseButton::Left && clicks == 2 && x >= 0 && y >= 0 {
                        match view.pick(x as u32, y as u32) {
                            Ok(Some(name)) => log::info!("selected '{name}'"),
                            Ok(None) => log::info!("selection cleared"),
                            Err(err) => log::error!("picking failed: {err}"),
                        }
                    }
                }
                Event::MouseButtonUp {
                    x, y, mouse_btn, ..
                } => {
                    let event = MouseEvent::new(x as f32, y as f32, pressed_button(mouse_btn));
                    view.mouse_release(&event);
                }
                Event::MouseWheel { precise_y, .. } => {
                    view.wheel(wheel_delta(precise_y));
                }
                Event::KeyDown {
                    keycode: Some(Keycode::M),
                    repeat: false,
                    ..
                } => {
                    let mode = match view.mode() {
                        RenderMode::Shaded => RenderMode::Ghosted,
                        RenderMode::Ghosted => RenderMode::Shaded,
                    };
                    view.set_mode(mode);
                }
                Event::KeyDown {
                    keycode: Some(Keycode::F12),
                    repeat: false,
                    ..
                } => {
                    if let Err(err) = view.capture(CAPTURE_PATH) {
                        log::error!("capture failed: {err}");
                    }
                    view.surface_mut().request_redraw();
                }
                _ => {}
            }
        }
    }

    log::debug!("closing at {}x{}", size.borrow().width, size.borrow().height);
    view.teardown();
    Ok(())
}
