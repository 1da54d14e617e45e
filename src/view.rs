//! The view: a rendering surface, its camera and the objects drawn on it.
//!
//! [`View`] does not own a window. The host windowing layer owns the window,
//! hands the view a [`Surface`] and calls back into it through
//! [`SurfaceHandler`] on lifecycle and input events.

use std::{cell::RefCell, path::Path, rc::Rc, str::FromStr};

use fxhash::FxHashMap;
use glam::{Vec3, Vec4};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    camera::Camera,
    config::ViewerConfig,
    error::{Result, ViewerError},
    mouse::{Mouse, MouseEvent, wheel_steps},
    render::{BufferAllocator, BufferObject, Shader},
};

/// Opacity of objects in ghosted mode.
const GHOSTED_OPACITY: f32 = 0.7;

/// Largest instance id. `0xFFFFFF` is left to a white background.
const MAX_INSTANCE_ID: u32 = 0x00FF_FFFE;

/// View-wide render mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Shaded,
    Ghosted,
}

impl RenderMode {
    pub fn opacity(self) -> f32 {
        match self {
            RenderMode::Shaded => 1.0,
            RenderMode::Ghosted => GHOSTED_OPACITY,
        }
    }
}

impl FromStr for RenderMode {
    type Err = std::convert::Infallible;

    /// `"ghosted"` selects ghosted mode; anything else is shaded.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(if s == "ghosted" {
            RenderMode::Ghosted
        } else {
            RenderMode::Shaded
        })
    }
}

/// The rendering surface a view draws on, provided by the host.
pub trait Surface: BufferAllocator {
    /// Whether the window containing the surface has focus.
    fn is_active_window(&self) -> bool;
    /// Whether the cursor is over the surface.
    fn is_under_mouse(&self) -> bool;
    /// Schedules a repaint.
    fn request_redraw(&mut self);

    /// One-time GL state setup once the context is current.
    fn initialize(&mut self, clear_color: Vec4) -> Result<()>;
    /// Disables anything that mixes colors (blending, multisampling,
    /// smoothing) until [`Surface::end_instance_pass`].
    fn begin_instance_pass(&mut self);
    fn end_instance_pass(&mut self);
    fn set_viewport(&mut self, width: u32, height: u32);
    /// Clears color and depth.
    fn clear(&mut self);
    /// Reads RGBA bytes from the color buffer, rows bottom to top.
    fn read_pixels(&mut self, x: u32, y: u32, width: u32, height: u32) -> Result<Vec<u8>>;
}

/// The application owning the view. Told about every surface resize.
pub trait Application {
    fn set_size(&mut self, width: u32, height: u32);
}

/// Callbacks the host windowing layer drives.
pub trait SurfaceHandler {
    fn initialize_gl(&mut self) -> Result<()>;
    fn resize_gl(&mut self, width: u32, height: u32);
    fn paint_gl(&mut self);
    fn mouse_move(&mut self, event: &MouseEvent);
    fn mouse_press(&mut self, event: &MouseEvent);
    fn mouse_release(&mut self, event: &MouseEvent);
    /// `delta` is in eighths of a degree, 120 per notch.
    fn wheel(&mut self, delta: f32);
}

/// Lifecycle phase of the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    Uninitialized,
    Initialized,
    Resizing,
    Painting,
}

/// Encodes an instance id as an RGB color in `[0, 1]`.
pub fn instance_color(id: u32) -> Vec3 {
    let r = id & 0xFF;
    let g = (id >> 8) & 0xFF;
    let b = (id >> 16) & 0xFF;
    Vec3::new(r as f32, g as f32, b as f32) / 255.0
}

/// Decodes an instance id from a read-back RGBA pixel.
pub fn instance_id(pixel: [u8; 4]) -> u32 {
    pixel[0] as u32 | (pixel[1] as u32) << 8 | (pixel[2] as u32) << 16
}

pub struct View<S, Sh>
where
    S: Surface,
    Sh: Shader<Buffer = S::Buffer>,
{
    surface: S,
    shader: Option<Sh>,
    app: Rc<RefCell<dyn Application>>,
    pub color: Vec4,
    pub selection_color: Vec3,
    mode: RenderMode,
    opacity: f32,
    pub camera: Camera,
    pub mouse: Mouse,
    objects: IndexMap<String, BufferObject<S::Buffer>>,
    instances: FxHashMap<u32, String>,
    next_instance: u32,
    free_instances: Vec<u32>,
    state: SurfaceState,
    width: u32,
    height: u32,
}

impl<S, Sh> View<S, Sh>
where
    S: Surface,
    Sh: Shader<Buffer = S::Buffer>,
{
    pub fn new(surface: S, app: Rc<RefCell<dyn Application>>, config: &ViewerConfig) -> Self {
        Self {
            surface,
            shader: None,
            app,
            color: Vec4::from(config.background),
            selection_color: Vec3::from(config.selection_color),
            mode: config.mode,
            opacity: config.mode.opacity(),
            camera: Camera::new(config.camera),
            mouse: Mouse::default(),
            objects: IndexMap::new(),
            instances: FxHashMap::default(),
            next_instance: 1,
            free_instances: Vec::new(),
            state: SurfaceState::Uninitialized,
            width: config.width,
            height: config.height,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn shader(&self) -> Option<&Sh> {
        self.shader.as_ref()
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Installs the shader used for painting and pushes the current opacity to it.
    pub fn set_shader(&mut self, mut shader: Sh) {
        shader.bind();
        shader.uniform1f("opacity", self.opacity);
        shader.release();
        self.shader = Some(shader);
    }

    /// Switches the render mode and updates the derived opacity.
    ///
    /// With a shader installed, the new opacity is uploaded right away and a
    /// redraw is requested.
    pub fn set_mode(&mut self, mode: RenderMode) {
        self.mode = mode;
        self.opacity = mode.opacity();
        log::debug!("render mode {:?}, opacity {}", mode, self.opacity);

        if let Some(shader) = self.shader.as_mut() {
            shader.bind();
            shader.uniform1f("opacity", self.opacity);
            shader.release();
            self.surface.request_redraw();
        }
    }

    /// Adds an object under its name and assigns it an instance color.
    ///
    /// On an initialized surface the object's buffers are built immediately.
    pub fn add_object(&mut self, mut object: BufferObject<S::Buffer>) -> Result<()> {
        let name = object.name().to_string();
        if self.objects.contains_key(&name) {
            return Err(ViewerError::DuplicateObject(name));
        }

        let Some(id) = self.allocate_instance() else {
            return Err(ViewerError::InstancesExhausted(name));
        };

        if self.state != SurfaceState::Uninitialized {
            if let Err(err) = object.make_buffers(&mut self.surface) {
                object.release_buffers(&mut self.surface);
                self.free_instances.push(id);
                return Err(err);
            }
            self.surface.request_redraw();
        }

        object.set_instance_color(instance_color(id));
        self.instances.insert(id, name.clone());
        self.objects.insert(name, object);
        Ok(())
    }

    /// Reuses the id of a removed object before handing out a new one.
    fn allocate_instance(&mut self) -> Option<u32> {
        if let Some(id) = self.free_instances.pop() {
            return Some(id);
        }
        if self.next_instance > MAX_INSTANCE_ID {
            return None;
        }
        let id = self.next_instance;
        self.next_instance += 1;
        Some(id)
    }

    /// Removes an object and frees its buffers.
    pub fn remove_object(&mut self, name: &str) -> Option<BufferObject<S::Buffer>> {
        let mut object = self.objects.shift_remove(name)?;
        let id = self
            .instances
            .iter()
            .find_map(|(id, owner)| (owner == name).then_some(*id));
        if let Some(id) = id {
            self.instances.remove(&id);
            self.free_instances.push(id);
        }
        object.release_buffers(&mut self.surface);
        self.surface.request_redraw();
        Some(object)
    }

    pub fn object(&self, name: &str) -> Option<&BufferObject<S::Buffer>> {
        self.objects.get(name)
    }

    pub fn object_mut(&mut self, name: &str) -> Option<&mut BufferObject<S::Buffer>> {
        self.objects.get_mut(name)
    }

    /// Objects in insertion order.
    pub fn objects(&self) -> impl Iterator<Item = (&str, &BufferObject<S::Buffer>)> {
        self.objects.iter().map(|(name, object)| (name.as_str(), object))
    }

    fn accepts_input(&self) -> bool {
        self.surface.is_active_window() && self.surface.is_under_mouse()
    }

    fn upload_camera(&mut self) {
        let projection = self.camera.projection(self.width, self.height);
        let viewworld = self.camera.viewworld();
        if let Some(shader) = self.shader.as_mut() {
            shader.uniform4x4("projection", &projection);
            shader.uniform4x4("viewworld", &viewworld);
        }
    }

    /// Renders the instance pass and returns the name of the object under
    /// the pixel `(x, y)`, counted from the top-left corner.
    ///
    /// The picked object becomes the only selected one. Picking empty space
    /// clears the selection. Objects missing a buffer for a switched-on group
    /// are left out of the pass. The normal image is restored on the next paint.
    pub fn pick(&mut self, x: u32, y: u32) -> Result<Option<String>> {
        if x >= self.width || y >= self.height || self.shader.is_none() {
            return Ok(None);
        }

        let row = self.height - 1 - y;
        self.surface.begin_instance_pass();
        let pixel = self
            .draw_instances()
            .and_then(|()| self.surface.read_pixels(x, row, 1, 1));
        self.surface.end_instance_pass();
        let pixel = pixel?;

        let picked = match pixel.as_slice() {
            [r, g, b, a, ..] => self.instances.get(&instance_id([*r, *g, *b, *a])).cloned(),
            _ => None,
        };

        for (name, object) in self.objects.iter_mut() {
            object.is_selected = picked.as_deref() == Some(name.as_str());
        }
        log::debug!("picked {:?} at ({x}, {y})", picked);

        self.surface.request_redraw();
        Ok(picked)
    }

    fn draw_instances(&mut self) -> Result<()> {
        self.surface.clear();
        if let Some(shader) = self.shader.as_mut() {
            shader.bind();
        }
        self.upload_camera();
        let Some(shader) = self.shader.as_mut() else {
            return Ok(());
        };

        let mut drawn = Ok(());
        for object in self.objects.values() {
            if let Some(group) = object.missing_buffer() {
                log::debug!("'{}' has no {} buffer and is not pickable", object.name(), group);
                continue;
            }
            drawn = object.draw_instance(shader);
            if drawn.is_err() {
                break;
            }
        }
        shader.release();
        drawn
    }

    /// Paints the scene and writes the color buffer to a PNG at `path`.
    pub fn capture(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.paint_gl();
        let pixels = self.surface.read_pixels(0, 0, self.width, self.height)?;

        // GL rows run bottom to top
        let row = self.width as usize * 4;
        let flipped: Vec<u8> = pixels.chunks_exact(row.max(1)).rev().flatten().copied().collect();

        let image = image::RgbaImage::from_raw(self.width, self.height, flipped).ok_or_else(|| {
            ViewerError::Gl(format!(
                "read back {} bytes for a {}x{} surface",
                pixels.len(),
                self.width,
                self.height
            ))
        })?;
        image.save(path.as_ref())?;
        log::info!("captured view to {}", path.as_ref().display());
        Ok(())
    }

    /// Frees the buffers of every object. Call before the GL context goes away.
    pub fn teardown(&mut self) {
        for object in self.objects.values_mut() {
            object.release_buffers(&mut self.surface);
        }
        self.state = SurfaceState::Uninitialized;
    }
}

impl<S, Sh> SurfaceHandler for View<S, Sh>
where
    S: Surface,
    Sh: Shader<Buffer = S::Buffer>,
{
    fn initialize_gl(&mut self) -> Result<()> {
        self.surface.initialize(self.color)?;
        let built = self
            .objects
            .values_mut()
            .try_for_each(|object| object.make_buffers(&mut self.surface));
        if let Err(err) = built {
            for object in self.objects.values_mut() {
                object.release_buffers(&mut self.surface);
            }
            return Err(err);
        }
        self.state = SurfaceState::Initialized;
        self.surface.request_redraw();
        log::info!("initialized surface with {} objects", self.objects.len());
        Ok(())
    }

    fn resize_gl(&mut self, width: u32, height: u32) {
        if self.state == SurfaceState::Uninitialized {
            log::warn!("resize to {width}x{height} before initialization ignored");
            return;
        }
        self.state = SurfaceState::Resizing;
        self.surface.set_viewport(width, height);
        self.width = width;
        self.height = height;
        self.app.borrow_mut().set_size(width, height);
        log::debug!("resized to {width}x{height}");
    }

    fn paint_gl(&mut self) {
        if self.state == SurfaceState::Uninitialized {
            log::warn!("paint before initialization ignored");
            return;
        }
        self.state = SurfaceState::Painting;
        self.surface.clear();

        if self.shader.is_none() {
            return;
        }
        if let Some(shader) = self.shader.as_mut() {
            shader.bind();
        }
        self.upload_camera();
        if let Some(shader) = self.shader.as_mut() {
            shader.uniform1f("opacity", self.opacity);
            shader.uniform3f("selection_color", self.selection_color);
            for object in self.objects.values() {
                object.draw(shader);
            }
            shader.release();
        }
    }

    fn mouse_move(&mut self, event: &MouseEvent) {
        if !self.accepts_input() {
            return;
        }
        self.mouse.pos = event.position;
        let dx = self.mouse.dx();
        let dy = self.mouse.dy();

        if event.buttons.left {
            self.camera.rotate(dx, dy);
            self.mouse.last_pos = event.position;
            self.surface.request_redraw();
        } else if event.buttons.right {
            self.camera.pan(dx, dy);
            self.mouse.last_pos = event.position;
            self.surface.request_redraw();
        }
    }

    fn mouse_press(&mut self, event: &MouseEvent) {
        if !self.accepts_input() {
            return;
        }
        self.mouse.last_pos = event.position;
        self.surface.request_redraw();
    }

    fn mouse_release(&mut self, _event: &MouseEvent) {
        if !self.accepts_input() {
            return;
        }
        self.surface.request_redraw();
    }

    fn wheel(&mut self, delta: f32) {
        if !self.accepts_input() {
            return;
        }
        self.camera.zoom(wheel_steps(delta));
        self.surface.request_redraw();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mouse::MouseButtons;
    use crate::render::{GeometryData, GeometrySet, MeshData, MeshSource, ObjectOptions};
    use crate::testing::{Call, FakeSurface, RecordingApp, RecordingShader};
    use approx::assert_relative_eq;

    type TestView = View<FakeSurface, RecordingShader>;

    fn view() -> (TestView, Rc<RefCell<RecordingApp>>) {
        let app = Rc::new(RefCell::new(RecordingApp::default()));
        let view = View::new(FakeSurface::default(), app.clone(), &ViewerConfig::default());
        (view, app)
    }

    fn quad(name: &str) -> BufferObject<u32> {
        let faces = GeometryData::uniform(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            Vec3::splat(0.8),
            vec![0, 1, 2, 0, 2, 3],
        );
        let set = GeometrySet {
            frontfaces: Some(faces.clone()),
            backfaces: Some(faces),
            ..Default::default()
        };
        let options = ObjectOptions {
            show_faces: true,
            ..Default::default()
        };
        BufferObject::new(name, Box::new(set), options)
    }

    fn id_of_color(color: Vec3) -> u32 {
        let [r, g, b] = (color * 255.0).round().to_array().map(|c| c as u8);
        instance_id([r, g, b, 255])
    }

    fn pixel_of(view: &TestView, name: &str) -> [u8; 4] {
        let color = view.object(name).unwrap().instance_color();
        let [r, g, b] = (color * 255.0).round().to_array().map(|c| c as u8);
        [r, g, b, 255]
    }

    /// Valid points, but front faces that index past the last position.
    fn broken(name: &str) -> BufferObject<u32> {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        let set = GeometrySet {
            points: Some(GeometryData::uniform(positions.clone(), Vec3::ONE, vec![0, 1, 2])),
            frontfaces: Some(GeometryData::uniform(positions, Vec3::ONE, vec![0, 1, 7])),
            ..Default::default()
        };
        BufferObject::new(name, Box::new(set), ObjectOptions::default())
    }

    fn left() -> MouseButtons {
        MouseButtons {
            left: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_ghosted_mode_pushes_opacity() {
        let (mut view, _) = view();
        view.set_shader(RecordingShader::default());

        view.set_mode("ghosted".parse().unwrap());
        assert_eq!(view.mode(), RenderMode::Ghosted);
        assert_relative_eq!(view.opacity(), 0.7);
        assert_eq!(view.shader().unwrap().uniform1f_values("opacity").last(), Some(&0.7));
        assert_eq!(view.surface().redraws, 1);

        view.set_mode("wireframe".parse().unwrap());
        assert_eq!(view.mode(), RenderMode::Shaded);
        assert_relative_eq!(view.opacity(), 1.0);
        assert_eq!(view.shader().unwrap().uniform1f_values("opacity").last(), Some(&1.0));
    }

    #[test]
    fn test_mode_without_shader_only_updates_opacity() {
        let (mut view, _) = view();
        view.set_mode(RenderMode::Ghosted);
        assert_relative_eq!(view.opacity(), 0.7);
        assert_eq!(view.surface().redraws, 0);
    }

    #[test]
    fn test_lifecycle() {
        let (mut view, app) = view();
        view.add_object(quad("quad")).unwrap();
        assert_eq!(view.state(), SurfaceState::Uninitialized);
        assert!(view.object("quad").unwrap().buffers().frontfaces.is_none());

        view.initialize_gl().unwrap();
        assert_eq!(view.state(), SurfaceState::Initialized);
        assert_eq!(view.surface().initialized_with, Some(Vec4::ONE));
        assert!(view.object("quad").unwrap().buffers().frontfaces.is_some());

        view.resize_gl(640, 480);
        assert_eq!(view.state(), SurfaceState::Resizing);
        assert_eq!(view.surface().viewport, Some((640, 480)));
        assert_eq!((app.borrow().width, app.borrow().height), (640, 480));

        view.paint_gl();
        assert_eq!(view.state(), SurfaceState::Painting);
        assert_eq!(view.surface().clears, 1);
    }

    #[test]
    fn test_paint_draws_every_object() {
        let (mut view, _) = view();
        view.set_shader(RecordingShader::default());
        view.add_object(quad("a")).unwrap();
        view.add_object(quad("b")).unwrap();
        view.initialize_gl().unwrap();

        view.paint_gl();

        let shader = view.shader().unwrap();
        assert_eq!(shader.draws().len(), 4);
        assert!(shader.calls.iter().any(|call| matches!(call, Call::Uniform4x4(name, _) if name == "projection")));
        assert_eq!(shader.calls.last(), Some(&Call::Release));
    }

    #[test]
    fn test_paint_before_initialize_is_ignored() {
        let (mut view, _) = view();
        view.paint_gl();
        assert_eq!(view.surface().clears, 0);
        assert_eq!(view.state(), SurfaceState::Uninitialized);
    }

    #[test]
    fn test_objects_keep_insertion_order() {
        let (mut view, _) = view();
        for name in ["c", "a", "b"] {
            view.add_object(quad(name)).unwrap();
        }
        let names: Vec<&str> = view.objects().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["c", "a", "b"]);

        assert!(matches!(
            view.add_object(quad("a")),
            Err(ViewerError::DuplicateObject(_))
        ));
    }

    #[test]
    fn test_object_added_after_init_is_built() {
        let (mut view, _) = view();
        view.initialize_gl().unwrap();
        view.add_object(quad("late")).unwrap();
        assert!(view.object("late").unwrap().buffers().backfaces.is_some());
    }

    #[test]
    fn test_remove_and_teardown_free_buffers() {
        let (mut view, _) = view();
        view.add_object(quad("a")).unwrap();
        view.add_object(quad("b")).unwrap();
        view.initialize_gl().unwrap();
        assert_eq!(view.surface().allocator.live(), 12);

        assert!(view.remove_object("a").is_some());
        assert!(view.remove_object("a").is_none());
        assert_eq!(view.surface().allocator.live(), 6);

        view.teardown();
        assert_eq!(view.surface().allocator.live(), 0);
    }

    #[test]
    fn test_left_drag_rotates() {
        let (mut view, _) = view();
        view.mouse_press(&MouseEvent::new(100.0, 100.0, left()));
        view.mouse_move(&MouseEvent::new(110.0, 95.0, left()));

        assert_relative_eq!(view.camera.rotation.z, 0.1, epsilon = 1e-6);
        assert_relative_eq!(view.camera.rotation.x, -0.05, epsilon = 1e-6);
        assert_eq!(view.mouse.last_pos, glam::Vec2::new(110.0, 95.0));
        assert_eq!(view.surface().redraws, 2);
    }

    #[test]
    fn test_right_drag_pans() {
        let (mut view, _) = view();
        let right = MouseButtons {
            right: true,
            ..Default::default()
        };
        view.mouse_press(&MouseEvent::new(0.0, 0.0, right));
        view.mouse_move(&MouseEvent::new(10.0, 0.0, right));

        assert!(view.camera.target.x < 0.0);
        assert_eq!(view.camera.rotation, Vec3::ZERO);
    }

    #[test]
    fn test_hover_without_buttons_tracks_position_only() {
        let (mut view, _) = view();
        view.mouse_move(&MouseEvent::new(30.0, 40.0, MouseButtons::default()));

        assert_eq!(view.mouse.pos, glam::Vec2::new(30.0, 40.0));
        assert_eq!(view.mouse.last_pos, glam::Vec2::ZERO);
        assert_eq!(view.surface().redraws, 0);
    }

    #[test]
    fn test_wheel_zooms_one_step_per_notch() {
        let (mut view, _) = view();
        view.wheel(120.0);
        assert_relative_eq!(view.camera.distance(), 9.5, epsilon = 1e-5);
        assert_eq!(view.surface().redraws, 1);
    }

    #[test]
    fn test_input_ignored_without_focus_or_hover() {
        let (mut view, _) = view();
        view.surface_mut().active = false;
        view.mouse_press(&MouseEvent::new(5.0, 5.0, left()));
        view.mouse_move(&MouseEvent::new(50.0, 50.0, left()));
        view.wheel(120.0);

        view.surface_mut().active = true;
        view.surface_mut().under_mouse = false;
        view.mouse_release(&MouseEvent::new(50.0, 50.0, left()));
        view.wheel(-120.0);

        assert_eq!(view.mouse, Mouse::default());
        assert_eq!(view.camera.rotation, Vec3::ZERO);
        assert_relative_eq!(view.camera.distance(), 10.0);
        assert_eq!(view.surface().redraws, 0);
    }

    #[test]
    fn test_pick_selects_object_under_cursor() {
        let (mut view, _) = view();
        view.set_shader(RecordingShader::default());
        view.add_object(quad("a")).unwrap();
        view.add_object(quad("b")).unwrap();
        view.initialize_gl().unwrap();

        let pixel = pixel_of(&view, "b");
        view.surface_mut().pixel = pixel;

        let picked = view.pick(10, 20).unwrap();
        assert_eq!(picked.as_deref(), Some("b"));
        assert!(view.object("b").unwrap().is_selected);
        assert!(!view.object("a").unwrap().is_selected);
        assert_eq!(view.surface().reads.last(), Some(&(10, 720 - 1 - 20, 1, 1)));

        // the pixel is read with blending and multisampling off
        assert_eq!(view.surface().instance_passes, 1);
        assert_eq!(view.surface().masked_reads, 1);
        assert!(!view.surface().instance_pass);

        // background is white and maps to no object
        view.surface_mut().pixel = [255, 255, 255, 255];
        assert_eq!(view.pick(10, 20).unwrap(), None);
        assert!(!view.object("b").unwrap().is_selected);
    }

    #[test]
    fn test_pick_outside_surface() {
        let (mut view, _) = view();
        view.set_shader(RecordingShader::default());
        view.initialize_gl().unwrap();
        assert_eq!(view.pick(5000, 0).unwrap(), None);
        assert!(view.surface().reads.is_empty());
    }

    #[test]
    fn test_pick_skips_mesh_without_faces() {
        let (mut view, _) = view();
        view.set_shader(RecordingShader::default());
        let mesh = MeshData {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
            faces: Vec::new(),
        };
        let options = ViewerConfig::default().object;
        let faceless = BufferObject::new("mesh", Box::new(MeshSource::new(mesh)), options);
        view.add_object(faceless).unwrap();
        view.add_object(quad("quad")).unwrap();
        view.initialize_gl().unwrap();
        view.paint_gl();

        let pixel = pixel_of(&view, "quad");
        view.surface_mut().pixel = pixel;
        assert_eq!(view.pick(10, 10).unwrap().as_deref(), Some("quad"));
        assert!(!view.object("mesh").unwrap().is_selected);
        assert!(!view.surface().instance_pass);
    }

    #[test]
    fn test_failed_build_after_init_frees_buffers() {
        let (mut view, _) = view();
        view.initialize_gl().unwrap();

        assert!(matches!(
            view.add_object(broken("broken")),
            Err(ViewerError::InvalidGeometry(_))
        ));
        assert!(view.object("broken").is_none());
        assert_eq!(view.surface().allocator.live(), 0);

        // the failed object's id goes back to the pool
        view.add_object(quad("quad")).unwrap();
        assert_eq!(id_of_color(view.object("quad").unwrap().instance_color()), 1);
    }

    #[test]
    fn test_failed_initialize_frees_buffers() {
        let (mut view, _) = view();
        view.add_object(quad("quad")).unwrap();
        view.add_object(broken("broken")).unwrap();

        assert!(view.initialize_gl().is_err());
        assert_eq!(view.state(), SurfaceState::Uninitialized);
        assert_eq!(view.surface().allocator.live(), 0);
        assert!(view.object("quad").unwrap().buffers().frontfaces.is_none());
    }

    #[test]
    fn test_removed_ids_are_reused() {
        let (mut view, _) = view();
        view.set_shader(RecordingShader::default());
        view.add_object(quad("a")).unwrap();
        view.add_object(quad("b")).unwrap();
        view.initialize_gl().unwrap();

        let freed = view.object("a").unwrap().instance_color();
        view.remove_object("a").unwrap();
        view.add_object(quad("c")).unwrap();
        assert_eq!(view.object("c").unwrap().instance_color(), freed);

        let pixel = pixel_of(&view, "b");
        view.surface_mut().pixel = pixel;
        assert_eq!(view.pick(1, 1).unwrap().as_deref(), Some("b"));
        let pixel = pixel_of(&view, "c");
        view.surface_mut().pixel = pixel;
        assert_eq!(view.pick(1, 1).unwrap().as_deref(), Some("c"));

        view.remove_object("c").unwrap();
        let pixel = pixel_of(&view, "b");
        view.surface_mut().pixel = pixel;
        assert_eq!(view.pick(1, 1).unwrap().as_deref(), Some("b"));
    }

    #[test]
    fn test_instance_ids_run_out_below_white() {
        let (mut view, _) = view();
        view.next_instance = MAX_INSTANCE_ID;
        view.add_object(quad("last")).unwrap();
        assert_eq!(
            id_of_color(view.object("last").unwrap().instance_color()),
            MAX_INSTANCE_ID
        );

        assert!(matches!(
            view.add_object(quad("over")),
            Err(ViewerError::InstancesExhausted(_))
        ));

        view.remove_object("last").unwrap();
        view.add_object(quad("over")).unwrap();
    }

    #[test]
    fn test_instance_colors_round_trip() {
        for id in [1, 2, 255, 256, 70_000] {
            assert_eq!(id_of_color(instance_color(id)), id);
        }
    }
}
