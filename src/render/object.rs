//! Drawable scene objects.
//!
//! A [`BufferObject`] pulls geometry triples out of a [`GeometrySource`],
//! keeps one [`GeometryBuffer`] per primitive group and issues the draw calls
//! for the normal pass ([`BufferObject::draw`]) and the picking pass
//! ([`BufferObject::draw_instance`]).

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewerError};

use super::{BufferAllocator, GeometryBuffer, GeometryData, PrimitiveGroup, Shader};

/// Produces the geometry of an object, one optional triple per primitive group.
///
/// Groups a source does not provide simply never get a buffer.
pub trait GeometrySource {
    fn points_data(&self) -> Option<GeometryData> {
        None
    }

    fn lines_data(&self) -> Option<GeometryData> {
        None
    }

    fn frontfaces_data(&self) -> Option<GeometryData> {
        None
    }

    fn backfaces_data(&self) -> Option<GeometryData> {
        None
    }

    /// Dispatches to the per-group method.
    fn data(&self, group: PrimitiveGroup) -> Option<GeometryData> {
        match group {
            PrimitiveGroup::Points => self.points_data(),
            PrimitiveGroup::Lines => self.lines_data(),
            PrimitiveGroup::FrontFaces => self.frontfaces_data(),
            PrimitiveGroup::BackFaces => self.backfaces_data(),
        }
    }
}

/// A source holding ready-made triples.
#[derive(Debug, Clone, Default)]
pub struct GeometrySet {
    pub points: Option<GeometryData>,
    pub lines: Option<GeometryData>,
    pub frontfaces: Option<GeometryData>,
    pub backfaces: Option<GeometryData>,
}

impl GeometrySource for GeometrySet {
    fn points_data(&self) -> Option<GeometryData> {
        self.points.clone()
    }

    fn lines_data(&self) -> Option<GeometryData> {
        self.lines.clone()
    }

    fn frontfaces_data(&self) -> Option<GeometryData> {
        self.frontfaces.clone()
    }

    fn backfaces_data(&self) -> Option<GeometryData> {
        self.backfaces.clone()
    }
}

/// Display flags and style of a [`BufferObject`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectOptions {
    pub is_selected: bool,
    pub show_points: bool,
    pub show_lines: bool,
    pub show_faces: bool,
    pub linewidth: f32,
    pub pointsize: f32,
}

impl Default for ObjectOptions {
    fn default() -> Self {
        Self {
            is_selected: false,
            show_points: false,
            show_lines: false,
            show_faces: false,
            linewidth: 1.0,
            pointsize: 10.0,
        }
    }
}

/// GPU buffers of an object, one slot per primitive group.
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveBuffers<B> {
    pub points: Option<GeometryBuffer<B>>,
    pub lines: Option<GeometryBuffer<B>>,
    pub frontfaces: Option<GeometryBuffer<B>>,
    pub backfaces: Option<GeometryBuffer<B>>,
}

impl<B> Default for PrimitiveBuffers<B> {
    fn default() -> Self {
        Self {
            points: None,
            lines: None,
            frontfaces: None,
            backfaces: None,
        }
    }
}

impl<B> PrimitiveBuffers<B> {
    pub fn get(&self, group: PrimitiveGroup) -> Option<&GeometryBuffer<B>> {
        self.slot(group).as_ref()
    }

    fn slot(&self, group: PrimitiveGroup) -> &Option<GeometryBuffer<B>> {
        match group {
            PrimitiveGroup::Points => &self.points,
            PrimitiveGroup::Lines => &self.lines,
            PrimitiveGroup::FrontFaces => &self.frontfaces,
            PrimitiveGroup::BackFaces => &self.backfaces,
        }
    }

    fn slot_mut(&mut self, group: PrimitiveGroup) -> &mut Option<GeometryBuffer<B>> {
        match group {
            PrimitiveGroup::Points => &mut self.points,
            PrimitiveGroup::Lines => &mut self.lines,
            PrimitiveGroup::FrontFaces => &mut self.frontfaces,
            PrimitiveGroup::BackFaces => &mut self.backfaces,
        }
    }
}

/// A scene entity with up to four primitive-group buffers.
pub struct BufferObject<B> {
    name: String,
    source: Box<dyn GeometrySource>,
    buffers: PrimitiveBuffers<B>,
    instance_color: Vec3,
    pub is_selected: bool,
    pub show_points: bool,
    pub show_lines: bool,
    pub show_faces: bool,
    pub linewidth: f32,
    pub pointsize: f32,
}

impl<B> fmt::Debug for BufferObject<B>
where
    B: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferObject")
            .field("name", &self.name)
            .field("buffers", &self.buffers)
            .field("instance_color", &self.instance_color)
            .field("is_selected", &self.is_selected)
            .field("show_points", &self.show_points)
            .field("show_lines", &self.show_lines)
            .field("show_faces", &self.show_faces)
            .finish_non_exhaustive()
    }
}

impl<B: Copy + fmt::Debug> BufferObject<B> {
    /// Creates an object without any buffers. Call [`Self::make_buffers`]
    /// once a rendering context exists.
    pub fn new(
        name: impl Into<String>,
        source: Box<dyn GeometrySource>,
        options: ObjectOptions,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            buffers: PrimitiveBuffers::default(),
            instance_color: Vec3::ZERO,
            is_selected: options.is_selected,
            show_points: options.show_points,
            show_lines: options.show_lines,
            show_faces: options.show_faces,
            linewidth: options.linewidth,
            pointsize: options.pointsize,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn buffers(&self) -> &PrimitiveBuffers<B> {
        &self.buffers
    }

    /// Color identifying this object in the picking pass.
    pub fn instance_color(&self) -> Vec3 {
        self.instance_color
    }

    pub fn set_instance_color(&mut self, color: Vec3) {
        self.instance_color = color;
    }

    fn shows(&self, group: PrimitiveGroup) -> bool {
        match group {
            PrimitiveGroup::Points => self.show_points,
            PrimitiveGroup::Lines => self.show_lines,
            PrimitiveGroup::FrontFaces | PrimitiveGroup::BackFaces => self.show_faces,
        }
    }

    /// Builds one buffer for every group the source provides.
    ///
    /// Buffers from an earlier call are freed as they are replaced. A group
    /// whose data fails validation aborts the rebuild; groups rebuilt before
    /// it keep their new buffers.
    pub fn make_buffers<A>(&mut self, allocator: &mut A) -> Result<()>
    where
        A: BufferAllocator<Buffer = B>,
    {
        for group in PrimitiveGroup::ALL {
            let Some(data) = self.source.data(group) else {
                continue;
            };

            let buffer = GeometryBuffer::build(allocator, &data)?;
            log::debug!(
                "built {} buffer for '{}' ({} positions, {} elements)",
                group,
                self.name,
                buffer.n,
                buffer.elements.len
            );

            if let Some(old) = self.buffers.slot_mut(group).replace(buffer) {
                old.release(allocator);
            }
        }
        Ok(())
    }

    /// Frees every buffer this object holds.
    pub fn release_buffers<A>(&mut self, allocator: &mut A)
    where
        A: BufferAllocator<Buffer = B>,
    {
        for group in PrimitiveGroup::ALL {
            if let Some(buffer) = self.buffers.slot_mut(group).take() {
                buffer.release(allocator);
            }
        }
    }

    fn draw_group<S>(&self, shader: &mut S, group: PrimitiveGroup, buffer: &GeometryBuffer<B>)
    where
        S: Shader<Buffer = B>,
    {
        match group {
            PrimitiveGroup::Points => shader.draw_points(buffer.elements, buffer.n, self.pointsize),
            PrimitiveGroup::Lines => shader.draw_lines(buffer.elements, buffer.n, self.linewidth),
            PrimitiveGroup::FrontFaces | PrimitiveGroup::BackFaces => {
                shader.draw_triangles(buffer.elements, buffer.n)
            }
        }
    }

    /// Draws every group that has a buffer and is switched on.
    ///
    /// `is_selected` carries the selection flag for the duration of the call
    /// and is reset to 0 afterwards.
    pub fn draw<S>(&self, shader: &mut S)
    where
        S: Shader<Buffer = B>,
    {
        shader.enable_attribute("position");
        shader.enable_attribute("color");
        shader.uniform1i("is_selected", self.is_selected as i32);

        for group in PrimitiveGroup::ALL {
            if !self.shows(group) {
                continue;
            }
            if let Some(buffer) = self.buffers.get(group) {
                shader.bind_attribute("position", buffer.positions);
                shader.bind_attribute("color", buffer.colors);
                self.draw_group(shader, group, buffer);
            }
        }

        shader.uniform1i("is_selected", 0);
        shader.disable_attribute("position");
        shader.disable_attribute("color");
    }

    /// The first switched-on group that has no buffer, if any.
    ///
    /// [`Self::draw_instance`] refuses to run while this is `Some`.
    pub fn missing_buffer(&self) -> Option<PrimitiveGroup> {
        PrimitiveGroup::ALL
            .into_iter()
            .find(|&group| self.shows(group) && self.buffers.get(group).is_none())
    }

    /// Draws the object in its instance color for the picking pass.
    ///
    /// Unlike [`Self::draw`] this expects a buffer for every switched-on
    /// group and fails with [`ViewerError::MissingBuffer`] before issuing any
    /// call if one is absent.
    pub fn draw_instance<S>(&self, shader: &mut S) -> Result<()>
    where
        S: Shader<Buffer = B>,
    {
        if let Some(group) = self.missing_buffer() {
            return Err(ViewerError::MissingBuffer {
                object: self.name.clone(),
                group,
            });
        }

        shader.enable_attribute("position");
        shader.uniform1i("is_instance_mask", 1);
        shader.uniform3f("instance_color", self.instance_color);

        for group in PrimitiveGroup::ALL {
            if !self.shows(group) {
                continue;
            }
            if let Some(buffer) = self.buffers.get(group) {
                shader.bind_attribute("position", buffer.positions);
                self.draw_group(shader, group, buffer);
            }
        }

        shader.uniform1i("is_instance_mask", 0);
        shader.uniform3f("instance_color", Vec3::ZERO);
        shader.disable_attribute("position");
        Ok(())
    }
}
