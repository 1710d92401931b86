/// ASCII rasterizer for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use heli3d_core::projection::project_to_viewport;
use heli3d_core::{DrawBackend, DrawCommand, FrameUniforms, Mesh, MeshHandle, RenderError};
use nalgebra::{Matrix4, Point3, Vector3};
use std::io::Write;
use tracing::debug;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// ASCII renderer that rasterizes draw commands into a character grid
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    meshes: Vec<Mesh>,
    uniforms: Option<FrameUniforms>,
    triangles_drawn: usize,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            meshes: Vec::new(),
            uniforms: None,
            triangles_drawn: 0,
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        let size = width * height;
        self.width = width;
        self.height = height;
        self.depth_buffer = vec![f32::INFINITY; size];
        self.char_buffer = vec![' '; size];
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
        self.triangles_drawn = 0;
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Triangles that survived clipping in the last frame
    pub fn triangles_drawn(&self) -> usize {
        self.triangles_drawn
    }

    pub fn char_at(&self, x: usize, y: usize) -> Option<char> {
        if x < self.width && y < self.height {
            Some(self.char_buffer[y * self.width + x])
        } else {
            None
        }
    }

    fn render_triangle(
        &mut self,
        mesh: usize,
        triangle: [usize; 3],
        command: &DrawCommand,
        clip_from_object: &Matrix4<f32>,
        uniforms: &FrameUniforms,
    ) {
        let vertices = self.meshes[mesh].vertices();
        let normals = self.meshes[mesh].normals();

        // Project vertices to screen space
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (slot, &index) in screen_coords.iter_mut().zip(&triangle) {
            match project_to_viewport(
                clip_from_object,
                &Point3::from(vertices[index]),
                self.width as u32,
                self.height as u32,
            ) {
                Some(coords) => *slot = coords,
                None => return, // Triangle is clipped
            }
        }

        // Flat shading from the averaged vertex normal at the view-space centroid
        let object_normal: Vector3<f32> = triangle.iter().map(|&i| normals[i]).sum();
        let normal = command.normal_matrix * object_normal;
        let centroid: Vector3<f32> = triangle
            .iter()
            .map(|&i| command.model_view.transform_point(&Point3::from(vertices[i])).coords)
            .sum::<Vector3<f32>>()
            / 3.0;
        let brightness = uniforms.lighting.intensity(&normal, &centroid);

        // Map brightness to character, keeping lit faces off the blank cell
        let char_index = 1 + (brightness * (LUMINOSITY_RAMP.len() - 2) as f32).round() as usize;
        let char_index = char_index.min(LUMINOSITY_RAMP.len() - 1);
        let character = LUMINOSITY_RAMP[char_index];

        self.triangles_drawn += 1;
        self.rasterize_triangle(&screen_coords, character);
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], character: char) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        // Scanline rasterization
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                // Barycentric coordinates, accepting either winding
                if let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        // Interpolate depth
                        let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;

                        let idx = y as usize * self.width + x as usize;
                        if depth < self.depth_buffer[idx] {
                            self.depth_buffer[idx] = depth;
                            self.char_buffer[idx] = character;
                        }
                    }
                }
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = y * self.width + x;
                let c = self.char_buffer[idx];

                // Red tint scaled by character intensity
                let color = match c {
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::DarkRed,
                    '+' | '*' => Color::Red,
                    '#' | '%' | '@' => Color::Magenta,
                    _ => Color::White,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl DrawBackend for AsciiRenderer {
    fn upload_mesh(&mut self, mesh: &Mesh) -> Result<MeshHandle, RenderError> {
        self.meshes.push(mesh.clone());
        debug!(
            handle = self.meshes.len() - 1,
            triangles = mesh.triangle_count(),
            "uploaded mesh"
        );
        Ok(MeshHandle(self.meshes.len() - 1))
    }

    fn begin_frame(&mut self, uniforms: &FrameUniforms) -> Result<(), RenderError> {
        self.clear();
        self.uniforms = Some(*uniforms);
        Ok(())
    }

    fn draw(&mut self, mesh: MeshHandle, command: &DrawCommand) -> Result<(), RenderError> {
        let uniforms = self
            .uniforms
            .ok_or_else(|| RenderError::Backend("draw outside begin_frame/end_frame".to_string()))?;
        let triangles: Vec<[usize; 3]> = self
            .meshes
            .get(mesh.0)
            .ok_or(RenderError::UnknownMesh(mesh.0))?
            .triangles()
            .collect();

        let clip_from_object = uniforms.projection * command.model_view;
        for triangle in triangles {
            self.render_triangle(mesh.0, triangle, command, &clip_from_object, &uniforms);
        }
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        self.uniforms = None;
        Ok(())
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
