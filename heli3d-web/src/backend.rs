/// WebGL2 drawing backend
use heli3d_core::{
    DrawBackend, DrawCommand, FrameUniforms, Mesh, MeshHandle, RenderError, ShaderStage,
};
use tracing::debug;
use web_sys::{
    WebGl2RenderingContext as Gl, WebGlBuffer, WebGlProgram, WebGlShader, WebGlUniformLocation,
};

use crate::shaders::{
    ATTRIB_NORMAL, ATTRIB_POSITION, FRAGMENT_SHADER, UNIFORM_AMBIENT_COLOR, UNIFORM_BASE_COLOR,
    UNIFORM_LIGHT_COLOR, UNIFORM_LIGHT_POSITION, UNIFORM_MODEL_VIEW, UNIFORM_NORMAL,
    UNIFORM_PROJECTION, VERTEX_SHADER,
};

/// Buffers of one uploaded mesh
struct GpuMesh {
    positions: WebGlBuffer,
    normals: WebGlBuffer,
    indices: WebGlBuffer,
    index_count: i32,
}

struct UniformLocations {
    model_view: Option<WebGlUniformLocation>,
    projection: Option<WebGlUniformLocation>,
    normal: Option<WebGlUniformLocation>,
    light_position: Option<WebGlUniformLocation>,
    light_color: Option<WebGlUniformLocation>,
    ambient_color: Option<WebGlUniformLocation>,
    base_color: Option<WebGlUniformLocation>,
}

impl UniformLocations {
    fn lookup(gl: &Gl, program: &WebGlProgram) -> Self {
        Self {
            model_view: gl.get_uniform_location(program, UNIFORM_MODEL_VIEW),
            projection: gl.get_uniform_location(program, UNIFORM_PROJECTION),
            normal: gl.get_uniform_location(program, UNIFORM_NORMAL),
            light_position: gl.get_uniform_location(program, UNIFORM_LIGHT_POSITION),
            light_color: gl.get_uniform_location(program, UNIFORM_LIGHT_COLOR),
            ambient_color: gl.get_uniform_location(program, UNIFORM_AMBIENT_COLOR),
            base_color: gl.get_uniform_location(program, UNIFORM_BASE_COLOR),
        }
    }
}

/// Shader program, attribute slots and uploaded meshes for one context
pub struct WebGlBackend {
    gl: Gl,
    program: WebGlProgram,
    position_attrib: u32,
    normal_attrib: u32,
    uniforms: UniformLocations,
    meshes: Vec<GpuMesh>,
    viewport: (i32, i32),
}

impl WebGlBackend {
    /// Compile and link the shader program. Failures carry the driver's
    /// info log.
    pub fn new(gl: Gl) -> Result<Self, RenderError> {
        let vertex = compile_shader(&gl, ShaderStage::Vertex, VERTEX_SHADER)?;
        let fragment = compile_shader(&gl, ShaderStage::Fragment, FRAGMENT_SHADER)?;
        let program = link_program(&gl, &vertex, &fragment)?;

        let position_attrib = attrib_location(&gl, &program, ATTRIB_POSITION)?;
        let normal_attrib = attrib_location(&gl, &program, ATTRIB_NORMAL)?;
        let uniforms = UniformLocations::lookup(&gl, &program);

        gl.enable(Gl::DEPTH_TEST);
        debug!("WebGL program linked");

        Ok(Self {
            gl,
            program,
            position_attrib,
            normal_attrib,
            uniforms,
            meshes: Vec::new(),
            viewport: (0, 0),
        })
    }

    pub fn set_viewport(&mut self, width: i32, height: i32) {
        self.viewport = (width, height);
    }

    fn upload_buffer(&self, target: u32, bytes: &[u8]) -> Result<WebGlBuffer, RenderError> {
        let buffer = self
            .gl
            .create_buffer()
            .ok_or(RenderError::ResourceCreation("buffer"))?;
        self.gl.bind_buffer(target, Some(&buffer));
        self.gl.buffer_data_with_u8_array(target, bytes, Gl::STATIC_DRAW);
        Ok(buffer)
    }

    fn bind_attribute(&self, buffer: &WebGlBuffer, attrib: u32) {
        self.gl.bind_buffer(Gl::ARRAY_BUFFER, Some(buffer));
        self.gl
            .vertex_attrib_pointer_with_i32(attrib, 3, Gl::FLOAT, false, 0, 0);
        self.gl.enable_vertex_attrib_array(attrib);
    }
}

impl DrawBackend for WebGlBackend {
    fn upload_mesh(&mut self, mesh: &Mesh) -> Result<MeshHandle, RenderError> {
        let positions = mesh.flat_positions();
        let normals = mesh.flat_normals();
        let gpu = GpuMesh {
            positions: self.upload_buffer(Gl::ARRAY_BUFFER, bytemuck::cast_slice(&positions))?,
            normals: self.upload_buffer(Gl::ARRAY_BUFFER, bytemuck::cast_slice(&normals))?,
            indices: self.upload_buffer(
                Gl::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(mesh.indices()),
            )?,
            index_count: mesh.indices().len() as i32,
        };
        self.meshes.push(gpu);
        Ok(MeshHandle(self.meshes.len() - 1))
    }

    fn begin_frame(&mut self, uniforms: &FrameUniforms) -> Result<(), RenderError> {
        let gl = &self.gl;
        let (width, height) = self.viewport;
        gl.viewport(0, 0, width, height);
        // Transparent so the canvas background shows through
        gl.clear_color(0.0, 0.0, 0.0, 0.0);
        gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);
        gl.use_program(Some(&self.program));

        let lighting = &uniforms.lighting;
        let locations = &self.uniforms;
        gl.uniform_matrix4fv_with_f32_array(
            locations.projection.as_ref(),
            false,
            uniforms.projection.as_slice(),
        );
        gl.uniform3fv_with_f32_array(
            locations.light_position.as_ref(),
            lighting.light_position.as_slice(),
        );
        gl.uniform3fv_with_f32_array(
            locations.light_color.as_ref(),
            lighting.light_color.as_slice(),
        );
        gl.uniform3fv_with_f32_array(
            locations.ambient_color.as_ref(),
            lighting.ambient_color.as_slice(),
        );
        gl.uniform3fv_with_f32_array(
            locations.base_color.as_ref(),
            lighting.base_color.as_slice(),
        );
        Ok(())
    }

    fn draw(&mut self, mesh: MeshHandle, command: &DrawCommand) -> Result<(), RenderError> {
        let gpu = self
            .meshes
            .get(mesh.0)
            .ok_or(RenderError::UnknownMesh(mesh.0))?;
        let gl = &self.gl;

        gl.uniform_matrix4fv_with_f32_array(
            self.uniforms.model_view.as_ref(),
            false,
            command.model_view.as_slice(),
        );
        gl.uniform_matrix3fv_with_f32_array(
            self.uniforms.normal.as_ref(),
            false,
            command.normal_matrix.as_slice(),
        );

        self.bind_attribute(&gpu.positions, self.position_attrib);
        self.bind_attribute(&gpu.normals, self.normal_attrib);

        gl.bind_buffer(Gl::ELEMENT_ARRAY_BUFFER, Some(&gpu.indices));
        gl.draw_elements_with_i32(Gl::TRIANGLES, gpu.index_count, Gl::UNSIGNED_SHORT, 0);
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        match self.gl.get_error() {
            Gl::NO_ERROR => Ok(()),
            code => Err(RenderError::Backend(format!("WebGL error 0x{code:04x}"))),
        }
    }
}

fn compile_shader(gl: &Gl, stage: ShaderStage, source: &str) -> Result<WebGlShader, RenderError> {
    let kind = match stage {
        ShaderStage::Vertex => Gl::VERTEX_SHADER,
        ShaderStage::Fragment => Gl::FRAGMENT_SHADER,
    };
    let shader = gl
        .create_shader(kind)
        .ok_or(RenderError::ResourceCreation("shader"))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl
        .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(shader)
    } else {
        let log = gl
            .get_shader_info_log(&shader)
            .unwrap_or_else(|| "unknown error".to_string());
        gl.delete_shader(Some(&shader));
        Err(RenderError::ShaderCompile { stage, log })
    }
}

fn link_program(
    gl: &Gl,
    vertex: &WebGlShader,
    fragment: &WebGlShader,
) -> Result<WebGlProgram, RenderError> {
    let program = gl
        .create_program()
        .ok_or(RenderError::ResourceCreation("shader program"))?;
    gl.attach_shader(&program, vertex);
    gl.attach_shader(&program, fragment);
    gl.link_program(&program);

    if gl
        .get_program_parameter(&program, Gl::LINK_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(program)
    } else {
        let log = gl
            .get_program_info_log(&program)
            .unwrap_or_else(|| "unknown error".to_string());
        gl.delete_program(Some(&program));
        Err(RenderError::ProgramLink(log))
    }
}

fn attrib_location(gl: &Gl, program: &WebGlProgram, name: &str) -> Result<u32, RenderError> {
    u32::try_from(gl.get_attrib_location(program, name))
        .map_err(|_| RenderError::ProgramLink(format!("attribute {name} not found")))
}
