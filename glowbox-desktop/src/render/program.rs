use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use bytemuck::{Pod, Zeroable};
use cgmath::{vec3, Matrix4, SquareMatrix, Vector3};
use glowbox_core::render::{
    lighting::MAX_POINT_LIGHTS,
    shader::{lighting_uniform_names, ShaderProgram, UniformValue},
};
use log::warn;

/// Identifies which program subsequent draw calls should be recorded against.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ProgramKind {
    Phong,
    Marker,
}

/// wgpu clip space covers z in 0..1 where GL-style projections produce -1..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

fn vec4_of(v: Vector3<f32>) -> [f32; 4] {
    [v.x, v.y, v.z, 0.0]
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GpuDirLight {
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
}

unsafe impl Pod for GpuDirLight {}
unsafe impl Zeroable for GpuDirLight {}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GpuPointLight {
    pub position: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    /// x: constant, y: linear, z: quadratic.
    pub attenuation: [f32; 4],
}

unsafe impl Pod for GpuPointLight {}
unsafe impl Zeroable for GpuPointLight {}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GpuSpotlight {
    pub position: [f32; 4],
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    /// x: inner cutoff cosine, y: outer cutoff cosine.
    pub cone: [f32; 4],
    /// x: constant, y: linear, z: quadratic.
    pub attenuation: [f32; 4],
}

unsafe impl Pod for GpuSpotlight {}
unsafe impl Zeroable for GpuSpotlight {}

/// The lit-surface uniform block. Every field is vec4-aligned so the memory
/// layout matches the WGSL declaration exactly.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct PhongUniforms {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub dir_light: GpuDirLight,
    pub point_lights: [GpuPointLight; MAX_POINT_LIGHTS],
    pub spotlight: GpuSpotlight,
    pub view_pos: [f32; 4],
    /// x: material shininess, y: live point light count.
    pub params: [f32; 4],
}

unsafe impl Pod for PhongUniforms {}
unsafe impl Zeroable for PhongUniforms {}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct MarkerUniforms {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

unsafe impl Pod for MarkerUniforms {}
unsafe impl Zeroable for MarkerUniforms {}

/// CPU-side state of the lit-surface program between activation and draw.
pub struct PhongState {
    pub uniforms: PhongUniforms,
    pub model: Matrix4<f32>,
    pub diffuse_unit: Option<u32>,
    pub specular_unit: Option<u32>,
}

impl PhongState {
    pub fn new() -> PhongState {
        PhongState {
            uniforms: PhongUniforms::zeroed(),
            model: Matrix4::identity(),
            diffuse_unit: None,
            specular_unit: None,
        }
    }

    /// Routes a named write into the uniform block. Returns false when the
    /// name does not correspond to any shader input.
    fn apply(&mut self, name: &str, value: UniformValue) -> bool {
        match (name, value) {
            ("model", UniformValue::Mat4(m)) => self.model = m,
            ("view", UniformValue::Mat4(m)) => self.uniforms.view = m.into(),
            ("projection", UniformValue::Mat4(m)) => {
                self.uniforms.projection = (OPENGL_TO_WGPU_MATRIX * m).into();
            }
            ("view_pos", UniformValue::Vec3(v)) => self.uniforms.view_pos = vec4_of(v),
            ("material.shininess", UniformValue::Float(f)) => self.uniforms.params[0] = f,
            ("material.texture_diffuse1", UniformValue::Int(i)) => {
                self.diffuse_unit = Some(i as u32);
            }
            ("material.texture_specular1", UniformValue::Int(i)) => {
                self.specular_unit = Some(i as u32);
            }
            _ => return self.apply_light(name, value),
        }
        true
    }

    fn apply_light(&mut self, name: &str, value: UniformValue) -> bool {
        if let Some(field) = name.strip_prefix("dir_light.") {
            let light = &mut self.uniforms.dir_light;
            match (field, value) {
                ("direction", UniformValue::Vec3(v)) => light.direction = vec4_of(v),
                ("ambient", UniformValue::Vec3(v)) => light.ambient = vec4_of(v),
                ("diffuse", UniformValue::Vec3(v)) => light.diffuse = vec4_of(v),
                ("specular", UniformValue::Vec3(v)) => light.specular = vec4_of(v),
                _ => return false,
            }
            return true;
        }

        if let Some((index, field)) = point_light_slot(name) {
            if index >= MAX_POINT_LIGHTS {
                return false;
            }
            self.uniforms.params[1] = self.uniforms.params[1].max((index + 1) as f32);
            let light = &mut self.uniforms.point_lights[index];
            match (field, value) {
                ("position", UniformValue::Vec3(v)) => light.position = vec4_of(v),
                ("ambient", UniformValue::Vec3(v)) => light.ambient = vec4_of(v),
                ("diffuse", UniformValue::Vec3(v)) => light.diffuse = vec4_of(v),
                ("specular", UniformValue::Vec3(v)) => light.specular = vec4_of(v),
                ("constant", UniformValue::Float(f)) => light.attenuation[0] = f,
                ("linear", UniformValue::Float(f)) => light.attenuation[1] = f,
                ("quadratic", UniformValue::Float(f)) => light.attenuation[2] = f,
                _ => return false,
            }
            return true;
        }

        if let Some(field) = name.strip_prefix("spotlight.") {
            let light = &mut self.uniforms.spotlight;
            match (field, value) {
                ("position", UniformValue::Vec3(v)) => light.position = vec4_of(v),
                ("direction", UniformValue::Vec3(v)) => light.direction = vec4_of(v),
                ("inner_cutoff", UniformValue::Float(f)) => light.cone[0] = f,
                ("outer_cutoff", UniformValue::Float(f)) => light.cone[1] = f,
                ("ambient", UniformValue::Vec3(v)) => light.ambient = vec4_of(v),
                ("diffuse", UniformValue::Vec3(v)) => light.diffuse = vec4_of(v),
                ("specular", UniformValue::Vec3(v)) => light.specular = vec4_of(v),
                ("constant", UniformValue::Float(f)) => light.attenuation[0] = f,
                ("linear", UniformValue::Float(f)) => light.attenuation[1] = f,
                ("quadratic", UniformValue::Float(f)) => light.attenuation[2] = f,
                _ => return false,
            }
            return true;
        }

        false
    }
}

fn point_light_slot(name: &str) -> Option<(usize, &str)> {
    let rest = name.strip_prefix("point_lights[")?;
    let close = rest.find(']')?;
    let index = rest[..close].parse().ok()?;
    let field = rest[close + 1..].strip_prefix('.')?;
    Some((index, field))
}

/// The lit-surface program handle handed to the scene.
pub struct PhongProgram {
    state: Rc<RefCell<PhongState>>,
    active: Rc<Cell<ProgramKind>>,
}

impl PhongProgram {
    pub fn new(active: Rc<Cell<ProgramKind>>) -> PhongProgram {
        PhongProgram {
            state: Rc::new(RefCell::new(PhongState::new())),
            active,
        }
    }

    pub fn state(&self) -> Rc<RefCell<PhongState>> {
        self.state.clone()
    }
}

impl ShaderProgram for PhongProgram {
    fn activate(&mut self) {
        self.active.set(ProgramKind::Phong);
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        if !self.state.borrow_mut().apply(name, value) {
            warn!("Lit program has no input named {}", name);
        }
    }
}

/// CPU-side state of the light marker program.
pub struct MarkerState {
    pub uniforms: MarkerUniforms,
    pub model: Matrix4<f32>,
    pub color: Vector3<f32>,
}

impl MarkerState {
    pub fn new() -> MarkerState {
        MarkerState {
            uniforms: MarkerUniforms::zeroed(),
            model: Matrix4::identity(),
            color: vec3(1.0, 1.0, 1.0),
        }
    }

    fn apply(&mut self, name: &str, value: UniformValue) -> bool {
        match (name, value) {
            ("model", UniformValue::Mat4(m)) => self.model = m,
            ("view", UniformValue::Mat4(m)) => self.uniforms.view = m.into(),
            ("projection", UniformValue::Mat4(m)) => {
                self.uniforms.projection = (OPENGL_TO_WGPU_MATRIX * m).into();
            }
            ("light_color", UniformValue::Vec3(v)) => self.color = v,
            _ => return false,
        }
        true
    }
}

/// The flat-color program drawing the point light markers.
pub struct MarkerProgram {
    state: Rc<RefCell<MarkerState>>,
    active: Rc<Cell<ProgramKind>>,
}

impl MarkerProgram {
    pub fn new(active: Rc<Cell<ProgramKind>>) -> MarkerProgram {
        MarkerProgram {
            state: Rc::new(RefCell::new(MarkerState::new())),
            active,
        }
    }

    pub fn state(&self) -> Rc<RefCell<MarkerState>> {
        self.state.clone()
    }
}

impl ShaderProgram for MarkerProgram {
    fn activate(&mut self) {
        self.active.set(ProgramKind::Marker);
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        if !self.state.borrow_mut().apply(name, value) {
            warn!("Marker program has no input named {}", name);
        }
    }
}

/// Feeds the whole lighting vocabulary through the name router and reports
/// any name that fails to resolve. Run once at startup in debug builds.
pub fn verify_protocol_coverage() {
    let mut state = PhongState::new();

    for name in lighting_uniform_names(MAX_POINT_LIGHTS) {
        let scalar = ["cutoff", "constant", "linear", "quadratic"]
            .iter()
            .any(|suffix| name.ends_with(suffix));
        let value = if scalar {
            UniformValue::Float(0.0)
        } else {
            UniformValue::Vec3(vec3(0.0, 0.0, 0.0))
        };

        if !state.apply(&name, value) {
            warn!("Protocol name {} does not reach the lit program", name);
        }
    }
}
