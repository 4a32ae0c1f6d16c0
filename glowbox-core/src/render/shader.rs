use cgmath::{Matrix4, Vector3};

use crate::render::lighting::MAX_POINT_LIGHTS;

/// A single value passed to a shader program under a string name.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec3(Vector3<f32>),
    Mat4(Matrix4<f32>),
}

/// Host-side handle to a linked shader program.
///
/// The uniform vocabulary is string-keyed: the names written here must match
/// the names declared on the GPU side byte-for-byte. A name the program does
/// not know is accepted as a no-op, so implementations are expected to log
/// unresolved names rather than fail.
pub trait ShaderProgram {
    /// Makes this program the target of subsequent draw calls.
    fn activate(&mut self);

    /// Writes a single named uniform value.
    fn set_uniform(&mut self, name: &str, value: UniformValue);

    fn set_float(&mut self, name: &str, value: f32) {
        self.set_uniform(name, UniformValue::Float(value));
    }

    fn set_int(&mut self, name: &str, value: i32) {
        self.set_uniform(name, UniformValue::Int(value));
    }

    fn set_vec3(&mut self, name: &str, value: Vector3<f32>) {
        self.set_uniform(name, UniformValue::Vec3(value));
    }

    fn set_mat4(&mut self, name: &str, value: Matrix4<f32>) {
        self.set_uniform(name, UniformValue::Mat4(value));
    }
}

/// A shader program stand-in that records every uniform write in order.
///
/// Backs the lighting tests and doubles as a debugging sink for inspecting
/// exactly what a frame would push to the GPU.
#[derive(Debug, Default)]
pub struct UniformRecorder {
    pub writes: Vec<(String, UniformValue)>,
}

impl UniformRecorder {
    pub fn new() -> UniformRecorder {
        UniformRecorder::default()
    }

    /// Looks up the most recent write under the given name.
    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.writes
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn names(&self) -> Vec<&str> {
        self.writes.iter().map(|(n, _)| n.as_str()).collect()
    }
}

impl ShaderProgram for UniformRecorder {
    fn activate(&mut self) {}

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.writes.push((name.to_string(), value));
    }
}

/// The full uniform vocabulary a lit-surface program must declare for a scene
/// with `point_count` point lights, in upload order.
///
/// Shared by the aggregator's tests and by backends that want to verify at
/// startup that every protocol name resolves to a real shader input.
pub fn lighting_uniform_names(point_count: usize) -> Vec<String> {
    assert!(point_count <= MAX_POINT_LIGHTS);

    let mut names = vec![
        "dir_light.direction".to_string(),
        "dir_light.ambient".to_string(),
        "dir_light.diffuse".to_string(),
        "dir_light.specular".to_string(),
    ];

    for i in 0..point_count {
        for field in [
            "position",
            "ambient",
            "diffuse",
            "specular",
            "constant",
            "linear",
            "quadratic",
        ] {
            names.push(format!("point_lights[{}].{}", i, field));
        }
    }

    for field in [
        "position",
        "direction",
        "inner_cutoff",
        "outer_cutoff",
        "ambient",
        "diffuse",
        "specular",
        "constant",
        "linear",
        "quadratic",
    ] {
        names.push(format!("spotlight.{}", field));
    }

    names
}
