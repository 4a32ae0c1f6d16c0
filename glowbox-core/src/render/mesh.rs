use std::path::PathBuf;

use bytemuck::{Pod, Zeroable};
use cgmath::{Vector2, Vector3};
use thiserror::Error;

use crate::render::{
    backend::{GeometryHandle, RenderBackend, TextureHandle},
    shader::ShaderProgram,
};

/// Vertex data.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Vertex {
    pub position: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub tex_coords: Vector2<f32>,
}

unsafe impl Pod for Vertex {}
unsafe impl Zeroable for Vertex {}

/// The role a texture plays on a surface, which also fixes its uniform name
/// tag.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub enum TextureKind {
    Diffuse,
    Specular,
}

impl TextureKind {
    pub fn tag(&self) -> &'static str {
        match self {
            TextureKind::Diffuse => "texture_diffuse",
            TextureKind::Specular => "texture_specular",
        }
    }
}

/// A GPU texture reference associated with a mesh. Several meshes may share
/// one handle; the texture cache owns deduplication.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub id: TextureHandle,
    pub kind: TextureKind,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Error)]
pub enum MeshError {
    #[error("mesh drawn or deinitialized before init()")]
    NotInitialized,
    #[error("mesh initialized twice")]
    AlreadyInitialized,
    #[error("mesh used after deinit()")]
    Destroyed,
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum MeshState {
    Uninitialized,
    Initialized(GeometryHandle),
    Destroyed,
}

/// A geometry primitive: static vertex/index data plus associated textures.
///
/// Lifecycle is `Uninitialized -> Initialized -> Destroyed`, driven by
/// `init` / `deinit`. Draw calls outside the `Initialized` state fail with
/// an error instead of touching dangling GPU handles.
#[derive(Debug)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    textures: Vec<Texture>,
    state: MeshState,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>, textures: Vec<Texture>) -> Mesh {
        Mesh {
            vertices,
            indices,
            textures,
            state: MeshState::Uninitialized,
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn textures(&self) -> &[Texture] {
        &self.textures
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, MeshState::Initialized(_))
    }

    /// Uploads this mesh's buffers to the backend.
    pub fn init(&mut self, backend: &mut dyn RenderBackend) -> Result<(), MeshError> {
        match self.state {
            MeshState::Uninitialized => {
                let geometry = backend.create_geometry(&self.vertices, &self.indices);
                self.state = MeshState::Initialized(geometry);
                Ok(())
            }
            MeshState::Initialized(_) => Err(MeshError::AlreadyInitialized),
            MeshState::Destroyed => Err(MeshError::Destroyed),
        }
    }

    /// Binds this mesh's textures and issues the draw call.
    ///
    /// Textures occupy sequential units starting at 0. Each unit index is
    /// published under `material.<tag><n>` where `n` counts textures of the
    /// same kind from 1, and the paired shader source must use exactly
    /// these names.
    pub fn draw(
        &self,
        backend: &mut dyn RenderBackend,
        shader: &mut dyn ShaderProgram,
    ) -> Result<(), MeshError> {
        let geometry = match self.state {
            MeshState::Initialized(geometry) => geometry,
            MeshState::Uninitialized => return Err(MeshError::NotInitialized),
            MeshState::Destroyed => return Err(MeshError::Destroyed),
        };

        let mut diffuse_num = 0;
        let mut specular_num = 0;

        for (unit, texture) in self.textures.iter().enumerate() {
            let num = match texture.kind {
                TextureKind::Diffuse => {
                    diffuse_num += 1;
                    diffuse_num
                }
                TextureKind::Specular => {
                    specular_num += 1;
                    specular_num
                }
            };

            let name = format!("material.{}{}", texture.kind.tag(), num);
            shader.set_int(&name, unit as i32);
            backend.bind_texture(unit as u32, texture.id);
        }

        backend.draw(geometry, self.indices.len() as u32);
        Ok(())
    }

    /// Releases this mesh's GPU buffers. The mesh cannot be reinitialized.
    pub fn deinit(&mut self, backend: &mut dyn RenderBackend) -> Result<(), MeshError> {
        match self.state {
            MeshState::Initialized(geometry) => {
                backend.destroy_geometry(geometry);
                self.state = MeshState::Destroyed;
                Ok(())
            }
            MeshState::Uninitialized => Err(MeshError::NotInitialized),
            MeshState::Destroyed => Err(MeshError::Destroyed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        render::shader::{UniformRecorder, UniformValue},
        testutil::MockBackend,
    };
    use cgmath::{vec2, vec3};

    fn triangle() -> Mesh {
        let vertices = vec![
            Vertex {
                position: vec3(0.0, 0.0, 0.0),
                normal: vec3(0.0, 0.0, 1.0),
                tex_coords: vec2(0.0, 0.0),
            },
            Vertex {
                position: vec3(1.0, 0.0, 0.0),
                normal: vec3(0.0, 0.0, 1.0),
                tex_coords: vec2(1.0, 0.0),
            },
            Vertex {
                position: vec3(0.0, 1.0, 0.0),
                normal: vec3(0.0, 0.0, 1.0),
                tex_coords: vec2(0.0, 1.0),
            },
        ];
        Mesh::new(vertices, vec![0, 1, 2], vec![])
    }

    fn texture(id: u32, kind: TextureKind) -> Texture {
        Texture {
            id: TextureHandle(id),
            kind,
            path: PathBuf::from(format!("tex{}.png", id)),
        }
    }

    #[test]
    fn draw_before_init_fails() {
        let mut backend = MockBackend::new();
        let mut shader = UniformRecorder::new();
        let mesh = triangle();

        assert!(matches!(
            mesh.draw(&mut backend, &mut shader),
            Err(MeshError::NotInitialized)
        ));
        assert!(backend.draws.is_empty());
    }

    #[test]
    fn init_then_draw_issues_draw_call() {
        let mut backend = MockBackend::new();
        let mut shader = UniformRecorder::new();
        let mut mesh = triangle();

        mesh.init(&mut backend).unwrap();
        mesh.draw(&mut backend, &mut shader).unwrap();

        assert_eq!(backend.draws.len(), 1);
        assert_eq!(backend.draws[0].1, 3);
    }

    #[test]
    fn double_init_fails() {
        let mut backend = MockBackend::new();
        let mut mesh = triangle();

        mesh.init(&mut backend).unwrap();
        assert!(matches!(
            mesh.init(&mut backend),
            Err(MeshError::AlreadyInitialized)
        ));
        assert_eq!(backend.created_geometries, 1);
    }

    #[test]
    fn draw_after_deinit_fails_and_geometry_is_released() {
        let mut backend = MockBackend::new();
        let mut shader = UniformRecorder::new();
        let mut mesh = triangle();

        mesh.init(&mut backend).unwrap();
        mesh.deinit(&mut backend).unwrap();

        assert_eq!(backend.destroyed_geometries, 1);
        assert!(matches!(
            mesh.draw(&mut backend, &mut shader),
            Err(MeshError::Destroyed)
        ));
        assert!(matches!(
            mesh.deinit(&mut backend),
            Err(MeshError::Destroyed)
        ));
    }

    #[test]
    fn texture_units_and_names_follow_protocol() {
        let mut backend = MockBackend::new();
        let mut shader = UniformRecorder::new();

        let mut mesh = Mesh::new(
            triangle().vertices().to_vec(),
            vec![0, 1, 2],
            vec![
                texture(10, TextureKind::Diffuse),
                texture(11, TextureKind::Diffuse),
                texture(12, TextureKind::Specular),
            ],
        );
        mesh.init(&mut backend).unwrap();
        mesh.draw(&mut backend, &mut shader).unwrap();

        assert_eq!(
            shader.get("material.texture_diffuse1"),
            Some(&UniformValue::Int(0))
        );
        assert_eq!(
            shader.get("material.texture_diffuse2"),
            Some(&UniformValue::Int(1))
        );
        assert_eq!(
            shader.get("material.texture_specular1"),
            Some(&UniformValue::Int(2))
        );
        assert_eq!(
            backend.bound_textures,
            vec![
                (0, TextureHandle(10)),
                (1, TextureHandle(11)),
                (2, TextureHandle(12)),
            ]
        );
    }
}
