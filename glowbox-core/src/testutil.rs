//! Test doubles shared by the unit tests.

use crate::render::{
    backend::{GeometryHandle, RenderBackend, TextureHandle},
    mesh::Vertex,
};

/// Records every backend call without touching a GPU.
#[derive(Debug, Default)]
pub struct MockBackend {
    pub created_geometries: u32,
    pub destroyed_geometries: u32,
    pub created_textures: u32,
    pub bound_textures: Vec<(u32, TextureHandle)>,
    pub draws: Vec<(GeometryHandle, u32)>,
}

impl MockBackend {
    pub fn new() -> MockBackend {
        MockBackend::default()
    }
}

impl RenderBackend for MockBackend {
    fn create_geometry(&mut self, _vertices: &[Vertex], _indices: &[u32]) -> GeometryHandle {
        let handle = GeometryHandle(self.created_geometries);
        self.created_geometries += 1;
        handle
    }

    fn destroy_geometry(&mut self, _geometry: GeometryHandle) {
        self.destroyed_geometries += 1;
    }

    fn create_texture(&mut self, _rgba: &[u8], _width: u32, _height: u32) -> TextureHandle {
        let handle = TextureHandle(self.created_textures);
        self.created_textures += 1;
        handle
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.bound_textures.push((unit, texture));
    }

    fn draw(&mut self, geometry: GeometryHandle, index_count: u32) {
        self.draws.push((geometry, index_count));
    }
}
