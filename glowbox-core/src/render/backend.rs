use crate::render::mesh::Vertex;

/// Identifies a vertex/index buffer pair owned by the backend.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct GeometryHandle(pub u32);

/// Identifies a GPU texture owned by the backend.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct TextureHandle(pub u32);

/// The GPU resource boundary.
///
/// Geometry primitives and the texture cache allocate and use driver
/// resources exclusively through this trait, keeping the scene library free
/// of any particular graphics API. Handles stay valid until explicitly
/// destroyed; the owning objects track their own lifecycle state.
pub trait RenderBackend {
    /// Uploads vertex and index data, returning a handle to the new geometry.
    fn create_geometry(&mut self, vertices: &[Vertex], indices: &[u32]) -> GeometryHandle;

    /// Releases the buffers behind a geometry handle.
    fn destroy_geometry(&mut self, geometry: GeometryHandle);

    /// Uploads an RGBA8 image, returning a handle to the new texture.
    fn create_texture(&mut self, rgba: &[u8], width: u32, height: u32) -> TextureHandle;

    /// Binds a texture to a sequential texture unit for the next draw.
    fn bind_texture(&mut self, unit: u32, texture: TextureHandle);

    /// Issues an indexed draw of the given geometry with the currently
    /// activated shader program and bound textures.
    fn draw(&mut self, geometry: GeometryHandle, index_count: u32);
}
