use std::mem::size_of;

use bytemuck::{Pod, Zeroable};
use cgmath::{Matrix4, Vector3};
use glowbox_core::render::mesh::Vertex;
use wgpu::{BufferAddress, VertexAttribute, VertexBufferLayout, VertexStepMode};

/// Trait implemented by anything that can be put into a vertex buffer.
pub trait VertexData {
    fn desc<'a>() -> VertexBufferLayout<'a>;
}

/// Per-draw instance data.
///
/// Each recorded draw command occupies one slot of the instance buffer and is
/// issued with an instance range selecting exactly that slot. The color
/// channel carries the light marker tint and stays white for lit geometry.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct Instance {
    pub color: Vector3<f32>,
    pub model: Matrix4<f32>,
}

unsafe impl Pod for Instance {}
unsafe impl Zeroable for Instance {}

impl Instance {
    const ATTRS: [VertexAttribute; 5] = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4, 2 => Float32x4, 3 => Float32x4, 4 => Float32x4];
}

impl VertexData for Instance {
    fn desc<'a>() -> VertexBufferLayout<'a> {
        VertexBufferLayout {
            array_stride: size_of::<Instance>() as BufferAddress,
            step_mode: VertexStepMode::Instance,
            attributes: &Instance::ATTRS,
        }
    }
}

const VERTEX_ATTRS: [VertexAttribute; 3] =
    wgpu::vertex_attr_array![5 => Float32x3, 6 => Float32x3, 7 => Float32x2];

impl VertexData for Vertex {
    fn desc<'a>() -> VertexBufferLayout<'a> {
        VertexBufferLayout {
            array_stride: size_of::<Vertex>() as BufferAddress,
            step_mode: VertexStepMode::Vertex,
            attributes: &VERTEX_ATTRS,
        }
    }
}
