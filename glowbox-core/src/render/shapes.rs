use cgmath::{vec2, vec3};

use crate::render::mesh::{Mesh, Texture, Vertex};

// Interleaved position/normal/uv data for the unit cube, one face per block.
#[rustfmt::skip]
const CUBE_VERTICES: [f32; 288] = [
    // positions          // normals           // uvs
    -0.5, -0.5, -0.5,     0.0,  0.0, -1.0,     0.0, 0.0,
     0.5, -0.5, -0.5,     0.0,  0.0, -1.0,     1.0, 0.0,
     0.5,  0.5, -0.5,     0.0,  0.0, -1.0,     1.0, 1.0,
     0.5,  0.5, -0.5,     0.0,  0.0, -1.0,     1.0, 1.0,
    -0.5,  0.5, -0.5,     0.0,  0.0, -1.0,     0.0, 1.0,
    -0.5, -0.5, -0.5,     0.0,  0.0, -1.0,     0.0, 0.0,

    -0.5, -0.5,  0.5,     0.0,  0.0,  1.0,     0.0, 0.0,
     0.5, -0.5,  0.5,     0.0,  0.0,  1.0,     1.0, 0.0,
     0.5,  0.5,  0.5,     0.0,  0.0,  1.0,     1.0, 1.0,
     0.5,  0.5,  0.5,     0.0,  0.0,  1.0,     1.0, 1.0,
    -0.5,  0.5,  0.5,     0.0,  0.0,  1.0,     0.0, 1.0,
    -0.5, -0.5,  0.5,     0.0,  0.0,  1.0,     0.0, 0.0,

    -0.5,  0.5,  0.5,    -1.0,  0.0,  0.0,     1.0, 0.0,
    -0.5,  0.5, -0.5,    -1.0,  0.0,  0.0,     1.0, 1.0,
    -0.5, -0.5, -0.5,    -1.0,  0.0,  0.0,     0.0, 1.0,
    -0.5, -0.5, -0.5,    -1.0,  0.0,  0.0,     0.0, 1.0,
    -0.5, -0.5,  0.5,    -1.0,  0.0,  0.0,     0.0, 0.0,
    -0.5,  0.5,  0.5,    -1.0,  0.0,  0.0,     1.0, 0.0,

     0.5,  0.5,  0.5,     1.0,  0.0,  0.0,     1.0, 0.0,
     0.5,  0.5, -0.5,     1.0,  0.0,  0.0,     1.0, 1.0,
     0.5, -0.5, -0.5,     1.0,  0.0,  0.0,     0.0, 1.0,
     0.5, -0.5, -0.5,     1.0,  0.0,  0.0,     0.0, 1.0,
     0.5, -0.5,  0.5,     1.0,  0.0,  0.0,     0.0, 0.0,
     0.5,  0.5,  0.5,     1.0,  0.0,  0.0,     1.0, 0.0,

    -0.5, -0.5, -0.5,     0.0, -1.0,  0.0,     0.0, 1.0,
     0.5, -0.5, -0.5,     0.0, -1.0,  0.0,     1.0, 1.0,
     0.5, -0.5,  0.5,     0.0, -1.0,  0.0,     1.0, 0.0,
     0.5, -0.5,  0.5,     0.0, -1.0,  0.0,     1.0, 0.0,
    -0.5, -0.5,  0.5,     0.0, -1.0,  0.0,     0.0, 0.0,
    -0.5, -0.5, -0.5,     0.0, -1.0,  0.0,     0.0, 1.0,

    -0.5,  0.5, -0.5,     0.0,  1.0,  0.0,     0.0, 1.0,
     0.5,  0.5, -0.5,     0.0,  1.0,  0.0,     1.0, 1.0,
     0.5,  0.5,  0.5,     0.0,  1.0,  0.0,     1.0, 0.0,
     0.5,  0.5,  0.5,     0.0,  1.0,  0.0,     1.0, 0.0,
    -0.5,  0.5,  0.5,     0.0,  1.0,  0.0,     0.0, 0.0,
    -0.5,  0.5, -0.5,     0.0,  1.0,  0.0,     0.0, 1.0,
];

fn from_interleaved(data: &[f32]) -> Vec<Vertex> {
    data.chunks_exact(8)
        .map(|v| Vertex {
            position: vec3(v[0], v[1], v[2]),
            normal: vec3(v[3], v[4], v[5]),
            tex_coords: vec2(v[6], v[7]),
        })
        .collect()
}

/// The tutorial unit cube: lit box geometry, also drawn (scaled) as the
/// marker for point lights.
pub fn cube(textures: Vec<Texture>) -> Mesh {
    let vertices = from_interleaved(&CUBE_VERTICES);
    let indices = (0..vertices.len() as u32).collect();
    Mesh::new(vertices, indices, textures)
}

/// A horizontal unit square facing up, with texture coordinates scaled by
/// `uv_scale` so the texture tiles across a large floor.
pub fn floor(uv_scale: f32, textures: Vec<Texture>) -> Mesh {
    let vertices = vec![
        Vertex {
            position: vec3(0.5, 0.0, 0.5),
            normal: vec3(0.0, 1.0, 0.0),
            tex_coords: vec2(uv_scale, 0.0),
        },
        Vertex {
            position: vec3(0.5, 0.0, -0.5),
            normal: vec3(0.0, 1.0, 0.0),
            tex_coords: vec2(uv_scale, uv_scale),
        },
        Vertex {
            position: vec3(-0.5, 0.0, -0.5),
            normal: vec3(0.0, 1.0, 0.0),
            tex_coords: vec2(0.0, uv_scale),
        },
        Vertex {
            position: vec3(-0.5, 0.0, 0.5),
            normal: vec3(0.0, 1.0, 0.0),
            tex_coords: vec2(0.0, 0.0),
        },
    ];
    Mesh::new(vertices, vec![0, 1, 3, 1, 2, 3], textures)
}

/// A full-screen quad in normalized device coordinates.
pub fn quad() -> Mesh {
    let corners = [
        (vec3(-1.0, 1.0, 0.0), vec2(0.0, 1.0)),
        (vec3(-1.0, -1.0, 0.0), vec2(0.0, 0.0)),
        (vec3(1.0, -1.0, 0.0), vec2(1.0, 0.0)),
        (vec3(1.0, 1.0, 0.0), vec2(1.0, 1.0)),
    ];
    let vertices = corners
        .iter()
        .map(|&(position, tex_coords)| Vertex {
            position,
            normal: vec3(0.0, 0.0, 1.0),
            tex_coords,
        })
        .collect();
    Mesh::new(vertices, vec![0, 1, 2, 0, 2, 3], vec![])
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;

    #[test]
    fn cube_has_full_triangle_soup() {
        let cube = cube(vec![]);
        assert_eq!(cube.vertices().len(), 36);
        assert_eq!(cube.indices().len(), 36);
        for vertex in cube.vertices() {
            assert!((vertex.normal.magnitude() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn floor_scales_texture_coordinates() {
        let floor = floor(4.0, vec![]);
        assert_eq!(floor.indices().len(), 6);
        let max_uv = floor
            .vertices()
            .iter()
            .map(|v| v.tex_coords.x.max(v.tex_coords.y))
            .fold(0.0, f32::max);
        assert_eq!(max_uv, 4.0);
        for vertex in floor.vertices() {
            assert_eq!(vertex.normal, cgmath::vec3(0.0, 1.0, 0.0));
        }
    }

    #[test]
    fn quad_covers_clip_space() {
        let quad = quad();
        assert_eq!(quad.vertices().len(), 4);
        assert_eq!(quad.indices().len(), 6);
        assert!(quad.textures().is_empty());
    }
}
