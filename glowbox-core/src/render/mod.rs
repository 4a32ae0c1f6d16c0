pub mod backend;
pub mod camera;
pub mod lighting;
pub mod mesh;
pub mod model;
pub mod shader;
pub mod shapes;
pub mod texture;
