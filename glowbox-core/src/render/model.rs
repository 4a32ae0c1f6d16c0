use std::path::{Path, PathBuf};

use cgmath::{vec2, vec3, Vector2, Vector3};
use log::{info, warn};
use thiserror::Error;

use crate::render::{
    backend::RenderBackend,
    mesh::{Mesh, MeshError, Texture, TextureKind, Vertex},
    shader::ShaderProgram,
    texture::TextureCache,
};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to import scene from {path}: {source}")]
    ImportError {
        path: PathBuf,
        source: tobj::LoadError,
    },
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// A scene file flattened into a list of initialized meshes.
///
/// The actual parsing is delegated to the `tobj` importer; this wrapper
/// only converts the imported buffers into `Mesh`es and resolves material
/// textures against the model's containing directory.
pub struct Model {
    meshes: Vec<Mesh>,
}

impl Model {
    /// Imports a wavefront obj scene and uploads its meshes and textures.
    ///
    /// A texture that fails to load is reported and skipped; the mesh is
    /// still usable, just unlit by that map. A failed import returns an
    /// error and the caller must not attempt to draw the model.
    pub fn load(
        path: &Path,
        backend: &mut dyn RenderBackend,
        textures: &mut TextureCache,
    ) -> Result<Model, ModelError> {
        info!("Importing scene from {}", path.display());

        let (models, materials) =
            tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS).map_err(|source| {
                ModelError::ImportError {
                    path: path.to_path_buf(),
                    source,
                }
            })?;

        let materials = materials.unwrap_or_else(|e| {
            warn!("No materials for {}: {}", path.display(), e);
            Vec::new()
        });

        let directory = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();

        Model::from_parts(models, &materials, &directory, backend, textures)
    }

    fn from_parts(
        models: Vec<tobj::Model>,
        materials: &[tobj::Material],
        directory: &Path,
        backend: &mut dyn RenderBackend,
        textures: &mut TextureCache,
    ) -> Result<Model, ModelError> {
        let mut meshes = Vec::with_capacity(models.len());

        for model in models {
            let mesh_textures = match model.mesh.material_id {
                Some(id) => match materials.get(id) {
                    Some(material) => {
                        material_textures(material, directory, backend, textures)
                    }
                    None => {
                        warn!("Mesh {} references missing material {}", model.name, id);
                        vec![]
                    }
                },
                None => vec![],
            };

            let mut mesh = process_mesh(&model.mesh, mesh_textures);
            mesh.init(backend)?;
            meshes.push(mesh);
        }

        Ok(Model { meshes })
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn draw(
        &self,
        backend: &mut dyn RenderBackend,
        shader: &mut dyn ShaderProgram,
    ) -> Result<(), MeshError> {
        for mesh in &self.meshes {
            mesh.draw(backend, shader)?;
        }
        Ok(())
    }

    pub fn deinit(&mut self, backend: &mut dyn RenderBackend) -> Result<(), MeshError> {
        for mesh in &mut self.meshes {
            mesh.deinit(backend)?;
        }
        Ok(())
    }
}

/// Converts an imported mesh into vertex records. Missing normals default
/// to zero and missing texture coordinates to (0, 0).
fn process_mesh(mesh: &tobj::Mesh, textures: Vec<Texture>) -> Mesh {
    let vertex_count = mesh.positions.len() / 3;
    let mut vertices = Vec::with_capacity(vertex_count);

    for i in 0..vertex_count {
        let position = vec3(
            mesh.positions[i * 3],
            mesh.positions[i * 3 + 1],
            mesh.positions[i * 3 + 2],
        );

        let normal: Vector3<f32> = if mesh.normals.len() >= (i + 1) * 3 {
            vec3(
                mesh.normals[i * 3],
                mesh.normals[i * 3 + 1],
                mesh.normals[i * 3 + 2],
            )
        } else {
            vec3(0.0, 0.0, 0.0)
        };

        let tex_coords: Vector2<f32> = if mesh.texcoords.len() >= (i + 1) * 2 {
            vec2(mesh.texcoords[i * 2], mesh.texcoords[i * 2 + 1])
        } else {
            vec2(0.0, 0.0)
        };

        vertices.push(Vertex {
            position,
            normal,
            tex_coords,
        });
    }

    Mesh::new(vertices, mesh.indices.clone(), textures)
}

fn material_textures(
    material: &tobj::Material,
    directory: &Path,
    backend: &mut dyn RenderBackend,
    textures: &mut TextureCache,
) -> Vec<Texture> {
    let maps = [
        (material.diffuse_texture.as_ref(), TextureKind::Diffuse),
        (material.specular_texture.as_ref(), TextureKind::Specular),
    ];

    let mut loaded = Vec::new();
    for (name, kind) in maps {
        if let Some(name) = name {
            match textures.load(&directory.join(name), kind, backend) {
                Ok(texture) => loaded.push(texture),
                Err(e) => warn!("Skipping {:?} map {}: {}", kind, name, e),
            }
        }
    }
    loaded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{render::shader::UniformRecorder, testutil::MockBackend};
    use std::{env, fs, io::Cursor};

    const TRIANGLE_OBJ: &[u8] = b"o tri
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
f 1 2 3
";

    const TEXTURED_OBJ: &[u8] = b"mtllib cube.mtl
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
usemtl boxy
f 1 2 3
";

    const TEXTURED_MTL: &[u8] = b"newmtl boxy
map_Kd shared.png
map_Ks shared.png
";

    fn import(obj: &[u8], mtl: &'static [u8]) -> (Vec<tobj::Model>, Vec<tobj::Material>) {
        let (models, materials) =
            tobj::load_obj_buf(&mut Cursor::new(obj), &tobj::GPU_LOAD_OPTIONS, |_p| {
                tobj::load_mtl_buf(&mut Cursor::new(mtl))
            })
            .unwrap();
        (models, materials.unwrap())
    }

    #[test]
    fn positions_only_mesh_gets_default_attributes() {
        let (models, _) = import(TRIANGLE_OBJ, b"");
        let mesh = process_mesh(&models[0].mesh, vec![]);

        assert_eq!(mesh.vertices().len(), 3);
        assert_eq!(mesh.indices(), &[0, 1, 2]);
        for vertex in mesh.vertices() {
            assert_eq!(vertex.normal, vec3(0.0, 0.0, 0.0));
            assert_eq!(vertex.tex_coords, vec2(0.0, 0.0));
        }
        assert_eq!(mesh.vertices()[1].position, vec3(1.0, 0.0, 0.0));
    }

    #[test]
    fn shared_texture_path_is_deduplicated() {
        let dir = env::temp_dir().join("glowbox-model-test");
        fs::create_dir_all(&dir).unwrap();
        image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 255, 0, 255]))
            .save(dir.join("shared.png"))
            .unwrap();

        let (models, materials) = import(TEXTURED_OBJ, TEXTURED_MTL);
        let mut backend = MockBackend::new();
        let mut cache = TextureCache::new();

        let model =
            Model::from_parts(models, &materials, &dir, &mut backend, &mut cache).unwrap();

        assert_eq!(backend.created_textures, 1);
        let textures = model.meshes()[0].textures();
        assert_eq!(textures.len(), 2);
        assert_eq!(textures[0].id, textures[1].id);
        assert_eq!(textures[0].kind, TextureKind::Diffuse);
        assert_eq!(textures[1].kind, TextureKind::Specular);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn loaded_meshes_are_initialized_and_drawable() {
        let (models, materials) = import(TRIANGLE_OBJ, b"");
        let mut backend = MockBackend::new();
        let mut cache = TextureCache::new();

        let model = Model::from_parts(
            models,
            &materials,
            Path::new("."),
            &mut backend,
            &mut cache,
        )
        .unwrap();

        assert_eq!(backend.created_geometries, 1);

        let mut shader = UniformRecorder::new();
        model.draw(&mut backend, &mut shader).unwrap();
        assert_eq!(backend.draws.len(), 1);
    }

    #[test]
    fn import_failure_is_reported() {
        let mut backend = MockBackend::new();
        let mut cache = TextureCache::new();
        let result = Model::load(
            Path::new("/nonexistent/scene.obj"),
            &mut backend,
            &mut cache,
        );
        assert!(matches!(result, Err(ModelError::ImportError { .. })));
    }
}
