use std::path::{Path, PathBuf};

use log::{error, info};
use thiserror::Error;

use crate::render::{
    backend::RenderBackend,
    mesh::{Texture, TextureKind},
};

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to load texture at {path}: {source}")]
    LoadError {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// Decodes image files and uploads them to the backend, deduplicating by
/// path.
///
/// The dedup is a linear scan against everything loaded so far, which is
/// O(n) per lookup. Fine for tutorial-sized asset counts; revisit before
/// loading models with hundreds of textures.
#[derive(Debug, Default)]
pub struct TextureCache {
    loaded: Vec<Texture>,
}

impl TextureCache {
    pub fn new() -> TextureCache {
        TextureCache::default()
    }

    pub fn loaded(&self) -> &[Texture] {
        &self.loaded
    }

    /// Returns a texture record for the given path, decoding and uploading
    /// only if the path has not been seen before. A cache hit reuses the
    /// existing GPU allocation under the requested kind.
    pub fn load(
        &mut self,
        path: &Path,
        kind: TextureKind,
        backend: &mut dyn RenderBackend,
    ) -> Result<Texture, TextureError> {
        if let Some(existing) = self.loaded.iter().find(|t| t.path == path) {
            return Ok(Texture {
                id: existing.id,
                kind,
                path: existing.path.clone(),
            });
        }

        info!("Loading texture from {}", path.display());

        let image = image::open(path)
            .map_err(|source| {
                error!("Failed to load texture at {}", path.display());
                TextureError::LoadError {
                    path: path.to_path_buf(),
                    source,
                }
            })?
            .to_rgba8();

        let id = backend.create_texture(image.as_raw(), image.width(), image.height());

        let texture = Texture {
            id,
            kind,
            path: path.to_path_buf(),
        };
        self.loaded.push(texture.clone());

        Ok(texture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockBackend;
    use std::{env, fs};

    fn temp_png(name: &str) -> PathBuf {
        let path = env::temp_dir().join(format!("glowbox-texture-test-{}", name));
        image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 255, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn same_path_allocates_one_gpu_texture() {
        let path = temp_png("dedup.png");
        let mut backend = MockBackend::new();
        let mut cache = TextureCache::new();

        let first = cache.load(&path, TextureKind::Diffuse, &mut backend).unwrap();
        let second = cache
            .load(&path, TextureKind::Specular, &mut backend)
            .unwrap();

        assert_eq!(backend.created_textures, 1);
        assert_eq!(first.id, second.id);
        assert_eq!(second.kind, TextureKind::Specular);
        assert_eq!(cache.loaded().len(), 1);

        fs::remove_file(path).ok();
    }

    #[test]
    fn distinct_paths_allocate_distinct_textures() {
        let a = temp_png("a.png");
        let b = temp_png("b.png");
        let mut backend = MockBackend::new();
        let mut cache = TextureCache::new();

        let ta = cache.load(&a, TextureKind::Diffuse, &mut backend).unwrap();
        let tb = cache.load(&b, TextureKind::Diffuse, &mut backend).unwrap();

        assert_eq!(backend.created_textures, 2);
        assert_ne!(ta.id, tb.id);

        fs::remove_file(a).ok();
        fs::remove_file(b).ok();
    }

    #[test]
    fn missing_file_is_an_error() {
        let mut backend = MockBackend::new();
        let mut cache = TextureCache::new();

        let result = cache.load(
            Path::new("/nonexistent/glowbox.png"),
            TextureKind::Diffuse,
            &mut backend,
        );

        assert!(result.is_err());
        assert_eq!(backend.created_textures, 0);
    }
}
