use cgmath::{Angle, Deg, InnerSpace, Vector3};
use log::error;
use thiserror::Error;

use crate::render::{
    camera::FrameContext,
    shader::ShaderProgram,
};

/// Size of the point light array declared by lit-surface shaders. Pushing
/// more lights than this would address past the end of the GPU-side array,
/// so the scene aggregate refuses to grow beyond it.
pub const MAX_POINT_LIGHTS: usize = 4;

/// Flat ambient level uploaded for every point light, independent of hue.
pub const POINT_AMBIENT_INTENSITY: f32 = 0.05;
/// Multiplier applied to a point light's base color for the diffuse term.
pub const POINT_DIFFUSE_INTENSITY: f32 = 0.5;
/// Multiplier applied to a point light's base color for the specular term.
pub const POINT_SPECULAR_INTENSITY: f32 = 1.0;

#[derive(Debug, Clone, Error)]
pub enum LightingError {
    #[error("too many point lights: {count} requested, shader array holds {max}")]
    TooManyPointLights { count: usize, max: usize },
}

/// A scene-wide light shining along a fixed direction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DirectionalLight {
    direction: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
}

impl DirectionalLight {
    pub fn new(
        direction: Vector3<f32>,
        ambient: Vector3<f32>,
        diffuse: Vector3<f32>,
        specular: Vector3<f32>,
    ) -> DirectionalLight {
        DirectionalLight {
            direction: direction.normalize(),
            ambient,
            diffuse,
            specular,
        }
    }

    pub fn direction(&self) -> Vector3<f32> {
        self.direction
    }
}

/// Distance falloff coefficients for positional lights.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for Attenuation {
    fn default() -> Attenuation {
        Attenuation {
            constant: 1.0,
            linear: 0.07,
            quadratic: 0.017,
        }
    }
}

/// A light radiating from a world-space point.
///
/// Color selects the hue of the diffuse and specular terms; the ambient
/// term is a flat gray fixed by the module's intensity constants at upload
/// time. `scale_factor` only affects how large the light's marker cube is
/// drawn.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointLight {
    pub position: Vector3<f32>,
    pub color: Vector3<f32>,
    pub attenuation: Attenuation,
    pub scale_factor: f32,
}

impl PointLight {
    pub fn new(position: Vector3<f32>, color: Vector3<f32>, scale_factor: f32) -> PointLight {
        PointLight {
            position,
            color,
            attenuation: Attenuation::default(),
            scale_factor,
        }
    }
}

/// A cone light that tracks the viewer.
///
/// Position and direction are deliberately absent: the spotlight is defined
/// as sitting wherever the camera is, so its pose is taken from the frame
/// context at upload time. Cutoff angles are half-angles in degrees; callers
/// keep `inner_cutoff <= outer_cutoff` for a sane cone edge.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Spotlight {
    pub inner_cutoff: f32,
    pub outer_cutoff: f32,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub attenuation: Attenuation,
}

/// Aggregates every light contributing to a frame and pushes the canonical
/// named-uniform block to a shader program.
#[derive(Debug, Clone)]
pub struct SceneLighting {
    pub dir: Option<DirectionalLight>,
    points: Vec<PointLight>,
    pub spot: Option<Spotlight>,
}

impl SceneLighting {
    pub fn new(
        dir: Option<DirectionalLight>,
        points: Vec<PointLight>,
        spot: Option<Spotlight>,
    ) -> Result<SceneLighting, LightingError> {
        if points.len() > MAX_POINT_LIGHTS {
            return Err(LightingError::TooManyPointLights {
                count: points.len(),
                max: MAX_POINT_LIGHTS,
            });
        }

        Ok(SceneLighting { dir, points, spot })
    }

    pub fn add_point_light(&mut self, light: PointLight) -> Result<(), LightingError> {
        if self.points.len() == MAX_POINT_LIGHTS {
            return Err(LightingError::TooManyPointLights {
                count: self.points.len() + 1,
                max: MAX_POINT_LIGHTS,
            });
        }

        self.points.push(light);
        Ok(())
    }

    pub fn points(&self) -> &[PointLight] {
        &self.points
    }

    /// Uploads every light's contribution as named uniforms.
    ///
    /// Writes the directional light (4 values), then each point light in
    /// index order (7 values each), then the spotlight (10 values). The
    /// order is fixed for debuggability; the names are independent. A
    /// missing directional light or spotlight is reported and skipped
    /// rather than uploaded as zeroes.
    pub fn upload(&self, shader: &mut dyn ShaderProgram, frame: &FrameContext) {
        match &self.dir {
            Some(dir) => {
                shader.set_vec3("dir_light.direction", dir.direction());
                shader.set_vec3("dir_light.ambient", dir.ambient);
                shader.set_vec3("dir_light.diffuse", dir.diffuse);
                shader.set_vec3("dir_light.specular", dir.specular);
            }
            None => error!("SceneLighting::upload: no directional light, skipping"),
        }

        for (i, point) in self.points.iter().enumerate() {
            let prefix = format!("point_lights[{}].", i);

            // Ambient is a flat gray; only diffuse and specular take the hue.
            let ambient = POINT_AMBIENT_INTENSITY;

            shader.set_vec3(&format!("{}position", prefix), point.position);
            shader.set_vec3(
                &format!("{}ambient", prefix),
                Vector3::new(ambient, ambient, ambient),
            );
            shader.set_vec3(
                &format!("{}diffuse", prefix),
                point.color * POINT_DIFFUSE_INTENSITY,
            );
            shader.set_vec3(
                &format!("{}specular", prefix),
                point.color * POINT_SPECULAR_INTENSITY,
            );
            shader.set_float(&format!("{}constant", prefix), point.attenuation.constant);
            shader.set_float(&format!("{}linear", prefix), point.attenuation.linear);
            shader.set_float(&format!("{}quadratic", prefix), point.attenuation.quadratic);
        }

        match &self.spot {
            Some(spot) => {
                // The spotlight lives at the viewer.
                shader.set_vec3("spotlight.position", frame.view_pos);
                shader.set_vec3("spotlight.direction", frame.view_dir);
                shader.set_float("spotlight.inner_cutoff", Deg(spot.inner_cutoff).cos());
                shader.set_float("spotlight.outer_cutoff", Deg(spot.outer_cutoff).cos());
                shader.set_vec3("spotlight.ambient", spot.ambient);
                shader.set_vec3("spotlight.diffuse", spot.diffuse);
                shader.set_vec3("spotlight.specular", spot.specular);
                shader.set_float("spotlight.constant", spot.attenuation.constant);
                shader.set_float("spotlight.linear", spot.attenuation.linear);
                shader.set_float("spotlight.quadratic", spot.attenuation.quadratic);
            }
            None => error!("SceneLighting::upload: no spotlight, skipping"),
        }
    }
}

/// Constants describing the surface receiving the lighting. These travel
/// through the same named-uniform call as the lights for convenience, but
/// are a property of the drawn object.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Material {
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Material {
        Material { shininess: 32.0 }
    }
}

impl Material {
    pub fn upload(&self, shader: &mut dyn ShaderProgram) {
        shader.set_float("material.shininess", self.shininess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::shader::{lighting_uniform_names, UniformRecorder, UniformValue};
    use cgmath::vec3;

    fn directional() -> DirectionalLight {
        DirectionalLight::new(
            vec3(0.0, -1.0, 0.0),
            vec3(0.2, 0.2, 0.2),
            vec3(0.5, 0.5, 0.5),
            vec3(1.0, 1.0, 1.0),
        )
    }

    fn spotlight() -> Spotlight {
        Spotlight {
            inner_cutoff: 12.5,
            outer_cutoff: 17.5,
            ambient: vec3(0.0, 0.0, 0.0),
            diffuse: vec3(0.5, 0.5, 0.5),
            specular: vec3(1.0, 1.0, 1.0),
            attenuation: Attenuation::default(),
        }
    }

    fn frame() -> FrameContext {
        FrameContext {
            view_pos: vec3(3.0, 1.4, 6.0),
            view_dir: vec3(0.0, 0.0, -1.0),
        }
    }

    fn full_lighting(point_count: usize) -> SceneLighting {
        let points = (0..point_count)
            .map(|i| PointLight::new(vec3(i as f32, 0.0, 0.0), vec3(1.0, 0.0, 0.0), 0.2))
            .collect();
        SceneLighting::new(Some(directional()), points, Some(spotlight())).unwrap()
    }

    #[test]
    fn write_count_is_exact() {
        for n in 0..=MAX_POINT_LIGHTS {
            let mut recorder = UniformRecorder::new();
            full_lighting(n).upload(&mut recorder, &frame());
            assert_eq!(recorder.writes.len(), 4 + 7 * n + 10, "n = {}", n);
        }
    }

    #[test]
    fn upload_matches_protocol_vocabulary_in_order() {
        let mut recorder = UniformRecorder::new();
        full_lighting(2).upload(&mut recorder, &frame());
        let names: Vec<String> = recorder.names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, lighting_uniform_names(2));
    }

    #[test]
    fn point_light_color_scaled_by_fixed_intensities() {
        let color = vec3(0.3, 0.6, 0.9);
        let lighting = SceneLighting::new(
            Some(directional()),
            vec![PointLight::new(vec3(0.0, 0.0, 0.0), color, 1.0)],
            Some(spotlight()),
        )
        .unwrap();

        let mut recorder = UniformRecorder::new();
        lighting.upload(&mut recorder, &frame());

        assert_eq!(
            recorder.get("point_lights[0].ambient"),
            Some(&UniformValue::Vec3(vec3(0.05, 0.05, 0.05)))
        );
        assert_eq!(
            recorder.get("point_lights[0].diffuse"),
            Some(&UniformValue::Vec3(color * 0.5))
        );
        assert_eq!(
            recorder.get("point_lights[0].specular"),
            Some(&UniformValue::Vec3(color * 1.0))
        );
    }

    #[test]
    fn point_light_ambient_ignores_hue() {
        let lighting = SceneLighting::new(
            None,
            vec![PointLight::new(
                vec3(0.0, 0.0, 0.0),
                vec3(1.0, 0.0, 0.0),
                1.0,
            )],
            None,
        )
        .unwrap();

        let mut recorder = UniformRecorder::new();
        lighting.upload(&mut recorder, &frame());

        // A pure red light still contributes gray ambient.
        assert_eq!(
            recorder.get("point_lights[0].ambient"),
            Some(&UniformValue::Vec3(vec3(0.05, 0.05, 0.05)))
        );
    }

    #[test]
    fn spotlight_cutoffs_uploaded_as_cosines() {
        let mut recorder = UniformRecorder::new();
        full_lighting(0).upload(&mut recorder, &frame());

        let inner = match recorder.get("spotlight.inner_cutoff") {
            Some(&UniformValue::Float(v)) => v,
            other => panic!("unexpected inner cutoff: {:?}", other),
        };
        let outer = match recorder.get("spotlight.outer_cutoff") {
            Some(&UniformValue::Float(v)) => v,
            other => panic!("unexpected outer cutoff: {:?}", other),
        };

        assert!((inner - 0.9763).abs() < 1e-3);
        assert!((outer - 0.9537).abs() < 1e-3);
    }

    #[test]
    fn spotlight_pose_comes_from_frame_context() {
        let mut recorder = UniformRecorder::new();
        let frame = frame();
        full_lighting(0).upload(&mut recorder, &frame);

        assert_eq!(
            recorder.get("spotlight.position"),
            Some(&UniformValue::Vec3(frame.view_pos))
        );
        assert_eq!(
            recorder.get("spotlight.direction"),
            Some(&UniformValue::Vec3(frame.view_dir))
        );
    }

    #[test]
    fn missing_lights_are_skipped_not_zeroed() {
        let lighting = SceneLighting::new(None, vec![], None).unwrap();
        let mut recorder = UniformRecorder::new();
        lighting.upload(&mut recorder, &frame());
        assert!(recorder.writes.is_empty());
    }

    #[test]
    fn point_light_capacity_is_enforced() {
        let too_many = (0..MAX_POINT_LIGHTS + 1)
            .map(|_| PointLight::new(vec3(0.0, 0.0, 0.0), vec3(1.0, 1.0, 1.0), 1.0))
            .collect();
        assert!(SceneLighting::new(None, too_many, None).is_err());

        let mut lighting = full_lighting(MAX_POINT_LIGHTS);
        let overflow =
            lighting.add_point_light(PointLight::new(vec3(0.0, 0.0, 0.0), vec3(1.0, 1.0, 1.0), 1.0));
        assert!(overflow.is_err());
        assert_eq!(lighting.points().len(), MAX_POINT_LIGHTS);
    }

    #[test]
    fn directional_light_direction_is_normalized() {
        let dir = DirectionalLight::new(
            vec3(0.0, -2.0, 0.0),
            vec3(0.1, 0.1, 0.1),
            vec3(0.1, 0.1, 0.1),
            vec3(0.1, 0.1, 0.1),
        );
        assert!((dir.direction().magnitude() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn material_upload_writes_shininess() {
        let mut recorder = UniformRecorder::new();
        Material::default().upload(&mut recorder);
        assert_eq!(
            recorder.get("material.shininess"),
            Some(&UniformValue::Float(32.0))
        );
    }
}
