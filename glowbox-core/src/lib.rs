pub mod messages;
pub mod render;

#[cfg(test)]
pub(crate) mod testutil;

use std::{path::Path, time::Duration};

use cgmath::{point3, vec3, Deg, InnerSpace, Matrix4, Vector3};
use log::info;
use thiserror::Error;

use crate::{
    messages::{FlowControl, FlowEvent, FrameSize, KeyCode, KeyState, KeyboardEvent},
    render::{
        backend::RenderBackend,
        camera::{Camera, CameraMovement},
        lighting::{
            Attenuation, DirectionalLight, Material, PointLight, SceneLighting, Spotlight,
        },
        mesh::{Mesh, MeshError, Texture, TextureKind},
        model::{Model, ModelError},
        shader::ShaderProgram,
        shapes,
        texture::TextureCache,
    },
};

/// Where the lit boxes sit in the world.
const BOX_POSITIONS: [Vector3<f32>; 10] = [
    Vector3::new(0.0, 0.0, 0.0),
    Vector3::new(2.0, 5.0, -15.0),
    Vector3::new(-1.5, -2.2, -2.5),
    Vector3::new(-3.8, -2.0, -12.3),
    Vector3::new(2.4, -0.4, -3.5),
    Vector3::new(-1.7, 3.0, -7.5),
    Vector3::new(1.3, -2.0, -2.5),
    Vector3::new(1.5, 2.0, -2.5),
    Vector3::new(1.5, 0.2, -1.5),
    Vector3::new(-1.3, 1.0, -1.5),
];

const POINT_LIGHT_POSITIONS: [Vector3<f32>; 4] = [
    Vector3::new(0.7, 0.2, 2.0),
    Vector3::new(2.3, -3.3, -4.0),
    Vector3::new(-4.0, 2.0, -12.0),
    Vector3::new(0.0, 0.0, -3.0),
];

const POINT_LIGHT_COLORS: [Vector3<f32>; 4] = [
    Vector3::new(1.0, 0.0, 0.0),
    Vector3::new(0.0, 1.0, 0.0),
    Vector3::new(0.0, 0.0, 1.0),
    Vector3::new(0.5, 0.5, 0.5),
];

const POINT_LIGHT_SCALE: f32 = 0.2;

const FLOOR_SIZE: f32 = 20.0;
const FLOOR_HEIGHT: f32 = -3.0;
const FLOOR_UV_SCALE: f32 = 4.0;

const SPRINT_MULTIPLIER: f32 = 2.0;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Debug, Default, Copy, Clone)]
struct HeldKeys {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    sprint: bool,
}

/// The demo scene: a floor, a field of lit boxes, the light set from the
/// multiple-lights tutorial, and any models loaded on top.
///
/// Owns all per-frame state explicitly so the render step can be driven by
/// any backend and inspected by tests; nothing here touches a window or a
/// GPU directly.
pub struct Scene {
    pub camera: Camera,
    pub lighting: SceneLighting,
    pub material: Material,
    textures: TextureCache,
    floor: Mesh,
    boxes: Mesh,
    marker: Mesh,
    models: Vec<Model>,
    held: HeldKeys,
}

impl Scene {
    pub fn new(window_size: FrameSize) -> Scene {
        let points = POINT_LIGHT_POSITIONS
            .iter()
            .zip(POINT_LIGHT_COLORS)
            .map(|(&position, color)| PointLight::new(position, color, POINT_LIGHT_SCALE))
            .collect();

        let lighting = SceneLighting::new(
            Some(DirectionalLight::new(
                vec3(0.0, -1.0, 0.0),
                vec3(0.2, 0.2, 0.2),
                vec3(0.5, 0.5, 0.5),
                vec3(1.0, 1.0, 1.0),
            )),
            points,
            Some(Spotlight {
                inner_cutoff: 12.5,
                outer_cutoff: 17.5,
                ambient: vec3(0.0, 0.0, 0.0),
                diffuse: vec3(0.5, 0.5, 0.5),
                specular: vec3(1.0, 1.0, 1.0),
                attenuation: Attenuation::default(),
            }),
        )
        .expect("default light set fits the shader's point light array");

        Scene {
            camera: Camera::new(
                point3(3.02, 1.39, 6.02),
                -107.6,
                -7.8,
                window_size.aspect(),
            ),
            lighting,
            material: Material::default(),
            textures: TextureCache::new(),
            floor: shapes::floor(FLOOR_UV_SCALE, vec![]),
            boxes: shapes::cube(vec![]),
            marker: shapes::cube(vec![]),
            models: vec![],
            held: HeldKeys::default(),
        }
    }

    /// Uploads the built-in geometry and its generated textures.
    pub fn init(&mut self, backend: &mut dyn RenderBackend) -> Result<(), SceneError> {
        let checker = checker_texture(backend);
        let specular = Texture {
            kind: TextureKind::Specular,
            ..checker.clone()
        };

        self.floor = shapes::floor(FLOOR_UV_SCALE, vec![checker.clone(), specular.clone()]);
        self.boxes = shapes::cube(vec![checker, specular]);

        self.floor.init(backend)?;
        self.boxes.init(backend)?;
        self.marker.init(backend)?;
        Ok(())
    }

    /// Imports a model file into the scene.
    pub fn load_model(
        &mut self,
        path: &Path,
        backend: &mut dyn RenderBackend,
    ) -> Result<(), SceneError> {
        let model = Model::load(path, backend, &mut self.textures)?;
        self.models.push(model);
        Ok(())
    }

    pub fn event(&mut self, event: FlowEvent) -> FlowControl {
        match event {
            FlowEvent::CloseRequested => FlowControl::Exit,
            FlowEvent::KeyboardInput { input, .. } => self.keyboard_event(input),
            FlowEvent::MouseMotion { dx, dy } => {
                self.camera.process_mouse(dx, dy);
                FlowControl::None
            }
            FlowEvent::Scroll { delta } => {
                self.camera.process_scroll(delta);
                FlowControl::None
            }
            FlowEvent::Resized(size) => {
                self.camera.aspect = size.aspect();
                FlowControl::None
            }
            FlowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                self.camera.aspect = new_inner_size.aspect();
                FlowControl::None
            }
            _ => FlowControl::None,
        }
    }

    fn keyboard_event(&mut self, input: KeyboardEvent) -> FlowControl {
        let pressed = input.state == KeyState::Pressed;

        match input.virtual_keycode {
            Some(KeyCode::Escape) if pressed => return FlowControl::Exit,
            Some(KeyCode::Space) if pressed => {
                let frame = self.camera.frame_context();
                info!(
                    "camera_pos: {:?}, camera_front: {:?}, yaw: {}, pitch: {}",
                    frame.view_pos,
                    frame.view_dir,
                    self.camera.yaw(),
                    self.camera.pitch(),
                );
            }
            Some(KeyCode::W) => self.held.forward = pressed,
            Some(KeyCode::S) => self.held.backward = pressed,
            Some(KeyCode::A) => self.held.left = pressed,
            Some(KeyCode::D) => self.held.right = pressed,
            Some(KeyCode::LShift) => self.held.sprint = pressed,
            _ => {}
        }

        FlowControl::None
    }

    /// Applies held movement keys to the camera.
    pub fn update(&mut self, delta: Duration) {
        let dt = delta.as_secs_f32();
        let scale = if self.held.sprint {
            SPRINT_MULTIPLIER
        } else {
            1.0
        };

        if self.held.forward {
            self.camera.process_movement(CameraMovement::Forward, dt, scale);
        }
        if self.held.backward {
            self.camera.process_movement(CameraMovement::Backward, dt, scale);
        }
        if self.held.left {
            self.camera.process_movement(CameraMovement::Left, dt, scale);
        }
        if self.held.right {
            self.camera.process_movement(CameraMovement::Right, dt, scale);
        }
    }

    /// Renders one frame: the lit pass over floor, boxes, and models, then
    /// the marker pass over the point lights.
    pub fn render(
        &self,
        backend: &mut dyn RenderBackend,
        lit: &mut dyn ShaderProgram,
        marker: &mut dyn ShaderProgram,
    ) -> Result<(), SceneError> {
        let frame = self.camera.frame_context();
        let view = self.camera.view_matrix();
        let projection = self.camera.projection_matrix();

        lit.activate();
        lit.set_mat4("view", view);
        lit.set_mat4("projection", projection);
        lit.set_vec3("view_pos", frame.view_pos);

        self.lighting.upload(lit, &frame);
        self.material.upload(lit);

        lit.set_mat4(
            "model",
            Matrix4::from_translation(vec3(0.0, FLOOR_HEIGHT, 0.0))
                * Matrix4::from_nonuniform_scale(FLOOR_SIZE, 1.0, FLOOR_SIZE),
        );
        self.floor.draw(backend, lit)?;

        for (i, position) in BOX_POSITIONS.iter().enumerate() {
            let angle = Deg(20.0 * i as f32);
            let model = Matrix4::from_translation(*position)
                * Matrix4::from_axis_angle(vec3(1.0, 0.3, 0.5).normalize(), angle);
            lit.set_mat4("model", model);
            self.boxes.draw(backend, lit)?;
        }

        for model in &self.models {
            lit.set_mat4("model", Matrix4::from_scale(1.0));
            model.draw(backend, lit)?;
        }

        marker.activate();
        marker.set_mat4("view", view);
        marker.set_mat4("projection", projection);

        for light in self.lighting.points() {
            marker.set_mat4(
                "model",
                Matrix4::from_translation(light.position)
                    * Matrix4::from_scale(light.scale_factor),
            );
            marker.set_vec3("light_color", light.color);
            self.marker.draw(backend, marker)?;
        }

        Ok(())
    }
}

/// Generates the built-in checkerboard used by the floor and boxes so the
/// demo needs no image assets on disk.
fn checker_texture(backend: &mut dyn RenderBackend) -> Texture {
    const SIZE: u32 = 64;
    const CELL: u32 = 8;

    let mut rgba = Vec::with_capacity((SIZE * SIZE * 4) as usize);
    for y in 0..SIZE {
        for x in 0..SIZE {
            let dark = ((x / CELL) + (y / CELL)) % 2 == 0;
            let value = if dark { 60 } else { 200 };
            rgba.extend_from_slice(&[value, value, value, 255]);
        }
    }

    Texture {
        id: backend.create_texture(&rgba, SIZE, SIZE),
        kind: TextureKind::Diffuse,
        path: "builtin:checker".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{render::shader::UniformRecorder, testutil::MockBackend};

    fn scene() -> Scene {
        Scene::new(FrameSize {
            width: 800,
            height: 600,
        })
    }

    fn key(code: KeyCode, state: KeyState) -> FlowEvent {
        FlowEvent::KeyboardInput {
            input: KeyboardEvent {
                state,
                virtual_keycode: Some(code),
            },
            is_synthetic: false,
        }
    }

    #[test]
    fn escape_and_close_request_exit() {
        let mut scene = scene();
        assert_eq!(scene.event(FlowEvent::CloseRequested), FlowControl::Exit);
        assert_eq!(
            scene.event(key(KeyCode::Escape, KeyState::Pressed)),
            FlowControl::Exit
        );
        assert_eq!(
            scene.event(key(KeyCode::Escape, KeyState::Released)),
            FlowControl::None
        );
    }

    #[test]
    fn held_movement_key_moves_camera_on_update() {
        let mut scene = scene();
        let before = scene.camera.position;

        scene.event(key(KeyCode::W, KeyState::Pressed));
        scene.update(Duration::from_millis(100));
        let moved = scene.camera.position;
        assert_ne!(moved, before);

        scene.event(key(KeyCode::W, KeyState::Released));
        scene.update(Duration::from_millis(100));
        assert_eq!(scene.camera.position, moved);
    }

    #[test]
    fn scroll_changes_fov() {
        let mut scene = scene();
        let before = scene.camera.fov();
        scene.event(FlowEvent::Scroll { delta: 5.0 });
        assert_eq!(scene.camera.fov(), before - 5.0);
    }

    #[test]
    fn resize_updates_aspect() {
        let mut scene = scene();
        scene.event(FlowEvent::Resized(FrameSize {
            width: 200,
            height: 100,
        }));
        assert_eq!(scene.camera.aspect, 2.0);
    }

    #[test]
    fn render_draws_every_drawable() {
        let mut scene = scene();
        let mut backend = MockBackend::new();
        scene.init(&mut backend).unwrap();

        let mut lit = UniformRecorder::new();
        let mut marker = UniformRecorder::new();
        scene.render(&mut backend, &mut lit, &mut marker).unwrap();

        // Floor + 10 boxes in the lit pass, 4 markers in the marker pass.
        assert_eq!(backend.draws.len(), 1 + BOX_POSITIONS.len() + 4);
        assert!(lit.get("view").is_some());
        assert!(lit.get("projection").is_some());
        assert!(lit.get("view_pos").is_some());
        assert!(lit.get("material.texture_diffuse1").is_some());
        assert!(marker.get("light_color").is_some());
    }

    #[test]
    fn lit_pass_uploads_lights_before_material_before_geometry() {
        let mut scene = scene();
        let mut backend = MockBackend::new();
        scene.init(&mut backend).unwrap();

        let mut lit = UniformRecorder::new();
        let mut marker = UniformRecorder::new();
        scene.render(&mut backend, &mut lit, &mut marker).unwrap();

        let names = lit.names();
        let position = |name: &str| {
            names
                .iter()
                .position(|n| *n == name)
                .unwrap_or_else(|| panic!("{} never written", name))
        };

        let dir = position("dir_light.direction");
        let point = position("point_lights[0].position");
        let spot = position("spotlight.position");
        let material = position("material.shininess");
        let model = position("model");

        assert!(dir < point && point < spot && spot < material && material < model);
    }

    #[test]
    fn render_before_init_fails_loudly() {
        let scene = scene();
        let mut backend = MockBackend::new();
        let mut lit = UniformRecorder::new();
        let mut marker = UniformRecorder::new();

        assert!(scene.render(&mut backend, &mut lit, &mut marker).is_err());
    }
}
