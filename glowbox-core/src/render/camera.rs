use cgmath::{perspective, vec3, Angle, Deg, EuclideanSpace, InnerSpace, Matrix4, Point3, Vector3};

const MIN_PITCH: f32 = -89.0;
const MAX_PITCH: f32 = 89.0;

const MIN_FOV: f32 = 1.0;
const MAX_FOV: f32 = 45.0;

/// Camera state sampled once per frame and handed to the render step.
///
/// Replaces the original's process-wide camera globals so that anything
/// depending on the viewer pose (the spotlight in particular) can be driven
/// and tested without a live window.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameContext {
    /// World-space camera position.
    pub view_pos: Vector3<f32>,
    /// Unit vector the camera is facing along.
    pub view_dir: Vector3<f32>,
}

/// A movement request produced from held keyboard state.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
}

/// First-person fly camera.
pub struct Camera {
    pub position: Point3<f32>,
    pub up: Vector3<f32>,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,

    /// Movement speed in world units per second.
    pub speed: f32,
    /// Degrees of yaw/pitch per mouse count.
    pub sensitivity: f32,

    front: Vector3<f32>,
    yaw: f32,
    pitch: f32,
    fov: f32,
}

impl Camera {
    pub fn new(position: Point3<f32>, yaw: f32, pitch: f32, aspect: f32) -> Camera {
        let mut camera = Camera {
            position,
            up: vec3(0.0, 1.0, 0.0),
            aspect,
            znear: 0.1,
            zfar: 100.0,
            speed: 2.5,
            sensitivity: 0.05,
            front: vec3(0.0, 0.0, -1.0),
            yaw,
            pitch: pitch.clamp(MIN_PITCH, MAX_PITCH),
            fov: MAX_FOV,
        };
        camera.update_front();
        camera
    }

    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Moves the camera for one frame of held input. `speed_scale` carries
    /// the sprint modifier.
    pub fn process_movement(&mut self, movement: CameraMovement, delta: f32, speed_scale: f32) {
        let distance = self.speed * speed_scale * delta;
        match movement {
            CameraMovement::Forward => self.position += self.front * distance,
            CameraMovement::Backward => self.position -= self.front * distance,
            CameraMovement::Left => {
                self.position -= self.front.cross(self.up).normalize() * distance
            }
            CameraMovement::Right => {
                self.position += self.front.cross(self.up).normalize() * distance
            }
        }
    }

    /// Folds a mouse motion delta into the look direction.
    pub fn process_mouse(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch = (self.pitch + dy * self.sensitivity).clamp(MIN_PITCH, MAX_PITCH);
        self.update_front();
    }

    /// Folds a scroll delta into the field of view.
    pub fn process_scroll(&mut self, delta: f32) {
        self.fov = (self.fov - delta).clamp(MIN_FOV, MAX_FOV);
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        perspective(Deg(self.fov), self.aspect, self.znear, self.zfar)
    }

    pub fn frame_context(&self) -> FrameContext {
        FrameContext {
            view_pos: self.position.to_vec(),
            view_dir: self.front,
        }
    }

    fn update_front(&mut self) {
        let yaw = Deg(self.yaw);
        let pitch = Deg(self.pitch);
        self.front = vec3(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::point3;

    fn camera() -> Camera {
        Camera::new(point3(0.0, 0.0, 3.0), -90.0, 0.0, 4.0 / 3.0)
    }

    fn assert_close(actual: Vector3<f32>, expected: Vector3<f32>) {
        assert!(
            (actual - expected).magnitude() < 1e-5,
            "{:?} != {:?}",
            actual,
            expected
        );
    }

    #[test]
    fn yaw_minus_ninety_faces_negative_z() {
        let camera = camera();
        assert_close(camera.front(), vec3(0.0, 0.0, -1.0));
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = camera();
        camera.process_mouse(0.0, 10_000.0);
        assert_eq!(camera.pitch(), 89.0);
        camera.process_mouse(0.0, -100_000.0);
        assert_eq!(camera.pitch(), -89.0);
    }

    #[test]
    fn fov_is_clamped() {
        let mut camera = camera();
        camera.process_scroll(100.0);
        assert_eq!(camera.fov(), 1.0);
        camera.process_scroll(-100.0);
        assert_eq!(camera.fov(), 45.0);
    }

    #[test]
    fn forward_movement_follows_front() {
        let mut camera = camera();
        camera.process_movement(CameraMovement::Forward, 1.0, 1.0);
        assert_close(camera.position.to_vec(), vec3(0.0, 0.0, 0.5));
    }

    #[test]
    fn sprint_scales_movement() {
        let mut camera = camera();
        camera.process_movement(CameraMovement::Backward, 1.0, 2.0);
        assert_close(camera.position.to_vec(), vec3(0.0, 0.0, 8.0));
    }

    #[test]
    fn frame_context_tracks_camera() {
        let camera = camera();
        let frame = camera.frame_context();
        assert_eq!(frame.view_pos, vec3(0.0, 0.0, 3.0));
        assert_eq!(frame.view_dir, camera.front());
    }
}
