/// Describes the size of a texture or window frame.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Describes whether a key was pressed or released.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Describes the key codes important to the scene.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub enum KeyCode {
    W,
    A,
    S,
    D,
    /// Dumps the camera pose to the log.
    Space,
    /// Movement speed modifier.
    LShift,
    Escape,
    Other,
}

/// Describes a keyboard input event.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub struct KeyboardEvent {
    pub state: KeyState,
    pub virtual_keycode: Option<KeyCode>,
}

/// Used to communicate application events to the scene.
#[derive(Debug, Copy, Clone, PartialOrd, PartialEq)]
pub enum FlowEvent {
    Resized(FrameSize),
    CloseRequested,
    KeyboardInput {
        input: KeyboardEvent,
        is_synthetic: bool,
    },
    /// Relative mouse motion in counts; positive `dy` looks up.
    MouseMotion {
        dx: f32,
        dy: f32,
    },
    /// Vertical scroll in lines; positive zooms in.
    Scroll {
        delta: f32,
    },
    ScaleFactorChanged {
        scale_factor: f64,
        new_inner_size: FrameSize,
    },
    Other,
}

/// Used by the scene for communicating requests for controlling the flow of
/// the application.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
pub enum FlowControl {
    Exit,
    None,
}
