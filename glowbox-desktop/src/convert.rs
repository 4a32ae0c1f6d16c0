use glowbox_core::messages::{FlowEvent, FrameSize, KeyCode, KeyState, KeyboardEvent};
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, KeyboardInput, MouseScrollDelta, VirtualKeyCode, WindowEvent},
};

/// Used for converting a physical size into something window-system agnostic.
pub trait FromPhysicalSize {
    fn from_physical_size(size: PhysicalSize<u32>) -> Self;
}

/// Used for converting an element state into something window-system agnostic.
pub trait FromElementState {
    fn from_element_state(state: ElementState) -> Self;
}

/// Used for converting a virtual key code into something window-system
/// agnostic.
pub trait FromVirtualKeyCode {
    fn from_virtual_key_code(code: VirtualKeyCode) -> Self;
}

/// Used for converting a keyboard input into something window-system agnostic.
pub trait FromKeyboardInput {
    fn from_keyboard_input(input: KeyboardInput) -> Self;
}

/// Used for converting a window event into something window-system agnostic.
pub trait FromWindowEvent {
    fn from_window_event(e: WindowEvent) -> Self;
}

impl FromPhysicalSize for FrameSize {
    fn from_physical_size(size: PhysicalSize<u32>) -> Self {
        FrameSize {
            width: size.width,
            height: size.height,
        }
    }
}

impl FromElementState for KeyState {
    fn from_element_state(state: ElementState) -> Self {
        match state {
            ElementState::Pressed => KeyState::Pressed,
            ElementState::Released => KeyState::Released,
        }
    }
}

impl FromVirtualKeyCode for KeyCode {
    fn from_virtual_key_code(code: VirtualKeyCode) -> Self {
        match code {
            VirtualKeyCode::W => KeyCode::W,
            VirtualKeyCode::A => KeyCode::A,
            VirtualKeyCode::S => KeyCode::S,
            VirtualKeyCode::D => KeyCode::D,
            VirtualKeyCode::Space => KeyCode::Space,
            VirtualKeyCode::LShift => KeyCode::LShift,
            VirtualKeyCode::Escape => KeyCode::Escape,
            _ => KeyCode::Other,
        }
    }
}

impl FromKeyboardInput for KeyboardEvent {
    fn from_keyboard_input(input: KeyboardInput) -> Self {
        KeyboardEvent {
            state: KeyState::from_element_state(input.state),
            virtual_keycode: input.virtual_keycode.map(KeyCode::from_virtual_key_code),
        }
    }
}

impl FromWindowEvent for FlowEvent {
    fn from_window_event(e: WindowEvent) -> Self {
        match e {
            WindowEvent::Resized(size) => {
                FlowEvent::Resized(FrameSize::from_physical_size(size))
            }
            WindowEvent::CloseRequested => FlowEvent::CloseRequested,
            WindowEvent::KeyboardInput {
                input,
                is_synthetic,
                ..
            } => FlowEvent::KeyboardInput {
                input: KeyboardEvent::from_keyboard_input(input),
                is_synthetic,
            },
            WindowEvent::MouseWheel { delta, .. } => FlowEvent::Scroll {
                delta: match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 / 20.0,
                },
            },
            WindowEvent::ScaleFactorChanged {
                scale_factor,
                new_inner_size,
            } => FlowEvent::ScaleFactorChanged {
                scale_factor,
                new_inner_size: FrameSize::from_physical_size(*new_inner_size),
            },
            _ => FlowEvent::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_keys_map_to_scene_codes() {
        assert_eq!(KeyCode::from_virtual_key_code(VirtualKeyCode::W), KeyCode::W);
        assert_eq!(
            KeyCode::from_virtual_key_code(VirtualKeyCode::LShift),
            KeyCode::LShift
        );
        assert_eq!(
            KeyCode::from_virtual_key_code(VirtualKeyCode::F1),
            KeyCode::Other
        );
    }
}
