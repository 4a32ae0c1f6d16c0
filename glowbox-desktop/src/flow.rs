use crate::convert::{FromPhysicalSize, FromWindowEvent};
use futures::executor::block_on;
use glowbox_core::messages::{FlowControl, FlowEvent, FrameSize};
use log::{error, warn};
use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};
use wgpu::{
    Backends, Device, DeviceDescriptor, Instance, InstanceDescriptor, PowerPreference,
    PresentMode, Queue, RequestAdapterOptions, SurfaceConfiguration, SurfaceError, TextureFormat,
    TextureUsages, TextureView,
};
use winit::{
    dpi::PhysicalSize,
    error::OsError,
    event::{DeviceEvent, Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::{CursorGrabMode, Fullscreen, WindowBuilder},
};

/// Used to manage an application's control flow as well as integration with the
/// window manager.
pub struct Flow<Model: 'static> {
    model_init: Box<dyn Fn(Arc<Device>, Arc<Queue>, FrameSize, TextureFormat) -> Model>,
    event_callback: Option<Box<dyn Fn(&mut Model, FlowEvent) -> FlowControl>>,
    update_callback: Option<Box<dyn Fn(&mut Model, Duration) -> FlowControl>>,
    render_callback: Option<Box<dyn Fn(&mut Model, &TextureView, Duration)>>,

    /// The window's title.
    pub title: String,
    /// Whether the window should be fullscreen.
    pub fullscreen: bool,
    /// The window's width if not fullscreen.
    pub width: u32,
    /// The window's height if not fullscreen.
    pub height: u32,
    /// Whether the window should capture the mouse for camera look.
    pub grab_cursor: bool,
}

impl<Model: 'static> Flow<Model> {
    /// Creates a new Flow designed to handle a specific kind of model.
    ///
    /// This model is instantiated when the Flow is started.
    pub fn new<F: Fn(Arc<Device>, Arc<Queue>, FrameSize, TextureFormat) -> Model + 'static>(
        model_init: F,
    ) -> Flow<Model> {
        Flow {
            model_init: Box::new(model_init),
            event_callback: None,
            update_callback: None,
            render_callback: None,
            title: "".to_string(),
            fullscreen: false,
            width: 1280,
            height: 720,
            grab_cursor: false,
        }
    }

    /// Sets the Flow's window event callback.
    pub fn event<F: Fn(&mut Model, FlowEvent) -> FlowControl + 'static>(
        &mut self,
        event_callback: F,
    ) {
        self.event_callback = Some(Box::new(event_callback));
    }

    /// Sets the Flow's update callback.
    pub fn update<F: Fn(&mut Model, Duration) -> FlowControl + 'static>(
        &mut self,
        update_callback: F,
    ) {
        self.update_callback = Some(Box::new(update_callback));
    }

    /// Sets the Flow's render callback.
    pub fn render<F: Fn(&mut Model, &TextureView, Duration) + 'static>(
        &mut self,
        render_callback: F,
    ) {
        self.render_callback = Some(Box::new(render_callback));
    }

    /// Starts the Flow's event loop.
    pub fn start(self) -> Result<(), FlowStartError> {
        let event_loop = EventLoop::new();
        let mut builder = WindowBuilder::new().with_title(self.title.clone());

        builder = if self.fullscreen {
            builder.with_fullscreen(
                event_loop
                    .available_monitors()
                    .next()
                    .map(|m| Fullscreen::Borderless(Some(m))),
            )
        } else {
            builder.with_inner_size(PhysicalSize::new(self.width, self.height))
        };

        let window = builder.build(&event_loop)?;

        if self.grab_cursor {
            window
                .set_cursor_grab(CursorGrabMode::Confined)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked))
                .ok();
            window.set_cursor_visible(false);
        }

        // setup wgpu
        let window_size = window.inner_size();

        let instance = Instance::new(InstanceDescriptor {
            backends: Backends::PRIMARY,
            dx12_shader_compiler: Default::default(),
        });

        let surface = unsafe { instance.create_surface(&window) }.expect("Error getting surface");

        let adapter = block_on(instance.request_adapter(&RequestAdapterOptions {
            power_preference: PowerPreference::default(),
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        }))
        .expect("Error getting adapter");

        let (device, queue) = block_on(adapter.request_device(
            &DeviceDescriptor {
                label: Some("device"),
                limits: Default::default(),
                features: Default::default(),
            },
            None,
        ))
        .expect("Error getting device");

        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let mut sc_desc = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: TextureFormat::Bgra8UnormSrgb,
            width: window_size.width,
            height: window_size.height,
            present_mode: PresentMode::Fifo,
            alpha_mode: Default::default(),
            view_formats: vec![TextureFormat::Bgra8UnormSrgb],
        };

        surface.configure(&device, &sc_desc);

        // setup model
        let mut model = (self.model_init)(
            device.clone(),
            queue.clone(),
            FrameSize::from_physical_size(window_size),
            sc_desc.format,
        );
        let mut previous_update = SystemTime::now();
        let mut previous_render = SystemTime::now();

        event_loop.run(move |event, _, control| match event {
            Event::WindowEvent { event, window_id } if window_id == window.id() => {
                if let Some(event_callback) = &self.event_callback {
                    match event {
                        WindowEvent::Resized(size) if size.width > 0 && size.height > 0 => {
                            sc_desc.width = size.width;
                            sc_desc.height = size.height;
                            surface.configure(&device, &sc_desc);
                        }
                        WindowEvent::ScaleFactorChanged {
                            ref new_inner_size, ..
                        } => {
                            sc_desc.width = new_inner_size.width;
                            sc_desc.height = new_inner_size.height;
                            surface.configure(&device, &sc_desc);
                        }
                        _ => {}
                    }

                    if event_callback(&mut model, FlowEvent::from_window_event(event))
                        == FlowControl::Exit
                    {
                        *control = ControlFlow::Exit;
                    }
                }
            }
            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta },
                ..
            } => {
                if let Some(event_callback) = &self.event_callback {
                    let motion = FlowEvent::MouseMotion {
                        dx: delta.0 as f32,
                        dy: -delta.1 as f32,
                    };
                    if event_callback(&mut model, motion) == FlowControl::Exit {
                        *control = ControlFlow::Exit;
                    }
                }
            }
            Event::MainEventsCleared => {
                let now = SystemTime::now();
                let delta = now
                    .duration_since(previous_update)
                    .unwrap_or(Duration::ZERO);
                previous_update = now;

                if let Some(update_callback) = &self.update_callback {
                    if update_callback(&mut model, delta) == FlowControl::Exit {
                        *control = ControlFlow::Exit;
                    }
                }

                if *control != ControlFlow::Exit {
                    window.request_redraw();
                }
            }
            Event::RedrawRequested(window_id) if window_id == window.id() => {
                let now = SystemTime::now();
                let delta = now
                    .duration_since(previous_render)
                    .unwrap_or(Duration::ZERO);
                previous_render = now;

                if let Some(render_callback) = &self.render_callback {
                    match surface.get_current_texture() {
                        Ok(frame) => {
                            let view = frame.texture.create_view(&Default::default());

                            render_callback(&mut model, &view, delta);

                            frame.present();
                        }
                        Err(SurfaceError::Lost) | Err(SurfaceError::Outdated) => {
                            surface.configure(&device, &sc_desc);
                        }
                        Err(SurfaceError::OutOfMemory) => {
                            error!("Out of GPU memory! Exiting...");
                            *control = ControlFlow::Exit;
                        }
                        Err(e) => warn!("Skipping frame: {}", e),
                    }
                }
            }
            _ => {}
        });
    }
}

#[derive(Debug)]
pub enum FlowStartError {
    OsError(OsError),
}

impl From<OsError> for FlowStartError {
    fn from(e: OsError) -> Self {
        FlowStartError::OsError(e)
    }
}
