use std::{
    cell::Cell,
    path::PathBuf,
    rc::Rc,
    sync::Arc,
    time::Duration,
};

use glowbox_core::{
    messages::{FlowControl, FlowEvent, FrameSize},
    Scene,
};
use log::error;
use wgpu::{Device, Queue, TextureFormat, TextureView};

use crate::render::{
    backend::WgpuBackend,
    program::{verify_protocol_coverage, MarkerProgram, PhongProgram, ProgramKind},
};

/// Ties the scene to the wgpu backend and the two shader programs.
pub struct GlowboxApp {
    scene: Scene,
    backend: WgpuBackend,
    phong: PhongProgram,
    marker: MarkerProgram,
}

impl GlowboxApp {
    pub fn new(
        device: Arc<Device>,
        queue: Arc<Queue>,
        size: FrameSize,
        format: TextureFormat,
        model_path: Option<PathBuf>,
    ) -> GlowboxApp {
        let active = Rc::new(Cell::new(ProgramKind::Phong));
        let phong = PhongProgram::new(active.clone());
        let marker = MarkerProgram::new(active.clone());
        let mut backend = WgpuBackend::new(
            device,
            queue,
            size,
            format,
            active,
            phong.state(),
            marker.state(),
        );

        if cfg!(debug_assertions) {
            verify_protocol_coverage();
        }

        let mut scene = Scene::new(size);
        scene
            .init(&mut backend)
            .expect("built-in geometry failed to upload");

        if let Some(path) = model_path {
            if let Err(e) = scene.load_model(&path, &mut backend) {
                error!("Could not load {}: {}", path.display(), e);
            }
        }

        GlowboxApp {
            scene,
            backend,
            phong,
            marker,
        }
    }

    pub fn event(&mut self, event: FlowEvent) -> FlowControl {
        match event {
            FlowEvent::Resized(size) => self.backend.resize(size),
            FlowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                self.backend.resize(new_inner_size)
            }
            _ => {}
        }

        self.scene.event(event)
    }

    pub fn update(&mut self, delta: Duration) -> FlowControl {
        self.scene.update(delta);
        FlowControl::None
    }

    pub fn render(&mut self, view: &TextureView, _delta: Duration) {
        if let Err(e) = self
            .scene
            .render(&mut self.backend, &mut self.phong, &mut self.marker)
        {
            error!("Dropping frame: {}", e);
            return;
        }

        self.backend.submit(view);
    }
}
