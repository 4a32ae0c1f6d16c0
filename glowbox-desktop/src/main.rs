use std::{env, path::PathBuf};

use crate::{app::GlowboxApp, flow::Flow};

mod app;
mod convert;
mod flow;
mod render;

fn main() {
    env_logger::init();

    let model_path = env::args().nth(1).map(PathBuf::from);

    let mut flow = Flow::new(move |device, queue, size, format| {
        GlowboxApp::new(device, queue, size, format, model_path.clone())
    });
    flow.event(GlowboxApp::event);
    flow.update(GlowboxApp::update);
    flow.render(GlowboxApp::render);
    flow.title = "Glowbox".to_string();
    flow.grab_cursor = true;

    flow.start().unwrap();
}
