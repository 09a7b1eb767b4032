#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod control_loop;
mod detector;
mod dispatch;
mod overlay;
mod pipeline;
mod pointer;
mod types;
mod ui;

use std::thread;

use anyhow::Result;
use crossbeam_channel::bounded;
use dispatch::OutboundEvent;
use gpui::Application;

fn main() -> Result<()> {
    env_logger::init();

    // Outbound half of the realtime voice-session channel. The socket client
    // sits behind this receiver; frame forwarding is fire-and-forget, so
    // nothing upstream ever waits on it.
    let (events_tx, events_rx) = bounded::<OutboundEvent>(32);
    thread::spawn(move || {
        while let Ok(event) = events_rx.recv() {
            match event {
                OutboundEvent::VideoFrame { image } => {
                    log::debug!("outbound video frame ({} bytes)", image.len());
                }
            }
        }
    });

    Application::new()
        .with_assets(gpui_component_assets::Assets)
        .run(move |app| {
            gpui_component::init(app);

            if let Err(err) = ui::launch_ui(app, events_tx) {
                eprintln!("failed to launch ui: {err:?}");
            }
        });

    Ok(())
}
