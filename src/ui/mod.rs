use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use gpui::{
    AnyElement, App, AppContext, Context, IntoElement, ObjectFit, ParentElement, Render,
    RenderImage, SharedString, Styled, StyledImage, TitlebarOptions, Window, WindowOptions, div,
    img, px,
};
use gpui::prelude::FluentBuilder;
use gpui_component::{
    ActiveTheme, Root, StyledExt,
    button::{Button, ButtonVariants},
    h_flex, v_flex,
};

use crate::{
    control_loop::{ControlLoop, TickStatus},
    detector::{self, DetectorInitError, OrtLandmarker},
    dispatch::OutboundEvent,
    pipeline::{FrameSource, available_cameras},
    ui::click_router::{ClickRouter, HitRegion, UiAction},
};

mod click_router;
mod init_view;
mod main_view;
mod render_util;

// The control bar is absolutely positioned so its hit regions, which the
// pinch click router tests against, stay truthful.
const BAR_X: f32 = 16.0;
const BAR_Y: f32 = 16.0;
const BUTTON_WIDTH: f32 = 132.0;
const BUTTON_HEIGHT: f32 = 32.0;
const BUTTON_GAP: f32 = 8.0;

const CURSOR_DOT_SIZE: f32 = 12.0;

pub fn launch_ui(app: &mut App, events_tx: Sender<OutboundEvent>) -> gpui::Result<()> {
    let window_options = WindowOptions {
        titlebar: Some(TitlebarOptions {
            title: Some("Handwave".into()),
            ..Default::default()
        }),
        ..Default::default()
    };

    app.open_window(window_options, move |window, app| {
        let view = app.new(|_| AppView::new(events_tx));
        app.new(|cx| Root::new(view, window, cx))
    })?;

    Ok(())
}

enum Screen {
    /// Detector still initializing (model fetch + session build off-thread).
    Initializing,
    Main,
}

struct AppView {
    screen: Screen,
    control: ControlLoop,
    router: ClickRouter,
    detector_rx: Option<Receiver<Result<OrtLandmarker, DetectorInitError>>>,
    detector_error: Option<String>,
    camera_error: Option<String>,
    latest_image: Option<Arc<RenderImage>>,
}

impl AppView {
    fn new(events_tx: Sender<OutboundEvent>) -> Self {
        let router = ClickRouter::default();
        let control = ControlLoop::new(Box::new(router.clone()), events_tx, Instant::now());
        let detector_rx = Some(detector::spawn_initialize(detector::default_model_path()));

        Self {
            screen: Screen::Initializing,
            control,
            router,
            detector_rx,
            detector_error: None,
            camera_error: None,
            latest_image: None,
        }
    }

    /// One poll of the single-shot detector init channel. Failure is reported
    /// once and the pointer feature stays unavailable; nothing retries.
    fn poll_detector_init(&mut self) {
        let Some(rx) = self.detector_rx.as_ref() else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(landmarker)) => {
                self.control.install_detector(Box::new(landmarker));
                self.detector_rx = None;
                self.screen = Screen::Main;
            }
            Ok(Err(err)) => {
                self.detector_error = Some(err.to_string());
                self.detector_rx = None;
                self.screen = Screen::Main;
            }
            Err(crossbeam_channel::TryRecvError::Empty) => {}
            Err(crossbeam_channel::TryRecvError::Disconnected) => {
                self.detector_error = Some("hand tracker initialization aborted".to_string());
                self.detector_rx = None;
                self.screen = Screen::Main;
            }
        }
    }

    fn toggle_video(&mut self) {
        if self.control.is_running() {
            self.control.stop();
            self.latest_image = None;
            return;
        }

        match self.acquire_camera() {
            Ok(source) => {
                self.camera_error = None;
                self.control.start(Box::new(source), Instant::now());
            }
            Err(err) => {
                log::error!("failed to start camera: {err:?}");
                self.camera_error = Some(format!("camera unavailable: {err:#}"));
            }
        }
    }

    fn acquire_camera(&self) -> anyhow::Result<FrameSource> {
        let devices = available_cameras()?;
        let device = devices
            .first()
            .ok_or_else(|| anyhow::anyhow!("no camera detected"))?;
        log::info!("starting camera {}", device.label);
        FrameSource::start(device.index.clone())
    }

    fn apply_action(&mut self, action: UiAction) {
        match action {
            UiAction::ToggleVideo => self.toggle_video(),
            UiAction::ToggleSession => {
                let next = !self.control.session_active();
                self.control.set_session_active(next);
            }
        }
    }

    fn control_bar_regions(&self) -> Vec<HitRegion> {
        vec![
            HitRegion {
                x: BAR_X,
                y: BAR_Y,
                width: BUTTON_WIDTH,
                height: BUTTON_HEIGHT,
                action: UiAction::ToggleVideo,
            },
            HitRegion {
                x: BAR_X + BUTTON_WIDTH + BUTTON_GAP,
                y: BAR_Y,
                width: BUTTON_WIDTH,
                height: BUTTON_HEIGHT,
                action: UiAction::ToggleSession,
            },
        ]
    }

    /// Runs one loop tick and applies whatever the pinch click hit. Called
    /// from render, which re-arms itself via the deferred notify below, so
    /// the loop keeps ticking once per display refresh.
    fn drive_loop(&mut self, window: &Window) {
        if !self.control.is_running() {
            return;
        }

        let viewport = window.viewport_size();
        let display = (f32::from(viewport.width), f32::from(viewport.height));

        self.router.set_regions(self.control_bar_regions());
        let outcome = self.control.tick(Instant::now(), display);
        if outcome.status == TickStatus::Completed {
            if let Some(frame) = outcome.display_frame {
                if let Some(image) = render_util::frame_to_image(frame) {
                    self.latest_image = Some(image);
                }
            }
        }

        for action in self.router.drain_actions() {
            self.apply_action(action);
        }
    }
}

impl Render for AppView {
    fn render(
        &mut self,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) -> impl gpui::IntoElement {
        // Re-arm: one tick per display refresh, cooperatively cancelled by
        // the loop's own disabled check.
        cx.defer_in(window, |_, _, cx| {
            cx.notify();
        });

        match self.screen {
            Screen::Initializing => {
                self.poll_detector_init();
                self.render_init_view(cx)
            }
            Screen::Main => {
                self.drive_loop(window);
                self.render_main(window, cx)
            }
        }
    }
}
