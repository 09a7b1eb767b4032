use super::{
    ActiveTheme, AnyElement, AppView, BAR_X, BAR_Y, BUTTON_GAP, BUTTON_HEIGHT, BUTTON_WIDTH,
    Button, ButtonVariants, CURSOR_DOT_SIZE, Context, FluentBuilder, IntoElement, ObjectFit,
    ParentElement, SharedString, Styled, StyledImage, Window, div, h_flex, img, px,
};

impl AppView {
    pub(super) fn render_main(
        &mut self,
        _window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) -> AnyElement {
        let theme = cx.theme();
        let running = self.control.is_running();
        let session_active = self.control.session_active();
        let cursor = self.control.cursor();
        let fps = self.control.fps();

        let frame_view: AnyElement = if let Some(image) = &self.latest_image {
            img(image.clone())
                .size_full()
                .object_fit(ObjectFit::Contain)
                .into_any_element()
        } else {
            div()
                .size_full()
                .flex()
                .items_center()
                .justify_center()
                .text_sm()
                .text_color(theme.muted_foreground)
                .child(if running {
                    "Waiting for camera..."
                } else {
                    "Video is off"
                })
                .into_any_element()
        };

        let control_bar = h_flex()
            .absolute()
            .left(px(BAR_X))
            .top(px(BAR_Y))
            .gap(px(BUTTON_GAP))
            .child(
                Button::new(SharedString::from("toggle-video"))
                    .w(px(BUTTON_WIDTH))
                    .h(px(BUTTON_HEIGHT))
                    .map(|this| if running { this.outline() } else { this.primary() })
                    .label(if running { "Stop video" } else { "Start video" })
                    .on_click(cx.listener(|this, _, _, cx| {
                        this.toggle_video();
                        cx.notify();
                    })),
            )
            .child(
                Button::new(SharedString::from("toggle-session"))
                    .w(px(BUTTON_WIDTH))
                    .h(px(BUTTON_HEIGHT))
                    .map(|this| if session_active { this.primary() } else { this.ghost() })
                    .label(if session_active {
                        "Disconnect"
                    } else {
                        "Connect session"
                    })
                    .on_click(cx.listener(|this, _, _, cx| {
                        let next = !this.control.session_active();
                        this.control.set_session_active(next);
                        cx.notify();
                    })),
            );

        let status_row = h_flex()
            .absolute()
            .left(px(BAR_X))
            .bottom(px(BAR_Y))
            .gap_3()
            .items_center()
            .child(
                div()
                    .text_xs()
                    .text_color(theme.muted_foreground)
                    .child(format!("{fps} fps")),
            )
            .when(session_active, |this| {
                this.child(
                    div()
                        .text_xs()
                        .text_color(theme.accent)
                        .child("session live · forwarding frames"),
                )
            })
            .when_some(self.camera_error.clone(), |this, err| {
                this.child(div().text_xs().text_color(gpui::rgb(0xfca5a5)).child(err))
            })
            .when_some(self.detector_error.clone(), |this, err| {
                this.child(
                    div()
                        .text_xs()
                        .text_color(gpui::rgb(0xfca5a5))
                        .child(format!("pointer unavailable: {err}")),
                )
            });

        let mut root = div()
            .relative()
            .size_full()
            .bg(gpui::rgb(0x0b0f14))
            .child(div().size_full().child(frame_view))
            .child(control_bar)
            .child(status_row);

        // Cursor indicator: last known position persists through detection
        // gaps, so the dot never jumps to a corner mid-track.
        if running && self.control.has_detector() {
            let half = CURSOR_DOT_SIZE / 2.0;
            root = root.child(
                div()
                    .absolute()
                    .left(px(cursor.x - half))
                    .top(px(cursor.y - half))
                    .w(px(CURSOR_DOT_SIZE))
                    .h(px(CURSOR_DOT_SIZE))
                    .rounded_full()
                    .bg(if cursor.is_pinching {
                        gpui::rgba(0xf87171e0)
                    } else {
                        gpui::rgba(0x38bdf8e0)
                    }),
            );
        }

        root.into_any_element()
    }
}
