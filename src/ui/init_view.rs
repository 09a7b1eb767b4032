use super::{
    ActiveTheme, AnyElement, AppView, Context, IntoElement, ParentElement, Styled, StyledExt, div,
    v_flex,
};

impl AppView {
    pub(super) fn render_init_view(&mut self, cx: &mut Context<'_, Self>) -> AnyElement {
        let theme = cx.theme();

        v_flex()
            .size_full()
            .items_center()
            .justify_center()
            .gap_2()
            .bg(theme.background)
            .child(
                div()
                    .text_sm()
                    .font_semibold()
                    .text_color(theme.foreground)
                    .child("⟳ Preparing hand tracker..."),
            )
            .child(
                div()
                    .text_xs()
                    .text_color(theme.muted_foreground)
                    .child("Fetching the landmark model on first launch may take a moment"),
            )
            .into_any_element()
    }
}
