use std::cell::RefCell;
use std::rc::Rc;

use crate::control_loop::ClickSink;

/// What a synthetic click can actuate in the shell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiAction {
    ToggleVideo,
    ToggleSession,
}

/// An axis-aligned hit-testable region in screen pixels.
#[derive(Clone, Copy, Debug)]
pub struct HitRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub action: UiAction,
}

impl HitRegion {
    fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

#[derive(Debug, Default)]
struct RouterInner {
    regions: Vec<HitRegion>,
    pending: Vec<UiAction>,
}

/// Routes pinch clicks to whatever the view registered at those coordinates.
/// The view re-registers its regions every render and drains triggered
/// actions right after the loop tick; both halves live on the interface
/// thread, hence `Rc`.
#[derive(Clone, Default)]
pub struct ClickRouter {
    inner: Rc<RefCell<RouterInner>>,
}

impl ClickRouter {
    pub fn set_regions(&self, regions: Vec<HitRegion>) {
        self.inner.borrow_mut().regions = regions;
    }

    pub fn drain_actions(&self) -> Vec<UiAction> {
        std::mem::take(&mut self.inner.borrow_mut().pending)
    }

    fn hit_test(&self, x: f32, y: f32) -> Option<UiAction> {
        // Later registrations sit on top.
        self.inner
            .borrow()
            .regions
            .iter()
            .rev()
            .find(|region| region.contains(x, y))
            .map(|region| region.action)
    }
}

impl ClickSink for ClickRouter {
    fn click(&mut self, x: f32, y: f32) {
        match self.hit_test(x, y) {
            Some(action) => {
                log::debug!("pinch click hit {action:?} at ({x:.0}, {y:.0})");
                self.inner.borrow_mut().pending.push(action);
            }
            None => {
                log::debug!("pinch click missed at ({x:.0}, {y:.0})");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(x: f32, y: f32, action: UiAction) -> HitRegion {
        HitRegion {
            x,
            y,
            width: 100.0,
            height: 40.0,
            action,
        }
    }

    #[test]
    fn click_inside_region_queues_action() {
        let mut router = ClickRouter::default();
        router.set_regions(vec![region(10.0, 10.0, UiAction::ToggleVideo)]);

        router.click(50.0, 30.0);
        assert_eq!(router.drain_actions(), vec![UiAction::ToggleVideo]);
        assert!(router.drain_actions().is_empty(), "drain must consume");
    }

    #[test]
    fn click_outside_all_regions_is_ignored() {
        let mut router = ClickRouter::default();
        router.set_regions(vec![region(10.0, 10.0, UiAction::ToggleVideo)]);

        router.click(500.0, 500.0);
        assert!(router.drain_actions().is_empty());
    }

    #[test]
    fn topmost_region_wins_on_overlap() {
        let mut router = ClickRouter::default();
        router.set_regions(vec![
            region(0.0, 0.0, UiAction::ToggleVideo),
            region(0.0, 0.0, UiAction::ToggleSession),
        ]);

        router.click(5.0, 5.0);
        assert_eq!(router.drain_actions(), vec![UiAction::ToggleSession]);
    }

    #[test]
    fn region_bounds_are_half_open() {
        let mut router = ClickRouter::default();
        router.set_regions(vec![region(10.0, 10.0, UiAction::ToggleVideo)]);

        router.click(110.0, 30.0);
        assert!(router.drain_actions().is_empty());

        router.click(10.0, 10.0);
        assert_eq!(router.drain_actions().len(), 1);
    }
}
