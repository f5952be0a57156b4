use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertPhase {
    /// Waiting for the fade delay.
    Visible,
    /// Opacity is 0; waiting for the removal delay.
    Fading,
    Removed,
    Canceled,
}

#[derive(Debug)]
struct AlertSlot {
    phase: AlertPhase,
    timer: Option<TimerId>,
    /// Inline opacity before the fade, written back on cancel.
    opacity_before_fade: String,
}

/// Handle to one alert's fade-then-remove schedule.
#[derive(Debug, Clone)]
pub struct AlertDismissal {
    node: NodeId,
    slot: Rc<RefCell<AlertSlot>>,
}

impl AlertDismissal {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn phase(&self) -> AlertPhase {
        self.slot.borrow().phase
    }

    pub fn pending_timer(&self) -> Option<TimerId> {
        self.slot.borrow().timer
    }

    /// Stops the schedule. A fading alert gets back the inline opacity it
    /// had before the fade. Returns false once the alert is already removed
    /// or canceled.
    pub fn cancel(&self, page: &mut Page) -> Result<bool> {
        let (phase, timer, opacity) = {
            let slot = self.slot.borrow();
            (slot.phase, slot.timer, slot.opacity_before_fade.clone())
        };
        if matches!(phase, AlertPhase::Removed | AlertPhase::Canceled) {
            return Ok(false);
        }
        if let Some(timer) = timer {
            page.clear_timeout(timer);
        }
        if phase == AlertPhase::Fading {
            page.style_set(self.node, "opacity", &opacity)?;
        }
        {
            let mut slot = self.slot.borrow_mut();
            slot.phase = AlertPhase::Canceled;
            slot.timer = None;
        }
        page.trace_line(format!("[enhance] alert canceled node={}", self.node.0));
        Ok(true)
    }
}

pub(super) fn schedule_all(
    page: &mut Page,
    config: &Rc<EnhanceConfig>,
) -> Result<Vec<AlertDismissal>> {
    let alerts = page.query_selector_all(&config.alert_selector)?;
    let mut dismissals = Vec::with_capacity(alerts.len());
    for node in alerts {
        let slot = Rc::new(RefCell::new(AlertSlot {
            phase: AlertPhase::Visible,
            timer: None,
            opacity_before_fade: String::new(),
        }));
        let fade_slot = Rc::clone(&slot);
        let remove_delay = config.alert_remove_delay_ms;
        let timer = page.set_timeout(config.alert_fade_delay_ms, move |page| {
            fade(page, node, fade_slot, remove_delay)
        });
        slot.borrow_mut().timer = Some(timer);
        dismissals.push(AlertDismissal { node, slot });
    }
    Ok(dismissals)
}

fn fade(
    page: &mut Page,
    node: NodeId,
    slot: Rc<RefCell<AlertSlot>>,
    remove_delay: i64,
) -> Result<()> {
    let opacity_before_fade = page.style_get(node, "opacity")?;
    page.style_set(node, "opacity", "0")?;
    let remove_slot = Rc::clone(&slot);
    let timer = page.set_timeout(remove_delay, move |page| remove(page, node, remove_slot));
    let mut slot = slot.borrow_mut();
    slot.phase = AlertPhase::Fading;
    slot.timer = Some(timer);
    slot.opacity_before_fade = opacity_before_fade;
    Ok(())
}

fn remove(page: &mut Page, node: NodeId, slot: Rc<RefCell<AlertSlot>>) -> Result<()> {
    // Someone else may have detached it already.
    if page.is_connected(node) {
        page.remove_node(node)?;
    }
    let mut slot = slot.borrow_mut();
    slot.phase = AlertPhase::Removed;
    slot.timer = None;
    Ok(())
}
