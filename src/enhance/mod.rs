//! The four page behaviors and their single entry point, [`install`].
//!
//! Each behavior binds to whatever matches its selector at install time and
//! shares no state with the others.

use super::*;

mod alert_dismiss;
mod password_meter;
mod smooth_scroll;
mod submit_loading;

pub use alert_dismiss::{AlertDismissal, AlertPhase};
pub use password_meter::{confirm_passwords, render_meter};

/// Class appended to the strength bar for each tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierClasses {
    pub weak: String,
    pub medium: String,
    pub strong: String,
}

impl TierClasses {
    pub fn class_for(&self, tier: StrengthTier) -> &str {
        match tier {
            StrengthTier::Weak => &self.weak,
            StrengthTier::Medium => &self.medium,
            StrengthTier::Strong => &self.strong,
        }
    }
}

impl Default for TierClasses {
    fn default() -> Self {
        Self {
            weak: "bg-danger".into(),
            medium: "bg-warning".into(),
            strong: "bg-success".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhanceConfig {
    pub anchor_selector: String,
    pub submit_selector: String,
    pub alert_selector: String,
    pub password_id: String,
    pub confirm_password_id: String,
    pub mismatch_message: String,
    /// Markup swapped into a submit button while its form is submitting.
    pub loading_html: String,
    pub meter_class: String,
    /// Finds a previously rendered meter inside the password field's parent.
    pub meter_selector: String,
    pub bar_class: String,
    pub tier_classes: TierClasses,
    pub alert_fade_delay_ms: i64,
    pub alert_remove_delay_ms: i64,
    /// Also re-check the confirmation whenever the password changes.
    pub revalidate_confirm_on_password_input: bool,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            anchor_selector: r##"a[href^="#"]"##.into(),
            submit_selector: r#"button[type="submit"]"#.into(),
            alert_selector: ".alert".into(),
            password_id: "password".into(),
            confirm_password_id: "confirm_password".into(),
            mismatch_message: "Passwords do not match".into(),
            loading_html: r#"<span class="spinner-border spinner-border-sm" role="status" aria-hidden="true"></span> Loading..."#.into(),
            meter_class: "progress mt-2".into(),
            meter_selector: ".progress".into(),
            bar_class: "progress-bar".into(),
            tier_classes: TierClasses::default(),
            alert_fade_delay_ms: 5_000,
            alert_remove_delay_ms: 300,
            revalidate_confirm_on_password_input: false,
        }
    }
}

/// What [`install`] wired up.
#[derive(Debug, Clone, Default)]
pub struct Installation {
    pub smooth_scroll_anchors: Vec<NodeId>,
    pub loading_buttons: Vec<NodeId>,
    /// False when either password field is absent; the meter is then inert.
    pub password_meter: bool,
    pub alerts: Vec<AlertDismissal>,
}

/// Attaches every behavior to the current contents of `page`.
pub fn install(page: &mut Page, config: &EnhanceConfig) -> Result<Installation> {
    let config = Rc::new(config.clone());

    let smooth_scroll_anchors = smooth_scroll::bind(page, &config)?;
    let loading_buttons = submit_loading::bind(page, &config)?;
    let password_meter = password_meter::bind(page, &config)?;
    let alerts = alert_dismiss::schedule_all(page, &config)?;

    page.trace_line(format!(
        "[enhance] installed anchors={} buttons={} password_meter={} alerts={}",
        smooth_scroll_anchors.len(),
        loading_buttons.len(),
        password_meter,
        alerts.len()
    ));

    Ok(Installation {
        smooth_scroll_anchors,
        loading_buttons,
        password_meter,
        alerts,
    })
}
