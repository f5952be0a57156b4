use super::*;

pub(super) fn bind(page: &mut Page, config: &Rc<EnhanceConfig>) -> Result<bool> {
    let password = page.get_element_by_id(&config.password_id);
    let confirm = page.get_element_by_id(&config.confirm_password_id);
    let (Some(password), Some(confirm)) = (password, confirm) else {
        page.trace_line(format!(
            "[enhance] password_meter inert password={} confirm={}",
            password.is_some(),
            confirm.is_some()
        ));
        return Ok(false);
    };

    let meter_config = Rc::clone(config);
    page.add_event_listener(password, "input", move |page, _event| {
        render_meter(page, password, &meter_config)?;
        if meter_config.revalidate_confirm_on_password_input {
            sync_confirmation(page, password, confirm, &meter_config)?;
        }
        Ok(())
    })?;

    let confirm_config = Rc::clone(config);
    page.add_event_listener(confirm, "input", move |page, _event| {
        sync_confirmation(page, password, confirm, &confirm_config)
    })?;

    Ok(true)
}

/// Replaces the strength meter next to `field` with one reflecting its
/// current value. A field without a parent has nowhere to show a meter.
pub fn render_meter(page: &mut Page, field: NodeId, config: &EnhanceConfig) -> Result<Strength> {
    let strength = Strength::of(&page.value(field)?);
    let Some(container) = page.parent(field) else {
        return Ok(strength);
    };

    let meter = page.create_element("div");
    page.set_class_name(meter, &config.meter_class)?;
    page.set_inner_html(
        meter,
        &format!(
            r#"<div class="{}" role="progressbar" style="width: {}%"></div>"#,
            config.bar_class,
            strength.fill_percent()
        ),
    )?;

    if let Some(existing) = page.query_selector_within(container, &config.meter_selector)? {
        page.remove_node(existing)?;
    }
    page.append_child(container, meter)?;

    if let Some(bar) = page.children(meter).first().copied() {
        let tier_class = config.tier_classes.class_for(strength.tier());
        page.set_class_name(bar, &format!("{} {}", config.bar_class, tier_class))?;
    }

    page.trace_line(format!(
        "[enhance] strength score={} tier={}",
        strength.score(),
        strength.tier().as_str()
    ));
    Ok(strength)
}

/// Flags `field` through `sink` unless `confirmation` equals `password`.
/// Returns whether the two match.
pub fn confirm_passwords<S: ValidationSink + ?Sized>(
    sink: &mut S,
    field: NodeId,
    password: &str,
    confirmation: &str,
    message: &str,
) -> Result<bool> {
    let matches = confirmation == password;
    sink.set_validation_error(field, (!matches).then_some(message))?;
    Ok(matches)
}

fn sync_confirmation(
    page: &mut Page,
    password: NodeId,
    confirm: NodeId,
    config: &EnhanceConfig,
) -> Result<()> {
    let password_value = page.value(password)?;
    let confirm_value = page.value(confirm)?;
    confirm_passwords(
        page,
        confirm,
        &password_value,
        &confirm_value,
        &config.mismatch_message,
    )?;
    Ok(())
}
