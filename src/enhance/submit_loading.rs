use super::*;

pub(super) fn bind(page: &mut Page, config: &Rc<EnhanceConfig>) -> Result<Vec<NodeId>> {
    let buttons = page.query_selector_all(&config.submit_selector)?;
    for button in &buttons {
        let config = Rc::clone(config);
        page.add_event_listener(*button, "click", move |page, event| {
            let button = event.current_target();
            let Some(form) = page.form_owner(button) else {
                return Ok(());
            };
            // Invalid forms stay untouched so the native messages can show.
            if !page.check_validity(form)? {
                return Ok(());
            }
            page.set_inner_html(button, &config.loading_html)?;
            page.set_disabled(button, true)
        })?;
    }
    Ok(buttons)
}
