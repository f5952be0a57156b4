use super::*;

pub(super) fn bind(page: &mut Page, config: &EnhanceConfig) -> Result<Vec<NodeId>> {
    let anchors = page.query_selector_all(&config.anchor_selector)?;
    for anchor in &anchors {
        page.add_event_listener(*anchor, "click", |page, event| {
            event.prevent_default();
            let anchor = event.current_target();
            let href = page.attr(anchor, "href").unwrap_or_default();
            match fragment_target(page, &href) {
                Some(target) => page.scroll_into_view(target, ScrollBehavior::Smooth),
                None => {
                    // Unknown fragments are ignored rather than failing the click.
                    page.trace_line(format!("[enhance] smooth_scroll missing target href={href:?}"));
                    Ok(())
                }
            }
        })?;
    }
    Ok(anchors)
}

fn fragment_target(page: &Page, href: &str) -> Option<NodeId> {
    let id = href.strip_prefix('#').filter(|id| !id.is_empty())?;
    page.get_element_by_id(id)
}
