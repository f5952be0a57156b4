use super::*;

const ACTION_STACK_RED_ZONE: usize = 32 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Instant,
    Smooth,
}

/// One `scrollIntoView` request, in the order they were made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollRecord {
    pub target: NodeId,
    pub behavior: ScrollBehavior,
    pub at_ms: i64,
}

/// A form submission that passed validation and was not canceled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSubmission {
    pub form: NodeId,
    pub submitter: Option<NodeId>,
    pub action: String,
    pub method: String,
    pub fields: Vec<(String, String)>,
}

/// Headless document with deterministic events and a virtual clock.
pub struct Page {
    pub(crate) dom: Dom,
    pub(crate) listeners: ListenerStore,
    pub(crate) task_queue: Vec<timers::ScheduledTask>,
    pub(crate) now_ms: i64,
    pub(crate) timer_step_limit: usize,
    pub(crate) next_timer_id: u64,
    pub(crate) next_task_order: u64,
    location: String,
    scroll_log: Vec<ScrollRecord>,
    submissions: Vec<FormSubmission>,
    pub(crate) trace: bool,
    pub(crate) trace_events: bool,
    pub(crate) trace_timers: bool,
    trace_logs: VecDeque<String>,
    trace_log_limit: usize,
    trace_to_stderr: bool,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("location", &self.location)
            .field("now_ms", &self.now_ms)
            .field("pending_timers", &self.task_queue.len())
            .finish_non_exhaustive()
    }
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        let dom = parse_html(html)?;
        Ok(Self {
            dom,
            listeners: ListenerStore::default(),
            task_queue: Vec::new(),
            now_ms: 0,
            timer_step_limit: 10_000,
            next_timer_id: 0,
            next_task_order: 0,
            location: "about:blank".into(),
            scroll_log: Vec::new(),
            submissions: Vec::new(),
            trace: false,
            trace_events: true,
            trace_timers: true,
            trace_logs: VecDeque::new(),
            trace_log_limit: 10_000,
            trace_to_stderr: true,
        })
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace_logs).into()
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_to_stderr = enabled;
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace_events = enabled;
    }

    pub fn set_trace_timers(&mut self, enabled: bool) {
        self.trace_timers = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::Runtime(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace_log_limit = max_entries;
        if self.trace_logs.len() > self.trace_log_limit {
            let overflow = self.trace_logs.len() - self.trace_log_limit;
            self.trace_logs.drain(..overflow);
        }
        Ok(())
    }

    pub fn set_timer_step_limit(&mut self, max_steps: usize) -> Result<()> {
        if max_steps == 0 {
            return Err(Error::Runtime(
                "set_timer_step_limit requires at least 1 step".into(),
            ));
        }
        self.timer_step_limit = max_steps;
        Ok(())
    }

    pub fn set_location(&mut self, url: &str) {
        self.location = url.to_string();
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn scroll_log(&self) -> &[ScrollRecord] {
        &self.scroll_log
    }

    pub fn submissions(&self) -> &[FormSubmission] {
        &self.submissions
    }

    // ---- tree access ----

    pub fn document(&self) -> NodeId {
        self.dom.root
    }

    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.dom.query_selector_all(selector)?.into_iter().next())
    }

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        self.dom.query_selector_all(selector)
    }

    /// Matches descendants of `root` only, like `element.querySelectorAll`.
    pub fn query_selector_within(&self, root: NodeId, selector: &str) -> Result<Option<NodeId>> {
        self.ensure_node(root)?;
        Ok(self
            .dom
            .query_selector_all_from(root, selector)?
            .into_iter()
            .next())
    }

    pub fn query_selector_all_within(&self, root: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        self.ensure_node(root)?;
        self.dom.query_selector_all_from(root, selector)
    }

    pub fn matches(&self, node: NodeId, selector: &str) -> Result<bool> {
        self.ensure_node(node)?;
        self.dom.matches_selector(node, selector)
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.dom.by_id(id)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.dom.parent(node)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.dom.children(node).to_vec()
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.dom.is_valid_node(node) && self.dom.is_connected(node)
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.dom.tag_name(node)
    }

    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.dom.create_detached_element(tag_name.to_ascii_lowercase())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.ensure_node(parent)?;
        self.ensure_node(child)?;
        self.dom.append_child(parent, child)
    }

    /// Detaches the node from its parent; a detached node is left alone.
    pub fn remove_node(&mut self, node: NodeId) -> Result<()> {
        self.ensure_node(node)?;
        self.dom.remove_node(node)
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.dom.attr(node, name)
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.ensure_node(node)?;
        self.dom.set_attr(node, name, value)
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) -> Result<()> {
        self.ensure_node(node)?;
        self.dom.remove_attr(node, name)
    }

    pub fn class_name(&self, node: NodeId) -> String {
        self.dom.attr(node, "class").unwrap_or_default()
    }

    pub fn set_class_name(&mut self, node: NodeId, class_name: &str) -> Result<()> {
        self.set_attr(node, "class", class_name)
    }

    pub fn has_class(&self, node: NodeId, class_name: &str) -> bool {
        self.dom.class_contains(node, class_name)
    }

    pub fn text_content(&self, node: NodeId) -> Result<String> {
        self.ensure_node(node)?;
        Ok(self.dom.text_content(node))
    }

    pub fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<()> {
        self.ensure_node(node)?;
        self.dom.set_text_content(node, text)
    }

    pub fn inner_html(&self, node: NodeId) -> Result<String> {
        self.ensure_node(node)?;
        self.dom.inner_html(node)
    }

    pub fn set_inner_html(&mut self, node: NodeId, html: &str) -> Result<()> {
        self.ensure_node(node)?;
        self.dom.set_inner_html(node, html)
    }

    pub fn outer_html(&self, node: NodeId) -> Result<String> {
        self.ensure_node(node)?;
        Ok(self.dom.dump_node(node))
    }

    pub fn value(&self, node: NodeId) -> Result<String> {
        self.ensure_node(node)?;
        self.dom.value(node)
    }

    pub fn set_value(&mut self, node: NodeId, value: &str) -> Result<()> {
        self.ensure_node(node)?;
        self.dom.set_value(node, value)
    }

    pub fn disabled(&self, node: NodeId) -> bool {
        self.dom.disabled(node)
    }

    pub fn set_disabled(&mut self, node: NodeId, disabled: bool) -> Result<()> {
        self.ensure_node(node)?;
        self.dom.set_disabled(node, disabled)
    }

    pub fn style_get(&self, node: NodeId, property: &str) -> Result<String> {
        self.ensure_node(node)?;
        self.dom.style_get(node, property)
    }

    pub fn style_set(&mut self, node: NodeId, property: &str, value: &str) -> Result<()> {
        self.ensure_node(node)?;
        self.dom.style_set(node, property, value)
    }

    pub fn form_owner(&self, node: NodeId) -> Option<NodeId> {
        if !self.dom.is_valid_node(node) {
            return None;
        }
        self.dom.form_owner(node)
    }

    pub fn scroll_into_view(&mut self, node: NodeId, behavior: ScrollBehavior) -> Result<()> {
        self.ensure_node(node)?;
        if self.dom.element(node).is_none() {
            return Err(Error::Runtime("scrollIntoView target is not an element".into()));
        }
        self.scroll_log.push(ScrollRecord {
            target: node,
            behavior,
            at_ms: self.now_ms,
        });
        if self.trace {
            let label = self.trace_node_label(node);
            self.trace_line(format!("[scroll] into_view node={label} behavior={behavior:?}"));
        }
        Ok(())
    }

    // ---- user actions ----

    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) || self.dom.readonly(target) {
            return Ok(());
        }

        let tag = self
            .dom
            .tag_name(target)
            .ok_or_else(|| Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: "non-element".into(),
            })?
            .to_ascii_lowercase();

        if tag != "input" && tag != "textarea" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: tag,
            });
        }

        stacker::grow(ACTION_STACK_RED_ZONE, || {
            self.dom.set_value(target, text)?;
            self.dispatch_event(target, "input")?;
            Ok(())
        })
    }

    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        stacker::grow(ACTION_STACK_RED_ZONE, || self.click_node(target))
    }

    /// Clicks a node: fires `click`, then runs the activation behavior of
    /// the nearest link or submit control unless a listener canceled it.
    pub fn click_node(&mut self, target: NodeId) -> Result<()> {
        self.ensure_node(target)?;
        if self.dom.disabled(target) {
            return Ok(());
        }

        let activation = self.activation_target(target);
        let event = self.dispatch_event(target, "click")?;
        if event.default_prevented() {
            return Ok(());
        }

        match activation {
            Some(node) if self.dom.is_tag(node, "a") => self.follow_link(node),
            Some(node) => match self.dom.form_owner(node) {
                Some(form) => self.submit_form(form, Some(node)),
                None => Ok(()),
            },
            None => Ok(()),
        }
    }

    /// Submits the form (or the form owning the selected control) the way
    /// `requestSubmit()` does: validation first, then a cancelable `submit`.
    pub fn submit(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let form = if self.dom.is_tag(target, "form") {
            Some(target)
        } else {
            self.dom.form_owner(target)
        };
        let Some(form) = form else {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "form or form control".into(),
                actual: self.dom.tag_name(target).unwrap_or("node").to_string(),
            });
        };
        stacker::grow(ACTION_STACK_RED_ZONE, || self.submit_form(form, None))
    }

    fn activation_target(&self, target: NodeId) -> Option<NodeId> {
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            if self.dom.is_tag(node, "a") && self.dom.attr(node, "href").is_some() {
                return Some(node);
            }
            if is_submit_control(&self.dom, node) {
                return (!self.dom.disabled(node)).then_some(node);
            }
            cursor = self.dom.parent(node);
        }
        None
    }

    fn follow_link(&mut self, anchor: NodeId) -> Result<()> {
        let href = self.dom.attr(anchor, "href").unwrap_or_default();
        if let Some(fragment) = href.strip_prefix('#') {
            let base = self
                .location
                .split_once('#')
                .map(|(base, _)| base.to_string())
                .unwrap_or_else(|| self.location.clone());
            self.location = format!("{base}#{fragment}");
            if let Some(node) = self.dom.by_id(fragment) {
                self.scroll_into_view(node, ScrollBehavior::Instant)?;
            }
        } else {
            self.location = href;
        }
        self.trace_event_line(format!("[event] navigate location={}", self.location));
        Ok(())
    }

    fn submit_form(&mut self, form: NodeId, submitter: Option<NodeId>) -> Result<()> {
        let skip_validation = self.dom.attr(form, "novalidate").is_some()
            || submitter.is_some_and(|node| self.dom.attr(node, "formnovalidate").is_some());
        if !skip_validation && !self.report_validity(form)? {
            self.trace_event_line("[event] submit blocked by constraint validation".into());
            return Ok(());
        }

        let event = self.dispatch_event(form, "submit")?;
        if event.default_prevented() {
            return Ok(());
        }

        let submission = FormSubmission {
            form,
            submitter,
            action: self
                .dom
                .attr(form, "action")
                .unwrap_or_else(|| self.location.clone()),
            method: self
                .dom
                .attr(form, "method")
                .map(|method| method.to_ascii_lowercase())
                .unwrap_or_else(|| "get".into()),
            fields: self.form_fields(form, submitter)?,
        };
        self.submissions.push(submission);
        Ok(())
    }

    fn form_fields(&self, form: NodeId, submitter: Option<NodeId>) -> Result<Vec<(String, String)>> {
        let mut fields = Vec::new();
        for control in self.dom.form_controls(form) {
            let Some(name) = self.dom.attr(control, "name").filter(|name| !name.is_empty()) else {
                continue;
            };
            if self.dom.disabled(control) {
                continue;
            }
            if is_submit_control(&self.dom, control) && Some(control) != submitter {
                continue;
            }
            if self.dom.is_tag(control, "button") && Some(control) != submitter {
                continue;
            }
            if self.dom.is_tag(control, "input") {
                let kind = input_type(&self.dom, control);
                if matches!(kind.as_str(), "reset" | "button" | "checkbox" | "radio")
                    && self.dom.attr(control, "checked").is_none()
                {
                    continue;
                }
            }
            fields.push((name, self.dom.value(control)?));
        }
        Ok(fields)
    }

    // ---- assertions ----

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.text_content(target);
        if actual != expected {
            return Err(self.assertion_failed(selector, target, expected, actual));
        }
        Ok(())
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.value(target)?;
        if actual != expected {
            return Err(self.assertion_failed(selector, target, expected, actual));
        }
        Ok(())
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.select_one(selector)?;
        Ok(())
    }

    pub fn assert_missing(&self, selector: &str) -> Result<()> {
        if let Some(found) = self.query_selector(selector)? {
            return Err(self.assertion_failed(selector, found, "no match", "present".into()));
        }
        Ok(())
    }

    pub fn assert_count(&self, selector: &str, expected: usize) -> Result<()> {
        let actual = self.query_selector_all(selector)?.len();
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
                dom_snippet: truncate_chars(&self.dom.dump_node(self.dom.root), 200),
            });
        }
        Ok(())
    }

    pub fn assert_class(&self, selector: &str, class_name: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if !self.dom.class_contains(target, class_name) {
            let actual = self.class_name(target);
            return Err(self.assertion_failed(selector, target, class_name, actual));
        }
        Ok(())
    }

    pub fn assert_style(&self, selector: &str, property: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.style_get(target, property)?;
        if actual != expected {
            return Err(self.assertion_failed(selector, target, expected, actual));
        }
        Ok(())
    }

    pub fn assert_disabled(&self, selector: &str, expected: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.disabled(target);
        if actual != expected {
            return Err(self.assertion_failed(
                selector,
                target,
                &expected.to_string(),
                actual.to_string(),
            ));
        }
        Ok(())
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.dump_node(target))
    }

    fn assertion_failed(
        &self,
        selector: &str,
        target: NodeId,
        expected: &str,
        actual: String,
    ) -> Error {
        Error::AssertionFailed {
            selector: selector.to_string(),
            expected: expected.to_string(),
            actual,
            dom_snippet: self.node_snippet(target),
        }
    }

    // ---- internals ----

    pub(crate) fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    pub(crate) fn ensure_node(&self, node: NodeId) -> Result<()> {
        if self.dom.is_valid_node(node) {
            Ok(())
        } else {
            Err(Error::InvalidNode(format!("node {} does not belong to this page", node.0)))
        }
    }

    fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node_id), 200)
    }

    pub(crate) fn trace_node_label(&self, node_id: NodeId) -> String {
        if node_id == self.dom.root {
            return "document".into();
        }
        let Some(element) = self.dom.element(node_id) else {
            return format!("#node{}", node_id.0);
        };
        let mut label = element.tag_name.clone();
        if let Some(id) = element.attrs.get("id").filter(|id| !id.is_empty()) {
            label.push('#');
            label.push_str(id);
        } else if let Some(class) = element.attrs.get("class") {
            for token in class.split_whitespace().take(2) {
                label.push('.');
                label.push_str(token);
            }
        }
        label
    }

    pub(crate) fn trace_event_line(&mut self, line: String) {
        if self.trace && self.trace_events {
            self.trace_line(line);
        }
    }

    pub(crate) fn trace_timer_line(&mut self, line: String) {
        if self.trace && self.trace_timers {
            self.trace_line(line);
        }
    }

    pub(crate) fn trace_line(&mut self, line: String) {
        if self.trace {
            if self.trace_to_stderr {
                eprintln!("{line}");
            }
            if self.trace_logs.len() >= self.trace_log_limit {
                self.trace_logs.pop_front();
            }
            self.trace_logs.push_back(line);
        }
    }
}
