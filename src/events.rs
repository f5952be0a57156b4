use super::*;

/// Callback registered with [`Page::add_event_listener`]. Handlers receive
/// the page mutably, so they can query and mutate the document, schedule
/// timers, or dispatch further events.
pub type EventHandler = Rc<dyn Fn(&mut Page, &mut Event) -> Result<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Clone)]
pub(crate) struct Listener {
    id: ListenerId,
    capture: bool,
    handler: EventHandler,
}

#[derive(Default, Clone)]
pub(crate) struct ListenerStore {
    map: HashMap<NodeId, HashMap<String, Vec<Listener>>>,
    next_id: u64,
}

impl ListenerStore {
    fn add(
        &mut self,
        node_id: NodeId,
        event: String,
        capture: bool,
        handler: EventHandler,
    ) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.map
            .entry(node_id)
            .or_default()
            .entry(event)
            .or_default()
            .push(Listener {
                id,
                capture,
                handler,
            });
        id
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        let mut emptied_node = None;
        let mut removed = false;
        for (node_id, events) in self.map.iter_mut() {
            let mut emptied_event = None;
            for (event, listeners) in events.iter_mut() {
                if let Some(pos) = listeners.iter().position(|listener| listener.id == id) {
                    listeners.remove(pos);
                    removed = true;
                    if listeners.is_empty() {
                        emptied_event = Some(event.clone());
                    }
                    break;
                }
            }
            if let Some(event) = emptied_event {
                events.remove(&event);
                if events.is_empty() {
                    emptied_node = Some(*node_id);
                }
            }
            if removed {
                break;
            }
        }
        if let Some(node_id) = emptied_node {
            self.map.remove(&node_id);
        }
        removed
    }

    fn get(&self, node_id: NodeId, event: &str, capture: bool) -> Vec<Listener> {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .map(|listeners| {
                listeners
                    .iter()
                    .filter(|listener| listener.capture == capture)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn count(&self, node_id: NodeId, event: &str) -> usize {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .map(Vec::len)
            .unwrap_or(0)
    }
}

/// State of one dispatch, shared by every listener along the path.
#[derive(Debug, Clone)]
pub struct Event {
    event_type: String,
    target: NodeId,
    current_target: NodeId,
    default_prevented: bool,
    propagation_stopped: bool,
    immediate_propagation_stopped: bool,
}

impl Event {
    fn new(event_type: &str, target: NodeId) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: target,
            default_prevented: false,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn current_target(&self) -> NodeId {
        self.current_target
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_propagation_stopped = true;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

impl Page {
    pub fn add_event_listener<F>(
        &mut self,
        node: NodeId,
        event_type: &str,
        handler: F,
    ) -> Result<ListenerId>
    where
        F: Fn(&mut Page, &mut Event) -> Result<()> + 'static,
    {
        self.register_listener(node, event_type, false, Rc::new(handler))
    }

    pub fn add_event_listener_with_capture<F>(
        &mut self,
        node: NodeId,
        event_type: &str,
        handler: F,
    ) -> Result<ListenerId>
    where
        F: Fn(&mut Page, &mut Event) -> Result<()> + 'static,
    {
        self.register_listener(node, event_type, true, Rc::new(handler))
    }

    fn register_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        capture: bool,
        handler: EventHandler,
    ) -> Result<ListenerId> {
        self.ensure_node(node)?;
        let id = self
            .listeners
            .add(node, event_type.to_string(), capture, handler);
        if self.trace {
            let label = self.trace_node_label(node);
            self.trace_event_line(format!(
                "[event] listen {event_type} node={label} capture={capture}"
            ));
        }
        Ok(id)
    }

    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn listener_count(&self, node: NodeId, event_type: &str) -> usize {
        self.listeners.count(node, event_type)
    }

    /// Dispatches a bubbling event through capture, target and bubble
    /// phases and returns the final event state.
    pub fn dispatch_event(&mut self, target: NodeId, event_type: &str) -> Result<Event> {
        self.ensure_node(target)?;
        let mut event = Event::new(event_type, target);

        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.dom.parent(node);
        }
        path.reverse();

        // Capture phase.
        for node in &path[..path.len() - 1] {
            event.current_target = *node;
            self.invoke_listeners(*node, &mut event, true)?;
            if event.propagation_stopped {
                self.trace_event_done(&event, "propagation_stopped");
                return Ok(event);
            }
        }

        // Target phase: capture listeners first.
        event.current_target = target;
        self.invoke_listeners(target, &mut event, true)?;
        if event.propagation_stopped {
            self.trace_event_done(&event, "propagation_stopped");
            return Ok(event);
        }
        self.invoke_listeners(target, &mut event, false)?;
        if event.propagation_stopped {
            self.trace_event_done(&event, "propagation_stopped");
            return Ok(event);
        }

        // Bubble phase.
        for node in path[..path.len() - 1].iter().rev() {
            event.current_target = *node;
            self.invoke_listeners(*node, &mut event, false)?;
            if event.propagation_stopped {
                self.trace_event_done(&event, "propagation_stopped");
                return Ok(event);
            }
        }

        self.trace_event_done(&event, "completed");
        Ok(event)
    }

    fn invoke_listeners(&mut self, node_id: NodeId, event: &mut Event, capture: bool) -> Result<()> {
        let listeners = self.listeners.get(node_id, &event.event_type, capture);
        for listener in listeners {
            if self.trace {
                let phase = if capture { "capture" } else { "bubble" };
                let target_label = self.trace_node_label(event.target);
                let current_label = self.trace_node_label(event.current_target);
                self.trace_event_line(format!(
                    "[event] {} target={} current={} phase={} default_prevented={}",
                    event.event_type, target_label, current_label, phase, event.default_prevented
                ));
            }
            (listener.handler)(self, event)?;
            if event.immediate_propagation_stopped {
                break;
            }
        }
        Ok(())
    }

    fn trace_event_done(&mut self, event: &Event, outcome: &str) {
        if !(self.trace && self.trace_events) {
            return;
        }
        let target_label = self.trace_node_label(event.target);
        self.trace_event_line(format!(
            "[event] done {} target={} outcome={} default_prevented={}",
            event.event_type, target_label, outcome, event.default_prevented
        ));
    }
}
