use super::*;

const NESTED_HTML: &str = r#"
    <div id='outer'>
      <div id='inner'>
        <button id='btn' type='button'>press</button>
      </div>
    </div>
    <p id='log'></p>
    "#;

fn recorder(
    log: &Rc<RefCell<Vec<String>>>,
    label: &'static str,
) -> impl Fn(&mut Page, &mut Event) -> Result<()> + 'static {
    let log = Rc::clone(log);
    move |_page: &mut Page, event: &mut Event| {
        log.borrow_mut().push(format!("{label}:{}", event.event_type()));
        Ok(())
    }
}

#[test]
fn dispatch_runs_capture_target_then_bubble() -> Result<()> {
    let mut page = Page::from_html(NESTED_HTML)?;
    let outer = page.select_one("#outer")?;
    let inner = page.select_one("#inner")?;
    let btn = page.select_one("#btn")?;
    let log = Rc::new(RefCell::new(Vec::new()));

    page.add_event_listener(outer, "click", recorder(&log, "outer-bubble"))?;
    page.add_event_listener_with_capture(outer, "click", recorder(&log, "outer-capture"))?;
    page.add_event_listener(inner, "click", recorder(&log, "inner-bubble"))?;
    page.add_event_listener(btn, "click", recorder(&log, "target-bubble"))?;
    page.add_event_listener_with_capture(btn, "click", recorder(&log, "target-capture"))?;

    page.click("#btn")?;
    assert_eq!(
        *log.borrow(),
        vec![
            "outer-capture:click",
            "target-capture:click",
            "target-bubble:click",
            "inner-bubble:click",
            "outer-bubble:click",
        ]
    );
    Ok(())
}

#[test]
fn stop_propagation_keeps_remaining_listeners_on_the_same_node() -> Result<()> {
    let mut page = Page::from_html(NESTED_HTML)?;
    let outer = page.select_one("#outer")?;
    let inner = page.select_one("#inner")?;
    let log = Rc::new(RefCell::new(Vec::new()));

    page.add_event_listener(inner, "click", |_page, event| {
        event.stop_propagation();
        Ok(())
    })?;
    page.add_event_listener(inner, "click", recorder(&log, "inner-second"))?;
    page.add_event_listener(outer, "click", recorder(&log, "outer"))?;

    page.click("#btn")?;
    assert_eq!(*log.borrow(), vec!["inner-second:click"]);
    Ok(())
}

#[test]
fn stop_immediate_propagation_skips_later_listeners() -> Result<()> {
    let mut page = Page::from_html(NESTED_HTML)?;
    let btn = page.select_one("#btn")?;
    let log = Rc::new(RefCell::new(Vec::new()));

    page.add_event_listener(btn, "click", |_page, event| {
        event.stop_immediate_propagation();
        Ok(())
    })?;
    page.add_event_listener(btn, "click", recorder(&log, "second"))?;

    let event = page.dispatch_event(btn, "click")?;
    assert!(event.propagation_stopped());
    assert!(log.borrow().is_empty());
    Ok(())
}

#[test]
fn current_target_tracks_the_listener_node() -> Result<()> {
    let mut page = Page::from_html(NESTED_HTML)?;
    let outer = page.select_one("#outer")?;
    let btn = page.select_one("#btn")?;

    page.add_event_listener(outer, "click", move |page, event| {
        let log = page.select_one("#log")?;
        let text = format!(
            "{}|{}",
            page.attr(event.target(), "id").unwrap_or_default(),
            page.attr(event.current_target(), "id").unwrap_or_default()
        );
        page.set_text_content(log, &text)
    })?;

    page.dispatch_event(btn, "click")?;
    page.assert_text("#log", "btn|outer")?;
    Ok(())
}

#[test]
fn removed_listener_no_longer_fires() -> Result<()> {
    let mut page = Page::from_html(NESTED_HTML)?;
    let btn = page.select_one("#btn")?;
    let log = Rc::new(RefCell::new(Vec::new()));

    let id = page.add_event_listener(btn, "click", recorder(&log, "btn"))?;
    assert_eq!(page.listener_count(btn, "click"), 1);
    assert!(page.remove_event_listener(id));
    assert!(!page.remove_event_listener(id));
    assert_eq!(page.listener_count(btn, "click"), 0);

    page.click("#btn")?;
    assert!(log.borrow().is_empty());
    Ok(())
}

#[test]
fn listener_errors_propagate_and_keep_earlier_mutations() -> Result<()> {
    let mut page = Page::from_html(NESTED_HTML)?;
    let btn = page.select_one("#btn")?;

    page.add_event_listener(btn, "click", |page, _event| {
        let log = page.select_one("#log")?;
        page.set_text_content(log, "before")?;
        Err(Error::Runtime("listener failed".into()))
    })?;

    match page.click("#btn") {
        Err(Error::Runtime(message)) => assert_eq!(message, "listener failed"),
        other => panic!("expected runtime error, got: {other:?}"),
    }
    page.assert_text("#log", "before")?;
    Ok(())
}

#[test]
fn disabled_controls_swallow_clicks() -> Result<()> {
    let mut page = Page::from_html("<button id='b' disabled>b</button>")?;
    let btn = page.select_one("#b")?;
    let log = Rc::new(RefCell::new(Vec::new()));
    page.add_event_listener(btn, "click", recorder(&log, "b"))?;

    page.click("#b")?;
    assert!(log.borrow().is_empty());
    Ok(())
}

#[test]
fn type_text_sets_value_and_fires_input() -> Result<()> {
    let mut page = Page::from_html("<input id='name'><textarea id='bio'></textarea><p id='echo'></p>")?;
    let name = page.select_one("#name")?;
    page.add_event_listener(name, "input", |page, event| {
        let value = page.value(event.target())?;
        let echo = page.select_one("#echo")?;
        page.set_text_content(echo, &value)
    })?;

    page.type_text("#name", "Ada")?;
    page.assert_value("#name", "Ada")?;
    page.assert_text("#echo", "Ada")?;

    page.type_text("#bio", "hello")?;
    page.assert_value("#bio", "hello")?;
    Ok(())
}

#[test]
fn type_text_ignores_readonly_and_rejects_non_text_targets() -> Result<()> {
    let mut page = Page::from_html("<input id='ro' readonly value='keep'><p id='p'></p>")?;
    page.type_text("#ro", "changed")?;
    page.assert_value("#ro", "keep")?;

    match page.type_text("#p", "x") {
        Err(Error::TypeMismatch { expected, actual, .. }) => {
            assert_eq!(expected, "input or textarea");
            assert_eq!(actual, "p");
        }
        other => panic!("expected type mismatch, got: {other:?}"),
    }
    Ok(())
}

#[test]
fn trace_records_event_lines_when_enabled() -> Result<()> {
    let mut page = Page::from_html(NESTED_HTML)?;
    page.set_trace_stderr(false);
    page.enable_trace(true);
    let btn = page.select_one("#btn")?;
    page.add_event_listener(btn, "click", |_page, _event| Ok(()))?;
    page.click("#btn")?;

    let logs = page.take_trace_logs();
    assert!(logs.iter().any(|line| line == "[event] listen click node=button#btn capture=false"));
    assert!(logs.iter().any(|line| line.starts_with("[event] click target=button#btn current=button#btn phase=bubble")));
    assert!(logs.iter().any(|line| line.starts_with("[event] done click target=button#btn outcome=completed")));
    assert!(page.take_trace_logs().is_empty());

    page.set_trace_events(false);
    page.click("#btn")?;
    assert!(page.take_trace_logs().is_empty());
    Ok(())
}

#[test]
fn trace_log_limit_drops_oldest_lines() -> Result<()> {
    let mut page = Page::from_html(NESTED_HTML)?;
    page.set_trace_stderr(false);
    page.enable_trace(true);
    page.set_trace_log_limit(2)?;
    let btn = page.select_one("#btn")?;
    for _ in 0..3 {
        page.add_event_listener(btn, "focus", |_page, _event| Ok(()))?;
    }
    page.add_event_listener(btn, "blur", |_page, _event| Ok(()))?;

    let logs = page.take_trace_logs();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[1], "[event] listen blur node=button#btn capture=false");
    assert!(page.set_trace_log_limit(0).is_err());
    Ok(())
}

#[test]
fn full_trace_buffer_keeps_the_newest_lines_in_order() -> Result<()> {
    let mut page = Page::from_html(NESTED_HTML)?;
    page.set_trace_stderr(false);
    page.enable_trace(true);
    page.set_trace_log_limit(1_000)?;
    for _ in 0..5_000 {
        page.set_timeout(10, |_page| Ok(()));
    }

    page.set_trace_log_limit(3)?;
    let logs = page.take_trace_logs();
    assert_eq!(logs.len(), 3);
    assert_eq!(logs[0], "[timer] schedule id=4998 due_at=10 delay_ms=10");
    assert_eq!(logs[2], "[timer] schedule id=5000 due_at=10 delay_ms=10");
    assert!(page.take_trace_logs().is_empty());
    Ok(())
}
