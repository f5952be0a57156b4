use super::*;

fn push_text(page: &mut Page, text: &str) -> Result<()> {
    let out = page.select_one("#out")?;
    let mut current = page.text_content(out)?;
    current.push_str(text);
    page.set_text_content(out, &current)
}

#[test]
fn timers_run_in_due_order_then_insertion_order() -> Result<()> {
    let mut page = Page::from_html("<p id='out'></p>")?;
    page.set_timeout(20, |page| push_text(page, "c"));
    page.set_timeout(10, |page| push_text(page, "a"));
    page.set_timeout(10, |page| push_text(page, "b"));

    page.advance_time(15)?;
    page.assert_text("#out", "ab")?;
    assert_eq!(page.now_ms(), 15);

    page.advance_time(5)?;
    page.assert_text("#out", "abc")?;
    assert!(page.pending_timers().is_empty());
    Ok(())
}

#[test]
fn nested_timers_are_measured_from_the_parent_due_time() -> Result<()> {
    let mut page = Page::from_html("<p id='out'></p>")?;
    page.set_timeout(100, |page| {
        push_text(page, "outer")?;
        let at = page.now_ms();
        page.set_timeout(50, move |page| push_text(page, &format!("|inner@{at}")));
        Ok(())
    });

    page.advance_time(149)?;
    page.assert_text("#out", "outer")?;
    let pending = page.pending_timers();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].due_at, 150);

    page.advance_time(1)?;
    page.assert_text("#out", "outer|inner@100")?;
    Ok(())
}

#[test]
fn clear_timeout_cancels_only_pending_timers() -> Result<()> {
    let mut page = Page::from_html("<p id='out'></p>")?;
    let keep = page.set_timeout(5, |page| push_text(page, "keep"));
    let dropped = page.set_timeout(5, |page| push_text(page, "drop"));

    assert!(page.clear_timeout(dropped));
    assert!(!page.clear_timeout(dropped));
    page.advance_time(5)?;
    page.assert_text("#out", "keep")?;
    assert!(!page.clear_timeout(keep));
    Ok(())
}

#[test]
fn negative_delay_runs_on_next_due_check() -> Result<()> {
    let mut page = Page::from_html("<p id='out'></p>")?;
    page.set_timeout(-10, |page| push_text(page, "now"));
    assert_eq!(page.pending_timers()[0].due_at, 0);
    assert_eq!(page.run_due_timers()?, 1);
    page.assert_text("#out", "now")?;
    Ok(())
}

#[test]
fn run_next_timer_jumps_the_clock() -> Result<()> {
    let mut page = Page::from_html("<p id='out'></p>")?;
    page.set_timeout(300, |page| push_text(page, "x"));
    assert!(page.run_next_timer()?);
    assert_eq!(page.now_ms(), 300);
    assert!(!page.run_next_timer()?);
    Ok(())
}

#[test]
fn flush_drains_chained_timers() -> Result<()> {
    let mut page = Page::from_html("<p id='out'></p>")?;
    page.set_timeout(10, |page| {
        push_text(page, "1")?;
        page.set_timeout(10, |page| {
            push_text(page, "2")?;
            page.set_timeout(10, |page| push_text(page, "3"));
            Ok(())
        });
        Ok(())
    });

    page.flush()?;
    page.assert_text("#out", "123")?;
    assert_eq!(page.now_ms(), 30);
    Ok(())
}

#[test]
fn runaway_timer_chain_hits_the_step_limit() -> Result<()> {
    fn reschedule(page: &mut Page) -> Result<()> {
        page.set_timeout(0, reschedule);
        Ok(())
    }

    let mut page = Page::from_html("<p id='out'></p>")?;
    page.set_timer_step_limit(20)?;
    page.set_timeout(0, reschedule);

    match page.flush() {
        Err(Error::Runtime(message)) => {
            assert!(message.contains("timer queue exceeded max steps"), "{message}");
            assert!(message.contains("limit=20"), "{message}");
        }
        other => panic!("expected step limit error, got: {other:?}"),
    }
    assert!(page.set_timer_step_limit(0).is_err());
    Ok(())
}

#[test]
fn clock_rejects_going_backwards() -> Result<()> {
    let mut page = Page::from_html("<p id='out'></p>")?;
    page.advance_time_to(500)?;
    assert!(page.advance_time(-1).is_err());
    assert!(page.advance_time_to(499).is_err());
    assert_eq!(page.now_ms(), 500);
    assert_eq!(page.clear_all_timers(), 0);
    Ok(())
}

#[test]
fn timer_errors_surface_from_advance_time() -> Result<()> {
    let mut page = Page::from_html("<p id='out'></p>")?;
    page.set_timeout(1, |_page| Err(Error::Runtime("tick failed".into())));
    match page.advance_time(1) {
        Err(Error::Runtime(message)) => assert_eq!(message, "tick failed"),
        other => panic!("expected timer error, got: {other:?}"),
    }
    Ok(())
}

#[test]
fn timer_trace_lines_describe_schedule_and_run() -> Result<()> {
    let mut page = Page::from_html("<p id='out'></p>")?;
    page.set_trace_stderr(false);
    page.enable_trace(true);
    let id = page.set_timeout(7, |_page| Ok(()));
    page.advance_time(7)?;

    let logs = page.take_trace_logs();
    assert_eq!(logs[0], format!("[timer] schedule id={id} due_at=7 delay_ms=7"));
    assert!(logs.iter().any(|line| line == &format!("[timer] run id={id} due_at=7 now_ms=7")));
    assert!(logs.iter().any(|line| line.starts_with("[timer] advance delta_ms=7 from=0 to=7")));

    page.set_trace_timers(false);
    page.set_timeout(1, |_page| Ok(()));
    assert!(page.take_trace_logs().is_empty());
    Ok(())
}
