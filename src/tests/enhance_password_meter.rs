use super::*;

const SIGNUP_HTML: &str = r#"
    <form id='signup' action='/register' method='post'>
      <div class='mb-3' id='password-group'>
        <label for='password'>Password</label>
        <input id='password' name='password' type='password' required>
      </div>
      <div class='mb-3'>
        <label for='confirm_password'>Confirm</label>
        <input id='confirm_password' name='confirm_password' type='password' required>
      </div>
      <button type='submit' id='register'>Register</button>
    </form>
    "#;

#[test]
fn meter_tracks_every_keystroke() -> Result<()> {
    let mut page = Page::from_html(SIGNUP_HTML)?;
    let installed = install(&mut page, &EnhanceConfig::default())?;
    assert!(installed.password_meter);
    page.assert_count(".progress", 0)?;

    let steps = [
        ("a", "20%", "bg-danger"),
        ("aB", "40%", "bg-danger"),
        ("aB3", "60%", "bg-warning"),
        ("aB3!", "80%", "bg-success"),
        ("aB3!long", "100%", "bg-success"),
        ("", "0%", "bg-danger"),
    ];
    for (typed, width, tier) in steps {
        page.type_text("#password", typed)?;
        page.assert_count(".progress", 1)?;
        page.assert_count("#password-group > .progress > .progress-bar", 1)?;
        page.assert_style(".progress-bar", "width", width)?;
        page.assert_class(".progress-bar", tier)?;
        page.assert_class(".progress-bar", "progress-bar")?;
    }
    Ok(())
}

#[test]
fn rendered_meter_markup_is_stable() -> Result<()> {
    let mut page = Page::from_html(SIGNUP_HTML)?;
    install(&mut page, &EnhanceConfig::default())?;
    page.type_text("#password", "Password1!")?;
    assert_eq!(
        page.dump_dom(".progress")?,
        r#"<div class="progress mt-2"><div class="progress-bar bg-success" role="progressbar" style="width: 100%"></div></div>"#
    );
    Ok(())
}

#[test]
fn meter_is_appended_after_the_field_and_its_siblings() -> Result<()> {
    let mut page = Page::from_html(SIGNUP_HTML)?;
    install(&mut page, &EnhanceConfig::default())?;
    page.type_text("#password", "x")?;
    page.type_text("#password", "xy")?;

    let group = page.select_one("#password-group")?;
    let meter = page.select_one(".progress")?;
    assert_eq!(page.children(group).last().copied(), Some(meter));
    Ok(())
}

#[test]
fn confirmation_mismatch_sets_and_clears_custom_validity() -> Result<()> {
    let mut page = Page::from_html(SIGNUP_HTML)?;
    install(&mut page, &EnhanceConfig::default())?;
    let confirm = page.select_one("#confirm_password")?;

    page.type_text("#password", "Password1!")?;
    page.type_text("#confirm_password", "Password1")?;
    assert_eq!(page.validation_message(confirm)?, "Passwords do not match");
    assert!(page.validity(confirm)?.custom_error);

    page.type_text("#confirm_password", "Password1!")?;
    assert_eq!(page.validation_message(confirm)?, "");
    assert!(page.check_validity(confirm)?);
    Ok(())
}

#[test]
fn password_edits_leave_confirmation_state_alone_by_default() -> Result<()> {
    let mut page = Page::from_html(SIGNUP_HTML)?;
    install(&mut page, &EnhanceConfig::default())?;
    let confirm = page.select_one("#confirm_password")?;

    page.type_text("#password", "same")?;
    page.type_text("#confirm_password", "same")?;
    page.type_text("#password", "different")?;
    assert!(page.check_validity(confirm)?);
    Ok(())
}

#[test]
fn password_edits_revalidate_confirmation_when_enabled() -> Result<()> {
    let mut page = Page::from_html(SIGNUP_HTML)?;
    let config = EnhanceConfig {
        revalidate_confirm_on_password_input: true,
        ..EnhanceConfig::default()
    };
    install(&mut page, &config)?;
    let confirm = page.select_one("#confirm_password")?;

    page.type_text("#password", "same")?;
    page.type_text("#confirm_password", "same")?;
    assert!(page.check_validity(confirm)?);

    page.type_text("#password", "different")?;
    assert_eq!(page.validation_message(confirm)?, "Passwords do not match");
    Ok(())
}

#[test]
fn meter_is_inert_without_both_fields() -> Result<()> {
    let html = r#"
        <form><div><input id='password' type='password'></div></form>
        "#;
    let mut page = Page::from_html(html)?;
    page.set_trace_stderr(false);
    page.enable_trace(true);
    let installed = install(&mut page, &EnhanceConfig::default())?;
    assert!(!installed.password_meter);

    let password = page.select_one("#password")?;
    assert_eq!(page.listener_count(password, "input"), 0);
    page.type_text("#password", "Password1!")?;
    page.assert_missing(".progress")?;

    let logs = page.take_trace_logs();
    assert!(logs.iter().any(|line| line == "[enhance] password_meter inert password=true confirm=false"));
    Ok(())
}

#[test]
fn render_meter_without_a_parent_only_scores() -> Result<()> {
    let mut page = Page::from_html("<p></p>")?;
    let field = page.create_element("input");
    page.set_value(field, "Password1!")?;
    let strength = render_meter(&mut page, field, &EnhanceConfig::default())?;
    assert_eq!(strength.score(), 5);
    page.assert_missing(".progress")?;
    Ok(())
}

#[test]
fn custom_tier_classes_are_applied() -> Result<()> {
    let mut page = Page::from_html(SIGNUP_HTML)?;
    let config = EnhanceConfig {
        tier_classes: TierClasses {
            weak: "is-weak".into(),
            medium: "is-medium".into(),
            strong: "is-strong".into(),
        },
        ..EnhanceConfig::default()
    };
    install(&mut page, &config)?;
    page.type_text("#password", "abc1")?;
    page.assert_class(".progress-bar", "is-weak")?;
    page.type_text("#password", "abC1")?;
    page.assert_class(".progress-bar", "is-medium")?;
    Ok(())
}

struct RecordingSink {
    calls: Vec<(NodeId, Option<String>)>,
}

impl ValidationSink for RecordingSink {
    fn set_validation_error(&mut self, field: NodeId, message: Option<&str>) -> Result<()> {
        self.calls.push((field, message.map(str::to_string)));
        Ok(())
    }
}

#[test]
fn confirm_passwords_reports_through_any_sink() -> Result<()> {
    let mut sink = RecordingSink { calls: Vec::new() };
    let field = NodeId(3);

    assert!(!confirm_passwords(&mut sink, field, "secret", "secreT", "nope")?);
    assert!(confirm_passwords(&mut sink, field, "secret", "secret", "nope")?);
    assert!(confirm_passwords(&mut sink, field, "", "", "nope")?);
    assert_eq!(
        sink.calls,
        vec![
            (field, Some("nope".to_string())),
            (field, None),
            (field, None),
        ]
    );
    Ok(())
}

#[test]
fn replaced_meter_handles_stay_valid_and_detached() -> Result<()> {
    let mut page = Page::from_html(SIGNUP_HTML)?;
    install(&mut page, &EnhanceConfig::default())?;
    page.type_text("#password", "abc")?;
    let first = page.select_one(".progress")?;

    page.type_text("#password", "Password1!")?;
    let second = page.select_one(".progress")?;
    assert_ne!(first, second);
    assert!(!page.is_connected(first));
    assert!(page.is_connected(second));
    assert_eq!(
        page.outer_html(first)?,
        r#"<div class="progress mt-2"><div class="progress-bar bg-danger" role="progressbar" style="width: 20%"></div></div>"#
    );
    Ok(())
}
