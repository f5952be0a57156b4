use form_enhancer::{
    AlertPhase, EnhanceConfig, Error, NodeId, Page, Result, ScrollBehavior, install,
};

const SIGNUP_PAGE: &str = r##"
<!DOCTYPE html>
<html>
  <body>
    <nav class="navbar">
      <a class="nav-link" href="#register-card">Sign up</a>
      <a class="nav-link" href="/login">Log in</a>
    </nav>
    <div class="container">
      <div class="alert alert-info" role="alert">Welcome back!</div>
      <div id="register-card" class="card">
        <form id="register" action="/register" method="post">
          <div class="mb-3">
            <label for="username" class="form-label">Username</label>
            <input id="username" name="username" class="form-control" required minlength="3">
          </div>
          <div class="mb-3">
            <label for="password" class="form-label">Password</label>
            <input id="password" name="password" type="password" class="form-control" required>
          </div>
          <div class="mb-3">
            <label for="confirm_password" class="form-label">Confirm password</label>
            <input id="confirm_password" name="confirm_password" type="password" class="form-control" required>
          </div>
          <button id="submit" type="submit" class="btn btn-primary">Register</button>
        </form>
      </div>
    </div>
  </body>
</html>
"##;

fn select(page: &Page, selector: &str) -> Result<NodeId> {
    page.query_selector(selector)?
        .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
}

#[test]
fn strong_then_weak_password_updates_a_single_meter() -> Result<()> {
    let mut page = Page::from_html(SIGNUP_PAGE)?;
    install(&mut page, &EnhanceConfig::default())?;

    page.type_text("#password", "Password1!")?;
    page.assert_count(".progress", 1)?;
    page.assert_style(".progress-bar", "width", "100%")?;
    page.assert_class(".progress-bar", "bg-success")?;

    page.type_text("#password", "abc")?;
    page.assert_count(".progress", 1)?;
    page.assert_style(".progress-bar", "width", "20%")?;
    page.assert_class(".progress-bar", "bg-danger")?;
    Ok(())
}

#[test]
fn full_registration_flow() -> Result<()> {
    let mut page = Page::from_html(SIGNUP_PAGE)?;
    page.set_location("https://example.test/");
    let installed = install(&mut page, &EnhanceConfig::default())?;
    assert!(installed.password_meter);

    page.click("a.nav-link")?;
    let card = select(&page, "#register-card")?;
    let scrolls = page.scroll_log();
    assert_eq!(scrolls.len(), 1);
    assert_eq!(scrolls[0].target, card);
    assert_eq!(scrolls[0].behavior, ScrollBehavior::Smooth);

    page.type_text("#username", "ada")?;
    page.type_text("#password", "Password1!")?;
    page.type_text("#confirm_password", "Password2!")?;

    page.click("#submit")?;
    assert!(page.submissions().is_empty());
    page.assert_text("#submit", "Register")?;
    page.assert_disabled("#submit", false)?;

    page.type_text("#confirm_password", "Password1!")?;
    page.click("#submit")?;
    page.assert_disabled("#submit", true)?;
    page.assert_text("#submit", " Loading...")?;

    let submissions = page.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].method, "post");
    assert_eq!(
        submissions[0].fields,
        vec![
            ("username".to_string(), "ada".to_string()),
            ("password".to_string(), "Password1!".to_string()),
            ("confirm_password".to_string(), "Password1!".to_string()),
        ]
    );

    page.advance_time(5_000)?;
    page.assert_style(".alert", "opacity", "0")?;
    assert_eq!(installed.alerts[0].phase(), AlertPhase::Fading);
    page.advance_time(300)?;
    page.assert_missing(".alert")?;
    assert_eq!(installed.alerts[0].phase(), AlertPhase::Removed);
    Ok(())
}

#[test]
fn page_without_password_fields_still_gets_other_behaviors() -> Result<()> {
    let html = r##"
        <a href="#bottom">down</a>
        <div class="alert">hello</div>
        <form><input name="q"><button type="submit" id="go">Go</button></form>
        <div id="bottom"></div>
    "##;
    let mut page = Page::from_html(html)?;
    let installed = install(&mut page, &EnhanceConfig::default())?;
    assert!(!installed.password_meter);

    page.click("a")?;
    assert_eq!(page.scroll_log().len(), 1);

    page.click("#go")?;
    page.assert_disabled("#go", true)?;

    page.flush()?;
    page.assert_missing(".alert")?;
    Ok(())
}

#[test]
fn listener_errors_surface_to_the_caller() -> Result<()> {
    let mut page = Page::from_html(SIGNUP_PAGE)?;
    install(&mut page, &EnhanceConfig::default())?;
    let password = select(&page, "#password")?;
    page.add_event_listener(password, "input", |_page, _event| {
        Err(Error::Runtime("boom".into()))
    })?;

    match page.type_text("#password", "Password1!") {
        Err(Error::Runtime(message)) => assert_eq!(message, "boom"),
        other => panic!("expected listener error, got: {other:?}"),
    }
    // The meter listener ran first.
    page.assert_style(".progress-bar", "width", "100%")?;
    Ok(())
}
