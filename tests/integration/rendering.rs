//! Rendering whole documents against a site directory.

use std::time::{Duration, SystemTime};

use anyhow::Result;
use mocha_template::core::MochaError;
use mocha_template::templating::ApiOutputFormat;
use mocha_template::test_utils::{TestSite, init_test_logging};

const PAGE: &str = r#"<html><head><script type="server/rhai" src="/lib/util.rhai"></script><script type="server/rhai">let people = [#{ name: "Ada", admin: true }, #{ name: "Linus", admin: false }];</script></head><body><h1>${title("team")}</h1><ul><li data-for-person-i="people" class="row-${i}">${person.name}<b data-if="person.admin"> (admin)</b></li></ul><!-- server-comment internal --><!-- kept --></body></html>"#;

const UTIL: &str = r#"fn title(s) { "The " + s }"#;

#[test]
fn test_render_site_page() -> Result<()> {
    init_test_logging(None);
    let site = TestSite::new()?;
    site.write("lib/util.rhai", UTIL)?;

    let html = site.engine(PAGE)?.parse()?;
    assert_eq!(
        html,
        r#"<html><head></head><body><h1>The team</h1><ul><li class="row-0">Ada<b> (admin)</b></li><li class="row-1">Linus</li></ul><!-- kept --></body></html>"#
    );
    Ok(())
}

#[test]
fn test_scripts_shared_between_renders() -> Result<()> {
    let site = TestSite::new()?;
    site.write("lib/util.rhai", UTIL)?;

    let first = site.engine(PAGE)?.parse()?;
    let second = site.engine(PAGE)?.parse()?;
    assert_eq!(first, second);

    let caches = site.caches();
    assert_eq!(caches.scripts.len(), 1);
    assert_eq!(caches.scripts.stats(), (1, 1));
    Ok(())
}

#[test]
fn test_modified_script_is_reloaded() -> Result<()> {
    let site = TestSite::new()?;
    let script = site.write("lib/util.rhai", UTIL)?;
    assert!(site.engine(PAGE)?.parse()?.contains("<h1>The team</h1>"));

    site.write("lib/util.rhai", r#"fn title(s) { "Our " + s }"#)?;
    let later = SystemTime::now() + Duration::from_secs(10);
    std::fs::File::options().write(true).open(&script)?.set_modified(later)?;

    assert!(site.engine(PAGE)?.parse()?.contains("<h1>Our team</h1>"));
    assert_eq!(site.caches().scripts.len(), 1);
    Ok(())
}

#[test]
fn test_missing_script_source() -> Result<()> {
    let site = TestSite::new()?;
    let err = site.engine(PAGE)?.parse().unwrap_err();
    assert!(matches!(err, MochaError::ResourceNotFound { location } if location == "/lib/util.rhai"));
    Ok(())
}

#[test]
fn test_script_source_outside_site_refused() -> Result<()> {
    let site = TestSite::new()?;
    site.write("inner/page.rhai", "1")?;
    let engine = site.engine(r#"<script type="server/rhai" src="../secret.rhai"></script>"#)?;
    assert!(matches!(engine.parse().unwrap_err(), MochaError::ResourceNotFound { .. }));
    Ok(())
}

#[test]
fn test_exec_api_document() -> Result<()> {
    let site = TestSite::new()?;
    site.write("lib/users.rhai", r#"fn users() { [#{ id: 1, name: "ada" }, #{ id: 2, name: "linus" }] }"#)?;
    let api = r#"<script type="server/rhai" src="lib/users.rhai"></script><script type="server/rhai">let id = request_body.id; let found = []; for u in users() { if u.id == id { found.push(u); } } #{ count: found.len(), user: found[0].name }</script>"#;

    let mut engine = site.engine(api)?;
    engine.put_json("request_body", r#"{"id": 2}"#)?;
    let json: serde_json::Value = serde_json::from_str(&engine.exec_to(ApiOutputFormat::Json)?)?;
    assert_eq!(json, serde_json::json!({"count": 1, "user": "linus"}));

    let mut engine = site.engine(api)?;
    engine.put_json("request_body", r#"{"id": 1}"#)?;
    let format: ApiOutputFormat = "text/xml".parse()?;
    assert_eq!(engine.exec_to(format)?, "<result><count>1</count><user>ada</user></result>");
    Ok(())
}

#[test]
fn test_failing_expression_aborts_render() -> Result<()> {
    let site = TestSite::new()?;
    let engine = site.engine(r#"<p>ok</p><p data-if="undefined_function()">never</p>"#)?;
    let err = engine.parse().unwrap_err();
    assert!(
        matches!(&err, MochaError::Expression { expression, .. } if expression == "undefined_function()"),
        "{err}"
    );
    Ok(())
}
