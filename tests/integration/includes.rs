//! External partials through `data-include`.

use anyhow::Result;
use mocha_template::core::MochaError;
use mocha_template::test_utils::TestSite;

#[test]
fn test_nested_external_includes() -> Result<()> {
    let site = TestSite::new()?;
    site.write(
        "partials/outer.html",
        r#"<template data-type="server/template" id="outer"><section data-include="@partials/inner.html"></section></template>"#,
    )?;
    site.write(
        "partials/inner.html",
        r#"<template data-type="server/template"><em>${who}</em></template>"#,
    )?;

    let engine =
        site.engine(r#"<div data-set-who='"x"' data-include="@partials/outer.html:#outer"></div>"#)?;
    assert_eq!(engine.parse()?, "<div><section><em>x</em></section></div>");
    Ok(())
}

#[test]
fn test_selector_matches_in_order() -> Result<()> {
    let site = TestSite::new()?;
    site.write(
        "cards.html",
        r#"<html><body>
<template data-type="server/template" class="card" id="one"><b>1</b></template>
<template data-type="server/template" id="skip"><b>skip</b></template>
<template data-type="server/template" class="card wide"><b>2</b></template>
</body></html>"#,
    )?;

    let engine = site.engine(r#"<p data-include="@cards.html:.card"></p><p data-include="@cards.html:template#skip, .wide"></p>"#)?;
    assert_eq!(engine.parse()?, "<p><b>1</b><b>2</b></p><p><b>skip</b><b>2</b></p>");
    assert_eq!(site.caches().templates.len(), 1);
    Ok(())
}

#[test]
fn test_include_inside_loop() -> Result<()> {
    let site = TestSite::new()?;
    site.write(
        "item.html",
        r##"<template data-type="server/template"><script type="server/rhai">let label = "#" + n;</script><b>${label}</b></template>"##,
    )?;

    let engine = site.engine(r#"<ul><li data-for-n="[1, 2]" data-include="@/item.html"></li></ul>"#)?;
    assert_eq!(engine.parse()?, "<ul><li><b>#1</b></li><li><b>#2</b></li></ul>");
    Ok(())
}

#[test]
fn test_partial_scripts_do_not_leak() -> Result<()> {
    let site = TestSite::new()?;
    site.write(
        "partial.html",
        r#"<template data-type="server/template"><script type="server/rhai">let leaked = "inside";</script></template>"#,
    )?;

    let engine = site.engine(
        r#"<div data-include="@partial.html"></div><p data-if="is_def_var(&quot;leaked&quot;)">leak</p>"#,
    )?;
    assert_eq!(engine.parse()?, "<div></div>");
    Ok(())
}

#[test]
fn test_missing_partial() -> Result<()> {
    let site = TestSite::new()?;
    let engine = site.engine(r#"<div data-include="@nowhere.html:#x"></div>"#)?;
    assert!(matches!(
        engine.parse().unwrap_err(),
        MochaError::ResourceNotFound { location } if location == "nowhere.html"
    ));
    Ok(())
}
