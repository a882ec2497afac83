use mobile_locator::driver::adapter::{Driver, Point, Selector, Viewport};
use mobile_locator::driver::scripted::{DriverCall, ScriptedDriver, ScriptedElement, ScriptedScreen};
use mobile_locator::error::{DriverError, LocatorError};

mod common;
use common::utils::{field, sel, signup_screen};

// ============================================================================
// Selector parsing
// ============================================================================

#[test]
fn selector_parse_shorthand_prefixes() {
    assert_eq!(
        Selector::parse("~Register").unwrap(),
        Selector::AccessibilityId("Register".into())
    );
    assert_eq!(
        Selector::parse(r#"//android.widget.EditText[@hint="e.g. John"]"#).unwrap(),
        Selector::XPath(r#"//android.widget.EditText[@hint="e.g. John"]"#.into())
    );
    assert_eq!(
        Selector::parse("(//android.widget.EditText)[2]").unwrap(),
        Selector::XPath("(//android.widget.EditText)[2]".into())
    );
    assert_eq!(
        Selector::parse(r#"android=new UiSelector().textContains("Residence")"#).unwrap(),
        Selector::UiAutomator(r#"new UiSelector().textContains("Residence")"#.into())
    );
    assert_eq!(
        Selector::parse("id=com.example:id/submit").unwrap(),
        Selector::ResourceId("com.example:id/submit".into())
    );
    assert_eq!(
        Selector::parse("submit_button").unwrap(),
        Selector::ResourceId("submit_button".into())
    );
}

#[test]
fn selector_parse_absolute_and_relative_xpath() {
    for raw in [
        "/hierarchy/android.widget.FrameLayout",
        "./android.view.View",
        "(/hierarchy//android.widget.Button)[1]",
        "(.//android.widget.Button)[1]",
    ] {
        assert_eq!(Selector::parse(raw).unwrap(), Selector::XPath(raw.into()), "{}", raw);
    }
    // A dot without a slash is still a resource id
    assert_eq!(
        Selector::parse("com.example.submit").unwrap(),
        Selector::ResourceId("com.example.submit".into())
    );
}

#[test]
fn selector_parse_rejects_empty_input() {
    assert!(matches!(Selector::parse(""), Err(LocatorError::EmptySelector)));
    assert!(matches!(Selector::parse("   "), Err(LocatorError::EmptySelector)));
    assert!(matches!(Selector::parse("~"), Err(LocatorError::EmptySelector)));
}

#[test]
fn selector_strategy_names() {
    assert_eq!(sel("~A").strategy(), "accessibility id");
    assert_eq!(sel("//a").strategy(), "xpath");
    assert_eq!(sel("android=new UiSelector()").strategy(), "-android uiautomator");
    assert_eq!(sel("id=x").strategy(), "id");
}

#[test]
fn selector_display_parses_back() {
    for raw in ["~First Name", "//android.view.View", "android=new UiSelector()", "id=zip"] {
        let selector = sel(raw);
        assert_eq!(selector.to_string(), raw);
        assert_eq!(sel(&selector.to_string()), selector);
    }
}

#[test]
fn selector_deserializes_from_yaml_string() {
    let selectors: Vec<Selector> = serde_yaml::from_str("- \"~Email\"\n- \"//android.widget.EditText\"\n").unwrap();
    assert_eq!(selectors, vec![sel("~Email"), sel("//android.widget.EditText")]);

    let err = serde_yaml::from_str::<Vec<Selector>>("- \"\"\n");
    assert!(err.is_err());
}

#[test]
fn viewport_point_at_fractions() {
    let viewport = Viewport {
        width: 1080,
        height: 2400,
    };
    assert_eq!(viewport.point_at(0.5, 0.75), Point::new(540, 1800));
    assert_eq!(viewport.point_at(0.5, 0.25), Point::new(540, 600));
}

// ============================================================================
// Scripted driver
// ============================================================================

fn swipe_up(driver: &mut ScriptedDriver) {
    driver
        .perform_swipe(Point::new(540, 1800), Point::new(540, 600), 1000)
        .unwrap();
}

#[test]
fn scripted_rows_outside_viewport_are_not_visible() {
    let mut driver = ScriptedDriver::new(signup_screen());

    let first = driver.find(&sel("~First Name")).unwrap().unwrap();
    let submit = driver.find(&sel("~Submit")).unwrap().unwrap();
    assert!(driver.is_visible(&first).unwrap());
    assert!(!driver.is_visible(&submit).unwrap());
    assert!(driver.find(&sel("~Nope")).unwrap().is_none());
}

#[test]
fn scripted_handles_go_stale_after_scroll() {
    let mut driver = ScriptedDriver::new(signup_screen());
    let first = driver.find(&sel("~First Name")).unwrap().unwrap();

    swipe_up(&mut driver);
    assert_eq!(driver.offset(), 5);

    let err = driver.is_visible(&first).unwrap_err();
    assert!(err.is_stale());

    let fresh = driver.find(&sel("~First Name")).unwrap().unwrap();
    assert!(!driver.is_visible(&fresh).unwrap());
}

#[test]
fn scripted_scroll_stops_at_end_of_list() {
    let mut driver = ScriptedDriver::new(signup_screen());
    for _ in 0..4 {
        swipe_up(&mut driver);
    }
    assert_eq!(driver.offset(), 10);
    assert_eq!(driver.swipe_count(), 4);
}

#[test]
fn scripted_keyboard_absorbs_swipes() {
    let mut driver = ScriptedDriver::new(signup_screen());
    let first = driver.find(&sel("~First Name")).unwrap().unwrap();
    driver.tap(&first).unwrap();
    assert!(driver.keyboard_shown());

    swipe_up(&mut driver);
    assert_eq!(driver.offset(), 0);

    assert!(driver.hide_soft_input().unwrap());
    swipe_up(&mut driver);
    assert_eq!(driver.offset(), 5);
}

#[test]
fn scripted_field_drops_first_keystroke() {
    let screen = ScriptedScreen::new(vec![field("Name", 0).dropping_first_writes(1)]);
    let mut driver = ScriptedDriver::new(screen);
    let name = driver.find(&sel("~Name")).unwrap().unwrap();

    driver.set_text(&name, "Jane").unwrap();
    assert_eq!(driver.get_text(&name).unwrap(), "ane");
    driver.clear_text(&name).unwrap();
    driver.set_text(&name, "Jane").unwrap();
    assert_eq!(driver.get_text(&name).unwrap(), "Jane");
}

#[test]
fn scripted_overlay_options_appear_only_when_open() {
    let screen = ScriptedScreen::new(vec![
        ScriptedElement::new(vec![sel("~Color")])
            .at_row(0)
            .with_options(vec![ScriptedElement::new(vec![sel("~Red")]).with_label("Red")]),
    ]);
    let mut driver = ScriptedDriver::new(screen);
    assert!(driver.find(&sel("~Red")).unwrap().is_none());

    let trigger = driver.find(&sel("~Color")).unwrap().unwrap();
    driver.tap(&trigger).unwrap();
    let red = driver.find(&sel("~Red")).unwrap().unwrap();
    driver.tap(&red).unwrap();

    assert_eq!(driver.value_of(&sel("~Color")), Some("Red"));
    assert!(driver.find(&sel("~Red")).unwrap().is_none());
}

#[test]
fn scripted_lost_session_fails_every_call() {
    let mut driver = ScriptedDriver::new(signup_screen());
    driver.lose_session();
    let err = driver.find(&sel("~First Name")).unwrap_err();
    assert!(matches!(err, DriverError::SessionLost(_)));
    assert!(driver.screenshot().is_err());
}

#[test]
fn scripted_records_calls_in_order() {
    let mut driver = ScriptedDriver::new(signup_screen());
    driver.viewport().unwrap();
    driver.pause(250);
    assert_eq!(driver.calls(), &[DriverCall::Viewport, DriverCall::Pause(250)]);
    assert_eq!(driver.total_paused_ms(), 250);
}

#[test]
fn scripted_screen_loads_from_yaml() {
    let yaml = r#"
rows_per_screen: 4
elements:
  - selectors: ["~Email"]
    label: Email
    row: 0
    editable: true
  - selectors: ["~Submit"]
    row: 9
"#;
    let screen = ScriptedScreen::from_yaml(yaml).unwrap();
    assert_eq!(screen.rows_per_screen, 4);
    assert_eq!(screen.width, 1080);
    assert_eq!(screen.elements.len(), 2);
    assert!(screen.elements[0].editable);
    assert!(screen.elements[1].clickable);
    assert_eq!(screen.elements[1].row, Some(9));
}
