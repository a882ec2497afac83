use mobile_locator::driver::scripted::{ScriptedDriver, ScriptedScreen};
use mobile_locator::locator::Locator;
use mobile_locator::locator::model::OptionMatch;
use mobile_locator::locator::settings::{FallbackPolicy, LocatorSettings};

mod common;
use common::utils::{button, option, residence, sel, sels, signup_screen};

#[test]
fn fallback_picks_first_valid_option() {
    let mut driver = ScriptedDriver::new(signup_screen());
    let mut locator = Locator::new(&mut driver, LocatorSettings::default());

    let selected = locator
        .select_from_dropdown(&sels(&["~Residence"]), None)
        .unwrap()
        .unwrap();
    // Scrim and the empty row are skipped
    assert_eq!(selected.label, "Alabama");
    assert_eq!(selected.index, 0);
    assert!(!selected.matched_preferred);
    assert_eq!(driver.value_of(&sel("~Residence")), Some("Alabama"));
}

#[test]
fn preferred_exact_option_is_selected() {
    let mut driver = ScriptedDriver::new(signup_screen());
    let mut locator = Locator::new(&mut driver, LocatorSettings::default());

    let preferred = OptionMatch::Exact("Texas".into());
    let selected = locator
        .select_from_dropdown(&sels(&["~Residence"]), Some(&preferred))
        .unwrap()
        .unwrap();
    assert_eq!(selected.label, "Texas");
    assert_eq!(selected.index, 1);
    assert!(selected.matched_preferred);
    assert_eq!(driver.value_of(&sel("~Residence")), Some("Texas"));
}

#[test]
fn preferred_contains_option_is_selected() {
    let mut driver = ScriptedDriver::new(signup_screen());
    let mut locator = Locator::new(&mut driver, LocatorSettings::default());

    let preferred = OptionMatch::Contains("laba".into());
    let selected = locator
        .select_from_dropdown(&sels(&["~Residence"]), Some(&preferred))
        .unwrap()
        .unwrap();
    assert_eq!(selected.label, "Alabama");
    assert!(selected.matched_preferred);
}

#[test]
fn unknown_preferred_option_falls_back() {
    let mut driver = ScriptedDriver::new(signup_screen());
    let mut locator = Locator::new(&mut driver, LocatorSettings::default());

    let preferred = OptionMatch::Exact("texas".into());
    let selected = locator
        .select_from_dropdown(&sels(&["~Residence"]), Some(&preferred))
        .unwrap()
        .unwrap();
    assert_eq!(selected.label, "Alabama");
    assert!(!selected.matched_preferred);
}

#[test]
fn seeded_fallback_is_reproducible() {
    let mut settings = LocatorSettings::default();
    settings.dropdown.fallback = FallbackPolicy::Seeded(3);

    for _ in 0..2 {
        let mut driver = ScriptedDriver::new(signup_screen());
        let mut locator = Locator::new(&mut driver, settings.clone());
        let selected = locator
            .select_from_dropdown(&sels(&["~Residence"]), None)
            .unwrap()
            .unwrap();
        assert_eq!(selected.label, "Texas");
        assert_eq!(selected.index, 1);
    }
}

#[test]
fn fallback_policy_pick() {
    assert_eq!(FallbackPolicy::First.pick(0), None);
    assert_eq!(FallbackPolicy::First.pick(4), Some(0));
    assert_eq!(FallbackPolicy::Seeded(10).pick(4), Some(2));
    assert_eq!(FallbackPolicy::Seeded(10).pick(0), None);
}

#[test]
fn dropdown_without_valid_options_selects_nothing() {
    let screen = ScriptedScreen::new(vec![
        button("Country", 0).with_options(vec![
            option("Scrim"),
            option("  "),
            option("Disabled").not_clickable(),
            option("Invisible").hidden(),
        ]),
    ]);
    let mut driver = ScriptedDriver::new(screen);
    let mut locator = Locator::new(&mut driver, LocatorSettings::default());

    let selected = locator
        .select_from_dropdown(&sels(&["~Country"]), None)
        .unwrap();
    assert!(selected.is_none());
    assert_eq!(driver.value_of(&sel("~Country")), Some(""));
}

#[test]
fn missing_trigger_selects_nothing() {
    let mut driver = ScriptedDriver::new(signup_screen());
    let settings = LocatorSettings {
        max_scroll_attempts: 1,
        ..LocatorSettings::default()
    };
    let mut locator = Locator::new(&mut driver, settings);

    let selected = locator
        .select_from_dropdown(&sels(&["~Nationality"]), None)
        .unwrap();
    assert!(selected.is_none());
}

#[test]
fn dropdown_options_lists_valid_labels_in_order() {
    let screen = ScriptedScreen::new(vec![residence(0)]);
    let mut driver = ScriptedDriver::new(screen);
    let mut locator = Locator::new(&mut driver, LocatorSettings::default());

    assert!(locator.dropdown_options().unwrap().is_empty());
    locator.tap_target(&sels(&["~Residence"])).unwrap().unwrap();
    assert_eq!(locator.dropdown_options().unwrap(), vec!["Alabama", "Texas"]);
}

#[test]
fn dropdown_waits_for_option_list() {
    let mut driver = ScriptedDriver::new(ScriptedScreen::new(vec![residence(0)]));
    let settings = LocatorSettings::default();
    let settle = settings.dropdown.settle_ms;
    let mut locator = Locator::new(&mut driver, settings);

    locator
        .select_from_dropdown(&sels(&["~Residence"]), None)
        .unwrap()
        .unwrap();
    assert_eq!(driver.total_paused_ms(), settle);
}
