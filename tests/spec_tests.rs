use std::collections::HashMap;

use mobile_locator::error::LocatorError;
use mobile_locator::locator::model::OptionMatch;
use mobile_locator::spec::{
    context::TestContext,
    spec_model::{MatchMode, ScenarioSpec, Step, StepOutcome, StepStatus},
    template::{Template, generate},
};

mod common;
use common::utils::{sel, sels};

// =========================================================================
// Helpers
// =========================================================================

fn outcome(index: usize, status: StepStatus) -> StepOutcome {
    StepOutcome {
        index,
        action: format!("step {}", index),
        status,
        detail: None,
    }
}

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// =========================================================================
// Scenario YAML
// =========================================================================

#[test]
fn scenario_parses_every_step_kind() {
    let yaml = r#"
name: everything
steps:
  - action: tap
    target: ["~Next"]
  - action: fill
    target: ["~Email", "//android.widget.EditText[1]"]
    value: a@b.c
    verify: false
  - action: select
    target: ["~Residence"]
    option: Tex
    match_mode: contains
  - action: scroll_to
    target: ["~Submit"]
    max_scrolls: 8
  - action: scroll_to_end
  - action: hide_keyboard
  - action: wait
    duration_ms: 300
  - action: wait_for
    target: ["~Home"]
  - action: assert_visible
    target: ["~Home"]
  - action: assert_text
    target: ["~Greeting"]
    expected: Hello
  - action: assert_validation
    probes: ["~error"]
    expect_messages: true
  - action: screenshot
    name: done
"#;
    let spec: ScenarioSpec = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(spec.steps.len(), 12);

    assert_eq!(
        spec.steps[1],
        Step::Fill {
            target: sels(&["~Email", "//android.widget.EditText[1]"]),
            value: "a@b.c".into(),
            verify: false,
        }
    );
    assert_eq!(
        spec.steps[2],
        Step::Select {
            target: sels(&["~Residence"]),
            option: Some("Tex".into()),
            match_mode: MatchMode::Contains,
        }
    );
    assert_eq!(
        spec.steps[3],
        Step::ScrollTo {
            target: sels(&["~Submit"]),
            max_scrolls: Some(8),
        }
    );
    assert_eq!(spec.steps[4], Step::ScrollToEnd { until: None });
    assert_eq!(
        spec.steps[7],
        Step::WaitFor {
            target: sels(&["~Home"]),
            timeout_ms: 10_000,
        }
    );
}

#[test]
fn fill_verifies_by_default() {
    let yaml = r#"
name: defaults
steps:
  - action: fill
    target: ["~Name"]
    value: Jane
  - action: select
    target: ["~Color"]
"#;
    let spec: ScenarioSpec = serde_yaml::from_str(yaml).unwrap();
    match &spec.steps[0] {
        Step::Fill { verify, .. } => assert!(*verify),
        other => panic!("Expected Fill, got {:?}", other),
    }
    match &spec.steps[1] {
        Step::Select {
            option, match_mode, ..
        } => {
            assert!(option.is_none());
            assert_eq!(*match_mode, MatchMode::Exact);
        }
        other => panic!("Expected Select, got {:?}", other),
    }
}

#[test]
fn scenario_rejects_unknown_action_and_empty_selector() {
    let unknown = "name: x\nsteps:\n  - action: swipe_left\n";
    assert!(serde_yaml::from_str::<ScenarioSpec>(unknown).is_err());

    let empty = "name: x\nsteps:\n  - action: tap\n    target: [\"\"]\n";
    assert!(serde_yaml::from_str::<ScenarioSpec>(empty).is_err());
}

#[test]
fn step_describe_uses_first_candidate() {
    let step = Step::Tap {
        target: sels(&["~Submit", "//android.widget.Button"]),
    };
    assert_eq!(step.describe(), "tap ~Submit");
    assert_eq!(step.action_name(), "tap");
    assert_eq!(Step::HideKeyboard.describe(), "hide_keyboard");
    assert_eq!(Step::Wait { duration_ms: 200 }.describe(), "wait 200ms");
}

#[test]
fn match_mode_builds_option_match() {
    assert_eq!(
        MatchMode::Exact.option_match("Texas".into()),
        OptionMatch::Exact("Texas".into())
    );
    assert!(MatchMode::Contains.option_match("exa".into()).matches("Texas"));
    assert!(!MatchMode::Exact.option_match("texas".into()).matches("Texas"));
}

// =========================================================================
// Variations
// =========================================================================

#[test]
fn scenario_without_variations_is_one_run() {
    let spec: ScenarioSpec =
        serde_yaml::from_str("name: single\nvariables: {a: '1'}\nsteps: []\n").unwrap();
    let runs = spec.runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].name, "single");
    assert_eq!(runs[0].variables, vars(&[("a", "1")]));
}

#[test]
fn variation_variables_override_scenario_variables() {
    let yaml = r#"
name: signup
variables:
  age: "30"
  state: Texas
steps:
  - action: hide_keyboard
variations:
  - name: adult
  - name: minor
    variables:
      age: "15"
"#;
    let spec: ScenarioSpec = serde_yaml::from_str(yaml).unwrap();
    let runs = spec.runs();

    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].name, "signup [adult]");
    assert_eq!(runs[0].variables, vars(&[("age", "30"), ("state", "Texas")]));
    assert_eq!(runs[1].name, "signup [minor]");
    assert_eq!(runs[1].variables, vars(&[("age", "15"), ("state", "Texas")]));
    assert_eq!(runs[1].steps, spec.steps);
}

// =========================================================================
// Templates
// =========================================================================

#[test]
fn template_substitutes_variables() {
    let variables = vars(&[("first", "Jane"), ("last", "Doe")]);
    let template = Template::new(&variables, 7);
    assert_eq!(template.render("${first} ${last}"), "Jane Doe");
    assert_eq!(template.render("plain"), "plain");
}

#[test]
fn template_leaves_unknown_variables_visible() {
    let variables = vars(&[]);
    let template = Template::new(&variables, 7);
    assert_eq!(template.render("hi ${who}!"), "hi ${who}!");
    assert_eq!(template.render("broken ${open"), "broken ${open");
}

#[test]
fn template_generates_data() {
    let variables = vars(&[("domain", "example.org")]);
    let template = Template::new(&variables, 1234567890);
    assert_eq!(
        template.render("{{gen:email}}"),
        "test.user.1234567890@example.com"
    );
    assert_eq!(template.render("user-{{gen:name}}"), "user-TestUser1234567890");
    assert_eq!(template.render("{{ gen:zipcode }}"), "{{ gen:zipcode }}");
    assert_eq!(template.render("{{gen: zipcode}}"), "67890");
}

#[test]
fn template_renders_selector_values() {
    let variables = vars(&[("label", "Last Name")]);
    let template = Template::new(&variables, 1);
    assert_eq!(
        template.render_selector(&sel("~${label}")).unwrap(),
        sel("~Last Name")
    );
    assert_eq!(
        template.render_selectors(&sels(&["id=${label}", "//x"])).unwrap(),
        sels(&["id=Last Name", "//x"])
    );
}

#[test]
fn template_variable_can_choose_selector_kind() {
    let variables = vars(&[("field", "~First Name"), ("path", "//android.widget.EditText")]);
    let template = Template::new(&variables, 1);

    let rendered = template.render_selector(&sel("${field}")).unwrap();
    assert_eq!(rendered, sel("~First Name"));
    assert_eq!(rendered.strategy(), "accessibility id");
    assert_eq!(
        template.render_selector(&sel("${path}")).unwrap(),
        sel("//android.widget.EditText")
    );
}

#[test]
fn template_rejects_selector_that_renders_empty() {
    let variables = vars(&[("label", "")]);
    let template = Template::new(&variables, 1);

    assert!(matches!(
        template.render_selector(&sel("~${label}")),
        Err(LocatorError::EmptySelector)
    ));
    assert!(matches!(
        template.render_selectors(&sels(&["~Email", "${label}"])),
        Err(LocatorError::EmptySelector)
    ));
}

#[test]
fn template_keeps_untemplated_resource_ids() {
    let variables = vars(&[]);
    let template = Template::new(&variables, 1);
    let explicit = sel("id=~literal");
    assert_eq!(template.render_selector(&explicit).unwrap(), explicit);
}

#[test]
fn generate_kinds() {
    assert_eq!(generate("phone", 1234567890), "5554567890");
    assert_eq!(generate("ssn", 1234567890), "123-45-7890");
    assert_eq!(generate("zipcode", 42), "00042");
    assert_eq!(generate("anything", 5), "test_5");
}

// =========================================================================
// Context
// =========================================================================

#[test]
fn context_counts_outcomes() {
    let mut ctx = TestContext::new();
    assert!(ctx.all_passed());

    ctx.record(outcome(0, StepStatus::Passed));
    ctx.record(outcome(1, StepStatus::Partial));
    assert!(ctx.all_passed());

    ctx.record(outcome(2, StepStatus::Failed));
    assert!(!ctx.all_passed());
    assert_eq!(ctx.pass_count(), 1);
    assert_eq!(ctx.partial_count(), 1);
    assert_eq!(ctx.fail_count(), 1);
    assert_eq!(ctx.total_count(), 3);
}

#[test]
fn context_keeps_only_captured_artifacts() {
    let mut ctx = TestContext::new();
    ctx.add_artifact(None);
    ctx.add_artifact(Some("shots/a.png".into()));
    assert_eq!(ctx.artifacts.len(), 1);
}
