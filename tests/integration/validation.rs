mod common;
use common::generate_should_fail_with;

const HEADER: &str = "[device]\nname = \"t\"\nboard = \"esp32\"\n";

#[test]
fn rejects_missing_device_section() {
    generate_should_fail_with("[[component]]\nkind = \"logger\"\n", "missing [device]");
}

#[test]
fn rejects_toml_syntax_errors() {
    generate_should_fail_with("[device\nname = \"x\"\n", "invalid syntax");
}

#[test]
fn rejects_unknown_board() {
    generate_should_fail_with(
        "[device]\nname = \"t\"\nboard = \"arduino_mega\"\n",
        "unknown board 'arduino_mega'",
    );
}

#[test]
fn rejects_unknown_component_kind() {
    let config = format!("{HEADER}[[component]]\nkind = \"warp.core\"\nid = \"w\"\n");
    generate_should_fail_with(&config, "unknown kind 'warp.core'");
}

#[test]
fn rejects_duplicate_ids() {
    let config = format!(
        "{HEADER}[[component]]\nkind = \"gpio.switch\"\nid = \"r\"\npin = 4\n\n[[component]]\nkind = \"gpio.switch\"\nid = \"r\"\npin = 5\n"
    );
    generate_should_fail_with(&config, "duplicate component id 'r'");
}

#[test]
fn rejects_pin_conflicts() {
    let config = format!(
        "{HEADER}[[component]]\nkind = \"gpio.switch\"\nid = \"a\"\npin = 4\n\n[[component]]\nkind = \"status_led\"\nid = \"led\"\npin = 4\n"
    );
    generate_should_fail_with(&config, "pin 4 is claimed by both");
}

#[test]
fn rejects_missing_required_option() {
    let config = format!("{HEADER}[[component]]\nkind = \"template.sensor\"\nid = \"t1\"\n");
    generate_should_fail_with(&config, "requires 'lambda'");
}

#[test]
fn rejects_unknown_id_reference_with_source_snippet() {
    let config = format!(
        "{HEADER}[[component]]\nkind = \"template.sensor\"\nid = \"t1\"\nlambda = \"return id(ghost).state;\"\n"
    );
    // The ariadne report quotes the offending lambda line.
    generate_should_fail_with(&config, "unknown id 'ghost'");
}

#[test]
fn rejects_reference_cycles() {
    let config = format!(
        "{HEADER}\
[[component]]\nkind = \"template.sensor\"\nid = \"a\"\nlambda = \"return id(b).state;\"\n\n\
[[component]]\nkind = \"template.sensor\"\nid = \"b\"\nlambda = \"return id(a).state;\"\n"
    );
    generate_should_fail_with(&config, "circular id references");
}

#[test]
fn rejects_adc_on_non_adc_pin() {
    let config = format!("{HEADER}[[component]]\nkind = \"adc.sensor\"\nid = \"a\"\npin = 5\n");
    generate_should_fail_with(&config, "not ADC-capable");
}

#[test]
fn rejects_bad_duration() {
    let config = format!(
        "{HEADER}[[component]]\nkind = \"adc.sensor\"\nid = \"a\"\npin = 34\nupdate_interval = \"whenever\"\n"
    );
    generate_should_fail_with(&config, "invalid update_interval 'whenever'");
}
