mod common;
use common::{emberc, generate_ok, validate};

const GREENHOUSE: &str = r#"
[device]
name = "greenhouse"
board = "esp32"

[[component]]
kind = "logger"

[[component]]
kind = "gpio.switch"
id = "relay_1"
pin = 5

[[component]]
kind = "adc.sensor"
id = "soil_moisture"
pin = 34
update_interval = "60s"

[[component]]
kind = "template.sensor"
id = "soil_percent"
lambda = "return id(soil_moisture).state * 100.0;"
update_interval = "60s"

[[component]]
kind = "interval"
interval = "5min"
then = "id(relay_1).toggle();"
"#;

#[test]
fn generates_main_cpp_skeleton() {
    let main_cpp = generate_ok(GREENHOUSE);
    assert!(main_cpp.contains("#define EMBER_BOARD_ESP32"));
    assert!(main_cpp.contains("#include \"ember/application.h\""));
    assert!(main_cpp.contains("using namespace ember;"));
    assert!(main_cpp.contains("Application App(\"greenhouse\");"));
    assert!(main_cpp.contains("void setup() {"));
    assert!(main_cpp.contains("void loop() {"));
    assert!(main_cpp.contains("App.setup();"));
    assert!(main_cpp.contains("App.loop();"));
}

#[test]
fn component_instances_become_globals() {
    let main_cpp = generate_ok(GREENHOUSE);
    assert!(main_cpp.contains("gpio::Switch relay_1;"));
    assert!(main_cpp.contains("adc::Sensor soil_moisture;"));
    assert!(main_cpp.contains("template_::Sensor soil_percent;"));
    assert!(main_cpp.contains("IntervalTrigger interval_0;"));
}

#[test]
fn id_references_are_rewritten_to_globals() {
    let main_cpp = generate_ok(GREENHOUSE);
    // Lambda bodies reference the generated globals directly.
    assert!(main_cpp.contains("soil_moisture.state * 100.0;"));
    assert!(main_cpp.contains("relay_1.toggle();"));
    assert!(!main_cpp.contains("id(soil_moisture)"));
    assert!(!main_cpp.contains("id(relay_1)"));
}

#[test]
fn setup_runs_hardware_before_processors_before_intervals() {
    let main_cpp = generate_ok(GREENHOUSE);
    let logger = main_cpp.find("log_init(").unwrap();
    let relay = main_cpp.find("relay_1.set_pin(5);").unwrap();
    let adc = main_cpp.find("soil_moisture.set_pin(34);").unwrap();
    let template = main_cpp.find("soil_percent.set_state_lambda(").unwrap();
    let interval = main_cpp.find("interval_0.set_interval(300000);").unwrap();
    assert!(logger < relay);
    assert!(relay < template || adc < template);
    assert!(template < interval);
}

#[test]
fn loop_interval_follows_fastest_update_interval() {
    let main_cpp = generate_ok(GREENHOUSE);
    assert!(main_cpp.contains("App.set_loop_interval(60000);"));
}

#[test]
fn regenerating_unchanged_config_skips_the_write() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("device.toml");
    let out_dir = dir.path().join("build");
    std::fs::write(&config_path, GREENHOUSE).unwrap();

    let first = emberc()
        .arg("generate")
        .arg(&config_path)
        .arg("-o")
        .arg(&out_dir)
        .output()
        .unwrap();
    assert!(first.status.success());
    assert!(String::from_utf8_lossy(&first.stderr).contains("wrote"));

    let second = emberc()
        .arg("generate")
        .arg(&config_path)
        .arg("-o")
        .arg(&out_dir)
        .output()
        .unwrap();
    assert!(second.status.success());
    assert!(String::from_utf8_lossy(&second.stderr).contains("unchanged"));
}

#[test]
fn report_file_contains_lambda_stats() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("device.toml");
    let out_dir = dir.path().join("build");
    let report_path = dir.path().join("report.json");
    std::fs::write(&config_path, GREENHOUSE).unwrap();

    let output = emberc()
        .arg("generate")
        .arg(&config_path)
        .arg("-o")
        .arg(&out_dir)
        .arg("--report")
        .arg(&report_path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["device"], "greenhouse");
    assert_eq!(report["board"], "esp32");
    assert_eq!(report["components"], 5);
    assert_eq!(report["lambdas"]["constructed"], 2);
}

#[test]
fn validate_accepts_good_config() {
    let (ok, stderr) = validate(GREENHOUSE);
    assert!(ok, "validate failed: {stderr}");
    assert!(stderr.contains("configuration valid"));
    assert!(stderr.contains("5 component(s)"));
}
