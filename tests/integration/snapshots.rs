use std::path::Path;

/// Full generated output for a small two-component device, pinned as an
/// inline snapshot so rendering changes are reviewed deliberately.
#[test]
fn snapshot_small_device() {
    let config = r#"
[device]
name = "snap"
board = "esp8266"

[[component]]
kind = "gpio.switch"
id = "relay"
pin = 5

[[component]]
kind = "template.binary_sensor"
id = "relay_on"
lambda = "return id(relay).state;"
update_interval = "1s"
"#;

    let output = emberc::generate_source(config, Path::new("device.toml")).unwrap();

    insta::assert_snapshot!(output.main_cpp, @r#"
// Generated by emberc for device 'snap'. Do not edit.
#define EMBER_BOARD_ESP8266
#include "ember/application.h"
#include "ember/gpio.h"
#include "ember/template.h"

using namespace ember;

Application App("snap");

gpio::Switch relay;
template_::BinarySensor relay_on;
bool shared_lambda_0() {
  return relay.state;
}

void setup() {
  // relay (gpio.switch)
  relay.set_pin(5);
  App.register_switch(&relay);
  // relay_on (template.binary_sensor)
  relay_on.set_state_lambda(shared_lambda_0);
  relay_on.set_update_interval(1000);
  App.register_binary_sensor(&relay_on);
  // scheduler
  App.set_loop_interval(1000);
  App.setup();
}

void loop() {
  App.loop();
}
"#);
}
