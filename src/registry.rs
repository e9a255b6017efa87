//! Built-in component kinds: option requirements, setup priorities, and
//! codegen hooks, plus cross-component dependency resolution over
//! `id(...)` references.

use std::collections::{HashMap, HashSet};

use crate::codegen::GenContext;
use crate::codegen::expr::Lambda;
use crate::codegen::lambda::process_lambda;
use crate::codegen::scan;
use crate::config::{Board, Component, DeviceConfig};
use crate::diagnostics::GenError;
use crate::span::Spanned;

/// Setup ordering band. Hardware comes up before the processors that read
/// it; interval triggers attach last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SetupPriority {
    Bus,
    Hardware,
    Processor,
    Late,
}

/// Structural option requirements checked during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Pin,
    AdcPin,
    Lambda,
    IntervalAndAction,
}

pub struct ComponentDef {
    pub kind: &'static str,
    pub priority: SetupPriority,
    pub requires: &'static [Requirement],
    pub codegen: fn(&mut GenContext, &Component) -> Result<(), GenError>,
}

pub static REGISTRY: &[ComponentDef] = &[
    ComponentDef {
        kind: "logger",
        priority: SetupPriority::Bus,
        requires: &[],
        codegen: gen_logger,
    },
    ComponentDef {
        kind: "gpio.switch",
        priority: SetupPriority::Hardware,
        requires: &[Requirement::Pin],
        codegen: gen_gpio_switch,
    },
    ComponentDef {
        kind: "gpio.binary_sensor",
        priority: SetupPriority::Hardware,
        requires: &[Requirement::Pin],
        codegen: gen_gpio_binary_sensor,
    },
    ComponentDef {
        kind: "adc.sensor",
        priority: SetupPriority::Hardware,
        requires: &[Requirement::Pin, Requirement::AdcPin],
        codegen: gen_adc_sensor,
    },
    ComponentDef {
        kind: "status_led",
        priority: SetupPriority::Hardware,
        requires: &[Requirement::Pin],
        codegen: gen_status_led,
    },
    ComponentDef {
        kind: "template.sensor",
        priority: SetupPriority::Processor,
        requires: &[Requirement::Lambda],
        codegen: gen_template_sensor,
    },
    ComponentDef {
        kind: "template.binary_sensor",
        priority: SetupPriority::Processor,
        requires: &[Requirement::Lambda],
        codegen: gen_template_binary_sensor,
    },
    ComponentDef {
        kind: "interval",
        priority: SetupPriority::Late,
        requires: &[Requirement::IntervalAndAction],
        codegen: gen_interval,
    },
];

pub fn lookup(kind: &str) -> Option<&'static ComponentDef> {
    REGISTRY.iter().find(|def| def.kind == kind)
}

/// `id(...)` references of a component's lambda-bearing options, with
/// spans mapped into config-file coordinates.
fn references(component: &Component) -> Vec<Spanned<String>> {
    let mut refs = Vec::new();
    for option in [&component.lambda, &component.then].into_iter().flatten() {
        // +1 skips the opening quote of the TOML string value.
        let base = option.span.start + 1;
        for r in scan::id_references(&option.node) {
            refs.push(Spanned::new(r.node, r.span.offset(base)));
        }
    }
    refs
}

// ---- Resolution ----

/// Validate component kinds, option requirements, pin conflicts, and id
/// references, then compute the setup order: stable by priority band,
/// topologically sorted by intra-band references.
pub fn resolve(config: &DeviceConfig) -> Result<Vec<usize>, GenError> {
    let defs: Vec<&ComponentDef> = config
        .components
        .iter()
        .map(|c| {
            lookup(&c.kind).ok_or_else(|| {
                GenError::validation(format!(
                    "component '{}': unknown kind '{}'",
                    c.id, c.kind
                ))
            })
        })
        .collect::<Result<_, _>>()?;

    for (component, def) in config.components.iter().zip(defs.iter().copied()) {
        check_requirements(component, def, config.board)?;
    }

    check_pin_conflicts(config)?;
    check_status_led_singleton(config)?;

    let id_to_index: HashMap<&str, usize> = config
        .components
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.as_str(), i))
        .collect();

    // Validate references and collect edges: referenced → referencing
    // (the referenced component must set up first).
    let mut edges: Vec<(usize, usize)> = Vec::new();
    for (index, component) in config.components.iter().enumerate() {
        for r in references(component) {
            let Some(&target) = id_to_index.get(r.node.as_str()) else {
                return Err(GenError::validation_at(
                    format!(
                        "component '{}': reference to unknown id '{}'",
                        component.id, r.node
                    ),
                    r.span,
                ));
            };
            if target != index {
                edges.push((target, index));
            }
        }
    }

    setup_order(config, &defs, &edges)
}

fn check_requirements(
    component: &Component,
    def: &ComponentDef,
    board: Board,
) -> Result<(), GenError> {
    for requirement in def.requires {
        match requirement {
            Requirement::Pin => {
                if component.pin.is_none() {
                    return Err(GenError::validation(format!(
                        "component '{}': kind '{}' requires 'pin'",
                        component.id, def.kind
                    )));
                }
            }
            Requirement::AdcPin => {
                if !board.supports_adc() {
                    return Err(GenError::validation(format!(
                        "component '{}': board '{}' has no ADC peripheral",
                        component.id,
                        board.name()
                    )));
                }
                let pin = component.pin.unwrap_or(0);
                if !board.is_adc_pin(pin) {
                    return Err(GenError::validation(format!(
                        "component '{}': pin {pin} is not ADC-capable on board '{}'",
                        component.id,
                        board.name()
                    )));
                }
            }
            Requirement::Lambda => {
                if component.lambda.is_none() {
                    return Err(GenError::validation(format!(
                        "component '{}': kind '{}' requires 'lambda'",
                        component.id, def.kind
                    )));
                }
            }
            Requirement::IntervalAndAction => {
                if component.interval_ms.is_none() || component.then.is_none() {
                    return Err(GenError::validation(format!(
                        "component '{}': kind '{}' requires 'interval' and 'then'",
                        component.id, def.kind
                    )));
                }
            }
        }
    }
    Ok(())
}

fn check_pin_conflicts(config: &DeviceConfig) -> Result<(), GenError> {
    let mut claimed: HashMap<u32, &str> = HashMap::new();
    for component in &config.components {
        if let Some(pin) = component.pin {
            if let Some(other) = claimed.insert(pin, &component.id) {
                return Err(GenError::validation(format!(
                    "pin {pin} is claimed by both '{other}' and '{}'",
                    component.id
                )));
            }
        }
    }
    Ok(())
}

fn check_status_led_singleton(config: &DeviceConfig) -> Result<(), GenError> {
    let leds: Vec<&str> = config
        .components
        .iter()
        .filter(|c| c.kind == "status_led")
        .map(|c| c.id.as_str())
        .collect();
    if leds.len() > 1 {
        return Err(GenError::validation(format!(
            "at most one status_led is allowed; found '{}' and '{}'",
            leds[0], leds[1]
        )));
    }
    Ok(())
}

/// Stable priority-band order, with a topological sort over reference
/// edges inside each band. A cycle of references is an error naming the
/// chain.
fn setup_order(
    config: &DeviceConfig,
    defs: &[&ComponentDef],
    edges: &[(usize, usize)],
) -> Result<Vec<usize>, GenError> {
    let mut order = Vec::with_capacity(config.components.len());
    let bands = [
        SetupPriority::Bus,
        SetupPriority::Hardware,
        SetupPriority::Processor,
        SetupPriority::Late,
    ];

    for band in bands {
        let members: Vec<usize> = (0..config.components.len())
            .filter(|&i| defs[i].priority == band)
            .collect();
        if members.is_empty() {
            continue;
        }

        let member_set: HashSet<usize> = members.iter().copied().collect();
        let band_edges: Vec<(usize, usize)> = edges
            .iter()
            .copied()
            .filter(|(from, to)| member_set.contains(from) && member_set.contains(to))
            .collect();

        // Kahn's algorithm, preferring config order among ready nodes.
        let mut indegree: HashMap<usize, usize> =
            members.iter().map(|&i| (i, 0)).collect();
        for &(_, to) in &band_edges {
            *indegree.get_mut(&to).unwrap() += 1;
        }

        let mut placed: HashSet<usize> = HashSet::new();
        while placed.len() < members.len() {
            let next = members
                .iter()
                .copied()
                .find(|i| !placed.contains(i) && indegree[i] == 0);
            let Some(next) = next else {
                let chain = cycle_chain(&members, &placed, &band_edges, config);
                return Err(GenError::validation(format!(
                    "circular id references between components: {chain}"
                )));
            };
            placed.insert(next);
            order.push(next);
            for &(from, to) in &band_edges {
                if from == next {
                    *indegree.get_mut(&to).unwrap() -= 1;
                }
            }
        }
    }

    Ok(order)
}

/// Build a readable `a -> b -> a` chain from the unplaced remainder.
fn cycle_chain(
    members: &[usize],
    placed: &HashSet<usize>,
    edges: &[(usize, usize)],
    config: &DeviceConfig,
) -> String {
    let remaining: Vec<usize> = members
        .iter()
        .copied()
        .filter(|i| !placed.contains(i))
        .collect();
    let start = remaining[0];

    let mut chain = vec![start];
    let mut current = start;
    loop {
        let next = edges
            .iter()
            .find(|(from, to)| *to == current && remaining.contains(from))
            .map(|(from, _)| *from);
        match next {
            Some(next) => {
                if chain.contains(&next) {
                    chain.push(next);
                    break;
                }
                chain.push(next);
                current = next;
            }
            None => break,
        }
    }

    chain
        .iter()
        .map(|&i| config.components[i].id.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

// ---- Per-kind codegen ----

/// Rewrite `id(x)` references to the generated global names.
fn rewrite_body(body: &str) -> String {
    scan::rewrite_id_references(body, |name| {
        crate::codegen::expr::sanitize_ident(name)
    })
}

fn gen_logger(ctx: &mut GenContext, component: &Component) -> Result<(), GenError> {
    ctx.add_include("ember/log.h");
    let baud = component.baud_rate.unwrap_or(115_200);
    ctx.add_setup_block(
        &format!("{} (logger)", component.id),
        vec![format!("log_init({baud});")],
    );
    Ok(())
}

fn gen_gpio_switch(ctx: &mut GenContext, component: &Component) -> Result<(), GenError> {
    ctx.add_include("ember/gpio.h");
    let id = &component.id;
    let pin = component.pin.expect("checked during resolve");
    ctx.add_global(format!("gpio::Switch {id};"));

    let mut lines = vec![format!("{id}.set_pin({pin});")];
    if component.inverted {
        lines.push(format!("{id}.set_inverted(true);"));
    }
    lines.push(format!("App.register_switch(&{id});"));
    ctx.add_setup_block(&format!("{id} (gpio.switch)"), lines);
    Ok(())
}

fn gen_gpio_binary_sensor(ctx: &mut GenContext, component: &Component) -> Result<(), GenError> {
    ctx.add_include("ember/gpio.h");
    let id = &component.id;
    let pin = component.pin.expect("checked during resolve");
    ctx.add_global(format!("gpio::BinarySensor {id};"));

    let mut lines = vec![format!("{id}.set_pin({pin});")];
    if component.inverted {
        lines.push(format!("{id}.set_inverted(true);"));
    }
    lines.push(format!("App.register_binary_sensor(&{id});"));
    ctx.add_setup_block(&format!("{id} (gpio.binary_sensor)"), lines);
    Ok(())
}

fn gen_adc_sensor(ctx: &mut GenContext, component: &Component) -> Result<(), GenError> {
    ctx.add_include("ember/adc.h");
    let id = &component.id;
    let pin = component.pin.expect("checked during resolve");
    let interval = component.update_interval_ms.unwrap_or(60_000);
    ctx.note_update_interval(interval);
    ctx.add_global(format!("adc::Sensor {id};"));
    ctx.add_setup_block(
        &format!("{id} (adc.sensor)"),
        vec![
            format!("{id}.set_pin({pin});"),
            format!("{id}.set_update_interval({interval});"),
            format!("App.register_sensor(&{id});"),
        ],
    );
    Ok(())
}

fn gen_status_led(ctx: &mut GenContext, component: &Component) -> Result<(), GenError> {
    ctx.add_include("ember/status_led.h");
    let id = &component.id;
    let pin = component.pin.expect("checked during resolve");
    ctx.add_global(format!("StatusLed {id};"));

    let mut lines = vec![format!("{id}.set_pin({pin});")];
    if component.inverted {
        lines.push(format!("{id}.set_inverted(true);"));
    }
    lines.push(format!("App.set_status_led(&{id});"));
    ctx.add_setup_block(&format!("{id} (status_led)"), lines);
    Ok(())
}

fn gen_template_sensor(ctx: &mut GenContext, component: &Component) -> Result<(), GenError> {
    let ty = crate::codegen::expr::cpp_type(component.value_type.as_deref().unwrap_or("float"))
        .to_string();
    gen_template(ctx, component, "template_::Sensor", &ty, "register_sensor")
}

fn gen_template_binary_sensor(ctx: &mut GenContext, component: &Component) -> Result<(), GenError> {
    gen_template(ctx, component, "template_::BinarySensor", "bool", "register_binary_sensor")
}

fn gen_template(
    ctx: &mut GenContext,
    component: &Component,
    cpp_class: &str,
    return_type: &str,
    register: &str,
) -> Result<(), GenError> {
    ctx.add_include("ember/template.h");
    let id = &component.id;
    let lambda_opt = component.lambda.as_ref().expect("checked during resolve");
    let interval = component.update_interval_ms.unwrap_or(60_000);
    ctx.note_update_interval(interval);

    let body = rewrite_body(&lambda_opt.node);
    let expr = process_lambda(
        &mut ctx.lambdas,
        Lambda::new(vec![body], vec![], "", Some(return_type.to_string()), Some(lambda_opt.span)),
    );

    ctx.add_global(format!("{cpp_class} {id};"));
    ctx.add_setup_block(
        &format!("{id} ({})", component.kind),
        vec![
            format!("{id}.set_state_lambda({expr});"),
            format!("{id}.set_update_interval({interval});"),
            format!("App.{register}(&{id});"),
        ],
    );
    Ok(())
}

fn gen_interval(ctx: &mut GenContext, component: &Component) -> Result<(), GenError> {
    ctx.add_include("ember/interval.h");
    let id = &component.id;
    let then = component.then.as_ref().expect("checked during resolve");
    let interval = component.interval_ms.expect("checked during resolve");

    let body = rewrite_body(&then.node);
    // Callback return type is left to inference.
    let expr = process_lambda(
        &mut ctx.lambdas,
        Lambda::new(vec![body], vec![], "", None, Some(then.span)),
    );

    ctx.add_global(format!("IntervalTrigger {id};"));
    ctx.add_setup_block(
        &format!("{id} (interval)"),
        vec![
            format!("{id}.set_interval({interval});"),
            format!("{id}.set_callback({expr});"),
            format!("App.register_interval(&{id});"),
        ],
    );
    Ok(())
}
