// crates/chat-core/tests/scenarios.rs
use chat_core::{ChatHub, ConnectionId, Delivery};
use chat_protocol::text_codec::{format_server, parse_client_line};
use chat_protocol::ClientFrame;
use chrono::{DateTime, TimeZone, Utc};

const INPUT: &str = include_str!("data/scenarios.txt");

struct Scenario {
    name: String,
    steps: Vec<String>,
    expected: Vec<String>,
}

fn load_scenarios() -> Vec<Scenario> {
    let mut scenarios: Vec<Scenario> = Vec::new();

    for raw in INPUT.lines() {
        let line = raw.trim();
        if let Some(name) = line.strip_prefix("#name:") {
            scenarios.push(Scenario {
                name: name.trim().to_string(),
                steps: Vec::new(),
                expected: Vec::new(),
            });
            continue;
        }
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let current = scenarios.last_mut().expect("step before first #name:");
        if let Some(out) = line.strip_prefix('>') {
            current.expected.push(out.trim().to_string());
        } else {
            current.steps.push(line.to_string());
        }
    }

    scenarios
}

fn clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
}

fn render(deliveries: Vec<Delivery>, out: &mut Vec<String>) {
    for d in deliveries {
        out.push(format!("{}: {}", d.to.0, format_server(&d.event)));
    }
}

fn run_step(hub: &mut ChatHub, step: &str, out: &mut Vec<String>) {
    if let Some(id) = step.strip_prefix('+') {
        hub.connect(ConnectionId(id.trim().parse().unwrap()));
        return;
    }
    if let Some(id) = step.strip_prefix('-') {
        let deliveries = hub.disconnect(ConnectionId(id.trim().parse().unwrap()));
        render(deliveries, out);
        return;
    }

    let (id, line) = step.split_once(':').expect("step must be `N: line`");
    let conn = ConnectionId(id.trim().parse().unwrap());

    // Same boundary handling as the server: bad frames and rejected
    // events are answered to the sender only.
    match parse_client_line(line) {
        Ok(None) => {}
        Ok(Some(ClientFrame::Authenticate { token })) => {
            if let Err(e) = hub.authenticate(conn, &token) {
                out.push(format!("{}: E, {}", conn.0, e));
            }
        }
        Ok(Some(ClientFrame::Event(event))) => match hub.process_event_at(conn, event, clock()) {
            Ok(deliveries) => render(deliveries, out),
            Err(e) => out.push(format!("{}: E, {}", conn.0, e)),
        },
        Err(e) => out.push(format!("{}: E, {}", conn.0, e)),
    }
}

#[test]
fn scenario_file_is_not_empty() {
    let scenarios = load_scenarios();
    assert!(scenarios.len() >= 4, "expected the bundled scenarios");
    assert!(scenarios.iter().all(|s| !s.steps.is_empty()));
}

#[test]
fn replay_matches_expected_deliveries() {
    for scenario in load_scenarios() {
        let mut hub = ChatHub::new();
        let mut actual = Vec::new();

        for step in &scenario.steps {
            run_step(&mut hub, step, &mut actual);
        }

        assert_eq!(
            actual, scenario.expected,
            "scenario `{}` produced unexpected deliveries",
            scenario.name
        );
    }
}

#[test]
fn every_scenario_ends_consistent() {
    for scenario in load_scenarios() {
        let mut hub = ChatHub::new();
        let mut sink = Vec::new();
        for step in &scenario.steps {
            run_step(&mut hub, step, &mut sink);
        }

        // Whoever is still listed must be reachable on a live connection.
        for user in hub.snapshot() {
            let conn = hub.directory().lookup(&user).unwrap();
            assert!(
                hub.connection_state(conn).is_some(),
                "scenario `{}`: {} points at a closed connection",
                scenario.name,
                user
            );
        }
    }
}
