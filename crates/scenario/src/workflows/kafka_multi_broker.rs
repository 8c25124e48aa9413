//! `kafka-multi-broker`: 브로커 장애/복구 내성 검증
//!
//! 3-브로커 클러스터에서 브로커 하나를 SIGKILL로 죽였다가 다시 살리면서,
//! 각 단계마다 테스트 드라이버 스크립트로 처리 엔진의 결과를 확인합니다.
//!
//! ```text
//! 1. start-and-wait zookeeper, kafka1-3, schema-registry, materialized
//! 2. testdrive 01-init.td          (kafka2)
//! 3. pause 10
//! 4. kill kafka1 (SIGKILL)
//! 5. pause 10
//! 6. testdrive 02-after-leave.td   (kafka2, kafka3)
//! 7. start kafka1
//! 8. pause 10
//! 9. testdrive 03-after-join.td    (kafka1)
//! ```

use stagehand_core::error::TopologyError;
use stagehand_core::topology::Topology;
use stagehand_core::types::Signal;

use super::WorkflowContext;
use crate::action::Action;
use crate::scenario::Scenario;
use crate::services::{
    MATERIALIZED_PORT, SCHEMA_REGISTRY_PORT, TESTDRIVE_WORKDIR, kafka, materialized,
    schema_registry, testdrive, zookeeper,
};

pub const NAME: &str = "kafka-multi-broker";
pub const DESCRIPTION: &str = "kill and restart one of three brokers between testdrive scripts";

const BROKERS: [&str; 3] = ["kafka1", "kafka2", "kafka3"];
const OFFSETS_TOPIC_REPLICATION_FACTOR: u16 = 2;
const SETTLE_UNITS: u32 = 10;

/// 테스트 드라이버 고정 엔트리포인트
pub fn testdrive_entrypoint() -> Vec<String> {
    vec![
        "testdrive".to_owned(),
        format!("--schema-registry-url=http://schema-registry:{SCHEMA_REGISTRY_PORT}"),
        format!("--materialized-url=postgres://materialize@materialized:{MATERIALIZED_PORT}"),
        "--kafka-option=acks=all".to_owned(),
        "--seed=1".to_owned(),
    ]
}

/// 서비스 토폴로지
pub fn topology(ctx: &WorkflowContext) -> Result<Topology, TopologyError> {
    let mut services = vec![zookeeper()];
    for (idx, name) in BROKERS.iter().enumerate() {
        let broker_id = u32::try_from(idx + 1).unwrap_or(u32::MAX);
        services.push(kafka(name, broker_id, OFFSETS_TOPIC_REPLICATION_FACTOR));
    }
    services.push(schema_registry(BROKERS));
    services.push(materialized());
    services.push(testdrive(testdrive_entrypoint()).with_volume(format!(
        "{}:{TESTDRIVE_WORKDIR}",
        ctx.scripts_dir().display()
    )));
    Topology::new(services)
}

/// 실행할 액션 순서
pub fn actions() -> Vec<Action> {
    vec![
        Action::start_and_wait([
            "zookeeper",
            "kafka1",
            "kafka2",
            "kafka3",
            "schema-registry",
            "materialized",
        ]),
        Action::run_command("testdrive", "--kafka-addr=kafka2 01-init.td"),
        Action::pause(SETTLE_UNITS),
        Action::kill(["kafka1"], Signal::Kill),
        Action::pause(SETTLE_UNITS),
        Action::run_command(
            "testdrive",
            "--kafka-addr=kafka2,kafka3 --no-reset 02-after-leave.td",
        ),
        Action::start(["kafka1"]),
        Action::pause(SETTLE_UNITS),
        Action::run_command("testdrive", "--kafka-addr=kafka1 --no-reset 03-after-join.td"),
    ]
}

pub fn build(ctx: &WorkflowContext) -> Result<Scenario, TopologyError> {
    Ok(Scenario::new(NAME, DESCRIPTION, topology(ctx)?, actions()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_core::types::ServiceRole;

    #[test]
    fn topology_declares_seven_services() {
        let topo = topology(&WorkflowContext::default()).unwrap();
        let names: Vec<&str> = topo.names().collect();
        assert_eq!(
            names,
            vec![
                "zookeeper",
                "kafka1",
                "kafka2",
                "kafka3",
                "schema-registry",
                "materialized",
                "testdrive"
            ]
        );
        assert_eq!(topo.daemons().count(), 6);
    }

    #[test]
    fn brokers_have_distinct_ids_and_rf_two() {
        let topo = topology(&WorkflowContext::default()).unwrap();
        for (expected_id, name) in (1..).zip(BROKERS) {
            assert_eq!(
                topo.get(name).unwrap().role,
                ServiceRole::Broker {
                    broker_id: expected_id,
                    offsets_topic_replication_factor: 2
                }
            );
        }
    }

    #[test]
    fn scripts_dir_is_mounted_into_testdrive() {
        let ctx = WorkflowContext::new("/tmp/scripts");
        let topo = topology(&ctx).unwrap();
        let driver = topo.get("testdrive").unwrap();
        assert_eq!(driver.volumes, vec!["/tmp/scripts:/workdir"]);
        assert_eq!(driver.entrypoint()[0], "testdrive");
        assert!(driver.entrypoint().contains(&"--seed=1".to_owned()));
    }

    #[test]
    fn action_sequence_has_nine_steps_and_thirty_pause_units() {
        let actions = actions();
        assert_eq!(actions.len(), 9);
        let pause_units: u32 = actions
            .iter()
            .map(|a| match a {
                Action::Pause { units } => *units,
                _ => 0,
            })
            .sum();
        assert_eq!(pause_units, 30);
        assert_eq!(actions[3], Action::kill(["kafka1"], Signal::Kill));
    }

    #[test]
    fn built_scenario_validates() {
        let scenario = build(&WorkflowContext::default()).unwrap();
        assert!(scenario.validate().is_ok());
        assert_eq!(scenario.name, NAME);
    }
}
