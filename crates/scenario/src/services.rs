//! 서비스 프리셋
//!
//! 자주 쓰는 서비스 선언을 역할 환경변수까지 채워서 만들어 주는 생성 함수 모음입니다.
//! 서비스끼리는 프로젝트 네트워크의 alias(서비스 이름)로 서로를 찾습니다.

use stagehand_core::types::{ServiceRole, ServiceSpec};

pub const ZOOKEEPER_IMAGE: &str = "confluentinc/cp-zookeeper:5.5.4";
pub const KAFKA_IMAGE: &str = "confluentinc/cp-kafka:5.5.4";
pub const SCHEMA_REGISTRY_IMAGE: &str = "confluentinc/cp-schema-registry:5.5.4";
pub const MATERIALIZED_IMAGE: &str = "materialize/materialized:latest";
pub const TESTDRIVE_IMAGE: &str = "materialize/testdrive:latest";

pub const ZOOKEEPER_PORT: u16 = 2181;
pub const KAFKA_PORT: u16 = 9092;
pub const SCHEMA_REGISTRY_PORT: u16 = 8081;
pub const MATERIALIZED_PORT: u16 = 6875;

/// 테스트 드라이버 컨테이너 안의 스크립트 디렉토리
pub const TESTDRIVE_WORKDIR: &str = "/workdir";

/// `zookeeper` 코디네이터
pub fn zookeeper() -> ServiceSpec {
    ServiceSpec::new("zookeeper", ZOOKEEPER_IMAGE, ServiceRole::Coordinator)
        .with_port(ZOOKEEPER_PORT)
        .with_env("ZOOKEEPER_CLIENT_PORT", ZOOKEEPER_PORT)
}

/// 브로커. `zookeeper`에 의존합니다.
pub fn kafka(name: &str, broker_id: u32, offsets_topic_replication_factor: u16) -> ServiceSpec {
    ServiceSpec::new(
        name,
        KAFKA_IMAGE,
        ServiceRole::Broker {
            broker_id,
            offsets_topic_replication_factor,
        },
    )
    .with_port(KAFKA_PORT)
    .with_env(
        "KAFKA_ZOOKEEPER_CONNECT",
        format!("zookeeper:{ZOOKEEPER_PORT}"),
    )
    .with_env(
        "KAFKA_ADVERTISED_LISTENERS",
        format!("PLAINTEXT://{name}:{KAFKA_PORT}"),
    )
    .with_env("KAFKA_BROKER_ID", broker_id)
    .with_env(
        "KAFKA_OFFSETS_TOPIC_REPLICATION_FACTOR",
        offsets_topic_replication_factor,
    )
    .with_env("KAFKA_AUTO_CREATE_TOPICS_ENABLE", "false")
    .with_env("KAFKA_MIN_INSYNC_REPLICAS", 1)
    .depends_on("zookeeper")
}

/// 스키마 레지스트리. 주어진 브로커들에 의존합니다.
pub fn schema_registry<I, S>(kafka_servers: I) -> ServiceSpec
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let servers: Vec<String> = kafka_servers.into_iter().map(Into::into).collect();
    let bootstrap = servers
        .iter()
        .map(|b| format!("PLAINTEXT://{b}:{KAFKA_PORT}"))
        .collect::<Vec<_>>()
        .join(",");

    let mut spec = ServiceSpec::new(
        "schema-registry",
        SCHEMA_REGISTRY_IMAGE,
        ServiceRole::SchemaRegistry {
            kafka_servers: servers.clone(),
        },
    )
    .with_port(SCHEMA_REGISTRY_PORT)
    .with_env("SCHEMA_REGISTRY_KAFKASTORE_BOOTSTRAP_SERVERS", bootstrap)
    .with_env("SCHEMA_REGISTRY_HOST_NAME", "localhost");
    spec.depends_on = servers;
    spec
}

/// 테스트 대상 처리 엔진
pub fn materialized() -> ServiceSpec {
    ServiceSpec::new(
        "materialized",
        MATERIALIZED_IMAGE,
        ServiceRole::ProcessingEngine,
    )
    .with_port(MATERIALIZED_PORT)
    .with_command(["--data-directory=/share/mzdata", "-w1"])
}

/// 일회성 테스트 드라이버. 데몬으로 시작되지 않으며 포트가 없습니다.
pub fn testdrive<I, S>(entrypoint: I) -> ServiceSpec
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ServiceSpec::new(
        "testdrive",
        TESTDRIVE_IMAGE,
        ServiceRole::TestDriver {
            entrypoint: entrypoint.into_iter().map(Into::into).collect(),
        },
    )
    .with_working_dir(TESTDRIVE_WORKDIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kafka_environment() {
        let spec = kafka("kafka2", 2, 2);
        let env = &spec.environment;

        assert_eq!(env["KAFKA_ZOOKEEPER_CONNECT"], "zookeeper:2181");
        assert_eq!(env["KAFKA_ADVERTISED_LISTENERS"], "PLAINTEXT://kafka2:9092");
        assert_eq!(env["KAFKA_BROKER_ID"], "2");
        assert_eq!(env["KAFKA_OFFSETS_TOPIC_REPLICATION_FACTOR"], "2");
        assert_eq!(env["KAFKA_AUTO_CREATE_TOPICS_ENABLE"], "false");
        assert_eq!(env["KAFKA_MIN_INSYNC_REPLICAS"], "1");
        assert_eq!(spec.depends_on, vec!["zookeeper"]);
        assert_eq!(spec.port, Some(9092));
    }

    #[test]
    fn schema_registry_bootstrap_list() {
        let spec = schema_registry(["kafka1", "kafka2", "kafka3"]);
        assert_eq!(
            spec.environment["SCHEMA_REGISTRY_KAFKASTORE_BOOTSTRAP_SERVERS"],
            "PLAINTEXT://kafka1:9092,PLAINTEXT://kafka2:9092,PLAINTEXT://kafka3:9092"
        );
        assert_eq!(spec.environment["SCHEMA_REGISTRY_HOST_NAME"], "localhost");
        assert_eq!(spec.depends_on, vec!["kafka1", "kafka2", "kafka3"]);
    }

    #[test]
    fn materialized_command() {
        let spec = materialized();
        assert_eq!(spec.command, vec!["--data-directory=/share/mzdata", "-w1"]);
        assert_eq!(spec.port, Some(6875));
    }

    #[test]
    fn testdrive_is_one_shot_without_port() {
        let spec = testdrive(["testdrive", "--seed=1"]);
        assert!(spec.is_one_shot());
        assert_eq!(spec.port, None);
        assert_eq!(spec.working_dir.as_deref(), Some("/workdir"));
    }

    #[test]
    fn zookeeper_client_port() {
        let spec = zookeeper();
        assert_eq!(spec.environment["ZOOKEEPER_CLIENT_PORT"], "2181");
        assert_eq!(spec.image, ZOOKEEPER_IMAGE);
    }
}
