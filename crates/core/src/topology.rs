//! 토폴로지: 시나리오가 필요로 하는 서비스 선언의 순서 있는 집합
//!
//! [`Topology`]는 생성 시점에 검증되며 이후 변경되지 않습니다.
//! - 서비스 이름은 비어 있지 않고 고유해야 하며, 컨테이너 이름 규칙
//!   (`[a-z0-9][a-z0-9_.-]*`, 최대 63자)을 따라야 합니다.
//! - 의존성 목록(`depends_on`, 스키마 레지스트리의 `kafka_servers`)이 참조하는
//!   모든 이름은 토폴로지에 존재해야 합니다.
//! - 브로커 ID는 브로커 간에 고유해야 합니다.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::TopologyError;
use crate::types::{ServiceRole, ServiceSpec, validate_service_name};

/// 검증된 서비스 토폴로지
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ServiceSpec>", into = "Vec<ServiceSpec>")]
pub struct Topology {
    services: Vec<ServiceSpec>,
}

impl Topology {
    /// 서비스 선언 목록으로 토폴로지를 생성하고 불변 조건을 검증합니다.
    pub fn new(services: Vec<ServiceSpec>) -> Result<Self, TopologyError> {
        let mut names = HashSet::with_capacity(services.len());
        for service in &services {
            if service.name.trim().is_empty() {
                return Err(TopologyError::EmptyName);
            }
            validate_service_name(&service.name)?;
            if !names.insert(service.name.as_str()) {
                return Err(TopologyError::DuplicateService(service.name.clone()));
            }
        }

        for service in &services {
            if let Some(missing) = service.references().find(|r| !names.contains(r)) {
                return Err(TopologyError::UnknownReference {
                    referrer: service.name.clone(),
                    name: missing.to_owned(),
                });
            }
        }

        let mut broker_ids: HashMap<u32, &str> = HashMap::new();
        for service in &services {
            if let ServiceRole::Broker { broker_id, .. } = service.role {
                if let Some(first) = broker_ids.insert(broker_id, &service.name) {
                    return Err(TopologyError::DuplicateBrokerId {
                        broker_id,
                        first: first.to_owned(),
                        second: service.name.clone(),
                    });
                }
            }
        }

        Ok(Self { services })
    }

    /// 이름으로 서비스를 조회합니다.
    pub fn get(&self, name: &str) -> Option<&ServiceSpec> {
        self.services.iter().find(|s| s.name == name)
    }

    /// 이름으로 서비스를 조회하고, 없으면 `UnknownService`를 반환합니다.
    pub fn require(&self, name: &str) -> Result<&ServiceSpec, TopologyError> {
        self.get(name)
            .ok_or_else(|| TopologyError::UnknownService(name.to_owned()))
    }

    /// 선언 순서대로 서비스를 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = &ServiceSpec> {
        self.services.iter()
    }

    /// 선언 순서대로 서비스 이름을 순회합니다.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.iter().map(|s| s.name.as_str())
    }

    /// 장기 실행 서비스 (테스트 드라이버 제외)
    pub fn daemons(&self) -> impl Iterator<Item = &ServiceSpec> {
        self.services.iter().filter(|s| !s.is_one_shot())
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl TryFrom<Vec<ServiceSpec>> for Topology {
    type Error = TopologyError;

    fn try_from(services: Vec<ServiceSpec>) -> Result<Self, Self::Error> {
        Self::new(services)
    }
}

impl From<Topology> for Vec<ServiceSpec> {
    fn from(topology: Topology) -> Self {
        topology.services
    }
}
