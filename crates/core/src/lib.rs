//! Stagehand 공통 크레이트
//!
//! 서비스 선언과 토폴로지, 에러 타입, `stagehand.toml` 설정,
//! 메트릭 이름을 정의합니다. 런타임/시나리오/CLI 크레이트가 모두 이 크레이트에 의존합니다.

pub mod config;
pub mod error;
pub mod metrics;
pub mod topology;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, StagehandError, TopologyError};

// 설정
pub use config::StagehandConfig;

// 토폴로지
pub use topology::Topology;

// 도메인 타입
pub use types::{ServiceRole, ServiceSpec, ServiceState, Signal};
