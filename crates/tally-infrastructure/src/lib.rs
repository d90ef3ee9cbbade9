pub mod config_service;
pub mod memory_session_repository;
pub mod paths;
pub mod storage;
pub mod toml_session_repository;

pub use crate::config_service::ConfigService;
pub use crate::memory_session_repository::MemorySessionRepository;
pub use crate::paths::TallyPaths;
pub use crate::toml_session_repository::TomlSessionRepository;
