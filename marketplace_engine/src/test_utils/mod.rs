//! Support utilities for integration tests: throwaway SQLite databases with the engine schema applied.
pub mod prepare_env;
