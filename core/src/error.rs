#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("spring stiffness must be in (0, 1], got {0}")]
    Stiffness(f32),
    #[error("spring damping must be in (0, 1), got {0}")]
    Damping(f32),
    #[error("spring precision must be positive and finite, got {0}")]
    Precision(f32),
}
