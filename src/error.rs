//! Error types for the scene manager and the reference host.

/// Errors raised when a transition cannot be started or constructed.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TransitionError {
    /// A transition was requested while another one is still in flight.
    #[error("a new transition cannot start during another transition")]
    AlreadyTransitioning,

    /// Timed transitions need a finite, strictly positive duration.
    #[error("transition duration must be a positive number of seconds, got {0}")]
    InvalidDuration(f64),
}

/// Errors that stop the reference host.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("surface creation failed: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("device request failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("failed to acquire surface texture: {0}")]
    SurfaceTexture(#[from] wgpu::SurfaceError),

    /// A scene's `update` failed; the error is passed through untouched.
    #[error(transparent)]
    Scene(anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_stable() {
        assert!(
            TransitionError::AlreadyTransitioning
                .to_string()
                .contains("during another transition")
        );
        assert!(
            TransitionError::InvalidDuration(-1.0)
                .to_string()
                .contains("-1")
        );
    }

    #[test]
    fn scene_errors_keep_their_message() {
        let err = AppError::Scene(anyhow::anyhow!("level file missing"));
        assert_eq!(err.to_string(), "level file missing");
    }
}
