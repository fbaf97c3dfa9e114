use crate::wire::HealthRes;

/// Liveness report served by the REST surface.
pub struct HealthService;

impl HealthService {
    /// Static method to check health without creating an instance.
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "CareTrack is alive".into(),
        }
    }
}
