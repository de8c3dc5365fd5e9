// ABOUTME: Transient names generated once per build.
// ABOUTME: Compute name, deployment name, and a fallback admin password.

use uuid::Uuid;

/// Prefix for generated compute names. Windows limits computer names to
/// 15 characters, so the prefix plus random part stays at that length.
const COMPUTE_PREFIX: &str = "lf";
const COMPUTE_NAME_LEN: usize = 15;

/// Names and secrets that exist only for the lifetime of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempNames {
    pub compute_name: String,
    pub deployment_name: String,
    pub admin_password: String,
}

impl TempNames {
    pub fn generate() -> Self {
        let compute = Uuid::new_v4().simple().to_string();
        let deployment = Uuid::new_v4().simple().to_string();
        let secret = Uuid::new_v4().simple().to_string();

        Self {
            compute_name: format!(
                "{}{}",
                COMPUTE_PREFIX,
                &compute[..COMPUTE_NAME_LEN - COMPUTE_PREFIX.len()]
            ),
            deployment_name: format!("lf-deploy-{}", &deployment[..10]),
            // Upper, lower, digit and symbol classes are always present.
            admin_password: format!("Lf-{}!9", &secret[..20]),
        }
    }
}
