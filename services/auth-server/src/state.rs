use f2fauth_core::Config;
use f2fauth_identity::{AuthContext, IdentityResult};

pub struct AppState {
    pub context: AuthContext,
}

impl AppState {
    pub fn new(context: AuthContext) -> Self {
        AppState { context }
    }

    pub fn from_config(config: &Config) -> IdentityResult<Self> {
        Ok(AppState {
            context: AuthContext::from_config(config)?,
        })
    }
}
