pub const APP_NAME: &str = "Import Estimator";
pub const APP_AUTHOR: &str = "SetScallywag";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_TAG: Option<&str> = option_env!("GIT_TAG");

/// Version string used in `--version` output; the git tag wins when the
/// build script found one.
pub const VERSION: &str = match GIT_TAG {
    Some(tag) => tag,
    None => APP_VERSION,
};

pub fn version_label() -> String {
    if let Some(tag) = GIT_TAG {
        tag.to_string()
    } else {
        format!("v{}", APP_VERSION)
    }
}
