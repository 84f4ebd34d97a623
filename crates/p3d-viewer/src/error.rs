use thiserror::Error;

/// Model loading failures. Only these ever reach the host.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported model format '{0}'")]
    UnsupportedFormat(String),
    #[error("model decode failed: {0}")]
    Decode(String),
    #[error("gpu upload failed: {0}")]
    Gpu(String),
}

/// Shader pipeline failures. Logged and degraded to "no program".
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader asset '{0}' is missing")]
    AssetMissing(String),
    #[error("error compiling shader {name}:\n{log}")]
    Compile { name: String, log: String },
    #[error("error linking program {name}:\n{log}")]
    Link { name: String, log: String },
    #[error("could not create {0}")]
    Create(&'static str),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
