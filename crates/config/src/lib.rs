use std::path::PathBuf;

mod error;
pub use error::*;

pub const ENV_PREFIX: &str = "HEALTHHUB";

#[macro_export]
macro_rules! common_derives {
    ($item:item) => {
        #[derive(Debug, Clone, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
        $item
    };
}

common_derives! {
    #[derive(Default)]
    pub struct Config {
        #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
        #[schemars(skip)]
        pub schema: Option<String>,
        #[serde(default)]
        pub general: GeneralConfig,
        #[serde(default)]
        pub storage: StorageConfig,
    }
}

common_derives! {
    #[serde(default)]
    pub struct GeneralConfig {
        pub host: String,
        pub port: u16,
        /// HS256 signing key for access tokens. When unset the server makes up
        /// a per-process key, so tokens do not survive a restart.
        pub jwt_secret: Option<String>,
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            jwt_secret: None,
        }
    }
}

common_derives! {
    #[derive(Default)]
    #[serde(default)]
    pub struct StorageConfig {
        pub pdf_dir: Option<PathBuf>,
    }
}

impl StorageConfig {
    pub fn pdf_dir(&self) -> PathBuf {
        self.pdf_dir
            .clone()
            .unwrap_or_else(|| data_dir().join("pdfs"))
    }
}

pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("com.healthhub")
}

pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("com.healthhub"))
}

impl Config {
    /// Reads `path` (or the global config file, if present) and the process
    /// environment.
    pub fn new(path: Option<String>) -> Result<Self, crate::Error> {
        Self::from_env(path, std::env::vars())
    }

    /// Later sources win: file, then `HEALTHHUB_*` variables, then the bare
    /// `JWT_SECRET` and `PORT` variables.
    pub fn from_env(
        path: Option<String>,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, crate::Error> {
        let vars: config::Map<String, String> = vars.into_iter().collect();

        let mut builder = config::Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(config::File::with_name(&path));
            }
            None => {
                if let Some(dir) = config_dir() {
                    let global = dir.join("config").to_string_lossy().to_string();
                    builder = builder.add_source(config::File::with_name(&global).required(false));
                }
            }
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(Some(vars.clone())),
            )
            .set_override_option("general.jwt_secret", vars.get("JWT_SECRET").cloned())?
            .set_override_option("general.port", vars.get("PORT").cloned())?
            .build()?;

        let config = settings.try_deserialize::<Config>()?;
        Ok(config)
    }

    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Config)
    }
}
