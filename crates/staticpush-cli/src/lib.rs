use std::path::PathBuf;

use staticpush_core::config::parse_extension_list;
use staticpush_core::DeployConfig;

/// Command-line values that take precedence over the environment.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub source: Option<PathBuf>,
    pub clear: bool,
    pub gzip_extensions: Option<String>,
    pub max_age: Option<u64>,
    pub default_content_type: Option<String>,
    pub concurrency: Option<usize>,
    pub content_types: Option<PathBuf>,
}

impl ConfigOverrides {
    pub fn apply(self, config: &mut DeployConfig) {
        if let Some(source) = self.source {
            config.source_dir = Some(source);
        }
        // The flag can only turn clearing on; CLEAR_CONTAINER=true still applies without it.
        if self.clear {
            config.clear_container = true;
        }
        if let Some(list) = self.gzip_extensions {
            config.gzip_extensions = parse_extension_list(&list);
        }
        if let Some(max_age) = self.max_age {
            config.cache_control_max_age_seconds = max_age;
        }
        if let Some(content_type) = self.default_content_type {
            config.default_content_type = content_type;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(path) = self.content_types {
            config.content_types_file = Some(path);
        }
    }
}

/// Initialize tracing for the CLI. Logs go to stderr so stdout stays JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
