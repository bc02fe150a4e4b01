use clap::Parser;
use shared_lru::config::cli::Command;
use shared_lru::utils::{logger, validation::Validate};
use shared_lru::{Backend, CacheError, CliConfig, LruCache, MemoryStore, Store};
use std::time::Duration;

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("{}", e);
        std::process::exit(2);
    }

    let result = match config.backend {
        Backend::Memory => {
            let store = MemoryStore::new();
            let _sweeper = store.spawn_cleanup(Duration::from_secs(config.cleanup_interval_secs));
            run(store, &config).await
        }
        #[cfg(feature = "redis")]
        Backend::Redis => match shared_lru::RedisStore::connect(&config.redis_url).await {
            Ok(store) => run(store, &config).await,
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        tracing::error!("Cache command failed: {}", e);
        eprintln!("{}", e);
        let exit_code = match e {
            CacheError::InvalidConfigValueError { .. } | CacheError::MissingConfigError { .. } => 2,
            _ => 1,
        };
        std::process::exit(exit_code);
    }
}

async fn run<S: Store>(store: S, config: &CliConfig) -> shared_lru::Result<()> {
    let cache = LruCache::new(
        store,
        config.max_size,
        Duration::from_secs(config.ttl_secs),
    )
    .await?;

    match &config.command {
        Command::Set {
            key,
            value,
            ttl_secs,
        } => {
            // Values that aren't valid JSON are cached as plain strings.
            let value: serde_json::Value = serde_json::from_str(value)
                .unwrap_or_else(|_| serde_json::Value::String(value.clone()));
            cache
                .insert(key, &value, ttl_secs.map(Duration::from_secs))
                .await?;
            println!("OK");
        }
        Command::Get { key } => match cache.get::<serde_json::Value>(key).await? {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => println!("(nil)"),
        },
        Command::Del { key } => {
            let removed = cache.remove(key).await?;
            println!("{}", u8::from(removed));
        }
        Command::Stats => {
            let stats = cache.stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Clear => {
            cache.clear().await?;
            println!("OK");
        }
    }

    Ok(())
}
