use api::ApiConfig;
use photoflash_lib::{build_decision_client, build_state, config::AppConfig, logging};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    // Logging before the runtime starts so the local offset can be resolved
    let _guard = logging::init_logging(&config.log_dir)?;

    tracing::info!("=== PhotoFlash gateway starting up ===");
    tracing::info!("  Decision engine: {:?}", config.engine);
    tracing::info!("  Policy store: {:?}", config.policy_store_id);
    tracing::info!(
        "  Identity: user={} account={}",
        config.user_id,
        config.account_id
    );

    let decision = build_decision_client(&config)?;
    let state = build_state(&config, decision);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(api::start_server_with_config(
        state,
        ApiConfig::new().with_port(config.port),
    ))?;

    logging::log_shutdown();
    Ok(())
}
