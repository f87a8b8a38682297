//! 主应用程序入口
//!
//! 加载配置、装配各层依赖并启动 Axum Web API 服务。

use std::sync::Arc;

use anyhow::Context;
use application::{
    AuthService, AuthServiceDependencies, ChatService, ChatServiceDependencies, Clock,
    FanoutDispatcher, IdentityVerifier, JwtTokenService, MembershipGuard,
    MembershipGuardDependencies, SystemClock,
};
use config::AppConfig;
use infrastructure::Infrastructure;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    if let Err(err) = config.validate() {
        if config.server.strict {
            error!(error = %err, "refusing to start with insecure configuration");
            return Err(err.into());
        }
        error!(error = %err, "insecure configuration, continuing because server.strict is off");
    }

    let infrastructure = Infrastructure::connect(&config)
        .await
        .context("failed to initialise infrastructure")?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let tokens = Arc::new(JwtTokenService::new(
        &config.jwt.secret,
        chrono::Duration::hours(config.jwt.expiration_hours),
        clock.clone(),
    ));
    let dispatcher = FanoutDispatcher::new(infrastructure.publisher.clone(), config.publish_timeout());

    let auth_service = AuthService::new(AuthServiceDependencies {
        user_repository: infrastructure.user_repository.clone(),
        password_hasher: infrastructure.password_hasher.clone(),
        token_service: tokens.clone(),
        clock: clock.clone(),
    });
    let membership = MembershipGuard::new(MembershipGuardDependencies {
        room_repository: infrastructure.room_repository.clone(),
        member_repository: infrastructure.member_repository.clone(),
        clock: clock.clone(),
    });
    let chat_service = ChatService::new(ChatServiceDependencies {
        membership: Arc::new(membership),
        message_repository: infrastructure.message_repository.clone(),
        dispatcher: dispatcher.clone(),
        clock,
    });

    let state = AppState::new(
        Arc::new(auth_service),
        Arc::new(chat_service),
        IdentityVerifier::new(tokens),
    );

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!(%address, "roomcast listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let failed = dispatcher.failure_count();
    if failed > 0 {
        warn!(failed, "fan-out publishes failed during this run");
    }
    info!(published = dispatcher.published_count(), "roomcast stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
