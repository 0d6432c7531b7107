use anyhow::Result;
use serenity::{model::gateway::GatewayIntents, Client};
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;
use tracing::{error, info, warn};

use pony_bot::{
    audio::{
        songbird_voice::SongbirdTransport, AudioPlayer, AudioQueue, StreamOptions, VoiceManager,
    },
    bot::{commands, events::QueueNotifier, transport::SerenityTransport, PonyBot},
    cmd::Dispatcher,
    config::Config,
    sources::YtDlpResolver,
    sync::{FreezeGuard, ShutdownCause, ShutdownSignal},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pony_bot=debug".parse()?)
                .add_directive("serenity=info".parse()?)
                .add_directive("songbird=info".parse()?),
        )
        .init();

    info!("🦄 Iniciando Pony Bot v{}", env!("CARGO_PKG_VERSION"));

    let shutdown = ShutdownSignal::new();
    shutdown.install_panic_hook();

    let resolver = YtDlpResolver::new();

    // Manejar health check si es necesario
    if std::env::args().any(|arg| arg == "--health-check") {
        resolver.verify_dependencies().await?;
        println!("OK");
        return Ok(());
    }

    // Cargar configuración
    let config = Config::load()?;
    info!("{}", config.summary());

    if let Err(e) = resolver.verify_dependencies().await {
        warn!("⚠️ Dependencias de audio incompletas: {:?}", e);
    }

    let freeze_guard = FreezeGuard::new(config.freeze_threshold());

    // Audio: voz -> player -> cola
    let manager = Songbird::serenity();
    let voice = VoiceManager::new(
        Box::new(SongbirdTransport::new(manager.clone())?),
        freeze_guard.clone(),
    );
    let player = Arc::new(AudioPlayer::new(
        voice,
        StreamOptions {
            bitrate_kbps: config.default_bitrate,
            volume: config.default_volume,
            passes: config.default_passes,
        },
    ));
    let (queue, queue_events) = AudioQueue::new(
        player.clone(),
        Arc::new(resolver),
        config.max_queue_size,
        freeze_guard.clone(),
    );

    // Comandos
    let registry = Arc::new(commands::build_registry(queue.clone())?);
    info!("📝 {} comandos registrados", registry.len());
    let dispatcher = Arc::new(
        Dispatcher::new(
            registry,
            config.command_prefix.clone(),
            config.is_production(),
            freeze_guard,
        )
        .with_unknown_command_replies(config.reply_to_unknown_commands),
    );

    // Configurar intents mínimos necesarios
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let handler = PonyBot::new(dispatcher, config.log_channel_id);
    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .register_songbird_with(manager)
        .await?;

    // Notificaciones de la cola
    let notifier = QueueNotifier::new(
        Arc::new(SerenityTransport::new(client.http.clone())),
        player.clone(),
    );
    tokio::spawn(notifier.run(queue_events));

    // Manejar shutdown graceful
    let shard_manager = client.shard_manager.clone();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal(&shutdown).await;
        }
    });
    tokio::spawn(async move {
        match shutdown.wait().await {
            ShutdownCause::Signal => info!("⚠️ Señal de shutdown recibida, cerrando..."),
            ShutdownCause::Panic => error!("💥 Error no controlado, cerrando..."),
        }
        if let Err(e) = player.shutdown().await {
            warn!("⚠️ Error al cerrar la conexión de voz: {:?}", e);
        }
        shard_manager.shutdown_all().await;
        std::process::exit(0);
    });

    // Iniciar bot
    info!("🚀 Bot iniciado exitosamente");
    if let Err(why) = client.start().await {
        error!("Error al ejecutar cliente: {:?}", why);
        return Err(why.into());
    }

    Ok(())
}

/// Espera SIGINT o SIGTERM y dispara el shutdown.
async fn shutdown_signal(shutdown: &ShutdownSignal) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!("⚠️ No se pudo registrar SIGTERM: {:?}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    shutdown.trigger(ShutdownCause::Signal);
}
