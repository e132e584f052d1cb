use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use nidsboard::api;
use nidsboard::cli::{Cli, Command};
use nidsboard::config::{Config, CONFIG_FILE};
use nidsboard::log_mode::LogMode;
use nidsboard::service::DashboardService;
use num_format::{Locale, ToFormattedString};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

/// Intervalle du résumé périodique affiché pendant `serve`
const SUMMARY_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Analyser les arguments de ligne de commande
    let cli = Cli::parse();

    // Charger la configuration pour déterminer le mode de log
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| Path::new(CONFIG_FILE).to_path_buf());
    let mut config = match Config::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "AVERTISSEMENT: configuration {} inutilisable ({:#}), valeurs par défaut utilisées",
                config_path.display(),
                e
            );
            Config::default()
        }
    };
    if let Some(url) = cli.scorer_url.clone() {
        config.scorer.base_url = url;
    }
    if let Some(log_mode) = cli.log_mode {
        config.log_mode = log_mode;
    }

    init_logging(&config);

    match cli.command {
        Command::Serve { paused, no_api } => {
            if paused {
                config.monitor.start_live = false;
            }
            serve(config, !no_api).await
        }
        Command::Simulate { scenario } => {
            let service = DashboardService::from_config(config)?;
            let report = service.simulate_named(&scenario).await?;

            println!(
                "Simulation {}: {} flux, {} anomalies{}",
                scenario,
                report.flows,
                report.anomalies,
                if report.degraded { " (scores de repli)" } else { "" }
            );
            for incident in &report.incidents {
                println!(
                    "  [{}] {} - {} (score {:.3})",
                    incident.severity, incident.kind, incident.description, incident.score
                );
            }
            Ok(())
        }
        Command::Status => {
            let service = DashboardService::from_config(config)?;
            let report = service.model_status().await;

            println!("Modèle de score: {}", service.config().scorer.base_url);
            println!("  Chargé: {}", if report.status.model_loaded { "oui" } else { "non" });
            if let Some(features) = report.status.features {
                println!("  Caractéristiques: {}", features);
            }
            if let (Some(min), Some(max)) = (report.status.score_min, report.status.score_max) {
                println!("  Plage des scores: [{:.3}, {:.3}]", min, max);
            }
            Ok(())
        }
        Command::Render {
            ticks,
            width,
            height,
            out,
        } => {
            let service = DashboardService::from_config(config)?;
            service.run_ticks(ticks).await;
            let svg = service.render_svg(width, height);

            match out {
                Some(path) => {
                    std::fs::write(&path, svg)
                        .with_context(|| format!("Impossible d'écrire {}", path.display()))?;
                    info!("Frise écrite dans {}", path.display());
                }
                None => print!("{}", svg),
            }
            Ok(())
        }
        Command::Export { ticks, out } => {
            let service = DashboardService::from_config(config)?;
            service.run_ticks(ticks).await;
            let path = service.export_to(out.as_deref())?;
            println!("Export écrit dans {}", path.display());
            print_summary(&service);
            Ok(())
        }
    }
}

fn init_logging(config: &Config) {
    match config.log_mode {
        LogMode::Console | LogMode::File => {
            env_logger::init_from_env(env_logger::Env::default().default_filter_or(&config.log_level));
        }
        LogMode::SystemdJournal => {
            #[cfg(feature = "systemd")]
            {
                use systemd_journal_logger::JournalLog;

                let log_level = match config.log_level.to_lowercase().as_str() {
                    "trace" => log::LevelFilter::Trace,
                    "debug" => log::LevelFilter::Debug,
                    "warn" => log::LevelFilter::Warn,
                    "error" => log::LevelFilter::Error,
                    _ => log::LevelFilter::Info,
                };

                match JournalLog::new() {
                    Ok(logger) => {
                        if let Err(e) = logger
                            .with_syslog_identifier("nidsboard".to_string())
                            .install()
                        {
                            eprintln!("Erreur lors de l'installation du logger systemd: {}", e);
                            env_logger::init_from_env(
                                env_logger::Env::default().default_filter_or(&config.log_level),
                            );
                        } else {
                            log::set_max_level(log_level);
                            info!("Logger systemd initialisé avec niveau: {}", config.log_level);
                        }
                    }
                    Err(e) => {
                        eprintln!("Erreur lors de l'initialisation du logger systemd: {}", e);
                        env_logger::init_from_env(
                            env_logger::Env::default().default_filter_or(&config.log_level),
                        );
                    }
                }
            }

            #[cfg(not(feature = "systemd"))]
            {
                eprintln!("AVERTISSEMENT: Le mode SystemdJournal n'est pas disponible (feature 'systemd' non activée). Utilisation du logger standard à la place.");
                env_logger::init_from_env(env_logger::Env::default().default_filter_or(&config.log_level));
            }
        }
    }
}

async fn serve(config: Config, with_api: bool) -> Result<()> {
    let api_settings = config.api.clone();
    let service = Arc::new(DashboardService::from_config(config)?);
    service.start_monitoring();

    let api_task = if with_api && api_settings.enabled {
        let service = Arc::clone(&service);
        Some(tokio::spawn(async move {
            if let Err(e) = api::serve(service, &api_settings.listen_address).await {
                error!("API de contrôle arrêtée: {:#}", e);
            }
        }))
    } else {
        info!("API de contrôle désactivée");
        None
    };

    let mut summary = time::interval(SUMMARY_INTERVAL);
    summary.tick().await;

    loop {
        tokio::select! {
            _ = summary.tick() => print_summary(&service),
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    error!("Erreur lors de l'attente du signal d'arrêt: {}", e);
                }
                break;
            }
        }
    }

    info!("Arrêt demandé");
    service.shutdown();
    if let Some(task) = api_task {
        task.abort();
    }
    print_summary(&service);
    Ok(())
}

fn print_summary(service: &DashboardService) {
    let summary = service.summary();
    info!(
        "[{}] flux: {} | anomalies: {} ({:.1}%) | incidents: {} | menace: {} ({:.2}) | uptime {}{}",
        if summary.is_live { "LIVE" } else { "PAUSE" },
        summary.total_flows.to_formatted_string(&Locale::fr),
        summary.anomalies_detected.to_formatted_string(&Locale::fr),
        summary.detection_rate,
        summary.active_incidents,
        summary.threat_level,
        summary.threat_score,
        summary.uptime,
        if summary.scorer_degraded { " | mode dégradé" } else { "" }
    );
}
