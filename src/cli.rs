use crate::log_mode::LogMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "nidsboard")]
#[command(author, version, about = "Tableau de bord temps réel de détection d'intrusions réseau", long_about = None)]
pub struct Cli {
    /// Fichier de configuration (défaut: /etc/nidsboard/config.json)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// URL du modèle de score, prioritaire sur la configuration
    #[arg(long, global = true)]
    pub scorer_url: Option<String>,

    /// Mode de journalisation (console, file, systemd-journal), prioritaire sur la configuration
    #[arg(long, global = true)]
    pub log_mode: Option<LogMode>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Lance la surveillance et l'API de contrôle
    Serve {
        /// Démarrer la session en pause
        #[arg(long)]
        paused: bool,

        /// Ne pas exposer l'API HTTP
        #[arg(long)]
        no_api: bool,
    },

    /// Injecte un scénario d'attaque (ddos, portscan, exfiltration)
    Simulate {
        scenario: String,
    },

    /// Affiche l'état du modèle de score
    Status,

    /// Produit quelques lots puis écrit la frise au format SVG
    Render {
        #[arg(long, default_value_t = 20)]
        ticks: u32,

        #[arg(long)]
        width: Option<f64>,

        #[arg(long)]
        height: Option<f64>,

        /// Fichier de sortie (défaut: sortie standard)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Produit quelques lots puis exporte incidents et métriques en JSON
    Export {
        #[arg(long, default_value_t = 20)]
        ticks: u32,

        /// Répertoire de sortie (défaut: export_dir de la configuration)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_flags() {
        let cli = Cli::parse_from(["nidsboard", "--config", "/tmp/c.json", "serve", "--paused"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json")));
        match cli.command {
            Command::Serve { paused, no_api } => {
                assert!(paused);
                assert!(!no_api);
            }
            other => panic!("commande inattendue: {:?}", other),
        }
    }

    #[test]
    fn test_parse_render_defaults() {
        let cli = Cli::parse_from(["nidsboard", "render", "--scorer-url", "http://model:8000"]);
        assert_eq!(cli.scorer_url.as_deref(), Some("http://model:8000"));
        assert_eq!(cli.log_mode, None);
        match cli.command {
            Command::Render {
                ticks, width, out, ..
            } => {
                assert_eq!(ticks, 20);
                assert_eq!(width, None);
                assert_eq!(out, None);
            }
            other => panic!("commande inattendue: {:?}", other),
        }
    }

    #[test]
    fn test_parse_log_mode_override() {
        let cli = Cli::parse_from(["nidsboard", "status", "--log-mode", "journal"]);
        assert_eq!(cli.log_mode, Some(LogMode::SystemdJournal));

        let invalid = Cli::try_parse_from(["nidsboard", "--log-mode", "syslog", "status"]);
        assert!(invalid.is_err());
    }
}
