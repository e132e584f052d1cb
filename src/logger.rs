use crate::ingest::IngestReport;
use crate::log_mode::LogMode;
use crate::models::{Incident, Severity};
use chrono::{DateTime, Local};
use log::{debug, error, info, warn};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Journal des événements de la session (lots, incidents, commandes opérateur)
pub struct EventJournal {
    log_file: Mutex<Option<File>>,
    log_path: String,
    log_mode: LogMode,
}

impl EventJournal {
    pub fn new(log_path: String, log_mode: LogMode) -> Self {
        // Seul le mode fichier ouvre un journal sur disque
        let file = if log_mode == LogMode::File {
            open_log_file(&log_path)
        } else {
            None
        };

        Self {
            log_file: Mutex::new(file),
            log_path,
            log_mode,
        }
    }

    /// Journal sans fichier, les événements passent par le crate log
    pub fn console() -> Self {
        Self::new(String::new(), LogMode::Console)
    }

    pub fn mode(&self) -> LogMode {
        self.log_mode
    }

    fn timestamp() -> String {
        let now: DateTime<Local> = Local::now();
        now.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
    }

    pub fn log_batch(&self, report: &IngestReport) {
        let entry = format!(
            "[{}] [BATCH] {} flux, {} anomalies (seuil {:.2}){}",
            Self::timestamp(),
            report.flows,
            report.anomalies,
            report.threshold,
            if report.degraded { " [scores de repli]" } else { "" }
        );

        match self.log_mode {
            LogMode::File => self.write_to_log(&entry),
            LogMode::Console | LogMode::SystemdJournal => debug!("{}", entry),
        }

        for incident in &report.incidents {
            self.log_incident(incident);
        }
    }

    pub fn log_incident(&self, incident: &Incident) {
        let entry = format!(
            "[{}] [INCIDENT] [{}] {} | score {:.3} | hôtes: {} | id {}",
            Self::timestamp(),
            incident.severity,
            incident.kind,
            incident.score,
            incident.affected_hosts.join(", "),
            incident.id
        );

        match self.log_mode {
            LogMode::File => self.write_to_log(&entry),
            LogMode::Console | LogMode::SystemdJournal => match incident.severity {
                Severity::Critical | Severity::High => warn!("{}", entry),
                Severity::Medium | Severity::Low => info!("{}", entry),
            },
        }
    }

    pub fn log_command(&self, command: &str, detail: &str) {
        let entry = format!("[{}] [COMMAND] {} {}", Self::timestamp(), command, detail);

        match self.log_mode {
            LogMode::File => self.write_to_log(&entry),
            LogMode::Console | LogMode::SystemdJournal => info!("{}", entry),
        }
    }

    pub fn log_degraded(&self, degraded: bool) {
        let status = if degraded { "activé" } else { "désactivé" };
        let entry = format!("[{}] [DEGRADED] Mode dégradé {}", Self::timestamp(), status);

        match self.log_mode {
            LogMode::File => self.write_to_log(&entry),
            LogMode::Console | LogMode::SystemdJournal => warn!("{}", entry),
        }
    }

    fn write_to_log(&self, entry: &str) {
        let mut log_file_guard = match self.log_file.lock() {
            Ok(guard) => guard,
            Err(e) => {
                error!("Erreur lors de l'acquisition du verrou pour le fichier de log: {}", e);
                return;
            }
        };

        if let Some(file) = log_file_guard.as_mut() {
            if let Err(e) = writeln!(file, "{}", entry) {
                error!("Erreur lors de l'écriture dans le fichier de log: {}", e);

                // Essayer de réouvrir le fichier
                *log_file_guard = open_log_file(&self.log_path);
            }
        }
    }
}

fn open_log_file(log_path: &str) -> Option<File> {
    // Créer le répertoire si nécessaire
    if let Some(parent) = Path::new(log_path).parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            error!("Erreur lors de la création du répertoire de logs: {}", e);
        }
    }

    match OpenOptions::new().create(true).append(true).open(log_path) {
        Ok(file) => Some(file),
        Err(e) => {
            error!("Erreur lors de l'ouverture du fichier de log {}: {}", log_path, e);
            None
        }
    }
}
