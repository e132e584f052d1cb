use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mode de journalisation utilisé par le système
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LogMode {
    /// Sortie d'erreur standard uniquement
    #[default]
    Console,
    /// Sortie standard et journal des événements dans un fichier local
    File,
    /// Journal via systemd-journal
    SystemdJournal,
}

impl fmt::Display for LogMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogMode::Console => "console",
            LogMode::File => "file",
            LogMode::SystemdJournal => "systemd-journal",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for LogMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "console" => Ok(LogMode::Console),
            "file" | "fichier" => Ok(LogMode::File),
            "systemd" | "systemd-journal" | "journal" => Ok(LogMode::SystemdJournal),
            other => Err(format!("mode de journalisation inconnu: {}", other)),
        }
    }
}
