use std::path::{Path, PathBuf};
use std::str::FromStr;

use charter_core::booking::Ticket;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::escpos;
use crate::reference::receipt_file_name;
use crate::template::{render_ticket_html, Layout};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrinterMode {
    /// Hosted deployment: there is never a device, receipts are saved.
    Cloud,
    /// Counter deployment with a USB receipt printer attached.
    Local,
}

impl FromStr for PrinterMode {
    type Err = PrinterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cloud" | "production" => Ok(PrinterMode::Cloud),
            "local" | "development" => Ok(PrinterMode::Local),
            other => Err(PrinterError::Config(format!("Unknown printer mode: {}", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PrinterConfig {
    pub mode: PrinterMode,
    pub device_path: PathBuf,
    pub receipts_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrinterStatus {
    pub mode: PrinterMode,
    pub device: String,
    pub connected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PrintOutcome {
    Printed { device: String },
    Saved { path: String },
}

#[derive(Debug, thiserror::Error)]
pub enum PrinterError {
    #[error("Printer configuration error: {0}")]
    Config(String),

    #[error("Failed to write to printer {device}: {source}")]
    Device {
        device: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to save receipt: {0}")]
    Io(#[from] std::io::Error),
}

/// Receipt output for the booking desk. Constructed once at startup with
/// its mode fixed; never consults the environment afterwards.
#[derive(Debug, Clone)]
pub struct PrinterService {
    config: PrinterConfig,
}

impl PrinterService {
    pub fn new(config: PrinterConfig) -> Self {
        Self { config }
    }

    pub fn mode(&self) -> PrinterMode {
        self.config.mode
    }

    pub fn receipts_dir(&self) -> &Path {
        &self.config.receipts_dir
    }

    fn device_name(&self) -> String {
        self.config.device_path.display().to_string()
    }

    fn device_error(&self, source: std::io::Error) -> PrinterError {
        PrinterError::Device { device: self.device_name(), source }
    }

    async fn open_device(&self) -> std::io::Result<tokio::fs::File> {
        tokio::fs::OpenOptions::new()
            .write(true)
            .open(&self.config.device_path)
            .await
    }

    pub async fn check(&self) -> PrinterStatus {
        let connected = match self.config.mode {
            PrinterMode::Cloud => false,
            PrinterMode::Local => self.open_device().await.is_ok(),
        };
        PrinterStatus {
            mode: self.config.mode,
            device: self.device_name(),
            connected,
        }
    }

    /// Prints on the device when one is reachable, otherwise saves the HTML
    /// receipt under the receipts directory.
    pub async fn print_receipt(&self, ticket: &Ticket) -> Result<PrintOutcome, PrinterError> {
        if self.config.mode == PrinterMode::Cloud {
            return self.save_receipt(ticket).await;
        }

        let mut device = match self.open_device().await {
            Ok(file) => file,
            Err(e) => {
                warn!("Printer {} unavailable ({}), saving receipt instead", self.device_name(), e);
                return self.save_receipt(ticket).await;
            }
        };

        let bytes = escpos::render_receipt(ticket);
        device
            .write_all(&bytes)
            .await
            .map_err(|source| self.device_error(source))?;
        device.flush().await.map_err(|source| self.device_error(source))?;

        info!("Printed receipt {} on {}", ticket.reference, self.device_name());
        Ok(PrintOutcome::Printed { device: self.device_name() })
    }

    pub async fn save_receipt(&self, ticket: &Ticket) -> Result<PrintOutcome, PrinterError> {
        tokio::fs::create_dir_all(&self.config.receipts_dir).await?;
        let path = self
            .config
            .receipts_dir
            .join(receipt_file_name(&ticket.reference, Utc::now(), "html"));
        tokio::fs::write(&path, render_ticket_html(ticket, Layout::Bilingual)).await?;

        info!("Saved receipt {} to {}", ticket.reference, path.display());
        Ok(PrintOutcome::Saved { path: path.display().to_string() })
    }
}
