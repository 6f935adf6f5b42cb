//! Append-only order audit log.
//!
//! One JSON object per line in `logs/orders.log`. Logging failures are
//! reported and swallowed — a full disk must not block a checkout.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

use crate::error::MarioError;
use crate::order::CompletedOrder;

#[derive(Debug, Serialize)]
struct OrderRecord<'a> {
    user_id: &'a str,
    order_number: &'a str,
    main_item: &'a str,
    total_items: usize,
    eta: &'a str,
    timestamp: String,
}

/// Writes order records under a base directory.
#[derive(Debug, Clone)]
pub struct OrderLog {
    path: PathBuf,
}

impl OrderLog {
    /// Log rooted at the default `logs/` directory.
    pub fn new() -> Self {
        Self::at(Path::new("logs"))
    }

    /// Log rooted at a custom directory (used by tests).
    pub fn at(dir: &Path) -> Self {
        Self {
            path: dir.join("orders.log"),
        }
    }

    /// Append a completed order. Errors are warned about, never raised.
    pub fn record(&self, user_id: &str, order: &CompletedOrder) {
        if let Err(e) = self.append(user_id, order) {
            warn!(error = %e, path = %self.path.display(), "failed to record order");
        }
    }

    fn append(&self, user_id: &str, order: &CompletedOrder) -> Result<(), MarioError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let record = OrderRecord {
            user_id,
            order_number: &order.number,
            main_item: &order.main_item,
            total_items: order.total_items,
            eta: &order.eta,
            timestamp: chrono::Local::now().to_rfc3339(),
        };
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", serde_json::to_string(&record)?)?;
        Ok(())
    }
}

impl Default for OrderLog {
    fn default() -> Self {
        Self::new()
    }
}
