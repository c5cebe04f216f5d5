//! Ledger Storage Adapters
//!
//! Pluggable persistence behind two operations: append a block and load the
//! full ordered sequence. Implementations must preserve append order and be
//! crash-consistent with respect to the last acknowledged append.

use anyhow::{anyhow, Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::block::Block;

/// Storage adapter consumed by the ledger.
pub trait LedgerStore {
    /// Persist a block at the end of the sequence.
    fn append(&mut self, block: &Block) -> Result<()>;

    /// Load the full ordered sequence of persisted blocks.
    fn load_all(&self) -> Result<Vec<Block>>;
}

/// In-memory store for tests and pure environments.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    blocks: Vec<Block>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn append(&mut self, block: &Block) -> Result<()> {
        self.blocks.push(block.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<Block>> {
        Ok(self.blocks.clone())
    }
}

/// Append-only JSONL file store, one block per line.
pub struct FileLedgerStore {
    path: PathBuf,
    file: File,
}

impl FileLedgerStore {
    /// Open (or create) a JSONL ledger file for appending.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create ledger directory {:?}", parent))?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open ledger file {:?}", path))?;

        Ok(Self { path, file })
    }

    /// Path of the underlying ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerStore for FileLedgerStore {
    fn append(&mut self, block: &Block) -> Result<()> {
        let json = serde_json::to_string(block).context("failed to serialize block")?;
        writeln!(self.file, "{}", json).context("failed to write to ledger file")?;
        self.file.flush().context("failed to flush ledger file")?;
        debug!(nonce = %block.nonce, "persisted block");
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<Block>> {
        let file = File::open(&self.path)
            .with_context(|| format!("failed to open ledger file {:?}", self.path))?;

        let reader = BufReader::new(file);
        let mut blocks = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("failed to read line {}", line_num + 1))?;
            if line.trim().is_empty() {
                continue;
            }

            let block: Block = serde_json::from_str(&line)
                .map_err(|e| anyhow!("failed to parse block at line {}: {}", line_num + 1, e))?;
            blocks.push(block);
        }

        debug!(count = blocks.len(), path = ?self.path, "loaded blocks");
        Ok(blocks)
    }
}
