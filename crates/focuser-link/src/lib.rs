//! Serial transport to the focuser drive.
//!
//! Strictly fire-and-forget: each operator action becomes one packet write,
//! and no reply is ever read. The link is exclusively owned and opened or
//! closed by explicit operator action.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info};

use focuser_proto::{MoveCommand, MovePacket};

/// Fixed rate the firmware listens at.
pub const BAUD: u32 = 115_200;

/// The firmware never answers move packets; this only bounds stray reads.
pub const READ_TIMEOUT: Duration = Duration::from_millis(200);

/// Names of serial ports that may host the focuser drive.
///
/// # Errors
/// Fails when the platform port scan fails.
pub fn available_port_names() -> Result<Vec<String>> {
    let ports = tokio_serial::available_ports().context("enumerate serial ports")?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

/// An open connection to the focuser drive.
pub struct FocuserLink {
    port: SerialStream,
    name: String,
}

impl FocuserLink {
    /// Opens `dev` at the fixed baud rate and read timeout.
    ///
    /// # Errors
    /// Fails when the device cannot be opened.
    pub fn open(dev: &str) -> Result<Self> {
        let port = tokio_serial::new(dev, BAUD)
            .timeout(READ_TIMEOUT)
            .open_native_async()
            .with_context(|| format!("open serial {dev}"))?;
        info!(%dev, baud = BAUD, "focuser link open");
        Ok(Self {
            port,
            name: dev.to_owned(),
        })
    }

    #[must_use]
    pub fn port_name(&self) -> &str {
        &self.name
    }

    /// Encodes and pushes one move. No reply is awaited.
    ///
    /// # Errors
    /// Fails when the command does not encode or the write fails; a failed
    /// write is surfaced once and not retried.
    pub async fn send_move(&mut self, cmd: &MoveCommand) -> Result<()> {
        let packet = cmd.encode()?;
        self.write_packet(&packet).await
    }

    /// Pushes an already-encoded packet.
    ///
    /// # Errors
    /// Fails when the write fails.
    pub async fn write_packet(&mut self, packet: &MovePacket) -> Result<()> {
        self.port
            .write_all(packet)
            .await
            .with_context(|| format!("write to {}", self.name))?;
        self.port
            .flush()
            .await
            .with_context(|| format!("flush {}", self.name))?;
        debug!(packet = ?packet, "sent move packet");
        Ok(())
    }

    /// Releases the port.
    pub fn close(self) {
        info!(dev = %self.name, "focuser link closed");
        drop(self.port);
    }
}
