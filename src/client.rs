//! APRS-IS client: a line-based TCP reader with the `user/pass/filter`
//! login handshake. Received lines are handed to a [`PacketHandler`]
//! synchronously; parsing (and the decision what to do with unparseable
//! frames) stays with the caller.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Callbacks for a running connection. Lines beginning `# ` are server
/// chatter; everything else is a packet with a per-connection sequence
/// number.
pub trait PacketHandler: Send + Sync {
    fn got_packet(&self, raw: &[u8], sequence: u64);
    fn got_comment(&self, line: &[u8]);
    fn disconnected(&self, reason: &str);
}

/// Connection settings for an APRS-IS server.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Callsign used in the login line.
    pub user: String,
    /// Passcode; `-1` requests read-only access.
    pub pass: String,
    pub app_name: String,
    pub app_version: String,
    /// Server-side filter expression, appended to the login line.
    pub filter: Option<String>,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "rotate.aprs.net".to_string(),
            port: 14580,
            user: "N0CALL".to_string(),
            pass: "-1".to_string(),
            app_name: env!("CARGO_PKG_NAME").to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            filter: Some("t/poimqstunw".to_string()),
            max_retries: 5,
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn user<S: Into<String>>(mut self, user: S) -> Self {
        self.config.user = user.into();
        self
    }

    pub fn pass<S: Into<String>>(mut self, pass: S) -> Self {
        self.config.pass = pass.into();
        self
    }

    pub fn app<S: Into<String>>(mut self, name: S, version: S) -> Self {
        self.config.app_name = name.into();
        self.config.app_version = version.into();
        self
    }

    pub fn filter<S: Into<String>>(mut self, filter: Option<S>) -> Self {
        self.config.filter = filter.map(|f| f.into());
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay = delay;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

/// APRS-IS client. `start` spawns the read loop and reconnects with a
/// bounded number of retries; `stop` shuts it down.
pub struct AprsIsClient {
    config: ClientConfig,
    handler: Arc<dyn PacketHandler>,
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl AprsIsClient {
    pub fn new(config: ClientConfig, handler: Arc<dyn PacketHandler>) -> Self {
        Self {
            config,
            handler,
            shutdown_tx: None,
        }
    }

    /// Connect and begin delivering lines to the handler.
    pub async fn start(&mut self) -> Result<()> {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        self.shutdown_tx = Some(shutdown_tx);

        let config = self.config.clone();
        let handler = Arc::clone(&self.handler);

        tokio::spawn(async move {
            let mut retry_count = 0;
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    info!("Shutdown requested, stopping APRS-IS client");
                    break;
                }

                match connect_and_run(&config, Arc::clone(&handler)).await {
                    Ok(()) => {
                        info!("APRS-IS connection ended normally");
                        retry_count = 0;
                    }
                    Err(e) => {
                        error!("APRS-IS client error: {e:#}");
                        handler.disconnected(&format!("{e:#}"));
                        retry_count += 1;
                        if retry_count >= config.max_retries {
                            error!(
                                "Maximum retry attempts ({}) reached, stopping client",
                                config.max_retries
                            );
                            break;
                        }
                        warn!(
                            "Retrying connection in {:?} (attempt {}/{})",
                            config.retry_delay, retry_count, config.max_retries
                        );
                        sleep(config.retry_delay).await;
                    }
                }
            }
        });

        Ok(())
    }

    pub async fn stop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(()).await;
        }
    }
}

/// The login line:
/// `user <user> pass <pass> <app> <version> filter <filter>\r\n`.
fn build_login_line(config: &ClientConfig) -> String {
    let mut line = format!(
        "user {} pass {} {} {}",
        config.user, config.pass, config.app_name, config.app_version
    );
    if let Some(filter) = &config.filter {
        line.push_str(" filter ");
        line.push_str(filter);
    }
    line.push_str("\r\n");
    line
}

/// One connection: login handshake, then the read loop. Returns when the
/// server closes the connection.
pub(crate) async fn connect_and_run(
    config: &ClientConfig,
    handler: Arc<dyn PacketHandler>,
) -> Result<()> {
    info!("Connecting to APRS-IS server {}:{}", config.host, config.port);
    let stream = TcpStream::connect((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to connect to {}:{}", config.host, config.port))?;
    metrics::gauge!("aprs.client.connected").set(1.0);

    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    let login = build_login_line(config);
    writer.write_all(login.as_bytes()).await?;
    writer.flush().await?;
    debug!("Sent login line: {}", login.trim_end());

    let banner = read_line(&mut reader).await?.context("Server closed before banner")?;
    if !banner.starts_with(b"# ") {
        bail!("Unexpected banner line: {}", String::from_utf8_lossy(&banner));
    }
    debug!("Banner: {}", String::from_utf8_lossy(&banner));

    let logresp = read_line(&mut reader)
        .await?
        .context("Server closed before login response")?;
    let expected = format!("# logresp {} verified", config.user);
    if !logresp.starts_with(expected.as_bytes()) {
        bail!(
            "Login not verified: {}",
            String::from_utf8_lossy(&logresp)
        );
    }
    info!("Logged in as {}", config.user);

    let mut sequence: u64 = 0;
    loop {
        let Some(line) = read_line(&mut reader).await? else {
            warn!("Connection closed by server");
            metrics::gauge!("aprs.client.connected").set(0.0);
            handler.disconnected("connection closed by server");
            return Ok(());
        };
        if line.is_empty() {
            continue;
        }
        if line.starts_with(b"# ") {
            debug!("Server comment: {}", String::from_utf8_lossy(&line));
            handler.got_comment(&line);
        } else {
            metrics::counter!("aprs.client.packets_received_total").increment(1);
            handler.got_packet(&line, sequence);
            sequence += 1;
        }
    }
}

/// Read one `\n`-terminated line as raw bytes (frames are not necessarily
/// UTF-8). `None` on a clean EOF.
async fn read_line<R: AsyncBufReadExt + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut line = Vec::new();
    let n = reader
        .read_until(b'\n', &mut line)
        .await
        .context("Failed to read from server")?;
    if n == 0 {
        return Ok(None);
    }
    while line.last() == Some(&b'\n') || line.last() == Some(&b'\r') {
        line.pop();
    }
    Ok(Some(line))
}
