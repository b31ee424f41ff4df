use std::io::{BufWriter, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use anyhow::Context;

use crate::settings::ClientSettings;

use super::{SceneBatch, SceneClient};

/// Writes each batch as one line of JSON over a TCP connection.
///
/// The connection is opened on first use and reopened after a failed write.
#[derive(Default)]
pub struct JsonClient {
	stream: Option<TcpStream>,
}

impl JsonClient {
	pub fn new() -> Self {
		Self::default()
	}

	fn connect(settings: &ClientSettings) -> anyhow::Result<TcpStream> {
		let endpoint = settings.endpoint();
		let timeout = Duration::from_millis(settings.timeout_ms.max(1));
		let addr = endpoint
			.to_socket_addrs()
			.with_context(|| format!("failed to resolve {endpoint}"))?
			.next()
			.with_context(|| format!("no address for {endpoint}"))?;
		let stream = TcpStream::connect_timeout(&addr, timeout).with_context(|| format!("failed to connect to {endpoint}"))?;
		stream.set_write_timeout(Some(timeout))?;
		Ok(stream)
	}

	fn write(stream: &TcpStream, batch: &SceneBatch) -> anyhow::Result<()> {
		let mut writer = BufWriter::new(stream);
		serde_json::to_writer(&mut writer, batch).context("failed to encode batch")?;
		writer.write_all(b"\n")?;
		writer.flush()?;
		Ok(())
	}
}

impl SceneClient for JsonClient {
	fn send(&mut self, batch: &SceneBatch, settings: &ClientSettings) -> anyhow::Result<()> {
		let stream = match self.stream.take() {
			Some(stream) => stream,
			None => Self::connect(settings)?,
		};
		Self::write(&stream, batch)?;
		self.stream = Some(stream);
		Ok(())
	}
}
