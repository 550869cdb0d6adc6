/// Async ManageSieve client (RFC 5804).
///
/// Supports STARTTLS, SASL PLAIN authentication and the commands needed to
/// maintain one script: LISTSCRIPTS, GETSCRIPT, PUTSCRIPT, SETACTIVE, LOGOUT.
use base64::Engine;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::model::profile::SieveProfile;
use crate::net::{server_name, tls_connector, Error};
use crate::session::FilterScripts;

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptInfo {
    pub name: String,
    pub active: bool,
}

// We use a dynamic stream type to handle both plain and TLS connections
enum Stream {
    Plain(BufReader<TcpStream>),
    Tls(Box<BufReader<tokio_rustls::client::TlsStream<TcpStream>>>),
}

impl Stream {
    async fn read_line(&mut self, buf: &mut String) -> Result<usize, Error> {
        let n = match self {
            Self::Plain(r) => r.read_line(buf).await?,
            Self::Tls(r) => r.read_line(buf).await?,
        };
        if n == 0 {
            return Err(Error::Protocol("Connection closed".to_string()));
        }
        Ok(n)
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<(), std::io::Error> {
        match self {
            Self::Plain(r) => r.get_mut().write_all(data).await,
            Self::Tls(r) => r.get_mut().write_all(data).await,
        }
    }

    async fn flush(&mut self) -> Result<(), std::io::Error> {
        match self {
            Self::Plain(r) => r.get_mut().flush().await,
            Self::Tls(r) => r.get_mut().flush().await,
        }
    }
}

#[derive(Default)]
pub struct ManageSieveClient {
    stream: Option<Stream>,
}

impl ManageSieveClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Connect to a ManageSieve server, optionally upgrading to TLS via STARTTLS,
    /// then authenticate using SASL PLAIN.
    pub async fn connect(&mut self, profile: &SieveProfile, password: &str) -> Result<(), Error> {
        debug!(host = %profile.host, port = profile.port, "connecting to ManageSieve");
        let tcp = TcpStream::connect((&*profile.host, profile.port)).await?;
        let mut stream = Stream::Plain(BufReader::new(tcp));

        // Server greeting/capabilities
        read_response(&mut stream).await?;

        if profile.use_starttls {
            send_command(&mut stream, "STARTTLS").await?;
            let resp = read_response(&mut stream).await?;
            if !resp.ok {
                return Err(Error::Server("STARTTLS rejected".to_string()));
            }

            let tcp = match stream {
                Stream::Plain(r) => r.into_inner(),
                Stream::Tls(_) => return Err(Error::Protocol("TLS already active".to_string())),
            };
            let tls_stream = tls_connector()
                .connect(server_name(&profile.host)?, tcp)
                .await?;
            stream = Stream::Tls(Box::new(BufReader::new(tls_stream)));

            // Capabilities are sent again after the upgrade
            read_response(&mut stream).await?;
        }

        // SASL PLAIN: \0username\0password
        let auth_data = format!("\0{}\0{}", profile.username, password);
        let b64 = base64::engine::general_purpose::STANDARD.encode(auth_data.as_bytes());
        let auth_cmd = format!("AUTHENTICATE \"PLAIN\" \"{b64}\"");

        send_command(&mut stream, &auth_cmd).await?;
        let resp = read_response(&mut stream).await?;
        if !resp.ok {
            return Err(Error::AuthFailed);
        }

        info!(host = %profile.host, user = %profile.username, "ManageSieve session ready");
        self.stream = Some(stream);
        Ok(())
    }

    pub async fn disconnect(&mut self) {
        if let Some(stream) = &mut self.stream {
            let _ = send_command(stream, "LOGOUT").await;
            let _ = read_response(stream).await;
        }
        self.stream = None;
    }

    pub async fn list_scripts(&mut self) -> Result<Vec<ScriptInfo>, Error> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        send_command(stream, "LISTSCRIPTS").await?;

        let mut scripts = Vec::new();
        loop {
            let mut line = String::new();
            stream.read_line(&mut line).await?;
            let trimmed = line.trim();

            if trimmed.starts_with("OK") {
                break;
            }
            if trimmed.starts_with("NO") || trimmed.starts_with("BYE") {
                return Err(Error::Server(trimmed.to_string()));
            }

            // "scriptname" [ACTIVE]
            if let Some(name) = extract_quoted_string(trimmed) {
                let active = trimmed.ends_with("ACTIVE");
                scripts.push(ScriptInfo { name, active });
            }
        }

        Ok(scripts)
    }

    /// Script source exactly as stored, trailing line endings included.
    pub async fn get_script(&mut self, name: &str) -> Result<String, Error> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        let cmd = format!("GETSCRIPT \"{}\"", escape_sieve(name));
        send_command(stream, &cmd).await?;

        let mut content = String::new();
        let mut remaining = 0usize;

        loop {
            let mut line = String::new();
            stream.read_line(&mut line).await?;

            if remaining > 0 {
                let take = line.len().min(remaining);
                let chunk = line
                    .get(..take)
                    .ok_or_else(|| Error::Protocol("Literal ends inside a character".to_string()))?;
                content.push_str(chunk);
                remaining -= take;
                continue;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                // CRLF closing the literal
                continue;
            }
            if trimmed.starts_with("OK") {
                break;
            }
            if trimmed.starts_with("NO") || trimmed.starts_with("BYE") {
                return Err(Error::Server(trimmed.to_string()));
            }

            if let Some(size) = extract_literal_size(trimmed) {
                remaining = size;
            } else if let Some(s) = extract_quoted_string(trimmed) {
                content.push_str(&s);
            } else {
                return Err(Error::Protocol(format!("Unexpected GETSCRIPT line: {trimmed}")));
            }
        }

        Ok(content)
    }

    pub async fn put_script(&mut self, name: &str, content: &str) -> Result<(), Error> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        let size = content.len();
        let cmd = format!(
            "PUTSCRIPT \"{}\" {{{size}+}}\r\n{content}",
            escape_sieve(name)
        );
        send_command(stream, &cmd).await?;
        let resp = read_response(stream).await?;
        if !resp.ok {
            return Err(Error::Server(resp.message));
        }
        Ok(())
    }

    pub async fn set_active(&mut self, name: &str) -> Result<(), Error> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        let cmd = format!("SETACTIVE \"{}\"", escape_sieve(name));
        send_command(stream, &cmd).await?;
        let resp = read_response(stream).await?;
        if !resp.ok {
            return Err(Error::Server(resp.message));
        }
        Ok(())
    }
}

impl FilterScripts for ManageSieveClient {
    async fn list_scripts(&mut self) -> Result<Vec<String>, Error> {
        let scripts = ManageSieveClient::list_scripts(self).await?;
        Ok(scripts.into_iter().map(|s| s.name).collect())
    }

    async fn fetch_script(&mut self, name: &str) -> Result<String, Error> {
        self.get_script(name).await
    }

    async fn install_script(&mut self, name: &str, text: &str, activate: bool) -> Result<(), Error> {
        self.put_script(name, text).await?;
        if activate {
            self.set_active(name).await?;
        }
        debug!(script = name, bytes = text.len(), activate, "uploaded script");
        Ok(())
    }
}

// --- Protocol helpers ---

struct Response {
    ok: bool,
    message: String,
}

async fn send_command(stream: &mut Stream, cmd: &str) -> Result<(), Error> {
    let data = format!("{cmd}\r\n");
    stream.write_all(data.as_bytes()).await?;
    stream.flush().await?;
    Ok(())
}

async fn read_response(stream: &mut Stream) -> Result<Response, Error> {
    // Read lines until we get OK, NO, or BYE
    loop {
        let mut line = String::new();
        stream.read_line(&mut line).await?;

        let trimmed = line.trim();
        if trimmed.starts_with("OK") {
            return Ok(Response {
                ok: true,
                message: trimmed.to_string(),
            });
        }
        if trimmed.starts_with("NO") || trimmed.starts_with("BYE") {
            return Ok(Response {
                ok: false,
                message: trimmed.to_string(),
            });
        }
    }
}

fn extract_quoted_string(s: &str) -> Option<String> {
    let s = s.trim().strip_prefix('"')?;
    let mut result = String::new();
    let mut chars = s.chars();
    loop {
        match chars.next() {
            Some('\\') => {
                if let Some(c) = chars.next() {
                    result.push(c);
                }
            }
            Some('"') => return Some(result),
            Some(c) => result.push(c),
            None => return None,
        }
    }
}

fn extract_literal_size(s: &str) -> Option<usize> {
    let s = s.trim().strip_prefix('{')?;
    let end = s.find('}')?;
    s[..end].trim_end_matches('+').parse().ok()
}

fn escape_sieve(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
