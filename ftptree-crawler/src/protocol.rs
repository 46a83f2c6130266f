//! Low-level FTP control-connection codec (RFC 959).
//!
//! Handles:
//! - Sending FTP commands terminated with `\r\n`
//! - Reading single-line and multi-line replies and their 3-digit codes
//! - Anonymous login
//! - Retrieving a directory listing over a PASV data channel
//!
//! Replies and listing bodies are read as raw bytes and decoded as
//! Latin-1, one char per byte, so arbitrary filename bytes survive into
//! the tree unchanged.

use crate::error::{CrawlError, Result};
use regex::Regex;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;
use tracing::trace;

/// Decode raw wire bytes as Latin-1. Every byte value maps to the char
/// with the same code point, so the mapping is lossless and reversible.
pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// A single FTP reply (may be multi-line).
#[derive(Debug, Clone)]
pub struct FtpResponse {
    pub code: u16,
    pub lines: Vec<String>,
}

impl FtpResponse {
    /// Full reply text (all lines joined).
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Whether the code indicates success (1xx-3xx).
    pub fn is_success(&self) -> bool {
        self.code < 400
    }

    /// Whether this is a positive-preliminary reply (1xx).
    pub fn is_preliminary(&self) -> bool {
        (100..200).contains(&self.code)
    }
}

/// The FTP command/response codec operating on a split control socket.
pub struct FtpCodec {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    host: String,
    command_timeout: Duration,
}

impl FtpCodec {
    /// Establish the control connection and read the server banner.
    ///
    /// `host` is `host` or `host:port`; port 21 is assumed when absent.
    pub async fn connect(host: &str, command_timeout: Duration) -> Result<(Self, FtpResponse)> {
        let addr = if host.contains(':') {
            host.to_string()
        } else {
            format!("{}:21", host)
        };

        let tcp = timeout(command_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| CrawlError::Timeout(format!("connect to {}", addr)))??;
        tcp.set_nodelay(true).ok();

        let (rd, wr) = tcp.into_split();
        let mut codec = Self {
            reader: BufReader::new(rd),
            writer: wr,
            host: addr,
            command_timeout,
        };
        let banner = codec.read_response().await?;
        if !banner.is_success() {
            return Err(CrawlError::Reply(banner.code, banner.text()));
        }
        Ok((codec, banner))
    }

    /// Anonymous login (`USER anonymous`, then `PASS` if asked for one).
    pub async fn login_anonymous(&mut self) -> Result<()> {
        let user = self.execute("USER anonymous").await?;
        if user.code == 331 {
            let pass = self.execute("PASS anonymous@").await?;
            if !pass.is_success() {
                return Err(CrawlError::Login(pass.text()));
            }
        } else if !user.is_success() {
            return Err(CrawlError::Login(user.text()));
        }
        Ok(())
    }

    /// Send a raw FTP command (without trailing CRLF; we add it).
    async fn send_command(&mut self, cmd: &str) -> Result<()> {
        let line = format!("{}\r\n", cmd);
        timeout(self.command_timeout, self.writer.write_all(line.as_bytes()))
            .await
            .map_err(|_| CrawlError::Timeout(format!("command {}", cmd)))??;
        trace!(">>> {}", cmd);
        Ok(())
    }

    /// Read one line from the control channel, Latin-1 decoded.
    async fn read_line_raw(&mut self) -> Result<String> {
        let mut buf = Vec::new();
        let n = timeout(self.command_timeout, self.reader.read_until(b'\n', &mut buf))
            .await
            .map_err(|_| CrawlError::Timeout("control-channel read".into()))??;
        if n == 0 {
            return Err(CrawlError::Protocol(
                "server closed the control connection".into(),
            ));
        }
        let line = latin1_to_string(&buf);
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Read a complete FTP reply. A `NNN-` first line means more lines
    /// follow until a line starting with `NNN ` is seen.
    pub async fn read_response(&mut self) -> Result<FtpResponse> {
        let first = self.read_line_raw().await?;
        let code = parse_code(&first)?;
        let mut lines = vec![first.clone()];

        let is_multi = first.len() >= 4 && first.as_bytes()[3] == b'-';
        if is_multi {
            let terminator = format!("{} ", code);
            loop {
                let next = self.read_line_raw().await?;
                let done = next.starts_with(&terminator);
                lines.push(next);
                if done {
                    break;
                }
            }
        }

        let resp = FtpResponse { code, lines };
        trace!("<<< {} {}", resp.code, resp.lines.last().map(String::as_str).unwrap_or(""));
        Ok(resp)
    }

    /// Send a command and return the reply.
    pub async fn execute(&mut self, cmd: &str) -> Result<FtpResponse> {
        self.send_command(cmd).await?;
        self.read_response().await
    }

    /// Send a command, expect a reply in the given code class.
    pub async fn expect(&mut self, cmd: &str, expected_first_digit: u16) -> Result<FtpResponse> {
        let resp = self.execute(cmd).await?;
        if resp.code / 100 != expected_first_digit {
            return Err(CrawlError::Reply(resp.code, resp.text()));
        }
        Ok(resp)
    }

    /// Retrieve the body of a listing command (`LIST <path>` or
    /// `MLSD <path>`) over a PASV data channel.
    ///
    /// A 4xx/5xx reply to the command itself surfaces as
    /// [`CrawlError::Reply`]; format detection relies on that to tell
    /// "server does not speak MLSD" apart from transport trouble.
    pub async fn retrieve_listing(&mut self, cmd: &str) -> Result<String> {
        let data = self.open_data_channel().await?;

        let resp = self.execute(cmd).await?;
        if !resp.is_preliminary() && !resp.is_success() {
            return Err(CrawlError::Reply(resp.code, resp.text()));
        }

        let mut body = Vec::new();
        let mut data = data;
        timeout(self.command_timeout, data.read_to_end(&mut body))
            .await
            .map_err(|_| CrawlError::Timeout(format!("data transfer for {}", cmd)))??;
        drop(data);

        // Transfer-complete reply (226).
        let done = self.read_response().await?;
        if !done.is_success() {
            return Err(CrawlError::Reply(done.code, done.text()));
        }

        Ok(latin1_to_string(&body))
    }

    /// Issue `PASV`, parse the reply, connect to the returned address.
    ///
    /// Reply format: `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)`
    async fn open_data_channel(&mut self) -> Result<TcpStream> {
        let resp = self.expect("PASV", 2).await?;
        let addr = parse_pasv_response(&resp.text())?;
        let tcp = timeout(self.command_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| CrawlError::Timeout(format!("PASV data connect to {}", addr)))??;
        Ok(tcp)
    }

    /// Best-effort graceful close.
    pub async fn quit(&mut self) {
        let _ = self.execute("QUIT").await;
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

/// Parse the 3-digit reply code from the start of a line.
fn parse_code(line: &str) -> Result<u16> {
    if line.len() < 3 {
        return Err(CrawlError::Protocol(format!(
            "reply too short to contain a code: '{}'",
            line
        )));
    }
    line[..3]
        .parse::<u16>()
        .map_err(|_| CrawlError::Protocol(format!("invalid reply code in: '{}'", line)))
}

/// Parse `(h1,h2,h3,h4,p1,p2)` from a 227 reply.
fn parse_pasv_response(text: &str) -> Result<SocketAddr> {
    let re = Regex::new(r"\((\d+),(\d+),(\d+),(\d+),(\d+),(\d+)\)").unwrap();
    let caps = re
        .captures(text)
        .ok_or_else(|| CrawlError::Protocol(format!("cannot parse PASV reply: {}", text)))?;

    let nums: Vec<u8> = (1..=6)
        .map(|i| {
            caps[i]
                .parse::<u8>()
                .map_err(|_| CrawlError::Protocol("PASV number out of range".into()))
        })
        .collect::<Result<Vec<_>>>()?;

    let ip = IpAddr::from([nums[0], nums[1], nums[2], nums[3]]);
    let port = (nums[4] as u16) * 256 + (nums[5] as u16);
    Ok(SocketAddr::new(ip, port))
}
