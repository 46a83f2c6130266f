// Minimal scripted FTP server for crawler tests: speaks just enough
// RFC 959 to exercise anonymous login, PASV and LIST/MLSD retrieval.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

#[derive(Clone, Default)]
pub struct MockFtpConfig {
    /// Reject PASS with 530 this many times before accepting.
    pub fail_logins: usize,
    /// Paths whose LIST/MLSD always fails with 450.
    pub fail_paths: HashSet<String>,
    /// Whether the server understands MLSD; if not it replies 500.
    pub mlsd: bool,
    /// Listing bodies keyed by path, served for LIST and MLSD alike.
    pub listings: HashMap<String, String>,
}

pub struct MockFtpServer {
    pub addr: SocketAddr,
    pub login_attempts: Arc<AtomicUsize>,
    pub mlsd_attempts: Arc<AtomicUsize>,
    pub list_attempts: Arc<Mutex<HashMap<String, usize>>>,
}

impl MockFtpServer {
    pub async fn start(config: MockFtpConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let login_attempts = Arc::new(AtomicUsize::new(0));
        let mlsd_attempts = Arc::new(AtomicUsize::new(0));
        let list_attempts = Arc::new(Mutex::new(HashMap::new()));

        let logins = login_attempts.clone();
        let mlsds = mlsd_attempts.clone();
        let lists = list_attempts.clone();
        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(handle_control(
                    socket,
                    config.clone(),
                    logins.clone(),
                    mlsds.clone(),
                    lists.clone(),
                ));
            }
        });

        Self {
            addr,
            login_attempts,
            mlsd_attempts,
            list_attempts,
        }
    }

    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    pub fn attempts_for(&self, path: &str) -> usize {
        *self.list_attempts.lock().unwrap().get(path).unwrap_or(&0)
    }
}

async fn handle_control(
    socket: TcpStream,
    config: MockFtpConfig,
    logins: Arc<AtomicUsize>,
    mlsds: Arc<AtomicUsize>,
    lists: Arc<Mutex<HashMap<String, usize>>>,
) {
    let (rd, mut wr) = socket.into_split();
    let mut reader = BufReader::new(rd);
    if wr.write_all(b"220 mock ftp ready\r\n").await.is_err() {
        return;
    }

    let mut pending_data: Option<TcpListener> = None;
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let cmd = line.trim_end();
        let (verb, arg) = cmd.split_once(' ').unwrap_or((cmd, ""));

        match verb.to_uppercase().as_str() {
            "USER" => {
                wr.write_all(b"331 anonymous ok, send password\r\n")
                    .await
                    .ok();
            }
            "PASS" => {
                let seen = logins.fetch_add(1, Ordering::SeqCst);
                if seen < config.fail_logins {
                    wr.write_all(b"530 login denied\r\n").await.ok();
                } else {
                    wr.write_all(b"230 logged in\r\n").await.ok();
                }
            }
            "PASV" => {
                let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
                let port = listener.local_addr().unwrap().port();
                let reply = format!(
                    "227 Entering Passive Mode (127,0,0,1,{},{})\r\n",
                    port / 256,
                    port % 256
                );
                pending_data = Some(listener);
                wr.write_all(reply.as_bytes()).await.ok();
            }
            "LIST" | "MLSD" => {
                if verb.eq_ignore_ascii_case("MLSD") {
                    mlsds.fetch_add(1, Ordering::SeqCst);
                    if !config.mlsd {
                        wr.write_all(b"500 unknown command\r\n").await.ok();
                        continue;
                    }
                }
                *lists.lock().unwrap().entry(arg.to_string()).or_insert(0) += 1;

                if config.fail_paths.contains(arg) {
                    wr.write_all(b"450 temporarily unavailable\r\n").await.ok();
                    continue;
                }
                let Some(body) = config.listings.get(arg) else {
                    wr.write_all(b"550 no such directory\r\n").await.ok();
                    continue;
                };
                let Some(listener) = pending_data.take() else {
                    wr.write_all(b"425 use PASV first\r\n").await.ok();
                    continue;
                };

                wr.write_all(b"150 here comes the listing\r\n").await.ok();
                if let Ok((mut data, _)) = listener.accept().await {
                    data.write_all(body.as_bytes()).await.ok();
                    data.shutdown().await.ok();
                }
                wr.write_all(b"226 transfer complete\r\n").await.ok();
            }
            "QUIT" => {
                wr.write_all(b"221 bye\r\n").await.ok();
                return;
            }
            _ => {
                wr.write_all(b"502 not implemented\r\n").await.ok();
            }
        }
    }
}
